//! Message: an immutable encrypted entry in a line's ledger.
//!
//! A message is never edited and never removed. Its position in the
//! ledger is assigned at insertion and never reassigned.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::{Identity, LineId, MessageId};

/// An encrypted ledger entry.
///
/// The ciphertext is opaque to the core: it was produced client-side with
/// the line's shared secret, which the core never holds in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The line this message belongs to.
    pub line_id: LineId,

    /// Position in the line's ledger (zero-based).
    pub id: MessageId,

    /// The member that posted the message. Was a member at insertion time.
    pub sender: Identity,

    /// Sender-claimed post time (Unix milliseconds).
    pub timestamp: i64,

    /// Opaque encrypted body. Never empty.
    pub ciphertext: Bytes,
}

impl Message {
    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ciborium::de::Error<std::io::Error>> {
        ciborium::from_reader(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_cbor_roundtrip() {
        let message = Message {
            line_id: LineId::new(4),
            id: MessageId::new(0),
            sender: Identity::from_bytes([9; 32]),
            timestamp: 1_700_000_000_000,
            ciphertext: Bytes::from_static(b"\xde\xad\xbe\xef"),
        };

        let bytes = message.to_bytes();
        let recovered = Message::from_bytes(&bytes).unwrap();
        assert_eq!(message, recovered);
    }
}
