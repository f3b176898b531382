//! Change events emitted after successful mutating operations.
//!
//! Events carry the minimum identifying data; observers that need more
//! read it back through the public read surface.

use serde::{Deserialize, Serialize};

use crate::types::{Identity, LineId, MessageId};

/// A state-change notification for observers and indexers.
///
/// Emitted exactly once per successful mutating operation, after the
/// state change has committed. Read operations emit nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    /// A line was created. The creator is its first member.
    LineCreated {
        line_id: LineId,
        creator: Identity,
        name: String,
    },

    /// An identity joined an existing line.
    LineJoined { line_id: LineId, identity: Identity },

    /// A message was appended to a line's ledger.
    MessageSent {
        line_id: LineId,
        message_id: MessageId,
        sender: Identity,
    },
}

impl ChangeEvent {
    /// The line this event concerns.
    pub fn line_id(&self) -> LineId {
        match self {
            ChangeEvent::LineCreated { line_id, .. } => *line_id,
            ChangeEvent::LineJoined { line_id, .. } => *line_id,
            ChangeEvent::MessageSent { line_id, .. } => *line_id,
        }
    }

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
    fn test_event_cbor_roundtrip() {
        let event = ChangeEvent::MessageSent {
            line_id: LineId::new(2),
            message_id: MessageId::new(7),
            sender: Identity::from_bytes([3; 32]),
        };

        let bytes = event.to_bytes();
        let recovered = ChangeEvent::from_bytes(&bytes).unwrap();
        assert_eq!(event, recovered);
    }

    #[test]
    fn test_event_line_id_accessor() {
        let event = ChangeEvent::LineJoined {
            line_id: LineId::new(5),
            identity: Identity::from_bytes([1; 32]),
        };
        assert_eq!(event.line_id(), LineId::new(5));
    }
}
