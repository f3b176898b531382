//! Line metadata: the directory's view of a single group line.

use serde::{Deserialize, Serialize};

use crate::types::{Identity, LineId};

/// Read-only snapshot of a line's metadata.
///
/// `member_count` is derived state: it always equals the cardinality of
/// the line's membership set at the moment the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMetadata {
    /// The line's handle.
    pub id: LineId,

    /// Human-readable name. Never empty.
    pub name: String,

    /// The identity that created the line. A member since creation.
    pub creator: Identity,

    /// When the line was created (Unix milliseconds).
    pub created_at: i64,

    /// Number of members. Equals `|members(line)|`.
    pub member_count: u64,
}

impl LineMetadata {
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
    fn test_metadata_cbor_roundtrip() {
        let meta = LineMetadata {
            id: LineId::new(1),
            name: "Night Shift".to_string(),
            creator: Identity::from_bytes([1; 32]),
            created_at: 1_700_000_000_000,
            member_count: 2,
        };

        let bytes = meta.to_bytes();
        let recovered = LineMetadata::from_bytes(&bytes).unwrap();
        assert_eq!(meta, recovered);
    }
}
