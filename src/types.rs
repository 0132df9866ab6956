use crate::errors::DbError;
use bson::Bson;
use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub type CollectionName = String;

/// Field under which every stored document keeps its id.
pub const ID_FIELD: &str = "_id";

/// Store-assigned record id.
///
/// Wraps a BSON `ObjectId`, whose leading timestamp and trailing counter make
/// ids generated by one process sort in creation order. JSON renders it as the
/// 24-character hex string, which is also the only accepted input form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub ObjectId);

impl DocumentId {
    #[must_use]
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// # Errors
    /// Returns `DbError::InvalidDocumentId` if `s` is not a 24-character hex ObjectId.
    pub fn parse(s: &str) -> Result<Self, DbError> {
        ObjectId::parse_str(s).map(Self).map_err(|_| DbError::InvalidDocumentId(s.to_string()))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl FromStr for DocumentId {
    type Err = DbError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<DocumentId> for Bson {
    fn from(id: DocumentId) -> Self {
        Self::ObjectId(id.0)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_hex_object_id() {
        let id = DocumentId::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        assert_eq!(id.to_hex(), "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        for bad in ["", "123", "not-an-object-id", "65a1f0c2e4b0a1b2c3d4e5fZ", "65a1f0c2e4b0a1b2c3d4e5f6aa"] {
            let err = DocumentId::parse(bad).unwrap_err();
            assert!(matches!(err, DbError::InvalidDocumentId(ref s) if s == bad));
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn new_ids_sort_in_creation_order() {
        // Holds unless the random counter start lies within 64 of wrapping.
        let ids: Vec<DocumentId> = (0..64).map(|_| DocumentId::new()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = DocumentId::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65a1f0c2e4b0a1b2c3d4e5f6\"");
        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
