use serde::{Deserialize, Serialize};
use std::fmt;

/// The backend-assigned identifier of a record.
///
/// Ids are opaque strings (the catalog backend hands out hex object ids) and
/// never change for the lifetime of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id with a UUID v7 (time-ordered).
    ///
    /// Only stores that assign ids themselves need this; records fetched
    /// from the backend always carry their own.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(v: &str) -> Self {
        Self(v.to_owned())
    }
}

impl From<String> for RecordId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_raw_id() {
        let id = RecordId::new("65f1c0ffee");
        assert_eq!(id.to_string(), "65f1c0ffee");
        assert_eq!(id.as_str(), "65f1c0ffee");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn serializes_transparently() {
        let id = RecordId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
