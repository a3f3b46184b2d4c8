//! Partial-field updates applied by the store with merge-patch semantics.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SchemaError;

/// Fields to merge into a stored document.
///
/// Follows RFC 7396: present fields overwrite, nested objects merge, and a
/// `null` member removes the field. A patch can never carry `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct DocumentPatch(Map<String, Value>);

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Serialized form handed to the store.
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl TryFrom<Map<String, Value>> for DocumentPatch {
    type Error = SchemaError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        if fields.contains_key("id") {
            return Err(SchemaError::IdNotAllowed);
        }
        Ok(Self(fields))
    }
}
