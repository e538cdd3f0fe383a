//! JSON cassette serializer

use super::{CassetteData, Serializer};
use crate::{ReelError, Result};

/// Pretty-printed JSON cassettes
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn serialize(&self, data: &CassetteData) -> Result<String> {
        serde_json::to_string_pretty(data).map_err(|e| ReelError::Serialization(e.to_string()))
    }

    fn deserialize(&self, text: &str) -> Result<CassetteData> {
        serde_json::from_str(text).map_err(|e| ReelError::InvalidFormat(e.to_string()))
    }
}
