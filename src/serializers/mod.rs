//! Pluggable cassette serializers

mod format;
mod json;
mod proxy;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use format::{CassetteData, RECORDED_WITH};
pub use json::JsonSerializer;
pub use proxy::SerializerProxy;

use crate::{ReelError, Result};

/// Translates cassette data to and from its on-disk text
pub trait Serializer: Send + Sync {
    /// Format name cassettes select this serializer by
    fn name(&self) -> &str;

    /// File extension, without the dot
    fn extension(&self) -> &str;

    /// Encode cassette data
    ///
    /// # Errors
    ///
    /// Returns error if the data cannot be encoded
    fn serialize(&self, data: &CassetteData) -> Result<String>;

    /// Decode cassette data
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid cassette
    fn deserialize(&self, text: &str) -> Result<CassetteData>;
}

/// Mapping from format name to serializer
#[derive(Default, Clone)]
pub struct SerializerRegistry {
    serializers: HashMap<String, Arc<dyn Serializer>>,
}

impl SerializerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the JSON serializer
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JsonSerializer);
        registry
    }

    /// Register a serializer under its own name, replacing any previous one
    pub fn register<S: Serializer + 'static>(&mut self, serializer: S) {
        self.serializers
            .insert(serializer.name().to_string(), Arc::new(serializer));
    }

    /// Look up a serializer by format name
    #[must_use]
    pub fn get(&self, format: &str) -> Option<Arc<dyn Serializer>> {
        self.serializers.get(format).cloned()
    }

    /// Look up a serializer, failing if none is registered
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown formats
    pub fn require(&self, format: &str) -> Result<Arc<dyn Serializer>> {
        self.get(format).ok_or_else(|| {
            ReelError::configuration(format!("No serializer registered for {format}"))
        })
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.serializers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SerializerRegistry")
            .field("serializers", &names)
            .finish()
    }
}
