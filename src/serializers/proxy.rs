//! Binds a serializer to one cassette file

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::{CassetteData, Serializer};
use crate::{ReelError, Result};

/// Serializer bound to `<library_dir>/<cassette_name>.<extension>`
#[derive(Clone)]
pub struct SerializerProxy {
    serializer: Arc<dyn Serializer>,
    path: PathBuf,
    allow_serialization: bool,
}

impl SerializerProxy {
    /// Bind `serializer` to the named cassette inside `library_dir`.
    ///
    /// Writes are silently skipped when `allow_serialization` is false.
    ///
    /// # Errors
    ///
    /// Returns error if the cassette name could escape the library directory
    pub fn new(
        serializer: Arc<dyn Serializer>,
        library_dir: &Path,
        cassette_name: &str,
        allow_serialization: bool,
    ) -> Result<Self> {
        validate_cassette_name(cassette_name)?;
        let path = library_dir.join(format!("{cassette_name}.{}", serializer.extension()));

        Ok(Self {
            serializer,
            path,
            allow_serialization,
        })
    }

    /// Resolved cassette file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enable or disable writes
    pub fn set_allow_serialization(&mut self, allow_serialization: bool) {
        self.allow_serialization = allow_serialization;
    }

    /// Read and decode the cassette file.
    ///
    /// A missing or blank file is a fresh cassette and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or decoded
    pub fn deserialize(&self) -> Result<Option<CassetteData>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No cassette at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }

        self.serializer.deserialize(&text).map(Some)
    }

    /// Encode and write the cassette file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns error if encoding or writing fails
    pub fn serialize(&self, data: &CassetteData) -> Result<()> {
        if !self.allow_serialization {
            debug!(
                "Serialization disabled, not writing {}",
                self.path.display()
            );
            return Ok(());
        }

        let text = self.serializer.serialize(data)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)?;

        debug!(
            "Wrote {} interactions to {}",
            data.http_interactions.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl fmt::Debug for SerializerProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerProxy")
            .field("serializer", &self.serializer.name())
            .field("path", &self.path)
            .field("allow_serialization", &self.allow_serialization)
            .finish()
    }
}

/// Validate cassette name
fn validate_cassette_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ReelError::InvalidCassetteName(
            "Cassette name cannot be empty".to_string(),
        ));
    }

    if name.len() > 255 {
        return Err(ReelError::InvalidCassetteName(format!(
            "Cassette name too long: {} > 255",
            name.len()
        )));
    }

    if name.contains('\\') || name.starts_with('/') {
        return Err(ReelError::InvalidCassetteName(
            "Cassette name must be a relative path".to_string(),
        ));
    }

    if name.split('/').any(|segment| segment.is_empty() || segment.starts_with('.')) {
        return Err(ReelError::InvalidCassetteName(
            "Cassette name segments cannot be empty or start with a dot".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(ReelError::InvalidCassetteName(
            "Cassette name cannot contain null bytes".to_string(),
        ));
    }

    Ok(())
}
