//! Configuration types for Reel

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{ReelError, Result};

/// Policy governing whether new interactions may be captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Replay only; never record
    None,
    /// Record only when the cassette was empty when loaded
    #[default]
    Once,
    /// Replay what matches, record everything else
    NewEpisodes,
    /// Re-record every interaction, evicting previous matches
    All,
}

impl RecordMode {
    /// Whether this mode records, given the emptiness of the loaded store
    #[must_use]
    pub fn allows_recording(self, store_was_empty: bool) -> bool {
        match self {
            Self::None => false,
            Self::Once => store_was_empty,
            Self::NewEpisodes | Self::All => true,
        }
    }

    /// Canonical name as written in configuration
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Once => "once",
            Self::NewEpisodes => "new_episodes",
            Self::All => "all",
        }
    }
}

impl fmt::Display for RecordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordMode {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "once" => Ok(Self::Once),
            "new_episodes" => Ok(Self::NewEpisodes),
            "all" => Ok(Self::All),
            other => Err(ReelError::configuration(format!(
                "Unknown record mode: {other}"
            ))),
        }
    }
}

/// Bidirectional substitution rule keeping a literal out of persisted cassettes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    /// Tag written to disk in place of the literal
    pub placeholder: String,
    /// Literal used in memory
    pub replace: String,
}

impl Placeholder {
    /// Create a new placeholder rule
    pub fn new(placeholder: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            replace: replace.into(),
        }
    }
}

/// Per-cassette options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CassetteOptions {
    /// Record mode
    #[serde(default)]
    pub record_mode: RecordMode,
    /// Matcher names, in evaluation order
    #[serde(default = "default_match_requests_on")]
    pub match_requests_on: Vec<String>,
    /// Seconds after which the cassette should be re-recorded (advisory)
    #[serde(default)]
    pub re_record_interval: Option<u64>,
    /// Placeholder rules
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
    /// Serializer format name
    #[serde(default = "default_serialize_with")]
    pub serialize_with: String,
}

fn default_match_requests_on() -> Vec<String> {
    vec!["method".to_string(), "uri".to_string()]
}

fn default_serialize_with() -> String {
    "json".to_string()
}

impl Default for CassetteOptions {
    fn default() -> Self {
        Self {
            record_mode: RecordMode::default(),
            match_requests_on: default_match_requests_on(),
            re_record_interval: None,
            placeholders: Vec::new(),
            serialize_with: default_serialize_with(),
        }
    }
}

impl CassetteOptions {
    /// Validate options that do not depend on the registries
    ///
    /// # Errors
    ///
    /// Returns error if a placeholder is blank or the re-record interval is zero
    pub fn validate(&self) -> Result<()> {
        for (i, placeholder) in self.placeholders.iter().enumerate() {
            if placeholder.placeholder.is_empty() {
                return Err(ReelError::configuration(format!(
                    "Placeholder {i}: placeholder cannot be empty"
                )));
            }

            if placeholder.replace.is_empty() {
                return Err(ReelError::configuration(format!(
                    "Placeholder {i}: replace cannot be empty"
                )));
            }
        }

        if self.re_record_interval == Some(0) {
            return Err(ReelError::configuration(
                "re_record_interval must be > 0".to_string(),
            ));
        }

        if self.serialize_with.is_empty() {
            return Err(ReelError::configuration(
                "serialize_with cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Library-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory holding cassette files
    pub cassette_library_dir: PathBuf,
    /// Options applied to every cassette unless overridden
    #[serde(default)]
    pub default_cassette_options: CassetteOptions,
}

impl LibraryConfig {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReelError::configuration(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ReelError::configuration(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if !self.cassette_library_dir.is_dir() {
            return Err(ReelError::configuration(format!(
                "Cassette library directory does not exist: {}",
                self.cassette_library_dir.display()
            )));
        }

        self.default_cassette_options.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_options_defaults() {
        let options: CassetteOptions = toml::from_str("").unwrap();
        assert_eq!(options, CassetteOptions::default());
        assert_eq!(options.record_mode, RecordMode::Once);
        assert_eq!(options.match_requests_on, vec!["method", "uri"]);
        assert_eq!(options.re_record_interval, None);
        assert!(options.placeholders.is_empty());
        assert_eq!(options.serialize_with, "json");
    }

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            cassette_library_dir = "/tmp"

            [default_cassette_options]
            record_mode = "new_episodes"
            match_requests_on = ["method", "path", "body"]

            [[default_cassette_options.placeholders]]
            placeholder = "<API_KEY>"
            replace = "s3cr3t"
        "#;

        let config: LibraryConfig = toml::from_str(config_toml).unwrap();
        let options = &config.default_cassette_options;
        assert_eq!(options.record_mode, RecordMode::NewEpisodes);
        assert_eq!(options.match_requests_on, vec!["method", "path", "body"]);
        assert_eq!(
            options.placeholders,
            vec![Placeholder::new("<API_KEY>", "s3cr3t")]
        );
    }

    #[test]
    fn test_config_from_file() {
        let dir = TempDir::new().unwrap();
        let mut file = NamedTempFile::new().unwrap();
        let config_toml = format!(
            "cassette_library_dir = {:?}\n",
            dir.path().display().to_string()
        );
        file.write_all(config_toml.as_bytes()).unwrap();

        let config = LibraryConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cassette_library_dir, dir.path());
        assert_eq!(config.default_cassette_options.record_mode, RecordMode::Once);
    }

    #[test]
    fn test_invalid_config_missing_dir() {
        let config = LibraryConfig {
            cassette_library_dir: PathBuf::from("/definitely/not/here"),
            default_cassette_options: CassetteOptions::default(),
        };
        assert!(config.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_invalid_placeholder() {
        let options = CassetteOptions {
            placeholders: vec![Placeholder::new("<TOKEN>", "")],
            ..CassetteOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_record_mode_parse() {
        assert_eq!("none".parse::<RecordMode>().unwrap(), RecordMode::None);
        assert_eq!(
            "new_episodes".parse::<RecordMode>().unwrap(),
            RecordMode::NewEpisodes
        );
        assert!("sometimes".parse::<RecordMode>().is_err());
        assert_eq!(RecordMode::All.to_string(), "all");
    }

    #[test]
    fn test_record_mode_table() {
        assert!(!RecordMode::None.allows_recording(true));
        assert!(!RecordMode::None.allows_recording(false));
        assert!(RecordMode::Once.allows_recording(true));
        assert!(!RecordMode::Once.allows_recording(false));
        for mode in [RecordMode::NewEpisodes, RecordMode::All] {
            assert!(mode.allows_recording(true));
            assert!(mode.allows_recording(false));
        }
    }
}
