//! Configuration for the traffic recorder.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Traffic recording configuration.
///
/// Recording is disabled until a directory is configured; control commands
/// fail with `BadValue` while the directory is empty.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory that recording files are created in.
    ///
    /// An empty string means recording is disabled.
    pub directory: String,
}

impl RecordingConfig {
    /// Creates a configuration pointing at `directory`.
    #[must_use]
    pub fn new(directory: impl Into<String>) -> Self {
        Self { directory: directory.into() }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Returns true if a recording directory has been configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.directory.is_empty()
    }

    /// Validate the configured directory.
    ///
    /// An empty directory is valid (recording stays disabled); a non-empty
    /// value must name an existing directory.
    ///
    /// # Errors
    ///
    /// Returns `FileNotOpen` if the directory does not exist.
    pub fn validate(&self) -> Result<()> {
        if self.directory.is_empty() {
            return Ok(());
        }

        if !Path::new(&self.directory).is_dir() {
            return Err(Error::FileNotOpen(self.directory.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let config = RecordingConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_existing_directory_validates() {
        let temp_dir = TempDir::new().unwrap();
        let config = RecordingConfig::new(temp_dir.path().to_string_lossy());
        assert!(config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_directory_rejected() {
        let config = RecordingConfig::new("/nonexistent/recording/dir");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::FileNotOpen(_)));
    }

    #[test]
    fn test_parse_toml() {
        let config = RecordingConfig::parse("directory = \"/tmp\"").unwrap();
        assert_eq!(config.directory, "/tmp");

        let config = RecordingConfig::parse("").unwrap();
        assert!(!config.is_enabled());
    }
}
