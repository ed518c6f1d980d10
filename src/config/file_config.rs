//! Configuration file support for pubscraper.
//!
//! This module reads and writes the TOML configuration file directly,
//! without environment overrides. It backs `pubscraper config --init`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! elsevier = "your-elsevier-key"
//! springer = "your-springer-key"
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! mailto = "you@example.org"
//!
//! [rate_limits]
//! max_concurrent_requests = 4
//!
//! [[rate_limits.sources]]
//! source = "pubmed"
//! max_concurrent = 1
//! pacing_ms = 400
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//!
//! [pubmed]
//! database = "pubmed"
//! affiliation_filter = "University of Texas"
//!
//! [sources]
//! enabled_sources = "pubmed,arxiv,crossref"
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use std::path::Path;

use super::Config;

/// A configuration file on disk
#[derive(Debug, Default)]
pub struct ConfigFile {
    pub config: Config,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        let config = toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))?;
        Ok(Self { config })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
