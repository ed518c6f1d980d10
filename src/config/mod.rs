//! Configuration management.
//!
//! A [`Config`] value is built once (defaults, then an optional TOML file,
//! then `PUBSCRAPER_*` environment variables) and handed to the source
//! registry and the aggregator. Nothing reads configuration globally.

mod file_config;

pub use file_config::{ConfigFile, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{SourceType, UnknownSource};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API keys for services that require them
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Concurrency and pacing settings
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Retry settings for transient network failures
    #[serde(default)]
    pub retry: RetrySettings,

    /// Base URLs of every API
    #[serde(default)]
    pub endpoints: Endpoints,

    /// PubMed-specific settings
    #[serde(default)]
    pub pubmed: PubMedConfig,

    /// Which sources are queried when none are named explicitly
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API keys for external services
///
/// Keys missing from the file fall back to environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Elsevier (Scopus) API key, or `ELSEVIER_API_KEY`
    #[serde(default)]
    pub elsevier: Option<String>,

    /// Springer Nature API key, or `SPRINGER_API_KEY`
    #[serde(default)]
    pub springer: Option<String>,
}

impl ApiKeys {
    pub fn elsevier_key(&self) -> Option<String> {
        resolve_key(&self.elsevier, "ELSEVIER_API_KEY")
    }

    pub fn springer_key(&self) -> Option<String> {
        resolve_key(&self.springer, "SPRINGER_API_KEY")
    }
}

fn resolve_key(configured: &Option<String>, env_var: &str) -> Option<String> {
    configured
        .clone()
        .or_else(|| std::env::var(env_var).ok())
        .filter(|key| !key.trim().is_empty())
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Custom User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Contact address sent to CrossRef's polite pool
    #[serde(default)]
    pub mailto: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: None,
            mailto: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Concurrency and pacing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Size of the worker pool shared by all (author, source) tasks
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Per-source overrides
    #[serde(default)]
    pub sources: Vec<SourceRateConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            sources: Vec::new(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}

/// Per-source rate limit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRateConfig {
    /// Source identifier, e.g. "pubmed"
    pub source: String,

    /// Maximum number of authors queried against this source at once
    #[serde(default)]
    pub max_concurrent: Option<usize>,

    /// Minimum spacing between two requests to this source, in milliseconds
    #[serde(default)]
    pub pacing_ms: Option<u64>,
}

/// Effective limits for one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLimits {
    pub max_concurrent: usize,
    pub pacing: Duration,
}

impl RateLimitConfig {
    /// Limits for a source: built-in defaults overlaid with any configured override
    ///
    /// PubMed allows three requests per second without an API key, so it is
    /// queried one author at a time with 400 ms between requests.
    pub fn limits_for(&self, source: SourceType) -> SourceLimits {
        let mut limits = match source {
            SourceType::PubMed => SourceLimits {
                max_concurrent: 1,
                pacing: Duration::from_millis(400),
            },
            _ => SourceLimits {
                max_concurrent: 2,
                pacing: Duration::ZERO,
            },
        };

        if let Some(custom) = self
            .sources
            .iter()
            .find(|rate| rate.source.eq_ignore_ascii_case(source.id()))
        {
            if let Some(max_concurrent) = custom.max_concurrent {
                limits.max_concurrent = max_concurrent;
            }
            if let Some(pacing_ms) = custom.pacing_ms {
                limits.pacing = Duration::from_millis(pacing_ms);
            }
        }

        limits.max_concurrent = limits.max_concurrent.max(1);
        limits
    }
}

/// Retry configuration for transient network failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per request, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, doubled on every further retry
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

/// Base URL of every API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub pubmed_search: String,
    pub pubmed_summary: String,
    pub arxiv: String,
    pub crossref: String,
    pub mdpi: String,
    pub elsevier: String,
    pub springer: String,
    pub wiley: String,
    pub plos: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            pubmed_search: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi".to_string(),
            pubmed_summary: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi"
                .to_string(),
            arxiv: "http://export.arxiv.org/api/query".to_string(),
            crossref: "https://api.crossref.org/works".to_string(),
            mdpi: "https://api.crossref.org/works".to_string(),
            elsevier: "https://api.elsevier.com/content/search/scopus".to_string(),
            springer: "https://api.springernature.com/openaccess/json".to_string(),
            wiley: "https://onlinelibrary.wiley.com/action/sru".to_string(),
            plos: "https://api.plos.org/search".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at one server, keeping each endpoint's path
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            pubmed_search: format!("{}/esearch.fcgi", base),
            pubmed_summary: format!("{}/esummary.fcgi", base),
            arxiv: format!("{}/api/query", base),
            crossref: format!("{}/works", base),
            mdpi: format!("{}/works", base),
            elsevier: format!("{}/content/search/scopus", base),
            springer: format!("{}/openaccess/json", base),
            wiley: format!("{}/action/sru", base),
            plos: format!("{}/search", base),
        }
    }
}

/// PubMed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubMedConfig {
    /// Entrez database to search
    #[serde(default = "default_pubmed_database")]
    pub database: String,

    /// Restrict results to authors whose affiliation matches this text
    #[serde(default)]
    pub affiliation_filter: Option<String>,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            database: default_pubmed_database(),
            affiliation_filter: None,
        }
    }
}

fn default_pubmed_database() -> String {
    "pubmed".to_string()
}

/// Sources configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Comma-separated source ids queried by default (all when unset)
    #[serde(default)]
    pub enabled_sources: Option<String>,
}

impl SourcesConfig {
    /// The configured default sources, or every source when none are listed
    pub fn enabled(&self) -> Result<Vec<SourceType>, UnknownSource> {
        match self.enabled_sources.as_deref().map(SourceType::parse_list) {
            Some(Ok(sources)) if !sources.is_empty() => Ok(sources),
            Some(Err(e)) => Err(e),
            _ => Ok(SourceType::ALL.to_vec()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json"
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a file, with `PUBSCRAPER_*` environment overrides
///
/// Nested keys use a double underscore, e.g. `PUBSCRAPER_HTTP__TIMEOUT_SECS=60`.
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("PUBSCRAPER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find a configuration file in the default locations
///
/// Looks for `./pubscraper.toml`, then `<config dir>/pubscraper/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("pubscraper.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("pubscraper").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration
pub fn get_config() -> Config {
    Config::default()
}
