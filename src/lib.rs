//! # pubscraper
//!
//! Collects publication metadata for a list of author names from several
//! bibliographic APIs and folds the heterogeneous responses into one
//! canonical [`Publication`] record.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Publication, AuthorQuery, AggregateResult)
//! - [`sources`]: One client per bibliographic API behind the [`Source`] trait
//! - [`pipeline`]: Normalization, validity filtering, pagination and aggregation
//! - [`utils`]: HTTP client, pacing, retries and XML helpers
//! - [`config`]: Configuration management
//! - [`io`]: Author-name input and dataset export

pub mod config;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use models::{AggregateResult, AuthorQuery, Publication, SourceType};
pub use pipeline::Aggregator;
pub use sources::{Source, SourceError, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
