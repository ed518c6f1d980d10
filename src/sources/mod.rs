//! Bibliographic source clients behind one trait.
//!
//! Each API is described by a small [`Source`] implementation: how to phrase
//! an author query, how to fetch one page of raw records, and how to pull the
//! publication fields out of one raw record. Pagination, normalization and
//! validity filtering are shared and live in [`crate::pipeline`].
//!
//! # Feature Flags
//!
//! Individual sources can be disabled at compile time using Cargo features:
//!
//! - `source-pubmed` - NCBI E-utilities (default: enabled)
//! - `source-arxiv` - arXiv Atom API (default: enabled)
//! - `source-crossref` - CrossRef REST API (default: enabled)
//! - `source-elsevier` - Elsevier Scopus search, needs `ELSEVIER_API_KEY` (default: enabled)
//! - `source-springer` - Springer Nature open access API, needs `SPRINGER_API_KEY` (default: enabled)
//! - `source-wiley` - Wiley Online Library SRU endpoint (default: enabled)
//! - `source-plos` - PLOS search API (default: enabled)
//! - `source-mdpi` - MDPI works through CrossRef (default: enabled)

#[cfg(feature = "source-arxiv")]
mod arxiv;
#[cfg(feature = "source-crossref")]
mod crossref;
#[cfg(feature = "source-elsevier")]
mod elsevier;
pub mod extract;
#[cfg(feature = "source-mdpi")]
mod mdpi;
#[cfg(feature = "source-plos")]
mod plos;
#[cfg(feature = "source-pubmed")]
mod pubmed;
mod registry;
#[cfg(feature = "source-springer")]
mod springer;
#[cfg(feature = "source-wiley")]
mod wiley;

pub mod mock;

#[cfg(feature = "source-arxiv")]
pub use arxiv::ArxivSource;
#[cfg(feature = "source-crossref")]
pub use crossref::CrossRefSource;
#[cfg(feature = "source-elsevier")]
pub use elsevier::ElsevierSource;
#[cfg(feature = "source-mdpi")]
pub use mdpi::MdpiSource;
pub use mock::{mock_record, MockCall, MockSource};
#[cfg(feature = "source-plos")]
pub use plos::PlosSource;
#[cfg(feature = "source-pubmed")]
pub use pubmed::PubMedSource;
#[cfg(feature = "source-springer")]
pub use springer::SpringerSource;
#[cfg(feature = "source-wiley")]
pub use wiley::WileySource;

pub use extract::RawFields;
pub use registry::SourceRegistry;

use async_trait::async_trait;

use crate::models::SourceType;
use crate::pipeline::RequiredFields;
use crate::utils::XmlNode;

/// One record exactly as the upstream API returned it
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// A JSON object (PubMed, CrossRef, MDPI, Elsevier, Springer, PLOS)
    Json(serde_json::Value),
    /// An XML element (arXiv entries, Wiley SRU record data)
    Xml(XmlNode),
}

/// One page of raw records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<RawRecord>,

    /// Total number of matching records the source reports, if it reports one
    pub total_results: Option<usize>,
}

impl Page {
    pub fn new(records: Vec<RawRecord>, total_results: Option<usize>) -> Self {
        Self {
            records,
            total_results,
        }
    }
}

/// The Source trait describes one bibliographic API.
///
/// # Implementing a New Source
///
/// 1. Add a variant to [`SourceType`]
/// 2. Implement `format_author` with the API's exact query grammar
/// 3. Implement `fetch_page` to issue the request and split the response into records
/// 4. Implement `extract` to read fields from one record without failing on missing keys
/// 5. Register the source in [`SourceRegistry::from_config`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Which API this is
    fn source_type(&self) -> SourceType;

    /// Unique identifier for this source (e.g., "arxiv", "pubmed")
    fn id(&self) -> &'static str {
        self.source_type().id()
    }

    /// Human-readable name of this source
    fn name(&self) -> &'static str {
        self.source_type().name()
    }

    /// Fields a record must carry to be kept
    fn required_fields(&self) -> RequiredFields {
        RequiredFields::TITLE
            | RequiredFields::JOURNAL
            | RequiredFields::DATE
            | RequiredFields::AUTHORS
    }

    /// Whether the API accepts an offset; when it does not, only one page is fetched
    fn supports_offset(&self) -> bool {
        true
    }

    /// Render an author name in the API's query grammar
    fn format_author(&self, author: &str) -> String;

    /// Fetch up to `rows` raw records starting at `offset`
    async fn fetch_page(&self, author: &str, rows: usize, offset: usize)
        -> Result<Page, SourceError>;

    /// Pull publication fields out of one raw record
    ///
    /// Returns `None` only when the record must be discarded outright, for
    /// example when an author entry carries no usable name.
    fn extract(&self, record: &RawRecord) -> Option<RawFields>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The API answered with a non-success status
    #[error("{service} returned HTTP status {status}")]
    Status { service: String, status: u16 },

    /// The response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The source needs an API key that is not configured
    #[error("{0} requires an API key")]
    MissingApiKey(&'static str),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
