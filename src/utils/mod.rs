//! Utility modules supporting the source clients.
//!
//! - [`HttpClient`]: shared HTTP client with timeouts, retries and per-source pacing
//! - [`Pacer`]: minimum spacing between consecutive requests
//! - [`RetryConfig`]: configuration for retry logic with exponential backoff
//! - [`with_retry`]: execute an operation with automatic retry on transient errors
//! - [`XmlNode`]: namespace-agnostic element tree for Atom and SRU payloads

mod http;
mod retry;
mod xml;

pub use http::{HttpClient, Pacer};
pub use retry::{with_retry, RetryConfig, TransientError};
pub use xml::{parse_document, XmlNode};
