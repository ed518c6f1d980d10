//! Core data models for publications and aggregation requests.

mod publication;
mod query;

pub use publication::{Publication, PublicationBuilder, SourceType, UnknownSource};
pub use query::{AggregateResult, AuthorQuery};
