//! Record processing shared by every source.
//!
//! - [`normalize`]: raw fields to a canonical [`crate::Publication`]
//! - [`validity`]: required-field checks
//! - [`paginate`]: the per-(author, source) pagination engine
//! - [`aggregate`]: concurrent fan-out over authors and sources

pub mod aggregate;
pub mod normalize;
pub mod paginate;
pub mod validity;

pub use aggregate::{AggregateError, Aggregator};
pub use normalize::{normalize, parse_date, standardize_date};
pub use paginate::collect_publications;
pub use validity::{is_valid, missing_fields, RequiredFields};
