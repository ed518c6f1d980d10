//! Aggregation request and result models.

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{Publication, SourceType};

/// One author's request: a raw name, the number of rows wanted per source,
/// and the sources to ask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorQuery {
    /// Author name as supplied by the caller
    pub name: String,

    /// Requested number of valid records per source
    pub rows: usize,

    /// Sources to query, in order
    pub sources: Vec<SourceType>,
}

impl AuthorQuery {
    /// Create a query, or `None` when the name is blank
    pub fn new(name: &str, rows: usize, sources: &[SourceType]) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            rows,
            sources: sources.to_vec(),
        })
    }
}

/// Publications grouped per author
///
/// Authors keep the order they were supplied in. Each author's list holds
/// the records of every source in query order, then in the order each source
/// returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    entries: Vec<(String, Vec<Publication>)>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an author's publications, replacing any earlier list for the same name
    pub fn insert(&mut self, author: impl Into<String>, publications: Vec<Publication>) {
        let author = author.into();
        match self.entries.iter_mut().find(|(name, _)| *name == author) {
            Some((_, existing)) => *existing = publications,
            None => self.entries.push((author, publications)),
        }
    }

    pub fn get(&self, author: &str) -> Option<&[Publication]> {
        self.entries
            .iter()
            .find(|(name, _)| name == author)
            .map(|(_, publications)| publications.as_slice())
    }

    pub fn contains(&self, author: &str) -> bool {
        self.get(author).is_some()
    }

    /// Author names in insertion order
    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Publication])> {
        self.entries
            .iter()
            .map(|(name, publications)| (name.as_str(), publications.as_slice()))
    }

    /// Number of authors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of publications across all authors
    pub fn publication_count(&self) -> usize {
        self.entries.iter().map(|(_, publications)| publications.len()).sum()
    }

    /// Drop publications dated after `cutoff`
    ///
    /// Records without a date are kept.
    pub fn with_cutoff(self, cutoff: NaiveDate) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|(name, publications)| {
                let kept = publications
                    .into_iter()
                    .filter(|publication| {
                        publication
                            .publication_date()
                            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
                            .map_or(true, |date| date <= cutoff)
                    })
                    .collect();
                (name, kept)
            })
            .collect();

        Self { entries }
    }
}

impl IntoIterator for AggregateResult {
    type Item = (String, Vec<Publication>);
    type IntoIter = std::vec::IntoIter<(String, Vec<Publication>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for AggregateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, publications) in &self.entries {
            map.serialize_entry(name, publications)?;
        }
        map.end()
    }
}
