//! Publication model representing one scholarly work from any source.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The bibliographic API a publication was retrieved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceType {
    PubMed,
    #[serde(rename = "arXiv")]
    Arxiv,
    CrossRef,
    Elsevier,
    Springer,
    Wiley,
    #[serde(rename = "PLOS")]
    Plos,
    #[serde(rename = "MDPI")]
    Mdpi,
}

impl SourceType {
    /// Every supported source, in default query order
    pub const ALL: [SourceType; 8] = [
        SourceType::PubMed,
        SourceType::Arxiv,
        SourceType::CrossRef,
        SourceType::Elsevier,
        SourceType::Springer,
        SourceType::Wiley,
        SourceType::Plos,
        SourceType::Mdpi,
    ];

    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::PubMed => "PubMed",
            SourceType::Arxiv => "arXiv",
            SourceType::CrossRef => "CrossRef",
            SourceType::Elsevier => "Elsevier",
            SourceType::Springer => "Springer",
            SourceType::Wiley => "Wiley",
            SourceType::Plos => "PLOS",
            SourceType::Mdpi => "MDPI",
        }
    }

    /// Returns the source identifier used on the command line and in config files
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::PubMed => "pubmed",
            SourceType::Arxiv => "arxiv",
            SourceType::CrossRef => "crossref",
            SourceType::Elsevier => "elsevier",
            SourceType::Springer => "springer",
            SourceType::Wiley => "wiley",
            SourceType::Plos => "plos",
            SourceType::Mdpi => "mdpi",
        }
    }

    /// Parse a comma-separated list of source ids
    ///
    /// `all` expands to every source. Order is kept and repeats are dropped.
    pub fn parse_list(list: &str) -> Result<Vec<SourceType>, UnknownSource> {
        let mut sources = Vec::new();
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let parsed = if part.eq_ignore_ascii_case("all") {
                SourceType::ALL.to_vec()
            } else {
                vec![part.parse()?]
            };
            for source in parsed {
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
        }
        Ok(sources)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a source identifier is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source '{0}'")]
pub struct UnknownSource(pub String);

impl FromStr for SourceType {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SourceType::ALL
            .into_iter()
            .find(|source| source.id() == wanted)
            .ok_or_else(|| UnknownSource(s.trim().to_string()))
    }
}

/// A canonical publication record
///
/// Every source's response is folded into this one shape. Field order matches
/// the export column order (`from, journal, content_type, publication_date,
/// title, authors, doi`). Records are built once by the normalizer and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(rename = "from")]
    source: SourceType,
    journal: Option<String>,
    content_type: Option<String>,
    publication_date: Option<String>,
    title: String,
    authors: Vec<String>,
    doi: String,
}

impl Publication {
    /// Source the record came from
    pub fn source(&self) -> SourceType {
        self.source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn journal(&self) -> Option<&str> {
        self.journal.as_deref()
    }

    /// Publication date in `YYYY-MM-DD` form
    pub fn publication_date(&self) -> Option<&str> {
        self.publication_date.as_deref()
    }

    /// Author display names in the order the source returned them
    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// DOI, or an empty string when the source had none
    pub fn doi(&self) -> &str {
        &self.doi
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Authors joined into one delimited string, as written to tabular exports
    pub fn joined_authors(&self) -> String {
        self.authors.join(", ")
    }
}

/// Builder for constructing Publication objects
#[derive(Debug, Clone)]
pub struct PublicationBuilder {
    publication: Publication,
}

impl PublicationBuilder {
    /// Create a new builder with the required fields
    pub fn new(source: SourceType, title: impl Into<String>) -> Self {
        Self {
            publication: Publication {
                source,
                journal: None,
                content_type: None,
                publication_date: None,
                title: title.into(),
                authors: Vec::new(),
                doi: String::new(),
            },
        }
    }

    pub fn journal(mut self, journal: Option<String>) -> Self {
        self.publication.journal = journal;
        self
    }

    /// Set an already-normalized `YYYY-MM-DD` date
    pub fn publication_date(mut self, date: Option<String>) -> Self {
        self.publication.publication_date = date;
        self
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.publication.authors = authors;
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.publication.doi = doi.into();
        self
    }

    pub fn content_type(mut self, content_type: Option<String>) -> Self {
        self.publication.content_type = content_type;
        self
    }

    /// Build the Publication
    pub fn build(self) -> Publication {
        self.publication
    }
}
