//! Elsevier Scopus search source implementation.
//!
//! Requires an API key, configured under `[api_keys] elsevier` or
//! `ELSEVIER_API_KEY`.

use async_trait::async_trait;
use serde::Deserialize;

use super::extract::{decode, display_name, lenient, non_blank, NoNameFound};
use crate::models::SourceType;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};
use crate::utils::HttpClient;

/// Elsevier (Scopus) research source
#[derive(Debug, Clone)]
pub struct ElsevierSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl ElsevierSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn query_params(&self, author: &str, rows: usize, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("query", self.format_author(author)),
            ("count", rows.to_string()),
            ("apiKey", api_key.to_string()),
        ]
    }
}

#[async_trait]
impl Source for ElsevierSource {
    fn source_type(&self) -> SourceType {
        SourceType::Elsevier
    }

    fn supports_offset(&self) -> bool {
        false
    }

    fn format_author(&self, author: &str) -> String {
        let name = author.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("AUTHOR-NAME({})", name)
    }

    async fn fetch_page(
        &self,
        author: &str,
        rows: usize,
        _offset: usize,
    ) -> Result<Page, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingApiKey("Elsevier"))?;

        let body = self
            .client
            .get_json(
                "Elsevier",
                &self.base_url,
                &self.query_params(author, rows, api_key),
                &[("Accept", "application/json")],
            )
            .await?;

        let data: ElResponse = serde_json::from_value(body)?;
        let total = data
            .search_results
            .total_results
            .as_deref()
            .and_then(|total| total.trim().parse::<usize>().ok());

        // An empty result set comes back as a single entry carrying only `error`
        let records = data
            .search_results
            .entry
            .into_iter()
            .filter(|entry| entry.get("error").is_none())
            .map(RawRecord::Json)
            .collect();

        Ok(Page::new(records, total))
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        let RawRecord::Json(value) = record else {
            return None;
        };
        let entry: ElEntry = decode(SourceType::Elsevier, value)?;

        let authors = if entry.author.is_empty() {
            non_blank(entry.creator.as_deref()).into_iter().collect()
        } else {
            entry
                .author
                .iter()
                .map(ElAuthor::display_name)
                .collect::<Result<Vec<_>, NoNameFound>>()
                .ok()?
        };

        Some(RawFields {
            title: non_blank(entry.title.as_deref()),
            journal: non_blank(entry.publication_name.as_deref()),
            date: non_blank(entry.cover_date.as_deref()),
            authors,
            doi: non_blank(entry.doi.as_deref()),
            content_type: non_blank(entry.subtype_description.as_deref()),
        })
    }
}

// ===== Elsevier API Types =====

#[derive(Debug, Deserialize)]
struct ElResponse {
    #[serde(rename = "search-results")]
    search_results: ElSearchResults,
}

#[derive(Debug, Deserialize)]
struct ElSearchResults {
    #[serde(rename = "opensearch:totalResults", default)]
    total_results: Option<String>,
    #[serde(default)]
    entry: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ElEntry {
    #[serde(rename = "dc:title", deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(rename = "prism:publicationName", deserialize_with = "lenient")]
    publication_name: Option<String>,
    #[serde(rename = "prism:coverDate", deserialize_with = "lenient")]
    cover_date: Option<String>,
    #[serde(rename = "prism:doi", deserialize_with = "lenient")]
    doi: Option<String>,
    #[serde(rename = "subtypeDescription", deserialize_with = "lenient")]
    subtype_description: Option<String>,
    #[serde(rename = "dc:creator", deserialize_with = "lenient")]
    creator: Option<String>,
    #[serde(deserialize_with = "lenient")]
    author: Vec<ElAuthor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ElAuthor {
    /// Display form, usually "Surname I."
    #[serde(deserialize_with = "lenient")]
    authname: Option<String>,
    #[serde(rename = "given-name", deserialize_with = "lenient")]
    given_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    surname: Option<String>,
}

impl ElAuthor {
    fn display_name(&self) -> Result<String, NoNameFound> {
        display_name(self.given_name.as_deref(), self.surname.as_deref())
            .or_else(|e| non_blank(self.authname.as_deref()).ok_or(e))
    }
}
