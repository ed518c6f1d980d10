//! Springer Nature open access API source.

use async_trait::async_trait;
use serde::Deserialize;

use super::extract::{decode, display_name, lenient, non_blank, NoNameFound};
use crate::models::SourceType;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};
use crate::utils::HttpClient;

/// Springer Nature research source
///
/// Requires an API key (`[api_keys] springer` or `SPRINGER_API_KEY`).
#[derive(Debug, Clone)]
pub struct SpringerSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl SpringerSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn query_params(&self, author: &str, rows: usize, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.format_author(author)),
            ("p", rows.to_string()),
            ("api_key", api_key.to_string()),
        ]
    }
}

#[async_trait]
impl Source for SpringerSource {
    fn source_type(&self) -> SourceType {
        SourceType::Springer
    }

    fn supports_offset(&self) -> bool {
        false
    }

    fn format_author(&self, author: &str) -> String {
        let name = author.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("name:\"{}\"", name)
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
            .ok_or(SourceError::MissingApiKey("Springer"))?;

        let body = self
            .client
            .get_json(
                "Springer",
                &self.base_url,
                &self.query_params(author, rows, api_key),
                &[],
            )
            .await?;

        let data: SpResponse = serde_json::from_value(body)?;
        let total = data
            .result
            .first()
            .and_then(|summary| summary.total.as_deref())
            .and_then(|total| total.trim().parse::<usize>().ok());

        Ok(Page::new(
            data.records.into_iter().map(RawRecord::Json).collect(),
            total,
        ))
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        let RawRecord::Json(value) = record else {
            return None;
        };
        let item: SpRecord = decode(SourceType::Springer, value)?;

        // Creators arrive as "Last, First" and are kept in that form
        let authors = item
            .creators
            .iter()
            .map(|c| display_name(None, c.creator.as_deref()))
            .collect::<Result<Vec<_>, NoNameFound>>()
            .ok()?;

        Some(RawFields {
            title: non_blank(item.title.as_deref()),
            journal: non_blank(item.publication_name.as_deref()),
            date: non_blank(item.publication_date.as_deref()),
            authors,
            doi: non_blank(item.doi.as_deref()),
            content_type: non_blank(item.content_type.as_deref()),
        })
    }
}

// ===== Springer API Types =====

#[derive(Debug, Deserialize)]
struct SpResponse {
    #[serde(default)]
    result: Vec<SpResultSummary>,
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SpResultSummary {
    #[serde(default)]
    total: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SpRecord {
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    publication_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    publication_date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    content_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    doi: Option<String>,
    #[serde(deserialize_with = "lenient")]
    creators: Vec<SpCreator>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpCreator {
    #[serde(deserialize_with = "lenient")]
    creator: Option<String>,
}
