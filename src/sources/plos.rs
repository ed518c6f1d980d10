//! PLOS search API source.

use async_trait::async_trait;
use serde::Deserialize;

use super::extract::{decode, display_name, lenient, non_blank, NoNameFound, OneOrMany};
use crate::models::SourceType;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};
use crate::utils::HttpClient;

/// PLOS research source
#[derive(Debug, Clone)]
pub struct PlosSource {
    client: HttpClient,
    base_url: String,
}

impl PlosSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn query_params(&self, author: &str, rows: usize) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.format_author(author)),
            ("rows", rows.to_string()),
            ("wt", "json".to_string()),
        ]
    }
}

#[async_trait]
impl Source for PlosSource {
    fn source_type(&self) -> SourceType {
        SourceType::Plos
    }

    fn supports_offset(&self) -> bool {
        false
    }

    fn format_author(&self, author: &str) -> String {
        let name = author.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("author:\"{}\"", name)
    }

    async fn fetch_page(
        &self,
        author: &str,
        rows: usize,
        _offset: usize,
    ) -> Result<Page, SourceError> {
        let body = self
            .client
            .get_json("PLOS", &self.base_url, &self.query_params(author, rows), &[])
            .await?;

        let data: PlosResponse = serde_json::from_value(body)?;
        Ok(Page::new(
            data.response.docs.into_iter().map(RawRecord::Json).collect(),
            data.response.num_found,
        ))
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        let RawRecord::Json(value) = record else {
            return None;
        };
        let doc: PlosDoc = decode(SourceType::Plos, value)?;

        let authors = doc
            .author_display
            .iter()
            .map(|name| display_name(None, Some(name.as_str())))
            .collect::<Result<Vec<_>, NoNameFound>>()
            .ok()?;

        Some(RawFields {
            title: non_blank(doc.title_display.as_deref()),
            journal: non_blank(doc.journal.as_deref()),
            date: non_blank(doc.publication_date.as_deref()),
            authors,
            doi: non_blank(doc.id.as_deref()),
            content_type: doc.article_type.first(),
        })
    }
}

// ===== PLOS API Types =====

#[derive(Debug, Deserialize)]
struct PlosResponse {
    response: PlosResults,
}

#[derive(Debug, Deserialize)]
struct PlosResults {
    #[serde(rename = "numFound", default)]
    num_found: Option<usize>,
    #[serde(default)]
    docs: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlosDoc {
    /// The DOI
    #[serde(deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    journal: Option<String>,
    #[serde(deserialize_with = "lenient")]
    article_type: OneOrMany<String>,
    #[serde(deserialize_with = "lenient")]
    publication_date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    title_display: Option<String>,
    #[serde(deserialize_with = "lenient")]
    author_display: Vec<String>,
}
