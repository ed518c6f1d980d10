//! arXiv source implementation (Atom feed API).

use async_trait::async_trait;

use super::extract::{display_name, NoNameFound};
use crate::models::SourceType;
use crate::pipeline::RequiredFields;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};
use crate::utils::{parse_document, HttpClient};

/// Journal reported for entries without a `journal_ref`
const DEFAULT_JOURNAL: &str = "arXiv";

/// Content type reported for entries without a primary category
const DEFAULT_CONTENT_TYPE: &str = "preprint";

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    base_url: String,
}

impl ArxivSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn query_params(&self, author: &str, rows: usize, offset: usize) -> Vec<(&'static str, String)> {
        vec![
            ("search_query", self.format_author(author)),
            ("start", offset.to_string()),
            ("max_results", rows.to_string()),
        ]
    }

    fn parse_feed(xml: &str) -> Result<Page, SourceError> {
        let feed = parse_document(xml)?;
        if feed.name != "feed" {
            return Err(SourceError::Parse(format!(
                "arXiv: expected an Atom feed, found <{}>",
                feed.name
            )));
        }

        let total = feed
            .child_text("totalResults")
            .and_then(|total| total.parse::<usize>().ok());

        let records = feed
            .children_named("entry")
            .cloned()
            .map(RawRecord::Xml)
            .collect();

        Ok(Page::new(records, total))
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn source_type(&self) -> SourceType {
        SourceType::Arxiv
    }

    /// Journal always resolves (it falls back to "arXiv"), so it is not checked
    fn required_fields(&self) -> RequiredFields {
        RequiredFields::TITLE | RequiredFields::DATE | RequiredFields::AUTHORS
    }

    fn format_author(&self, author: &str) -> String {
        let name = author.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("au:\"{}\"", name)
    }

    async fn fetch_page(
        &self,
        author: &str,
        rows: usize,
        offset: usize,
    ) -> Result<Page, SourceError> {
        let body = self
            .client
            .get_text(
                "arXiv",
                &self.base_url,
                &self.query_params(author, rows, offset),
                &[],
            )
            .await?;

        Self::parse_feed(&body)
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        let RawRecord::Xml(entry) = record else {
            return None;
        };

        let authors = entry
            .children_named("author")
            .map(|author| display_name(None, author.child_text("name").as_deref()))
            .collect::<Result<Vec<_>, NoNameFound>>()
            .ok()?;

        let content_type = entry
            .child("primary_category")
            .and_then(|category| category.attribute("term"))
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Some(RawFields {
            title: entry.child_text("title"),
            journal: Some(
                entry
                    .child_text("journal_ref")
                    .unwrap_or_else(|| DEFAULT_JOURNAL.to_string()),
            ),
            date: entry.child_text("published"),
            authors,
            doi: Some(entry.child_text("doi").unwrap_or_default()),
            content_type: Some(content_type),
        })
    }
}
