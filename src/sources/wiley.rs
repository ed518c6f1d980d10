//! Wiley Online Library source (SRU endpoint, Dublin Core records).

use async_trait::async_trait;

use super::extract::{display_name, NoNameFound};
use crate::models::SourceType;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};
use crate::utils::{parse_document, HttpClient, XmlNode};

/// Wiley research source
#[derive(Debug, Clone)]
pub struct WileySource {
    client: HttpClient,
    base_url: String,
}

impl WileySource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// The `query` clause is written into the URL as is; the author name is
    /// already percent-encoded and must not be encoded twice.
    fn request_url(&self, author: &str) -> String {
        format!("{}?query={}", self.base_url, self.format_author(author))
    }

    fn query_params(rows: usize) -> Vec<(&'static str, String)> {
        vec![
            ("operation", "searchRetrieve".to_string()),
            ("maximumRecords", rows.to_string()),
        ]
    }

    fn parse_response(xml: &str) -> Result<Page, SourceError> {
        let root = parse_document(xml)?;

        let total = root
            .descendants_named("numberOfRecords")
            .first()
            .and_then(|node| node.trimmed_text())
            .and_then(|total| total.parse::<usize>().ok());

        let records = root
            .descendants_named("recordData")
            .into_iter()
            .cloned()
            .map(RawRecord::Xml)
            .collect();

        Ok(Page::new(records, total))
    }
}

/// Strip the `doi:` or resolver prefix Dublin Core identifiers often carry
fn clean_doi(identifier: &str) -> Option<String> {
    let trimmed = identifier.trim();
    let lower = trimmed.to_ascii_lowercase();

    for prefix in ["https://doi.org/", "http://doi.org/", "http://dx.doi.org/", "doi:"] {
        if lower.starts_with(prefix) {
            return Some(trimmed[prefix.len()..].trim().to_string());
        }
    }

    trimmed.starts_with("10.").then(|| trimmed.to_string())
}

fn first_text(record: &XmlNode, name: &str) -> Option<String> {
    record
        .descendants_named(name)
        .into_iter()
        .find_map(XmlNode::trimmed_text)
}

#[async_trait]
impl Source for WileySource {
    fn source_type(&self) -> SourceType {
        SourceType::Wiley
    }

    fn supports_offset(&self) -> bool {
        false
    }

    fn format_author(&self, author: &str) -> String {
        let name = author.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("dc.contributor={}", urlencoding::encode(&name))
    }

    async fn fetch_page(
        &self,
        author: &str,
        rows: usize,
        _offset: usize,
    ) -> Result<Page, SourceError> {
        let body = self
            .client
            .get_text(
                "Wiley",
                &self.request_url(author),
                &Self::query_params(rows),
                &[],
            )
            .await?;

        Self::parse_response(&body)
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        let RawRecord::Xml(data) = record else {
            return None;
        };

        let authors = data
            .descendants_named("creator")
            .into_iter()
            .map(|creator| display_name(None, creator.trimmed_text().as_deref()))
            .collect::<Result<Vec<_>, NoNameFound>>()
            .ok()?;

        let doi = data
            .descendants_named("identifier")
            .into_iter()
            .filter_map(XmlNode::trimmed_text)
            .find_map(|identifier| clean_doi(&identifier));

        Some(RawFields {
            title: first_text(data, "title"),
            journal: first_text(data, "source").or_else(|| first_text(data, "publisher")),
            date: first_text(data, "date"),
            authors,
            doi,
            content_type: first_text(data, "type"),
        })
    }
}
