//! MDPI articles, found through CrossRef by DOI prefix.

use async_trait::async_trait;

use super::crossref::CrossRefSource;
use crate::models::SourceType;
use crate::pipeline::RequiredFields;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};
use crate::utils::HttpClient;

/// DOI prefix registered to MDPI
const MDPI_DOI_PREFIX: &str = "10.3390";

/// MDPI research source
#[derive(Debug, Clone)]
pub struct MdpiSource {
    inner: CrossRefSource,
}

impl MdpiSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            inner: CrossRefSource::new(client, base_url)
                .restricted(SourceType::Mdpi, MDPI_DOI_PREFIX),
        }
    }

    pub fn with_mailto(self, mailto: Option<String>) -> Self {
        Self {
            inner: self.inner.with_mailto(mailto),
        }
    }
}

#[async_trait]
impl Source for MdpiSource {
    fn source_type(&self) -> SourceType {
        SourceType::Mdpi
    }

    fn required_fields(&self) -> RequiredFields {
        self.inner.required_fields()
    }

    fn format_author(&self, author: &str) -> String {
        self.inner.format_author(author)
    }

    async fn fetch_page(
        &self,
        author: &str,
        rows: usize,
        offset: usize,
    ) -> Result<Page, SourceError> {
        self.inner.fetch_page(author, rows, offset).await
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        self.inner.extract(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reports_as_mdpi() {
        let source = MdpiSource::new(HttpClient::new().unwrap(), "http://localhost/works");
        assert_eq!(source.source_type(), SourceType::Mdpi);
        assert_eq!(source.id(), "mdpi");
        assert_eq!(source.format_author("Jane Q Doe"), "Jane+Q+Doe");
        assert!(source.required_fields().contains(RequiredFields::DOI));
    }

    #[test]
    fn test_extracts_crossref_items() {
        let source = MdpiSource::new(HttpClient::new().unwrap(), "http://localhost/works");
        let record = RawRecord::Json(json!({
            "title": ["Soil Microbes"],
            "container-title": ["Microorganisms"],
            "author": [{"given": "Ana", "family": "Lima"}],
            "published-print": {"date-parts": [[2021, 3, 9]]},
            "DOI": "10.3390/microorganisms9030555"
        }));

        let fields = source.extract(&record).unwrap();
        assert_eq!(fields.journal.as_deref(), Some("Microorganisms"));
        assert_eq!(fields.date.as_deref(), Some("2021-03-09"));
    }
}
