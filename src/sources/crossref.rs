//! CrossRef works search.

use async_trait::async_trait;
use serde::Deserialize;

use super::extract::{
    date_from_parts, decode, display_name, lenient, non_blank, NoNameFound, OneOrMany,
};
use crate::models::SourceType;
use crate::pipeline::RequiredFields;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};
use crate::utils::HttpClient;

const SELECT_FIELDS: &str = "author,title,container-title,published-print,DOI,type";

/// CrossRef research source
///
/// Also backs [`super::MdpiSource`], which restricts the same query to one
/// DOI prefix.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
    mailto: Option<String>,
    source_type: SourceType,
    doi_prefix: Option<&'static str>,
}

impl CrossRefSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            mailto: None,
            source_type: SourceType::CrossRef,
            doi_prefix: None,
        }
    }

    /// Contact address for CrossRef's polite pool
    pub fn with_mailto(mut self, mailto: Option<String>) -> Self {
        self.mailto = mailto.filter(|m| !m.trim().is_empty());
        self
    }

    /// Report results as `source_type` and keep only DOIs under `prefix`
    pub(crate) fn restricted(mut self, source_type: SourceType, prefix: &'static str) -> Self {
        self.source_type = source_type;
        self.doi_prefix = Some(prefix);
        self
    }

    fn query_params(&self, author: &str, rows: usize, offset: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query.author", self.format_author(author)),
            ("rows", rows.to_string()),
            ("offset", offset.to_string()),
            ("select", SELECT_FIELDS.to_string()),
        ];
        if let Some(prefix) = self.doi_prefix {
            params.push(("filter", format!("prefix:{}", prefix)));
        }
        if let Some(mailto) = &self.mailto {
            params.push(("mailto", mailto.clone()));
        }
        params
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn required_fields(&self) -> RequiredFields {
        RequiredFields::TITLE
            | RequiredFields::JOURNAL
            | RequiredFields::DATE
            | RequiredFields::AUTHORS
            | RequiredFields::DOI
    }

    fn format_author(&self, author: &str) -> String {
        author.trim().replace(' ', "+")
    }

    async fn fetch_page(
        &self,
        author: &str,
        rows: usize,
        offset: usize,
    ) -> Result<Page, SourceError> {
        let params = self.query_params(author, rows, offset);
        let body = self
            .client
            .get_json(self.source_type.name(), &self.base_url, &params, &[])
            .await?;

        let data: CrResponse = serde_json::from_value(body)?;
        let records = data
            .message
            .items
            .into_iter()
            .map(RawRecord::Json)
            .collect();

        Ok(Page::new(records, data.message.total_results))
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        let RawRecord::Json(value) = record else {
            return None;
        };
        let item: CrItem = decode(self.source_type, value)?;

        let authors = item
            .author
            .iter()
            .map(CrAuthor::display_name)
            .collect::<Result<Vec<_>, NoNameFound>>()
            .ok()?;

        let date = item
            .published_print
            .as_ref()
            .or(item.published.as_ref())
            .and_then(CrDate::first);

        Some(RawFields {
            title: item.title.first(),
            journal: item.container_title.first(),
            date,
            authors,
            doi: non_blank(item.doi.as_deref()),
            content_type: non_blank(item.kind.as_deref()),
        })
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CrResponse {
    message: CrMessage,
}

#[derive(Debug, Deserialize)]
struct CrMessage {
    #[serde(rename = "total-results", default)]
    total_results: Option<usize>,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrItem {
    #[serde(deserialize_with = "lenient")]
    title: OneOrMany<String>,
    #[serde(rename = "container-title", deserialize_with = "lenient")]
    container_title: OneOrMany<String>,
    #[serde(deserialize_with = "lenient")]
    author: Vec<CrAuthor>,
    #[serde(rename = "published-print", deserialize_with = "lenient")]
    published_print: Option<CrDate>,
    #[serde(deserialize_with = "lenient")]
    published: Option<CrDate>,
    #[serde(rename = "DOI", deserialize_with = "lenient")]
    doi: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrAuthor {
    #[serde(deserialize_with = "lenient")]
    given: Option<String>,
    #[serde(deserialize_with = "lenient")]
    family: Option<String>,
    /// Organisations carry a single `name`
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
}

impl CrAuthor {
    fn display_name(&self) -> Result<String, NoNameFound> {
        display_name(self.given.as_deref(), self.family.as_deref())
            .or_else(|e| non_blank(self.name.as_deref()).ok_or(e))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrDate {
    #[serde(rename = "date-parts", deserialize_with = "lenient")]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrDate {
    fn first(&self) -> Option<String> {
        let parts: Vec<i64> = self
            .date_parts
            .first()?
            .iter()
            .map_while(|part| *part)
            .collect();
        date_from_parts(&parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> CrossRefSource {
        CrossRefSource::new(HttpClient::new().unwrap(), "http://localhost/works")
    }

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_query_params() {
        let source = source().with_mailto(Some("lab@example.org".to_string()));
        let params = source.query_params("William Joseph Allen", 10, 20);

        assert_eq!(param(&params, "query.author"), Some("William+Joseph+Allen"));
        assert_eq!(param(&params, "rows"), Some("10"));
        assert_eq!(param(&params, "offset"), Some("20"));
        assert_eq!(param(&params, "select"), Some(SELECT_FIELDS));
        assert_eq!(param(&params, "mailto"), Some("lab@example.org"));
        assert_eq!(param(&params, "filter"), None);
    }

    #[test]
    fn test_blank_mailto_is_not_sent() {
        let source = source().with_mailto(Some("  ".to_string()));
        let params = source.query_params("Albert", 1, 0);
        assert_eq!(param(&params, "mailto"), None);
    }

    #[test]
    fn test_extract_complete_item() {
        let record = RawRecord::Json(json!({
            "title": ["Sample Paper"],
            "container-title": ["Journal of Samples"],
            "author": [{"given": "A", "family": "Albert"}],
            "published-print": {"date-parts": [[2024, 1, 1]]},
            "DOI": "10.1234/sample.doi",
            "type": "journal-article"
        }));

        let fields = source().extract(&record).unwrap();
        assert_eq!(fields.title.as_deref(), Some("Sample Paper"));
        assert_eq!(fields.journal.as_deref(), Some("Journal of Samples"));
        assert_eq!(fields.date.as_deref(), Some("2024-01-01"));
        assert_eq!(fields.authors, vec!["A Albert"]);
        assert_eq!(fields.doi.as_deref(), Some("10.1234/sample.doi"));
        assert_eq!(fields.content_type.as_deref(), Some("journal-article"));
    }

    #[test]
    fn test_extract_tolerates_missing_keys() {
        let record = RawRecord::Json(json!({
            "title": ["Untitled Journal"],
            "author": [{"family": "Curie"}],
            "published": {"date-parts": [[2019, 7]]}
        }));

        let fields = source().extract(&record).unwrap();
        assert_eq!(fields.journal, None);
        assert_eq!(fields.doi, None);
        assert_eq!(fields.date.as_deref(), Some("2019-07"));
        assert_eq!(fields.authors, vec!["Curie"]);
    }

    #[test]
    fn test_malformed_optional_field_keeps_record() {
        let record = RawRecord::Json(json!({
            "title": ["Sample Paper"],
            "container-title": ["Journal of Samples"],
            "author": [{"given": "A", "family": "Albert"}],
            "published-print": {"date-parts": [[2024, 1, 1]]},
            "DOI": "10.1234/sample.doi",
            "type": ["journal-article"]
        }));

        let fields = source().extract(&record).unwrap();
        assert_eq!(fields.title.as_deref(), Some("Sample Paper"));
        assert_eq!(fields.doi.as_deref(), Some("10.1234/sample.doi"));
        assert_eq!(fields.authors, vec!["A Albert"]);
        assert_eq!(fields.content_type, None);

        let record = RawRecord::Json(json!({
            "title": ["Sample Paper"],
            "author": [{"given": 7, "family": "Albert"}],
            "published-print": {"date-parts": "2024"}
        }));
        let fields = source().extract(&record).unwrap();
        assert_eq!(fields.authors, vec!["Albert"]);
        assert_eq!(fields.date, None);
    }

    #[test]
    fn test_extract_null_date_parts() {
        let record = RawRecord::Json(json!({
            "title": ["T"],
            "published-print": {"date-parts": [[null]]}
        }));

        let fields = source().extract(&record).unwrap();
        assert_eq!(fields.date, None);
    }

    #[test]
    fn test_nameless_author_rejects_record() {
        let record = RawRecord::Json(json!({
            "title": ["Sample"],
            "author": [{"given": "A", "family": "Albert"}, {"given": "B"}]
        }));
        assert!(source().extract(&record).is_none());

        let organisation = RawRecord::Json(json!({
            "title": ["Sample"],
            "author": [{"name": "The Consortium"}]
        }));
        assert_eq!(
            source().extract(&organisation).unwrap().authors,
            vec!["The Consortium"]
        );
    }
}
