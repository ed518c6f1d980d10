//! PubMed (NCBI E-utilities) source implementation.
//!
//! Each page is two requests: `esearch` returns the matching UIDs for the
//! requested window, `esummary` returns one summary object per UID.

use async_trait::async_trait;
use serde::Deserialize;

use super::extract::{decode, display_name, lenient, non_blank, NoNameFound};
use crate::models::SourceType;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};
use crate::utils::HttpClient;

/// PubMed research source
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: HttpClient,
    search_url: String,
    summary_url: String,
    database: String,
    affiliation: Option<String>,
}

impl PubMedSource {
    pub fn new(
        client: HttpClient,
        search_url: impl Into<String>,
        summary_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            search_url: search_url.into(),
            summary_url: summary_url.into(),
            database: "pubmed".to_string(),
            affiliation: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Only match authors whose affiliation contains this text
    pub fn with_affiliation(mut self, affiliation: Option<String>) -> Self {
        self.affiliation = affiliation.filter(|a| !a.trim().is_empty());
        self
    }

    fn search_term(&self, author: &str) -> String {
        let term = self.format_author(author);
        match &self.affiliation {
            Some(affiliation) => format!("{} AND {}[Affiliation]", term, affiliation.trim()),
            None => term,
        }
    }

    fn search_params(&self, author: &str, rows: usize, offset: usize) -> Vec<(&'static str, String)> {
        vec![
            ("db", self.database.clone()),
            ("term", self.search_term(author)),
            ("retmax", rows.to_string()),
            ("retstart", offset.to_string()),
            ("retmode", "json".to_string()),
        ]
    }

    fn summary_params(&self, uids: &[String]) -> Vec<(&'static str, String)> {
        vec![
            ("db", self.database.clone()),
            ("id", uids.join(",")),
            ("retmode", "json".to_string()),
        ]
    }

    async fn fetch_summaries(&self, uids: &[String]) -> Result<Vec<RawRecord>, SourceError> {
        let body = self
            .client
            .get_json("PubMed", &self.summary_url, &self.summary_params(uids), &[])
            .await?;

        let result = body
            .get("result")
            .ok_or_else(|| SourceError::Parse("PubMed summary has no result object".to_string()))?;

        // `uids` preserves the search ordering; the summaries are keyed by uid
        let ordered: Vec<String> = result
            .get("uids")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_else(|| uids.to_vec());

        Ok(ordered
            .iter()
            .filter_map(|uid| result.get(uid.as_str()).cloned())
            .map(RawRecord::Json)
            .collect())
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn source_type(&self) -> SourceType {
        SourceType::PubMed
    }

    /// `LastName+FirstInitial[Author]`, or `Name[Author]` for a single token
    fn format_author(&self, author: &str) -> String {
        let parts: Vec<&str> = author.split_whitespace().collect();
        match parts.as_slice() {
            [] => String::new(),
            [only] => format!("{}[Author]", only),
            [first, .., last] => {
                let initial: String = first.chars().take(1).collect();
                format!("{}+{}[Author]", last, initial.to_uppercase())
            }
        }
    }

    async fn fetch_page(
        &self,
        author: &str,
        rows: usize,
        offset: usize,
    ) -> Result<Page, SourceError> {
        let body = self
            .client
            .get_json(
                "PubMed",
                &self.search_url,
                &self.search_params(author, rows, offset),
                &[],
            )
            .await?;

        let search: PmSearchResponse = serde_json::from_value(body)?;
        let total = search
            .esearchresult
            .count
            .as_deref()
            .and_then(|count| count.trim().parse::<usize>().ok());
        let uids = search.esearchresult.idlist;

        tracing::debug!("PubMed: {} uids at offset {}", uids.len(), offset);

        if uids.is_empty() {
            return Ok(Page::new(Vec::new(), total));
        }

        let records = self.fetch_summaries(&uids).await?;
        Ok(Page::new(records, total))
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        let RawRecord::Json(value) = record else {
            return None;
        };
        let summary: PmSummary = decode(SourceType::PubMed, value)?;

        let authors = summary
            .authors
            .iter()
            .map(|a| display_name(None, a.name.as_deref()))
            .collect::<Result<Vec<_>, NoNameFound>>()
            .ok()?;

        let doi = summary
            .articleids
            .iter()
            .find(|id| id.idtype.as_deref() == Some("doi"))
            .and_then(|id| non_blank(id.value.as_deref()));

        Some(RawFields {
            title: non_blank(summary.title.as_deref()),
            journal: non_blank(summary.fulljournalname.as_deref())
                .or_else(|| non_blank(summary.source.as_deref())),
            date: non_blank(summary.sortdate.as_deref())
                .or_else(|| non_blank(summary.pubdate.as_deref())),
            authors,
            doi,
            content_type: summary.pubtype.iter().find_map(|t| non_blank(Some(t.as_str()))),
        })
    }
}

// ===== PubMed API Types =====

#[derive(Debug, Deserialize)]
struct PmSearchResponse {
    esearchresult: PmSearchResult,
}

#[derive(Debug, Deserialize)]
struct PmSearchResult {
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PmSummary {
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    fulljournalname: Option<String>,
    #[serde(deserialize_with = "lenient")]
    source: Option<String>,
    #[serde(deserialize_with = "lenient")]
    sortdate: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pubdate: Option<String>,
    #[serde(deserialize_with = "lenient")]
    authors: Vec<PmAuthor>,
    #[serde(deserialize_with = "lenient")]
    articleids: Vec<PmArticleId>,
    #[serde(deserialize_with = "lenient")]
    pubtype: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PmAuthor {
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PmArticleId {
    #[serde(deserialize_with = "lenient")]
    idtype: Option<String>,
    #[serde(deserialize_with = "lenient")]
    value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> PubMedSource {
        PubMedSource::new(
            HttpClient::new().unwrap(),
            "http://localhost/esearch.fcgi",
            "http://localhost/esummary.fcgi",
        )
    }

    #[test]
    fn test_format_author() {
        let source = source();
        assert_eq!(source.format_author("William Joseph Allen"), "Allen+W[Author]");
        assert_eq!(source.format_author("  marie   curie "), "curie+M[Author]");
        assert_eq!(source.format_author("Plato"), "Plato[Author]");
    }

    #[test]
    fn test_search_params() {
        let params = source().search_params("William Joseph Allen", 5, 10);
        assert_eq!(
            params,
            vec![
                ("db", "pubmed".to_string()),
                ("term", "Allen+W[Author]".to_string()),
                ("retmax", "5".to_string()),
                ("retstart", "10".to_string()),
                ("retmode", "json".to_string()),
            ]
        );
    }

    #[test]
    fn test_affiliation_filter() {
        let source = source().with_affiliation(Some("Texas".to_string()));
        assert_eq!(
            source.search_term("William Allen"),
            "Allen+W[Author] AND Texas[Affiliation]"
        );

        let source = source.with_affiliation(Some(" ".to_string()));
        assert_eq!(source.search_term("William Allen"), "Allen+W[Author]");
    }

    #[test]
    fn test_summary_params() {
        let uids = vec!["1".to_string(), "22".to_string()];
        let params = source().summary_params(&uids);
        assert_eq!(params[1], ("id", "1,22".to_string()));
    }

    #[test]
    fn test_extract_summary() {
        let record = RawRecord::Json(json!({
            "uid": "123",
            "title": "Gene expression in mice",
            "fulljournalname": "Journal of Biology",
            "source": "J Biol",
            "sortdate": "2020/01/15 00:00",
            "pubdate": "2020 Jan 15",
            "authors": [{"name": "Allen W", "authtype": "Author"}, {"name": "Smith J"}],
            "articleids": [
                {"idtype": "pubmed", "value": "123"},
                {"idtype": "doi", "value": "10.1000/jb.2020.1"}
            ],
            "pubtype": ["Journal Article"]
        }));

        let fields = source().extract(&record).unwrap();
        assert_eq!(fields.title.as_deref(), Some("Gene expression in mice"));
        assert_eq!(fields.journal.as_deref(), Some("Journal of Biology"));
        assert_eq!(fields.date.as_deref(), Some("2020/01/15 00:00"));
        assert_eq!(fields.authors, vec!["Allen W", "Smith J"]);
        assert_eq!(fields.doi.as_deref(), Some("10.1000/jb.2020.1"));
        assert_eq!(fields.content_type.as_deref(), Some("Journal Article"));
    }

    #[test]
    fn test_extract_falls_back_to_pubdate() {
        let record = RawRecord::Json(json!({
            "title": "T",
            "source": "J Biol",
            "pubdate": "2018 Mar",
            "authors": []
        }));

        let fields = source().extract(&record).unwrap();
        assert_eq!(fields.journal.as_deref(), Some("J Biol"));
        assert_eq!(fields.date.as_deref(), Some("2018 Mar"));
        assert_eq!(fields.doi, None);
    }

    #[test]
    fn test_malformed_optional_field_keeps_record() {
        let record = RawRecord::Json(json!({
            "title": "Immune Responses",
            "fulljournalname": "Journal of Immunology",
            "sortdate": "2020/05/01 00:00",
            "authors": [{"name": "Smith J"}],
            "articleids": [
                {"idtype": "pmc", "value": 12345},
                {"idtype": "doi", "value": "10.1/x"}
            ],
            "pubtype": "Journal Article"
        }));

        let fields = source().extract(&record).unwrap();
        assert_eq!(fields.title.as_deref(), Some("Immune Responses"));
        assert_eq!(fields.authors, vec!["Smith J"]);
        assert_eq!(fields.doi.as_deref(), Some("10.1/x"));
        assert_eq!(fields.content_type, None);
    }

    #[test]
    fn test_extract_blank_author_rejects_record() {
        let record = RawRecord::Json(json!({
            "title": "T",
            "authors": [{"name": ""}]
        }));
        assert!(source().extract(&record).is_none());
    }
}
