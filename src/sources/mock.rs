//! Mock source for testing purposes.
//!
//! Serves a fixed list of JSON records, sliced by the requested offset and
//! row count, and records every call it receives.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::extract::{decode, display_name, lenient, non_blank, NoNameFound};
use crate::models::SourceType;
use crate::pipeline::RequiredFields;
use crate::sources::{Page, RawFields, RawRecord, Source, SourceError};

/// One `fetch_page` call received by a [`MockSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub author: String,
    pub rows: usize,
    pub offset: usize,
}

/// A mock source for testing that serves predefined records.
#[derive(Debug)]
pub struct MockSource {
    source_type: SourceType,
    records: Vec<Value>,
    total: Option<usize>,
    paginates: bool,
    required: RequiredFields,
    failure: Option<u16>,
    delay: Duration,
    calls: Mutex<Vec<MockCall>>,
}

impl MockSource {
    /// Create a mock with no records, reporting as `source_type`
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            records: Vec::new(),
            total: None,
            paginates: true,
            required: RequiredFields::TITLE
                | RequiredFields::JOURNAL
                | RequiredFields::DATE
                | RequiredFields::AUTHORS,
            failure: None,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Records served in order; the reported total defaults to their count
    pub fn with_records(mut self, records: Vec<Value>) -> Self {
        self.records = records;
        self
    }

    /// Report this total instead of the number of records
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Behave like an API without an offset parameter
    pub fn without_offset(mut self) -> Self {
        self.paginates = false;
        self
    }

    pub fn with_required_fields(mut self, required: RequiredFields) -> Self {
        self.required = required;
        self
    }

    /// Answer every request with this HTTP status
    pub fn failing(mut self, status: u16) -> Self {
        self.failure = Some(status);
        self
    }

    /// Sleep before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock_calls().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A complete record in the mock's schema
pub fn mock_record(title: &str, date: &str) -> Value {
    json!({
        "title": title,
        "journal": "Journal of Mocks",
        "date": date,
        "authors": ["Ada Lovelace"],
        "doi": format!("10.0000/{}", title.to_lowercase().replace(' ', "-")),
    })
}

#[async_trait]
impl Source for MockSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn required_fields(&self) -> RequiredFields {
        self.required
    }

    fn supports_offset(&self) -> bool {
        self.paginates
    }

    fn format_author(&self, author: &str) -> String {
        author.trim().to_string()
    }

    async fn fetch_page(
        &self,
        author: &str,
        rows: usize,
        offset: usize,
    ) -> Result<Page, SourceError> {
        self.lock_calls().push(MockCall {
            author: self.format_author(author),
            rows,
            offset,
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(status) = self.failure {
            return Err(SourceError::Status {
                service: self.source_type.name().to_string(),
                status,
            });
        }

        let start = if self.paginates { offset } else { 0 };
        let records = self
            .records
            .iter()
            .skip(start)
            .take(rows)
            .cloned()
            .map(RawRecord::Json)
            .collect();

        Ok(Page::new(
            records,
            Some(self.total.unwrap_or(self.records.len())),
        ))
    }

    fn extract(&self, record: &RawRecord) -> Option<RawFields> {
        let RawRecord::Json(value) = record else {
            return None;
        };
        let item: MockItem = decode(self.source_type, value)?;

        let authors = item
            .authors
            .iter()
            .map(|name| display_name(None, Some(name.as_str())))
            .collect::<Result<Vec<_>, NoNameFound>>()
            .ok()?;

        Some(RawFields {
            title: non_blank(item.title.as_deref()),
            journal: non_blank(item.journal.as_deref()),
            date: non_blank(item.date.as_deref()),
            authors,
            doi: non_blank(item.doi.as_deref()),
            content_type: non_blank(item.kind.as_deref()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MockItem {
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    journal: Option<String>,
    #[serde(deserialize_with = "lenient")]
    date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    authors: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    doi: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient")]
    kind: Option<String>,
}
