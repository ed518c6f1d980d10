//! Generic pagination engine shared by every source.
//!
//! The engine keeps asking a [`Source`] for the rows still missing until it
//! holds the requested number of valid records or the source runs dry:
//!
//! ```text
//! Fetching -> Filtering -> Accumulating -> Fetching ...
//!                       -> Exhausted    -> Done
//! ```
//!
//! The offset advances by the number of rows requested, that is by raw
//! records consumed, not by valid records kept.

use super::normalize::normalize;
use super::validity::missing_fields;
use crate::models::Publication;
use crate::sources::{Page, Source, SourceError};

/// Upper bound on pages per (author, source) call, for APIs that ignore the offset
const MAX_PAGES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fetching,
    Filtering,
    Accumulating,
    Exhausted,
    Done,
}

/// Collect up to `rows` valid publications by `author` from `source`
///
/// Returns fewer records when the source reports no more results. Any
/// transport or payload error aborts the whole call.
pub async fn collect_publications(
    source: &dyn Source,
    author: &str,
    rows: i64,
) -> Result<Vec<Publication>, SourceError> {
    let target = usize::try_from(rows).map_err(|_| {
        SourceError::InvalidArgument(format!(
            "row count must be non-negative (received {})",
            rows
        ))
    })?;

    let mut collected: Vec<Publication> = Vec::with_capacity(target.min(100));
    let mut offset = 0;
    let mut requested = 0;
    let mut pages = 0;
    let mut page = Page::default();
    let mut state = State::Fetching;

    loop {
        state = match state {
            State::Fetching => {
                if collected.len() >= target {
                    State::Done
                } else {
                    requested = target - collected.len();
                    tracing::debug!(
                        "{}: requesting {} rows at offset {} for '{}'",
                        source.name(),
                        requested,
                        offset,
                        author
                    );
                    page = source.fetch_page(author, requested, offset).await?;
                    pages += 1;
                    State::Filtering
                }
            }
            State::Filtering => {
                let offset_before = offset;
                offset += requested;

                let received = page.records.len();
                let total = page.total_results;
                let mut kept = 0;

                for record in std::mem::take(&mut page.records) {
                    if collected.len() >= target {
                        break;
                    }
                    let Some(fields) = source.extract(&record) else {
                        tracing::debug!("{}: dropping record with a nameless author", source.name());
                        continue;
                    };
                    let publication = normalize(source.source_type(), fields);
                    let missing = missing_fields(&publication, source.required_fields());
                    if missing.is_empty() {
                        collected.push(publication);
                        kept += 1;
                    } else {
                        tracing::debug!(
                            "{}: dropping incomplete record '{}' (missing {:?})",
                            source.name(),
                            publication.title(),
                            missing.field_names()
                        );
                    }
                }

                tracing::debug!(
                    "{}: page at offset {} gave {} records, {} valid",
                    source.name(),
                    offset_before,
                    received,
                    kept
                );

                let exhausted = !source.supports_offset()
                    || received < requested
                    || total.is_some_and(|total| total < offset_before + requested);

                if exhausted {
                    State::Exhausted
                } else if pages >= MAX_PAGES {
                    tracing::warn!(
                        "{}: stopping after {} pages for '{}'",
                        source.name(),
                        pages,
                        author
                    );
                    State::Exhausted
                } else {
                    State::Accumulating
                }
            }
            State::Accumulating => State::Fetching,
            State::Exhausted => {
                if collected.len() < target {
                    tracing::debug!(
                        "{}: results exhausted with {} of {} records for '{}'",
                        source.name(),
                        collected.len(),
                        target,
                        author
                    );
                }
                State::Done
            }
            State::Done => break,
        };
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use crate::sources::{mock_record, MockCall, MockSource};
    use serde_json::json;

    fn calls(source: &MockSource) -> Vec<(usize, usize)> {
        source
            .calls()
            .into_iter()
            .map(|MockCall { rows, offset, .. }| (rows, offset))
            .collect()
    }

    #[tokio::test]
    async fn test_zero_rows_makes_no_request() {
        let source = MockSource::new(SourceType::CrossRef)
            .with_records(vec![mock_record("One", "2020-01-01")]);

        let publications = collect_publications(&source, "Ada", 0).await.unwrap();
        assert!(publications.is_empty());
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_negative_rows_is_invalid() {
        let source = MockSource::new(SourceType::CrossRef);
        let result = collect_publications(&source, "Ada", -1).await;

        assert!(matches!(result, Err(SourceError::InvalidArgument(_))));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_page_satisfies_request() {
        let source = MockSource::new(SourceType::CrossRef).with_records(vec![
            mock_record("One", "2020-01-01"),
            mock_record("Two", "2020-02-01"),
            mock_record("Three", "2020-03-01"),
        ]);

        let publications = collect_publications(&source, "Ada", 2).await.unwrap();
        let titles: Vec<&str> = publications.iter().map(|p| p.title()).collect();
        assert_eq!(titles, vec!["One", "Two"]);
        assert_eq!(calls(&source), vec![(2, 0)]);
    }

    #[tokio::test]
    async fn test_invalid_records_trigger_next_page() {
        let source = MockSource::new(SourceType::CrossRef).with_records(vec![
            mock_record("One", "2020-01-01"),
            json!({"title": "No journal", "date": "2020-01-01", "authors": ["X"]}),
            json!({"title": "No date", "journal": "J", "authors": ["X"]}),
            mock_record("Two", "2020-02-01"),
            mock_record("Three", "2020-03-01"),
            mock_record("Four", "2020-04-01"),
        ]);

        let publications = collect_publications(&source, "Ada", 3).await.unwrap();
        let titles: Vec<&str> = publications.iter().map(|p| p.title()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);

        // Offsets advance by rows requested, not by valid records kept
        assert_eq!(calls(&source), vec![(3, 0), (2, 3)]);
    }

    #[tokio::test]
    async fn test_small_total_stops_without_error() {
        let source = MockSource::new(SourceType::CrossRef)
            .with_records(vec![mock_record("Only", "2020-01-01")]);

        let publications = collect_publications(&source, "Ada", 2).await.unwrap();
        assert_eq!(publications.len(), 1);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_reported_total_ends_pagination() {
        let source = MockSource::new(SourceType::CrossRef)
            .with_records(vec![
                json!({"title": "Bad one"}),
                json!({"title": "Bad two"}),
                mock_record("Good", "2020-01-01"),
            ])
            .with_total(1);

        let publications = collect_publications(&source, "Ada", 2).await.unwrap();
        assert!(publications.is_empty());
        assert_eq!(calls(&source), vec![(2, 0)]);
    }

    #[tokio::test]
    async fn test_source_without_offset_is_fetched_once() {
        let source = MockSource::new(SourceType::Plos)
            .without_offset()
            .with_records(vec![
                json!({"title": "Bad"}),
                mock_record("Good", "2020-01-01"),
                mock_record("Also good", "2020-01-01"),
            ])
            .with_total(100);

        let publications = collect_publications(&source, "Ada", 2).await.unwrap();
        assert_eq!(publications.len(), 1);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_nameless_author_drops_record() {
        let mut nameless = mock_record("Nameless", "2020-01-01");
        nameless["authors"] = json!(["Ada Lovelace", ""]);

        let source = MockSource::new(SourceType::CrossRef)
            .with_records(vec![nameless, mock_record("Named", "2020-01-01")]);

        let publications = collect_publications(&source, "Ada", 5).await.unwrap();
        assert_eq!(publications.len(), 1);
        assert_eq!(publications[0].title(), "Named");
    }

    #[tokio::test]
    async fn test_every_kept_date_is_canonical() {
        let source = MockSource::new(SourceType::Arxiv)
            .with_required_fields(crate::pipeline::RequiredFields::TITLE)
            .with_records(vec![
                mock_record("A", "2021-05-04T17:59:59Z"),
                mock_record("B", "garbage"),
                mock_record("C", "2019 Jul"),
            ]);

        let publications = collect_publications(&source, "Ada", 3).await.unwrap();
        let dates: Vec<Option<&str>> = publications.iter().map(|p| p.publication_date()).collect();
        assert_eq!(dates, vec![Some("2021-05-04"), None, Some("2019-07-01")]);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_call() {
        let source = MockSource::new(SourceType::PubMed).failing(500);
        let result = collect_publications(&source, "Ada", 3).await;
        assert!(matches!(result, Err(SourceError::Status { status: 500, .. })));
    }
}
