//! Conversion of extracted fields into canonical publications.
//!
//! This is the only place where date heterogeneity is resolved: every
//! source hands over its best-effort date string and gets back either a
//! `YYYY-MM-DD` date or nothing.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::models::{Publication, PublicationBuilder, SourceType};
use crate::sources::RawFields;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y %b %d",
    "%d %b %Y",
    "%b %d, %Y",
    "%b %d %Y",
];

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Build the canonical record for one extracted record
pub fn normalize(source: SourceType, fields: RawFields) -> Publication {
    let publication_date = fields.date.as_deref().and_then(|raw| {
        let parsed = standardize_date(raw);
        if parsed.is_none() {
            tracing::warn!("{}: unparseable publication date '{}'", source, raw);
        }
        parsed
    });

    PublicationBuilder::new(source, fields.title.unwrap_or_default())
        .journal(fields.journal)
        .publication_date(publication_date)
        .authors(fields.authors)
        .doi(fields.doi.unwrap_or_default())
        .content_type(fields.content_type)
        .build()
}

/// Parse a date in any common notation and render it as `YYYY-MM-DD`
pub fn standardize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|date| date.format("%Y-%m-%d").to_string())
}

/// Permissive calendar-date parser
///
/// Accepts RFC 3339 timestamps, the usual numeric and month-name layouts,
/// and partial dates (year, or year and month) which resolve to the first
/// day of the period.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let date = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
        .or_else(|| parse_compact(text))
        .or_else(|| parse_partial(text))?;

    (1000..=9999).contains(&date.year()).then_some(date)
}

/// `YYYYMMDD`
fn parse_compact(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text[0..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_from_name(token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    if lower.len() < 3 || !lower.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    MONTHS
        .iter()
        .position(|month| lower.starts_with(month))
        .map(|index| index as u32 + 1)
}

/// Year, optional month and optional day picked out of free text,
/// e.g. "2020 Jan-Feb", "2019-07", "Spring 2003"
fn parse_partial(text: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let year_index = tokens
        .iter()
        .position(|t| t.len() == 4 && t.bytes().all(|b| b.is_ascii_digit()))?;
    let year: i32 = tokens[year_index].parse().ok()?;

    let numeric = |index: usize| -> Option<u32> {
        tokens
            .get(index)
            .filter(|t| t.len() <= 2 && t.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|t| t.parse().ok())
    };

    let (month, day) = if let Some(month) = numeric(year_index + 1).filter(|m| (1..=12).contains(m)) {
        (month, numeric(year_index + 2))
    } else if let Some(month) = tokens.iter().find_map(|t| month_from_name(t)) {
        let day = tokens
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != year_index)
            .find_map(|(index, _)| numeric(index));
        (month, day)
    } else {
        (1, None)
    };

    NaiveDate::from_ymd_opt(year, month, day.unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> Option<String> {
        standardize_date(raw)
    }

    #[test]
    fn test_full_dates() {
        assert_eq!(date("2024-01-01").as_deref(), Some("2024-01-01"));
        assert_eq!(date("2021-05-04T17:59:59Z").as_deref(), Some("2021-05-04"));
        assert_eq!(date("2007-01-03T00:00:00+02:00").as_deref(), Some("2007-01-03"));
        assert_eq!(date("2020/01/15 00:00").as_deref(), Some("2020-01-15"));
        assert_eq!(date("2020 Jan 15").as_deref(), Some("2020-01-15"));
        assert_eq!(date("15 March 2020").as_deref(), Some("2020-03-15"));
        assert_eq!(date("March 15, 2020").as_deref(), Some("2020-03-15"));
        assert_eq!(date("20200115").as_deref(), Some("2020-01-15"));
    }

    #[test]
    fn test_partial_dates() {
        assert_eq!(date("2019-07").as_deref(), Some("2019-07-01"));
        assert_eq!(date("2003").as_deref(), Some("2003-01-01"));
        assert_eq!(date("2020 Jan-Feb").as_deref(), Some("2020-01-01"));
        assert_eq!(date("2018 Mar").as_deref(), Some("2018-03-01"));
        assert_eq!(date("Spring 2003").as_deref(), Some("2003-01-01"));
    }

    #[test]
    fn test_malformed_dates() {
        assert_eq!(date(""), None);
        assert_eq!(date("not a date"), None);
        assert_eq!(date("2021-02-30"), None);
        assert_eq!(date("12345"), None);
        assert_eq!(date("0099-01-01"), None);
    }

    #[test]
    fn test_normalize_builds_publication() {
        let fields = RawFields {
            title: Some("Sample Paper".to_string()),
            journal: Some("Journal of Samples".to_string()),
            date: Some("2024-1-1".to_string()),
            authors: vec!["A Albert".to_string()],
            doi: Some("10.1234/sample.doi".to_string()),
            content_type: None,
        };

        let publication = normalize(SourceType::CrossRef, fields);
        assert_eq!(publication.source(), SourceType::CrossRef);
        assert_eq!(publication.title(), "Sample Paper");
        assert_eq!(publication.publication_date(), Some("2024-01-01"));
        assert_eq!(publication.doi(), "10.1234/sample.doi");
    }

    #[test]
    fn test_normalize_keeps_record_with_bad_date() {
        let fields = RawFields {
            title: Some("T".to_string()),
            date: Some("sometime".to_string()),
            ..RawFields::default()
        };

        let publication = normalize(SourceType::Plos, fields);
        assert_eq!(publication.publication_date(), None);
        assert_eq!(publication.doi(), "");
    }
}
