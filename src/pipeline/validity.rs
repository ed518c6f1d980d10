//! Completeness check applied to every candidate record.

use crate::models::Publication;

bitflags::bitflags! {
    /// Fields a source requires before a record counts toward a request
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequiredFields: u8 {
        const TITLE = 1 << 0;
        const JOURNAL = 1 << 1;
        const DATE = 1 << 2;
        const AUTHORS = 1 << 3;
        const DOI = 1 << 4;
    }
}

impl RequiredFields {
    /// Export names of the flagged fields
    pub fn field_names(self) -> Vec<&'static str> {
        [
            (RequiredFields::TITLE, "title"),
            (RequiredFields::JOURNAL, "journal"),
            (RequiredFields::DATE, "publication_date"),
            (RequiredFields::AUTHORS, "authors"),
            (RequiredFields::DOI, "doi"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Required fields that are absent or empty on `publication`
pub fn missing_fields(publication: &Publication, required: RequiredFields) -> RequiredFields {
    let mut missing = RequiredFields::empty();

    if required.contains(RequiredFields::TITLE) && !present(Some(publication.title())) {
        missing |= RequiredFields::TITLE;
    }
    if required.contains(RequiredFields::JOURNAL) && !present(publication.journal()) {
        missing |= RequiredFields::JOURNAL;
    }
    if required.contains(RequiredFields::DATE) && !present(publication.publication_date()) {
        missing |= RequiredFields::DATE;
    }
    if required.contains(RequiredFields::AUTHORS)
        && (publication.authors().is_empty()
            || publication.authors().iter().any(|a| a.trim().is_empty()))
    {
        missing |= RequiredFields::AUTHORS;
    }
    if required.contains(RequiredFields::DOI) && !present(Some(publication.doi())) {
        missing |= RequiredFields::DOI;
    }

    missing
}

/// Whether every required field is present and non-empty
pub fn is_valid(publication: &Publication, required: RequiredFields) -> bool {
    missing_fields(publication, required).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PublicationBuilder, SourceType};

    fn complete() -> PublicationBuilder {
        PublicationBuilder::new(SourceType::CrossRef, "Sample Paper")
            .journal(Some("Journal".to_string()))
            .publication_date(Some("2024-01-01".to_string()))
            .authors(vec!["A Albert".to_string()])
            .doi("10.1234/sample.doi")
    }

    const CROSSREF: RequiredFields = RequiredFields::all();

    #[test]
    fn test_complete_record_is_valid() {
        assert!(is_valid(&complete().build(), CROSSREF));
    }

    #[test]
    fn test_missing_journal() {
        let publication = complete().journal(None).build();
        assert!(!is_valid(&publication, CROSSREF));
        assert_eq!(missing_fields(&publication, CROSSREF), RequiredFields::JOURNAL);

        // Sources that never require a journal still accept it
        let arxiv = RequiredFields::TITLE | RequiredFields::DATE | RequiredFields::AUTHORS;
        assert!(is_valid(&publication, arxiv));
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let publication = PublicationBuilder::new(SourceType::Plos, "  ")
            .journal(Some(String::new()))
            .publication_date(None)
            .doi("")
            .build();

        assert_eq!(missing_fields(&publication, CROSSREF), RequiredFields::all());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(
            (RequiredFields::TITLE | RequiredFields::DOI).field_names(),
            vec!["title", "doi"]
        );
    }
}
