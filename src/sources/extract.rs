//! Shared pieces for the per-source field extractors.
//!
//! Extractors never fail on a missing or malformed field: every field is
//! optional and a gap simply leaves it unset. The only hard failure is an
//! author entry with no usable name, which discards the whole record.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::SourceType;

/// Fields pulled out of one raw record, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub title: Option<String>,
    pub journal: Option<String>,
    /// Best-effort date string, parsed later by the normalizer
    pub date: Option<String>,
    pub authors: Vec<String>,
    pub doi: Option<String>,
    pub content_type: Option<String>,
}

/// An author entry carried neither a given nor a family name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoNameFound;

/// A JSON value that some APIs send as a scalar and others as a list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany<String> {
    /// First non-blank string, trimmed
    pub fn first(&self) -> Option<String> {
        match self {
            OneOrMany::One(value) => non_blank(Some(value.as_str())),
            OneOrMany::Many(values) => values.iter().find_map(|v| non_blank(Some(v.as_str()))),
        }
    }

    /// All non-blank strings, trimmed, in order
    pub fn all(&self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => non_blank(Some(value.as_str())).into_iter().collect(),
            OneOrMany::Many(values) => values
                .iter()
                .filter_map(|v| non_blank(Some(v.as_str())))
                .collect(),
        }
    }
}

/// Trim a string, mapping blank input to `None`
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Display name for one author entry
///
/// "given family" when both parts are present, the family name alone
/// otherwise.
pub fn display_name(given: Option<&str>, family: Option<&str>) -> Result<String, NoNameFound> {
    match (non_blank(given), non_blank(family)) {
        (Some(given), Some(family)) => Ok(format!("{} {}", given, family)),
        (_, Some(family)) => Ok(family),
        (_, None) => Err(NoNameFound),
    }
}

/// Render a `[year, month, day]` triple (month and day optional)
pub fn date_from_parts(parts: &[i64]) -> Option<String> {
    match parts {
        [year, month, day, ..] => Some(format!("{:04}-{:02}-{:02}", year, month, day)),
        [year, month] => Some(format!("{:04}-{:02}", year, month)),
        [year] => Some(format!("{:04}", year)),
        [] => None,
    }
}

/// Deserialize one field, falling back to its default when the value has an unexpected shape
///
/// Used as `#[serde(deserialize_with = "lenient")]` on record fields so a
/// malformed optional field costs that field only, not the whole record.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(&value).unwrap_or_else(|e| {
        tracing::debug!("ignoring malformed field: {}", e);
        T::default()
    }))
}

/// Decode one JSON record into a source's typed view of it
///
/// Fields marked [`lenient`] never fail here. A record that is not an
/// object at all (or a strict field with the wrong type) is logged and
/// treated as unusable.
pub fn decode<T: DeserializeOwned>(source: SourceType, value: &serde_json::Value) -> Option<T> {
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::debug!("{}: skipping record with unexpected shape: {}", source, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_policy() {
        assert_eq!(display_name(Some("A"), Some("Albert")), Ok("A Albert".to_string()));
        assert_eq!(display_name(None, Some("Albert")), Ok("Albert".to_string()));
        assert_eq!(display_name(Some("  "), Some(" Albert ")), Ok("Albert".to_string()));
        assert_eq!(display_name(Some("A"), None), Err(NoNameFound));
        assert_eq!(display_name(None, Some("")), Err(NoNameFound));
    }

    #[test]
    fn test_one_or_many() {
        let one: OneOrMany<String> = serde_json::from_value(json!("Nature")).unwrap();
        assert_eq!(one.first().as_deref(), Some("Nature"));

        let many: OneOrMany<String> = serde_json::from_value(json!(["", " Cell ", "Other"])).unwrap();
        assert_eq!(many.first().as_deref(), Some("Cell"));
        assert_eq!(many.all(), vec!["Cell", "Other"]);

        assert_eq!(OneOrMany::<String>::default().first(), None);
    }

    #[test]
    fn test_date_from_parts() {
        assert_eq!(date_from_parts(&[2024, 1, 1]).as_deref(), Some("2024-01-01"));
        assert_eq!(date_from_parts(&[2019, 7]).as_deref(), Some("2019-07"));
        assert_eq!(date_from_parts(&[2003]).as_deref(), Some("2003"));
        assert_eq!(date_from_parts(&[]), None);
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        #[derive(Debug, Deserialize)]
        struct Item {
            #[allow(dead_code)]
            title: Option<String>,
        }

        assert!(decode::<Item>(SourceType::CrossRef, &json!({"title": 5})).is_none());
        assert!(decode::<Item>(SourceType::CrossRef, &json!({})).is_some());
    }

    #[test]
    fn test_lenient_field_keeps_rest_of_record() {
        #[derive(Debug, Default, Deserialize)]
        #[serde(default)]
        struct Item {
            #[serde(deserialize_with = "lenient")]
            title: Option<String>,
            #[serde(deserialize_with = "lenient")]
            tags: Vec<String>,
        }

        let item: Item = decode(
            SourceType::CrossRef,
            &json!({"title": "Kept", "tags": {"not": "a list"}}),
        )
        .unwrap();
        assert_eq!(item.title.as_deref(), Some("Kept"));
        assert!(item.tags.is_empty());

        let item: Item = decode(SourceType::CrossRef, &json!({"title": 5, "tags": ["a"]})).unwrap();
        assert_eq!(item.title, None);
        assert_eq!(item.tags, vec!["a"]);

        assert!(decode::<Item>(SourceType::CrossRef, &json!("not an object")).is_none());
    }
}
