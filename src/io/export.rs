//! Writing an aggregate result to disk.
//!
//! Output is written to a temporary file next to the destination and
//! renamed into place only once the whole dataset has been written, so an
//! interrupted run never leaves a truncated file behind.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tempfile::NamedTempFile;

use crate::models::AggregateResult;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Object keyed by author name
    #[default]
    Json,
    /// One row per publication
    Csv,
}

impl ExportFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Errors writing an export file
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Serialize)]
struct CsvRow<'a> {
    author: &'a str,
    from: &'a str,
    journal: Option<&'a str>,
    content_type: Option<&'a str>,
    publication_date: Option<&'a str>,
    title: &'a str,
    authors: String,
    doi: &'a str,
}

/// Write `result` as a JSON object `{author: [publication, ...]}`
pub fn write_json<W: Write>(result: &AggregateResult, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, result)?;
    Ok(())
}

/// Write `result` as CSV, one row per publication
pub fn write_csv<W: Write>(result: &AggregateResult, writer: W) -> Result<(), ExportError> {
    let mut csv = csv::WriterBuilder::new().has_headers(true).from_writer(writer);

    for (author, publications) in result.iter() {
        for publication in publications {
            csv.serialize(CsvRow {
                author,
                from: publication.source().name(),
                journal: publication.journal(),
                content_type: publication.content_type(),
                publication_date: publication.publication_date(),
                title: publication.title(),
                authors: publication.joined_authors(),
                doi: publication.doi(),
            })?;
        }
    }

    csv.flush()?;
    Ok(())
}

/// Write `result` to `path` atomically
pub fn export_to_path(
    result: &AggregateResult,
    path: &Path,
    format: ExportFormat,
) -> Result<(), ExportError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    match format {
        ExportFormat::Json => write_json(result, file.as_file_mut())?,
        ExportFormat::Csv => write_csv(result, file.as_file_mut())?,
    }
    file.as_file_mut().flush()?;
    file.persist(path).map_err(|e| ExportError::Io(e.error))?;

    tracing::info!(
        "Wrote {} publications for {} authors to {}",
        result.publication_count(),
        result.len(),
        path.display()
    );
    Ok(())
}
