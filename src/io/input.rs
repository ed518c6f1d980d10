//! Reading author names from disk.
//!
//! Supported layouts, picked by extension:
//!
//! - `.txt` (or no extension): one name per line; a line may also hold
//!   several comma-separated names
//! - `.csv`: the `name` or `author` column, else the first column
//! - `.json`: an array of strings
//!
//! Blank entries are kept out of the returned list.

use std::path::Path;

/// Errors reading an author-name file
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid CSV in {path}: {message}")]
    Csv { path: String, message: String },

    #[error("Invalid JSON in {path}: {message}")]
    Json { path: String, message: String },
}

/// Read author names from `path`
pub fn read_author_names(path: &Path) -> Result<Vec<String>, InputError> {
    let path_label = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let names = match extension.as_deref() {
        Some("csv") => read_csv(path, &path_label)?,
        Some("json") => {
            let content = read_to_string(path, &path_label)?;
            parse_json_names(&content).map_err(|message| InputError::Json {
                path: path_label.clone(),
                message,
            })?
        }
        _ => parse_text_names(&read_to_string(path, &path_label)?),
    };

    tracing::debug!("Read {} author names from {}", names.len(), path_label);
    Ok(names)
}

fn read_to_string(path: &Path, path_label: &str) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path_label.to_string(),
        source,
    })
}

/// Names from plain text, one per line or comma-separated
pub fn parse_text_names(content: &str) -> Vec<String> {
    content
        .lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_json_names(content: &str) -> Result<Vec<String>, String> {
    let names: Vec<String> = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

fn read_csv(path: &Path, path_label: &str) -> Result<Vec<String>, InputError> {
    let csv_error = |e: csv::Error| InputError::Csv {
        path: path_label.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let column = headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case("name"))
        .or_else(|| {
            headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case("author"))
        })
        .unwrap_or(0);

    let mut names = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        if let Some(name) = row.get(column).filter(|name| !name.is_empty()) {
            names.push(name.to_string());
        }
    }

    Ok(names)
}
