//! File collaborators for the command-line front end.

pub mod export;
pub mod input;

pub use export::{export_to_path, write_csv, write_json, ExportError, ExportFormat};
pub use input::{read_author_names, InputError};
