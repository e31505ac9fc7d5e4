//! Label configuration files.
//!
//! Two CSV files describe how labels are printed. The label type file holds one
//! row per sheet of labels (paper size, margins, pitch, grid), and the field
//! file holds the text fields drawn on every label. Both are read once at
//! startup and never modified.

mod field;
mod label_type;

pub use field::{Align, Colour, FieldSpec, FieldText, Template};
pub use label_type::{LabelType, LabelTypes};

use csv::StringRecord;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read CSV from {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{} is missing required column(s): {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
    #[error("{}:{line}: column '{column}' must be a number, found '{value}'", .path.display())]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("{}:{line}: column '{column}': {reason}", .path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: &'static str,
        reason: String,
    },
    #[error("{}:{line}: label type '{name}' is defined more than once", .path.display())]
    DuplicateLabelType {
        path: PathBuf,
        line: u64,
        name: String,
    },
    #[error("label type '{name}' not found in {} (known types: {})", .path.display(), .known.join(", "))]
    LabelTypeNotFound {
        path: PathBuf,
        name: String,
        known: Vec<String>,
    },
    #[error("{} already exists, not overwriting", .path.display())]
    AlreadyExists { path: PathBuf },
}

/// Where a configuration value came from, for error messages.
#[derive(Clone, Copy)]
pub(crate) struct Location<'a> {
    pub path: &'a Path,
    pub line: u64,
}

impl Location<'_> {
    pub fn number(&self, column: &'static str, value: &str) -> Result<f32, ConfigError> {
        value
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ConfigError::InvalidNumber {
                path: self.path.to_path_buf(),
                line: self.line,
                column,
                value: value.to_string(),
            })
    }

    pub fn invalid<S: Into<String>>(&self, column: &'static str, reason: S) -> ConfigError {
        ConfigError::InvalidValue {
            path: self.path.to_path_buf(),
            line: self.line,
            column,
            reason: reason.into(),
        }
    }
}

pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, ConfigError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| ConfigError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Checks that every required column is present.
///
/// `aliases` maps a required column to an alternative spelling that is also
/// accepted in its place.
pub(crate) fn check_header(
    path: &Path,
    header: &StringRecord,
    required: &[&str],
    aliases: &[(&str, &str)],
) -> Result<(), ConfigError> {
    let present = |name: &str| header.iter().any(|h| h == name);
    let columns: Vec<String> = required
        .iter()
        .filter(|column| {
            let column: &str = column;
            !present(column)
                && !aliases
                    .iter()
                    .any(|(canonical, alias)| *canonical == column && present(*alias))
        })
        .map(ToString::to_string)
        .collect();

    if columns.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingColumns {
            path: path.to_path_buf(),
            columns,
        })
    }
}

/// Line number of a record in its file, 1-based and counting the header.
pub(crate) fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

/// Creates an empty label type file containing only the header row.
pub fn create_label_file(path: &Path) -> Result<(), ConfigError> {
    create_template(path, label_type::COLUMNS)
}

/// Creates an empty field file containing only the header row.
pub fn create_field_file(path: &Path) -> Result<(), ConfigError> {
    create_template(path, field::ALL_COLUMNS)
}

fn create_template(path: &Path, columns: &[&str]) -> Result<(), ConfigError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            ErrorKind::AlreadyExists => ConfigError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(columns)
        .map_err(|source| ConfigError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Created template {}", path.display());
    Ok(())
}
