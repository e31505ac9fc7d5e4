use super::{check_header, line_of, open_reader, ConfigError, Location};
use crate::units::{Mm, Pt};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub(super) const COLUMNS: &[&str] = &[
    "Name",
    "Page size",
    "Left",
    "Horizontal Pitch",
    "Width",
    "Columns",
    "Top",
    "Vertical Pitch",
    "Height",
    "Rows",
];

// older label files carry this misspelling
const ALIASES: &[(&str, &str)] = &[("Vertical Pitch", "Vertial Pitch")];

/// Named paper sizes in millimetres, portrait orientation.
const PAPER_SIZES: &[(&str, f32, f32)] = &[
    ("A3", 297.0, 420.0),
    ("A4", 210.0, 297.0),
    ("A5", 148.0, 210.0),
    ("A6", 105.0, 148.0),
    ("Letter", 215.9, 279.4),
    ("Legal", 215.9, 355.6),
    ("Tabloid", 279.4, 431.8),
];

#[derive(Debug, Deserialize)]
struct LabelTypeRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Page size")]
    page_size: String,
    #[serde(rename = "Left")]
    left: String,
    #[serde(rename = "Horizontal Pitch")]
    horizontal_pitch: String,
    #[serde(rename = "Width")]
    width: String,
    #[serde(rename = "Columns")]
    columns: String,
    #[serde(rename = "Top")]
    top: String,
    #[serde(rename = "Vertical Pitch", default)]
    vertical_pitch: Option<String>,
    #[serde(rename = "Vertial Pitch", default)]
    vertical_pitch_misspelt: Option<String>,
    #[serde(rename = "Height")]
    height: String,
    #[serde(rename = "Rows")]
    rows: String,
}

/// The geometry of one kind of label sheet.
///
/// `left` and `top` locate the top-left corner of the first label relative to
/// the top-left corner of the sheet. The pitches are the distances from one
/// label to the next, so the gap between labels is `pitch - width` (or
/// `pitch - height`).
#[derive(Debug, Clone, PartialEq)]
pub struct LabelType {
    pub name: String,
    pub page_width: Pt,
    pub page_height: Pt,
    pub left: Pt,
    pub top: Pt,
    pub horizontal_pitch: Pt,
    pub vertical_pitch: Pt,
    pub width: Pt,
    pub height: Pt,
    pub columns: u32,
    pub rows: u32,
}

impl LabelType {
    pub fn labels_per_page(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Reads every label type from `path`, in file order.
    pub fn read_file(path: &Path) -> Result<LabelTypes, ConfigError> {
        let mut reader = open_reader(path)?;
        let csv_err = |source| ConfigError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let header = reader.headers().map_err(csv_err)?.clone();
        check_header(path, &header, COLUMNS, ALIASES)?;
        for (canonical, alias) in ALIASES {
            if header.iter().any(|h| h == *canonical) && header.iter().any(|h| h == *alias) {
                log::warn!(
                    "{} has both '{}' and '{}' columns, using '{}'",
                    path.display(),
                    canonical,
                    alias,
                    canonical
                );
            }
        }

        let mut types: Vec<LabelType> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let row: LabelTypeRow = record.deserialize(Some(&header)).map_err(csv_err)?;
            let location = Location {
                path,
                line: line_of(&record),
            };

            if types.iter().any(|t| t.name == row.name) {
                return Err(ConfigError::DuplicateLabelType {
                    path: path.to_path_buf(),
                    line: location.line,
                    name: row.name,
                });
            }
            let label_type = LabelType::from_row(row, location)?;
            log::debug!(
                "Label type '{}': {}x{} labels of {}x{} on a {}x{} page",
                label_type.name,
                label_type.columns,
                label_type.rows,
                label_type.width,
                label_type.height,
                label_type.page_width,
                label_type.page_height
            );
            types.push(label_type);
        }

        log::info!("Read {} label type(s) from {}", types.len(), path.display());
        Ok(LabelTypes {
            path: path.to_path_buf(),
            types,
        })
    }

    fn from_row(row: LabelTypeRow, at: Location<'_>) -> Result<LabelType, ConfigError> {
        let (page_width, page_height) =
            parse_page_size(&row.page_size).ok_or_else(|| {
                at.invalid(
                    "Page size",
                    format!(
                        "unknown page size '{}', expected one of {} (optionally 'landscape') or <width>x<height> in mm",
                        row.page_size,
                        PAPER_SIZES
                            .iter()
                            .map(|(name, _, _)| *name)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )
            })?;

        let length = |column: &'static str, value: &str| -> Result<Pt, ConfigError> {
            let v = at.number(column, value)?;
            if v < 0.0 {
                return Err(at.invalid(column, format!("must not be negative, found {v}")));
            }
            Ok(Mm(v).into())
        };
        let positive = |column: &'static str, value: &str| -> Result<Pt, ConfigError> {
            let v = length(column, value)?;
            if *v <= 0.0 {
                return Err(at.invalid(column, "must be greater than zero"));
            }
            Ok(v)
        };
        let count = |column: &'static str, value: &str| -> Result<u32, ConfigError> {
            let n = value
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber {
                    path: at.path.to_path_buf(),
                    line: at.line,
                    column,
                    value: value.to_string(),
                })?;
            if n == 0 {
                return Err(at.invalid(column, "must be at least 1"));
            }
            Ok(n)
        };

        let label_type = LabelType {
            page_width,
            page_height,
            left: length("Left", &row.left)?,
            top: length("Top", &row.top)?,
            horizontal_pitch: positive("Horizontal Pitch", &row.horizontal_pitch)?,
            vertical_pitch: positive(
                "Vertical Pitch",
                row.vertical_pitch
                    .as_deref()
                    .or(row.vertical_pitch_misspelt.as_deref())
                    .unwrap_or_default(),
            )?,
            width: positive("Width", &row.width)?,
            height: positive("Height", &row.height)?,
            columns: count("Columns", &row.columns)?,
            rows: count("Rows", &row.rows)?,
            name: row.name,
        };

        let right = label_type.left
            + label_type.horizontal_pitch * (label_type.columns - 1) as f32
            + label_type.width;
        let bottom = label_type.top
            + label_type.vertical_pitch * (label_type.rows - 1) as f32
            + label_type.height;
        if right > label_type.page_width || bottom > label_type.page_height {
            log::warn!(
                "{}:{}: labels of type '{}' extend past the edge of the page",
                at.path.display(),
                at.line,
                label_type.name
            );
        }

        Ok(label_type)
    }
}

/// Finds the page size for a paper name such as `A4` or `Letter landscape`, or
/// for an explicit `210x297` in millimetres.
pub fn parse_page_size(name: &str) -> Option<(Pt, Pt)> {
    let name = name.trim();
    if let Some((w, h)) = name.split_once(['x', 'X']) {
        if let (Ok(w), Ok(h)) = (w.trim().parse::<f32>(), h.trim().parse::<f32>()) {
            return (w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
                .then(|| (Mm(w).into(), Mm(h).into()));
        }
    }

    let mut words = name.split_whitespace();
    let paper = words.next()?;
    let landscape = match words.next() {
        None => false,
        Some(o) if o.eq_ignore_ascii_case("portrait") => false,
        Some(o) if o.eq_ignore_ascii_case("landscape") => true,
        Some(_) => return None,
    };
    if words.next().is_some() {
        return None;
    }

    let (_, w, h) = PAPER_SIZES
        .iter()
        .find(|(p, _, _)| p.eq_ignore_ascii_case(paper))?;
    let (w, h) = if landscape { (*h, *w) } else { (*w, *h) };
    Some((Mm(w).into(), Mm(h).into()))
}

/// All label types from one file, looked up by exact name.
#[derive(Debug)]
pub struct LabelTypes {
    path: PathBuf,
    types: Vec<LabelType>,
}

impl LabelTypes {
    pub fn get(&self, name: &str) -> Result<&LabelType, ConfigError> {
        self.types
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ConfigError::LabelTypeNotFound {
                path: self.path.clone(),
                name: name.to_string(),
                known: self.types.iter().map(|t| t.name.clone()).collect(),
            })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }
}
