//! Label data.
//!
//! The data file has one row per label, or one row per batch of casks when a
//! quantity column is used. In that case each row is repeated once per cask
//! and a generated column numbers the casks from 1.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Most labels a single run will produce.
pub const MAX_LABELS: usize = 100_000;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read CSV from {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{} has no column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error(
        "{}:{line}: quantity column '{column}' must be a whole number greater than zero, found '{value}'",
        .path.display()
    )]
    InvalidQuantity {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error("{} contains no labels", .path.display())]
    NoRows { path: PathBuf },
    #[error(
        "{}:{line}: too many labels, at most {limit} can be printed in one run",
        .path.display()
    )]
    TooManyLabels {
        path: PathBuf,
        line: u64,
        limit: usize,
    },
}

/// One label's worth of data, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRow {
    values: HashMap<String, String>,
}

impl DataRow {
    pub fn from_pairs<I: IntoIterator<Item = (String, String)>>(pairs: I) -> DataRow {
        DataRow {
            values: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, column: K, value: V) {
        self.values.insert(column.into(), value.into());
    }
}

/// Columns used to expand batches into numbered casks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Column holding how many casks the row stands for.
    pub quantity: String,
    /// Generated column numbering the casks of a row from 1.
    pub enumeration: String,
}

#[derive(Debug)]
struct Batch {
    row: DataRow,
    quantity: usize,
}

/// A loaded data file.
#[derive(Debug)]
pub struct DataSet {
    path: PathBuf,
    columns: Vec<String>,
    enumeration: Option<String>,
    batches: Vec<Batch>,
    label_count: usize,
}

impl DataSet {
    /// Reads every row of `path`. With an [`Expansion`], every quantity is
    /// checked here so that a bad row fails the run before anything is drawn.
    pub fn load(path: &Path, expansion: Option<&Expansion>) -> Result<DataSet, DataError> {
        let csv_err = |source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(path)
            .map_err(csv_err)?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(ToString::to_string)
            .collect();

        if let Some(expansion) = expansion {
            if !columns.contains(&expansion.quantity) {
                return Err(DataError::MissingColumn {
                    path: path.to_path_buf(),
                    column: expansion.quantity.clone(),
                });
            }
            if columns.contains(&expansion.enumeration) {
                log::warn!(
                    "{} already has a '{}' column, it will be replaced by the cask number",
                    path.display(),
                    expansion.enumeration
                );
            }
        }

        let mut batches = Vec::new();
        let mut label_count: usize = 0;
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row = DataRow::from_pairs(
                columns
                    .iter()
                    .cloned()
                    .zip(record.iter().map(ToString::to_string)),
            );

            let quantity = match expansion {
                Some(expansion) => {
                    let value = row.get(&expansion.quantity).unwrap_or_default();
                    let quantity = value
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|q| *q > 0)
                        .ok_or_else(|| DataError::InvalidQuantity {
                            path: path.to_path_buf(),
                            line,
                            column: expansion.quantity.clone(),
                            value: value.to_string(),
                        })?;
                    log::debug!("{}:{}: {} cask(s)", path.display(), line, quantity);
                    quantity
                }
                None => 1,
            };
            label_count = label_count
                .checked_add(quantity)
                .filter(|total| *total <= MAX_LABELS)
                .ok_or_else(|| DataError::TooManyLabels {
                    path: path.to_path_buf(),
                    line,
                    limit: MAX_LABELS,
                })?;
            batches.push(Batch { row, quantity });
        }

        let data = DataSet {
            path: path.to_path_buf(),
            columns,
            enumeration: expansion.map(|e| e.enumeration.clone()),
            batches,
            label_count,
        };
        log::info!(
            "Read {} row(s) from {}, {} label(s) in total",
            data.batches.len(),
            path.display(),
            data.label_count
        );
        Ok(data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of labels after expansion.
    pub fn label_count(&self) -> usize {
        self.label_count
    }

    /// Checks that every column in `columns` will be present on every label.
    pub fn check_columns<'c, I>(&self, columns: I) -> Result<(), DataError>
    where
        I: IntoIterator<Item = &'c str>,
    {
        for column in columns {
            let generated = self.enumeration.as_deref() == Some(column);
            if !generated && !self.columns.iter().any(|c| c == column) {
                return Err(DataError::MissingColumn {
                    path: self.path.clone(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// The labels in print order. The iterator borrows the data set, so it can
    /// be created again to start over.
    pub fn labels(&self) -> Labels<'_> {
        Labels {
            batches: self.batches.iter(),
            current: None,
            enumeration: self.enumeration.as_deref(),
            remaining: self.label_count,
        }
    }
}

/// Iterator over the labels of a [`DataSet`].
///
/// Without expansion the rows are borrowed as they are; with expansion each
/// row is copied once per cask with the cask number filled in.
#[derive(Clone)]
pub struct Labels<'a> {
    batches: std::slice::Iter<'a, Batch>,
    current: Option<(&'a Batch, usize)>,
    enumeration: Option<&'a str>,
    remaining: usize,
}

impl<'a> Iterator for Labels<'a> {
    type Item = Cow<'a, DataRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.current {
                Some((batch, cask)) if cask <= batch.quantity => {
                    self.current = Some((batch, cask + 1));
                    self.remaining -= 1;
                    return Some(match self.enumeration {
                        Some(column) => {
                            let mut row = batch.row.clone();
                            row.set(column, cask.to_string());
                            Cow::Owned(row)
                        }
                        None => Cow::Borrowed(&batch.row),
                    });
                }
                _ => self.current = Some((self.batches.next()?, 1)),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Labels<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("casks.csv");
        std::fs::write(&path, contents).expect("can write data");
        (dir, path)
    }

    fn expansion() -> Expansion {
        Expansion {
            quantity: "Quantity".to_string(),
            enumeration: "Cask".to_string(),
        }
    }

    #[test]
    fn rows_pass_through_without_expansion() {
        let (_dir, path) = write("Brewery,Beer,Cask\nThornbridge,Jaipur,17\nMarble,Pint,3\n");
        let data = DataSet::load(&path, None).expect("can load data");
        assert_eq!(data.label_count(), 2);

        let labels: Vec<_> = data.labels().collect();
        assert_eq!(labels.len(), 2);
        assert!(matches!(labels[0], Cow::Borrowed(_)));
        assert_eq!(labels[0].get("Beer"), Some("Jaipur"));
        assert_eq!(labels[0].get("Cask"), Some("17"));
        assert_eq!(labels[1].get("Brewery"), Some("Marble"));
    }

    #[test]
    fn can_expand_quantities() {
        let (_dir, path) =
            write("Brewery,Beer,ABV,Quantity\nThornbridge,Jaipur,5.9,3\nMarble,Pint,3.9,1\n");
        let data = DataSet::load(&path, Some(&expansion())).expect("can load data");
        assert_eq!(data.label_count(), 4);

        let labels: Vec<_> = data.labels().collect();
        let casks: Vec<_> = labels.iter().map(|l| l.get("Cask").unwrap()).collect();
        assert_eq!(casks, vec!["1", "2", "3", "1"]);
        for label in &labels[..3] {
            assert_eq!(label.get("Brewery"), Some("Thornbridge"));
            assert_eq!(label.get("Beer"), Some("Jaipur"));
            assert_eq!(label.get("ABV"), Some("5.9"));
            assert_eq!(label.get("Quantity"), Some("3"));
        }
        assert_eq!(labels[3].get("Beer"), Some("Pint"));
    }

    #[test]
    fn labels_can_be_restarted() {
        let (_dir, path) = write("Beer,Quantity\nJaipur,2\nPint,2\n");
        let data = DataSet::load(&path, Some(&expansion())).expect("can load data");

        let mut labels = data.labels();
        assert_eq!(labels.len(), 4);
        labels.next();
        assert_eq!(labels.len(), 3);

        let first: Vec<DataRow> = data.labels().map(Cow::into_owned).collect();
        let second: Vec<DataRow> = data.labels().map(Cow::into_owned).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn zero_quantity_is_an_error() {
        let (_dir, path) = write("Beer,Quantity\nJaipur,2\nPint,0\n");
        match DataSet::load(&path, Some(&expansion())) {
            Err(DataError::InvalidQuantity { line, value, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "0");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn missing_or_malformed_quantities_are_errors() {
        for quantity in ["", "-2", "two", "1.5"] {
            let (_dir, path) = write(&format!("Beer,Quantity\nJaipur,{quantity}\n"));
            assert!(
                matches!(
                    DataSet::load(&path, Some(&expansion())),
                    Err(DataError::InvalidQuantity { .. })
                ),
                "quantity '{quantity}' should be rejected"
            );
        }
    }

    #[test]
    fn missing_quantity_column_is_an_error() {
        let (_dir, path) = write("Beer,Casks\nJaipur,2\n");
        assert!(matches!(
            DataSet::load(&path, Some(&expansion())),
            Err(DataError::MissingColumn { column, .. }) if column == "Quantity"
        ));
    }

    #[test]
    fn can_check_referenced_columns() {
        let (_dir, path) = write("Brewery,Beer,Quantity\nThornbridge,Jaipur,2\n");
        let data = DataSet::load(&path, Some(&expansion())).expect("can load data");
        data.check_columns(["Brewery", "Beer", "Cask"])
            .expect("generated column counts as present");
        assert!(matches!(
            data.check_columns(["Brewery", "ABV"]),
            Err(DataError::MissingColumn { column, .. }) if column == "ABV"
        ));

        let plain = DataSet::load(&path, None).expect("can load data");
        assert!(plain.check_columns(["Cask"]).is_err());
    }

    #[test]
    fn huge_quantities_are_rejected() {
        let (_dir, path) = write("Beer,Quantity\nJaipur,18446744073709551615\nPint,1\n");
        match DataSet::load(&path, Some(&expansion())) {
            Err(DataError::TooManyLabels { line, limit, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(limit, MAX_LABELS);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn label_total_is_limited() {
        let half = MAX_LABELS / 2;
        let (_dir, path) = write(&format!(
            "Beer,Quantity\nJaipur,{half}\nPint,{half}\nMild,1\n"
        ));
        assert!(matches!(
            DataSet::load(&path, Some(&expansion())),
            Err(DataError::TooManyLabels { line: 4, .. })
        ));

        let (_dir, path) = write(&format!("Beer,Quantity\nJaipur,{half}\nPint,{half}\n"));
        let data = DataSet::load(&path, Some(&expansion())).expect("can load data");
        assert_eq!(data.label_count(), half * 2);
        assert_eq!(data.labels().len(), half * 2);
    }

    #[test]
    fn ragged_rows_are_errors() {
        let (_dir, path) = write("Brewery,Beer\nThornbridge,Jaipur,extra\n");
        assert!(matches!(
            DataSet::load(&path, None),
            Err(DataError::Csv { .. })
        ));
    }
}
