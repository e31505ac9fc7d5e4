//! Label creation.
//!
//! Loads the configuration and data files, checks that they fit together, and
//! renders every label into the output PDF. All inputs are read and validated
//! before the first page is drawn.

use crate::config::{FieldSpec, LabelType};
use crate::data::{DataError, DataSet, Expansion};
use crate::layout::LabelLayout;
use crate::sinks::{LabelDocument, RenderStats};
use anyhow::{anyhow, Context, Result};
use indicatif::ProgressBar;
use std::path::PathBuf;

/// Everything needed to produce one PDF of labels.
#[derive(Debug, Clone)]
pub struct LabelRun {
    pub label_file: PathBuf,
    pub label_type: String,
    pub field_file: PathBuf,
    pub data_file: PathBuf,
    pub output_file: PathBuf,
    pub expansion: Option<Expansion>,
}

impl LabelRun {
    pub fn render(&self, progress: &ProgressBar) -> Result<RenderStats> {
        let label_types = LabelType::read_file(&self.label_file)
            .with_context(|| "Failed to load label types")?;
        let label_type = label_types.get(&self.label_type)?;
        log::info!(
            "Using label type '{}' of the {} in {}, {} label(s) per page",
            label_type.name,
            label_types.len(),
            self.label_file.display(),
            label_type.labels_per_page()
        );

        let fields = FieldSpec::read_file(&self.field_file)
            .with_context(|| "Failed to load label fields")?;
        if fields.is_empty() {
            return Err(anyhow!(
                "{} does not define any fields",
                self.field_file.display()
            ));
        }

        let data = DataSet::load(&self.data_file, self.expansion.as_ref())
            .with_context(|| "Failed to load label data")?;
        data.check_columns(fields.iter().flat_map(FieldSpec::columns))
            .with_context(|| {
                format!(
                    "Fields in {} refer to data that is missing",
                    self.field_file.display()
                )
            })?;
        let label_count = data.label_count();
        if label_count == 0 {
            return Err(DataError::NoRows {
                path: data.path().to_path_buf(),
            }
            .into());
        }

        let layout = LabelLayout::new(label_type, &fields);
        log::info!(
            "Rendering {} label(s) onto {} page(s)",
            label_count,
            layout.page_count(label_count)
        );

        progress.set_length(label_count as u64);
        let mut doc = LabelDocument::new(label_type.page_width, label_type.page_height);
        let mut last_label = None;
        for instruction in layout.instructions(data.labels()) {
            if instruction.overflows() {
                log::warn!(
                    "Label {}: '{}' is wider than its field ({} > {})",
                    instruction.ordinal + 1,
                    instruction.text,
                    instruction.width,
                    instruction.available
                );
            }
            doc.draw(&instruction)
                .with_context(|| format!("Failed to draw label {}", instruction.ordinal + 1))?;
            if last_label != Some(instruction.ordinal) {
                last_label = Some(instruction.ordinal);
                log::debug!(
                    "Label {} on page {}, row {}, column {}",
                    instruction.ordinal + 1,
                    instruction.slot.page + 1,
                    instruction.slot.row + 1,
                    instruction.slot.column + 1
                );
                progress.inc(1);
            }
        }

        let stats = doc
            .finish(&self.output_file)
            .with_context(|| "Failed to write PDF")?;
        progress.finish_and_clear();
        Ok(stats)
    }
}
