//! PDF output.
//!
//! [`LabelDocument`] turns a stream of [`DrawInstruction`]s into a PDF. Pages
//! are opened on demand: the first instruction opens page 0 and an instruction
//! for a later page closes the open page and starts the next. Instructions
//! must arrive in page order, which the layout guarantees.
//!
//! Nothing is written to disk until [`LabelDocument::finish`], which writes the
//! whole document to a temporary file next to the target and then moves it into
//! place, so a failed run never leaves a partial PDF behind.

mod encoding;
mod fonts;
mod metrics;

pub use fonts::StandardFont;

use crate::layout::DrawInstruction;
use crate::units::Pt;
use encoding::encode_win_ansi;
use fonts::FontResources;
use pdf_writer::{Content, Pdf, Rect, Ref, Str, TextStr};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("there are no labels to render")]
    NoLabels,
    #[error("label on page {page} arrived after page {current} was started")]
    PageOutOfOrder { page: usize, current: usize },
    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to move the finished PDF to {}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Statistics from rendering a PDF, used for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub page_count: usize,
    pub label_count: usize,
}

/// Hands out object ids in increasing order.
pub struct Refs(i32);

impl Default for Refs {
    fn default() -> Self {
        Refs(1)
    }
}

impl Refs {
    pub fn next(&mut self) -> Ref {
        let id = Ref::new(self.0);
        self.0 += 1;
        id
    }
}

struct OpenPage {
    index: usize,
    id: Ref,
    content: Content,
}

/// A PDF under construction.
///
/// The document starts with no pages. Drawing opens pages as needed, and
/// `finish` consumes the document, so nothing can be drawn once it is written.
pub struct LabelDocument {
    pdf: Pdf,
    refs: Refs,
    catalog: Ref,
    page_tree: Ref,
    page_size: (Pt, Pt),
    fonts: FontResources,
    pages: Vec<Ref>,
    open: Option<OpenPage>,
    label_count: usize,
}

impl LabelDocument {
    pub fn new(page_width: Pt, page_height: Pt) -> LabelDocument {
        let mut refs = Refs::default();
        let catalog = refs.next();
        let page_tree = refs.next();
        LabelDocument {
            pdf: Pdf::new(),
            refs,
            catalog,
            page_tree,
            page_size: (page_width, page_height),
            fonts: FontResources::default(),
            pages: Vec::new(),
            open: None,
            label_count: 0,
        }
    }

    /// Index of the page currently being drawn on, if any.
    pub fn current_page(&self) -> Option<usize> {
        self.open.as_ref().map(|page| page.index)
    }

    pub fn draw(&mut self, instruction: &DrawInstruction) -> Result<(), RenderError> {
        let page = instruction.slot.page;
        match self.current_page() {
            Some(current) if page < current => {
                return Err(RenderError::PageOutOfOrder { page, current });
            }
            Some(current) if page == current => {}
            _ => {
                while self.current_page().map_or(true, |current| current < page) {
                    self.start_page();
                }
            }
        }
        self.label_count = self.label_count.max(instruction.ordinal + 1);

        // empty values still claim their page but draw nothing
        if instruction.text.is_empty() {
            return Ok(());
        }
        let encoded = encode_win_ansi(&instruction.text);
        if encoded.lossy {
            log::warn!(
                "Label {}: '{}' contains characters that cannot be printed with {}",
                instruction.ordinal + 1,
                instruction.text,
                instruction.font
            );
        }

        let font = self
            .fonts
            .name_for(&mut self.pdf, &mut self.refs, instruction.font);
        let Some(open) = self.open.as_mut() else {
            unreachable!("a page is always open after start_page");
        };
        let colour = instruction.colour;
        open.content
            .set_fill_rgb(colour.r, colour.g, colour.b)
            .begin_text()
            .set_font(font, *instruction.size)
            .set_text_matrix([1.0, 0.0, 0.0, 1.0, *instruction.x, *instruction.y])
            .show(Str(&encoded.bytes))
            .end_text();
        Ok(())
    }

    fn start_page(&mut self) {
        let index = match self.open.take() {
            Some(page) => {
                let index = page.index + 1;
                self.close_page(page);
                index
            }
            None => 0,
        };
        log::debug!("Starting page {}", index + 1);
        let id = self.refs.next();
        self.pages.push(id);
        self.open = Some(OpenPage {
            index,
            id,
            content: Content::new(),
        });
    }

    fn close_page(&mut self, page: OpenPage) {
        let content_id = self.refs.next();
        self.pdf.stream(content_id, &page.content.finish());

        let (width, height) = self.page_size;
        let mut writer = self.pdf.page(page.id);
        writer
            .media_box(Rect::new(0.0, 0.0, *width, *height))
            .parent(self.page_tree)
            .contents(content_id);
        let mut resources = writer.resources();
        let mut fonts = resources.fonts();
        for (name, id) in self.fonts.iter() {
            fonts.pair(name, id);
        }
    }

    /// Closes the last page and writes the document to `path`, replacing any
    /// existing file.
    pub fn finish(mut self, path: &Path) -> Result<RenderStats, RenderError> {
        let Some(last) = self.open.take() else {
            return Err(RenderError::NoLabels);
        };
        self.close_page(last);

        let page_count = self.pages.len();
        self.pdf
            .pages(self.page_tree)
            .kids(self.pages.iter().copied())
            .count(page_count as i32);
        self.pdf.catalog(self.catalog).pages(self.page_tree);
        let info = self.refs.next();
        self.pdf
            .document_info(info)
            .producer(TextStr(concat!("casklabels v", env!("CARGO_PKG_VERSION"))));
        log::debug!(
            "Writing {} page(s) using {} font(s)",
            page_count,
            self.fonts.len()
        );

        write_atomically(path, &self.pdf.finish())?;
        Ok(RenderStats {
            page_count,
            label_count: self.label_count,
        })
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| RenderError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
