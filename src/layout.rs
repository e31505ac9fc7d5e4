//! Placement of labels on pages.
//!
//! Labels fill a sheet left to right, then top to bottom, and move on to a new
//! page once every slot on the sheet is used. Row 0 is the top row of the
//! physical sheet; since PDF measures upwards from the bottom of the page, the
//! vertical position is computed from the page height down.
//!
//! Within a label each field is aligned inside its own box, measured with the
//! font's glyph widths.

use crate::config::{Colour, FieldSpec, LabelType};
use crate::data::DataRow;
use crate::sinks::StandardFont;
use crate::units::Pt;
use std::borrow::Borrow;

/// Where on which page a label goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub page: usize,
    pub row: u32,
    pub column: u32,
}

/// A single piece of text to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInstruction {
    /// Position of the label in the label sequence.
    pub ordinal: usize,
    pub slot: Slot,
    pub text: String,
    pub x: Pt,
    pub y: Pt,
    pub font: StandardFont,
    pub size: Pt,
    pub colour: Colour,
    /// Printed width of `text`.
    pub width: Pt,
    /// Width of the box the text is aligned in.
    pub available: Pt,
}

impl DrawInstruction {
    /// Whether the text runs past the edges of its box.
    pub fn overflows(&self) -> bool {
        // allow for rounding in the glyph widths
        *self.width - *self.available > 0.01
    }
}

/// Lays a field template out over the slots of a label type.
#[derive(Debug, Clone, Copy)]
pub struct LabelLayout<'a> {
    label_type: &'a LabelType,
    fields: &'a [FieldSpec],
}

impl<'a> LabelLayout<'a> {
    pub fn new(label_type: &'a LabelType, fields: &'a [FieldSpec]) -> LabelLayout<'a> {
        LabelLayout { label_type, fields }
    }

    pub fn slot(&self, ordinal: usize) -> Slot {
        let per_page = self.label_type.labels_per_page();
        let columns = self.label_type.columns as usize;
        let remainder = ordinal % per_page;
        Slot {
            page: ordinal / per_page,
            row: (remainder / columns) as u32,
            column: (remainder % columns) as u32,
        }
    }

    /// Bottom-left corner of the label in `slot`, in page coordinates.
    pub fn origin(&self, slot: Slot) -> (Pt, Pt) {
        let lt = self.label_type;
        let x = lt.left + lt.horizontal_pitch * slot.column as f32;
        let y = lt.page_height - lt.top - lt.vertical_pitch * slot.row as f32 - lt.height;
        (x, y)
    }

    /// Number of pages needed for `labels` labels.
    pub fn page_count(&self, labels: usize) -> usize {
        labels.div_ceil(self.label_type.labels_per_page())
    }

    /// Everything to draw for `rows`, label by label and, within a label, in
    /// field order. Nothing is computed until the iterator is advanced.
    pub fn instructions<I>(&self, rows: I) -> Instructions<'a, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Borrow<DataRow>,
    {
        Instructions {
            layout: *self,
            rows: rows.into_iter().enumerate(),
            current: None,
        }
    }
}

/// Iterator returned by [`LabelLayout::instructions`].
pub struct Instructions<'a, I: Iterator> {
    layout: LabelLayout<'a>,
    rows: std::iter::Enumerate<I>,
    current: Option<(usize, I::Item, usize)>,
}

impl<I> Clone for Instructions<'_, I>
where
    I: Iterator + Clone,
    I::Item: Clone,
{
    fn clone(&self) -> Self {
        Instructions {
            layout: self.layout,
            rows: self.rows.clone(),
            current: self.current.clone(),
        }
    }
}

impl<I> Iterator for Instructions<'_, I>
where
    I: Iterator,
    I::Item: Borrow<DataRow>,
{
    type Item = DrawInstruction;

    fn next(&mut self) -> Option<DrawInstruction> {
        loop {
            if let Some((ordinal, row, field_index)) = &mut self.current {
                if let Some(field) = self.layout.fields.get(*field_index) {
                    *field_index += 1;

                    let slot = self.layout.slot(*ordinal);
                    let (x, y) = self.layout.origin(slot);
                    let text = field.text_for(<I::Item as Borrow<DataRow>>::borrow(row));
                    let width = field.font.text_width(&text, field.size);
                    let available = field
                        .width
                        .unwrap_or(self.layout.label_type.width - field.x);
                    return Some(DrawInstruction {
                        ordinal: *ordinal,
                        slot,
                        x: x + field.x + field.align.shift(available, width),
                        y: y + field.y,
                        text,
                        font: field.font,
                        size: field.size,
                        colour: field.colour,
                        width,
                        available,
                    });
                }
            }

            if self.layout.fields.is_empty() {
                return None;
            }
            let (ordinal, row) = self.rows.next()?;
            self.current = Some((ordinal, row, 0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Align, FieldText};
    use crate::units::Mm;

    fn a4_21() -> LabelType {
        LabelType {
            name: "A4-21".to_string(),
            page_width: Mm(210.0).into(),
            page_height: Mm(297.0).into(),
            left: Mm(7.0).into(),
            top: Mm(15.0).into(),
            horizontal_pitch: Mm(66.0).into(),
            vertical_pitch: Mm(38.0).into(),
            width: Mm(63.5).into(),
            height: Mm(38.0).into(),
            columns: 3,
            rows: 7,
        }
    }

    fn field(name: &str, x: f32, y: f32) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            x: Pt(x),
            y: Pt(y),
            width: None,
            align: Align::Left,
            font: StandardFont::Helvetica,
            size: Pt(12.0),
            colour: Colour::BLACK,
            text: FieldText::Column(name.to_string()),
        }
    }

    fn rows(n: usize) -> Vec<DataRow> {
        (0..n)
            .map(|i| {
                DataRow::from_pairs([
                    ("Brewery".to_string(), format!("Brewery {i}")),
                    ("Beer".to_string(), format!("Beer {i}")),
                    ("ABV".to_string(), "4.5".to_string()),
                ])
            })
            .collect()
    }

    #[test]
    fn slots_fill_rows_then_pages() {
        let lt = a4_21();
        let layout = LabelLayout::new(&lt, &[]);
        assert_eq!(layout.slot(0), Slot { page: 0, row: 0, column: 0 });
        assert_eq!(layout.slot(2), Slot { page: 0, row: 0, column: 2 });
        assert_eq!(layout.slot(3), Slot { page: 0, row: 1, column: 0 });
        assert_eq!(layout.slot(20), Slot { page: 0, row: 6, column: 2 });
        assert_eq!(layout.slot(21), Slot { page: 1, row: 0, column: 0 });
        assert_eq!(layout.slot(47), Slot { page: 2, row: 1, column: 2 });
    }

    #[test]
    fn first_row_is_at_the_top_of_the_sheet() {
        let lt = a4_21();
        let layout = LabelLayout::new(&lt, &[]);

        let (x, y) = layout.origin(Slot { page: 0, row: 0, column: 0 });
        assert_eq!(x, lt.left);
        assert_eq!(y, lt.page_height - lt.top - lt.height);

        let (x, y) = layout.origin(Slot { page: 3, row: 6, column: 2 });
        assert_eq!(x, lt.left + lt.horizontal_pitch * 2.0);
        assert_eq!(y, lt.page_height - lt.top - lt.vertical_pitch * 6.0 - lt.height);
        // the bottom row sits on the bottom margin
        let bottom: Pt = Mm(297.0 - 15.0 - 7.0 * 38.0).into();
        assert!((*y - *bottom).abs() < 1e-3);
    }

    #[test]
    fn page_count_rounds_up() {
        let lt = a4_21();
        let layout = LabelLayout::new(&lt, &[]);
        assert_eq!(layout.page_count(1), 1);
        assert_eq!(layout.page_count(21), 1);
        assert_eq!(layout.page_count(22), 2);
        assert_eq!(layout.page_count(63), 3);
    }

    #[test]
    fn fields_are_offset_from_the_slot_origin() {
        let lt = a4_21();
        let fields = vec![field("Brewery", 10.0, 80.0), field("Beer", 10.0, 60.0)];
        let layout = LabelLayout::new(&lt, &fields);
        let data = rows(5);

        let instructions: Vec<_> = layout.instructions(&data).collect();
        assert_eq!(instructions.len(), 10);

        let beer_4 = &instructions[9];
        assert_eq!(beer_4.ordinal, 4);
        assert_eq!(beer_4.text, "Beer 4");
        let (ox, oy) = layout.origin(layout.slot(4));
        assert_eq!(beer_4.x, ox + Pt(10.0));
        assert_eq!(beer_4.y, oy + Pt(60.0));
        assert_eq!(beer_4.slot, Slot { page: 0, row: 1, column: 1 });
    }

    #[test]
    fn fields_keep_template_order() {
        let lt = a4_21();
        let fields = vec![
            field("ABV", 0.0, 0.0),
            field("Brewery", 0.0, 0.0),
            field("Beer", 0.0, 0.0),
        ];
        let layout = LabelLayout::new(&lt, &fields);
        let data = rows(2);

        let texts: Vec<String> = layout.instructions(&data).map(|i| i.text).collect();
        assert_eq!(
            texts,
            vec!["4.5", "Brewery 0", "Beer 0", "4.5", "Brewery 1", "Beer 1"]
        );
    }

    #[test]
    fn pages_never_go_backwards() {
        let lt = a4_21();
        let fields = vec![field("Brewery", 0.0, 0.0), field("ABV", 0.0, 0.0)];
        let layout = LabelLayout::new(&lt, &fields);
        let data = rows(22);

        let pages: Vec<usize> = layout.instructions(&data).map(|i| i.slot.page).collect();
        assert!(pages.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(pages.last(), Some(&1));
        // only the first slot of the second page is used
        let second: Vec<_> = layout
            .instructions(&data)
            .filter(|i| i.slot.page == 1)
            .collect();
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|i| i.slot.row == 0 && i.slot.column == 0));
    }

    #[test]
    fn instructions_are_restartable() {
        let lt = a4_21();
        let fields = vec![field("Beer", 3.0, 4.0)];
        let layout = LabelLayout::new(&lt, &fields);
        let data = rows(30);

        let first: Vec<_> = layout.instructions(&data).collect();
        let second: Vec<_> = layout.instructions(&data).collect();
        assert_eq!(first, second);

        let iter = layout.instructions(&data);
        let cloned: Vec<_> = iter.clone().collect();
        assert_eq!(cloned, iter.collect::<Vec<_>>());
    }

    fn courier(name: &str, x: f32, width: Option<f32>, align: Align) -> FieldSpec {
        FieldSpec {
            width: width.map(Pt),
            align,
            font: StandardFont::Courier,
            size: Pt(10.0),
            ..field(name, x, 0.0)
        }
    }

    #[test]
    fn fields_can_be_centred_or_right_aligned() {
        let lt = a4_21();
        let data = vec![DataRow::from_pairs([("Beer".to_string(), "Mild".to_string())])];
        // four Courier glyphs at 10pt are 24pt wide
        let fields = vec![
            courier("Beer", 10.0, Some(100.0), Align::Centre),
            courier("Beer", 10.0, Some(100.0), Align::Right),
            courier("Beer", 0.0, None, Align::Centre),
        ];
        let layout = LabelLayout::new(&lt, &fields);
        let (ox, _) = layout.origin(layout.slot(0));

        let instructions: Vec<_> = layout.instructions(&data).collect();
        assert!((*instructions[0].width - 24.0).abs() < 1e-4);
        assert!((*(instructions[0].x - ox) - 48.0).abs() < 1e-3);
        assert!((*(instructions[1].x - ox) - 86.0).abs() < 1e-3);
        // without a width the whole label is the box
        assert_eq!(instructions[2].available, lt.width);
        assert!((*(instructions[2].x - ox) - (*lt.width - 24.0) / 2.0).abs() < 1e-3);
        assert!(instructions.iter().all(|i| !i.overflows()));
    }

    #[test]
    fn text_wider_than_its_box_overflows() {
        let lt = a4_21();
        let data = vec![DataRow::from_pairs([(
            "Beer".to_string(),
            "Old Peculier".to_string(),
        )])];
        let fields = vec![courier("Beer", 10.0, Some(20.0), Align::Left)];
        let layout = LabelLayout::new(&lt, &fields);

        let instruction = layout.instructions(&data).next().expect("one field");
        assert!(instruction.overflows());
        assert_eq!(instruction.available, Pt(20.0));
    }

    #[test]
    fn no_fields_means_nothing_to_draw() {
        let lt = a4_21();
        let layout = LabelLayout::new(&lt, &[]);
        let data = rows(3);
        assert_eq!(layout.instructions(&data).count(), 0);
    }
}
