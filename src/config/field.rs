use super::{check_header, line_of, open_reader, ConfigError, Location};
use crate::data::DataRow;
use crate::sinks::StandardFont;
use crate::units::{Mm, Pt};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub(super) const COLUMNS: &[&str] = &["Field", "X", "Y", "Font", "Font size"];
pub(super) const ALL_COLUMNS: &[&str] = &[
    "Field",
    "X",
    "Y",
    "Width",
    "Font",
    "Font size",
    "Colour",
    "Layout",
    "Format",
];

#[derive(Debug, Deserialize)]
struct FieldRow {
    #[serde(rename = "Field")]
    field: String,
    #[serde(rename = "X")]
    x: String,
    #[serde(rename = "Y")]
    y: String,
    #[serde(rename = "Width", default)]
    width: String,
    #[serde(rename = "Font")]
    font: String,
    #[serde(rename = "Font size")]
    font_size: String,
    #[serde(rename = "Colour", alias = "Color", default)]
    colour: String,
    #[serde(rename = "Layout", default)]
    layout: String,
    #[serde(rename = "Format", default)]
    format: String,
}

/// One text field, drawn at the same place on every label.
///
/// `x` and `y` are measured from the bottom-left corner of the label to the
/// start of the text baseline. The text is aligned within a box starting at
/// `x` that is `width` wide, or reaches the right edge of the label when no
/// width is given.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub x: Pt,
    pub y: Pt,
    pub width: Option<Pt>,
    pub align: Align,
    pub font: StandardFont,
    pub size: Pt,
    pub colour: Colour,
    pub text: FieldText,
}

/// Horizontal placement of a field's text within its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Centre,
    Right,
}

impl FromStr for Align {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "l" | "left" => Ok(Align::Left),
            "c" | "centre" | "center" => Ok(Align::Centre),
            "r" | "right" => Ok(Align::Right),
            _ => Err(format!("unknown layout '{s}', expected 'l', 'c' or 'r'")),
        }
    }
}

impl Align {
    /// How far text `text_width` wide moves right inside a box `available` wide.
    pub fn shift(&self, available: Pt, text_width: Pt) -> Pt {
        match self {
            Align::Left => Pt(0.0),
            Align::Centre => (available - text_width) * 0.5,
            Align::Right => available - text_width,
        }
    }
}

/// What a field prints.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldText {
    /// The value of a single data column.
    Column(String),
    /// A template mixing literal text with data columns.
    Template(Template),
}

impl FieldSpec {
    /// Reads the field template from `path`. Fields are kept in file order,
    /// which is also the order they are drawn in.
    pub fn read_file(path: &Path) -> Result<Vec<FieldSpec>, ConfigError> {
        let mut reader = open_reader(path)?;
        let csv_err = |source| ConfigError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let header = reader.headers().map_err(csv_err)?.clone();
        check_header(path, &header, COLUMNS, &[])?;

        let mut fields = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let row: FieldRow = record.deserialize(Some(&header)).map_err(csv_err)?;
            let location = Location {
                path,
                line: line_of(&record),
            };
            let field = FieldSpec::from_row(row, location)?;
            match &field.text {
                FieldText::Column(column) => log::debug!(
                    "Field '{}' at ({}, {}) in {} {} prints column '{}'",
                    field.name,
                    field.x,
                    field.y,
                    field.font,
                    field.size,
                    column
                ),
                FieldText::Template(template) => log::debug!(
                    "Field '{}' at ({}, {}) in {} {} prints '{}'",
                    field.name,
                    field.x,
                    field.y,
                    field.font,
                    field.size,
                    template
                ),
            }
            fields.push(field);
        }

        log::info!("Read {} field(s) from {}", fields.len(), path.display());
        Ok(fields)
    }

    fn from_row(row: FieldRow, at: Location<'_>) -> Result<FieldSpec, ConfigError> {
        if row.field.is_empty() {
            return Err(at.invalid("Field", "field name must not be empty"));
        }

        let font = row
            .font
            .parse::<StandardFont>()
            .map_err(|reason| at.invalid("Font", reason))?;
        let size = at.number("Font size", &row.font_size)?;
        if size <= 0.0 {
            return Err(at.invalid("Font size", "must be greater than zero"));
        }
        let colour = if row.colour.is_empty() {
            Colour::BLACK
        } else {
            row.colour
                .parse::<Colour>()
                .map_err(|reason| at.invalid("Colour", reason))?
        };
        let width = if row.width.is_empty() {
            None
        } else {
            let width = at.number("Width", &row.width)?;
            if width <= 0.0 {
                return Err(at.invalid("Width", "must be greater than zero"));
            }
            Some(Mm(width).into())
        };
        let align = row
            .layout
            .parse::<Align>()
            .map_err(|reason| at.invalid("Layout", reason))?;
        let text = if row.format.is_empty() {
            FieldText::Column(row.field.clone())
        } else {
            FieldText::Template(
                row.format
                    .parse::<Template>()
                    .map_err(|reason| at.invalid("Format", reason))?,
            )
        };

        Ok(FieldSpec {
            x: Mm(at.number("X", &row.x)?).into(),
            y: Mm(at.number("Y", &row.y)?).into(),
            width,
            align,
            name: row.field,
            font,
            size: Pt(size),
            colour,
            text,
        })
    }

    /// The data columns this field reads.
    pub fn columns(&self) -> Vec<&str> {
        match &self.text {
            FieldText::Column(column) => vec![column.as_str()],
            FieldText::Template(template) => template.columns().collect(),
        }
    }

    /// The text printed for `row`.
    pub fn text_for(&self, row: &DataRow) -> String {
        match &self.text {
            FieldText::Column(column) => row.get(column).unwrap_or_default().to_string(),
            FieldText::Template(template) => template.render(row),
        }
    }
}

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const BLACK: Colour = Colour {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new_rgb_bytes(r: u8, g: u8, b: u8) -> Colour {
        Colour {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }
}

impl FromStr for Colour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() == 6 && hex.is_ascii() {
                let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
                if let (Ok(r), Ok(g), Ok(b)) = (byte(0), byte(2), byte(4)) {
                    return Ok(Colour::new_rgb_bytes(r, g, b));
                }
            }
            return Err(format!("'{s}' is not a #rrggbb colour"));
        }

        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(Colour::BLACK),
            "white" => Ok(Colour::new_rgb_bytes(255, 255, 255)),
            "grey" | "gray" => Ok(Colour::new_rgb_bytes(128, 128, 128)),
            "red" => Ok(Colour::new_rgb_bytes(255, 0, 0)),
            "green" => Ok(Colour::new_rgb_bytes(0, 128, 0)),
            "blue" => Ok(Colour::new_rgb_bytes(0, 0, 255)),
            _ => Err(format!("unknown colour '{s}'")),
        }
    }
}

/// Text with `{Column}` placeholders; `{{` and `}}` stand for literal braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Literal(String),
    Column(String),
}

impl Template {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Column(column) => Some(column.as_str()),
            Part::Literal(_) => None,
        })
    }

    pub fn render(&self, row: &DataRow) -> String {
        self.render_with(|column| row.get(column))
    }

    /// Fills each placeholder with `lookup(column)`, or nothing when it has no
    /// value.
    pub fn render_with<'v, F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<&'v str>,
    {
        let mut out = String::new();
        for part in self.parts.iter() {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Column(column) => out.push_str(lookup(column).unwrap_or_default()),
            }
        }
        out
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut column = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(format!("unclosed '{{' in template '{s}'"))
                            }
                            Some(c) => column.push(c),
                        }
                    }
                    let column = column.trim();
                    if column.is_empty() {
                        return Err(format!("empty placeholder in template '{s}'"));
                    }
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(Part::Column(column.to_string()));
                }
                '}' => return Err(format!("unmatched '}}' in template '{s}'")),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Template { parts })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in self.parts.iter() {
            match part {
                Part::Literal(text) => write!(f, "{}", text.replace('{', "{{").replace('}', "}}"))?,
                Part::Column(column) => write!(f, "{{{column}}}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let path = dir.path().join("labelfields.csv");
        std::fs::write(&path, contents).expect("can write fields");
        (dir, path)
    }

    fn row(values: &[(&str, &str)]) -> DataRow {
        DataRow::from_pairs(values.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn can_read_fields_in_order() {
        let (_dir, path) = write(
            "Field,X,Y,Font,Font size\n\
             Brewery,5,30,Helvetica-Bold,14\n\
             Beer,5,18,Helvetica,12\n\
             ABV,50,5,Times-Italic,9\n",
        );
        let fields = FieldSpec::read_file(&path).expect("can read fields");
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Brewery", "Beer", "ABV"]);

        assert_eq!(fields[0].font, StandardFont::HelveticaBold);
        assert_eq!(fields[0].size, Pt(14.0));
        assert_eq!(fields[0].x, Pt::from(Mm(5.0)));
        assert_eq!(fields[0].colour, Colour::BLACK);
        assert_eq!(fields[2].font, StandardFont::TimesItalic);
        assert_eq!(fields[1].columns(), vec!["Beer"]);
    }

    #[test]
    fn can_read_optional_columns() {
        let (_dir, path) = write(
            "Field,X,Y,Font,Font size,Colour,Format\n\
             Strength,5,5,Courier,8,#cc0000,{ABV}% ABV\n",
        );
        let fields = FieldSpec::read_file(&path).expect("can read fields");
        assert_eq!(fields[0].colour, Colour::new_rgb_bytes(0xcc, 0, 0));
        assert_eq!(fields[0].columns(), vec!["ABV"]);
        assert_eq!(
            fields[0].text_for(&row(&[("ABV", "4.2")])),
            "4.2% ABV".to_string()
        );
    }

    #[test]
    fn can_read_widths_and_layouts() {
        let (_dir, path) = write(
            "Field,X,Y,Width,Font,Font size,Layout\n\
             Beer,0,18,63.5,Helvetica,12,c\n\
             ABV,0,5,,Helvetica,9,r\n\
             Brewery,4,28,,Helvetica,14,\n",
        );
        let fields = FieldSpec::read_file(&path).expect("can read fields");
        assert_eq!(fields[0].width, Some(Pt::from(Mm(63.5))));
        assert_eq!(fields[0].align, Align::Centre);
        assert_eq!(fields[1].width, None);
        assert_eq!(fields[1].align, Align::Right);
        assert_eq!(fields[2].align, Align::Left);
    }

    #[test]
    fn bad_widths_and_layouts_fail_the_load() {
        let (_dir, path) = write("Field,X,Y,Width,Font,Font size\nBeer,0,18,0,Helvetica,12\n");
        assert!(matches!(
            FieldSpec::read_file(&path),
            Err(ConfigError::InvalidValue { column: "Width", .. })
        ));

        let (_dir, path) = write("Field,X,Y,Font,Font size,Layout\nBeer,0,18,Helvetica,12,justify\n");
        assert!(matches!(
            FieldSpec::read_file(&path),
            Err(ConfigError::InvalidValue { column: "Layout", .. })
        ));
    }

    #[test]
    fn alignment_shifts_text_within_its_box() {
        assert_eq!(Align::Left.shift(Pt(100.0), Pt(40.0)), Pt(0.0));
        assert_eq!(Align::Centre.shift(Pt(100.0), Pt(40.0)), Pt(30.0));
        assert_eq!(Align::Right.shift(Pt(100.0), Pt(40.0)), Pt(60.0));
    }

    #[test]
    fn unknown_fonts_fail_the_load() {
        let (_dir, path) = write("Field,X,Y,Font,Font size\nBeer,5,18,Comic Sans,12\n");
        assert!(matches!(
            FieldSpec::read_file(&path),
            Err(ConfigError::InvalidValue {
                line: 2,
                column: "Font",
                ..
            })
        ));
    }

    #[test]
    fn malformed_offsets_fail_the_load() {
        let (_dir, path) = write("Field,X,Y,Font,Font size\nBeer,5,,Helvetica,12\n");
        assert!(matches!(
            FieldSpec::read_file(&path),
            Err(ConfigError::InvalidNumber { column: "Y", .. })
        ));
    }

    #[test]
    fn can_parse_templates() {
        let template: Template = "Cask {Cask} of {Quantity} {{{Beer}}}"
            .parse()
            .expect("template is valid");
        assert_eq!(
            template.columns().collect::<Vec<_>>(),
            vec!["Cask", "Quantity", "Beer"]
        );
        let rendered = template.render(&row(&[("Cask", "2"), ("Quantity", "3"), ("Beer", "Mild")]));
        assert_eq!(rendered, "Cask 2 of 3 {Mild}");
        assert_eq!(template.to_string(), "Cask {Cask} of {Quantity} {{{Beer}}}");

        assert!("Cask {Cask".parse::<Template>().is_err());
        assert!("Cask }".parse::<Template>().is_err());
        assert!("Cask {}".parse::<Template>().is_err());
    }

    #[test]
    fn can_parse_colours() {
        assert_eq!("Red".parse::<Colour>(), Ok(Colour::new_rgb_bytes(255, 0, 0)));
        assert_eq!("#00ff80".parse::<Colour>(), Ok(Colour::new_rgb_bytes(0, 255, 128)));
        assert!("#00ff8".parse::<Colour>().is_err());
        assert!("mauve".parse::<Colour>().is_err());
    }
}
