use super::Refs;
use pdf_writer::{Name, Pdf, Ref};
use std::fmt;
use std::str::FromStr;

/// The text fonts among the 14 every PDF reader provides, so nothing has to be
/// embedded. Symbol and ZapfDingbats are left out since they cannot print
/// ordinary text.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    pub fn all() -> &'static [StandardFont] {
        use StandardFont::*;
        &[
            Helvetica,
            HelveticaBold,
            HelveticaOblique,
            HelveticaBoldOblique,
            TimesRoman,
            TimesBold,
            TimesItalic,
            TimesBoldItalic,
            Courier,
            CourierBold,
            CourierOblique,
            CourierBoldOblique,
        ]
    }

    /// The PostScript name used as the font's `BaseFont`.
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
        }
    }
}

impl fmt::Display for StandardFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_font())
    }
}

impl FromStr for StandardFont {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // "Times" on its own is commonly used for Times-Roman
        if s.eq_ignore_ascii_case("Times") {
            return Ok(StandardFont::TimesRoman);
        }
        if s.eq_ignore_ascii_case("Symbol") || s.eq_ignore_ascii_case("ZapfDingbats") {
            return Err(format!("'{s}' is a symbol font and cannot print label text"));
        }
        StandardFont::all()
            .iter()
            .find(|font| font.base_font().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                format!(
                    "unknown font '{s}', expected one of {}",
                    StandardFont::all()
                        .iter()
                        .map(StandardFont::base_font)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// Fonts registered in a document, in the order they were first used.
///
/// Each font is written once and referenced from every page as `F1`, `F2`, and
/// so on.
#[derive(Default)]
pub struct FontResources {
    fonts: Vec<(StandardFont, String, Ref)>,
}

impl FontResources {
    /// The resource name of `font`, writing the font dictionary on first use.
    pub fn name_for(&mut self, pdf: &mut Pdf, refs: &mut Refs, font: StandardFont) -> Name<'_> {
        let index = match self.fonts.iter().position(|(f, _, _)| *f == font) {
            Some(index) => index,
            None => {
                let id = refs.next();
                pdf.type1_font(id)
                    .base_font(Name(font.base_font().as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));

                let name = format!("F{}", self.fonts.len() + 1);
                log::debug!("Registered font {font} as /{name}");
                self.fonts.push((font, name, id));
                self.fonts.len() - 1
            }
        };
        Name(self.fonts[index].1.as_bytes())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Name<'_>, Ref)> {
        self.fonts
            .iter()
            .map(|(_, name, id)| (Name(name.as_bytes()), *id))
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_font_names() {
        assert_eq!("Helvetica-Bold".parse::<StandardFont>(), Ok(StandardFont::HelveticaBold));
        assert_eq!("courier".parse::<StandardFont>(), Ok(StandardFont::Courier));
        assert_eq!("Times".parse::<StandardFont>(), Ok(StandardFont::TimesRoman));
        assert!("Arial".parse::<StandardFont>().is_err());
    }

    #[test]
    fn symbol_fonts_are_refused() {
        for name in ["Symbol", "zapfdingbats"] {
            let err = name.parse::<StandardFont>().expect_err("symbol fonts are refused");
            assert!(err.contains("symbol font"), "{err}");
        }
        assert!(StandardFont::all()
            .iter()
            .all(|font| !font.base_font().starts_with("Symbol")));
    }

    #[test]
    fn registers_each_font_once() {
        let mut pdf = Pdf::new();
        let mut refs = Refs::default();
        let mut fonts = FontResources::default();

        let first = fonts
            .name_for(&mut pdf, &mut refs, StandardFont::Helvetica)
            .0
            .to_vec();
        let second = fonts
            .name_for(&mut pdf, &mut refs, StandardFont::TimesBold)
            .0
            .to_vec();
        let again = fonts
            .name_for(&mut pdf, &mut refs, StandardFont::Helvetica)
            .0
            .to_vec();

        assert_eq!(first, b"F1".to_vec());
        assert_eq!(second, b"F2".to_vec());
        assert_eq!(again, first);
        assert_eq!(fonts.len(), 2);
    }
}
