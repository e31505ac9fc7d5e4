//! Text encoding for the standard PDF fonts.
//!
//! The base 14 fonts are not embedded, so text is shown as single bytes in
//! WinAnsiEncoding. That covers ASCII, Latin-1, and a handful of typographic
//! characters; anything else is replaced with `?`.

/// Characters in the 0x80..=0x9F range of WinAnsiEncoding.
const HIGH_CHARACTERS: &[(char, u8)] = &[
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

/// Encoded text, and whether anything had to be replaced.
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub lossy: bool,
}

pub fn encode_win_ansi(text: &str) -> Encoded {
    let mut bytes = Vec::with_capacity(text.len());
    let mut lossy = false;

    for c in text.chars() {
        let byte = match c {
            // line breaks and tabs have no glyph, labels are single line
            '\t' | '\n' | '\r' => Some(b' '),
            ' '..='~' => Some(c as u8),
            '\u{a0}'..='\u{ff}' => Some(c as u32 as u8),
            _ => HIGH_CHARACTERS
                .iter()
                .find(|(h, _)| *h == c)
                .map(|(_, b)| *b),
        };
        match byte {
            Some(b) => bytes.push(b),
            None => {
                lossy = true;
                bytes.push(b'?');
            }
        }
    }

    Encoded { bytes, lossy }
}
