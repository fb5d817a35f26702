//! Helvetica metrics and WinAnsi encoding for the standard font used by the stamp.

/// Resource name under which the stamp's Helvetica is registered on each page.
pub(crate) const STAMP_FONT: &str = "TbHelv";

/// Helvetica ascender as a fraction of the font size (AFM Ascender 718).
pub(crate) const ASCENT_RATIO: f32 = 0.718;

/// Helvetica descender as a fraction of the font size (AFM Descender -207).
pub(crate) const DESCENT_RATIO: f32 = 0.207;

pub(crate) const LINE_HEIGHT_RATIO: f32 = 1.2;

/// Helvetica AFM advance widths for printable ASCII, 32..=126.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

/// Helvetica width of a WinAnsi code at 1000 units/em.
pub(crate) fn helvetica_width_1000(byte: u8) -> f32 {
    match byte {
        32..=126 => HELVETICA_ASCII[(byte - 32) as usize] as f32,
        0x85 | 0x89 | 0x97 => 1000.0, // ellipsis, per mille, em dash
        0x91 | 0x92 | 0x82 => 222.0,  // single quotes
        0x93 | 0x94 | 0x84 => 333.0,  // double quotes
        0x95 => 350.0,                // bullet
        0x96 => 556.0,                // en dash
        0xA0 => 278.0,                // no-break space
        0xC0..=0xC5 | 0xC8..=0xCB => 667.0,
        0xCC..=0xCF => 278.0,
        0xD2..=0xD6 | 0xD8 => 778.0,
        0xD9..=0xDC | 0xC7 | 0xD0 | 0xD1 => 722.0,
        0xEC..=0xEF => 278.0,
        0xE7 => 500.0,
        0..=31 => 0.0,
        _ => 556.0,
    }
}

/// Rendered width of `text` in Helvetica at `font_size`.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    to_winansi_bytes(text)
        .iter()
        .map(|&b| helvetica_width_1000(b) * font_size / 1000.0)
        .sum()
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
pub(crate) fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or `None` if unmappable.
fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007E => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8),
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Convert a UTF-8 string to WinAnsi bytes for a `Tj` string.
/// Tabs become spaces; other unmappable chars are replaced with `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .map(|c| match c {
            '\t' => b' ',
            _ => char_to_winansi(c).unwrap_or(b'?'),
        })
        .collect()
}
