//! Bitmap fonts: PSF1/PSF2 console fonts and a built-in 8x8 fallback.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::FontError;

const PSF1_MAGIC: [u8; 2] = [0x36, 0x04];
const PSF1_MODE512: u8 = 0x01;
const PSF1_MODEHASTAB: u8 = 0x02;
const PSF1_MODESEQ: u8 = 0x04;
const PSF1_SEPARATOR: u16 = 0xffff;
const PSF1_STARTSEQ: u16 = 0xfffe;

const PSF2_MAGIC: [u8; 4] = [0x72, 0xb5, 0x4a, 0x86];
const PSF2_HAS_UNICODE_TABLE: u32 = 0x01;
const PSF2_SEPARATOR: u8 = 0xff;
const PSF2_STARTSEQ: u8 = 0xfe;

/// Monochrome glyph bitmaps. Rows are stored most-significant bit first,
/// padded to whole bytes.
#[derive(Debug, Clone)]
pub struct BitmapFont {
    width: u32,
    height: u32,
    glyphs: Vec<u8>,
    glyph_count: usize,
    /// Unicode mapping; without one, a code point indexes glyphs directly.
    map: Option<HashMap<char, usize>>,
}

impl BitmapFont {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn row_bytes(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    pub fn glyph_index(&self, ch: char) -> Option<usize> {
        match &self.map {
            Some(map) => map.get(&ch).copied(),
            None => {
                let index = ch as usize;
                (index < self.glyph_count).then_some(index)
            }
        }
    }

    /// Whether the pixel at (`x`, `y`) of glyph `index` is set.
    pub fn is_set(&self, index: usize, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height || index >= self.glyph_count {
            return false;
        }
        let row_bytes = self.row_bytes();
        let offset = index * row_bytes * self.height as usize + y as usize * row_bytes + (x / 8) as usize;
        self.glyphs
            .get(offset)
            .is_some_and(|byte| byte & (0x80 >> (x % 8)) != 0)
    }

    pub fn load(path: &Path) -> Result<Self, FontError> {
        let data = fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&data).map_err(|reason| match reason {
            ParseFailure::NotPsf => FontError::NotPsf(path.to_path_buf()),
            ParseFailure::Malformed(reason) => FontError::Malformed {
                path: path.to_path_buf(),
                reason,
            },
        })
    }

    pub fn parse(data: &[u8]) -> Result<Self, ParseFailure> {
        if data.starts_with(&PSF2_MAGIC) {
            parse_psf2(data)
        } else if data.starts_with(&PSF1_MAGIC) {
            parse_psf1(data)
        } else {
            Err(ParseFailure::NotPsf)
        }
    }

    /// The embedded 8x8 ASCII font.
    pub fn builtin() -> Self {
        let mut glyphs = vec![0u8; 128 * 8];
        for (offset, glyph) in FONT8X8_ASCII.iter().enumerate() {
            let base = (0x20 + offset) * 8;
            for (row, bits) in glyph.iter().enumerate() {
                // Stored leftmost-pixel-in-LSB.
                glyphs[base + row] = bits.reverse_bits();
            }
        }
        Self {
            width: 8,
            height: 8,
            glyphs,
            glyph_count: 128,
            map: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    NotPsf,
    Malformed(&'static str),
}

fn parse_psf1(data: &[u8]) -> Result<BitmapFont, ParseFailure> {
    let mode = *data.get(2).ok_or(ParseFailure::Malformed("short header"))?;
    let height = *data.get(3).ok_or(ParseFailure::Malformed("short header"))?;
    if height == 0 {
        return Err(ParseFailure::Malformed("zero glyph height"));
    }
    let glyph_count = if mode & PSF1_MODE512 != 0 { 512 } else { 256 };
    let glyph_bytes = usize::from(height);
    let glyph_end = 4 + glyph_count * glyph_bytes;
    let glyphs = data
        .get(4..glyph_end)
        .ok_or(ParseFailure::Malformed("glyph data truncated"))?
        .to_vec();

    let map = if mode & (PSF1_MODEHASTAB | PSF1_MODESEQ) != 0 {
        let table = &data[glyph_end..];
        let mut map = HashMap::new();
        let mut glyph = 0usize;
        let mut in_sequence = false;
        for pair in table.chunks_exact(2) {
            if glyph >= glyph_count {
                break;
            }
            let value = u16::from_le_bytes([pair[0], pair[1]]);
            match value {
                PSF1_SEPARATOR => {
                    glyph += 1;
                    in_sequence = false;
                }
                PSF1_STARTSEQ => in_sequence = true,
                _ if in_sequence => {}
                _ => {
                    if let Some(ch) = char::from_u32(u32::from(value)) {
                        map.entry(ch).or_insert(glyph);
                    }
                }
            }
        }
        Some(map)
    } else {
        None
    };

    Ok(BitmapFont {
        width: 8,
        height: u32::from(height),
        glyphs,
        glyph_count,
        map,
    })
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, ParseFailure> {
    data.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(ParseFailure::Malformed("short header"))
}

fn parse_psf2(data: &[u8]) -> Result<BitmapFont, ParseFailure> {
    let header_size = read_u32(data, 8)? as usize;
    let flags = read_u32(data, 12)?;
    let glyph_count = read_u32(data, 16)? as usize;
    let glyph_bytes = read_u32(data, 20)? as usize;
    let height = read_u32(data, 24)?;
    let width = read_u32(data, 28)?;

    if width == 0 || height == 0 || glyph_count == 0 {
        return Err(ParseFailure::Malformed("empty glyph geometry"));
    }
    if glyph_bytes != width.div_ceil(8) as usize * height as usize {
        return Err(ParseFailure::Malformed("glyph size does not match dimensions"));
    }
    let glyph_end = glyph_count
        .checked_mul(glyph_bytes)
        .and_then(|len| len.checked_add(header_size))
        .ok_or(ParseFailure::Malformed("glyph table too large"))?;
    let glyphs = data
        .get(header_size..glyph_end)
        .ok_or(ParseFailure::Malformed("glyph data truncated"))?
        .to_vec();

    let map = if flags & PSF2_HAS_UNICODE_TABLE != 0 {
        let mut map = HashMap::new();
        let mut rest = &data[glyph_end..];
        for glyph in 0..glyph_count {
            let end = rest
                .iter()
                .position(|&b| b == PSF2_SEPARATOR)
                .unwrap_or(rest.len());
            let entry = &rest[..end];
            // Single code points come first; sequences follow 0xFE.
            let singles = entry
                .iter()
                .position(|&b| b == PSF2_STARTSEQ)
                .map_or(entry, |seq| &entry[..seq]);
            for ch in String::from_utf8_lossy(singles).chars() {
                if ch != char::REPLACEMENT_CHARACTER {
                    map.entry(ch).or_insert(glyph);
                }
            }
            rest = rest.get(end + 1..).unwrap_or(&[]);
        }
        Some(map)
    } else {
        None
    };

    Ok(BitmapFont {
        width,
        height,
        glyphs,
        glyph_count,
        map,
    })
}

/// Printable ASCII (0x20..=0x7e) from the public-domain font8x8 set.
#[rustfmt::skip]
const FONT8X8_ASCII: [[u8; 8]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x18, 0x3C, 0x3C, 0x18, 0x18, 0x00, 0x18, 0x00], // !
    [0x36, 0x36, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // "
    [0x36, 0x36, 0x7F, 0x36, 0x7F, 0x36, 0x36, 0x00], // #
    [0x0C, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x0C, 0x00], // $
    [0x00, 0x63, 0x33, 0x18, 0x0C, 0x66, 0x63, 0x00], // %
    [0x1C, 0x36, 0x1C, 0x6E, 0x3B, 0x33, 0x6E, 0x00], // &
    [0x06, 0x06, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00], // '
    [0x18, 0x0C, 0x06, 0x06, 0x06, 0x0C, 0x18, 0x00], // (
    [0x06, 0x0C, 0x18, 0x18, 0x18, 0x0C, 0x06, 0x00], // )
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // *
    [0x00, 0x0C, 0x0C, 0x3F, 0x0C, 0x0C, 0x00, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ,
    [0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00], // .
    [0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01, 0x00], // /
    [0x3E, 0x63, 0x73, 0x7B, 0x6F, 0x67, 0x3E, 0x00], // 0
    [0x0C, 0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x3F, 0x00], // 1
    [0x1E, 0x33, 0x30, 0x1C, 0x06, 0x33, 0x3F, 0x00], // 2
    [0x1E, 0x33, 0x30, 0x1C, 0x30, 0x33, 0x1E, 0x00], // 3
    [0x38, 0x3C, 0x36, 0x33, 0x7F, 0x30, 0x78, 0x00], // 4
    [0x3F, 0x03, 0x1F, 0x30, 0x30, 0x33, 0x1E, 0x00], // 5
    [0x1C, 0x06, 0x03, 0x1F, 0x33, 0x33, 0x1E, 0x00], // 6
    [0x3F, 0x33, 0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x00], // 7
    [0x1E, 0x33, 0x33, 0x1E, 0x33, 0x33, 0x1E, 0x00], // 8
    [0x1E, 0x33, 0x33, 0x3E, 0x30, 0x18, 0x0E, 0x00], // 9
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x00], // :
    [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x06], // ;
    [0x18, 0x0C, 0x06, 0x03, 0x06, 0x0C, 0x18, 0x00], // <
    [0x00, 0x00, 0x3F, 0x00, 0x00, 0x3F, 0x00, 0x00], // =
    [0x06, 0x0C, 0x18, 0x30, 0x18, 0x0C, 0x06, 0x00], // >
    [0x1E, 0x33, 0x30, 0x18, 0x0C, 0x00, 0x0C, 0x00], // ?
    [0x3E, 0x63, 0x7B, 0x7B, 0x7B, 0x03, 0x1E, 0x00], // @
    [0x0C, 0x1E, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x00], // A
    [0x3F, 0x66, 0x66, 0x3E, 0x66, 0x66, 0x3F, 0x00], // B
    [0x3C, 0x66, 0x03, 0x03, 0x03, 0x66, 0x3C, 0x00], // C
    [0x1F, 0x36, 0x66, 0x66, 0x66, 0x36, 0x1F, 0x00], // D
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x46, 0x7F, 0x00], // E
    [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x06, 0x0F, 0x00], // F
    [0x3C, 0x66, 0x03, 0x03, 0x73, 0x66, 0x7C, 0x00], // G
    [0x33, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x33, 0x00], // H
    [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // I
    [0x78, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E, 0x00], // J
    [0x67, 0x66, 0x36, 0x1E, 0x36, 0x66, 0x67, 0x00], // K
    [0x0F, 0x06, 0x06, 0x06, 0x46, 0x66, 0x7F, 0x00], // L
    [0x63, 0x77, 0x7F, 0x7F, 0x6B, 0x63, 0x63, 0x00], // M
    [0x63, 0x67, 0x6F, 0x7B, 0x73, 0x63, 0x63, 0x00], // N
    [0x1C, 0x36, 0x63, 0x63, 0x63, 0x36, 0x1C, 0x00], // O
    [0x3F, 0x66, 0x66, 0x3E, 0x06, 0x06, 0x0F, 0x00], // P
    [0x1E, 0x33, 0x33, 0x33, 0x3B, 0x1E, 0x38, 0x00], // Q
    [0x3F, 0x66, 0x66, 0x3E, 0x36, 0x66, 0x67, 0x00], // R
    [0x1E, 0x33, 0x07, 0x0E, 0x38, 0x33, 0x1E, 0x00], // S
    [0x3F, 0x2D, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // T
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x33, 0x3F, 0x00], // U
    [0x33, 0x33, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // V
    [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // W
    [0x63, 0x63, 0x36, 0x1C, 0x1C, 0x36, 0x63, 0x00], // X
    [0x33, 0x33, 0x33, 0x1E, 0x0C, 0x0C, 0x1E, 0x00], // Y
    [0x7F, 0x63, 0x31, 0x18, 0x4C, 0x66, 0x7F, 0x00], // Z
    [0x1E, 0x06, 0x06, 0x06, 0x06, 0x06, 0x1E, 0x00], // [
    [0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x40, 0x00], // backslash
    [0x1E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x1E, 0x00], // ]
    [0x08, 0x1C, 0x36, 0x63, 0x00, 0x00, 0x00, 0x00], // ^
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // _
    [0x0C, 0x0C, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00], // `
    [0x00, 0x00, 0x1E, 0x30, 0x3E, 0x33, 0x6E, 0x00], // a
    [0x07, 0x06, 0x06, 0x3E, 0x66, 0x66, 0x3B, 0x00], // b
    [0x00, 0x00, 0x1E, 0x33, 0x03, 0x33, 0x1E, 0x00], // c
    [0x38, 0x30, 0x30, 0x3E, 0x33, 0x33, 0x6E, 0x00], // d
    [0x00, 0x00, 0x1E, 0x33, 0x3F, 0x03, 0x1E, 0x00], // e
    [0x1C, 0x36, 0x06, 0x0F, 0x06, 0x06, 0x0F, 0x00], // f
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x1F], // g
    [0x07, 0x06, 0x36, 0x6E, 0x66, 0x66, 0x67, 0x00], // h
    [0x0C, 0x00, 0x0E, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // i
    [0x30, 0x00, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E], // j
    [0x07, 0x06, 0x66, 0x36, 0x1E, 0x36, 0x67, 0x00], // k
    [0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00], // l
    [0x00, 0x00, 0x33, 0x7F, 0x7F, 0x6B, 0x63, 0x00], // m
    [0x00, 0x00, 0x1F, 0x33, 0x33, 0x33, 0x33, 0x00], // n
    [0x00, 0x00, 0x1E, 0x33, 0x33, 0x33, 0x1E, 0x00], // o
    [0x00, 0x00, 0x3B, 0x66, 0x66, 0x3E, 0x06, 0x0F], // p
    [0x00, 0x00, 0x6E, 0x33, 0x33, 0x3E, 0x30, 0x78], // q
    [0x00, 0x00, 0x3B, 0x6E, 0x66, 0x06, 0x0F, 0x00], // r
    [0x00, 0x00, 0x3E, 0x03, 0x1E, 0x30, 0x1F, 0x00], // s
    [0x08, 0x0C, 0x3E, 0x0C, 0x0C, 0x2C, 0x18, 0x00], // t
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x33, 0x6E, 0x00], // u
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00], // v
    [0x00, 0x00, 0x63, 0x6B, 0x7F, 0x7F, 0x36, 0x00], // w
    [0x00, 0x00, 0x63, 0x36, 0x1C, 0x36, 0x63, 0x00], // x
    [0x00, 0x00, 0x33, 0x33, 0x33, 0x3E, 0x30, 0x1F], // y
    [0x00, 0x00, 0x3F, 0x19, 0x0C, 0x26, 0x3F, 0x00], // z
    [0x38, 0x0C, 0x0C, 0x07, 0x0C, 0x0C, 0x38, 0x00], // {
    [0x18, 0x18, 0x18, 0x00, 0x18, 0x18, 0x18, 0x00], // |
    [0x07, 0x0C, 0x0C, 0x38, 0x0C, 0x0C, 0x07, 0x00], // }
    [0x6E, 0x3B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ~
];

#[cfg(test)]
mod tests {
    use super::{BitmapFont, ParseFailure};

    fn psf1(height: u8, mode: u8, fill: impl Fn(usize) -> u8) -> Vec<u8> {
        let mut data = vec![0x36, 0x04, mode, height];
        let count = if mode & 1 != 0 { 512 } else { 256 };
        for glyph in 0..count {
            for _ in 0..height {
                data.push(fill(glyph));
            }
        }
        data
    }

    #[test]
    fn builtin_glyphs_are_msb_first() {
        let font = BitmapFont::builtin();
        let bang = font.glyph_index('!').expect("glyph");
        // Row 0 of '!' is 0x18 in LSB-left order: pixels 3 and 4 set.
        let row: Vec<bool> = (0..8).map(|x| font.is_set(bang, x, 0)).collect();
        assert_eq!(row, vec![false, false, false, true, true, false, false, false]);
        assert!(font.glyph_index('\u{e9}').is_none());
    }

    #[test]
    fn parses_psf1_without_unicode_table() {
        let data = psf1(16, 0, |glyph| if glyph == usize::from(b'A') { 0x80 } else { 0 });
        let font = BitmapFont::parse(&data).expect("psf1");
        assert_eq!((font.width(), font.height()), (8, 16));
        let a = font.glyph_index('A').expect("glyph");
        assert!(font.is_set(a, 0, 15));
        assert!(!font.is_set(a, 1, 15));
    }

    #[test]
    fn parses_psf1_unicode_table() {
        let mut data = psf1(8, 0x02, |_| 0xff);
        for glyph in 0..256u16 {
            if glyph == 1 {
                data.extend_from_slice(&0x263au16.to_le_bytes());
            }
            data.extend_from_slice(&0xffffu16.to_le_bytes());
        }
        let font = BitmapFont::parse(&data).expect("psf1");
        assert_eq!(font.glyph_index('\u{263a}'), Some(1));
        assert_eq!(font.glyph_index('A'), None);
    }

    #[test]
    fn parses_psf2_with_unicode_table() {
        let (width, height, count) = (10u32, 4u32, 2u32);
        let glyph_bytes = 2 * height;
        let mut data = vec![0x72, 0xb5, 0x4a, 0x86];
        for value in [0, 32, 1, count, glyph_bytes, height, width] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend(std::iter::repeat(0).take((glyph_bytes * count) as usize));
        // Glyph 1, row 0: set pixel 9 (second byte, bit 0x40).
        data[32 + glyph_bytes as usize + 1] = 0x40;
        data.extend_from_slice("x".as_bytes());
        data.push(0xff);
        data.extend_from_slice("é".as_bytes());
        data.push(0xfe);
        data.extend_from_slice("e\u{301}".as_bytes());
        data.push(0xff);

        let font = BitmapFont::parse(&data).expect("psf2");
        assert_eq!((font.width(), font.height()), (10, 4));
        assert_eq!(font.glyph_index('x'), Some(0));
        assert_eq!(font.glyph_index('é'), Some(1));
        assert_eq!(font.glyph_index('e'), None);
        assert!(font.is_set(1, 9, 0));
        assert!(!font.is_set(1, 8, 0));
    }

    #[test]
    fn rejects_garbage_and_truncation() {
        assert_eq!(BitmapFont::parse(b"hello").err(), Some(ParseFailure::NotPsf));
        assert!(matches!(
            BitmapFont::parse(&[0x36, 0x04, 0, 16, 1, 2]),
            Err(ParseFailure::Malformed(_))
        ));
    }
}
