//! Text backends: lay out a string at a pen position, paint it, and report
//! its pixel extent.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use unicode_width::UnicodeWidthChar;

use crate::core::style::{Color, Style};
use crate::error::FontError;
use crate::render::canvas::{Canvas, Operator};
use crate::render::font::BitmapFont;
use crate::render::geometry::{Extent, Point, Rect};

const CONSOLE_FONT_DIRS: [&str; 2] = ["/usr/share/kbd/consolefonts", "/usr/share/consolefonts"];
const CONSOLE_FONT_EXTENSIONS: [&str; 2] = ["psfu", "psf"];
/// Tallest line the scale may produce, in pixels.
const MAX_LINE_HEIGHT: u32 = 4096;

pub trait TextBackend {
    /// Height of one line of text in pixels.
    fn line_height(&self) -> u32;

    /// Extent `text` would occupy, without painting.
    fn measure(&self, text: &str) -> Extent;

    /// Paints `text` with its top-left corner at `pen`.
    fn layout_and_paint(&mut self, canvas: &mut Canvas<'_>, pen: Point, text: &str, color: Color) -> Extent;

    fn shutdown(&mut self) {}
}

/// Integer-scaled bitmap text shared by both backends.
#[derive(Debug, Clone)]
pub struct BitmapText {
    font: BitmapFont,
    scale: u32,
}

impl BitmapText {
    pub fn new(font: BitmapFont, font_size: u32) -> Self {
        let max_scale = (MAX_LINE_HEIGHT / font.height().max(1)).max(1);
        let scale = ((f64::from(font_size) / f64::from(font.height())).round() as u32).clamp(1, max_scale);
        Self { font, scale }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    fn cell_width(&self) -> u32 {
        self.font.width().saturating_mul(self.scale)
    }

    fn advance(&self, ch: char) -> u32 {
        (ch.width().unwrap_or(0) as u32).saturating_mul(self.cell_width())
    }

    fn line_height(&self) -> u32 {
        self.font.height().saturating_mul(self.scale)
    }

    fn measure(&self, text: &str) -> Extent {
        let width = text.chars().fold(0u32, |sum, ch| sum.saturating_add(self.advance(ch)));
        Extent::new(width, self.line_height())
    }

    fn paint(&self, canvas: &mut Canvas<'_>, pen: Point, text: &str, color: Color) -> Extent {
        let mut x = pen.x;
        for ch in text.chars() {
            let advance = self.advance(ch);
            if advance > 0 {
                match self.font.glyph_index(ch) {
                    Some(glyph) => self.paint_glyph(canvas, Point::new(x, pen.y), glyph, color),
                    None => self.paint_missing(canvas, Point::new(x, pen.y), advance, color),
                }
            }
            x = x.saturating_add(advance.min(i32::MAX as u32) as i32);
        }
        Extent::new(x.saturating_sub(pen.x) as u32, self.line_height())
    }

    fn paint_glyph(&self, canvas: &mut Canvas<'_>, origin: Point, glyph: usize, color: Color) {
        let scale = self.scale as i32;
        let cell = Rect::new(origin.x, origin.y, self.cell_width() as i32, self.line_height() as i32);
        if cell.intersect(&canvas.clip()).is_empty() {
            return;
        }
        for gy in 0..self.font.height() {
            for gx in 0..self.font.width() {
                if !self.font.is_set(glyph, gx, gy) {
                    continue;
                }
                let px = origin.x + gx as i32 * scale;
                let py = origin.y + gy as i32 * scale;
                canvas.fill_rect(Rect::new(px, py, scale, scale), color, Operator::Over);
            }
        }
    }

    /// Hollow box standing in for a character the font lacks.
    fn paint_missing(&self, canvas: &mut Canvas<'_>, origin: Point, advance: u32, color: Color) {
        let inset = self.scale as i32;
        let left = origin.x + inset;
        let right = origin.x + advance as i32 - inset - 1;
        let top = origin.y + inset;
        let bottom = origin.y + self.line_height() as i32 - inset - 1;
        for x in left..=right {
            canvas.blend(x, top, color, 255, Operator::Over);
            canvas.blend(x, bottom, color, 255, Operator::Over);
        }
        for y in top..=bottom {
            canvas.blend(left, y, color, 255, Operator::Over);
            canvas.blend(right, y, color, 255, Operator::Over);
        }
    }
}

/// Backend for a `font-name` that is a readable font file.
#[derive(Debug)]
pub struct PathFontBackend {
    path: PathBuf,
    text: BitmapText,
}

impl PathFontBackend {
    pub fn open(path: &Path, style: &Style) -> Result<Self, FontError> {
        let font = BitmapFont::load(path)?;
        let text = BitmapText::new(font, style.font_size);
        info!(path = %path.display(), scale = text.scale(), "loaded font file");
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Backend for a `font-name` that names a font: looked up among installed
/// console fonts, falling back to the built-in font.
#[derive(Debug)]
pub struct NamedFontBackend {
    name: String,
    text: BitmapText,
}

impl NamedFontBackend {
    pub fn new(style: &Style) -> Self {
        let font = find_console_font(&style.font_name)
            .and_then(|path| match BitmapFont::load(&path) {
                Ok(font) => Some(font),
                Err(err) => {
                    warn!("{err}");
                    None
                }
            })
            .unwrap_or_else(|| {
                debug!(name = %style.font_name, "using built-in font");
                BitmapFont::builtin()
            });
        Self {
            name: style.font_name.clone(),
            text: BitmapText::new(font, style.font_size),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn find_console_font(name: &str) -> Option<PathBuf> {
    CONSOLE_FONT_DIRS.iter().find_map(|dir| {
        CONSOLE_FONT_EXTENSIONS
            .iter()
            .map(|ext| Path::new(dir).join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
    })
}

macro_rules! bitmap_backend {
    ($backend:ty) => {
        impl TextBackend for $backend {
            fn line_height(&self) -> u32 {
                self.text.line_height()
            }

            fn measure(&self, text: &str) -> Extent {
                self.text.measure(text)
            }

            fn layout_and_paint(&mut self, canvas: &mut Canvas<'_>, pen: Point, text: &str, color: Color) -> Extent {
                self.text.paint(canvas, pen, text, color)
            }
        }
    };
}

bitmap_backend!(PathFontBackend);
bitmap_backend!(NamedFontBackend);

/// Picks the path backend when `font-name` is a readable file, the
/// name-lookup backend otherwise.
pub fn select_backend(style: &Style) -> Result<Box<dyn TextBackend>, FontError> {
    let path = Path::new(&style.font_name);
    if File::open(path).is_ok_and(|file| file.metadata().is_ok_and(|meta| meta.is_file())) {
        return Ok(Box::new(PathFontBackend::open(path, style)?));
    }
    Ok(Box::new(NamedFontBackend::new(style)))
}
