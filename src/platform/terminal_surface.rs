//! [`Surface`] backed by the controlling terminal.
//!
//! Frames go out either through the kitty graphics protocol (terminals
//! that speak it get the pixels verbatim) or as truecolor half-block cells,
//! two pixels per cell, downsampled to fit the grid.

use std::env;
use std::io;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use signal_hook::iterator::Signals;
use tracing::{debug, warn};

use crate::core::style::{Anchor, Layout};
use crate::error::{Error, Result};
use crate::platform::tty::{Tty, WindowSize};
use crate::platform::tty_input::KeyDecoder;
use crate::render::geometry::Rect;
use crate::runtime::surface::{PresentFrame, Surface, SurfaceEvent};

const IMAGE_ID: u32 = 7461;
const KITTY_CHUNK: usize = 4096;
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Cell size assumed when the terminal does not report its pixel size.
const FALLBACK_CELL: (u32, u32) = (10, 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    KittyGraphics,
    HalfBlock,
}

/// Picks kitty graphics for terminals known to implement it.
pub fn detect_presentation() -> Presentation {
    let term_program = env::var("TERM_PROGRAM").unwrap_or_default().to_lowercase();
    let term = env::var("TERM").unwrap_or_default().to_lowercase();

    let kitty = env::var("KITTY_WINDOW_ID").is_ok() || term_program == "kitty" || term.contains("kitty");
    let ghostty = term_program == "ghostty" || term.contains("ghostty") || env::var("GHOSTTY_RESOURCES_DIR").is_ok();
    let wezterm = env::var("WEZTERM_PANE").is_ok() || term_program == "wezterm";
    if kitty || ghostty || wezterm {
        Presentation::KittyGraphics
    } else {
        Presentation::HalfBlock
    }
}

/// How frame pixels map onto terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    /// Frame pixels covered by one cell.
    pub cell_width: u32,
    pub cell_height: u32,
    /// Top-left cell of the frame, 0-based.
    pub column: u32,
    pub row: u32,
    pub columns: u32,
    pub rows: u32,
}

impl Grid {
    pub fn new(presentation: Presentation, layout: &Layout, term: WindowSize) -> Grid {
        let (term_cols, term_rows) = (u32::from(term.columns).max(1), u32::from(term.rows).max(1));
        let (cell_width, cell_height) = match presentation {
            Presentation::KittyGraphics => term.cell_pixels().filter(|&(w, h)| w > 0 && h > 0).unwrap_or(FALLBACK_CELL),
            Presentation::HalfBlock => {
                let scale = layout
                    .width
                    .div_ceil(term_cols)
                    .max(layout.height.div_ceil(2 * term_rows))
                    .max(1);
                (scale, 2 * scale)
            }
        };
        let columns = layout.width.div_ceil(cell_width).min(term_cols);
        let rows = layout.height.div_ceil(cell_height).min(term_rows);

        let anchor = layout.anchor;
        let column = place(
            term_cols,
            columns,
            layout.margin_left / cell_width,
            layout.margin_right / cell_width,
            anchor.contains(Anchor::LEFT),
            anchor.contains(Anchor::RIGHT),
        );
        let row = place(
            term_rows,
            rows,
            layout.margin_top / cell_height,
            layout.margin_bottom / cell_height,
            anchor.contains(Anchor::TOP),
            anchor.contains(Anchor::BOTTOM),
        );
        Grid {
            cell_width,
            cell_height,
            column,
            row,
            columns,
            rows,
        }
    }

    /// Cells touched by `rect`, as `(first_col, first_row, end_col, end_row)`
    /// relative to the frame.
    fn cells(&self, rect: Rect) -> (u32, u32, u32, u32) {
        let x0 = rect.x.max(0) as u32 / self.cell_width;
        let y0 = rect.y.max(0) as u32 / self.cell_height;
        let x1 = (rect.right().max(0) as u32).div_ceil(self.cell_width).min(self.columns);
        let y1 = (rect.bottom().max(0) as u32).div_ceil(self.cell_height).min(self.rows);
        (x0, y0, x1, y1)
    }
}

/// Start offset of a span of `size` cells inside `total`. Anchoring to one
/// edge keeps that edge's margin; anchoring to both or neither centres.
fn place(total: u32, size: u32, margin_start: u32, margin_end: u32, start: bool, end: bool) -> u32 {
    let free = total.saturating_sub(size);
    match (start, end) {
        (true, false) => margin_start.min(free),
        (false, true) => free.saturating_sub(margin_end),
        _ => free / 2,
    }
}

/// Straight RGBA bytes of `region` from a premultiplied ARGB frame.
pub fn unpremultiplied_rgba(pixels: &[u32], width: u32, region: Rect) -> Vec<u8> {
    let mut out = Vec::with_capacity(region.width as usize * region.height as usize * 4);
    for y in region.y..region.bottom() {
        let row = y as usize * width as usize;
        for x in region.x..region.right() {
            let px = pixels[row + x as usize];
            let a = px >> 24;
            let channel = |shift: u32| {
                let c = (px >> shift) & 0xff;
                if a == 0 {
                    0
                } else {
                    ((c * 255 + a / 2) / a).min(255) as u8
                }
            };
            out.extend_from_slice(&[channel(16), channel(8), channel(0), a as u8]);
        }
    }
    out
}

/// Kitty graphics escapes for `region` of the frame. The first transmission
/// creates the image; later ones rewrite a rectangle of its only frame.
pub fn encode_kitty(frame: &PresentFrame<'_>, region: Rect, first: bool) -> Vec<u8> {
    let rgba = unpremultiplied_rgba(frame.pixels, frame.width, region);
    let encoded = STANDARD.encode(rgba);
    let control = if first {
        format!(
            "a=T,f=32,s={},v={},i={IMAGE_ID},q=2,C=1",
            region.width, region.height
        )
    } else {
        format!(
            "a=f,r=1,f=32,i={IMAGE_ID},x={},y={},s={},v={},q=2",
            region.x, region.y, region.width, region.height
        )
    };

    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / KITTY_CHUNK * 16 + control.len() + 16);
    let chunks: Vec<&[u8]> = encoded.as_bytes().chunks(KITTY_CHUNK).collect();
    let last = chunks.len().saturating_sub(1);
    for (index, chunk) in chunks.iter().enumerate() {
        let more = u8::from(index != last);
        out.extend_from_slice(b"\x1b_G");
        if index == 0 {
            out.extend_from_slice(control.as_bytes());
            out.extend_from_slice(format!(",m={more}").as_bytes());
        } else {
            out.extend_from_slice(format!("m={more}").as_bytes());
        }
        out.push(b';');
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\x1b\\");
    }
    out
}

/// Average premultiplied colour of a block, composited over black.
fn block_average(frame: &PresentFrame<'_>, x0: u32, y0: u32, size: u32) -> (u32, u32, u32) {
    let x1 = (x0 + size).min(frame.width);
    let y1 = (y0 + size).min(frame.height);
    if x0 >= x1 || y0 >= y1 {
        return (0, 0, 0);
    }
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for y in y0..y1 {
        let row = y as usize * frame.width as usize;
        for x in x0..x1 {
            let px = frame.pixels[row + x as usize];
            r += u64::from((px >> 16) & 0xff);
            g += u64::from((px >> 8) & 0xff);
            b += u64::from(px & 0xff);
        }
    }
    let n = u64::from((x1 - x0) * (y1 - y0));
    ((r / n) as u32, (g / n) as u32, (b / n) as u32)
}

/// Truecolor upper-half-block cells for every cell under `damage`.
pub fn encode_half_block(frame: &PresentFrame<'_>, grid: &Grid, damage: Rect) -> String {
    let (x0, y0, x1, y1) = grid.cells(damage);
    let scale = grid.cell_width;
    let mut out = String::new();
    for cy in y0..y1 {
        out.push_str(&format!("\x1b[{};{}H", grid.row + cy + 1, grid.column + x0 + 1));
        for cx in x0..x1 {
            let (tr, tg, tb) = block_average(frame, cx * scale, 2 * cy * scale, scale);
            let (br, bg, bb) = block_average(frame, cx * scale, (2 * cy + 1) * scale, scale);
            out.push_str(&format!("\x1b[38;2;{tr};{tg};{tb}m\x1b[48;2;{br};{bg};{bb}m\u{2580}"));
        }
        out.push_str("\x1b[0m");
    }
    out
}

pub struct TerminalSurface {
    tty: Tty,
    decoder: KeyDecoder,
    signals: Signals,
    presentation: Presentation,
    grid: Grid,
    hide_cursor: bool,
    dirty: Rect,
    frame_requested: bool,
    shown_once: bool,
    active: bool,
}

impl TerminalSurface {
    pub fn open(layout: &Layout, hide_cursor: bool) -> Result<Self> {
        Self::with_presentation(layout, hide_cursor, detect_presentation())
    }

    /// Takes over the controlling terminal: raw mode, alternate screen and,
    /// with `hide_cursor`, no visible cursor until [`Surface::stop`].
    pub fn with_presentation(layout: &Layout, hide_cursor: bool, presentation: Presentation) -> Result<Self> {
        let mut tty = Tty::open().map_err(|err| {
            debug!(%err, "cannot open /dev/tty");
            Error::NoTerminal
        })?;
        let term = tty.size().unwrap_or(WindowSize {
            columns: 80,
            rows: 24,
            ..WindowSize::default()
        });
        let grid = Grid::new(presentation, layout, term);
        debug!(?presentation, ?grid, "terminal surface");
        let signals = Signals::new([libc::SIGTERM, libc::SIGHUP, libc::SIGINT])?;

        tty.enable_raw_mode()?;
        let mut setup = String::from("\x1b[?1049h\x1b[2J");
        if hide_cursor {
            setup.push_str("\x1b[?25l");
        }
        tty.write_all(setup.as_bytes())?;

        Ok(Self {
            tty,
            decoder: KeyDecoder::default(),
            signals,
            presentation,
            grid,
            hide_cursor,
            dirty: Rect::default(),
            frame_requested: false,
            shown_once: false,
            active: true,
        })
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }
}

impl Surface for TerminalSurface {
    fn mark_dirty(&mut self, rect: Rect) {
        self.dirty = self.dirty.union(&rect);
        self.frame_requested = true;
    }

    fn present(&mut self, frame: PresentFrame<'_>) -> io::Result<()> {
        let bounds = Rect::new(0, 0, frame.width as i32, frame.height as i32);
        let damage = std::mem::take(&mut self.dirty).union(&frame.damage).intersect(&bounds);
        let bytes = match self.presentation {
            Presentation::KittyGraphics => {
                let first = !self.shown_once;
                let region = if first { bounds } else { damage };
                if region.is_empty() {
                    return Ok(());
                }
                let mut out = Vec::new();
                if first {
                    out.extend_from_slice(format!("\x1b[{};{}H", self.grid.row + 1, self.grid.column + 1).as_bytes());
                }
                out.extend(encode_kitty(&frame, region, first));
                out
            }
            Presentation::HalfBlock => {
                let region = if self.shown_once { damage } else { bounds };
                encode_half_block(&frame, &self.grid, region).into_bytes()
            }
        };
        self.shown_once = true;
        self.tty.write_all(&bytes)
    }

    fn next_events(&mut self) -> io::Result<Vec<SurfaceEvent>> {
        loop {
            let mut events = Vec::new();
            if self.signals.pending().next().is_some() {
                debug!("termination signal");
                events.push(SurfaceEvent::Closed);
                return Ok(events);
            }

            let now = Instant::now();
            events.extend(self.decoder.flush_due(now).into_iter().map(SurfaceEvent::Key));
            if self.frame_requested {
                self.frame_requested = false;
                events.push(SurfaceEvent::FrameReady);
                return Ok(events);
            }
            if !events.is_empty() {
                return Ok(events);
            }

            let timeout = self.decoder.next_timeout(now, POLL_INTERVAL);
            match self.tty.read_available(timeout) {
                Ok(bytes) => {
                    events.extend(self.decoder.process(&bytes).into_iter().map(SurfaceEvent::Key));
                }
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!("terminal closed");
                    events.push(SurfaceEvent::Closed);
                }
                Err(err) => return Err(err),
            }
            if !events.is_empty() {
                return Ok(events);
            }
        }
    }

    fn stop(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let mut teardown = String::new();
        if self.presentation == Presentation::KittyGraphics {
            teardown.push_str(&format!("\x1b_Ga=d,d=I,i={IMAGE_ID},q=2\x1b\\"));
        }
        if self.hide_cursor {
            teardown.push_str("\x1b[?25h");
        }
        teardown.push_str("\x1b[?1049l");
        self.tty.write_all(teardown.as_bytes())?;
        self.tty.restore_mode()
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_half_block, encode_kitty, place, unpremultiplied_rgba, Grid, Presentation};
    use crate::core::style::{Anchor, Layout};
    use crate::platform::tty::WindowSize;
    use crate::render::geometry::Rect;
    use crate::runtime::surface::PresentFrame;

    fn term(columns: u16, rows: u16) -> WindowSize {
        WindowSize {
            columns,
            rows,
            pixel_width: columns * 10,
            pixel_height: rows * 20,
        }
    }

    #[test]
    fn placement_follows_anchor() {
        assert_eq!(place(100, 20, 3, 5, false, false), 40);
        assert_eq!(place(100, 20, 3, 5, true, false), 3);
        assert_eq!(place(100, 20, 3, 5, false, true), 75);
        assert_eq!(place(100, 20, 3, 5, true, true), 40);
        assert_eq!(place(10, 20, 3, 5, true, false), 0);
    }

    #[test]
    fn kitty_grid_uses_cell_pixels() {
        let layout = Layout {
            width: 200,
            height: 100,
            anchor: Anchor::TOP,
            margin_top: 40,
            ..Layout::default()
        };
        let grid = Grid::new(Presentation::KittyGraphics, &layout, term(80, 24));
        assert_eq!((grid.cell_width, grid.cell_height), (10, 20));
        assert_eq!((grid.columns, grid.rows), (20, 5));
        assert_eq!(grid.row, 2);
        assert_eq!(grid.column, 30);
    }

    #[test]
    fn half_block_grid_fits_terminal() {
        let layout = Layout::default();
        let grid = Grid::new(Presentation::HalfBlock, &layout, term(80, 24));
        assert!(grid.columns <= 80);
        assert!(grid.rows <= 24);
        assert_eq!(grid.cell_height, 2 * grid.cell_width);
    }

    #[test]
    fn unpremultiplies_pixels() {
        let pixels = [0x80808080u32, 0x00000000, 0xff102030, 0xff000000];
        let rgba = unpremultiplied_rgba(&pixels, 2, Rect::new(0, 0, 2, 2));
        assert_eq!(&rgba[0..4], &[255, 255, 255, 128]);
        assert_eq!(&rgba[4..8], &[0, 0, 0, 0]);
        assert_eq!(&rgba[8..12], &[0x10, 0x20, 0x30, 255]);
    }

    #[test]
    fn kitty_payload_is_chunked() {
        let pixels = vec![0xff000000u32; 64 * 64];
        let frame = PresentFrame {
            buffer: 0,
            pixels: &pixels,
            width: 64,
            height: 64,
            damage: Rect::new(0, 0, 64, 64),
        };
        let out = String::from_utf8(encode_kitty(&frame, Rect::new(0, 0, 64, 64), true)).expect("ascii");
        assert!(out.starts_with("\x1b_Ga=T,f=32,s=64,v=64,"));
        // 64*64*4 bytes encode to 21848 base64 chars: six chunks.
        assert_eq!(out.matches("\x1b_G").count(), 6);
        assert!(out.contains(",m=1;"));
        assert!(out.ends_with("\x1b\\"));
        assert_eq!(out.matches("m=0;").count(), 1);

        let edit = String::from_utf8(encode_kitty(&frame, Rect::new(4, 8, 2, 2), false)).expect("ascii");
        assert!(edit.starts_with("\x1b_Ga=f,r=1,f=32,"));
        assert!(edit.contains("x=4,y=8,s=2,v=2"));
    }

    #[test]
    fn half_block_redraws_only_damaged_cells() {
        let pixels = vec![0xffff0000u32; 8 * 8];
        let frame = PresentFrame {
            buffer: 0,
            pixels: &pixels,
            width: 8,
            height: 8,
            damage: Rect::new(0, 0, 8, 8),
        };
        let grid = Grid {
            cell_width: 2,
            cell_height: 4,
            column: 0,
            row: 0,
            columns: 4,
            rows: 2,
        };
        let out = encode_half_block(&frame, &grid, Rect::new(0, 0, 2, 4));
        assert_eq!(out.matches('\u{2580}').count(), 1);
        assert!(out.contains("38;2;255;0;0m"));
        let all = encode_half_block(&frame, &grid, Rect::new(0, 0, 8, 8));
        assert_eq!(all.matches('\u{2580}').count(), 8);
    }
}
