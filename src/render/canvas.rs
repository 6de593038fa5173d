//! Premultiplied ARGB32 drawing over a borrowed pixel slice.
//!
//! All coordinates are surface coordinates. A canvas may view a sub-area of
//! the surface (see [`Layer`]); `origin` is the surface position of its
//! first pixel. Every write is limited to the canvas clip.

use crate::core::style::{mul_div255, Color};
use crate::render::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Replace the destination.
    Source,
    /// Composite over the destination.
    Over,
    /// Remove the destination, weighted by coverage.
    Clear,
}

pub struct Canvas<'a> {
    pixels: &'a mut [u32],
    bounds: Rect,
    clip: Rect,
}

impl<'a> Canvas<'a> {
    /// A canvas covering a `width`×`height` surface at the origin.
    pub fn new(pixels: &'a mut [u32], width: u32, height: u32) -> Self {
        let bounds = Rect::new(0, 0, width as i32, height as i32);
        debug_assert!(pixels.len() >= (width * height) as usize);
        Self {
            pixels,
            bounds,
            clip: bounds,
        }
    }

    fn with_bounds(pixels: &'a mut [u32], bounds: Rect) -> Self {
        Self {
            pixels,
            bounds,
            clip: bounds,
        }
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    pub fn set_clip(&mut self, clip: Rect) {
        self.clip = clip.intersect(&self.bounds);
    }

    pub fn reset_clip(&mut self) {
        self.clip = self.bounds;
    }

    fn index(&self, x: i32, y: i32) -> usize {
        ((y - self.bounds.y) * self.bounds.width + (x - self.bounds.x)) as usize
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.bounds
            .contains(x, y)
            .then(|| self.pixels[self.index(x, y)])
    }

    /// Fills the clip area with `color`.
    pub fn paint(&mut self, color: Color, op: Operator) {
        let clip = self.clip;
        self.fill_rect(clip, color, op);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color, op: Operator) {
        let area = rect.intersect(&self.clip);
        if area.is_empty() {
            return;
        }
        let src = color.premultiplied();
        for y in area.y..area.bottom() {
            let start = self.index(area.x, y);
            let row = &mut self.pixels[start..start + area.width as usize];
            for px in row {
                *px = composite(*px, src, 255, op);
            }
        }
    }

    /// Composites `color` at one pixel with the given coverage (0..=255).
    pub fn blend(&mut self, x: i32, y: i32, color: Color, coverage: u8, op: Operator) {
        if coverage == 0 || !self.clip.contains(x, y) {
            return;
        }
        let index = self.index(x, y);
        self.pixels[index] = composite(self.pixels[index], color.premultiplied(), u32::from(coverage), op);
    }

    /// Composites the pixels of `layer` over this canvas.
    pub fn composite_layer(&mut self, layer: &Layer) {
        let area = layer.bounds.intersect(&self.clip);
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let src = layer.pixels[layer.index(x, y)];
                if src == 0 {
                    continue;
                }
                let index = self.index(x, y);
                self.pixels[index] = composite(self.pixels[index], src, 255, Operator::Over);
            }
        }
    }
}

/// Off-screen group: a transparent pixel area drawn into on its own and
/// composited onto a canvas afterwards.
pub struct Layer {
    pixels: Vec<u32>,
    bounds: Rect,
}

impl Layer {
    pub fn new(bounds: Rect) -> Self {
        Self {
            pixels: vec![0; (bounds.width as usize) * (bounds.height as usize)],
            bounds,
        }
    }

    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas::with_bounds(&mut self.pixels, self.bounds)
    }

    fn index(&self, x: i32, y: i32) -> usize {
        ((y - self.bounds.y) * self.bounds.width + (x - self.bounds.x)) as usize
    }
}

fn scale_pixel(px: u32, factor: u32) -> u32 {
    let a = mul_div255(px >> 24, factor);
    let r = mul_div255((px >> 16) & 0xff, factor);
    let g = mul_div255((px >> 8) & 0xff, factor);
    let b = mul_div255(px & 0xff, factor);
    (a << 24) | (r << 16) | (g << 8) | b
}

fn composite(dst: u32, src: u32, coverage: u32, op: Operator) -> u32 {
    match op {
        Operator::Source if coverage == 255 => src,
        // Linear interpolation between destination and source.
        Operator::Source => add_pixels(scale_pixel(src, coverage), scale_pixel(dst, 255 - coverage)),
        Operator::Over => {
            let src = if coverage == 255 { src } else { scale_pixel(src, coverage) };
            let inv_alpha = 255 - (src >> 24);
            add_pixels(src, scale_pixel(dst, inv_alpha))
        }
        Operator::Clear => scale_pixel(dst, 255 - coverage),
    }
}

fn add_pixels(a: u32, b: u32) -> u32 {
    let channel = |shift: u32| (((a >> shift) & 0xff) + ((b >> shift) & 0xff)).min(255) << shift;
    channel(24) | channel(16) | channel(8) | channel(0)
}
