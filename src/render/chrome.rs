//! Window chrome: background, border between two outlines, rounded corners.

use crate::core::style::{Color, Style};
use crate::render::canvas::{Canvas, Operator};
use crate::render::geometry::Rect;

/// Paints the chrome over the whole canvas. Runs once per surface.
pub fn paint_chrome(canvas: &mut Canvas<'_>, width: u32, height: u32, style: &Style) {
    canvas.reset_clip();
    canvas.paint(style.background, Operator::Source);

    let outline = style.outline_width as f32;
    let border = style.border_width as f32;
    let shape = RoundedRect::new(width, height, style.corner_radius);

    shape.stroke(canvas, 4.0 * outline + 2.0 * border, style.outline_color);
    shape.stroke(canvas, 2.0 * outline + 2.0 * border, style.border_color);
    shape.stroke(canvas, 2.0 * outline, style.outline_color);
    shape.clear_outside(canvas);
}

/// Drawing area left inside the border, outlines, padding and corner radius.
pub fn content_clip(width: u32, height: u32, style: &Style) -> Rect {
    let dx = 2 * i64::from(style.outline_width) + i64::from(style.border_width);
    let pad = style.padding;
    let inner_radius = (i64::from(style.corner_radius) - dx).max(0) as f64;
    let inset = (inner_radius * (1.0 - std::f64::consts::FRAC_1_SQRT_2)).ceil() as i64;

    let x = dx + i64::from(pad.left) + inset;
    let y = dx + i64::from(pad.top) + inset;
    let w = i64::from(width) - 2 * dx - i64::from(pad.left) - i64::from(pad.right) - 2 * inset;
    let h = i64::from(height) - 2 * dx - i64::from(pad.top) - i64::from(pad.bottom) - 2 * inset;
    let clamp = |v: i64| v.clamp(0, i64::from(i32::MAX)) as i32;
    Rect::new(clamp(x), clamp(y), clamp(w), clamp(h))
}

/// Rounded rectangle whose path runs along the surface edges.
struct RoundedRect {
    width: u32,
    height: u32,
    half_w: f32,
    half_h: f32,
    radius: f32,
}

impl RoundedRect {
    fn new(width: u32, height: u32, radius: u32) -> Self {
        let half_w = width as f32 / 2.0;
        let half_h = height as f32 / 2.0;
        Self {
            width,
            height,
            half_w,
            half_h,
            radius: (radius as f32).min(half_w).min(half_h),
        }
    }

    /// Signed distance from the centre of pixel (x, y) to the path;
    /// negative inside.
    fn distance(&self, x: u32, y: u32) -> f32 {
        let px = (x as f32 + 0.5 - self.half_w).abs();
        let py = (y as f32 + 0.5 - self.half_h).abs();
        let qx = px - (self.half_w - self.radius);
        let qy = py - (self.half_h - self.radius);
        let outside = qx.max(0.0).hypot(qy.max(0.0));
        outside + qx.max(qy).min(0.0) - self.radius
    }

    fn stroke(&self, canvas: &mut Canvas<'_>, line_width: f32, color: Color) {
        if line_width <= 0.0 {
            return;
        }
        let half = line_width / 2.0;
        // Only a band along the edges can be touched.
        let reach = (half + self.radius + 1.0).ceil() as u32;
        self.for_each_edge_pixel(reach, |x, y| {
            let coverage = coverage_of(half - self.distance(x, y).abs());
            canvas.blend(x as i32, y as i32, color, coverage, Operator::Over);
        });
    }

    /// Clears everything outside the path so the corners are transparent.
    fn clear_outside(&self, canvas: &mut Canvas<'_>) {
        if self.radius <= 0.0 {
            return;
        }
        let reach = (self.radius + 1.0).ceil() as u32;
        self.for_each_edge_pixel(reach, |x, y| {
            let coverage = coverage_of(self.distance(x, y));
            canvas.blend(x as i32, y as i32, Color::TRANSPARENT, coverage, Operator::Clear);
        });
    }

    fn for_each_edge_pixel(&self, reach: u32, mut f: impl FnMut(u32, u32)) {
        for y in 0..self.height {
            let near_y = y < reach || y + reach >= self.height;
            if near_y {
                (0..self.width).for_each(|x| f(x, y));
                continue;
            }
            for x in (0..reach.min(self.width)).chain(self.width.saturating_sub(reach).max(reach)..self.width) {
                f(x, y);
            }
        }
    }
}

/// Coverage for a pixel whose centre lies `d` pixels inside a boundary.
fn coverage_of(d: f32) -> u8 {
    ((d + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::{content_clip, paint_chrome};
    use crate::core::style::{Color, Padding, Style};
    use crate::render::canvas::Canvas;
    use crate::render::geometry::Rect;

    fn style(border: u32, outline: u32, radius: u32, padding: u32) -> Style {
        Style {
            border_width: border,
            outline_width: outline,
            corner_radius: radius,
            padding: Padding::uniform(padding),
            ..Style::default()
        }
    }

    #[test]
    fn clip_insets_by_border_outline_and_padding() {
        let clip = content_clip(200, 100, &style(12, 4, 0, 8));
        // dx = 2*4 + 12 = 20
        assert_eq!(clip, Rect::new(28, 28, 144, 44));
    }

    #[test]
    fn clip_accounts_for_corner_radius() {
        let clip = content_clip(200, 100, &style(2, 1, 24, 0));
        // dx = 4, inner radius 20, inset ceil(20 * 0.2929) = 6
        assert_eq!(clip, Rect::new(10, 10, 180, 80));
    }

    #[test]
    fn clip_collapses_when_window_too_small() {
        assert!(content_clip(10, 10, &style(12, 4, 0, 8)).is_empty());
    }

    #[test]
    fn chrome_layers_outline_border_outline() {
        let style = Style {
            outline_color: Color::rgb(0, 0, 0xff),
            border_color: Color::rgb(0xff, 0, 0),
            background: Color::rgb(0, 0xff, 0),
            ..style(2, 1, 0, 0)
        };
        let (w, h) = (40u32, 20u32);
        let mut pixels = vec![0u32; (w * h) as usize];
        let mut canvas = Canvas::new(&mut pixels, w, h);
        paint_chrome(&mut canvas, w, h, &style);
        // Visible band is 2*outline + border = 4px: outline, border, border, outline.
        assert_eq!(canvas.pixel(0, 10), Some(0xff0000ff));
        assert_eq!(canvas.pixel(1, 10), Some(0xffff0000));
        assert_eq!(canvas.pixel(2, 10), Some(0xffff0000));
        assert_eq!(canvas.pixel(3, 10), Some(0xff0000ff));
        assert_eq!(canvas.pixel(4, 10), Some(0xff00ff00));
        assert_eq!(canvas.pixel(20, 10), Some(0xff00ff00));
    }

    #[test]
    fn rounded_corners_are_transparent() {
        let style = style(2, 1, 8, 0);
        let (w, h) = (40u32, 30u32);
        let mut pixels = vec![0u32; (w * h) as usize];
        let mut canvas = Canvas::new(&mut pixels, w, h);
        paint_chrome(&mut canvas, w, h, &style);
        assert_eq!(canvas.pixel(0, 0), Some(0));
        assert_eq!(canvas.pixel(w as i32 - 1, h as i32 - 1), Some(0));
        assert_eq!(canvas.pixel(20, 15).map(|px| px >> 24), Some(0xff));
    }
}
