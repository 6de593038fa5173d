//! Double-buffered, damage-tracked frame renderer.
//!
//! Chrome is painted once into buffer 0 and copied into buffer 1 the first
//! time buffer 1 is needed. Each later frame only restores the background
//! under the rectangles the previous frame of the same buffer painted, then
//! lays out the prompt, the query and the current page of results.

use tracing::debug;

use crate::core::candidate::CandidateList;
use crate::core::filter::find_ignore_ascii_case;
use crate::core::input_model::InputModel;
use crate::core::style::{Color, Layout, Orientation, Style};
use crate::error::Error;
use crate::render::buffers::BufferPair;
use crate::render::canvas::{Canvas, Layer, Operator};
use crate::render::chrome::{content_clip, paint_chrome};
use crate::render::geometry::{Extent, Point, Rect};
use crate::render::text::TextBackend;

/// Outcome of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Buffer that now holds the frame.
    pub buffer: usize,
    /// Number of results drawn.
    pub drawn: usize,
    /// Bounding box of every pixel the pass may have changed.
    pub dirty: Rect,
}

pub struct Renderer {
    style: Style,
    orientation: Orientation,
    max_results: usize,
    width: u32,
    height: u32,
    clip: Rect,
    backend: Box<dyn TextBackend>,
    damage: [Vec<Rect>; 2],
    active: usize,
    seeded: bool,
}

impl Renderer {
    pub fn new(style: Style, layout: &Layout, backend: Box<dyn TextBackend>) -> Result<Self, Error> {
        if layout.width == 0 || layout.height == 0 {
            return Err(Error::WindowTooSmall {
                width: layout.width,
                height: layout.height,
            });
        }
        let clip = content_clip(layout.width, layout.height, &style);
        debug!(?clip, "content clip");
        Ok(Self {
            style,
            orientation: layout.orientation,
            max_results: layout.max_results as usize,
            width: layout.width,
            height: layout.height,
            clip,
            backend,
            damage: [Vec::new(), Vec::new()],
            active: 0,
            seeded: false,
        })
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Buffer holding the most recently completed frame.
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn damage(&self, buffer: usize) -> &[Rect] {
        &self.damage[buffer]
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Paints the chrome and the first frame into buffer 0.
    pub fn init(&mut self, buffers: &mut BufferPair, model: &mut InputModel, candidates: &CandidateList) -> FrameReport {
        {
            let mut canvas = Canvas::new(buffers.buffer_mut(0), self.width, self.height);
            paint_chrome(&mut canvas, self.width, self.height, &self.style);
        }
        let mut report = self.draw(buffers, 0, model, candidates);
        self.active = 0;
        report.dirty = self.bounds();
        report
    }

    /// Duplicates buffer 0 (chrome, first frame and its damage list) into
    /// buffer 1. Only the first call does anything.
    pub fn seed_second_buffer(&mut self, buffers: &mut BufferPair) -> bool {
        if self.seeded {
            return false;
        }
        buffers.copy_from(0);
        self.damage[1] = self.damage[0].clone();
        self.seeded = true;
        debug!("seeded second buffer");
        true
    }

    /// Draws the current state into the inactive buffer and makes it active.
    pub fn render(&mut self, buffers: &mut BufferPair, model: &mut InputModel, candidates: &CandidateList) -> FrameReport {
        let target = self.active ^ 1;
        if target == 1 {
            self.seed_second_buffer(buffers);
        }
        let report = self.draw(buffers, target, model, candidates);
        self.active = target;
        report
    }

    pub fn shutdown(&mut self) {
        self.backend.shutdown();
    }

    fn draw(
        &mut self,
        buffers: &mut BufferPair,
        target: usize,
        model: &mut InputModel,
        candidates: &CandidateList,
    ) -> FrameReport {
        let stale = std::mem::take(&mut self.damage[target]);
        let mut canvas = Canvas::new(buffers.buffer_mut(target), self.width, self.height);
        canvas.set_clip(self.clip);

        let mut dirty = Rect::default();
        for rect in &stale {
            canvas.fill_rect(*rect, self.style.background, Operator::Source);
            dirty = dirty.union(rect);
        }

        let mut frame = Frame {
            backend: self.backend.as_mut(),
            canvas,
            clip: self.clip,
            style: &self.style,
            damage: Vec::new(),
        };
        let drawn = frame.paint_all(self.orientation, self.max_results, model, candidates);
        let painted = frame.damage;

        for rect in &painted {
            dirty = dirty.union(rect);
        }
        self.damage[target] = painted;
        model.record_drawn(drawn);
        debug!(buffer = target, drawn, "drew results");

        FrameReport {
            buffer: target,
            drawn,
            dirty,
        }
    }
}

struct Frame<'a, 'b> {
    backend: &'a mut dyn TextBackend,
    canvas: Canvas<'b>,
    clip: Rect,
    style: &'a Style,
    damage: Vec<Rect>,
}

impl Frame<'_, '_> {
    fn paint_all(
        &mut self,
        orientation: Orientation,
        max_results: usize,
        model: &InputModel,
        candidates: &CandidateList,
    ) -> usize {
        let style = self.style;
        let fg = style.foreground;
        let mut pen = self.clip.origin();

        let prompt = self.text(pen, &style.prompt_text, fg);
        pen.x += prompt.width as i32;

        let query = model.query().as_str();
        let query_extent = self.text(pen, query, fg);
        let mut previous = Extent::new(query_extent.width.max(style.min_input_width), query_extent.height);

        let selection = model.selection();
        let view = model.view();
        let available = view.len().saturating_sub(selection.page_anchor);
        let limit = if max_results == 0 {
            available
        } else {
            max_results.min(available)
        };
        let spacing = style.result_spacing;

        let mut drawn = 0;
        for i in 0..limit {
            match orientation {
                Orientation::Horizontal => pen.x += previous.width as i32 + spacing,
                Orientation::Vertical => pen.y += previous.height as i32 + spacing,
            }
            let Some(candidate) = view.resolve(candidates, selection.page_anchor + i) else {
                break;
            };
            let display = candidate.display();
            let extent = self.backend.measure(display);
            let overflows = match orientation {
                Orientation::Horizontal => pen.x + extent.width as i32 > self.clip.right(),
                Orientation::Vertical => pen.y + extent.height as i32 > self.clip.bottom(),
            };
            if overflows {
                break;
            }
            if i == selection.cursor {
                self.selected(pen, extent, display, query);
            } else {
                self.text(pen, display, fg);
            }
            previous = extent;
            drawn = i + 1;
        }
        drawn
    }

    fn text(&mut self, pen: Point, text: &str, color: Color) -> Extent {
        let extent = self.backend.layout_and_paint(&mut self.canvas, pen, text, color);
        self.publish(Rect::at(pen, extent));
        extent
    }

    /// Selected result: text in the selection colors (with the matched part
    /// highlighted) painted into a group, composited over its background.
    fn selected(&mut self, pen: Point, extent: Extent, display: &str, query: &str) {
        let style = self.style;
        let segments = style
            .highlight_color()
            .filter(|_| !query.is_empty())
            .and_then(|highlight| {
                let start = find_ignore_ascii_case(display, query)?;
                let end = start + query.len();
                Some([
                    (&display[..start], style.selection_foreground),
                    (&display[start..end], highlight),
                    (&display[end..], style.selection_foreground),
                ])
            });

        let text_rect = Rect::at(pen, extent).intersect(&self.clip);
        let mut group = Layer::new(text_rect);
        let mut width = 0u32;
        {
            let mut canvas = group.canvas();
            let mut paint = |text: &str, color: Color| {
                let at = Point::new(pen.x + width as i32, pen.y);
                width += self.backend.layout_and_paint(&mut canvas, at, text, color).width;
            };
            match segments {
                Some(parts) => parts.into_iter().for_each(|(text, color)| paint(text, color)),
                None => paint(display, style.selection_foreground),
            }
        }

        let pad = if style.selection_background_padding < 0 {
            self.clip.width
        } else {
            style.selection_background_padding
        };
        let background = Rect::new(pen.x - pad, pen.y, width as i32 + 2 * pad, extent.height as i32);
        self.canvas.fill_rect(background, style.selection_background, Operator::Over);
        self.publish(background);
        self.canvas.composite_layer(&group);
        self.publish(text_rect);
    }

    fn publish(&mut self, rect: Rect) {
        let rect = rect.intersect(&self.clip);
        if !rect.is_empty() {
            self.damage.push(rect);
        }
    }
}
