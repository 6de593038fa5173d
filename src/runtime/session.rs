//! Session controller: owns the candidates, the input model, the renderer
//! and the pixel buffers, and turns surface events into frames.

use tracing::{debug, info};

use crate::config::Settings;
use crate::core::candidate::CandidateList;
use crate::core::filter::{filter, refine};
use crate::core::input_model::{Command, InputModel};
use crate::core::keybindings::{dispatch, Action};
use crate::core::keys::KeyEvent;
use crate::error::Result;
use crate::render::buffers::BufferPair;
use crate::render::geometry::Rect;
use crate::render::renderer::{FrameReport, Renderer};
use crate::render::text::TextBackend;
use crate::runtime::surface::{PresentFrame, Surface, SurfaceEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Confirmed; holds the line to print.
    Selected(String),
    Cancelled,
}

pub struct Session {
    candidates: CandidateList,
    model: InputModel,
    renderer: Renderer,
    buffers: BufferPair,
    fuzzy: bool,
    /// Dirty rectangle of the most recent render.
    last_dirty: Rect,
    /// Frame waiting for the next `FrameReady`, with the damage gathered
    /// since the last present.
    pending: Option<(FrameReport, Rect)>,
    presented: usize,
}

impl Session {
    /// Allocates the buffers, composes the chrome and renders the first
    /// frame. The frame is presented on the surface's first `FrameReady`.
    pub fn start(
        settings: &Settings,
        candidates: CandidateList,
        backend: Box<dyn TextBackend>,
        surface: &mut dyn Surface,
    ) -> Result<Self> {
        let layout = settings.layout;
        let mut renderer = Renderer::new(settings.style.clone(), &layout, backend)?;
        let region = surface.allocate(layout.width, layout.height)?;
        let mut buffers = BufferPair::new(region, layout.width, layout.height)?;

        let mut model = InputModel::new(filter(&candidates, "", settings.fuzzy_match));
        let report = renderer.init(&mut buffers, &mut model, &candidates);
        surface.mark_dirty(report.dirty);
        info!(candidates = candidates.len(), shared = buffers.region().is_shared(), "session started");

        Ok(Self {
            candidates,
            model,
            renderer,
            buffers,
            fuzzy: settings.fuzzy_match,
            last_dirty: report.dirty,
            pending: Some((report, report.dirty)),
            presented: 0,
        })
    }

    pub fn model(&self) -> &InputModel {
        &self.model
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn buffers(&self) -> &BufferPair {
        &self.buffers
    }

    /// Number of frames handed to the surface so far.
    pub fn presented(&self) -> usize {
        self.presented
    }

    /// Processes one key. Returns the outcome once the user confirms or
    /// cancels.
    pub fn handle_key(&mut self, surface: &mut dyn Surface, event: &KeyEvent) -> Option<Outcome> {
        let command = match dispatch(event) {
            Action::Cancel => return Some(Outcome::Cancelled),
            Action::Confirm => return Some(Outcome::Selected(self.selection_output())),
            Action::Ignore => return None,
            Action::Edit(command) => command,
        };

        if self.model.apply(command) {
            self.refilter(command);
        }

        let report = self.renderer.render(&mut self.buffers, &mut self.model, &self.candidates);
        let damage = report.dirty.union(&self.last_dirty);
        self.last_dirty = report.dirty;
        let gathered = match self.pending.take() {
            Some((_, earlier)) => earlier.union(&damage),
            None => damage,
        };
        surface.mark_dirty(damage);
        self.pending = Some((report, gathered));
        None
    }

    /// Hands the pending frame to the surface. The second buffer is seeded
    /// once the first frame is on screen.
    pub fn frame_ready(&mut self, surface: &mut dyn Surface) -> Result<()> {
        let Some((report, damage)) = self.pending.take() else {
            return Ok(());
        };
        surface.present(PresentFrame {
            buffer: report.buffer,
            pixels: self.buffers.buffer(report.buffer),
            width: self.buffers.width(),
            height: self.buffers.height(),
            damage,
        })?;
        self.presented += 1;
        if self.presented == 1 {
            self.renderer.seed_second_buffer(&mut self.buffers);
        }
        Ok(())
    }

    /// Runs until the user confirms or cancels, or the surface closes.
    pub fn run(&mut self, surface: &mut dyn Surface) -> Result<Outcome> {
        loop {
            for event in surface.next_events()? {
                match event {
                    SurfaceEvent::Key(key) => {
                        if let Some(outcome) = self.handle_key(surface, &key) {
                            self.finish(&outcome);
                            return Ok(outcome);
                        }
                    }
                    SurfaceEvent::FrameReady => self.frame_ready(surface)?,
                    SurfaceEvent::Closed => {
                        let outcome = Outcome::Cancelled;
                        self.finish(&outcome);
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    fn refilter(&mut self, command: Command) {
        let query = self.model.query().as_str();
        let view = match command {
            Command::Insert(_) => refine(&self.candidates, self.model.view(), query, self.fuzzy),
            _ => filter(&self.candidates, query, self.fuzzy),
        };
        debug!(query, results = view.len(), "filtered");
        self.model.replace_view(view);
    }

    /// Selected candidate's output, or the raw query when nothing matches.
    fn selection_output(&self) -> String {
        self.model
            .selected_position()
            .and_then(|position| self.model.view().resolve(&self.candidates, position))
            .map_or_else(|| self.model.query().as_str().to_string(), |candidate| candidate.output().to_string())
    }

    fn finish(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Selected(line) => info!(%line, "selected"),
            Outcome::Cancelled => info!("cancelled"),
        }
        self.renderer.shutdown();
    }
}
