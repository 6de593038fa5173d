//! Presentation adapter contract.
//!
//! The session drives a [`Surface`]: it allocates the shared pixel region
//! from it, tells it which rectangle changed, and hands it the finished
//! buffer once the surface reports it is ready for another frame.

use std::io;

use crate::core::keys::KeyEvent;
use crate::render::geometry::Rect;
use crate::runtime::shm::ShmRegion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Key(KeyEvent),
    /// The surface can take a new frame.
    FrameReady,
    /// The window went away or the process was asked to stop.
    Closed,
}

/// A finished buffer handed to [`Surface::present`].
#[derive(Debug, Clone, Copy)]
pub struct PresentFrame<'a> {
    /// Which of the two buffers this is.
    pub buffer: usize,
    /// Premultiplied ARGB32, row-major, `width * height` words.
    pub pixels: &'a [u32],
    pub width: u32,
    pub height: u32,
    /// Region that differs from what the surface last showed.
    pub damage: Rect,
}

pub trait Surface {
    /// Allocates room for two `width * height` ARGB32 frames.
    fn allocate(&mut self, width: u32, height: u32) -> io::Result<ShmRegion> {
        ShmRegion::allocate(2 * width as usize * height as usize)
    }

    /// Records that `rect` must be shown on the next present.
    fn mark_dirty(&mut self, rect: Rect);

    fn present(&mut self, frame: PresentFrame<'_>) -> io::Result<()>;

    /// Blocks until at least one event is available.
    fn next_events(&mut self) -> io::Result<Vec<SurfaceEvent>>;

    /// Restores whatever the surface changed on startup.
    fn stop(&mut self) -> io::Result<()> {
        Ok(())
    }
}
