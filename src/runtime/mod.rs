//! Session orchestration and the presentation contract.

pub mod session;
pub mod shm;
pub mod surface;

pub use session::{Outcome, Session};
pub use surface::{PresentFrame, Surface, SurfaceEvent};
