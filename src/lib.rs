//! tofi: a keyboard-driven picker.
//!
//! Candidates come from standard input (or installed applications with
//! `--drun`), the user narrows them with a typed query, and the confirmed
//! choice is printed to standard output.
//!
//! # Layout
//! - [`core`]: candidates, filtering, the query and selection model, key
//!   dispatch, style settings.
//! - [`render`]: the ARGB canvas, chrome, bitmap text and the
//!   double-buffered renderer.
//! - [`runtime`]: the session controller, the [`runtime::surface::Surface`]
//!   contract and shared pixel memory.
//! - [`platform`]: the terminal-backed surface.
//! - [`config`]: config file and command-line options.

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;

pub use crate::config::Settings;
pub use crate::core::candidate::{Candidate, CandidateList, CandidateSource, ResultView};
pub use crate::core::filter::{filter, refine};
pub use crate::core::input_model::{Command, InputModel, SelectionState};
pub use crate::core::keybindings::{dispatch, Action};
pub use crate::core::keys::KeyEvent;
pub use crate::error::{ConfigError, Error, FontError, Result};
pub use crate::render::renderer::{FrameReport, Renderer};
pub use crate::runtime::session::{Outcome, Session};
pub use crate::runtime::surface::{PresentFrame, Surface, SurfaceEvent};
