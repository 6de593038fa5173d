//! Terminal integration: raw tty access, key decoding and a terminal
//! backed [`Surface`](crate::runtime::surface::Surface).

pub mod terminal_surface;
pub mod tty;
pub mod tty_input;

pub use terminal_surface::{detect_presentation, Presentation, TerminalSurface};
