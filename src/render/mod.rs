//! Pixel pipeline: canvas, chrome, text and the frame renderer.

pub mod buffers;
pub mod canvas;
pub mod chrome;
pub mod font;
pub mod geometry;
pub mod renderer;
pub mod text;
