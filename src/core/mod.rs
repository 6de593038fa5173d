//! Model types and pure picker logic.

pub mod candidate;
pub mod desktop;
pub mod filter;
pub mod input_model;
pub mod keybindings;
pub mod keys;
pub mod query;
pub mod style;
