//! TUI rendering components.

mod render;

pub use render::{View, draw, key_hints};
