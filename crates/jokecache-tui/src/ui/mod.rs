//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, the joke card, status bar and overlays
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling

pub mod input;
pub mod render;
pub mod styles;
