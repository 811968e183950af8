//! Terminal UI components.
//!
//! - [`render`]: header, settings panel and editor pane
//! - status bar and "open file" prompt
//! - the modal notice overlay

mod overlays;
mod render;
mod status;

pub use overlays::notice_rect;
pub use render::{line_number_width, render, split_rows};

/// Rows taken by the GitHub settings panel when it is shown.
pub const SETTINGS_ROWS: u16 = 3;

/// Placeholder shown instead of each token character.
pub const TOKEN_MASK: char = '•';

#[cfg(test)]
mod tests;
