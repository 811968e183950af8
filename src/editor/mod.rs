//! Text buffer behind the editor pane.
//!
//! A rope-backed buffer with a single cursor. Every mutation bumps a
//! revision counter which the page controller uses to decide when the
//! content has to be persisted again.

mod buffer;

pub use buffer::{Cursor, Direction, TextBuffer};
