// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. export::ExportError)
    clippy::module_name_repetitions
)]

//! # Textpad
//!
//! A small terminal text editor that keeps working offline.
//!
//! - Edits are saved to local storage after every change
//! - Download as plain text formats or a single-page PDF
//! - Upload the document to a GitHub repository
//! - A background worker caches the web assets for offline use and relays
//!   files opened from the command line to the editor
//!
//! ## Architecture
//!
//! The editor uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! The background worker runs on its own thread and only talks to the
//! editor through typed channels.
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`document`]: Text, filename and export format
//! - [`editor`]: Rope-backed text buffer
//! - [`export`]: Text and PDF downloads
//! - [`github`]: Upload through the contents API
//! - [`storage`]: Persisted local state
//! - [`worker`]: Offline asset cache and file-open relay
//! - [`ui`]: Terminal UI components
//! - [`config`]: Saved default flags

pub mod app;
pub mod config;
pub mod document;
pub mod editor;
pub mod export;
pub mod github;
pub mod storage;
pub mod ui;
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model, Settings};
    pub use crate::document::{Document, FileType};
    pub use crate::editor::TextBuffer;
    pub use crate::worker::{AssetManifest, BackgroundWorker, PageMessage};
}
