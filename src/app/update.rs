use std::path::PathBuf;

use crate::app::Model;
use crate::app::model::Focus;
use crate::editor::{Direction, TextBuffer};

/// All possible events and actions in the application.
///
/// These represent user input, worker deliveries, and terminal events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editor
    /// Insert a character at the cursor
    EditorInsertChar(char),
    /// Insert pasted text at the cursor
    EditorInsertStr(String),
    /// Delete character before cursor (Backspace)
    EditorDeleteBack,
    /// Delete character at cursor (Delete)
    EditorDeleteForward,
    /// Split line at cursor (Enter)
    EditorSplitLine,
    EditorMoveCursor(Direction),
    EditorMoveHome,
    EditorMoveEnd,
    EditorMoveWordLeft,
    EditorMoveWordRight,
    EditorMoveToStart,
    EditorMoveToEnd,
    EditorPageUp,
    EditorPageDown,

    // Form fields
    FocusNext,
    FocusPrev,
    /// Type into the focused field (filename, settings, or open prompt)
    FieldInput(char),
    FieldBackspace,
    /// Select the next filetype option
    CycleFileType,
    /// Select the previous filetype option
    CycleFileTypeBack,
    ToggleSettings,

    // Actions
    /// Save the document in the selected format
    Download,
    /// Upload the document to GitHub
    Upload,
    /// Show the "open file" prompt
    OpenFilePrompt,
    /// Hand the prompt's path to the worker
    SubmitOpenFile,
    CancelOpenFile,
    /// The worker relayed a launched file
    FileOpened { content: String, name: String },
    DismissNotice,

    // Window
    Resize(u16, u16),
    // Application
    Quit,
}

impl Message {
    /// Messages still handled while a notice blocks the screen.
    const fn passes_notice(&self) -> bool {
        matches!(
            self,
            Self::DismissNotice | Self::Resize(..) | Self::FileOpened { .. }
        )
    }
}

/// Pure state transition.
pub fn update(mut model: Model, msg: Message) -> Model {
    if model.has_notice() && !msg.passes_notice() {
        return model;
    }

    match msg {
        Message::EditorInsertChar(ch) => edit(&mut model, |buf| buf.insert_char(ch)),
        Message::EditorInsertStr(text) => edit(&mut model, |buf| buf.insert_str(&text)),
        Message::EditorDeleteBack => edit(&mut model, |buf| {
            buf.delete_back();
        }),
        Message::EditorDeleteForward => edit(&mut model, |buf| {
            buf.delete_forward();
        }),
        Message::EditorSplitLine => edit(&mut model, TextBuffer::split_line),
        Message::EditorMoveCursor(dir) => edit(&mut model, |buf| buf.move_cursor(dir)),
        Message::EditorMoveHome => edit(&mut model, TextBuffer::move_home),
        Message::EditorMoveEnd => edit(&mut model, TextBuffer::move_end),
        Message::EditorMoveWordLeft => {
            edit(&mut model, TextBuffer::move_word_left);
        }
        Message::EditorMoveWordRight => {
            edit(&mut model, TextBuffer::move_word_right);
        }
        Message::EditorMoveToStart => edit(&mut model, TextBuffer::move_to_start),
        Message::EditorMoveToEnd => edit(&mut model, TextBuffer::move_to_end),
        Message::EditorPageUp => {
            let page = model.editor_height().max(1);
            let cursor = model.document.buffer.cursor();
            edit(&mut model, |buf| {
                buf.move_to(cursor.line.saturating_sub(page), cursor.col);
            });
        }
        Message::EditorPageDown => {
            let page = model.editor_height().max(1);
            let cursor = model.document.buffer.cursor();
            edit(&mut model, |buf| buf.move_to(cursor.line + page, cursor.col));
        }

        Message::FocusNext => {
            model.focus = model.focus.next(model.settings_visible);
        }
        Message::FocusPrev => {
            model.focus = model.focus.prev(model.settings_visible);
        }
        Message::FieldInput(ch) => {
            if let Some(prompt) = model.open_prompt.as_mut() {
                prompt.push(ch);
            } else if let Some(field) = model.focused_field_mut() {
                field.push(ch);
            }
        }
        Message::FieldBackspace => {
            if let Some(prompt) = model.open_prompt.as_mut() {
                prompt.pop();
            } else if let Some(field) = model.focused_field_mut() {
                field.pop();
            }
        }
        Message::CycleFileType => {
            model.document.filetype = model.document.filetype.next();
        }
        Message::CycleFileTypeBack => {
            model.document.filetype = model.document.filetype.prev();
        }
        Message::ToggleSettings => {
            model.settings_visible = !model.settings_visible;
            if model.settings_visible {
                model.focus = Focus::Owner;
            } else if model.focus.is_settings_field() {
                model.focus = Focus::Editor;
            }
            model.ensure_cursor_visible();
        }

        // Side effects run in the event loop.
        Message::Download | Message::Upload => {}

        Message::OpenFilePrompt => {
            model.open_prompt = Some(String::new());
        }
        Message::SubmitOpenFile => {
            if let Some(path) = model.open_prompt.take() {
                let path = path.trim();
                if !path.is_empty() {
                    model.pending_open = Some(PathBuf::from(path));
                }
            }
        }
        Message::CancelOpenFile => {
            model.open_prompt = None;
        }
        Message::FileOpened { content, name } => {
            model.document.apply_file_open(&content, &name);
            model.scroll_offset = 0;
        }
        Message::DismissNotice => model.dismiss_notice(),

        Message::Resize(width, height) => {
            model.width = width;
            model.height = height;
            model.ensure_cursor_visible();
        }
        Message::Quit => {
            model.should_quit = true;
        }
    }
    model
}

/// Apply a buffer operation and keep the cursor on screen.
fn edit(model: &mut Model, op: impl FnOnce(&mut TextBuffer)) {
    op(&mut model.document.buffer);
    model.ensure_cursor_visible();
}
