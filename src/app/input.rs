use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Focus, Message, Model};
use crate::editor::Direction;

impl App {
    pub(super) fn handle_event(event: &Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Paste(text) if model.focus == Focus::Editor && !model.has_notice() => {
                // Some terminals send pasted line breaks as a lone CR.
                Some(Message::EditorInsertStr(
                    text.replace("\r\n", "\n").replace('\r', "\n"),
                ))
            }
            Event::Resize(w, h) => Some(Message::Resize(*w, *h)),
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        // A notice blocks everything until acknowledged.
        if model.has_notice() {
            return matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')
            )
            .then_some(Message::DismissNotice);
        }

        if model.open_prompt.is_some() {
            return Self::handle_prompt_key(key);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        if ctrl && let Some(msg) = Self::handle_command_key(key.code, shift) {
            return Some(msg);
        }

        match key.code {
            KeyCode::Tab => return Some(Message::FocusNext),
            KeyCode::BackTab => return Some(Message::FocusPrev),
            _ => {}
        }

        if model.focus == Focus::Editor {
            Self::handle_editor_key(key.code, ctrl)
        } else {
            Self::handle_field_key(key.code, ctrl)
        }
    }

    fn handle_command_key(code: KeyCode, shift: bool) -> Option<Message> {
        match code {
            KeyCode::Char('s' | 'S') => Some(Message::Download),
            KeyCode::Char('u' | 'U') => Some(Message::Upload),
            KeyCode::Char('T') => Some(Message::CycleFileTypeBack),
            KeyCode::Char('t') if shift => Some(Message::CycleFileTypeBack),
            KeyCode::Char('t') => Some(Message::CycleFileType),
            KeyCode::Char('o' | 'O') => Some(Message::OpenFilePrompt),
            KeyCode::Char('g' | 'G') => Some(Message::ToggleSettings),
            KeyCode::Char('q' | 'Q') => Some(Message::Quit),
            _ => None,
        }
    }

    fn handle_prompt_key(key: KeyEvent) -> Option<Message> {
        match key.code {
            KeyCode::Enter => Some(Message::SubmitOpenFile),
            KeyCode::Esc => Some(Message::CancelOpenFile),
            KeyCode::Backspace => Some(Message::FieldBackspace),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Message::FieldInput(c))
            }
            _ => None,
        }
    }

    fn handle_editor_key(code: KeyCode, ctrl: bool) -> Option<Message> {
        match code {
            KeyCode::Left if ctrl => Some(Message::EditorMoveWordLeft),
            KeyCode::Right if ctrl => Some(Message::EditorMoveWordRight),
            KeyCode::Home if ctrl => Some(Message::EditorMoveToStart),
            KeyCode::End if ctrl => Some(Message::EditorMoveToEnd),
            KeyCode::Left => Some(Message::EditorMoveCursor(Direction::Left)),
            KeyCode::Right => Some(Message::EditorMoveCursor(Direction::Right)),
            KeyCode::Up => Some(Message::EditorMoveCursor(Direction::Up)),
            KeyCode::Down => Some(Message::EditorMoveCursor(Direction::Down)),
            KeyCode::Home => Some(Message::EditorMoveHome),
            KeyCode::End => Some(Message::EditorMoveEnd),
            KeyCode::PageUp => Some(Message::EditorPageUp),
            KeyCode::PageDown => Some(Message::EditorPageDown),
            KeyCode::Enter => Some(Message::EditorSplitLine),
            KeyCode::Backspace => Some(Message::EditorDeleteBack),
            KeyCode::Delete => Some(Message::EditorDeleteForward),
            KeyCode::Char(c) if !ctrl => Some(Message::EditorInsertChar(c)),
            _ => None,
        }
    }

    fn handle_field_key(code: KeyCode, ctrl: bool) -> Option<Message> {
        match code {
            KeyCode::Enter | KeyCode::Down => Some(Message::FocusNext),
            KeyCode::Up => Some(Message::FocusPrev),
            KeyCode::Backspace => Some(Message::FieldBackspace),
            KeyCode::Char(c) if !ctrl => Some(Message::FieldInput(c)),
            _ => None,
        }
    }
}
