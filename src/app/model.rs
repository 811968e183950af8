use std::path::PathBuf;

use crate::document::{Document, FileType};

/// Which input receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    Filename,
    #[default]
    Editor,
    Owner,
    Repo,
    RepoPath,
    Token,
}

impl Focus {
    const BASE: [Self; 2] = [Self::Filename, Self::Editor];
    const WITH_SETTINGS: [Self; 6] = [
        Self::Filename,
        Self::Editor,
        Self::Owner,
        Self::Repo,
        Self::RepoPath,
        Self::Token,
    ];

    fn order(settings_visible: bool) -> &'static [Self] {
        if settings_visible {
            &Self::WITH_SETTINGS
        } else {
            &Self::BASE
        }
    }

    pub(super) fn next(self, settings_visible: bool) -> Self {
        let order = Self::order(settings_visible);
        let idx = order.iter().position(|f| *f == self).unwrap_or(0);
        order[(idx + 1) % order.len()]
    }

    pub(super) fn prev(self, settings_visible: bool) -> Self {
        let order = Self::order(settings_visible);
        let idx = order.iter().position(|f| *f == self).unwrap_or(0);
        order[(idx + order.len() - 1) % order.len()]
    }

    pub const fn is_settings_field(self) -> bool {
        matches!(self, Self::Owner | Self::Repo | Self::RepoPath | Self::Token)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Filename => "Filename",
            Self::Editor => "Editor",
            Self::Owner => "Owner",
            Self::Repo => "Repository",
            Self::RepoPath => "Path",
            Self::Token => "Token",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message the user has to acknowledge before doing anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// GitHub upload settings as typed into the settings panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubFields {
    pub owner: String,
    pub repo: String,
    /// Prefix inside the repository, e.g. `docs/`.
    pub path: String,
    pub token: String,
}

/// The complete application state.
#[derive(Debug, Default)]
pub struct Model {
    pub document: Document,
    pub focus: Focus,
    pub github: GitHubFields,
    pub settings_visible: bool,
    /// Text of the "open file" prompt while it is shown.
    pub open_prompt: Option<String>,
    /// Path submitted from the prompt, waiting for the worker.
    pub(super) pending_open: Option<PathBuf>,
    notice: Option<Notice>,
    /// First buffer line shown in the editor pane.
    pub scroll_offset: usize,
    pub width: u16,
    pub height: u16,
    pub should_quit: bool,
}

impl Model {
    pub fn new(document: Document, size: (u16, u16)) -> Self {
        Self {
            document,
            width: size.0,
            height: size.1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_github(mut self, github: GitHubFields) -> Self {
        self.github = github;
        self
    }

    pub fn show_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            message: message.into(),
        });
    }

    pub(super) fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub const fn has_notice(&self) -> bool {
        self.notice.is_some()
    }

    pub const fn filetype(&self) -> FileType {
        self.document.filetype
    }

    /// Rows available to the editor pane: total minus header, status bar,
    /// and the settings panel when shown.
    pub fn editor_height(&self) -> usize {
        let chrome = 2 + if self.settings_visible { 3 } else { 0 };
        usize::from(self.height.saturating_sub(chrome))
    }

    /// The text field currently focused, if focus is not on the editor.
    pub(super) fn focused_field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Editor => None,
            Focus::Filename => Some(&mut self.document.filename),
            Focus::Owner => Some(&mut self.github.owner),
            Focus::Repo => Some(&mut self.github.repo),
            Focus::RepoPath => Some(&mut self.github.path),
            Focus::Token => Some(&mut self.github.token),
        }
    }

    pub(super) fn ensure_cursor_visible(&mut self) {
        let cursor_line = self.document.buffer.cursor().line;
        let visible = self.editor_height();
        if visible == 0 {
            self.scroll_offset = cursor_line;
            return;
        }
        if cursor_line < self.scroll_offset {
            self.scroll_offset = cursor_line;
        } else if cursor_line >= self.scroll_offset + visible {
            self.scroll_offset = cursor_line + 1 - visible;
        }
    }
}
