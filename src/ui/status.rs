use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::app::{Focus, Model};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let doc = &model.document;
    let cursor = doc.buffer.cursor();
    let line = doc.buffer.line_at(cursor.line).unwrap_or_default();
    // Display column, so wide characters count as two cells.
    let col = line
        .get(..cursor.col)
        .map_or(cursor.col, |before| before.replace('\t', "    ").width());

    let focus = if model.focus == Focus::Editor {
        String::new()
    } else {
        format!("  [{}]", model.focus.label())
    };
    let status = format!(
        " {}  Ln {}, Col {}  rev {}{}  ^S:download ^U:upload ^O:open ^T:type ^G:github ^Q:quit",
        doc.full_filename(),
        cursor.line + 1,
        col + 1,
        doc.buffer.revision(),
        focus,
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_open_prompt(model: &Model, frame: &mut Frame, area: Rect) {
    let text = model.open_prompt.as_deref().unwrap_or_default();
    let prompt = format!("Open file: {text}█  Enter:open  Esc:cancel");
    let bar = Paragraph::new(prompt).style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_widget(bar, area);
}
