use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

use crate::app::{Focus, Model};

use super::{SETTINGS_ROWS, TOKEN_MASK, overlays, status};

/// Header, optional settings panel, editor, status bar.
pub fn split_rows(area: Rect, settings_visible: bool) -> [Rect; 4] {
    let settings = if settings_visible { SETTINGS_ROWS } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(settings),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let [header, settings, editor, footer] = split_rows(area, model.settings_visible);

    render_header(model, frame, header);
    if model.settings_visible {
        render_settings(model, frame, settings);
    }
    render_editor(model, frame, editor);
    if model.open_prompt.is_some() {
        status::render_open_prompt(model, frame, footer);
    } else {
        status::render_status_bar(model, frame, footer);
    }

    if model.notice().is_some() {
        overlays::render_notice(model, frame, area);
    }
}

fn field_style(model: &Model, field: Focus) -> Style {
    if model.focus == field && model.open_prompt.is_none() {
        Style::default().bg(Color::White).fg(Color::Black)
    } else {
        Style::default().add_modifier(Modifier::UNDERLINED)
    }
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{text}: "), Style::default().fg(Color::DarkGray))
}

fn render_header(model: &Model, frame: &mut Frame, area: Rect) {
    let filename = if model.document.filename.is_empty() && model.focus != Focus::Filename {
        crate::document::DEFAULT_FILENAME.to_string()
    } else {
        model.document.filename.clone()
    };
    let line = Line::from(vec![
        Span::styled(" textpad ", Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::raw("  "),
        label("File"),
        Span::styled(format!("{filename} "), field_style(model, Focus::Filename)),
        Span::raw(" "),
        label("Type"),
        Span::styled(
            format!("‹ {} ›", model.filetype()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_settings(model: &Model, frame: &mut Frame, area: Rect) {
    let gh = &model.github;
    let token: String = std::iter::repeat_n(TOKEN_MASK, gh.token.chars().count()).collect();
    let lines = vec![
        Line::from(vec![
            Span::raw(" "),
            label("Owner"),
            Span::styled(format!("{} ", gh.owner), field_style(model, Focus::Owner)),
            Span::raw("  "),
            label("Repository"),
            Span::styled(format!("{} ", gh.repo), field_style(model, Focus::Repo)),
        ]),
        Line::from(vec![
            Span::raw(" "),
            label("Path"),
            Span::styled(format!("{} ", gh.path), field_style(model, Focus::RepoPath)),
            Span::raw("  "),
            label("Token"),
            Span::styled(format!("{token} "), field_style(model, Focus::Token)),
        ]),
        Line::styled(
            " GitHub upload  Ctrl+U:upload  Ctrl+G:hide",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(Color::Indexed(236))),
        area,
    );
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let buf = &model.document.buffer;
    let total_lines = buf.line_count();
    let gutter_width = usize::from(line_number_width(total_lines));

    let visible_height = usize::from(area.height);
    let start = model.scroll_offset.min(total_lines.saturating_sub(1));
    let end = (start + visible_height).min(total_lines);
    let cursor = buf.cursor();
    let show_cursor = model.focus == Focus::Editor && model.open_prompt.is_none();

    let mut content: Vec<Line> = Vec::with_capacity(end - start);
    for line_idx in start..end {
        let line_text = buf.line_at(line_idx).unwrap_or_default().replace('\t', "    ");
        let line_num = format!("{:>gutter_width$} ", line_idx + 1);
        let mut spans = vec![Span::styled(line_num, Style::default().fg(Color::DarkGray))];

        if show_cursor && line_idx == cursor.line {
            let raw = buf.line_at(line_idx).unwrap_or_default();
            spans.extend(cursor_spans(&raw, cursor.col));
        } else {
            spans.push(Span::raw(line_text));
        }
        content.push(Line::from(spans));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content), area);
}

/// Split `line` around the cursor so the character under it is highlighted.
fn cursor_spans(line: &str, col: usize) -> Vec<Span<'static>> {
    let mut col = col.min(line.len());
    while !line.is_char_boundary(col) {
        col -= 1;
    }
    let (before, rest) = line.split_at(col);
    let cursor_len = rest.chars().next().map_or(0, char::len_utf8);
    let (under, after) = rest.split_at(cursor_len);
    let under = match under {
        "" => " ".to_string(),
        "\t" => "    ".to_string(),
        other => other.to_string(),
    };

    let mut spans = Vec::with_capacity(3);
    if !before.is_empty() {
        spans.push(Span::raw(before.replace('\t', "    ")));
    }
    spans.push(Span::styled(
        under,
        Style::default().bg(Color::White).fg(Color::Black),
    ));
    if !after.is_empty() {
        spans.push(Span::raw(after.replace('\t', "    ")));
    }
    spans
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
