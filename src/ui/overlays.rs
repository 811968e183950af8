use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::{Model, NoticeLevel};

/// Where the notice popup goes for a message `message_width` cells wide.
pub fn notice_rect(area: Rect, message_width: usize) -> Rect {
    let popup_width = area.width.saturating_sub(8).clamp(20, 64);
    let inner_width = usize::from(popup_width.saturating_sub(4)).max(1);
    // Message rows plus borders, padding and the hint line.
    let rows = u16::try_from(message_width.div_ceil(inner_width)).unwrap_or(u16::MAX);
    let popup_height = rows.saturating_add(6);
    centered_popup_rect(popup_width, popup_height, area)
}

pub fn render_notice(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(notice) = model.notice() else {
        return;
    };
    let (title, color) = match notice.level {
        NoticeLevel::Info => ("Notice", Color::Cyan),
        NoticeLevel::Warning => ("Warning", Color::Yellow),
        NoticeLevel::Error => ("Error", Color::Red),
    };
    let popup = notice_rect(area, notice.message.width());

    let lines = vec![
        Line::raw(notice.message.clone()),
        Line::raw(""),
        Line::styled("Enter or Esc to close", Style::default().fg(Color::DarkGray)),
    ];
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        popup,
    );
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
