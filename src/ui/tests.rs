use super::*;
use crate::app::{Focus, GitHubFields, Model, NoticeLevel};
use crate::document::{Document, FileType};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use unicode_width::UnicodeWidthStr;

fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

fn rendered(model: &Model, width: u16, height: u16) -> Vec<String> {
    let mut terminal = create_test_terminal(width, height);
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    (0..height)
        .map(|y| {
            (0..width)
                .map(|x| buffer[(x, y)].symbol().to_string())
                .collect::<String>()
        })
        .collect()
}

#[test]
fn test_header_shows_filename_and_type() {
    let mut doc = Document::new("body");
    doc.filename = "notes".to_string();
    doc.filetype = FileType::Md;
    let model = Model::new(doc, (80, 10));
    let rows = rendered(&model, 80, 10);
    assert!(rows[0].contains("notes"));
    assert!(rows[0].contains("‹ md ›"));
}

#[test]
fn test_editor_shows_line_numbers_and_text() {
    let model = Model::new(Document::new("alpha\nbeta"), (40, 6));
    let rows = rendered(&model, 40, 6);
    assert!(rows[1].starts_with("1 alpha"));
    assert!(rows[2].starts_with("2 beta"));
}

#[test]
fn test_editor_respects_scroll_offset() {
    let text = (1..=30).map(|i| format!("row{i}")).collect::<Vec<_>>().join("\n");
    let mut model = Model::new(Document::new(&text), (40, 6));
    model.scroll_offset = 10;
    let rows = rendered(&model, 40, 6);
    assert!(rows[1].contains("row11"));
    assert!(!rows.iter().any(|r| r.contains("row1 ")));
}

#[test]
fn test_status_bar_reports_cursor_and_filename() {
    let mut model = Model::new(Document::new("añb"), (100, 5));
    model.document.buffer.move_end();
    let rows = rendered(&model, 100, 5);
    let status = &rows[4];
    assert!(status.contains("documento.txt"));
    assert!(status.contains("Ln 1, Col 4"), "{status}");
}

#[test]
fn test_status_column_counts_display_cells() {
    let mut model = Model::new(Document::new("日本\tx"), (100, 5));
    model.document.buffer.move_end();
    let rows = rendered(&model, 100, 5);
    // Two wide chars, a four-cell tab and one narrow char.
    assert!(rows[4].contains("Ln 1, Col 10"), "{}", rows[4]);
}

#[test]
fn test_settings_panel_masks_token() {
    let mut model = Model::new(Document::new(""), (80, 10)).with_github(GitHubFields {
        owner: "octo".to_string(),
        repo: "site".to_string(),
        path: "docs/".to_string(),
        token: "secret".to_string(),
    });
    model.settings_visible = true;
    let rows = rendered(&model, 80, 10);
    let panel = rows[1..4].join("\n");
    assert!(panel.contains("octo"));
    assert!(panel.contains("site"));
    assert!(panel.contains("docs/"));
    assert!(panel.contains("••••••"));
    assert!(!rows.iter().any(|r| r.contains("secret")));
}

#[test]
fn test_notice_overlay_is_rendered() {
    let mut model = Model::new(Document::new("text"), (80, 20));
    model.show_notice(NoticeLevel::Error, "Error uploading the file: Not Found");
    let rows = rendered(&model, 80, 20);
    let all = rows.join("\n");
    assert!(all.contains("Error uploading the file: Not Found"));
    assert!(all.contains("Enter or Esc to close"));
}

#[test]
fn test_open_prompt_replaces_status_bar() {
    let mut model = Model::new(Document::new(""), (80, 5));
    model.open_prompt = Some("/tmp/a.md".to_string());
    let rows = rendered(&model, 80, 5);
    assert!(rows[4].starts_with("Open file: /tmp/a.md"));
}

#[test]
fn test_focus_label_shown_for_fields() {
    let mut model = Model::new(Document::new(""), (100, 5));
    model.focus = Focus::Filename;
    let rows = rendered(&model, 100, 5);
    assert!(rows[4].contains("[Filename]"));
}

#[test]
fn test_cursor_on_multibyte_char_does_not_panic() {
    let mut model = Model::new(Document::new("日本\tx"), (40, 4));
    model.document.buffer.move_to(0, 3);
    let rows = rendered(&model, 40, 4);
    assert!(rows[1].contains('本'));
}

#[test]
fn test_split_rows_reserves_settings_panel() {
    let area = Rect::new(0, 0, 80, 24);
    let [header, settings, editor, footer] = split_rows(area, true);
    assert_eq!(header.height, 1);
    assert_eq!(settings.height, SETTINGS_ROWS);
    assert_eq!(editor.height, 24 - 2 - SETTINGS_ROWS);
    assert_eq!(footer.y, 23);
    let [_, settings, editor, _] = split_rows(area, false);
    assert_eq!(settings.height, 0);
    assert_eq!(editor.height, 22);
}

#[test]
fn test_notice_rect_fits_inside_area() {
    let area = Rect::new(0, 0, 30, 8);
    let popup = notice_rect(area, 500);
    assert!(popup.width <= area.width);
    assert!(popup.height <= area.height);
}

#[test]
fn test_notice_rect_grows_for_wide_text() {
    let area = Rect::new(0, 0, 80, 40);
    let narrow = notice_rect(area, "ab".repeat(40).len());
    let wide = notice_rect(area, "日本".repeat(40).width());
    assert!(wide.height > narrow.height);
}

#[test]
fn test_line_number_width() {
    assert_eq!(line_number_width(9), 1);
    assert_eq!(line_number_width(10), 2);
    assert_eq!(line_number_width(12_345), 5);
}
