use ropey::Rope;

/// Cursor position in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Byte offset within the line.
    pub col: usize,
    /// Column to return to when moving vertically across short lines.
    sticky_col: usize,
}

impl Cursor {
    pub const fn origin() -> Self {
        Self::at(0, 0)
    }

    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            sticky_col: col,
        }
    }

    const fn place(&mut self, col: usize) {
        self.col = col;
        self.sticky_col = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::origin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Editable text with a cursor.
pub struct TextBuffer {
    rope: Rope,
    cursor: Cursor,
    revision: u64,
}

impl TextBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::origin(),
            revision: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Number of mutations applied since the buffer was created.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Content of a line without its line terminator.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let mut line = self.rope.line(line_idx).to_string();
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Some(line)
    }

    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |l| l.len())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole content and put the cursor at the origin.
    pub fn replace_all(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.cursor = Cursor::origin();
        self.touch();
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.split_line();
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, ch);
        self.place_at_char(idx + 1);
        self.touch();
    }

    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, s);
        self.place_at_char(idx + s.chars().count());
        self.touch();
    }

    pub fn split_line(&mut self) {
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, '\n');
        self.cursor.line += 1;
        self.cursor.place(0);
        self.touch();
    }

    /// Backspace. Returns `false` when there is nothing before the cursor.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor.col == 0 && self.cursor.line == 0 {
            return false;
        }
        let idx = self.cursor_char_idx();
        if self.cursor.col == 0 {
            let prev_len = self.line_len(self.cursor.line - 1);
            let terminator = self.terminator_len(self.cursor.line - 1);
            self.rope.remove(idx - terminator..idx);
            self.cursor.line -= 1;
            self.cursor.place(prev_len);
        } else {
            let width = self.prev_char_len();
            self.rope.remove(idx - 1..idx);
            self.cursor.place(self.cursor.col - width);
        }
        self.touch();
        true
    }

    /// Delete key. Returns `false` at the very end of the buffer.
    pub fn delete_forward(&mut self) -> bool {
        let at_line_end = self.cursor.col >= self.line_len(self.cursor.line);
        if at_line_end && self.cursor.line + 1 >= self.line_count() {
            return false;
        }
        let idx = self.cursor_char_idx();
        let count = if at_line_end {
            self.terminator_len(self.cursor.line)
        } else {
            1
        };
        self.rope.remove(idx..idx + count);
        self.touch();
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.step_left(),
            Direction::Right => self.step_right(),
            Direction::Up => self.step_vertical(-1),
            Direction::Down => self.step_vertical(1),
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor.place(0);
    }

    pub fn move_end(&mut self) {
        self.cursor.place(self.line_len(self.cursor.line));
    }

    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            self.step_left();
            return;
        }
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let before = line[..clamp_col(&line, self.cursor.col)].trim_end();
        let start = before
            .rfind(|c: char| !is_word_char(c))
            .map_or(0, |i| i + before[i..].chars().next().map_or(1, char::len_utf8));
        self.cursor.place(start);
    }

    pub fn move_word_right(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        if self.cursor.col >= line.len() {
            self.step_right();
            return;
        }
        let col = clamp_col(&line, self.cursor.col);
        let after = &line[col..];
        let word_end = after.find(|c: char| !is_word_char(c)).unwrap_or(after.len());
        let gap = after[word_end..]
            .find(is_word_char)
            .unwrap_or(after.len() - word_end);
        self.cursor.place(col + word_end + gap);
    }

    /// Move to `(line, col)`, clamped to the buffer and to a char boundary.
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        self.cursor.place(clamp_col(&text, col));
    }

    pub const fn move_to_start(&mut self) {
        self.cursor = Cursor::origin();
    }

    pub fn move_to_end(&mut self) {
        let last = self.line_count().saturating_sub(1);
        self.cursor.line = last;
        self.cursor.place(self.line_len(last));
    }

    const fn touch(&mut self) {
        self.revision += 1;
    }

    fn cursor_char_idx(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.line);
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        line_start + text[..clamp_col(&text, self.cursor.col)].chars().count()
    }

    /// Put the cursor on the char index `idx` of the rope.
    fn place_at_char(&mut self, idx: usize) {
        let idx = idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(idx);
        let col = self.rope.char_to_byte(idx) - self.rope.line_to_byte(line);
        // A CR just inserted before an existing LF joins its terminator.
        let text = self.line_at(line).unwrap_or_default();
        self.cursor.line = line;
        self.cursor.place(clamp_col(&text, col));
    }

    /// Chars taken by the terminator of `line_idx` (`\n` or `\r\n`).
    fn terminator_len(&self, line_idx: usize) -> usize {
        let line = self.rope.line(line_idx);
        let len = line.len_chars();
        match (len.checked_sub(2).map(|i| line.char(i)), len.checked_sub(1).map(|i| line.char(i))) {
            (Some('\r'), Some('\n')) => 2,
            (_, Some('\n')) => 1,
            _ => 0,
        }
    }

    fn prev_char_len(&self) -> usize {
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        text[..clamp_col(&text, self.cursor.col)]
            .chars()
            .next_back()
            .map_or(1, char::len_utf8)
    }

    fn step_left(&mut self) {
        if self.cursor.col > 0 {
            let width = self.prev_char_len();
            self.cursor.place(self.cursor.col - width);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.place(self.line_len(self.cursor.line));
        }
    }

    fn step_right(&mut self) {
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        let col = clamp_col(&text, self.cursor.col);
        if col < text.len() {
            let width = text[col..].chars().next().map_or(1, char::len_utf8);
            self.cursor.place(col + width);
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.place(0);
        }
    }

    fn step_vertical(&mut self, delta: isize) {
        let Some(target) = self.cursor.line.checked_add_signed(delta) else {
            return;
        };
        if target >= self.line_count() {
            return;
        }
        self.cursor.line = target;
        let text = self.line_at(target).unwrap_or_default();
        self.cursor.col = clamp_col(&text, self.cursor.sticky_col);
    }
}

/// `col` limited to `text` and moved back onto a char boundary.
fn clamp_col(text: &str, col: usize) -> usize {
    let mut col = col.min(text.len());
    while !text.is_char_boundary(col) {
        col -= 1;
    }
    col
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("lines", &self.rope.len_lines())
            .field("cursor", &self.cursor)
            .field("revision", &self.revision)
            .finish()
    }
}
