use ratatui::layout::Rect;
use std::cmp;

/// Text buffer and cursor state for one form field.
///
/// Columns are counted in chars, not bytes. Single-line fields simply never
/// receive a newline.
#[derive(Debug, Clone)]
pub struct Editor {
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
    pub scroll_offset: usize,
    history: Vec<(Vec<String>, usize, usize)>,
}

const MAX_HISTORY: usize = 100;

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            history: Vec::new(),
        }
    }

    /// Editor holding `content` with the cursor at the end
    pub fn from_string(content: &str) -> Self {
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        let cursor_line = lines.len() - 1;
        let cursor_col = lines[cursor_line].chars().count();
        Self {
            lines,
            cursor_line,
            cursor_col,
            scroll_offset: 0,
            history: Vec::new(),
        }
    }

    pub fn to_string(&self) -> String {
        self.lines.join("\n")
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines.get(line).map_or(0, |l| l.chars().count())
    }

    fn byte_index(line: &str, col: usize) -> usize {
        line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
    }

    fn snapshot(&mut self) {
        if self.history.len() == MAX_HISTORY {
            self.history.remove(0);
        }
        self.history
            .push((self.lines.clone(), self.cursor_line, self.cursor_col));
    }

    fn clamp_cursor(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.cursor_line = cmp::min(self.cursor_line, self.lines.len() - 1);
        self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.insert_newline();
            return;
        }
        self.snapshot();
        self.clamp_cursor();
        let line = &mut self.lines[self.cursor_line];
        let at = Self::byte_index(line, self.cursor_col);
        line.insert(at, ch);
        self.cursor_col += 1;
    }

    pub fn insert_newline(&mut self) {
        self.snapshot();
        self.clamp_cursor();
        let line = &mut self.lines[self.cursor_line];
        let at = Self::byte_index(line, self.cursor_col);
        let rest = line.split_off(at);
        self.lines.insert(self.cursor_line + 1, rest);
        self.cursor_line += 1;
        self.cursor_col = 0;
    }

    /// Backspace: remove the char before the cursor, joining lines at column 0
    pub fn delete_char(&mut self) {
        self.clamp_cursor();
        if self.cursor_col > 0 {
            self.snapshot();
            let line = &mut self.lines[self.cursor_line];
            let at = Self::byte_index(line, self.cursor_col - 1);
            line.remove(at);
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.snapshot();
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
            self.lines[self.cursor_line].push_str(&current);
        }
    }

    /// Delete: remove the char under the cursor, pulling the next line up at line end
    pub fn delete_forward(&mut self) {
        self.clamp_cursor();
        if self.cursor_col < self.line_len(self.cursor_line) {
            self.snapshot();
            let line = &mut self.lines[self.cursor_line];
            let at = Self::byte_index(line, self.cursor_col);
            line.remove(at);
        } else if self.cursor_line + 1 < self.lines.len() {
            self.snapshot();
            let next = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&next);
        }
    }

    /// Restore the buffer as it was before the last edit
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some((lines, line, col)) => {
                self.lines = lines;
                self.cursor_line = line;
                self.cursor_col = col;
                true
            }
            None => false,
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.line_len(self.cursor_line) {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.line_len(self.cursor_line);
    }

    /// Jump to the start of the previous word on the current line
    pub fn move_cursor_word_left(&mut self) {
        let chars: Vec<char> = self.lines[self.cursor_line].chars().collect();
        let mut col = cmp::min(self.cursor_col, chars.len());
        while col > 0 && chars[col - 1].is_whitespace() {
            col -= 1;
        }
        while col > 0 && !chars[col - 1].is_whitespace() {
            col -= 1;
        }
        self.cursor_col = col;
    }

    /// Jump past the end of the next word on the current line
    pub fn move_cursor_word_right(&mut self) {
        let chars: Vec<char> = self.lines[self.cursor_line].chars().collect();
        let mut col = cmp::min(self.cursor_col, chars.len());
        while col < chars.len() && chars[col].is_whitespace() {
            col += 1;
        }
        while col < chars.len() && !chars[col].is_whitespace() {
            col += 1;
        }
        self.cursor_col = col;
    }

    /// Keep the cursor line inside a viewport of `viewport_height` lines
    pub fn update_scroll(&mut self, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        } else if self.cursor_line >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor_line + 1 - viewport_height;
        }
    }

    /// Lines currently scrolled into view
    pub fn visible_lines(&self, viewport_height: usize) -> &[String] {
        let start = cmp::min(self.scroll_offset, self.lines.len());
        let end = cmp::min(start + viewport_height, self.lines.len());
        &self.lines[start..end]
    }

    /// Terminal position of the cursor inside `inner` (the field area without
    /// borders), or None when the cursor is scrolled out of view
    pub fn cursor_screen_pos(&self, inner: Rect) -> Option<(u16, u16)> {
        let row = self.cursor_line.checked_sub(self.scroll_offset)?;
        if row >= inner.height as usize {
            return None;
        }
        let col = cmp::min(self.cursor_col, inner.width.saturating_sub(1) as usize);
        Some((inner.x + col as u16, inner.y + row as u16))
    }
}
