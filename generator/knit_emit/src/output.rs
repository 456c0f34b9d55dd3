//! Indentation-tracked source builder.
//!
//! The renderers build Java source line by line. Indentation is applied
//! lazily: a pending level is flushed the first time non-empty text lands
//! on a fresh line, so blank lines never carry trailing spaces.

/// Source output buffer (4 spaces per indent level).
#[derive(Default)]
pub struct Output {
    buffer: String,
    level: usize,
    at_line_start: bool,
}

impl Output {
    pub fn new() -> Self {
        Output {
            buffer: String::new(),
            level: 0,
            at_line_start: true,
        }
    }

    /// Append a text fragment to the current line.
    pub fn push(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            if self.at_line_start {
                for _ in 0..self.level * 4 {
                    self.buffer.push(' ');
                }
                self.at_line_start = false;
            }
            self.buffer.push_str(text);
        }
        self
    }

    /// Terminate the current line.
    pub fn newline(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self.at_line_start = true;
        self
    }

    /// Append a full line.
    pub fn line(&mut self, text: &str) -> &mut Self {
        self.push(text).newline()
    }

    /// A blank separator line.
    pub fn blank(&mut self) -> &mut Self {
        self.newline()
    }

    pub fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Finish, guaranteeing a single trailing newline.
    pub fn finish(mut self) -> String {
        if !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.buffer
    }
}
