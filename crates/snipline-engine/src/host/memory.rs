use std::collections::HashMap;

use xi_rope::Rope;

use super::Host;
use crate::error::EvalError;
use crate::geometry::{Position, Span};

/// An in-memory editor buffer backed by an `xi_rope::Rope`.
///
/// Positions are translated to byte offsets on every access by walking the
/// raw lines of the rope. Host expressions are answered from a lookup table
/// filled with [`MemoryHost::define_expr`].
#[derive(Clone)]
pub struct MemoryHost {
    buffer: Rope,
    cursor: Position,
    options: HashMap<String, String>,
    expressions: HashMap<String, String>,
    path: String,
    filetype: String,
}

impl MemoryHost {
    pub fn new(text: &str) -> Self {
        Self {
            buffer: Rope::from(text),
            cursor: Position::default(),
            options: HashMap::new(),
            expressions: HashMap::new(),
            path: String::new(),
            filetype: String::new(),
        }
    }

    /// The whole buffer as a string.
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Replaces the whole buffer, keeping the cursor where it was.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = Rope::from(text);
    }

    pub fn line_count(&self) -> usize {
        self.text().matches('\n').count() + 1
    }

    pub fn set_option(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.options.insert(name.into(), value.into());
    }

    pub fn define_expr(&mut self, expr: impl Into<String>, value: impl Into<String>) {
        self.expressions.insert(expr.into(), value.into());
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn set_filetype(&mut self, filetype: impl Into<String>) {
        self.filetype = filetype.into();
    }

    /// Byte offset of `at`, clamped to the end of its line and of the buffer.
    fn offset_of(&self, at: Position) -> usize {
        let mut offset = 0usize;
        for (idx, line) in self.buffer.lines_raw(..).enumerate() {
            if idx == at.line {
                let content = line.strip_suffix('\n').unwrap_or(&line[..]);
                let col = content
                    .char_indices()
                    .nth(at.col)
                    .map_or(content.len(), |(i, _)| i);
                return offset + col;
            }
            offset += line.len();
        }
        self.buffer.len()
    }
}

impl Host for MemoryHost {
    fn read(&self, span: Span) -> String {
        let start = self.offset_of(span.start);
        let end = self.offset_of(span.end).max(start);
        self.buffer.slice_to_cow(start..end).into_owned()
    }

    fn write(&mut self, span: Span, text: &str) {
        let start = self.offset_of(span.start);
        let end = self.offset_of(span.end).max(start);
        self.buffer.edit(start..end, text);
    }

    fn line(&self, line: usize) -> Option<String> {
        let text = self.text();
        text.split('\n').nth(line).map(str::to_string)
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, at: Position) {
        self.cursor = at;
    }

    fn eval(&mut self, expr: &str) -> Result<String, EvalError> {
        self.expressions
            .get(expr.trim())
            .cloned()
            .ok_or_else(|| EvalError::Failed(format!("unknown expression {expr:?}")))
    }

    fn option(&self, name: &str) -> Option<String> {
        self.options.get(name).cloned()
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn filetype(&self) -> String {
        self.filetype.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span(a: (usize, usize), b: (usize, usize)) -> Span {
        Span::new(a.into(), b.into())
    }

    #[test]
    fn reads_across_lines() {
        let host = MemoryHost::new("first\nsecond\nthird");
        assert_eq!(host.read(span((0, 2), (0, 5))), "rst");
        assert_eq!(host.read(span((0, 3), (2, 2))), "st\nsecond\nth");
        assert_eq!(host.read(span((2, 0), (2, 99))), "third");
    }

    #[test]
    fn writes_replace_the_span() {
        let mut host = MemoryHost::new("let x = 1;\nlet y = 2;");
        host.write(span((0, 4), (0, 5)), "value");
        assert_eq!(host.text(), "let value = 1;\nlet y = 2;");

        host.write(span((0, 14), (1, 0)), " ");
        assert_eq!(host.text(), "let value = 1; let y = 2;");
    }

    #[test]
    fn columns_count_chars() {
        let mut host = MemoryHost::new("äöü\nx");
        assert_eq!(host.read(span((0, 1), (0, 2))), "ö");
        host.write(span((0, 3), (0, 3)), "!");
        assert_eq!(host.text(), "äöü!\nx");
    }

    #[test]
    fn position_after_trailing_newline() {
        let mut host = MemoryHost::new("ab\n");
        host.write(span((1, 0), (1, 0)), "cd");
        assert_eq!(host.text(), "ab\ncd");
        assert_eq!(host.line(1).as_deref(), Some("cd"));
        assert_eq!(host.line(2), None);
    }

    #[test]
    fn options_and_expressions() {
        let mut host = MemoryHost::new("");
        host.set_option("shiftwidth", "2");
        host.set_option("expandtab", "0");
        host.define_expr("g:name", "snip");

        assert_eq!(host.numeric_option("shiftwidth", 4), 2);
        assert_eq!(host.numeric_option("tabstop", 8), 8);
        assert!(!host.flag_option("expandtab", true));
        assert_eq!(host.option_or("missing", "dflt"), "dflt");
        assert_eq!(host.eval(" g:name ").unwrap(), "snip");
        assert!(matches!(host.eval("g:other"), Err(EvalError::Failed(_))));
    }
}
