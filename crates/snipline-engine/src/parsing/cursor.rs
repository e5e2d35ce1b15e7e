use crate::geometry::Position;

/// A cursor for char-by-char template lexing with position tracking.
///
/// Operates over a string slice while tracking the buffer position each
/// char will land on, starting from `base`.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The string being lexed.
    s: &'a str,
    /// Current byte index into `s`.
    i: usize,
    /// Buffer position of the char at `i`.
    pos: Position,
    /// Byte index where the current line starts.
    line_start: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of `s`, which sits at `base`.
    pub fn new(s: &'a str, base: Position) -> Self {
        Self {
            s,
            i: 0,
            pos: base,
            line_start: 0,
        }
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The char after the current one.
    pub fn peek2(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    pub fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    /// Advances by one char, returning it.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += c.len_utf8();
        if c == '\n' {
            self.pos = Position::new(self.pos.line + 1, 0);
            self.line_start = self.i;
        } else {
            self.pos.col += 1;
        }
        Some(c)
    }

    /// Advances by `n` chars, stopping early at the end of input.
    pub fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    /// Consumes a run of ASCII digits as a number.
    pub fn number(&mut self) -> Option<u32> {
        let digits = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        let n = self.rest()[..digits].parse().ok()?;
        self.bump_n(digits);
        Some(n)
    }

    /// Spaces and tabs at the start of the line the cursor is on.
    pub fn line_indent(&self) -> &'a str {
        let line = &self.s[self.line_start..];
        let trimmed = line.trim_start_matches([' ', '\t']);
        &line[..line.len() - trimmed.len()]
    }
}
