use super::cursor::Cursor;
use super::token::{Token, TokenKind};
use crate::geometry::{Position, Span};

type Rule = fn(&mut Cursor<'_>, &str) -> Option<TokenKind>;

/// Tried in order at every position; the first rule that matches wins.
const RULES: [Rule; 8] = [
    escaped_char,
    visual,
    transformation,
    tabstop,
    mirror,
    script,
    host_expr,
    shell,
];

/// Lazily splits template text into tokens.
///
/// Spans are buffer positions, counted from the `offset` the text starts
/// at. `indent` is the indentation of the line the snippet is expanded on;
/// script code has it stripped from its continuation lines.
pub struct Lexer<'a> {
    cur: Cursor<'a>,
    indent: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str, offset: Position, indent: &'a str) -> Self {
        Self {
            cur: Cursor::new(text, offset),
            indent,
        }
    }

    fn special(&mut self) -> Option<TokenKind> {
        RULES.iter().find_map(|rule| {
            let mut probe = self.cur.clone();
            let kind = rule(&mut probe, self.indent)?;
            self.cur = probe;
            Some(kind)
        })
    }

    fn matches_here(&self) -> bool {
        RULES
            .iter()
            .any(|rule| rule(&mut self.cur.clone(), self.indent).is_some())
    }

    fn text(&mut self) -> TokenKind {
        let mut text = String::new();
        // The first char is text no matter what: no rule matched here.
        if let Some(c) = self.cur.bump() {
            text.push(c);
        }
        while !self.cur.eof() && !self.matches_here() {
            if let Some(c) = self.cur.bump() {
                text.push(c);
            }
        }
        TokenKind::Text(text)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.cur.eof() {
            return None;
        }
        let start = self.cur.pos();
        let kind = match self.special() {
            Some(kind) => kind,
            None => self.text(),
        };
        Some(Token {
            kind,
            span: Span::new(start, self.cur.pos()),
        })
    }
}

/// Convenience wrapper collecting every token of `text`.
pub fn tokenize(text: &str, offset: Position, indent: &str) -> Vec<Token> {
    Lexer::new(text, offset, indent).collect()
}

fn escaped_char(cur: &mut Cursor<'_>, _indent: &str) -> Option<TokenKind> {
    if cur.peek() != Some('\\') {
        return None;
    }
    let c = cur.peek2().filter(|c| "{}\\$`".contains(*c))?;
    cur.bump_n(2);
    Some(TokenKind::EscapedChar(c))
}

fn visual(cur: &mut Cursor<'_>, _indent: &str) -> Option<TokenKind> {
    if !cur.starts_with("${VISUAL}") {
        return None;
    }
    let leading_whitespace = cur.line_indent().to_string();
    cur.bump_n("${VISUAL}".len());
    Some(TokenKind::Visual { leading_whitespace })
}

fn transformation(cur: &mut Cursor<'_>, _indent: &str) -> Option<TokenKind> {
    if !cur.starts_with("${") {
        return None;
    }
    cur.bump_n(2);
    let number = cur.number()?;
    if cur.bump()? != '/' {
        return None;
    }
    let search = till_unescaped(cur, '/')?.replace("\\/", "/");
    let replace = till_unescaped(cur, '/')?;
    let options = till_closing_brace(cur)?;
    Some(TokenKind::Transformation {
        number,
        search,
        replace,
        options,
    })
}

fn tabstop(cur: &mut Cursor<'_>, _indent: &str) -> Option<TokenKind> {
    if !cur.starts_with("${") {
        return None;
    }
    cur.bump_n(2);
    let number = cur.number()?;
    let initial = match cur.bump()? {
        '}' => String::new(),
        ':' => till_closing_brace(cur)?,
        _ => return None,
    };
    Some(TokenKind::TabStop { number, initial })
}

fn mirror(cur: &mut Cursor<'_>, _indent: &str) -> Option<TokenKind> {
    if cur.bump()? != '$' {
        return None;
    }
    let number = cur.number()?;
    Some(TokenKind::Mirror { number })
}

fn script(cur: &mut Cursor<'_>, indent: &str) -> Option<TokenKind> {
    let code = tagged_code(cur, "`!p")?;
    let code = if indent.is_empty() {
        code
    } else {
        code.split('\n')
            .enumerate()
            .map(|(idx, line)| match idx {
                0 => line,
                _ => line.strip_prefix(indent).unwrap_or(line),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    Some(TokenKind::Script {
        code,
        indent: indent.to_string(),
    })
}

fn host_expr(cur: &mut Cursor<'_>, _indent: &str) -> Option<TokenKind> {
    let code = tagged_code(cur, "`!v")?;
    Some(TokenKind::HostExpr { code })
}

fn shell(cur: &mut Cursor<'_>, _indent: &str) -> Option<TokenKind> {
    if cur.bump()? != '`' {
        return None;
    }
    let code = till_unescaped(cur, '`')?;
    Some(TokenKind::Shell { code })
}

/// `` `!p code` `` and friends: the tag must be followed by whitespace, one
/// space or tab of which is skipped.
fn tagged_code(cur: &mut Cursor<'_>, tag: &str) -> Option<String> {
    if !cur.starts_with(tag) {
        return None;
    }
    cur.bump_n(tag.len());
    match cur.peek()? {
        ' ' | '\t' => {
            cur.bump();
        }
        '\n' | '\r' => {}
        _ => return None,
    }
    till_unescaped(cur, '`')
}

/// Reads up to the next `end` that is not escaped with a backslash. Escapes
/// are kept in the returned text.
fn till_unescaped(cur: &mut Cursor<'_>, end: char) -> Option<String> {
    let mut out = String::new();
    loop {
        if cur.peek() == Some('\\') && cur.peek2() == Some(end) {
            out.push('\\');
            out.push(end);
            cur.bump_n(2);
            continue;
        }
        let c = cur.bump()?;
        if c == end {
            return Some(out);
        }
        out.push(c);
    }
}

/// Reads up to the brace closing one already consumed `{`, keeping nested
/// braces and escapes in the returned text.
fn till_closing_brace(cur: &mut Cursor<'_>) -> Option<String> {
    let mut out = String::new();
    let mut depth = 1usize;
    loop {
        if cur.peek() == Some('\\') && matches!(cur.peek2(), Some('{' | '}')) {
            out.push('\\');
            if let Some(c) = cur.peek2() {
                out.push(c);
            }
            cur.bump_n(2);
            continue;
        }
        let c = cur.bump()?;
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(out);
                }
            }
            _ => {}
        }
        out.push(c);
    }
}
