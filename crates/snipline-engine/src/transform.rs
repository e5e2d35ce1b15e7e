//! Regex transformations for `${N/search/replace/options}`.
//!
//! The replacement side is a small TextMate-style language. For every match
//! it is expanded in fixed passes:
//!
//! 1. `$N` becomes the text of capture group `N`
//! 2. `\uX` / `\lX` upper- or lower-case the single char `X`
//! 3. `\U...\E` / `\L...\E` upper- or lower-case the enclosed run
//! 4. `(?N:then:else)` picks a branch depending on group `N`
//! 5. `\n`, `\t`, `\r`, `\a`, `\b` become control chars
//! 6. any other `\X` becomes the literal `X`

use std::sync::OnceLock;

use regex::{Captures, Regex, RegexBuilder};

use crate::error::{Result, SnippetError};

fn dollar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\$(\d+)").expect("Invalid group reference regex"))
}

fn single_fold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\\([ul].)").expect("Invalid case folding regex"))
}

fn run_fold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\\([UL].*?)\\E").expect("Invalid case folding regex"))
}

fn conditional_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\?(\d+):").expect("Invalid conditional regex"))
}

fn control_escape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\[ntrab]").expect("Invalid escape regex"))
}

fn literal_escape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\[^ntrab]").expect("Invalid escape regex"))
}

/// A compiled `search` pattern plus its replacement template.
#[derive(Debug, Clone)]
pub struct Transformation {
    search: Regex,
    replace: String,
    global: bool,
}

impl Transformation {
    /// Compiles a transformation. `options` may contain `g` (replace every
    /// match) and `i` (case-insensitive); `.` always matches newlines.
    pub fn new(search: &str, replace: &str, options: &str) -> Result<Self> {
        let compiled = RegexBuilder::new(search)
            .dot_matches_new_line(true)
            .case_insensitive(options.contains('i'))
            .build()
            .map_err(|source| SnippetError::InvalidPattern {
                pattern: search.to_string(),
                source,
            })?;
        Ok(Self {
            search: compiled,
            replace: replace.to_string(),
            global: options.contains('g'),
        })
    }

    pub fn pattern(&self) -> &str {
        self.search.as_str()
    }

    /// Substitutes the first match of the search pattern in `text`, or every
    /// match with the `g` option.
    pub fn apply(&self, text: &str) -> String {
        let limit = if self.global { 0 } else { 1 };
        self.search
            .replacen(text, limit, |caps: &Captures<'_>| self.expand(caps))
            .into_owned()
    }

    fn expand(&self, caps: &Captures<'_>) -> String {
        let tv = dollar_re().replace_all(&self.replace, |m: &Captures<'_>| {
            group_text(caps, &m[1]).to_string()
        });
        let tv = single_fold_re().replace_all(&tv, |m: &Captures<'_>| {
            let folded = &m[1];
            let target: String = folded.chars().skip(1).collect();
            if folded.starts_with('u') {
                target.to_uppercase()
            } else {
                target.to_lowercase()
            }
        });
        let tv = run_fold_re().replace_all(&tv, |m: &Captures<'_>| {
            let folded = &m[1];
            if folded.starts_with('U') {
                folded[1..].to_uppercase()
            } else {
                folded[1..].to_lowercase()
            }
        });
        let tv = replace_conditionals(caps, &tv);
        unescape(&control_escapes(&tv))
    }
}

fn group_text<'t>(caps: &Captures<'t>, number: &str) -> &'t str {
    number
        .parse::<usize>()
        .ok()
        .and_then(|n| caps.get(n))
        .map_or("", |g| g.as_str())
}

fn replace_conditionals(caps: &Captures<'_>, text: &str) -> String {
    let mut v = text.to_string();
    let mut from = 0;
    while let Some(m) = conditional_re().find_at(&v, from) {
        let start = m.start();
        let body_start = m.end();
        let marker = m.as_str();
        let group = &marker[2..marker.len() - 1];

        let (body_end, end) = match closing_paren(&v, body_start) {
            Some(close) => (close, close + 1),
            None => (v.len(), v.len()),
        };
        let args = split_branches(&v[body_start..body_end]);

        let taken = group
            .parse::<usize>()
            .ok()
            .and_then(|n| caps.get(n))
            .is_some_and(|g| !g.as_str().is_empty());
        let branch = if taken { args.first() } else { args.get(1) };
        let rv = branch
            .map(|b| unescape(&replace_conditionals(caps, b)))
            .unwrap_or_default();

        v.replace_range(start..end, &rv);
        from = start + rv.len();
    }
    v
}

/// Byte index of the `)` closing a conditional whose body starts at `from`.
fn closing_paren(v: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut prev = v[..from].chars().next_back();
    for (idx, c) in v[from..].char_indices() {
        let escaped = prev == Some('\\');
        match c {
            '(' if !escaped => depth += 1,
            ')' if !escaped => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + idx);
                }
            }
            _ => {}
        }
        prev = Some(c);
    }
    None
}

/// Splits a conditional body at unescaped top-level colons.
fn split_branches(body: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut prev: Option<char> = None;
    for c in body.chars() {
        let escaped = prev == Some('\\');
        match c {
            '(' if !escaped => depth += 1,
            ')' if !escaped => depth = depth.saturating_sub(1),
            ':' if depth == 0 && !escaped => {
                args.push(std::mem::take(&mut current));
                prev = Some(c);
                continue;
            }
            _ => {}
        }
        current.push(c);
        prev = Some(c);
    }
    args.push(current);
    args
}

fn control_escapes(v: &str) -> String {
    control_escape_re()
        .replace_all(v, |m: &Captures<'_>| match &m[0][1..] {
            "n" => "\n",
            "t" => "\t",
            "r" => "\r",
            "a" => "\x07",
            _ => "\x08",
        })
        .into_owned()
}

fn unescape(v: &str) -> String {
    literal_escape_re()
        .replace_all(v, |m: &Captures<'_>| m[0].chars().skip(1).collect::<String>())
        .into_owned()
}
