//! Primitive edit commands.
//!
//! Every buffer change the engine deals with is expressed as an ordered list
//! of [`EditCommand`]s. Each command's coordinates assume that all commands
//! before it have already been applied, so a script must be replayed
//! strictly in order.

use serde::{Deserialize, Serialize};

use crate::geometry::{Position, text_extent};

/// One primitive insert or delete.
///
/// Raw commands carry one char or exactly `"\n"`. Compacted commands (see
/// [`compactify`]) may carry a longer run of chars on a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EditCommand {
    /// Insert `text` at `at`.
    Insert { at: Position, text: String },
    /// Delete `text`, which currently starts at `at`.
    Delete { at: Position, text: String },
}

impl EditCommand {
    pub fn insert(line: usize, col: usize, text: impl Into<String>) -> Self {
        EditCommand::Insert {
            at: Position::new(line, col),
            text: text.into(),
        }
    }

    pub fn delete(line: usize, col: usize, text: impl Into<String>) -> Self {
        EditCommand::Delete {
            at: Position::new(line, col),
            text: text.into(),
        }
    }

    pub fn at(&self) -> Position {
        match self {
            EditCommand::Insert { at, .. } | EditCommand::Delete { at, .. } => *at,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            EditCommand::Insert { text, .. } | EditCommand::Delete { text, .. } => text,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, EditCommand::Insert { .. })
    }

    /// Non-empty, and either free of newlines or exactly one newline.
    pub fn is_well_formed(&self) -> bool {
        let text = self.text();
        !text.is_empty() && (text == "\n" || !text.contains('\n'))
    }

    /// The position right after the affected text: for an insert, where the
    /// inserted text ends; for a delete, where the deleted text currently
    /// ends.
    pub fn end(&self) -> Position {
        self.at().translated(text_extent(self.text()))
    }

    /// Same command kind at the same position with different text.
    pub(crate) fn with_text(&self, text: String) -> Self {
        match self {
            EditCommand::Insert { at, .. } => EditCommand::Insert { at: *at, text },
            EditCommand::Delete { at, .. } => EditCommand::Delete { at: *at, text },
        }
    }
}

/// Merges runs of single-char commands into multi-char ones.
///
/// Consecutive deletes at the same position and inserts whose columns
/// follow on from each other on the same line are merged. Newlines are
/// never merged. Replaying the result gives the same text as replaying the
/// input.
pub fn compactify(commands: &[EditCommand]) -> Vec<EditCommand> {
    let mut out: Vec<EditCommand> = Vec::with_capacity(commands.len());
    for cmd in commands {
        let merged = match (out.last_mut(), cmd) {
            (
                Some(EditCommand::Delete { at: prev, text: acc }),
                EditCommand::Delete { at, text },
            ) if *prev == *at && acc.as_str() != "\n" && text.as_str() != "\n" => {
                acc.push_str(text);
                true
            }
            (
                Some(EditCommand::Insert { at: prev, text: acc }),
                EditCommand::Insert { at, text },
            ) if prev.line == at.line
                && prev.col + acc.chars().count() == at.col
                && acc.as_str() != "\n"
                && text.as_str() != "\n" =>
            {
                acc.push_str(text);
                true
            }
            _ => false,
        };
        if !merged {
            out.push(cmd.clone());
        }
    }
    out
}

/// Replays `commands` against `text` and returns the result.
///
/// This is the reference meaning of a script; positions outside the text
/// are clamped to its end.
pub fn apply_script(text: &str, commands: &[EditCommand]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for cmd in commands {
        let offset = char_offset(&chars, cmd.at());
        match cmd {
            EditCommand::Insert { text, .. } => {
                chars.splice(offset..offset, text.chars());
            }
            EditCommand::Delete { text, .. } => {
                let end = (offset + text.chars().count()).min(chars.len());
                chars.drain(offset..end);
            }
        }
    }
    chars.into_iter().collect()
}

fn char_offset(chars: &[char], at: Position) -> usize {
    let mut line = 0;
    let mut line_start = 0;
    for (idx, c) in chars.iter().enumerate() {
        if line == at.line {
            break;
        }
        if *c == '\n' {
            line += 1;
            line_start = idx + 1;
        }
    }
    if line < at.line {
        return chars.len();
    }
    (line_start + at.col).min(chars.len())
}
