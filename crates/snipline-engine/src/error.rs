use std::time::Duration;

use thiserror::Error;

use crate::commands::EditCommand;
use crate::geometry::{Position, Span};

/// Which evaluator produced an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// `` `code` ``, run once through the shell.
    Shell,
    /// `` `!v expr` ``, evaluated by the host editor.
    HostExpr,
    /// `` `!p code` ``, evaluated by the installed script engine.
    Script,
}

impl std::fmt::Display for CodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CodeKind::Shell => "shell",
            CodeKind::HostExpr => "host expression",
            CodeKind::Script => "script",
        })
    }
}

#[derive(Error, Debug)]
pub enum SnippetError {
    #[error("transformation refers to tabstop {number}, which is not declared")]
    UnknownTabStop { number: u32 },

    #[error("invalid transformation pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("edit at {at} lies outside the snippet at {span}")]
    EditOutsideSnippet { at: Position, span: Span },

    #[error("cannot delete from empty node at {at}")]
    EmptyNodeEdit { at: Position },

    #[error("malformed edit command {0:?}")]
    MalformedCommand(EditCommand),

    #[error("a cursor marker is already present")]
    CursorMarkerExists,

    #[error("{kind} evaluation failed")]
    Evaluation {
        kind: CodeKind,
        #[source]
        source: EvalError,
    },
}

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },

    #[error("no evaluator installed")]
    Unsupported,

    #[error("{0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, SnippetError>;
