//! The editor the engine runs inside.
//!
//! The engine never owns the buffer. Everything it reads or writes goes
//! through [`Host`], so an integration only has to implement this trait.
//! [`MemoryHost`] is a self-contained implementation used by the CLI and
//! the tests.

mod memory;

pub use memory::MemoryHost;

use crate::error::EvalError;
use crate::geometry::{Position, Span};

pub trait Host {
    /// Text covered by `span`, lines joined with `\n`.
    fn read(&self, span: Span) -> String;

    /// Replaces the text covered by `span` with `text`.
    fn write(&mut self, span: Span, text: &str);

    /// Line `line` without its trailing newline, if the buffer has it.
    fn line(&self, line: usize) -> Option<String>;

    fn cursor(&self) -> Position;

    fn set_cursor(&mut self, at: Position);

    /// Evaluates a host-side expression (`` `!v ...` ``).
    fn eval(&mut self, expr: &str) -> Result<String, EvalError>;

    /// Raw value of a named editor option.
    fn option(&self, name: &str) -> Option<String>;

    /// Path of the buffer being edited, empty if it has none.
    fn path(&self) -> String;

    /// Filetype of the buffer, empty if unknown.
    fn filetype(&self) -> String;

    fn option_or(&self, name: &str, default: &str) -> String {
        self.option(name).unwrap_or_else(|| default.to_string())
    }

    /// An option parsed as a number; unparseable values fall back to
    /// `default`.
    fn numeric_option(&self, name: &str, default: usize) -> usize {
        self.option(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// An option read as a flag: `1`, `true`, `yes` and `on` are true.
    fn flag_option(&self, name: &str, default: bool) -> bool {
        match self.option(name) {
            Some(v) => matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            None => default,
        }
    }
}
