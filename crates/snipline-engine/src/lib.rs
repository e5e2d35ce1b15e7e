pub mod commands;
pub mod content;
pub mod edit_distance;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod host;
pub mod instance;
pub mod parsing;
pub mod transform;
pub mod tree;

#[cfg(test)]
mod tests;

// Re-export key types for easier usage
pub use commands::{EditCommand, apply_script, compactify};
pub use edit_distance::{edit_script, edit_script_from};
pub use error::{CodeKind, EvalError, Result, SnippetError};
pub use eval::{Evaluators, ScriptEngine, ScriptRequest, ShellRunner, SnippetUtil, SystemShell};
pub use geometry::{Position, Span};
pub use host::{Host, MemoryHost};
pub use instance::{ExpansionContext, SnippetInstance};
pub use tree::{NodeId, NodeKind, TextObject, Tree};
