use std::collections::BTreeMap;
use std::path::Path;

use crate::content::IndentUtil;
use crate::error::EvalError;
use crate::host::Host;

/// Interprets `` `!p ...` `` blocks.
///
/// No interpreter ships with the engine; integrations install one through
/// [`crate::eval::Evaluators::with_script`].
pub trait ScriptEngine {
    /// Evaluates `request.code`. The returned text is used unless the script
    /// assigned [`SnippetUtil::set_rv`], in which case that value wins.
    fn evaluate(&mut self, request: &mut ScriptRequest<'_>) -> Result<String, EvalError>;
}

impl<F> ScriptEngine for F
where
    F: FnMut(&mut ScriptRequest<'_>) -> Result<String, EvalError>,
{
    fn evaluate(&mut self, request: &mut ScriptRequest<'_>) -> Result<String, EvalError> {
        self(request)
    }
}

/// Everything a script can see while it is evaluated.
pub struct ScriptRequest<'a> {
    pub code: &'a str,
    /// `global !p` lines of the snippet file.
    pub globals: &'a [String],
    /// Current text of every live tabstop.
    pub tabstops: &'a BTreeMap<u32, String>,
    /// Bindings shared by every script of the instance.
    pub bindings: &'a mut BTreeMap<String, String>,
    /// Groups of the trigger match, group 0 first.
    pub last_match: &'a [Option<String>],
    pub path: &'a str,
    pub snip: &'a mut SnippetUtil,
    pub host: &'a dyn Host,
}

impl ScriptRequest<'_> {
    /// Text of tabstop `number`, empty when there is no such live tabstop.
    pub fn tabstop(&self, number: u32) -> &str {
        self.tabstops.get(&number).map_or("", String::as_str)
    }

    /// A host option, or `default` when it is not set.
    pub fn opt(&self, name: &str, default: &str) -> String {
        self.host.option_or(name, default)
    }
}

/// Indentation-aware line builder handed to scripts as `snip`.
#[derive(Debug, Clone)]
pub struct SnippetUtil {
    ind: IndentUtil,
    initial_indent: String,
    /// Current indentation, in spaces.
    pub indent: String,
    c: String,
    rv: String,
    changed: bool,
    filename: String,
    filetype: String,
}

impl SnippetUtil {
    pub fn new(initial_indent: &str, ind: IndentUtil) -> Self {
        let initial_indent = ind.indent_to_spaces(initial_indent);
        Self {
            ind,
            indent: initial_indent.clone(),
            initial_indent,
            c: String::new(),
            rv: String::new(),
            changed: false,
            filename: String::new(),
            filetype: String::new(),
        }
    }

    /// Prepares for another evaluation with `current` as the node's text.
    pub fn reset(&mut self, current: &str, path: &str, filetype: &str) {
        self.c = current.to_string();
        self.rv.clear();
        self.changed = false;
        self.filename = path.to_string();
        self.filetype = filetype.to_string();
        self.reset_indent();
    }

    pub fn shift(&mut self, amount: usize) {
        self.indent.push_str(&" ".repeat(self.ind.shiftwidth * amount));
    }

    pub fn unshift(&mut self, amount: usize) {
        let keep = self.indent.len().saturating_sub(self.ind.shiftwidth * amount);
        self.indent.truncate(keep);
    }

    /// `line` with indentation in front.
    ///
    /// Without an explicit `indent` the current level is used. While the
    /// return value is still on its first line, the part of the indent the
    /// buffer line already has is left out.
    pub fn mkline(&self, line: &str, indent: Option<&str>) -> String {
        let indent = match indent {
            Some(explicit) => explicit.to_string(),
            None => {
                let mut current = self.indent.as_str();
                if !self.rv.contains('\n') {
                    current = current.get(self.initial_indent.len()..).unwrap_or("");
                }
                self.ind.spaces_to_indent(current)
            }
        };
        indent + line
    }

    pub fn reset_indent(&mut self) {
        self.indent = self.initial_indent.clone();
    }

    /// Appends `line` to the return value on a new line.
    pub fn push_line(&mut self, line: &str) {
        self.rv.push('\n');
        let line = self.mkline(line, None);
        self.rv.push_str(&line);
        self.changed = true;
    }

    pub fn rv(&self) -> &str {
        &self.rv
    }

    pub fn set_rv(&mut self, value: impl Into<String>) {
        self.rv = value.into();
        self.changed = true;
    }

    pub fn rv_changed(&self) -> bool {
        self.changed
    }

    /// Current text of the node being evaluated.
    pub fn c(&self) -> &str {
        &self.c
    }

    /// File name of the buffer, without directories.
    pub fn filename(&self) -> &str {
        Path::new(&self.filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// File name without its extension.
    pub fn basename(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    pub fn filetype(&self) -> &str {
        &self.filetype
    }
}
