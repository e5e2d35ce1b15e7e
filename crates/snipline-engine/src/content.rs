//! Turning node text into buffer text.
//!
//! Node content is plain text that may span several lines. Placing it in
//! the buffer needs two things: knowing where it ends when written at a
//! given start, and fixing up indentation of continuation lines so that
//! nested or multi-line content lines up with the line it was expanded on.

use crate::geometry::{Position, Span, text_extent};
use crate::host::Host;

/// End position of `text` when written starting at `start`.
pub fn end_from(start: Position, text: &str) -> Position {
    start.translated(text_extent(text))
}

/// Writes `text` over `span` in the host buffer and returns where the text
/// now ends.
pub fn materialize(host: &mut dyn Host, span: Span, text: &str) -> Position {
    host.write(span, text);
    end_from(span.start, text)
}

/// Leading spaces and tabs of `line`.
pub fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Indentation settings as the editor reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentUtil {
    pub shiftwidth: usize,
    pub tabstop: usize,
    pub expandtab: bool,
}

impl Default for IndentUtil {
    fn default() -> Self {
        Self {
            shiftwidth: 4,
            tabstop: 8,
            expandtab: true,
        }
    }
}

impl IndentUtil {
    pub fn new(shiftwidth: usize, tabstop: usize, expandtab: bool) -> Self {
        let tabstop = tabstop.max(1);
        // shiftwidth 0 follows tabstop
        let shiftwidth = if shiftwidth == 0 { tabstop } else { shiftwidth };
        Self {
            shiftwidth,
            tabstop,
            expandtab,
        }
    }

    /// Reads `shiftwidth`, `tabstop` and `expandtab` from the host.
    pub fn from_host(host: &dyn Host) -> Self {
        let defaults = Self::default();
        Self::new(
            host.numeric_option("shiftwidth", defaults.shiftwidth),
            host.numeric_option("tabstop", defaults.tabstop),
            host.flag_option("expandtab", defaults.expandtab),
        )
    }

    /// Expands tabs in an indent string to spaces, honouring tab stops.
    pub fn indent_to_spaces(&self, indent: &str) -> String {
        let mut width = 0usize;
        for c in indent.chars() {
            if c == '\t' {
                width += self.tabstop - width % self.tabstop;
            } else {
                width += 1;
            }
        }
        " ".repeat(width)
    }

    /// Collapses runs of `tabstop` spaces into tabs unless `expandtab` is set.
    pub fn spaces_to_indent(&self, indent: &str) -> String {
        if self.expandtab {
            indent.to_string()
        } else {
            indent.replace(&" ".repeat(self.tabstop), "\t")
        }
    }

    /// The indent `ntabs` levels deep, in the buffer's indentation style.
    pub fn ntabs_to_proper_indent(&self, ntabs: usize) -> String {
        let spaces = " ".repeat(ntabs * self.shiftwidth);
        self.spaces_to_indent(&self.indent_to_spaces(&spaces))
    }
}

/// Prepares a template for the line it is expanded on.
///
/// The first line is left alone because it continues the buffer line.
/// Every other line gets its leading template tabs turned into the proper
/// indent and is prefixed with `line_indent`.
pub fn indent_template(template: &str, line_indent: &str, indent: &IndentUtil) -> String {
    let mut out = String::with_capacity(template.len());
    for (idx, line) in template.split('\n').enumerate() {
        if idx == 0 {
            out.push_str(line);
            continue;
        }
        out.push('\n');
        let tabs = line.chars().take_while(|&c| c == '\t').count();
        out.push_str(line_indent);
        out.push_str(&indent.ntabs_to_proper_indent(tabs));
        out.push_str(&line[tabs..]);
    }
    out
}

/// Prefixes every continuation line of `text` with `indent`.
pub fn reindent(text: &str, indent: &str) -> String {
    if indent.is_empty() || !text.contains('\n') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}
