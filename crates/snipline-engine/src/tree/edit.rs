//! Replaying buffer edits against the tree.
//!
//! Each command is routed down to the deepest node that owns it. Children
//! the edit breaks are destroyed on the way, and the owner finally grows or
//! shrinks, moving everything after the edit point along with it.

use super::{NodeId, Tree};
use crate::commands::EditCommand;
use crate::content::end_from;
use crate::error::{Result, SnippetError};
use crate::geometry::{Position, Span};

/// How one command relates to one child.
enum Routing {
    /// Leave the child alone.
    Skip,
    /// The edit breaks the child.
    Destroy,
    /// The child owns the edit.
    Descend,
    /// The deletion crosses the child boundary `k` chars into its text.
    Split(usize),
}

impl Tree {
    /// Applies one edit command that already happened in the host buffer.
    pub(crate) fn apply_command(&mut self, cmd: &EditCommand) -> Result<()> {
        if !cmd.is_well_formed() {
            return Err(SnippetError::MalformedCommand(cmd.clone()));
        }
        let root = self.span(self.root);
        let inside = match cmd {
            EditCommand::Insert { at, .. } => root.touches(*at),
            EditCommand::Delete { at, .. } => root.encloses(Span::new(*at, cmd.end())),
        };
        if !inside {
            return Err(SnippetError::EditOutsideSnippet {
                at: cmd.at(),
                span: root,
            });
        }
        self.edit_node(self.root, cmd)
    }

    fn edit_node(&mut self, id: NodeId, cmd: &EditCommand) -> Result<()> {
        tracing::trace!(node = %id, ?cmd, "routing edit");
        let mut doomed = Vec::new();
        for child in self.nodes[id.0].children.clone() {
            match self.route(child, cmd) {
                Routing::Skip => {}
                Routing::Destroy => doomed.push(child),
                Routing::Descend => {
                    self.kill_all(&doomed);
                    return self.edit_node(child, cmd);
                }
                Routing::Split(k) => {
                    self.kill_all(&doomed);
                    let head: String = cmd.text().chars().take(k).collect();
                    let tail: String = cmd.text().chars().skip(k).collect();
                    self.edit_node(id, &cmd.with_text(head))?;
                    return self.edit_node(id, &cmd.with_text(tail));
                }
            }
        }
        self.kill_all(&doomed);
        self.edit_own(id, cmd)
    }

    fn route(&self, child: NodeId, cmd: &EditCommand) -> Routing {
        let node = &self.nodes[child.0];
        let span = node.span;
        let at = cmd.at();
        match cmd {
            EditCommand::Delete { text, .. } => {
                let end = cmd.end();
                if at < span.start && end >= span.end {
                    Routing::Destroy
                } else if span.encloses(Span::new(at, end)) {
                    if node.kind.is_tabstop() {
                        Routing::Descend
                    } else {
                        Routing::Destroy
                    }
                } else if at < span.start && span.start < end {
                    split_at(text, at, span.start)
                } else if span.start <= at && at < span.end && end > span.end {
                    split_at(text, at, span.end)
                } else {
                    Routing::Skip
                }
            }
            EditCommand::Insert { .. } => {
                if node.kind.is_tabstop() && span.touches(at) {
                    Routing::Descend
                } else if !node.kind.is_tabstop() && span.strictly_contains(at) {
                    Routing::Destroy
                } else {
                    Routing::Skip
                }
            }
        }
    }

    fn kill_all(&mut self, doomed: &[NodeId]) {
        for &child in doomed {
            tracing::debug!(node = %child, "edit destroyed node");
            self.kill(child);
        }
    }

    /// The edit belongs to `id` itself: resize it and move what follows.
    fn edit_own(&mut self, id: NodeId, cmd: &EditCommand) -> Result<()> {
        let span = self.nodes[id.0].span;
        let at = cmd.at();
        match cmd {
            EditCommand::Insert { text, .. } => {
                if !span.touches(at) {
                    return Err(SnippetError::EditOutsideSnippet { at, span });
                }
                self.propagate(id, at, end_from(at, text), true);
            }
            EditCommand::Delete { .. } => {
                if span.is_empty() {
                    return Err(SnippetError::EmptyNodeEdit { at });
                }
                let end = cmd.end();
                if !span.encloses(Span::new(at, end)) {
                    return Err(SnippetError::EditOutsideSnippet { at, span });
                }
                self.propagate(id, end, at, true);
            }
        }
        tracing::debug!(node = %id, ?cmd, span = %self.nodes[id.0].span, "applied edit");
        Ok(())
    }
}

/// Splits a deletion starting at `at` where it crosses `boundary`. Only a
/// single-line run can be split; anything else destroys the child.
fn split_at(text: &str, at: Position, boundary: Position) -> Routing {
    let len = text.chars().count();
    if at.line != boundary.line || text.contains('\n') {
        return Routing::Destroy;
    }
    match boundary.col.saturating_sub(at.col) {
        k if k > 0 && k < len => Routing::Split(k),
        _ => Routing::Destroy,
    }
}
