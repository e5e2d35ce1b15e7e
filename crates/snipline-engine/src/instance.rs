//! One live snippet expansion.

use std::collections::BTreeMap;

use tracing::Dispatch;

use crate::commands::EditCommand;
use crate::content::{IndentUtil, indent_template, leading_whitespace};
use crate::error::{Result, SnippetError};
use crate::eval::Evaluators;
use crate::geometry::{Position, Span};
use crate::host::Host;
use crate::tree::{self, Context, NodeId, Tree};

/// Everything an expansion needs besides the template and the buffer.
#[derive(Debug, Default)]
pub struct ExpansionContext {
    /// Text that was visually selected when the snippet was triggered.
    pub visual: String,
    /// Groups of the trigger match, group 0 first.
    pub last_match: Vec<Option<String>>,
    /// Initial bindings shared by the snippet's scripts.
    pub bindings: BTreeMap<String, String>,
    /// `global !p` lines of the snippet file.
    pub globals: Vec<String>,
    pub evaluators: Evaluators,
    /// Subscriber for the instance's events. Without one, events go to
    /// whatever subscriber the caller has installed.
    pub tracer: Option<Dispatch>,
}

/// Runs `f` with `tracer` as the default subscriber, if there is one.
fn traced<T>(tracer: &Option<Dispatch>, f: impl FnOnce() -> T) -> T {
    match tracer {
        Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
        None => f(),
    }
}

/// The root of an expanded snippet.
///
/// Owns the node tree, the state shared by computed children and the
/// active tabstop. The host buffer stays with the caller and is passed in
/// to every operation that touches it.
#[derive(Debug)]
pub struct SnippetInstance {
    tree: Tree,
    /// `None` once navigation wrapped to the final stop.
    active: Option<u32>,
    visual: String,
    last_match: Vec<Option<String>>,
    bindings: BTreeMap<String, String>,
    globals: Vec<String>,
    evaluators: Evaluators,
    tracer: Option<Dispatch>,
}

impl SnippetInstance {
    /// Expands `template` at `at` and writes the result into `host`.
    ///
    /// Continuation lines of the template are indented to match the line
    /// the snippet lands on.
    pub fn instantiate(
        host: &mut dyn Host,
        template: &str,
        at: Position,
        ctx: ExpansionContext,
    ) -> Result<Self> {
        let tracer = ctx.tracer.clone();
        traced(&tracer, || {
            let line = host.line(at.line).unwrap_or_default();
            let line_indent = leading_whitespace(&line).to_string();
            let ind = IndentUtil::from_host(host);
            let text = indent_template(template, &line_indent, &ind);
            tracing::debug!(%at, template = %text, "expanding snippet");

            let tree = tree::build(
                &text,
                at,
                &line_indent,
                &ctx.visual,
                ind,
                &*ctx.evaluators.shell,
            )?;
            let mut instance = Self {
                tree,
                active: Some(0),
                visual: ctx.visual,
                last_match: ctx.last_match,
                bindings: ctx.bindings,
                globals: ctx.globals,
                evaluators: ctx.evaluators,
                tracer: ctx.tracer,
            };
            instance.update(host)?;
            Ok(instance)
        })
    }

    /// Replays edits the user made to the buffer, in order.
    ///
    /// Each command's coordinates assume every earlier command has been
    /// applied. Call [`SnippetInstance::recompute`] afterwards to refresh
    /// dependent content.
    pub fn edited(&mut self, commands: &[EditCommand]) -> Result<()> {
        let tracer = self.tracer.clone();
        traced(&tracer, || {
            if self.tree.has_cursor_marker() {
                return Err(SnippetError::CursorMarkerExists);
            }
            tracing::debug!(count = commands.len(), "replaying edits");
            for cmd in commands {
                self.tree.apply_command(cmd)?;
            }
            Ok(())
        })
    }

    /// Recomputes every mirror, transformation and evaluated child and
    /// writes changed content into `host`.
    pub fn recompute(&mut self, host: &mut dyn Host) -> Result<()> {
        let tracer = self.tracer.clone();
        traced(&tracer, || self.update(host))
    }

    /// [`SnippetInstance::edited`] followed by
    /// [`SnippetInstance::recompute`].
    pub fn apply(&mut self, host: &mut dyn Host, commands: &[EditCommand]) -> Result<()> {
        self.edited(commands)?;
        self.recompute(host)
    }

    fn update(&mut self, host: &mut dyn Host) -> Result<()> {
        let mut ctx = Context {
            host,
            evaluators: &mut self.evaluators,
            bindings: &mut self.bindings,
            globals: &self.globals,
            last_match: &self.last_match,
        };
        self.tree.recompute(&mut ctx)
    }

    /// Moves to the next tabstop, or the previous one with `backwards`.
    ///
    /// Forward past the highest number wraps to tabstop 0 and ends the
    /// session; backward past the lowest stays put. Returns the tabstop to
    /// select, `None` once the session has ended or the target is gone.
    pub fn select_next_tab(&mut self, backwards: bool) -> Option<NodeId> {
        let tracer = self.tracer.clone();
        traced(&tracer, || {
            let current = self.active?;
            let (next, selected) = if backwards {
                match self.tree.prev_tabstop(current) {
                    Some((n, id)) => (Some(n), Some(id)),
                    None => (Some(current), self.tree.find_tabstop(current)),
                }
            } else {
                match self.tree.next_tabstop(current) {
                    Some((n, id)) => (Some(n), Some(id)),
                    None => (None, self.tree.find_tabstop(0)),
                }
            };
            tracing::debug!(from = current, to = ?next, backwards, "selected tabstop");
            self.active = next;
            selected
        })
    }

    /// Number of the active tabstop; `None` after the session ended.
    pub fn active_tabstop(&self) -> Option<u32> {
        self.active
    }

    pub fn is_finished(&self) -> bool {
        self.active.is_none()
    }

    /// Current text of node `id`.
    pub fn current_text(&self, id: NodeId, host: &dyn Host) -> String {
        self.tree.current_text(id, host)
    }

    /// Region of the buffer the whole snippet covers.
    pub fn span(&self) -> Span {
        self.tree.span(self.tree.root())
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn visual(&self) -> &str {
        &self.visual
    }

    pub fn bindings(&self) -> &BTreeMap<String, String> {
        &self.bindings
    }

    pub fn dump(&self) -> String {
        self.tree.dump()
    }

    /// See [`Tree::check_invariants`].
    ///
    /// # Panics
    /// Panics if the tree is malformed.
    pub fn check_invariants(&self) {
        self.tree.check_invariants();
    }
}
