//! Bringing dynamic content up to date.
//!
//! The first pass writes every node's initial text into the buffer, top
//! down. After that, and after every batch of user edits, mirrors,
//! transformations and evaluated code are recomputed and rewritten in
//! place. A transient cursor marker rides along so the host cursor ends up
//! where the user left it.

use std::collections::{BTreeMap, HashSet};

use super::{ComputedCode, NodeId, NodeKind, TextObject, Tree};
use crate::content::materialize;
use crate::error::{CodeKind, EvalError, Result, SnippetError};
use crate::eval::{Evaluators, ScriptRequest};
use crate::geometry::{Position, Span};
use crate::host::Host;

/// What a recompute pass can reach besides the tree itself.
pub struct Context<'a> {
    pub host: &'a mut dyn Host,
    pub evaluators: &'a mut Evaluators,
    /// Bindings shared by every script of the instance.
    pub bindings: &'a mut BTreeMap<String, String>,
    pub globals: &'a [String],
    pub last_match: &'a [Option<String>],
}

/// Buffer state a node recomputes from.
#[derive(Debug, Clone, Default)]
pub struct UpdateInputs {
    /// The node's own current text.
    pub current: String,
    /// Current text of the source tabstop; `None` once the source is dead.
    pub source: Option<String>,
    /// Current text of every live tabstop. Only filled in for scripts.
    pub tabstops: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Unchanged,
    Text(String),
    /// The source is gone; the node has to go too.
    Orphaned,
}

impl ComputedCode {
    pub(super) fn evaluate(&mut self, inputs: &UpdateInputs, ctx: &mut Context<'_>) -> Result<Update> {
        let failed = |kind, source| SnippetError::Evaluation { kind, source };
        match self.kind {
            // Shell output is fixed once the snippet is expanded.
            CodeKind::Shell => Ok(Update::Unchanged),
            CodeKind::HostExpr => ctx
                .host
                .eval(&self.code)
                .map(Update::Text)
                .map_err(|e| failed(CodeKind::HostExpr, e)),
            CodeKind::Script => {
                let Some(engine) = ctx.evaluators.script.as_mut() else {
                    return Err(failed(CodeKind::Script, EvalError::Unsupported));
                };
                let Some(snip) = self.snip.as_mut() else {
                    return Err(failed(CodeKind::Script, EvalError::Unsupported));
                };
                let path = ctx.host.path();
                snip.reset(&inputs.current, &path, &ctx.host.filetype());
                let mut request = ScriptRequest {
                    code: &self.code,
                    globals: ctx.globals,
                    tabstops: &inputs.tabstops,
                    bindings: &mut *ctx.bindings,
                    last_match: ctx.last_match,
                    path: &path,
                    snip: &mut *snip,
                    host: &*ctx.host,
                };
                let returned = engine
                    .evaluate(&mut request)
                    .map_err(|e| failed(CodeKind::Script, e))?;
                Ok(Update::Text(if snip.rv_changed() {
                    snip.rv().to_string()
                } else {
                    returned
                }))
            }
        }
    }
}

impl Tree {
    /// Brings the buffer and the tree up to date.
    ///
    /// On the first call every node's initial text is written out. Then all
    /// dynamic nodes are recomputed. The host cursor is restored even when
    /// an evaluation fails.
    pub fn recompute(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        if !self.materialized {
            self.materialize_node(self.root, ctx.host);
            self.materialized = true;
            tracing::debug!(span = %self.span(self.root), "materialized snippet");
        }

        let marker = self.place_cursor_marker(ctx.host.cursor())?;
        let result = self.update_dynamic(ctx);
        if let Some(marker) = marker {
            ctx.host.set_cursor(self.span(marker).start);
            self.kill(marker);
        }
        result
    }

    fn materialize_node(&mut self, id: NodeId, host: &mut dyn Host) {
        let span = self.span(id);
        let new_end = materialize(host, span, &self.nodes[id.0].initial_text);
        self.propagate(id, span.end, new_end, false);
        for child in self.nodes[id.0].children.clone() {
            self.materialize_node(child, host);
        }
    }

    fn place_cursor_marker(&mut self, cursor: Position) -> Result<Option<NodeId>> {
        if self.has_cursor_marker() {
            return Err(SnippetError::CursorMarkerExists);
        }
        if !self.span(self.root).touches(cursor) {
            return Ok(None);
        }

        let mut parent = self.root;
        let mut at = cursor;
        loop {
            let children = &self.nodes[parent.0].children;
            if let Some(&inner) = children.iter().find(|&&c| {
                !self.nodes[c.0].kind.is_tabstop() && self.span(c).strictly_contains(at)
            }) {
                at = self.span(inner).end;
            }
            match children
                .iter()
                .find(|&&c| self.nodes[c.0].kind.is_tabstop() && self.span(c).touches(at))
            {
                Some(&ts) => parent = ts,
                None => break,
            }
        }
        tracing::trace!(parent = %parent, %at, "placed cursor marker");
        Ok(Some(self.add_child(
            parent,
            NodeKind::CursorMarker,
            Span::empty(at),
            String::new(),
        )))
    }

    /// Dynamic nodes in update order: post-order, with the dynamic content
    /// of a mirror's source always ahead of the mirror.
    fn dynamic_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        for id in self.post_order(self.root) {
            self.visit_dynamic(id, &mut seen, &mut order);
        }
        order
    }

    fn visit_dynamic(&self, id: NodeId, seen: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
        let kind = &self.nodes[id.0].kind;
        if !kind.is_dynamic() || !seen.insert(id) {
            return;
        }
        if let Some(source) = kind.source().filter(|&s| self.is_alive(s)) {
            for dep in self.post_order(source) {
                self.visit_dynamic(dep, seen, order);
            }
        }
        order.push(id);
    }

    fn update_dynamic(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        for id in self.dynamic_order() {
            if !self.is_alive(id) {
                continue;
            }
            let node = &self.nodes[id.0];
            let inputs = UpdateInputs {
                current: ctx.host.read(node.span),
                source: node
                    .kind
                    .source()
                    .filter(|&s| self.is_alive(s))
                    .map(|s| ctx.host.read(self.span(s))),
                tabstops: match &node.kind {
                    NodeKind::Computed(code) if code.kind == CodeKind::Script => {
                        self.tabstop_texts(ctx.host)
                    }
                    _ => BTreeMap::new(),
                },
            };

            match self.nodes[id.0].recompute(&inputs, ctx)? {
                Update::Unchanged => {}
                Update::Text(text) if text == inputs.current => {}
                Update::Text(text) => {
                    tracing::debug!(node = %id, %text, "rewriting dynamic node");
                    self.rewrite(id, &text, ctx.host);
                }
                Update::Orphaned => {
                    tracing::debug!(node = %id, "source died, removing dependent");
                    if !inputs.current.is_empty() {
                        self.rewrite(id, "", ctx.host);
                    }
                    self.kill(id);
                }
            }
        }
        Ok(())
    }

    /// Replaces the whole text of `id` and moves what follows.
    fn rewrite(&mut self, id: NodeId, text: &str, host: &mut dyn Host) {
        let span = self.span(id);
        let new_end = materialize(host, span, text);
        self.propagate(id, span.end, new_end, false);
    }
}
