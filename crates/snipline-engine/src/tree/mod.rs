//! The text object tree of one expanded snippet.
//!
//! Every region of an expansion is a node in an arena owned by [`Tree`].
//! Nodes refer to each other through [`NodeId`] handles: a parent holds its
//! children's handles in buffer order, a child holds its parent's handle
//! for lookups only. Destroyed nodes stay in the arena as tombstones so
//! that handles never dangle; they are simply no longer reachable from the
//! root.
//!
//! ## Layout rules
//!
//! - a node's span contains the spans of all its children
//! - siblings are ordered by start and never overlap
//! - each node indexes its direct `TabStop` children by number
//!
//! The submodules implement the operations on top of these rules:
//! building from a template, replaying edits, shifting spans, recomputing
//! dynamic content and navigating between tabstops.

mod builder;
mod edit;
mod invariants;
mod navigate;
mod propagate;
mod recompute;

use std::collections::BTreeMap;
use std::fmt;

pub(crate) use builder::build;
pub use recompute::{Context, Update, UpdateInputs};

use crate::error::{CodeKind, Result};
use crate::eval::SnippetUtil;
use crate::geometry::Span;
use crate::host::Host;
use crate::transform::Transformation;

/// Stable handle of a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Code whose output becomes the content of a node.
#[derive(Debug, Clone)]
pub struct ComputedCode {
    pub kind: CodeKind,
    pub code: String,
    /// Line builder handed to script code; kept between updates.
    pub(crate) snip: Option<SnippetUtil>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Fixed text: the snippet root, escaped chars and `${VISUAL}`.
    Literal,
    /// An editable stop; `0` is where the cursor rests at the end.
    TabStop { number: u32 },
    /// Repeats the text of `source`.
    Mirror { source: NodeId },
    /// Repeats the text of `source` after a regex substitution.
    Transformation {
        source: NodeId,
        transform: Transformation,
    },
    Computed(ComputedCode),
    /// Tracks the host cursor while dynamic content is rewritten.
    CursorMarker,
}

impl NodeKind {
    pub fn is_tabstop(&self) -> bool {
        matches!(self, NodeKind::TabStop { .. })
    }

    pub fn tabstop_number(&self) -> Option<u32> {
        match self {
            NodeKind::TabStop { number } => Some(*number),
            _ => None,
        }
    }

    /// The tabstop a mirror or transformation copies from.
    pub fn source(&self) -> Option<NodeId> {
        match self {
            NodeKind::Mirror { source } | NodeKind::Transformation { source, .. } => Some(*source),
            _ => None,
        }
    }

    /// Whether the node's content is recomputed on every update.
    pub fn is_dynamic(&self) -> bool {
        match self {
            NodeKind::Mirror { .. } | NodeKind::Transformation { .. } => true,
            NodeKind::Computed(code) => code.kind != CodeKind::Shell,
            _ => false,
        }
    }
}

/// The capabilities every node kind shares.
pub trait TextObject {
    fn span(&self) -> Span;

    fn children(&self) -> &[NodeId];

    /// Works out the node's fresh content from `inputs`.
    fn recompute(&mut self, inputs: &UpdateInputs, ctx: &mut Context<'_>) -> Result<Update>;
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    span: Span,
    initial_text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    tabstops: BTreeMap<u32, NodeId>,
    alive: bool,
}

impl Node {
    fn new(kind: NodeKind, span: Span, initial_text: String, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            span,
            initial_text,
            parent,
            children: Vec::new(),
            tabstops: BTreeMap::new(),
            alive: true,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn tabstop_number(&self) -> Option<u32> {
        self.kind.tabstop_number()
    }

    /// Text the node was created with, before any edits.
    pub fn initial_text(&self) -> &str {
        &self.initial_text
    }

    /// Direct `TabStop` children by number.
    pub fn tabstops(&self) -> &BTreeMap<u32, NodeId> {
        &self.tabstops
    }
}

impl TextObject for Node {
    fn span(&self) -> Span {
        self.span
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn recompute(&mut self, inputs: &UpdateInputs, ctx: &mut Context<'_>) -> Result<Update> {
        match &mut self.kind {
            NodeKind::Literal | NodeKind::TabStop { .. } | NodeKind::CursorMarker => {
                Ok(Update::Unchanged)
            }
            NodeKind::Mirror { .. } => Ok(match &inputs.source {
                Some(text) => Update::Text(text.clone()),
                None => Update::Orphaned,
            }),
            NodeKind::Transformation { transform, .. } => Ok(match &inputs.source {
                Some(text) => Update::Text(transform.apply(text)),
                None => Update::Orphaned,
            }),
            NodeKind::Computed(code) => code.evaluate(inputs, ctx),
        }
    }
}

/// Arena of nodes rooted at a `Literal` holding the whole expansion.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    materialized: bool,
}

impl Tree {
    pub(crate) fn with_root(span: Span, initial_text: String) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Literal, span, initial_text, None)],
            root: NodeId(0),
            materialized: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0].span
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes[id.0].alive
    }

    /// Current text of `id` as it stands in the host buffer.
    pub fn current_text(&self, id: NodeId, host: &dyn Host) -> String {
        host.read(self.nodes[id.0].span)
    }

    /// Live nodes in pre-order, starting at the root.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        out
    }

    /// Live nodes of the subtree at `id`, children before their parent.
    pub fn post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_post_order(id, &mut out);
        out
    }

    fn collect_post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            self.collect_post_order(child, out);
        }
        out.push(id);
    }

    /// Current text of every live tabstop.
    pub fn tabstop_texts(&self, host: &dyn Host) -> BTreeMap<u32, String> {
        self.walk()
            .into_iter()
            .filter_map(|id| {
                let node = &self.nodes[id.0];
                node.tabstop_number()
                    .map(|n| (n, host.read(node.span)))
            })
            .collect()
    }

    /// Adds a child to `parent`, keeping children ordered by span.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        span: Span,
        initial_text: String,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let number = kind.tabstop_number();
        self.nodes
            .push(Node::new(kind, span, initial_text, Some(parent)));

        let key = (span.start, span.end);
        let nodes = &self.nodes;
        let siblings = &self.nodes[parent.0].children;
        let idx = siblings.partition_point(|c| {
            let s = nodes[c.0].span;
            (s.start, s.end) <= key
        });
        self.nodes[parent.0].children.insert(idx, id);
        if let Some(number) = number {
            self.nodes[parent.0].tabstops.insert(number, id);
        }
        id
    }

    /// Destroys `id` and its whole subtree.
    pub(crate) fn kill(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            let p = &mut self.nodes[parent.0];
            p.children.retain(|&c| c != id);
            p.tabstops.retain(|_, &mut c| c != id);
        }
        let mut stack = vec![id];
        while let Some(dead) = stack.pop() {
            let node = &mut self.nodes[dead.0];
            node.alive = false;
            stack.extend(node.children.iter().copied());
        }
        tracing::trace!(node = %id, "killed subtree");
    }

    pub fn has_cursor_marker(&self) -> bool {
        self.walk()
            .into_iter()
            .any(|id| matches!(self.nodes[id.0].kind, NodeKind::CursorMarker))
    }

    /// Indented rendering of the live hierarchy, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.nodes[id.0];
        let label = match &node.kind {
            NodeKind::Literal => "Literal".to_string(),
            NodeKind::TabStop { number } => format!("TabStop({number})"),
            NodeKind::Mirror { source } => format!("Mirror(${})", self.source_label(*source)),
            NodeKind::Transformation { source, transform } => format!(
                "Transformation(${}, /{}/)",
                self.source_label(*source),
                transform.pattern()
            ),
            NodeKind::Computed(code) => match code.kind {
                CodeKind::Shell => "Shell".to_string(),
                CodeKind::HostExpr => "HostExpr".to_string(),
                CodeKind::Script => "Script".to_string(),
            },
            NodeKind::CursorMarker => "CursorMarker".to_string(),
        };
        out.push_str(&format!("{}{} {}\n", "  ".repeat(depth), label, node.span));
        for &child in &node.children {
            self.dump_node(child, depth + 1, out);
        }
    }

    fn source_label(&self, source: NodeId) -> String {
        let node = &self.nodes[source.0];
        match (node.alive, node.tabstop_number()) {
            (true, Some(n)) => n.to_string(),
            _ => "dead".to_string(),
        }
    }

    /// Asserts every layout rule holds. Meant for tests and debugging.
    ///
    /// # Panics
    /// Panics with a description of the first broken rule.
    pub fn check_invariants(&self) {
        invariants::check(self);
    }
}
