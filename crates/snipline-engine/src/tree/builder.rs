//! Building the node tree from template text.

use std::collections::BTreeMap;

use super::{ComputedCode, NodeId, NodeKind, Tree};
use crate::content::{IndentUtil, end_from, reindent};
use crate::error::{CodeKind, Result, SnippetError};
use crate::eval::{ShellRunner, SnippetUtil};
use crate::geometry::{Position, Span};
use crate::parsing::{Lexer, Token, TokenKind};
use crate::transform::Transformation;

/// Tokens that can only be resolved once every tabstop is known.
enum Pending {
    Mirror {
        parent: NodeId,
        number: u32,
        span: Span,
    },
    Transformation {
        parent: NodeId,
        number: u32,
        span: Span,
        search: String,
        replace: String,
        options: String,
    },
}

struct Builder<'a> {
    tree: Tree,
    line_indent: &'a str,
    visual: &'a str,
    ind: IndentUtil,
    shell: &'a dyn ShellRunner,
    seen: BTreeMap<u32, NodeId>,
    pending: Vec<Pending>,
}

/// Builds the tree for `template`, which is expanded at `at`.
///
/// `template` must already be indented for the line it lands on; its raw
/// text becomes the initial text of the root. Shell code runs here, once.
/// Nothing is written to the buffer yet.
pub(crate) fn build(
    template: &str,
    at: Position,
    line_indent: &str,
    visual: &str,
    ind: IndentUtil,
    shell: &dyn ShellRunner,
) -> Result<Tree> {
    let mut builder = Builder {
        tree: Tree::with_root(Span::empty(at), template.to_string()),
        line_indent,
        visual,
        ind,
        shell,
        seen: BTreeMap::new(),
        pending: Vec::new(),
    };
    let root = builder.tree.root();
    builder.parse(root, template, at)?;
    builder.resolve()?;

    let mut tree = builder.tree;
    if !builder.seen.contains_key(&0) {
        let end = end_from(at, template);
        tree.add_child(root, NodeKind::TabStop { number: 0 }, Span::empty(end), String::new());
    }
    tracing::debug!(nodes = tree.walk().len(), "built snippet tree");
    Ok(tree)
}

impl Builder<'_> {
    fn parse(&mut self, parent: NodeId, text: &str, offset: Position) -> Result<()> {
        for Token { kind, span } in Lexer::new(text, offset, self.line_indent) {
            match kind {
                TokenKind::Text(_) => {}
                TokenKind::TabStop { number, initial } => {
                    if let Some(&source) = self.seen.get(&number) {
                        self.add(parent, NodeKind::Mirror { source }, span, String::new());
                        continue;
                    }
                    let ts = self.add(parent, NodeKind::TabStop { number }, span, initial.clone());
                    self.seen.insert(number, ts);
                    self.parse(ts, &initial, span.start)?;
                }
                TokenKind::Mirror { number } => self.pending.push(Pending::Mirror {
                    parent,
                    number,
                    span,
                }),
                TokenKind::Transformation {
                    number,
                    search,
                    replace,
                    options,
                } => self.pending.push(Pending::Transformation {
                    parent,
                    number,
                    span,
                    search,
                    replace,
                    options,
                }),
                TokenKind::EscapedChar(c) => {
                    self.add(parent, NodeKind::Literal, span, c.to_string());
                }
                TokenKind::Visual { leading_whitespace } => {
                    let text = reindent(self.visual, &leading_whitespace);
                    self.add(parent, NodeKind::Literal, span, text);
                }
                TokenKind::Shell { code } => {
                    let code = code.replace("\\`", "`");
                    let output = self
                        .shell
                        .run(&code)
                        .map_err(|source| SnippetError::Evaluation {
                            kind: CodeKind::Shell,
                            source,
                        })?;
                    self.add_code(parent, CodeKind::Shell, code, None, span, output);
                }
                TokenKind::HostExpr { code } => {
                    let code = code.replace("\\`", "`").trim().to_string();
                    self.add_code(parent, CodeKind::HostExpr, code, None, span, String::new());
                }
                TokenKind::Script { code, indent } => {
                    let snip = SnippetUtil::new(&indent, self.ind);
                    self.add_code(parent, CodeKind::Script, code, Some(snip), span, String::new());
                }
            }
        }
        Ok(())
    }

    /// Mirrors first, so that a transformation may refer to a tabstop only
    /// declared through a bare `$N`.
    fn resolve(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let (mirrors, transformations): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|p| matches!(p, Pending::Mirror { .. }));

        for p in mirrors {
            if let Pending::Mirror {
                parent,
                number,
                span,
            } = p
            {
                match self.seen.get(&number) {
                    Some(&source) => {
                        self.add(parent, NodeKind::Mirror { source }, span, String::new());
                    }
                    None => {
                        let ts = self.add(parent, NodeKind::TabStop { number }, span, String::new());
                        self.seen.insert(number, ts);
                    }
                }
            }
        }

        for p in transformations {
            if let Pending::Transformation {
                parent,
                number,
                span,
                search,
                replace,
                options,
            } = p
            {
                let source = *self
                    .seen
                    .get(&number)
                    .ok_or(SnippetError::UnknownTabStop { number })?;
                let transform = Transformation::new(&search, &replace, &options)?;
                self.add(
                    parent,
                    NodeKind::Transformation { source, transform },
                    span,
                    String::new(),
                );
            }
        }
        Ok(())
    }

    fn add(&mut self, parent: NodeId, kind: NodeKind, span: Span, initial: String) -> NodeId {
        self.tree.add_child(parent, kind, span, initial)
    }

    fn add_code(
        &mut self,
        parent: NodeId,
        kind: CodeKind,
        code: String,
        snip: Option<SnippetUtil>,
        span: Span,
        initial: String,
    ) {
        let computed = ComputedCode { kind, code, snip };
        self.add(parent, NodeKind::Computed(computed), span, initial);
    }
}
