use super::{NodeId, Tree};
use crate::geometry::Position;

/// Moves `pos` as the text ending at `from` now ends at `to`. Positions
/// before `from` are untouched.
fn moved(pos: Position, from: Position, to: Position) -> Position {
    if pos < from {
        pos
    } else {
        pos.shifted(from, to)
    }
}

impl Tree {
    /// Records that text owned by `owner` which used to end at `from` now
    /// ends at `to`.
    ///
    /// The owner's end moves, then every later sibling subtree and every
    /// ancestor's end on the way up to the root. With `shift_own_children`
    /// the owner's own children at or after `from` move too; that is what
    /// an edit typed into the owner needs, while rewriting the owner's whole
    /// content leaves its children to be placed separately.
    pub(crate) fn propagate(
        &mut self,
        owner: NodeId,
        from: Position,
        to: Position,
        shift_own_children: bool,
    ) {
        if from == to {
            return;
        }
        tracing::trace!(node = %owner, %from, %to, "propagating shift");

        let node = &mut self.nodes[owner.0];
        node.span.end = moved(node.span.end, from, to);
        if shift_own_children {
            for child in self.nodes[owner.0].children.clone() {
                if self.nodes[child.0].span.start >= from {
                    self.shift_subtree(child, from, to);
                }
            }
        }

        let mut child = owner;
        while let Some(parent) = self.nodes[child.0].parent {
            let siblings = self.nodes[parent.0].children.clone();
            if let Some(idx) = siblings.iter().position(|&c| c == child) {
                for &sibling in &siblings[idx + 1..] {
                    self.shift_subtree(sibling, from, to);
                }
            }
            let p = &mut self.nodes[parent.0];
            p.span.end = moved(p.span.end, from, to);
            child = parent;
        }
    }

    fn shift_subtree(&mut self, id: NodeId, from: Position, to: Position) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.span.start = moved(node.span.start, from, to);
            node.span.end = moved(node.span.end, from, to);
            stack.extend(node.children.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Span;
    use crate::tree::NodeKind;
    use pretty_assertions::assert_eq;

    fn pos(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    /// root [0:0, 0:9) with children a [0:0, 0:3), b [0:4, 0:6) holding
    /// c [0:5, 0:6), and d [0:6, 0:9).
    fn sample() -> (Tree, [NodeId; 4]) {
        let mut tree = Tree::with_root(Span::new(pos(0, 0), pos(0, 9)), String::new());
        let root = tree.root();
        let a = tree.add_child(
            root,
            NodeKind::TabStop { number: 1 },
            Span::new(pos(0, 0), pos(0, 3)),
            String::new(),
        );
        let b = tree.add_child(
            root,
            NodeKind::TabStop { number: 2 },
            Span::new(pos(0, 4), pos(0, 6)),
            String::new(),
        );
        let c = tree.add_child(
            b,
            NodeKind::TabStop { number: 3 },
            Span::new(pos(0, 5), pos(0, 6)),
            String::new(),
        );
        let d = tree.add_child(
            root,
            NodeKind::Literal,
            Span::new(pos(0, 6), pos(0, 9)),
            String::new(),
        );
        (tree, [a, b, c, d])
    }

    #[test]
    fn growth_moves_later_siblings_and_ancestors() {
        let (mut tree, [a, b, c, d]) = sample();
        tree.propagate(a, pos(0, 3), pos(0, 5), false);

        assert_eq!(tree.span(a), Span::new(pos(0, 0), pos(0, 5)));
        assert_eq!(tree.span(b), Span::new(pos(0, 6), pos(0, 8)));
        assert_eq!(tree.span(c), Span::new(pos(0, 7), pos(0, 8)));
        assert_eq!(tree.span(d), Span::new(pos(0, 8), pos(0, 11)));
        assert_eq!(tree.span(tree.root()).end, pos(0, 11));
        tree.check_invariants();
    }

    #[test]
    fn newline_moves_following_text_down() {
        let (mut tree, [_, b, c, d]) = sample();
        // "\n" typed into b right before c
        tree.propagate(b, pos(0, 5), pos(1, 0), true);

        assert_eq!(tree.span(b), Span::new(pos(0, 4), pos(1, 1)));
        assert_eq!(tree.span(c), Span::new(pos(1, 0), pos(1, 1)));
        assert_eq!(tree.span(d), Span::new(pos(1, 1), pos(1, 4)));
        assert_eq!(tree.span(tree.root()).end, pos(1, 4));
        tree.check_invariants();
    }

    #[test]
    fn shrinking_pulls_text_back() {
        let (mut tree, [a, b, _, d]) = sample();
        // two chars deleted from the end of a
        tree.propagate(a, pos(0, 3), pos(0, 1), true);

        assert_eq!(tree.span(a), Span::new(pos(0, 0), pos(0, 1)));
        assert_eq!(tree.span(b).start, pos(0, 2));
        assert_eq!(tree.span(d), Span::new(pos(0, 4), pos(0, 7)));
        tree.check_invariants();
    }

    #[test]
    fn no_op_shift_changes_nothing() {
        let (mut tree, [a, ..]) = sample();
        let before = tree.dump();
        tree.propagate(a, pos(0, 3), pos(0, 3), true);
        assert_eq!(tree.dump(), before);
    }
}
