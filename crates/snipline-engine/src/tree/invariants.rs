use std::collections::BTreeSet;

use super::{NodeId, Tree};

/// Walks the live tree and asserts the layout rules.
///
/// # Panics
/// Panics on the first node that breaks a rule.
pub(super) fn check(tree: &Tree) {
    let mut numbers = BTreeSet::new();
    for id in tree.walk() {
        check_node(tree, id, &mut numbers);
    }
}

fn check_node(tree: &Tree, id: NodeId, numbers: &mut BTreeSet<u32>) {
    let node = tree.node(id);
    assert!(node.alive, "{id} is reachable but dead");
    assert!(
        node.span.start <= node.span.end,
        "{id} has inverted span {}",
        node.span
    );

    if let Some(number) = node.tabstop_number() {
        assert!(numbers.insert(number), "tabstop {number} appears twice");
    }

    for &child in &node.children {
        let c = tree.node(child);
        assert!(c.alive, "{id} holds dead child {child}");
        assert_eq!(c.parent, Some(id), "{child} does not point back at {id}");
        assert!(
            node.span.encloses(c.span),
            "{child} at {} escapes parent {id} at {}",
            c.span,
            node.span
        );
    }

    for pair in node.children.windows(2) {
        let (prev, next) = (tree.span(pair[0]), tree.span(pair[1]));
        assert!(
            prev.end <= next.start,
            "siblings {} at {prev} and {} at {next} overlap",
            pair[0],
            pair[1]
        );
    }

    for (&number, &ts) in &node.tabstops {
        let t = tree.node(ts);
        assert!(t.alive, "{id} indexes dead tabstop {number}");
        assert!(
            node.children.contains(&ts),
            "tabstop {number} indexed by {id} is not its child"
        );
        assert_eq!(t.tabstop_number(), Some(number), "{ts} indexed under {number}");
    }
}
