//! Minimal edit scripts between two buffer contents.
//!
//! The host only tells us what the buffer looked like before and after the
//! user touched it. To keep the snippet tree consistent we reduce that
//! transition to the same single-char [`EditCommand`]s the tree knows how
//! to replay.
//!
//! The search is a uniform-cost search over `(x, y)` grid states, `x` being
//! the offset into the old text and `y` the offset into the new one. The
//! frontier is a bucket queue keyed by accumulated cost:
//!
//! - matching `a[x] == b[y]` costs nothing and is followed immediately
//! - deleting `a[x]` costs [`DELETE_COST`]
//! - inserting `b[y]` costs [`INSERT_COST`]
//!
//! Insertions are expensive so that the cheapest script reuses existing
//! characters instead of deleting and retyping them, which keeps surviving
//! tree nodes intact. The search stops as soon as the remaining suffixes
//! are identical.

use std::collections::{BTreeMap, HashMap};

use crate::commands::EditCommand;
use crate::geometry::Position;

pub const DELETE_COST: usize = 1;
pub const INSERT_COST: usize = 1000;

#[derive(Debug, Clone, Copy)]
struct State {
    x: usize,
    y: usize,
    /// Position of the next edit in the partially transformed buffer.
    at: Position,
    /// Last emitted command on this path, as an index into the trail.
    last: Option<usize>,
}

/// A command together with the command emitted before it on the same path.
struct Step {
    prev: Option<usize>,
    cmd: EditCommand,
}

/// Computes the cheapest script turning `a` into `b`, with coordinates
/// starting at `0:0`.
pub fn edit_script(a: &str, b: &str) -> Vec<EditCommand> {
    edit_script_from(a, b, Position::default())
}

/// Like [`edit_script`], but `a` is assumed to start at `origin` in the
/// buffer, so the emitted coordinates can be replayed directly against the
/// buffer region `a` was read from.
pub fn edit_script_from(a: &str, b: &str, origin: Position) -> Vec<EditCommand> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let common_suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(l, r)| l == r)
        .count();
    let finished =
        |x: usize, y: usize| a.len() - x == b.len() - y && a.len() - x <= common_suffix;

    let mut trail: Vec<Step> = Vec::new();
    let mut best: HashMap<(usize, usize), usize> = HashMap::new();
    let mut frontier: BTreeMap<usize, Vec<State>> = BTreeMap::new();
    frontier.insert(
        0,
        vec![State {
            x: 0,
            y: 0,
            at: origin,
            last: None,
        }],
    );
    best.insert((0, 0), 0);

    while let Some((cost, mut bucket)) = frontier.pop_first() {
        while let Some(state) = bucket.pop() {
            let State { x, y, at, last } = state;
            if finished(x, y) {
                tracing::trace!(cost, steps = trail.len(), "edit script found");
                return unwind(trail, last);
            }

            // A match never makes the script worse, so it is taken before
            // any insert or delete from the same state.
            if x < a.len() && y < b.len() && a[x] == b[y] {
                if improves(&mut best, (x + 1, y + 1), cost) {
                    bucket.push(State {
                        x: x + 1,
                        y: y + 1,
                        at: advance(at, a[x]),
                        last,
                    });
                }
                continue;
            }

            if y < b.len() && improves(&mut best, (x, y + 1), cost + INSERT_COST) {
                trail.push(Step {
                    prev: last,
                    cmd: EditCommand::Insert {
                        at,
                        text: b[y].to_string(),
                    },
                });
                frontier.entry(cost + INSERT_COST).or_default().push(State {
                    x,
                    y: y + 1,
                    at: advance(at, b[y]),
                    last: Some(trail.len() - 1),
                });
            }
            if x < a.len() && improves(&mut best, (x + 1, y), cost + DELETE_COST) {
                trail.push(Step {
                    prev: last,
                    cmd: EditCommand::Delete {
                        at,
                        text: a[x].to_string(),
                    },
                });
                frontier.entry(cost + DELETE_COST).or_default().push(State {
                    x: x + 1,
                    y,
                    at,
                    last: Some(trail.len() - 1),
                });
            }
        }
    }

    // (a.len(), b.len()) is always reachable and always finished, so the
    // frontier cannot run dry first.
    unreachable!("edit script search exhausted its frontier")
}

fn improves(best: &mut HashMap<(usize, usize), usize>, key: (usize, usize), cost: usize) -> bool {
    match best.get(&key) {
        Some(&known) if known <= cost => false,
        _ => {
            best.insert(key, cost);
            true
        }
    }
}

fn advance(at: Position, c: char) -> Position {
    if c == '\n' {
        Position::new(at.line + 1, 0)
    } else {
        Position::new(at.line, at.col + 1)
    }
}

fn unwind(mut trail: Vec<Step>, mut last: Option<usize>) -> Vec<EditCommand> {
    let mut script = Vec::new();
    while let Some(idx) = last {
        let step = &mut trail[idx];
        last = step.prev;
        script.push(std::mem::replace(
            &mut step.cmd,
            EditCommand::Insert {
                at: Position::default(),
                text: String::new(),
            },
        ));
    }
    script.reverse();
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{apply_script, compactify};
    use insta::assert_yaml_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn cost_of(script: &[EditCommand]) -> usize {
        script
            .iter()
            .map(|cmd| {
                if cmd.is_insert() {
                    INSERT_COST
                } else {
                    DELETE_COST
                }
            })
            .sum()
    }

    #[test]
    fn single_substitution_is_one_delete_and_one_insert() {
        let script = edit_script("hello", "hallo");
        assert_eq!(
            script,
            vec![
                EditCommand::delete(0, 1, "e"),
                EditCommand::insert(0, 1, "a"),
            ]
        );
    }

    #[test]
    fn identical_strings_need_no_edits() {
        assert!(edit_script("", "").is_empty());
        assert!(edit_script("abcdef", "abcdef").is_empty());
        assert!(edit_script("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn inserted_space_in_the_middle() {
        let script = edit_script("Vorne hallo Hinten", "Vorne hallo  Hinten");
        assert_eq!(script.len(), 1);
        assert!(script[0].is_insert());
        assert_eq!(script[0].text(), " ");
    }

    #[test]
    fn coordinates_follow_newlines() {
        let script = edit_script("ab\ncd", "ab\ncXd");
        assert_eq!(script, vec![EditCommand::insert(1, 1, "X")]);
    }

    #[test]
    fn origin_offsets_every_command() {
        let script = edit_script_from("ab", "aXb", Position::new(4, 2));
        assert_eq!(script, vec![EditCommand::insert(4, 3, "X")]);
    }

    #[test]
    fn script_is_ordered_left_to_right() {
        let script = edit_script("one two three", "1 two 3");
        let positions: Vec<_> = script.iter().map(|cmd| cmd.at()).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn tail_edits_do_not_disturb_prefix() {
        let script = edit_script("hallo End Beginning", "hallo End t");
        assert!(script.iter().all(|cmd| cmd.at().col >= 10));
        assert_eq!(apply_script("hallo End Beginning", &script), "hallo End t");
    }

    #[test]
    fn deleting_a_run_snapshot() {
        let script = compactify(&edit_script("abcXYZdef", "abcdef"));
        assert_yaml_snapshot!(script, @r"
        - kind: delete
          at:
            line: 0
            col: 3
          text: XYZ
        ");
    }

    #[rstest]
    #[case("", "")]
    #[case("", "abc")]
    #[case("abc", "")]
    #[case("Hello", "Hello\nWorld\nWorld\nWorld")]
    #[case(
        "hallo Blah mitte=sdfdsfsd\nhallo kjsdhfjksdhfkjhsdfkh mittekjshdkfhkhsdfdsf",
        "hallo Blah mitte=sdfdsfsd\nhallo b mittekjshdkfhkhsdfdsf"
    )]
    #[case("thou shalt not", "you should not")]
    #[case("abcabba", "cbabac")]
    #[case("line one\nline two\n", "line two\nline one\n")]
    #[case("tabs\tand\ttabs", "tabs and tabs")]
    #[case("ünïcödé", "unicode")]
    fn replay_reproduces_target(#[case] a: &str, #[case] b: &str) {
        let script = edit_script(a, b);
        assert_eq!(apply_script(a, &script), b);
        assert_eq!(apply_script(a, &compactify(&script)), b);
    }

    #[rstest]
    #[case("abc", "def", 3)]
    #[case("kitten", "sitting", 2)]
    #[case("abcabba", "cbabac", 3)]
    fn deletions_are_minimal(#[case] a: &str, #[case] b: &str, #[case] deletes: usize) {
        let script = edit_script(a, b);
        let inserts = deletes + b.chars().count() - a.chars().count();
        assert_eq!(
            cost_of(&script),
            deletes * DELETE_COST + inserts * INSERT_COST
        );
    }
}
