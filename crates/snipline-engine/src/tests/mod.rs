//! End-to-end scenarios: expand a template into a [`MemoryHost`], make
//! changes the way a user would and check buffer, tree and navigation.

use pretty_assertions::assert_eq;

use crate::edit_distance::edit_script;
use crate::error::EvalError;
use crate::eval::{Evaluators, ScriptRequest};
use crate::geometry::{Position, Span};
use crate::host::{Host, MemoryHost};
use crate::instance::{ExpansionContext, SnippetInstance};
use crate::tree::{NodeId, NodeKind};
use crate::{EditCommand, TextObject};

fn pos(line: usize, col: usize) -> Position {
    Position::new(line, col)
}

fn expand(host: &mut MemoryHost, template: &str, at: Position) -> SnippetInstance {
    expand_with(host, template, at, ExpansionContext::default())
}

fn expand_with(
    host: &mut MemoryHost,
    template: &str,
    at: Position,
    ctx: ExpansionContext,
) -> SnippetInstance {
    let snippet = SnippetInstance::instantiate(host, template, at, ctx).unwrap();
    snippet.check_invariants();
    snippet
}

/// Replaces `span` in the buffer and replays the resulting edit script.
fn type_over(host: &mut MemoryHost, snippet: &mut SnippetInstance, span: Span, text: &str) {
    let before = host.text();
    host.write(span, text);
    let commands = edit_script(&before, &host.text());
    snippet.apply(host, &commands).unwrap();
    snippet.check_invariants();
}

fn tabstop_number(snippet: &SnippetInstance, id: Option<NodeId>) -> Option<u32> {
    id.and_then(|id| snippet.tree().node(id).tabstop_number())
}

/// Every live mirror shows exactly what its source shows.
fn assert_mirrors_consistent(snippet: &SnippetInstance, host: &MemoryHost) {
    let tree = snippet.tree();
    for id in tree.walk() {
        if let NodeKind::Mirror { source } = tree.node(id).kind() {
            assert_eq!(
                tree.current_text(id, host),
                tree.current_text(*source, host),
                "mirror {id} out of sync"
            );
        }
    }
}

#[test]
fn expansion_fills_mirrors() {
    let mut host = MemoryHost::new("");
    let snippet = expand(&mut host, "hello ${1:world} $1", pos(0, 0));

    assert_eq!(host.text(), "hello world world");
    assert_eq!(snippet.span(), Span::new(pos(0, 0), pos(0, 17)));
    assert_mirrors_consistent(&snippet, &host);
}

#[test]
fn typing_into_tabstop_updates_mirror() {
    let mut host = MemoryHost::new("");
    let mut snippet = expand(&mut host, "hello ${1:world} $1", pos(0, 0));

    let ts = snippet.select_next_tab(false).unwrap();
    assert_eq!(snippet.current_text(ts, &host), "world");
    let span = snippet.tree().node(ts).span();
    type_over(&mut host, &mut snippet, span, "there");

    assert_eq!(host.text(), "hello there there");
    assert_eq!(snippet.current_text(ts, &host), "there");
    assert_mirrors_consistent(&snippet, &host);
}

#[test]
fn multi_line_template_follows_line_indent() {
    let mut host = MemoryHost::new("    ");
    let snippet = expand(&mut host, "if ${1:cond} {\n\t${2:body}\n}", pos(0, 4));

    assert_eq!(host.text(), "    if cond {\n        body\n    }");
    insta::assert_snapshot!(snippet.dump(), @r"
    Literal 0:4..2:5
      TabStop(1) 0:7..0:11
      TabStop(2) 1:8..1:12
      TabStop(0) 2:5..2:5
    ");
}

#[test]
fn second_recompute_is_a_no_op() {
    let mut host = MemoryHost::new("");
    let mut snippet = expand(&mut host, "${1:a} ${2:b} $2 ${1/a/A/}", pos(0, 0));
    let (text, dump) = (host.text(), snippet.dump());

    snippet.recompute(&mut host).unwrap();
    assert_eq!(host.text(), text);
    assert_eq!(snippet.dump(), dump);
}

#[test]
fn navigation_order() {
    let mut host = MemoryHost::new("");
    let mut snippet = expand(&mut host, "${1:a} ${3:c} ${5:e}", pos(0, 0));

    let forward: Vec<_> = (0..3)
        .map(|_| {
            let id = snippet.select_next_tab(false);
            tabstop_number(&snippet, id)
        })
        .collect();
    assert_eq!(forward, vec![Some(1), Some(3), Some(5)]);

    let backward: Vec<_> = (0..3)
        .map(|_| {
            let id = snippet.select_next_tab(true);
            tabstop_number(&snippet, id)
        })
        .collect();
    // backward past the first tabstop holds position
    assert_eq!(backward, vec![Some(3), Some(1), Some(1)]);
}

#[test]
fn forward_past_last_tabstop_ends_session() {
    let mut host = MemoryHost::new("");
    let mut snippet = expand(&mut host, "${1:a} ${2:b}", pos(0, 0));

    snippet.select_next_tab(false);
    snippet.select_next_tab(false);
    let last = snippet.select_next_tab(false);
    assert_eq!(tabstop_number(&snippet, last), Some(0));
    assert_eq!(snippet.tree().node(last.unwrap()).span(), Span::empty(pos(0, 3)));
    assert!(snippet.is_finished());
    assert_eq!(snippet.select_next_tab(false), None);
    assert_eq!(snippet.select_next_tab(true), None);
}

#[test]
fn deleting_tabstop_removes_its_mirrors() {
    let mut host = MemoryHost::new("");
    let mut snippet = expand(&mut host, "${1:a} ${2:bb} $2 $2", pos(0, 0));
    assert_eq!(host.text(), "a bb bb bb");

    host.write(Span::new(pos(0, 1), pos(0, 4)), "");
    snippet
        .apply(&mut host, &[EditCommand::delete(0, 1, " bb")])
        .unwrap();
    snippet.check_invariants();

    assert_eq!(host.text(), "a  ");
    insta::assert_snapshot!(snippet.dump(), @r"
    Literal 0:0..0:3
      TabStop(1) 0:0..0:1
      TabStop(0) 0:3..0:3
    ");

    let mut visited = Vec::new();
    while let Some(id) = snippet.select_next_tab(false) {
        visited.push(snippet.tree().node(id).tabstop_number());
    }
    assert_eq!(visited, vec![Some(1), Some(0)]);
}

#[test]
fn typing_into_mirror_turns_it_into_text() {
    let mut host = MemoryHost::new("");
    let mut snippet = expand(&mut host, "${1:ab} $1", pos(0, 0));

    host.write(Span::empty(pos(0, 4)), "z");
    snippet
        .apply(&mut host, &[EditCommand::insert(0, 4, "z")])
        .unwrap();
    assert_eq!(host.text(), "ab azb");

    let ts = snippet.tree().find_tabstop(1).unwrap();
    let span = snippet.tree().node(ts).span();
    type_over(&mut host, &mut snippet, span, "xy");
    assert_eq!(host.text(), "xy azb");
}

#[test]
fn transformation_tracks_source() {
    let mut host = MemoryHost::new("");
    let mut snippet = expand(&mut host, r"${1:hello} ${1/(\w+)/\u$1/}", pos(0, 0));
    assert_eq!(host.text(), "hello Hello");

    let ts = snippet.select_next_tab(false).unwrap();
    let span = snippet.tree().node(ts).span();
    type_over(&mut host, &mut snippet, span, "world");
    assert_eq!(host.text(), "world World");
}

#[test]
fn cursor_survives_mirror_growth_before_it() {
    let mut host = MemoryHost::new("");
    let mut snippet = expand(&mut host, "$1 ${1:x}", pos(0, 0));
    assert_eq!(host.text(), "x x");

    host.write(Span::empty(pos(0, 3)), "y");
    host.set_cursor(pos(0, 4));
    snippet
        .apply(&mut host, &[EditCommand::insert(0, 3, "y")])
        .unwrap();

    assert_eq!(host.text(), "xy xy");
    assert_eq!(host.cursor(), pos(0, 5));
}

#[test]
fn visual_and_escapes() {
    let mut host = MemoryHost::new("");
    let ctx = ExpansionContext {
        visual: "sel".into(),
        ..Default::default()
    };
    expand_with(&mut host, r"[${VISUAL}] \$1 \`", pos(0, 0), ctx);
    assert_eq!(host.text(), "[sel] $1 `");
}

#[test]
fn host_expressions_are_evaluated() {
    let mut host = MemoryHost::new("");
    host.define_expr("g:name", "Ann");
    expand(&mut host, "Hi `!v g:name`!", pos(0, 0));
    assert_eq!(host.text(), "Hi Ann!");
}

#[test]
fn shell_output_is_inserted_once() {
    let mut host = MemoryHost::new("");
    let shell = |code: &str| -> Result<String, EvalError> { Ok(format!("<{code}>")) };
    let ctx = ExpansionContext {
        evaluators: Evaluators::new(shell),
        ..Default::default()
    };
    let mut snippet = expand_with(&mut host, "${1:a} `date`", pos(0, 0), ctx);
    assert_eq!(host.text(), "a <date>");

    let ts = snippet.tree().find_tabstop(1).unwrap();
    let span = snippet.tree().node(ts).span();
    type_over(&mut host, &mut snippet, span, "b");
    assert_eq!(host.text(), "b <date>");
}

#[test]
fn scripts_see_tabstops_and_share_bindings() {
    let mut host = MemoryHost::new("");
    let engine = |req: &mut ScriptRequest<'_>| -> Result<String, EvalError> {
        let runs = req
            .bindings
            .get("runs")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        req.bindings.insert("runs".into(), (runs + 1).to_string());
        let upper = req.tabstop(1).to_uppercase();
        req.snip.set_rv(upper);
        Ok(String::new())
    };
    let ctx = ExpansionContext {
        evaluators: Evaluators::default().with_script(engine),
        ..Default::default()
    };
    let template = "${1:abc} `!p snip.rv = t[1].upper()`";
    let mut snippet = expand_with(&mut host, template, pos(0, 0), ctx);
    assert_eq!(host.text(), "abc ABC");

    host.write(Span::empty(pos(0, 3)), "d");
    snippet
        .apply(&mut host, &[EditCommand::insert(0, 3, "d")])
        .unwrap();
    assert_eq!(host.text(), "abcd ABCD");
    assert_eq!(snippet.bindings().get("runs").map(String::as_str), Some("2"));
}

#[test]
fn script_return_value_is_used_without_rv() {
    let mut host = MemoryHost::new("");
    let engine = |req: &mut ScriptRequest<'_>| -> Result<String, EvalError> {
        Ok(format!("{} lines", req.last_match.len()))
    };
    let ctx = ExpansionContext {
        last_match: vec![Some("x".into()), None],
        evaluators: Evaluators::default().with_script(engine),
        ..Default::default()
    };
    expand_with(&mut host, "`!p whatever`", pos(0, 0), ctx);
    assert_eq!(host.text(), "2 lines");
}

#[test]
fn edits_outside_the_snippet_are_rejected() {
    let mut host = MemoryHost::new("before\n");
    let mut snippet = expand(&mut host, "${1:x}", pos(1, 0));
    let err = snippet
        .edited(&[EditCommand::insert(0, 0, "a")])
        .unwrap_err();
    assert!(matches!(err, crate::SnippetError::EditOutsideSnippet { .. }));
}
