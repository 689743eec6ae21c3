use dbml_core::{ErrorCode, Report, Span};
use insta::assert_snapshot;

use super::parse;
use crate::cst::{NodeId, NodeKind, SyntaxTree};
use crate::lexer::lex;

fn parse_str(source: &str) -> Report<SyntaxTree> {
    parse(lex(source).into_value())
}

fn join(tree: &SyntaxTree, items: &[NodeId], sep: &str) -> String {
    items
        .iter()
        .map(|&item| dump(tree, item))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Compact s-expression rendering of a subtree.
fn dump(tree: &SyntaxTree, id: NodeId) -> String {
    match tree.kind(id) {
        NodeKind::Program(program) => join(tree, &program.body, "\n"),
        NodeKind::ElementDeclaration(element) => {
            let mut parts = vec![element.keyword.value.clone()];
            if let Some(name) = element.name {
                parts.push(dump(tree, name));
            }
            if let Some(alias) = element.alias {
                parts.push(format!("as {}", dump(tree, alias)));
            }
            if let Some(attributes) = element.attributes {
                parts.push(dump(tree, attributes));
            }
            match (element.colon.is_some(), element.body) {
                (true, Some(body)) => parts.push(format!(": {}", dump(tree, body))),
                (false, Some(body)) => parts.push(dump(tree, body)),
                _ => {}
            }
            format!("({})", parts.join(" "))
        }
        NodeKind::Attribute(attribute) => match attribute.value {
            Some(value) => format!("{}: {}", dump(tree, attribute.name), dump(tree, value)),
            None => dump(tree, attribute.name),
        },
        NodeKind::IdentifierStream(stream) => stream
            .identifiers
            .iter()
            .map(|t| t.value.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        NodeKind::PrefixExpression(prefix) => {
            format!("({} {})", prefix.op.value, dump(tree, prefix.operand))
        }
        NodeKind::InfixExpression(infix) => format!(
            "({} {} {})",
            infix.op.value,
            dump(tree, infix.left),
            dump(tree, infix.right)
        ),
        NodeKind::FunctionApplication(app) => {
            let mut parts = vec!["app".to_string(), dump(tree, app.callee)];
            parts.extend(app.args.iter().map(|&arg| dump(tree, arg)));
            format!("({})", parts.join(" "))
        }
        NodeKind::BlockExpression(block) => format!("{{{}}}", join(tree, &block.items, "; ")),
        NodeKind::ListExpression(list) => format!("[{}]", join(tree, &list.items, ", ")),
        NodeKind::TupleExpression(tuple) => format!("({})", join(tree, &tuple.items, ", ")),
        NodeKind::CallExpression(call) => {
            format!("(call {} {})", dump(tree, call.callee), dump(tree, call.args))
        }
        NodeKind::CommaExpression(comma) => format!("(, {})", join(tree, &comma.items, " ")),
        NodeKind::Variable(token) => token.value.clone(),
        NodeKind::Literal(token) | NodeKind::FunctionExpression(token) => token.raw.clone(),
        NodeKind::Dummy => "<missing>".to_string(),
    }
}

fn dump_program(source: &str) -> String {
    let report = parse_str(source);
    let tree = report.value();
    dump(tree, tree.root())
}

fn error_codes(report: &Report<SyntaxTree>) -> Vec<ErrorCode> {
    report.errors().iter().map(|d| d.code).collect()
}

#[test]
fn test_table_with_columns() {
    let source = "Table users {\n  id int [pk]\n  name varchar(255) [not null, note: 'n']\n}\n";
    assert_snapshot!(
        dump_program(source),
        @"(Table users {(app id int [pk]); (app name (call varchar (255)) [not null, note: 'n'])})"
    );
    assert!(!parse_str(source).has_errors());
}

#[test]
fn test_ref_short_form_with_settings() {
    assert_snapshot!(
        dump_program("Ref: users.id < posts.user_id [delete: cascade]"),
        @"(Ref : (app (< (. users id) (. posts user_id)) [delete: cascade]))"
    );
}

#[test]
fn test_inline_ref_uses_prefix_operator() {
    assert_snapshot!(
        dump_program("Table t {\n  uid int [ref: > u.id]\n}"),
        @"(Table t {(app uid int [ref: (> (. u id))])})"
    );
}

#[test]
fn test_header_alias_and_settings() {
    assert_snapshot!(
        dump_program("Table s.t as T [headercolor: #fff] {}"),
        @"(Table (. s t) as T [headercolor: #fff] {})"
    );
}

#[test]
fn test_nested_elements_in_block() {
    let source = "Table t {\n  Note: 'hi'\n  indexes {\n    (a, b) [pk]\n  }\n}";
    assert_snapshot!(
        dump_program(source),
        @"(Table t {(Note : 'hi'); (indexes {(app (a, b) [pk])})})"
    );
}

#[test]
fn test_records_rows_are_comma_expressions() {
    assert_snapshot!(
        dump_program("Records users(id, name) {\n  1, 'a'\n}"),
        @"(Records (call users (id, name)) {(, 1 'a')})"
    );
}

#[test]
fn test_newline_separates_statements() {
    assert_snapshot!(dump_program("Enum e {\n  a\n  b\n}"), @"(Enum e {a; b})");
}

#[test]
fn test_root_span_covers_whole_source() {
    let source = "  Table t {}\n\n// trailing comment\n";
    let report = parse_str(source);
    let tree = report.value();
    assert_eq!(tree.span(tree.root()), Span::new(0, source.len()));
    assert_eq!(tree.source_len(), source.len());
}

#[test]
fn test_unclosed_list_recovers_at_block_close() {
    let source = "Table t {\n  id int [pk\n}\nTable u {\n  x int\n}";
    let report = parse_str(source);
    assert_eq!(error_codes(&report), vec![ErrorCode::UnexpectedToken]);
    let tree = report.value();
    assert_eq!(tree.elements().len(), 2);
    let partial_lists = tree
        .nodes()
        .filter(|n| matches!(n.kind, NodeKind::ListExpression(_)) && n.partial)
        .count();
    assert_eq!(partial_lists, 1);
    let first = tree.element(tree.elements()[0]).unwrap();
    assert!(!tree.node(first.body.unwrap()).partial);
}

#[test]
fn test_mismatched_closer_resumes_in_outer_list() {
    let report = parse_str("Table t [a: (b, c] {}");
    assert_eq!(error_codes(&report), vec![ErrorCode::UnexpectedToken]);
    let tree = report.value();
    let element = tree.element(tree.elements()[0]).unwrap();
    assert!(element.attributes.is_some());
    assert!(element.body.is_some());
    let partial_tuples = tree
        .nodes()
        .filter(|n| matches!(n.kind, NodeKind::TupleExpression(_)) && n.partial)
        .count();
    assert_eq!(partial_tuples, 1);
}

#[test]
fn test_missing_closing_brace_at_eof() {
    let report = parse_str("Table t {\n  id int\n");
    assert_eq!(error_codes(&report), vec![ErrorCode::MissingClosingDelimiter]);
    let tree = report.value();
    let element = tree.element(tree.elements()[0]).unwrap();
    assert!(tree.node(element.body.unwrap()).partial);
}

#[test]
fn test_stray_closer_in_block_is_skipped() {
    let report = parse_str("Enum e {\n  a )\n  b\n}");
    assert_eq!(error_codes(&report), vec![ErrorCode::UnexpectedToken]);
    let tree = report.value();
    let element = tree.element(tree.elements()[0]).unwrap();
    assert_eq!(tree.body_items(element).len(), 2);
}

#[test]
fn test_stray_tokens_at_top_level() {
    let report = parse_str("]]]");
    assert_eq!(report.errors().len(), 3);
    assert!(report.value().elements().is_empty());
}

#[test]
fn test_stray_comma_in_group() {
    for source in ["Records t(, a) { }", "Table t {\n  x decimal(1,,2)\n}"] {
        let report = parse_str(source);
        assert_eq!(error_codes(&report), vec![ErrorCode::ExpectedExpression], "{source:?}");
        assert_eq!(report.errors()[0].message, "Expected an expression");
        let tree = report.value();
        assert_eq!(tree.elements().len(), 1);
        let span = tree.span(tree.root());
        assert_eq!((span.start, span.end), (0, source.len()));
    }
}

#[test]
fn test_every_open_delimiter_reported_at_eof() {
    let report = parse_str("Table t { [ (");
    assert_eq!(
        error_codes(&report),
        vec![ErrorCode::MissingClosingDelimiter; 3]
    );
}

#[test]
fn test_missing_element_body() {
    let report = parse_str("Table t\nTable u {}");
    assert_eq!(error_codes(&report), vec![ErrorCode::ExpectedElementBody]);
    let tree = report.value();
    assert_eq!(tree.elements().len(), 2);
    assert!(tree.node(tree.elements()[0]).partial);
    assert!(!tree.node(tree.elements()[1]).partial);
}

#[test]
fn test_node_ids_match_arena_positions() {
    let report = parse_str("Table t {\n  id int [pk, ref: > u.id]\n}");
    for (index, node) in report.value().nodes().enumerate() {
        assert_eq!(node.id.raw() as usize, index);
    }
}
