//! Properties of the lexer and parser that hold for any input.

use dbml::Compiler;
use dbml_core::split_qualified_identifier;
use dbml_syntax::reconstruct;

const SAMPLES: &[&str] = &[
    "",
    "Table users as U [headercolor: #fff] {\n  id int [pk, increment] // key\n  name varchar(255) [note: 'it\\'s']\n}\n",
    "/* block */ Enum s.\"order status\" {\n  created\n  'shipped'\n}",
    "Ref: a.(x, y) <> b.(x, y) [delete: set null]\n\n",
    "Note intro {\n  '''\n  multi\n  line\n  '''\n}",
    "Table t { id int [ref: > ",
    "Records t(a, b) {\n  1, 'x'\n  `now()`, null\n",
    "Table { ] ) } ~ # @ 'unterminated",
];

#[test]
fn test_lex_round_trip_is_lossless() {
    for source in SAMPLES {
        let compiler = Compiler::new(*source);
        assert_eq!(reconstruct(&compiler.parse().tokens()), *source);
    }
}

#[test]
fn test_root_span_covers_source() {
    for source in SAMPLES {
        let compiler = Compiler::new(*source);
        let tree = compiler.parse().ast();
        let span = tree.span(tree.root());
        assert_eq!((span.start, span.end), (0, source.len()), "{source:?}");
    }
}

#[test]
fn test_malformed_input_still_compiles() {
    for source in SAMPLES {
        let compiler = Compiler::new(*source);
        // every stage runs to completion and reports instead of failing
        let _ = compiler.diagnostics();
        let _ = compiler.parse().raw_db();
    }
}

#[test]
fn test_split_qualified_identifier() {
    assert_eq!(split_qualified_identifier("schema.table"), ["schema", "table"]);
    assert_eq!(split_qualified_identifier("\"a.b\".c"), ["a.b", "c"]);
}
