use dbml_core::{ErrorCode, Report};
use dbml_semantic::analyze;
use dbml_syntax::parse_source;
use insta::assert_snapshot;

use super::interpret;
use crate::model::{Cardinality, ColumnCheck, IndexColumn, InterpreterDatabase, RefAction, Value};

fn interpret_str(source: &str) -> Report<InterpreterDatabase> {
    let ((_, tree), _, _) = parse_source(source).into_parts();
    analyze(tree).chain(|model| interpret(&model))
}

fn codes(report: &Report<InterpreterDatabase>) -> Vec<ErrorCode> {
    report.diagnostics().map(|d| d.code).collect()
}

fn messages(report: &Report<InterpreterDatabase>) -> String {
    report
        .diagnostics()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_table_model() {
    let report = interpret_str(
        "Enum status { active\n inactive }\n\
         Table users {\n\
         id int [pk, increment]\n\
         state status [not null, default: 'active']\n\
         age int [check: `age > 0`]\n\
         indexes {\n\
         (id, `lower(state)`) [unique, name: 'by_state']\n\
         }\n\
         }",
    );
    assert!(!report.has_errors(), "{}", messages(&report));
    let db = report.value();
    let users = db.table("public", "users").expect("users");
    assert_eq!(users.qualified_name(), "public.users");

    let id = users.column("id").expect("id");
    assert!(id.pk && id.increment && !id.not_null);

    let state = users.column("state").expect("state");
    assert!(state.column_type.is_enum);
    assert_eq!(state.column_type.schema_name.as_deref(), Some("public"));
    assert!(state.not_null);
    assert_eq!(state.default, Some(Value::String("active".into())));

    let age = users.column("age").expect("age");
    assert_eq!(
        age.checks,
        vec![ColumnCheck::Expression {
            expression: "age > 0".into()
        }]
    );

    let index = &users.indexes[0];
    assert!(index.unique);
    assert_eq!(index.name.as_deref(), Some("by_state"));
    assert_eq!(
        index.columns,
        vec![
            IndexColumn::Column("id".into()),
            IndexColumn::Expression("lower(state)".into()),
        ]
    );
}

#[test]
fn test_refs_from_elements_and_settings() {
    let report = interpret_str(
        "Table users { id int [pk] }\n\
         Table posts {\n\
         id int\n\
         author_id int [ref: > users.id]\n\
         }\n\
         Ref fk_posts: posts.id - users.id [delete: cascade, color: #aaa]",
    );
    assert!(!report.has_errors(), "{}", messages(&report));
    let refs = &report.value().refs;
    assert_eq!(refs.len(), 2);

    let inline = &refs[0];
    assert!(inline.inline);
    assert_eq!(inline.endpoints[0].to_string(), "public.posts.author_id");
    assert_eq!(inline.endpoints[0].relation, Cardinality::Many);
    assert_eq!(inline.endpoints[1].relation, Cardinality::One);

    let named = &refs[1];
    assert!(!named.inline);
    assert_eq!(named.name.as_deref(), Some("fk_posts"));
    assert_eq!(named.delete, Some(RefAction::Cascade));
    assert_eq!(named.update, None);
    assert_eq!(named.color.as_deref(), Some("#aaa"));
    assert_eq!(
        (named.endpoints[0].relation, named.endpoints[1].relation),
        (Cardinality::One, Cardinality::One)
    );
}

#[test]
fn test_ref_errors() {
    let report = interpret_str(
        "Table a { id int\n b int }\n\
         Table c { id int }\n\
         Ref: a.id < a.id\n\
         Ref: a.b > c.id\n\
         Ref: c.id < a.b",
    );
    assert_eq!(codes(&report), vec![ErrorCode::SameEndpoint, ErrorCode::DuplicateRef]);
    assert_snapshot!(
        report.errors()[1].message,
        @"A relationship between public.c.id and public.a.b already exists"
    );
    assert_eq!(report.value().refs.len(), 1);
}

#[test]
fn test_composite_ref() {
    let report = interpret_str(
        "Table a { x int\n y int }\n\
         Table b { x int\n y int }\n\
         Ref: a.(x, y) > b.(x, y)",
    );
    assert!(!report.has_errors(), "{}", messages(&report));
    let r = &report.value().refs[0];
    assert_eq!(r.endpoints[0].to_string(), "public.a.(x, y)");
    assert_eq!(r.endpoints[1].field_names, vec!["x", "y"]);
}

#[test]
fn test_partials_in_model() {
    let report = interpret_str(
        "TablePartial stamps [headercolor: #111] {\n\
         created_at timestamp\n\
         }\n\
         Table t {\n\
         id int\n\
         ~stamps\n\
         }",
    );
    assert!(!report.has_errors(), "{}", messages(&report));
    let db = report.value();
    let t = db.table("public", "t").expect("t");
    assert_eq!(t.partials, vec!["stamps"]);
    assert_eq!(t.header_color.as_deref(), Some("#111"));
    let created = t.column("created_at").expect("created_at");
    assert_eq!(created.injected_from.as_deref(), Some("stamps"));
    assert_eq!(db.table_partials.len(), 1);
}

#[test]
fn test_table_groups() {
    let report = interpret_str(
        "Table a { id int }\n\
         Table b { id int }\n\
         TableGroup g1 [color: #abc] { a\n b }\n\
         TableGroup g2 { a }",
    );
    assert_eq!(codes(&report), vec![ErrorCode::TableInMultipleGroups]);
    assert_snapshot!(
        report.errors()[0].message,
        @"Table 'public.a' already belongs to group 'g1'"
    );
    let groups: Vec<_> = report.value().table_groups.values().collect();
    assert_eq!(groups[0].tables.len(), 2);
    assert_eq!(groups[0].color.as_deref(), Some("#abc"));
    assert!(groups[1].tables.is_empty());
}

#[test]
fn test_function_defaults() {
    let report = interpret_str("Function touch {\n body `select 1`\n}");
    assert!(!report.has_errors(), "{}", messages(&report));
    let function = report.value().functions.values().next().expect("function");
    assert_eq!(function.schema_name, "public");
    assert_eq!(function.returns, "void");
    assert_eq!(function.body, "select 1");
    assert_eq!(function.language, "plpgsql");
    assert_eq!(function.behavior, "volatile");
    assert_eq!(function.security, "invoker");
    assert!(function.args.is_empty());
}

#[test]
fn test_policy_defaults() {
    let report = interpret_str(
        "Table users { id int }\n\
         Policy p1 {\n table: users\n using: null\n}",
    );
    assert!(!report.has_errors(), "{}", messages(&report));
    let policy = report.value().policies.values().next().expect("policy");
    assert_eq!(policy.table.as_ref().map(|t| t.to_string()).as_deref(), Some("public.users"));
    assert_eq!(policy.behavior, "permissive");
    assert_eq!(policy.command, "all");
    assert_eq!(policy.roles, vec!["public"]);
    assert_eq!(policy.using, None);
    assert_eq!(policy.check, None);
}

#[test]
fn test_project_and_notes() {
    let report = interpret_str(
        "Project shop {\n database_type: 'PostgreSQL'\n owner: 'data team'\n}\n\
         Note todo {\n 'add audit columns'\n}",
    );
    assert!(!report.has_errors(), "{}", messages(&report));
    let db = report.value();
    let project = db.project.as_ref().expect("project");
    assert_eq!(project.name.as_deref(), Some("shop"));
    assert_eq!(project.database_type.as_deref(), Some("PostgreSQL"));
    assert_eq!(project.properties.get("owner").map(String::as_str), Some("data team"));
    let note = db.notes.values().next().expect("note");
    assert_eq!(note.content, "add audit columns");
}

#[test]
fn test_records_map_columns() {
    let report = interpret_str(
        "Enum status { active }\n\
         Table users { id int\n name text\n state status }\n\
         Records users {\n 1, 'ann', status.active\n}\n\
         Records users(id) {\n 2\n}",
    );
    assert!(!report.has_errors(), "{}", messages(&report));
    let db = report.value();
    assert_eq!(db.records.len(), 1);
    let record = &db.records[0];
    assert_eq!(record.columns, vec!["id", "name", "state"]);
    assert_eq!(record.rows.len(), 2);
    let first = &record.rows[0];
    assert_eq!(first.get("name").map(|c| &c.value), Some(&Value::String("ann".into())));
    assert_eq!(first.get("state").map(|c| &c.value), Some(&Value::String("active".into())));
    let second = &record.rows[1];
    assert_eq!(second.cells.len(), 1);
    assert_eq!(second.get("id").map(|c| &c.value), Some(&Value::Number(2.0)));
}

#[test]
fn test_records_of_outlives_names() {
    let report = interpret_str("Table t { a int }\nRecords t {\n 1\n 2\n}\nTable u { a int }");
    let db = report.value();
    let records: Vec<_> = {
        let schema = String::from("public");
        let table = String::from("t");
        db.records_of(&schema, &table).collect()
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].rows.len(), 2);
    assert_eq!(db.records_of("public", "u").count(), 0);
}

#[test]
fn test_records_arity_keeps_prefix() {
    let report = interpret_str(
        "Table t { a int\n b int }\n\
         Records t(a, b) {\n 1\n 2, 3, 4\n}",
    );
    assert_eq!(
        codes(&report),
        vec![ErrorCode::RecordArityMismatch, ErrorCode::RecordArityMismatch]
    );
    assert_snapshot!(
        report.errors()[0].message,
        @"Row has 1 values but 2 columns are expected"
    );
    let rows = &report.value().records[0].rows;
    assert_eq!(rows[0].cells.len(), 1);
    assert_eq!(rows[1].cells.len(), 2);
}

#[test]
fn test_records_duplicate_column() {
    let report = interpret_str("Table t { a int }\nRecords t(a, a) {\n 1, 2\n}");
    assert_eq!(codes(&report), vec![ErrorCode::MalformedElement]);
    assert!(report.value().records.is_empty());
}

#[test]
fn test_unresolved_names_are_skipped() {
    let report = interpret_str("Table t { id int [ref: > missing.id] }\nRecords nowhere {\n 1\n}");
    assert_eq!(
        codes(&report),
        vec![ErrorCode::UndefinedReference, ErrorCode::UndefinedReference]
    );
    let db = report.value();
    assert!(db.refs.is_empty());
    assert!(db.records.is_empty());
}

#[test]
fn test_model_serializes() {
    let report = interpret_str("Table t { id int [pk] }");
    let json = serde_json::to_value(report.value()).expect("serialize");
    assert_eq!(json["tables"].as_object().map(|t| t.len()), Some(1));
    let column = &json["tables"].as_object().expect("tables").values().next().expect("t")["columns"][0];
    assert_eq!(column["name"], "id");
    assert_eq!(column["type"]["type_name"], "int");
    assert_eq!(column["pk"], true);
}
