use dbml_core::{ErrorCode, Report};
use dbml_syntax::parse_source;
use insta::assert_snapshot;

use super::bind;
use crate::decl::{Decl, InlineCheck};
use crate::model::SemanticModel;
use crate::symbol::SymbolKind;
use crate::validate::validate;

fn bind_str(source: &str) -> Report<SemanticModel> {
    let ((_, tree), _, _) = parse_source(source).into_parts();
    validate(tree).chain(bind)
}

fn codes(report: &Report<SemanticModel>) -> Vec<ErrorCode> {
    report.diagnostics().map(|d| d.code).collect()
}

fn messages(report: &Report<SemanticModel>) -> String {
    report
        .diagnostics()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_ref_endpoints_resolve() {
    let report = bind_str(
        "Table users {\n  id int\n}\n\
         Table posts {\n  user_id int\n}\n\
         Ref: posts.user_id > users.id",
    );
    assert!(codes(&report).is_empty(), "{}", messages(&report));
    let model = report.value();
    let public = model.symbols.public_schema();
    let users = model.symbols.lookup(public, SymbolKind::Table, "users").expect("users");
    let id = model.symbols.lookup_column(users, "id").expect("users.id");
    assert_eq!(model.symbols.get(users).references.len(), 1);
    assert_eq!(model.symbols.get(id).references.len(), 1);

    let Some(Decl::Ref(r)) = model.decls.last() else {
        panic!("expected a ref");
    };
    assert_eq!(model.binding(r.right.table.node), Some(users));
    assert_eq!(model.binding(r.right.columns[0].node), Some(id));
}

#[test]
fn test_undefined_endpoints() {
    let report = bind_str(
        "Table users {\n  id int\n}\n\
         Ref: users.uid < ghosts.id\n\
         Ref: nope.users.id < users.id",
    );
    assert_snapshot!(messages(&report), @r"
    [error] UNDEFINED_REFERENCE: Column 'uid' does not exist in table 'public.users'
    [error] UNDEFINED_REFERENCE: A table named 'ghosts' does not exist
    [error] UNDEFINED_REFERENCE: A table named 'nope.users' does not exist
    ");
}

#[test]
fn test_alias_and_schema_lookup() {
    let report = bind_str(
        "Table auth.users as U {\n  id int\n}\n\
         Table auth.sessions {\n  user_id int [ref: > users.id]\n}\n\
         Table logs {\n  user_id int [ref: > U.id]\n  other int [ref: > auth.users.id]\n}",
    );
    assert!(codes(&report).is_empty(), "{}", messages(&report));
    let model = report.value();
    let auth = model.symbols.schema("auth").expect("auth");
    let users = model.symbols.lookup(auth, SymbolKind::Table, "users").expect("users");
    assert_eq!(model.symbols.get(users).references.len(), 3);
    assert_eq!(model.symbols.get(auth).references.len(), 1);
}

#[test]
fn test_unqualified_name_does_not_see_other_schemas() {
    let report = bind_str("Table auth.users {\n  id int\n}\nRef: users.id < auth.users.id");
    assert_eq!(codes(&report), [ErrorCode::UndefinedReference]);
}

#[test]
fn test_enum_check_reference() {
    let source = "Enum status {\n  active\n}\nTable t {\n  s text [check: status]\n  u text [check: missing]\n}";
    let report = bind_str(source);
    assert_eq!(codes(&report), [ErrorCode::UndefinedReference]);
    assert_snapshot!(messages(&report), @"[error] UNDEFINED_REFERENCE: An enum named 'missing' does not exist");

    let model = report.value();
    let public = model.symbols.public_schema();
    let status = model.symbols.lookup(public, SymbolKind::Enum, "status").expect("enum");
    let references = &model.symbols.get(status).references;
    assert_eq!(references.len(), 1);
    let start = source.find("[check: status]").expect("check") + "[check: ".len();
    assert_eq!(references[0].span.start, start);
    assert_eq!(references[0].span.end, start + "status".len());

    let table = model.tables().next().expect("table");
    let InlineCheck::Enum { path, .. } = &table.columns[0].column.settings.checks[0] else {
        panic!("expected an enum check");
    };
    assert_eq!(model.binding(path[0].node), Some(status));
}

#[test]
fn test_enum_typed_columns() {
    let report = bind_str(
        "Enum s.mood {\n  happy\n}\n\
         Table s.people {\n  mood mood\n  other varchar(10)\n}",
    );
    assert!(codes(&report).is_empty(), "{}", messages(&report));
    let model = report.value();
    let schema = model.symbols.schema("s").expect("schema");
    let mood = model.symbols.lookup(schema, SymbolKind::Enum, "mood").expect("enum");
    assert_eq!(model.symbols.get(mood).references.len(), 1);
}

#[test]
fn test_group_policy_and_records_targets() {
    let report = bind_str(
        "Enum status {\n  active\n}\n\
         Table users {\n  id int\n  state status\n}\n\
         TableGroup g {\n  users\n  ghosts\n}\n\
         Policy p {\n  table: users\n}\n\
         Records users(id, state, age) {\n  1, status.active\n  2, status.gone\n}",
    );
    assert_eq!(
        codes(&report),
        [ErrorCode::UndefinedReference, ErrorCode::UndefinedReference, ErrorCode::UndefinedReference]
    );
    assert_snapshot!(messages(&report), @r"
    [error] UNDEFINED_REFERENCE: A table named 'ghosts' does not exist
    [error] UNDEFINED_REFERENCE: Column 'age' does not exist in table 'public.users'
    [error] UNDEFINED_REFERENCE: Enum 'public.status' has no value 'gone'
    ");
}

#[test]
fn test_partial_columns_resolve() {
    let report = bind_str(
        "TablePartial stamped {\n  owner_id int [ref: > users.id]\n}\n\
         Table users {\n  id int\n}\n\
         Table docs {\n  ~stamped\n}\n\
         Ref: docs.owner_id > users.id",
    );
    assert!(codes(&report).is_empty(), "{}", messages(&report));
    let model = report.value();
    let public = model.symbols.public_schema();
    let stamped = model
        .symbols
        .lookup(public, SymbolKind::TablePartial, "stamped")
        .expect("partial");
    assert_eq!(model.symbols.get(stamped).references.len(), 1);
}
