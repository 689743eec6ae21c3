//! End-to-end scenarios through the compiler facade.

use dbml::{Compiler, ErrorCode};
use dbml_semantic::SymbolKind;
use insta::assert_snapshot;

fn codes(compiler: &Compiler) -> Vec<ErrorCode> {
    compiler.diagnostics().iter().map(|d| d.code).collect()
}

#[test]
fn test_enum_check_resolves_to_enum() {
    let source = "Enum status {\n  active\n}\nTable users {\n  id int [check: status]\n}";
    let compiler = Compiler::new(source);
    assert!(codes(&compiler).is_empty());

    let model = compiler.parse().semantic_model();
    let symbols = &model.symbols;
    let status = symbols
        .lookup(symbols.public_schema(), SymbolKind::Enum, "status")
        .expect("status enum");
    let references = &symbols.get(status).references;
    assert_eq!(references.len(), 1);
    let span = references[0].span;
    assert_eq!(&source[span.start..span.end], "status");
    assert_eq!(span.start, source.rfind("status").expect("check"));
}

#[test]
fn test_foreign_keys_against_empty_table() {
    let source = "Table users{id integer[primary key]}\n\
                  Table follows{following_user_id integer, followed_user_id integer}\n\
                  Ref: users.id < follows.following_user_id\n\
                  Ref: users.id < follows.followed_user_id\n\
                  Records follows(following_user_id, followed_user_id) {\n\
                  1, 2\n\
                  }";
    let compiler = Compiler::new(source);
    let diagnostics = compiler.diagnostics();
    assert_eq!(
        codes(&compiler),
        [ErrorCode::ForeignKeyViolation, ErrorCode::ForeignKeyViolation]
    );
    assert!(diagnostics.iter().all(|d| d.message.contains("does not exist in")));
    assert_snapshot!(
        diagnostics.iter().map(|d| d.message.as_str()).collect::<Vec<_>>().join("\n"),
        @r"
    Foreign key violation: public.follows.following_user_id = 1 does not exist in public.users.id
    Foreign key violation: public.follows.followed_user_id = 2 does not exist in public.users.id
    "
    );
}

#[test]
fn test_function_language_must_be_known() {
    let compiler = Compiler::new("Function f {\n  language javascript\n}");
    let diagnostics = compiler.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::InvalidFieldValue);
    assert_snapshot!(
        diagnostics[0].message,
        @"Invalid value for 'language': expected one of plpgsql, sql, c, internal"
    );
}

#[test]
fn test_extra_projects_are_reported() {
    let compiler = Compiler::new("Project a {\n}\nProject b {\n}\nProject c {\n}");
    assert_eq!(
        codes(&compiler),
        [ErrorCode::ProjectRedefined, ErrorCode::ProjectRedefined]
    );
    assert_eq!(compiler.diagnostics()[0].start.line, 3);
}

#[test]
fn test_model_of_a_small_schema() {
    let source = "Project blog {\n  database_type: 'PostgreSQL'\n}\n\
                  Enum auth.role {\n  reader\n  writer\n}\n\
                  Table auth.users as U {\n  id int [pk]\n  role auth.role [not null]\n}\n\
                  Table posts {\n  id int [pk]\n  author_id int [ref: > U.id]\n}\n\
                  TableGroup content {\n  posts\n  auth.users\n}";
    let compiler = Compiler::new(source);
    assert!(codes(&compiler).is_empty(), "{:?}", compiler.diagnostics());

    let db = compiler.parse().raw_db();
    let users = db.table("auth", "users").expect("auth.users");
    let role = users.column("role").expect("role");
    assert!(role.column_type.is_enum);
    assert_eq!(role.column_type.schema_name.as_deref(), Some("auth"));
    assert_eq!(db.refs[0].endpoints[1].to_string(), "auth.users.id");
    let group = db.table_groups.values().next().expect("group");
    let members: Vec<_> = group.tables.iter().map(ToString::to_string).collect();
    assert_eq!(members, ["public.posts", "auth.users"]);
}
