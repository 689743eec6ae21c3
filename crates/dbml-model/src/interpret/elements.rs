//! Enum, Project, TableGroup, Function, Policy and sticky Note elements.

use dbml_core::ErrorCode;
use dbml_semantic::SymbolKind;
use dbml_semantic::decl::{
    EnumDecl, FunctionDecl, NoteDecl, PolicyDecl, ProjectDecl, QualifiedName, TableGroupDecl,
};

use super::Interpreter;
use crate::model::{
    Enum, EnumValue, Function, FunctionArg, Policy, Project, StickyNote, TableGroup, TableName,
};

const DEFAULT_RETURNS: &str = "void";
const DEFAULT_LANGUAGE: &str = "plpgsql";
const DEFAULT_FUNCTION_BEHAVIOR: &str = "volatile";
const DEFAULT_SECURITY: &str = "invoker";
const DEFAULT_POLICY_BEHAVIOR: &str = "permissive";
const DEFAULT_COMMAND: &str = "all";
const DEFAULT_ROLE: &str = "public";

impl Interpreter<'_> {
    pub(crate) fn enum_(&mut self, decl: &EnumDecl) {
        let values = decl
            .fields
            .iter()
            .map(|field| EnumValue {
                name: field.name.name.clone(),
                note: field.note.clone(),
            })
            .collect();
        self.db.enums.insert(
            decl.node,
            Enum {
                name: decl.name.name.name.clone(),
                schema_name: decl.name.schema_name().to_string(),
                values,
            },
        );
    }

    pub(crate) fn project(&mut self, decl: &ProjectDecl) {
        self.db.project = Some(Project {
            name: decl.name.as_ref().map(|n| n.name.clone()),
            database_type: decl.database_type.clone(),
            note: decl.note.clone(),
            properties: decl.properties.iter().cloned().collect(),
        });
    }

    pub(crate) fn table_group(&mut self, decl: &TableGroupDecl) {
        let group_name = decl.name.to_string();
        let mut tables = Vec::new();
        for member in &decl.members {
            let Some(table) = self.resolved(&member.name, SymbolKind::Table) else {
                continue;
            };
            let table = self.table_name(table);
            if let Some(owner) = self.grouped.get(&table) {
                let message = format!("Table '{table}' already belongs to group '{owner}'");
                self.error(ErrorCode::TableInMultipleGroups, member.span(), message);
                continue;
            }
            self.grouped.insert(table.clone(), group_name.clone());
            tables.push(table);
        }
        self.db.table_groups.insert(
            decl.node,
            TableGroup {
                name: decl.name.name.name.clone(),
                schema_name: decl.name.schema_name().to_string(),
                tables,
                color: decl.color.clone(),
                note: decl.note.clone(),
            },
        );
    }

    pub(crate) fn function(&mut self, decl: &FunctionDecl) {
        let function = Function {
            name: decl.name.name.name.clone(),
            schema_name: decl.name.schema_name().to_string(),
            args: decl
                .args
                .iter()
                .map(|arg| FunctionArg {
                    name: arg.name.name.clone(),
                    type_name: arg.type_name.clone(),
                })
                .collect(),
            returns: or_default(&decl.returns, DEFAULT_RETURNS),
            body: decl.body.clone().unwrap_or_default(),
            language: or_default(&decl.language, DEFAULT_LANGUAGE),
            behavior: or_default(&decl.behavior, DEFAULT_FUNCTION_BEHAVIOR),
            security: or_default(&decl.security, DEFAULT_SECURITY),
            note: decl.note.clone(),
        };
        self.db.functions.insert(decl.node, function);
    }

    pub(crate) fn policy(&mut self, decl: &PolicyDecl) {
        let roles = if decl.roles.is_empty() {
            vec![DEFAULT_ROLE.to_string()]
        } else {
            decl.roles.clone()
        };
        let policy = Policy {
            name: decl.name.name.name.clone(),
            schema_name: decl.name.schema_name().to_string(),
            table: decl.table.as_ref().map(|table| self.table_target(table)),
            behavior: or_default(&decl.behavior, DEFAULT_POLICY_BEHAVIOR),
            command: or_default(&decl.command, DEFAULT_COMMAND),
            roles,
            using: decl.using.clone().flatten(),
            check: decl.check.clone().flatten(),
            note: decl.note.clone(),
        };
        self.db.policies.insert(decl.node, policy);
    }

    /// The resolved table, or the name as written.
    fn table_target(&self, name: &QualifiedName) -> TableName {
        match self.resolved(&name.name, SymbolKind::Table) {
            Some(table) => self.table_name(table),
            None => TableName {
                schema_name: name.schema_name().to_string(),
                table_name: name.name.name.clone(),
            },
        }
    }

    pub(crate) fn note(&mut self, decl: &NoteDecl) {
        self.db.notes.insert(
            decl.node,
            StickyNote {
                name: decl.name.name.clone(),
                content: decl.content.clone(),
            },
        );
    }
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}
