//! Enum, Ref, Project, TableGroup and sticky Note elements.

use std::collections::HashSet;

use dbml_core::ErrorCode;
use dbml_syntax::{ElementDeclaration, NodeId, NodeKind};

use super::Validator;
use super::settings::SeenSettings;
use crate::decl::{
    Endpoint, EnumDecl, EnumFieldDecl, NoteDecl, ProjectDecl, RefAction, RefDecl,
    RelationOp, TableGroupDecl,
};
use crate::element::ElementKind;
use crate::symbol::SymbolKind;

/// Settings of a relationship.
#[derive(Default)]
struct RefSettings {
    update: Option<RefAction>,
    delete: Option<RefAction>,
    color: Option<String>,
}

impl Validator<'_> {
    // =========================================================================
    // Enum
    // =========================================================================

    pub(crate) fn enum_(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<EnumDecl> {
        let tree = self.tree;
        let name_node = self.require_name(element, "An Enum")?;
        let name = self.qualified_name(name_node, 2, "enum")?;
        self.forbid_alias(element, "An Enum");
        self.forbid_settings(element, "An Enum");
        let schema = self.schema_scope(&name);
        let symbol = self.define(schema, SymbolKind::Enum, &name.name, id);

        let mut fields = Vec::new();
        for item in self.block_items(id, element, "An Enum") {
            if let NodeKind::ElementDeclaration(nested) = tree.kind(item) {
                self.misplaced(nested, "an Enum");
                continue;
            }
            let (callee, args) = match tree.kind(item) {
                NodeKind::FunctionApplication(app) => (app.callee, app.args.as_slice()),
                _ => (item, &[][..]),
            };
            let field_name = match tree.qualified_name(callee).as_deref() {
                Some([field]) => field.clone(),
                _ => {
                    self.error(
                        ErrorCode::InvalidBody,
                        tree.span(item),
                        "Expected an enum field name",
                    );
                    continue;
                }
            };
            let mut note = None;
            match args {
                [] => {}
                [list] if matches!(tree.kind(*list), NodeKind::ListExpression(_)) => {
                    let mut seen = SeenSettings::default();
                    for setting in self.settings(Some(*list)) {
                        match setting.name.as_str() {
                            "note" => {
                                if self.first_occurrence(&mut seen, &setting) {
                                    note = self.string_setting(&setting);
                                }
                            }
                            _ => self.unknown_setting(&setting, "enum field"),
                        }
                    }
                }
                [extra, ..] => self.error(
                    ErrorCode::InvalidBody,
                    tree.span(*extra),
                    format!("Unexpected input after enum field '{}'", field_name.name),
                ),
            }
            self.define(symbol, SymbolKind::EnumField, &field_name, item);
            fields.push(EnumFieldDecl {
                node: item,
                name: field_name,
                note,
            });
        }

        if fields.is_empty() {
            self.error(
                ErrorCode::EmptyEnum,
                name.span(),
                format!("Enum '{name}' must have at least one field"),
            );
        }

        Some(EnumDecl {
            node: id,
            span: tree.span(id),
            symbol,
            name,
            fields,
        })
    }

    // =========================================================================
    // Ref
    // =========================================================================

    pub(crate) fn ref_(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<RefDecl> {
        let tree = self.tree;
        let name = element.name.and_then(|n| self.simple_name(n, "ref"));
        self.forbid_alias(element, "A Ref");
        if let Some(name) = &name {
            let public = self.symbols.public_schema();
            self.define(public, SymbolKind::Ref, name, id);
        }

        let relationship = if element.colon.is_some() {
            element.body
        } else {
            match tree.body_items(element).as_slice() {
                [item] => Some(*item),
                _ => {
                    self.error(
                        ErrorCode::InvalidBody,
                        tree.span(element.body.unwrap_or(id)),
                        "A Ref must contain exactly one relationship",
                    );
                    return None;
                }
            }
        }?;

        let (infix, trailing) = match tree.kind(relationship) {
            NodeKind::FunctionApplication(app) => (app.callee, app.args.as_slice()),
            _ => (relationship, &[][..]),
        };
        let parts = match tree.kind(infix) {
            NodeKind::InfixExpression(expr) => {
                RelationOp::from_operator(&expr.op.value).map(|op| (expr.left, op, expr.right))
            }
            _ => None,
        };
        let Some((left, op, right)) = parts else {
            self.error(
                ErrorCode::InvalidRelationship,
                tree.span(relationship),
                "Expected a relationship such as `users.id < posts.user_id`",
            );
            return None;
        };
        let left = self.endpoint(left);
        let right = self.endpoint(right);
        let (left, right) = (left?, right?);
        if left.columns.len() != right.columns.len() {
            self.error(
                ErrorCode::InvalidRelationship,
                tree.span(infix),
                "Both sides of a relationship must have the same number of columns",
            );
            return None;
        }

        let mut lists = Vec::new();
        lists.extend(element.attributes);
        for &arg in trailing {
            if matches!(tree.kind(arg), NodeKind::ListExpression(_)) {
                lists.push(arg);
            } else {
                self.error(
                    ErrorCode::InvalidRelationship,
                    tree.span(arg),
                    "Unexpected input after relationship",
                );
            }
        }
        let settings = self.ref_settings(&lists);

        Some(RefDecl {
            node: id,
            span: tree.span(id),
            name,
            left,
            op,
            right,
            update: settings.update,
            delete: settings.delete,
            color: settings.color,
        })
    }

    fn ref_settings(&mut self, lists: &[NodeId]) -> RefSettings {
        let mut result = RefSettings::default();
        let mut seen = SeenSettings::default();
        for &list in lists {
            for setting in self.settings(Some(list)) {
                match setting.name.as_str() {
                    "update" | "delete" => {
                        if !self.first_occurrence(&mut seen, &setting) {
                            continue;
                        }
                        let Some(words) = self.word_setting(&setting) else {
                            continue;
                        };
                        let Some(action) = RefAction::parse(&words) else {
                            self.error(
                                ErrorCode::InvalidSettingValue,
                                setting.span,
                                format!(
                                    "Invalid '{}' action '{words}': expected one of {}",
                                    setting.name,
                                    RefAction::ALLOWED.join(", ")
                                ),
                            );
                            continue;
                        };
                        if setting.name == "update" {
                            result.update = Some(action);
                        } else {
                            result.delete = Some(action);
                        }
                    }
                    "color" => {
                        if self.first_occurrence(&mut seen, &setting) {
                            result.color = self.color_setting(&setting);
                        }
                    }
                    _ => self.unknown_setting(&setting, "ref"),
                }
            }
        }
        result
    }

    /// `table.column`, `schema.table.column`, `table.(a, b)` or
    /// `schema.table.(a, b)`.
    pub(crate) fn endpoint(&mut self, id: NodeId) -> Option<Endpoint> {
        let tree = self.tree;
        let span = tree.span(id);
        let (path, columns) = match tree.kind(id) {
            NodeKind::InfixExpression(infix)
                if infix.op.is_operator(".")
                    && matches!(tree.kind(infix.right), NodeKind::TupleExpression(_)) =>
            {
                let columns = tree
                    .delimited_items(infix.right)
                    .unwrap_or_default()
                    .iter()
                    .map(|&item| match tree.qualified_name(item).as_deref() {
                        Some([column]) => Some(column.clone()),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>();
                (infix.left, Some(columns))
            }
            _ => (id, None),
        };
        let segments = tree.qualified_name(path);
        let endpoint = match (segments, columns) {
            (Some(mut segments), Some(Some(columns)))
                if segments.len() <= 2 && !columns.is_empty() =>
            {
                segments.pop().map(|table| Endpoint {
                    schema: segments.pop(),
                    table,
                    columns,
                    span,
                })
            }
            (Some(mut segments), None) if (2..=3).contains(&segments.len()) => {
                let column = segments.pop();
                let table = segments.pop();
                column.zip(table).map(|(column, table)| Endpoint {
                    schema: segments.pop(),
                    table,
                    columns: vec![column],
                    span,
                })
            }
            _ => None,
        };
        if endpoint.is_none() {
            self.error(
                ErrorCode::InvalidRelationship,
                span,
                "Expected a column reference such as `table.column` or `table.(a, b)`",
            );
        }
        endpoint
    }

    // =========================================================================
    // Project
    // =========================================================================

    pub(crate) fn project(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<ProjectDecl> {
        let tree = self.tree;
        if self.project.is_some() {
            self.error(
                ErrorCode::ProjectRedefined,
                element.keyword.span,
                "A program can contain only one Project",
            );
            return None;
        }
        self.project = Some(id);

        let name = element.name.and_then(|n| self.simple_name(n, "project"));
        self.forbid_alias(element, "A Project");
        let mut decl = ProjectDecl {
            node: id,
            span: tree.span(id),
            name,
            database_type: None,
            note: None,
            properties: Vec::new(),
        };
        let mut seen = SeenSettings::default();
        for setting in self.settings(element.attributes) {
            match setting.name.as_str() {
                "note" => {
                    if self.first_occurrence(&mut seen, &setting) {
                        decl.note = self.string_setting(&setting);
                    }
                }
                _ => self.unknown_setting(&setting, "project"),
            }
        }

        for item in self.block_items(id, element, "A Project") {
            let NodeKind::ElementDeclaration(nested) = tree.kind(item) else {
                self.error(
                    ErrorCode::InvalidBody,
                    tree.span(item),
                    "Expected a `key: 'value'` entry",
                );
                continue;
            };
            let Some(content) = self.nested_note(item, nested) else {
                continue;
            };
            match nested.keyword.value.to_ascii_lowercase().as_str() {
                "note" => decl.note = Some(content),
                "database_type" => decl.database_type = Some(content),
                _ => decl.properties.push((nested.keyword.value.clone(), content)),
            }
        }
        Some(decl)
    }

    // =========================================================================
    // TableGroup
    // =========================================================================

    pub(crate) fn table_group(
        &mut self,
        id: NodeId,
        element: &ElementDeclaration,
    ) -> Option<TableGroupDecl> {
        let tree = self.tree;
        let name_node = self.require_name(element, "A TableGroup")?;
        let name = self.qualified_name(name_node, 2, "table group")?;
        self.forbid_alias(element, "A TableGroup");
        let schema = self.schema_scope(&name);
        let symbol = self.define(schema, SymbolKind::TableGroup, &name.name, id);

        let mut decl = TableGroupDecl {
            node: id,
            span: tree.span(id),
            symbol,
            name,
            members: Vec::new(),
            color: None,
            note: None,
        };
        let mut seen = SeenSettings::default();
        for setting in self.settings(element.attributes) {
            match setting.name.as_str() {
                "color" => {
                    if self.first_occurrence(&mut seen, &setting) {
                        decl.color = self.color_setting(&setting);
                    }
                }
                "note" => {
                    if self.first_occurrence(&mut seen, &setting) {
                        decl.note = self.string_setting(&setting);
                    }
                }
                _ => self.unknown_setting(&setting, "table group"),
            }
        }

        let mut listed = HashSet::new();
        for item in self.block_items(id, element, "A TableGroup") {
            if let NodeKind::ElementDeclaration(nested) = tree.kind(item) {
                if ElementKind::from_keyword(&nested.keyword.value) == ElementKind::Note {
                    decl.note = self.nested_note(item, nested).or(decl.note.take());
                } else {
                    self.misplaced(nested, "a TableGroup");
                }
                continue;
            }
            let Some(member) = self.qualified_name(item, 2, "table") else {
                continue;
            };
            if !listed.insert(member.to_string()) {
                self.error(
                    ErrorCode::DuplicateName,
                    member.span(),
                    format!("Table '{member}' is listed more than once"),
                );
                continue;
            }
            decl.members.push(member);
        }
        Some(decl)
    }

    // =========================================================================
    // Notes
    // =========================================================================

    pub(crate) fn sticky_note(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<NoteDecl> {
        let name_node = self.require_name(element, "A Note")?;
        let name = self.simple_name(name_node, "note")?;
        self.forbid_alias(element, "A Note");
        self.forbid_settings(element, "A Note");
        let public = self.symbols.public_schema();
        let symbol = self.define(public, SymbolKind::Note, &name, id);
        let content = self.nested_note(id, element)?;
        Some(NoteDecl {
            node: id,
            span: self.tree.span(id),
            symbol,
            name,
            content,
        })
    }

    /// String content of `Note: '...'` or `Note { '...' }` (and of any
    /// `key: 'value'` element).
    pub(crate) fn nested_note(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<String> {
        let tree = self.tree;
        let content = match tree.body_items(element).as_slice() {
            [item] => self.string_of(*item),
            _ => None,
        };
        if content.is_none() {
            self.error(
                ErrorCode::InvalidBody,
                element.body.map_or(tree.span(id), |body| tree.span(body)),
                format!("'{}' must contain a single string", element.keyword.value),
            );
        }
        content
    }
}
