//! Function and Policy elements. Both have a block body of settings.

use dbml_core::ErrorCode;
use dbml_syntax::{ElementDeclaration, NodeId, NodeKind};

use super::Validator;
use super::settings::BodySetting;
use crate::decl::{FunctionArg, FunctionDecl, PolicyDecl, QualifiedName};
use crate::symbol::SymbolKind;

const LANGUAGES: &[&str] = &["plpgsql", "sql", "c", "internal"];
const FUNCTION_BEHAVIORS: &[&str] = &["volatile", "immutable", "stable"];
const SECURITIES: &[&str] = &["invoker", "definer"];
const POLICY_BEHAVIORS: &[&str] = &["permissive", "restrictive"];
const COMMANDS: &[&str] = &["all", "select", "insert", "update", "delete"];

impl Validator<'_> {
    // =========================================================================
    // Function
    // =========================================================================

    /// `Function name { ... }` or `Function schema.name(arg type, ...) { ... }`.
    pub(crate) fn function(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<FunctionDecl> {
        let tree = self.tree;
        let name_node = self.require_name(element, "A Function")?;
        let (path, arg_list) = match tree.kind(name_node) {
            NodeKind::CallExpression(call) => (call.callee, Some(call.args)),
            _ => (name_node, None),
        };
        let name = self.qualified_name(path, 2, "function")?;
        self.forbid_alias(element, "A Function");
        self.forbid_settings(element, "A Function");
        let schema = self.schema_scope(&name);
        let symbol = self.define(schema, SymbolKind::Function, &name.name, id);

        let args = match arg_list {
            Some(list) => self.function_args(list),
            None => Vec::new(),
        };
        let mut decl = FunctionDecl {
            node: id,
            span: tree.span(id),
            symbol,
            name,
            args,
            returns: None,
            body: None,
            language: None,
            behavior: None,
            security: None,
            note: None,
        };

        let items = self.block_items(id, element, "A Function");
        for setting in self.body_settings(&items, "function") {
            match setting.key.as_str() {
                "returns" => decl.returns = self.type_value(&setting),
                "body" | "as" => decl.body = self.text_value(&setting),
                "language" => decl.language = self.enumerated_value(&setting, LANGUAGES),
                "behavior" => decl.behavior = self.enumerated_value(&setting, FUNCTION_BEHAVIORS),
                "security" => decl.security = self.enumerated_value(&setting, SECURITIES),
                "note" => decl.note = self.note_value(&setting),
                _ => self.unknown_body_setting(&setting, "function"),
            }
        }
        Some(decl)
    }

    fn function_args(&mut self, list: NodeId) -> Vec<FunctionArg> {
        let tree = self.tree;
        let mut args = Vec::new();
        for &item in tree.delimited_items(list).unwrap_or_default() {
            let parsed = match tree.kind(item) {
                NodeKind::FunctionApplication(app) => match app.args.as_slice() {
                    [type_node] => tree
                        .qualified_name(app.callee)
                        .and_then(|segments| match segments.as_slice() {
                            [name] => Some((name.clone(), *type_node)),
                            _ => None,
                        }),
                    _ => None,
                },
                _ => None,
            };
            let Some((name, type_node)) = parsed else {
                self.error(
                    ErrorCode::InvalidFieldValue,
                    tree.span(item),
                    "Expected a function argument such as `user_id int`",
                );
                continue;
            };
            let Some(type_name) = self.type_name_of(type_node) else {
                self.error(
                    ErrorCode::InvalidType,
                    tree.span(type_node),
                    format!("Invalid type for argument '{}'", name.name),
                );
                continue;
            };
            if type_name.eq_ignore_ascii_case("void") {
                self.error(
                    ErrorCode::InvalidType,
                    tree.span(type_node),
                    format!("Argument '{}' cannot have type 'void'", name.name),
                );
                continue;
            }
            args.push(FunctionArg { name, type_name });
        }
        args
    }

    /// `int`, `auth.role`, `varchar(255)` rendered as written.
    fn type_name_of(&self, id: NodeId) -> Option<String> {
        let tree = self.tree;
        let path = match tree.kind(id) {
            NodeKind::CallExpression(call) => call.callee,
            _ => id,
        };
        match tree.qualified_name(path) {
            Some(segments) if segments.len() <= 2 => Some(self.render(id)),
            _ => None,
        }
    }

    fn type_value(&mut self, setting: &BodySetting) -> Option<String> {
        let value = self.single_value(setting)?;
        let type_name = self.type_name_of(value);
        if type_name.is_none() {
            self.error(
                ErrorCode::InvalidType,
                self.tree.span(value),
                format!("'{}' must be a type name", setting.key),
            );
        }
        type_name
    }

    /// A backtick expression or a string.
    fn text_value(&mut self, setting: &BodySetting) -> Option<String> {
        let value = self.single_value(setting)?;
        let text = self.expression_of(value).or_else(|| self.string_of(value));
        if text.is_none() {
            self.error(
                ErrorCode::InvalidFieldValue,
                self.tree.span(value),
                format!("'{}' must be an `expression` or a string", setting.key),
            );
        }
        text
    }

    fn note_value(&mut self, setting: &BodySetting) -> Option<String> {
        let value = self.single_value(setting)?;
        let text = self.string_of(value);
        if text.is_none() {
            self.error(
                ErrorCode::InvalidFieldValue,
                self.tree.span(value),
                "'note' must be a string",
            );
        }
        text
    }

    fn unknown_body_setting(&mut self, setting: &BodySetting, context: &str) {
        self.warning(
            ErrorCode::UnknownSetting,
            setting.key_span,
            format!("Unknown {context} setting '{}' is ignored", setting.key),
        );
    }

    // =========================================================================
    // Policy
    // =========================================================================

    pub(crate) fn policy(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<PolicyDecl> {
        let tree = self.tree;
        let name_node = self.require_name(element, "A Policy")?;
        let name = self.qualified_name(name_node, 2, "policy")?;
        self.forbid_alias(element, "A Policy");
        self.forbid_settings(element, "A Policy");
        let schema = self.schema_scope(&name);
        let symbol = self.define(schema, SymbolKind::Policy, &name.name, id);

        let mut decl = PolicyDecl {
            node: id,
            span: tree.span(id),
            symbol,
            name,
            table: None,
            behavior: None,
            command: None,
            roles: Vec::new(),
            using: None,
            check: None,
            note: None,
        };

        let items = self.block_items(id, element, "A Policy");
        for setting in self.body_settings(&items, "policy") {
            match setting.key.as_str() {
                "table" => decl.table = self.table_value(&setting),
                "behavior" => decl.behavior = self.enumerated_value(&setting, POLICY_BEHAVIORS),
                "command" | "for" => decl.command = self.enumerated_value(&setting, COMMANDS),
                "roles" | "to" => decl.roles = self.roles_value(&setting),
                "using" => decl.using = self.nullable_expression(&setting),
                "check" => decl.check = self.nullable_expression(&setting),
                "note" => decl.note = self.note_value(&setting),
                _ => self.unknown_body_setting(&setting, "policy"),
            }
        }
        Some(decl)
    }

    fn table_value(&mut self, setting: &BodySetting) -> Option<QualifiedName> {
        let value = self.single_value(setting)?;
        self.qualified_name(value, 2, "table")
    }

    /// `roles: anon`, `roles: [anon, authenticated]` or `roles [a, b]`.
    fn roles_value(&mut self, setting: &BodySetting) -> Vec<String> {
        let tree = self.tree;
        let Some(value) = self.single_value(setting) else {
            return Vec::new();
        };
        let items = match tree.kind(value) {
            NodeKind::ListExpression(list) => list.items.clone(),
            _ => vec![value],
        };
        let mut roles = Vec::new();
        for item in items {
            let role = match tree.kind(item) {
                NodeKind::Attribute(attribute) if attribute.value.is_none() => {
                    match tree.kind(attribute.name) {
                        NodeKind::IdentifierStream(stream) if stream.identifiers.len() == 1 => {
                            Some(stream.identifiers[0].value.clone())
                        }
                        _ => tree.variable_name(attribute.name).map(str::to_owned),
                    }
                }
                _ => tree.variable_name(item).map(str::to_owned),
            };
            match role {
                Some(role) => roles.push(role),
                None => self.error(
                    ErrorCode::InvalidFieldValue,
                    tree.span(item),
                    "A role must be an identifier",
                ),
            }
        }
        roles
    }

    /// A backtick expression, or `null` (`Some(None)`).
    fn nullable_expression(&mut self, setting: &BodySetting) -> Option<Option<String>> {
        let value = self.single_value(setting)?;
        if let Some(text) = self.expression_of(value) {
            return Some(Some(text));
        }
        if self
            .tree
            .variable_name(value)
            .is_some_and(|word| word.eq_ignore_ascii_case("null"))
        {
            return Some(None);
        }
        self.error(
            ErrorCode::InvalidFieldValue,
            self.tree.span(value),
            format!("'{}' must be an `expression` or null", setting.key),
        );
        None
    }
}
