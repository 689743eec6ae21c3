//! Tables, table partials and their columns, indexes and checks.

use dbml_core::ErrorCode;
use dbml_syntax::{ElementDeclaration, NodeId, NodeKind};

use super::Validator;
use super::settings::SeenSettings;
use crate::decl::{
    CheckDecl, ColumnDecl, ColumnSettings, ColumnType, IndexDecl, IndexPart, InlineCheck,
    InlineRef, PartialInjection, RelationOp, TableDecl, TableField, TablePartialDecl,
};
use crate::element::ElementKind;
use crate::symbol::{SymbolId, SymbolIndex, SymbolKind};

/// Index types accepted by `[type: ...]`.
const INDEX_TYPES: &[&str] = &["btree", "hash"];

/// Everything a Table or TablePartial body declares.
#[derive(Default)]
struct TableBody {
    fields: Vec<TableField>,
    indexes: Vec<IndexDecl>,
    checks: Vec<CheckDecl>,
    note: Option<String>,
}

/// Header settings shared by tables and partials.
#[derive(Default)]
struct TableSettings {
    header_color: Option<String>,
    note: Option<String>,
}

impl Validator<'_> {
    pub(crate) fn table(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<TableDecl> {
        let name_node = self.require_name(element, "A Table")?;
        let name = self.qualified_name(name_node, 2, "table")?;
        let schema = self.schema_scope(&name);
        let symbol = self.define(schema, SymbolKind::Table, &name.name, id);

        let alias = element.alias.and_then(|alias| self.simple_name(alias, "alias"));
        if let Some(alias) = &alias {
            // aliases are unqualified and resolve from the public schema
            let public = self.symbols.public_schema();
            let index = SymbolIndex::new(SymbolKind::Table, alias.name.clone());
            if let Err(existing) = self.symbols.bind(public, index, symbol) {
                let qualified = self.symbols.qualified_name(existing);
                self.error(
                    ErrorCode::DuplicateName,
                    alias.span,
                    format!("Alias '{}' is already used by '{qualified}'", alias.name),
                );
            }
        }

        let settings = self.table_settings(element.attributes, "table");
        let items = self.block_items(id, element, "A Table");
        let body = self.table_body(&items, symbol, "a Table");

        Some(TableDecl {
            node: id,
            span: self.tree.span(id),
            symbol,
            name,
            alias,
            header_color: settings.header_color,
            note: body.note.or(settings.note),
            fields: body.fields,
            indexes: body.indexes,
            checks: body.checks,
            columns: Vec::new(),
        })
    }

    pub(crate) fn table_partial(
        &mut self,
        id: NodeId,
        element: &ElementDeclaration,
    ) -> Option<TablePartialDecl> {
        let name_node = self.require_name(element, "A TablePartial")?;
        let name = self.simple_name(name_node, "table partial")?;
        self.forbid_alias(element, "A TablePartial");
        let public = self.symbols.public_schema();
        let symbol = self.define(public, SymbolKind::TablePartial, &name, id);

        let settings = self.table_settings(element.attributes, "table partial");
        let items = self.block_items(id, element, "A TablePartial");
        let body = self.table_body(&items, symbol, "a TablePartial");

        let mut columns = Vec::new();
        for field in body.fields {
            match field {
                TableField::Column(column) => columns.push(column),
                TableField::Partial(injection) => self.error(
                    ErrorCode::InvalidElementContext,
                    injection.span,
                    "A TablePartial cannot inject other partials",
                ),
            }
        }

        Some(TablePartialDecl {
            node: id,
            span: self.tree.span(id),
            symbol,
            name,
            header_color: settings.header_color,
            note: body.note.or(settings.note),
            columns,
            indexes: body.indexes,
            checks: body.checks,
        })
    }

    fn table_settings(&mut self, list: Option<NodeId>, context: &str) -> TableSettings {
        let mut result = TableSettings::default();
        let mut seen = SeenSettings::default();
        for setting in self.settings(list) {
            match setting.name.as_str() {
                "headercolor" => {
                    if self.first_occurrence(&mut seen, &setting) {
                        result.header_color = self.color_setting(&setting);
                    }
                }
                "note" => {
                    if self.first_occurrence(&mut seen, &setting) {
                        result.note = self.string_setting(&setting);
                    }
                }
                _ => self.unknown_setting(&setting, context),
            }
        }
        result
    }

    fn table_body(&mut self, items: &[NodeId], owner: SymbolId, container: &str) -> TableBody {
        let tree = self.tree;
        let mut body = TableBody::default();
        // `a int, b int` on one line declares two columns
        let items = items.iter().flat_map(|&item| match tree.kind(item) {
            NodeKind::CommaExpression(comma) => comma.items.clone(),
            _ => vec![item],
        });
        for item in items {
            match tree.kind(item) {
                NodeKind::ElementDeclaration(nested) => {
                    match ElementKind::from_keyword(&nested.keyword.value) {
                        ElementKind::Note => body.note = self.nested_note(item, nested),
                        ElementKind::Indexes => {
                            let items = self.block_items(item, nested, "indexes");
                            for index in items {
                                body.indexes.extend(self.index(index));
                            }
                        }
                        ElementKind::Checks => {
                            let items = self.block_items(item, nested, "checks");
                            for check in items {
                                body.checks.extend(self.check(check));
                            }
                        }
                        _ => self.misplaced(nested, container),
                    }
                }
                NodeKind::PrefixExpression(prefix) if prefix.op.is_operator("~") => {
                    match tree.qualified_name(prefix.operand).as_deref() {
                        Some([name]) => body.fields.push(TableField::Partial(PartialInjection {
                            node: item,
                            name: name.clone(),
                            span: tree.span(item),
                        })),
                        _ => self.error(
                            ErrorCode::InvalidName,
                            tree.span(prefix.operand),
                            "Expected a table partial name after '~'",
                        ),
                    }
                }
                _ => {
                    if let Some(column) = self.column(item) {
                        let symbol = self.define(owner, SymbolKind::Column, &column.name, item);
                        self.own_columns.insert(item, symbol);
                        body.fields.push(TableField::Column(column));
                    }
                }
            }
        }
        body
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// `name type [settings]`
    fn column(&mut self, item: NodeId) -> Option<ColumnDecl> {
        let tree = self.tree;
        let (callee, args) = match tree.kind(item) {
            NodeKind::FunctionApplication(app) => (app.callee, app.args.as_slice()),
            _ => (item, &[][..]),
        };
        let name = match tree.qualified_name(callee).as_deref() {
            Some([name]) => name.clone(),
            _ => {
                self.error(
                    ErrorCode::InvalidColumn,
                    tree.span(callee),
                    "Expected a column definition such as `id int [pk]`",
                );
                return None;
            }
        };
        let Some((&type_node, rest)) = args.split_first() else {
            self.error(
                ErrorCode::InvalidColumn,
                name.span,
                format!("Column '{}' must have a type", name.name),
            );
            return None;
        };
        let mut column_type = self.column_type(type_node)?;

        let mut rest = rest;
        if let Some((&first, tail)) = rest.split_first() {
            let empty_list = tree.delimited_items(first).is_some_and(<[NodeId]>::is_empty)
                && matches!(tree.kind(first), NodeKind::ListExpression(_));
            if empty_list && tree.span(first).start == tree.span(type_node).end {
                column_type.array = true;
                column_type.span = column_type.span.cover(tree.span(first));
                rest = tail;
            }
        }

        let mut settings = ColumnSettings::default();
        match rest {
            [] => {}
            [list] if matches!(tree.kind(*list), NodeKind::ListExpression(_)) => {
                settings = self.column_settings(*list);
            }
            [extra, ..] => {
                self.error(
                    ErrorCode::InvalidColumn,
                    tree.span(*extra),
                    format!("Unexpected input after the type of column '{}'", name.name),
                );
            }
        }

        Some(ColumnDecl {
            node: item,
            name,
            column_type,
            settings,
            span: tree.span(item),
        })
    }

    /// `int`, `schema.type`, `varchar(255)`, `decimal(10, 2)`.
    fn column_type(&mut self, id: NodeId) -> Option<ColumnType> {
        let tree = self.tree;
        let (name_node, args) = match tree.kind(id) {
            NodeKind::CallExpression(call) => {
                let args = tree
                    .delimited_items(call.args)
                    .unwrap_or_default()
                    .iter()
                    .map(|&arg| self.render(arg))
                    .collect();
                (call.callee, args)
            }
            _ => (id, Vec::new()),
        };
        match tree.qualified_name(name_node) {
            Some(mut segments) if segments.len() <= 2 => {
                let name = segments.pop()?;
                Some(ColumnType {
                    schema: segments.pop(),
                    name,
                    args,
                    array: false,
                    span: tree.span(id),
                })
            }
            _ => {
                self.error(
                    ErrorCode::InvalidType,
                    tree.span(id),
                    "Expected a column type such as `int` or `varchar(255)`",
                );
                None
            }
        }
    }

    fn column_settings(&mut self, list: NodeId) -> ColumnSettings {
        let mut result = ColumnSettings::default();
        let mut seen = SeenSettings::default();
        for setting in self.settings(Some(list)) {
            match setting.name.as_str() {
                "pk" | "primary key" => {
                    if self.first_occurrence(&mut seen, &setting) && self.flag_setting(&setting) {
                        result.pk = true;
                    }
                }
                "unique" => {
                    if self.first_occurrence(&mut seen, &setting) && self.flag_setting(&setting) {
                        result.unique = true;
                    }
                }
                "increment" => {
                    if self.first_occurrence(&mut seen, &setting) && self.flag_setting(&setting) {
                        result.increment = true;
                    }
                }
                "null" | "not null" => {
                    if !self.first_occurrence(&mut seen, &setting) || !self.flag_setting(&setting) {
                        continue;
                    }
                    let not_null = setting.name == "not null";
                    match result.not_null {
                        Some(previous) if previous != not_null => self.error(
                            ErrorCode::ConflictingSettings,
                            setting.span,
                            "'null' and 'not null' cannot both be set",
                        ),
                        _ => result.not_null = Some(not_null),
                    }
                }
                "default" => {
                    if !self.first_occurrence(&mut seen, &setting) {
                        continue;
                    }
                    let Some(value) = self.setting_value(&setting) else {
                        continue;
                    };
                    result.default = self.literal_of(value);
                    if result.default.is_none() {
                        self.error(
                            ErrorCode::InvalidSettingValue,
                            self.tree.span(value),
                            "A default must be a string, number, boolean, null or `expression`",
                        );
                    }
                }
                "note" => {
                    if self.first_occurrence(&mut seen, &setting) {
                        result.note = self.string_setting(&setting);
                    }
                }
                "ref" => {
                    if let Some(value) = self.setting_value(&setting) {
                        result.refs.extend(self.inline_ref(value));
                    }
                }
                "check" => {
                    if let Some(value) = self.setting_value(&setting) {
                        result.checks.extend(self.inline_check(value));
                    }
                }
                _ => self.unknown_setting(&setting, "column"),
            }
        }
        result
    }

    /// `> table.column`, `- schema.table.column`.
    fn inline_ref(&mut self, value: NodeId) -> Option<InlineRef> {
        let tree = self.tree;
        let target = match tree.kind(value) {
            NodeKind::PrefixExpression(prefix) => RelationOp::from_operator(&prefix.op.value)
                .map(|op| (op, prefix.operand)),
            _ => None,
        };
        let Some((op, operand)) = target else {
            self.error(
                ErrorCode::InvalidRelationship,
                tree.span(value),
                "An inline ref must look like `ref: > table.column`",
            );
            return None;
        };
        let target = self.endpoint(operand)?;
        if target.columns.len() != 1 {
            self.error(
                ErrorCode::InvalidRelationship,
                target.span,
                "An inline ref must target a single column",
            );
            return None;
        }
        Some(InlineRef {
            op,
            target,
            span: tree.span(value),
        })
    }

    /// `` `expression` `` or an enum name.
    fn inline_check(&mut self, value: NodeId) -> Option<InlineCheck> {
        let span = self.tree.span(value);
        if let Some(text) = self.expression_of(value) {
            return Some(InlineCheck::Expression { text, span });
        }
        match self.tree.qualified_name(value) {
            Some(path) if path.len() <= 2 => Some(InlineCheck::Enum { path, span }),
            _ => {
                self.error(
                    ErrorCode::InvalidSettingValue,
                    span,
                    "A check must be an `expression` or an enum name",
                );
                None
            }
        }
    }

    // =========================================================================
    // Indexes and checks
    // =========================================================================

    /// `column`, `` `expression` `` or `(a, b)`, optionally with settings.
    fn index(&mut self, item: NodeId) -> Option<IndexDecl> {
        let tree = self.tree;
        let (target, args) = match tree.kind(item) {
            NodeKind::FunctionApplication(app) => (app.callee, app.args.as_slice()),
            _ => (item, &[][..]),
        };
        let parts = match tree.kind(target) {
            NodeKind::TupleExpression(tuple) => tuple
                .items
                .iter()
                .map(|&part| self.index_part(part))
                .collect::<Option<Vec<_>>>()?,
            _ => vec![self.index_part(target)?],
        };

        let mut index = IndexDecl {
            node: item,
            span: tree.span(item),
            parts,
            pk: false,
            unique: false,
            name: None,
            index_type: None,
            note: None,
        };
        let list = match args {
            [] => None,
            [list] if matches!(tree.kind(*list), NodeKind::ListExpression(_)) => Some(*list),
            [extra, ..] => {
                self.error(
                    ErrorCode::InvalidBody,
                    tree.span(*extra),
                    "Unexpected input in index definition",
                );
                None
            }
        };
        let mut seen = SeenSettings::default();
        for setting in self.settings(list) {
            if !self.first_occurrence(&mut seen, &setting) {
                continue;
            }
            match setting.name.as_str() {
                "pk" => index.pk = self.flag_setting(&setting),
                "unique" => index.unique = self.flag_setting(&setting),
                "name" => index.name = self.string_setting(&setting),
                "note" => index.note = self.string_setting(&setting),
                "type" => {
                    let Some(kind) = self.word_setting(&setting) else {
                        continue;
                    };
                    if INDEX_TYPES.contains(&kind.to_ascii_lowercase().as_str()) {
                        index.index_type = Some(kind.to_ascii_lowercase());
                    } else {
                        self.error(
                            ErrorCode::InvalidSettingValue,
                            setting.span,
                            format!("Index type must be one of {}", INDEX_TYPES.join(", ")),
                        );
                    }
                }
                _ => self.unknown_setting(&setting, "index"),
            }
        }
        Some(index)
    }

    fn index_part(&mut self, id: NodeId) -> Option<IndexPart> {
        if let Some(text) = self.expression_of(id) {
            return Some(IndexPart::Expression(text));
        }
        match self.tree.qualified_name(id).as_deref() {
            Some([column]) => Some(IndexPart::Column(column.clone())),
            _ => {
                self.error(
                    ErrorCode::InvalidBody,
                    self.tree.span(id),
                    "An index part must be a column name or an `expression`",
                );
                None
            }
        }
    }

    /// `` `expression` [name: '...'] ``
    fn check(&mut self, item: NodeId) -> Option<CheckDecl> {
        let tree = self.tree;
        let (target, args) = match tree.kind(item) {
            NodeKind::FunctionApplication(app) => (app.callee, app.args.as_slice()),
            _ => (item, &[][..]),
        };
        let Some(expression) = self.expression_of(target) else {
            self.error(
                ErrorCode::InvalidBody,
                tree.span(target),
                "A check must be an `expression`",
            );
            return None;
        };
        let mut name = None;
        if let [list] = args {
            let mut seen = SeenSettings::default();
            for setting in self.settings(Some(*list)) {
                match setting.name.as_str() {
                    "name" => {
                        if self.first_occurrence(&mut seen, &setting) {
                            name = self.string_setting(&setting);
                        }
                    }
                    _ => self.unknown_setting(&setting, "check"),
                }
            }
        } else if let Some(extra) = args.first() {
            self.error(
                ErrorCode::InvalidBody,
                tree.span(*extra),
                "Unexpected input in check definition",
            );
        }
        Some(CheckDecl {
            node: item,
            span: tree.span(item),
            expression,
            name,
        })
    }
}
