//! Records elements: literal rows for a table.

use dbml_core::ErrorCode;
use dbml_syntax::{ElementDeclaration, NodeId, NodeKind};

use super::Validator;
use crate::decl::{Name, RecordsDecl, RowDecl, RowValue, RowValueDecl};

impl Validator<'_> {
    /// `Records users { ... }`, `Records s.users(id, name) { ... }` or
    /// `Records users: 1, 'a'`.
    pub(crate) fn records(&mut self, id: NodeId, element: &ElementDeclaration) -> Option<RecordsDecl> {
        let tree = self.tree;
        let name_node = self.require_name(element, "Records")?;
        let (path, column_list) = match tree.kind(name_node) {
            NodeKind::CallExpression(call) => (call.callee, Some(call.args)),
            _ => (name_node, None),
        };
        let table = self.qualified_name(path, 2, "table")?;
        self.forbid_alias(element, "Records");
        self.forbid_settings(element, "Records");
        let columns = column_list.map(|list| self.record_columns(list));

        let rows = if element.colon.is_some() {
            element.body.into_iter().filter_map(|row| self.row(row)).collect()
        } else {
            let mut rows = Vec::new();
            for item in tree.body_items(element) {
                if let NodeKind::ElementDeclaration(nested) = tree.kind(item) {
                    self.misplaced(nested, "Records");
                    continue;
                }
                rows.extend(self.row(item));
            }
            rows
        };

        Some(RecordsDecl {
            node: id,
            span: tree.span(id),
            table,
            columns,
            rows,
        })
    }

    fn record_columns(&mut self, list: NodeId) -> Vec<Name> {
        let tree = self.tree;
        let mut columns = Vec::new();
        for &item in tree.delimited_items(list).unwrap_or_default() {
            match tree.qualified_name(item).as_deref() {
                Some([column]) => columns.push(column.clone()),
                _ => self.error(
                    ErrorCode::InvalidName,
                    tree.span(item),
                    "Expected a column name",
                ),
            }
        }
        columns
    }

    /// `1, 'a', null` or a single value.
    fn row(&mut self, id: NodeId) -> Option<RowDecl> {
        let tree = self.tree;
        let items = match tree.kind(id) {
            NodeKind::CommaExpression(comma) => comma.items.clone(),
            _ => vec![id],
        };
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let span = tree.span(item);
            match self.row_value(item) {
                Some(value) => values.push(RowValueDecl { value, span }),
                None => {
                    self.error(
                        ErrorCode::InvalidRecordValue,
                        span,
                        "A record value must be a literal, an `expression` or `enum.value`",
                    );
                    return None;
                }
            }
        }
        Some(RowDecl {
            node: id,
            span: tree.span(id),
            values,
        })
    }

    fn row_value(&self, id: NodeId) -> Option<RowValue> {
        if let Some(literal) = self.literal_of(id) {
            return Some(RowValue::Literal(literal));
        }
        match self.tree.qualified_name(id) {
            Some(path) if (2..=3).contains(&path.len()) => Some(RowValue::EnumValue(path)),
            _ => None,
        }
    }
}
