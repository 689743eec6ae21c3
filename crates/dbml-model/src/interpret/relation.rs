//! Relationships declared by `Ref` elements and inline `ref:` settings.

use dbml_core::{ErrorCode, Span};
use dbml_semantic::SymbolKind;
use dbml_semantic::decl::{ColumnDecl, Endpoint, InlineRef, RefDecl, RelationOp};

use super::Interpreter;
use crate::model::{Cardinality, Ref, RefEndpoint, TableName};

/// A relationship's endpoints, independent of their order.
pub(crate) type RefKey = [(TableName, Vec<String>); 2];

fn cardinalities(op: RelationOp) -> (Cardinality, Cardinality) {
    match op {
        RelationOp::OneToMany => (Cardinality::One, Cardinality::Many),
        RelationOp::ManyToOne => (Cardinality::Many, Cardinality::One),
        RelationOp::OneToOne => (Cardinality::One, Cardinality::One),
        RelationOp::ManyToMany => (Cardinality::Many, Cardinality::Many),
    }
}

/// Everything that makes up a relationship besides its endpoints.
struct RefHeader<'d> {
    name: Option<String>,
    decl: Option<&'d RefDecl>,
    span: Span,
}

impl Interpreter<'_> {
    pub(crate) fn ref_(&mut self, decl: &RefDecl) {
        let (Some(left), Some(right)) = (self.endpoint(&decl.left), self.endpoint(&decl.right))
        else {
            return;
        };
        let header = RefHeader {
            name: decl.name.as_ref().map(|n| n.name.clone()),
            decl: Some(decl),
            span: decl.span,
        };
        self.add_ref(header, left, decl.op, right);
    }

    /// `owner.column` relates to the inline ref's target.
    pub(crate) fn inline_ref(&mut self, owner: &TableName, column: &ColumnDecl, inline: &InlineRef) {
        let Some(target) = self.endpoint(&inline.target) else {
            return;
        };
        let source = (owner.clone(), vec![column.name.name.clone()]);
        let header = RefHeader {
            name: None,
            decl: None,
            span: inline.span,
        };
        self.add_ref(header, source, inline.op, target);
    }

    /// The resolved table and columns of an endpoint.
    fn endpoint(&self, endpoint: &Endpoint) -> Option<(TableName, Vec<String>)> {
        let table = self.resolved(&endpoint.table, SymbolKind::Table)?;
        let columns = endpoint
            .columns
            .iter()
            .map(|column| {
                let symbol = self.model.binding(column.node)?;
                let symbol = self.model.symbols.get(symbol);
                symbol.kind.is_column().then(|| symbol.name.clone())
            })
            .collect::<Option<Vec<_>>>()?;
        Some((self.table_name(table), columns))
    }

    fn add_ref(
        &mut self,
        header: RefHeader<'_>,
        left: (TableName, Vec<String>),
        op: RelationOp,
        right: (TableName, Vec<String>),
    ) {
        if left == right {
            self.error(
                ErrorCode::SameEndpoint,
                header.span,
                "Both endpoints of a relationship are the same",
            );
            return;
        }
        let mut key: RefKey = [left.clone(), right.clone()];
        key.sort();
        if !self.ref_keys.insert(key) {
            self.error(
                ErrorCode::DuplicateRef,
                header.span,
                format!(
                    "A relationship between {} and {} already exists",
                    display_side(&left),
                    display_side(&right)
                ),
            );
            return;
        }

        let (left_relation, right_relation) = cardinalities(op);
        let endpoint = |(table, fields): (TableName, Vec<String>), relation| RefEndpoint {
            schema_name: table.schema_name,
            table_name: table.table_name,
            field_names: fields,
            relation,
        };
        self.db.refs.push(Ref {
            name: header.name,
            endpoints: [endpoint(left, left_relation), endpoint(right, right_relation)],
            update: header.decl.and_then(|d| d.update),
            delete: header.decl.and_then(|d| d.delete),
            color: header.decl.and_then(|d| d.color.clone()),
            inline: header.decl.is_none(),
            span: header.span,
        });
    }
}

fn display_side((table, fields): &(TableName, Vec<String>)) -> String {
    match fields.as_slice() {
        [field] => format!("{table}.{field}"),
        fields => format!("{table}.({})", fields.join(", ")),
    }
}
