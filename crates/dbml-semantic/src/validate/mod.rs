//! Structural validation: syntax tree to typed declarations.
//!
//! The validator dispatches every top-level element on its [`ElementKind`],
//! checks names, settings and bodies, registers declared symbols, and
//! produces the typed [`Decl`] list. Table partials are injected into the
//! tables that use them once every element has been registered, so later
//! stages see flattened column lists.
//!
//! ## Scopes
//!
//! Schemas hang off the program scope owned by the [`SymbolFactory`];
//! tables, enums, groups, partials, functions, policies and notes live in
//! their schema's scope; columns and enum fields live in their parent's.

mod elements;
mod function;
mod partial;
mod records;
mod settings;
mod table;

use std::collections::HashMap;

use dbml_core::{Diagnostic, ErrorCode, Report, Span};
use dbml_syntax::{ElementDeclaration, NodeId, SyntaxTree};
use tracing::{debug, trace};

use crate::decl::{Decl, Name, QualifiedName};
use crate::element::ElementKind;
use crate::model::SemanticModel;
use crate::symbol::{SymbolFactory, SymbolId, SymbolKind};

/// Validate a parsed program.
pub fn validate(mut tree: SyntaxTree) -> Report<SemanticModel> {
    tree.link_parents();
    let mut validator = Validator::new(&tree);
    validator.validate_program();
    let Validator {
        symbols,
        decls,
        diagnostics,
        ..
    } = validator;
    debug!(
        decls = decls.len(),
        symbols = symbols.len(),
        diagnostics = diagnostics.len(),
        "validated program"
    );
    Report::with_diagnostics(SemanticModel::new(tree, symbols, decls), diagnostics)
}

pub(crate) struct Validator<'t> {
    tree: &'t SyntaxTree,
    symbols: SymbolFactory,
    decls: Vec<Decl>,
    diagnostics: Vec<Diagnostic>,
    /// The first Project element; later ones are redefinitions.
    project: Option<NodeId>,
    /// Symbols of columns declared directly in a table or partial body.
    own_columns: HashMap<NodeId, SymbolId>,
}

impl<'t> Validator<'t> {
    fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            symbols: SymbolFactory::new(),
            decls: Vec::new(),
            diagnostics: Vec::new(),
            project: None,
            own_columns: HashMap::new(),
        }
    }

    fn validate_program(&mut self) {
        let tree = self.tree;
        for &id in tree.elements() {
            let Some(element) = tree.element(id) else {
                continue;
            };
            let kind = ElementKind::from_keyword(&element.keyword.value);
            trace!(%kind, node = %id, "validating element");
            let decl = match kind {
                ElementKind::Table => self.table(id, element).map(Decl::Table),
                ElementKind::TablePartial => self.table_partial(id, element).map(Decl::TablePartial),
                ElementKind::Enum => self.enum_(id, element).map(Decl::Enum),
                ElementKind::Ref => self.ref_(id, element).map(Decl::Ref),
                ElementKind::Project => self.project(id, element).map(Decl::Project),
                ElementKind::TableGroup => self.table_group(id, element).map(Decl::TableGroup),
                ElementKind::Function => self.function(id, element).map(Decl::Function),
                ElementKind::Policy => self.policy(id, element).map(Decl::Policy),
                ElementKind::Records => self.records(id, element).map(Decl::Records),
                ElementKind::Note => self.sticky_note(id, element).map(Decl::Note),
                ElementKind::Indexes | ElementKind::Checks => {
                    self.error(
                        ErrorCode::InvalidElementContext,
                        element.keyword.span,
                        format!("'{}' can only appear inside a Table", element.keyword.value),
                    );
                    None
                }
                ElementKind::Custom => {
                    self.error(
                        ErrorCode::UnknownElementType,
                        element.keyword.span,
                        format!("Unknown element type '{}'", element.keyword.value),
                    );
                    None
                }
            };
            self.decls.extend(decl);
        }
        self.inject_partials();
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn error(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(code, span, message));
    }

    pub(crate) fn warning(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(code, span, message));
    }

    // =========================================================================
    // Element headers
    // =========================================================================

    /// The element's name node, reporting its absence.
    pub(crate) fn require_name(&mut self, element: &ElementDeclaration, what: &str) -> Option<NodeId> {
        if element.name.is_none() {
            self.error(
                ErrorCode::MissingName,
                element.keyword.span,
                format!("{what} must have a name"),
            );
        }
        element.name
    }

    /// Read `name` or `schema.name` (at most `max_segments` parts).
    pub(crate) fn qualified_name(
        &mut self,
        id: NodeId,
        max_segments: usize,
        what: &str,
    ) -> Option<QualifiedName> {
        let Some(mut segments) = self.tree.qualified_name(id) else {
            self.error(
                ErrorCode::InvalidName,
                self.tree.span(id),
                format!("Invalid {what} name"),
            );
            return None;
        };
        if segments.len() > max_segments {
            self.error(
                ErrorCode::InvalidName,
                self.tree.span(id),
                format!("A {what} name can have at most {max_segments} segment(s)"),
            );
            return None;
        }
        let name = segments.pop()?;
        Some(QualifiedName {
            schema: segments.pop(),
            name,
        })
    }

    /// A single-segment name.
    pub(crate) fn simple_name(&mut self, id: NodeId, what: &str) -> Option<Name> {
        self.qualified_name(id, 1, what).map(|q| q.name)
    }

    pub(crate) fn forbid_alias(&mut self, element: &ElementDeclaration, what: &str) {
        if let Some(alias) = element.alias {
            self.error(
                ErrorCode::UnexpectedAlias,
                self.tree.span(alias),
                format!("{what} cannot have an alias"),
            );
        }
    }

    pub(crate) fn forbid_settings(&mut self, element: &ElementDeclaration, what: &str) {
        if let Some(list) = element.attributes {
            self.error(
                ErrorCode::UnknownSetting,
                self.tree.span(list),
                format!("{what} does not take settings"),
            );
        }
    }

    /// Items of a `{ ... }` body. A colon body is reported.
    pub(crate) fn block_items(&mut self, id: NodeId, element: &ElementDeclaration, what: &str) -> Vec<NodeId> {
        if element.colon.is_some() {
            let span = element.body.map_or(self.tree.span(id), |b| self.tree.span(b));
            self.error(
                ErrorCode::InvalidBody,
                span,
                format!("{what} must have a block body"),
            );
            return Vec::new();
        }
        self.tree.body_items(element)
    }

    /// Report a nested element that does not belong in `container`.
    pub(crate) fn misplaced(&mut self, element: &ElementDeclaration, container: &str) {
        self.error(
            ErrorCode::InvalidElementContext,
            element.keyword.span,
            format!("'{}' cannot appear inside {container}", element.keyword.value),
        );
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// Schema scope for a declaration, created on first use.
    pub(crate) fn schema_scope(&mut self, name: &QualifiedName) -> SymbolId {
        match &name.schema {
            Some(schema) => self.symbols.ensure_schema(&schema.name, schema.node),
            None => self.symbols.public_schema(),
        }
    }

    /// Define a symbol, reporting a duplicate. A duplicate still gets a
    /// detached symbol so its declaration can be validated.
    pub(crate) fn define(
        &mut self,
        parent: SymbolId,
        kind: SymbolKind,
        name: &Name,
        declaration: NodeId,
    ) -> SymbolId {
        match self.symbols.define(parent, kind, &name.name, declaration) {
            Ok(id) => id,
            Err(existing) => {
                let qualified = self.symbols.qualified_name(existing);
                self.error(
                    ErrorCode::DuplicateName,
                    name.span,
                    format!("{kind} '{qualified}' is already defined"),
                );
                self.symbols
                    .create(kind, name.name.clone(), Some(declaration), Some(parent))
            }
        }
    }
}
