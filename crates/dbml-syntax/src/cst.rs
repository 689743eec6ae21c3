//! Concrete syntax tree stored as an arena.
//!
//! Nodes are addressed by [`NodeId`]; a node's id is its index in the arena.
//! Children are referenced by id and the parent link is a plain id as well,
//! so the tree never forms an ownership cycle.

use dbml_core::Span;
use serde::{Deserialize, Serialize};

use crate::token::{Token, TokenKind};

/// Unique identifier of a syntax node within one parse.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generator for NodeIds, owned by a single parse.
#[derive(Debug, Default)]
pub struct NodeIdGen(u32);

impl NodeIdGen {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.0);
        self.0 = self.0.checked_add(1).expect("NodeId overflow");
        id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub span: Span,
    /// Filled in by the validator.
    pub parent: Option<NodeId>,
    /// The node did not parse completely (missing closer, skipped tokens).
    pub partial: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Program(Program),
    ElementDeclaration(ElementDeclaration),
    Attribute(Attribute),
    IdentifierStream(IdentifierStream),
    PrefixExpression(PrefixExpression),
    InfixExpression(InfixExpression),
    FunctionApplication(FunctionApplication),
    BlockExpression(Delimited),
    ListExpression(Delimited),
    TupleExpression(Delimited),
    CallExpression(CallExpression),
    CommaExpression(CommaExpression),
    Variable(Token),
    Literal(Token),
    FunctionExpression(Token),
    /// Placeholder synthesized where an expression was expected.
    Dummy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<NodeId>,
    pub eof: Token,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDeclaration {
    pub keyword: Token,
    pub name: Option<NodeId>,
    pub alias: Option<NodeId>,
    pub attributes: Option<NodeId>,
    pub colon: Option<Token>,
    pub body: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// An IdentifierStream, or an arbitrary expression for value-only items.
    pub name: NodeId,
    pub colon: Option<Token>,
    pub value: Option<NodeId>,
}

/// Space-separated identifiers such as `not null` or `primary key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierStream {
    pub identifiers: Vec<Token>,
}

impl IdentifierStream {
    /// Lower-cased words joined by single spaces.
    pub fn normalized(&self) -> String {
        self.identifiers
            .iter()
            .map(|t| t.value.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixExpression {
    pub op: Token,
    pub operand: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfixExpression {
    pub op: Token,
    pub left: NodeId,
    pub right: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionApplication {
    pub callee: NodeId,
    pub args: Vec<NodeId>,
}

/// `{ ... }`, `[ ... ]` or `( ... )` with its items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimited {
    pub open: Token,
    pub items: Vec<NodeId>,
    pub close: Option<Token>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallExpression {
    pub callee: NodeId,
    /// A TupleExpression.
    pub args: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommaExpression {
    pub items: Vec<NodeId>,
}

/// One segment of a dotted name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NameSegment {
    pub name: String,
    pub span: Span,
    pub node: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: NodeId,
    source_len: usize,
}

impl SyntaxTree {
    pub(crate) fn from_parts(nodes: Vec<SyntaxNode>, root: NodeId, source_len: usize) -> Self {
        Self {
            nodes,
            root,
            source_len,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.nodes.iter()
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Top-level element declarations in source order.
    pub fn elements(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::Program(program) => &program.body,
            _ => &[],
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementDeclaration> {
        match self.kind(id) {
            NodeKind::ElementDeclaration(element) => Some(element),
            _ => None,
        }
    }

    /// Items of a block body, or the single colon-body expression.
    pub fn body_items(&self, element: &ElementDeclaration) -> Vec<NodeId> {
        match element.body {
            Some(body) => match self.kind(body) {
                NodeKind::BlockExpression(block) => block.items.clone(),
                _ => vec![body],
            },
            None => Vec::new(),
        }
    }

    /// Items of a `[...]`, `(...)` or `{...}` node.
    pub fn delimited_items(&self, id: NodeId) -> Option<&[NodeId]> {
        match self.kind(id) {
            NodeKind::BlockExpression(d) | NodeKind::ListExpression(d) | NodeKind::TupleExpression(d) => {
                Some(&d.items)
            }
            _ => None,
        }
    }

    /// Children of a node in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Program(p) => p.body.clone(),
            NodeKind::ElementDeclaration(e) => [e.name, e.alias, e.attributes, e.body]
                .into_iter()
                .flatten()
                .collect(),
            NodeKind::Attribute(a) => std::iter::once(a.name).chain(a.value).collect(),
            NodeKind::PrefixExpression(p) => vec![p.operand],
            NodeKind::InfixExpression(i) => vec![i.left, i.right],
            NodeKind::FunctionApplication(f) => {
                std::iter::once(f.callee).chain(f.args.iter().copied()).collect()
            }
            NodeKind::BlockExpression(d) | NodeKind::ListExpression(d) | NodeKind::TupleExpression(d) => {
                d.items.clone()
            }
            NodeKind::CallExpression(c) => vec![c.callee, c.args],
            NodeKind::CommaExpression(c) => c.items.clone(),
            NodeKind::IdentifierStream(_)
            | NodeKind::Variable(_)
            | NodeKind::Literal(_)
            | NodeKind::FunctionExpression(_)
            | NodeKind::Dummy => Vec::new(),
        }
    }

    /// Set every node's parent link. Idempotent.
    pub fn link_parents(&mut self) {
        for index in 0..self.nodes.len() {
            let id = self.nodes[index].id;
            for child in self.children(id) {
                let slot = &mut self.nodes[child.index()].parent;
                debug_assert!(slot.is_none() || *slot == Some(id));
                *slot = Some(id);
            }
        }
    }

    /// The identifier text of a plain or quoted variable.
    pub fn variable_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Variable(token) => Some(&token.value),
            _ => None,
        }
    }

    /// Segments of `a`, `a.b`, `a.b.c` (variables joined by `.`).
    pub fn qualified_name(&self, id: NodeId) -> Option<Vec<NameSegment>> {
        match self.kind(id) {
            NodeKind::Variable(token) => Some(vec![NameSegment {
                name: token.value.clone(),
                span: token.span,
                node: id,
            }]),
            NodeKind::InfixExpression(infix) if infix.op.is_operator(".") => {
                let mut segments = self.qualified_name(infix.left)?;
                segments.extend(self.qualified_name(infix.right)?);
                Some(segments)
            }
            _ => None,
        }
    }

    /// The token of a literal, variable or function expression leaf.
    pub fn leaf_token(&self, id: NodeId) -> Option<&Token> {
        match self.kind(id) {
            NodeKind::Variable(t) | NodeKind::Literal(t) | NodeKind::FunctionExpression(t) => Some(t),
            _ => None,
        }
    }

    /// String literal content (single-line or multi-line).
    pub fn string_value(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Literal(t)
                if matches!(t.kind, TokenKind::StringLiteral | TokenKind::MultilineString) =>
            {
                Some(&t.value)
            }
            _ => None,
        }
    }

    /// Slice of `source` covered by `id`.
    pub fn source_text<'s>(&self, id: NodeId, source: &'s str) -> &'s str {
        let span = self.span(id);
        source.get(span.start..span.end).unwrap_or("")
    }
}

impl std::ops::Index<NodeId> for SyntaxTree {
    type Output = SyntaxNode;

    fn index(&self, id: NodeId) -> &SyntaxNode {
        self.node(id)
    }
}
