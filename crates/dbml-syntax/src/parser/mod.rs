//! Error-tolerant recursive-descent parser.
//!
//! The parser never gives up: every construct it starts ends up in the tree,
//! marked `partial` when it could not be completed. Delimiter mismatches are
//! resolved through the [`ContextStack`]: the construct that meets a token it
//! cannot use asks the stack which open list, group or block will consume
//! the next terminator, and either resumes there itself or abandons every
//! construct above the handler.

mod expressions;

use dbml_core::{Diagnostic, ErrorCode, Report, Span};
use tracing::debug;

use crate::context::{ContextStack, Handler, ParsingContext};
use crate::cst::{
    Delimited, ElementDeclaration, NodeId, NodeIdGen, NodeKind, Program, SyntaxNode, SyntaxTree,
};
use crate::token::{Token, TokenKind};

/// Parse a token stream (trivia attached, EOF last) into a syntax tree.
pub fn parse(tokens: Vec<Token>) -> Report<SyntaxTree> {
    let mut parser = Parser::new(tokens);
    let tree = parser.parse_program();
    debug!(
        nodes = tree.len(),
        diagnostics = parser.diagnostics.len(),
        "parsed program"
    );
    Report::with_diagnostics(tree, parser.diagnostics)
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nodes: Vec<SyntaxNode>,
    ids: NodeIdGen,
    contexts: ContextStack,
    diagnostics: Vec<Diagnostic>,
    /// Pending recovery target while constructs are being abandoned.
    unwind: Option<Handler>,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.full_span().end);
            tokens.push(eof_token(end));
        }
        Self {
            tokens,
            pos: 0,
            nodes: Vec::new(),
            ids: NodeIdGen::new(),
            contexts: ContextStack::new(),
            diagnostics: Vec::new(),
            unwind: None,
        }
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// The previously consumed token ended its line.
    fn after_newline(&self) -> bool {
        self.pos > 0 && self.tokens[self.pos - 1].has_trailing_newline()
    }

    /// End offset of the last consumed token.
    fn last_end(&self, fallback: usize) -> usize {
        if self.pos == 0 {
            fallback
        } else {
            self.tokens[self.pos - 1].span.end.max(fallback)
        }
    }

    // =========================================================================
    // Node arena and diagnostics
    // =========================================================================

    fn alloc(&mut self, kind: NodeKind, span: Span, partial: bool) -> NodeId {
        let id = self.ids.fresh();
        self.nodes.push(SyntaxNode {
            id,
            kind,
            span,
            parent: None,
            partial,
        });
        id
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.nodes[id.raw() as usize].span
    }

    fn is_partial(&self, id: NodeId) -> bool {
        self.nodes[id.raw() as usize].partial
    }

    fn error(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(code, span, message));
    }

    fn unexpected(&mut self, expected: &str) {
        let token = self.current();
        let (span, message) = (
            token.span,
            format!("Unexpected {}, expected {expected}", describe(token)),
        );
        self.error(ErrorCode::UnexpectedToken, span, message);
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Recover from an unexpected current token inside the construct whose
    /// context sits at `own_depth` (`None` for constructs that do not open a
    /// context).
    ///
    /// A terminator is handed to the open context of matching kind, if any;
    /// any other token makes the parser scan ahead for the first terminator
    /// some open context handles. Without a handler the token is skipped.
    fn recover(&mut self, own_depth: Option<usize>) {
        let at_comma = self.at(TokenKind::Comma);
        let current = self.current();
        let handler = if current.kind.is_terminator() {
            self.contexts.handler_for(current).map(|depth| Handler {
                depth,
                token: self.pos,
            })
        } else {
            self.contexts.find_handler(&self.tokens, self.pos)
        };
        match handler {
            // a separator at the cursor would be handed straight back
            Some(handler)
                if Some(handler.depth) == own_depth && handler.token == self.pos && at_comma =>
            {
                self.bump();
            }
            Some(handler) if Some(handler.depth) == own_depth => self.pos = handler.token,
            Some(handler) => self.unwind = Some(handler),
            None => {
                self.bump();
            }
        }
    }

    /// Whether the construct at `depth` must be abandoned.
    ///
    /// When the pending handler is this construct, recovery completes here:
    /// the cursor moves to the terminator and parsing continues normally.
    fn abandon(&mut self, depth: usize) -> bool {
        match self.unwind {
            Some(handler) if handler.depth < depth => true,
            Some(handler) if handler.depth == depth => {
                self.pos = handler.token;
                self.unwind = None;
                false
            }
            _ => false,
        }
    }

    fn unwinding(&self) -> bool {
        self.unwind.is_some()
    }

    // =========================================================================
    // Program and elements
    // =========================================================================

    fn parse_program(&mut self) -> SyntaxTree {
        let mut body = Vec::new();
        while !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Identifier) {
                body.push(self.element());
            } else {
                self.unexpected("an element declaration");
                self.recover(None);
            }
            // Every context is closed at this level; nothing is left to unwind to.
            self.unwind = None;
        }
        debug_assert!(self.contexts.is_empty());
        let eof = self.current().clone();
        let source_len = eof.full_span().end.max(eof.span.end);
        let root = self.alloc(
            NodeKind::Program(Program { body, eof }),
            Span::new(0, source_len),
            false,
        );
        SyntaxTree::from_parts(std::mem::take(&mut self.nodes), root, source_len)
    }

    /// `keyword name? ('as' alias)? [settings]? (':' statement | { block })`
    fn element(&mut self) -> NodeId {
        let keyword = self.bump();
        let start = keyword.span.start;

        let name = (self.can_start_expression()
            && !self.at(TokenKind::LBrace)
            && !self.at(TokenKind::LBracket)
            && !self.current().is_keyword("as"))
        .then(|| self.expression(0));

        let alias = (!self.unwinding() && self.current().is_keyword("as")).then(|| {
            self.bump();
            self.expression(0)
        });

        let attributes =
            (!self.unwinding() && self.at(TokenKind::LBracket)).then(|| self.list());

        let mut colon = None;
        let body = if self.unwinding() {
            None
        } else if self.at(TokenKind::Colon) {
            colon = Some(self.bump());
            if self.after_newline() || self.at(TokenKind::Eof) {
                self.error(
                    ErrorCode::ExpectedExpression,
                    Span::empty(self.last_end(start)),
                    "Expected an expression after ':'",
                );
                None
            } else {
                Some(self.statement())
            }
        } else if self.at(TokenKind::LBrace) {
            Some(self.block())
        } else {
            let span = self.current().span;
            self.error(
                ErrorCode::ExpectedElementBody,
                span,
                format!("Expected ':' or '{{' after '{}' header", keyword.value),
            );
            None
        };

        let partial = body.is_none() || self.unwinding();
        let span = Span::new(start, self.last_end(start));
        self.alloc(
            NodeKind::ElementDeclaration(ElementDeclaration {
                keyword,
                name,
                alias,
                attributes,
                colon,
                body,
            }),
            span,
            partial,
        )
    }

    /// Whether the block item at the cursor is a nested element such as
    /// `Note: '...'`, `indexes { ... }` or `Note my_note { ... }`.
    fn at_nested_element(&self) -> bool {
        let head = self.current();
        if head.kind != TokenKind::Identifier || head.has_trailing_newline() {
            return false;
        }
        match self.nth(1).kind {
            TokenKind::Colon | TokenKind::LBrace => return true,
            _ => {}
        }
        // keyword followed by a (possibly dotted) name and `{` on the same line
        let mut n = 1;
        loop {
            let token = self.nth(n);
            match token.kind {
                TokenKind::Identifier | TokenKind::QuotedIdentifier => {}
                TokenKind::Operator if token.value == "." => {}
                TokenKind::LBrace => return n > 1,
                _ => return false,
            }
            if token.has_trailing_newline() {
                return false;
            }
            n += 1;
        }
    }

    /// `{ (element | statement)* }`
    fn block(&mut self) -> NodeId {
        let open = self.bump();
        let depth = self.contexts.push(ParsingContext::Block);
        let mut items = Vec::new();
        let mut close = None;
        let mut partial = false;
        loop {
            if self.at(TokenKind::RBrace) {
                close = Some(self.bump());
                break;
            }
            if self.at(TokenKind::Eof) {
                self.error(
                    ErrorCode::MissingClosingDelimiter,
                    open.span,
                    "Missing closing '}'",
                );
                partial = true;
                break;
            }
            if !self.can_start_expression() {
                self.unexpected("a field or setting");
                self.recover(Some(depth));
                if self.abandon(depth) {
                    partial = true;
                    break;
                }
                continue;
            }
            let item = if self.at_nested_element() {
                self.element()
            } else {
                self.statement()
            };
            items.push(item);
            if self.abandon(depth) {
                partial = true;
                break;
            }
        }
        self.contexts.pop();
        let span = Span::new(open.span.start, self.last_end(open.span.end));
        self.alloc(
            NodeKind::BlockExpression(Delimited { open, items, close }),
            span,
            partial,
        )
    }
}

fn eof_token(offset: usize) -> Token {
    let position = dbml_core::Position::default();
    Token {
        kind: TokenKind::Eof,
        value: String::new(),
        raw: String::new(),
        span: Span::empty(offset),
        start: position,
        end: position,
        leading_trivia: Vec::new(),
        trailing_trivia: Vec::new(),
        invalid: false,
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Identifier | TokenKind::Operator => format!("'{}'", token.value),
        kind => kind.to_string(),
    }
}

#[cfg(test)]
mod tests;
