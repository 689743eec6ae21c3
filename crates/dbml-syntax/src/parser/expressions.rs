//! Statements, applications and Pratt-style expressions.

use dbml_core::{ErrorCode, Span};

use super::Parser;
use crate::context::ParsingContext;
use crate::cst::{
    Attribute, CallExpression, CommaExpression, Delimited, FunctionApplication, IdentifierStream,
    InfixExpression, NodeId, NodeKind, PrefixExpression,
};
use crate::token::TokenKind;

/// Binding power of a postfix call `f(...)`; lower than `.` so `s.f(x)`
/// calls the qualified name.
const CALL_BP: u8 = 18;

/// Binding power of the operand of a prefix operator.
const PREFIX_BP: u8 = 16;

const PREFIX_OPS: &[&str] = &["-", "+", "<", ">", "<>", "~", "!"];

/// Left and right binding powers of an infix operator.
fn infix_binding_power(op: &str) -> Option<(u8, u8)> {
    let bp = match op {
        "." => (20, 21),
        "*" | "/" | "%" => (12, 13),
        "+" | "-" => (10, 11),
        "<" | ">" | "<=" | ">=" | "<>" => (8, 9),
        "=" | "==" | "!=" => (6, 7),
        _ => return None,
    };
    Some(bp)
}

impl Parser {
    pub(super) fn can_start_expression(&self) -> bool {
        let token = self.current();
        match token.kind {
            TokenKind::Identifier
            | TokenKind::QuotedIdentifier
            | TokenKind::FunctionExpression
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace => true,
            TokenKind::Operator => PREFIX_OPS.contains(&token.value.as_str()),
            kind => kind.is_literal(),
        }
    }

    /// `application (',' application)*` up to the end of the line.
    pub(super) fn statement(&mut self) -> NodeId {
        let first = self.application();
        if !self.at(TokenKind::Comma) || self.after_newline() || self.unwinding() {
            return first;
        }
        let start = self.span_of(first).start;
        let mut items = vec![first];
        let mut partial = false;
        while self.at(TokenKind::Comma) && !self.after_newline() && !self.unwinding() {
            let comma = self.bump();
            if self.after_newline() || !self.can_start_expression() {
                self.error(
                    ErrorCode::ExpectedExpression,
                    Span::empty(comma.span.end),
                    "Expected an expression after ','",
                );
                partial = true;
                break;
            }
            items.push(self.application());
        }
        let span = Span::new(start, self.last_end(start));
        self.alloc(
            NodeKind::CommaExpression(CommaExpression { items }),
            span,
            partial,
        )
    }

    /// `expr expr*` where every argument starts on the callee's line.
    pub(super) fn application(&mut self) -> NodeId {
        let callee = self.expression(0);
        let mut args = Vec::new();
        while !self.after_newline() && !self.unwinding() && self.can_start_expression() {
            args.push(self.expression(0));
        }
        if args.is_empty() {
            return callee;
        }
        let start = self.span_of(callee).start;
        let span = Span::new(start, self.last_end(start));
        let partial = self.unwinding();
        self.alloc(
            NodeKind::FunctionApplication(FunctionApplication { callee, args }),
            span,
            partial,
        )
    }

    pub(super) fn expression(&mut self, min_bp: u8) -> NodeId {
        let mut lhs = self.prefix_or_primary();
        loop {
            if self.unwinding() || self.after_newline() {
                break;
            }
            let token = self.current();
            if token.kind == TokenKind::LParen {
                if CALL_BP < min_bp {
                    break;
                }
                let args = self.tuple();
                let start = self.span_of(lhs).start;
                let span = Span::new(start, self.span_of(args).end);
                let partial = self.is_partial(args);
                lhs = self.alloc(
                    NodeKind::CallExpression(CallExpression { callee: lhs, args }),
                    span,
                    partial,
                );
                continue;
            }
            if token.kind != TokenKind::Operator {
                break;
            }
            let Some((left_bp, right_bp)) = infix_binding_power(&token.value) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            let op = self.bump();
            let right = if self.after_newline() || !self.can_start_expression() {
                self.missing_operand(&op.value)
            } else {
                self.expression(right_bp)
            };
            let start = self.span_of(lhs).start;
            let span = Span::new(start, self.span_of(right).end.max(op.span.end));
            let partial = self.is_partial(right);
            lhs = self.alloc(
                NodeKind::InfixExpression(InfixExpression {
                    op,
                    left: lhs,
                    right,
                }),
                span,
                partial,
            );
        }
        lhs
    }

    fn prefix_or_primary(&mut self) -> NodeId {
        let token = self.current();
        if token.kind == TokenKind::Operator && PREFIX_OPS.contains(&token.value.as_str()) {
            let op = self.bump();
            let operand = if self.after_newline() || !self.can_start_expression() {
                self.missing_operand(&op.value)
            } else {
                self.expression(PREFIX_BP)
            };
            let span = Span::new(op.span.start, self.span_of(operand).end.max(op.span.end));
            let partial = self.is_partial(operand);
            return self.alloc(
                NodeKind::PrefixExpression(PrefixExpression { op, operand }),
                span,
                partial,
            );
        }
        self.primary()
    }

    fn primary(&mut self) -> NodeId {
        let token = self.current();
        match token.kind {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                let token = self.bump();
                let span = token.span;
                self.alloc(NodeKind::Variable(token), span, false)
            }
            TokenKind::FunctionExpression => {
                let token = self.bump();
                let span = token.span;
                self.alloc(NodeKind::FunctionExpression(token), span, false)
            }
            kind if kind.is_literal() => {
                let token = self.bump();
                let span = token.span;
                self.alloc(NodeKind::Literal(token), span, false)
            }
            TokenKind::LParen => self.tuple(),
            TokenKind::LBracket => self.list(),
            TokenKind::LBrace => self.block(),
            _ => {
                let span = token.span;
                self.error(ErrorCode::ExpectedExpression, span, "Expected an expression");
                self.alloc(NodeKind::Dummy, Span::empty(span.start), true)
            }
        }
    }

    fn missing_operand(&mut self, op: &str) -> NodeId {
        let at = self.last_end(0);
        self.error(
            ErrorCode::ExpectedExpression,
            Span::empty(at),
            format!("Expected an operand after '{op}'"),
        );
        self.alloc(NodeKind::Dummy, Span::empty(at), true)
    }

    // =========================================================================
    // Delimited expressions
    // =========================================================================

    /// `[ attribute (',' attribute)* ]`
    pub(super) fn list(&mut self) -> NodeId {
        let open = self.bump();
        let depth = self.contexts.push(ParsingContext::List);
        let mut items = Vec::new();
        let mut close = None;
        let mut partial = false;
        loop {
            if self.at(TokenKind::RBracket) {
                close = Some(self.bump());
                break;
            }
            if self.at(TokenKind::Eof) {
                self.error(
                    ErrorCode::MissingClosingDelimiter,
                    open.span,
                    "Missing closing ']'",
                );
                partial = true;
                break;
            }
            if self.at(TokenKind::Comma) {
                let span = self.current().span;
                self.error(ErrorCode::ExpectedExpression, span, "Expected a setting");
                self.bump();
                continue;
            }
            if !self.can_start_expression() {
                self.unexpected("a setting");
                self.recover(Some(depth));
                if self.abandon(depth) {
                    partial = true;
                    break;
                }
                continue;
            }
            items.push(self.attribute());
            if self.abandon(depth) {
                partial = true;
                break;
            }
            if self.at(TokenKind::Comma) {
                self.bump();
            } else if !self.at(TokenKind::RBracket) && !self.at(TokenKind::Eof) {
                self.unexpected("',' or ']'");
                self.recover(Some(depth));
                if self.abandon(depth) {
                    partial = true;
                    break;
                }
            }
        }
        self.contexts.pop();
        let span = Span::new(open.span.start, self.last_end(open.span.end));
        self.alloc(
            NodeKind::ListExpression(Delimited { open, items, close }),
            span,
            partial,
        )
    }

    /// `( application (',' application)* )`
    pub(super) fn tuple(&mut self) -> NodeId {
        let open = self.bump();
        let depth = self.contexts.push(ParsingContext::Group);
        let mut items = Vec::new();
        let mut close = None;
        let mut partial = false;
        loop {
            if self.at(TokenKind::RParen) {
                close = Some(self.bump());
                break;
            }
            if self.at(TokenKind::Eof) {
                self.error(
                    ErrorCode::MissingClosingDelimiter,
                    open.span,
                    "Missing closing ')'",
                );
                partial = true;
                break;
            }
            if self.at(TokenKind::Comma) {
                let span = self.current().span;
                self.error(ErrorCode::ExpectedExpression, span, "Expected an expression");
                self.bump();
                continue;
            }
            if !self.can_start_expression() {
                self.unexpected("an expression");
                self.recover(Some(depth));
                if self.abandon(depth) {
                    partial = true;
                    break;
                }
                continue;
            }
            items.push(self.group_item());
            if self.abandon(depth) {
                partial = true;
                break;
            }
            if self.at(TokenKind::Comma) {
                self.bump();
            } else if !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                self.unexpected("',' or ')'");
                self.recover(Some(depth));
                if self.abandon(depth) {
                    partial = true;
                    break;
                }
            }
        }
        self.contexts.pop();
        let span = Span::new(open.span.start, self.last_end(open.span.end));
        self.alloc(
            NodeKind::TupleExpression(Delimited { open, items, close }),
            span,
            partial,
        )
    }

    /// Like [`Parser::application`], but a group may span several lines.
    fn group_item(&mut self) -> NodeId {
        let callee = self.expression(0);
        let mut args = Vec::new();
        while !self.unwinding() && self.can_start_expression() {
            args.push(self.expression(0));
        }
        if args.is_empty() {
            return callee;
        }
        let start = self.span_of(callee).start;
        let span = Span::new(start, self.last_end(start));
        let partial = self.unwinding();
        self.alloc(
            NodeKind::FunctionApplication(FunctionApplication { callee, args }),
            span,
            partial,
        )
    }

    /// `identifier+ (':' application)?` or a bare expression.
    fn attribute(&mut self) -> NodeId {
        let start = self.current().span.start;
        let name = if self.at(TokenKind::Identifier) {
            let mut identifiers = vec![self.bump()];
            while self.at(TokenKind::Identifier) && !self.after_newline() {
                identifiers.push(self.bump());
            }
            let span = Span::new(start, self.last_end(start));
            self.alloc(
                NodeKind::IdentifierStream(IdentifierStream { identifiers }),
                span,
                false,
            )
        } else {
            self.expression(0)
        };

        let mut colon = None;
        let mut value = None;
        if !self.unwinding() && self.at(TokenKind::Colon) {
            let token = self.bump();
            if self.can_start_expression() && !self.after_newline() {
                // `delete: set null` is an application of words
                value = Some(self.application());
            } else {
                self.error(
                    ErrorCode::ExpectedExpression,
                    Span::empty(token.span.end),
                    "Expected a value after ':'",
                );
            }
            colon = Some(token);
        }

        let partial = self.unwinding() || value.is_some_and(|v| self.is_partial(v));
        let span = Span::new(start, self.last_end(start));
        self.alloc(
            NodeKind::Attribute(Attribute { name, colon, value }),
            span,
            partial,
        )
    }
}
