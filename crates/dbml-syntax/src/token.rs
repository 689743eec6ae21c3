//! Tokens produced by the lexer.

use dbml_core::{Position, Span};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum TokenKind {
    #[display("identifier")]
    Identifier,
    #[display("quoted identifier")]
    QuotedIdentifier,
    #[display("number")]
    NumericLiteral,
    #[display("string")]
    StringLiteral,
    #[display("multi-line string")]
    MultilineString,
    #[display("function expression")]
    FunctionExpression,
    #[display("color")]
    ColorLiteral,
    #[display("operator")]
    Operator,
    #[display("','")]
    Comma,
    #[display("':'")]
    Colon,
    #[display("';'")]
    Semicolon,
    #[display("'('")]
    LParen,
    #[display("')'")]
    RParen,
    #[display("'{{'")]
    LBrace,
    #[display("'}}'")]
    RBrace,
    #[display("'['")]
    LBracket,
    #[display("']'")]
    RBracket,
    #[display("space")]
    Space,
    #[display("tab")]
    Tab,
    #[display("newline")]
    Newline,
    #[display("comment")]
    LineComment,
    #[display("comment")]
    BlockComment,
    #[display("unknown character")]
    Unknown,
    #[display("end of file")]
    Eof,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Space
                | TokenKind::Tab
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::Unknown
        )
    }

    /// Tokens that close a list, group or block, or separate their items.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            TokenKind::Comma | TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::NumericLiteral
                | TokenKind::StringLiteral
                | TokenKind::MultilineString
                | TokenKind::ColorLiteral
        )
    }
}

/// A lexed token with its attached trivia. Tokens are immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Processed content: unescaped string body, identifier without quotes.
    pub value: String,
    /// Exact source text of the token.
    pub raw: String,
    pub span: Span,
    pub start: Position,
    pub end: Position,
    pub leading_trivia: Vec<Token>,
    pub trailing_trivia: Vec<Token>,
    /// Set on best-effort tokens recovered from malformed input.
    pub invalid: bool,
}

impl Token {
    /// Whether a newline follows this token before the next real token.
    pub fn has_trailing_newline(&self) -> bool {
        self.trailing_trivia
            .iter()
            .any(|t| t.kind == TokenKind::Newline)
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.value == op
    }

    /// Identifier (not quoted) whose text equals `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.value.eq_ignore_ascii_case(keyword)
    }

    /// Span including leading and trailing trivia.
    pub fn full_span(&self) -> Span {
        let start = self
            .leading_trivia
            .first()
            .map_or(self.span.start, |t| t.span.start);
        let end = self
            .trailing_trivia
            .last()
            .map_or(self.span.end, |t| t.span.end);
        Span::new(start, end)
    }

    /// Write the token back out together with its trivia.
    pub fn write_full(&self, out: &mut String) {
        for trivia in &self.leading_trivia {
            out.push_str(&trivia.raw);
        }
        out.push_str(&self.raw);
        for trivia in &self.trailing_trivia {
            out.push_str(&trivia.raw);
        }
    }
}

/// Rebuild the exact source text from a token stream.
pub fn reconstruct(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.write_full(&mut out);
    }
    out
}
