//! Lexer: source text to a lossless token stream.
//!
//! Every byte of the input ends up either in a token or in the trivia
//! attached to one. Malformed literals produce a diagnostic and a
//! best-effort token so parsing can carry on.

use dbml_core::{Diagnostic, ErrorCode, LineIndex, Report, Span, unescape};
use tracing::debug;

use crate::token::{Token, TokenKind};

/// Lex `source` into tokens with trivia attached. The last token is EOF.
pub fn lex(source: &str) -> Report<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let flat = lexer.scan_all();
    let tokens = attach_trivia(flat);
    debug!(
        tokens = tokens.len(),
        diagnostics = lexer.diagnostics.len(),
        "lexed source"
    );
    Report::with_diagnostics(tokens, lexer.diagnostics)
}

/// Turn the flat token list into tokens carrying their trivia.
///
/// Trailing trivia runs up to and including the first newline; the rest
/// belongs to the next token as leading trivia.
fn attach_trivia(flat: Vec<Token>) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut leading = Vec::new();
    let mut iter = flat.into_iter().peekable();
    while let Some(mut token) = iter.next() {
        if token.kind.is_trivia() {
            leading.push(token);
            continue;
        }
        token.leading_trivia = std::mem::take(&mut leading);
        if token.kind != TokenKind::Eof {
            while let Some(next) = iter.next_if(|t| t.kind.is_trivia()) {
                let is_newline = next.kind == TokenKind::Newline;
                token.trailing_trivia.push(next);
                if is_newline {
                    break;
                }
            }
        }
        tokens.push(token);
    }
    tokens
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    index: LineIndex,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            index: LineIndex::new(source),
            diagnostics: Vec::new(),
        }
    }

    fn scan_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while self.pos < self.source.len() {
            tokens.push(self.scan_token());
        }
        tokens.push(self.make(TokenKind::Eof, self.pos, String::new()));
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn make(&self, kind: TokenKind, start: usize, value: String) -> Token {
        Token {
            kind,
            value,
            raw: self.source[start..self.pos].to_string(),
            span: Span::new(start, self.pos),
            start: self.index.position(start),
            end: self.index.position(self.pos),
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
            invalid: false,
        }
    }

    fn make_raw(&self, kind: TokenKind, start: usize) -> Token {
        self.make(kind, start, self.source[start..self.pos].to_string())
    }

    fn error(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(code, span, message));
    }

    fn scan_token(&mut self) -> Token {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return self.make(TokenKind::Eof, start, String::new());
        };
        match c {
            '\n' => self.make_raw(TokenKind::Newline, start),
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
                self.make_raw(TokenKind::Newline, start)
            }
            ' ' => {
                self.eat_while(|c| c == ' ');
                self.make_raw(TokenKind::Space, start)
            }
            '\t' => {
                self.eat_while(|c| c == '\t');
                self.make_raw(TokenKind::Tab, start)
            }
            c if c.is_whitespace() => self.make_raw(TokenKind::Space, start),
            '/' if self.peek() == Some('/') => {
                self.eat_while(|c| c != '\n' && c != '\r');
                self.make_raw(TokenKind::LineComment, start)
            }
            '/' if self.peek() == Some('*') => self.block_comment(start),
            ',' => self.make_raw(TokenKind::Comma, start),
            ':' => self.make_raw(TokenKind::Colon, start),
            ';' => self.make_raw(TokenKind::Semicolon, start),
            '(' => self.make_raw(TokenKind::LParen, start),
            ')' => self.make_raw(TokenKind::RParen, start),
            '{' => self.make_raw(TokenKind::LBrace, start),
            '}' => self.make_raw(TokenKind::RBrace, start),
            '[' => self.make_raw(TokenKind::LBracket, start),
            ']' => self.make_raw(TokenKind::RBracket, start),
            '\'' if self.rest().starts_with("''") => self.multiline_string(start),
            '\'' => self.quoted(start, '\'', TokenKind::StringLiteral),
            '"' => self.quoted(start, '"', TokenKind::QuotedIdentifier),
            '`' => self.function_expression(start),
            '#' if self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) => {
                self.eat_while(|c| c.is_ascii_alphanumeric());
                self.make_raw(TokenKind::ColorLiteral, start)
            }
            c if c.is_ascii_digit() => self.number(start),
            c if is_identifier_start(c) => {
                self.eat_while(is_identifier_continue);
                self.make_raw(TokenKind::Identifier, start)
            }
            c => self.operator_or_unknown(start, c),
        }
    }

    fn block_comment(&mut self, start: usize) -> Token {
        self.bump();
        match self.rest().find("*/") {
            Some(offset) => self.pos += offset + 2,
            None => {
                self.pos = self.source.len();
                self.error(
                    ErrorCode::UnterminatedComment,
                    Span::new(start, self.pos),
                    "Unterminated block comment",
                );
            }
        }
        self.make_raw(TokenKind::BlockComment, start)
    }

    /// `'...'` strings and `"..."` quoted identifiers; neither may span lines.
    fn quoted(&mut self, start: usize, quote: char, kind: TokenKind) -> Token {
        let content_start = self.pos;
        let mut terminated = false;
        while let Some(c) = self.peek() {
            match c {
                '\n' | '\r' => break,
                '\\' => {
                    self.bump();
                    if self.peek().is_some_and(|c| c != '\n' && c != '\r') {
                        self.bump();
                    }
                }
                c if c == quote => {
                    terminated = true;
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }
        let content_end = self.pos;
        if terminated {
            self.bump();
        }
        let unescaped = unescape(&self.source[content_start..content_end]);
        for range in &unescaped.invalid {
            self.error(
                ErrorCode::InvalidEscapeSequence,
                Span::new(content_start + range.start, content_start + range.end),
                "Invalid escape sequence",
            );
        }
        let mut token = self.make(kind, start, unescaped.value);
        if !terminated {
            let (code, message) = if kind == TokenKind::QuotedIdentifier {
                (
                    ErrorCode::UnterminatedQuotedIdentifier,
                    "Unterminated quoted identifier",
                )
            } else {
                (ErrorCode::UnterminatedString, "Unterminated string literal")
            };
            self.error(code, token.span, message);
            token.invalid = true;
        }
        token
    }

    fn multiline_string(&mut self, start: usize) -> Token {
        self.bump();
        self.bump();
        let content_start = self.pos;
        let mut content_end = None;
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                self.bump();
            } else if self.rest().starts_with("'''") {
                content_end = Some(self.pos);
                self.pos += 3;
                break;
            } else {
                self.bump();
            }
        }
        let terminated = content_end.is_some();
        let content_end = content_end.unwrap_or(self.source.len());
        let content = &self.source[content_start..content_end];
        let unescaped = unescape(&dedent(&join_continued_lines(content)));
        let mut token = self.make(TokenKind::MultilineString, start, unescaped.value);
        if !unescaped.invalid.is_empty() {
            self.error(
                ErrorCode::InvalidEscapeSequence,
                token.span,
                "Invalid escape sequence in multi-line string",
            );
        }
        if !terminated {
            self.error(
                ErrorCode::UnterminatedMultilineString,
                token.span,
                "Unterminated multi-line string",
            );
            token.invalid = true;
        }
        token
    }

    fn function_expression(&mut self, start: usize) -> Token {
        let content_start = self.pos;
        let (content_end, terminated) = match self.rest().find('`') {
            Some(offset) => {
                self.pos += offset + 1;
                (self.pos - 1, true)
            }
            None => {
                self.pos = self.source.len();
                (self.pos, false)
            }
        };
        let value = self.source[content_start..content_end].to_string();
        let mut token = self.make(TokenKind::FunctionExpression, start, value);
        if !terminated {
            self.error(
                ErrorCode::UnterminatedFunctionExpression,
                token.span,
                "Unterminated function expression",
            );
            token.invalid = true;
        }
        token
    }

    fn number(&mut self, start: usize) -> Token {
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_nth(1), Some('+' | '-')));
            if self.peek_nth(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..=sign {
                    self.bump();
                }
                self.eat_while(|c| c.is_ascii_digit());
            }
        }
        if self.peek().is_some_and(is_identifier_continue) {
            // `2fa_enabled` and the like are names, not numbers.
            self.eat_while(is_identifier_continue);
            return self.make_raw(TokenKind::Identifier, start);
        }
        self.make_raw(TokenKind::NumericLiteral, start)
    }

    fn operator_or_unknown(&mut self, start: usize, c: char) -> Token {
        const PAIRS: [&str; 5] = ["<>", "<=", ">=", "!=", "=="];
        if let Some(next) = self.peek() {
            let mut pair = String::from(c);
            pair.push(next);
            if PAIRS.contains(&pair.as_str()) {
                self.bump();
                return self.make_raw(TokenKind::Operator, start);
            }
        }
        if "<>-+*/%=!.~&|^?".contains(c) {
            return self.make_raw(TokenKind::Operator, start);
        }
        let token = self.make_raw(TokenKind::Unknown, start);
        self.error(
            ErrorCode::UnknownCharacter,
            token.span,
            format!("Unexpected character '{c}'"),
        );
        token
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Remove backslash-newline pairs.
fn join_continued_lines(content: &str) -> String {
    content.replace("\\\r\n", "").replace("\\\n", "")
}

/// Drop a blank first/last line and the indentation shared by all
/// non-blank lines.
fn dedent(content: &str) -> String {
    let mut lines: Vec<&str> = content.split('\n').collect();
    if lines.len() > 1 && lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.len() > 1 && lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start_matches([' ', '\t'])))
        .map(|l| l.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::reconstruct;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).value().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lossless_roundtrip() {
        let sources = [
            "Table users {\n  id int [pk] // primary\n  name varchar(255)\n}\n",
            "/* header */\r\nEnum \"my schema\".status {\n\tactive\n}",
            "Ref: a.b < c.d\n\n\n",
            "Note n { '''\n  multi\n  line\n''' }",
            "Table t { x int [default: `now()`] } @ $",
            "",
            "   ",
        ];
        for source in sources {
            let report = lex(source);
            assert_eq!(reconstruct(report.value()), source, "{source:?}");
        }
    }

    #[test]
    fn test_trailing_trivia_stops_after_newline() {
        let report = lex("a  // c\n  b");
        let tokens = report.value();
        assert_eq!(tokens[0].value, "a");
        let trailing: Vec<_> = tokens[0].trailing_trivia.iter().map(|t| t.kind).collect();
        assert_eq!(
            trailing,
            [TokenKind::Space, TokenKind::LineComment, TokenKind::Newline]
        );
        assert!(tokens[0].has_trailing_newline());
        assert_eq!(tokens[1].leading_trivia.len(), 1);
        assert_eq!(tokens[1].value, "b");
    }

    #[test]
    fn test_token_kinds() {
        assert_eq!(
            kinds("Table \"x y\" 'str' 1.5e3 #fff `f()` <> . ,"),
            [
                TokenKind::Identifier,
                TokenKind::QuotedIdentifier,
                TokenKind::StringLiteral,
                TokenKind::NumericLiteral,
                TokenKind::ColorLiteral,
                TokenKind::FunctionExpression,
                TokenKind::Operator,
                TokenKind::Operator,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_digit_led_identifier() {
        let report = lex("2fa_enabled 42");
        let tokens = report.value();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::NumericLiteral);
    }

    #[test]
    fn test_string_escapes() {
        let report = lex(r"'it\'s\n'");
        assert!(report.errors().is_empty());
        assert_eq!(report.value()[0].value, "it's\n");
    }

    #[test]
    fn test_unterminated_string_is_best_effort() {
        let report = lex("'abc\nTable");
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].code, ErrorCode::UnterminatedString);
        let tokens = report.value();
        assert!(tokens[0].invalid);
        assert_eq!(tokens[0].value, "abc");
        assert_eq!(tokens[1].value, "Table");
    }

    #[test]
    fn test_unterminated_quoted_identifier() {
        let report = lex("\"abc");
        assert_eq!(
            report.errors()[0].code,
            ErrorCode::UnterminatedQuotedIdentifier
        );
    }

    #[test]
    fn test_unterminated_function_expression() {
        let report = lex("`now(");
        assert_eq!(
            report.errors()[0].code,
            ErrorCode::UnterminatedFunctionExpression
        );
        assert_eq!(report.value()[0].value, "now(");
    }

    #[test]
    fn test_unterminated_multiline_string() {
        let report = lex("'''abc");
        assert_eq!(
            report.errors()[0].code,
            ErrorCode::UnterminatedMultilineString
        );
    }

    #[test]
    fn test_multiline_string_dedent() {
        let report = lex("'''\n    first\n      second\n  '''");
        assert_eq!(report.value()[0].value, "first\n  second");
    }

    #[test]
    fn test_invalid_escape_reports_span() {
        let report = lex(r"'a\uZZ'");
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].code, ErrorCode::InvalidEscapeSequence);
        assert_eq!(report.errors()[0].span, Span::new(2, 4));
    }

    #[test]
    fn test_unknown_character_is_trivia() {
        let report = lex("a @ b");
        assert_eq!(report.errors()[0].code, ErrorCode::UnknownCharacter);
        let tokens = report.value();
        assert_eq!(tokens.len(), 3);
        assert!(
            tokens[0]
                .trailing_trivia
                .iter()
                .any(|t| t.kind == TokenKind::Unknown)
        );
    }

    #[test]
    fn test_positions_are_one_based() {
        let report = lex("a\n  b");
        let b = &report.value()[1];
        assert_eq!(b.start, dbml_core::Position::new(2, 3));
    }
}
