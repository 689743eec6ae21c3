//! Reading settings lists and literal values out of the syntax tree.

use std::collections::HashSet;

use dbml_core::{ErrorCode, Span};
use dbml_syntax::{NodeId, NodeKind, TokenKind};

use super::Validator;
use crate::decl::Literal;

/// One `name` or `name: value` item of a `[...]` settings list.
#[derive(Clone, Debug)]
pub(crate) struct Setting {
    /// Lower-cased words joined by single spaces (`not null`).
    pub name: String,
    pub span: Span,
    pub value: Option<NodeId>,
}

/// One `key value` or `key: value` item of a settings block such as a
/// Function or Policy body.
#[derive(Clone, Debug)]
pub(crate) struct BodySetting {
    pub key: String,
    pub key_span: Span,
    pub values: Vec<NodeId>,
    pub span: Span,
}

/// Tracks which non-repeatable settings were already seen.
#[derive(Default)]
pub(crate) struct SeenSettings(HashSet<String>);

impl Validator<'_> {
    // =========================================================================
    // Settings lists
    // =========================================================================

    pub(crate) fn settings(&mut self, list: Option<NodeId>) -> Vec<Setting> {
        let Some(list) = list else {
            return Vec::new();
        };
        let tree = self.tree;
        let mut settings = Vec::new();
        for &item in tree.delimited_items(list).unwrap_or_default() {
            let NodeKind::Attribute(attribute) = tree.kind(item) else {
                continue;
            };
            match tree.kind(attribute.name) {
                NodeKind::IdentifierStream(stream) => settings.push(Setting {
                    name: stream.normalized(),
                    span: tree.span(item),
                    value: attribute.value,
                }),
                _ => self.error(
                    ErrorCode::UnknownSetting,
                    tree.span(attribute.name),
                    "Expected a setting name",
                ),
            }
        }
        settings
    }

    /// Report `setting` when it repeats a non-repeatable one. Returns
    /// whether this is the first occurrence.
    pub(crate) fn first_occurrence(&mut self, seen: &mut SeenSettings, setting: &Setting) -> bool {
        if seen.0.insert(setting.name.clone()) {
            return true;
        }
        self.error(
            ErrorCode::DuplicateSetting,
            setting.span,
            format!("Setting '{}' is specified more than once", setting.name),
        );
        false
    }

    pub(crate) fn unknown_setting(&mut self, setting: &Setting, context: &str) {
        self.error(
            ErrorCode::UnknownSetting,
            setting.span,
            format!("Unknown {context} setting '{}'", setting.name),
        );
    }

    /// A flag such as `pk` must not carry a value.
    pub(crate) fn flag_setting(&mut self, setting: &Setting) -> bool {
        if setting.value.is_some() {
            self.error(
                ErrorCode::InvalidSettingValue,
                setting.span,
                format!("Setting '{}' does not take a value", setting.name),
            );
            return false;
        }
        true
    }

    /// The value node of `setting`, reporting its absence.
    pub(crate) fn setting_value(&mut self, setting: &Setting) -> Option<NodeId> {
        if setting.value.is_none() {
            self.error(
                ErrorCode::InvalidSettingValue,
                setting.span,
                format!("Setting '{}' requires a value", setting.name),
            );
        }
        setting.value
    }

    pub(crate) fn string_setting(&mut self, setting: &Setting) -> Option<String> {
        let value = self.setting_value(setting)?;
        let text = self.string_of(value);
        if text.is_none() {
            self.error(
                ErrorCode::InvalidSettingValue,
                self.tree.span(value),
                format!("Setting '{}' must be a string", setting.name),
            );
        }
        text
    }

    pub(crate) fn color_setting(&mut self, setting: &Setting) -> Option<String> {
        let value = self.setting_value(setting)?;
        let color = self.color_of(value);
        if color.is_none() {
            self.error(
                ErrorCode::InvalidSettingValue,
                self.tree.span(value),
                format!("Setting '{}' must be a color such as #3b82f6", setting.name),
            );
        }
        color
    }

    /// Identifier-like value (`hash`, `set null`) or string.
    pub(crate) fn word_setting(&mut self, setting: &Setting) -> Option<String> {
        let value = self.setting_value(setting)?;
        let word = self.words_of(value).or_else(|| self.string_of(value));
        if word.is_none() {
            self.error(
                ErrorCode::InvalidSettingValue,
                self.tree.span(value),
                format!("Setting '{}' must be an identifier", setting.name),
            );
        }
        word
    }

    // =========================================================================
    // Settings blocks
    // =========================================================================

    /// Read `key value` / `key: value` items of a settings block.
    pub(crate) fn body_settings(&mut self, items: &[NodeId], context: &str) -> Vec<BodySetting> {
        let tree = self.tree;
        let mut settings = Vec::new();
        for &item in items {
            let span = tree.span(item);
            match tree.kind(item) {
                NodeKind::ElementDeclaration(element) => {
                    let values = match element.body {
                        Some(body) if element.colon.is_some() => vec![body],
                        Some(body) => tree.delimited_items(body).unwrap_or_default().to_vec(),
                        None => Vec::new(),
                    };
                    settings.push(BodySetting {
                        key: element.keyword.value.to_ascii_lowercase(),
                        key_span: element.keyword.span,
                        values,
                        span,
                    });
                }
                NodeKind::FunctionApplication(app) => match tree.leaf_token(app.callee) {
                    Some(token) if token.kind == TokenKind::Identifier => {
                        settings.push(BodySetting {
                            key: token.value.to_ascii_lowercase(),
                            key_span: token.span,
                            values: app.args.clone(),
                            span,
                        })
                    }
                    _ => self.error(
                        ErrorCode::InvalidBody,
                        span,
                        format!("Expected a {context} setting"),
                    ),
                },
                _ => self.error(
                    ErrorCode::InvalidBody,
                    span,
                    format!("Expected a {context} setting"),
                ),
            }
        }
        settings
    }

    /// The single value of a block setting.
    pub(crate) fn single_value(&mut self, setting: &BodySetting) -> Option<NodeId> {
        match setting.values.as_slice() {
            [value] => Some(*value),
            [] => {
                self.error(
                    ErrorCode::InvalidFieldValue,
                    setting.span,
                    format!("'{}' requires a value", setting.key),
                );
                None
            }
            [_, extra, ..] => {
                self.error(
                    ErrorCode::InvalidFieldValue,
                    self.tree.span(*extra),
                    format!("'{}' takes a single value", setting.key),
                );
                None
            }
        }
    }

    /// Check a block setting's word value against an allowed set.
    pub(crate) fn enumerated_value(
        &mut self,
        setting: &BodySetting,
        allowed: &[&str],
    ) -> Option<String> {
        let value = self.single_value(setting)?;
        let word = self
            .words_of(value)
            .or_else(|| self.string_of(value))
            .map(|w| w.to_ascii_lowercase());
        match word {
            Some(word) if allowed.contains(&word.as_str()) => Some(word),
            _ => {
                self.error(
                    ErrorCode::InvalidFieldValue,
                    self.tree.span(value),
                    format!(
                        "Invalid value for '{}': expected one of {}",
                        setting.key,
                        allowed.join(", ")
                    ),
                );
                None
            }
        }
    }

    // =========================================================================
    // Value readers
    // =========================================================================

    pub(crate) fn string_of(&self, id: NodeId) -> Option<String> {
        self.tree.string_value(id).map(str::to_owned)
    }

    pub(crate) fn color_of(&self, id: NodeId) -> Option<String> {
        match self.tree.kind(id) {
            NodeKind::Literal(token) if token.kind == TokenKind::ColorLiteral => {
                Some(token.value.clone())
            }
            _ => None,
        }
    }

    /// An identifier, or identifiers applied to each other (`set null`).
    pub(crate) fn words_of(&self, id: NodeId) -> Option<String> {
        match self.tree.kind(id) {
            NodeKind::Variable(token) => Some(token.value.clone()),
            NodeKind::FunctionApplication(app) => {
                let mut words = vec![self.words_of(app.callee)?];
                for &arg in &app.args {
                    words.push(self.words_of(arg)?);
                }
                Some(words.join(" "))
            }
            _ => None,
        }
    }

    /// Backtick expression text.
    pub(crate) fn expression_of(&self, id: NodeId) -> Option<String> {
        match self.tree.kind(id) {
            NodeKind::FunctionExpression(token) => Some(token.value.clone()),
            _ => None,
        }
    }

    /// Literal value: string, number, signed number, `true`, `false`,
    /// `null` or a backtick expression.
    pub(crate) fn literal_of(&self, id: NodeId) -> Option<Literal> {
        match self.tree.kind(id) {
            NodeKind::Literal(token) => match token.kind {
                TokenKind::StringLiteral | TokenKind::MultilineString => {
                    Some(Literal::String(token.value.clone()))
                }
                TokenKind::NumericLiteral => token.value.parse().ok().map(Literal::Number),
                _ => None,
            },
            NodeKind::FunctionExpression(token) => Some(Literal::Expression(token.value.clone())),
            NodeKind::Variable(token) if token.kind == TokenKind::Identifier => {
                match token.value.to_ascii_lowercase().as_str() {
                    "true" => Some(Literal::Boolean(true)),
                    "false" => Some(Literal::Boolean(false)),
                    "null" => Some(Literal::Null),
                    _ => None,
                }
            }
            NodeKind::PrefixExpression(prefix)
                if prefix.op.is_operator("-") || prefix.op.is_operator("+") =>
            {
                match self.literal_of(prefix.operand)? {
                    Literal::Number(n) if prefix.op.is_operator("-") => Some(Literal::Number(-n)),
                    Literal::Number(n) => Some(Literal::Number(n)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Source-like rendering of an expression, for type arguments and the
    /// like.
    pub(crate) fn render(&self, id: NodeId) -> String {
        match self.tree.kind(id) {
            NodeKind::Variable(token)
            | NodeKind::Literal(token)
            | NodeKind::FunctionExpression(token) => token.raw.clone(),
            NodeKind::PrefixExpression(prefix) => {
                format!("{}{}", prefix.op.value, self.render(prefix.operand))
            }
            NodeKind::InfixExpression(infix) if infix.op.is_operator(".") => {
                format!("{}.{}", self.render(infix.left), self.render(infix.right))
            }
            NodeKind::InfixExpression(infix) => format!(
                "{} {} {}",
                self.render(infix.left),
                infix.op.value,
                self.render(infix.right)
            ),
            NodeKind::FunctionApplication(app) => std::iter::once(app.callee)
                .chain(app.args.iter().copied())
                .map(|part| self.render(part))
                .collect::<Vec<_>>()
                .join(" "),
            NodeKind::CallExpression(call) => {
                format!("{}{}", self.render(call.callee), self.render(call.args))
            }
            NodeKind::TupleExpression(d) => format!("({})", self.render_items(&d.items)),
            NodeKind::ListExpression(d) => format!("[{}]", self.render_items(&d.items)),
            NodeKind::BlockExpression(d) => format!("{{{}}}", self.render_items(&d.items)),
            NodeKind::CommaExpression(c) => self.render_items(&c.items),
            NodeKind::Attribute(attribute) => match attribute.value {
                Some(value) => format!("{}: {}", self.render(attribute.name), self.render(value)),
                None => self.render(attribute.name),
            },
            NodeKind::IdentifierStream(stream) => stream
                .identifiers
                .iter()
                .map(|t| t.raw.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            NodeKind::ElementDeclaration(element) => element.keyword.raw.clone(),
            NodeKind::Program(_) | NodeKind::Dummy => String::new(),
        }
    }

    fn render_items(&self, items: &[NodeId]) -> String {
        items
            .iter()
            .map(|&item| self.render(item))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
