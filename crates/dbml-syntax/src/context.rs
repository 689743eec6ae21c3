//! Parsing context stack used for delimiter error recovery.
//!
//! The parser pushes a context whenever it opens a list (`[`), a group
//! (`(`) or a block (`{`). When a construct meets a token it cannot use,
//! [`ContextStack::find_handler`] scans ahead for the first terminator that
//! one of the open contexts is able to consume, so the parser knows which
//! construct should resume.

use crate::token::{Token, TokenKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParsingContext {
    List,
    Group,
    Block,
}

/// Where parsing should resume after an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Handler {
    /// Depth (index into the stack) of the context that handles the
    /// terminator.
    pub depth: usize,
    /// Index of the terminator token.
    pub token: usize,
}

#[derive(Debug, Default)]
pub struct ContextStack {
    stack: Vec<ParsingContext>,
    lists: usize,
    groups: usize,
    blocks: usize,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a context and return its depth.
    pub fn push(&mut self, context: ParsingContext) -> usize {
        *self.counter(context) += 1;
        self.stack.push(context);
        self.stack.len() - 1
    }

    pub fn pop(&mut self) -> Option<ParsingContext> {
        let context = self.stack.pop()?;
        *self.counter(context) -= 1;
        Some(context)
    }

    pub fn top(&self) -> Option<ParsingContext> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of currently open instances of `context`.
    pub fn open_count(&self, context: ParsingContext) -> usize {
        match context {
            ParsingContext::List => self.lists,
            ParsingContext::Group => self.groups,
            ParsingContext::Block => self.blocks,
        }
    }

    fn counter(&mut self, context: ParsingContext) -> &mut usize {
        match context {
            ParsingContext::List => &mut self.lists,
            ParsingContext::Group => &mut self.groups,
            ParsingContext::Block => &mut self.blocks,
        }
    }

    /// Innermost open context accepted by `accepts`.
    fn innermost(&self, accepts: impl Fn(ParsingContext) -> bool) -> Option<usize> {
        self.stack.iter().rposition(|&c| accepts(c))
    }

    /// Which open context can handle `token`, if any.
    ///
    /// A comma belongs to the innermost group or list (never to a block),
    /// `)` only closes a group, `}` only a block and `]` only a list.
    pub fn handler_for(&self, token: &Token) -> Option<usize> {
        match token.kind {
            TokenKind::Comma if self.groups + self.lists > 0 => {
                self.innermost(|c| matches!(c, ParsingContext::Group | ParsingContext::List))
            }
            TokenKind::RParen if self.groups > 0 => self.innermost(|c| c == ParsingContext::Group),
            TokenKind::RBrace if self.blocks > 0 => self.innermost(|c| c == ParsingContext::Block),
            TokenKind::RBracket if self.lists > 0 => self.innermost(|c| c == ParsingContext::List),
            _ => None,
        }
    }

    /// Scan `tokens` from `from` for the first terminator an open context
    /// can handle.
    pub fn find_handler(&self, tokens: &[Token], from: usize) -> Option<Handler> {
        tokens
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(index, token)| {
                self.handler_for(token)
                    .map(|depth| Handler { depth, token: index })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn test_counts_follow_push_pop() {
        let mut stack = ContextStack::new();
        stack.push(ParsingContext::Block);
        stack.push(ParsingContext::List);
        stack.push(ParsingContext::List);
        assert_eq!(stack.open_count(ParsingContext::List), 2);
        assert_eq!(stack.pop(), Some(ParsingContext::List));
        assert_eq!(stack.open_count(ParsingContext::List), 1);
        assert_eq!(stack.top(), Some(ParsingContext::List));
        stack.pop();
        stack.pop();
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_comma_prefers_group_or_list_over_block() {
        let report = lex("x , }");
        let tokens = report.value();
        let mut stack = ContextStack::new();
        stack.push(ParsingContext::Block);
        let list = stack.push(ParsingContext::List);
        stack.push(ParsingContext::Block);
        let handler = stack.find_handler(tokens, 0).unwrap();
        assert_eq!(handler, Handler { depth: list, token: 1 });
    }

    #[test]
    fn test_comma_in_block_only_is_skipped() {
        let report = lex("x , }");
        let tokens = report.value();
        let mut stack = ContextStack::new();
        let block = stack.push(ParsingContext::Block);
        let handler = stack.find_handler(tokens, 0).unwrap();
        assert_eq!(handler, Handler { depth: block, token: 2 });
    }

    #[test]
    fn test_closer_matches_only_its_kind() {
        let report = lex(") ]");
        let tokens = report.value();
        let mut stack = ContextStack::new();
        let list = stack.push(ParsingContext::List);
        assert_eq!(
            stack.find_handler(tokens, 0),
            Some(Handler { depth: list, token: 1 })
        );
    }

    #[test]
    fn test_no_handler() {
        let report = lex("a b c");
        let stack = ContextStack::new();
        assert_eq!(stack.find_handler(report.value(), 0), None);
    }
}
