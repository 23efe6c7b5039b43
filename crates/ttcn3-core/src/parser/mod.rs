mod block;
mod definition;

#[cfg(test)]
mod tests;

use crate::ast::{ErrorNode, Ident, SourceFile, Spanned, TopLevel};
use crate::diagnostics::{Diagnostic, DiagnosticHandler, DiagnosticLevel};
use crate::lexer::{Token, TokenKind};
use crate::span::Span;
use std::sync::Arc;

pub use block::BlockParser;
pub use definition::DefinitionParser;

#[derive(Debug, Clone)]
pub struct ParserError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {}", self.message, self.span.line)
    }
}

impl std::error::Error for ParserError {}

/// Recursive-descent parser for the structural subset of TTCN-3.
///
/// `parse` always produces a tree. Every syntax error is reported exactly
/// once to the diagnostic handler, after which the parser skips to the next
/// point it can resume from and leaves an error node in place of the
/// skipped tokens.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
    trace: bool,
    /// Token position at which a missing closing brace was last reported.
    /// Enclosing constructs stopping at the same token stay silent.
    unclosed_at: Option<usize>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, diagnostic_handler: Arc<dyn DiagnosticHandler>) -> Self {
        let mut tokens = tokens;
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token::new(TokenKind::Eof, Span::new(end, end, 1, 1)));
        }
        Parser {
            tokens,
            position: 0,
            diagnostic_handler,
            trace: false,
            unclosed_at: None,
        }
    }

    /// Emit a trace event for every definition the parser enters.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn parse(&mut self) -> SourceFile {
        let mut items = Vec::new();

        while !self.is_at_end() {
            let start_position = self.position;
            let start_span = self.current_span();

            if self.check(&TokenKind::Module) {
                match self.parse_module() {
                    Ok(module) => {
                        items.push(TopLevel::Module(module));
                        continue;
                    }
                    Err(e) => self.report_error(&e.message, e.span),
                }
            } else {
                let message = format!("expected 'module', found {}", self.current().kind);
                self.report_error(&message, start_span);
            }

            // Error recovery: skip to the next module keyword
            if self.position == start_position {
                self.advance();
            }
            while !self.is_at_end() && !self.check(&TokenKind::Module) {
                self.advance();
            }
            let span = start_span.combine(&self.previous_span());
            items.push(TopLevel::Error(ErrorNode { span }));
        }

        let end = self.current_span().end;
        SourceFile {
            items,
            span: Span::new(0, end, 1, 1),
        }
    }

    // Token stream management
    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + offset).min(last)].kind
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParserError> {
        if self.check(&kind) {
            return Ok(self.advance());
        }
        Err(self.expected(what))
    }

    fn parse_identifier(&mut self, what: &str) -> Result<Ident, ParserError> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok(Spanned::new(name, span))
            }
            _ => Err(self.expected(what)),
        }
    }

    /// Consumes a closing token if present. Otherwise reports it missing and
    /// returns the span of the last consumed token so the enclosing node can
    /// still be closed off.
    fn expect_closing(&mut self, kind: TokenKind, what: &str) -> Span {
        if self.check(&kind) {
            return self.advance().span;
        }
        self.report_unclosed(what);
        self.previous_span()
    }

    fn report_unclosed(&mut self, what: &str) {
        if self.unclosed_at == Some(self.position) {
            return;
        }
        self.unclosed_at = Some(self.position);
        let error = self.expected(what);
        self.report_error(&error.message, error.span);
    }

    fn expected(&self, what: &str) -> ParserError {
        ParserError {
            message: format!("expected {}, found {}", what, self.current().kind),
            span: self.current_span(),
        }
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.position == 0 {
            return self.current_span().empty_at();
        }
        self.tokens[self.position - 1].span
    }

    /// Skips a balanced `(...)`, `[...]` or `{...}` group starting at the
    /// current token. Stops early at end of file.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current().kind {
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return;
            }
        }
    }

    // Error reporting
    fn report_error(&self, message: &str, span: Span) {
        self.diagnostic_handler.report(Diagnostic {
            level: DiagnosticLevel::Error,
            span,
            message: message.to_string(),
        });
    }

    // Error recovery: skip to the next definition boundary
    fn synchronize(&mut self, start_position: usize) {
        if self.position == start_position {
            self.advance();
        }

        let mut depth = 0usize;
        while !self.is_at_end() {
            match &self.current().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth == 0 => return,
                TokenKind::RightBrace => depth -= 1,
                TokenKind::Module => return,
                kind if depth == 0 && starts_definition(kind) => return,
                _ => {}
            }
            self.advance();
        }
    }
}

/// Tokens that may begin a module definition, including visibility prefixes.
fn starts_definition(kind: &TokenKind) -> bool {
    kind.starts_module_definition()
        || matches!(
            kind,
            TokenKind::Const
                | TokenKind::Template
                | TokenKind::Private
                | TokenKind::Public
                | TokenKind::Friend
        )
}

const RESERVED_WORDS: &[&str] = &[
    "action", "activate", "address", "alive", "all", "alt", "and", "and4b", "any", "anytype",
    "bitstring", "boolean", "break", "call", "case", "catch", "char", "charstring", "check",
    "clear", "complement", "connect", "continue", "create", "deactivate", "default", "disconnect",
    "display", "do", "done", "else", "encode", "error", "except", "exception", "execute",
    "extends", "extension", "fail", "false", "float", "for", "getcall", "getreply", "getverdict",
    "goto", "halt", "hexstring", "if", "ifpresent", "in", "inconc", "infinity", "inout",
    "integer", "interleave", "kill", "killed", "label", "length", "log", "map", "match",
    "message", "mixed", "mod", "noblock", "none", "not", "not4b", "nowait", "null",
    "objid", "octetstring", "omit", "optional", "or", "or4b", "out", "override", "param",
    "pass", "pattern", "permutation", "present", "procedure", "raise", "read", "receive",
    "rem", "repeat", "reply", "running", "select", "self", "send", "sender", "setverdict",
    "signature", "start", "stop", "subset", "superset", "timeout", "to", "trigger", "true",
    "universal", "unmap", "value", "valueof", "variant", "verdicttype", "while", "with",
    "xor", "xor4b",
];

/// Words that are keywords of the full language but carry no structure in
/// this grammar. They never name a declaration and are skipped in bodies.
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.binary_search(&word).is_ok()
}

/// Modifiers of formal parameters and fields, dropped from name lists.
fn is_parameter_modifier(word: &str) -> bool {
    matches!(
        word,
        "in" | "out" | "inout" | "optional" | "value" | "present" | "omit"
    )
}
