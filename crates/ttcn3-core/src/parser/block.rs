use super::{is_reserved_word, Parser, ParserError};
use crate::ast::*;
use crate::lexer::TokenKind;

pub trait BlockParser {
    fn parse_block(&mut self) -> Block;
    fn parse_value_decl(&mut self) -> Result<ValueDecl, ParserError>;
}

impl BlockParser for Parser {
    /// Parses `{ ... }` starting at the opening brace.
    ///
    /// Statements are not modelled. Declarations, nested blocks, references
    /// and literals are kept; every other token is skipped. A block that
    /// runs into a module-level keyword or the end of file is reported as
    /// unclosed and ends at the last token it consumed.
    fn parse_block(&mut self) -> Block {
        let start_span = self.current_span();
        if !self.match_token(&[TokenKind::LeftBrace]) {
            let error = self.expected("'{'");
            self.report_error(&error.message, error.span);
            return Block {
                items: Vec::new(),
                span: start_span.empty_at(),
            };
        }

        let mut items = Vec::new();
        loop {
            match &self.current().kind {
                TokenKind::RightBrace => {
                    let end_span = self.advance().span;
                    return Block {
                        items,
                        span: start_span.combine(&end_span),
                    };
                }
                TokenKind::Eof => break,
                kind if kind.starts_module_definition() => break,
                TokenKind::LeftBrace => items.push(BlockItem::Block(self.parse_block())),
                TokenKind::Var
                | TokenKind::Const
                | TokenKind::Timer
                | TokenKind::Port
                | TokenKind::Template => {
                    let start_position = self.position;
                    match self.parse_value_decl() {
                        Ok(decl) => items.push(BlockItem::Decl(decl)),
                        Err(e) => {
                            self.report_error(&e.message, e.span);
                            self.skip_statement(start_position);
                        }
                    }
                }
                _ => {
                    if let Some(item) = self.parse_leaf() {
                        items.push(item);
                    }
                }
            }
        }

        self.report_unclosed("'}' to close block");
        Block {
            items,
            span: start_span.combine(&self.previous_span()),
        }
    }

    fn parse_value_decl(&mut self) -> Result<ValueDecl, ParserError> {
        let start_span = self.current_span();
        let kind = match self.current().kind {
            TokenKind::Const => ValueKind::Const,
            TokenKind::Var => ValueKind::Var,
            TokenKind::Template => ValueKind::Template,
            TokenKind::Modulepar => ValueKind::ModulePar,
            TokenKind::Timer => ValueKind::Timer,
            TokenKind::Port => ValueKind::Port,
            _ => return Err(self.expected("declaration")),
        };
        self.advance();

        // `var template(present) @lazy T x`
        loop {
            match self.current().kind {
                TokenKind::Template | TokenKind::Modifier(_) => {
                    self.advance();
                }
                TokenKind::LeftParen => self.skip_balanced(),
                _ => break,
            }
        }

        let first = self.parse_type_ref("type or name")?;
        let (ty, first_name) = if matches!(self.current().kind, TokenKind::Identifier(_)) {
            (Some(first), self.parse_identifier("name")?)
        } else if matches!(kind, ValueKind::Timer | ValueKind::Port) {
            (None, first)
        } else {
            return Err(self.expected("name"));
        };

        let mut declarators = Vec::new();
        let mut name = first_name;
        loop {
            // Array dimensions and template parameters.
            while matches!(
                self.current().kind,
                TokenKind::LeftBracket | TokenKind::LeftParen
            ) {
                self.skip_balanced();
            }
            if matches!(&self.current().kind, TokenKind::Identifier(w) if w == "modifies") {
                self.advance();
                self.parse_type_ref("base template")?;
            }

            let value = if self.match_token(&[TokenKind::Assign]) {
                let value_start = self.position;
                let value = self.parse_value_items();
                if self.position == value_start {
                    return Err(self.expected("expression after ':='"));
                }
                value
            } else {
                Vec::new()
            };
            declarators.push(Declarator { name, value });

            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
            name = self.parse_identifier("name")?;
        }

        Ok(ValueDecl {
            kind,
            ty,
            declarators,
            span: start_span.combine(&self.previous_span()),
        })
    }
}

impl Parser {
    /// Initializer expression up to the next `,` or `;` outside brackets.
    fn parse_value_items(&mut self) -> Vec<BlockItem> {
        let mut items = Vec::new();
        let mut depth = 0usize;
        loop {
            match &self.current().kind {
                TokenKind::Comma | TokenKind::Semicolon if depth == 0 => break,
                TokenKind::RightBrace | TokenKind::Eof => break,
                kind if kind.starts_module_definition() => break,
                TokenKind::LeftBrace => items.push(BlockItem::Block(self.parse_block())),
                TokenKind::LeftParen | TokenKind::LeftBracket => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RightParen | TokenKind::RightBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.advance();
                }
                _ => {
                    if let Some(item) = self.parse_leaf() {
                        items.push(item);
                    }
                }
            }
        }
        items
    }

    /// Consumes one token, returning it as a reference or literal if it is
    /// one.
    fn parse_leaf(&mut self) -> Option<BlockItem> {
        let token = self.advance();
        match token.kind {
            TokenKind::Identifier(name) if !is_reserved_word(&name) => {
                Some(BlockItem::Ref(Spanned::new(name, token.span)))
            }
            TokenKind::Number(text) => Some(literal(LiteralKind::Number, text, token.span)),
            TokenKind::Str(text) => Some(literal(LiteralKind::String, text, token.span)),
            TokenKind::Bits(text) => Some(literal(LiteralKind::Bits, text, token.span)),
            _ => None,
        }
    }

    // Error recovery inside a block: skip to the end of the statement
    fn skip_statement(&mut self, start_position: usize) {
        if self.position == start_position {
            self.advance();
        }
        loop {
            match self.current().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RightBrace | TokenKind::Eof => return,
                ref kind if kind.starts_module_definition() => return,
                TokenKind::LeftBrace | TokenKind::LeftParen | TokenKind::LeftBracket => {
                    self.skip_balanced()
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn literal(kind: LiteralKind, text: String, span: crate::span::Span) -> BlockItem {
    BlockItem::Literal(Literal { kind, text, span })
}
