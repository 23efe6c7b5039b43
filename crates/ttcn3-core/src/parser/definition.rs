use super::{is_parameter_modifier, BlockParser, Parser, ParserError};
use crate::ast::*;
use crate::lexer::TokenKind;

pub trait DefinitionParser {
    fn parse_module(&mut self) -> Result<Module, ParserError>;
    fn parse_module_defs(&mut self) -> Vec<ModuleDef>;
    fn parse_module_def(&mut self) -> Result<ModuleDef, ParserError>;
}

impl DefinitionParser for Parser {
    fn parse_module(&mut self) -> Result<Module, ParserError> {
        let start_span = self.consume(TokenKind::Module, "'module'")?.span;
        let name = self.parse_identifier("module name")?;
        tracing::trace!(module = %name.node, "parsing module");

        if self.match_token(&[TokenKind::Language]) {
            loop {
                self.consume(TokenKind::Str(String::new()), "language string")?;
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenKind::LeftBrace, "'{' after module name")?;
        let defs = self.parse_module_defs();
        let end_span = self.expect_closing(TokenKind::RightBrace, "'}' to close module");
        self.skip_attributes();
        self.match_token(&[TokenKind::Semicolon]);

        Ok(Module {
            name,
            defs,
            span: start_span.combine(&end_span),
        })
    }

    fn parse_module_defs(&mut self) -> Vec<ModuleDef> {
        let mut defs = Vec::new();

        while !self.is_at_end() && !self.check(&TokenKind::RightBrace) {
            if self.match_token(&[TokenKind::Semicolon]) {
                continue;
            }
            // A module keyword here means the enclosing body was never closed.
            if self.check(&TokenKind::Module) {
                break;
            }

            let start_position = self.position;
            let start_span = self.current_span();
            match self.parse_module_def() {
                Ok(def) => defs.push(def),
                Err(e) => {
                    self.report_error(&e.message, e.span);
                    self.synchronize(start_position);
                    let span = start_span.combine(&self.previous_span());
                    defs.push(ModuleDef {
                        visibility: None,
                        def: Definition::Error(ErrorNode { span }),
                        span,
                    });
                }
            }
        }

        defs
    }

    fn parse_module_def(&mut self) -> Result<ModuleDef, ParserError> {
        let start_span = self.current_span();
        let visibility = match self.current().kind {
            TokenKind::Public => Some(Visibility::Public),
            TokenKind::Private => Some(Visibility::Private),
            TokenKind::Friend => Some(Visibility::Friend),
            _ => None,
        };
        if visibility.is_some() {
            self.advance();
        }

        if self.trace {
            tracing::trace!(
                line = self.current_span().line,
                token = %self.current().kind,
                "enter definition"
            );
        }

        let def = match &self.current().kind {
            TokenKind::Group => Definition::Group(self.parse_group()?),
            TokenKind::Testcase
            | TokenKind::Function
            | TokenKind::Altstep
            | TokenKind::External => Definition::Func(self.parse_func()?),
            TokenKind::Control => Definition::Control(self.parse_control()?),
            TokenKind::Import => Definition::Import(self.parse_import()?),
            TokenKind::Type => Definition::Type(self.parse_type()?),
            TokenKind::Const
            | TokenKind::Template
            | TokenKind::Modulepar
            | TokenKind::Var
            | TokenKind::Timer
            | TokenKind::Port => Definition::Value(self.parse_value_decl()?),
            _ => return Err(self.expected("definition")),
        };

        self.skip_attributes();
        self.match_token(&[TokenKind::Semicolon]);

        Ok(ModuleDef {
            visibility,
            def,
            span: start_span.combine(&self.previous_span()),
        })
    }
}

// Definition implementations
impl Parser {
    fn parse_group(&mut self) -> Result<GroupDecl, ParserError> {
        let start_span = self.consume(TokenKind::Group, "'group'")?.span;
        let name = self.parse_identifier("group name")?;
        self.consume(TokenKind::LeftBrace, "'{' after group name")?;
        let defs = self.parse_module_defs();
        let end_span = self.expect_closing(TokenKind::RightBrace, "'}' to close group");

        Ok(GroupDecl {
            name,
            defs,
            span: start_span.combine(&end_span),
        })
    }

    fn parse_func(&mut self) -> Result<FuncDecl, ParserError> {
        let start_span = self.current_span();
        let kind = match self.advance().kind {
            TokenKind::Testcase => FuncKind::Testcase,
            TokenKind::Altstep => FuncKind::Altstep,
            TokenKind::External => {
                self.consume(TokenKind::Function, "'function' after 'external'")?;
                FuncKind::External
            }
            _ => FuncKind::Function,
        };

        let mut modifiers = Vec::new();
        while let TokenKind::Modifier(word) = &self.current().kind {
            let word = word.clone();
            let span = self.advance().span;
            modifiers.push(Spanned::new(word, span));
        }

        let name = self.parse_identifier("function name")?;
        let params = self.parse_formal_pars()?;

        let mut runs_on = None;
        let mut mtc = None;
        let mut system = None;
        let mut return_type = None;
        loop {
            match self.current().kind {
                TokenKind::Runs => {
                    self.advance();
                    self.consume(TokenKind::On, "'on' after 'runs'")?;
                    runs_on = Some(self.parse_type_ref("component type")?);
                }
                TokenKind::Mtc => {
                    self.advance();
                    mtc = Some(self.parse_type_ref("component type")?);
                }
                TokenKind::System => {
                    self.advance();
                    system = Some(self.parse_type_ref("component type")?);
                }
                TokenKind::Return => {
                    self.advance();
                    self.match_token(&[TokenKind::Template]);
                    if self.check(&TokenKind::LeftParen) {
                        self.skip_balanced();
                    }
                    return_type = Some(self.parse_type_ref("return type")?);
                }
                _ => break,
            }
        }

        let body = if kind == FuncKind::External {
            None
        } else if self.check(&TokenKind::LeftBrace) {
            Some(self.parse_block())
        } else if self.unclosed_at == Some(self.position) {
            // The parameter list already ran into this token.
            None
        } else {
            return Err(self.expected("'{' to start function body"));
        };

        Ok(FuncDecl {
            kind,
            modifiers,
            name,
            params,
            runs_on,
            mtc,
            system,
            return_type,
            body,
            span: start_span.combine(&self.previous_span()),
        })
    }

    fn parse_control(&mut self) -> Result<ControlPart, ParserError> {
        let start_span = self.consume(TokenKind::Control, "'control'")?.span;
        if !self.check(&TokenKind::LeftBrace) {
            return Err(self.expected("'{' after 'control'"));
        }
        let body = self.parse_block();
        let span = start_span.combine(&body.span);
        Ok(ControlPart { body, span })
    }

    fn parse_import(&mut self) -> Result<ImportDecl, ParserError> {
        let start_span = self.consume(TokenKind::Import, "'import'")?.span;
        self.consume(TokenKind::From, "'from' after 'import'")?;
        let module = self.parse_identifier("module name")?;

        // The import list (`all`, `{ type A, B }`, `except ...`)
        // does not take part in navigation.
        loop {
            match &self.current().kind {
                TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof => break,
                TokenKind::LeftBrace | TokenKind::LeftParen | TokenKind::LeftBracket => {
                    self.skip_balanced()
                }
                kind if super::starts_definition(kind) => break,
                _ => {
                    self.advance();
                }
            }
        }

        Ok(ImportDecl {
            module,
            span: start_span.combine(&self.previous_span()),
        })
    }

    fn parse_type(&mut self) -> Result<TypeDecl, ParserError> {
        let start_span = self.consume(TokenKind::Type, "'type'")?.span;

        let mut base = None;
        let mut fields = Vec::new();
        let mut body = None;

        let (kind, name) = match self.current().kind {
            TokenKind::Record | TokenKind::Set => {
                let is_record = self.check(&TokenKind::Record);
                self.advance();
                if self.match_token(&[TokenKind::Of]) {
                    base = Some(self.parse_type_ref("element type")?);
                    let name = self.parse_identifier("type name")?;
                    let kind = if is_record {
                        TypeKind::RecordOf
                    } else {
                        TypeKind::SetOf
                    };
                    (kind, name)
                } else {
                    let name = self.parse_identifier("type name")?;
                    fields = self.parse_fields()?;
                    let kind = if is_record {
                        TypeKind::Record
                    } else {
                        TypeKind::Set
                    };
                    (kind, name)
                }
            }
            TokenKind::Union => {
                self.advance();
                let name = self.parse_identifier("type name")?;
                fields = self.parse_fields()?;
                (TypeKind::Union, name)
            }
            TokenKind::Enumerated => {
                self.advance();
                let name = self.parse_identifier("type name")?;
                fields = self.parse_enum_items()?;
                (TypeKind::Enumerated, name)
            }
            TokenKind::Component | TokenKind::Port => {
                let kind = if self.check(&TokenKind::Component) {
                    TypeKind::Component
                } else {
                    TypeKind::Port
                };
                self.advance();
                let name = self.parse_identifier("type name")?;
                // `extends` lists and `message`/`procedure` qualifiers.
                while matches!(self.current().kind, TokenKind::Identifier(_) | TokenKind::Comma)
                {
                    self.advance();
                }
                if !self.check(&TokenKind::LeftBrace) {
                    return Err(self.expected("'{' to start type body"));
                }
                body = Some(self.parse_block());
                (kind, name)
            }
            TokenKind::Identifier(_) => {
                base = Some(self.parse_type_ref("base type")?);
                let name = self.parse_identifier("type name")?;
                // Subtype constraints such as `(0..255)` or `length(4)`.
                while !matches!(
                    self.current().kind,
                    TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
                ) && !super::starts_definition(&self.current().kind)
                {
                    self.skip_balanced();
                }
                (TypeKind::Alias, name)
            }
            _ => return Err(self.expected("type definition")),
        };

        Ok(TypeDecl {
            kind,
            name,
            base,
            fields,
            body,
            span: start_span.combine(&self.previous_span()),
        })
    }

    /// `(in integer a, out T b := default)`
    ///
    /// A list left open is reported once and ends before the token that
    /// cannot belong to it, so the function body is still parsed.
    pub(super) fn parse_formal_pars(&mut self) -> Result<Vec<FormalPar>, ParserError> {
        self.consume(TokenKind::LeftParen, "'(' to start parameter list")?;
        let mut params = Vec::new();
        if self.match_token(&[TokenKind::RightParen]) {
            return Ok(params);
        }
        while !outside_name_list(&self.current().kind, &TokenKind::RightParen) {
            params.push(self.parse_name_list_entry(TokenKind::RightParen, "parameter name")?);
            if self.match_token(&[TokenKind::RightParen]) {
                return Ok(params);
            }
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
            if self.check(&TokenKind::RightParen) {
                self.report_trailing_comma("parameter name");
                return Ok(params);
            }
        }
        self.report_unclosed("')' to close parameter list");
        Ok(params)
    }

    /// `{ integer a, T b optional }`
    fn parse_fields(&mut self) -> Result<Vec<FormalPar>, ParserError> {
        self.consume(TokenKind::LeftBrace, "'{' to start field list")?;
        let mut fields = Vec::new();
        if self.match_token(&[TokenKind::RightBrace]) {
            return Ok(fields);
        }
        while !outside_name_list(&self.current().kind, &TokenKind::RightBrace) {
            fields.push(self.parse_name_list_entry(TokenKind::RightBrace, "field name")?);
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
            if self.check(&TokenKind::RightBrace) {
                self.report_trailing_comma("field name");
                return Ok(fields);
            }
        }
        self.expect_closing(TokenKind::RightBrace, "'}' to close field list");
        Ok(fields)
    }

    /// Reports a comma directly before the closing token of a list and
    /// consumes the closing token.
    fn report_trailing_comma(&mut self, what: &str) {
        let error = self.expected(what);
        self.report_error(&error.message, error.span);
        self.advance();
    }

    /// `{ red, green(2), blue }`
    fn parse_enum_items(&mut self) -> Result<Vec<FormalPar>, ParserError> {
        self.consume(TokenKind::LeftBrace, "'{' to start enumeration")?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let name = self.parse_identifier("enumeration item")?;
            if self.check(&TokenKind::LeftParen) {
                self.skip_balanced();
            }
            let span = name.span.combine(&self.previous_span());
            items.push(FormalPar {
                ty: None,
                name,
                span,
            });
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
            if self.check(&TokenKind::RightBrace) {
                self.report_trailing_comma("enumeration item");
                return Ok(items);
            }
        }
        self.expect_closing(TokenKind::RightBrace, "'}' to close enumeration");
        Ok(items)
    }

    /// One comma-separated entry of a parameter or field list. The last
    /// identifier names the entry; a preceding one is its type.
    fn parse_name_list_entry(
        &mut self,
        close: TokenKind,
        what: &str,
    ) -> Result<FormalPar, ParserError> {
        let start_span = self.current_span();
        let mut names: Vec<Ident> = Vec::new();

        loop {
            match &self.current().kind {
                TokenKind::Comma => break,
                kind if std::mem::discriminant(kind) == std::mem::discriminant(&close) => break,
                kind if outside_name_list(kind, &close) => break,
                TokenKind::Identifier(word) => {
                    let word = word.clone();
                    let span = self.advance().span;
                    if !is_parameter_modifier(&word) {
                        names.push(Spanned::new(word, span));
                    }
                }
                TokenKind::Dot => {
                    // Qualified type: keep the module prefix as the type.
                    self.advance();
                    if matches!(self.current().kind, TokenKind::Identifier(_)) {
                        self.advance();
                    }
                }
                TokenKind::Assign => {
                    self.advance();
                    self.skip_default_value(&close);
                }
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    self.skip_balanced()
                }
                _ => {
                    self.advance();
                }
            }
        }

        let name = names.pop().ok_or_else(|| self.expected(what))?;
        let ty = names.into_iter().next();
        let span = start_span.combine(&name.span);
        Ok(FormalPar { ty, name, span })
    }

    fn skip_default_value(&mut self, close: &TokenKind) {
        loop {
            match &self.current().kind {
                TokenKind::Comma | TokenKind::Semicolon | TokenKind::RightBrace => return,
                kind if std::mem::discriminant(kind) == std::mem::discriminant(close) => return,
                TokenKind::Eof => return,
                kind if kind.starts_module_definition() => return,
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                    self.skip_balanced()
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// A possibly qualified type name (`T` or `Module.T`); the first
    /// identifier is kept.
    pub(super) fn parse_type_ref(&mut self, what: &str) -> Result<Ident, ParserError> {
        let ident = self.parse_identifier(what)?;
        while self.check(&TokenKind::Dot)
            && matches!(self.peek_kind(1), TokenKind::Identifier(_))
        {
            self.advance();
            self.advance();
        }
        Ok(ident)
    }

    /// `with { ... }` attribute blocks trail definitions and modules.
    fn skip_attributes(&mut self) {
        if matches!(&self.current().kind, TokenKind::Identifier(w) if w == "with")
            && matches!(self.peek_kind(1), TokenKind::LeftBrace)
        {
            self.advance();
            self.skip_balanced();
        }
    }
}

/// Tokens that never occur inside a parameter or field list closed by
/// `close`. Reaching one means the list was left open.
fn outside_name_list(kind: &TokenKind, close: &TokenKind) -> bool {
    match kind {
        TokenKind::Semicolon | TokenKind::Eof => true,
        TokenKind::LeftBrace | TokenKind::RightBrace | TokenKind::Runs | TokenKind::Return => {
            matches!(close, TokenKind::RightParen)
        }
        kind => kind.starts_module_definition(),
    }
}
