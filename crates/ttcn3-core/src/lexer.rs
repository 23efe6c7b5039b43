use crate::diagnostics::DiagnosticHandler;
use crate::span::Span;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Definition keywords
    Module,
    Group,
    Import,
    Testcase,
    Function,
    Altstep,
    External,
    Control,
    Type,
    Const,
    Var,
    Template,
    Modulepar,
    Timer,
    Port,

    // Header and type keywords
    From,
    Language,
    Runs,
    On,
    Mtc,
    System,
    Return,
    Record,
    Set,
    Union,
    Enumerated,
    Component,
    Of,
    Private,
    Public,
    Friend,

    Identifier(String),
    Number(String),
    Str(String),
    Bits(String),
    /// `@name` modifiers such as `@control` or `@deterministic`.
    Modifier(String),

    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Dot,
    Colon,
    Assign,
    Operator(String),

    Eof,
}

impl TokenKind {
    fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "module" => TokenKind::Module,
            "group" => TokenKind::Group,
            "import" => TokenKind::Import,
            "testcase" => TokenKind::Testcase,
            "function" => TokenKind::Function,
            "altstep" => TokenKind::Altstep,
            "external" => TokenKind::External,
            "control" => TokenKind::Control,
            "type" => TokenKind::Type,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "template" => TokenKind::Template,
            "modulepar" => TokenKind::Modulepar,
            "timer" => TokenKind::Timer,
            "port" => TokenKind::Port,
            "from" => TokenKind::From,
            "language" => TokenKind::Language,
            "runs" => TokenKind::Runs,
            "on" => TokenKind::On,
            "mtc" => TokenKind::Mtc,
            "system" => TokenKind::System,
            "return" => TokenKind::Return,
            "record" => TokenKind::Record,
            "set" => TokenKind::Set,
            "union" => TokenKind::Union,
            "enumerated" => TokenKind::Enumerated,
            "component" => TokenKind::Component,
            "of" => TokenKind::Of,
            "private" => TokenKind::Private,
            "public" => TokenKind::Public,
            "friend" => TokenKind::Friend,
            _ => return None,
        })
    }

    /// Keywords that may only start a module-level definition. Seeing one of
    /// these inside a statement block means the block was never closed.
    pub fn starts_module_definition(&self) -> bool {
        matches!(
            self,
            TokenKind::Module
                | TokenKind::Group
                | TokenKind::Import
                | TokenKind::Testcase
                | TokenKind::Function
                | TokenKind::Altstep
                | TokenKind::External
                | TokenKind::Control
                | TokenKind::Type
                | TokenKind::Modulepar
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(s) | TokenKind::Number(s) | TokenKind::Operator(s) => {
                write!(f, "'{}'", s)
            }
            TokenKind::Modifier(s) => write!(f, "'{}'", s),
            TokenKind::Str(_) => f.write_str("string literal"),
            TokenKind::Bits(_) => f.write_str("bitstring literal"),
            TokenKind::LeftBrace => f.write_str("'{'"),
            TokenKind::RightBrace => f.write_str("'}'"),
            TokenKind::LeftParen => f.write_str("'('"),
            TokenKind::RightParen => f.write_str("')'"),
            TokenKind::LeftBracket => f.write_str("'['"),
            TokenKind::RightBracket => f.write_str("']'"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Assign => f.write_str("':='"),
            TokenKind::Eof => f.write_str("end of file"),
            keyword => write!(f, "keyword '{}'", format!("{:?}", keyword).to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Splits TTCN-3 source into tokens.
///
/// Lexing never fails: unknown characters and unterminated literals are
/// reported to the diagnostic handler and skipped. The token stream always
/// ends with a single `Eof` token.
pub struct Lexer<'src> {
    source: &'src str,
    position: usize,
    line: usize,
    column: usize,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, diagnostic_handler: Arc<dyn DiagnosticHandler>) -> Self {
        Lexer {
            source,
            position: 0,
            line: 1,
            column: 1,
            diagnostic_handler,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let Some(ch) = self.peek() else {
                let here = self.mark();
                tokens.push(Token::new(TokenKind::Eof, self.span_from(here)));
                return tokens;
            };

            let start = self.mark();
            let kind = match ch {
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    TokenKind::keyword(word)
                        .unwrap_or_else(|| TokenKind::Identifier(word.to_string()))
                }
                c if c.is_ascii_digit() => self.lex_number(),
                '"' => self.lex_string(start),
                '\'' => self.lex_bits(start),
                '@' => {
                    self.bump();
                    let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    TokenKind::Modifier(format!("@{}", word))
                }
                '{' => self.single(TokenKind::LeftBrace),
                '}' => self.single(TokenKind::RightBrace),
                '(' => self.single(TokenKind::LeftParen),
                ')' => self.single(TokenKind::RightParen),
                '[' => self.single(TokenKind::LeftBracket),
                ']' => self.single(TokenKind::RightBracket),
                ';' => self.single(TokenKind::Semicolon),
                ',' => self.single(TokenKind::Comma),
                ':' => {
                    self.bump();
                    if self.eat('=') {
                        TokenKind::Assign
                    } else {
                        TokenKind::Colon
                    }
                }
                '.' => {
                    self.bump();
                    if self.eat('.') {
                        TokenKind::Operator("..".to_string())
                    } else {
                        TokenKind::Dot
                    }
                }
                c if is_operator_char(c) => self.lex_operator(),
                _ => {
                    self.take_while(|c| !c.is_whitespace() && !is_token_start(c));
                    let span = self.span_from(start);
                    self.diagnostic_handler.error(
                        span,
                        &format!("unexpected character '{}'", &self.source[span.start..span.end]),
                    );
                    continue;
                }
            };
            tokens.push(Token::new(kind, self.span_from(start)));
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.position;
        self.take_while(|c| c.is_ascii_digit());
        // `1..5` is a range, not a float.
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.take_while(|c| c.is_ascii_digit());
        }
        TokenKind::Number(self.source[start..self.position].to_string())
    }

    fn lex_string(&mut self, start: (usize, usize, usize)) -> TokenKind {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    self.diagnostic_handler
                        .error(self.span_from(start), "unterminated string literal");
                    break;
                }
                // A doubled quote is an escaped quote.
                Some('"') if self.peek() == Some('"') => {
                    self.bump();
                    value.push('"');
                }
                Some('"') => break,
                Some('\\') => {
                    if let Some(escaped) = self.bump() {
                        value.push('\\');
                        value.push(escaped);
                    }
                }
                Some(c) => value.push(c),
            }
        }
        TokenKind::Str(value)
    }

    fn lex_bits(&mut self, start: (usize, usize, usize)) -> TokenKind {
        self.bump();
        let body = self.take_while(|c| c != '\'' && c != '\n').to_string();
        if !self.eat('\'') {
            self.diagnostic_handler
                .error(self.span_from(start), "unterminated bitstring literal");
            return TokenKind::Bits(body);
        }
        if matches!(self.peek(), Some('B' | 'H' | 'O' | 'b' | 'h' | 'o')) {
            self.bump();
        }
        TokenKind::Bits(body)
    }

    fn lex_operator(&mut self) -> TokenKind {
        let start = self.position;
        let first = self.bump().unwrap_or_default();
        let pair = matches!(
            (first, self.peek()),
            ('=', Some('='))
                | ('!', Some('='))
                | ('<', Some('=' | '<' | '@'))
                | ('>', Some('=' | '>'))
                | ('-', Some('>'))
        );
        if pair {
            self.bump();
        }
        TokenKind::Operator(self.source[start..self.position].to_string())
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    self.take_while(|c| c != '\n');
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let start = self.mark();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        self.diagnostic_handler
                            .error(self.span_from(start), "unterminated block comment");
                    }
                }
                _ => return,
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.position..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let source = self.source;
        let start = self.position;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &source[start..self.position]
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.position, self.line, self.column)
    }

    fn span_from(&self, (start, line, column): (usize, usize, usize)) -> Span {
        Span::new(start, self.position, line, column)
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!' | '?' | '&' | '|' | '^' | '~' | '%'
    )
}

fn is_token_start(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || is_operator_char(c)
        || matches!(
            c,
            '_' | '"' | '\'' | '@' | '{' | '}' | '(' | ')' | '[' | ']' | ';' | ',' | ':' | '.'
        )
}
