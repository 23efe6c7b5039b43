use super::{ErrorNode, Ident};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Friend,
}

/// A single entry of a module or group body.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDef {
    pub visibility: Option<Visibility>,
    pub def: Definition,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Group(GroupDecl),
    Func(FuncDecl),
    Control(ControlPart),
    Import(ImportDecl),
    Value(ValueDecl),
    Type(TypeDecl),
    Error(ErrorNode),
}

impl Definition {
    pub fn span(&self) -> Span {
        match self {
            Definition::Group(g) => g.span,
            Definition::Func(f) => f.span,
            Definition::Control(c) => c.span,
            Definition::Import(i) => i.span,
            Definition::Value(v) => v.span,
            Definition::Type(t) => t.span,
            Definition::Error(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDecl {
    pub name: Ident,
    pub defs: Vec<ModuleDef>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    Testcase,
    Function,
    Altstep,
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub kind: FuncKind,
    pub modifiers: Vec<Ident>,
    pub name: Ident,
    pub params: Vec<FormalPar>,
    pub runs_on: Option<Ident>,
    pub mtc: Option<Ident>,
    pub system: Option<Ident>,
    pub return_type: Option<Ident>,
    /// `None` for external functions.
    pub body: Option<Block>,
    pub span: Span,
}

impl FuncDecl {
    pub fn is_test(&self) -> bool {
        self.kind == FuncKind::Testcase
    }

    /// Control functions (`function @control f()`) are sequencing entry
    /// points, like a module's control part.
    pub fn is_control(&self) -> bool {
        self.kind == FuncKind::Function && self.modifiers.iter().any(|m| m.node == "@control")
    }
}

/// A formal parameter, record field or enumeration item.
#[derive(Debug, Clone, PartialEq)]
pub struct FormalPar {
    pub ty: Option<Ident>,
    pub name: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlPart {
    pub body: Block,
    pub span: Span,
}

impl ControlPart {
    /// Span of the leading `control` keyword.
    pub fn keyword_span(&self) -> Span {
        Span::new(
            self.span.start,
            self.span.start + "control".len(),
            self.span.line,
            self.span.column,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub module: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Const,
    Var,
    Template,
    ModulePar,
    Timer,
    Port,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueDecl {
    pub kind: ValueKind,
    pub ty: Option<Ident>,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub value: Vec<BlockItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Record,
    Set,
    Union,
    Enumerated,
    Component,
    Port,
    RecordOf,
    SetOf,
    Alias,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: Ident,
    /// Aliased or element type.
    pub base: Option<Ident>,
    /// Fields of structured types and items of enumerations.
    pub fields: Vec<FormalPar>,
    /// Body of component and port types.
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub items: Vec<BlockItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Decl(ValueDecl),
    Ref(Ident),
    Literal(Literal),
    Block(Block),
}

impl BlockItem {
    pub fn span(&self) -> Span {
        match self {
            BlockItem::Decl(d) => d.span,
            BlockItem::Ref(r) => r.span,
            BlockItem::Literal(l) => l.span,
            BlockItem::Block(b) => b.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    Bits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
    pub span: Span,
}
