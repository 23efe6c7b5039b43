use super::*;
use crate::span::Span;

/// Borrowed view over every syntactic form of the tree.
///
/// Position queries, symbol extraction and token classification all work
/// over this one closed enum, so a new node kind fails to compile until every
/// consumer handles it.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    File(&'a SourceFile),
    Module(&'a Module),
    ModuleDef(&'a ModuleDef),
    GroupDecl(&'a GroupDecl),
    FuncDecl(&'a FuncDecl),
    ControlPart(&'a ControlPart),
    ImportDecl(&'a ImportDecl),
    ValueDecl(&'a ValueDecl),
    TypeDecl(&'a TypeDecl),
    FormalPar(&'a FormalPar),
    Block(&'a Block),
    Ident(&'a Ident),
    Literal(&'a Literal),
    Error(&'a ErrorNode),
}

impl<'a> Node<'a> {
    pub fn span(&self) -> Span {
        match self {
            Node::File(n) => n.span,
            Node::Module(n) => n.span,
            Node::ModuleDef(n) => n.span,
            Node::GroupDecl(n) => n.span,
            Node::FuncDecl(n) => n.span,
            Node::ControlPart(n) => n.span,
            Node::ImportDecl(n) => n.span,
            Node::ValueDecl(n) => n.span,
            Node::TypeDecl(n) => n.span,
            Node::FormalPar(n) => n.span,
            Node::Block(n) => n.span,
            Node::Ident(n) => n.span,
            Node::Literal(n) => n.span,
            Node::Error(n) => n.span,
        }
    }

    /// Name identifier of declaring nodes.
    pub fn name(&self) -> Option<&'a Ident> {
        match self {
            Node::Module(n) => Some(&n.name),
            Node::GroupDecl(n) => Some(&n.name),
            Node::FuncDecl(n) => Some(&n.name),
            Node::TypeDecl(n) => Some(&n.name),
            Node::FormalPar(n) => Some(&n.name),
            Node::ValueDecl(n) => n.declarators.first().map(|d| &d.name),
            Node::File(_)
            | Node::ModuleDef(_)
            | Node::ControlPart(_)
            | Node::ImportDecl(_)
            | Node::Block(_)
            | Node::Ident(_)
            | Node::Literal(_)
            | Node::Error(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Ident(_) | Node::Literal(_) | Node::Error(_))
    }

    /// Direct children, ordered by start offset.
    pub fn children(&self) -> Vec<Node<'a>> {
        let mut children = Vec::new();
        match *self {
            Node::File(file) => {
                for item in &file.items {
                    children.push(match item {
                        TopLevel::Module(m) => Node::Module(m),
                        TopLevel::Error(e) => Node::Error(e),
                    });
                }
            }
            Node::Module(module) => {
                children.push(Node::Ident(&module.name));
                children.extend(module.defs.iter().map(Node::ModuleDef));
            }
            Node::ModuleDef(def) => children.push(Node::from_definition(&def.def)),
            Node::GroupDecl(group) => {
                children.push(Node::Ident(&group.name));
                children.extend(group.defs.iter().map(Node::ModuleDef));
            }
            Node::FuncDecl(func) => {
                children.push(Node::Ident(&func.name));
                children.extend(func.params.iter().map(Node::FormalPar));
                for clause in [&func.runs_on, &func.mtc, &func.system, &func.return_type]
                    .into_iter()
                    .flatten()
                {
                    children.push(Node::Ident(clause));
                }
                if let Some(body) = &func.body {
                    children.push(Node::Block(body));
                }
            }
            Node::ControlPart(control) => children.push(Node::Block(&control.body)),
            Node::ImportDecl(import) => children.push(Node::Ident(&import.module)),
            Node::ValueDecl(decl) => {
                if let Some(ty) = &decl.ty {
                    children.push(Node::Ident(ty));
                }
                for declarator in &decl.declarators {
                    children.push(Node::Ident(&declarator.name));
                    children.extend(declarator.value.iter().map(Node::from_block_item));
                }
            }
            Node::TypeDecl(decl) => {
                children.push(Node::Ident(&decl.name));
                if let Some(base) = &decl.base {
                    children.push(Node::Ident(base));
                }
                children.extend(decl.fields.iter().map(Node::FormalPar));
                if let Some(body) = &decl.body {
                    children.push(Node::Block(body));
                }
            }
            Node::FormalPar(par) => {
                if let Some(ty) = &par.ty {
                    children.push(Node::Ident(ty));
                }
                children.push(Node::Ident(&par.name));
            }
            Node::Block(block) => children.extend(block.items.iter().map(Node::from_block_item)),
            Node::Ident(_) | Node::Literal(_) | Node::Error(_) => {}
        }
        children.sort_by_key(|child| child.span().start);
        children
    }

    pub fn from_definition(def: &'a Definition) -> Node<'a> {
        match def {
            Definition::Group(g) => Node::GroupDecl(g),
            Definition::Func(f) => Node::FuncDecl(f),
            Definition::Control(c) => Node::ControlPart(c),
            Definition::Import(i) => Node::ImportDecl(i),
            Definition::Value(v) => Node::ValueDecl(v),
            Definition::Type(t) => Node::TypeDecl(t),
            Definition::Error(e) => Node::Error(e),
        }
    }

    pub fn from_block_item(item: &'a BlockItem) -> Node<'a> {
        match item {
            BlockItem::Decl(d) => Node::ValueDecl(d),
            BlockItem::Ref(r) => Node::Ident(r),
            BlockItem::Literal(l) => Node::Literal(l),
            BlockItem::Block(b) => Node::Block(b),
        }
    }

    /// Identity of a node within its tree: kind plus span.
    pub fn same_as(&self, other: &Node<'a>) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && self.span() == other.span()
    }
}
