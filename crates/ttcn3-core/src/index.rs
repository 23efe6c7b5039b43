//! Position queries over a [`SyntaxTree`].
//!
//! Every query walks the borrowed [`Node`] view of the tree and tolerates
//! partial trees: regions that did not parse simply answer nothing.

use crate::ast::*;
use crate::line_index::LineCol;
use crate::span::Span;
use crate::syntax_tree::SyntaxTree;
use rustc_hash::FxHashSet;
use std::ops::Deref;

/// Chain of nodes from the file root down to the innermost node enclosing a
/// position.
#[derive(Debug, Clone)]
pub struct NodePath<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> NodePath<'a> {
    pub fn innermost(&self) -> Node<'a> {
        // A path always holds at least the root.
        self.nodes[self.nodes.len() - 1]
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.nodes.len().checked_sub(2).map(|i| self.nodes[i])
    }
}

impl<'a> Deref for NodePath<'a> {
    type Target = [Node<'a>];

    fn deref(&self) -> &Self::Target {
        &self.nodes
    }
}

/// Declaration category, shared by symbols, completion and token
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolClass {
    Module,
    Group,
    Testcase,
    Function,
    Altstep,
    Control,
    Import,
    Const,
    Variable,
    Template,
    ModulePar,
    Timer,
    Port,
    Type,
    Enum,
    Component,
    Field,
    EnumItem,
    Parameter,
}

/// The declaring node of a name and the identifier that names it.
#[derive(Debug, Clone, Copy)]
pub struct Declaration<'a> {
    pub uri: &'a str,
    pub node: Node<'a>,
    pub name: &'a Ident,
}

impl<'a> Declaration<'a> {
    pub fn is(&self, other: &Declaration<'_>) -> bool {
        self.uri == other.uri && self.name.span == other.name.span
    }

    pub fn class(&self) -> SymbolClass {
        classify_declaration(self.node)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub class: SymbolClass,
    pub span: Span,
    pub selection_span: Span,
    pub children: Vec<Symbol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Namespace,
    Type,
    Function,
    Parameter,
    Variable,
    Property,
    EnumMember,
    String,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticToken {
    pub span: Span,
    pub class: TokenClass,
    pub declaration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub class: SymbolClass,
}

pub struct TreeIndex<'a> {
    tree: &'a SyntaxTree,
}

impl<'a> TreeIndex<'a> {
    pub fn new(tree: &'a SyntaxTree) -> Self {
        TreeIndex { tree }
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn node_at(&self, position: LineCol) -> Option<NodePath<'a>> {
        let offset = self.tree.offset(position);
        self.node_at_offset(offset)
    }

    /// Descends from the root, at each level into the one child whose span
    /// contains `offset`. `None` when the root itself does not contain it.
    pub fn node_at_offset(&self, offset: usize) -> Option<NodePath<'a>> {
        let mut node = Node::File(self.tree.root());
        if !node.span().contains(offset) {
            return None;
        }
        let mut nodes = vec![node];
        while let Some(child) = node
            .children()
            .into_iter()
            .find(|child| child.span().contains(offset))
        {
            nodes.push(child);
            node = child;
        }
        Some(NodePath { nodes })
    }

    /// Path to the identifier at `position`, if there is one.
    pub fn ident_at(&self, position: LineCol) -> Option<NodePath<'a>> {
        let offset = self.tree.offset(position);
        let at = |offset: usize| {
            self.node_at_offset(offset)
                .filter(|path| matches!(path.innermost(), Node::Ident(_)))
        };
        // A cursor just past the last character of a name still refers to it.
        at(offset).or_else(|| offset.checked_sub(1).and_then(at))
    }

    /// Resolves the identifier at `position` to its declaration, looking
    /// through `workspace` for names not declared in this tree.
    pub fn definition(
        &self,
        position: LineCol,
        workspace: &[&'a SyntaxTree],
    ) -> Option<Declaration<'a>> {
        let path = self.ident_at(position)?;
        self.resolve_path(&path, workspace)
    }

    /// Every identifier in this tree that resolves to `decl`, the declaring
    /// name included when it lives here.
    pub fn references_to(
        &self,
        decl: &Declaration<'_>,
        workspace: &[&'a SyntaxTree],
    ) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut stack = Vec::new();
        visit_paths(Node::File(self.tree.root()), &mut stack, &mut |path| {
            if let Some(Node::Ident(ident)) = path.last() {
                if ident.node == decl.name.node {
                    if let Some(found) = self.resolve_path(path, workspace) {
                        if found.is(decl) {
                            spans.push(ident.span);
                        }
                    }
                }
            }
        });
        spans
    }

    pub fn resolve_path(
        &self,
        path: &[Node<'a>],
        workspace: &[&'a SyntaxTree],
    ) -> Option<Declaration<'a>> {
        let (&last, ancestors) = path.split_last()?;
        let Node::Ident(ident) = last else {
            return None;
        };
        let uri = self.tree.uri();

        if let Some(&parent) = ancestors.last() {
            if let Some(name) = declared_name(parent, ident) {
                return Some(Declaration {
                    uri,
                    node: parent,
                    name,
                });
            }
        }

        let name = ident.node.as_str();
        if let Some((node, name)) = find_local(ancestors, name, ident.span.start) {
            return Some(Declaration { uri, node, name });
        }

        let current = ancestors.iter().find_map(|node| match node {
            Node::Module(module) => Some(*module),
            _ => None,
        });
        if let Some(module) = current {
            if let Some((node, name)) = find_in_defs(&module.defs, name) {
                return Some(Declaration { uri, node, name });
            }
        }

        let is_current = |m: &Module| current.is_some_and(|c| std::ptr::eq(c, m));
        if let Some((node, name)) = find_in_file(self.tree.root(), name, &is_current) {
            return Some(Declaration { uri, node, name });
        }

        workspace
            .iter()
            .filter(|other| other.uri() != uri)
            .find_map(|other| {
                find_in_file(other.root(), name, &|_| false).map(|(node, name)| Declaration {
                    uri: other.uri(),
                    node,
                    name,
                })
            })
    }

    /// Module symbols of the file, with module definitions as children.
    pub fn document_symbols(&self) -> Vec<Symbol> {
        self.tree
            .root()
            .modules()
            .map(|module| Symbol {
                name: module.name.node.clone(),
                class: SymbolClass::Module,
                span: module.span,
                selection_span: module.name.span,
                children: module.defs.iter().flat_map(def_symbols).collect(),
            })
            .collect()
    }

    /// Leaf nodes classified by variant and parent context, in span order.
    pub fn semantic_tokens(&self) -> Vec<SemanticToken> {
        let mut tokens = Vec::new();
        let mut stack = Vec::new();
        visit_paths(Node::File(self.tree.root()), &mut stack, &mut |path| {
            let Some((&last, ancestors)) = path.split_last() else {
                return;
            };
            let token = match last {
                Node::Ident(ident) => classify_ident(ancestors, ident),
                Node::Literal(literal) => Some(SemanticToken {
                    span: literal.span,
                    class: match literal.kind {
                        LiteralKind::String => TokenClass::String,
                        LiteralKind::Number | LiteralKind::Bits => TokenClass::Number,
                    },
                    declaration: false,
                }),
                _ => None,
            };
            tokens.extend(token);
        });
        tokens
    }

    /// Names visible at `position`, innermost scope first. Each name is
    /// offered once.
    pub fn completions(&self, position: LineCol, workspace: &[&'a SyntaxTree]) -> Vec<Candidate> {
        let mut seen = FxHashSet::default();
        let mut candidates = Vec::new();
        let mut offer = |name: &str, class: SymbolClass| {
            if seen.insert(name.to_string()) {
                candidates.push(Candidate {
                    name: name.to_string(),
                    class,
                });
            }
        };

        let offset = self.tree.offset(position);
        let path = self
            .node_at_offset(offset)
            .or_else(|| offset.checked_sub(1).and_then(|o| self.node_at_offset(o)));
        let current = path.as_ref().and_then(|path| {
            for node in path.iter().rev() {
                match node {
                    Node::Block(block) => {
                        for item in &block.items {
                            if let BlockItem::Decl(decl) = item {
                                for d in &decl.declarators {
                                    offer(&d.name.node, value_class(decl.kind));
                                }
                            }
                        }
                    }
                    Node::FuncDecl(func) => {
                        for par in &func.params {
                            offer(&par.name.node, SymbolClass::Parameter);
                        }
                    }
                    _ => {}
                }
            }
            path.iter().find_map(|node| match node {
                Node::Module(module) => Some(*module),
                _ => None,
            })
        });

        if let Some(module) = current {
            walk_module_defs(&module.defs, &mut |def| {
                for (node, name) in def_names(def) {
                    offer(&name.node, classify_declaration(node));
                }
                true
            });
        }

        let roots = std::iter::once(self.tree.root()).chain(
            workspace
                .iter()
                .filter(|other| other.uri() != self.tree.uri())
                .map(|other| other.root()),
        );
        for root in roots {
            for module in root.modules() {
                offer(&module.name.node, SymbolClass::Module);
            }
        }

        candidates
    }
}

fn visit_paths<'a>(node: Node<'a>, stack: &mut Vec<Node<'a>>, visit: &mut dyn FnMut(&[Node<'a>])) {
    stack.push(node);
    visit(stack);
    for child in node.children() {
        visit_paths(child, stack, visit);
    }
    stack.pop();
}

/// The name `parent` declares, when `ident` is that name.
fn declared_name<'a>(parent: Node<'a>, ident: &'a Ident) -> Option<&'a Ident> {
    match parent {
        Node::ValueDecl(decl) => decl
            .declarators
            .iter()
            .map(|d| &d.name)
            .find(|name| name.span == ident.span),
        _ => parent.name().filter(|name| name.span == ident.span),
    }
}

/// Block declarations are visible only after their name; parameters in the
/// whole function.
fn find_local<'a>(
    ancestors: &[Node<'a>],
    name: &str,
    offset: usize,
) -> Option<(Node<'a>, &'a Ident)> {
    for node in ancestors.iter().rev() {
        match node {
            Node::Block(block) => {
                for item in &block.items {
                    if let BlockItem::Decl(decl) = item {
                        if let Some(d) = decl
                            .declarators
                            .iter()
                            .find(|d| d.name.node == name && d.name.span.end <= offset)
                        {
                            return Some((Node::ValueDecl(decl), &d.name));
                        }
                    }
                }
            }
            Node::FuncDecl(func) => {
                if let Some(par) = func.params.iter().find(|p| p.name.node == name) {
                    return Some((Node::FormalPar(par), &par.name));
                }
            }
            Node::Module(_) => break,
            _ => {}
        }
    }
    None
}

fn find_in_defs<'a>(defs: &'a [ModuleDef], name: &str) -> Option<(Node<'a>, &'a Ident)> {
    let mut found = None;
    walk_module_defs(defs, &mut |def| {
        found = def_names(def).into_iter().find(|(_, ident)| ident.node == name);
        found.is_none()
    });
    found
}

fn find_in_file<'a>(
    file: &'a SourceFile,
    name: &str,
    skip: &dyn Fn(&Module) -> bool,
) -> Option<(Node<'a>, &'a Ident)> {
    for module in file.modules().filter(|m| !skip(m)) {
        if module.name.node == name {
            return Some((Node::Module(module), &module.name));
        }
        if let Some(found) = find_in_defs(&module.defs, name) {
            return Some(found);
        }
    }
    None
}

/// Names a leaf module definition introduces at module scope. Enumeration
/// items are visible unqualified.
fn def_names(def: &ModuleDef) -> Vec<(Node<'_>, &Ident)> {
    match &def.def {
        Definition::Func(func) => vec![(Node::FuncDecl(func), &func.name)],
        Definition::Value(decl) => decl
            .declarators
            .iter()
            .map(|d| (Node::ValueDecl(decl), &d.name))
            .collect(),
        Definition::Type(ty) => {
            let mut names = vec![(Node::TypeDecl(ty), &ty.name)];
            if ty.kind == TypeKind::Enumerated {
                names.extend(ty.fields.iter().map(|f| (Node::FormalPar(f), &f.name)));
            }
            names
        }
        Definition::Group(_)
        | Definition::Control(_)
        | Definition::Import(_)
        | Definition::Error(_) => Vec::new(),
    }
}

fn def_symbols(def: &ModuleDef) -> Vec<Symbol> {
    let leaf = |name: &Ident, class| Symbol {
        name: name.node.clone(),
        class,
        span: def.span,
        selection_span: name.span,
        children: Vec::new(),
    };
    match &def.def {
        Definition::Group(group) => vec![Symbol {
            name: group.name.node.clone(),
            class: SymbolClass::Group,
            span: def.span,
            selection_span: group.name.span,
            children: group.defs.iter().flat_map(def_symbols).collect(),
        }],
        Definition::Func(func) => vec![leaf(&func.name, classify_declaration(Node::FuncDecl(func)))],
        Definition::Control(control) => vec![Symbol {
            name: "control".to_string(),
            class: SymbolClass::Control,
            span: def.span,
            selection_span: control.keyword_span(),
            children: Vec::new(),
        }],
        Definition::Import(import) => vec![leaf(&import.module, SymbolClass::Import)],
        Definition::Value(decl) => decl
            .declarators
            .iter()
            .map(|d| leaf(&d.name, value_class(decl.kind)))
            .collect(),
        Definition::Type(ty) => {
            let mut symbol = leaf(&ty.name, classify_declaration(Node::TypeDecl(ty)));
            let field_class = if ty.kind == TypeKind::Enumerated {
                SymbolClass::EnumItem
            } else {
                SymbolClass::Field
            };
            symbol.children = ty
                .fields
                .iter()
                .map(|f| Symbol {
                    name: f.name.node.clone(),
                    class: field_class,
                    span: f.span,
                    selection_span: f.name.span,
                    children: Vec::new(),
                })
                .collect();
            vec![symbol]
        }
        Definition::Error(_) => Vec::new(),
    }
}

fn value_class(kind: ValueKind) -> SymbolClass {
    match kind {
        ValueKind::Const => SymbolClass::Const,
        ValueKind::Var => SymbolClass::Variable,
        ValueKind::Template => SymbolClass::Template,
        ValueKind::ModulePar => SymbolClass::ModulePar,
        ValueKind::Timer => SymbolClass::Timer,
        ValueKind::Port => SymbolClass::Port,
    }
}

fn classify_declaration(node: Node<'_>) -> SymbolClass {
    match node {
        Node::Module(_) => SymbolClass::Module,
        Node::GroupDecl(_) => SymbolClass::Group,
        Node::FuncDecl(func) => match func.kind {
            FuncKind::Testcase => SymbolClass::Testcase,
            FuncKind::Altstep => SymbolClass::Altstep,
            FuncKind::Function if func.is_control() => SymbolClass::Control,
            FuncKind::Function | FuncKind::External => SymbolClass::Function,
        },
        Node::ControlPart(_) => SymbolClass::Control,
        Node::ImportDecl(_) => SymbolClass::Import,
        Node::ValueDecl(decl) => value_class(decl.kind),
        Node::TypeDecl(ty) => match ty.kind {
            TypeKind::Enumerated => SymbolClass::Enum,
            TypeKind::Component => SymbolClass::Component,
            _ => SymbolClass::Type,
        },
        // Formal parameters double as fields and enumeration items; without
        // the parent only the parameter reading is known.
        Node::FormalPar(_) => SymbolClass::Parameter,
        Node::File(_)
        | Node::ModuleDef(_)
        | Node::Block(_)
        | Node::Ident(_)
        | Node::Literal(_)
        | Node::Error(_) => SymbolClass::Variable,
    }
}

fn classify_ident(ancestors: &[Node<'_>], ident: &Ident) -> Option<SemanticToken> {
    let (&parent, rest) = ancestors.split_last()?;
    let is_name = declared_name(parent, ident).is_some();
    let class = match parent {
        Node::Module(_) | Node::GroupDecl(_) | Node::ImportDecl(_) => TokenClass::Namespace,
        Node::FuncDecl(_) if is_name => TokenClass::Function,
        Node::FuncDecl(_) => TokenClass::Type,
        Node::TypeDecl(_) => TokenClass::Type,
        Node::ValueDecl(_) if is_name => TokenClass::Variable,
        Node::ValueDecl(_) => TokenClass::Type,
        Node::FormalPar(_) if !is_name => TokenClass::Type,
        Node::FormalPar(_) => match rest.last() {
            Some(Node::TypeDecl(ty)) if ty.kind == TypeKind::Enumerated => TokenClass::EnumMember,
            Some(Node::TypeDecl(_)) => TokenClass::Property,
            _ => TokenClass::Parameter,
        },
        Node::Block(_) => TokenClass::Variable,
        Node::File(_)
        | Node::ModuleDef(_)
        | Node::ControlPart(_)
        | Node::Ident(_)
        | Node::Literal(_)
        | Node::Error(_) => return None,
    };
    Some(SemanticToken {
        span: ident.span,
        class,
        declaration: is_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceText;

    fn tree(uri: &str, text: &str) -> SyntaxTree {
        SyntaxTree::parse(&SourceText::new(uri, text, 1))
    }

    /// Position of the `nth` occurrence of `needle`.
    fn pos(tree: &SyntaxTree, needle: &str, nth: usize) -> LineCol {
        let offset = tree
            .text()
            .match_indices(needle)
            .nth(nth)
            .map(|(i, _)| i)
            .unwrap_or_else(|| panic!("{needle} #{nth} not found"));
        tree.position(offset)
    }

    const SOURCE: &str = "module A {\n  const integer limit := 3;\n  function f(integer n) return integer {\n    var integer limit := n;\n    return limit;\n  }\n  testcase t() { log(limit); }\n}\n";

    #[test]
    fn test_node_at_nests_and_contains() {
        let t = tree("file:///a.ttcn3", SOURCE);
        let index = TreeIndex::new(&t);
        let path = index.node_at(pos(&t, "n;", 0)).expect("path");
        assert!(matches!(path[0], Node::File(_)));
        assert!(matches!(path.innermost(), Node::Ident(i) if i.node == "n"));
        for pair in path.windows(2) {
            assert!(pair[0].span().covers(&pair[1].span()));
        }
    }

    #[test]
    fn test_node_at_outside_root() {
        let t = tree("file:///a.ttcn3", SOURCE);
        let index = TreeIndex::new(&t);
        assert!(index.node_at_offset(SOURCE.len() + 10).is_none());
    }

    #[test]
    fn test_definition_prefers_locals() {
        let t = tree("file:///a.ttcn3", SOURCE);
        let index = TreeIndex::new(&t);

        let local = index.definition(pos(&t, "limit;", 0), &[]).expect("local");
        assert!(matches!(local.node, Node::ValueDecl(v) if v.kind == ValueKind::Var));

        let global = index.definition(pos(&t, "limit)", 0), &[]).expect("global");
        assert!(matches!(global.node, Node::ValueDecl(v) if v.kind == ValueKind::Const));

        let param = index.definition(pos(&t, "n;", 0), &[]).expect("param");
        assert!(matches!(param.node, Node::FormalPar(_)));
    }

    #[test]
    fn test_local_declared_after_use_is_not_visible() {
        let source = "module A {\n  const integer limit := 3;\n  testcase t() {\n    log(limit);\n    var integer limit := 1;\n  }\n}\n";
        let t = tree("file:///a.ttcn3", source);
        let index = TreeIndex::new(&t);

        let early = index.definition(pos(&t, "limit)", 0), &[]).expect("early use");
        assert!(matches!(early.node, Node::ValueDecl(v) if v.kind == ValueKind::Const));
    }

    #[test]
    fn test_declaration_name_resolves_to_itself() {
        let t = tree("file:///a.ttcn3", SOURCE);
        let index = TreeIndex::new(&t);
        let decl = index.definition(pos(&t, "f(", 0), &[]).expect("decl");
        assert!(matches!(decl.node, Node::FuncDecl(_)));
        assert_eq!(decl.name.node, "f");
    }

    #[test]
    fn test_definition_across_files() {
        let a = tree("file:///a.ttcn3", "module A { import from B all; testcase t() { helper(); } }");
        let b = tree("file:///b.ttcn3", "module B { function helper() {} }");
        let index = TreeIndex::new(&a);
        let decl = index
            .definition(pos(&a, "helper", 0), &[&a, &b])
            .expect("decl");
        assert_eq!(decl.uri, "file:///b.ttcn3");
        assert_eq!(decl.class(), SymbolClass::Function);

        let module = index.definition(pos(&a, "B all", 0), &[&a, &b]).expect("module");
        assert!(matches!(module.node, Node::Module(m) if m.name.node == "B"));
    }

    #[test]
    fn test_references_skip_shadowed_names() {
        let t = tree("file:///a.ttcn3", SOURCE);
        let index = TreeIndex::new(&t);
        let decl = index.definition(pos(&t, "limit", 0), &[]).expect("decl");
        let spans = index.references_to(&decl, &[]);
        // The declaration and the use inside `t`; not the local in `f`.
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_document_symbols_nest_groups() {
        let t = tree(
            "file:///a.ttcn3",
            "module A { group g { testcase t1() {} } type enumerated E { x, y } control {} }",
        );
        let symbols = TreeIndex::new(&t).document_symbols();
        assert_eq!(symbols.len(), 1);
        let children = &symbols[0].children;
        let names: Vec<_> = children.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["g", "E", "control"]);
        assert_eq!(children[0].children[0].class, SymbolClass::Testcase);
        assert_eq!(children[1].children.len(), 2);
    }

    #[test]
    fn test_semantic_tokens_in_span_order() {
        let t = tree("file:///a.ttcn3", SOURCE);
        let tokens = TreeIndex::new(&t).semantic_tokens();
        assert!(tokens.windows(2).all(|w| w[0].span.start < w[1].span.start));
        assert_eq!(tokens[0].class, TokenClass::Namespace);
        assert!(tokens.iter().any(|t| t.class == TokenClass::Number));
        assert!(tokens
            .iter()
            .any(|t| t.class == TokenClass::Function && t.declaration));
    }

    #[test]
    fn test_semantic_tokens_classify_fields() {
        let t = tree(
            "file:///a.ttcn3",
            "module A { type record R { integer f } type enumerated E { e1 } }",
        );
        let classes: Vec<_> = TreeIndex::new(&t)
            .semantic_tokens()
            .into_iter()
            .map(|t| t.class)
            .collect();
        assert_eq!(
            classes,
            vec![
                TokenClass::Namespace,
                TokenClass::Type,
                TokenClass::Type,
                TokenClass::Property,
                TokenClass::Type,
                TokenClass::EnumMember,
            ]
        );
    }

    #[test]
    fn test_completions_innermost_first() {
        let t = tree("file:///a.ttcn3", SOURCE);
        let index = TreeIndex::new(&t);
        let candidates = index.completions(pos(&t, "return limit", 0), &[]);
        let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names[0], "limit");
        assert_eq!(candidates[0].class, SymbolClass::Variable);
        assert!(names.contains(&"n"));
        assert!(names.contains(&"t"));
        assert!(names.contains(&"A"));
    }
}
