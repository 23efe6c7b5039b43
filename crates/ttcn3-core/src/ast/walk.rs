use super::{Definition, ModuleDef, Node};

/// Calls `visit` for every leaf module definition, depth first in
/// declaration order. Groups are descended into and never visited
/// themselves. Returning `false` from `visit` stops the walk.
pub fn walk_module_defs<'a, F>(defs: &'a [ModuleDef], visit: &mut F) -> bool
where
    F: FnMut(&'a ModuleDef) -> bool,
{
    for def in defs {
        let keep_going = match &def.def {
            Definition::Group(group) => walk_module_defs(&group.defs, visit),
            _ => visit(def),
        };
        if !keep_going {
            return false;
        }
    }
    true
}

/// Pre-order traversal. `visit` returns whether to descend into the node's
/// children.
pub fn inspect<'a, F>(node: Node<'a>, visit: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    if visit(node) {
        for child in node.children() {
            inspect(child, visit);
        }
    }
}
