use super::pattern::QualifiedName;
use crate::ast::{walk_module_defs, Definition, SourceFile};
use crate::span::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Testcase,
    /// `function @control`
    ControlFunction,
    /// A module's `control { ... }` part.
    Control,
}

/// An executable entry point discovered in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: QualifiedName,
    pub kind: UnitKind,
    /// Span of the unit's name, or of the `control` keyword.
    pub span: Span,
}

/// Test cases, control functions and control parts of `file`, depth first
/// in declaration order. Groups are looked through.
pub fn discover_units(file: &SourceFile) -> Vec<Unit> {
    let mut units = Vec::new();
    for module in file.modules() {
        let module_name = module.name.node.as_str();
        walk_module_defs(&module.defs, &mut |def| {
            match &def.def {
                Definition::Func(func) if func.is_test() || func.is_control() => {
                    units.push(Unit {
                        name: QualifiedName::new(module_name, &func.name.node),
                        kind: if func.is_test() {
                            UnitKind::Testcase
                        } else {
                            UnitKind::ControlFunction
                        },
                        span: func.name.span,
                    });
                }
                Definition::Control(control) => units.push(Unit {
                    name: QualifiedName::new(module_name, "control"),
                    kind: UnitKind::Control,
                    span: control.keyword_span(),
                }),
                _ => {}
            }
            true
        });
    }
    units
}
