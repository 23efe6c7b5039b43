use super::*;
use crate::ast::*;
use crate::diagnostics::{CollectingDiagnosticHandler, Diagnostic};
use crate::lexer::Lexer;
use std::sync::Arc;

fn parse_source(source: &str) -> (SourceFile, Vec<Diagnostic>) {
    let handler = Arc::new(CollectingDiagnosticHandler::new());
    let mut lexer = Lexer::new(source, handler.clone());
    let tokens = lexer.tokenize();
    let mut parser = Parser::new(tokens, handler.clone());
    let file = parser.parse();
    (file, handler.get_diagnostics())
}

fn single_module(file: &SourceFile) -> &Module {
    let modules: Vec<_> = file.modules().collect();
    assert_eq!(modules.len(), 1, "expected exactly one module");
    modules[0]
}

#[test]
fn test_parse_module_definitions() {
    let source = r#"
        module Example {
            import from Other all;
            type record Pair { integer first, charstring second optional }
            const integer answer := 42;
            testcase tc_pair() runs on Comp { var Pair p := { first := answer }; }
            function @control main() { execute(tc_pair()); }
            control { execute(tc_pair()); }
        }
    "#;
    let (file, diagnostics) = parse_source(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let module = single_module(&file);
    assert_eq!(module.name.node, "Example");
    assert_eq!(module.defs.len(), 6);

    assert!(matches!(&module.defs[0].def, Definition::Import(i) if i.module.node == "Other"));
    match &module.defs[1].def {
        Definition::Type(t) => {
            assert_eq!(t.kind, TypeKind::Record);
            assert_eq!(t.fields.len(), 2);
            assert_eq!(t.fields[1].name.node, "second");
            assert_eq!(t.fields[1].ty.as_ref().map(|t| t.node.as_str()), Some("charstring"));
        }
        other => panic!("Expected type declaration, got {:?}", other),
    }
    match &module.defs[3].def {
        Definition::Func(f) => {
            assert!(f.is_test());
            assert_eq!(f.runs_on.as_ref().map(|r| r.node.as_str()), Some("Comp"));
            assert!(f.body.is_some());
        }
        other => panic!("Expected testcase, got {:?}", other),
    }
    match &module.defs[4].def {
        Definition::Func(f) => assert!(f.is_control()),
        other => panic!("Expected control function, got {:?}", other),
    }
    assert!(matches!(&module.defs[5].def, Definition::Control(_)));
}

#[test]
fn test_parse_formal_parameters() {
    let source = r#"module M {
        function f(in integer a, out charstring b := "x", c) return boolean {}
    }"#;
    let (file, diagnostics) = parse_source(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    match &single_module(&file).defs[0].def {
        Definition::Func(f) => {
            let names: Vec<_> = f.params.iter().map(|p| p.name.node.as_str()).collect();
            assert_eq!(names, vec!["a", "b", "c"]);
            assert_eq!(f.params[0].ty.as_ref().map(|t| t.node.as_str()), Some("integer"));
            assert!(f.params[2].ty.is_none());
            assert_eq!(f.return_type.as_ref().map(|t| t.node.as_str()), Some("boolean"));
        }
        other => panic!("Expected function, got {:?}", other),
    }
}

#[test]
fn test_parse_value_declarators() {
    let source = "module M { const integer c := 5, d := c; timer t1 := 1.0, t2; }";
    let (file, diagnostics) = parse_source(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let module = single_module(&file);
    match &module.defs[0].def {
        Definition::Value(v) => {
            assert_eq!(v.kind, ValueKind::Const);
            assert_eq!(v.ty.as_ref().map(|t| t.node.as_str()), Some("integer"));
            assert_eq!(v.declarators.len(), 2);
            assert!(matches!(&v.declarators[1].value[0], BlockItem::Ref(r) if r.node == "c"));
        }
        other => panic!("Expected const, got {:?}", other),
    }
    match &module.defs[1].def {
        Definition::Value(v) => {
            assert_eq!(v.kind, ValueKind::Timer);
            assert!(v.ty.is_none());
            assert_eq!(v.declarators.len(), 2);
        }
        other => panic!("Expected timer, got {:?}", other),
    }
}

#[test]
fn test_groups_nest() {
    let source = "module M { group outer { group inner { testcase t() {} } } }";
    let (file, diagnostics) = parse_source(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let mut tests = Vec::new();
    walk_module_defs(&single_module(&file).defs, &mut |def| {
        if let Definition::Func(f) = &def.def {
            tests.push(f.name.node.clone());
        }
        true
    });
    assert_eq!(tests, vec!["t".to_string()]);
}

#[test]
fn test_type_forms() {
    let source = r#"module M {
        type record of integer Numbers;
        type enumerated Color { red, green(2), blue }
        type integer Byte (0..255);
        type component Comp { var integer counter; port P p; }
        type port P message { inout integer }
    }"#;
    let (file, diagnostics) = parse_source(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let kinds: Vec<_> = single_module(&file)
        .defs
        .iter()
        .filter_map(|d| match &d.def {
            Definition::Type(t) => Some((t.kind, t.name.node.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            (TypeKind::RecordOf, "Numbers"),
            (TypeKind::Enumerated, "Color"),
            (TypeKind::Alias, "Byte"),
            (TypeKind::Component, "Comp"),
            (TypeKind::Port, "P"),
        ]
    );
}

#[test]
fn test_missing_brace_reports_once() {
    let source = "module M {\n  testcase t() {\n    log(\"x\");\n\n  testcase u() {}\n}\n";
    let (file, diagnostics) = parse_source(source);
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].span.line, 5);

    let module = single_module(&file);
    assert_eq!(module.defs.len(), 2);
    assert!(matches!(&module.defs[1].def, Definition::Func(f) if f.name.node == "u"));
}

#[test]
fn test_unclosed_at_end_of_file_reports_once() {
    let (file, diagnostics) = parse_source("module M { testcase t() { var integer x;");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert!(diagnostics[0].message.contains("end of file"));
    assert_eq!(single_module(&file).defs.len(), 1);
}

#[test]
fn test_garbage_definition_becomes_error_node() {
    let (file, diagnostics) = parse_source("module M { 123 testcase t() {} }");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert!(diagnostics[0].message.starts_with("expected definition"));

    let module = single_module(&file);
    assert_eq!(module.defs.len(), 2);
    assert!(matches!(module.defs[0].def, Definition::Error(_)));
    assert!(matches!(module.defs[1].def, Definition::Func(_)));
}

#[test]
fn test_unclosed_parameter_list_keeps_body() {
    let (file, diagnostics) = parse_source("module A { testcase t1( {} testcase t2() {} }");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert!(diagnostics[0].message.contains("')' to close parameter list"));

    let module = single_module(&file);
    assert_eq!(module.defs.len(), 2);
    match &module.defs[0].def {
        Definition::Func(f) => {
            assert_eq!(f.name.node, "t1");
            assert!(f.params.is_empty());
            assert!(f.body.is_some());
        }
        other => panic!("Expected testcase, got {:?}", other),
    }
    assert!(matches!(&module.defs[1].def, Definition::Func(f) if f.name.node == "t2"));
}

#[test]
fn test_unclosed_parameter_list_before_next_definition() {
    let (file, diagnostics) = parse_source("module A { testcase t1(integer a testcase t2() {} }");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);

    let module = single_module(&file);
    assert_eq!(module.defs.len(), 2);
    assert!(matches!(&module.defs[0].def, Definition::Func(f) if f.body.is_none()));
    assert!(matches!(&module.defs[1].def, Definition::Func(f) if f.name.node == "t2"));
}

#[test]
fn test_missing_initializer() {
    let (file, diagnostics) = parse_source("module M { const integer x := ; testcase t() {} }");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert!(diagnostics[0].message.contains("expression after ':='"));

    let module = single_module(&file);
    assert_eq!(module.defs.len(), 2);
    assert!(matches!(module.defs[0].def, Definition::Error(_)));
    assert!(matches!(module.defs[1].def, Definition::Func(_)));
}

#[test]
fn test_declaration_without_type() {
    let (file, diagnostics) =
        parse_source("module M { testcase t() { var integer := 1; log(t); } }");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert!(diagnostics[0].message.starts_with("expected name"));

    match &single_module(&file).defs[0].def {
        Definition::Func(f) => {
            let body = f.body.as_ref().expect("body");
            assert!(!body.items.iter().any(|item| matches!(item, BlockItem::Decl(_))));
        }
        other => panic!("Expected testcase, got {:?}", other),
    }
}

#[test]
fn test_trailing_comma_in_lists() {
    let source = "module M {
        type record R { integer a, }
        function f(integer p, ) {}
        type enumerated E { red, }
        testcase t() {}
    }";
    let (file, diagnostics) = parse_source(source);
    assert_eq!(diagnostics.len(), 3, "{:?}", diagnostics);
    assert!(diagnostics[0].message.starts_with("expected field name, found '}'"));
    assert!(diagnostics[1].message.starts_with("expected parameter name, found ')'"));
    assert!(diagnostics[2].message.starts_with("expected enumeration item"));

    let module = single_module(&file);
    assert_eq!(module.defs.len(), 4);
    assert!(matches!(&module.defs[0].def, Definition::Type(t) if t.fields.len() == 1));
    assert!(matches!(&module.defs[1].def, Definition::Func(f) if f.params.len() == 1));
    assert!(matches!(&module.defs[3].def, Definition::Func(f) if f.name.node == "t"));
}

#[test]
fn test_tokens_outside_module() {
    let (file, diagnostics) = parse_source("garbage here module M {}");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(file.items.len(), 2);
    assert!(matches!(file.items[0], TopLevel::Error(_)));
    assert!(matches!(file.items[1], TopLevel::Module(_)));
}

#[test]
fn test_empty_source() {
    let (file, diagnostics) = parse_source("  // nothing\n");
    assert!(diagnostics.is_empty());
    assert!(file.is_empty());
}

#[test]
fn test_with_attributes_are_skipped() {
    let source = r#"module M {
        type integer I with { variant "32 bit" };
        testcase t() {}
    } with { encode "RAW" }"#;
    let (file, diagnostics) = parse_source(source);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    assert_eq!(single_module(&file).defs.len(), 2);
}

#[test]
fn test_reserved_words_sorted() {
    assert!(RESERVED_WORDS.windows(2).all(|w| w[0] < w[1]));
    assert!(is_reserved_word("log"));
    assert!(!is_reserved_word("answer"));
}
