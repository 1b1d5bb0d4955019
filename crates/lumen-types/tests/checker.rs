// Whole-program checker scenarios, one per spec concrete scenario.

use lumen_diagnostics::DiagnosticEngine;

fn check_source(source: &str) -> (bool, DiagnosticEngine) {
    let (program, parse_diagnostics) = lumen_parser::parse("test.lm", source);
    assert!(!parse_diagnostics.has_errors(), "unexpected parse errors: {:?}", parse_diagnostics.diagnostics());
    let program = program.expect("parser produced no program despite no errors");
    let (had_error, diagnostics, _types) = lumen_types::checker::check("test.lm", source, &program);
    (had_error, diagnostics)
}

#[test]
fn basic_typing_accepts_matching_annotation() {
    let (had_error, _) = check_source("var x: Number = 1;");
    assert!(!had_error);
}

#[test]
fn basic_typing_rejects_mismatched_annotation() {
    let (had_error, diagnostics) = check_source("var y: Number = \"s\";");
    assert!(had_error);
    assert!(diagnostics.has_errors());
}

#[test]
fn structural_interface_passes_when_class_matches_shape() {
    let source = r#"
        interface HasName { var name: String; }
        class P { var name: String; }
        var p: HasName = P();
    "#;
    let (had_error, diagnostics) = check_source(source);
    assert!(!had_error, "diagnostics: {:?}", diagnostics.diagnostics());
}

#[test]
fn structural_interface_rejects_missing_field() {
    let source = r#"
        interface HasName { var name: String; }
        class Q { var age: Number; }
        var q: HasName = Q();
    "#;
    let (had_error, _) = check_source(source);
    assert!(had_error);
}

#[test]
fn generic_inference_binds_type_parameter() {
    let source = r#"
        fun id<T>(x: T): T { return x; }
        var n: Number = id(7);
    "#;
    let (had_error, diagnostics) = check_source(source);
    assert!(!had_error, "diagnostics: {:?}", diagnostics.diagnostics());
}

#[test]
fn generic_inference_rejects_mismatched_binding() {
    let source = r#"
        fun id<T>(x: T): T { return x; }
        var n: String = id(7);
    "#;
    let (had_error, _) = check_source(source);
    assert!(had_error);
}

#[test]
fn list_literal_infers_element_type() {
    let (had_error, diagnostics) = check_source("var xs = [1, 2, 3];");
    assert!(!had_error, "diagnostics: {:?}", diagnostics.diagnostics());
}

#[test]
fn list_literal_rejects_mismatched_annotation() {
    let (had_error, _) = check_source("var ys: List<String> = [1];");
    assert!(had_error);
}

#[test]
fn undefined_variable_reports_a_diagnostic_with_suggestion() {
    let source = r#"
        var coount: Number = 1;
        var y: Number = count;
    "#;
    let (had_error, diagnostics) = check_source(source);
    assert!(had_error);
    assert!(diagnostics.diagnostics().iter().any(|d| d.message.contains("count")));
}

#[test]
fn class_self_reference_resolves_through_placeholder_binding() {
    let source = r#"
        class Node {
            var next: Node;
        }
    "#;
    let (had_error, diagnostics) = check_source(source);
    assert!(!had_error, "diagnostics: {:?}", diagnostics.diagnostics());
}

#[test]
fn return_type_is_inferred_from_body_when_unannotated() {
    let source = r#"
        fun makeNumber() { return 42; }
        var n: Number = makeNumber();
    "#;
    let (had_error, diagnostics) = check_source(source);
    assert!(!had_error, "diagnostics: {:?}", diagnostics.diagnostics());
}

#[test]
fn class_cannot_extend_itself() {
    let (had_error, _) = check_source("class Loop extends Loop {}");
    assert!(had_error);
}

#[test]
fn interface_cannot_extend_itself() {
    let (had_error, _) = check_source("interface Loop extends Loop {}");
    assert!(had_error);
}

#[test]
fn import_caches_module_by_path_identity() {
    struct OneFile;
    impl lumen_types::checker::FileReader for OneFile {
        fn read_to_string(&self, _path: &std::path::Path) -> std::io::Result<String> {
            Ok("var shared: Number = 1;".to_string())
        }
    }

    let source = r#"
        import "shared.lm" as A;
        import "shared.lm" as B;
    "#;
    let (program, parse_diagnostics) = lumen_parser::parse("main.lm", source);
    assert!(!parse_diagnostics.has_errors());
    let program = program.expect("parser produced no program");

    let mut checker = lumen_types::checker::Checker::with_reader("main.lm", source, Box::new(OneFile));
    checker.check_program(&program);
    let (had_error, diagnostics, _types) = checker.finish();
    assert!(!had_error, "diagnostics: {:?}", diagnostics.diagnostics());
}
