use lumen_ast::{Expr, Stmt};
use lumen_parser::parse;

#[test]
fn pipe_operator_rewrites_into_a_call_with_prepended_argument() {
    let (program, diagnostics) = parse("test", "a |> f(b);");
    assert!(!diagnostics.has_errors(), "diagnostics: {:?}", diagnostics.diagnostics());
    let program = program.expect("expected a program");

    let Stmt::Expression(expr) = program.ast.stmt(program.statements[0]) else {
        panic!("expected an expression statement");
    };
    let Expr::Call { callee, args, .. } = program.ast.expr(*expr) else {
        panic!("expected a call expression");
    };
    assert!(matches!(program.ast.expr(*callee), Expr::Variable { name, .. } if name == "f"));
    assert_eq!(args.len(), 2);
    assert!(matches!(program.ast.expr(args[0]), Expr::Variable { name, .. } if name == "a"));
    assert!(matches!(program.ast.expr(args[1]), Expr::Variable { name, .. } if name == "b"));
}

#[test]
fn pipe_operator_requires_a_call_on_the_right() {
    let (program, diagnostics) = parse("test", "a |> b;");
    assert!(diagnostics.has_errors());
    assert!(program.is_none());
}

#[test]
fn interface_field_signature_parses_as_var_not_method_sig() {
    let (program, diagnostics) = parse("test", "interface HasName { var name: String; }");
    assert!(!diagnostics.has_errors(), "diagnostics: {:?}", diagnostics.diagnostics());
    let program = program.expect("expected a program");

    let Stmt::Interface { body, .. } = program.ast.stmt(program.statements[0]) else {
        panic!("expected an interface declaration");
    };
    assert_eq!(body.len(), 1);
    match program.ast.stmt(body[0]) {
        Stmt::Var { name, init, .. } => {
            assert_eq!(name, "name");
            assert!(init.is_none());
        }
        other => panic!("expected a field Var signature, got {other:?}"),
    }
}

#[test]
fn interface_method_signature_still_parses_as_method_sig() {
    let (program, diagnostics) = parse("test", "interface Greeter { fun greet(who: String): String; }");
    assert!(!diagnostics.has_errors(), "diagnostics: {:?}", diagnostics.diagnostics());
    let program = program.expect("expected a program");

    let Stmt::Interface { body, .. } = program.ast.stmt(program.statements[0]) else {
        panic!("expected an interface declaration");
    };
    assert_eq!(body.len(), 1);
    match program.ast.stmt(body[0]) {
        Stmt::MethodSig { name, params, .. } => {
            assert_eq!(name, "greet");
            assert_eq!(params.len(), 1);
        }
        other => panic!("expected a MethodSig, got {other:?}"),
    }
}
