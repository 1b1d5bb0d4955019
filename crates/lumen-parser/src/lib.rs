//! Recursive-descent / Pratt parser: token stream -> AST.
//!
//! Syntax errors never abort the parse outright (panic-mode recovery
//! resynchronizes at the next statement boundary); they accumulate into a
//! [`DiagnosticEngine`] shared with the type checker, so both layers render
//! errors through the same span-aware formatting.

mod parser;
pub use parser::Parser;

use lumen_ast::Program;
use lumen_diagnostics::DiagnosticEngine;

/// Parse `source` (from a file notionally named `file`, used only for
/// diagnostic spans) into a [`Program`]. Returns `None` once any syntax
/// error was reported — a null sentinel rather than a partial tree — but the
/// [`DiagnosticEngine`] returned alongside always carries everything
/// emitted, whether or not parsing ultimately succeeded.
pub fn parse(file: &str, source: &str) -> (Option<Program>, DiagnosticEngine) {
    let mut parser = match Parser::new(file, source) {
        Ok(parser) => parser,
        Err(diagnostics) => return (None, diagnostics),
    };
    let program = parser.parse_program();
    let (had_error, diagnostics) = parser.finish();
    (if had_error { None } else { Some(program) }, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_ast::{Expr, Stmt, Value};

    #[test]
    fn parses_a_var_declaration() {
        let (program, diagnostics) = parse("test", "var x: Number = 1;");
        assert!(!diagnostics.has_errors());
        let program = program.expect("expected a program");
        assert_eq!(program.statements.len(), 1);
        match program.ast.stmt(program.statements[0]) {
            Stmt::Var { name, init: Some(init), .. } => {
                assert_eq!(name, "x");
                assert!(matches!(
                    program.ast.expr(*init),
                    Expr::Literal(Value::Number(n)) if *n == 1.0
                ));
            }
            other => panic!("expected Var, got {other:?}"),
        }
    }

    #[test]
    fn reports_syntax_errors_without_panicking() {
        let (program, diagnostics) = parse("test", "var x = ;");
        assert!(diagnostics.has_errors());
        assert!(program.is_none());
    }
}
