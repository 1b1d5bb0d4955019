//! `import "path" as Name;`: resolves by parsing and checking the
//! target file in a fresh environment and caching the result by
//! path-string identity, so repeated imports of the same path within
//! one check return the same module object rather than re-checking it.
//! The cache lives on one `Checker`'s [`SharedContext`] rather than a
//! process-wide global.

use std::rc::Rc;

use lumen_ast::Span;
use lumen_diagnostics::error_codes;

use super::Checker;
use crate::types::{self, Type};

impl Checker {
    pub(crate) fn check_import(&mut self, path: &str, alias: &str, span: Span) {
        if let Some(cached) = self.ctx.modules.borrow().get(path).cloned() {
            self.bind_module(alias, cached);
            return;
        }

        let resolved_path = self.base_dir.join(path);
        let source = match self.ctx.reader.read_to_string(&resolved_path) {
            Ok(source) => source,
            Err(err) => {
                self.had_error = true;
                let diag_span = self.diag_span(span);
                self.diagnostics.emit_error(
                    error_codes::MODULE_NOT_FOUND,
                    format!("could not read module `{path}`: {err}"),
                    diag_span,
                );
                return;
            }
        };

        let (program, parse_diagnostics) = lumen_parser::parse(path, &source);
        self.diagnostics.merge(parse_diagnostics);
        let Some(program) = program else {
            self.had_error = true;
            return;
        };

        let mut child = Checker::new(path, &source, Rc::clone(&self.ctx));
        child.check_program(&program);
        if child.had_error {
            self.had_error = true;
        }
        let fields = child.env.own_local_entries();
        self.diagnostics.merge(child.diagnostics);

        let module_ty = types::simple(path, Vec::new());
        if let Type::Simple(s) = &*module_ty {
            for (name, ty) in fields {
                s.fields.borrow_mut().insert(name, ty);
            }
        }
        self.ctx.modules.borrow_mut().insert(path.to_string(), module_ty.clone());
        self.bind_module(alias, module_ty);
    }

    fn bind_module(&mut self, alias: &str, module_ty: crate::types::TypeRef) {
        self.env.define_type(alias.to_string(), module_ty.clone());
        self.env.define_local(alias.to_string(), module_ty);
    }
}
