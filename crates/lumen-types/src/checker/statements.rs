//! Statement/declaration typing: environment push/pop per
//! function/lambda/class/interface/method/`type` body, global-table
//! side effects for declarations, and the expected-assignment-type
//! propagation around every `Var` initializer.

use lumen_ast::{Ast, EnumVariant, FunctionKind, GenericParam, NodeId, Param, Stmt, TypeNode};

use super::Checker;
use crate::types::{self, Type, TypeRef};

impl Checker {
    pub(crate) fn check_stmt(&mut self, ast: &Ast, id: NodeId) {
        match ast.stmt(id) {
            Stmt::Expression(expr) => {
                self.check_expr(ast, *expr);
            }
            Stmt::Var { name, ty, init, span, .. } => self.check_var(ast, name, ty, init, *span),
            Stmt::Block(stmts) => {
                self.push_env();
                for &s in stmts {
                    self.check_stmt(ast, s);
                }
                self.pop_env();
            }
            Stmt::Function { name, kind, generics, params, ret, body } => {
                let functor = self.check_function_like(ast, generics, params, ret, *body, *kind);
                self.env.define_local(name.clone(), functor);
            }
            Stmt::Class { name, generics, superclass, body } => {
                self.check_class(ast, name, generics, *superclass, body)
            }
            Stmt::Interface { name, generics, supertype, body } => {
                self.check_interface(ast, name, generics, supertype, body)
            }
            Stmt::MethodSig { .. } => {
                // Only reachable inside an interface body, handled
                // directly by `check_interface` — a bare walk never
                // visits one standalone.
            }
            Stmt::If { cond, then_branch, else_branch } => {
                self.check_expr(ast, *cond);
                self.check_stmt(ast, *then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(ast, *else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.check_expr(ast, *cond);
                self.check_stmt(ast, *body);
            }
            Stmt::For { init, cond, incr, body } => {
                self.push_env();
                if let Some(init) = init {
                    self.check_stmt(ast, *init);
                }
                if let Some(cond) = cond {
                    self.check_expr(ast, *cond);
                }
                self.check_stmt(ast, *body);
                if let Some(incr) = incr {
                    self.check_expr(ast, *incr);
                }
                self.pop_env();
            }
            Stmt::Return { keyword, value } => self.check_return(ast, value, *keyword),
            Stmt::Break => {}
            Stmt::Import { path, alias, span } => self.check_import(path, alias, *span),
            Stmt::TypeDeclaration { name, generics, target } => {
                self.push_env();
                self.declare_generics(generics);
                let target_ty = self.eval_type_node(target);
                self.pop_env();
                self.env.define_type(name.clone(), target_ty);
            }
            Stmt::Enum { name, generics, variants } => self.check_enum(name, generics, variants),
        }
    }

    /// `var name (: T)? (= init)? ;`. The expected assignment type is
    /// saved and set to the annotation (if any) around the initializer
    /// so list/map literals can see their expected element shape.
    fn check_var(&mut self, ast: &Ast, name: &str, ty: &Option<TypeNode>, init: &Option<NodeId>, span: lumen_ast::Span) {
        let declared = ty.as_ref().map(|t| self.eval_type_node(t));

        let saved = self.assignment_type.take();
        self.assignment_type = declared.clone();
        let init_ty = init.map(|e| self.check_expr(ast, e));
        self.assignment_type = saved;

        let final_ty = match (&declared, &init_ty) {
            (Some(declared), Some(init_ty)) => {
                self.require_subtype(init_ty, declared, span);
                declared.clone()
            }
            (Some(declared), None) => declared.clone(),
            (None, Some(init_ty)) => init_ty.clone(),
            (None, None) => self.any_type(),
        };
        self.env.define_local(name.to_string(), final_ty);
    }

    /// Shared by `Stmt::Function` and `Expr::Lambda`: push an
    /// environment, declare generics, bind parameter types, open a
    /// return-inference scope, check the body, and build the resulting
    /// `FunctorType`.
    pub(crate) fn check_function_like(
        &mut self,
        ast: &Ast,
        generics: &[GenericParam],
        params: &[Param],
        ret: &Option<TypeNode>,
        body: NodeId,
        _kind: FunctionKind,
    ) -> TypeRef {
        self.push_env();
        let generic_defs = self.declare_generics(generics);

        let param_types: Vec<TypeRef> = params.iter().map(|p| self.eval_optional_type_node(&p.ty)).collect();
        for (p, ty) in params.iter().zip(&param_types) {
            self.env.define_local(p.name.clone(), ty.clone());
        }

        let explicit_ret = ret.as_ref().map(|t| self.eval_type_node(t));
        self.env.start_function_scope(explicit_ret);

        self.check_stmt(ast, body);

        let ret_ty = self
            .env
            .return_slot()
            .and_then(|slot| slot.borrow().clone())
            .unwrap_or_else(|| self.nil_type());

        for (param, def) in generics.iter().zip(&generic_defs) {
            let used = param_types.iter().any(|t| types::mentions_generic_def(t, def))
                || types::mentions_generic_def(&ret_ty, def);
            if !used {
                let span = self.diag_span(lumen_ast::Span::unknown());
                self.diagnostics.emit_warning(
                    lumen_diagnostics::error_codes::UNUSED_GENERIC_PARAM,
                    format!("generic parameter `{}` is never used in its parameters or return type", param.name),
                    span,
                );
            }
        }

        self.pop_env();
        types::functor(param_types, ret_ty, generic_defs)
    }

    /// `return`: if the enclosing functor already has a return type,
    /// check value <: return; otherwise infer the functor's return
    /// type — resolved via the shared `return_slot`: an explicit
    /// annotation fixes the slot up front, an absent one leaves it
    /// open for the first `Return` encountered to fill, and a body that
    /// never returns at all falls back to `Nil`.
    fn check_return(&mut self, ast: &Ast, value: &Option<NodeId>, span: lumen_ast::Span) {
        let value_ty = match value {
            Some(v) => self.check_expr(ast, *v),
            None => self.nil_type(),
        };

        match self.env.return_slot() {
            Some(slot) => {
                let current = slot.borrow().clone();
                match current {
                    Some(expected) => {
                        self.require_subtype(&value_ty, &expected, span);
                    }
                    None => {
                        *slot.borrow_mut() = Some(value_ty);
                    }
                }
            }
            None => {
                self.had_error = true;
                let diag_span = self.diag_span(span);
                self.diagnostics.emit_error(
                    lumen_diagnostics::error_codes::SYNTAX_ERROR,
                    "'return' used outside of a function".to_string(),
                    diag_span,
                );
            }
        }
    }

    /// `class`: build a fresh `SimpleType`, record generics, copy
    /// inherited method/field tables from the supertype, then for each
    /// body member install method types or field types. A parallel
    /// constructor `FunctorType` (built from `init`, if any) is
    /// installed as the class's *value* binding, while the `SimpleType`
    /// itself becomes the type-definition. The placeholder is bound
    /// before the body is walked so a method referencing its own class
    /// resolves.
    fn check_class(&mut self, ast: &Ast, name: &str, generics: &[GenericParam], superclass: Option<NodeId>, body: &[NodeId]) {
        let outer = self.env.clone();

        self.push_env();
        let generic_defs = self.declare_generics(generics);
        let placeholder = types::simple(name, generic_defs);
        outer.define_type(name.to_string(), placeholder.clone());
        self.env.set_class_context(placeholder.clone());

        if let Some(sc_id) = superclass {
            self.resolve_superclass(ast, sc_id, name, &placeholder);
        }

        let mut ctor: Option<TypeRef> = None;
        for &member in body {
            match ast.stmt(member) {
                Stmt::Var { name: field_name, ty, init, span, .. } => {
                    let field_ty = self.check_class_field(ast, ty, init, *span);
                    if let Type::Simple(s) = &*placeholder {
                        s.fields.borrow_mut().insert(field_name.clone(), field_ty);
                    }
                }
                Stmt::Function { name: method_name, kind, generics: mg, params, ret, body: mbody } => {
                    let functor = self.check_function_like(ast, mg, params, ret, *mbody, *kind);
                    if *kind == FunctionKind::Initializer {
                        if let Some(f) = functor.as_functor() {
                            ctor = Some(types::functor(f.params.clone(), placeholder.clone(), f.generics.clone()));
                        }
                    }
                    if let Type::Simple(s) = &*placeholder {
                        s.methods.borrow_mut().insert(method_name.clone(), functor);
                    }
                }
                _ => {}
            }
        }
        self.pop_env();

        let ctor = ctor.unwrap_or_else(|| types::functor(Vec::new(), placeholder.clone(), Vec::new()));
        outer.define_local(name.to_string(), ctor);
    }

    fn resolve_superclass(&mut self, ast: &Ast, sc_id: NodeId, class_name: &str, placeholder: &TypeRef) {
        let lumen_ast::Expr::Variable { name: sc_name, span } = ast.expr(sc_id) else {
            return;
        };
        let Some(found) = self.lookup_type_name(sc_name) else {
            self.undefined_type(sc_name, *span);
            return;
        };
        if std::rc::Rc::ptr_eq(&found, placeholder) {
            self.had_error = true;
            let diag_span = self.diag_span(*span);
            self.diagnostics.emit_error(
                lumen_diagnostics::error_codes::SYNTAX_ERROR,
                format!("class `{class_name}` cannot extend itself"),
                diag_span,
            );
            return;
        }
        if !matches!(&*found, Type::Simple(_)) {
            self.had_error = true;
            let diag_span = self.diag_span(*span);
            self.diagnostics.emit_error(
                lumen_diagnostics::error_codes::TYPE_MISMATCH,
                format!("`{sc_name}` is not a class"),
                diag_span,
            );
            return;
        }
        if let (Type::Simple(p), Type::Simple(sup)) = (&**placeholder, &*found) {
            for (k, v) in sup.methods.borrow().iter() {
                p.methods.borrow_mut().insert(k.clone(), v.clone());
            }
            for (k, v) in sup.fields.borrow().iter() {
                p.fields.borrow_mut().insert(k.clone(), v.clone());
            }
            *p.supertype.borrow_mut() = Some(found.clone());
        }
    }

    fn check_class_field(&mut self, ast: &Ast, ty: &Option<TypeNode>, init: &Option<NodeId>, span: lumen_ast::Span) -> TypeRef {
        let declared = ty.as_ref().map(|t| self.eval_type_node(t));
        let saved = self.assignment_type.take();
        self.assignment_type = declared.clone();
        let init_ty = init.map(|e| self.check_expr(ast, e));
        self.assignment_type = saved;
        match (&declared, &init_ty) {
            (Some(declared), Some(init_ty)) => {
                self.require_subtype(init_ty, declared, span);
                declared.clone()
            }
            (Some(declared), None) => declared.clone(),
            (None, Some(init_ty)) => init_ty.clone(),
            (None, None) => self.any_type(),
        }
    }

    /// `interface`: analogous to `class`, but members are signatures
    /// only, and the supertype (if any) must itself be an interface.
    fn check_interface(&mut self, ast: &Ast, name: &str, generics: &[GenericParam], supertype: &Option<TypeNode>, body: &[NodeId]) {
        let outer = self.env.clone();

        self.push_env();
        let generic_defs = self.declare_generics(generics);
        let placeholder = types::interface(name, generic_defs);
        outer.define_type(name.to_string(), placeholder.clone());

        if let Some(sup_node) = supertype {
            let sup_ty = self.eval_type_node(sup_node);
            if std::rc::Rc::ptr_eq(&sup_ty, &placeholder) {
                self.had_error = true;
                let diag_span = self.diag_span(lumen_ast::Span::unknown());
                self.diagnostics.emit_error(
                    lumen_diagnostics::error_codes::SYNTAX_ERROR,
                    format!("interface `{name}` cannot extend itself"),
                    diag_span,
                );
            } else if matches!(&*sup_ty, Type::Interface(_)) {
                if let Type::Interface(p) = &*placeholder {
                    if let Type::Interface(sup) = &*sup_ty {
                        for (k, v) in sup.methods.borrow().iter() {
                            p.methods.borrow_mut().insert(k.clone(), v.clone());
                        }
                        for (k, v) in sup.fields.borrow().iter() {
                            p.fields.borrow_mut().insert(k.clone(), v.clone());
                        }
                    }
                    *p.supertype.borrow_mut() = Some(sup_ty);
                }
            } else {
                self.had_error = true;
                let diag_span = self.diag_span(lumen_ast::Span::unknown());
                self.diagnostics.emit_error(
                    lumen_diagnostics::error_codes::TYPE_MISMATCH,
                    format!("interface `{name}` cannot extend non-interface type `{sup_ty}`"),
                    diag_span,
                );
            }
        }

        for &member in body {
            match ast.stmt(member) {
                Stmt::Var { name: field_name, ty, span, .. } => {
                    let field_ty = self.eval_optional_type_node(ty);
                    if let Type::Interface(p) = &*placeholder {
                        p.fields.borrow_mut().insert(field_name.clone(), field_ty);
                    }
                    let _ = span;
                }
                Stmt::MethodSig { name: method_name, generics: mg, params, ret, .. } => {
                    self.push_env();
                    self.declare_generics(mg);
                    let param_types: Vec<TypeRef> = params.iter().map(|p| self.eval_optional_type_node(&p.ty)).collect();
                    let ret_ty = self.eval_optional_type_node(ret);
                    self.pop_env();
                    let functor = types::functor(param_types, ret_ty, Vec::new());
                    if let Type::Interface(p) = &*placeholder {
                        p.methods.borrow_mut().insert(method_name.clone(), functor);
                    }
                }
                _ => {}
            }
        }
        self.pop_env();
    }

    /// `enum` declarations install a `SimpleType` whose fields are the
    /// variants: unit variants get type `Nil`, payload variants get a
    /// `FunctorType` field that constructs the variant. Enums are
    /// structurally just "closed classes" built from variant lists.
    fn check_enum(&mut self, name: &str, generics: &[GenericParam], variants: &[EnumVariant]) {
        self.push_env();
        let generic_defs = self.declare_generics(generics);
        let enum_ty = types::simple(name, generic_defs);
        for variant in variants {
            let field_ty = if variant.fields.is_empty() {
                self.nil_type()
            } else {
                let params: Vec<TypeRef> = variant.fields.iter().map(|f| self.eval_type_node(f)).collect();
                types::functor(params, enum_ty.clone(), Vec::new())
            };
            if let Type::Simple(s) = &*enum_ty {
                s.fields.borrow_mut().insert(variant.name.clone(), field_ty);
            }
        }
        self.pop_env();
        self.env.define_type(name.to_string(), enum_ty);
    }
}
