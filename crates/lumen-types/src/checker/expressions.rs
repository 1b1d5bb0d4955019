//! Expression typing: one arm per `Expr` kind, each caching its result on
//! the node via [`Checker::cache_type`] so every expression node in a
//! successfully checked AST ends up with its cached type set.

use lumen_ast::{Ast, BinaryOp, Expr, FunctionKind, LogicalOp, NodeId, Span, UnaryOp};

use super::Checker;
use crate::types::{self, Type, TypeRef};

impl Checker {
    pub(crate) fn check_expr(&mut self, ast: &Ast, id: NodeId) -> TypeRef {
        let ty = match ast.expr(id) {
            Expr::Literal(value) => self.type_of_value(value),
            Expr::Unary { op, right, span } => self.check_unary(ast, *op, *right, *span),
            Expr::Binary { left, op, right, span } => self.check_binary(ast, *left, *op, *right, *span),
            Expr::Grouping(inner) => self.check_expr(ast, *inner),
            Expr::Variable { name, span } => self.check_variable(name, *span),
            Expr::Assign { name, value, span } => self.check_assign(ast, name, *value, *span),
            Expr::Logical { left, op, right } => self.check_logical(ast, *left, *op, *right),
            Expr::Call { callee, paren, args } => self.check_call(ast, *callee, *paren, args),
            Expr::GetItem { object, index, span } => self.check_get_item(ast, *object, *index, *span),
            Expr::Get { object, name, span } => self.check_get(ast, *object, name, *span),
            Expr::Set { object, name, value, span } => self.check_set(ast, *object, name, *value, *span),
            Expr::Super { keyword, method } => self.check_super(method, *keyword),
            Expr::This { span } => self.check_this(*span),
            Expr::Yield { value } => self.check_yield(ast, value),
            Expr::Lambda { generics, params, ret, body } => {
                self.check_function_like(ast, generics, params, ret, *body, FunctionKind::Lambda)
            }
            Expr::List { bracket, items } => self.check_list(ast, *bracket, items),
            Expr::Map { brace, keys, values } => self.check_map(ast, *brace, keys, values),
        };
        self.cache_type(ast, id, ty)
    }

    fn check_unary(&mut self, ast: &Ast, op: UnaryOp, right: NodeId, span: Span) -> TypeRef {
        let right_ty = self.check_expr(ast, right);
        match op {
            UnaryOp::Neg => {
                let number = self.env.get_type("Number").expect("Number is global");
                self.require_subtype(&right_ty, &number, span);
                number
            }
            // `!` accepts any value (truthiness), mirroring a dynamically
            // typed source language rather than requiring a strict `Bool`.
            UnaryOp::Not => self.env.get_type("Bool").expect("Bool is global"),
        }
    }

    fn check_binary(&mut self, ast: &Ast, left: NodeId, op: BinaryOp, right: NodeId, span: Span) -> TypeRef {
        let left_ty = self.check_expr(ast, left);
        let right_ty = self.check_expr(ast, right);
        let number = self.env.get_type("Number").expect("Number is global");
        let string = self.env.get_type("String").expect("String is global");
        let boolean = self.env.get_type("Bool").expect("Bool is global");

        match op {
            BinaryOp::Add => {
                let both_strings = crate::subtyping::is_subtype(&left_ty, &string, &self.env)
                    && crate::subtyping::is_subtype(&right_ty, &string, &self.env);
                if both_strings {
                    return string;
                }
                self.require_subtype(&left_ty, &number, span);
                self.require_subtype(&right_ty, &number, span);
                number
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                self.require_subtype(&left_ty, &number, span);
                self.require_subtype(&right_ty, &number, span);
                number
            }
            BinaryOp::Eq | BinaryOp::NotEq => boolean,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                self.require_subtype(&left_ty, &number, span);
                self.require_subtype(&right_ty, &number, span);
                boolean
            }
        }
    }

    fn check_variable(&mut self, name: &str, span: Span) -> TypeRef {
        match self.lookup_value_name(name) {
            Some(ty) => ty,
            None => {
                self.undefined_variable(name, span);
                self.any_type()
            }
        }
    }

    /// Checks `value <: declared type of name`, then yields the named
    /// variable's declared type if one exists, else the inferred value
    /// type.
    fn check_assign(&mut self, ast: &Ast, name: &str, value: NodeId, span: Span) -> TypeRef {
        let value_ty = self.check_expr(ast, value);
        match self.env.get_local(name) {
            Some(declared) => {
                self.require_subtype(&value_ty, &declared, span);
                declared
            }
            None => {
                self.undefined_variable(name, span);
                value_ty
            }
        }
    }

    fn check_logical(&mut self, ast: &Ast, left: NodeId, _op: LogicalOp, right: NodeId) -> TypeRef {
        self.check_expr(ast, left);
        self.check_expr(ast, right);
        self.env.get_type("Bool").expect("Bool is global")
    }

    /// The callee must be a `FunctorType`. Pushes a fresh environment,
    /// seeds one generic-resolution slot per callee generic (initially
    /// unbound), checks each argument against the matching parameter
    /// type, then returns the callee's (possibly generic-substituted)
    /// return type. An argument-count mismatch is silently accepted —
    /// varargs aren't modeled.
    fn check_call(&mut self, ast: &Ast, callee: NodeId, paren: Span, args: &[NodeId]) -> TypeRef {
        let callee_ty = self.check_expr(ast, callee);
        let arg_types: Vec<TypeRef> = args.iter().map(|a| self.check_expr(ast, *a)).collect();

        let Type::Functor(functor) = &*callee_ty else {
            self.had_error = true;
            let diag_span = self.diag_span(paren);
            self.diagnostics.emit_error(
                lumen_diagnostics::error_codes::WRONG_ARG_TYPE,
                format!("type `{callee_ty}` is not callable"),
                diag_span,
            );
            return self.any_type();
        };
        let params = functor.params.clone();
        let ret = functor.ret.clone();
        let generics = functor.generics.clone();

        self.push_env();
        for def in &generics {
            self.env.declare_generic(def);
        }
        for (i, arg_ty) in arg_types.iter().enumerate() {
            if let Some(param_ty) = params.get(i) {
                self.require_subtype(arg_ty, param_ty, paren);
            }
            // else: argument-count mismatch silently accepted —
            // varargs not yet modeled.
        }
        let resolved_ret = self.substitute_generics(&ret);
        self.pop_env();
        resolved_ret
    }

    /// Replaces any `GenericTypeDefinition` reachable from `ty` with
    /// its resolution in the *current* environment, if bound — used to
    /// carry a call's inferred generics out past the call's own
    /// short-lived environment, since resolutions live in the
    /// environment chain that scope is about to leave.
    fn substitute_generics(&self, ty: &TypeRef) -> TypeRef {
        match &**ty {
            Type::GenericDef(_) => match self.env.lookup_generic_resolution(ty) {
                Some(resolved) => self.substitute_generics(&resolved),
                None => ty.clone(),
            },
            Type::Generic(g) => types::generic(
                self.substitute_generics(&g.target),
                g.applied.iter().map(|a| self.substitute_generics(a)).collect(),
            ),
            Type::Functor(f) => types::functor(
                f.params.iter().map(|p| self.substitute_generics(p)).collect(),
                self.substitute_generics(&f.ret),
                f.generics.clone(),
            ),
            Type::Union(l, r) => types::union(self.substitute_generics(l), self.substitute_generics(r)),
            _ => ty.clone(),
        }
    }

    /// `GetItem` on `List<T>` requires the index to be a `Number` and
    /// returns `T` (or `Never` if `T` is absent). On `Map<K,V>` it
    /// requires the index to be a `K` and returns `V`.
    fn check_get_item(&mut self, ast: &Ast, object: NodeId, index: NodeId, span: Span) -> TypeRef {
        let object_ty = self.check_expr(ast, object);
        let index_ty = self.check_expr(ast, index);
        let number = self.env.get_type("Number").expect("Number is global");

        let (target_name, applied): (Option<&str>, &[TypeRef]) = match &*object_ty {
            Type::Generic(g) => (g.target.simple_name(), &g.applied),
            _ => (object_ty.simple_name(), &[]),
        };

        match target_name {
            Some("List") => {
                self.require_subtype(&index_ty, &number, span);
                applied.first().cloned().unwrap_or_else(|| self.never_type())
            }
            Some("Map") => {
                let key = applied.first().cloned().unwrap_or_else(|| self.never_type());
                self.require_subtype(&index_ty, &key, span);
                applied.get(1).cloned().unwrap_or_else(|| self.never_type())
            }
            _ => {
                self.had_error = true;
                let diag_span = self.diag_span(span);
                self.diagnostics.emit_error(
                    lumen_diagnostics::error_codes::NO_SUCH_METHOD,
                    format!("type `{object_ty}` does not support indexing"),
                    diag_span,
                );
                self.any_type()
            }
        }
    }

    fn check_get(&mut self, ast: &Ast, object: NodeId, name: &str, span: Span) -> TypeRef {
        let object_ty = self.check_expr(ast, object);
        match self.lookup_member(&object_ty, name) {
            Some(ty) => ty,
            None => {
                self.invalid_field(&object_ty, name, span);
                self.any_type()
            }
        }
    }

    fn check_set(&mut self, ast: &Ast, object: NodeId, name: &str, value: NodeId, span: Span) -> TypeRef {
        let object_ty = self.check_expr(ast, object);
        let value_ty = self.check_expr(ast, value);
        match self.lookup_member(&object_ty, name) {
            Some(field_ty) => {
                self.require_subtype(&value_ty, &field_ty, span);
                field_ty
            }
            None => {
                self.invalid_field(&object_ty, name, span);
                value_ty
            }
        }
    }

    /// Method table first, then field table, walking `supertype`
    /// transitively — shared by `Get`, `Set`, and `Super`.
    pub(crate) fn lookup_member(&self, owner: &TypeRef, name: &str) -> Option<TypeRef> {
        let target = match &**owner {
            Type::Generic(g) => g.target.clone(),
            _ => owner.clone(),
        };
        let mut current = Some(target);
        while let Some(ty) = current {
            let (methods, fields, supertype) = match &*ty {
                Type::Simple(s) => (s.methods.borrow().get(name).cloned(), s.fields.borrow().get(name).cloned(), s.supertype.borrow().clone()),
                Type::Interface(i) => (i.methods.borrow().get(name).cloned(), i.fields.borrow().get(name).cloned(), i.supertype.borrow().clone()),
                _ => (None, None, None),
            };
            if let Some(found) = methods.or(fields) {
                return Some(found);
            }
            current = supertype;
        }
        None
    }

    fn check_super(&mut self, method: &str, keyword: Span) -> TypeRef {
        let Some(class_ty) = self.env.class_context() else {
            self.had_error = true;
            let span = self.diag_span(keyword);
            self.diagnostics.emit_error(
                lumen_diagnostics::error_codes::SYNTAX_ERROR,
                "'super' used outside of a class method".to_string(),
                span,
            );
            return self.any_type();
        };
        let supertype = match &*class_ty {
            Type::Simple(s) => s.supertype.borrow().clone(),
            Type::Interface(i) => i.supertype.borrow().clone(),
            _ => None,
        };
        let Some(supertype) = supertype else {
            self.had_error = true;
            let span = self.diag_span(keyword);
            self.diagnostics.emit_error(
                lumen_diagnostics::error_codes::UNDEFINED_TYPE,
                format!("type `{class_ty}` has no superclass"),
                span,
            );
            return self.any_type();
        };
        match self.lookup_member(&supertype, method) {
            Some(ty) => ty,
            None => {
                self.invalid_field(&supertype, method, keyword);
                self.any_type()
            }
        }
    }

    fn check_this(&mut self, span: Span) -> TypeRef {
        match self.env.class_context() {
            Some(ty) => ty,
            None => {
                self.had_error = true;
                let diag_span = self.diag_span(span);
                self.diagnostics.emit_error(
                    lumen_diagnostics::error_codes::SYNTAX_ERROR,
                    "'this' used outside of a method".to_string(),
                    diag_span,
                );
                self.any_type()
            }
        }
    }

    /// Evaluates its operand for side-effects; the expression itself
    /// always types as `Any`.
    fn check_yield(&mut self, ast: &Ast, value: &Option<NodeId>) -> TypeRef {
        if let Some(v) = value {
            self.check_expr(ast, *v);
        }
        self.any_type()
    }

    /// List literal: if an expected container shape is in scope (from
    /// the enclosing `Var`/field annotation), use it to check every
    /// element; otherwise infer the element type from the first item and
    /// default the rest to `Never`.
    fn check_list(&mut self, ast: &Ast, bracket: Span, items: &[NodeId]) -> TypeRef {
        let expected_elem = self.assignment_type.as_ref().and_then(|expected| match &**expected {
            Type::Generic(g) if g.target.simple_name() == Some("List") => g.applied.first().cloned(),
            _ => None,
        });

        let saved = self.assignment_type.take();
        self.assignment_type = expected_elem.clone();

        let mut element_ty: Option<TypeRef> = expected_elem.clone();
        for (i, item) in items.iter().enumerate() {
            let item_ty = self.check_expr(ast, *item);
            if let Some(expected) = &expected_elem {
                self.require_subtype(&item_ty, expected, bracket);
            } else if i == 0 {
                element_ty = Some(item_ty);
            }
        }
        self.assignment_type = saved;

        let list_def = self.lookup_type_name("List").expect("List is global");
        let elem = element_ty.unwrap_or_else(|| self.never_type());
        types::generic(list_def, vec![elem])
    }

    fn check_map(&mut self, ast: &Ast, brace: Span, keys: &[NodeId], values: &[NodeId]) -> TypeRef {
        let expected = self.assignment_type.as_ref().and_then(|expected| match &**expected {
            Type::Generic(g) if g.target.simple_name() == Some("Map") => {
                Some((g.applied.first().cloned(), g.applied.get(1).cloned()))
            }
            _ => None,
        });
        let (expected_key, expected_val) = expected.unwrap_or((None, None));

        let saved = self.assignment_type.take();

        let mut key_ty: Option<TypeRef> = expected_key.clone();
        let mut val_ty: Option<TypeRef> = expected_val.clone();
        for (i, (k, v)) in keys.iter().zip(values).enumerate() {
            self.assignment_type = expected_key.clone();
            let k_ty = self.check_expr(ast, *k);
            self.assignment_type = expected_val.clone();
            let v_ty = self.check_expr(ast, *v);

            if let Some(expected) = &expected_key {
                self.require_subtype(&k_ty, expected, brace);
            } else if i == 0 {
                key_ty = Some(k_ty);
            }
            if let Some(expected) = &expected_val {
                self.require_subtype(&v_ty, expected, brace);
            } else if i == 0 {
                val_ty = Some(v_ty);
            }
        }
        self.assignment_type = saved;

        let map_def = self.lookup_type_name("Map").expect("Map is global");
        let key = key_ty.unwrap_or_else(|| self.never_type());
        let val = val_ty.unwrap_or_else(|| self.never_type());
        types::generic(map_def, vec![key, val])
    }
}
