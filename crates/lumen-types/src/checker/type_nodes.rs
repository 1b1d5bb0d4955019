//! Evaluates syntactic [`lumen_ast::TypeNode`] annotations into the
//! semantic [`crate::types::Type`] lattice: `Simple`, `Union`, and
//! `Functor` type-node shapes, covering every variant the
//! `typeAnnotation` grammar can produce.

use lumen_ast::{GenericParam, TypeNode};
use lumen_diagnostics::error_codes;

use super::Checker;
use crate::types::{self, TypeRef};

impl Checker {
    pub(crate) fn eval_type_node(&mut self, node: &TypeNode) -> TypeRef {
        match node {
            TypeNode::Simple { name, generics } => self.eval_simple_type_node(name, generics),
            TypeNode::Functor { generics, args, ret } => self.eval_functor_type_node(generics, args, ret),
            TypeNode::Union { left, right } => {
                let l = self.eval_type_node(left);
                let r = self.eval_type_node(right);
                types::union(l, r)
            }
        }
    }

    /// Evaluates a parameter type annotation, defaulting a missing one
    /// to `Any`.
    pub(crate) fn eval_optional_type_node(&mut self, node: &Option<TypeNode>) -> TypeRef {
        match node {
            Some(n) => self.eval_type_node(n),
            None => self.any_type(),
        }
    }

    fn eval_simple_type_node(&mut self, name: &str, generics: &[TypeNode]) -> TypeRef {
        let Some(target) = self.lookup_type_name(name) else {
            return self.undefined_type(name, lumen_ast::Span::unknown());
        };

        if generics.is_empty() {
            return target;
        }

        let applied: Vec<TypeRef> = generics.iter().map(|g| self.eval_type_node(g)).collect();

        let declared_arity = match &*target {
            crate::types::Type::Simple(s) => Some(s.generics.len()),
            crate::types::Type::Interface(i) => Some(i.generics.len()),
            _ => None,
        };
        if let Some(arity) = declared_arity {
            if arity != applied.len() {
                self.had_error = true;
                let span = self.diag_span(lumen_ast::Span::unknown());
                self.diagnostics.emit_error(
                    error_codes::GENERIC_MISMATCH,
                    format!(
                        "type `{name}` takes {arity} generic argument{}, found {}",
                        if arity == 1 { "" } else { "s" },
                        applied.len()
                    ),
                    span,
                );
            }
        }

        types::generic(target, applied)
    }

    /// `<gs>(args)=>ret` / `(args)=>ret`. The generic parameters
    /// declared on a functor *type node* only need to be visible while
    /// evaluating its own argument/return positions, so they're bound
    /// in a throwaway child environment rather than the caller's.
    fn eval_functor_type_node(
        &mut self,
        generics: &[GenericParam],
        args: &[TypeNode],
        ret: &Option<Box<TypeNode>>,
    ) -> TypeRef {
        self.push_env();
        let generic_types = self.declare_generics(generics);
        let params: Vec<TypeRef> = args.iter().map(|a| self.eval_type_node(a)).collect();
        let ret_ty = match ret {
            Some(r) => self.eval_type_node(r),
            None => self.nil_type(),
        };
        self.pop_env();
        types::functor(params, ret_ty, generic_types)
    }

    /// Declares a `<T, U extends Bound>` parameter list as
    /// `GenericTypeDefinition`s in the current environment (both as a
    /// type-def, so `Simple { name }` lookups resolve it, and as a
    /// registered generic so `declare_generic` seeds its eventual
    /// resolution slot). Returns them in declaration order.
    pub(crate) fn declare_generics(&mut self, generics: &[GenericParam]) -> Vec<TypeRef> {
        generics
            .iter()
            .map(|g| {
                let bound = g.extends.as_ref().map(|b| self.eval_type_node(b));
                let def = types::generic_def(g.name.clone(), bound);
                self.env.define_type(g.name.clone(), def.clone());
                def
            })
            .collect()
    }
}
