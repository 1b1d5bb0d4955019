//! Structural subtyping `A <: B`, applied in strict rule order — the
//! first matching rule wins and later rules are never consulted.

use std::rc::Rc;

use crate::environment::Environment;
use crate::types::{Type, TypeRef};

pub fn is_subtype(a: &TypeRef, b: &TypeRef, env: &Environment) -> bool {
    // 1. Identity.
    if Rc::ptr_eq(a, b) {
        return true;
    }
    // 2. Never/Any short-circuits, checked against B.
    if matches!(&**b, Type::Never) {
        return false;
    }
    if matches!(&**b, Type::Any) {
        return true;
    }
    // 3. A is a GenericType: try its target against B first.
    if let Type::Generic(ga) = &**a {
        if is_subtype(&ga.target, b, env) {
            return true;
        }
    }
    // 4. A is an unresolved generic parameter: resolve and retry.
    if matches!(&**a, Type::GenericDef(_)) {
        if let Some(resolved) = env.lookup_generic_resolution(a) {
            return is_subtype(&resolved, b, env);
        }
    }
    // 5. Dispatch on B's kind.
    match &**b {
        Type::Simple(_) => simple_subtype(a, b),
        Type::Functor(fb) => functor_subtype(a, fb, env),
        Type::Generic(gb) => generic_subtype(a, gb, b, env),
        Type::GenericDef(db) => generic_def_subtype(a, db, b, env),
        Type::Union(l, r) => is_subtype(a, l, env) || is_subtype(a, r, env),
        Type::Interface(ib) => interface_subtype(a, ib, env),
        Type::Never | Type::Any => unreachable!("handled by rule 2 above"),
    }
}

/// `B` is a `SimpleType`: true iff `A` is a `SimpleType` and, walking
/// `A.supertype` transitively, some ancestor is identical to `B`.
fn simple_subtype(a: &TypeRef, b: &TypeRef) -> bool {
    if !matches!(&**a, Type::Simple(_)) {
        return false;
    }
    let mut current = Some(a.clone());
    while let Some(ty) = current {
        if Rc::ptr_eq(&ty, b) {
            return true;
        }
        current = match &*ty {
            Type::Simple(s) => s.supertype.borrow().clone(),
            _ => None,
        };
    }
    false
}

/// `B` is a `FunctorType`: same arity, with arguments compared
/// *covariantly* alongside a covariant return — semantically unsound for
/// a fully safe structural function type, but the documented, chosen
/// variance here rather than the textbook-correct contravariant
/// alternative.
fn functor_subtype(
    a: &TypeRef,
    fb: &crate::types::FunctorType,
    env: &Environment,
) -> bool {
    let Type::Functor(fa) = &**a else { return false };
    if fa.params.len() != fb.params.len() {
        return false;
    }
    for (pa, pb) in fa.params.iter().zip(&fb.params) {
        if !is_subtype(pa, pb, env) {
            return false;
        }
    }
    is_subtype(&fa.ret, &fb.ret, env)
}

fn generic_subtype(
    a: &TypeRef,
    gb: &crate::types::GenericType,
    b_whole: &TypeRef,
    env: &Environment,
) -> bool {
    if let Type::Interface(target_iface) = &*gb.target {
        if target_iface.generics.len() != gb.applied.len() {
            return false;
        }
        for (param, applied) in target_iface.generics.iter().zip(&gb.applied) {
            env.bind_generic_resolution(param, applied.clone());
        }
        return is_subtype(a, &gb.target, env);
    }
    let _ = b_whole;
    let Type::Generic(ga) = &**a else { return false };
    if ga.applied.len() != gb.applied.len() {
        return false;
    }
    for (xa, xb) in ga.applied.iter().zip(&gb.applied) {
        if !is_subtype(xa, xb, env) {
            return false;
        }
    }
    is_subtype(&ga.target, &gb.target, env)
}

/// `B` is an unresolved generic parameter: check (and honor) its bound,
/// then bind or verify the resolution, searching the environment chain.
fn generic_def_subtype(
    a: &TypeRef,
    db: &crate::types::GenericTypeDefinition,
    b: &TypeRef,
    env: &Environment,
) -> bool {
    if let Some(bound) = &db.extends {
        if !is_subtype(a, bound, env) {
            return false;
        }
    }
    match env.lookup_generic_resolution(b) {
        Some(bound_to) => is_subtype(a, &bound_to, env),
        None => {
            env.bind_generic_resolution(b, a.clone());
            true
        }
    }
}

/// `B` is an `InterfaceType`: `A` must be an `Interface` or `Simple`
/// type whose method/field tables structurally cover `B`'s.
fn interface_subtype(
    a: &TypeRef,
    ib: &crate::types::InterfaceType,
    env: &Environment,
) -> bool {
    let (a_fields, a_methods): (
        std::cell::Ref<std::collections::HashMap<String, TypeRef>>,
        std::cell::Ref<std::collections::HashMap<String, TypeRef>>,
    ) = match &**a {
        Type::Simple(s) => (s.fields.borrow(), s.methods.borrow()),
        Type::Interface(i) => (i.fields.borrow(), i.methods.borrow()),
        _ => return false,
    };

    for (name, field_ty) in ib.fields.borrow().iter() {
        match a_fields.get(name) {
            Some(a_ty) if is_subtype(a_ty, field_ty, env) => {}
            _ => return false,
        }
    }
    for (name, method_ty) in ib.methods.borrow().iter() {
        match a_methods.get(name) {
            Some(a_ty) if is_subtype(a_ty, method_ty, env) => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globals;

    #[test]
    fn reflexivity() {
        let env = Environment::root();
        globals::install(&env);
        let number = env.get_type("Number").unwrap();
        assert!(is_subtype(&number, &number, &env));
    }

    #[test]
    fn any_is_top_never_is_bottom() {
        let env = Environment::root();
        globals::install(&env);
        let number = env.get_type("Number").unwrap();
        let any = env.get_type("Any").unwrap();
        let never = env.get_type("Never").unwrap();
        assert!(is_subtype(&number, &any, &env));
        assert!(!is_subtype(&number, &never, &env));
    }

    #[test]
    fn union_absorption() {
        let env = Environment::root();
        globals::install(&env);
        let number = env.get_type("Number").unwrap();
        let string = env.get_type("String").unwrap();
        let u = crate::types::union(number.clone(), string.clone());
        assert!(is_subtype(&number, &u, &env));
        assert!(is_subtype(&string, &u, &env));
        let bool_ty = env.get_type("Bool").unwrap();
        assert!(!is_subtype(&bool_ty, &u, &env));
    }

    #[test]
    fn simple_type_inherits_supertype() {
        let parent = crate::types::simple("Animal", vec![]);
        let child = crate::types::simple("Dog", vec![]);
        if let Type::Simple(s) = &*child {
            *s.supertype.borrow_mut() = Some(parent.clone());
        }
        let env = Environment::root();
        assert!(is_subtype(&child, &parent, &env));
        assert!(!is_subtype(&parent, &child, &env));
    }
}
