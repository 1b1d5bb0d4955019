//! The semantic type lattice, distinct from `lumen_ast::TypeNode`
//! (syntax). Every type is reached through an `Rc<Type>` handle; two
//! handles denote the *same* type iff `Rc::ptr_eq` holds, which is what
//! the subtyping algorithm's identity rule actually checks — built-in
//! singletons and class/interface definitions are each allocated exactly
//! once, so pointer identity is enough.
//!
//! `SimpleType`/`InterfaceType` keep their method/field tables behind a
//! `RefCell` so a placeholder can be allocated, bound into an environment
//! under its name, and only then populated — the standard fix for
//! self-referential class methods.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type TypeRef = Rc<Type>;

#[derive(Debug)]
pub enum Type {
    Never,
    Any,
    Simple(SimpleType),
    Functor(FunctorType),
    Union(TypeRef, TypeRef),
    Interface(InterfaceType),
    Generic(GenericType),
    GenericDef(GenericTypeDefinition),
}

#[derive(Debug)]
pub struct SimpleType {
    pub name: String,
    pub methods: RefCell<HashMap<String, TypeRef>>,
    pub fields: RefCell<HashMap<String, TypeRef>>,
    pub generics: Vec<TypeRef>,
    pub supertype: RefCell<Option<TypeRef>>,
}

#[derive(Debug)]
pub struct InterfaceType {
    pub name: String,
    pub methods: RefCell<HashMap<String, TypeRef>>,
    pub fields: RefCell<HashMap<String, TypeRef>>,
    pub generics: Vec<TypeRef>,
    pub supertype: RefCell<Option<TypeRef>>,
}

#[derive(Debug)]
pub struct FunctorType {
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
    pub generics: Vec<TypeRef>,
}

/// A generic target (`Simple` or `Interface`) applied to concrete
/// arguments, e.g. `List<Number>`.
#[derive(Debug)]
pub struct GenericType {
    pub target: TypeRef,
    pub applied: Vec<TypeRef>,
}

/// An as-yet-unresolved generic parameter, e.g. the `T` in `fun id<T>`.
/// `extends` is its declared bound, fixed at creation; the *resolved*
/// concrete type it's bound to during a particular call lives in the
/// environment chain's generic-resolutions table instead of here, so the
/// definition itself stays immutable and shareable across calls.
#[derive(Debug)]
pub struct GenericTypeDefinition {
    pub name: String,
    pub extends: Option<TypeRef>,
}

impl Type {
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Type::Simple(s) => Some(&s.name),
            Type::Interface(i) => Some(&i.name),
            _ => None,
        }
    }

    pub fn as_functor(&self) -> Option<&FunctorType> {
        match self {
            Type::Functor(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleType> {
        match self {
            Type::Simple(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_generic(&self) -> Option<&GenericType> {
        match self {
            Type::Generic(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_generic_def(&self) -> Option<&GenericTypeDefinition> {
        match self {
            Type::GenericDef(d) => Some(d),
            _ => None,
        }
    }
}

/// Display name used in diagnostics ("expected `Number`, found `String`").
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Never => write!(f, "Never"),
            Type::Any => write!(f, "Any"),
            Type::Simple(s) => write!(f, "{}", s.name),
            Type::Interface(i) => write!(f, "{}", i.name),
            Type::Functor(func) => {
                write!(f, "(")?;
                for (i, p) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") => {}", func.ret)
            }
            Type::Union(l, r) => write!(f, "{l} | {r}"),
            Type::Generic(g) => {
                write!(f, "{}<", g.target)?;
                for (i, a) in g.applied.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ">")
            }
            Type::GenericDef(d) => write!(f, "{}", d.name),
        }
    }
}

pub fn simple(name: impl Into<String>, generics: Vec<TypeRef>) -> TypeRef {
    Rc::new(Type::Simple(SimpleType {
        name: name.into(),
        methods: RefCell::new(HashMap::new()),
        fields: RefCell::new(HashMap::new()),
        generics,
        supertype: RefCell::new(None),
    }))
}

pub fn interface(name: impl Into<String>, generics: Vec<TypeRef>) -> TypeRef {
    Rc::new(Type::Interface(InterfaceType {
        name: name.into(),
        methods: RefCell::new(HashMap::new()),
        fields: RefCell::new(HashMap::new()),
        generics,
        supertype: RefCell::new(None),
    }))
}

pub fn functor(params: Vec<TypeRef>, ret: TypeRef, generics: Vec<TypeRef>) -> TypeRef {
    Rc::new(Type::Functor(FunctorType { params, ret, generics }))
}

pub fn generic_def(name: impl Into<String>, extends: Option<TypeRef>) -> TypeRef {
    Rc::new(Type::GenericDef(GenericTypeDefinition { name: name.into(), extends }))
}

pub fn generic(target: TypeRef, applied: Vec<TypeRef>) -> TypeRef {
    Rc::new(Type::Generic(GenericType { target, applied }))
}

pub fn union(left: TypeRef, right: TypeRef) -> TypeRef {
    Rc::new(Type::Union(left, right))
}

/// Does `ty` mention `def` anywhere in its structure (directly, or nested
/// inside a `Generic`/`Functor`/`Union`)? Used to flag a declared generic
/// parameter that never appears in its own function's parameter or return
/// types — identity, not structural equality, is what matters here, since
/// `def` is a specific `GenericTypeDefinition` allocation.
pub fn mentions_generic_def(ty: &TypeRef, def: &TypeRef) -> bool {
    if Rc::ptr_eq(ty, def) {
        return true;
    }
    match &**ty {
        Type::Generic(g) => {
            mentions_generic_def(&g.target, def) || g.applied.iter().any(|a| mentions_generic_def(a, def))
        }
        Type::Functor(f) => {
            f.params.iter().any(|p| mentions_generic_def(p, def)) || mentions_generic_def(&f.ret, def)
        }
        Type::Union(l, r) => mentions_generic_def(l, def) || mentions_generic_def(r, def),
        _ => false,
    }
}
