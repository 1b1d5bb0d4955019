//! Lexical environments: a stack of scopes linked by an enclosing
//! pointer. A new one is pushed on entry to each function/lambda/class/
//! interface/method/`type` body and popped on exit; lookups walk outward
//! until found or exhausted.
//!
//! The current class and function context live as fields on
//! `Environment` itself (inherited from the enclosing scope unless a
//! push overrides them), so a `Checker` only ever needs the *current*
//! `Environment` handle rather than a separate bundle of ambient globals.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::TypeRef;

struct EnvData {
    locals: HashMap<String, TypeRef>,
    type_defs: HashMap<String, TypeRef>,
    generic_resolutions: HashMap<usize, Option<TypeRef>>,
    depth: usize,
    /// The `SimpleType`/`InterfaceType` `this`/`super` resolve against,
    /// inherited down the chain until a class/interface body overrides it.
    class_context: Option<TypeRef>,
    /// The enclosing functor's type, used by `Return` to check or infer
    /// the function's return type.
    function_context: Option<TypeRef>,
    /// Shared by every block *inside one function body* (nested `if`/
    /// `while`/`for` blocks push their own `Environment` but keep this
    /// same slot): `Some(Some(t))` once an explicit return annotation
    /// or an already-inferred return has fixed the type, `Some(None)`
    /// while still open for inference, `None` outside any function.
    return_slot: Option<Rc<RefCell<Option<TypeRef>>>>,
    enclosing: Option<Environment>,
}

/// A cheap-to-clone handle to a scope; clones share the same underlying
/// data (same identity as the source's pointer-based environment chain).
#[derive(Clone)]
pub struct Environment(Rc<RefCell<EnvData>>);

impl Environment {
    pub fn root() -> Self {
        Environment(Rc::new(RefCell::new(EnvData {
            locals: HashMap::new(),
            type_defs: HashMap::new(),
            generic_resolutions: HashMap::new(),
            depth: 0,
            class_context: None,
            function_context: None,
            return_slot: None,
            enclosing: None,
        })))
    }

    pub fn child(&self) -> Self {
        let depth = self.0.borrow().depth + 1;
        Environment(Rc::new(RefCell::new(EnvData {
            locals: HashMap::new(),
            type_defs: HashMap::new(),
            generic_resolutions: HashMap::new(),
            depth,
            class_context: self.0.borrow().class_context.clone(),
            function_context: self.0.borrow().function_context.clone(),
            return_slot: self.0.borrow().return_slot.clone(),
            enclosing: Some(self.clone()),
        })))
    }

    pub fn depth(&self) -> usize {
        self.0.borrow().depth
    }

    pub fn enclosing(&self) -> Option<Environment> {
        self.0.borrow().enclosing.clone()
    }

    // ---- locals (value bindings: variables, functions-as-values) ----

    pub fn define_local(&self, name: impl Into<String>, ty: TypeRef) {
        self.0.borrow_mut().locals.insert(name.into(), ty);
    }

    pub fn get_local(&self, name: &str) -> Option<TypeRef> {
        if let Some(ty) = self.0.borrow().locals.get(name) {
            return Some(ty.clone());
        }
        self.enclosing().and_then(|e| e.get_local(name))
    }

    /// All names visible from this scope outward, used for "did you
    /// mean?" suggestions.
    pub fn visible_local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.borrow().locals.keys().cloned().collect();
        if let Some(parent) = self.enclosing() {
            names.extend(parent.visible_local_names());
        }
        names
    }

    /// This scope's own locals only, ignoring `enclosing` — used by
    /// `Import` to collect a module's top-level bindings into the
    /// `SimpleType` fields a resolved module exposes to its importer.
    pub fn own_local_entries(&self) -> Vec<(String, TypeRef)> {
        self.0
            .borrow()
            .locals
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // ---- type definitions (class/interface/type-alias names) ----

    pub fn define_type(&self, name: impl Into<String>, ty: TypeRef) {
        self.0.borrow_mut().type_defs.insert(name.into(), ty);
    }

    pub fn get_type(&self, name: &str) -> Option<TypeRef> {
        if let Some(ty) = self.0.borrow().type_defs.get(name) {
            return Some(ty.clone());
        }
        self.enclosing().and_then(|e| e.get_type(name))
    }

    // ---- generic resolutions ----

    /// Bind a `GenericTypeDefinition` to a concrete type for the
    /// duration of the current call/subtype check. Keyed by the `Rc`'s
    /// address: the definition is a single shared allocation per generic
    /// parameter, so pointer identity is the lookup key.
    pub fn bind_generic_resolution(&self, def: &TypeRef, concrete: TypeRef) {
        let key = Rc::as_ptr(def) as usize;
        self.0.borrow_mut().generic_resolutions.insert(key, Some(concrete));
    }

    /// Declare a generic parameter as resolvable-but-not-yet-resolved:
    /// seeds one entry per callee generic, initially unbound, before a
    /// call's arguments are checked against it.
    pub fn declare_generic(&self, def: &TypeRef) {
        let key = Rc::as_ptr(def) as usize;
        self.0.borrow_mut().generic_resolutions.entry(key).or_insert(None);
    }

    /// Search the environment chain for a binding of `def`, per spec
    /// §4.2 rule 4 ("look up its resolution in the environment chain").
    pub fn lookup_generic_resolution(&self, def: &TypeRef) -> Option<TypeRef> {
        let key = Rc::as_ptr(def) as usize;
        if let Some(slot) = self.0.borrow().generic_resolutions.get(&key) {
            return slot.clone();
        }
        self.enclosing().and_then(|e| e.lookup_generic_resolution(def))
    }

    // ---- class/function context ----

    pub fn class_context(&self) -> Option<TypeRef> {
        self.0.borrow().class_context.clone()
    }

    pub fn set_class_context(&self, ty: TypeRef) {
        self.0.borrow_mut().class_context = Some(ty);
    }

    pub fn function_context(&self) -> Option<TypeRef> {
        self.0.borrow().function_context.clone()
    }

    pub fn set_function_context(&self, ty: TypeRef) {
        self.0.borrow_mut().function_context = Some(ty);
    }

    // ---- return-type inference slot ----

    /// Starts a fresh function/lambda scope: `explicit` is the return
    /// annotation's type if one was written, `None` if it must be
    /// inferred from the first `Return` the body executes.
    pub fn start_function_scope(&self, explicit: Option<TypeRef>) {
        self.0.borrow_mut().return_slot = Some(Rc::new(RefCell::new(explicit)));
    }

    pub fn return_slot(&self) -> Option<Rc<RefCell<Option<TypeRef>>>> {
        self.0.borrow().return_slot.clone()
    }
}
