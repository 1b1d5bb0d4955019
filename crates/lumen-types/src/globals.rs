//! Global primitive bindings, installed once into the root environment:
//! name→type bindings for `Number, Nil, Bool, Atom, String, Never, Any,
//! Task`, and both a type-def and a local (callable constructor) for
//! `List` and `Map`.

use std::rc::Rc;

use crate::environment::Environment;
use crate::types::{self, Type};

const SIMPLE_PRIMITIVES: &[&str] = &["Number", "Nil", "Bool", "Atom", "String", "Task"];

pub fn install(env: &Environment) {
    env.define_type("Never", Rc::new(Type::Never));
    env.define_type("Any", Rc::new(Type::Any));

    for name in SIMPLE_PRIMITIVES {
        env.define_type(*name, types::simple(*name, Vec::new()));
    }

    // `List`/`Map` are generic containers: a type-def carrying their own
    // unapplied generic parameters, plus a local value binding so
    // `List(...)`/`Map(...)` can appear as callable expressions. The
    // constructor is modeled as a zero-argument functor returning the
    // bare (unapplied) container type — call sites that need the applied
    // form get there through a `var xs: List<Number> = ...` annotation
    // instead.
    let list_param = types::generic_def("T", None);
    let list = types::simple("List", vec![list_param]);
    env.define_type("List", list.clone());
    env.define_local("List", types::functor(Vec::new(), list, Vec::new()));

    let map_key = types::generic_def("K", None);
    let map_val = types::generic_def("V", None);
    let map = types::simple("Map", vec![map_key, map_val]);
    env.define_type("Map", map.clone());
    env.define_local("Map", types::functor(Vec::new(), map, Vec::new()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_every_primitive_type_def() {
        let env = Environment::root();
        install(&env);
        for name in ["Never", "Any", "Number", "Nil", "Bool", "Atom", "String", "Task", "List", "Map"] {
            assert!(env.get_type(name).is_some(), "missing type-def for {name}");
        }
    }

    #[test]
    fn list_and_map_are_also_callable_locals() {
        let env = Environment::root();
        install(&env);
        assert!(env.get_local("List").is_some());
        assert!(env.get_local("Map").is_some());
        assert!(env.get_local("Number").is_none());
    }
}
