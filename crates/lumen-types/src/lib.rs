//! The structural type checker: walks a parsed [`Program`]
//! in a single pre-order pass, assigning a type to every expression and
//! validating subtyping at every assignment/call/return/element/field
//! site, while inferring generic argument bindings along the way.
//!
//! Submodule layout mirrors `lumen-parser`: the semantic type lattice
//! (`types`), lexical scopes (`environment`), the six-rule subtyping
//! dispatch (`subtyping`), global primitive bindings (`globals`), and the
//! checker itself (`checker`, split the same way the parser's grammar
//! was: one file per syntactic category it type-checks).

pub mod checker;
pub mod environment;
pub mod globals;
pub mod subtyping;
pub mod types;

pub use checker::{check, Checker, FileReader, StdFileReader};
pub use environment::Environment;
pub use subtyping::is_subtype;
pub use types::{Type, TypeRef};
