//! The checker itself: a single pre-order walk over a [`Program`],
//! maintaining a stack of lexical [`Environment`]s and caching a type
//! on every expression node it visits.
//!
//! Split the way `lumen-parser`'s grammar is split — one file per
//! syntactic category — rather than one `match` the size of the whole
//! language: `expressions` covers every `Expr` kind, `statements` every
//! `Stmt` kind, `type_nodes` evaluates syntactic [`lumen_ast::TypeNode`]s
//! into semantic [`crate::types::Type`]s, and `modules` implements the
//! `Import`/`parseFile` caching dance.

mod expressions;
mod modules;
mod statements;
mod type_nodes;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lumen_ast::{NodeId, Program, Span as AstSpan, TypeId, Value};
use lumen_diagnostics::{error_codes, DiagnosticEngine, Span as DiagSpan};

use crate::environment::Environment;
use crate::globals;
use crate::types::{self, Type, TypeRef};

/// The checker's sole external dependency: `readFile(path)`. Abstracted
/// behind a trait so tests can supply an in-memory module graph
/// instead of touching the real filesystem.
pub trait FileReader {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// The default, real-filesystem-backed reader.
pub struct StdFileReader;

impl FileReader for StdFileReader {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Per-expression-node cached types, addressed by the opaque
/// [`TypeId`] handles `lumen_ast::Node` stores as an optional cached
/// type slot filled in by the checker. `lumen-ast` doesn't know what a
/// `Type` *is*; this pool is where the handle resolves to one.
#[derive(Default)]
pub struct TypePool {
    types: Vec<TypeRef>,
}

impl TypePool {
    pub fn intern(&mut self, ty: TypeRef) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn resolve(&self, id: TypeId) -> TypeRef {
        self.types[id.0 as usize].clone()
    }
}

/// State shared across a file and every module it (transitively)
/// imports: the module registry and the host file reader. Kept as an
/// explicit, `Rc`-shared struct rather than process-wide statics, so
/// it can be cloned into each recursive `Checker` spun up for an
/// `import` without any global mutable state.
struct SharedContext {
    modules: RefCell<HashMap<String, TypeRef>>,
    builtin_modules: HashMap<String, TypeRef>,
    reader: Box<dyn FileReader>,
}

pub struct Checker {
    file: String,
    source: String,
    base_dir: PathBuf,
    diagnostics: DiagnosticEngine,
    had_error: bool,
    env: Environment,
    types: TypePool,
    /// The expected type of the value currently being assigned, saved
    /// and restored around every `Var` initializer and each list/map
    /// literal element, so a container literal can see the annotation
    /// its value is headed into.
    assignment_type: Option<TypeRef>,
    ctx: Rc<SharedContext>,
}

/// Entry point: check a freshly parsed top-level [`Program`] against
/// the real filesystem. `file` is used both for diagnostic spans and as
/// the base directory `import` paths resolve against.
pub fn check(file: &str, source: &str, program: &Program) -> (bool, DiagnosticEngine, TypePool) {
    let mut checker = Checker::new(file, source, default_shared_context());
    checker.check_program(program);
    checker.finish()
}

fn default_shared_context() -> Rc<SharedContext> {
    Rc::new(SharedContext {
        modules: RefCell::new(HashMap::new()),
        builtin_modules: builtin_module_registry(),
        reader: Box::new(StdFileReader),
    })
}

/// Built-in modules registered by display name as well as by path:
/// unqualified identifier lookups fall back to this registry. `Task`
/// is the one built-in the scheduler contributes.
fn builtin_module_registry() -> HashMap<String, TypeRef> {
    let mut modules = HashMap::new();
    modules.insert("Task".to_string(), types::simple("Task", Vec::new()));
    modules
}

impl Checker {
    fn new(file: &str, source: &str, ctx: Rc<SharedContext>) -> Self {
        let env = Environment::root();
        globals::install(&env);
        let base_dir = Path::new(file)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            file: file.to_string(),
            source: source.to_string(),
            base_dir,
            diagnostics: DiagnosticEngine::new(),
            had_error: false,
            env,
            types: TypePool::default(),
            assignment_type: None,
            ctx,
        }
    }

    /// Construct a [`Checker`] for use with a caller-supplied
    /// [`FileReader`] — e.g. an in-memory module graph in tests — in
    /// place of the real filesystem `check` uses by default.
    pub fn with_reader(file: &str, source: &str, reader: Box<dyn FileReader>) -> Self {
        let ctx = Rc::new(SharedContext {
            modules: RefCell::new(HashMap::new()),
            builtin_modules: builtin_module_registry(),
            reader,
        });
        Self::new(file, source, ctx)
    }

    pub fn check_program(&mut self, program: &Program) {
        for &stmt in &program.statements {
            self.check_stmt(&program.ast, stmt);
        }
    }

    pub fn finish(self) -> (bool, DiagnosticEngine, TypePool) {
        (self.had_error || self.diagnostics.has_errors(), self.diagnostics, self.types)
    }

    // ---- shared helpers used by every checker submodule ----

    fn push_env(&mut self) {
        self.env = self.env.child();
    }

    fn pop_env(&mut self) {
        if let Some(parent) = self.env.enclosing() {
            self.env = parent;
        }
    }

    fn diag_span(&self, span: AstSpan) -> DiagSpan {
        let mut diag = DiagSpan::from_file_and_span(
            &self.file,
            &self.source,
            span.start as usize..span.end as usize,
        );
        diag.line = span.line as usize;
        diag
    }

    fn cache_type(&mut self, ast: &lumen_ast::Ast, node: NodeId, ty: TypeRef) -> TypeRef {
        let id = self.types.intern(ty.clone());
        ast.node(node).set_cached_type(id);
        ty
    }

    pub fn resolve_cached(&self, node: &lumen_ast::Node) -> Option<TypeRef> {
        node.cached_type().map(|id| self.types.resolve(id))
    }

    /// Classify a literal constant into its primitive type.
    fn type_of_value(&self, value: &Value) -> TypeRef {
        let name = match value {
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Atom(_) => "Atom",
            Value::Bool(_) => "Bool",
            Value::Nil => "Nil",
        };
        self.env
            .get_type(name)
            .expect("primitive types are installed into every root environment")
    }

    /// Variable/type lookup that falls back to the built-in module
    /// registry by display name before giving up.
    fn lookup_type_name(&self, name: &str) -> Option<TypeRef> {
        self.env
            .get_type(name)
            .or_else(|| self.ctx.builtin_modules.get(name).cloned())
    }

    fn lookup_value_name(&self, name: &str) -> Option<TypeRef> {
        self.env
            .get_local(name)
            .or_else(|| self.ctx.builtin_modules.get(name).cloned())
    }

    fn any_type(&self) -> TypeRef {
        self.env.get_type("Any").expect("Any is a global primitive")
    }

    fn nil_type(&self) -> TypeRef {
        self.env.get_type("Nil").expect("Nil is a global primitive")
    }

    fn never_type(&self) -> TypeRef {
        self.env.get_type("Never").expect("Never is a global primitive")
    }

    fn undefined_variable(&mut self, name: &str, span: AstSpan) {
        self.had_error = true;
        let suggestions = lumen_diagnostics::fuzzy::find_similar_names(
            name,
            &self.env.visible_local_names(),
            0.7,
            3,
        );
        let span = self.diag_span(span);
        self.diagnostics.undefined_variable(name, span, suggestions);
    }

    fn undefined_type(&mut self, name: &str, span: AstSpan) -> TypeRef {
        self.had_error = true;
        let span = self.diag_span(span);
        self.diagnostics.emit_error(
            error_codes::UNDEFINED_TYPE,
            format!("cannot find type `{name}` in this scope"),
            span,
        );
        self.any_type()
    }

    fn type_mismatch(&mut self, expected: &TypeRef, found: &TypeRef, span: AstSpan) {
        self.had_error = true;
        let span = self.diag_span(span);
        self.diagnostics
            .type_mismatch(&expected.to_string(), &found.to_string(), span);
    }

    fn invalid_field(&mut self, owner: &TypeRef, field: &str, span: AstSpan) {
        self.had_error = true;
        let span = self.diag_span(span);
        self.diagnostics.emit_error(
            error_codes::NO_SUCH_FIELD,
            format!("no field or method `{field}` on type `{owner}`"),
            span,
        );
    }

    fn require_subtype(&mut self, value: &TypeRef, expected: &TypeRef, span: AstSpan) -> bool {
        if crate::subtyping::is_subtype(value, expected, &self.env) {
            true
        } else {
            self.type_mismatch(expected, value, span);
            false
        }
    }
}
