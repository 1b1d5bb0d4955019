//! Abstract syntax tree for the core language.
//!
//! Nodes are not linked by pointers. They live in a flat, append-only
//! [`Ast`] arena and refer to each other by [`NodeId`] (a plain index).
//! This replaces the source toolchain's intrusive free-chain of
//! heap-allocated nodes: traversal walks the arena directly, and the
//! "mark bit" used there for a mark-and-sweep collection pass becomes a
//! `Cell<bool>` on each node that a caller can flip while walking roots.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a node inside an [`Ast`] arena. Statement and expression
/// nodes share this id space, mirroring the source grammar where both
/// kinds are visited by the same walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Opaque handle into a type checker's type arena. `lumen-ast` does not
/// know what a type *is* — only that the checker caches one type per
/// expression node by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
}

impl Span {
    pub fn new(start: u32, end: u32, line: u32) -> Self {
        Self { start, end, line }
    }

    pub fn unknown() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 0,
        }
    }
}

/// A runtime constant as it appears in source (the value carried by a
/// `Literal` expression). The host's richer value representation
/// (tagged NaN-boxing, heap objects, ...) lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    String(String),
    Atom(String),
    Bool(bool),
    Nil,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Atom(a) => write!(f, ":{a}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nil => write!(f, "nil"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// Is this a `fun` declaration, a `class` method, the `init` method, or
/// an anonymous lambda? Drives how the checker binds `this`/return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Method,
    Initializer,
    Lambda,
}

/// A generic type parameter declaration: `T` or `T extends Bound`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericParam {
    pub name: String,
    pub extends: Option<TypeNode>,
}

/// A typed parameter in a function/lambda/method signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeNode>,
}

/// Syntactic type annotation, as written by the programmer. Distinct
/// from the checker's semantic `Type` lattice (see `lumen-types`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeNode {
    /// `Name` or `Name<A, B>`
    Simple {
        name: String,
        generics: Vec<TypeNode>,
    },
    /// `(A, B) => R` or `<T>(A, B) => R`
    Functor {
        generics: Vec<GenericParam>,
        args: Vec<TypeNode>,
        ret: Option<Box<TypeNode>>,
    },
    /// `A | B`
    Union { left: Box<TypeNode>, right: Box<TypeNode> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub fields: Vec<TypeNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Var,
    Const,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Value),
    Unary {
        op: UnaryOp,
        right: NodeId,
        span: Span,
    },
    Binary {
        left: NodeId,
        op: BinaryOp,
        right: NodeId,
        span: Span,
    },
    Grouping(NodeId),
    Variable {
        name: String,
        span: Span,
    },
    Assign {
        name: String,
        value: NodeId,
        span: Span,
    },
    Logical {
        left: NodeId,
        op: LogicalOp,
        right: NodeId,
    },
    Call {
        callee: NodeId,
        paren: Span,
        args: Vec<NodeId>,
    },
    GetItem {
        object: NodeId,
        index: NodeId,
        span: Span,
    },
    Get {
        object: NodeId,
        name: String,
        span: Span,
    },
    Set {
        object: NodeId,
        name: String,
        value: NodeId,
        span: Span,
    },
    Super {
        keyword: Span,
        method: String,
    },
    This {
        span: Span,
    },
    Yield {
        value: Option<NodeId>,
    },
    Lambda {
        generics: Vec<GenericParam>,
        params: Vec<Param>,
        ret: Option<TypeNode>,
        body: NodeId,
    },
    List {
        bracket: Span,
        items: Vec<NodeId>,
    },
    Map {
        brace: Span,
        keys: Vec<NodeId>,
        values: Vec<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expression(NodeId),
    Var {
        name: String,
        kind: VarKind,
        ty: Option<TypeNode>,
        init: Option<NodeId>,
        span: Span,
    },
    Block(Vec<NodeId>),
    Function {
        name: String,
        kind: FunctionKind,
        generics: Vec<GenericParam>,
        params: Vec<Param>,
        ret: Option<TypeNode>,
        body: NodeId,
    },
    Class {
        name: String,
        generics: Vec<GenericParam>,
        superclass: Option<NodeId>,
        body: Vec<NodeId>,
    },
    Interface {
        name: String,
        generics: Vec<GenericParam>,
        supertype: Option<TypeNode>,
        body: Vec<NodeId>,
    },
    MethodSig {
        name: String,
        kind: FunctionKind,
        generics: Vec<GenericParam>,
        params: Vec<Param>,
        ret: Option<TypeNode>,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        incr: Option<NodeId>,
        body: NodeId,
    },
    Return {
        keyword: Span,
        value: Option<NodeId>,
    },
    Break,
    Import {
        path: String,
        alias: String,
        span: Span,
    },
    TypeDeclaration {
        name: String,
        generics: Vec<GenericParam>,
        target: TypeNode,
    },
    Enum {
        name: String,
        generics: Vec<GenericParam>,
        variants: Vec<EnumVariant>,
    },
}

/// Tagged union of the two node payload kinds, stored uniformly in the
/// arena so statements and expressions share an id space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Expr(Expr),
    Stmt(Stmt),
}

/// One arena slot: the syntax payload, plus the two pieces of
/// checker/collector state the source toolchain stored inline on every
/// heap-allocated node.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    marked: Cell<bool>,
    cached_type: Cell<Option<TypeId>>,
}

impl Node {
    pub fn is_marked(&self) -> bool {
        self.marked.get()
    }

    pub fn mark(&self) {
        self.marked.set(true);
    }

    pub fn unmark(&self) {
        self.marked.set(false);
    }

    pub fn cached_type(&self) -> Option<TypeId> {
        self.cached_type.get()
    }

    pub fn set_cached_type(&self, ty: TypeId) {
        self.cached_type.set(Some(ty));
    }
}

/// Append-only store of every node allocated while parsing one file.
/// Released as a single unit when the file's AST is no longer needed —
/// there is no per-node free, matching the arena-of-handles redesign.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> NodeId {
        self.push(NodeKind::Expr(expr))
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> NodeId {
        self.push(NodeKind::Stmt(stmt))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            marked: Cell::new(false),
            cached_type: Cell::new(None),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn expr(&self, id: NodeId) -> &Expr {
        match &self.node(id).kind {
            NodeKind::Expr(e) => e,
            NodeKind::Stmt(_) => panic!("node {id:?} is a statement, not an expression"),
        }
    }

    pub fn stmt(&self, id: NodeId) -> &Stmt {
        match &self.node(id).kind {
            NodeKind::Stmt(s) => s,
            NodeKind::Expr(_) => panic!("node {id:?} is an expression, not a statement"),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk every node currently in the arena (used by the collector's
    /// mark-and-sweep root scan and by diagnostics dumps).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn clear_marks(&self) {
        for node in &self.nodes {
            node.unmark();
        }
    }
}

/// Root of a parsed file: the ordered top-level statement sequence plus
/// the arena that owns every node it references.
#[derive(Debug)]
pub struct Program {
    pub ast: Ast,
    pub statements: Vec<NodeId>,
}

impl Program {
    pub fn new(ast: Ast, statements: Vec<NodeId>) -> Self {
        Self { ast, statements }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_round_trip() {
        let mut ast = Ast::new();
        let lit = ast.alloc_expr(Expr::Literal(Value::Number(1.0)));
        let var = ast.alloc_stmt(Stmt::Var {
            name: "x".to_string(),
            kind: VarKind::Var,
            ty: None,
            init: Some(lit),
            span: Span::unknown(),
        });

        assert_eq!(ast.len(), 2);
        match ast.stmt(var) {
            Stmt::Var { init: Some(id), .. } => {
                assert_eq!(*id, lit);
                assert!(matches!(ast.expr(*id), Expr::Literal(Value::Number(n)) if *n == 1.0));
            }
            _ => panic!("expected Var"),
        }
    }

    #[test]
    fn cached_type_and_mark_bit() {
        let mut ast = Ast::new();
        let lit = ast.alloc_expr(Expr::Literal(Value::Nil));
        assert_eq!(ast.node(lit).cached_type(), None);
        ast.node(lit).set_cached_type(TypeId(7));
        assert_eq!(ast.node(lit).cached_type(), Some(TypeId(7)));

        assert!(!ast.node(lit).is_marked());
        ast.node(lit).mark();
        assert!(ast.node(lit).is_marked());
        ast.clear_marks();
        assert!(!ast.node(lit).is_marked());
    }

    #[test]
    fn serializes_type_nodes() {
        let node = TypeNode::Union {
            left: Box::new(TypeNode::Simple {
                name: "Number".to_string(),
                generics: vec![],
            }),
            right: Box::new(TypeNode::Simple {
                name: "Nil".to_string(),
                generics: vec![],
            }),
        };
        let json = serde_json::to_string(&node).unwrap();
        let back: TypeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }
}
