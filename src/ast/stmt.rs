//! Statements and declarations needed to compile entry points

use super::decl::{ScopeId, VarId};
use super::expr::{Expr, NodeId, ValueKind};

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Node identity
    pub id: NodeId,
    /// Source line
    pub line: usize,
    /// Variant payload
    pub kind: StmtKind,
}

/// Statement variants
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression evaluated for its side effects
    Expression(Expr),
    /// `target = value`
    Assign {
        /// Assigned variable
        target: VarId,
        /// Assigned value
        value: Expr,
    },
    /// `return value?`
    Return(Option<Expr>),
    /// Nested statement list
    Block(Vec<Statement>),
}

impl Statement {
    /// Create a statement node
    pub fn new(id: NodeId, line: usize, kind: StmtKind) -> Self {
        Self { id, line, kind }
    }

    /// Does this statement contain a return, at any nesting depth?
    pub fn has_return(&self) -> bool {
        match &self.kind {
            StmtKind::Return(_) => true,
            StmtKind::Block(body) => body.iter().any(Statement::has_return),
            StmtKind::Expression(_) | StmtKind::Assign { .. } => false,
        }
    }

    /// Expressions owned by this statement, including nested blocks
    pub fn expressions(&self) -> Vec<&Expr> {
        match &self.kind {
            StmtKind::Expression(expr) => vec![expr],
            StmtKind::Assign { value, .. } => vec![value],
            StmtKind::Return(value) => value.iter().collect(),
            StmtKind::Block(body) => body.iter().flat_map(Statement::expressions).collect(),
        }
    }

    /// Mutable access to the expressions owned by this statement
    pub fn expressions_mut(&mut self) -> Vec<&mut Expr> {
        match &mut self.kind {
            StmtKind::Expression(expr) => vec![expr],
            StmtKind::Assign { value, .. } => vec![value],
            StmtKind::Return(value) => value.iter_mut().collect(),
            StmtKind::Block(body) => body.iter_mut().flat_map(Statement::expressions_mut).collect(),
        }
    }
}

/// Method or entry point declaration
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    /// Declaration node
    pub id: NodeId,
    /// Source line
    pub line: usize,
    /// Method name
    pub name: String,
    /// Method scope
    pub scope: ScopeId,
    /// Parameters in declared order
    pub parameters: Vec<VarId>,
    /// Declared return kind
    pub return_kind: ValueKind,
    /// Method body
    pub body: Vec<Statement>,
    /// Exported in the contract interface
    pub public: bool,
}

/// Event declaration
#[derive(Debug, Clone, PartialEq)]
pub struct EventDecl {
    /// Event code
    pub value: u8,
    /// Event name
    pub name: String,
    /// Payload kind
    pub return_kind: ValueKind,
    /// Description template
    pub description: String,
}

/// A compilation module: its scope, methods and events
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDecl {
    /// Module scope (holds the module info)
    pub scope: ScopeId,
    /// Methods in declaration order
    pub methods: Vec<MethodDecl>,
    /// Declared events
    pub events: Vec<EventDecl>,
}
