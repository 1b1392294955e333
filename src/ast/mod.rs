//! # Abstract Syntax Tree consumed by code generation
//!
//! Trees arrive fully built and type-resolved from upstream passes. The only
//! rewrite code generation performs on them is replacing macro nodes with
//! literals (see [`crate::compiler::MacroExpander`]).

mod decl;
mod expr;
mod stmt;

pub use decl::{
    ConstId, ConstantDecl, Declarations, ModuleInfo, ModuleKind, Scope, ScopeId, VarId,
    VariableDecl,
};
pub use expr::{BinaryOp, Expr, ExprKind, MethodBinding, MethodImplementation, NodeId, ValueKind};
pub use stmt::{EventDecl, MethodDecl, ModuleDecl, Statement, StmtKind};
