//! # contractc - Expression Code Generation for Contract VMs
//!
//! Lowers type-resolved expression trees of a smart-contract language into the
//! linear instruction stream of a register/stack hybrid virtual machine.
//!
//! ## Features
//!
//! - **Register discipline** - every temporary is released as soon as it is
//!   consumed; evaluating a tree leaves exactly one extra live register
//! - **Deterministic order** - left operands before right, call arguments
//!   right to left so callees pop them in declared order
//! - **Three calling conventions** - VM built-ins, calls into other
//!   contracts, and aborting stubs for unimplemented methods
//! - **Compile-time macros** - `$THIS_ADDRESS`, `$THIS_SYMBOL`
//! - **Exported interfaces** - method/event tables as JSON, with NFT
//!   standard signature normalization
//!
//! ## Quick Start
//!
//! ```rust
//! use contractc::ast::{BinaryOp, Declarations, Expr, ExprKind, NodeId, ValueKind};
//! use contractc::compiler::CodeGenerator;
//!
//! # fn main() -> contractc::Result<()> {
//! let decls = Declarations::new();
//! let scope = Declarations::ROOT;
//! let two = Expr::new(NodeId(1), 1, scope, ExprKind::Literal {
//!     value: "2".to_string(),
//!     kind: ValueKind::Number,
//! });
//! let three = Expr::new(NodeId(2), 1, scope, ExprKind::Literal {
//!     value: "3".to_string(),
//!     kind: ValueKind::Number,
//! });
//! let sum = Expr::new(NodeId(3), 1, scope, ExprKind::Binary {
//!     op: BinaryOp::Add,
//!     left: Box::new(two),
//!     right: Box::new(three),
//! });
//!
//! let mut gen = CodeGenerator::new();
//! let result = gen.generate_expr(&decls, &sum)?;
//!
//! assert_eq!(gen.output().to_string(), "LOAD r0 2\nLOAD r1 3\nADD r0 r1 r2\n");
//! assert_eq!(result.to_string(), "r2");
//!
//! // The caller owns the result register
//! gen.release(result)?;
//! assert_eq!(gen.registers().live_count(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! AST + bindings → MacroExpander → CodeGenerator → Instructions
//!                                        ↓
//!                               ContractInterface (JSON)
//! ```
//!
//! ### Main Components
//!
//! - [`ast`] - expression nodes, statements and the declaration arena
//! - [`compiler::RegisterAllocator`] - register pool with explicit release
//! - [`compiler::MacroExpander`] - replaces macro nodes with literals
//! - [`compiler::CodeGenerator`] - per-node instruction emission
//! - [`compiler::Compiler`] - whole-module compilation and interface export
//!
//! ## Error Handling
//!
//! Errors are split into internal-consistency failures (an upstream pass
//! broke an invariant) and compile errors in the user's program; see
//! [`Error::is_internal`].
//!
//! ## License
//!
//! Licensed under the [MIT License](https://opensource.org/licenses/MIT).

// Module declarations
/// Version of the compiler
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ast;
pub mod compiler;
pub mod error;

// Re-export main types
pub use compiler::{CodeGenerator, CompileOptions, CompiledModule, Compiler, Register};
pub use error::{Error, ErrorSeverity, Result};
