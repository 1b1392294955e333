//! Error types for contractc code generation

use crate::ast::NodeId;
use thiserror::Error;

/// Code generation errors
///
/// Two families live here. Internal-consistency failures mean an upstream pass
/// handed over a malformed tree and are never caused by user source. Compile
/// errors point at a node in the user's program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Internal-consistency failures
    /// Binary operator with no opcode in the VM vocabulary
    ///
    /// **Triggered by:** a parser producing an operator outside the arithmetic
    /// and comparison sets (e.g. `and`, `!=`)
    #[error("Internal error at node {node}: no opcode for operator {op}")]
    UnsupportedOperator {
        /// Offending node
        node: NodeId,
        /// Operator symbol
        op: String,
    },

    /// Macro node reached code generation
    ///
    /// **Triggered by:** skipping the macro expansion pass
    #[error("Internal error at node {node}: macro ${name} was not expanded before code generation")]
    UnexpandedMacro {
        /// Offending node
        node: NodeId,
        /// Macro name
        name: String,
    },

    /// Register released while not live
    #[error("Internal error: register r{index} released twice")]
    DoubleRelease {
        /// Slot index
        index: u32,
    },

    /// Declaration register assigned a second time
    #[error("Internal error: variable {name} is already bound to a register")]
    RegisterRebound {
        /// Variable name
        name: String,
    },

    // Compile errors
    /// Read of a variable whose register was never bound
    ///
    /// **Triggered by:** using a variable before its first assignment
    /// **Example:** `return x;` where `x` was declared but never assigned
    #[error("Compile error at line {line}: uninitialized variable {name}")]
    UninitializedVariable {
        /// Offending node
        node: NodeId,
        /// Source line
        line: usize,
        /// Variable name
        name: String,
    },

    /// Macro name outside the recognized set
    #[error("Compile error at line {line}: unknown macro ${name}")]
    UnknownMacro {
        /// Offending node
        node: NodeId,
        /// Source line
        line: usize,
        /// Macro name
        name: String,
    },

    /// Macro used where no enclosing module exists
    #[error("Compile error at line {line}: macro ${name} used outside of a module")]
    MacroOutsideModule {
        /// Offending node
        node: NodeId,
        /// Source line
        line: usize,
        /// Macro name
        name: String,
    },

    /// `$THIS_SYMBOL` in a module that declares no symbol
    #[error("Compile error at line {line}: module {module} has no symbol")]
    MissingSymbol {
        /// Offending node
        node: NodeId,
        /// Source line
        line: usize,
        /// Module name
        module: String,
    },

    /// Method declares a return kind but never returns
    ///
    /// **Triggered by:** a method with a non-none return kind and no return statement
    #[error("Compile error at line {line}: method {method} must return a value")]
    MissingReturn {
        /// Method declaration node
        node: NodeId,
        /// Source line
        line: usize,
        /// Method name
        method: String,
    },

    /// Live registers would exceed the configured limit
    #[error("Compile error at line {line}: expression needs more than {limit} registers")]
    RegisterLimit {
        /// Node that requested the register
        node: NodeId,
        /// Source line
        line: usize,
        /// Configured limit
        limit: usize,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Upstream invariant broken; indicates a compiler bug
    Internal,
    /// Problem in the user's program; reported with a location
    User,
}

impl Error {
    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::UnsupportedOperator { .. }
            | Error::UnexpandedMacro { .. }
            | Error::DoubleRelease { .. }
            | Error::RegisterRebound { .. } => ErrorSeverity::Internal,

            Error::UninitializedVariable { .. }
            | Error::UnknownMacro { .. }
            | Error::MacroOutsideModule { .. }
            | Error::MissingSymbol { .. }
            | Error::MissingReturn { .. }
            | Error::RegisterLimit { .. } => ErrorSeverity::User,
        }
    }

    /// True for internal-consistency failures
    pub fn is_internal(&self) -> bool {
        self.classify() == ErrorSeverity::Internal
    }

    /// Node the error was raised for, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Error::UnsupportedOperator { node, .. }
            | Error::UnexpandedMacro { node, .. }
            | Error::UninitializedVariable { node, .. }
            | Error::UnknownMacro { node, .. }
            | Error::MacroOutsideModule { node, .. }
            | Error::MissingSymbol { node, .. }
            | Error::MissingReturn { node, .. }
            | Error::RegisterLimit { node, .. } => Some(*node),
            Error::DoubleRelease { .. } | Error::RegisterRebound { .. } => None,
        }
    }
}

/// Result type for contractc operations
pub type Result<T> = std::result::Result<T, Error>;
