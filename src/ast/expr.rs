//! Expression nodes

use super::decl::{ConstId, Declarations, ScopeId, VarId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an AST node, used for diagnostics and source mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Semantic value category of an expression, resolved upstream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// No value (method return kind only)
    None,
    /// Boolean
    Bool,
    /// Arbitrary-precision number
    Number,
    /// UTF-8 string
    String,
    /// Contract or account address
    Address,
    /// Structured record, by type name
    Struct(String),
    /// Kind not resolved by the type pass
    Unknown,
}

impl ValueKind {
    /// Literal text of this kind is emitted quoted
    pub fn is_quoted(&self) -> bool {
        matches!(self, ValueKind::String)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValueKind::None => write!(f, "none"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Address => write!(f, "address"),
            ValueKind::Struct(name) => write!(f, "{}", name),
            ValueKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Modulo (%)
    Mod,
    /// Equality (==)
    Equal,
    /// Inequality (!=)
    NotEqual,
    /// Less than (<)
    Less,
    /// Less than or equal (<=)
    LessOrEqual,
    /// Greater than (>)
    Greater,
    /// Greater than or equal (>=)
    GreaterOrEqual,
    /// Logical AND (and)
    And,
    /// Logical OR (or)
    Or,
    /// Logical XOR (xor)
    Xor,
}

impl BinaryOp {
    /// Comparison and logical operators produce a boolean
    pub fn is_logical(&self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        };
        write!(f, "{}", symbol)
    }
}

/// How a resolved method is reached at run time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodImplementation {
    /// VM built-in, invoked by name
    ExternalCall,
    /// Method of another deployed contract
    ContractCall {
        /// Target contract identifier
        contract: String,
    },
    /// Declared but unbacked; aborts when executed
    Custom,
}

/// Resolved method descriptor for one call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBinding {
    /// Source-level method name
    pub name: String,
    /// Declared return kind
    pub return_kind: ValueKind,
    /// Calling convention
    pub implementation: MethodImplementation,
    /// Name the VM knows the method by
    pub alias: String,
}

impl MethodBinding {
    /// Binding to a VM built-in
    pub fn external(name: &str, alias: &str, return_kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            return_kind,
            implementation: MethodImplementation::ExternalCall,
            alias: alias.to_string(),
        }
    }

    /// Binding to a method of another contract
    pub fn contract(contract: &str, name: &str, return_kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            return_kind,
            implementation: MethodImplementation::ContractCall {
                contract: contract.to_string(),
            },
            alias: name.to_string(),
        }
    }

    /// Binding to a declared method with no implementation
    pub fn custom(name: &str, return_kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            return_kind,
            implementation: MethodImplementation::Custom,
            alias: name.to_string(),
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Node identity
    pub id: NodeId,
    /// Source line, for diagnostics
    pub line: usize,
    /// Enclosing scope (read-only)
    pub scope: ScopeId,
    /// Variant payload
    pub kind: ExprKind,
}

/// Expression variants
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Boolean negation: `!operand`
    Negation(Box<Expr>),
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand, evaluated first
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// Call through a resolved binding
    MethodCall {
        /// Resolved method
        binding: MethodBinding,
        /// Arguments in declared order
        args: Vec<Expr>,
    },
    /// Literal with its raw source text
    Literal {
        /// Raw text (no quotes for strings)
        value: String,
        /// Value kind
        kind: ValueKind,
    },
    /// Compile-time placeholder
    Macro(String),
    /// Read of a variable
    VarRef(VarId),
    /// Read of a constant
    ConstRef(ConstId),
}

impl Expr {
    /// Create a node
    pub fn new(id: NodeId, line: usize, scope: ScopeId, kind: ExprKind) -> Self {
        Self {
            id,
            line,
            scope,
            kind,
        }
    }

    /// Result kind of this expression
    pub fn result_kind(&self, decls: &Declarations) -> ValueKind {
        match &self.kind {
            ExprKind::Negation(_) => ValueKind::Bool,
            // Right operand is trusted to agree with the left one.
            ExprKind::Binary { op, left, .. } => {
                if op.is_logical() {
                    ValueKind::Bool
                } else {
                    left.result_kind(decls)
                }
            }
            ExprKind::MethodCall { binding, .. } => binding.return_kind.clone(),
            ExprKind::Literal { kind, .. } => kind.clone(),
            ExprKind::Macro(_) => ValueKind::Unknown,
            ExprKind::VarRef(var) => decls.variable(*var).kind.clone(),
            ExprKind::ConstRef(constant) => decls.constant(*constant).kind.clone(),
        }
    }

    /// Does this subtree contain the node with the given identity?
    pub fn contains(&self, node: NodeId) -> bool {
        if self.id == node {
            return true;
        }
        match &self.kind {
            ExprKind::Negation(operand) => operand.contains(node),
            ExprKind::Binary { left, right, .. } => left.contains(node) || right.contains(node),
            ExprKind::MethodCall { args, .. } => args.iter().any(|arg| arg.contains(node)),
            ExprKind::Literal { .. }
            | ExprKind::Macro(_)
            | ExprKind::VarRef(_)
            | ExprKind::ConstRef(_) => false,
        }
    }

    /// Does any macro node remain in this subtree?
    pub fn has_macros(&self) -> bool {
        match &self.kind {
            ExprKind::Macro(_) => true,
            ExprKind::Negation(operand) => operand.has_macros(),
            ExprKind::Binary { left, right, .. } => left.has_macros() || right.has_macros(),
            ExprKind::MethodCall { args, .. } => args.iter().any(Expr::has_macros),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(id: u32, value: &str, kind: ValueKind) -> Expr {
        Expr::new(
            NodeId(id),
            1,
            ScopeId(0),
            ExprKind::Literal {
                value: value.to_string(),
                kind,
            },
        )
    }

    #[test]
    fn test_binary_kind_follows_operator() {
        let decls = Declarations::new();
        let sum = Expr::new(
            NodeId(3),
            1,
            ScopeId(0),
            ExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(lit(1, "1", ValueKind::Number)),
                right: Box::new(lit(2, "2", ValueKind::Number)),
            },
        );
        let cmp = Expr::new(
            NodeId(6),
            1,
            ScopeId(0),
            ExprKind::Binary {
                op: BinaryOp::Less,
                left: Box::new(lit(4, "1", ValueKind::Number)),
                right: Box::new(lit(5, "2", ValueKind::Number)),
            },
        );

        assert_eq!(sum.result_kind(&decls), ValueKind::Number);
        assert_eq!(cmp.result_kind(&decls), ValueKind::Bool);
    }

    #[test]
    fn test_contains_is_identity_based() {
        let left = lit(1, "1", ValueKind::Number);
        let twin = lit(9, "1", ValueKind::Number);
        let expr = Expr::new(
            NodeId(3),
            1,
            ScopeId(0),
            ExprKind::Negation(Box::new(left.clone())),
        );

        assert!(expr.contains(NodeId(3)));
        assert!(expr.contains(left.id));
        // Structurally equal but a different node
        assert!(!expr.contains(twin.id));
    }

    #[test]
    fn test_call_kind_is_binding_return_kind() {
        let decls = Declarations::new();
        let call = Expr::new(
            NodeId(1),
            1,
            ScopeId(0),
            ExprKind::MethodCall {
                binding: MethodBinding::external("time", "Runtime.Time", ValueKind::Number),
                args: vec![],
            },
        );
        assert_eq!(call.result_kind(&decls), ValueKind::Number);
    }
}
