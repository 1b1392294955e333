//! Compile-time macro expansion
//!
//! Macros are placeholders such as `$THIS_ADDRESS` whose value is known at
//! compile time. Expansion replaces each macro node with a literal node and
//! must finish over the whole tree before code generation starts.

use crate::ast::{Declarations, Expr, ExprKind, ModuleDecl, ScopeId, ValueKind};
use crate::{Error, Result};
use sha2::{Digest, Sha256};

/// Address kind byte for contract addresses
const CONTRACT_ADDRESS_KIND: u8 = 3;

/// Length of a serialized address in bytes
pub const ADDRESS_LENGTH: usize = 34;

/// Recognized macros
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    /// Address of the enclosing module
    ThisAddress,
    /// Symbol of the enclosing token module
    ThisSymbol,
}

impl MacroKind {
    /// Resolve a macro name, with or without its `$` prefix
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('$') {
            "THIS_ADDRESS" => Some(MacroKind::ThisAddress),
            "THIS_SYMBOL" => Some(MacroKind::ThisSymbol),
            _ => None,
        }
    }
}

/// Derive the address of a contract from its declared name
pub fn contract_address(name: &str) -> [u8; ADDRESS_LENGTH] {
    let hash = Sha256::digest(name.as_bytes());
    let mut address = [0u8; ADDRESS_LENGTH];
    address[0] = CONTRACT_ADDRESS_KIND;
    address[2..].copy_from_slice(&hash);
    address
}

/// Address literal text for a contract name
pub fn contract_address_literal(name: &str) -> String {
    format!("0x{}", hex::encode(contract_address(name)))
}

/// Resolves macro nodes against the declaration arena
pub struct MacroExpander<'a> {
    decls: &'a Declarations,
}

impl<'a> MacroExpander<'a> {
    /// Create an expander over the given declarations
    pub fn new(decls: &'a Declarations) -> Self {
        Self { decls }
    }

    /// Expand a single macro into a literal node with the same identity
    pub fn expand(&self, node: &Expr, name: &str, scope: ScopeId) -> Result<Expr> {
        let kind = MacroKind::from_name(name).ok_or_else(|| Error::UnknownMacro {
            node: node.id,
            line: node.line,
            name: name.to_string(),
        })?;

        let module = self
            .decls
            .module_of(scope)
            .ok_or_else(|| Error::MacroOutsideModule {
                node: node.id,
                line: node.line,
                name: name.to_string(),
            })?;

        let (value, value_kind) = match kind {
            MacroKind::ThisAddress => (contract_address_literal(&module.name), ValueKind::Address),
            MacroKind::ThisSymbol => {
                let symbol = module.symbol.clone().ok_or_else(|| Error::MissingSymbol {
                    node: node.id,
                    line: node.line,
                    module: module.name.clone(),
                })?;
                (symbol, ValueKind::String)
            }
        };

        tracing::debug!("expanded ${} at line {} to {}", name, node.line, value);

        Ok(Expr::new(
            node.id,
            node.line,
            node.scope,
            ExprKind::Literal {
                value,
                kind: value_kind,
            },
        ))
    }

    /// Replace every macro node in the tree
    pub fn expand_all(&self, expr: &mut Expr) -> Result<()> {
        if let ExprKind::Macro(name) = &expr.kind {
            *expr = self.expand(expr, name, expr.scope)?;
            return Ok(());
        }

        match &mut expr.kind {
            ExprKind::Negation(operand) => self.expand_all(operand),
            ExprKind::Binary { left, right, .. } => {
                self.expand_all(left)?;
                self.expand_all(right)
            }
            ExprKind::MethodCall { args, .. } => {
                for arg in args.iter_mut() {
                    self.expand_all(arg)?;
                }
                Ok(())
            }
            ExprKind::Literal { .. }
            | ExprKind::Macro(_)
            | ExprKind::VarRef(_)
            | ExprKind::ConstRef(_) => Ok(()),
        }
    }

    /// Expand every expression in every method body of a module
    pub fn expand_module(&self, module: &mut ModuleDecl) -> Result<()> {
        for method in &mut module.methods {
            for stmt in &mut method.body {
                for expr in stmt.expressions_mut() {
                    self.expand_all(expr)?;
                }
            }
        }
        Ok(())
    }
}
