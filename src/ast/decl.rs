//! Declaration arena
//!
//! Variables, constants and scopes are stored here and addressed by stable
//! ids. Expression nodes hold ids rather than links, so a variable can gain
//! its register after the nodes referring to it were built.

use super::expr::ValueKind;
use crate::compiler::Register;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Variable id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub u32);

/// Constant id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstId(pub u32);

/// Scope id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// Kind of compilation module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Plain contract
    Contract,
    /// Fungible token contract
    Token,
    /// Non-fungible token contract
    Nft,
    /// Standalone script
    Script,
}

/// Module-level information visible to macros
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Declared module name
    pub name: String,
    /// Module kind
    pub kind: ModuleKind,
    /// Token symbol, for token and NFT modules
    pub symbol: Option<String>,
}

impl ModuleInfo {
    /// Plain contract module
    pub fn contract(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ModuleKind::Contract,
            symbol: None,
        }
    }

    /// Token or NFT module with a symbol
    pub fn token(name: &str, kind: ModuleKind, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            symbol: Some(symbol.to_string()),
        }
    }
}

/// Lexical scope
#[derive(Debug, Clone)]
pub struct Scope {
    /// Scope name (method name, block label, ...)
    pub name: String,
    /// Enclosing scope
    pub parent: Option<ScopeId>,
    /// Set on module scopes only
    pub module: Option<ModuleInfo>,
}

/// Variable declaration
#[derive(Debug, Clone)]
pub struct VariableDecl {
    /// Variable name
    pub name: String,
    /// Declared kind
    pub kind: ValueKind,
    register: Option<Register>,
}

impl VariableDecl {
    /// Register bound to this variable, if assigned yet
    pub fn register(&self) -> Option<Register> {
        self.register
    }
}

/// Constant declaration
#[derive(Debug, Clone)]
pub struct ConstantDecl {
    /// Constant name
    pub name: String,
    /// Declared kind
    pub kind: ValueKind,
    /// Raw value text
    pub value: String,
}

/// Arena of all declarations for one compilation unit
#[derive(Debug, Clone)]
pub struct Declarations {
    scopes: Vec<Scope>,
    variables: Vec<VariableDecl>,
    constants: Vec<ConstantDecl>,
}

impl Declarations {
    /// Root scope created with every arena
    pub const ROOT: ScopeId = ScopeId(0);

    /// Creates an arena holding only the root scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                name: "global".to_string(),
                parent: None,
                module: None,
            }],
            variables: Vec::new(),
            constants: Vec::new(),
        }
    }

    /// Add a module scope under the root
    pub fn add_module(&mut self, module: ModuleInfo) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            name: module.name.clone(),
            parent: Some(Self::ROOT),
            module: Some(module),
        });
        id
    }

    /// Add a nested scope
    pub fn add_scope(&mut self, name: &str, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            name: name.to_string(),
            parent: Some(parent),
            module: None,
        });
        id
    }

    /// Declare a variable with no register yet
    pub fn declare_variable(&mut self, name: &str, kind: ValueKind) -> VarId {
        let id = VarId(self.variables.len() as u32);
        self.variables.push(VariableDecl {
            name: name.to_string(),
            kind,
            register: None,
        });
        id
    }

    /// Declare a constant
    pub fn declare_constant(&mut self, name: &str, kind: ValueKind, value: &str) -> ConstId {
        let id = ConstId(self.constants.len() as u32);
        self.constants.push(ConstantDecl {
            name: name.to_string(),
            kind,
            value: value.to_string(),
        });
        id
    }

    /// Look up a scope
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this arena.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Look up a variable
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this arena.
    pub fn variable(&self, id: VarId) -> &VariableDecl {
        &self.variables[id.0 as usize]
    }

    /// Look up a constant
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this arena.
    pub fn constant(&self, id: ConstId) -> &ConstantDecl {
        &self.constants[id.0 as usize]
    }

    /// Nearest enclosing module of a scope
    pub fn module_of(&self, mut id: ScopeId) -> Option<&ModuleInfo> {
        loop {
            let scope = self.scope(id);
            if let Some(module) = &scope.module {
                return Some(module);
            }
            id = scope.parent?;
        }
    }

    /// Bind a register to a variable. A variable is bound at most once while
    /// its register is live.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this arena.
    pub fn bind_register(&mut self, id: VarId, register: Register) -> Result<()> {
        let var = &mut self.variables[id.0 as usize];
        if var.register.is_some() {
            return Err(Error::RegisterRebound {
                name: var.name.clone(),
            });
        }
        tracing::trace!("bound {} to variable {}", register, var.name);
        var.register = Some(register);
        Ok(())
    }

    /// Forget the register of every variable bound to one of `released`.
    /// Returns how many variables were unbound.
    pub fn unbind_registers(&mut self, released: &[Register]) -> usize {
        let mut unbound = 0;
        for var in &mut self.variables {
            if let Some(reg) = var.register {
                if released.contains(&reg) {
                    tracing::trace!("unbound {} from variable {}", reg, var.name);
                    var.register = None;
                    unbound += 1;
                }
            }
        }
        unbound
    }
}

impl Default for Declarations {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_lookup_walks_parents() {
        let mut decls = Declarations::new();
        let module = decls.add_module(ModuleInfo::contract("bank"));
        let method = decls.add_scope("deposit", module);
        let block = decls.add_scope("block_0", method);

        assert_eq!(decls.module_of(block).map(|m| m.name.as_str()), Some("bank"));
        assert!(decls.module_of(Declarations::ROOT).is_none());
    }

    #[test]
    fn test_register_binds_once() {
        let mut decls = Declarations::new();
        let x = decls.declare_variable("x", ValueKind::Number);
        assert!(decls.variable(x).register().is_none());

        decls.bind_register(x, Register::new(0)).unwrap();
        assert_eq!(decls.variable(x).register(), Some(Register::new(0)));

        let err = decls.bind_register(x, Register::new(1)).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_unbind_forgets_released_registers() {
        let mut decls = Declarations::new();
        let x = decls.declare_variable("x", ValueKind::Number);
        let y = decls.declare_variable("y", ValueKind::Number);
        decls.bind_register(x, Register::new(0)).unwrap();
        decls.bind_register(y, Register::new(1)).unwrap();

        assert_eq!(decls.unbind_registers(&[Register::new(0)]), 1);
        assert!(decls.variable(x).register().is_none());
        assert_eq!(decls.variable(y).register(), Some(Register::new(1)));

        // Unbound variables may be bound again
        decls.bind_register(x, Register::new(2)).unwrap();
        assert_eq!(decls.variable(x).register(), Some(Register::new(2)));
    }

    #[test]
    #[should_panic]
    fn test_foreign_variable_id_panics() {
        let mut other = Declarations::new();
        other.declare_variable("a", ValueKind::Number);
        let foreign = other.declare_variable("b", ValueKind::Number);

        let decls = Declarations::new();
        let _ = decls.variable(foreign);
    }
}
