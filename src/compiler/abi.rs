//! Exported contract interface
//!
//! Describes the methods and events a compiled contract exposes. The
//! interface is handed to manifest assembly as JSON:
//!
//! ```json
//! {
//!   "methods": [
//!     { "name": "getOwner", "returnKind": "address", "offset": 0,
//!       "parameters": [{ "name": "tokenID", "kind": "number" }] }
//!   ],
//!   "events": []
//! }
//! ```
//!
//! Contracts implementing a standard (NFT) have the publicly reported
//! parameters of standard methods replaced, see [`ContractInterface::apply_standard`].

use crate::ast::{EventDecl, ModuleKind, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name of the parameter standard methods are reported with
pub const TOKEN_ID_PARAMETER: &str = "tokenID";

lazy_static::lazy_static! {
    /// Methods every NFT contract exposes, keyed by token id
    static ref NFT_METHODS: HashSet<&'static str> = [
        "getName",
        "getDescription",
        "getImageURL",
        "getInfoURL",
        "getOwner",
        "getSeries",
        "getRoyalties",
    ]
    .into_iter()
    .collect();
}

/// Standard interfaces with normalized method signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardInterface {
    /// Non-fungible token standard
    Nft,
}

impl StandardInterface {
    /// Standard implied by a module kind
    pub fn for_module(kind: ModuleKind) -> Option<Self> {
        match kind {
            ModuleKind::Nft => Some(StandardInterface::Nft),
            ModuleKind::Contract | ModuleKind::Token | ModuleKind::Script => None,
        }
    }

    /// Is `name` one of this standard's methods?
    pub fn is_standard_method(&self, name: &str) -> bool {
        match self {
            StandardInterface::Nft => NFT_METHODS.contains(name),
        }
    }
}

/// Method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParameter {
    /// Parameter name
    pub name: String,
    /// Parameter kind
    pub kind: ValueKind,
}

/// Exported method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMethod {
    /// Method name
    pub name: String,
    /// Declared return kind
    pub return_kind: ValueKind,
    /// Instruction offset of the method entry
    pub offset: usize,
    /// Publicly reported parameters
    pub parameters: Vec<ContractParameter>,
}

/// Exported event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractEvent {
    /// Event code
    pub value: u8,
    /// Event name
    pub name: String,
    /// Payload kind
    pub return_kind: ValueKind,
    /// Description template
    pub description: String,
}

impl From<&EventDecl> for ContractEvent {
    fn from(decl: &EventDecl) -> Self {
        Self {
            value: decl.value,
            name: decl.name.clone(),
            return_kind: decl.return_kind.clone(),
            description: decl.description.clone(),
        }
    }
}

/// Method and event table of a contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInterface {
    /// Exported methods in declaration order
    pub methods: Vec<ContractMethod>,
    /// Declared events
    #[serde(default)]
    pub events: Vec<ContractEvent>,
}

impl ContractInterface {
    /// Creates an empty interface
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a method by name
    pub fn find_method(&self, name: &str) -> Option<&ContractMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Replace the reported parameters of every standard method with a single
    /// token id. Returns how many methods were rewritten.
    pub fn apply_standard(&mut self, standard: StandardInterface) -> usize {
        let mut rewritten = 0;
        for method in &mut self.methods {
            if standard.is_standard_method(&method.name) {
                method.parameters = vec![ContractParameter {
                    name: TOKEN_ID_PARAMETER.to_string(),
                    kind: ValueKind::Number,
                }];
                rewritten += 1;
            }
        }
        tracing::debug!("{:?} standard rewrote {} method signatures", standard, rewritten);
        rewritten
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
