//! Metadata of referenced units.
//!
//! References are already loaded by the time a compilation is built; this is
//! only the shape the engine consults for name lookup, grants and forwarders.

use serde::{Deserialize, Serialize};

use crate::decl::TypeKind;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedUnit {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Hex-encoded public key; `None` for unsigned units.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Raw grant strings: `"Friend"` or `"Friend, PublicKey=0024..."`.
    #[serde(default)]
    pub internals_visible_to: Vec<String>,
    #[serde(default)]
    pub types: Vec<ExternalType>,
    #[serde(default)]
    pub forwarders: Vec<TypeForwarder>,
}

impl ReferencedUnit {
    pub fn find_type(&self, full_name: &str, arity: usize) -> Option<&ExternalType> {
        self.types
            .iter()
            .find(|t| t.name == full_name && t.arity == arity)
    }

    pub fn find_forwarder(&self, full_name: &str) -> Option<&TypeForwarder> {
        self.forwarders.iter().find(|f| f.name == full_name)
    }
}

/// A type defined in a referenced unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalType {
    /// Full name without arity: `Ns.Name`.
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub arity: usize,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub sealed: bool,
}

/// `name` is no longer defined by the declaring unit; it lives in `target`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeForwarder {
    pub name: String,
    pub target: String,
}

const fn default_true() -> bool {
    true
}
