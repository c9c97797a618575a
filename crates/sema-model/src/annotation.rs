//! Raw annotation syntax.

use serde::{Deserialize, Serialize};
use sema_common::Location;
use std::fmt;

use crate::type_ref::TypeRef;

/// One annotation usage as written: `[Name(arg, Named = value)]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationApplication {
    /// Possibly qualified and possibly missing the `Attribute` suffix.
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<AnnotationArgument>,
    pub location: Location,
}

impl AnnotationApplication {
    /// The last segment of the written name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Positional arguments in order.
    pub fn positional(&self) -> impl Iterator<Item = &ConstValue> {
        self.arguments
            .iter()
            .filter(|a| a.name.is_none())
            .map(|a| &a.value)
    }

    /// The value of the named argument `name`, if written.
    pub fn named(&self, name: &str) -> Option<&ConstValue> {
        self.arguments
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| &a.value)
    }

    pub fn positional_count(&self) -> usize {
        self.positional().count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationArgument {
    #[serde(default)]
    pub name: Option<String>,
    pub value: ConstValue,
}

/// A constant annotation argument or constant field initializer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// `typeof(T)`
    Type(TypeRef),
    /// A reference to a constant field, `F` or `T.F`, evaluated during
    /// decoding.
    Const(String),
}

impl ConstValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::Type(_) => "type",
            Self::Const(_) => "constant",
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Type(t) => write!(f, "typeof({t})"),
            Self::Const(name) => f.write_str(name),
        }
    }
}
