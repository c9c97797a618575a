//! Declaration fragments.
//!
//! A `TypeDecl` is one syntactic occurrence of an aggregate. Partial
//! aggregates contribute several `TypeDecl`s with the same full name; the
//! engine groups them into one entity ordered by `(file, start)`.

use serde::{Deserialize, Serialize};
use sema_common::Location;
use std::fmt;

use crate::annotation::{AnnotationApplication, ConstValue};
use crate::modifiers::{Accessibility, Modifiers};
use crate::reference::ReferencedUnit;
use crate::type_ref::{PrimitiveKind, TypeRef};

/// One compilation's input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub name: String,
    /// Unit-level annotations: version, key, grants, forwarders.
    #[serde(default)]
    pub annotations: Vec<AnnotationApplication>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub references: Vec<ReferencedUnit>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
}

impl TypeKind {
    pub const fn is_value_type(self) -> bool {
        matches!(self, Self::Struct | Self::Enum)
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One declaration fragment of an aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Only meaningful on top-level declarations.
    #[serde(default)]
    pub namespace: Option<String>,
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub base: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    /// Set on the source declaration of a builtin value type (`struct Int32`
    /// declared as `int`). Such a struct may contain a field of itself.
    #[serde(default)]
    pub primitive: Option<PrimitiveKind>,
    #[serde(default)]
    pub annotations: Vec<AnnotationApplication>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    #[serde(default)]
    pub nested_types: Vec<TypeDecl>,
    pub location: Location,
}

impl TypeDecl {
    #[inline]
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    #[inline]
    pub fn is_partial(&self) -> bool {
        self.modifiers.is_partial()
    }

    /// Full name of this declaration inside `container` (a namespace or an
    /// enclosing type's full name).
    pub fn full_name(&self, container: Option<&str>) -> String {
        let prefix = container.or(self.namespace.as_deref());
        match prefix {
            Some(p) if !p.is_empty() => format!("{p}.{}", self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperatorKind {
    #[serde(rename = "+")]
    Addition,
    #[serde(rename = "-")]
    Subtraction,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Division,
    #[serde(rename = "!")]
    LogicalNot,
    #[serde(rename = "==")]
    Equality,
    #[serde(rename = "!=")]
    Inequality,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
    #[serde(rename = "implicit")]
    Implicit,
    #[serde(rename = "explicit")]
    Explicit,
}

impl OperatorKind {
    pub const fn token(self) -> &'static str {
        match self {
            Self::Addition => "+",
            Self::Subtraction => "-",
            Self::Multiply => "*",
            Self::Division => "/",
            Self::LogicalNot => "!",
            Self::Equality => "==",
            Self::Inequality => "!=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThanOrEqual => ">=",
            Self::True => "true",
            Self::False => "false",
            Self::Implicit => "implicit",
            Self::Explicit => "explicit",
        }
    }

    pub const fn metadata_name(self) -> &'static str {
        match self {
            Self::Addition => "op_Addition",
            Self::Subtraction => "op_Subtraction",
            Self::Multiply => "op_Multiply",
            Self::Division => "op_Division",
            Self::LogicalNot => "op_LogicalNot",
            Self::Equality => "op_Equality",
            Self::Inequality => "op_Inequality",
            Self::LessThan => "op_LessThan",
            Self::GreaterThan => "op_GreaterThan",
            Self::LessThanOrEqual => "op_LessThanOrEqual",
            Self::GreaterThanOrEqual => "op_GreaterThanOrEqual",
            Self::True => "op_True",
            Self::False => "op_False",
            Self::Implicit => "op_Implicit",
            Self::Explicit => "op_Explicit",
        }
    }

    /// The operator that must be declared together with this one.
    pub const fn required_partner(self) -> Option<OperatorKind> {
        match self {
            Self::Equality => Some(Self::Inequality),
            Self::Inequality => Some(Self::Equality),
            Self::LessThan => Some(Self::GreaterThan),
            Self::GreaterThan => Some(Self::LessThan),
            Self::LessThanOrEqual => Some(Self::GreaterThanOrEqual),
            Self::GreaterThanOrEqual => Some(Self::LessThanOrEqual),
            Self::True => Some(Self::False),
            Self::False => Some(Self::True),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberDeclKind {
    Field,
    Method,
    Constructor,
    StaticConstructor,
    Property,
    Indexer,
    Event,
    Operator(OperatorKind),
}

impl MemberDeclKind {
    pub const fn description(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Method => "method",
            Self::Constructor | Self::StaticConstructor => "constructor",
            Self::Property => "property",
            Self::Indexer => "indexer",
            Self::Event => "event",
            Self::Operator(_) => "operator",
        }
    }

    pub const fn has_parameters(self) -> bool {
        matches!(
            self,
            Self::Method | Self::Constructor | Self::Indexer | Self::Operator(_)
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

impl RefKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Value => "",
            Self::Ref => "ref",
            Self::Out => "out",
            Self::In => "in",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub ref_kind: RefKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorKind {
    Get,
    Set,
    Add,
    Remove,
}

impl AccessorKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }

    /// Name of the method an accessor of `owner` compiles to.
    pub fn method_name(self, owner: &str) -> String {
        format!("{}_{owner}", self.keyword())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorDecl {
    pub kind: AccessorKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub has_body: bool,
    pub location: Location,
}

/// One declared member inside a `TypeDecl`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDecl {
    pub kind: MemberDeclKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Field, property, event or return type. `None` means `void`.
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub accessors: Vec<AccessorDecl>,
    #[serde(default)]
    pub annotations: Vec<AnnotationApplication>,
    /// Initializer of a `const` field.
    #[serde(default)]
    pub constant: Option<ConstValue>,
    #[serde(default)]
    pub has_body: bool,
    #[serde(default)]
    pub has_initializer: bool,
    pub location: Location,
}

impl MemberDecl {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static() || self.kind == MemberDeclKind::StaticConstructor
    }

    #[inline]
    pub fn is_partial(&self) -> bool {
        self.modifiers.is_partial()
    }

    /// A body on the member itself or on any of its accessors.
    pub fn has_implementation(&self) -> bool {
        self.has_body || self.accessors.iter().any(|a| a.has_body)
    }

    /// Accessibility, defaulting to private as members do.
    pub fn accessibility(&self) -> Accessibility {
        self.modifiers
            .declared_accessibility()
            .unwrap_or(Accessibility::Private)
    }

    /// The name this member is known by in a member table, before any
    /// `IndexerName` annotation is applied.
    pub fn metadata_name(&self) -> String {
        match self.kind {
            MemberDeclKind::Constructor => ".ctor".to_string(),
            MemberDeclKind::StaticConstructor => ".cctor".to_string(),
            MemberDeclKind::Indexer => "Item".to_string(),
            MemberDeclKind::Operator(op) => op.metadata_name().to_string(),
            _ => self.name.clone(),
        }
    }

    /// A field-like event: declared without accessors, so it gets an
    /// implicit backing field of the same name.
    pub fn is_field_like_event(&self) -> bool {
        self.kind == MemberDeclKind::Event && self.accessors.is_empty()
    }

    pub fn accessor(&self, kind: AccessorKind) -> Option<&AccessorDecl> {
        self.accessors.iter().find(|a| a.kind == kind)
    }
}

#[cfg(test)]
#[path = "../tests/decl_tests.rs"]
mod tests;
