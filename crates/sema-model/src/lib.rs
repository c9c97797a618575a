//! Declaration input for the sema semantic model.
//!
//! Everything here is produced by a front end (or read from a JSON manifest)
//! and never mutated afterwards:
//! - `SourceUnit`: one compilation's types, unit-level annotations and references
//! - `TypeDecl` / `MemberDecl`: declaration fragments of aggregates and their members
//! - `AnnotationApplication`: raw annotation syntax with constant arguments
//! - `TypeRef`: syntactic type references such as `G<int>` or `int[]`
//! - `ReferencedUnit`: already-loaded metadata of a referenced unit

pub mod annotation;
pub mod decl;
pub mod modifiers;
pub mod reference;
pub mod type_ref;

pub use annotation::{AnnotationApplication, AnnotationArgument, ConstValue};
pub use decl::{
    AccessorDecl, AccessorKind, MemberDecl, MemberDeclKind, OperatorKind, Parameter, RefKind,
    SourceUnit, TypeDecl, TypeKind,
};
pub use modifiers::{Accessibility, Modifiers};
pub use reference::{ExternalType, ReferencedUnit, TypeForwarder};
pub use type_ref::{PrimitiveKind, TypeRef, TypeRefParseError};
