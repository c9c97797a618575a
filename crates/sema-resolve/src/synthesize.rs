//! Members injected into member tables without a declaration.
//!
//! Synthesizers run after conflict checking, in registration order, and see
//! the members already in the table. Each returns plain declarations; the
//! table builder turns them into entities tagged with the synthesizer name.

use sema_common::Location;
use sema_model::{MemberDecl, MemberDeclKind, Modifiers, PrimitiveKind, TypeKind, TypeRef};
use std::sync::Arc;

use crate::base_types::is_integral_ref;
use crate::entity::{MemberEntity, TypeEntity};

/// What a synthesizer may look at.
pub struct SynthesisContext<'a> {
    pub ty: &'a TypeEntity,
    /// Members built so far, including earlier synthesizers' output.
    pub members: &'a [Arc<MemberEntity>],
}

impl SynthesisContext<'_> {
    fn has_member(&self, kind: MemberDeclKind, pred: impl Fn(&MemberDecl) -> bool) -> bool {
        self.members
            .iter()
            .any(|m| m.kind() == kind && pred(m.decl()))
    }

    fn location(&self) -> Location {
        Location::synthesized_at(self.ty.location())
    }
}

pub trait MemberSynthesizer: Send + Sync {
    /// Recorded as the synthesized member's origin.
    fn name(&self) -> &'static str;

    fn synthesize(&self, cx: &SynthesisContext<'_>) -> Vec<MemberDecl>;
}

fn bare_member(kind: MemberDeclKind, name: &str, modifiers: Modifiers, location: Location) -> MemberDecl {
    MemberDecl {
        kind,
        name: name.to_string(),
        modifiers,
        type_params: Vec::new(),
        parameters: Vec::new(),
        ty: None,
        accessors: Vec::new(),
        annotations: Vec::new(),
        constant: None,
        has_body: true,
        has_initializer: false,
        location,
    }
}

/// Parameterless instance constructor of classes without a declared
/// constructor and of every struct.
pub struct ImplicitConstructor;

impl MemberSynthesizer for ImplicitConstructor {
    fn name(&self) -> &'static str {
        "implicit-constructor"
    }

    fn synthesize(&self, cx: &SynthesisContext<'_>) -> Vec<MemberDecl> {
        let ty = cx.ty;
        let needed = match ty.kind() {
            TypeKind::Class => {
                !ty.any_fragment(|f| f.modifiers.contains(Modifiers::STATIC))
                    && !cx.has_member(MemberDeclKind::Constructor, |_| true)
            }
            TypeKind::Struct => {
                !cx.has_member(MemberDeclKind::Constructor, |d| d.parameters.is_empty())
            }
            TypeKind::Interface | TypeKind::Enum => false,
        };
        if !needed {
            return Vec::new();
        }
        let abstract_class = ty.kind() == TypeKind::Class
            && ty.any_fragment(|f| f.modifiers.contains(Modifiers::ABSTRACT));
        let access = if abstract_class {
            Modifiers::PROTECTED
        } else {
            Modifiers::PUBLIC
        };
        vec![bare_member(MemberDeclKind::Constructor, ".ctor", access, cx.location())]
    }
}

/// Static constructor running the initializers of static fields.
pub struct StaticConstructor;

impl MemberSynthesizer for StaticConstructor {
    fn name(&self) -> &'static str {
        "static-constructor"
    }

    fn synthesize(&self, cx: &SynthesisContext<'_>) -> Vec<MemberDecl> {
        let initialized = cx.has_member(MemberDeclKind::Field, |d| {
            d.modifiers.contains(Modifiers::STATIC)
                && !d.modifiers.contains(Modifiers::CONST)
                && d.has_initializer
        });
        if !initialized || cx.has_member(MemberDeclKind::StaticConstructor, |_| true) {
            return Vec::new();
        }
        vec![bare_member(
            MemberDeclKind::StaticConstructor,
            ".cctor",
            Modifiers::PRIVATE | Modifiers::STATIC,
            cx.location(),
        )]
    }
}

/// The `value__` instance field holding an enum's underlying value.
pub struct EnumValueField;

impl EnumValueField {
    pub const FIELD_NAME: &'static str = "value__";
}

impl MemberSynthesizer for EnumValueField {
    fn name(&self) -> &'static str {
        "enum-value-field"
    }

    fn synthesize(&self, cx: &SynthesisContext<'_>) -> Vec<MemberDecl> {
        if cx.ty.kind() != TypeKind::Enum {
            return Vec::new();
        }
        let underlying = cx
            .ty
            .fragments()
            .iter()
            .find_map(|f| match &f.base {
                Some(base @ TypeRef::Primitive(p)) if is_integral_ref(base) => Some(*p),
                _ => None,
            })
            .unwrap_or(PrimitiveKind::Int);
        let mut field = bare_member(
            MemberDeclKind::Field,
            Self::FIELD_NAME,
            Modifiers::PUBLIC,
            cx.location(),
        );
        field.ty = Some(TypeRef::Primitive(underlying));
        field.has_body = false;
        vec![field]
    }
}

/// The synthesizers every compilation starts with.
pub fn default_synthesizers() -> Vec<Arc<dyn MemberSynthesizer>> {
    vec![
        Arc::new(ImplicitConstructor),
        Arc::new(StaticConstructor),
        Arc::new(EnumValueField),
    ]
}

#[cfg(test)]
#[path = "../tests/synthesize_tests.rs"]
mod tests;
