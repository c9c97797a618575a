//! Resolution of syntactic type references.
//!
//! Lookup order for a name: method type parameters, type parameters of the
//! containing type chain, nested types of that chain, source types by full
//! name, source types by simple name, then referenced units (following their
//! forwarders under the reentrancy guard).

use sema_common::diagnostics::diagnostic_codes;
use sema_common::{DiagnosticBag, Location};
use sema_model::{ExternalType, PrimitiveKind, TypeKind, TypeRef};
use std::fmt::Write as _;
use tracing::trace;

use crate::compilation::Compilation;
use crate::context::{GuardKey, ResolutionContext};
use crate::ids::{EntityId, ReferenceId};

/// A resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    Primitive(PrimitiveKind),
    Source {
        id: EntityId,
        args: Vec<ResolvedType>,
    },
    External {
        unit: ReferenceId,
        name: String,
        kind: TypeKind,
        args: Vec<ResolvedType>,
    },
    /// A type parameter of an aggregate, by ordinal.
    TypeParameter {
        owner: EntityId,
        ordinal: u32,
    },
    /// A type parameter of a generic method, by ordinal.
    MethodTypeParameter(u32),
    Array(Box<ResolvedType>),
    Error,
}

impl ResolvedType {
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Replace type parameters of `owner` with `args`.
    pub fn substitute(&self, owner: EntityId, args: &[ResolvedType]) -> ResolvedType {
        match self {
            Self::TypeParameter { owner: o, ordinal } if *o == owner => args
                .get(*ordinal as usize)
                .cloned()
                .unwrap_or(Self::Error),
            Self::Source { id, args: inner } => Self::Source {
                id: *id,
                args: inner.iter().map(|a| a.substitute(owner, args)).collect(),
            },
            Self::External {
                unit,
                name,
                kind,
                args: inner,
            } => Self::External {
                unit: *unit,
                name: name.clone(),
                kind: *kind,
                args: inner.iter().map(|a| a.substitute(owner, args)).collect(),
            },
            Self::Array(elem) => Self::Array(Box::new(elem.substitute(owner, args))),
            other => other.clone(),
        }
    }
}

/// The declaration a name refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamedType {
    Source(EntityId),
    External { unit: ReferenceId, ty: ExternalType },
    TypeParameter { owner: EntityId, ordinal: u32 },
    MethodTypeParameter(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeLookupError {
    NotFound { name: String },
    ArityMismatch { name: String, expected: usize },
    Inaccessible { name: String },
    ForwarderCycle { name: String, unit: String },
}

impl TypeLookupError {
    pub(crate) fn report(&self, diagnostics: &mut DiagnosticBag, location: &Location) {
        match self {
            Self::NotFound { name } => {
                diagnostics.add(diagnostic_codes::TYPE_NOT_FOUND, location, &[name]);
            }
            Self::ArityMismatch { name, expected } => {
                let expected = expected.to_string();
                diagnostics.add(
                    diagnostic_codes::GENERIC_ARITY_MISMATCH,
                    location,
                    &[name, &expected],
                );
            }
            Self::Inaccessible { name } => {
                diagnostics.add(diagnostic_codes::TYPE_NOT_ACCESSIBLE, location, &[name]);
            }
            Self::ForwarderCycle { name, unit } => {
                diagnostics.add(diagnostic_codes::FORWARDER_CYCLE, location, &[name, unit]);
            }
        }
    }
}

/// Where a type reference is written.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeScope<'a> {
    /// The innermost aggregate containing the reference.
    pub owner: Option<EntityId>,
    pub method_type_params: &'a [String],
}

impl<'a> TypeScope<'a> {
    pub const fn unit() -> Self {
        Self {
            owner: None,
            method_type_params: &[],
        }
    }

    pub const fn of(owner: EntityId) -> Self {
        Self {
            owner: Some(owner),
            method_type_params: &[],
        }
    }

    pub const fn with_method_type_params(mut self, params: &'a [String]) -> Self {
        self.method_type_params = params;
        self
    }
}

impl Compilation {
    /// Resolve `ty` as written in `scope`.
    pub fn resolve_type_ref(
        &self,
        ty: &TypeRef,
        scope: &TypeScope<'_>,
        ctx: &mut ResolutionContext,
    ) -> Result<ResolvedType, TypeLookupError> {
        match ty {
            TypeRef::Primitive(p) => Ok(ResolvedType::Primitive(*p)),
            TypeRef::Array(elem) => Ok(ResolvedType::Array(Box::new(
                self.resolve_type_ref(elem, scope, ctx)?,
            ))),
            TypeRef::Named { name, args } => {
                let resolved_args = args
                    .iter()
                    .map(|a| self.resolve_type_ref(a, scope, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match self.lookup_type_name(name, args.len(), scope, ctx)? {
                    NamedType::Source(id) => ResolvedType::Source {
                        id,
                        args: resolved_args,
                    },
                    NamedType::External { unit, ty } => ResolvedType::External {
                        unit,
                        name: ty.name,
                        kind: ty.kind,
                        args: resolved_args,
                    },
                    NamedType::TypeParameter { owner, ordinal } => {
                        ResolvedType::TypeParameter { owner, ordinal }
                    }
                    NamedType::MethodTypeParameter(ordinal) => {
                        ResolvedType::MethodTypeParameter(ordinal)
                    }
                })
            }
        }
    }

    /// Resolve a possibly qualified type name with `arity` type arguments.
    pub fn lookup_type_name(
        &self,
        name: &str,
        arity: usize,
        scope: &TypeScope<'_>,
        ctx: &mut ResolutionContext,
    ) -> Result<NamedType, TypeLookupError> {
        let simple = !name.contains('.');
        if simple && arity == 0 {
            if let Some(ordinal) = scope.method_type_params.iter().position(|p| p == name) {
                return Ok(NamedType::MethodTypeParameter(ordinal as u32));
            }
            let mut current = scope.owner;
            while let Some(id) = current {
                let Some(ty) = self.type_entity(id) else { break };
                if let Some(ordinal) = ty.type_params().iter().position(|p| p == name) {
                    return Ok(NamedType::TypeParameter {
                        owner: id,
                        ordinal: ordinal as u32,
                    });
                }
                current = ty.containing();
            }
        }

        if let Some(id) = self.lookup_source_type(name, arity, scope) {
            return Ok(NamedType::Source(id));
        }
        if let Some((unit, ty)) = self.lookup_external_type(name, arity, ctx)? {
            return Ok(NamedType::External { unit, ty });
        }

        let simple_name = name.rsplit('.').next().unwrap_or(name);
        match self.arities.get(simple_name) {
            Some(arities) if !arities.contains(&arity) => Err(TypeLookupError::ArityMismatch {
                name: name.to_string(),
                expected: arities[0],
            }),
            _ => Err(TypeLookupError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    pub(crate) fn lookup_source_type(&self, name: &str, arity: usize, scope: &TypeScope<'_>) -> Option<EntityId> {
        let key = |full: String| (full, arity);

        // Nested types of the containing chain, then the outermost namespace.
        let mut current = scope.owner;
        let mut namespace = None;
        while let Some(id) = current {
            let ty = self.type_entity(id)?;
            if let Some(&found) = self
                .by_full_name
                .get(&key(format!("{}.{name}", ty.full_name())))
            {
                return Some(found);
            }
            if ty.containing().is_none() {
                namespace = ty.namespace().map(str::to_string);
            }
            current = ty.containing();
        }
        if let Some(ns) = namespace {
            if let Some(&found) = self.by_full_name.get(&key(format!("{ns}.{name}"))) {
                return Some(found);
            }
        }

        if let Some(&found) = self.by_full_name.get(&key(name.to_string())) {
            return Some(found);
        }
        if !name.contains('.') {
            if let Some(candidates) = self.by_simple_name.get(&key(name.to_string())) {
                return candidates.first().copied();
            }
        }
        None
    }

    /// Find `name` in the referenced units, following forwarders.
    pub(crate) fn lookup_external_type(
        &self,
        name: &str,
        arity: usize,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<(ReferenceId, ExternalType)>, TypeLookupError> {
        for index in 0..self.references.len() {
            if let Some(found) = self.lookup_in_reference(index, name, arity, ctx)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn lookup_in_reference(
        &self,
        index: usize,
        name: &str,
        arity: usize,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<(ReferenceId, ExternalType)>, TypeLookupError> {
        let reference = &self.references[index];

        if let Some(forwarder_index) = reference.forwarders.iter().position(|f| f.name == name) {
            let forwarder = &reference.forwarders[forwarder_index];
            let Some(target) = self
                .references
                .iter()
                .position(|r| r.name == forwarder.target)
            else {
                trace!(name, target = %forwarder.target, "forwarder target unit is not referenced");
                return Ok(None);
            };
            let key = GuardKey::ForwarderSite {
                unit: index as u32,
                forwarder: forwarder_index as u32,
            };
            return match ctx.guarded(key, |ctx| self.lookup_in_reference(target, name, arity, ctx)) {
                Ok(result) => result,
                Err(_) => Err(TypeLookupError::ForwarderCycle {
                    name: name.to_string(),
                    unit: reference.name.clone(),
                }),
            };
        }

        let found = reference.find_type(name, arity).or_else(|| {
            if name.contains('.') {
                return None;
            }
            reference.types.iter().find(|t| {
                t.arity == arity && t.name.rsplit('.').next() == Some(name)
            })
        });
        let Some(ty) = found else {
            return Ok(None);
        };
        let unit = ReferenceId(index as u32);
        if !ty.public && !self.check_access(unit, ctx) {
            return Err(TypeLookupError::Inaccessible {
                name: ty.name.clone(),
            });
        }
        Ok(Some((unit, ty.clone())))
    }

    /// Kind of the declaration behind `ty`.
    pub fn type_kind(&self, ty: &ResolvedType) -> Option<TypeKind> {
        match ty {
            ResolvedType::Source { id, .. } => self.type_entity(*id).map(|t| t.kind()),
            ResolvedType::External { kind, .. } => Some(*kind),
            ResolvedType::Array(_) => Some(TypeKind::Class),
            _ => None,
        }
    }

    /// Human-readable spelling of a resolved type.
    pub fn display_type(&self, ty: &ResolvedType) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    fn write_type(&self, out: &mut String, ty: &ResolvedType) {
        match ty {
            ResolvedType::Primitive(p) => out.push_str(p.keyword()),
            ResolvedType::Source { id, args } => {
                match self.type_entity(*id) {
                    Some(t) => out.push_str(t.full_name()),
                    None => out.push('?'),
                }
                self.write_args(out, args);
            }
            ResolvedType::External { name, args, .. } => {
                out.push_str(name);
                self.write_args(out, args);
            }
            ResolvedType::TypeParameter { owner, ordinal } => {
                match self
                    .type_entity(*owner)
                    .and_then(|t| t.type_params().get(*ordinal as usize).cloned())
                {
                    Some(name) => out.push_str(&name),
                    None => {
                        let _ = write!(out, "!{ordinal}");
                    }
                }
            }
            ResolvedType::MethodTypeParameter(ordinal) => {
                let _ = write!(out, "!!{ordinal}");
            }
            ResolvedType::Array(elem) => {
                self.write_type(out, elem);
                out.push_str("[]");
            }
            ResolvedType::Error => out.push('?'),
        }
    }

    fn write_args(&self, out: &mut String, args: &[ResolvedType]) {
        if args.is_empty() {
            return;
        }
        out.push('<');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, arg);
        }
        out.push('>');
    }
}
