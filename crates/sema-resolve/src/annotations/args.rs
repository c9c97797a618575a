//! Evaluation of annotation arguments.

use sema_common::diagnostics::diagnostic_codes;
use sema_common::{DiagnosticBag, Location};
use sema_model::{AnnotationApplication, ConstValue};

use crate::compilation::Compilation;
use crate::constants::ConstantOutcome;
use crate::context::ResolutionContext;
use crate::type_resolution::{ResolvedType, TypeScope};

/// An evaluated constant.
///
/// `Error` stands for a value whose evaluation already reported (or whose
/// dependency already reported) a diagnostic; decoders accept it silently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Type(ResolvedType),
    Error,
}

impl ArgValue {
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

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Evaluated arguments of one application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvaluatedArguments {
    pub positional: Vec<ArgValue>,
    pub named: Vec<(String, ArgValue)>,
}

impl EvaluatedArguments {
    pub fn named(&self, name: &str) -> Option<&ArgValue> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl Compilation {
    pub(crate) fn evaluate_arguments(
        &self,
        application: &AnnotationApplication,
        scope: &TypeScope<'_>,
        ctx: &mut ResolutionContext,
        diagnostics: &mut DiagnosticBag,
    ) -> EvaluatedArguments {
        let mut evaluated = EvaluatedArguments::default();
        for argument in &application.arguments {
            let value =
                self.evaluate_const(&argument.value, scope, &application.location, ctx, diagnostics);
            match &argument.name {
                Some(name) => evaluated.named.push((name.clone(), value)),
                None => evaluated.positional.push(value),
            }
        }
        evaluated
    }

    /// Evaluate a written constant. References to constant fields go
    /// through the early member table of the aggregate that declares them.
    pub(crate) fn evaluate_const(
        &self,
        value: &ConstValue,
        scope: &TypeScope<'_>,
        location: &Location,
        ctx: &mut ResolutionContext,
        diagnostics: &mut DiagnosticBag,
    ) -> ArgValue {
        match value {
            ConstValue::Null => ArgValue::Null,
            ConstValue::Bool(b) => ArgValue::Bool(*b),
            ConstValue::Int(i) => ArgValue::Int(*i),
            ConstValue::Str(s) => ArgValue::Str(s.clone()),
            ConstValue::Type(ty) => match self.resolve_type_ref(ty, scope, ctx) {
                Ok(resolved) => ArgValue::Type(resolved),
                Err(err) => {
                    err.report(diagnostics, location);
                    ArgValue::Error
                }
            },
            ConstValue::Const(name) => {
                let Some(field) = self.lookup_constant_field(name, scope.owner, ctx) else {
                    diagnostics.add(diagnostic_codes::CONSTANT_NOT_FOUND, location, &[name]);
                    return ArgValue::Error;
                };
                match self.field_constant(&field, ctx) {
                    Ok(outcome) => match &*outcome {
                        ConstantOutcome::Value(v) => v.clone(),
                        _ => ArgValue::Error,
                    },
                    Err(_) => ArgValue::Error,
                }
            }
        }
    }
}
