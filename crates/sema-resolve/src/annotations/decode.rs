//! Per-kind decoders.
//!
//! Each well-known kind has one decoder that validates the evaluated
//! arguments and writes into the early or full data. Decoders report
//! malformed arguments into the bag they are given; the early pass hands
//! them a scratch bag and drops it.

use sema_common::DiagnosticBag;
use sema_common::diagnostics::diagnostic_codes;
use sema_model::AnnotationApplication;
use sema_model::type_ref::is_identifier;

use super::args::{ArgValue, EvaluatedArguments};
use super::data::{
    DeclaredGrant, EarlyAnnotationData, FullAnnotationData, InternalsGrant, LayoutData,
    LayoutKind, ObsoleteData, UnitVersion, normalize_public_key,
};
use super::kinds::{AnnotationTargets, AnnotationUsage, WellKnownAnnotation};

pub(crate) struct DecodeInput<'a> {
    pub kind: WellKnownAnnotation,
    pub application: &'a AnnotationApplication,
    pub args: &'a EvaluatedArguments,
}

impl DecodeInput<'_> {
    fn check_count(&self, min: usize, max: usize, diagnostics: &mut DiagnosticBag) -> bool {
        let given = self.args.positional.len();
        if (min..=max).contains(&given) {
            return true;
        }
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        };
        diagnostics.add(
            diagnostic_codes::ANNOTATION_ARGUMENT_COUNT,
            &self.application.location,
            &[self.kind.name(), &expected, &given.to_string()],
        );
        false
    }

    fn type_error(&self, index: usize, expected: &str, diagnostics: &mut DiagnosticBag) {
        diagnostics.add(
            diagnostic_codes::ANNOTATION_ARGUMENT_TYPE,
            &self.application.location,
            &[&(index + 1).to_string(), self.kind.name(), expected],
        );
    }

    /// The string at `index`. `None` when absent, erroneous or reported.
    fn string(&self, index: usize, diagnostics: &mut DiagnosticBag) -> Option<&str> {
        match self.args.positional.get(index)? {
            ArgValue::Str(s) => Some(s),
            ArgValue::Error => None,
            _ => {
                self.type_error(index, "a string", diagnostics);
                None
            }
        }
    }
}

/// Decode an early kind.
pub(crate) fn decode_early(
    input: &DecodeInput<'_>,
    data: &mut EarlyAnnotationData,
    diagnostics: &mut DiagnosticBag,
) {
    let location = &input.application.location;
    match input.kind {
        WellKnownAnnotation::Obsolete => {
            if !input.check_count(0, 2, diagnostics) {
                return;
            }
            let message = match input.args.positional.first() {
                None | Some(ArgValue::Null | ArgValue::Error) => None,
                Some(ArgValue::Str(s)) => Some(s.clone()),
                Some(_) => {
                    input.type_error(0, "a string", diagnostics);
                    None
                }
            };
            let is_error = match input.args.positional.get(1) {
                None | Some(ArgValue::Error) => false,
                Some(ArgValue::Bool(b)) => *b,
                Some(_) => {
                    input.type_error(1, "a bool", diagnostics);
                    false
                }
            };
            data.obsolete = Some(ObsoleteData { message, is_error });
        }
        WellKnownAnnotation::AnnotationUsage => {
            if !input.check_count(1, 1, diagnostics) {
                return;
            }
            let targets = match &input.args.positional[0] {
                ArgValue::Str(s) => AnnotationTargets::parse(s),
                ArgValue::Int(bits) => u16::try_from(*bits)
                    .ok()
                    .and_then(AnnotationTargets::from_bits)
                    .filter(|t| !t.is_empty()),
                ArgValue::Error => return,
                _ => None,
            };
            let Some(targets) = targets else {
                input.type_error(0, "a target list", diagnostics);
                return;
            };
            let allow_multiple = match input.args.named("AllowMultiple") {
                None | Some(ArgValue::Error) => false,
                Some(ArgValue::Bool(b)) => *b,
                Some(_) => {
                    input.type_error(1, "a bool", diagnostics);
                    false
                }
            };
            data.usage = Some(AnnotationUsage {
                targets,
                allow_multiple,
            });
        }
        WellKnownAnnotation::Conditional => {
            if input.check_count(1, 1, diagnostics) {
                if let Some(symbol) = input.string(0, diagnostics) {
                    data.conditional_symbols.push(symbol.to_string());
                }
            }
        }
        WellKnownAnnotation::IndexerName => {
            if !input.check_count(1, 1, diagnostics) {
                return;
            }
            if let Some(name) = input.string(0, diagnostics) {
                if is_identifier(name) {
                    data.indexer_name = Some(name.to_string());
                } else {
                    diagnostics.add(diagnostic_codes::INDEXER_NAME_INVALID, location, &[]);
                }
            }
        }
        WellKnownAnnotation::UnitVersion => {
            if !input.check_count(1, 1, diagnostics) {
                return;
            }
            if let Some(text) = input.string(0, diagnostics) {
                match text.parse::<UnitVersion>() {
                    Ok(version) => data.version = Some(version),
                    Err(()) => {
                        diagnostics.add(diagnostic_codes::INVALID_VERSION, location, &[text]);
                    }
                }
            }
        }
        WellKnownAnnotation::UnitKey => {
            if !input.check_count(1, 1, diagnostics) {
                return;
            }
            if let Some(text) = input.string(0, diagnostics) {
                match normalize_public_key(text) {
                    Some(key) => data.public_key = Some(key),
                    None => {
                        diagnostics.add(diagnostic_codes::INVALID_PUBLIC_KEY, location, &[text]);
                    }
                }
            }
        }
        other => debug_assert!(false, "{other} is not decoded by the early pass"),
    }
}

/// Decode a kind that only the full pass handles, except forwarders which
/// need name lookup and are decoded by the bag builder.
pub(crate) fn decode_full(
    input: &DecodeInput<'_>,
    data: &mut FullAnnotationData,
    unit_signed: bool,
    diagnostics: &mut DiagnosticBag,
) {
    let location = &input.application.location;
    match input.kind {
        WellKnownAnnotation::InternalsVisibleTo => {
            if !input.check_count(1, 1, diagnostics) {
                return;
            }
            let Some(text) = input.string(0, diagnostics) else {
                return;
            };
            match InternalsGrant::parse(text) {
                Ok(grant) => {
                    if unit_signed && grant.public_key.is_none() {
                        diagnostics.add(diagnostic_codes::GRANT_MISSING_KEY, location, &[text]);
                    }
                    data.grants.push(DeclaredGrant {
                        grant,
                        location: location.clone(),
                    });
                }
                Err(reason) => {
                    diagnostics.add(diagnostic_codes::INVALID_GRANT, location, &[text, reason]);
                }
            }
        }
        WellKnownAnnotation::StructLayout => {
            if !input.check_count(1, 1, diagnostics) {
                return;
            }
            let kind = match &input.args.positional[0] {
                ArgValue::Str(s) => LayoutKind::from_name(s),
                ArgValue::Int(v) => LayoutKind::from_value(*v),
                ArgValue::Error => return,
                _ => None,
            };
            let Some(kind) = kind else {
                input.type_error(0, "a layout kind", diagnostics);
                return;
            };
            let pack = match input.args.named("Pack") {
                None | Some(ArgValue::Error) => None,
                Some(ArgValue::Int(v)) => match u8::try_from(*v) {
                    Ok(p) if p <= 128 && (p == 0 || p.is_power_of_two()) => Some(p),
                    _ => {
                        input.type_error(1, "a packing size of 0, 1, 2, 4, 8, 16, 32, 64 or 128", diagnostics);
                        None
                    }
                },
                Some(_) => {
                    input.type_error(1, "an int", diagnostics);
                    None
                }
            };
            data.layout = Some(LayoutData { kind, pack });
        }
        WellKnownAnnotation::DefaultMember => {
            if input.check_count(1, 1, diagnostics) {
                if let Some(name) = input.string(0, diagnostics) {
                    data.default_member = Some((name.to_string(), location.clone()));
                }
            }
        }
        other => debug_assert!(false, "{other} is not decoded by decode_full"),
    }
}
