//! Constant field evaluation.
//!
//! Values are memoized on the field's entry in the early member table. A
//! constant that refers back to itself is cut by the reentrancy guard: the
//! frame that detects the repeat returns a [`CycleSignal`] naming itself as
//! the root; every frame it unwinds through adds its own field, and the root
//! publishes [`ConstantOutcome::Cycle`] with the complete member list. Frames
//! between the root and the detection point do not publish, so they see the
//! published cycle on their next evaluation and recognize themselves in it.

use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

use crate::annotations::ArgValue;
use crate::compilation::Compilation;
use crate::context::{GuardKey, ResolutionContext};
use crate::ids::EntityId;
use crate::member_table::EarlyField;
use crate::type_resolution::{NamedType, TypeScope};

/// `(owner, field ordinal in the early table)`
pub type FieldKey = (EntityId, u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstantOutcome {
    Value(ArgValue),
    /// The field is part of a definition cycle with `members` (sorted).
    Cycle { members: Vec<FieldKey> },
    /// The initializer names something that is not a constant field.
    Missing(String),
    /// The initializer depends on a constant that failed.
    DependsOnError,
}

#[derive(Clone, Debug)]
pub struct CycleSignal {
    root: FieldKey,
    members: SmallVec<[FieldKey; 4]>,
}

impl Compilation {
    /// The constant value of `field`, evaluating it if needed.
    pub(crate) fn field_constant(
        &self,
        field: &EarlyField,
        ctx: &mut ResolutionContext,
    ) -> Result<Arc<ConstantOutcome>, CycleSignal> {
        if let Some(outcome) = field.constant.get() {
            return Ok(Arc::clone(outcome));
        }
        let own = field.key();
        let key = GuardKey::ConstantField {
            owner: own.0,
            field: own.1,
        };
        if ctx.enter(key).is_denied() {
            return Err(CycleSignal {
                root: own,
                members: SmallVec::new(),
            });
        }
        let result = self.compute_constant(field, ctx);
        ctx.leave(key);

        match result {
            Ok(outcome) => Ok(field.constant.publish(outcome).value),
            Err(mut signal) => {
                signal.members.push(own);
                if signal.root != own {
                    return Err(signal);
                }
                let mut members = signal.members.into_vec();
                members.sort_unstable();
                members.dedup();
                debug!(field = %field.name, ?members, "constant definition cycle");
                Ok(field.constant.publish(ConstantOutcome::Cycle { members }).value)
            }
        }
    }

    fn compute_constant(
        &self,
        field: &EarlyField,
        ctx: &mut ResolutionContext,
    ) -> Result<ConstantOutcome, CycleSignal> {
        use sema_model::ConstValue;

        let Some(value) = &field.decl.constant else {
            return Ok(ConstantOutcome::DependsOnError);
        };
        Ok(match value {
            ConstValue::Null => ConstantOutcome::Value(ArgValue::Null),
            ConstValue::Bool(b) => ConstantOutcome::Value(ArgValue::Bool(*b)),
            ConstValue::Int(i) => ConstantOutcome::Value(ArgValue::Int(*i)),
            ConstValue::Str(s) => ConstantOutcome::Value(ArgValue::Str(s.clone())),
            ConstValue::Type(ty) => {
                match self.resolve_type_ref(ty, &TypeScope::of(field.owner), ctx) {
                    Ok(resolved) => ConstantOutcome::Value(ArgValue::Type(resolved)),
                    Err(_) => ConstantOutcome::DependsOnError,
                }
            }
            ConstValue::Const(name) => {
                let Some(target) = self.lookup_constant_field(name, Some(field.owner), ctx) else {
                    return Ok(ConstantOutcome::Missing(name.clone()));
                };
                let outcome = self.field_constant(&target, ctx)?;
                match &*outcome {
                    ConstantOutcome::Value(v) => ConstantOutcome::Value(v.clone()),
                    ConstantOutcome::Cycle { members } if members.contains(&field.key()) => {
                        ConstantOutcome::Cycle {
                            members: members.clone(),
                        }
                    }
                    _ => ConstantOutcome::DependsOnError,
                }
            }
        })
    }

    /// Find the constant field `name` (`F` or `T.F`) as seen from `owner`.
    pub(crate) fn lookup_constant_field(
        &self,
        name: &str,
        owner: Option<EntityId>,
        ctx: &mut ResolutionContext,
    ) -> Option<Arc<EarlyField>> {
        let constant = |id: EntityId, field: &str| {
            self.early_member_table(id)
                .and_then(|table| table.field(field).cloned())
                .filter(|f| f.is_const)
        };

        if let Some((type_name, field)) = name.rsplit_once('.') {
            let scope = TypeScope {
                owner,
                method_type_params: &[],
            };
            return match self.lookup_type_name(type_name, 0, &scope, ctx) {
                Ok(NamedType::Source(id)) => constant(id, field),
                _ => None,
            };
        }

        let mut current = owner;
        while let Some(id) = current {
            if let Some(found) = self
                .early_member_table(id)
                .and_then(|table| table.field(name).cloned())
            {
                return found.is_const.then_some(found);
            }
            current = self.type_entity(id).and_then(|t| t.containing());
        }
        None
    }
}
