//! Entity and reference identifiers.

use std::fmt;

/// Stable identity of a semantic entity inside one compilation.
///
/// The unit is always [`EntityId::UNIT`]. Aggregates are numbered when the
/// compilation is built; members are numbered when their owner's member table
/// is built. A builder that loses the publish race burns its ids; they are
/// never observable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Sentinel value for invalid `EntityId`.
    pub const INVALID: Self = Self(0);

    /// The compilation unit.
    pub const UNIT: Self = Self(1);

    /// First id handed out to aggregates and members.
    pub const FIRST_ALLOCATED: u32 = 2;

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a referenced unit in the compilation's reference list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceId(pub u32);

impl ReferenceId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
