//! Declaration modifiers and accessibility.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Modifiers written on a type, member or accessor declaration.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        const PUBLIC    = 1 << 0;
        const PRIVATE   = 1 << 1;
        const PROTECTED = 1 << 2;
        const INTERNAL  = 1 << 3;
        const STATIC    = 1 << 4;
        const PARTIAL   = 1 << 5;
        const SEALED    = 1 << 6;
        const ABSTRACT  = 1 << 7;
        const READONLY  = 1 << 8;
        const CONST     = 1 << 9;
        const VIRTUAL   = 1 << 10;
        const OVERRIDE  = 1 << 11;
        const EXTERN    = 1 << 12;

        const ACCESSIBILITY = Self::PUBLIC.bits()
            | Self::PRIVATE.bits()
            | Self::PROTECTED.bits()
            | Self::INTERNAL.bits();
    }
}

const KEYWORDS: [(&str, Modifiers); 13] = [
    ("public", Modifiers::PUBLIC),
    ("private", Modifiers::PRIVATE),
    ("protected", Modifiers::PROTECTED),
    ("internal", Modifiers::INTERNAL),
    ("static", Modifiers::STATIC),
    ("partial", Modifiers::PARTIAL),
    ("sealed", Modifiers::SEALED),
    ("abstract", Modifiers::ABSTRACT),
    ("readonly", Modifiers::READONLY),
    ("const", Modifiers::CONST),
    ("virtual", Modifiers::VIRTUAL),
    ("override", Modifiers::OVERRIDE),
    ("extern", Modifiers::EXTERN),
];

impl Modifiers {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == keyword)
            .map(|(_, m)| *m)
    }

    #[inline]
    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC) || self.contains(Self::CONST)
    }

    #[inline]
    pub const fn is_partial(self) -> bool {
        self.contains(Self::PARTIAL)
    }

    /// Accessibility written on the declaration, if any.
    pub fn declared_accessibility(self) -> Option<Accessibility> {
        let access = self.intersection(Self::ACCESSIBILITY);
        if access.is_empty() {
            return None;
        }
        Some(if access == Self::PUBLIC {
            Accessibility::Public
        } else if access == Self::PROTECTED | Self::INTERNAL {
            Accessibility::ProtectedInternal
        } else if access == Self::PRIVATE | Self::PROTECTED {
            Accessibility::PrivateProtected
        } else if access.contains(Self::PROTECTED) {
            Accessibility::Protected
        } else if access.contains(Self::INTERNAL) {
            Accessibility::Internal
        } else {
            Accessibility::Private
        })
    }

    pub fn keywords(self) -> impl Iterator<Item = &'static str> {
        KEYWORDS
            .iter()
            .filter(move |(_, m)| self.contains(*m))
            .map(|(kw, _)| *kw)
    }
}

impl Serialize for Modifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.keywords())
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let words = Vec::<String>::deserialize(deserializer)?;
        let mut modifiers = Modifiers::empty();
        for word in &words {
            match Modifiers::from_keyword(word) {
                Some(m) => modifiers |= m,
                None => {
                    return Err(serde::de::Error::custom(format!(
                        "unknown modifier '{word}'"
                    )));
                }
            }
        }
        Ok(modifiers)
    }
}

/// Effective accessibility of a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Accessibility {
    Private,
    PrivateProtected,
    Protected,
    Internal,
    ProtectedInternal,
    Public,
}

impl Accessibility {
    /// Visible outside the declaring unit without a grant.
    pub const fn is_externally_visible(self) -> bool {
        matches!(self, Self::Public | Self::Protected | Self::ProtectedInternal)
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Private => "private",
            Self::PrivateProtected => "private protected",
            Self::Protected => "protected",
            Self::Internal => "internal",
            Self::ProtectedInternal => "protected internal",
            Self::Public => "public",
        })
    }
}
