//! Decoded annotation data.

use sema_common::Location;
use std::fmt;
use std::str::FromStr;

use super::args::ArgValue;
use super::kinds::{AnnotationUsage, WellKnownAnnotation};
use crate::ids::{EntityId, ReferenceId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObsoleteData {
    pub message: Option<String>,
    pub is_error: bool,
}

/// `major[.minor[.build[.revision]]]`, each component at most 65534.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl FromStr for UnitVersion {
    type Err = ();

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = [0u16; 4];
        let mut count = 0;
        for segment in text.split('.') {
            if count == 4 || segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(());
            }
            parts[count] = match segment.parse::<u16>() {
                Ok(value) if value < u16::MAX => value,
                _ => return Err(()),
            };
            count += 1;
        }
        Ok(Self {
            major: parts[0],
            minor: parts[1],
            build: parts[2],
            revision: parts[3],
        })
    }
}

impl fmt::Display for UnitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Normalize a hex-encoded public key to lowercase; `None` when malformed.
pub fn normalize_public_key(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() % 2 == 0
        && trimmed.bytes().all(|b| b.is_ascii_hexdigit());
    valid.then(|| trimmed.to_ascii_lowercase())
}

/// Data of the annotation kinds decoded by the early pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EarlyAnnotationData {
    pub obsolete: Option<ObsoleteData>,
    pub usage: Option<AnnotationUsage>,
    pub conditional_symbols: Vec<String>,
    pub version: Option<UnitVersion>,
    /// Lowercase hex.
    pub public_key: Option<String>,
    pub indexer_name: Option<String>,
}

impl EarlyAnnotationData {
    /// A copy holding only the data of `kinds`.
    pub fn restricted_to(&self, kinds: &[WellKnownAnnotation]) -> Self {
        let keep = |kind| kinds.contains(&kind);
        Self {
            obsolete: self
                .obsolete
                .clone()
                .filter(|_| keep(WellKnownAnnotation::Obsolete)),
            usage: self.usage.filter(|_| keep(WellKnownAnnotation::AnnotationUsage)),
            conditional_symbols: if keep(WellKnownAnnotation::Conditional) {
                self.conditional_symbols.clone()
            } else {
                Vec::new()
            },
            version: self.version.filter(|_| keep(WellKnownAnnotation::UnitVersion)),
            public_key: self
                .public_key
                .clone()
                .filter(|_| keep(WellKnownAnnotation::UnitKey)),
            indexer_name: self
                .indexer_name
                .clone()
                .filter(|_| keep(WellKnownAnnotation::IndexerName)),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One `InternalsVisibleTo` grant: `"Friend"` or `"Friend, PublicKey=..."`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InternalsGrant {
    pub name: String,
    pub public_key: Option<String>,
}

impl InternalsGrant {
    /// Parse a grant string; `Err` carries the reason it is malformed.
    pub fn parse(text: &str) -> Result<Self, &'static str> {
        let mut parts = text.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err("the unit name is empty");
        }
        if name.contains(['=', ' ']) {
            return Err("the unit name is not a simple name");
        }
        let mut public_key = None;
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err("unrecognized component");
            };
            match key.trim() {
                "PublicKey" => {
                    public_key = Some(
                        normalize_public_key(value).ok_or("the public key is not valid hexadecimal")?,
                    );
                }
                "Version" | "Culture" | "PublicKeyToken" => {
                    return Err("only the unit name and public key may be specified");
                }
                _ => return Err("unrecognized component"),
            }
        }
        Ok(Self {
            name: name.to_string(),
            public_key,
        })
    }
}

/// A grant written on this unit, with where it was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredGrant {
    pub grant: InternalsGrant,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardedType {
    pub name: String,
    pub arity: usize,
    pub target: ReferenceId,
    pub location: Location,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    Sequential,
    Explicit,
    Auto,
}

impl LayoutKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Sequential" => Some(Self::Sequential),
            "Explicit" => Some(Self::Explicit),
            "Auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Sequential),
            2 => Some(Self::Explicit),
            3 => Some(Self::Auto),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutData {
    pub kind: LayoutKind,
    pub pack: Option<u8>,
}

/// The declaration an application of a user annotation binds to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UserAnnotationType {
    Source(EntityId),
    External { unit: ReferenceId, name: String },
}

/// An application of an annotation the engine does not decode itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAnnotation {
    /// Index of the application in the entity's list.
    pub index: usize,
    pub ty: UserAnnotationType,
    pub positional: Vec<ArgValue>,
    pub named: Vec<(String, ArgValue)>,
}

/// Data of the annotation kinds decoded only by the full pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FullAnnotationData {
    pub grants: Vec<DeclaredGrant>,
    pub forwarded_types: Vec<ForwardedType>,
    pub layout: Option<LayoutData>,
    pub default_member: Option<(String, Location)>,
    pub user: Vec<UserAnnotation>,
}
