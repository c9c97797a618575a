//! The closed set of annotation kinds the engine decodes itself.

use bitflags::bitflags;
use sema_model::AnnotationApplication;
use std::fmt;

bitflags! {
    /// Declarations an annotation may be applied to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AnnotationTargets: u16 {
        const UNIT        = 1 << 0;
        const CLASS       = 1 << 1;
        const STRUCT      = 1 << 2;
        const INTERFACE   = 1 << 3;
        const ENUM        = 1 << 4;
        const FIELD       = 1 << 5;
        const METHOD      = 1 << 6;
        const CONSTRUCTOR = 1 << 7;
        const PROPERTY    = 1 << 8;
        const INDEXER     = 1 << 9;
        const EVENT       = 1 << 10;

        const TYPES = Self::CLASS.bits()
            | Self::STRUCT.bits()
            | Self::INTERFACE.bits()
            | Self::ENUM.bits();
        const MEMBERS = Self::FIELD.bits()
            | Self::METHOD.bits()
            | Self::CONSTRUCTOR.bits()
            | Self::PROPERTY.bits()
            | Self::INDEXER.bits()
            | Self::EVENT.bits();
    }
}

const TARGET_NAMES: [(&str, AnnotationTargets); 11] = [
    ("Unit", AnnotationTargets::UNIT),
    ("Class", AnnotationTargets::CLASS),
    ("Struct", AnnotationTargets::STRUCT),
    ("Interface", AnnotationTargets::INTERFACE),
    ("Enum", AnnotationTargets::ENUM),
    ("Field", AnnotationTargets::FIELD),
    ("Method", AnnotationTargets::METHOD),
    ("Constructor", AnnotationTargets::CONSTRUCTOR),
    ("Property", AnnotationTargets::PROPERTY),
    ("Indexer", AnnotationTargets::INDEXER),
    ("Event", AnnotationTargets::EVENT),
];

impl AnnotationTargets {
    /// Parse `"Class|Struct"`; `"All"` selects every target.
    pub fn parse(text: &str) -> Option<Self> {
        let mut targets = Self::empty();
        for part in text.split('|').map(str::trim) {
            if part == "All" {
                targets |= Self::all();
                continue;
            }
            let (_, flag) = TARGET_NAMES.iter().find(|(name, _)| *name == part)?;
            targets |= *flag;
        }
        (!targets.is_empty()).then_some(targets)
    }

    pub fn names(self) -> impl Iterator<Item = &'static str> {
        TARGET_NAMES
            .into_iter()
            .filter(move |(_, flag)| self.contains(*flag))
            .map(|(name, _)| name)
    }
}

impl fmt::Display for AnnotationTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Where an annotation kind may appear and how often.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotationUsage {
    pub targets: AnnotationTargets,
    pub allow_multiple: bool,
}

impl AnnotationUsage {
    pub const fn single(targets: AnnotationTargets) -> Self {
        Self {
            targets,
            allow_multiple: false,
        }
    }

    pub const fn multiple(targets: AnnotationTargets) -> Self {
        Self {
            targets,
            allow_multiple: true,
        }
    }
}

impl Default for AnnotationUsage {
    fn default() -> Self {
        Self::single(AnnotationTargets::all())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WellKnownAnnotation {
    Obsolete,
    AnnotationUsage,
    Conditional,
    IndexerName,
    UnitVersion,
    UnitKey,
    InternalsVisibleTo,
    TypeForwardedTo,
    StructLayout,
    DefaultMember,
}

impl WellKnownAnnotation {
    pub const ALL: [WellKnownAnnotation; 10] = [
        Self::Obsolete,
        Self::AnnotationUsage,
        Self::Conditional,
        Self::IndexerName,
        Self::UnitVersion,
        Self::UnitKey,
        Self::InternalsVisibleTo,
        Self::TypeForwardedTo,
        Self::StructLayout,
        Self::DefaultMember,
    ];

    /// Kinds decoded by the early pass.
    pub const EARLY: [WellKnownAnnotation; 6] = [
        Self::Obsolete,
        Self::AnnotationUsage,
        Self::Conditional,
        Self::IndexerName,
        Self::UnitVersion,
        Self::UnitKey,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Obsolete => "Obsolete",
            Self::AnnotationUsage => "AnnotationUsage",
            Self::Conditional => "Conditional",
            Self::IndexerName => "IndexerName",
            Self::UnitVersion => "UnitVersion",
            Self::UnitKey => "UnitKey",
            Self::InternalsVisibleTo => "InternalsVisibleTo",
            Self::TypeForwardedTo => "TypeForwardedTo",
            Self::StructLayout => "StructLayout",
            Self::DefaultMember => "DefaultMember",
        }
    }

    pub const fn is_early(self) -> bool {
        matches!(
            self,
            Self::Obsolete
                | Self::AnnotationUsage
                | Self::Conditional
                | Self::IndexerName
                | Self::UnitVersion
                | Self::UnitKey
        )
    }

    pub const fn usage(self) -> AnnotationUsage {
        use AnnotationTargets as T;
        match self {
            Self::Obsolete => AnnotationUsage::single(
                T::TYPES
                    .union(T::FIELD)
                    .union(T::METHOD)
                    .union(T::CONSTRUCTOR)
                    .union(T::PROPERTY)
                    .union(T::INDEXER)
                    .union(T::EVENT),
            ),
            Self::AnnotationUsage => AnnotationUsage::single(T::CLASS),
            Self::Conditional => AnnotationUsage::multiple(T::METHOD.union(T::CLASS)),
            Self::IndexerName => AnnotationUsage::single(T::INDEXER),
            Self::UnitVersion | Self::UnitKey => AnnotationUsage::single(T::UNIT),
            Self::InternalsVisibleTo | Self::TypeForwardedTo => AnnotationUsage::multiple(T::UNIT),
            Self::StructLayout => AnnotationUsage::single(T::CLASS.union(T::STRUCT)),
            Self::DefaultMember => {
                AnnotationUsage::single(T::CLASS.union(T::STRUCT).union(T::INTERFACE))
            }
        }
    }

    /// Whether the written name can denote this kind, without binding it:
    /// `Name`, `NameAttribute`, optionally qualified.
    pub fn matches_syntax(self, application: &AnnotationApplication) -> bool {
        let simple = application.simple_name();
        let simple = simple.strip_suffix("Attribute").unwrap_or(simple);
        simple == self.name()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let simple = name.rsplit('.').next().unwrap_or(name);
        let simple = simple.strip_suffix("Attribute").unwrap_or(simple);
        Self::ALL.into_iter().find(|k| k.name() == simple)
    }
}

impl fmt::Display for WellKnownAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
