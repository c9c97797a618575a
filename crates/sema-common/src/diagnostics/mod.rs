//! Diagnostic types and message lookup for the semantic model.
//!
//! Message templates live in `data.rs`. Every diagnostic the engine produces
//! is built from a code in that table with [`format_message`].

use serde::Serialize;
use std::fmt;

use crate::span::Location;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes, diagnostic_messages};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

impl DiagnosticCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Suggestion => "suggestion",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Related information for a diagnostic (e.g., "see also" locations).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A semantic diagnostic with optional related information.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Related information spans (e.g., the first declaration of a duplicate)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Build a diagnostic from the message table.
    ///
    /// The category comes from the table. Unknown codes still produce an
    /// error so that nothing is silently lost.
    #[must_use]
    pub fn from_code(code: u32, location: &Location, args: &[&str]) -> Self {
        let (category, text) = match get_diagnostic_message(code) {
            Some(msg) => (msg.category, format_message(msg.message, args)),
            None => (
                DiagnosticCategory::Error,
                format!("Unknown diagnostic {code}"),
            ),
        };
        Self {
            file: location.file.to_string(),
            start: location.start(),
            length: location.len(),
            message_text: text,
            category,
            code,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }

    /// Add a related location, typically the declaration that conflicts with
    /// the one this diagnostic points at.
    #[must_use]
    pub fn with_related_location(self, location: &Location, message: impl Into<String>) -> Self {
        self.with_related(
            location.file.to_string(),
            location.start(),
            location.len(),
            message.into(),
        )
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Sort key used when presenting diagnostics: file, position, code.
    pub fn sort_key(&self) -> (&str, u32, u32) {
        (self.file.as_str(), self.start, self.code)
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Look up a diagnostic message definition by code.
///
/// Returns the `DiagnosticMessage` with template string containing `{0}`, `{1}`, etc. placeholders.
/// Use `format_message()` to fill in the placeholders.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

/// Get the category for a diagnostic code.
#[must_use]
pub fn get_diagnostic_category(code: u32) -> Option<DiagnosticCategory> {
    get_diagnostic_message(code).map(|m| m.category)
}

// =============================================================================
// Diagnostic Bag
// =============================================================================

/// An ordered, append-only collection of diagnostics produced by one
/// computation.
///
/// Derived artifacts (annotation bags, member tables, layout results) each own
/// a bag. Whoever publishes the artifact first gets its bag reported; a losing
/// builder's bag is dropped with it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Add a table diagnostic at `location` and return it for further
    /// decoration.
    pub fn add(&mut self, code: u32, location: &Location, args: &[&str]) -> &mut Diagnostic {
        self.diagnostics
            .push(Diagnostic::from_code(code, location, args));
        let last = self.diagnostics.len() - 1;
        &mut self.diagnostics[last]
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn append(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Number of diagnostics carrying `code`.
    pub fn count_code(&self, code: u32) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }
}

impl From<Vec<Diagnostic>> for DiagnosticBag {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl<'a> IntoIterator for &'a DiagnosticBag {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[cfg(test)]
#[path = "../../tests/diagnostics_tests.rs"]
mod tests;
