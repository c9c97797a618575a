use colored::Colorize;
use serde::Serialize;

use sema_common::diagnostics::DiagnosticRelatedInformation;
use sema_common::{Diagnostic, DiagnosticCategory};

/// Renders diagnostics as text lines or as a JSON document.
pub struct Reporter {
    color: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    diagnostics: &'a [Diagnostic],
    errors: usize,
    warnings: usize,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn render_json(&self, diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
        let (errors, warnings) = count(diagnostics);
        serde_json::to_string_pretty(&JsonReport {
            diagnostics,
            errors,
            warnings,
        })
    }

    /// `Found 2 errors and 1 warning.`
    pub fn summary(&self, diagnostics: &[Diagnostic]) -> String {
        let (errors, warnings) = count(diagnostics);
        let text = format!(
            "Found {} and {}.",
            plural(errors, "error"),
            plural(warnings, "warning")
        );
        if !self.color {
            text
        } else if errors > 0 {
            text.red().bold().to_string()
        } else {
            text.green().to_string()
        }
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = self.format_location(&diagnostic.file, diagnostic.start, diagnostic.length);
        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        output.push(' ');
        output.push_str(&self.format_code(diagnostic.code));
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }
        output
    }

    fn format_related(&self, related: &DiagnosticRelatedInformation) -> String {
        let location = self.format_location(&related.file, related.start, related.length);
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };
        format!("{prefix}: {location} - {}", related.message_text)
    }

    fn format_location(&self, file: &str, start: u32, length: u32) -> String {
        let file = if file.is_empty() { "<unknown>" } else { file };
        let text = format!("{file}({start}..{})", start.saturating_add(length));
        if self.color { text.cyan().to_string() } else { text }
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.as_str();
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let text = format!("SM{code}");
        if self.color { text.dimmed().to_string() } else { text }
    }
}

fn count(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.category == DiagnosticCategory::Warning)
        .count();
    (errors, warnings)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
