//! Semantic model front end.
//!
//! Re-exports the engine crates and hosts the `semac` command line driver.

pub use sema_common as common;
pub use sema_model as model;
pub use sema_resolve as resolve;

pub use sema_common::{CancellationToken, Diagnostic, DiagnosticCategory, Location};
pub use sema_model::SourceUnit;
pub use sema_resolve::{Compilation, CompilationBuilder, CompilationOptions, CompletionOutcome};

pub mod tracing_config;

#[cfg(feature = "cli")]
pub mod cli;
