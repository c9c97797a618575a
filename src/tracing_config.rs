//! Tracing configuration for the `semac` binary.
//!
//! Three output formats, selected by `SEMA_LOG_FORMAT`:
//!
//! - `text` (default): flat `tracing-subscriber` lines
//! - `tree`: indented spans via `tracing-tree`, readable when following one
//!   completion request through its nested lookups
//! - `json`: one JSON object per event
//!
//! ```bash
//! SEMA_LOG=debug semac unit.json
//! SEMA_LOG="sema_resolve::completion=trace" SEMA_LOG_FORMAT=tree semac unit.json
//! SEMA_LOG=debug SEMA_LOG_FORMAT=json semac unit.json
//! ```
//!
//! Nothing is installed unless `SEMA_LOG` or `RUST_LOG` is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Parse a `SEMA_LOG_FORMAT` value; anything unrecognized is `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("SEMA_LOG_FORMAT").unwrap_or_default())
    }
}

/// `SEMA_LOG` wins over `RUST_LOG`; both use the `RUST_LOG` syntax.
fn build_filter() -> EnvFilter {
    match std::env::var("SEMA_LOG") {
        Ok(value) => EnvFilter::builder().parse_lossy(value),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global subscriber, writing to stderr so stdout stays
/// reserved for diagnostics.
pub fn init_tracing() {
    if std::env::var_os("SEMA_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[cfg(test)]
#[path = "tests/tracing_config_tests.rs"]
mod tests;
