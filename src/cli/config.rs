use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

use sema_model::SourceUnit;
use sema_resolve::CompilationOptions;

use crate::cli::args::CliArgs;

/// Accepts `true` as well as `"true"` for boolean options.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

/// A unit manifest: the source unit itself plus optional compiler options.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(flatten)]
    pub unit: SourceUnit,
    #[serde(rename = "compilerOptions", default)]
    pub compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub report_unused_fields: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub warnings_as_errors: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub synthesize_members: Option<bool>,
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    parse_manifest(&source).with_context(|| format!("failed to parse manifest {}", path.display()))
}

pub fn parse_manifest(source: &str) -> Result<Manifest> {
    let manifest = serde_json::from_str(source)?;
    Ok(manifest)
}

/// Manifest options, overridden by flags given on the command line.
pub fn resolve_options(manifest: &Manifest, args: &CliArgs) -> CompilationOptions {
    let mut options = CompilationOptions::default();
    if let Some(config) = &manifest.compiler_options {
        if let Some(value) = config.report_unused_fields {
            options.report_unused_fields = value;
        }
        if let Some(value) = config.warnings_as_errors {
            options.warnings_as_errors = value;
        }
        if let Some(value) = config.synthesize_members {
            options.synthesize_members = value;
        }
    }
    if args.report_unused_fields {
        options.report_unused_fields = true;
    }
    if args.warnings_as_errors {
        options.warnings_as_errors = true;
    }
    options
}
