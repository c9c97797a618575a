use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, info_span};

use sema_common::{CancellationToken, Diagnostic, Location};
use sema_resolve::{Compilation, CompilationBuilder, CompletionOutcome, CompletionScope, EntityId};

use crate::cli::args::CliArgs;
use crate::cli::config::{Manifest, load_manifest, resolve_options};

/// What one `semac` run produced.
#[derive(Debug)]
pub struct CompilationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: CompletionOutcome,
    pub completed_types: usize,
}

impl CompilationResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

pub fn compile(args: &CliArgs) -> Result<CompilationResult> {
    let manifest = load_manifest(&args.manifest)?;
    compile_manifest(manifest, args, &CancellationToken::none())
}

/// Complete every top-level type in parallel, then the unit itself.
pub fn compile_manifest(
    manifest: Manifest,
    args: &CliArgs,
    cancel: &CancellationToken,
) -> Result<CompilationResult> {
    let options = resolve_options(&manifest, args);
    let compilation = CompilationBuilder::new(manifest.unit).options(options).build();
    let _span = info_span!("compile", unit = compilation.unit().name()).entered();

    let scope = match &args.file {
        Some(file) => CompletionScope::at(Location::new(file.as_str(), 0, u32::MAX)),
        None => CompletionScope::all(),
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = args.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().context("failed to build the worker pool")?;

    let types = compilation.top_level_types();
    info!(types = types.len(), threads = pool.current_num_threads(), "completing types");
    let outcomes = pool
        .install(|| {
            types
                .par_iter()
                .map(|&id| complete_one(&compilation, id, &scope, cancel))
                .collect::<Result<Vec<_>>>()
        })?;
    let completed_types = outcomes
        .iter()
        .filter(|outcome| **outcome == CompletionOutcome::Complete)
        .count();

    let outcome = complete_one(&compilation, EntityId::UNIT, &scope, cancel)?;
    debug!(?outcome, completed_types, "unit completion finished");

    let mut diagnostics = compilation.diagnostics();
    if let Some(file) = &args.file {
        diagnostics.retain(|d| &d.file == file);
    }
    Ok(CompilationResult {
        diagnostics,
        outcome,
        completed_types,
    })
}

fn complete_one(
    compilation: &Compilation,
    id: EntityId,
    scope: &CompletionScope,
    cancel: &CancellationToken,
) -> Result<CompletionOutcome> {
    compilation
        .force_complete(id, scope, cancel)
        .with_context(|| format!("completion of {id} was cancelled"))
}
