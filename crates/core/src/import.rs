// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Transaction control for a whole import run.
//!
//! Every run executes inside one [`Catalogue::atomically`] scope. The scope
//! commits only when the pipeline finished without a fatal error *and* the
//! caller asked for a commit; in every other case it rolls back, so a fatal
//! error never leaves partial writes and a dry run reports counts without
//! changing anything. A cancelled run rolls back as well, and is reported to
//! the caller as `ImportError::Cancelled`.

use branch_import_domain::{AreaType, Generation, ImportResult};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{ImportError, StoreError};
use crate::ingest::{IngestedFile, ingest};
use crate::options::{GenerationChoice, ImportOptions, ImportSource};
use crate::parents::{ResolvedParents, resolve_parents};
use crate::progress::Progress;
use crate::store::{Catalogue, GenerationStore, ProgressSink};
use crate::upsert::{GroupOutcome, TargetState, upsert_group};

/// The generation a run will stamp, once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GenerationTarget {
    Resolved(Generation),
    Create(String),
}

/// Why the atomic scope was left through its error path.
enum Abort {
    /// Roll back and hand this result to the caller.
    Rollback(ImportResult),
    Cancelled,
    Store(StoreError),
}

impl From<StoreError> for Abort {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Imports a branch/region CSV into the catalogue.
///
/// # Arguments
///
/// * `catalogue` - The area and generation store to reconcile against
/// * `source` - The CSV to read
/// * `options` - Commit, purge, generation and progress settings
/// * `progress` - Optional out-of-band progress sink
///
/// # Returns
///
/// The counts and warnings of the run. Fatal row-level problems are
/// reported through `ImportResult::error` after a full rollback.
///
/// # Errors
///
/// Returns `ImportError::Generation` before any row is read if the
/// requested generation cannot be resolved, `ImportError::Cancelled` if
/// `options.cancellation` fired before the commit, and `ImportError::Store`
/// if the transaction itself cannot be opened or finished.
pub fn import_branches<C: Catalogue>(
    catalogue: &mut C,
    source: &ImportSource,
    options: &ImportOptions,
    progress: Option<&mut dyn ProgressSink>,
) -> Result<ImportResult, ImportError> {
    let mut progress: Progress<'_> = Progress::new(progress, options.task_id.as_deref());
    let target: GenerationTarget = resolve_generation(catalogue, &options.generation)?;

    info!(
        commit = options.commit,
        purge = options.purge,
        "Starting branch import"
    );

    let outcome: Result<ImportResult, Abort> = catalogue.atomically(|store| {
        match run_pipeline(store, source, options, &target, &mut progress) {
            Ok(_) if options.cancellation.is_cancelled() => Err(Abort::Cancelled),
            Ok(result) if options.commit => Ok(result),
            Ok(result) => Err(Abort::Rollback(result)),
            Err(ImportError::Cancelled) => Err(Abort::Cancelled),
            Err(ImportError::Store(err)) => Err(Abort::Store(err)),
            Err(err) => Err(Abort::Rollback(ImportResult {
                error: Some(err.to_string()),
                ..ImportResult::default()
            })),
        }
    });

    let result: ImportResult = match outcome {
        Ok(result) => {
            progress.report("Import complete, changes committed");
            result
        }
        Err(Abort::Rollback(result)) => {
            if let Some(error) = &result.error {
                warn!(error = %error, "Branch import failed, rolled back");
                progress.report(&format!("Import failed: {error}"));
            } else {
                progress.report("Dry run complete, changes rolled back");
            }
            result
        }
        Err(Abort::Cancelled) => {
            warn!("Branch import cancelled, rolled back");
            progress.report("Import cancelled, changes rolled back");
            return Err(ImportError::Cancelled);
        }
        Err(Abort::Store(err)) => {
            warn!(error = %err, "Branch import aborted by a store failure");
            progress.report(&format!("Import failed: {err}"));
            return Err(err.into());
        }
    };

    info!(
        created = result.created,
        updated = result.updated,
        warnings = result.warnings.len(),
        committed = options.commit && result.error.is_none(),
        "Finished branch import"
    );
    Ok(result)
}

fn resolve_generation<G: GenerationStore + ?Sized>(
    store: &mut G,
    choice: &GenerationChoice,
) -> Result<GenerationTarget, ImportError> {
    match choice {
        GenerationChoice::Current => store
            .current_generation()?
            .map(GenerationTarget::Resolved)
            .ok_or_else(|| ImportError::Generation(String::from("No current generation found"))),
        GenerationChoice::Existing(generation_id) => store
            .get_generation(*generation_id)?
            .map(GenerationTarget::Resolved)
            .ok_or_else(|| {
                ImportError::Generation(String::from("Invalid generation number specified"))
            }),
        GenerationChoice::New { description } => {
            if description.trim().is_empty() {
                return Err(ImportError::Generation(String::from(
                    "A description is required to create a new generation",
                )));
            }
            Ok(GenerationTarget::Create(description.clone()))
        }
    }
}

/// Runs ingestion, parent resolution and the per-group upserts.
///
/// Each phase hands back its own results, which are folded into the
/// returned `ImportResult`.
fn run_pipeline<C: Catalogue>(
    store: &mut C,
    source: &ImportSource,
    options: &ImportOptions,
    target: &GenerationTarget,
    progress: &mut Progress<'_>,
) -> Result<ImportResult, ImportError> {
    let generation: Generation = match target {
        GenerationTarget::Resolved(generation) => generation.clone(),
        GenerationTarget::Create(description) => {
            let generation: Generation = store.create_generation(description)?;
            info!(generation_id = generation.id(), "Created generation");
            generation
        }
    };

    if options.purge {
        let purged: usize = store.delete_areas_of_types(&AreaType::managed())?;
        info!(purged, "Purged managed areas");
    }

    progress.report("Parsing/validating CSV file");
    let text: String = source.read_text()?;
    let ingested: IngestedFile = ingest(store, &text)?;
    options.cancellation.check()?;

    progress.report("Loading parent areas");
    let declared_regions: HashSet<&str> = ingested
        .groups
        .iter()
        .filter(|group| group.area_type.is_region())
        .map(|group| group.area_gss.as_str())
        .collect();
    let mut parents: ResolvedParents =
        resolve_parents(store, &ingested.parent_codes, &declared_regions)?;

    let mut result: ImportResult = ImportResult::default();
    result.warnings.extend(ingested.warnings.iter().cloned());
    result.warnings.append(&mut parents.warnings);

    let total: usize = ingested.groups.len();
    for (index, group) in ingested.processing_order().enumerate() {
        options.cancellation.check()?;
        progress.report(&format!("Working on area {} of {total}", index + 1));

        let target: TargetState<'_> = TargetState::from_lookup(ingested.existing.get(&group.area_gss));
        let parent = if group.area_type.is_region() {
            None
        } else {
            parents.get(&group.parent_gss_code)
        };

        let outcome: GroupOutcome = upsert_group(
            store,
            group,
            target,
            parent,
            &generation,
            options.small_area_threshold,
        )?;

        if group.area_type.is_region() {
            parents.refresh(&group.area_gss, outcome.stored.clone());
        }
        result.created += outcome.created;
        result.updated += outcome.updated;
        result.warnings.extend(outcome.warnings);
    }

    Ok(result)
}
