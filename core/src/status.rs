//! Apply-state inference from dry-run probes.
//!
//! Status is never persisted; it is rediscovered on every query by probing
//! the live tree. The subtlety is that the oracle's verdict for a patch
//! depends on which other patches have already mutated the tree: a
//! prerequisite that is already applied must be left out of a dependent's
//! probe blob, otherwise the oracle reports a false conflict.

use indexmap::IndexMap;
use patchup_protocol::AggregatedPatch;
use patchup_protocol::PatchId;
use patchup_protocol::StatusLabel;

use crate::catalog::PatchCatalog;
use crate::content::ContentProvider;
use crate::content::aggregated_content;
use crate::content::push_content;
use crate::error::PatchError;
use crate::error::Result;
use crate::oracle::ApplyOracle;

/// Labels every catalog entry Applied / NotApplied / Undetermined.
pub struct StatusResolver<'a> {
    catalog: &'a PatchCatalog,
    provider: &'a dyn ContentProvider,
    oracle: &'a dyn ApplyOracle,
}

impl<'a> StatusResolver<'a> {
    pub fn new(
        catalog: &'a PatchCatalog,
        provider: &'a dyn ContentProvider,
        oracle: &'a dyn ApplyOracle,
    ) -> Self {
        Self {
            catalog,
            provider,
            oracle,
        }
    }

    /// Resolve a label for every catalog entry, in catalog order.
    ///
    /// Runs three passes: a direct probe for patches without requirements, a
    /// synthetic-blob probe for dependent patches (prepending the content of
    /// every not-applied prerequisite), and a fixpoint pass lifting
    /// Undetermined entries to Applied when a dependent of theirs is
    /// Applied — a dependent cannot genuinely be applied unless its
    /// prerequisite is.
    ///
    /// Any content or probe failure aborts the whole resolution; partial
    /// tables are never returned.
    pub fn resolve(&self) -> Result<IndexMap<PatchId, StatusLabel>> {
        let mut labels: IndexMap<PatchId, StatusLabel> = IndexMap::new();
        self.label_all(&mut labels).map_err(|source| match source {
            source @ (PatchError::Content { .. } | PatchError::Oracle(_)) => {
                PatchError::StatusUnresolved {
                    source: Box::new(source),
                }
            }
            other => other,
        })?;
        self.propagate(&mut labels);

        // Report in catalog order regardless of resolution order.
        let mut ordered = IndexMap::with_capacity(labels.len());
        for patch in self.catalog.iter() {
            if let Some(label) = labels.get(&patch.id) {
                ordered.insert(patch.id.clone(), *label);
            }
        }
        Ok(ordered)
    }

    fn label_all(&self, labels: &mut IndexMap<PatchId, StatusLabel>) -> Result<()> {
        for patch in self.catalog.iter() {
            self.label(patch, labels)?;
        }
        Ok(())
    }

    /// Label one patch, resolving its prerequisites first. Memoized via
    /// `labels`, so a `require` edge pointing forward in catalog order still
    /// sees its prerequisite's result.
    fn label(
        &self,
        patch: &AggregatedPatch,
        labels: &mut IndexMap<PatchId, StatusLabel>,
    ) -> Result<StatusLabel> {
        if let Some(label) = labels.get(&patch.id) {
            return Ok(*label);
        }

        let label = if patch.require.is_empty() {
            let content = aggregated_content(self.provider, patch)?;
            self.oracle.probe(&content)?.status()
        } else {
            self.probe_with_prerequisites(patch, labels)?
        };

        tracing::debug!(patch = %patch.id, status = %label, "status inferred");
        labels.insert(patch.id.clone(), label);
        Ok(label)
    }

    /// Probe a dependent patch through a synthetic blob: the content of
    /// every not-applied prerequisite (in catalog order), then its own.
    /// Prerequisites already applied are present in the tree and must stay
    /// out of the blob; undetermined ones contribute nothing useful either.
    fn probe_with_prerequisites(
        &self,
        patch: &AggregatedPatch,
        labels: &mut IndexMap<PatchId, StatusLabel>,
    ) -> Result<StatusLabel> {
        let prerequisites = self.catalog.dependencies_of(&patch.id)?;
        let mut blob = String::new();
        for candidate in self.catalog.iter() {
            if !prerequisites.contains(&candidate.id) {
                continue;
            }
            let prerequisite_label = self.label(candidate, labels)?;
            if prerequisite_label == StatusLabel::NotApplied {
                push_content(&mut blob, &aggregated_content(self.provider, candidate)?);
            }
        }
        push_content(&mut blob, &aggregated_content(self.provider, patch)?);
        Ok(self.oracle.probe(&blob)?.status())
    }

    /// Fixpoint pass: an Undetermined patch with an Applied direct dependent
    /// must itself be applied. Never relabels Applied or NotApplied entries.
    fn propagate(&self, labels: &mut IndexMap<PatchId, StatusLabel>) {
        loop {
            let undetermined: Vec<PatchId> = labels
                .iter()
                .filter(|(_, label)| **label == StatusLabel::Undetermined)
                .map(|(id, _)| id.clone())
                .collect();

            let mut changed = false;
            for id in undetermined {
                let applied_dependent = self.catalog.iter().find(|patch| {
                    patch.require.contains(&id)
                        && labels.get(&patch.id) == Some(&StatusLabel::Applied)
                });
                if let Some(dependent) = applied_dependent {
                    tracing::debug!(
                        patch = %id,
                        dependent = %dependent.id,
                        "lifting undetermined patch to applied via dependent"
                    );
                    labels.insert(id, StatusLabel::Applied);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }
}
