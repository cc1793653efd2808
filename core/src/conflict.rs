//! Fault localization after a failed apply.
//!
//! A restricted, single-culprit variant of delta debugging: rather than a
//! general bisection, the analyzer eliminates candidates one at a time in
//! reverse catalog order, so the first probe that flips to success names the
//! offending patch. Each probe is expensive (it reads real files), so the
//! elimination is incremental instead of exhaustive.

use patchup_protocol::AggregatedPatch;
use patchup_protocol::PatchId;
use patchup_protocol::PatchKind;

use crate::catalog::PatchCatalog;
use crate::content::ContentProvider;
use crate::content::combined_content;
use crate::error::Result;
use crate::oracle::ApplyOracle;
use crate::oracle::RollbackHelper;
use crate::oracle::RollbackSupport;

/// Diagnoses which already-applied or sibling patch made an apply fail.
pub struct ConflictAnalyzer<'a> {
    catalog: &'a PatchCatalog,
    provider: &'a dyn ContentProvider,
}

impl<'a> ConflictAnalyzer<'a> {
    pub fn new(catalog: &'a PatchCatalog, provider: &'a dyn ContentProvider) -> Self {
        Self { catalog, provider }
    }

    /// Localize the cause of `failed`'s apply failure to one offending
    /// patch, returning a human-readable diagnostic, or `None` when no
    /// conflict could be localized.
    ///
    /// `filter` is the set of ids the failed run was attempting; it narrows
    /// the candidate pool for non-required patches.
    ///
    /// Non-required analysis first asks the rollback helper for a clean
    /// slate; where the environment cannot provide one the analysis is
    /// skipped entirely.
    pub fn analyze(
        &self,
        failed: &AggregatedPatch,
        filter: &[PatchId],
        oracle: &dyn ApplyOracle,
        rollback: &mut dyn RollbackHelper,
    ) -> Result<Option<String>> {
        if failed.kind == PatchKind::Required {
            return self.analyze_required(failed, oracle);
        }
        match rollback.rollback_required()? {
            RollbackSupport::Done => self.analyze_optional(failed, filter, oracle),
            RollbackSupport::Unsupported => {
                tracing::debug!(
                    patch = %failed.id,
                    "no clean instance available, skipping conflict analysis"
                );
                Ok(None)
            }
        }
    }

    /// Eliminate required patches from the probe set one at a time, in
    /// reverse catalog order; the pop that flips the probe to success names
    /// the culprit.
    fn analyze_required(
        &self,
        failed: &AggregatedPatch,
        oracle: &dyn ApplyOracle,
    ) -> Result<Option<String>> {
        let mut pool: Vec<&AggregatedPatch> = self
            .catalog
            .ids_of_kind(PatchKind::Required)
            .iter()
            .filter(|id| **id != failed.id)
            .filter_map(|id| self.catalog.get(id))
            .collect();

        if self.probe_with(&pool, failed, oracle)? {
            // The full required set plus the failed patch applies cleanly;
            // the failure did not come from the required set.
            return Ok(None);
        }

        while let Some(removed) = pool.pop() {
            if self.probe_with(&pool, failed, oracle)? {
                return Ok(Some(format!(
                    "Patch {} is not compatible with required: {}",
                    failed.id, removed.id
                )));
            }
        }

        // The last round probed the failed patch alone and still failed.
        Ok(Some(format!(
            "Patch {} cannot be applied to a clean instance",
            failed.id
        )))
    }

    /// Pairwise-probe the failed patch against each candidate, then drop
    /// candidates that are dependencies of another conflicting candidate so
    /// the diagnostic names root causes, not symptoms.
    fn analyze_optional(
        &self,
        failed: &AggregatedPatch,
        filter: &[PatchId],
        oracle: &dyn ApplyOracle,
    ) -> Result<Option<String>> {
        let candidate_ids: Vec<PatchId> = if filter.is_empty() {
            self.catalog.ids_of_kind(PatchKind::Optional)
        } else {
            filter.to_vec()
        };
        let candidates: Vec<&AggregatedPatch> = candidate_ids
            .iter()
            .filter(|id| **id != failed.id)
            .filter_map(|id| self.catalog.get(id))
            .collect();

        let mut conflicting: Vec<&AggregatedPatch> = Vec::new();
        for candidate in candidates {
            if !self.probe_with(&[candidate], failed, oracle)? {
                tracing::debug!(
                    patch = %failed.id,
                    candidate = %candidate.id,
                    "pairwise probe failed"
                );
                conflicting.push(candidate);
            }
        }

        let mut root_causes: Vec<PatchId> = Vec::new();
        for candidate in &conflicting {
            let mut is_symptom = false;
            for other in &conflicting {
                if other.id == candidate.id {
                    continue;
                }
                if self.catalog.dependencies_of(&other.id)?.contains(&candidate.id) {
                    is_symptom = true;
                    break;
                }
            }
            if !is_symptom {
                root_causes.push(candidate.id.clone());
            }
        }

        if root_causes.is_empty() {
            return Ok(None);
        }
        let listed = root_causes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Some(format!(
            "Patch {} is not compatible with optional: {listed}",
            failed.id
        )))
    }

    /// Probe the concatenation of `pool` (in its given order) followed by
    /// the failed patch; true when the blob would apply cleanly.
    fn probe_with(
        &self,
        pool: &[&AggregatedPatch],
        failed: &AggregatedPatch,
        oracle: &dyn ApplyOracle,
    ) -> Result<bool> {
        let mut set: Vec<&AggregatedPatch> = pool.to_vec();
        set.push(failed);
        let blob = combined_content(self.provider, &set)?;
        Ok(oracle.probe(&blob)?.would_apply)
    }
}
