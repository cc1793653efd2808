//! All-or-nothing apply and revert sequencing.

use indexmap::IndexMap;
use patchup_protocol::AggregatedPatch;
use patchup_protocol::PatchId;
use patchup_protocol::StatusLabel;

use crate::catalog::PatchCatalog;
use crate::conflict::ConflictAnalyzer;
use crate::content::ContentProvider;
use crate::content::aggregated_content;
use crate::error::PatchError;
use crate::error::Result;
use crate::oracle::ApplyOracle;
use crate::oracle::ApplyOutcome;
use crate::oracle::RevertOutcome;
use crate::oracle::RollbackHelper;
use crate::revert::RevertValidator;

/// Applies a working set in catalog order; on failure rolls the run back
/// and raises a terminal error carrying the conflict diagnostic.
pub struct ApplyOrchestrator<'a> {
    catalog: &'a PatchCatalog,
    provider: &'a dyn ContentProvider,
}

impl<'a> ApplyOrchestrator<'a> {
    pub fn new(catalog: &'a PatchCatalog, provider: &'a dyn ContentProvider) -> Self {
        Self { catalog, provider }
    }

    /// Expand `filter` into a dependency-complete plan and apply it in
    /// catalog order. Returns the ids this run newly applied.
    ///
    /// A patch the oracle reports as already applied is a successful no-op;
    /// it is not queued for rollback since this run did not change the tree
    /// for it. On an apply failure every patch this run applied is reverted
    /// in reverse order (best effort: a failed revert is logged and the
    /// rollback continues), the conflict analyzer is consulted, and
    /// [`PatchError::ApplyAborted`] is raised with its diagnostic.
    ///
    /// Every locator in the plan is resolved before the first apply, so an
    /// unreadable patch aborts the run while the tree is still untouched.
    pub fn apply_set(
        &self,
        filter: &[PatchId],
        oracle: &mut dyn ApplyOracle,
        rollback: &mut dyn RollbackHelper,
    ) -> Result<Vec<PatchId>> {
        let plan = self.catalog.expand(filter)?;
        let contents = self.resolve_contents(&plan)?;
        let mut applied: Vec<(&AggregatedPatch, &str)> = Vec::new();

        for (patch, content) in plan.iter().zip(&contents) {
            let patch = *patch;
            match oracle.apply(content) {
                Ok(ApplyOutcome::Applied) => {
                    tracing::info!(patch = %patch.id, "patch applied");
                    applied.push((patch, content.as_str()));
                }
                Ok(ApplyOutcome::AlreadyApplied) => {
                    tracing::info!(patch = %patch.id, "patch already applied, skipping");
                }
                Err(failure) => {
                    tracing::error!(patch = %patch.id, error = %failure, "apply failed, rolling back");
                    self.rollback_run(&applied, oracle);
                    let diagnostic = self.diagnose(patch, filter, &*oracle, rollback);
                    return Err(PatchError::ApplyAborted {
                        id: patch.id.clone(),
                        message: failure.to_string(),
                        diagnostic,
                    });
                }
            }
        }

        Ok(applied.iter().map(|(patch, _)| patch.id.clone()).collect())
    }

    /// Revert the requested ids (no requirement expansion — reverting a
    /// patch must not silently revert what it depends on), newest first,
    /// after the dependency guard has passed against `statuses`.
    pub fn revert_set(
        &self,
        filter: &[PatchId],
        statuses: &IndexMap<PatchId, StatusLabel>,
        oracle: &mut dyn ApplyOracle,
    ) -> Result<Vec<PatchId>> {
        let plan = self.catalog.expand_with(filter, false)?;
        let ids: Vec<PatchId> = plan.iter().map(|patch| patch.id.clone()).collect();
        RevertValidator::new(self.catalog).ensure_safe(&ids, statuses)?;
        let contents = self.resolve_contents(&plan)?;

        let mut reverted = Vec::new();
        for (patch, content) in plan.iter().zip(&contents).rev() {
            match oracle.revert(content)? {
                RevertOutcome::Reverted => {
                    tracing::info!(patch = %patch.id, "patch reverted");
                    reverted.push(patch.id.clone());
                }
                RevertOutcome::WasNotApplied => {
                    tracing::info!(patch = %patch.id, "patch was not applied, nothing to revert");
                }
            }
        }
        Ok(reverted)
    }

    /// Resolve every plan entry's content up front so no locator fault can
    /// surface after the tree has started changing.
    fn resolve_contents(&self, plan: &[&AggregatedPatch]) -> Result<Vec<String>> {
        plan.iter()
            .map(|patch| aggregated_content(self.provider, patch))
            .collect()
    }

    /// Best-effort rollback of everything this run applied, in reverse
    /// order. Failures are logged and do not stop the remaining reverts.
    fn rollback_run(&self, applied: &[(&AggregatedPatch, &str)], oracle: &mut dyn ApplyOracle) {
        for (patch, content) in applied.iter().rev() {
            match oracle.revert(content) {
                Ok(RevertOutcome::Reverted) => {
                    tracing::info!(patch = %patch.id, "rolled back");
                }
                Ok(RevertOutcome::WasNotApplied) => {
                    tracing::info!(patch = %patch.id, "not applied, no rollback needed");
                }
                Err(error) => {
                    tracing::warn!(patch = %patch.id, error = %error, "rollback revert failed");
                }
            }
        }
    }

    /// Run the conflict analyzer; an analyzer failure must not mask the
    /// original apply failure, so it degrades to no diagnostic.
    fn diagnose(
        &self,
        failed: &AggregatedPatch,
        filter: &[PatchId],
        oracle: &dyn ApplyOracle,
        rollback: &mut dyn RollbackHelper,
    ) -> Option<String> {
        match ConflictAnalyzer::new(self.catalog, self.provider)
            .analyze(failed, filter, oracle, rollback)
        {
            Ok(diagnostic) => diagnostic,
            Err(error) => {
                tracing::warn!(patch = %failed.id, error = %error, "conflict analysis failed");
                None
            }
        }
    }
}
