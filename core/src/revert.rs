//! Dependency guard for revert requests.

use indexmap::IndexMap;
use patchup_protocol::PatchId;
use patchup_protocol::StatusLabel;

use crate::catalog::PatchCatalog;
use crate::error::PatchError;
use crate::error::Result;
use crate::error::join_ids;

/// Refuses to revert a patch while an applied patch outside the revert set
/// still depends on it.
///
/// Purely advisory: consults the resolved status map, mutates nothing.
pub struct RevertValidator<'a> {
    catalog: &'a PatchCatalog,
}

impl<'a> RevertValidator<'a> {
    pub fn new(catalog: &'a PatchCatalog) -> Self {
        Self { catalog }
    }

    /// Check every id in the revert set against its transitive dependents.
    /// A dependent that is Applied and not itself being reverted blocks the
    /// revert with a [`PatchError::Validation`] naming both sides.
    pub fn ensure_safe(
        &self,
        revert_ids: &[PatchId],
        statuses: &IndexMap<PatchId, StatusLabel>,
    ) -> Result<()> {
        let mut blockers = Vec::new();
        for id in revert_ids {
            let applied_dependents: Vec<PatchId> = self
                .catalog
                .dependents_of(id)
                .into_iter()
                .filter(|dependent| !revert_ids.contains(dependent))
                .filter(|dependent| {
                    statuses.get(dependent).copied() == Some(StatusLabel::Applied)
                })
                .collect();
            if !applied_dependents.is_empty() {
                blockers.push(format!(
                    "patch {id} is required by applied patches: {}",
                    join_ids(&applied_dependents)
                ));
            }
        }

        if blockers.is_empty() {
            Ok(())
        } else {
            Err(PatchError::Validation(format!(
                "cannot revert: {}; revert the dependent patches first",
                blockers.join("; ")
            )))
        }
    }
}
