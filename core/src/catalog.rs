//! The immutable-after-build patch catalog and its graph queries.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use indexmap::IndexSet;
use patchup_protocol::AggregatedPatch;
use patchup_protocol::Patch;
use patchup_protocol::PatchId;
use patchup_protocol::PatchKind;

use crate::collector::Collector;
use crate::error::PatchError;
use crate::error::Result;

/// Every known patch, aggregated per id, in stable catalog order.
///
/// Catalog order is the order patches were collected; it is the order plans
/// are applied in and the order probe blobs are concatenated in.
#[derive(Debug, Clone, Default)]
pub struct PatchCatalog {
    aggregated: IndexMap<PatchId, AggregatedPatch>,
}

impl PatchCatalog {
    /// Gather patches from the given collectors and aggregate them per id.
    pub fn build(collectors: &[Box<dyn Collector>]) -> Result<Self> {
        let mut patches = Vec::new();
        for collector in collectors {
            patches.extend(collector.collect()?);
        }
        Ok(Self::from_patches(patches))
    }

    /// Aggregate already-gathered patches per id, keeping first-occurrence
    /// order.
    pub fn from_patches(patches: Vec<Patch>) -> Self {
        let mut groups: IndexMap<PatchId, Vec<Patch>> = IndexMap::new();
        for patch in patches {
            groups.entry(patch.id.clone()).or_default().push(patch);
        }
        let aggregated: IndexMap<PatchId, AggregatedPatch> = groups
            .into_iter()
            .map(|(id, members)| (id, AggregatedPatch::from_members(members)))
            .collect();
        tracing::debug!(patches = aggregated.len(), "patch catalog built");
        Self { aggregated }
    }

    pub fn get(&self, id: &PatchId) -> Option<&AggregatedPatch> {
        self.aggregated.get(id)
    }

    pub fn contains(&self, id: &PatchId) -> bool {
        self.aggregated.contains_key(id)
    }

    /// Aggregated patches in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &AggregatedPatch> {
        self.aggregated.values()
    }

    pub fn len(&self) -> usize {
        self.aggregated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregated.is_empty()
    }

    /// Expand requested ids into a dependency-complete, ordered plan: each
    /// patch's requirements precede it, duplicates collapse onto their first
    /// occurrence. An empty filter yields the full catalog in catalog order.
    ///
    /// Ids absent from the catalog fail with [`PatchError::PatchNotFound`]
    /// listing exactly the requested ids that did not resolve; a `require`
    /// edge that does not resolve fails with
    /// [`PatchError::MissingRequirement`] instead, since that is a catalog
    /// authoring defect rather than a bad filter.
    pub fn expand(&self, ids: &[PatchId]) -> Result<Vec<&AggregatedPatch>> {
        self.expand_with(ids, true)
    }

    /// [`Self::expand`] with requirement expansion switched off: resolves
    /// and deduplicates the requested ids only. Used for revert plans, where
    /// pulling in requirements would revert more than asked.
    pub fn expand_with(
        &self,
        ids: &[PatchId],
        include_requirements: bool,
    ) -> Result<Vec<&AggregatedPatch>> {
        if ids.is_empty() {
            return Ok(self.aggregated.values().collect());
        }

        let missing: Vec<PatchId> = ids
            .iter()
            .filter(|id| !self.aggregated.contains_key(*id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PatchError::PatchNotFound { ids: missing });
        }

        let mut ordered: Vec<&AggregatedPatch> = Vec::new();
        let mut visited: IndexSet<PatchId> = IndexSet::new();
        let mut in_progress: Vec<PatchId> = Vec::new();
        for id in ids {
            // Lookup cannot fail: missing ids were rejected above.
            let Some(patch) = self.aggregated.get(id) else {
                continue;
            };
            if include_requirements {
                self.visit(patch, &mut visited, &mut in_progress, &mut ordered)?;
            } else if visited.insert(patch.id.clone()) {
                ordered.push(patch);
            }
        }
        Ok(ordered)
    }

    fn visit<'a>(
        &'a self,
        patch: &'a AggregatedPatch,
        visited: &mut IndexSet<PatchId>,
        in_progress: &mut Vec<PatchId>,
        ordered: &mut Vec<&'a AggregatedPatch>,
    ) -> Result<()> {
        if visited.contains(&patch.id) {
            return Ok(());
        }
        if in_progress.contains(&patch.id) {
            let mut chain = in_progress.clone();
            chain.push(patch.id.clone());
            return Err(PatchError::DependencyCycle { chain });
        }

        in_progress.push(patch.id.clone());
        for requirement in &patch.require {
            let Some(required) = self.aggregated.get(requirement) else {
                return Err(PatchError::MissingRequirement {
                    required_by: patch.id.clone(),
                    missing: requirement.clone(),
                });
            };
            self.visit(required, visited, in_progress, ordered)?;
        }
        in_progress.pop();

        visited.insert(patch.id.clone());
        ordered.push(patch);
        Ok(())
    }

    /// Transitive closure of patches whose `require` reaches `id`.
    pub fn dependents_of(&self, id: &PatchId) -> BTreeSet<PatchId> {
        let mut dependents = BTreeSet::new();
        let mut frontier = vec![id.clone()];
        while let Some(current) = frontier.pop() {
            for patch in self.aggregated.values() {
                if patch.require.contains(&current)
                    && patch.id != *id
                    && dependents.insert(patch.id.clone())
                {
                    frontier.push(patch.id.clone());
                }
            }
        }
        dependents
    }

    /// Ids pulled in by expanding `id`, minus `id` itself.
    pub fn dependencies_of(&self, id: &PatchId) -> Result<BTreeSet<PatchId>> {
        let expanded = self.expand(std::slice::from_ref(id))?;
        Ok(expanded
            .iter()
            .map(|patch| patch.id.clone())
            .filter(|dependency| dependency != id)
            .collect())
    }

    /// Ids whose `replaced_with` points at `id`, in catalog order.
    pub fn replaced_by(&self, id: &PatchId) -> Vec<PatchId> {
        self.aggregated
            .values()
            .filter(|patch| patch.replaced_with.as_ref() == Some(id))
            .map(|patch| patch.id.clone())
            .collect()
    }

    /// Non-deprecated ids of the given kind, in catalog order.
    pub fn ids_of_kind(&self, kind: PatchKind) -> Vec<PatchId> {
        self.aggregated
            .values()
            .filter(|patch| patch.kind == kind && !patch.deprecated)
            .map(|patch| patch.id.clone())
            .collect()
    }
}
