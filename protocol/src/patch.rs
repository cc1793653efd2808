//! Patch identity, metadata records, and the per-id aggregation view.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;

/// Case-insensitive patch identifier, canonicalized to ASCII uppercase.
///
/// The id is the sole key used for dependency edges, so equality, ordering
/// and hashing all operate on the canonical form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct PatchId(String);

impl PatchId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for PatchId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for PatchId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatchId({})", self.0)
    }
}

/// Delivery classification of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PatchKind {
    /// Shipped with the product; expected on every instance.
    Required,
    /// Opt-in; applied only when explicitly requested.
    Optional,
    /// Locally authored; outside the curated set.
    Custom,
}

/// Opaque handle resolved by the external content provider to diff text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct ContentLocator(String);

impl ContentLocator {
    pub fn new(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContentLocator {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw patch metadata as handed over by a collector.
///
/// This is the deserialization-facing shape; it carries no invariants.
/// [`Patch::from_record`] validates it into the immutable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub kind: PatchKind,
    #[serde(default)]
    pub origin: String,
    /// Package-version applicability constraint, evaluated by the external
    /// constraint checker only; opaque to the engine.
    #[serde(default)]
    pub package_constraint: String,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub affected_components: BTreeSet<String>,
    pub locator: String,
    #[serde(default)]
    pub require: Vec<String>,
    #[serde(default)]
    pub replaced_with: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
}

/// A record failed validation while being promoted to a [`Patch`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchDefinitionError {
    #[error("patch id is empty")]
    EmptyId,

    #[error("patch {id} has an empty content locator")]
    EmptyLocator { id: PatchId },

    #[error("patch {id} requires itself")]
    SelfRequirement { id: PatchId },

    #[error("patch {id} lists requirement {requirement} more than once")]
    DuplicateRequirement { id: PatchId, requirement: PatchId },
}

/// Immutable, validated patch metadata.
///
/// Multiple `Patch` values may share an id: the same logical patch shipped
/// for different package editions/constraints. [`AggregatedPatch`] groups
/// them back into one logical unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub id: PatchId,
    pub title: String,
    pub kind: PatchKind,
    /// Provenance label, e.g. "vendor-support", "community", "local".
    pub origin: String,
    pub package_constraint: String,
    pub categories: BTreeSet<String>,
    pub affected_components: BTreeSet<String>,
    pub locator: ContentLocator,
    pub require: Vec<PatchId>,
    pub replaced_with: Option<PatchId>,
    pub deprecated: bool,
}

impl Patch {
    /// Validate a raw record into an immutable `Patch`.
    pub fn from_record(record: PatchRecord) -> Result<Self, PatchDefinitionError> {
        let id = PatchId::new(&record.id);
        if id.is_empty() {
            return Err(PatchDefinitionError::EmptyId);
        }
        if record.locator.trim().is_empty() {
            return Err(PatchDefinitionError::EmptyLocator { id });
        }

        let mut require = Vec::with_capacity(record.require.len());
        for raw in &record.require {
            let requirement = PatchId::new(raw);
            if requirement == id {
                return Err(PatchDefinitionError::SelfRequirement { id });
            }
            if require.contains(&requirement) {
                return Err(PatchDefinitionError::DuplicateRequirement { id, requirement });
            }
            require.push(requirement);
        }

        let replaced_with = record
            .replaced_with
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(PatchId::new);

        Ok(Self {
            id,
            title: record.title,
            kind: record.kind,
            origin: record.origin,
            package_constraint: record.package_constraint,
            categories: record.categories,
            affected_components: record.affected_components,
            locator: ContentLocator::new(&record.locator),
            require,
            replaced_with,
            deprecated: record.deprecated,
        })
    }
}

/// Grouping view over every [`Patch`] sharing one id.
///
/// Derived fields follow the member (catalog) order: `require` is the
/// order-preserving union, `deprecated` is true if any member is, and
/// `replaced_with` is the last non-empty value among members.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPatch {
    pub id: PatchId,
    pub title: String,
    pub kind: PatchKind,
    pub origin: String,
    pub require: Vec<PatchId>,
    pub replaced_with: Option<PatchId>,
    pub deprecated: bool,
    pub categories: BTreeSet<String>,
    pub affected_components: BTreeSet<String>,
    members: Vec<Patch>,
}

impl AggregatedPatch {
    /// Build the aggregation from same-id members in catalog order.
    ///
    /// `members` must be non-empty and share a single id.
    pub fn from_members(members: Vec<Patch>) -> Self {
        debug_assert!(!members.is_empty());
        debug_assert!(members.iter().all(|m| m.id == members[0].id));

        let first = &members[0];
        let id = first.id.clone();
        let title = first.title.clone();
        let kind = first.kind;
        let origin = first.origin.clone();

        let mut require: Vec<PatchId> = Vec::new();
        let mut replaced_with: Option<PatchId> = None;
        let mut deprecated = false;
        let mut categories = BTreeSet::new();
        let mut affected_components = BTreeSet::new();
        for member in &members {
            for requirement in &member.require {
                if !require.contains(requirement) {
                    require.push(requirement.clone());
                }
            }
            if member.replaced_with.is_some() {
                replaced_with = member.replaced_with.clone();
            }
            deprecated |= member.deprecated;
            categories.extend(member.categories.iter().cloned());
            affected_components.extend(member.affected_components.iter().cloned());
        }

        Self {
            id,
            title,
            kind,
            origin,
            require,
            replaced_with,
            deprecated,
            categories,
            affected_components,
            members,
        }
    }

    /// Underlying same-id members, in catalog order, for content access.
    pub fn members(&self) -> &[Patch] {
        &self.members
    }
}
