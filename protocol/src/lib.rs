//! Data model shared by the patchup engine and its collaborator layers.
//!
//! Everything here is an immutable value type: records enter from the
//! external collector/configuration layer (already parsed), are validated
//! into [`Patch`] values, and are grouped per id into [`AggregatedPatch`]
//! views for dependency and status reasoning.

mod patch;
mod status;

pub use patch::AggregatedPatch;
pub use patch::ContentLocator;
pub use patch::Patch;
pub use patch::PatchDefinitionError;
pub use patch::PatchId;
pub use patch::PatchKind;
pub use patch::PatchRecord;
pub use status::StatusLabel;
