//! Error kinds for the patch engine.
//!
//! Expected, recoverable outcomes (a bad user filter, the revert dependency
//! guard) are ordinary variants a command boundary renders as a clean
//! failure; catalog integrity and I/O variants signal defects or environment
//! faults and abort the whole command.

use patchup_protocol::PatchDefinitionError;
use patchup_protocol::PatchId;
use thiserror::Error;

/// Result type alias using [`PatchError`].
pub type Result<T> = std::result::Result<T, PatchError>;

#[derive(Debug, Error)]
pub enum PatchError {
    /// A user-supplied filter references ids absent from the catalog.
    /// Lists exactly the requested ids that failed to resolve.
    #[error("patches not found in the catalog: {}", join_ids(.ids))]
    PatchNotFound { ids: Vec<PatchId> },

    /// A `require` edge points at an id the catalog does not contain.
    /// This is a catalog authoring defect, not a bad user filter.
    #[error("patch {required_by} requires {missing}, which is missing from the catalog")]
    MissingRequirement {
        required_by: PatchId,
        missing: PatchId,
    },

    /// The `require` graph contains a cycle.
    #[error("dependency cycle in patch requirements: {}", join_ids(.chain))]
    DependencyCycle { chain: Vec<PatchId> },

    /// A collected record failed validation.
    #[error(transparent)]
    Definition(#[from] PatchDefinitionError),

    /// Patch content could not be resolved from its locator.
    #[error("unable to read patch content {locator}: {source}")]
    Content {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    /// Status resolution hit a content or probe failure; no partial status
    /// table is returned.
    #[error("status resolution aborted: {source}")]
    StatusUnresolved {
        #[source]
        source: Box<PatchError>,
    },

    /// The oracle could neither apply the content forward nor confirm it was
    /// already applied.
    #[error("failed to apply patch: {0}")]
    ApplyFailed(String),

    /// The oracle could neither revert the content nor confirm it was not
    /// applied.
    #[error("failed to revert patch: {0}")]
    RevertFailed(String),

    /// Terminal orchestrator error raised after rollback, embedding the
    /// conflict analyzer's diagnostic when one was found.
    #[error("applying patch {id} failed: {message}{}", diagnostic_suffix(.diagnostic))]
    ApplyAborted {
        id: PatchId,
        message: String,
        diagnostic: Option<String>,
    },

    /// Revert dependency guard, or another user-facing precondition.
    #[error("{0}")]
    Validation(String),

    /// Unexpected oracle transport failure.
    #[error("patch oracle failure: {0}")]
    Oracle(String),
}

impl PatchError {
    /// True for expected user-facing aborts; false for defects and
    /// environment faults.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PatchError::PatchNotFound { .. } | PatchError::Validation(_)
        )
    }
}

pub(crate) fn join_ids(ids: &[PatchId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn diagnostic_suffix(diagnostic: &Option<String>) -> String {
    match diagnostic {
        Some(diagnostic) => format!("\n{diagnostic}"),
        None => String::new(),
    }
}
