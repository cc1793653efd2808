//! Trait seams for the external apply/revert/dry-run primitives.
//!
//! The engine treats the oracle as a black box over an opaque blob of diff
//! text. Probes are non-mutating; `apply`/`revert` mutate the single shared
//! file tree and are therefore `&mut self`. The caller guarantees mutual
//! exclusion — only one probe or mutation is ever in flight.

use patchup_protocol::StatusLabel;

use crate::error::Result;

/// Result of a non-mutating dry-run probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// The content would apply cleanly on the current tree.
    pub would_apply: bool,
    /// Reverting the content would apply cleanly on the current tree.
    pub would_reverse: bool,
}

impl ProbeOutcome {
    /// Map the probe flags to a status label: applies cleanly means the
    /// patch is not present; reverses cleanly means it is; neither means
    /// the tree is in an intermediate state.
    pub fn status(self) -> StatusLabel {
        if self.would_apply {
            StatusLabel::NotApplied
        } else if self.would_reverse {
            StatusLabel::Applied
        } else {
            StatusLabel::Undetermined
        }
    }
}

/// Outcome of a real, mutating apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The content was already present; a successful no-op.
    AlreadyApplied,
}

/// Outcome of a real, mutating revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    Reverted,
    /// The content was not present; a successful no-op.
    WasNotApplied,
}

/// The external apply/revert/dry-run primitive.
///
/// `apply` fails only when the content neither applies forward nor passes
/// the reverse check; `revert` has the symmetric contract.
pub trait ApplyOracle {
    fn probe(&self, content: &str) -> Result<ProbeOutcome>;

    fn apply(&mut self, content: &str) -> Result<ApplyOutcome>;

    fn revert(&mut self, content: &str) -> Result<RevertOutcome>;
}

/// Whether a clean-slate rollback is available in this environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackSupport {
    /// Every currently-applied required patch was reverted.
    Done,
    /// No disposable instance is available; conflict analysis against a
    /// clean slate must be skipped.
    Unsupported,
}

/// Restores a clean baseline before optional-patch conflict analysis.
pub trait RollbackHelper {
    /// Revert every currently-applied required patch, or report that the
    /// environment cannot do so.
    fn rollback_required(&mut self) -> Result<RollbackSupport>;
}

/// Helper for environments without a disposable instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRollback;

impl RollbackHelper for NoopRollback {
    fn rollback_required(&mut self) -> Result<RollbackSupport> {
        Ok(RollbackSupport::Unsupported)
    }
}
