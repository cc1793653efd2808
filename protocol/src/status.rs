//! Apply-state labels inferred from dry-run probes.

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

/// Inferred apply-state of a logical patch.
///
/// Labels are recomputed from probes on every status query; nothing is
/// persisted between invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
pub enum StatusLabel {
    #[strum(serialize = "Applied")]
    Applied,
    #[strum(serialize = "Not applied")]
    NotApplied,
    /// The probe could neither apply nor reverse the content; the tree is
    /// in some intermediate or locally modified state.
    #[strum(serialize = "Undetermined")]
    Undetermined,
}

impl StatusLabel {
    pub fn is_applied(self) -> bool {
        self == StatusLabel::Applied
    }
}
