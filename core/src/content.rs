//! Resolution of content locators into probe blobs.

use patchup_protocol::AggregatedPatch;
use patchup_protocol::Patch;

use crate::error::Result;

/// Resolves a patch's opaque locator to diff text.
///
/// Implementations live outside the engine (filesystem, archive, …) and
/// report unreadable content as [`crate::PatchError::Content`].
pub trait ContentProvider {
    fn content(&self, patch: &Patch) -> Result<String>;
}

/// Concatenated content of every member of one aggregated patch, in
/// catalog order.
pub fn aggregated_content(
    provider: &dyn ContentProvider,
    patch: &AggregatedPatch,
) -> Result<String> {
    let mut blob = String::new();
    for member in patch.members() {
        push_content(&mut blob, &provider.content(member)?);
    }
    Ok(blob)
}

/// Concatenated content of a sequence of aggregated patches, preserving the
/// given order.
pub fn combined_content(
    provider: &dyn ContentProvider,
    patches: &[&AggregatedPatch],
) -> Result<String> {
    let mut blob = String::new();
    for patch in patches {
        push_content(&mut blob, &aggregated_content(provider, patch)?);
    }
    Ok(blob)
}

/// Append diff text, keeping every fragment newline-terminated so hunks
/// from different patches never run together.
pub(crate) fn push_content(blob: &mut String, content: &str) {
    blob.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        blob.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_content_terminates_fragments() {
        let mut blob = String::new();
        push_content(&mut blob, "--- a\n+++ b");
        push_content(&mut blob, "--- c\n+++ d\n");
        assert_eq!(blob, "--- a\n+++ b\n--- c\n+++ d\n");
    }

    #[test]
    fn push_content_skips_empty_fragments() {
        let mut blob = String::new();
        push_content(&mut blob, "");
        assert_eq!(blob, "");
    }
}
