//! Shared in-memory doubles and builders for engine tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;

use indexmap::IndexMap;
use patchup_core::ApplyOracle;
use patchup_core::ApplyOutcome;
use patchup_core::ContentProvider;
use patchup_core::PatchCatalog;
use patchup_core::PatchError;
use patchup_core::ProbeOutcome;
use patchup_core::Result;
use patchup_core::RevertOutcome;
use patchup_core::RollbackHelper;
use patchup_core::RollbackSupport;
use patchup_protocol::Patch;
use patchup_protocol::PatchId;
use patchup_protocol::PatchKind;
use patchup_protocol::PatchRecord;
use patchup_protocol::StatusLabel;

pub fn id(raw: &str) -> PatchId {
    PatchId::new(raw)
}

/// A patch whose locator is its canonical id, so [`AutoContentProvider`]
/// resolves it to `"<ID>\n"`.
pub fn patch(raw_id: &str, kind: PatchKind, require: &[&str]) -> Patch {
    Patch::from_record(PatchRecord {
        id: raw_id.to_string(),
        title: format!("Fix for {raw_id}"),
        kind,
        origin: "vendor-support".to_string(),
        package_constraint: String::new(),
        categories: Default::default(),
        affected_components: Default::default(),
        locator: raw_id.to_ascii_uppercase(),
        require: require.iter().map(ToString::to_string).collect(),
        replaced_with: None,
        deprecated: false,
    })
    .unwrap()
}

pub fn deprecated_patch(raw_id: &str, kind: PatchKind, require: &[&str]) -> Patch {
    Patch {
        deprecated: true,
        ..patch(raw_id, kind, require)
    }
}

pub fn catalog(patches: Vec<Patch>) -> PatchCatalog {
    PatchCatalog::from_patches(patches)
}

/// The probe blob produced by concatenating the given ids' content.
pub fn blob(ids: &[&str]) -> String {
    ids.iter().map(|raw| format!("{raw}\n")).collect()
}

pub fn statuses(pairs: &[(&str, StatusLabel)]) -> IndexMap<PatchId, StatusLabel> {
    pairs
        .iter()
        .map(|(raw, label)| (id(raw), *label))
        .collect()
}

/// Resolves every locator to `"<locator>\n"`; locators in `missing` fail
/// with a not-found I/O error.
#[derive(Default)]
pub struct AutoContentProvider {
    missing: HashSet<String>,
}

impl AutoContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing(mut self, locator: &str) -> Self {
        self.missing.insert(locator.to_string());
        self
    }
}

impl ContentProvider for AutoContentProvider {
    fn content(&self, patch: &Patch) -> Result<String> {
        let locator = patch.locator.as_str();
        if self.missing.contains(locator) {
            return Err(PatchError::Content {
                locator: locator.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        Ok(format!("{locator}\n"))
    }
}

/// Oracle answering from a script of blob → outcome entries, recording
/// every call.
#[derive(Default)]
pub struct ScriptedOracle {
    probes: HashMap<String, ProbeOutcome>,
    default_probe: Option<ProbeOutcome>,
    probe_failures: HashMap<String, String>,
    apply_failures: HashMap<String, String>,
    already_applied: HashSet<String>,
    revert_failures: HashMap<String, String>,
    unapplied_reverts: HashSet<String>,
    probe_log: RefCell<Vec<String>>,
    apply_log: RefCell<Vec<String>>,
    revert_log: RefCell<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe_returns(mut self, blob: &str, would_apply: bool, would_reverse: bool) -> Self {
        self.probes.insert(
            blob.to_string(),
            ProbeOutcome {
                would_apply,
                would_reverse,
            },
        );
        self
    }

    pub fn probe_default(mut self, would_apply: bool, would_reverse: bool) -> Self {
        self.default_probe = Some(ProbeOutcome {
            would_apply,
            would_reverse,
        });
        self
    }

    pub fn fail_probe(mut self, blob: &str, message: &str) -> Self {
        self.probe_failures
            .insert(blob.to_string(), message.to_string());
        self
    }

    pub fn fail_apply(mut self, blob: &str, message: &str) -> Self {
        self.apply_failures
            .insert(blob.to_string(), message.to_string());
        self
    }

    pub fn already_applied(mut self, blob: &str) -> Self {
        self.already_applied.insert(blob.to_string());
        self
    }

    pub fn fail_revert(mut self, blob: &str, message: &str) -> Self {
        self.revert_failures
            .insert(blob.to_string(), message.to_string());
        self
    }

    pub fn revert_no_op(mut self, blob: &str) -> Self {
        self.unapplied_reverts.insert(blob.to_string());
        self
    }

    pub fn probes(&self) -> Vec<String> {
        self.probe_log.borrow().clone()
    }

    pub fn applies(&self) -> Vec<String> {
        self.apply_log.borrow().clone()
    }

    pub fn reverts(&self) -> Vec<String> {
        self.revert_log.borrow().clone()
    }
}

impl ApplyOracle for ScriptedOracle {
    fn probe(&self, content: &str) -> Result<ProbeOutcome> {
        self.probe_log.borrow_mut().push(content.to_string());
        if let Some(message) = self.probe_failures.get(content) {
            return Err(PatchError::Oracle(message.clone()));
        }
        if let Some(outcome) = self.probes.get(content) {
            return Ok(*outcome);
        }
        match self.default_probe {
            Some(outcome) => Ok(outcome),
            None => panic!("unscripted probe: {content:?}"),
        }
    }

    fn apply(&mut self, content: &str) -> Result<ApplyOutcome> {
        self.apply_log.borrow_mut().push(content.to_string());
        if let Some(message) = self.apply_failures.get(content) {
            return Err(PatchError::ApplyFailed(message.clone()));
        }
        if self.already_applied.contains(content) {
            return Ok(ApplyOutcome::AlreadyApplied);
        }
        Ok(ApplyOutcome::Applied)
    }

    fn revert(&mut self, content: &str) -> Result<RevertOutcome> {
        self.revert_log.borrow_mut().push(content.to_string());
        if let Some(message) = self.revert_failures.get(content) {
            return Err(PatchError::RevertFailed(message.clone()));
        }
        if self.unapplied_reverts.contains(content) {
            return Ok(RevertOutcome::WasNotApplied);
        }
        Ok(RevertOutcome::Reverted)
    }
}

/// Rollback helper for environments with a disposable instance.
#[derive(Default)]
pub struct CleanSlateRollback {
    pub calls: usize,
}

impl RollbackHelper for CleanSlateRollback {
    fn rollback_required(&mut self) -> Result<RollbackSupport> {
        self.calls += 1;
        Ok(RollbackSupport::Done)
    }
}
