//! Patch dependency/status/conflict reasoning engine.
//!
//! The engine expands requested patch ids into dependency-complete,
//! catalog-ordered application plans ([`PatchCatalog`]), infers the
//! apply-state of every known patch from idempotent dry-run probes
//! ([`StatusResolver`]), localizes the cause of an apply failure with as few
//! extra probes as possible ([`ConflictAnalyzer`]), and drives all-or-nothing
//! apply runs with best-effort rollback ([`ApplyOrchestrator`]).
//!
//! Everything that touches the real file tree sits behind trait seams:
//! [`ContentProvider`] resolves locators to diff text, [`ApplyOracle`] is the
//! dry-run/apply/revert primitive, and [`RollbackHelper`] restores a clean
//! instance where the environment supports one. Catalog data enters through
//! [`Collector`] implementations; nothing here parses configuration files or
//! spawns subprocesses.

mod apply;
mod catalog;
mod collector;
mod conflict;
mod content;
mod error;
mod oracle;
mod revert;
mod status;

pub use apply::ApplyOrchestrator;
pub use catalog::PatchCatalog;
pub use collector::Collector;
pub use collector::StaticCollector;
pub use conflict::ConflictAnalyzer;
pub use content::ContentProvider;
pub use content::aggregated_content;
pub use content::combined_content;
pub use error::PatchError;
pub use error::Result;
pub use oracle::ApplyOracle;
pub use oracle::ApplyOutcome;
pub use oracle::NoopRollback;
pub use oracle::ProbeOutcome;
pub use oracle::RevertOutcome;
pub use oracle::RollbackHelper;
pub use oracle::RollbackSupport;
pub use revert::RevertValidator;
pub use status::StatusResolver;
