//! Stable-identity PostgreSQL catalog differ and DDL generator.
//!
//! Three stages turn one or two catalog snapshots into executable SQL:
//! extraction reads a live catalog into an immutable [`Snapshot`]; the
//! differ compares two snapshots into an unordered change set; the
//! resolver orders that set into something safe to execute; the emitter
//! renders each ordered change to SQL text.

pub mod change;
pub mod entity;
pub mod error;
pub mod extract;
pub mod ident;
pub mod snapshot;

mod differ;
mod emit;
mod resolve;

pub use change::Change;
pub use error::PgDeltaError;
pub use snapshot::Snapshot;

/// End-to-end diff: structural comparison followed by dependency-aware
/// ordering. Callers who need the unordered change set on its
/// own can reach `differ`/`resolve` directly through the crate, but this
/// is the entry point every other collaborator is expected to use.
pub fn diff(master: &Snapshot, branch: &Snapshot) -> Result<Vec<Change>, PgDeltaError> {
    let changes = differ::diff(master, branch);
    let ordered = resolve::resolve(master, branch, changes)?;
    Ok(ordered)
}

/// Render one change to SQL text.
pub fn emit(change: &Change) -> Result<String, error::UnsupportedOperation> {
    emit::emit(change)
}

#[cfg(feature = "sync")]
pub use extract::sync::extract;

#[cfg(feature = "tokio-postgres")]
pub use extract::asynchronous::extract as extract_async;
