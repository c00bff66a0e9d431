//! Error taxonomy for the differ pipeline.

use std::fmt;

use crate::ident::StableId;

/// Top-level error type returned by the public operations in [`crate`].
#[derive(Debug, thiserror::Error)]
pub enum PgDeltaError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    CyclicDependency(#[from] CyclicDependencyError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperation),
}

/// Database I/O failure or a malformed catalog row encountered during
/// extraction. Fatal to the current diff; no partial snapshot is ever
/// returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("query failed while extracting {catalog}: {source}")]
    Query {
        catalog: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("malformed row while extracting {catalog}: {reason}")]
    MalformedRow {
        catalog: &'static str,
        reason: String,
    },
}

/// A programming bug: the emitter was handed a change variant it cannot
/// explain, or a change references a stable id that does not resolve.
/// Surfaced as a normal error rather than a panic, so library callers
/// (and tests) can observe it instead of the process aborting.
#[derive(Debug, thiserror::Error)]
pub struct InvariantViolation {
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violated: {}", self.message)
    }
}

impl InvariantViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The resolver could not find a total order over the change set. Carries
/// the offending subgraph (the stable ids of the changes participating in
/// the cycle) for diagnosis.
#[derive(Debug, thiserror::Error)]
#[error("cyclic dependency detected among: {}", join_ids(.cycle))]
pub struct CyclicDependencyError {
    pub cycle: Vec<StableId>,
}

fn join_ids(ids: &[StableId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A diff would require a DDL form deliberately outside scope (e.g.
/// altering an index beyond a bare rename).
#[derive(Debug, thiserror::Error)]
#[error("unsupported operation on {stable_id}: {reason}")]
pub struct UnsupportedOperation {
    pub stable_id: StableId,
    pub reason: &'static str,
}
