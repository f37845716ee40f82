use thiserror::Error;

/// Errors surfaced by the shared dispatch core.
///
/// Binaries convert these to `anyhow::Error` with `.context(...)` at the call site;
/// this enum only needs to distinguish cases callers branch on (see
/// `AssignError::Race`, used by the rider request handler to pick a reply reason).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("payload is missing the \"tipo\" field")]
    MissingTipo,

    #[error("update received for unknown taxi {0}")]
    UnknownTaxi(crate::model::TaxiId),
}

/// Outcome of a rider match attempt, distinguished because each case maps to a
/// different reply reason on the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("dispatcher is not active")]
    NotActive,
    #[error("no eligible taxi")]
    NoTaxi,
    #[error("candidate taxi became ineligible before commit")]
    Race,
}
