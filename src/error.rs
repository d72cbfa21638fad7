//! Error taxonomy for session bootstrap, storage and event dispatch.
//!
//! ERROR HANDLING
//! ==============
//! Configuration and runtime-load failures are fatal to a bootstrap attempt.
//! Storage write failures propagate to the caller of `Stash::set`. Parse
//! failures never surface here: a corrupt stash entry reads as absent.
//! Expired or missing tokens are not errors at all; guards handle them by
//! redirecting.

/// Failure while talking to the tab-scoped storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No storage is reachable in this environment (SSR, privacy mode, ...).
    #[error("session storage unavailable")]
    Unavailable,
    /// The value could not be encoded as JSON.
    #[error("failed to serialize stash value: {0}")]
    Serialize(String),
    /// The backend rejected the write (quota exceeded, access denied).
    #[error("session storage write failed: {0}")]
    Write(String),
}

/// Errors raised while bootstrapping or driving an identity session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("there is no client id configured")]
    MissingClientId,
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
    #[error("identity runtime failed to load: {0}")]
    RuntimeLoad(String),
    #[error("identity client construction failed: {0}")]
    Construct(String),
    #[error("unknown session event: {0}")]
    UnknownEvent(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error returned by a failing event subscriber.
pub type SubscriberError = Box<dyn std::error::Error>;
