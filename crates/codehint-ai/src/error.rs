//! Error types for model lifecycle and hint generation.

use codehint_local::LocalAIError;
use thiserror::Error;

/// A failure raised by an engine backend or an artifact store.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failure from the bundled llama.cpp host.
    #[error(transparent)]
    Local(#[from] LocalAIError),

    /// A well-formed failure carrying its own message.
    #[error("{0}")]
    Message(String),

    /// A raw failure value with no message of its own.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Errors surfaced to callers of [`crate::CodeHinter`].
#[derive(Debug, Error)]
pub enum HintError {
    /// The backend rejected or could not initialize the model.
    #[error("failed to load model: {0}")]
    LoadFailure(String),

    /// A hint was requested before a model finished loading.
    #[error("model not ready")]
    NotReady,

    /// The fragment stream failed mid-way; no partial hint is returned.
    #[error("hint stream failed: {0}")]
    Stream(#[source] EngineError),

    /// The artifact store could not purge downloaded models.
    #[error("failed to clear model cache: {0}")]
    CacheClear(#[source] EngineError),

    /// Tearing down the active engine failed.
    #[error("failed to unload model: {0}")]
    Unload(#[source] EngineError),

    /// The cache cannot be purged while a model is being loaded.
    #[error("a model load is in progress")]
    LoadInProgress,
}
