//! Collaborator interfaces: the inference backend and the artifact store.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

pub use codehint_local::{ChatMessage, CompletionOptions};

use crate::catalog::ModelConfig;
use crate::error::EngineError;
use crate::status::LoadReport;

/// Raw text fragments as the engine produces them.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, EngineError>> + Send>>;

/// Callback receiving fractional load progress.
pub type ProgressCallback<'a> = &'a (dyn Fn(LoadReport) + Send + Sync);

/// An inference backend able to host one loaded model per handle.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Live reference to a loaded model.
    type Handle: Send + Sync;

    /// Load a model, reporting progress as it goes.
    async fn load(
        &self,
        config: &ModelConfig,
        progress: ProgressCallback<'_>,
    ) -> Result<Self::Handle, EngineError>;

    /// Release a loaded model and everything it holds.
    async fn unload(&self, handle: Self::Handle) -> Result<(), EngineError>;

    /// Start a streamed chat completion.
    async fn create_completion(
        &self,
        handle: &Self::Handle,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<FragmentStream, EngineError>;
}

/// Persistent storage of downloaded model artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Delete every stored artifact.
    async fn clear(&self) -> Result<(), EngineError>;
}
