//! Model lifecycle: load, unload and cache purge around a single engine slot.

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::catalog::ModelConfig;
use crate::engine::{ArtifactStore, Backend, ChatMessage, CompletionOptions, FragmentStream};
use crate::error::{EngineError, HintError};
use crate::status::{LoadProgress, LoadReport, ModelStatus, StatusBoard};

/// Owns at most one loaded engine and the status record describing it.
///
/// The engine handle never leaves the manager. Loads are serialized by the
/// status record itself: a load requested while another is in flight is
/// dropped, not queued.
pub struct ModelLifecycleManager<B: Backend, S: ArtifactStore> {
    backend: B,
    store: S,
    engine: Mutex<Option<B::Handle>>,
    status: StatusBoard,
}

impl<B: Backend, S: ArtifactStore> ModelLifecycleManager<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self {
            backend,
            store,
            engine: Mutex::new(None),
            status: StatusBoard::new(),
        }
    }

    /// Latest status.
    pub fn status(&self) -> ModelStatus {
        self.status.snapshot()
    }

    /// Receiver woken on every status change.
    pub fn subscribe(&self) -> watch::Receiver<ModelStatus> {
        self.status.subscribe()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a model, replacing the current one.
    ///
    /// The outcome is reported through [`Self::status`]: `ready` on success,
    /// `error` holding the failure message otherwise. A call made while a
    /// load is in flight returns immediately and changes nothing.
    pub async fn load(&self, config: &ModelConfig) {
        if !self.status.begin_load() {
            debug!("Ignoring load of {}: a load is in flight", config.model_id);
            return;
        }

        let mut engine = self.engine.lock().await;

        if let Some(previous) = engine.take() {
            info!("Unloading previous model...");
            if let Err(e) = self.backend.unload(previous).await {
                error!("Failed to unload previous model: {}", e);
                self.status
                    .mark_failed(format!("failed to unload previous model: {}", e));
                return;
            }
        }

        info!("Loading model {} from {}", config.model_id, config.repo);

        let on_progress = |report: LoadReport| {
            let progress = LoadProgress::from(&report);
            debug!("{} - {}%", progress.label, progress.percentage);
            self.status.record_progress(progress.percentage);
        };

        match self.backend.load(config, &on_progress).await {
            Ok(handle) => {
                *engine = Some(handle);
                self.status.mark_ready();
                info!("Model {} loaded", config.model_id);
            }
            Err(e) => {
                error!("Failed to load model {}: {}", config.model_id, e);
                self.status.mark_failed(failure_message(&e));
            }
        }
    }

    /// Tear down the loaded engine, if any.
    pub async fn unload(&self) -> Result<(), EngineError> {
        let mut engine = self.engine.lock().await;
        self.release(&mut engine).await
    }

    /// Unload the engine, then delete every stored artifact.
    ///
    /// The engine goes first so nothing still maps the files being deleted.
    /// The engine slot stays locked until the purge is over, so a load
    /// requested meanwhile waits and then fetches fresh weights. On success
    /// the status returns to idle unless such a load has already claimed it.
    /// A store failure leaves the engine unloaded.
    pub async fn clear_cache(&self) -> Result<(), HintError> {
        if self.status.is_loading() {
            return Err(HintError::LoadInProgress);
        }

        let mut engine = self.engine.lock().await;
        // A load may have claimed the slot while the lock was contended.
        if self.status.is_loading() {
            return Err(HintError::LoadInProgress);
        }

        info!("Clearing model cache...");
        self.release(&mut engine).await.map_err(HintError::Unload)?;
        self.store.clear().await.map_err(|e| {
            warn!("Error clearing cache: {}", e);
            HintError::CacheClear(e)
        })?;

        if !self.status.reset() {
            debug!("Status left to the load queued behind the purge");
        }
        info!("Model cache cleared");
        Ok(())
    }

    async fn release(&self, engine: &mut Option<B::Handle>) -> Result<(), EngineError> {
        let Some(handle) = engine.take() else {
            return Ok(());
        };

        info!("Unloading current model...");
        let result = self.backend.unload(handle).await;
        // The handle is gone either way.
        self.status.mark_unloaded();
        result
    }

    /// Start a completion on the loaded engine.
    ///
    /// Fails with [`HintError::NotReady`] without touching the backend when
    /// no model is ready.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<FragmentStream, HintError> {
        if !self.status.is_ready() {
            return Err(HintError::NotReady);
        }

        let engine = self.engine.lock().await;
        let handle = engine.as_ref().ok_or(HintError::NotReady)?;
        self.backend
            .create_completion(handle, messages, options)
            .await
            .map_err(HintError::Stream)
    }
}

fn failure_message(error: &EngineError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        "Failed to load model".to_string()
    } else {
        message
    }
}
