//! Backend and artifact store over the bundled llama.cpp host.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use codehint_local::{LlamaCppClient, LlamaCppServer, LocalAIError, ModelStore};
use futures_util::StreamExt;
use tracing::{info, warn};

use crate::catalog::ModelConfig;
use crate::config::HintConfig;
use crate::engine::{
    ArtifactStore, Backend, ChatMessage, CompletionOptions, FragmentStream, ProgressCallback,
};
use crate::error::EngineError;
use crate::hinter::CodeHinter;
use crate::status::LoadReport;

/// Share of the load spent fetching weights; the rest is server startup.
const FETCH_SHARE: f64 = 0.9;

/// A running llama-server with a model loaded.
pub struct LocalEngine {
    server: LlamaCppServer,
    client: LlamaCppClient,
}

/// Serves models by downloading GGUF weights and running llama-server.
pub struct LocalBackend {
    store: ModelStore,
    port: u16,
    start_timeout: Duration,
    binary: Option<PathBuf>,
}

impl LocalBackend {
    pub fn new(config: &HintConfig) -> Self {
        Self {
            store: ModelStore::new(),
            port: config.port,
            start_timeout: config.start_timeout,
            binary: None,
        }
    }

    /// Keep weights somewhere other than the default models directory.
    pub fn with_store(mut self, store: ModelStore) -> Self {
        self.store = store;
        self
    }

    /// Use a specific llama-server binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    async fn fetch(
        &self,
        config: &ModelConfig,
        progress: ProgressCallback<'_>,
    ) -> Result<PathBuf, EngineError> {
        if let Some(path) = self.store.get_model_path(&config.model_file) {
            progress(LoadReport::new(FETCH_SHARE, format!("Found {}", config.model_file)));
            return Ok(path);
        }

        let info = config.artifact();
        let label = format!("Fetching {}", config.model_file);
        let path = self
            .store
            .download(&info, |done, total| {
                if let Some(total) = total.filter(|t| *t > 0) {
                    let fraction = done as f64 / total as f64;
                    progress(LoadReport::new(fraction * FETCH_SHARE, label.clone()));
                }
            })
            .await
            .map_err(|e| fetch_failure(config, e))?;
        Ok(path)
    }
}

/// Point the user at a manual install when the weights cannot be fetched.
fn fetch_failure(config: &ModelConfig, error: LocalAIError) -> EngineError {
    match error {
        LocalAIError::DownloadFailed(reason) => {
            warn!("Download of {} failed: {}", config.model_file, reason);
            EngineError::Message(format!(
                "could not fetch {} ({}); install it with `codehint pull --path <file>` \
                 using that file name",
                config.model_file, reason
            ))
        }
        other => other.into(),
    }
}

#[async_trait]
impl Backend for LocalBackend {
    type Handle = LocalEngine;

    async fn load(
        &self,
        config: &ModelConfig,
        progress: ProgressCallback<'_>,
    ) -> Result<LocalEngine, EngineError> {
        let weights = self.fetch(config, progress).await?;

        progress(LoadReport::new(FETCH_SHARE, "Starting llama-server"));
        let mut server = LlamaCppServer::new(weights).with_port(self.port);
        if let Some(binary) = &self.binary {
            server = server.with_binary(binary);
        }
        server.start()?;

        if let Err(e) = server.wait_ready(self.start_timeout).await {
            warn!("llama-server did not come up: {}", e);
            let _ = server.shutdown().await;
            return Err(e.into());
        }

        progress(LoadReport::new(1.0, "Model ready"));
        let client = server.client();
        Ok(LocalEngine { server, client })
    }

    async fn unload(&self, mut handle: LocalEngine) -> Result<(), EngineError> {
        info!("Stopping engine for {:?}", handle.server.model());
        handle.server.shutdown().await?;
        Ok(())
    }

    async fn create_completion(
        &self,
        handle: &LocalEngine,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<FragmentStream, EngineError> {
        let stream = handle.client.stream_chat(messages, options).await?;
        Ok(Box::pin(stream.map(|fragment| fragment.map_err(EngineError::from))))
    }
}

#[async_trait]
impl ArtifactStore for ModelStore {
    async fn clear(&self) -> Result<(), EngineError> {
        ModelStore::clear(self)?;
        Ok(())
    }
}

impl CodeHinter<LocalBackend, ModelStore> {
    /// A hinter running models through llama-server under the data directory.
    pub fn local(config: HintConfig) -> Self {
        let backend = LocalBackend::new(&config);
        Self::new(backend, ModelStore::new(), config)
    }

    /// Same as [`Self::local`], with weights kept under `models_dir`.
    pub fn local_in(config: HintConfig, models_dir: impl Into<PathBuf>) -> Self {
        let models_dir = models_dir.into();
        let backend = LocalBackend::new(&config).with_store(ModelStore::with_root(&models_dir));
        Self::new(backend, ModelStore::with_root(models_dir), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ModelState;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_clear_as_artifact_store() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("m.gguf"), b"w").unwrap();
        let store = ModelStore::with_root(dir.path());

        ArtifactStore::clear(&store).await.unwrap();
        assert!(store.list_installed().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_server_binary_fails_load() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("m.gguf"), b"w").unwrap();

        let config = HintConfig::default();
        let backend = LocalBackend::new(&config)
            .with_store(ModelStore::with_root(dir.path()))
            .with_binary(dir.path().join("no-such-llama-server"));
        let hinter = CodeHinter::new(backend, ModelStore::with_root(dir.path()), config);

        hinter
            .load_model(&ModelConfig::new("org/repo", "m", "m.gguf"))
            .await;

        let status = hinter.status();
        assert_eq!(status.state(), ModelState::Error);
        assert!(status
            .error
            .unwrap()
            .contains("llama-server binary not found"));
    }

    #[test]
    fn test_download_failure_suggests_manual_install() {
        let config = ModelConfig::new("org/repo", "m", "m-Q8_0.gguf");

        let message = fetch_failure(
            &config,
            LocalAIError::DownloadFailed("HTTP 404 Not Found".to_string()),
        )
        .to_string();
        assert!(message.contains("m-Q8_0.gguf"));
        assert!(message.contains("HTTP 404"));
        assert!(message.contains("pull --path"));

        let other = fetch_failure(&config, LocalAIError::ServerStartTimeout);
        assert!(matches!(other, EngineError::Local(LocalAIError::ServerStartTimeout)));
    }

    #[tokio::test]
    async fn test_clear_cache_on_local_hinter() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("m.gguf"), b"w").unwrap();
        let hinter = CodeHinter::local_in(HintConfig::default(), dir.path());

        hinter.clear_cache().await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
