//! The code-hint controller: model lifecycle plus streamed hint generation.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::catalog::ModelConfig;
use crate::config::HintConfig;
use crate::engine::{ArtifactStore, Backend, CompletionOptions};
use crate::error::HintError;
use crate::lifecycle::ModelLifecycleManager;
use crate::prompt::HintRequest;
use crate::sanitizer::{FragmentSink, HintStreamSanitizer};
use crate::status::ModelStatus;

/// Generates hints for highlighted code with a locally loaded model.
pub struct CodeHinter<B: Backend, S: ArtifactStore> {
    config: HintConfig,
    models: ModelLifecycleManager<B, S>,
}

impl<B: Backend, S: ArtifactStore> CodeHinter<B, S> {
    pub fn new(backend: B, store: S, config: HintConfig) -> Self {
        Self {
            config,
            models: ModelLifecycleManager::new(backend, store),
        }
    }

    pub fn config(&self) -> &HintConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelLifecycleManager<B, S> {
        &self.models
    }

    /// Latest model status.
    pub fn status(&self) -> ModelStatus {
        self.models.status()
    }

    /// Receiver woken on every model status change.
    pub fn subscribe(&self) -> watch::Receiver<ModelStatus> {
        self.models.subscribe()
    }

    /// Load a model. Settles through [`Self::status`].
    pub async fn load_model(&self, model: &ModelConfig) {
        self.models.load(model).await;
    }

    /// Generate a hint for `highlighted` within `code`.
    pub async fn generate_hint(&self, code: &str, highlighted: &str) -> Result<String, HintError> {
        self.hint(code, highlighted, None).await
    }

    /// Like [`Self::generate_hint`], handing each clean fragment to `on_token`
    /// as soon as it is produced.
    pub async fn generate_hint_streaming<F>(
        &self,
        code: &str,
        highlighted: &str,
        mut on_token: F,
    ) -> Result<String, HintError>
    where
        F: FnMut(&str) + Send,
    {
        let sink: FragmentSink<'_> = &mut on_token;
        self.hint(code, highlighted, Some(sink)).await
    }

    /// Unload the model and delete downloaded artifacts.
    pub async fn clear_cache(&self) -> Result<(), HintError> {
        self.models.clear_cache().await
    }

    async fn hint(
        &self,
        code: &str,
        highlighted: &str,
        sink: Option<FragmentSink<'_>>,
    ) -> Result<String, HintError> {
        if !self.models.status().ready {
            return Err(HintError::NotReady);
        }

        let messages = HintRequest::new(code, highlighted).to_messages();
        debug!("Hint request: {:?}", messages);

        let options = CompletionOptions {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let raw = self.models.complete(&messages, options).await?;

        let sanitizer =
            HintStreamSanitizer::with_markers(&self.config.think_start, &self.config.think_end);
        let hint = sanitizer.run(raw, sink).await.map_err(HintError::Stream)?;

        info!("Generated hint ({} chars)", hint.len());
        Ok(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{model, MockBackend, MockStore};

    fn hinter(backend: MockBackend) -> CodeHinter<MockBackend, MockStore> {
        let store = MockStore::new(backend.events.clone());
        CodeHinter::new(backend, store, HintConfig::default())
    }

    #[tokio::test]
    async fn test_not_ready_makes_no_backend_call() {
        let hinter = hinter(MockBackend::new().with_script(vec![Ok("hint")]));

        let result = hinter.generate_hint("x = 1", "x").await;

        assert!(matches!(result, Err(HintError::NotReady)));
        assert_eq!(hinter.models().backend().completions(), 0);
    }

    #[tokio::test]
    async fn test_not_ready_after_failed_load() {
        let hinter = hinter(MockBackend::new());
        hinter.load_model(&model("broken")).await;

        let result = hinter.generate_hint("x = 1", "x").await;
        assert!(matches!(result, Err(HintError::NotReady)));
    }

    #[tokio::test]
    async fn test_generate_hint() {
        let hinter = hinter(MockBackend::new().with_script(vec![
            Ok("<think>"),
            Ok("they forgot the base case"),
            Ok("</think>\n\n"),
            Ok("What does `factorial(0)` return?"),
        ]));
        hinter.load_model(&model("a")).await;

        let hint = hinter
            .generate_hint("def factorial(n):\n    return n * factorial(n - 1)", "factorial(n - 1)")
            .await
            .unwrap();

        assert_eq!(hint, "What does `factorial(0)` return?");
        let messages = hinter.models().backend().last_messages();
        assert_eq!(messages[1].content, "<highlight>\nfactorial(n - 1)\n</highlight>");
    }

    #[tokio::test]
    async fn test_streaming_callback() {
        let hinter = hinter(MockBackend::new().with_script(vec![
            Ok("\n"),
            Ok("Look"),
            Ok(" at"),
            Ok(" line 2."),
        ]));
        hinter.load_model(&model("a")).await;

        let mut tokens = Vec::new();
        let hint = hinter
            .generate_hint_streaming("a\nb", "b", |t| tokens.push(t.to_string()))
            .await
            .unwrap();

        assert_eq!(hint, "Look at line 2.");
        assert_eq!(tokens, vec!["Look", " at", " line 2."]);
    }

    #[tokio::test]
    async fn test_stream_failure_keeps_engine() {
        let hinter = hinter(MockBackend::new().with_script(vec![Ok("Half a "), Err("socket closed")]));
        hinter.load_model(&model("a")).await;

        let result = hinter.generate_hint("code", "code").await;
        match result {
            Err(HintError::Stream(e)) => assert_eq!(e.to_string(), "socket closed"),
            other => panic!("unexpected: {:?}", other),
        }

        // The engine survives a failed stream.
        assert!(hinter.status().ready);
        assert_eq!(hinter.models().backend().live(), 1);
    }

    #[tokio::test]
    async fn test_clear_cache_then_not_ready() {
        let hinter = hinter(MockBackend::new().with_script(vec![Ok("hint")]));
        hinter.load_model(&model("a")).await;
        hinter.clear_cache().await.unwrap();

        let result = hinter.generate_hint("x", "x").await;
        assert!(matches!(result, Err(HintError::NotReady)));
    }
}
