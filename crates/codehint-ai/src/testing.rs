//! Scripted backend and store for exercising the lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::Notify;

use crate::catalog::ModelConfig;
use crate::engine::{
    ArtifactStore, Backend, ChatMessage, CompletionOptions, FragmentStream, ProgressCallback,
};
use crate::error::EngineError;
use crate::status::LoadReport;

pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn model(id: &str) -> ModelConfig {
    ModelConfig::new(format!("test/{}", id), id, format!("{}.gguf", id))
}

pub(crate) struct MockHandle {
    id: String,
}

/// Backend counting live handles. Model ids select failures:
/// `broken` fails with a message, `raw` with a bare value.
pub(crate) struct MockBackend {
    pub(crate) events: EventLog,
    live: AtomicUsize,
    max_live: AtomicUsize,
    completions: AtomicUsize,
    loaded: Mutex<Vec<String>>,
    progress: Vec<f64>,
    gate: Option<Arc<Notify>>,
    script: Vec<Result<&'static str, &'static str>>,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            live: AtomicUsize::new(0),
            max_live: AtomicUsize::new(0),
            completions: AtomicUsize::new(0),
            loaded: Mutex::new(Vec::new()),
            progress: vec![0.5],
            gate: None,
            script: Vec::new(),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// Report these fractions during every load.
    pub(crate) fn with_progress(mut self, steps: &[f64]) -> Self {
        self.progress = steps.to_vec();
        self
    }

    /// Block every load after its progress reports until notified.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fragments every completion yields; `Err` items fail the stream.
    pub(crate) fn with_script(mut self, script: Vec<Result<&'static str, &'static str>>) -> Self {
        self.script = script;
        self
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub(crate) fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub(crate) fn loaded_ids(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }

    fn log(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Backend for MockBackend {
    type Handle = MockHandle;

    async fn load(
        &self,
        config: &ModelConfig,
        progress: ProgressCallback<'_>,
    ) -> Result<MockHandle, EngineError> {
        self.log(format!("load {}", config.model_id));
        for step in &self.progress {
            progress(LoadReport::new(*step, "fetching"));
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match config.model_id.as_str() {
            "broken" => return Err(EngineError::Message("weights missing".to_string())),
            "raw" => return Err(EngineError::Unknown("42".to_string())),
            _ => {}
        }

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        self.loaded.lock().unwrap().push(config.model_id.clone());
        Ok(MockHandle {
            id: config.model_id.clone(),
        })
    }

    async fn unload(&self, handle: MockHandle) -> Result<(), EngineError> {
        self.log(format!("unload {}", handle.id));
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.loaded.lock().unwrap().retain(|id| *id != handle.id);
        Ok(())
    }

    async fn create_completion(
        &self,
        _handle: &MockHandle,
        messages: &[ChatMessage],
        _options: CompletionOptions,
    ) -> Result<FragmentStream, EngineError> {
        self.completions.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();

        let fragments: Vec<Result<String, EngineError>> = self
            .script
            .iter()
            .map(|item| match item {
                Ok(text) => Ok(text.to_string()),
                Err(msg) => Err(EngineError::Message(msg.to_string())),
            })
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

/// Store logging `clear` into the backend's event log.
pub(crate) struct MockStore {
    events: EventLog,
    fail: bool,
    gate: Option<Arc<Notify>>,
}

impl MockStore {
    pub(crate) fn new(events: EventLog) -> Self {
        Self {
            events,
            fail: false,
            gate: None,
        }
    }

    pub(crate) fn failing(events: EventLog) -> Self {
        Self {
            events,
            fail: true,
            gate: None,
        }
    }

    /// Block every purge after logging it until notified.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl ArtifactStore for MockStore {
    async fn clear(&self) -> Result<(), EngineError> {
        self.events.lock().unwrap().push("clear".to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            Err(EngineError::Message("disk busy".to_string()))
        } else {
            Ok(())
        }
    }
}
