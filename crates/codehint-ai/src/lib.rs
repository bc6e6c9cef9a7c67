//! # Codehint AI
//!
//! This crate drives a locally loaded language model to produce short
//! hints about a highlighted piece of code.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   CodeHinter    │ --> │    Lifecycle    │ --> │     Backend     │
//! │ (load / hint /  │     │    Manager      │     │  (llama-server) │
//! │  clear cache)   │     │  (one engine)   │     └─────────────────┘
//! └─────────────────┘     └─────────────────┘              │
//!          ^                       │                 raw fragments
//!          │                 ┌─────┴─────┐                 │
//!          │                 │ Artifact  │                 v
//!          │                 │   Store   │       ┌─────────────────┐
//!          └──── clean ───── └───────────┘ <---- │    Sanitizer    │
//!               fragments                        └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use codehint_ai::{default_model, CodeHinter, HintConfig};
//!
//! let hinter = CodeHinter::local(HintConfig::from_env());
//! hinter.load_model(&default_model()).await;
//!
//! let hint = hinter
//!     .generate_hint_streaming(code, "factorial(n - 1)", |t| print!("{t}"))
//!     .await?;
//! ```

mod catalog;
mod config;
mod engine;
mod error;
mod hinter;
mod lifecycle;
mod local;
mod prompt;
mod sanitizer;
mod status;

#[cfg(test)]
mod testing;

pub use catalog::{available_models, default_model, find_model, ModelConfig};
pub use config::{HintConfig, HintConfigBuilder, THINK_END, THINK_START};
pub use engine::{
    ArtifactStore, Backend, ChatMessage, CompletionOptions, FragmentStream, ProgressCallback,
};
pub use error::{EngineError, HintError};
pub use hinter::CodeHinter;
pub use lifecycle::ModelLifecycleManager;
pub use local::{LocalBackend, LocalEngine};
pub use prompt::HintRequest;
pub use sanitizer::{FragmentSink, HintStreamSanitizer};
pub use status::{LoadProgress, LoadReport, ModelState, ModelStatus, StatusBoard};

// Re-export local host types
pub use codehint_local::{
    paths as local_ai_paths, LlamaCppServer, LocalAIError, ModelInfo, ModelStore,
    DEFAULT_PORT as DEFAULT_LOCAL_AI_PORT,
};
