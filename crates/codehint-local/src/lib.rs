//! Local llama.cpp host for codehint.
//!
//! This crate owns everything that touches the machine: the data
//! directory, downloaded model weights, the `llama-server` process and
//! the HTTP client used to stream completions out of it.

mod client;
mod error;
mod model;
pub mod paths;
mod server;

pub use client::{ChatMessage, CompletionOptions, FragmentStream, LlamaCppClient};
pub use error::LocalAIError;
pub use model::{ModelInfo, ModelStore};
pub use server::LlamaCppServer;

/// Default port for the local llama-server instance.
pub const DEFAULT_PORT: u16 = 11435;

/// Context size passed to llama-server. Hints are short, prompts are one snippet.
pub const DEFAULT_CTX_SIZE: u32 = 4096;
