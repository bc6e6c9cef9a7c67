//! Loadable models.

use codehint_local::ModelInfo;
use serde::Serialize;

/// Identifies a loadable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelConfig {
    /// Hugging Face repository the weights are published in.
    pub repo: String,
    /// Id used to pick the model.
    pub model_id: String,
    /// Weights file inside the repository.
    pub model_file: String,
}

impl ModelConfig {
    pub fn new(
        repo: impl Into<String>,
        model_id: impl Into<String>,
        model_file: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            model_id: model_id.into(),
            model_file: model_file.into(),
        }
    }

    /// Direct download URL of the weights file.
    pub fn download_url(&self) -> String {
        format!(
            "https://huggingface.co/{}/resolve/main/{}",
            self.repo, self.model_file
        )
    }

    /// The weights file as a downloadable artifact.
    pub fn artifact(&self) -> ModelInfo {
        ModelInfo {
            name: self.model_id.clone(),
            filename: self.model_file.clone(),
            url: self.download_url(),
            sha256: None,
            size_bytes: None,
        }
    }
}

/// The fine-tuned code-hint models, smallest first.
///
/// Entries name the Q8_0 GGUF builds expected under each Hugging Face repo.
/// A build that is not published there fails to download; convert the
/// weights yourself and install the file under the listed `model_file`
/// name with `codehint pull --path`.
pub fn available_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig::new(
            "simonguest/Qwen3-0.6B-code-hint-3-GGUF",
            "Qwen3-0.6B-it-code-hint-3",
            "Qwen3-0.6B-code-hint-3-Q8_0.gguf",
        ),
        ModelConfig::new(
            "simonguest/Qwen3-1.7B-code-hint-3-GGUF",
            "Qwen3-1.7B-it-code-hint-3",
            "Qwen3-1.7B-code-hint-3-Q8_0.gguf",
        ),
    ]
}

/// Look a model up by id, case-insensitively.
pub fn find_model(model_id: &str) -> Option<ModelConfig> {
    available_models()
        .into_iter()
        .find(|m| m.model_id.eq_ignore_ascii_case(model_id))
}

/// The model used when none is named.
pub fn default_model() -> ModelConfig {
    // The catalogue is a non-empty literal.
    available_models().swap_remove(0)
}
