//! Model management commands.

use codehint_ai::{
    available_models, default_model, find_model, local_ai_paths, CodeHinter, HintConfig,
    ModelConfig, ModelStore,
};
use indicatif::{ProgressBar, ProgressStyle};
use miette::IntoDiagnostic;
use std::path::Path;

/// Look up a model by id, or take the default.
pub(crate) fn resolve(model_id: Option<&str>) -> miette::Result<ModelConfig> {
    match model_id {
        None => Ok(default_model()),
        Some(id) => find_model(id).ok_or_else(|| {
            let known = available_models()
                .into_iter()
                .map(|m| m.model_id)
                .collect::<Vec<_>>()
                .join(", ");
            miette::miette!("Unknown model '{}'. Available: {}", id, known)
        }),
    }
}

/// List available models and whether they are installed.
pub(crate) fn list(json: bool) -> miette::Result<()> {
    let store = ModelStore::new();
    let models = available_models();

    if json {
        println!("{}", serde_json::to_string_pretty(&models).into_diagnostic()?);
        return Ok(());
    }

    println!("Available models:");
    for model in &models {
        let mark = if store.is_installed(&model.model_file) {
            "installed"
        } else {
            "not installed"
        };
        println!("  - {} ({})", model.model_id, mark);
        println!("      {}", model.repo);
    }

    let installed = store
        .list_installed()
        .map_err(|e| miette::miette!("Failed to list models: {}", e))?;
    let extra: Vec<_> = installed
        .iter()
        .filter(|name| {
            !models
                .iter()
                .any(|m| m.model_file.trim_end_matches(".gguf") == name.as_str())
        })
        .collect();
    if !extra.is_empty() {
        println!();
        println!("Other installed files:");
        for name in extra {
            println!("  - {}.gguf", name);
        }
    }

    println!();
    println!("Models directory: {}", store.root().display());

    Ok(())
}

/// Download a model, or install a local file.
pub(crate) async fn pull(model_id: Option<&str>, path: Option<&Path>) -> miette::Result<()> {
    let store = ModelStore::new();

    // Ensure directories exist
    local_ai_paths::ensure_dirs()
        .map_err(|e| miette::miette!("Failed to create data directories: {}", e))?;

    if let Some(source_path) = path {
        let ext = source_path.extension().and_then(|e| e.to_str());
        if ext != Some("gguf") {
            return Err(miette::miette!(
                "Expected a .gguf file, got: {}",
                source_path.display()
            ));
        }

        println!("Installing model from: {}", source_path.display());
        let dest = store
            .install_from_path(source_path)
            .map_err(|e| miette::miette!("Failed to install model: {}", e))?;

        println!("Model installed to: {}", dest.display());
        return Ok(());
    }

    let model = resolve(model_id)?;
    if store.is_installed(&model.model_file) {
        println!("Model '{}' is already installed.", model.model_id);
        return Ok(());
    }

    println!("Downloading model: {}", model.model_id);
    println!("This may take a while depending on your connection...");
    println!();

    let bytes_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .into_diagnostic()?
        .progress_chars("#>-");
    let pb = ProgressBar::new_spinner();

    let result = store
        .download(&model.artifact(), |done, total| {
            if let Some(total) = total {
                if pb.length() != Some(total) {
                    pb.set_style(bytes_style.clone());
                    pb.set_length(total);
                }
            }
            pb.set_position(done);
        })
        .await;

    match result {
        Ok(path) => {
            pb.finish_with_message("Download complete");
            println!();
            println!("Model downloaded successfully!");
            println!("Location: {}", path.display());
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(miette::miette!("Failed to download model: {}", e))
        }
    }
}

/// Delete all downloaded models.
pub(crate) async fn clear_cache() -> miette::Result<()> {
    let hinter = CodeHinter::local(HintConfig::from_env());

    println!("Clearing {}", local_ai_paths::models_dir().display());
    hinter
        .clear_cache()
        .await
        .map_err(|e| miette::miette!("{}", e))?;
    println!("Model cache cleared.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default() {
        assert_eq!(resolve(None).unwrap(), default_model());
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolve(Some("nope")).unwrap_err();
        assert!(err.to_string().contains("Unknown model 'nope'"));
    }
}
