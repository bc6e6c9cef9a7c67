//! On-disk store for downloaded model weights.

use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::LocalAIError;
use crate::paths::models_dir;

/// Extension of model weight files.
const MODEL_EXT: &str = "gguf";

/// Extension of in-flight downloads.
const PARTIAL_EXT: &str = "part";

/// A downloadable weights file.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Display name of the model.
    pub name: String,
    /// Filename on disk.
    pub filename: String,
    /// Download URL.
    pub url: String,
    /// Expected SHA256 checksum (optional).
    pub sha256: Option<String>,
    /// Size in bytes, used when the server sends no content length.
    pub size_bytes: Option<u64>,
}

/// Store for downloading, listing and purging model weights.
pub struct ModelStore {
    client: reqwest::Client,
    root: PathBuf,
}

impl ModelStore {
    /// Create a store over the default models directory.
    pub fn new() -> Self {
        Self::with_root(models_dir())
    }

    /// Create a store over a custom directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            root: root.into(),
        }
    }

    /// Directory holding the weights.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a weights file lives at, installed or not.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// List all installed models, by file stem.
    pub fn list_installed(&self) -> Result<Vec<String>, LocalAIError> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut models: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .map(|ext| ext == MODEL_EXT)
                    .unwrap_or(false)
            })
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|s| s.trim_end_matches(".gguf").to_string())
            })
            .collect();
        models.sort();

        Ok(models)
    }

    /// Check if a model is installed.
    pub fn is_installed(&self, filename: &str) -> bool {
        self.path_for(filename).is_file()
    }

    /// Get the path to an installed model.
    pub fn get_model_path(&self, filename: &str) -> Option<PathBuf> {
        let path = self.path_for(filename);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }

    /// Download a model, calling `progress(downloaded, total)` per chunk.
    ///
    /// Bytes land in `<filename>.part` and are renamed into place once the
    /// download (and checksum, when known) succeeds.
    pub async fn download<F>(&self, model: &ModelInfo, mut progress: F) -> Result<PathBuf, LocalAIError>
    where
        F: FnMut(u64, Option<u64>),
    {
        fs::create_dir_all(&self.root)?;

        let dest_path = self.path_for(&model.filename);
        let part_path = self.root.join(format!("{}.{}", model.filename, PARTIAL_EXT));

        info!("Downloading model '{}' to {:?}", model.name, dest_path);

        let response = self
            .client
            .get(&model.url)
            .send()
            .await
            .map_err(|e| LocalAIError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocalAIError::DownloadFailed(format!(
                "HTTP {}: {}",
                response.status(),
                model.url
            )));
        }

        let total_size = response.content_length().or(model.size_bytes);

        let mut file = File::create(&part_path)?;
        let mut hasher = Sha256::new();
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        progress(0, total_size);

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = fs::remove_file(&part_path);
                    return Err(LocalAIError::DownloadFailed(e.to_string()));
                }
            };
            file.write_all(&chunk)?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
            progress(downloaded, total_size);
        }
        file.flush()?;
        drop(file);

        if let Some(expected) = &model.sha256 {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                let _ = fs::remove_file(&part_path);
                return Err(LocalAIError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!("Checksum verified: {}", actual);
        }

        fs::rename(&part_path, &dest_path)?;
        info!("Model '{}' downloaded ({} bytes)", model.name, downloaded);
        Ok(dest_path)
    }

    /// Install a model from a local file path.
    pub fn install_from_path(&self, source: &Path) -> Result<PathBuf, LocalAIError> {
        fs::create_dir_all(&self.root)?;

        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| LocalAIError::ModelNotFound("Invalid path".to_string()))?;

        if !source.is_file() {
            return Err(LocalAIError::ModelNotFound(source.display().to_string()));
        }

        let dest_path = self.path_for(filename);

        if source == dest_path {
            // Already in the right place
            return Ok(dest_path);
        }

        info!("Installing model from {:?} to {:?}", source, dest_path);
        fs::copy(source, &dest_path)?;

        Ok(dest_path)
    }

    /// Remove an installed model.
    pub fn remove(&self, filename: &str) -> Result<(), LocalAIError> {
        let path = self.path_for(filename);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Removed model: {}", filename);
        }
        Ok(())
    }

    /// Delete everything under the models directory, keeping the directory.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self) -> Result<usize, LocalAIError> {
        if !self.root.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            debug!("Deleted {:?}", path);
            removed += 1;
        }

        info!("Cleared {} entries from {:?}", removed, self.root);
        Ok(removed)
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}
