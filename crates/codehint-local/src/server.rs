//! Process manager for llama-server.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::LlamaCppClient;
use crate::error::LocalAIError;
use crate::paths::llama_server_path;
use crate::{DEFAULT_CTX_SIZE, DEFAULT_PORT};

/// How long a terminated server gets to exit before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Manager for one llama-server process serving one model file.
pub struct LlamaCppServer {
    port: u16,
    binary: PathBuf,
    model: PathBuf,
    process: Option<Child>,
}

impl LlamaCppServer {
    /// Create a new server manager for a model file with default settings.
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            port: DEFAULT_PORT,
            binary: llama_server_path(),
            model: model.into(),
            process: None,
        }
    }

    /// Set a custom port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use a llama-server binary other than the one under the data directory.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Get the port this server is configured to use.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Model file this server was created for.
    pub fn model(&self) -> &Path {
        &self.model
    }

    /// Check if the server binary exists.
    pub fn binary_exists(&self) -> bool {
        self.binary.exists()
    }

    /// Start the llama-server process.
    pub fn start(&mut self) -> Result<(), LocalAIError> {
        if !self.binary.exists() {
            return Err(LocalAIError::ServerBinaryNotFound(
                self.binary.display().to_string(),
            ));
        }

        if !self.model.is_file() {
            return Err(LocalAIError::ModelNotFound(self.model.display().to_string()));
        }

        info!(
            "Starting llama-server on port {} with model {:?}",
            self.port, self.model
        );

        let child = Command::new(&self.binary)
            .arg("--model")
            .arg(&self.model)
            .arg("--host")
            .arg("127.0.0.1")
            .arg("--port")
            .arg(self.port.to_string())
            .arg("--ctx-size")
            .arg(DEFAULT_CTX_SIZE.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LocalAIError::ServerStartFailed(e.to_string()))?;

        debug!("llama-server process started with PID: {}", child.id());
        self.process = Some(child);

        Ok(())
    }

    /// Wait for the server to answer its health check.
    ///
    /// Fails early if the process exits while we wait.
    pub async fn wait_ready(&mut self, timeout: Duration) -> Result<(), LocalAIError> {
        let client = self.client();
        let start = Instant::now();
        let check_interval = Duration::from_millis(500);

        info!("Waiting for llama-server to become ready...");

        while start.elapsed() < timeout {
            match client.check_health().await {
                Ok(()) => {
                    info!("llama-server is ready");
                    return Ok(());
                }
                Err(_) => {
                    if let Some(child) = self.process.as_mut() {
                        if let Ok(Some(status)) = child.try_wait() {
                            self.process = None;
                            return Err(LocalAIError::ServerStartFailed(format!(
                                "llama-server exited during startup ({})",
                                status
                            )));
                        }
                    }
                    sleep(check_interval).await;
                }
            }
        }

        Err(LocalAIError::ServerStartTimeout)
    }

    /// Stop the server, giving it a grace period without blocking the runtime.
    pub async fn shutdown(&mut self) -> Result<(), LocalAIError> {
        let Some(mut child) = self.process.take() else {
            return Ok(());
        };
        info!("Stopping llama-server (PID: {})", child.id());
        terminate(&child);

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        loop {
            match child.try_wait()? {
                Some(status) => {
                    debug!("Server exited with status: {:?}", status);
                    return Ok(());
                }
                None if Instant::now() >= deadline => {
                    warn!("Server didn't exit gracefully, killing...");
                    child.kill()?;
                    child.wait()?;
                    return Ok(());
                }
                None => sleep(Duration::from_millis(50)).await,
            }
        }
    }

    /// Stop the server process from a synchronous context.
    pub fn stop(&mut self) -> Result<(), LocalAIError> {
        if let Some(mut child) = self.process.take() {
            info!("Stopping llama-server (PID: {})", child.id());
            terminate(&child);
            // Give it a moment to shut down gracefully
            #[cfg(unix)]
            {
                std::thread::sleep(SHUTDOWN_GRACE);
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Server exited with status: {:?}", status);
                }
                Ok(None) => {
                    warn!("Server didn't exit gracefully, killing...");
                    let _ = child.kill();
                    let _ = child.wait();
                }
                Err(e) => {
                    warn!("Error checking server status: {}", e);
                    let _ = child.kill();
                }
            }
        }
        Ok(())
    }

    /// Check if the server process is running.
    pub fn is_running(&mut self) -> bool {
        if let Some(ref mut child) = self.process {
            match child.try_wait() {
                Ok(Some(_)) => {
                    self.process = None;
                    false
                }
                Ok(None) => true,
                Err(_) => false,
            }
        } else {
            false
        }
    }

    /// Get a client connected to this server.
    pub fn client(&self) -> LlamaCppClient {
        LlamaCppClient::with_port(self.port)
    }
}

/// Ask the process to exit. Windows has no SIGTERM; the caller kills after the grace period.
fn terminate(child: &Child) {
    #[cfg(unix)]
    {
        unsafe {
            libc::kill(child.id() as i32, libc::SIGTERM);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child;
    }
}

impl Drop for LlamaCppServer {
    fn drop(&mut self) {
        if self.process.is_some() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config() {
        let server = LlamaCppServer::new("/tmp/test-model.gguf").with_port(9999);
        assert_eq!(server.port(), 9999);
        assert_eq!(server.model(), Path::new("/tmp/test-model.gguf"));
    }

    #[test]
    fn test_start_without_binary() {
        let mut server = LlamaCppServer::new("/tmp/test-model.gguf")
            .with_binary("/nonexistent/llama-server");
        assert!(!server.binary_exists());
        assert!(matches!(
            server.start(),
            Err(LocalAIError::ServerBinaryNotFound(_))
        ));
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_without_process() {
        let mut server = LlamaCppServer::new("/tmp/test-model.gguf");
        server.shutdown().await.unwrap();
    }
}
