//! Hint generation configuration.

use std::time::Duration;

use codehint_local::DEFAULT_PORT;

/// Marker opening a reasoning block in model output.
pub const THINK_START: &str = "<think>";

/// Marker closing a reasoning block in model output.
pub const THINK_END: &str = "</think>";

/// Configuration for loading models and generating hints.
#[derive(Debug, Clone)]
pub struct HintConfig {
    /// Sampling temperature (default: 0.7)
    pub temperature: f32,
    /// Maximum tokens in a hint (default: 256)
    pub max_tokens: u32,
    /// Port the local llama-server listens on
    pub port: u16,
    /// How long to wait for llama-server to become healthy
    pub start_timeout: Duration,
    /// Marker pair delimiting reasoning output
    pub think_start: String,
    pub think_end: String,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 256,
            port: DEFAULT_PORT,
            start_timeout: Duration::from_secs(120),
            think_start: THINK_START.to_string(),
            think_end: THINK_END.to_string(),
        }
    }
}

impl HintConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let temperature = std::env::var("CODEHINT_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.temperature);

        let max_tokens = std::env::var("CODEHINT_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_tokens);

        let port = std::env::var("CODEHINT_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let start_timeout = std::env::var("CODEHINT_START_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.start_timeout);

        Self {
            temperature,
            max_tokens,
            port,
            start_timeout,
            ..defaults
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> HintConfigBuilder {
        HintConfigBuilder::default()
    }
}

/// Builder for hint configuration.
#[derive(Debug, Default)]
pub struct HintConfigBuilder {
    config: HintConfig,
}

impl HintConfigBuilder {
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.config.start_timeout = timeout;
        self
    }

    pub fn think_markers(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.config.think_start = start.into();
        self.config.think_end = end.into();
        self
    }

    pub fn build(self) -> HintConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HintConfig::default();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.think_start, "<think>");
        assert_eq!(config.think_end, "</think>");
    }

    #[test]
    fn test_builder() {
        let config = HintConfig::builder()
            .temperature(0.2)
            .max_tokens(64)
            .port(9000)
            .think_markers("[r]", "[/r]")
            .build();
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.port, 9000);
        assert_eq!(config.think_start, "[r]");
    }
}
