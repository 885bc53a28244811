//! Server configuration: optional `vetlens.toml` plus env overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use vetlens_sentiment::config::{ScorerBackend, SentimentConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CSV bundled for the "load sample" buttons.
    pub sample_data: PathBuf,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
    pub scorer: SentimentConfig,
    /// Iterations for `/statistical_test` (chart error bars use fewer).
    pub bootstrap_iterations: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5004,
            sample_data: PathBuf::from("data/sample_data.csv"),
            static_dir: PathBuf::from("static"),
            scorer: SentimentConfig::default(),
            bootstrap_iterations: 10_000,
        }
    }
}

impl ServerConfig {
    /// Load `vetlens.toml` if present (or the file `VETLENS_CONFIG`
    /// points at), then apply env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("VETLENS_CONFIG").unwrap_or_else(|_| "vetlens.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            info!("Loading config from {path}");
            toml::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("VETLENS_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("VETLENS_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
        if let Ok(backend) = std::env::var("VETLENS_BACKEND") {
            match backend.to_lowercase().as_str() {
                "lexicon" => self.scorer.backend = ScorerBackend::Lexicon,
                "bert" => self.scorer.backend = ScorerBackend::Bert,
                other => info!("Ignoring unknown VETLENS_BACKEND value: {other}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_bundled_sample() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5004);
        assert_eq!(config.sample_data, PathBuf::from("data/sample_data.csv"));
        assert_eq!(config.bootstrap_iterations, 10_000);
    }

    #[test]
    fn toml_overrides_parse() {
        let config: ServerConfig = toml::from_str(
            r#"
            port = 8080
            bootstrap_iterations = 500

            [scorer]
            backend = "lexicon"
            max_length = 256
            batch_size = 8
            use_gpu = false
            cache_size = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.scorer.backend, ScorerBackend::Lexicon);
        assert_eq!(config.scorer.batch_size, 8);
        // Unspecified fields keep their defaults.
        assert_eq!(config.host, "127.0.0.1");
    }
}
