//! Service configuration from environment variables.

use std::path::PathBuf;

use phenoguard_core::db::{Database, DbResult};
use phenoguard_core::phenotype::{ExtractorConfig, DEFAULT_NEGATION_WINDOW, SCI_MODEL};
use phenoguard_vlm::VlmProvider;
use serde::{Deserialize, Serialize};

/// Default port for the phenotype NLP service.
pub const DEFAULT_NLP_PORT: u16 = 8000;

/// Default port for the governance auditor.
pub const DEFAULT_AUDITOR_PORT: u16 = 8001;

/// Runtime configuration shared by both services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,

    pub nlp_model: String,
    pub negation_window: usize,
    /// Findings database file; in-memory when unset
    pub db_path: Option<PathBuf>,

    pub vlm_provider: VlmProvider,
    pub vlm_api_key: Option<String>,
}

impl ServiceConfig {
    pub fn new(port: u16) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port,

            nlp_model: SCI_MODEL.to_string(),
            negation_window: DEFAULT_NEGATION_WINDOW,
            db_path: None,

            vlm_provider: VlmProvider::default(),
            vlm_api_key: None,
        }
    }

    /// Read `PHENOGUARD_*` and `VLM_*` variables over the defaults.
    pub fn from_env(default_port: u16) -> Self {
        Self::from_lookup(default_port, |key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable values keep the default.
    pub fn from_lookup<F>(default_port: u16, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(default_port);

        if let Some(host) = lookup("PHENOGUARD_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PHENOGUARD_PORT").and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        if let Some(model) = lookup("PHENOGUARD_NLP_MODEL") {
            config.nlp_model = model;
        }
        if let Some(window) = lookup("PHENOGUARD_NEGATION_WINDOW").and_then(|w| w.parse().ok()) {
            config.negation_window = window;
        }
        if let Some(path) = lookup("PHENOGUARD_DB_PATH").filter(|p| !p.is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(provider) = lookup("VLM_PROVIDER") {
            match VlmProvider::parse(&provider) {
                Some(p) => config.vlm_provider = p,
                None => tracing::warn!(%provider, "Unknown VLM_PROVIDER, using default"),
            }
        }
        if let Some(key) = lookup("VLM_API_KEY") {
            config.vlm_api_key = Some(key);
        }

        config
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig::default()
            .with_model(self.nlp_model.clone())
            .with_negation_window(self.negation_window)
    }

    pub fn open_database(&self) -> DbResult<Database> {
        match &self.db_path {
            Some(path) => Database::open(path),
            None => Database::open_in_memory(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NLP_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(DEFAULT_AUDITOR_PORT, lookup_from(&[]));
        assert_eq!(config.bind_addr(), "0.0.0.0:8001");
        assert_eq!(config.nlp_model, "en_core_sci_md");
        assert_eq!(config.negation_window, 6);
        assert!(config.db_path.is_none());
        assert_eq!(config.vlm_provider, VlmProvider::OpenAiGpt4v);
        assert!(config.vlm_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(
            DEFAULT_NLP_PORT,
            lookup_from(&[
                ("PHENOGUARD_HOST", "127.0.0.1"),
                ("PHENOGUARD_PORT", "9100"),
                ("PHENOGUARD_NLP_MODEL", "en_core_web_sm"),
                ("PHENOGUARD_NEGATION_WINDOW", "5"),
                ("PHENOGUARD_DB_PATH", "/var/lib/phenoguard/findings.db"),
                ("VLM_PROVIDER", "llava-v1.6-34b"),
                ("VLM_API_KEY", "secret"),
            ]),
        );
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
        assert_eq!(config.extractor_config().model_name, "en_core_web_sm");
        assert_eq!(config.extractor_config().negation_window, 5);
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/phenoguard/findings.db"))
        );
        assert_eq!(config.vlm_provider, VlmProvider::LlavaNext);
        assert_eq!(config.vlm_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ServiceConfig::from_lookup(
            DEFAULT_NLP_PORT,
            lookup_from(&[
                ("PHENOGUARD_PORT", "not-a-port"),
                ("PHENOGUARD_NEGATION_WINDOW", "-1"),
                ("VLM_PROVIDER", "gpt-5"),
            ]),
        );
        assert_eq!(config.port, 8000);
        assert_eq!(config.negation_window, 6);
        assert_eq!(config.vlm_provider, VlmProvider::OpenAiGpt4v);
    }

    #[test]
    fn test_open_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::default();
        assert!(config.open_database().is_ok());

        config.db_path = Some(dir.path().join("findings.db"));
        assert!(config.open_database().is_ok());
        assert!(dir.path().join("findings.db").exists());
    }
}
