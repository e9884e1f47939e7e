//! Service configuration from an optional JSON file plus environment overrides

use crate::contact_engine::EngineConfig;
use crate::error::{EngineError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub openai_api_key: Option<String>,
    pub engine: EngineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8002".to_string(),
            openai_api_key: None,
            engine: EngineConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `CRM_DEDUP_CONFIG` (a JSON file) when set,
    /// then applies individual variables on top.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("CRM_DEDUP_CONFIG") {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                serde_json::from_str(&content)?
            }
            None => ServiceConfig::default(),
        };

        if let Some(bind) = lookup("CRM_DEDUP_BIND") {
            config.bind_addr = bind;
        }
        if let Some(threshold) = lookup("CRM_DEDUP_THRESHOLD") {
            config.engine.default_threshold = parse_var("CRM_DEDUP_THRESHOLD", &threshold)?;
        }
        if let Some(enabled) = lookup("CRM_DEDUP_AI_ENABLED") {
            config.engine.ai_review_enabled = parse_var("CRM_DEDUP_AI_ENABLED", &enabled)?;
        }
        if let Some(secs) = lookup("AI_TIMEOUT_SECS") {
            config.engine.ai_timeout_secs = parse_var("AI_TIMEOUT_SECS", &secs)?;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            config.engine.ai_model = model;
        }
        if let Some(base) = lookup("OPENAI_API_BASE") {
            config.engine.ai_api_base = base;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            config.openai_api_key = Some(key);
        }

        Ok(config)
    }

    /// AI review runs only with a key and without the flag turned off.
    pub fn ai_review_available(&self) -> bool {
        self.engine.ai_review_enabled && self.openai_api_key.is_some()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| EngineError::Config(format!("invalid value for {}: {:?}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8002");
        assert_eq!(config.engine.default_threshold, 0.8);
        assert!(!config.ai_review_available());
    }

    #[test]
    fn test_env_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("CRM_DEDUP_BIND", "127.0.0.1:9000"),
            ("CRM_DEDUP_THRESHOLD", "0.65"),
            ("AI_TIMEOUT_SECS", "3"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.engine.default_threshold, 0.65);
        assert_eq!(config.engine.ai_timeout_secs, 3);
        assert_eq!(config.engine.ai_model, "gpt-4o");
        assert!(config.ai_review_available());
    }

    #[test]
    fn test_ai_flag_disables_review() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("CRM_DEDUP_AI_ENABLED", "false"),
        ]))
        .unwrap();
        assert!(!config.ai_review_available());
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let config = ServiceConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = ServiceConfig::from_lookup(lookup(&[("CRM_DEDUP_THRESHOLD", "high")])).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_partial_json_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("crm-dedup-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"bind_addr": "0.0.0.0:7000", "engine": {"normalization": "weighted_sum"}}"#).unwrap();

        let config = ServiceConfig::from_lookup(lookup(&[("CRM_DEDUP_CONFIG", path.to_str().unwrap())])).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:7000");
        assert_eq!(
            config.engine.normalization,
            crate::contact_engine::scorer::ScoreNormalization::WeightedSum
        );
        assert_eq!(config.engine.default_threshold, 0.8);
    }
}
