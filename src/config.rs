//! Session configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! { "system": "propositional", "language_tags": [], "auto_close": true }
//! ```
//!
//! `LARCH_SYSTEM` overrides the formal system after loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::EngineError;

pub const SYSTEM_ENV: &str = "LARCH_SYSTEM";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Formal system, resolved with [`by_name`](crate::by_name).
    pub system: String,
    /// Active lexicon tags; empty means the system's own tags.
    pub language_tags: Vec<String>,
    /// Check closure on the new branches after every manual rule.
    pub auto_close: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { system: "propositional".to_string(), language_tags: Vec::new(), auto_close: true }
    }
}

impl Config {
    pub fn from_json_str(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(EngineError::Config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply `LARCH_SYSTEM` when it is set and not blank.
    pub fn with_env_overrides(self) -> Self {
        self.with_system_override(std::env::var(SYSTEM_ENV).ok())
    }

    fn with_system_override(mut self, system: Option<String>) -> Self {
        if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
            self.system = system.trim().to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = Config::from_json_str(r#"{"auto_close": false, "language_tags": ["propositional"]}"#).unwrap();
        assert!(!config.auto_close);
        assert_eq!(config.language_tags, vec!["propositional".to_string()]);
        assert_eq!(config.system, "propositional");
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        assert!(matches!(Config::from_json_str("{\"auto_close\": 3}"), Err(EngineError::Config(_))));
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = Config::default().with_system_override(Some("  ".to_string()));
        assert_eq!(config.system, "propositional");
        let config = Config::default().with_system_override(Some("analytic_freedom".to_string()));
        assert_eq!(config.system, "analytic_freedom");
    }
}
