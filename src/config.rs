//! Translator settings, read from JSON.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use uuid::Uuid;

/// Resource pack pushed to primary clients before they finish configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePackConfig {
    pub url: String,
    /// SHA-1 of the pack, hex encoded.
    pub hash: String,
    pub uuid: Uuid,
    /// Plain text shown in the download prompt.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_prompt() -> String {
    "Prompt".to_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resource_pack: Option<ResourcePackConfig>,
    /// How long a removed projectile stays tracked.
    pub projectile_eviction_delay_ms: u64,
    /// Mining speed of the tool rule added for the mushroom family.
    pub tool_rule_speed: f32,
    /// Author of the painting variants standing in for custom items.
    pub painting_author: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resource_pack: None,
            projectile_eviction_delay_ms: 1000,
            tool_rule_speed: 0.01,
            painting_author: "LostEngine".to_owned(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid translator config")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn projectile_eviction_delay(&self) -> Duration {
        Duration::from_millis(self.projectile_eviction_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.projectile_eviction_delay(), Duration::from_secs(1));
    }

    #[test]
    fn resource_pack_section() {
        let config = Config::from_json(
            r#"{
                "resource_pack": {
                    "url": "http://localhost:7270/pack.zip",
                    "hash": "0123456789abcdef0123456789abcdef01234567",
                    "uuid": "3f2a9d4c-1b7e-4e55-9a61-0c8d2b6f7e10"
                },
                "tool_rule_speed": 0.5
            }"#,
        )
        .unwrap();
        let pack = config.resource_pack.unwrap();
        assert_eq!(pack.prompt, "Prompt");
        assert_eq!(config.tool_rule_speed, 0.5);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json("{\"tool_rule_speed\": \"fast\"}").is_err());
    }
}
