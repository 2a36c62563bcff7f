//! Bot configuration.
//!
//! Loaded via the `config` crate from `SWITCHBOARD_*` environment variables;
//! nested fields use `__`, e.g. `SWITCHBOARD_ADAPTER__EDIT_POLICY=replace`.
//!
//! See [`AdapterConfig`] for the adapter's switches.

use serde::Deserialize;
use switchboard_telegram::AdapterConfig;

/// Bot configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct BotConfig {
    /// Bot API token.
    pub token: String,

    /// Bot API base URL, without the `/bot<token>` suffix.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Long-poll timeout passed to `getUpdates`, in seconds.
    #[serde(default = "default_poll_timeout_seconds")]
    pub poll_timeout_seconds: u64,

    /// Adapter behaviour.
    #[serde(default)]
    pub adapter: AdapterConfig,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_seconds() -> u64 {
    30
}

impl BotConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(environment())
    }

    fn from_source(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("SWITCHBOARD")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_telegram::EditPolicy;

    fn load(vars: &[(&str, &str)]) -> Result<BotConfig, config::ConfigError> {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_source(environment().source(Some(map)))
    }

    #[test]
    fn token_only_uses_defaults() {
        let config = load(&[("SWITCHBOARD_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.api_base, "https://api.telegram.org");
        assert_eq!(config.poll_timeout_seconds, 30);
        assert_eq!(config.adapter.edit_policy, EditPolicy::AppendToPriorText);
    }

    #[test]
    fn nested_adapter_settings() {
        let config = load(&[
            ("SWITCHBOARD_TOKEN", "t"),
            ("SWITCHBOARD_POLL_TIMEOUT_SECONDS", "5"),
            ("SWITCHBOARD_ADAPTER__EDIT_POLICY", "replace"),
            ("SWITCHBOARD_ADAPTER__LANE_CAPACITY", "8"),
        ])
        .unwrap();
        assert_eq!(config.poll_timeout_seconds, 5);
        assert_eq!(config.adapter.edit_policy, EditPolicy::Replace);
        assert_eq!(config.adapter.lane_capacity, 8);
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(load(&[]).is_err());
    }
}
