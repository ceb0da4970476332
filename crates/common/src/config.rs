//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Hosted backend configuration.
    pub backend: BackendConfig,
    /// Account purge configuration.
    #[serde(default)]
    pub purge: PurgeConfig,
}

/// Hosted backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend (table API and auth API live under it).
    pub url: String,
    /// Project API key sent with every request.
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Account purge configuration.
///
/// Collection names vary per deployment; the predicate fields used to
/// scope rows to an actor are fixed policy and live in `amoria-core`.
#[derive(Debug, Clone, Deserialize)]
pub struct PurgeConfig {
    /// Collection holding profile records, keyed by actor id.
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
    /// Collection holding authored messages.
    #[serde(default = "default_messages_table")]
    pub messages_table: String,
    /// Collection holding match records (actor may be either side).
    #[serde(default = "default_matches_table")]
    pub matches_table: String,
    /// Append-only collection receiving audit entries.
    #[serde(default = "default_audit_table")]
    pub audit_table: String,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            profiles_table: default_profiles_table(),
            messages_table: default_messages_table(),
            matches_table: default_matches_table(),
            audit_table: default_audit_table(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_profiles_table() -> String {
    "profiles".to_string()
}

fn default_messages_table() -> String {
    "messages".to_string()
}

fn default_matches_table() -> String {
    "matches".to_string()
}

fn default_audit_table() -> String {
    "audit_log".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `AMORIA_ENV`)
    /// 3. Environment variables with `AMORIA_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("AMORIA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AMORIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("AMORIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
