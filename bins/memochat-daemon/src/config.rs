use memochat_core::config::EngineConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletConfig {
    pub url: String,
    #[serde(default)]
    pub rpc_user: Option<String>,
    #[serde(default)]
    pub rpc_password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Username to create an identity under on first start. Without it the
    /// daemon polls nothing until an identity exists.
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file")]
    Read,
    #[error("cannot parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

pub fn load_config(path: &Path) -> Result<DaemonConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|_| ConfigError::Read)?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<DaemonConfig, ConfigError> {
    let config: DaemonConfig =
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    if !config.wallet.url.starts_with("http://") && !config.wallet.url.starts_with("https://") {
        return Err(ConfigError::Invalid("wallet.url"));
    }
    if config
        .identity
        .username
        .as_deref()
        .map(|u| u.trim().is_empty())
        .unwrap_or(false)
    {
        return Err(ConfigError::Invalid("identity.username"));
    }
    if config.engine.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid("engine.poll_interval_ms"));
    }
    Ok(config)
}
