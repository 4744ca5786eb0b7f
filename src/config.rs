use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::core_types::{Points, UserId};
use crate::policy::PointPolicy;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub policy: PointPolicy,
    #[serde(default)]
    pub lock: LockConfig,
    /// Users opened at startup, each with one initial CHARGE entry
    #[serde(default)]
    pub seed_accounts: Vec<SeedAccount>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// User lock behaviour
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LockConfig {
    /// Max wait for a user lock; absent = wait indefinitely
    #[serde(default)]
    pub acquire_timeout_ms: Option<u64>,
}

impl LockConfig {
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SeedAccount {
    pub user_id: UserId,
    pub balance: Points,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        // Re-validate: serde bypasses PointPolicy::new
        PointPolicy::new(config.policy.min(), config.policy.max()).map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}
