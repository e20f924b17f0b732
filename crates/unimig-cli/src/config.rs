use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigratorConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Root of the alertmanager state; silences land under `alerting/<org>/`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Hex encoded 32-byte AES-SIV key used for channel secure settings.
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub case_insensitive_uids: bool,
    /// Revert and migrate again orgs that were already migrated.
    #[serde(default)]
    pub force_migration: bool,
    /// Used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_database_url() -> String {
    "sqlite://unimig.db?mode=rwc".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_log_filter() -> String {
    "unimig=info".to_string()
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            data_dir: default_data_dir(),
            secret_key: String::new(),
            case_insensitive_uids: false,
            force_migration: false,
            log_filter: default_log_filter(),
        }
    }
}

impl MigratorConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config '{}': {}", path.display(), e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path.display(), e))?;
        Ok(config)
    }
}
