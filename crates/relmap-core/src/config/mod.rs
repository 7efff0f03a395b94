pub mod pool_config;

use serde::{Deserialize, Serialize};

pub use pool_config::PoolConfig;

/// Top-level mapper configuration: which driver to open, where, and how
/// the connection pool behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Driver name, e.g. `sqlite`.
    pub driver: String,
    /// Driver-specific connection string. For SQLite, a file path or `:memory:`.
    pub dsn: String,
    pub pool: PoolConfig,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            dsn: ":memory:".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl MapperConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
