//! Layered configuration: defaults -> TOML file -> environment variables.
//!
//! Built on `figment`. Environment variables are prefixed `ROAM_` and use
//! double underscores to separate nested levels, e.g.
//! `ROAM_RESOLVER__BATCH_SIZE=200`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub fitness: FitnessConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Force rollback-journal durability even off a cloud-sync path.
    #[serde(default = "default_false")]
    pub force_rollback_journal: bool,

    /// SQLite page cache, in KiB (negative `PRAGMA cache_size` convention).
    #[serde(default = "default_cache_size_kib")]
    pub cache_size_kib: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            force_rollback_journal: default_false(),
            cache_size_kib: default_cache_size_kib(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolverConfig {
    /// Max placeholders per `{ph}` token in `batched_in`.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { batch_size: default_batch_size() }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FitnessConfig {
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Modified-Z-score threshold for WARNING-level anomalies.
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            anomaly_threshold: default_anomaly_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_god_threshold")]
    pub god_out_degree_threshold: u32,

    #[serde(default = "default_hub_in_degree_threshold")]
    pub hub_in_degree_threshold: u32,

    /// Node-count above which cycle/cluster/connectivity analytics refuse
    /// to run.
    #[serde(default = "default_graph_budget")]
    pub graph_node_budget: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            god_out_degree_threshold: default_god_threshold(),
            hub_in_degree_threshold: default_hub_in_degree_threshold(),
            graph_node_budget: default_graph_budget(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: std::collections::HashMap<String, String>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".roam/index.db")
}
fn default_false() -> bool {
    false
}
fn default_cache_size_kib() -> u32 {
    64 * 1024
}
fn default_batch_size() -> usize {
    400
}
fn default_preset() -> String {
    "default".to_string()
}
fn default_anomaly_threshold() -> f64 {
    3.0
}
fn default_god_threshold() -> u32 {
    15
}
fn default_hub_in_degree_threshold() -> u32 {
    20
}
fn default_graph_budget() -> usize {
    5_000
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            store: StoreConfig::default(),
            resolver: ResolverConfig::default(),
            fitness: FitnessConfig::default(),
            health: HealthConfig::default(),
            logging: LoggingConfig {
                default: default_log_level(),
                modules: Default::default(),
            },
        }
    }
}

impl Settings {
    /// Load configuration from all sources: defaults, `.roam/settings.toml`
    /// (searched from the current directory upward), then `ROAM_` env vars.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".roam/settings.toml"));
        Self::load_from(config_path)
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("ROAM_").map(|key| {
                    key.as_str().to_lowercase().replace("__", ".").into()
                }),
            )
            .extract()
    }

    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".roam");
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }
        None
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.store_path, PathBuf::from(".roam/index.db"));
        assert_eq!(settings.resolver.batch_size, 400);
        assert_eq!(settings.fitness.preset, "default");
    }

    #[test]
    fn test_load_from_toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[resolver]
batch_size = 100

[fitness]
preset = "strict"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.resolver.batch_size, 100);
        assert_eq!(settings.fitness.preset, "strict");
        // untouched defaults still present
        assert_eq!(settings.health.god_out_degree_threshold, 15);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        let mut settings = Settings::default();
        settings.resolver.batch_size = 77;
        settings.save(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.resolver.batch_size, 77);
    }
}
