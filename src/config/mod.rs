//! Configuration system for Fleetwatch

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::AlertResource;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration value `{0}`")]
    Missing(&'static str),

    #[error("invalid base URL `{0}`")]
    InvalidUrl(String),

    #[error("polling interval `{0}` must be greater than zero")]
    InvalidInterval(&'static str),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Global application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub display: DisplayConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fleetwatch").join("config.toml"))
    }

    /// Command-line and environment values win over the file
    pub fn apply_overrides(&mut self, base_url: Option<String>, environment: Option<String>) {
        if let Some(url) = base_url {
            self.api.base_url = Some(url);
        }
        if let Some(env) = environment {
            self.api.environment = Some(env);
        }
    }

    /// Reject a configuration the dashboard cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self
            .api
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("api.base_url"))?;

        let parsed = reqwest::Url::parse(base_url)
            .map_err(|_| ConfigError::InvalidUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(base_url.to_string()));
        }

        if self
            .api
            .environment
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
        {
            return Err(ConfigError::Missing("api.environment"));
        }

        self.polling.validate()
    }

    pub fn is_production(&self) -> bool {
        self.api.environment.as_deref() == Some("production")
    }

    /// Configuration written by `fleetwatch init`
    pub fn starter() -> Self {
        let mut config = Self::default();
        config.api.base_url = Some("http://localhost:8080".to_string());
        config.api.environment = Some("development".to_string());
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub environment: Option<String>,
    /// Prepended to every resource path, e.g. `/api` when nothing rewrites paths
    pub path_prefix: String,
    pub alert_resource: AlertResource,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            environment: None,
            path_prefix: String::new(),
            alert_resource: AlertResource::Alerts,
            timeout_secs: 10,
        }
    }
}

/// Refetch intervals, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub alerts_secs: u64,
    pub vehicles_secs: u64,
    pub fleet_secs: u64,
    pub vehicle_detail_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            alerts_secs: 5,
            vehicles_secs: 15,
            fleet_secs: 15,
            vehicle_detail_secs: 5,
        }
    }
}

impl PollingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("polling.alerts_secs", self.alerts_secs),
            ("polling.vehicles_secs", self.vehicles_secs),
            ("polling.fleet_secs", self.fleet_secs),
            ("polling.vehicle_detail_secs", self.vehicle_detail_secs),
        ];
        match intervals.into_iter().find(|(_, secs)| *secs == 0) {
            Some((name, _)) => Err(ConfigError::InvalidInterval(name)),
            None => Ok(()),
        }
    }

    pub fn alerts(&self) -> Duration {
        Duration::from_secs(self.alerts_secs)
    }

    pub fn vehicles(&self) -> Duration {
        Duration::from_secs(self.vehicles_secs)
    }

    pub fn fleet(&self) -> Duration {
        Duration::from_secs(self.fleet_secs)
    }

    pub fn vehicle_detail(&self) -> Duration {
        Duration::from_secs(self.vehicle_detail_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: String,
    pub history_days: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: "tokyo-night".to_string(),
            history_days: 7,
        }
    }
}

/// Write a starter configuration file
pub fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Configuration already exists. Use --force to overwrite.");
    }

    Config::starter().save(path)?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_base_url_is_fatal() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("api.base_url"))
        ));
    }

    #[test]
    fn missing_environment_is_fatal() {
        let mut config = Config::default();
        config.api.base_url = Some("http://localhost:8080".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("api.environment"))
        ));
    }

    #[test]
    fn starter_config_is_valid() {
        assert!(Config::starter().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = Config::starter();
        config.api.base_url = Some("ftp://fleet.example.com".into());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = Config::starter();
        config.polling.alerts_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInterval("polling.alerts_secs"))
        ));
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "http://file:8080"
environment = "staging"
alert_resource = "notifications"

[polling]
alerts_secs = 3
"#,
        )
        .unwrap();

        let mut config = Config::load(&path).unwrap();
        assert_eq!(config.api.alert_resource, AlertResource::Notifications);
        assert_eq!(config.polling.alerts(), Duration::from_secs(3));
        assert_eq!(config.polling.vehicles(), Duration::from_secs(15));

        config.apply_overrides(Some("https://fleet.example.com".into()), None);
        assert_eq!(config.api.base_url.as_deref(), Some("https://fleet.example.com"));
        assert_eq!(config.api.environment.as_deref(), Some("staging"));
        assert!(config.validate().is_ok());
        assert!(!config.is_production());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetwatch").join("config.toml");

        init_config(&path, false).unwrap();
        assert!(init_config(&path, false).is_err());
        assert!(init_config(&path, true).is_ok());

        let saved = Config::load(&path).unwrap();
        assert_eq!(saved.api.environment.as_deref(), Some("development"));
    }
}
