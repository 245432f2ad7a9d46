//! YAML configuration for the funding scanner.

use common::types::Exchange;
use detector::{DetectorConfig, ViewParams, MIN_REFRESH_INTERVAL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    ValidationError(String),
}

// The top-level configuration struct that maps directly to the YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub refresh_interval_secs: u64,
    pub adapter_timeout_secs: u64,
    pub detector: DetectorConfig,
    pub view: ViewParams,
    pub exchanges: Vec<ExchangeSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSettings {
    pub name: Exchange,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Overrides the venue's public API root, e.g. for a proxy or testnet.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 60,
            adapter_timeout_secs: 10,
            detector: DetectorConfig::default(),
            view: ViewParams::default(),
            exchanges: Exchange::ALL
                .into_iter()
                .map(|name| ExchangeSettings {
                    name,
                    enabled: true,
                    base_url: None,
                })
                .collect(),
        }
    }
}

impl ScannerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    /// Enabled venues in the order they are listed.
    pub fn enabled_exchanges(&self) -> impl Iterator<Item = &ExchangeSettings> {
        self.exchanges.iter().filter(|e| e.enabled)
    }

    pub fn to_view_params(&self) -> ViewParams {
        self.view.clone()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled_exchanges().next().is_none() {
            return Err(ConfigError::ValidationError(
                "at least one exchange must be enabled".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.exchanges {
            if !seen.insert(entry.name) {
                return Err(ConfigError::ValidationError(format!(
                    "exchange {} is listed more than once",
                    entry.name
                )));
            }
        }

        if self.refresh_interval() < MIN_REFRESH_INTERVAL {
            return Err(ConfigError::ValidationError(format!(
                "refresh_interval_secs must be at least {}",
                MIN_REFRESH_INTERVAL.as_secs()
            )));
        }
        if self.adapter_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "adapter_timeout_secs must be greater than 0".to_string(),
            ));
        }

        self.view
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        self.detector
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(())
    }

    /// Reads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: ScannerConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

pub async fn load_config_from_path(path: &str) -> Result<ScannerConfig, anyhow::Error> {
    let config_str = tokio::fs::read_to_string(path).await?;
    let config: ScannerConfig = serde_yaml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_yaml(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_is_valid() {
        let config = ScannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.enabled_exchanges().count(), 7);
        assert_eq!(config.to_view_params(), ViewParams::default());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = ScannerConfig::default();
        config.refresh_interval_secs = 120;
        config.exchanges[3].enabled = false;
        config.exchanges[0].base_url = Some("http://localhost:9000".to_string());

        let file = NamedTempFile::new().unwrap();
        config.save(file.path()).unwrap();
        let loaded = ScannerConfig::load(file.path()).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.enabled_exchanges().count(), 6);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = write_yaml(
            r#"
refresh_interval_secs: 45
detector:
  min_spread_bps: 5.0
view:
  spread_cost_bps: 10
  exchanges: [binance, hyperliquid]
exchanges:
  - name: binance
  - name: hyperliquid
    base_url: https://api.hyperliquid-testnet.xyz
"#,
        );
        let config = ScannerConfig::load(file.path()).unwrap();

        assert_eq!(config.refresh_interval(), Duration::from_secs(45));
        assert_eq!(config.adapter_timeout(), Duration::from_secs(10));
        assert_eq!(config.detector.min_spread_bps, 5.0);
        assert_eq!(config.detector.same_funding_tolerance_secs, 300);
        assert_eq!(config.view.spread_cost_bps, 10);
        assert_eq!(config.view.exchanges.len(), 2);
        assert!(config.exchanges.iter().all(|e| e.enabled));
        assert_eq!(
            config.exchanges[1].base_url.as_deref(),
            Some("https://api.hyperliquid-testnet.xyz")
        );
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            "refresh_interval_secs: 10\n",
            "adapter_timeout_secs: 0\n",
            "view:\n  exchanges: []\n",
            "exchanges:\n  - name: gate\n    enabled: false\n",
            "exchanges:\n  - name: gate\n  - name: gate\n",
            "detector:\n  same_funding_tolerance_secs: 0\n",
            "detector:\n  min_spread_bps: -1.0\n",
        ];
        for yaml in cases {
            let file = write_yaml(yaml);
            let result = ScannerConfig::load(file.path());
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "expected validation error for {:?}",
                yaml
            );
        }
    }

    #[test]
    fn test_unknown_exchange_is_a_parse_error() {
        let file = write_yaml("exchanges:\n  - name: kraken\n");
        assert!(matches!(
            ScannerConfig::load(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ScannerConfig::load("/nonexistent/scanner.yml"),
            Err(ConfigError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_async_load() {
        let file = write_yaml("refresh_interval_secs: 300\n");
        let config = load_config_from_path(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.refresh_interval_secs, 300);
    }
}
