//! Dashboard configuration, read from `broadcast.ron`.
//!
//! Every field is optional in the file; anything left out keeps its default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use broadcast_core::PairingMode;
use broadcast_engine::{
    EngineConfig, EnhanceSettings, DEFAULT_ENHANCE_ENDPOINT, DEFAULT_ENHANCE_MODEL,
};
use broadcast_logging::LogDestination;
use log::LevelFilter;
use serde::Deserialize;

pub const CONFIG_FILENAME: &str = "broadcast.ron";
pub const CONFIG_PATH_ENV: &str = "BROADCAST_CONFIG";
pub const LOG_FILENAME: &str = "broadcast.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LogOutput {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogOutput> for LogDestination {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::File => LogDestination::File,
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENHANCE_ENDPOINT.to_string(),
            model: DEFAULT_ENHANCE_MODEL.to_string(),
            api_key_env: "API_KEY".to_string(),
            temperature: 0.7,
            top_p: 0.95,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Relay to pair through; `None` runs the standalone flow.
    pub relay_address: Option<String>,
    pub simulation_interval_ms: u64,
    pub pairing_delay_ms: u64,
    pub simulation_seed: Option<u64>,
    pub enhance: EnhanceConfig,
    pub log_destination: LogOutput,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            relay_address: None,
            simulation_interval_ms: 1500,
            pairing_delay_ms: 1500,
            simulation_seed: None,
            enhance: EnhanceConfig::default(),
            log_destination: LogOutput::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn pairing_mode(&self) -> PairingMode {
        match self.relay_address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => PairingMode::Relay {
                address: address.to_string(),
            },
            _ => PairingMode::Standalone,
        }
    }

    /// Unknown level names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Info)
    }

    /// `api_key` is whatever the configured environment variable holds.
    pub fn engine_config(&self, api_key: Option<String>) -> EngineConfig {
        EngineConfig {
            simulation_interval: Duration::from_millis(self.simulation_interval_ms),
            pairing_delay: Duration::from_millis(self.pairing_delay_ms),
            simulation_seed: self.simulation_seed,
            enhance: EnhanceSettings {
                endpoint: self.enhance.endpoint.clone(),
                model: self.enhance.model.clone(),
                api_key,
                temperature: self.enhance.temperature,
                top_p: self.enhance.top_p,
                request_timeout: Duration::from_secs(self.enhance.timeout_secs),
            },
        }
    }

    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.enhance.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

/// Reads the config file. `Ok(None)` means there is no file.
pub fn load_config(path: &Path) -> anyhow::Result<Option<AppConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let config = ron::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_none() {
        let temp = TempDir::new().unwrap();
        let loaded = load_config(&temp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(
                relay_address: Some("http://relay.local:3000"),
                simulation_interval_ms: 200,
                enhance: (model: "test-model"),
                log_destination: Both,
            )"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.simulation_interval_ms, 200);
        assert_eq!(config.pairing_delay_ms, 1500);
        assert_eq!(config.enhance.model, "test-model");
        assert_eq!(config.enhance.api_key_env, "API_KEY");
        assert_eq!(config.log_destination, LogOutput::Both);
        assert_eq!(
            config.pairing_mode(),
            PairingMode::Relay {
                address: "http://relay.local:3000".to_string()
            }
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(&path, "(simulation_interval_ms: \"fast\")").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn blank_relay_address_means_standalone() {
        let config = AppConfig {
            relay_address: Some("  ".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.pairing_mode(), PairingMode::Standalone);
    }

    #[test]
    fn engine_config_carries_timings_and_key() {
        let config = AppConfig {
            simulation_interval_ms: 250,
            simulation_seed: Some(3),
            log_level: "nonsense".to_string(),
            ..AppConfig::default()
        };
        let engine = config.engine_config(Some("key".to_string()));

        assert_eq!(engine.simulation_interval, Duration::from_millis(250));
        assert_eq!(engine.pairing_delay, Duration::from_millis(1500));
        assert_eq!(engine.simulation_seed, Some(3));
        assert_eq!(engine.enhance.api_key.as_deref(), Some("key"));
        assert_eq!(engine.enhance.request_timeout, Duration::from_secs(30));
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }
}
