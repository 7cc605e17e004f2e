use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::backend::DEFAULT_API_URL;
use crate::error::ConfigError;
use crate::poller::DEFAULT_REFRESH_PERIOD;

/// Longest accepted auto-refresh period: one day.
pub const MAX_REFRESH_SECS: u64 = 86_400;

#[derive(Parser, Debug)]
#[command(name = "pipedash", about = "Terminal dashboard for a data-pipeline status API")]
pub struct Cli {
    /// Base URL of the pipeline API; bare `--api` means the local default,
    /// and the built-in mock is used when absent
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_API_URL)]
    pub api: Option<String>,
    /// Auto-refresh period in seconds (0 uses the default, at most one day)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=MAX_REFRESH_SECS))]
    pub interval: Option<u64>,
    /// Print one poll cycle as JSON and exit
    #[arg(long)]
    pub json: bool,
    /// Persist --api/--interval for future runs
    #[arg(long)]
    pub save: bool,
    /// Delete the saved configuration and exit
    #[arg(long)]
    pub reset: bool,
}

/// Settings remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
}

/// Effective settings after merging CLI flags over the saved file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: Option<String>,
    pub refresh_period: Duration,
}

impl Settings {
    pub fn resolve(cli: &Cli, saved: Option<&SavedConfig>) -> Self {
        let api_url = cli
            .api
            .clone()
            .or_else(|| saved.and_then(|s| s.api_url.clone()));
        let refresh_period = cli
            .interval
            .or_else(|| saved.and_then(|s| s.refresh_interval_secs))
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs.min(MAX_REFRESH_SECS)))
            .unwrap_or(DEFAULT_REFRESH_PERIOD);
        Self {
            api_url,
            refresh_period,
        }
    }

    pub fn to_saved(&self) -> SavedConfig {
        SavedConfig {
            api_url: self.api_url.clone(),
            refresh_interval_secs: Some(self.refresh_period.as_secs()),
        }
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("pipedash").join("config.json"))
}

/// Loads the saved configuration; a missing or unreadable file yields `None`.
pub fn load_config() -> Option<SavedConfig> {
    let path = config_path().ok()?;
    match load_config_from(&path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring saved configuration");
            None
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<Option<SavedConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

pub fn save_config(config: &SavedConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, config: &SavedConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Removes the saved configuration. Returns whether a file was removed.
pub fn reset_config() -> Result<bool, ConfigError> {
    reset_config_at(&config_path()?)
}

pub fn reset_config_at(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("pipedash").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_mock_and_thirty_seconds() {
        let settings = Settings::resolve(&cli(&[]), None);
        assert_eq!(settings.api_url, None);
        assert_eq!(settings.refresh_period, Duration::from_secs(30));
    }

    #[test]
    fn flags_override_saved_values() {
        let saved = SavedConfig {
            api_url: Some("http://saved:8000/api".into()),
            refresh_interval_secs: Some(60),
        };
        let settings = Settings::resolve(&cli(&["--interval", "5"]), Some(&saved));
        assert_eq!(settings.api_url.as_deref(), Some("http://saved:8000/api"));
        assert_eq!(settings.refresh_period, Duration::from_secs(5));

        let settings = Settings::resolve(&cli(&["--api", "http://cli/api"]), Some(&saved));
        assert_eq!(settings.api_url.as_deref(), Some("http://cli/api"));
        assert_eq!(settings.refresh_period, Duration::from_secs(60));
    }

    #[test]
    fn bare_api_flag_uses_local_default() {
        let settings = Settings::resolve(&cli(&["--api"]), None);
        assert_eq!(settings.api_url.as_deref(), Some(DEFAULT_API_URL));
    }

    #[test]
    fn interval_flag_is_bounded() {
        let too_long = (MAX_REFRESH_SECS + 1).to_string();
        let args = ["pipedash", "--interval", too_long.as_str()];
        assert!(Cli::try_parse_from(args).is_err());

        let day = MAX_REFRESH_SECS.to_string();
        let settings = Settings::resolve(&cli(&["--interval", day.as_str()]), None);
        assert_eq!(settings.refresh_period, Duration::from_secs(MAX_REFRESH_SECS));
    }

    #[test]
    fn huge_saved_interval_is_clamped() {
        let saved = SavedConfig {
            api_url: None,
            refresh_interval_secs: Some(u64::MAX),
        };
        let settings = Settings::resolve(&cli(&[]), Some(&saved));
        assert_eq!(settings.refresh_period, Duration::from_secs(MAX_REFRESH_SECS));
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let settings = Settings::resolve(&cli(&["--interval", "0"]), None);
        assert_eq!(settings.refresh_period, DEFAULT_REFRESH_PERIOD);
    }

    #[test]
    fn save_load_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        assert_eq!(load_config_from(&path).unwrap(), None);

        let config = SavedConfig {
            api_url: Some("http://localhost:8000/api".into()),
            refresh_interval_secs: Some(15),
        };
        save_config_to(&path, &config).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), Some(config));

        assert!(reset_config_at(&path).unwrap());
        assert!(!reset_config_at(&path).unwrap());
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse { .. })));
    }
}
