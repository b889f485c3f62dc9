use crate::contact::{DEFAULT_PHONE, DEFAULT_RECIPIENT, PhoneNumber};
use crate::gate::{DEFAULT_PIN, Pin};
use crate::wheel::{MAX_TURNS, MIN_TURNS, SPIN_DURATION};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ACCENT: &str = "#CBA135";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct WheelConfig {
    pub min_turns: u32,
    pub max_turns: u32,
    pub duration_ms: u64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            min_turns: MIN_TURNS,
            max_turns: MAX_TURNS,
            duration_ms: SPIN_DURATION.as_millis() as u64,
        }
    }
}

impl WheelConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub pin: Pin,
    pub recipient: String,
    pub phone: PhoneNumber,
    pub accent: String,
    pub wheel: WheelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pin: Pin::new(DEFAULT_PIN),
            recipient: DEFAULT_RECIPIENT.to_string(),
            phone: PhoneNumber::new(DEFAULT_PHONE),
            accent: DEFAULT_ACCENT.to_string(),
            wheel: WheelConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "aura", "aura").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&get_config_path()?)
}

/// Reads `path` (optional) layered under `AURA_*` environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()).required(false))
        .add_source(
            config::Environment::with_prefix("AURA")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_default() -> Config {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    }
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r##"{ "pin": "4455", "wheel": { "max_turns": 9 } }"##;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.pin.as_str(), "4455");
        assert_eq!(config.recipient, DEFAULT_RECIPIENT);
        assert_eq!(config.accent, DEFAULT_ACCENT);
        assert_eq!(config.wheel.min_turns, MIN_TURNS);
        assert_eq!(config.wheel.max_turns, 9);
        assert_eq!(config.wheel.duration(), SPIN_DURATION);
    }

    #[test]
    fn test_bundled_default_config_parses() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = s.try_deserialize().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_file_pin_unlocks_gate() {
        use crate::gate::{AccessOutcome, Gate};
        use crate::store::MemoryStore;

        let dir = crate::store::scratch_dir("config");
        fs_err::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs_err::write(&path, "pin = \"9999\"\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.pin.as_str(), "9999");

        let mut gate = Gate::mount(MemoryStore::new(), config.pin, None);
        assert_eq!(gate.check_access("2233"), AccessOutcome::Denied);
        assert_eq!(gate.check_access("9999"), AccessOutcome::Granted);

        let missing = load_config_from(&dir.join("missing.toml")).unwrap();
        assert_eq!(missing.pin.as_str(), DEFAULT_PIN);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
