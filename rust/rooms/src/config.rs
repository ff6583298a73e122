use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "BACCARAT_CONFIG";
pub const MIN_WAGER_ENV: &str = "BACCARAT_MIN_WAGER";
pub const MAX_WAGER_ENV: &str = "BACCARAT_MAX_WAGER";
pub const WINDOW_ENV: &str = "BACCARAT_WINDOW_SECONDS";
pub const SHOE_SEED_ENV: &str = "BACCARAT_SHOE_SEED";

/// Longest accepted betting window, one day
pub const MAX_WINDOW_SECONDS: u64 = 24 * 60 * 60;

/// Options consumed by the round scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomConfig {
    /// Smallest accepted stake
    pub min_wager: u64,
    /// Largest accepted stake
    pub max_wager: u64,
    /// Length of the betting window in seconds
    pub window_length_seconds: u64,
    /// Remaining-time marks that trigger a countdown update
    pub countdown_thresholds: Vec<u64>,
    /// Fixed shoe seed for reproducible simulations; production leaves it unset
    pub shoe_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_wager: 100,
            max_wager: 50_000,
            window_length_seconds: 60,
            countdown_thresholds: vec![30, 10, 5],
            shoe_seed: None,
        }
    }
}

impl RoomConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_length_seconds)
    }

    /// Thresholds strictly inside the window, largest first, without repeats.
    pub fn effective_thresholds(&self) -> Vec<u64> {
        let mut marks: Vec<u64> = self
            .countdown_thresholds
            .iter()
            .copied()
            .filter(|t| *t > 0 && *t < self.window_length_seconds)
            .collect();
        marks.sort_unstable_by(|a, b| b.cmp(a));
        marks.dedup();
        marks
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_wager == 0 {
            return Err(ConfigError::Invalid("min_wager must be >0".into()));
        }
        if self.min_wager > self.max_wager {
            return Err(ConfigError::Invalid(format!(
                "min_wager {} exceeds max_wager {}",
                self.min_wager, self.max_wager
            )));
        }
        if self.window_length_seconds == 0 {
            return Err(ConfigError::Invalid(
                "window_length_seconds must be >0".into(),
            ));
        }
        if self.window_length_seconds > MAX_WINDOW_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "window_length_seconds {} exceeds {MAX_WINDOW_SECONDS}",
                self.window_length_seconds
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSources {
    pub min_wager: ValueSource,
    pub max_wager: ValueSource,
    pub window_length_seconds: ValueSource,
    pub countdown_thresholds: ValueSource,
    pub shoe_seed: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            min_wager: ValueSource::Default,
            max_wager: ValueSource::Default,
            window_length_seconds: ValueSource::Default,
            countdown_thresholds: ValueSource::Default,
            shoe_seed: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: RoomConfig,
    pub sources: ConfigSources,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub fn load() -> Result<RoomConfig, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

/// Defaults, then the TOML file named by `BACCARAT_CONFIG`, then individual
/// environment overrides.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let mut cfg = RoomConfig::default();
    let mut sources = ConfigSources::default();

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            apply_file(&mut cfg, &mut sources, Path::new(&path))?;
        }
    }

    if let Some(v) = env_u64(MIN_WAGER_ENV)? {
        cfg.min_wager = v;
        sources.min_wager = ValueSource::Env;
    }
    if let Some(v) = env_u64(MAX_WAGER_ENV)? {
        cfg.max_wager = v;
        sources.max_wager = ValueSource::Env;
    }
    if let Some(v) = env_u64(WINDOW_ENV)? {
        cfg.window_length_seconds = v;
        sources.window_length_seconds = ValueSource::Env;
    }
    if let Some(v) = env_u64(SHOE_SEED_ENV)? {
        cfg.shoe_seed = Some(v);
        sources.shoe_seed = ValueSource::Env;
    }

    cfg.validate()?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

pub fn load_file(path: &Path) -> Result<RoomConfig, ConfigError> {
    let mut cfg = RoomConfig::default();
    let mut sources = ConfigSources::default();
    apply_file(&mut cfg, &mut sources, path)?;
    cfg.validate()?;
    Ok(cfg)
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    min_wager: Option<u64>,
    #[serde(default)]
    max_wager: Option<u64>,
    #[serde(default)]
    window_length_seconds: Option<u64>,
    #[serde(default)]
    countdown_thresholds: Option<Vec<u64>>,
    #[serde(default)]
    shoe_seed: Option<u64>,
}

fn apply_file(
    cfg: &mut RoomConfig,
    sources: &mut ConfigSources,
    path: &Path,
) -> Result<(), ConfigError> {
    let s = fs::read_to_string(path)?;
    let f: FileConfig = toml::from_str(&s)?;
    if let Some(v) = f.min_wager {
        cfg.min_wager = v;
        sources.min_wager = ValueSource::File;
    }
    if let Some(v) = f.max_wager {
        cfg.max_wager = v;
        sources.max_wager = ValueSource::File;
    }
    if let Some(v) = f.window_length_seconds {
        cfg.window_length_seconds = v;
        sources.window_length_seconds = ValueSource::File;
    }
    if let Some(v) = f.countdown_thresholds {
        cfg.countdown_thresholds = v;
        sources.countdown_thresholds = ValueSource::File;
    }
    if let Some(v) = f.shoe_seed {
        cfg.shoe_seed = Some(v);
        sources.shoe_seed = ValueSource::File;
    }
    Ok(())
}

fn env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{key} must be a non-negative integer"))),
        _ => Ok(None),
    }
}
