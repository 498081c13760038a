// Difficulty presets and user configuration
// Persisted as TOML under the per-user config directory

use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::error::ConfigError;

/// Difficulty presets and custom settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,                    // 9x9, 10 mines
    Intermediate,                // 16x16, 40 mines
    Expert,                      // 30x16, 99 mines
    Custom(usize, usize, usize), // width, height, mines
}

impl Serialize for Difficulty {
    /// Serialized by name; custom dimensions live in their own fields
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Difficulty, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            x if x == Difficulty::Beginner.name() => Ok(Difficulty::Beginner),
            x if x == Difficulty::Intermediate.name() => Ok(Difficulty::Intermediate),
            x if x == Difficulty::Expert.name() => Ok(Difficulty::Expert),
            // Dimensions are restored from custom_w/h/n after loading
            x if x == Difficulty::Custom(0, 0, 0).name() => Ok(Difficulty::Custom(0, 0, 0)),
            _ => Err(serde::de::Error::custom("unknown difficulty")),
        }
    }
}

impl Difficulty {
    /// Board dimensions as (width, height, mines)
    pub fn params(&self) -> (usize, usize, usize) {
        match self {
            Difficulty::Beginner => (9, 9, 10),
            Difficulty::Intermediate => (16, 16, 40),
            Difficulty::Expert => (30, 16, 99),
            Difficulty::Custom(w, h, n) => (*w, *h, *n),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Expert => "Expert",
            Difficulty::Custom(_, _, _) => "Custom",
        }
    }

    pub fn to_index(&self) -> usize {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Intermediate => 1,
            Difficulty::Expert => 2,
            Difficulty::Custom(_, _, _) => 3,
        }
    }

    pub fn from_index(i: usize, custom_w: usize, custom_h: usize, custom_n: usize) -> Difficulty {
        match i {
            0 => Difficulty::Beginner,
            1 => Difficulty::Intermediate,
            2 => Difficulty::Expert,
            _ => Difficulty::Custom(custom_w, custom_h, custom_n),
        }
    }
}

/// Reject boards the engine cannot build: empty or oversized grids, or as many mines as cells
pub fn validate_params(width: usize, height: usize, mines: usize) -> Result<(), ConfigError> {
    let max = match width.checked_mul(height) {
        Some(cells) if cells > 0 => cells - 1,
        _ => return Err(ConfigError::InvalidDimensions { width, height }),
    };
    if mines > max {
        return Err(ConfigError::TooManyMines { mines, max });
    }
    Ok(())
}

/// User configuration, persisted to disk as TOML
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,

    // Custom difficulty parameters
    pub custom_w: usize,
    pub custom_h: usize,
    pub custom_n: usize,

    pub ascii_icons: bool, // Use ASCII fallback glyphs
    pub log_level: String, // tracing level for the log file
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: Difficulty::Beginner,
            custom_w: 10,
            custom_h: 10,
            custom_n: 30,
            ascii_icons: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse a TOML document, restoring custom dimensions and falling back to
    /// Beginner when the saved custom board is unplayable
    pub fn from_toml(s: &str) -> Result<Config, toml::de::Error> {
        let mut cfg = toml::from_str::<Config>(s)?;
        if matches!(cfg.difficulty, Difficulty::Custom(_, _, _)) {
            cfg.difficulty = Difficulty::Custom(cfg.custom_w, cfg.custom_h, cfg.custom_n);
            if let Err(e) = validate_params(cfg.custom_w, cfg.custom_h, cfg.custom_n) {
                warn!("saved custom board rejected: {}", e);
                cfg.difficulty = Difficulty::Beginner;
            }
        }
        Ok(cfg)
    }

    /// Switch difficulty by preset index (3 = custom), validating custom boards
    pub fn select(&mut self, index: usize) -> Result<(), ConfigError> {
        let d = Difficulty::from_index(index, self.custom_w, self.custom_h, self.custom_n);
        let (w, h, n) = d.params();
        validate_params(w, h, n)?;
        self.difficulty = d;
        Ok(())
    }
}

/// Config file location, e.g. ~/.config/minegrid/minegrid.toml on Linux
pub fn config_path() -> Option<PathBuf> {
    let name = env!("CARGO_PKG_NAME");
    if let Some(proj) = ProjectDirs::from("", "", name) {
        let mut path = proj.config_dir().to_path_buf();
        path.push(format!("{}.toml", name));
        return Some(path);
    }
    // fallback to current directory
    let mut path = std::env::current_dir().ok()?;
    path.push(format!("{}.toml", name));
    Some(path)
}

/// Load configuration from disk, writing the defaults if none exists yet
pub fn load_or_create_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(s) => match Config::from_toml(&s) {
                Ok(cfg) => return cfg,
                Err(e) => warn!("ignoring malformed config {}: {}", path.display(), e),
            },
            Err(e) => warn!("cannot read config {}: {}", path.display(), e),
        }
    }
    let cfg = Config::default();
    save_config(&cfg);
    cfg
}

pub fn save_config(cfg: &Config) {
    let Some(path) = config_path() else {
        return;
    };
    let s = match toml::to_string(cfg) {
        Ok(s) => s,
        Err(e) => {
            warn!("cannot serialize config: {}", e);
            return;
        }
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("cannot create {}: {}", parent.display(), e);
            return;
        }
    }
    if let Err(e) = fs::write(&path, s) {
        warn!("cannot write config {}: {}", path.display(), e);
    }
}
