//! Settings loading and persistence.
//!
//! Settings come from a TOML file, then individual values are overridden by
//! `ANKIMARK_*` environment variables. A missing file means defaults.

use std::path::{Path, PathBuf};

use thiserror::Error;

use ankimark_core::SyncSettings;

pub const ENDPOINT_VAR: &str = "ANKIMARK_ENDPOINT";
pub const BASIC_KEYWORD_VAR: &str = "ANKIMARK_BASIC_KEYWORD";
pub const INVERTED_KEYWORD_VAR: &str = "ANKIMARK_INVERTED_KEYWORD";
pub const DEFAULT_DECK_VAR: &str = "ANKIMARK_DEFAULT_DECK";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file at {config_path}: {source}")]
    Write {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No configuration directory on this platform; pass --config")]
    NoConfigDir,
}

/// `<config_dir>/ankimark/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ankimark").join("config.toml"))
}

/// The explicit path, else the platform default.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path().ok_or(ConfigError::NoConfigDir),
    }
}

/// Read settings from a TOML file, falling back to defaults when it is missing.
pub fn load_from_path(config_path: &Path) -> Result<SyncSettings, ConfigError> {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(SyncSettings::default());
    }

    let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        config_path: config_path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        config_path: config_path.to_path_buf(),
        source,
    })
}

/// File settings with environment overrides applied.
pub fn load(config_path: &Path) -> Result<SyncSettings, ConfigError> {
    let mut settings = load_from_path(config_path)?;
    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Override settings from a variable lookup. Blank values are ignored.
pub fn apply_overrides<F>(settings: &mut SyncSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let targets = [
        (ENDPOINT_VAR, &mut settings.anki_endpoint),
        (BASIC_KEYWORD_VAR, &mut settings.basic_keyword),
        (INVERTED_KEYWORD_VAR, &mut settings.inverted_keyword),
        (DEFAULT_DECK_VAR, &mut settings.default_deck),
    ];
    for (name, target) in targets {
        if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(var = name, "setting overridden from environment");
            *target = value.trim().to_string();
        }
    }
}

pub fn to_toml(settings: &SyncSettings) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(settings)?)
}

pub fn save_to_path(settings: &SyncSettings, config_path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        config_path: config_path.to_path_buf(),
        source,
    };
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let content = to_toml(settings)?;
    std::fs::write(config_path, content).map_err(write_err)
}
