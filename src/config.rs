//! Configuration management
//!
//! Optional TOML file holding defaults for the command-line flags, so a
//! hotkey binding can be a bare `pacycle`. A missing file means built-in
//! defaults; command-line flags always win over file values.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{self, Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    /// Default sink description filter when `-s` is not given.
    pub sink_pattern: String,
    /// Default profile rules when no `-p` pair is given.
    pub profile_rules: Vec<(String, String)>,
}

/// Global settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Notify on every switch, without needing `-n`.
    pub notify: bool,
    /// Log level floor when no `-v` flags are given.
    pub log_level: String,
}

// ============================================================================
// Config file deserialization (TOML)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    settings: SettingsFile,
    #[serde(default)]
    sink_pattern: String,
    #[serde(default)]
    profile_rules: Vec<ProfileRuleFile>,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    notify: bool,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct ProfileRuleFile {
    sink: String,
    profile: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            notify: false,
            log_level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings {
                notify: false,
                log_level: default_log_level(),
            },
            sink_pattern: String::new(),
            profile_rules: Vec::new(),
        }
    }
}

// ============================================================================
// Config implementation
// ============================================================================

impl Config {
    /// Load configuration from the default XDG config path.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            debug!("No config at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {path:?}"))?;

        let config_file: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {path:?}"))?;

        Self::from_config_file(config_file)
    }

    fn from_config_file(config_file: ConfigFile) -> Result<Self> {
        match config_file.settings.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            level => eyre::bail!(
                "Invalid log_level '{level}'. Must be: error, warn, info, debug, or trace"
            ),
        }

        Ok(Self {
            settings: Settings {
                notify: config_file.settings.notify,
                log_level: config_file.settings.log_level,
            },
            sink_pattern: config_file.sink_pattern,
            profile_rules: config_file
                .profile_rules
                .into_iter()
                .map(|r| (r.sink, r.profile))
                .collect(),
        })
    }

    /// The XDG config path for pacycle.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre::eyre!("Could not determine config directory"))?
            .join("pacycle");
        Ok(config_dir.join("config.toml"))
    }
}
