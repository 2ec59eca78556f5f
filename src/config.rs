//! Configuration loading and management
//!
//! Handles parsing of the `config.toml` configuration file. Resolution order:
//! an explicit `--config` path, `$VIDO_CONFIG`, `$VIDO_CONFIG_DIR/config.toml`,
//! then the XDG config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming the config file directly
pub const ENV_CONFIG: &str = "VIDO_CONFIG";

/// Environment variable overriding the config (and cache) directory
pub const ENV_CONFIG_DIR: &str = "VIDO_CONFIG_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Glob matching the list directories, e.g. `~/.calendars/*`
    pub path: String,

    /// Where the todo cache lives; defaults next to the config file
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// strftime format for dates
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// strftime format for times
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// Separator between the date and time parts when both are given
    #[serde(default = "default_dt_separator")]
    pub dt_separator: String,

    /// List used when `new` is given none
    #[serde(default)]
    pub default_list: Option<String>,

    /// Hours from now for the default due date of new todos; 0 disables
    #[serde(default = "default_due")]
    pub default_due: u32,

    /// Priority given to new todos when unspecified (0-9)
    #[serde(default)]
    pub default_priority: u8,

    /// Restrict listings to startable todos by default
    #[serde(default)]
    pub startable: bool,
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_time_format() -> String {
    "%H:%M".to_string()
}

fn default_dt_separator() -> String {
    " ".to_string()
}

fn default_due() -> u32 {
    24
}

// Specifiers that render a time-of-day or a calendar date. A date format
// containing any of the former (or vice versa) is a config mistake that would
// corrupt parsing of user-typed dates.
const TIME_SPECIFIERS: [&str; 8] = ["%H", "%I", "%M", "%S", "%p", "%P", "%f", "%R"];
const DATE_SPECIFIERS: [&str; 10] = [
    "%Y", "%y", "%m", "%d", "%e", "%b", "%B", "%j", "%a", "%A",
];

impl Config {
    /// Load configuration from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::InvalidConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file path and load it.
    ///
    /// `flag` is the `--config` value when given; it and `$VIDO_CONFIG` must
    /// exist if set. The fallback locations are only tried when unset.
    pub fn discover(flag: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(flag)?;
        Self::load(&path)
    }

    fn resolve_path(flag: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(ENV_CONFIG) {
            return Ok(PathBuf::from(path));
        }
        if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
            return Ok(PathBuf::from(dir).join("config.toml"));
        }
        if let Some(dirs) = directories::ProjectDirs::from("", "", "vido") {
            let path = dirs.config_dir().join("config.toml");
            if path.exists() {
                return Ok(path);
            }
        }
        Err(Error::InvalidConfig(
            "no configuration file found; create config.toml or set VIDO_CONFIG".to_string(),
        ))
    }

    /// Where the cache snapshot lives.
    ///
    /// `cache_path` when configured, else `cache.json` in `$VIDO_CONFIG_DIR`,
    /// else the XDG cache directory.
    pub fn cache_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.cache_path {
            return Ok(path.clone());
        }
        if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
            return Ok(PathBuf::from(dir).join("cache.json"));
        }
        let dirs = directories::ProjectDirs::from("", "", "vido").ok_or_else(|| {
            Error::InvalidConfig("cannot determine a cache directory; set cache_path".to_string())
        })?;
        Ok(dirs.cache_dir().join("cache.json"))
    }

    fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(Error::InvalidConfig("path cannot be empty".to_string()));
        }
        glob::Pattern::new(&self.path).map_err(|err| {
            Error::InvalidConfig(format!("path: invalid glob '{}': {err}", self.path))
        })?;

        for spec in TIME_SPECIFIERS {
            if self.date_format.contains(spec) {
                return Err(Error::InvalidConfig(format!(
                    "date_format must not contain time specifier {spec}"
                )));
            }
        }
        for spec in DATE_SPECIFIERS {
            if self.time_format.contains(spec) {
                return Err(Error::InvalidConfig(format!(
                    "time_format must not contain date specifier {spec}"
                )));
            }
        }

        if self.default_priority > 9 {
            return Err(Error::InvalidConfig(
                "default_priority must be between 0 and 9".to_string(),
            ));
        }

        Ok(())
    }

    /// The list glob with a leading `~` expanded to the home directory
    pub fn list_pattern(&self) -> String {
        if let Some(rest) = self.path.strip_prefix("~/") {
            if let Some(base) = directories::BaseDirs::new() {
                return base.home_dir().join(rest).display().to_string();
            }
        }
        self.path.clone()
    }

    /// Combined format for full datetimes
    pub fn datetime_format(&self) -> String {
        format!(
            "{}{}{}",
            self.date_format, self.dt_separator, self.time_format
        )
    }
}
