//! Configuration loading and root folder resolution
//!
//! Resolution order for every setting, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing or unreadable config file is never fatal: a warning is logged
//! and the compiled defaults apply.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::streak::StreakPolicy;
use crate::{Error, Result};

pub const ENV_ROOT_FOLDER: &str = "TRINORO_ROOT_FOLDER";
pub const ENV_BIND: &str = "TRINORO_BIND";
pub const ENV_FREESOUND_TOKEN: &str = "TRINORO_FREESOUND_TOKEN";
pub const ENV_GEMINI_API_KEY: &str = "TRINORO_GEMINI_API_KEY";
pub const ENV_SHARED_SECRET: &str = "TRINORO_SHARED_SECRET";

pub const DATABASE_FILE: &str = "trinoro.db";

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub freesound_token: Option<String>,
    pub freesound_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub streak_policy: Option<StreakPolicy>,
    pub session_ttl_hours: Option<i64>,
    pub auth_timestamp_skew_ms: Option<i64>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load from an explicit path, or from the platform search locations.
    ///
    /// Falls back to defaults (with a warning) when nothing usable is found.
    pub fn load(explicit: Option<&Path>) -> Self {
        let Some(path) = Self::locate(explicit) else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{} - continuing with defaults", e);
                Self::default()
            }
        }
    }

    /// The explicit path if given, else the first existing file among the
    /// user config dir and (on Linux) /etc
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let user_config = dirs::config_dir().map(|d| d.join("trinoro").join("config.toml"));
        if let Some(path) = user_config {
            if path.exists() {
                return Some(path);
            }
        }

        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/trinoro/config.toml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind: String,
    pub log_level: String,
    pub gemini_model: String,
    pub session_ttl_hours: i64,
    pub auth_timestamp_skew_ms: i64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("trinoro"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\trinoro"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("trinoro"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/trinoro"))
        } else {
            dirs::data_local_dir()
                .map(|d| d.join("trinoro"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/trinoro"))
        };

        Self {
            root_folder,
            bind: "127.0.0.1:5740".to_string(),
            log_level: "info".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            session_ttl_hours: 24 * 30,
            auth_timestamp_skew_ms: 300_000,
        }
    }
}

/// Resolves the root folder (database location)
pub struct RootFolderResolver<'a> {
    cli_arg: Option<PathBuf>,
    toml: &'a TomlConfig,
}

impl<'a> RootFolderResolver<'a> {
    pub fn new(cli_arg: Option<PathBuf>, toml: &'a TomlConfig) -> Self {
        Self { cli_arg, toml }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml.root_folder {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates files inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Validate secret-like values (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve an optional secret: environment first, then TOML.
///
/// Returns `None` when neither source holds a usable value.
pub fn resolve_secret(label: &str, env_var: &str, toml_value: Option<&String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_value = toml_value.filter(|k| is_valid_key(k)).cloned();

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment.",
            label
        );
    }

    match (env_value, toml_value) {
        (Some(key), _) => {
            info!("{} loaded from environment variable", label);
            Some(key)
        }
        (None, Some(key)) => {
            info!("{} loaded from TOML config", label);
            Some(key)
        }
        (None, None) => None,
    }
}
