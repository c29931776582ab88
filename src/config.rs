//! Configuration module for the commit watch pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DW_` and use double underscores
//! to separate nested levels:
//! - `DW_WATCH__SETTLE_MS=750` sets `watch.settle_ms`
//! - `DW_REVIEW__BASE_URL=http://10.0.0.5:5142` sets `review.base_url`
//! - `DW_REVIEW__ORG_ID=2` sets `review.org_id`
//! - `DW_AUTH__TOKEN=<jwt>` sets `auth.token` for non-interactive runs

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .diffwatch is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Watch session configuration
    #[serde(default)]
    pub watch: WatchConfig,

    /// Review backend configuration
    #[serde(default)]
    pub review: ReviewConfig,

    /// Login configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Test generation configuration
    #[serde(default)]
    pub testgen: TestGenConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// How long a ref-file burst settles before the diff is read (milliseconds).
    /// Measured from the first matching event of the burst.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Resolve the currently selected project as soon as watching starts.
    /// When false, the manager stays idle until the first selection change.
    #[serde(default = "default_true")]
    pub resolve_on_start: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReviewConfig {
    /// Base URL of the review backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Organization id sent with every analyze request
    #[serde(default = "default_org_id")]
    pub org_id: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Login email. The password is always prompted, never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Bearer token for the review backend, usually injected through
    /// `DW_AUTH__TOKEN`. Read from the environment or config file but
    /// never written back on save.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TestGenConfig {
    /// Directory under the project root where generated tests land
    #[serde(default = "default_testgen_dir")]
    pub output_dir: PathBuf,

    /// File name for the generated test
    #[serde(default = "default_testgen_file")]
    pub file_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_settle_ms() -> u64 {
    500
}
fn default_base_url() -> String {
    "http://127.0.0.1:5142".to_string()
}
fn default_org_id() -> u64 {
    1
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_testgen_dir() -> PathBuf {
    PathBuf::from("test")
}
fn default_testgen_file() -> String {
    "GeneratedTest.java".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            watch: WatchConfig::default(),
            review: ReviewConfig::default(),
            auth: AuthConfig::default(),
            testgen: TestGenConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            resolve_on_start: true,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            org_id: default_org_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TestGenConfig {
    fn default() -> Self {
        Self {
            output_dir: default_testgen_dir(),
            file_name: default_testgen_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .diffwatch directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".diffwatch/settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with DW_ prefix
            // Use double underscore (__) to separate nested levels
            // Single underscore (_) remains as is within field names
            .merge(Env::prefixed("DW_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".") // Double underscore becomes dot
                    .into()
            }))
            // Extract into Settings struct
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Find the workspace root by looking for .diffwatch directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".diffwatch");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        // Try to find workspace config
        let config_path = if let Some(path) = Self::find_workspace_config() {
            path
        } else {
            // No workspace found, check current directory
            PathBuf::from(".diffwatch/settings.toml")
        };

        // Check if settings.toml exists
        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        // Try to parse the config file to check if it's valid
        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'diffwatch init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Get the workspace root directory (where .diffwatch is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".diffwatch");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Load configuration from a specific file, without environment overrides.
    /// Used by tests and by `--config` style invocations where the caller
    /// wants exactly the file contents over defaults.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(Box::new)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(".diffwatch/settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        // Create settings with detected workspace root
        let mut settings = Settings::default();

        // Set workspace root to current directory
        if let Ok(current_dir) = std::env::current_dir() {
            settings.workspace_root = Some(current_dir);
        }

        settings.save(&config_path)?;
        if force && config_path.exists() {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }
}
