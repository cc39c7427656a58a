//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "BMCAT_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "bmcat.db";

/// Default spacing between successive osu! API calls during reconciliation
pub const DEFAULT_INTER_CALL_DELAY_MS: u64 = 1000;

/// Contents of `config.toml`
///
/// Every field is optional so a partial file (or no file at all) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<String>,
    pub port: Option<u16>,
    /// Bearer token granting moderator/admin rights on the HTTP API
    pub admin_token: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub osu: OsuConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[osu]` section: OAuth client credentials for the osu! API v2
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsuConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Override for the API host (tests, mirrors)
    pub base_url: Option<String>,
}

/// `[reconcile]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,
    /// Upper bound on total run time; unbounded when absent
    pub max_run_seconds: Option<u64>,
    /// Upper bound on items visited per run; unbounded when absent
    pub max_items: Option<usize>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: default_inter_call_delay_ms(),
            max_run_seconds: None,
            max_items: None,
        }
    }
}

fn default_inter_call_delay_ms() -> u64 {
    DEFAULT_INTER_CALL_DELAY_MS
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the platform default location is
/// tried and a missing file yields `TomlConfig::default()`.
pub fn load_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit_path {
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) => {
            tracing::info!("Loading config file: {}", path.display());
            load_toml_config(&path)
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// First existing config file: user config dir, then `/etc/bmcat` on Linux
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("bmcat").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/bmcat/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(root_folder) = &config.root_folder {
        return PathBuf::from(root_folder);
    }

    get_default_root_folder()
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/bmcat (or /var/lib/bmcat for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("bmcat"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/bmcat"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("bmcat"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/bmcat"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("bmcat"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\bmcat"))
    } else {
        PathBuf::from("./bmcat_data")
    }
}

/// Create the root folder if missing and return the database path inside it
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE_NAME))
}
