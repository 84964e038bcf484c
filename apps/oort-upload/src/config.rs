//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/oort/config.toml`
//! - Windows: `%APPDATA%/oort/config.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// API credentials and defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account name reported in the `uploader` tag.
    #[serde(default)]
    pub username: String,

    /// API key sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API root URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Organisation subdomain used when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
}

fn default_base_url() -> String {
    "https://api.arcsecond.io".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            api_key: None,
            base_url: default_base_url(),
            organisation: None,
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Writes the configuration to `path`, readable by the owner only.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("oort").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("oort")
            .join("config.toml"))
    }
}
