//! Sender configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/mailpack/mailpack.toml`
//! - Windows: `%APPDATA%/mailpack/mailpack.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Mail account and packaging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendConfig {
    /// Mail server host name.
    #[serde(default = "default_host")]
    pub host: String,

    /// Submission port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upgrade the connection with STARTTLS before authenticating.
    #[serde(default = "default_starttls")]
    pub starttls: bool,

    /// Account name, also used as the From address.
    #[serde(default)]
    pub login: String,

    /// Account password. Leave empty to be prompted on every run.
    #[serde(default)]
    pub password: String,

    /// Charset declared on the text part of outgoing messages.
    #[serde(default = "default_charset")]
    pub email_charset: String,

    /// Attachment payload limit per message, in mebibytes.
    #[serde(default = "default_package_size_mb")]
    pub max_package_size_mb: u64,
}

fn default_host() -> String {
    "smtp.gmail.com".into()
}

fn default_port() -> u16 {
    587
}

fn default_starttls() -> bool {
    true
}

fn default_charset() -> String {
    "utf-8".into()
}

fn default_package_size_mb() -> u64 {
    5
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            starttls: default_starttls(),
            login: String::new(),
            password: String::new(),
            email_charset: default_charset(),
            max_package_size_mb: default_package_size_mb(),
        }
    }
}

impl SendConfig {
    /// Loads the configuration from the default location.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads the configuration from a specific path.
    ///
    /// On first run a template is written and loading fails: the account
    /// fields start out blank and have to be filled in before anything
    /// can be sent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: SendConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = SendConfig::default();
            config.save_to(path)?;
            anyhow::bail!(
                "wrote a configuration template to {}; fill in login and password, then run again",
                path.display()
            )
        }
    }

    /// Saves the configuration to disk.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix (contains the account password).
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
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("mailpack")
            .join("mailpack.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("mailpack").join("mailpack.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/mailpack/mailpack.toml"))
    }
}
