//! Persistent settings for a synced directory.
//!
//! Settings live in `<local_root>/.munkey/config.toml`; a user-wide file under
//! the platform config directory is used when a project has none.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::fs::{LocalStore, RemoteStore};
use crate::sync::SyncOptions;

pub const PROJECT_DIR: &str = ".munkey";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub sync: SyncSettings,
}

/// Where the remote tree lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Remote URL without credentials, e.g. `file:///srv/site`.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Defaults applied to `pull`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub delete: bool,
    pub skip_errors: bool,
    /// Extra ignore rules, appended after `.gitignore`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<String>,
}

impl Settings {
    /// Settings for `url`, moving any credentials out of the URL itself.
    pub fn from_url(url: &str) -> Result<Self> {
        let mut parsed = Url::parse(url).with_context(|| format!("Invalid remote URL: {}", url))?;

        let user = match parsed.username() {
            "" => None,
            name => Some(name.to_string()),
        };
        let password = parsed.password().map(str::to_string);
        // Only fails for URLs that cannot carry credentials in the first place
        let _ = parsed.set_username("");
        let _ = parsed.set_password(None);

        Ok(Self {
            remote: RemoteSettings {
                url: parsed.to_string(),
                user,
                password,
            },
            sync: SyncSettings::default(),
        })
    }

    pub fn project_path(local_root: &Path) -> PathBuf {
        local_root.join(PROJECT_DIR).join(CONFIG_FILE)
    }

    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("munkey").join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    /// Project settings if present, else user-wide settings, else defaults.
    pub fn discover(local_root: &Path) -> Result<Self> {
        let project = Self::project_path(local_root);
        if project.is_file() {
            return Self::load(&project);
        }
        match Self::global_path() {
            Some(global) if global.is_file() => Self::load(&global),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).with_context(|| format!("Failed to write settings: {}", path.display()))
    }

    /// Pull options from the `[sync]` table.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            delete: self.sync.delete,
            skip_errors: self.sync.skip_errors,
            ..SyncOptions::default()
        }
    }

    /// Open the configured store and return it with the remote root path.
    pub fn open_remote(&self) -> Result<(Box<dyn RemoteStore>, String)> {
        if self.remote.url.is_empty() {
            bail!("No remote configured; run `munkey clone <url> <dir>` first");
        }
        let url = Url::parse(&self.remote.url)
            .with_context(|| format!("Invalid remote URL: {}", self.remote.url))?;

        match url.scheme() {
            "file" => {
                let root = url
                    .to_file_path()
                    .map_err(|_| anyhow::anyhow!("Not a local path: {}", url))?;
                Ok((Box::new(LocalStore::new(root)), "/".to_string()))
            }
            scheme => bail!(
                "No transport for {}:// remotes (host {}); only file:// is built in",
                scheme,
                url.host_str().unwrap_or("?")
            ),
        }
    }
}
