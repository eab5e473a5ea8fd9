use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clients::errors::{Error, Result};

const SETTINGS_FILE: &str = ".gmplayerrc";
const PLACEHOLDER_EMAIL: &str = "add_your_email_here";
const PLACEHOLDER_PASSWORD: &str = "add_your_password_here";

/// Upper bound on parallel track downloads within one album
pub const MAX_CONCURRENCY: usize = 8;

/// What to do when a track's destination file is already on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingFiles {
    /// Treat the file as a complete download and skip the network
    #[default]
    Reuse,
    /// Fetch the track again and replace the file
    Redownload,
}

/// Contents of `~/.gmplayerrc`. Built once at start-up and handed to whoever needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_timeout_secs: Option<u64>,
    #[serde(default)]
    pub existing_files: ExistingFiles,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_output: Option<String>,
}

impl Settings {
    fn placeholder() -> Self {
        Settings {
            email: PLACEHOLDER_EMAIL.into(),
            password: PLACEHOLDER_PASSWORD.into(),
            api_url: None,
            music_dir: None,
            concurrency: None,
            request_timeout_secs: None,
            download_timeout_secs: None,
            existing_files: ExistingFiles::default(),
            player: None,
            audio_output: None,
        }
    }

    /// Load settings from `$HOME/.gmplayerrc`
    pub fn load() -> Result<Self> {
        Self::load_from(&default_path()?)
    }

    /// Load settings from `path`, writing a placeholder file first if there is none.
    ///
    /// Fails with [`Error::SetupRequired`] until the placeholder credentials are replaced.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let contents = serde_json::to_string_pretty(&Settings::placeholder())?;
            std::fs::write(path, contents)?;
            debug!("Created placeholder settings at {path:?}");
            return Err(Error::SetupRequired {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        if settings.is_placeholder() {
            return Err(Error::SetupRequired {
                path: path.to_path_buf(),
            });
        }
        debug!("Loaded settings for {} from {path:?}", settings.email);
        Ok(settings)
    }

    fn is_placeholder(&self) -> bool {
        self.email == PLACEHOLDER_EMAIL || self.password == PLACEHOLDER_PASSWORD
    }

    /// Base URL of the catalog service. There is no built-in one, it must be set.
    pub fn api_url(&self) -> Result<&str> {
        match self.api_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(Error::Configuration(
                "set \"api_url\" in the settings file to your catalog service".into(),
            )),
        }
    }

    /// Root of the local music store, `$HOME/Music/gmplayer` unless overridden
    pub fn music_dir(&self) -> Result<PathBuf> {
        match &self.music_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(home_dir()?.join("Music").join("gmplayer")),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or(4).clamp(1, MAX_CONCURRENCY)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(30))
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs.unwrap_or(600))
    }

    pub fn player(&self) -> &str {
        self.player.as_deref().unwrap_or("mplayer")
    }
}

/// Location of the settings file in the user's home directory
pub fn default_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(SETTINGS_FILE))
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| Error::Configuration("Can't determine home directory".into()))
}
