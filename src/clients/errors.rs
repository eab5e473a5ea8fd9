use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Go to {} and add your email and password", .path.display())]
    SetupRequired { path: PathBuf },

    #[error("Failed to parse settings file")]
    SettingsParse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {reason}")]
    Authentication {
        reason: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Catalog client is not authorized, log in first")]
    NotAuthorized,

    #[error("No songs/albums were found for \"{query}\", please try again!")]
    NoResults { query: String },

    #[error("Catalog API returned {status} for {url}")]
    Api {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("Catalog API unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Selection {index} is out of range, pick a number between 0 and {}", .len.saturating_sub(1))]
    SelectionOutOfRange { index: usize, len: usize },

    #[error("Missing search query, pass it after the flags")]
    MissingQuery,

    #[error("Failed to read selection")]
    Prompt(#[from] dialoguer::Error),

    #[error("Failed to download \"{track}\"")]
    Download {
        track: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Filesystem error")]
    Io(#[from] std::io::Error),

    #[error("There was an error playing your song, maybe you need to install {player}?")]
    PlayerSpawn {
        player: String,
        #[source]
        source: std::io::Error,
    },
}
