use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::io::AsyncWriteExt;

use crate::clients::{
    catalog::Catalog,
    entities::Track,
    errors::{Error, Result},
    local_storage::LocalStorage,
};
use crate::settings::{ExistingFiles, Settings};

/// Where a downloaded track ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Downloaded {
    /// Already on disk, nothing was fetched
    Cached(PathBuf),
    Fetched(PathBuf),
}

impl Downloaded {
    pub fn path(&self) -> &Path {
        match self {
            Downloaded::Cached(p) | Downloaded::Fetched(p) => p,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Downloaded::Cached(p) | Downloaded::Fetched(p) => p,
        }
    }
}

/// Streams track audio from the catalog into [`LocalStorage`]
pub struct Downloader {
    http: reqwest::Client,
    storage: LocalStorage,
    existing_files: ExistingFiles,
}

impl Downloader {
    pub fn new(http: reqwest::Client, storage: LocalStorage, existing_files: ExistingFiles) -> Self {
        Downloader {
            http,
            storage,
            existing_files,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.request_timeout())
            .timeout(settings.download_timeout())
            .build()?;
        Ok(Downloader::new(
            http,
            LocalStorage::new(settings.music_dir()?),
            settings.existing_files,
        ))
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Download `track` unless its file is already present and the policy allows reusing it.
    ///
    /// Bytes land in a `.part` file that is renamed into place only once the body is complete,
    /// so an interrupted download never looks like a finished one.
    pub async fn download<C: Catalog>(&self, catalog: &C, track: &Track) -> Result<Downloaded> {
        let path = self.storage.track_path(track);

        if self.existing_files == ExistingFiles::Reuse && tokio::fs::try_exists(&path).await? {
            info!("{:?} already found in offline storage", track.title);
            return Ok(Downloaded::Cached(path));
        }

        let url = catalog.stream_url(&track.nid).await?;
        tokio::fs::create_dir_all(self.storage.track_dir(track)).await?;

        let mut response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| download_error(track, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api { status, url });
        }

        let partial = partial_path(&path);
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut written = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| download_error(track, source))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, &path).await?;
        debug!("Downloaded {written} bytes to {path:?}");
        Ok(Downloaded::Fetched(path))
    }
}

fn download_error(track: &Track, source: reqwest::Error) -> Error {
    Error::Download {
        track: format!("{} - {}", track.artist, track.title),
        source,
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
