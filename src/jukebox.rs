use std::collections::HashSet;
use std::path::PathBuf;

use futures::stream::{StreamExt, TryStreamExt, iter};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::seq::SliceRandom;

use crate::clients::{
    catalog::{Catalog, HttpCatalog},
    downloader::{Downloaded, Downloader},
    entities::{SearchEntry, SearchKind, Track},
    errors::{Error, Result},
};
use crate::player::{Mplayer, PlayTarget, Player};
use crate::settings::{ExistingFiles, Settings};

/// Pick the entry the operator asked for, rejecting indexes past the end of the list
pub fn pick<T>(items: &[T], index: usize) -> Result<&T> {
    items.get(index).ok_or(Error::SelectionOutOfRange {
        index,
        len: items.len(),
    })
}

const OFFLINE_NOTICE: &str = "Song already found in offline storage, playing that instead.";

/// Message shown to the operator when a track was served from disk
pub fn offline_notice(downloaded: &Downloaded) -> Option<&'static str> {
    match downloaded {
        Downloaded::Cached(_) => Some(OFFLINE_NOTICE),
        Downloaded::Fetched(_) => None,
    }
}

// Configuration for the Jukebox struct
pub struct Config<C, P> {
    pub catalog: C,
    pub player: P,
    pub downloader: Downloader,
    pub concurrency: usize,
    pub download_only: bool,
}

pub struct ConfigBuilder<'a> {
    settings: &'a Settings,
    existing_files: Option<ExistingFiles>,
    download_only: bool,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            existing_files: None, // falls back to the settings file
            download_only: false,
        }
    }

    #[must_use]
    pub fn existing_files(mut self, policy: ExistingFiles) -> Self {
        self.existing_files = Some(policy);
        self
    }

    #[must_use]
    pub fn download_only(mut self, download_only: bool) -> Self {
        self.download_only = download_only;
        self
    }

    pub fn build(self) -> Result<Config<HttpCatalog, Mplayer>> {
        let mut settings = self.settings.clone();
        if let Some(policy) = self.existing_files {
            settings.existing_files = policy;
        }
        Ok(Config {
            catalog: HttpCatalog::from_settings(&settings)?,
            player: Mplayer::from_settings(&settings),
            downloader: Downloader::from_settings(&settings)?,
            concurrency: settings.concurrency(),
            download_only: self.download_only,
        })
    }
}

/// Runs the search, download and playback flows against one authorized catalog
pub struct Jukebox<C, P> {
    config: Config<C, P>,
}

impl<C: Catalog, P: Player> Jukebox<C, P> {
    pub fn new(config: Config<C, P>) -> Self {
        Jukebox { config }
    }

    pub async fn search(&self, query: &str, kind: SearchKind) -> Result<Vec<SearchEntry>> {
        self.config.catalog.search(query, kind).await
    }

    pub async fn download_track(&self, track: &Track) -> Result<Downloaded> {
        self.config
            .downloader
            .download(&self.config.catalog, track)
            .await
    }

    /// Download `track` and play it, unless running download-only. Returns the local file.
    pub async fn play_track(&self, track: &Track) -> Result<PathBuf> {
        let downloaded = self.download_track(track).await?;
        if let Some(notice) = offline_notice(&downloaded) {
            println!("{notice}");
        }
        let path = downloaded.into_path();

        if !self.config.download_only {
            self.config.player.play(&path, PlayTarget::File).await?;
        }
        Ok(path)
    }

    /// Download every track of the album and write its playlist. Returns the playlist path.
    pub async fn download_album(&self, album_id: &str) -> Result<PathBuf> {
        let album = self.config.catalog.album_details(album_id).await?;
        info!(
            "Downloading {} - {} ({} tracks)",
            album.artist,
            album.name,
            album.tracks.len()
        );

        let progress = ProgressBar::new(album.tracks.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{msg} [{wide_bar}] {pos:>3}/{len:3}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        progress.set_message(format!("Downloading {} - {}", album.artist, album.name));

        // `buffered` yields in input order, so paths line up with album.tracks
        let progress_ref = &progress;
        let downloads = iter(album.tracks.iter())
            .map(|track| async move {
                let downloaded = self.download_track(track).await;
                if let Some(notice) = downloaded.as_ref().ok().and_then(offline_notice) {
                    progress_ref.println(notice);
                }
                progress_ref.inc(1);
                downloaded
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect::<Vec<Downloaded>>()
            .await;
        progress.finish_and_clear();
        let downloads = downloads?;

        let entries: Vec<(&Track, PathBuf)> = album
            .tracks
            .iter()
            .zip(downloads.into_iter().map(Downloaded::into_path))
            .collect();
        self.config
            .downloader
            .storage()
            .write_playlist(&album, &entries)
            .await
    }

    /// Download the album and play its playlist, unless running download-only
    pub async fn play_album(&self, album_id: &str) -> Result<PathBuf> {
        let playlist = self.download_album(album_id).await?;
        if !self.config.download_only {
            self.config
                .player
                .play(&playlist, PlayTarget::Playlist)
                .await?;
        }
        Ok(playlist)
    }

    /// Distinct album ids in the library, in order of first appearance
    pub async fn library_albums(&self) -> Result<Vec<String>> {
        let tracks = self.config.catalog.library().await?;
        let mut seen = HashSet::new();
        let albums: Vec<String> = tracks
            .into_iter()
            .filter_map(|t| t.album_id)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        debug!("Library holds {} distinct albums", albums.len());
        Ok(albums)
    }

    /// Play every album in the library in random order, one after another.
    /// Returns how many albums were played.
    pub async fn album_shuffle(&self) -> Result<usize> {
        let mut albums = self.library_albums().await?;
        albums.shuffle(&mut rand::rng());

        for album_id in &albums {
            self.play_album(album_id).await?;
        }
        Ok(albums.len())
    }
}
