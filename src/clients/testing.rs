//! In-memory catalog for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::clients::{
    catalog::Catalog,
    entities::{Album, LibraryTrack, SearchEntry, SearchKind, Track},
    errors::{Error, Result},
};

pub(crate) fn track(title: &str, artist: &str, album: &str, nid: &str) -> Track {
    Track {
        title: title.into(),
        artist: artist.into(),
        album: album.into(),
        nid: nid.into(),
        album_id: None,
        track_number: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub entries: Vec<SearchEntry>,
    pub albums: HashMap<String, Album>,
    pub library: Vec<LibraryTrack>,
    pub stream_base: String,
    pub stream_calls: AtomicUsize,
}

impl Catalog for FakeCatalog {
    async fn authorize_client(&mut self) -> Result<()> {
        Ok(())
    }

    async fn search(&self, query: &str, kind: SearchKind) -> Result<Vec<SearchEntry>> {
        let entries: Vec<_> = self
            .entries
            .iter()
            .filter(|e| {
                matches!(
                    (kind, e),
                    (SearchKind::Track, SearchEntry::Track(_)) | (SearchKind::Album, SearchEntry::Album(_))
                )
            })
            .cloned()
            .collect();
        if entries.is_empty() {
            return Err(Error::NoResults {
                query: query.to_string(),
            });
        }
        Ok(entries)
    }

    async fn album_details(&self, album_id: &str) -> Result<Album> {
        self.albums
            .get(album_id)
            .cloned()
            .ok_or_else(|| Error::UnexpectedResponse(format!("unknown album {album_id}")))
    }

    async fn stream_url(&self, track_id: &str) -> Result<String> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}/stream/{track_id}", self.stream_base))
    }

    async fn library(&self) -> Result<Vec<LibraryTrack>> {
        Ok(self.library.clone())
    }
}
