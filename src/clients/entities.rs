use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Catalog identifier used to request a stream URL
    pub nid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
}

/// Library feed item. Uploaded and catalog tracks carry different ids, so nothing is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryTrack {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_id: Option<String>,
}

impl From<Track> for LibraryTrack {
    fn from(track: Track) -> Self {
        LibraryTrack {
            title: Some(track.title),
            artist: Some(track.artist),
            album: Some(track.album),
            album_id: track.album_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub album_id: String,
    pub artist: String,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Kind of result a search is filtered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Track,
    Album,
}

impl SearchKind {
    /// Type code the catalog tags raw search entries with
    pub fn code(self) -> &'static str {
        match self {
            SearchKind::Track => "1",
            SearchKind::Album => "3",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEntry {
    Track(Track),
    Album(Album),
}

impl SearchEntry {
    pub fn title(&self) -> &str {
        match self {
            SearchEntry::Track(t) => &t.title,
            SearchEntry::Album(a) => &a.name,
        }
    }

    pub fn artist(&self) -> &str {
        match self {
            SearchEntry::Track(t) => &t.artist,
            SearchEntry::Album(a) => &a.artist,
        }
    }
}

/// Raw search entry as the catalog returns it, before filtering by kind
#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub track: Option<Track>,
    #[serde(default)]
    pub album: Option<Album>,
}

impl RawSearchEntry {
    pub(crate) fn into_entry(self, kind: SearchKind) -> Option<SearchEntry> {
        if self.kind != kind.code() {
            return None;
        }
        match kind {
            SearchKind::Track => self.track.map(SearchEntry::Track),
            SearchKind::Album => self.album.map(SearchEntry::Album),
        }
    }
}
