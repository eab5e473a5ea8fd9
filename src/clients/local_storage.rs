use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::debug;

use crate::clients::{
    entities::{Album, Track},
    errors::Result,
};

const TRACK_EXTENSION: &str = ".mp3";
const PLAYLIST_EXTENSION: &str = ".m3u";

/// Replace every path separator with `|` so metadata can't escape its directory.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if std::path::is_separator(c) { '|' } else { c })
        .collect()
}

/// On-disk music store laid out as `<root>/<artist>/<album>/<title>.mp3`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStorage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn track_dir(&self, track: &Track) -> PathBuf {
        self.root
            .join(sanitize_filename(&track.artist))
            .join(sanitize_filename(&track.album))
    }

    pub fn track_path(&self, track: &Track) -> PathBuf {
        self.track_dir(track)
            .join(sanitize_filename(&format!("{}{TRACK_EXTENSION}", track.title)))
    }

    pub fn album_dir(&self, album: &Album) -> PathBuf {
        self.root
            .join(sanitize_filename(&album.artist))
            .join(sanitize_filename(&album.name))
    }

    pub fn playlist_path(&self, album: &Album) -> PathBuf {
        self.album_dir(album).join(sanitize_filename(&format!(
            "{} - {}{PLAYLIST_EXTENSION}",
            album.artist, album.name
        )))
    }

    /// Write the album's extended M3U playlist, one entry per `(track, path)` in the given order.
    pub async fn write_playlist(&self, album: &Album, entries: &[(&Track, PathBuf)]) -> Result<PathBuf> {
        let playlist_path = self.playlist_path(album);
        tokio::fs::create_dir_all(self.album_dir(album)).await?;
        tokio::fs::write(&playlist_path, render_m3u(entries)).await?;
        debug!(
            "Wrote playlist with {} entries to {playlist_path:?}",
            entries.len()
        );
        Ok(playlist_path)
    }
}

fn render_m3u(entries: &[(&Track, PathBuf)]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for (track, path) in entries {
        let _ = writeln!(out, "#EXTINF:-1,{} - {}", track.artist, track.title);
        let _ = writeln!(out, "{}", path.display());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, artist: &str, album: &str) -> Track {
        Track {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            nid: format!("nid-{title}"),
            album_id: None,
            track_number: None,
        }
    }

    #[test]
    fn sanitize_replaces_separators_with_pipe() {
        assert_eq!(sanitize_filename("AC/DC"), "AC|DC");
        assert_eq!(sanitize_filename("a/b/c.mp3"), "a|b|c.mp3");
        assert_eq!(sanitize_filename("plain name"), "plain name");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for name in ["AC/DC", "//", "", "already|piped", "Live @ Wembley / 1986"] {
            let once = sanitize_filename(name);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn track_path_follows_artist_album_title_layout() {
        let storage = LocalStorage::new("/music");
        let t = track("Back/In Black", "AC/DC", "Back in Black");
        assert_eq!(
            storage.track_path(&t),
            PathBuf::from("/music/AC|DC/Back in Black/Back|In Black.mp3")
        );
    }

    #[test]
    fn playlist_lives_in_album_directory() {
        let storage = LocalStorage::new("/music");
        let album = Album {
            album_id: "B1".into(),
            artist: "AC/DC".into(),
            name: "Highway".into(),
            tracks: vec![],
        };
        assert_eq!(
            storage.playlist_path(&album),
            PathBuf::from("/music/AC|DC/Highway/AC|DC - Highway.m3u")
        );
    }

    #[tokio::test]
    async fn playlist_lists_paths_in_given_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let album = Album {
            album_id: "B1".into(),
            artist: "Portishead".into(),
            name: "Dummy".into(),
            tracks: vec![],
        };
        let first = track("Mysterons", "Portishead", "Dummy");
        let second = track("Sour Times", "Portishead", "Dummy");
        let entries = vec![
            (&first, storage.track_path(&first)),
            (&second, storage.track_path(&second)),
        ];

        let path = storage.write_playlist(&album, &entries).await.unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<_> = contents.lines().collect();

        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(lines[1], "#EXTINF:-1,Portishead - Mysterons");
        assert_eq!(lines[2], storage.track_path(&first).display().to_string());
        assert_eq!(lines[3], "#EXTINF:-1,Portishead - Sour Times");
        assert_eq!(lines[4], storage.track_path(&second).display().to_string());
        assert_eq!(lines.len(), 5);
    }
}
