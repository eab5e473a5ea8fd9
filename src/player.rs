use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use crate::clients::errors::{Error, Result};
use crate::settings::Settings;

/// What the player is pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayTarget {
    File,
    Playlist,
}

/// Plays a local file or playlist, returning once playback has ended
#[allow(async_fn_in_trait)]
pub trait Player {
    async fn play(&self, path: &Path, target: PlayTarget) -> Result<()>;
}

/// Audio output driver for the platform we were built for, if mplayer has a known one
pub fn default_audio_output() -> Option<&'static str> {
    if cfg!(target_os = "linux") {
        Some("alsa")
    } else if cfg!(target_os = "macos") {
        Some("coreaudio")
    } else {
        None
    }
}

/// External `mplayer` process sharing the terminal with us
pub struct Mplayer {
    binary: String,
    audio_output: Option<String>,
}

impl Mplayer {
    pub fn new(binary: impl Into<String>, audio_output: Option<String>) -> Self {
        Mplayer {
            binary: binary.into(),
            audio_output,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let audio_output = settings
            .audio_output
            .clone()
            .or_else(|| default_audio_output().map(String::from));
        Mplayer::new(settings.player(), audio_output)
    }

    pub fn args(&self, path: &Path, target: PlayTarget) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if let Some(engine) = &self.audio_output {
            args.push("-ao".into());
            args.push(engine.into());
        }
        if target == PlayTarget::Playlist {
            args.push("-playlist".into());
        }
        args.push(path.as_os_str().to_owned());
        args
    }
}

impl Player for Mplayer {
    async fn play(&self, path: &Path, target: PlayTarget) -> Result<()> {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        println!("Playing {name}\n");

        let args = self.args(path, target);
        debug!("Spawning {} {args:?}", self.binary);
        // stdin stays with the terminal so seek/pause keys reach the player
        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::PlayerSpawn {
                player: self.binary.clone(),
                source,
            })?;

        if let Some(player_out) = child.stdout.take() {
            let mut filter = BannerFilter::new();
            if let Err(err) = pump(player_out, tokio::io::stdout(), &mut filter).await {
                // kill() also reaps the child
                if let Err(kill_err) = child.kill().await {
                    warn!("Could not stop {}: {kill_err}", self.binary);
                }
                return Err(err.into());
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            warn!("{} exited with {status}", self.binary);
        }
        Ok(())
    }
}

/// Copy player output to `writer` through `filter` until the player closes its end
async fn pump<R, W>(mut reader: R, mut writer: W, filter: &mut BannerFilter) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        let shown = filter.feed(&buf[..n]);
        if !shown.is_empty() {
            writer.write_all(&shown).await?;
            writer.flush().await?;
        }
    }
}

/// Swallows player output until its first progress line (`A: ...`), then passes everything through.
#[derive(Debug)]
pub struct BannerFilter {
    passing: bool,
    at_line_start: bool,
    pending_a: bool,
}

impl Default for BannerFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl BannerFilter {
    pub fn new() -> Self {
        BannerFilter {
            passing: false,
            at_line_start: true,
            pending_a: false,
        }
    }

    /// Bytes of `chunk` that should reach the terminal
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<u8> {
        if self.passing {
            return chunk.to_vec();
        }

        for (i, &b) in chunk.iter().enumerate() {
            if self.pending_a {
                self.pending_a = false;
                if b == b':' {
                    self.passing = true;
                    let mut out = b"A".to_vec();
                    out.extend_from_slice(&chunk[i..]);
                    return out;
                }
            }
            if self.at_line_start && b == b'A' {
                self.pending_a = true;
                self.at_line_start = false;
                continue;
            }
            // mplayer rewrites its status line with \r
            self.at_line_start = b == b'\n' || b == b'\r';
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn args_for_single_file() {
        let player = Mplayer::new("mplayer", Some("alsa".into()));
        let args = player.args(Path::new("/m/a/b/Song.mp3"), PlayTarget::File);
        assert_eq!(args, vec!["-ao", "alsa", "/m/a/b/Song.mp3"]);
    }

    #[test]
    fn args_for_playlist() {
        let player = Mplayer::new("mplayer", Some("coreaudio".into()));
        let args = player.args(Path::new("/m/a/b/A - B.m3u"), PlayTarget::Playlist);
        assert_eq!(args, vec!["-ao", "coreaudio", "-playlist", "/m/a/b/A - B.m3u"]);
    }

    #[test]
    fn args_without_known_audio_output() {
        let player = Mplayer::new("mplayer", None);
        let args = player.args(Path::new("x.mp3"), PlayTarget::File);
        assert_eq!(args, vec!["x.mp3"]);
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let player = Mplayer::new("gmplayer-test-no-such-player", None);
        let err = player
            .play(&PathBuf::from("song.mp3"), PlayTarget::File)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PlayerSpawn { .. }));
        assert!(err.to_string().contains("maybe you need to install"));
    }

    #[test]
    fn banner_is_suppressed_until_progress_line() {
        let mut filter = BannerFilter::new();
        assert!(filter.feed(b"MPlayer 1.4 (C) 2000-2019\n").is_empty());
        assert!(filter.feed(b"AUDIO: 44100 Hz, 2 ch\nStarting playback...\n").is_empty());
        assert_eq!(filter.feed(b"A:   0.1 (00.1) of 215.0\r"), b"A:   0.1 (00.1) of 215.0\r");
        assert_eq!(filter.feed(b"anything after"), b"anything after");
    }

    #[test]
    fn progress_marker_inside_a_chunk_is_cut_at_the_marker() {
        let mut filter = BannerFilter::new();
        let shown = filter.feed(b"Starting playback...\nA:   0.1 of 215.0\r");
        assert_eq!(shown, b"A:   0.1 of 215.0\r");
    }

    #[test]
    fn progress_marker_split_across_chunks() {
        let mut filter = BannerFilter::new();
        assert!(filter.feed(b"Starting playback...\nA").is_empty());
        assert_eq!(filter.feed(b":   0.1\r"), b"A:   0.1\r");
    }

    #[tokio::test]
    async fn pump_forwards_only_progress_output() {
        let mut filter = BannerFilter::new();
        let mut out = Vec::new();
        pump(&b"MPlayer 1.4
A:   0.1 of 9.0\r"[..], &mut out, &mut filter)
            .await
            .unwrap();
        assert_eq!(out, b"A:   0.1 of 9.0\r");
    }

    struct BrokenTerminal;

    impl AsyncWrite for BrokenTerminal {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
            _: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn pump_reports_write_failures() {
        let mut filter = BannerFilter::new();
        let err = pump(&b"A: 1.0\r"[..], BrokenTerminal, &mut filter)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn marker_in_the_middle_of_a_line_is_not_progress() {
        let mut filter = BannerFilter::new();
        assert!(filter.feed(b"Playing TRACK A: Intro.mp3\n").is_empty());
    }
}
