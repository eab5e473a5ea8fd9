use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use dialoguer::Input;
use gmplayer::clients::{
    Catalog,
    entities::{SearchEntry, SearchKind},
    errors::{Error, Result},
};
use gmplayer::jukebox::{ConfigBuilder, Jukebox, pick};
use gmplayer::player::Player;
use gmplayer::settings::{ExistingFiles, Settings};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

#[derive(Parser)]
#[command(name = "gmplayer")]
#[command(version, about = "Search, download and play music from your catalog", long_about = None)]
struct Cli {
    /// The song you want to download/play
    #[arg(short, long)]
    song: bool,

    /// The album you want to download/play
    #[arg(short, long)]
    album: bool,

    /// Shuffle through albums in your library
    #[arg(short = 'A', long)]
    album_shuffle: bool,

    /// Only download, don't start the player
    #[arg(short, long = "downloadonly")]
    download_only: bool,

    /// Fetch tracks again even if they are already in offline storage
    #[arg(long)]
    redownload: bool,

    /// Settings file to use instead of ~/.gmplayerrc
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Search query for --song / --album
    query: Vec<String>,
}

/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Song,
    Album,
    AlbumShuffle,
}

impl Cli {
    // --song wins over --album, which wins over --album-shuffle
    fn mode(&self) -> Option<Mode> {
        if self.song {
            Some(Mode::Song)
        } else if self.album {
            Some(Mode::Album)
        } else if self.album_shuffle {
            Some(Mode::AlbumShuffle)
        } else {
            None
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Nothing runs until the credentials are set up
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let Some(mode) = cli.mode() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut builder = ConfigBuilder::new(&settings).download_only(cli.download_only);
    if cli.redownload {
        builder = builder.existing_files(ExistingFiles::Redownload);
    }
    let mut config = builder.build()?;

    info!("Authorizing catalog client ...");
    config.catalog.authorize_client().await?;
    let jukebox = Jukebox::new(config);

    let query = cli.query.join(" ");
    match mode {
        Mode::Song => search_and_play(&jukebox, &query, SearchKind::Track).await,
        Mode::Album => search_and_play(&jukebox, &query, SearchKind::Album).await,
        Mode::AlbumShuffle => {
            let played = jukebox.album_shuffle().await?;
            info!("Played {played} albums");
            Ok(())
        }
    }
}

async fn search_and_play<C: Catalog, P: Player>(
    jukebox: &Jukebox<C, P>,
    query: &str,
    kind: SearchKind,
) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::MissingQuery);
    }
    let (looking_up, prompt) = match kind {
        SearchKind::Track => ("Looking up requested song", "What song do you want to play? #"),
        SearchKind::Album => ("Looking up requested album", "What album do you want to play? #"),
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(looking_up);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let entries = jukebox.search(query, kind).await;
    spinner.finish_and_clear();
    let entries = entries?;

    match choose(&entries, prompt)? {
        SearchEntry::Track(track) => {
            jukebox.play_track(track).await?;
        }
        SearchEntry::Album(album) => {
            jukebox.play_album(&album.album_id).await?;
        }
    }
    Ok(())
}

// Print the numbered results and let the operator pick one
fn choose<'a>(entries: &'a [SearchEntry], prompt: &str) -> Result<&'a SearchEntry> {
    for (index, entry) in entries.iter().enumerate() {
        println!("[{index}] {} - {}", entry.title(), entry.artist());
    }
    let index = Input::<usize>::new().with_prompt(prompt).interact_text()?;
    pick(entries, index)
}
