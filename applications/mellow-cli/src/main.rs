/// Mellow - headless music player
use clap::{Parser, Subcommand};
use mellow_cli::{build_session, describe, AppConfig, Player};
use mellow_core::{PlaySource, SongRef, UserId};
use mellow_library::{InMemoryLikedStore, LibraryScanner, SongCatalog};
use mellow_playback::{LikeService, ThreadDispatcher, UiDispatcher};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mellow")]
#[command(about = "Mellow Player headless music player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MELLOW_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the songs found in a directory
    Scan {
        /// Directory to scan
        dir: PathBuf,
    },
    /// Play every song in a directory
    Play {
        /// Directory to play
        dir: PathBuf,
        /// Index of the first song (0-based, in scan order)
        #[arg(short, long, default_value_t = 0)]
        start: usize,
        /// Repeat the current song
        #[arg(short = 'l', long = "loop")]
        looping: bool,
        /// Screen playback was started from (dashboard, all_songs, playlist, liked_songs, recommendation)
        #[arg(long, default_value = "all_songs")]
        source: String,
        /// Do not open an audio device
        #[arg(long)]
        silent: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mellow_cli=info,mellow_playback=info,mellow_library=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { dir } => {
            let songs = LibraryScanner::with_config(&config.library).scan(&dir)?;
            for song in &songs {
                println!("{}", describe(song));
            }
            tracing::info!(count = songs.len(), "Scan complete");
        }
        Commands::Play {
            dir,
            start,
            looping,
            source,
            silent,
        } => {
            let source = PlaySource::from_name(&source)
                .ok_or_else(|| anyhow::anyhow!("unknown play source '{source}'"))?;
            config.player.looping |= looping;
            config.output.silent |= silent;
            play(&config, &dir, start, source)?;
        }
    }

    Ok(())
}

fn play(config: &AppConfig, dir: &Path, start: usize, source: PlaySource) -> anyhow::Result<()> {
    let catalog = Arc::new(SongCatalog::new(&config.library));
    let count = catalog.load(dir)?;
    if count == 0 {
        anyhow::bail!("no playable files in {}", dir.display());
    }
    tracing::info!(count, dir = %dir.display(), "Library loaded");

    let dispatcher: Arc<dyn UiDispatcher> = Arc::new(ThreadDispatcher::spawn()?);
    let session = build_session(config, dispatcher.clone())?;

    session
        .now_playing()
        .add_listener(Arc::new(|song: Option<&SongRef>, playing: bool| match song {
            Some(song) if playing => println!("> {}", describe(song)),
            Some(song) => println!("|| {}", describe(song)),
            None => println!("[]"),
        }));

    let likes = LikeService::new(Arc::new(InMemoryLikedStore::new()), dispatcher);
    let mut player = Player::new(session, catalog, likes, UserId::new(config.output.user_id));
    player.start(start, source)?;

    println!("Type h for help");
    let stdin = io::stdin();
    player.run(stdin.lock(), &mut io::stdout())?;
    Ok(())
}
