/// Interactive player loop
use crate::command::{Command, HELP};
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use mellow_core::{PlaySource, SongRef, UserId};
use mellow_library::SongCatalog;
use mellow_playback::{
    LikeService, NowPlayingState, PlaybackSession, PlayerController, SilentTransport, UiDispatcher,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the controller and session, picking the transport from config
pub fn build_session(config: &AppConfig, dispatcher: Arc<dyn UiDispatcher>) -> Result<PlaybackSession> {
    let now_playing = NowPlayingState::new(dispatcher);
    let controller = spawn_controller(config, now_playing)?;
    Ok(PlaybackSession::new(controller, &config.player))
}

#[cfg(feature = "desktop")]
fn spawn_controller(config: &AppConfig, now_playing: NowPlayingState) -> Result<PlayerController> {
    if !config.output.silent {
        info!("Using audio output");
        return Ok(PlayerController::spawn(
            &config.player,
            now_playing,
            mellow_playback::CpalTransport::new,
        )?);
    }
    spawn_silent(config, now_playing)
}

#[cfg(not(feature = "desktop"))]
fn spawn_controller(config: &AppConfig, now_playing: NowPlayingState) -> Result<PlayerController> {
    if !config.output.silent {
        warn!("Built without audio output, songs will play silently");
    }
    spawn_silent(config, now_playing)
}

fn spawn_silent(config: &AppConfig, now_playing: NowPlayingState) -> Result<PlayerController> {
    let length = config.output.silent_length();
    info!(?length, "Using silent output");
    Ok(PlayerController::spawn(&config.player, now_playing, move || {
        Ok(SilentTransport::new(length))
    })?)
}

/// Render a song for the terminal
pub fn describe(song: &SongRef) -> String {
    let liked = if song.is_liked() { " (liked)" } else { "" };
    if song.artist().is_empty() {
        format!("{}{liked}", song.title())
    } else {
        format!("{} - {}{liked}", song.title(), song.artist())
    }
}

/// Executes commands against one session
pub struct Player {
    session: PlaybackSession,
    catalog: Arc<SongCatalog>,
    likes: LikeService,
    user: UserId,
    results: Vec<SongRef>,
}

impl Player {
    pub fn new(session: PlaybackSession, catalog: Arc<SongCatalog>, likes: LikeService, user: UserId) -> Self {
        Self {
            session,
            catalog,
            likes,
            user,
            results: Vec::new(),
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Start the whole catalog at `start`
    pub fn start(&self, start: usize, source: PlaySource) -> Result<()> {
        let songs = self.catalog.all_songs();
        for song in &songs {
            self.likes.refresh(self.user, song);
        }
        self.session.set_playlist(songs, start, source)?;
        Ok(())
    }

    /// Read commands line by line until `q` or end of input
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<Command>() {
                Ok(command) => match self.execute(command, out) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => writeln!(out, "error: {e}")?,
                },
                Err(e) => writeln!(out, "{e}")?,
            }
        }
        Ok(())
    }

    /// Run one command; returns `false` when the loop should end
    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<bool> {
        match command {
            Command::Next => self.session.play_next()?,
            Command::Previous => self.session.play_previous()?,
            Command::TogglePlayPause => self.session.toggle_play_pause()?,
            Command::Play => self.session.play()?,
            Command::Stop => self.session.stop()?,
            Command::ToggleLoop => {
                let looping = self.session.toggle_loop();
                writeln!(out, "loop {}", if looping { "on" } else { "off" })?;
            }
            Command::Volume(volume) => {
                self.session.set_volume(volume);
                writeln!(out, "volume {:.2}", self.session.volume())?;
            }
            Command::Like => {
                let Some(song) = self.session.current_song() else {
                    writeln!(out, "nothing playing")?;
                    return Ok(true);
                };
                if self.likes.toggle_like(self.user, &song) {
                    writeln!(out, "{}", describe(&song))?;
                } else {
                    writeln!(out, "could not update likes for {}", song.title())?;
                }
            }
            Command::Search(query) => {
                self.results = self.catalog.search(&query).as_ref().clone();
                if self.results.is_empty() {
                    writeln!(out, "no matches")?;
                }
                for (i, song) in self.results.iter().enumerate() {
                    writeln!(out, "{:>3}. {}", i + 1, describe(song))?;
                }
            }
            Command::Pick(n) => {
                let index = n
                    .checked_sub(1)
                    .ok_or_else(|| CliError::InvalidArgument("results are numbered from 1".to_string()))?;
                if index >= self.results.len() {
                    return Err(CliError::InvalidArgument(format!(
                        "only {} search results",
                        self.results.len()
                    )));
                }
                self.session
                    .set_playlist(self.results.clone(), index, PlaySource::AllSongs)?;
            }
            Command::Status => self.print_status(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => {
                self.session.stop()?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn print_status(&self, out: &mut impl Write) -> Result<()> {
        let now = self.session.now_playing().snapshot();
        let len = self.session.playlist().len();
        let position = self
            .session
            .current_index()
            .map(|i| format!("{}/{len}", i + 1))
            .unwrap_or_else(|| format!("-/{len}"));

        match &now.song {
            Some(song) => writeln!(
                out,
                "{} {} [{position}]",
                if now.playing { "playing" } else { "paused" },
                describe(song)
            )?,
            None => writeln!(out, "stopped [{position}]")?,
        }
        writeln!(
            out,
            "loop {} | volume {:.2} | from {} (back to {})",
            if self.session.is_looping() { "on" } else { "off" },
            self.session.volume(),
            now.source,
            now.source.screen_name()
        )?;
        Ok(())
    }
}
