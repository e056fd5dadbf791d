//! Shared fixtures for playback integration tests
//!
//! `MockTransport` lives on the media thread like a real transport, but
//! every call it receives is recorded in a `MockHandle` the test keeps, and
//! the test decides when the current song "finishes".

#![allow(dead_code)]

use mellow_core::{PlaySource, Song, SongRef};
use mellow_playback::{
    InlineDispatcher, NowPlayingListener, NowPlayingState, PlaybackError, PlaybackSession,
    PlayerConfig, PlayerController, Result, Transport,
};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One call the media thread made on the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(PathBuf),
    Play,
    Pause,
    Resume,
    Stop,
    SetVolume(f32),
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    finished: bool,
    failing: HashSet<PathBuf>,
}

/// Test-side view of a `MockTransport`
#[derive(Clone, Default)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Load(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Make the current load report end of media
    pub fn finish(&self) {
        self.state.lock().unwrap().finished = true;
    }

    /// Make every load of `path` fail to decode
    pub fn fail_loads_of(&self, path: &Path) {
        self.state.lock().unwrap().failing.insert(path.to_path_buf());
    }
}

pub struct MockTransport {
    handle: MockHandle,
}

impl MockTransport {
    fn record(&self, call: Call) {
        self.handle.state.lock().unwrap().calls.push(call);
    }
}

impl Transport for MockTransport {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.record(Call::Load(path.to_path_buf()));
        let mut state = self.handle.state.lock().unwrap();
        state.finished = false;
        if state.failing.contains(path) {
            return Err(PlaybackError::transport("corrupt file"));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.record(Call::Play);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(Call::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.record(Call::Resume);
        Ok(())
    }

    fn stop(&mut self) {
        self.record(Call::Stop);
        self.handle.state.lock().unwrap().finished = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(Call::SetVolume(volume));
    }

    fn is_finished(&self) -> bool {
        self.handle.state.lock().unwrap().finished
    }
}

/// Every `(title, playing)` pair listeners were told about
pub type Events = Arc<Mutex<Vec<(Option<String>, bool)>>>;

pub struct Fixture {
    pub session: PlaybackSession,
    pub transport: MockHandle,
    pub songs: Vec<SongRef>,
    pub events: Events,
    pub dir: TempDir,
}

impl Fixture {
    pub fn controller(&self) -> &PlayerController {
        self.session.controller()
    }

    /// Wait for the media thread to handle everything queued so far
    pub fn settle(&self) {
        self.controller().sync().unwrap();
        // A song-ended callback may have queued another load.
        self.controller().sync().unwrap();
    }

    /// Let the current song reach its end and wait for the session to react
    pub fn finish_current(&self) {
        self.settle();
        self.transport.finish();
        self.settle();
    }

    pub fn index_of(&self, song: &SongRef) -> usize {
        self.songs.iter().position(|s| Arc::ptr_eq(s, song)).unwrap()
    }

    pub fn start(&self, index: usize) {
        self.session
            .set_playlist(self.songs.clone(), index, PlaySource::AllSongs)
            .unwrap();
    }

    pub fn last_event(&self) -> Option<(Option<String>, bool)> {
        self.events.lock().unwrap().last().cloned()
    }
}

/// Write an empty audio file per title into a fresh temp dir
pub fn song_files(dir: &TempDir, titles: &[&str]) -> Vec<SongRef> {
    titles
        .iter()
        .map(|title| {
            let path = dir.path().join(format!("{title}.mp3"));
            std::fs::File::create(&path).unwrap().write_all(b"ID3").unwrap();
            Song::builder(*title, path).artist("Test Artist").build_ref()
        })
        .collect()
}

pub fn fixture(titles: &[&str]) -> Fixture {
    fixture_with(titles, PlayerConfig {
        poll_interval_ms: 5,
        ..Default::default()
    })
}

pub fn fixture_with(titles: &[&str], config: PlayerConfig) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let songs = song_files(&dir, titles);

    let now_playing = NowPlayingState::new(Arc::new(InlineDispatcher));
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let listener: Arc<dyn NowPlayingListener> = Arc::new(move |song: Option<&SongRef>, playing: bool| {
        sink.lock()
            .unwrap()
            .push((song.map(|s| s.title().to_string()), playing));
    });
    now_playing.add_listener(listener);

    let transport = MockHandle::default();
    let media_handle = transport.clone();
    let controller = PlayerController::spawn(&config, now_playing, move || {
        Ok(MockTransport {
            handle: media_handle,
        })
    })
    .unwrap();

    Fixture {
        session: PlaybackSession::new(controller, &config),
        transport,
        songs,
        events,
        dir,
    }
}
