//! Scanning real directory trees into the catalog

use mellow_core::{SongId, SongSource};
use mellow_library::{LibraryConfig, LibraryError, LibraryScanner, SongCatalog, UNKNOWN};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"placeholder").unwrap();
}

fn music_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "jazz/Blue in Green.flac");
    touch(dir.path(), "jazz/So What.MP3");
    touch(dir.path(), "jazz/cover.jpg");
    touch(dir.path(), "rock/live/Encore.wav");
    touch(dir.path(), "notes.txt");
    touch(dir.path(), "rock/demo.ogg");
    dir
}

#[test]
fn scan_finds_supported_files_in_path_order() {
    let dir = music_tree();
    let songs = LibraryScanner::new().scan(dir.path()).unwrap();

    let titles: Vec<_> = songs.iter().map(|s| s.title().to_string()).collect();
    assert_eq!(titles, vec!["Blue in Green", "So What", "Encore"]);

    let ids: Vec<_> = songs.iter().map(|s| s.id()).collect();
    assert_eq!(
        ids,
        vec![Some(SongId::new(1)), Some(SongId::new(2)), Some(SongId::new(3))]
    );
    assert!(songs.iter().all(|s| s.artist() == UNKNOWN));
    assert!(songs.iter().all(|s| s.path().starts_with(dir.path())));
}

#[test]
fn scan_respects_configured_extensions() {
    let dir = music_tree();
    let config = LibraryConfig {
        extensions: vec!["ogg".to_string()],
        ..Default::default()
    };
    let songs = LibraryScanner::with_config(&config).scan(dir.path()).unwrap();

    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].title(), "demo");
}

#[test]
fn scanning_a_single_file() {
    let dir = music_tree();
    let scanner = LibraryScanner::new();

    let songs = scanner.scan(&dir.path().join("rock/live/Encore.wav")).unwrap();
    assert_eq!(songs.len(), 1);

    let songs = scanner.scan(&dir.path().join("notes.txt")).unwrap();
    assert!(songs.is_empty());
}

#[test]
fn scanning_a_missing_root_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(
        LibraryScanner::new().scan(&missing),
        Err(LibraryError::NotFound(path)) if path == missing
    ));
}

#[test]
fn catalog_as_song_source() {
    let dir = music_tree();
    let catalog = SongCatalog::new(&LibraryConfig::default());
    let source: &dyn SongSource = &catalog;

    let songs = source.songs(dir.path()).unwrap();
    assert_eq!(songs.len(), 3);
    assert_eq!(catalog.len(), 3);

    let found = source.search("so what").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title(), "So What");

    // Rescanning replaces songs and drops stale cached results.
    touch(dir.path(), "jazz/So What (Live).mp3");
    source.songs(dir.path()).unwrap();
    assert_eq!(source.search("so what").unwrap().len(), 2);
}

#[test]
fn catalog_songs_share_like_flags_with_search_results() {
    let dir = music_tree();
    let catalog = SongCatalog::new(&LibraryConfig::default());
    catalog.load(dir.path()).unwrap();

    let from_search = catalog.search("encore");
    from_search[0].set_liked(true);

    let all = catalog.all_songs();
    let encore = all.iter().find(|s| s.title() == "Encore").unwrap();
    assert!(encore.is_liked());
}
