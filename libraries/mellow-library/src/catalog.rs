/// In-memory song catalog with cached search
use crate::config::LibraryConfig;
use crate::scanner::LibraryScanner;
use lru::LruCache;
use mellow_core::{SongRef, SongSource};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Every known song plus an LRU cache of recent search results
///
/// Queries are cached by their trimmed, lowercased text. Any change to the
/// song list drops the cache.
pub struct SongCatalog {
    scanner: LibraryScanner,
    songs: Mutex<Vec<SongRef>>,
    cache: Mutex<LruCache<String, Arc<Vec<SongRef>>>>,
}

impl SongCatalog {
    /// Create an empty catalog
    pub fn new(config: &LibraryConfig) -> Self {
        let capacity = NonZeroUsize::new(config.search_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            scanner: LibraryScanner::with_config(config),
            songs: Mutex::new(Vec::new()),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Replace every song with the result of scanning `root`
    pub fn load(&self, root: &Path) -> crate::Result<usize> {
        let songs = self.scanner.scan(root)?;
        let count = songs.len();
        self.set_songs(songs);
        Ok(count)
    }

    /// Snapshot of all songs
    pub fn all_songs(&self) -> Vec<SongRef> {
        lock(&self.songs).clone()
    }

    /// Replace all songs
    pub fn set_songs(&self, songs: Vec<SongRef>) {
        *lock(&self.songs) = songs;
        self.clear_cache();
    }

    /// Add a song unless an equal one is already present
    pub fn add_song(&self, song: SongRef) -> bool {
        let mut songs = lock(&self.songs);
        if songs.contains(&song) {
            return false;
        }
        songs.push(song);
        drop(songs);
        self.clear_cache();
        true
    }

    /// Remove the first song equal to `song`
    pub fn remove_song(&self, song: &SongRef) -> bool {
        let mut songs = lock(&self.songs);
        let Some(pos) = songs.iter().position(|s| s == song) else {
            return false;
        };
        songs.remove(pos);
        drop(songs);
        self.clear_cache();
        true
    }

    /// Number of songs
    pub fn len(&self) -> usize {
        lock(&self.songs).len()
    }

    /// Whether the catalog has no songs
    pub fn is_empty(&self) -> bool {
        lock(&self.songs).is_empty()
    }

    /// Songs whose title, artist or album contain every word of `query`
    ///
    /// Matching is case-insensitive and results are ordered by title. A blank
    /// query returns every song.
    pub fn search(&self, query: &str) -> Arc<Vec<SongRef>> {
        let key = query.trim().to_lowercase();

        if let Some(hit) = lock(&self.cache).get(&key) {
            debug!(query = %key, "Search cache hit");
            return Arc::clone(hit);
        }

        let words: Vec<&str> = key.split_whitespace().collect();
        let mut results: Vec<SongRef> = lock(&self.songs)
            .iter()
            .filter(|song| words.iter().all(|word| matches_word(song, word)))
            .cloned()
            .collect();
        if !words.is_empty() {
            results.sort_by_key(|s| s.title().to_lowercase());
        }

        debug!(query = %key, results = results.len(), "Search");
        let results = Arc::new(results);
        lock(&self.cache).put(key, Arc::clone(&results));
        results
    }

    /// Forget all cached search results
    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
    }

    /// Number of cached queries
    pub fn cached_queries(&self) -> usize {
        lock(&self.cache).len()
    }
}

impl SongSource for SongCatalog {
    fn songs(&self, root: &Path) -> mellow_core::Result<Vec<SongRef>> {
        self.load(root)?;
        Ok(self.all_songs())
    }

    fn search(&self, query: &str) -> mellow_core::Result<Vec<SongRef>> {
        Ok(SongCatalog::search(self, query).as_ref().clone())
    }
}

fn matches_word(song: &SongRef, word: &str) -> bool {
    song.title().to_lowercase().contains(word)
        || song.artist().to_lowercase().contains(word)
        || song
            .album()
            .is_some_and(|album| album.to_lowercase().contains(word))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_core::Song;

    fn catalog(cache_size: usize) -> SongCatalog {
        let catalog = SongCatalog::new(&LibraryConfig {
            search_cache_size: cache_size,
            ..Default::default()
        });
        catalog.set_songs(vec![
            Song::builder("So What", "/jazz/so_what.flac")
                .artist("Miles Davis")
                .album("Kind of Blue")
                .build_ref(),
            Song::builder("Blue in Green", "/jazz/blue.flac")
                .artist("Miles Davis")
                .album("Kind of Blue")
                .build_ref(),
            Song::builder("Naima", "/jazz/naima.flac")
                .artist("John Coltrane")
                .album("Giant Steps")
                .build_ref(),
        ]);
        catalog
    }

    fn titles(songs: &[SongRef]) -> Vec<&str> {
        songs.iter().map(|s| s.title()).collect()
    }

    #[test]
    fn search_matches_every_word_sorted_by_title() {
        let catalog = catalog(8);
        let results = catalog.search("  MILES blue ");
        assert_eq!(titles(&results), vec!["Blue in Green", "So What"]);

        let results = catalog.search("coltrane giant");
        assert_eq!(titles(&results), vec!["Naima"]);
    }

    #[test]
    fn blank_query_returns_everything() {
        let catalog = catalog(8);
        assert_eq!(catalog.search("   ").len(), 3);
    }

    #[test]
    fn queries_are_cached_by_normalized_text() {
        let catalog = catalog(8);
        let first = catalog.search("Miles");
        let second = catalog.search("  miles ");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.cached_queries(), 1);

        catalog.clear_cache();
        assert_eq!(catalog.cached_queries(), 0);
    }

    #[test]
    fn cache_evicts_least_recently_used() {
        let catalog = catalog(2);
        catalog.search("miles");
        catalog.search("naima");
        catalog.search("miles");
        catalog.search("green");
        assert_eq!(catalog.cached_queries(), 2);
    }

    #[test]
    fn changing_songs_drops_cache() {
        let catalog = catalog(8);
        assert_eq!(catalog.search("lush").len(), 0);

        let added = catalog.add_song(
            Song::builder("Lush Life", "/jazz/lush.flac")
                .artist("John Coltrane")
                .build_ref(),
        );
        assert!(added);
        assert_eq!(titles(&catalog.search("lush")), vec!["Lush Life"]);
    }

    #[test]
    fn add_song_skips_duplicates() {
        let catalog = catalog(8);
        let dup = Song::builder("Naima", "/jazz/naima.flac")
            .artist("John Coltrane")
            .album("Giant Steps")
            .build_ref();
        assert!(!catalog.add_song(dup.clone()));
        assert!(catalog.remove_song(&dup));
        assert_eq!(catalog.len(), 2);
    }
}
