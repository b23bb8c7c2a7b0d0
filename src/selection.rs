use std::sync::{Arc, Mutex};

use crate::models::SongTitle;

/// Selection shared by the suggestion and recommendation controllers
pub type SharedSelection = Arc<Mutex<SelectionStore>>;

/// The user's "My Jams": insertion-ordered, no duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    songs: Vec<SongTitle>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSelection {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Append a song unless it is already selected. Returns whether it was added.
    pub fn add(&mut self, song: impl Into<SongTitle>) -> bool {
        let song = song.into();
        if self.contains(&song) {
            return false;
        }
        self.songs.push(song);
        true
    }

    /// Remove every entry equal to `song`. Returns whether anything was removed.
    pub fn remove(&mut self, song: &str) -> bool {
        let before = self.songs.len();
        self.songs.retain(|s| s != song);
        self.songs.len() != before
    }

    pub fn clear(&mut self) {
        self.songs.clear();
    }

    pub fn list(&self) -> &[SongTitle] {
        &self.songs
    }

    pub fn contains(&self, song: &str) -> bool {
        self.songs.iter().any(|s| s == song)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
