//! Track library
//!
//! In-memory collection of finalized recordings, kept in the order they were
//! added. Untitled tracks are named here when they are added, numbered by
//! the size of the collection. Persisting the collection and deleting the
//! media behind a track are left to the embedding application.

use crate::types::{Track, TrackId};

/// Default name of the `n`th track
pub fn default_track_name(prefix: &str, n: usize) -> String {
    format!("{} {}", prefix.trim(), n)
}

/// Ordered collection of recorded tracks
#[derive(Debug, Clone)]
pub struct TrackLibrary {
    tracks: Vec<Track>,
    /// Prefix for default names
    name_prefix: String,
}

impl Default for TrackLibrary {
    fn default() -> Self {
        Self::new("Track")
    }
}

impl TrackLibrary {
    /// Create an empty library naming untitled tracks `"<prefix> <n>"`
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            tracks: Vec::new(),
            name_prefix: name_prefix.into(),
        }
    }

    /// Name the next untitled track would get
    pub fn next_default_name(&self) -> String {
        default_track_name(&self.name_prefix, self.tracks.len() + 1)
    }

    /// Add a track, naming it if it has no name
    pub fn add(&mut self, mut track: Track) -> TrackId {
        if track.name.trim().is_empty() {
            track.name = self.next_default_name();
        }
        let id = track.id;
        tracing::debug!("Added track {} ({})", track.name, id);
        self.tracks.push(track);
        id
    }

    /// Find a track by ID
    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Iterate tracks in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Rename a track; returns false if it does not exist
    pub fn rename(&mut self, id: TrackId, name: impl Into<String>) -> bool {
        match self.tracks.iter_mut().find(|t| t.id == id) {
            Some(track) => {
                track.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Remove a track by ID
    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        let index = self.tracks.iter().position(|t| t.id == id)?;
        Some(self.tracks.remove(index))
    }
}
