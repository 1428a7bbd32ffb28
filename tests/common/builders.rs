//! Test data builders for creating test objects

use cliptrack::Track;

/// Builder for creating test Tracks
pub struct TrackBuilder {
    locator: String,
    name: String,
    duration_ms: u64,
}

impl TrackBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            locator: format!("file:///test/{}.m4a", name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            duration_ms: 10_000,
        }
    }

    pub fn locator(mut self, locator: &str) -> Self {
        self.locator = locator.to_string();
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn build(self) -> Track {
        Track::new(self.locator, self.name, self.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_builder() {
        let track = TrackBuilder::new("Morning Idea").duration_ms(4_200).build();

        assert_eq!(track.name, "Morning Idea");
        assert_eq!(track.locator, "file:///test/morning-idea.m4a");
        assert_eq!(track.duration_ms, 4_200);
    }
}
