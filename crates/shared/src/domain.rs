use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A playable catalog entry as served by `GET /tracks`.
///
/// Tracks carry no id; the audio source reference identifies a track within a
/// playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Length in seconds, when the catalog knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub average_rating: f32,
    #[serde(default)]
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            genre: None,
            year: None,
            duration: None,
            audio_url: audio_url.into(),
            cover_url: None,
            play_count: 0,
            average_rating: 0.0,
            rating_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Whether both records point at the same audio source.
    pub fn same_source(&self, other: &Track) -> bool {
        self.audio_url == other.audio_url
    }

    pub fn display_title(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }

    /// `m:ss`, or `--:--` when the duration is unknown.
    pub fn formatted_duration(&self) -> String {
        match self.duration {
            Some(secs) => format!("{}:{:02}", secs / 60, secs % 60),
            None => "--:--".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
