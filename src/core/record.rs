use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resume position of a single media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRecord {
    pub file_path: String,
    pub position: f64, // seconds
    pub last_played: DateTime<Local>,
}

/// What to resume on the next launch. Empty strings mean "nothing".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackState {
    pub current_folder_path: String,
    pub current_video_path: String,
    pub playback_position: f64,
    pub last_played: DateTime<Local>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_folder_path: String::new(),
            current_video_path: String::new(),
            playback_position: 0.0,
            last_played: DateTime::<Local>::default(),
        }
    }
}

impl PlaybackState {
    pub fn folder(&self) -> Option<&Path> {
        non_empty_path(&self.current_folder_path)
    }

    pub fn video(&self) -> Option<&Path> {
        non_empty_path(&self.current_video_path)
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.current_folder_path.is_empty()
            && self.current_video_path.is_empty()
            && self.playback_position == 0.0
    }
}

fn non_empty_path(value: &str) -> Option<&Path> {
    if value.is_empty() {
        None
    } else {
        Some(Path::new(value))
    }
}

/// Key under which a path is stored. Paths are kept verbatim, so two spellings
/// of the same file (case, separators) are distinct entries.
pub fn record_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
