use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::record_manager::APP_NAME;

pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "m4v", "avi", "mkv", "wmv", "mov"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Resume files where they were left and restore the last session on launch
    pub memory_playback: bool,
    pub volume: f64, // 0.0 - 1.0
    pub speed_index: usize,
    pub autosave_interval_secs: u64,
    pub poll_interval_ms: u64,
    pub player_command: PathBuf,
    pub probe_command: PathBuf,
    pub video_extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            memory_playback: true,
            volume: 0.5,
            speed_index: crate::player::DEFAULT_SPEED_INDEX,
            autosave_interval_secs: 10,
            poll_interval_ms: 50,
            player_command: PathBuf::from("ffplay"),
            probe_command: PathBuf::from("ffprobe"),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config.sanitized())
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config.save_to(config_path)
                        .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save_to(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join("config.json")
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Clamp hand-edited values into usable ranges.
    fn sanitized(mut self) -> Self {
        self.volume = self.volume.clamp(0.0, 1.0);
        if self.speed_index >= crate::player::SPEED_OPTIONS.len() {
            log::warn!("Speed index {} out of range, using default", self.speed_index);
            self.speed_index = crate::player::DEFAULT_SPEED_INDEX;
        }
        self.video_extensions = self
            .video_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if self.video_extensions.is_empty() {
            self.video_extensions = Self::default().video_extensions;
        }
        self
    }
}
