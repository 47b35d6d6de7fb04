#[cfg(test)]
mod tests {

    use std::path::PathBuf;
    use std::time::Duration;
    use crate::core::AppConfig;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.memory_playback);
        assert_eq!(config.volume, 0.5);
        assert_eq!(config.speed_index, 2);
        assert_eq!(config.autosave_interval(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.player_command, PathBuf::from("ffplay"));
        assert_eq!(config.video_extensions, vec!["mp4", "m4v", "avi", "mkv", "wmv", "mov"]);
    }

    #[test]
    fn test_app_config_serialization() {
        let mut config = AppConfig::default();
        config.memory_playback = false;
        config.volume = 0.8;
        config.player_command = PathBuf::from("/opt/ffmpeg/bin/ffplay");

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: AppConfig = serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config.memory_playback, deserialized.memory_playback);
        assert_eq!(config.volume, deserialized.volume);
        assert_eq!(config.player_command, deserialized.player_command);
    }

    #[test]
    fn test_config_backward_compatibility() {
        // Older config files without newer fields still load
        let old_config_json = r#"{
            "memory_playback": false,
            "volume": 0.3
        }"#;

        let config: AppConfig = serde_json::from_str(old_config_json).expect("Failed to parse old config");

        assert!(!config.memory_playback);
        assert_eq!(config.volume, 0.3);
        assert_eq!(config.autosave_interval_secs, 10);
        assert_eq!(config.probe_command, PathBuf::from("ffprobe"));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig::load_from(&path).expect("Failed to load config");

        assert!(path.exists());
        assert!(config.memory_playback);
    }

    #[test]
    fn test_load_replaces_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json at all").unwrap();

        let config = AppConfig::load_from(&path).expect("Broken config should fall back to defaults");

        assert_eq!(config.volume, 0.5);
        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<AppConfig>(&rewritten).is_ok());
    }

    #[test]
    fn test_load_sanitizes_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "volume": 4.0, "speed_index": 99, "video_extensions": [".MP4", "", "Mkv"] }"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(config.volume, 1.0);
        assert_eq!(config.speed_index, 2);
        assert_eq!(config.video_extensions, vec!["mp4", "mkv"]);
    }
}
