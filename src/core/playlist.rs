use std::path::{Path, PathBuf};

use crate::core::record_manager::PlaybackRecordManager;

/// One entry of the folder playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFile {
    pub name: String,
    pub full_path: PathBuf,
    pub progress_text: String, // " (hh:mm:ss)" when a resume position exists
    pub is_last_watched: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    files: Vec<VideoFile>,
    selected: Option<usize>,
}

pub fn is_video_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// Video files directly inside `folder`, ordered by their path string.
pub fn scan_folder(folder: &Path, extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(folder)
        .map_err(|e| anyhow::anyhow!("Failed to read folder {}: {}", folder.display(), e))?
    {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path, extensions) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    Ok(files)
}

/// `hh:mm:ss`, hours are not wrapped.
pub fn format_position(seconds: f64) -> String {
    let total = if seconds.is_finite() { seconds.max(0.0) as u64 } else { 0 };
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

impl Playlist {
    pub fn load(
        folder: &Path,
        extensions: &[String],
        records: &PlaybackRecordManager,
        memory_playback: bool,
    ) -> anyhow::Result<Self> {
        let files = scan_folder(folder, extensions)?
            .into_iter()
            .map(|full_path| VideoFile {
                name: full_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                full_path,
                progress_text: String::new(),
                is_last_watched: false,
            })
            .collect();

        let mut playlist = Self {
            files,
            selected: None,
        };
        playlist.refresh(records, memory_playback);
        log::info!("Loaded {} videos from {}", playlist.len(), folder.display());
        Ok(playlist)
    }

    /// Recompute resume-position and last-watched markers.
    pub fn refresh(&mut self, records: &PlaybackRecordManager, memory_playback: bool) {
        let last_watched = records.get_current_playback_state().video().map(Path::to_path_buf);

        for file in &mut self.files {
            file.is_last_watched = last_watched.as_deref() == Some(file.full_path.as_path());
            file.progress_text = if memory_playback {
                records
                    .get_record(&file.full_path)
                    .filter(|r| r.position > 0.0)
                    .map(|r| format!(" ({})", format_position(r.position)))
                    .unwrap_or_default()
            } else {
                String::new()
            };
        }
    }

    #[allow(dead_code)]
    pub fn files(&self) -> &[VideoFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[allow(dead_code)]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    #[allow(dead_code)]
    pub fn current(&self) -> Option<&VideoFile> {
        self.selected.and_then(|i| self.files.get(i))
    }

    /// Select the entry for `path`. Returns `false` if it is not in the list.
    pub fn select_path(&mut self, path: &Path) -> bool {
        match self.files.iter().position(|f| f.full_path == path) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn select_first(&mut self) -> Option<&VideoFile> {
        if self.files.is_empty() {
            return None;
        }
        self.selected = Some(0);
        self.files.first()
    }

    pub fn has_next(&self) -> bool {
        match self.selected {
            Some(i) => i + 1 < self.files.len(),
            None => !self.files.is_empty(),
        }
    }

    /// Advance the selection. With nothing selected the first file is next.
    pub fn next(&mut self) -> Option<&VideoFile> {
        if !self.has_next() {
            return None;
        }
        let index = self.selected.map(|i| i + 1).unwrap_or(0);
        self.selected = Some(index);
        self.files.get(index)
    }

    pub fn previous(&mut self) -> Option<&VideoFile> {
        match self.selected {
            Some(i) if i > 0 => {
                self.selected = Some(i - 1);
                self.files.get(i - 1)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notifier::LogNotifier;
    use crate::core::record_manager::StorePaths;
    use std::rc::Rc;

    fn extensions() -> Vec<String> {
        crate::core::DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_video_extension_detection() {
        let ext = extensions();
        assert!(is_video_file(Path::new("movie.mp4"), &ext));
        assert!(is_video_file(Path::new("MOVIE.MKV"), &ext));
        assert!(is_video_file(Path::new("/a/b/clip.Mov"), &ext));
        assert!(!is_video_file(Path::new("notes.txt"), &ext));
        assert!(!is_video_file(Path::new("no_extension"), &ext));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.mkv");
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "readme.txt");
        std::fs::create_dir(dir.path().join("sub.mp4")).unwrap();

        let files = scan_folder(dir.path(), &extensions()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mp4", "b.mkv"]);
    }

    #[test]
    fn test_scan_missing_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_folder(&dir.path().join("gone"), &extensions()).is_err());
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0.0), "00:00:00");
        assert_eq!(format_position(120.5), "00:02:00");
        assert_eq!(format_position(3725.0), "01:02:05");
        assert_eq!(format_position(-3.0), "00:00:00");
    }

    #[test]
    fn test_load_decorates_entries() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.mp4");
        let b = touch(dir.path(), "b.mp4");

        let mut records = PlaybackRecordManager::open(
            StorePaths::in_directory(&dir.path().join("data")),
            Rc::new(LogNotifier),
        );
        records.update_record(&a, 125.0);
        records.update_record(&b, 0.0);
        records.update_playback_state(
            &dir.path().to_string_lossy(),
            &b.to_string_lossy(),
            0.0,
        );

        let playlist = Playlist::load(dir.path(), &extensions(), &records, true).unwrap();
        assert_eq!(playlist.files()[0].progress_text, " (00:02:05)");
        assert!(!playlist.files()[0].is_last_watched);
        assert_eq!(playlist.files()[1].progress_text, "");
        assert!(playlist.files()[1].is_last_watched);

        let plain = Playlist::load(dir.path(), &extensions(), &records, false).unwrap();
        assert_eq!(plain.files()[0].progress_text, "");
    }

    #[test]
    fn test_navigation() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1.mp4");
        let second = touch(dir.path(), "2.mp4");
        touch(dir.path(), "3.mp4");
        let records = PlaybackRecordManager::open(
            StorePaths::in_directory(&dir.path().join("data")),
            Rc::new(LogNotifier),
        );

        let mut playlist = Playlist::load(dir.path(), &extensions(), &records, true).unwrap();
        assert!(playlist.current().is_none());
        assert!(playlist.previous().is_none());

        assert!(playlist.select_path(&second));
        assert_eq!(playlist.next().unwrap().name, "3.mp4");
        assert!(!playlist.has_next());
        assert!(playlist.next().is_none());
        assert_eq!(playlist.selected_index(), Some(2));

        assert_eq!(playlist.previous().unwrap().name, "2.mp4");
        assert_eq!(playlist.previous().unwrap().name, "1.mp4");
        assert!(playlist.previous().is_none());

        assert!(!playlist.select_path(Path::new("/elsewhere/1.mp4")));
    }
}
