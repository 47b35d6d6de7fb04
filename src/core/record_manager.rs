use crate::core::error::StoreError;
use crate::core::notifier::Notifier;
use crate::core::record::{record_key, PlaybackRecord, PlaybackState};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const APP_NAME: &str = "resume-player";
pub const RECORDS_FILE_NAME: &str = "playback_records.json";
pub const STATE_FILE_NAME: &str = "playback_state.json";
pub const DEFAULT_RECENT_COUNT: usize = 10;

/// Locations of the two backing documents.
#[derive(Debug, Clone, PartialEq)]
pub struct StorePaths {
    pub records: PathBuf,
    pub state: PathBuf,
}

impl StorePaths {
    pub fn in_directory(directory: &Path) -> Self {
        Self {
            records: directory.join(RECORDS_FILE_NAME),
            state: directory.join(STATE_FILE_NAME),
        }
    }

    /// `<user data dir>/resume-player/`
    pub fn default_location() -> Self {
        let root = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::in_directory(&root.join(APP_NAME))
    }
}

/// Per-file resume positions plus the single "last session" pointer.
///
/// Every mutation rewrites the affected document synchronously. Disk failures
/// never change the in-memory view: record-store problems are shown to the user
/// through the notifier, session-state problems only reach the debug log.
pub struct PlaybackRecordManager {
    paths: StorePaths,
    records: HashMap<String, PlaybackRecord>,
    current_state: PlaybackState,
    notifier: Rc<dyn Notifier>,
}

impl PlaybackRecordManager {
    pub fn new(notifier: Rc<dyn Notifier>) -> Self {
        Self::open(StorePaths::default_location(), notifier)
    }

    pub fn open(paths: StorePaths, notifier: Rc<dyn Notifier>) -> Self {
        let mut manager = Self {
            paths,
            records: HashMap::new(),
            current_state: PlaybackState::default(),
            notifier,
        };

        match manager.load_records() {
            Ok(Some(records)) => {
                log::info!(
                    "Loaded {} playback records from {}",
                    records.len(),
                    manager.paths.records.display()
                );
                manager.records = records;
            }
            Ok(None) => log::debug!("No playback records at {}", manager.paths.records.display()),
            Err(e) => manager
                .notifier
                .warn("Warning", &format!("Failed to load playback records: {}", e)),
        }

        match manager.load_playback_state() {
            Ok(Some(state)) => manager.current_state = state,
            Ok(None) => log::debug!("No playback state at {}", manager.paths.state.display()),
            Err(e) => log::debug!("Failed to load playback state: {}", e),
        }

        manager
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_record(&self, path: &Path) -> Option<&PlaybackRecord> {
        self.records.get(&record_key(path))
    }

    pub fn update_record(&mut self, path: &Path, position: f64) {
        self.update_record_at(path, position, Local::now());
    }

    /// Same as [`update_record`](Self::update_record) with an explicit timestamp.
    pub fn update_record_at(&mut self, path: &Path, position: f64, played_at: DateTime<Local>) {
        let key = record_key(path);
        let record = PlaybackRecord {
            file_path: key.clone(),
            position: position.max(0.0),
            last_played: played_at,
        };
        self.records.insert(key, record);
        self.persist_records();
    }

    pub fn remove_record(&mut self, path: &Path) {
        if self.records.remove(&record_key(path)).is_some() {
            self.persist_records();
        }
    }

    pub fn clear_all_records(&mut self) {
        self.records.clear();
        self.persist_records();

        self.current_state = PlaybackState::default();
        if let Err(e) = self.delete_playback_state() {
            log::debug!("{}", e);
        }
        log::info!("Cleared all playback records and session state");
    }

    /// Most recently played first. Equal timestamps are ordered by path.
    pub fn get_recent_records(&self, count: usize) -> Vec<&PlaybackRecord> {
        let mut records: Vec<&PlaybackRecord> = self.records.values().collect();
        records.sort_by(|a, b| {
            b.last_played
                .cmp(&a.last_played)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        records.truncate(count);
        records
    }

    pub fn get_current_playback_state(&self) -> &PlaybackState {
        &self.current_state
    }

    pub fn update_playback_state(&mut self, folder: &str, video: &str, position: f64) {
        self.current_state = PlaybackState {
            current_folder_path: folder.to_string(),
            current_video_path: video.to_string(),
            playback_position: position.max(0.0),
            last_played: Local::now(),
        };
        if let Err(e) = self.save_playback_state() {
            log::debug!("{}", e);
        }
    }

    fn persist_records(&self) {
        if let Err(e) = self.save_records() {
            self.notifier
                .warn("Warning", &format!("Failed to save playback records: {}", e));
        }
    }

    fn load_records(&self) -> Result<Option<HashMap<String, PlaybackRecord>>, StoreError> {
        let Some(list) = read_document::<Vec<PlaybackRecord>>(&self.paths.records)? else {
            return Ok(None);
        };

        let mut records = HashMap::with_capacity(list.len());
        for record in list {
            if records.contains_key(&record.file_path) {
                return Err(StoreError::DuplicateRecord {
                    path: self.paths.records.clone(),
                    file_path: record.file_path,
                });
            }
            records.insert(record.file_path.clone(), record);
        }
        Ok(Some(records))
    }

    fn load_playback_state(&self) -> Result<Option<PlaybackState>, StoreError> {
        read_document(&self.paths.state)
    }

    fn save_records(&self) -> Result<(), StoreError> {
        let mut records: Vec<&PlaybackRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        write_document(&self.paths.records, &records)
    }

    fn save_playback_state(&self) -> Result<(), StoreError> {
        write_document(&self.paths.state, &self.current_state)
    }

    fn delete_playback_state(&self) -> Result<(), StoreError> {
        let path = &self.paths.state;
        if path.exists() {
            std::fs::remove_file(path).map_err(|source| StoreError::Delete {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// `Ok(None)` when the file does not exist. A literal `null` document also
/// counts as absent.
fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str::<Option<T>>(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
