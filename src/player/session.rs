use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::core::{AppConfig, Notifier, PlaybackRecord, PlaybackRecordManager, Playlist};
use crate::core::playlist::is_video_file;
use crate::player::{MediaBackend, MediaEvent, SpeedSelector};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub memory_playback: bool,
    pub autosave_interval: Duration,
    pub video_extensions: Vec<String>,
    pub volume: f64,
    pub speed_index: usize,
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            memory_playback: config.memory_playback,
            autosave_interval: config.autosave_interval(),
            video_extensions: config.video_extensions.clone(),
            volume: config.volume,
            speed_index: config.speed_index,
        }
    }
}

/// Drives a media backend and keeps the playback store in step with it.
///
/// Every position-changing action (load, pause, stop, seek, autosave tick,
/// close) writes the file's resume position and, when a folder is active and
/// memory playback is on, the session pointer.
pub struct PlayerSession<B: MediaBackend> {
    records: PlaybackRecordManager,
    backend: B,
    notifier: Rc<dyn Notifier>,
    options: SessionOptions,
    playlist: Playlist,
    current_folder: Option<PathBuf>,
    current_video: Option<PathBuf>,
    is_playing: bool,
    speed: SpeedSelector,
    volume: f64,
    last_autosave: Instant,
    finished: bool,
}

impl<B: MediaBackend> PlayerSession<B> {
    pub fn new(
        records: PlaybackRecordManager,
        mut backend: B,
        notifier: Rc<dyn Notifier>,
        options: SessionOptions,
    ) -> Self {
        let speed = SpeedSelector::with_index(options.speed_index);
        let volume = options.volume.clamp(0.0, 1.0);
        if let Err(e) = backend.set_volume(volume).and_then(|_| backend.set_speed(speed.value())) {
            log::warn!("Failed to apply initial volume/speed: {}", e);
        }

        Self {
            records,
            backend,
            notifier,
            options,
            playlist: Playlist::default(),
            current_folder: None,
            current_video: None,
            is_playing: false,
            speed,
            volume,
            last_autosave: Instant::now(),
            finished: false,
        }
    }

    pub fn current_folder(&self) -> Option<&Path> {
        self.current_folder.as_deref()
    }

    /// Nothing left to play: the playlist ran out or the player was closed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn recent_records(&self, count: usize) -> Vec<&PlaybackRecord> {
        self.records.get_recent_records(count)
    }

    /// Open whatever was passed on the command line.
    pub fn open_path(&mut self, path: &Path) -> anyhow::Result<()> {
        if path.is_dir() {
            self.load_folder(path)?;
            let first = self.playlist.select_first().map(|f| f.full_path.clone());
            match first {
                Some(first) => self.load_video(&first, 0.0),
                None => Err(anyhow::anyhow!("No video files in {}", path.display())),
            }
        } else if path.is_file() && is_video_file(path, &self.options.video_extensions) {
            self.load_video(path, 0.0)?;
            if let Some(folder) = path.parent().filter(|f| f.is_dir()) {
                self.load_folder(folder)?;
                self.playlist.select_path(path);
            }
            Ok(())
        } else {
            Err(anyhow::anyhow!("Not a video file or folder: {}", path.display()))
        }
    }

    /// Resume the folder and file that were active when the app last ran.
    /// Returns `false` when there is nothing (still existing) to resume.
    pub fn restore_last_session(&mut self) -> bool {
        if !self.options.memory_playback {
            return false;
        }

        let state = self.records.get_current_playback_state().clone();
        let Some(folder) = state.folder().filter(|f| f.is_dir()).map(Path::to_path_buf) else {
            return false;
        };
        if let Err(e) = self.load_folder(&folder) {
            log::debug!("Failed to restore playback state: {}", e);
            return false;
        }

        let Some(video) = state.video().filter(|v| v.is_file()).map(Path::to_path_buf) else {
            return false;
        };
        match self.load_video(&video, state.playback_position) {
            Ok(()) => {
                self.playlist.select_path(&video);
                log::info!("Resumed {} at {:.1}s", video.display(), state.playback_position);
                true
            }
            Err(e) => {
                log::debug!("Failed to restore playback state: {}", e);
                false
            }
        }
    }

    /// Start `path`, resuming from its stored position when one exists.
    pub fn load_video(&mut self, path: &Path, start_position: f64) -> anyhow::Result<()> {
        if let Some(previous) = self.current_video.clone() {
            if self.backend.duration().is_some() {
                let position = self.backend.position();
                self.records.update_record(&previous, position);
            }
        }

        if let Err(e) = self.backend.stop() {
            log::debug!("Failed to stop previous media: {}", e);
        }
        self.is_playing = false;

        self.current_video = Some(path.to_path_buf());
        self.finished = false;

        let mut start_position = start_position;
        if self.options.memory_playback {
            if let Some(record) = self.records.get_record(path).filter(|r| r.position > 0.0) {
                start_position = record.position;
            }
        }

        if let Err(e) = self.start_backend(path, start_position) {
            self.notifier
                .error("Error", &format!("Unable to load video file:\n{}", e));
            return Err(e);
        }
        self.is_playing = true;
        self.last_autosave = Instant::now();

        if let Some(folder) = self.active_folder() {
            let video = path.to_string_lossy().into_owned();
            self.records.update_playback_state(&folder, &video, start_position);
        }
        Ok(())
    }

    fn start_backend(&mut self, path: &Path, start_position: f64) -> anyhow::Result<()> {
        self.backend.load(path)?;
        if start_position > 0.0 {
            self.backend.seek(start_position)?;
        }
        self.backend.play()
    }

    /// Make `folder` the playlist.
    pub fn load_folder(&mut self, folder: &Path) -> anyhow::Result<()> {
        self.current_folder = Some(folder.to_path_buf());
        self.playlist = Playlist::load(
            folder,
            &self.options.video_extensions,
            &self.records,
            self.options.memory_playback,
        )
        .map_err(|e| {
            self.notifier
                .error("Error", &format!("Unable to load the videos in the folder:\n{}", e));
            e
        })?;

        if let Some(current) = self.current_video.clone() {
            self.playlist.select_path(&current);
        }

        if self.options.memory_playback {
            let video = self.current_video_string();
            let position = if self.backend.duration().is_some() {
                self.backend.position()
            } else {
                0.0
            };
            self.records
                .update_playback_state(&folder.to_string_lossy(), &video, position);
        }
        Ok(())
    }

    /// Rescan the playlist folder, keeping the selection.
    pub fn refresh_playlist(&mut self) {
        let Some(folder) = self.current_folder.clone() else {
            return;
        };
        match Playlist::load(
            &folder,
            &self.options.video_extensions,
            &self.records,
            self.options.memory_playback,
        ) {
            Ok(mut playlist) => {
                if let Some(current) = self.current_video.as_deref() {
                    playlist.select_path(current);
                }
                self.playlist = playlist;
            }
            Err(e) => log::warn!("Failed to refresh playlist: {}", e),
        }
    }

    /// Periodic autosave while playing.
    pub fn tick(&mut self, now: Instant) {
        if !self.is_playing {
            return;
        }
        if now.saturating_duration_since(self.last_autosave) < self.options.autosave_interval {
            return;
        }
        self.last_autosave = now;
        log::debug!("Autosaving playback position");
        self.save_position(self.backend.position());
    }

    /// Drain pending backend notifications.
    pub fn poll_backend(&mut self) {
        while let Some(event) = self.backend.poll_event() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Opened => {
                log::debug!("Media opened (duration: {:?})", self.backend.duration());
            }
            MediaEvent::Ended => {
                self.is_playing = false;
                // Taken so the next load does not record the finished file again
                if let Some(video) = self.current_video.take() {
                    self.playlist.select_path(&video);
                    // Finished files start over next time
                    self.records.remove_record(&video);
                    if let Some(folder) = self.active_folder() {
                        self.records.update_playback_state(&folder, "", 0.0);
                    }
                }
                self.play_next();
            }
            MediaEvent::Failed(message) => {
                self.is_playing = false;
                self.notifier
                    .error("Error", &format!("Video playback failed:\n{}", message));
                // Stored position and session pointer stay as they were
                self.backend.close();
                self.finished = true;
            }
            MediaEvent::Closed => {
                self.close();
            }
        }
    }

    /// Returns `false` when the playlist is exhausted or the next file fails to load.
    pub fn play_next(&mut self) -> bool {
        if let Some(current) = self.current_video.clone() {
            self.playlist.select_path(&current);
        }

        let next = self.playlist.next().map(|f| f.full_path.clone());
        match next {
            Some(next) => {
                let loaded = self.load_video(&next, 0.0).is_ok();
                if !loaded {
                    self.finished = true;
                }
                loaded
            }
            None => {
                log::info!("Playlist finished");
                self.finished = true;
                if self.options.memory_playback {
                    self.records.update_playback_state("", "", 0.0);
                }
                false
            }
        }
    }

    /// Persist the final position and release the backend.
    pub fn close(&mut self) {
        if let Some(video) = self.current_video.clone() {
            if self.backend.has_source() && self.backend.duration().is_some() {
                let position = self.backend.position();
                self.records.update_record(&video, position);
                if let Some(folder) = self.active_folder() {
                    self.records
                        .update_playback_state(&folder, &video.to_string_lossy(), position);
                }
            }
        }
        self.backend.close();
        self.is_playing = false;
        self.finished = true;
    }

    /// Store `position` for the current file when the media has a duration.
    fn save_position(&mut self, position: f64) {
        let Some(video) = self.current_video.clone() else {
            return;
        };
        if self.backend.duration().is_none() {
            return;
        }

        self.records.update_record(&video, position);
        if let Some(folder) = self.active_folder() {
            self.records
                .update_playback_state(&folder, &video.to_string_lossy(), position);
        }
    }

    /// The folder to write into the session pointer, if it should be written.
    fn active_folder(&self) -> Option<String> {
        if !self.options.memory_playback {
            return None;
        }
        self.current_folder
            .as_deref()
            .map(|f| f.to_string_lossy().into_owned())
    }

    fn current_video_string(&self) -> String {
        self.current_video
            .as_deref()
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Playback controls for an interactive front end. The polling binary only
/// loads media, handles backend events and autosaves.
#[allow(dead_code)]
impl<B: MediaBackend> PlayerSession<B> {
    pub fn records(&self) -> &PlaybackRecordManager {
        &self.records
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_video(&self) -> Option<&Path> {
        self.current_video.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn speed(&self) -> &SpeedSelector {
        &self.speed
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn toggle_play_pause(&mut self) {
        if !self.backend.has_source() {
            return;
        }

        if self.is_playing {
            if let Err(e) = self.backend.pause() {
                self.notifier.error("Error", &format!("Playback control error: {}", e));
                return;
            }
            self.is_playing = false;
            self.save_position(self.backend.position());
        } else {
            if let Err(e) = self.backend.play() {
                self.notifier.error("Error", &format!("Playback control error: {}", e));
                return;
            }
            self.is_playing = true;
            self.last_autosave = Instant::now();
        }
    }

    /// Stop and rewind. The file's resume position becomes zero.
    pub fn stop(&mut self) {
        if let Err(e) = self.backend.stop() {
            log::warn!("Failed to stop playback: {}", e);
        }
        self.is_playing = false;

        if let Some(video) = self.current_video.clone() {
            self.records.update_record(&video, 0.0);
            if let Some(folder) = self.active_folder() {
                self.records
                    .update_playback_state(&folder, &video.to_string_lossy(), 0.0);
            }
        }
    }

    pub fn seek(&mut self, position: f64) {
        if let Err(e) = self.backend.seek(position) {
            self.notifier.error("Error", &format!("Playback control error: {}", e));
            return;
        }
        self.save_position(self.backend.position());
    }

    pub fn play_previous(&mut self) -> bool {
        if let Some(current) = self.current_video.clone() {
            self.playlist.select_path(&current);
        }

        let previous = self.playlist.previous().map(|f| f.full_path.clone());
        match previous {
            Some(previous) => self.load_video(&previous, 0.0).is_ok(),
            None => false,
        }
    }

    pub fn cycle_speed(&mut self) -> &'static str {
        let speed = self.speed.cycle();
        self.apply_speed(speed);
        self.speed.label()
    }

    pub fn select_speed(&mut self, speed: f64) -> bool {
        if !self.speed.select_value(speed) {
            return false;
        }
        self.apply_speed(speed);
        true
    }

    fn apply_speed(&mut self, speed: f64) {
        log::info!("Playback speed {}", self.speed.label());
        if let Err(e) = self.backend.set_speed(speed) {
            log::warn!("Failed to change playback speed: {}", e);
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Err(e) = self.backend.set_volume(self.volume) {
            log::warn!("Failed to change volume: {}", e);
        }
    }

    /// Forget every resume position after the user confirms.
    pub fn clear_memory(&mut self) -> bool {
        let confirmed = self.notifier.confirm(
            "Clear playback records",
            "Clear all playback records and the remembered playback state?",
        );
        if !confirmed {
            return false;
        }

        self.records.clear_all_records();
        self.playlist.refresh(&self.records, self.options.memory_playback);
        true
    }
}
