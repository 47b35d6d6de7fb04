mod core;
mod player;

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::core::{
    format_position, AppConfig, DialogNotifier, FolderChange, FolderMonitor, Notifier,
    PlaybackRecordManager, DEFAULT_RECENT_COUNT,
};
use crate::player::{FfplayBackend, MediaBackend, PlayerSession, SessionOptions};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let shutdown = ShutdownSignal::install();
    let config = AppConfig::load()?;
    let notifier: Rc<dyn Notifier> = Rc::new(DialogNotifier);
    let records = PlaybackRecordManager::new(notifier.clone());
    let backend = FfplayBackend::new(&config.player_command, &config.probe_command);
    let mut session = PlayerSession::new(records, backend, notifier, SessionOptions::from(&config));
    log_recent(&session);

    let launch_path = std::env::args_os().nth(1).map(PathBuf::from);
    let opened = match launch_path {
        Some(path) => match session.open_path(&path) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Ignoring launch argument: {}", e);
                session.restore_last_session() || pick_and_open(&mut session, &config)
            }
        },
        None => session.restore_last_session() || pick_and_open(&mut session, &config),
    };

    if !opened {
        log::info!("Nothing to play");
        return Ok(());
    }

    run(&mut session, &config, &shutdown);
    session.close();
    Ok(())
}

fn log_recent<B: MediaBackend>(session: &PlayerSession<B>) {
    let recent = session.recent_records(DEFAULT_RECENT_COUNT);
    if recent.is_empty() {
        return;
    }
    log::info!("Recently played:");
    for record in recent {
        log::info!("  {} ({})", record.file_path, format_position(record.position));
    }
}

/// Ask for a file when there is nothing to resume.
fn pick_and_open<B: MediaBackend>(session: &mut PlayerSession<B>, config: &AppConfig) -> bool {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Open video")
        .add_filter("Video files", config.video_extensions.as_slice())
        .add_filter("All files", &["*"])
        .pick_file()
    else {
        return false;
    };

    match session.open_path(&path) {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to open {}: {}", path.display(), e);
            false
        }
    }
}

struct FolderWatch {
    folder: PathBuf,
    receiver: Option<broadcast::Receiver<FolderChange>>,
    _monitor: Option<FolderMonitor>,
}

impl FolderWatch {
    fn start(folder: &Path, extensions: &[String]) -> Self {
        let (monitor, receiver) = match FolderMonitor::new(folder, extensions) {
            Ok((monitor, receiver)) => (Some(monitor), Some(receiver)),
            Err(e) => {
                log::error!("Failed to watch {}: {}", folder.display(), e);
                (None, None)
            }
        };
        Self {
            folder: folder.to_path_buf(),
            receiver,
            _monitor: monitor,
        }
    }

    /// Whether anything relevant changed since the last call.
    fn drain(&mut self) -> bool {
        let Some(receiver) = self.receiver.as_mut() else {
            return false;
        };
        let mut changed = false;
        let mut closed = false;
        loop {
            match receiver.try_recv() {
                Ok(change) => {
                    log::info!("Playlist folder changed: {:?}", change);
                    changed = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    log::debug!("Skipped {} folder events", skipped);
                    changed = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            self.receiver = None;
        }
        changed
    }
}

/// Set from the Ctrl-C handler so the poll loop can exit and flush.
#[derive(Clone, Default)]
struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    fn install() -> Self {
        let signal = Self::default();
        let handler = signal.clone();
        if let Err(e) = ctrlc::set_handler(move || handler.trigger()) {
            log::warn!("Failed to install Ctrl-C handler: {}", e);
        }
        signal
    }

    fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn run<B: MediaBackend>(session: &mut PlayerSession<B>, config: &AppConfig, shutdown: &ShutdownSignal) {
    let mut watch: Option<FolderWatch> = None;

    while !session.is_finished() {
        if shutdown.is_requested() {
            log::info!("Interrupted, saving playback position");
            break;
        }

        let folder = session.current_folder().map(Path::to_path_buf);
        if folder.as_deref() != watch.as_ref().map(|w| w.folder.as_path()) {
            watch = folder
                .as_deref()
                .map(|f| FolderWatch::start(f, &config.video_extensions));
        }
        if watch.as_mut().map(FolderWatch::drain).unwrap_or(false) {
            session.refresh_playlist();
        }

        session.poll_backend();
        session.tick(Instant::now());
        std::thread::sleep(config.poll_interval());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notifier::LogNotifier;
    use crate::core::StorePaths;
    use crate::player::MediaEvent;

    /// Keeps "playing" at a fixed offset and never reports anything.
    struct IdleBackend {
        source: Option<PathBuf>,
        position: f64,
    }

    impl MediaBackend for IdleBackend {
        fn load(&mut self, path: &Path) -> anyhow::Result<()> {
            self.source = Some(path.to_path_buf());
            Ok(())
        }
        fn play(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
        fn pause(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
        fn stop(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
        fn seek(&mut self, position: f64) -> anyhow::Result<()> {
            self.position = position;
            Ok(())
        }
        fn has_source(&self) -> bool {
            self.source.is_some()
        }
        fn position(&self) -> f64 {
            self.position
        }
        fn duration(&self) -> Option<f64> {
            Some(600.0)
        }
        fn set_speed(&mut self, _speed: f64) -> anyhow::Result<()> {
            Ok(())
        }
        fn set_volume(&mut self, _volume: f64) -> anyhow::Result<()> {
            Ok(())
        }
        fn poll_event(&mut self) -> Option<MediaEvent> {
            None
        }
        fn close(&mut self) {
            self.source = None;
        }
    }

    #[test]
    fn test_interrupt_stops_loop_and_flushes_position() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("a.mp4");
        std::fs::write(&video, b"").unwrap();
        let paths = StorePaths::in_directory(&dir.path().join("data"));

        let config = AppConfig {
            poll_interval_ms: 1,
            ..AppConfig::default()
        };
        let notifier: Rc<dyn Notifier> = Rc::new(LogNotifier);
        let records = PlaybackRecordManager::open(paths.clone(), notifier.clone());
        let backend = IdleBackend {
            source: None,
            position: 0.0,
        };
        let mut session = PlayerSession::new(records, backend, notifier, SessionOptions::from(&config));
        session.open_path(&video).unwrap();
        session.backend_mut().position = 73.0;

        let shutdown = ShutdownSignal::default();
        shutdown.trigger();
        run(&mut session, &config, &shutdown);
        assert!(!session.is_finished());

        session.close();
        let reloaded = PlaybackRecordManager::open(paths, Rc::new(LogNotifier));
        assert_eq!(reloaded.get_record(&video).unwrap().position, 73.0);
        assert_eq!(reloaded.get_current_playback_state().playback_position, 73.0);
    }
}
