use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tokio::sync::broadcast;

use crate::core::playlist::is_video_file;

#[derive(Debug, Clone, PartialEq)]
pub enum FolderChange {
    Added(PathBuf),
    Removed(PathBuf),
}

/// Watches the playlist folder for video files appearing or disappearing.
pub struct FolderMonitor {
    _watcher: RecommendedWatcher,
}

impl FolderMonitor {
    pub fn new(
        directory: &Path,
        extensions: &[String],
    ) -> anyhow::Result<(Self, broadcast::Receiver<FolderChange>)> {
        let (tx, rx) = mpsc::channel();
        let (event_sender, event_receiver) = broadcast::channel(32);

        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(directory, RecursiveMode::NonRecursive)?;

        let extensions = extensions.to_vec();
        thread::spawn(move || {
            while let Ok(event) = rx.recv() {
                let event: Event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        log::warn!("Folder watch error: {}", e);
                        continue;
                    }
                };
                for change in classify(&event, &extensions) {
                    log::debug!("Folder change: {:?}", change);
                    // No receivers left means the session is gone
                    if event_sender.send(change).is_err() {
                        return;
                    }
                }
            }
        });

        log::info!("Watching {} for playlist changes", directory.display());
        Ok((FolderMonitor { _watcher: watcher }, event_receiver))
    }
}

fn classify(event: &Event, extensions: &[String]) -> Vec<FolderChange> {
    let make: fn(PathBuf) -> FolderChange = match event.kind {
        EventKind::Create(_) => FolderChange::Added,
        EventKind::Remove(_) => FolderChange::Removed,
        _ => return Vec::new(),
    };
    event
        .paths
        .iter()
        .filter(|path| is_video_file(path, extensions))
        .cloned()
        .map(make)
        .collect()
}
