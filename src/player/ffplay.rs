// =============================================================================
// FFPLAY BACKEND
// =============================================================================
//
// Decoding and rendering happen in an external `ffplay` window. The process
// cannot be paused or seeked from outside, so every pause, seek, rate or volume
// change stops it and, when playback should continue, relaunches it at the
// current offset. The offset is extrapolated from the launch position plus the
// wall-clock time the process has been running, scaled by the playback rate.
//
// =============================================================================

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Instant;

use crate::player::{MediaBackend, MediaEvent};

/// An exit this close to the end of the media counts as reaching the end.
const END_TOLERANCE_SECS: f64 = 1.0;

pub struct FfplayBackend {
    player_command: PathBuf,
    probe_command: PathBuf,
    source: Option<PathBuf>,
    duration: Option<f64>,
    process: Option<Child>,
    /// Offset at launch, or the frozen offset while not running
    position: f64,
    started_at: Option<Instant>,
    speed: f64,
    volume: f64,
    events: VecDeque<MediaEvent>,
}

impl FfplayBackend {
    pub fn new(player_command: impl Into<PathBuf>, probe_command: impl Into<PathBuf>) -> Self {
        Self {
            player_command: player_command.into(),
            probe_command: probe_command.into(),
            source: None,
            duration: None,
            process: None,
            position: 0.0,
            started_at: None,
            speed: 1.0,
            volume: 0.5,
            events: VecDeque::new(),
        }
    }

    fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn position_at(&self, now: Instant) -> f64 {
        let position = match self.started_at {
            Some(start) if self.is_running() => {
                self.position + now.saturating_duration_since(start).as_secs_f64() * self.speed
            }
            _ => self.position,
        };
        clamp_position(position, self.duration)
    }

    fn launch(&mut self) -> anyhow::Result<()> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No media loaded"))?;

        let args = player_args(&source, self.position, self.speed, self.volume);
        log::debug!("Launching {} {:?}", self.player_command.display(), args);

        let child = Command::new(&self.player_command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to start {}: {}", self.player_command.display(), e))?;

        self.process = Some(child);
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// Freeze the current offset and stop the player process.
    fn halt(&mut self) {
        self.position = self.position_at(Instant::now());
        self.started_at = None;
        if let Some(mut process) = self.process.take() {
            log::debug!("Stopping player process");
            let _ = process.kill();
            let _ = process.wait();
        }
    }

    fn relaunch_if_running(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            self.halt();
            self.launch()?;
        }
        Ok(())
    }

    fn probe_duration(&self, path: &Path) -> anyhow::Result<Option<f64>> {
        let output = Command::new(&self.probe_command)
            .args([
                "-v", "error",
                "-show_entries", "format=duration",
                "-of", "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", self.probe_command.display(), e))?;

        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "{} failed: {}",
                self.probe_command.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(parse_duration(&String::from_utf8_lossy(&output.stdout)))
    }

    fn on_exit(&mut self, status: ExitStatus) -> MediaEvent {
        let position = self.position_at(Instant::now());
        self.process = None;
        self.started_at = None;

        let event = classify_exit(status.success(), position, self.duration);
        self.position = match event {
            MediaEvent::Ended => 0.0,
            _ => position,
        };
        event
    }
}

impl MediaBackend for FfplayBackend {
    fn load(&mut self, path: &Path) -> anyhow::Result<()> {
        self.halt();
        self.source = None;
        self.duration = None;
        self.position = 0.0;
        self.events.clear();
        if !path.is_file() {
            return Err(anyhow::anyhow!("File not found: {}", path.display()));
        }

        self.duration = match self.probe_duration(path) {
            Ok(duration) => duration,
            Err(e) => {
                log::warn!("Could not determine duration of {}: {}", path.display(), e);
                None
            }
        };
        self.source = Some(path.to_path_buf());
        self.events.push_back(MediaEvent::Opened);
        log::info!("Opened {} (duration: {:?})", path.display(), self.duration);
        Ok(())
    }

    fn play(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.launch()
    }

    fn pause(&mut self) -> anyhow::Result<()> {
        self.halt();
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.halt();
        self.position = 0.0;
        Ok(())
    }

    fn seek(&mut self, position: f64) -> anyhow::Result<()> {
        let running = self.is_running();
        self.halt();
        self.position = clamp_position(position, self.duration);
        if running {
            self.launch()?;
        }
        Ok(())
    }

    fn has_source(&self) -> bool {
        self.source.is_some()
    }

    fn position(&self) -> f64 {
        self.position_at(Instant::now())
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn set_speed(&mut self, speed: f64) -> anyhow::Result<()> {
        // Freeze the offset at the old rate before switching
        self.position = self.position_at(Instant::now());
        self.started_at = self.started_at.map(|_| Instant::now());
        self.speed = speed;
        self.relaunch_if_running()
    }

    fn set_volume(&mut self, volume: f64) -> anyhow::Result<()> {
        self.volume = volume.clamp(0.0, 1.0);
        self.relaunch_if_running()
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }

        let status = match self.process.as_mut().map(|p| p.try_wait()) {
            Some(Ok(Some(status))) => status,
            Some(Ok(None)) | None => return None,
            Some(Err(e)) => {
                self.halt();
                return Some(MediaEvent::Failed(format!("Lost track of player process: {}", e)));
            }
        };
        Some(self.on_exit(status))
    }

    fn close(&mut self) {
        self.halt();
        self.source = None;
        self.duration = None;
        self.events.clear();
    }
}

impl Drop for FfplayBackend {
    fn drop(&mut self) {
        self.halt();
    }
}

fn clamp_position(position: f64, duration: Option<f64>) -> f64 {
    let position = position.max(0.0);
    match duration {
        Some(duration) => position.min(duration),
        None => position,
    }
}

fn player_args(source: &Path, start: f64, speed: f64, volume: f64) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-autoexit".to_string(),
        "-ss".to_string(),
        format!("{:.3}", start),
        "-volume".to_string(),
        format!("{}", (volume.clamp(0.0, 1.0) * 100.0).round() as u32),
    ];

    if (speed - 1.0).abs() > f64::EPSILON {
        args.push("-af".to_string());
        args.push(format!("atempo={}", speed));
        args.push("-vf".to_string());
        args.push(format!("setpts=PTS/{}", speed));
    }

    if let Some(name) = source.file_name() {
        args.push("-window_title".to_string());
        args.push(name.to_string_lossy().into_owned());
    }
    args.push(source.to_string_lossy().into_owned());
    args
}

fn parse_duration(output: &str) -> Option<f64> {
    output
        .lines()
        .find_map(|line| line.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

fn classify_exit(success: bool, position: f64, duration: Option<f64>) -> MediaEvent {
    if !success {
        return MediaEvent::Failed("The player exited with an error".to_string());
    }
    match duration {
        Some(duration) if position >= duration - END_TOLERANCE_SECS => MediaEvent::Ended,
        _ => MediaEvent::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_player_args_normal_speed() {
        let args = player_args(Path::new("/videos/a.mp4"), 12.5, 1.0, 0.5);
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-loglevel", "error", "-autoexit",
                "-ss", "12.500", "-volume", "50",
                "-window_title", "a.mp4", "/videos/a.mp4",
            ]
        );
    }

    #[test]
    fn test_player_args_with_speed_filters() {
        let args = player_args(Path::new("/videos/a.mp4"), 0.0, 1.5, 1.0);
        assert!(args.windows(2).any(|w| w[0] == "-af" && w[1] == "atempo=1.5"));
        assert!(args.windows(2).any(|w| w[0] == "-vf" && w[1] == "setpts=PTS/1.5"));
        assert!(args.windows(2).any(|w| w[0] == "-volume" && w[1] == "100"));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1325.480000\n"), Some(1325.48));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("0.000\n"), None);
    }

    #[test]
    fn test_classify_exit() {
        assert_eq!(classify_exit(true, 99.5, Some(100.0)), MediaEvent::Ended);
        assert_eq!(classify_exit(true, 40.0, Some(100.0)), MediaEvent::Closed);
        assert_eq!(classify_exit(true, 40.0, None), MediaEvent::Closed);
        assert!(matches!(classify_exit(false, 100.0, Some(100.0)), MediaEvent::Failed(_)));
    }

    #[test]
    fn test_clamp_position() {
        assert_eq!(clamp_position(-5.0, Some(10.0)), 0.0);
        assert_eq!(clamp_position(15.0, Some(10.0)), 10.0);
        assert_eq!(clamp_position(15.0, None), 15.0);
    }

    #[test]
    fn test_position_frozen_when_not_running() {
        let mut backend = FfplayBackend::new("ffplay", "ffprobe");
        backend.position = 30.0;
        backend.started_at = Some(Instant::now() - Duration::from_secs(5));

        // No process, so elapsed time does not count
        assert_eq!(backend.position_at(Instant::now()), 30.0);
        assert!(!backend.has_source());
        assert!(backend.poll_event().is_none());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let mut backend = FfplayBackend::new("ffplay", "ffprobe");
        assert!(backend.load(Path::new("/definitely/not/here.mp4")).is_err());
        assert!(!backend.has_source());
    }

    #[test]
    fn test_failed_load_forgets_previous_media() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.mp4");
        std::fs::write(&first, b"").unwrap();

        let mut backend = FfplayBackend::new("ffplay", "ffprobe");
        backend.load(&first).unwrap();
        backend.duration = Some(100.0);
        backend.position = 42.0;
        assert!(backend.has_source());

        assert!(backend.load(&dir.path().join("gone.mp4")).is_err());
        assert!(!backend.has_source());
        assert_eq!(backend.duration(), None);
        assert_eq!(backend.position(), 0.0);
        assert!(backend.poll_event().is_none());
        assert!(backend.play().is_err());
    }
}
