use std::path::Path;

/// Notifications coming back from the media backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Opened,
    Ended,
    Failed(String),
    /// The user dismissed the player without finishing the media
    Closed,
}

/// The media widget that actually decodes and shows the video.
pub trait MediaBackend {
    fn load(&mut self, path: &Path) -> anyhow::Result<()>;
    fn play(&mut self) -> anyhow::Result<()>;
    fn pause(&mut self) -> anyhow::Result<()>;
    fn stop(&mut self) -> anyhow::Result<()>;
    fn seek(&mut self, position: f64) -> anyhow::Result<()>;

    fn has_source(&self) -> bool;
    /// Current offset in seconds.
    fn position(&self) -> f64;
    /// `None` when the media has no seekable duration.
    fn duration(&self) -> Option<f64>;

    fn set_speed(&mut self, speed: f64) -> anyhow::Result<()>;
    fn set_volume(&mut self, volume: f64) -> anyhow::Result<()>;

    fn poll_event(&mut self) -> Option<MediaEvent>;
    fn close(&mut self);
}
