use anyhow::Result;

/// Something the player view can drive like a single `<audio>` element.
pub(crate) trait MediaElement {
    /// Replace the current source and start playing it.
    fn load(&mut self, url: &str) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn set_position(&mut self, seconds: f64) -> Result<()>;
    fn set_looping(&mut self, looping: bool) -> Result<()>;
    /// Events observed since the previous call, oldest first.
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MediaEvent {
    LoadedMetadata,
    TimeUpdate(f64),
    Play,
    Pause,
    Ended,
}
