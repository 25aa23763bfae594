use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum PlayerError {
    #[error("episode index {index} is out of bounds for a queue of {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub(crate) enum MediaError {
    #[error("failed to launch media player {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("media player exited before its control socket came up")]
    ExitedEarly,
    #[error("timed out connecting to media player socket {0}")]
    ConnectTimeout(String),
    #[error("media player control socket failed: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(not(unix))]
    #[error("media playback is not supported on this platform")]
    Unsupported,
}
