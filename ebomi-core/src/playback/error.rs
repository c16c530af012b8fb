use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("orchestrator is no longer running")]
    ChannelClosed,
}

pub type PlaybackResult<T> = std::result::Result<T, PlaybackError>;
