use std::time::Duration;
use testrelay_common::protocol::FrameError;

/// Faults raised by a command channel
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("could not connect to test host at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("test host did not answer within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("test host reported an error: {0}")]
    Remote(String),
    #[error("test host is reloading")]
    Reloading { retry_after: Option<Duration> },
    #[error("unexpected response from test host: {0}")]
    Malformed(String),
}

impl ChannelError {
    /// Transport faults and host reloads are worth another attempt.
    /// Errors the host reported deliberately are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::Connect { .. }
            | ChannelError::Timeout(_)
            | ChannelError::Reloading { .. } => true,
            ChannelError::Frame(FrameError::Io(_)) => true,
            ChannelError::Frame(_) | ChannelError::Remote(_) | ChannelError::Malformed(_) => false,
        }
    }

    /// Delay the host asked for before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ChannelError::Reloading { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Reasons a single status query produced no usable snapshot
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("status query rejected: {0}")]
    Rejected(String),
    #[error("status payload could not be decoded: {0}")]
    Malformed(String),
}
