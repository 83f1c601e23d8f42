//! Error types for Overmix.

use crate::channel::{ChannelId, MixGroupId};
use thiserror::Error;

/// Main error type for Overmix operations.
#[derive(Error, Debug)]
pub enum BounceError {
    #[error("source for {channel} unreadable: {detail}")]
    SourceUnreadable { channel: ChannelId, detail: String },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("a bounce is already running for mix group {0}")]
    AlreadyRunning(MixGroupId),

    #[error("bounce cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for Overmix operations.
pub type Result<T> = std::result::Result<T, BounceError>;
