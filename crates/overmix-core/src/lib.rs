//! Overmix Core - Foundation types for the bounce engine
//!
//! This crate provides the fundamental types shared across Overmix:
//! - Channel and mix-session model (ChannelState, MixSettings)
//! - Channel and mix-group identity
//! - Error types and the terminal render result

pub mod channel;
pub mod error;
pub mod result;

pub use channel::{ChannelId, ChannelState, MixGroupId, MixSettings, MAX_VOLUME};
pub use error::{BounceError, Result};
pub use result::RenderResult;
