//! Overmix Engine - Offline mixdown (bounce) engine
//!
//! Flattens a base take plus overdub layers into one playable file.
//!
//! Architecture:
//! - `resolver`: Turns a `MixSettings` snapshot into effective per-channel
//!   gain/pan/loop parameters, applying mute/solo precedence
//! - `render`: Sums resolved channels into one interleaved stereo buffer,
//!   looping or silence-padding unequal sources, with a global peak limiter
//! - `encode`: Encoder seam plus the WAV implementation; output is staged
//!   to a temp file and renamed into place only on success
//! - `job`: Bounce lifecycle — single-flight per mix group, progress
//!   events, cooperative cancellation, exactly one terminal result

pub mod encode;
pub mod job;
pub mod render;
pub mod resolver;

pub use encode::{Encoder, OutputKind, WavEncoder};
pub use job::{BounceCancel, BounceController, BounceEvent, BounceHandle, BounceProgress};
pub use render::{render_mix, MemoryProvider, MixBuffer, RenderConfig, SourceClip, SourceProvider};
pub use resolver::{resolve, EffectiveChannel};
