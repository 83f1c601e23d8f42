//! Channel and mix-session data model.
//!
//! A mix session holds one base take plus an ordered set of overdub
//! layers. Every channel carries volume/pan/mute/solo/loop state; volume
//! and pan are clamped on every mutation path so downstream consumers
//! never see an out-of-range value.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one mix group (a base take plus its overdub layers).
/// Used to key the single-flight bounce guarantee.
pub type MixGroupId = Uuid;

/// Maximum channel/master volume (1.0 = unity, above 1.0 = intentional boost).
pub const MAX_VOLUME: f32 = 1.5;

/// Identity of a channel within a mix group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    /// The base take. Defines the canonical render length and never loops.
    Base,
    /// Overdub layer by index.
    Layer(usize),
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base channel"),
            Self::Layer(i) => write!(f, "layer {i}"),
        }
    }
}

/// Clamp volume on deserialization; restored snapshots go through the
/// same clamp as live mutations.
fn de_volume<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(f32::deserialize(deserializer)?.clamp(0.0, MAX_VOLUME))
}

/// Clamp pan on deserialization.
fn de_pan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(f32::deserialize(deserializer)?.clamp(-1.0, 1.0))
}

/// Per-channel mix parameters plus the fixed source duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelState {
    /// Volume (0.0 to 1.5, clamped). Private so every mutation clamps.
    #[serde(deserialize_with = "de_volume")]
    volume: f32,
    /// Pan (-1.0 = full left, 0.0 = center, 1.0 = full right, clamped).
    #[serde(deserialize_with = "de_pan")]
    pan: f32,
    /// Whether this channel is muted.
    pub muted: bool,
    /// Whether this channel is soloed. Solo overrides mute.
    pub solo: bool,
    /// Whether a short source repeats to fill the render length.
    /// Ignored for the base channel, which never loops.
    pub looped: bool,
    /// Source length in sample frames, fixed at channel creation.
    source_duration_samples: u64,
}

impl ChannelState {
    /// Create a channel at unity gain, centered, with all flags off.
    pub fn new(source_duration_samples: u64) -> Self {
        Self {
            volume: 1.0,
            pan: 0.0,
            muted: false,
            solo: false,
            looped: false,
            source_duration_samples,
        }
    }

    /// Current volume.
    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set volume, clamped to [0.0, 1.5].
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
    }

    /// Current pan position.
    #[inline]
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Set pan, clamped to [-1.0, 1.0].
    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    /// Source length in sample frames.
    #[inline]
    pub fn source_duration_samples(&self) -> u64 {
        self.source_duration_samples
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new(0)
    }
}

/// The full mix state for one group: base take, overdub layers, master volume.
///
/// Channel count is fixed for the session. The UI mutates this in place;
/// the engine clones a snapshot at bounce start, so in-flight edits never
/// affect a running render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixSettings {
    base: ChannelState,
    layers: Vec<ChannelState>,
    #[serde(deserialize_with = "de_volume")]
    master_volume: f32,
}

impl MixSettings {
    /// Create a session from the base take and its overdub layers.
    /// The base channel is forced loop-off.
    pub fn new(mut base: ChannelState, layers: Vec<ChannelState>) -> Self {
        base.looped = false;
        Self {
            base,
            layers,
            master_volume: 1.0,
        }
    }

    /// The base channel.
    pub fn base(&self) -> &ChannelState {
        &self.base
    }

    /// Mutable base channel. Loop state set here is ignored at resolve
    /// time; the base never loops.
    pub fn base_mut(&mut self) -> &mut ChannelState {
        &mut self.base
    }

    /// Layer channel by index.
    pub fn layer(&self, index: usize) -> Option<&ChannelState> {
        self.layers.get(index)
    }

    /// Mutable layer channel by index.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut ChannelState> {
        self.layers.get_mut(index)
    }

    /// Number of overdub layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// All channels in render order: base first, then layers by index.
    pub fn channels(&self) -> impl Iterator<Item = (ChannelId, &ChannelState)> {
        std::iter::once((ChannelId::Base, &self.base)).chain(
            self.layers
                .iter()
                .enumerate()
                .map(|(i, ch)| (ChannelId::Layer(i), ch)),
        )
    }

    /// Master volume, applied after per-channel mixing.
    #[inline]
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Set master volume, clamped to [0.0, 1.5].
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, MAX_VOLUME);
    }

    /// Check if any channel (base or layer) is soloed.
    pub fn any_solo(&self) -> bool {
        self.base.solo || self.layers.iter().any(|ch| ch.solo)
    }
}
