//! Mix resolver — turns a `MixSettings` snapshot into effective
//! per-channel parameters.
//!
//! Resolution is pure and total: mute/solo precedence and master volume
//! are folded into a single gain per channel, and panning becomes a pair
//! of constant-power stereo amplitudes.

use overmix_core::{ChannelId, MixSettings};

/// Effective parameters for one channel, ready for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveChannel {
    /// Which channel this slot belongs to.
    pub id: ChannelId,
    /// Combined channel volume and master volume; 0.0 exactly when the
    /// channel is inaudible under mute/solo precedence.
    pub gain: f32,
    /// Pan position, passed through unchanged (-1.0 to 1.0).
    pub pan: f32,
    /// Whether a short source tiles to fill the render length.
    /// Always false for the base channel.
    pub looped: bool,
}

impl EffectiveChannel {
    /// Left/right amplitudes from gain and pan (constant-power panning).
    ///
    /// Uses the sin/cos curve so perceived loudness stays flat across the
    /// stereo field: at center both sides sit at `gain * cos(PI/4)`.
    pub fn stereo_amps(&self) -> (f32, f32) {
        let angle = (self.pan + 1.0) * 0.25 * std::f32::consts::PI;
        (self.gain * angle.cos(), self.gain * angle.sin())
    }
}

/// Resolve a settings snapshot into one effective channel per slot,
/// base first, then layers by index.
///
/// If any channel is soloed, only soloed channels are audible — solo
/// overrides everything, including that channel's own mute flag.
/// Otherwise audibility is simply `!muted`. Inaudible channels keep
/// their slot with gain 0 so the output shape is deterministic.
pub fn resolve(settings: &MixSettings) -> Vec<EffectiveChannel> {
    let any_solo = settings.any_solo();
    let master = settings.master_volume();

    settings
        .channels()
        .map(|(id, ch)| {
            let audible = if any_solo { ch.solo } else { !ch.muted };
            let gain = if audible { ch.volume() * master } else { 0.0 };
            // The base take never loops; it is the deterministic floor
            // for the render length.
            let looped = ch.looped && id != ChannelId::Base;
            EffectiveChannel {
                id,
                gain,
                pan: ch.pan(),
                looped,
            }
        })
        .collect()
}
