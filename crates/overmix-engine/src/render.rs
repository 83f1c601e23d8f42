//! Mixdown renderer — sums resolved channels into one interleaved stereo
//! buffer.
//!
//! Sources shorter than the render length either tile (loop) or fall
//! silent; a streaming peak tracker feeds a single global scale-down pass
//! so the summed mix never clips while relative balance is preserved.

use crate::job::{BounceCancel, BounceProgress};
use crate::resolver::EffectiveChannel;
use overmix_core::{BounceError, ChannelId, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// Provides decoded source audio for a channel, at the project sample
/// rate. Resampling mismatched sources happens before this seam.
pub trait SourceProvider {
    /// Load the decoded samples for one channel. Implementations should
    /// fail with [`BounceError::SourceUnreadable`] on decode/I/O errors;
    /// any other error is wrapped by the renderer.
    fn load(&self, id: ChannelId) -> Result<SourceClip>;
}

/// Decoded source audio: interleaved f32 frames, mono or stereo.
#[derive(Debug, Clone)]
pub struct SourceClip {
    samples: Vec<f32>,
    channels: u16,
}

impl SourceClip {
    /// Mono clip from a flat sample buffer.
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            samples,
            channels: 1,
        }
    }

    /// Stereo clip from interleaved L/R samples. A trailing odd sample is
    /// dropped.
    pub fn stereo(mut interleaved: Vec<f32>) -> Self {
        interleaved.truncate(interleaved.len() & !1);
        Self {
            samples: interleaved,
            channels: 2,
        }
    }

    /// Length in sample frames.
    pub fn frame_count(&self) -> u64 {
        (self.samples.len() / self.channels as usize) as u64
    }

    /// Left/right samples at a frame index. Mono sources feed both sides.
    #[inline]
    pub fn frame(&self, index: u64) -> (f32, f32) {
        match self.channels {
            1 => {
                let s = self.samples[index as usize];
                (s, s)
            }
            _ => {
                let base = index as usize * 2;
                (self.samples[base], self.samples[base + 1])
            }
        }
    }
}

/// In-memory source provider for embedders that decode up front (and for
/// tests).
#[derive(Debug, Default)]
pub struct MemoryProvider {
    clips: HashMap<ChannelId, SourceClip>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the decoded clip for a channel.
    pub fn insert(&mut self, id: ChannelId, clip: SourceClip) {
        self.clips.insert(id, clip);
    }
}

impl SourceProvider for MemoryProvider {
    fn load(&self, id: ChannelId) -> Result<SourceClip> {
        self.clips
            .get(&id)
            .cloned()
            .ok_or_else(|| BounceError::SourceUnreadable {
                channel: id,
                detail: "no decoded audio registered for channel".into(),
            })
    }
}

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Project sample rate; all sources are already at this rate.
    pub sample_rate: u32,
    /// Cancellation and progress are serviced every this many output
    /// frames.
    pub cancel_check_interval: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            cancel_check_interval: 4096,
        }
    }
}

/// The rendered mix: interleaved stereo f32 at the project sample rate.
#[derive(Debug, Clone)]
pub struct MixBuffer {
    /// Interleaved L/R samples.
    pub samples: Vec<f32>,
    /// Sample rate of the mix.
    pub sample_rate: u32,
}

impl MixBuffer {
    /// Length in sample frames.
    pub fn frame_count(&self) -> u64 {
        (self.samples.len() / 2) as u64
    }

    /// Peak absolute sample magnitude.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |p, s| p.max(s.abs()))
    }
}

/// Compute the render length in frames.
///
/// The base channel's duration is the floor. An audible, non-looped layer
/// that is longer extends the render to the longest such layer. Looped
/// layers only fill — they never extend.
fn render_length(channels: &[EffectiveChannel], clips: &[SourceClip]) -> u64 {
    let mut length = channels
        .iter()
        .zip(clips)
        .find(|(ch, _)| ch.id == ChannelId::Base)
        .map(|(_, clip)| clip.frame_count())
        .unwrap_or(0);

    for (ch, clip) in channels.iter().zip(clips) {
        if ch.id != ChannelId::Base && ch.gain > 0.0 && !ch.looped {
            length = length.max(clip.frame_count());
        }
    }
    length
}

/// Render the resolved channels into one stereo buffer.
///
/// The cancellation flag is checked every `cancel_check_interval` frames;
/// a request surfaces as [`BounceError::Cancelled`]. `on_progress` is
/// called at the same granularity with a monotonically non-decreasing
/// fraction, and once more at completion.
pub fn render_mix(
    channels: &[EffectiveChannel],
    provider: &dyn SourceProvider,
    config: &RenderConfig,
    cancel: &BounceCancel,
    mut on_progress: impl FnMut(BounceProgress),
) -> Result<MixBuffer> {
    let mut clips = Vec::with_capacity(channels.len());
    for ch in channels {
        let clip = provider.load(ch.id).map_err(|e| match e {
            err @ BounceError::SourceUnreadable { .. } => err,
            other => BounceError::SourceUnreadable {
                channel: ch.id,
                detail: other.to_string(),
            },
        })?;
        clips.push(clip);
    }

    let total_frames = render_length(channels, &clips);
    debug!(
        channels = channels.len(),
        total_frames, "starting mixdown render"
    );

    let sample_len = (total_frames as usize) * 2;
    let mut samples: Vec<f32> = Vec::new();
    samples
        .try_reserve_exact(sample_len)
        .map_err(|e| BounceError::OutOfMemory(format!("mix buffer of {sample_len} samples: {e}")))?;
    samples.resize(sample_len, 0.0);

    // Pre-compute stereo amplitudes; inaudible slots contribute nothing
    // but keep their position so the output shape is deterministic.
    let amps: Vec<(f32, f32)> = channels.iter().map(|ch| ch.stereo_amps()).collect();

    let interval = config.cancel_check_interval.max(1);
    let mut peak = 0.0f32;

    for f in 0..total_frames {
        if f % interval == 0 {
            if cancel.is_cancelled() {
                info!(frame = f, total_frames, "render cancelled");
                return Err(BounceError::Cancelled);
            }
            on_progress(BounceProgress {
                frames_done: f,
                total_frames,
            });
        }

        let mut left = 0.0f32;
        let mut right = 0.0f32;
        for ((ch, clip), &(amp_l, amp_r)) in channels.iter().zip(&clips).zip(&amps) {
            let len = clip.frame_count();
            let src = if f < len {
                f
            } else if ch.looped && len > 0 {
                f % len
            } else {
                // Non-looped source exhausted: silence.
                continue;
            };
            let (l, r) = clip.frame(src);
            left += amp_l * l;
            right += amp_r * r;
        }

        let base = (f as usize) * 2;
        samples[base] = left;
        samples[base + 1] = right;
        peak = peak.max(left.abs()).max(right.abs());
    }

    // Safety limiter: one global scale-down, preserving relative balance.
    if peak > 1.0 {
        let scale = 1.0 / peak;
        info!(peak, scale, "mix exceeds full scale, normalizing");
        for s in &mut samples {
            *s *= scale;
        }
    }

    on_progress(BounceProgress {
        frames_done: total_frames,
        total_frames,
    });
    debug!(total_frames, peak, "mixdown render complete");

    Ok(MixBuffer {
        samples,
        sample_rate: config.sample_rate,
    })
}
