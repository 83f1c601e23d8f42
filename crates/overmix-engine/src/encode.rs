//! Output encoding — the encoder seam plus the WAV implementation.
//!
//! Encoders stage their bytes in a temporary file next to the destination
//! and rename into place only after a successful finalize, so nothing is
//! ever observable at the destination path until the encode succeeded.

use crate::render::MixBuffer;
use overmix_core::{BounceError, Result};
use serde::{Deserialize, Serialize};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Requested output sample format (one playable WAV container).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// Lossless 16-bit integer PCM.
    WavPcm16,
    /// Lossless 32-bit float PCM.
    WavFloat32,
}

impl OutputKind {
    /// File extension for this kind.
    pub fn extension(self) -> &'static str {
        "wav"
    }

    fn wav_spec(self, sample_rate: u32) -> hound::WavSpec {
        match self {
            Self::WavPcm16 => hound::WavSpec {
                channels: 2,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            Self::WavFloat32 => hound::WavSpec {
                channels: 2,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            },
        }
    }
}

/// Writes a finished mix to a destination path.
///
/// Contract: nothing is observable at the destination until `encode`
/// returns `Ok`; on any failure the destination is untouched.
pub trait Encoder: Send + Sync {
    /// Encode the mix and return the final output location.
    fn encode(&self, mix: &MixBuffer, dest: &Path) -> Result<PathBuf>;
}

/// WAV encoder backed by `hound`.
#[derive(Debug, Clone, Copy)]
pub struct WavEncoder {
    pub kind: OutputKind,
}

impl WavEncoder {
    pub fn new(kind: OutputKind) -> Self {
        Self { kind }
    }
}

impl Encoder for WavEncoder {
    fn encode(&self, mix: &MixBuffer, dest: &Path) -> Result<PathBuf> {
        let dir = dest.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            std::fs::create_dir_all(dir)?;
        }

        // Stage in the destination directory so persist() is a same-volume
        // rename.
        let mut staged = tempfile::Builder::new()
            .prefix(".overmix-bounce-")
            .suffix(".wav")
            .tempfile_in(dir.unwrap_or_else(|| Path::new(".")))?;

        let spec = self.kind.wav_spec(mix.sample_rate);
        let mut writer = hound::WavWriter::new(BufWriter::new(staged.as_file_mut()), spec)
            .map_err(|e| BounceError::Encode(format!("failed to start wav stream: {e}")))?;

        match self.kind {
            OutputKind::WavPcm16 => {
                for &s in &mix.samples {
                    let quantized = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
                    writer
                        .write_sample(quantized)
                        .map_err(|e| BounceError::Encode(format!("failed to write sample: {e}")))?;
                }
            }
            OutputKind::WavFloat32 => {
                for &s in &mix.samples {
                    writer
                        .write_sample(s)
                        .map_err(|e| BounceError::Encode(format!("failed to write sample: {e}")))?;
                }
            }
        }

        writer
            .finalize()
            .map_err(|e| BounceError::Encode(format!("failed to finalize wav file: {e}")))?;

        staged
            .persist(dest)
            .map_err(|e| BounceError::Encode(format!("failed to move output into place: {e}")))?;

        info!(dest = %dest.display(), frames = mix.frame_count(), "wav encode complete");
        Ok(dest.to_path_buf())
    }
}
