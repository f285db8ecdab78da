//! Core value types shared by the decoding boundary and the analysis pipeline

use std::sync::Arc;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Canonical analysis sample rate in Hz.
pub const CANONICAL_SAMPLE_RATE: u32 = 22_050;
/// Default analysis frame length in samples.
pub const DEFAULT_FRAME_LENGTH: usize = 2048;
/// Default hop between successive analysis frames in samples.
pub const DEFAULT_HOP_LENGTH: usize = 512;

/// Decoded mono PCM audio (immutable once constructed)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl AudioSample {
    /// Build a sample, rejecting empty buffers and a zero sample rate.
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Result<Self> {
        let samples = samples.into();
        ensure!(!samples.is_empty(), "audio sample contains no PCM data");
        ensure!(sample_rate > 0, "audio sample rate must be positive");
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Samples normalized to [-1.0, 1.0]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed sample; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Framing used by the frame feature extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub frame_length: usize,
    pub hop_length: usize,
}

impl FrameConfig {
    pub fn new(frame_length: usize, hop_length: usize) -> Result<Self> {
        let config = Self {
            frame_length,
            hop_length,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.hop_length > 0, "hop_length must be positive");
        ensure!(
            self.hop_length <= self.frame_length,
            "hop_length ({}) must not exceed frame_length ({})",
            self.hop_length,
            self.frame_length
        );
        Ok(())
    }

    /// Number of frames that fully fit inside `sample_count` samples.
    ///
    /// The tail that cannot fill a whole frame is dropped, and a signal no
    /// longer than one frame yields zero frames.
    pub fn frame_count(&self, sample_count: usize) -> usize {
        if self.hop_length == 0 || sample_count < self.frame_length {
            return 0;
        }
        (sample_count - self.frame_length) / self.hop_length
    }

    /// Iterate over the full frames of `samples`.
    pub fn frames<'a>(&self, samples: &'a [f32]) -> impl Iterator<Item = &'a [f32]> + 'a {
        let count = self.frame_count(samples.len());
        let frame_length = self.frame_length;
        let hop_length = self.hop_length;
        (0..count).map(move |index| {
            let start = index * hop_length;
            &samples[start..start + frame_length]
        })
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_length: DEFAULT_FRAME_LENGTH,
            hop_length: DEFAULT_HOP_LENGTH,
        }
    }
}
