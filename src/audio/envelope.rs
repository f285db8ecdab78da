//! Short-frame RMS envelope shared by pause detection and rhythm analysis.

use crate::types::{AudioSample, FrameConfig};

/// Frame configuration of the envelope.
pub const ENVELOPE_FRAMES: FrameConfig = FrameConfig {
    frame_length: 1024,
    hop_length: 512,
};

/// Root-mean-square level of a frame; 0 for an empty frame.
pub fn frame_rms(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / frame.len() as f64).sqrt()
}

/// RMS level of every full envelope frame.
pub fn rms_envelope(sample: &AudioSample) -> Vec<f64> {
    ENVELOPE_FRAMES
        .frames(sample.samples())
        .map(frame_rms)
        .collect()
}
