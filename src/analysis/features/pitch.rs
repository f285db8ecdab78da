use serde::Serialize;

use crate::analysis::summary::statistics;
use crate::types::{AudioSample, FrameConfig};

const FRAME_SECONDS: f64 = 0.025;
const HOP_SECONDS: f64 = 0.010;
const FREQ_MIN: f64 = 80.0;
const FREQ_MAX: f64 = 500.0;
/// Frames whose standard deviation does not exceed this are skipped.
const ENERGY_GATE: f64 = 0.01;

/// One tracked frame: estimated pitch and the normalized autocorrelation peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    pub frequency: f64,
    pub magnitude: f64,
}

/// Autocorrelation pitch track over short frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchTrack {
    pub frames: Vec<PitchFrame>,
}

/// Summary of voiced pitch in Hz; all zero when nothing was voiced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchEstimate {
    pub mean_pitch: f64,
    pub pitch_std: f64,
    pub pitch_range: f64,
}

impl PitchTrack {
    pub fn track(sample: &AudioSample) -> Self {
        let sample_rate = sample.sample_rate() as f64;
        let frame_length = (FRAME_SECONDS * sample_rate) as usize;
        let hop_length = ((HOP_SECONDS * sample_rate) as usize).max(1);
        let min_lag = (sample_rate / FREQ_MAX) as usize;
        let max_lag = (sample_rate / FREQ_MIN) as usize;
        if frame_length == 0 || max_lag >= frame_length || min_lag >= max_lag {
            return Self::default();
        }
        let config = FrameConfig {
            frame_length,
            hop_length: hop_length.min(frame_length),
        };

        let frames = config
            .frames(sample.samples())
            .filter(|frame| frame_std(frame) > ENERGY_GATE)
            .filter_map(|frame| detect_period(frame, min_lag.max(1), max_lag))
            .map(|(lag, magnitude)| PitchFrame {
                frequency: sample_rate / lag as f64,
                magnitude,
            })
            .collect();
        Self { frames }
    }

    pub fn estimate(&self) -> PitchEstimate {
        let values: Vec<f64> = self.frames.iter().map(|frame| frame.frequency).collect();
        let (Ok(mean), Ok(spread)) = (statistics::mean(&values), statistics::std_dev(&values))
        else {
            return PitchEstimate::default();
        };
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        let min = values.iter().copied().fold(f64::MAX, f64::min);
        PitchEstimate {
            mean_pitch: mean,
            pitch_std: spread,
            pitch_range: max - min,
        }
    }

    /// Pitches of frames whose autocorrelation peak exceeds `threshold`.
    pub fn confident_pitches(&self, threshold: f64) -> Vec<f64> {
        self.frames
            .iter()
            .filter(|frame| frame.magnitude > threshold)
            .map(|frame| frame.frequency)
            .collect()
    }
}

/// Lag in `[min_lag, max_lag)` with the largest autocorrelation, plus `r[lag] / r[0]`.
fn detect_period(frame: &[f32], min_lag: usize, max_lag: usize) -> Option<(usize, f64)> {
    let zero_lag = autocorrelation(frame, 0);
    if zero_lag <= 0.0 {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for lag in min_lag..max_lag {
        let value = autocorrelation(frame, lag);
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((lag, value)),
        }
    }
    best.map(|(lag, value)| (lag, value / zero_lag))
}

fn autocorrelation(frame: &[f32], lag: usize) -> f64 {
    frame
        .iter()
        .zip(frame.iter().skip(lag))
        .map(|(&a, &b)| a as f64 * b as f64)
        .sum()
}

fn frame_std(frame: &[f32]) -> f64 {
    let values: Vec<f64> = frame.iter().map(|&s| s as f64).collect();
    statistics::std_dev(&values).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tone(frequency: f32, seconds: f32, sample_rate: u32) -> AudioSample {
        let total = (seconds * sample_rate as f32) as usize;
        let samples: Vec<f32> = (0..total)
            .map(|n| {
                0.5 * (2.0 * std::f32::consts::PI * frequency * n as f32 / sample_rate as f32)
                    .sin()
            })
            .collect();
        AudioSample::new(samples, sample_rate).unwrap()
    }

    #[test]
    fn tracks_steady_tone() {
        let track = PitchTrack::track(&tone(200.0, 0.5, 22_050));
        let estimate = track.estimate();
        assert!(!track.frames.is_empty());
        assert_abs_diff_eq!(estimate.mean_pitch, 200.0, epsilon = 5.0);
        assert!(estimate.pitch_std < 5.0);
    }

    #[test]
    fn estimate_is_population_statistics_of_frames() {
        let track = PitchTrack {
            frames: [100.0, 200.0, 300.0]
                .iter()
                .map(|&frequency| PitchFrame {
                    frequency,
                    magnitude: 0.9,
                })
                .collect(),
        };
        let estimate = track.estimate();
        assert_abs_diff_eq!(estimate.mean_pitch, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(estimate.pitch_std, (20_000.0_f64 / 3.0).sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(estimate.pitch_range, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn energy_gate_skips_quiet_frames() {
        assert_eq!(frame_std(&[]), 0.0);
        assert_eq!(frame_std(&[0.3; 32]), 0.0);
        let quiet = tone(200.0, 0.5, 22_050);
        let scaled: Vec<f32> = quiet.samples().iter().map(|s| s * 0.01).collect();
        let quiet = AudioSample::new(scaled, 22_050).unwrap();
        assert!(PitchTrack::track(&quiet).frames.is_empty());
    }

    #[test]
    fn silence_has_no_voiced_frames() {
        let silence = AudioSample::new(vec![0.0_f32; 22_050], 22_050).unwrap();
        let track = PitchTrack::track(&silence);
        assert!(track.frames.is_empty());
        assert_eq!(track.estimate(), PitchEstimate::default());
    }
}
