use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Fraction of total spectral magnitude that defines the rolloff frequency.
pub(crate) const ROLLOFF_FRACTION: f64 = 0.85;

/// Real-input magnitude spectrum of fixed-length, unwindowed frames.
pub(crate) struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    len: usize,
    frequencies: Vec<f64>,
    buffer: Vec<Complex<f64>>,
}

impl SpectrumAnalyzer {
    pub(crate) fn new(len: usize, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(len);
        Self {
            fft,
            len,
            frequencies: bin_frequencies(len, sample_rate),
            buffer: vec![Complex::new(0.0, 0.0); len],
        }
    }

    /// Bin centre frequencies in Hz, `len / 2 + 1` entries.
    pub(crate) fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Magnitudes of the non-negative frequency bins of `frame`.
    pub(crate) fn magnitudes(&mut self, frame: &[f32]) -> Vec<f64> {
        debug_assert_eq!(frame.len(), self.len, "frame length must match the plan");
        for (slot, &sample) in self.buffer.iter_mut().zip(frame.iter()) {
            *slot = Complex::new(sample as f64, 0.0);
        }
        self.fft.process(&mut self.buffer);
        self.buffer[..self.frequencies.len()]
            .iter()
            .map(|value| value.norm())
            .collect()
    }
}

/// Frequencies of the real FFT bins for a transform of `len` samples.
pub(crate) fn bin_frequencies(len: usize, sample_rate: u32) -> Vec<f64> {
    let bins = len / 2 + 1;
    let resolution = sample_rate as f64 / len.max(1) as f64;
    (0..bins).map(|bin| bin as f64 * resolution).collect()
}

/// Magnitude-weighted mean frequency; 0 for an all-zero spectrum.
pub(crate) fn spectral_centroid(magnitudes: &[f64], frequencies: &[f64]) -> f64 {
    let total: f64 = magnitudes.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = magnitudes
        .iter()
        .zip(frequencies.iter())
        .map(|(magnitude, frequency)| magnitude * frequency)
        .sum();
    weighted / total
}

/// Lowest frequency whose cumulative magnitude reaches `fraction` of the total.
///
/// 0 for an all-zero spectrum; the top bin when rounding keeps the running
/// sum below the threshold.
pub(crate) fn spectral_rolloff(magnitudes: &[f64], frequencies: &[f64], fraction: f64) -> f64 {
    let total: f64 = magnitudes.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let threshold = fraction * total;
    let mut cumulative = 0.0;
    for (magnitude, frequency) in magnitudes.iter().zip(frequencies.iter()) {
        cumulative += magnitude;
        if cumulative >= threshold {
            return *frequency;
        }
    }
    frequencies.last().copied().unwrap_or(0.0)
}

/// Fraction of adjacent samples whose sign differs, relative to frame length.
pub(crate) fn zero_crossing_rate(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let changes = frame
        .windows(2)
        .filter(|pair| sign(pair[0]) != sign(pair[1]))
        .count();
    changes as f64 / frame.len() as f64
}

fn sign(value: f32) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centroid_of_pure_tone_sits_on_its_bin() {
        let sample_rate = 8_000;
        let len = 256;
        // bin 16 -> 500 Hz
        let frame: Vec<f32> = (0..len)
            .map(|n| (2.0 * std::f32::consts::PI * 16.0 * n as f32 / len as f32).sin())
            .collect();
        let mut analyzer = SpectrumAnalyzer::new(len, sample_rate);
        let magnitudes = analyzer.magnitudes(&frame);
        let centroid = spectral_centroid(&magnitudes, analyzer.frequencies());
        assert_relative_eq!(centroid, 500.0, epsilon = 1.0);
        let rolloff = spectral_rolloff(&magnitudes, analyzer.frequencies(), ROLLOFF_FRACTION);
        assert_relative_eq!(rolloff, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn silent_frame_has_zero_centroid_and_rolloff() {
        let mut analyzer = SpectrumAnalyzer::new(64, 8_000);
        let magnitudes = analyzer.magnitudes(&[0.0; 64]);
        assert_eq!(spectral_centroid(&magnitudes, analyzer.frequencies()), 0.0);
        assert_eq!(
            spectral_rolloff(&magnitudes, analyzer.frequencies(), ROLLOFF_FRACTION),
            0.0
        );
    }

    #[test]
    fn zero_crossings_count_sign_changes() {
        let frame = [1.0, -1.0, 1.0, -1.0];
        assert_relative_eq!(zero_crossing_rate(&frame), 0.75);
        assert_eq!(zero_crossing_rate(&[0.5; 8]), 0.0);
    }
}
