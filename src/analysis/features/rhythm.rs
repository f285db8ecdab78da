//! Coarse rhythm cues from a short-frame RMS envelope.

use crate::audio::envelope::rms_envelope;
use crate::types::AudioSample;

const SMOOTHING_TAPS: usize = 5;
/// Syllable nuclei must exceed this fraction of the loudest smoothed frame.
const NUCLEUS_FLOOR: f64 = 0.3;

/// Estimated syllables per second: local maxima of the smoothed envelope.
pub fn syllable_rate(sample: &AudioSample) -> f64 {
    let duration = sample.duration();
    if duration <= 0.0 {
        return 0.0;
    }
    let smoothed = moving_average(&rms_envelope(sample), SMOOTHING_TAPS);
    count_nuclei(&smoothed) as f64 / duration
}

fn count_nuclei(envelope: &[f64]) -> usize {
    if envelope.len() < 3 {
        return 0;
    }
    let threshold = NUCLEUS_FLOOR * envelope.iter().copied().fold(f64::MIN, f64::max);
    envelope
        .windows(3)
        .filter(|w| w[1] > w[0] && w[1] > w[2] && w[1] > threshold)
        .count()
}

/// Centered moving average with the output as long as the input.
///
/// Positions outside the input count as zero, so edges are attenuated.
pub(crate) fn moving_average(values: &[f64], taps: usize) -> Vec<f64> {
    if values.is_empty() || taps == 0 {
        return values.to_vec();
    }
    let offset = (taps - 1) / 2;
    (0..values.len())
        .map(|center| {
            let start = center.saturating_sub(offset);
            let end = (center + taps - offset).min(values.len());
            values[start..end].iter().sum::<f64>() / taps as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn moving_average_keeps_length_and_pads_edges() {
        let smoothed = moving_average(&[5.0; 6], 5);
        assert_eq!(smoothed.len(), 6);
        assert_relative_eq!(smoothed[0], 3.0);
        assert_relative_eq!(smoothed[1], 4.0);
        assert_relative_eq!(smoothed[2], 5.0);
        assert_relative_eq!(smoothed[5], 3.0);
    }

    #[test]
    fn bursts_produce_syllables() {
        let sample_rate = 22_050;
        let mut samples = Vec::new();
        for _ in 0..4 {
            samples.extend(std::iter::repeat(0.6_f32).take(sample_rate as usize / 8));
            samples.extend(std::iter::repeat(0.0_f32).take(sample_rate as usize / 8));
        }
        let sample = AudioSample::new(samples, sample_rate).unwrap();
        let rate = syllable_rate(&sample);
        // four bursts in one second
        assert!(rate > 2.0 && rate < 4.5, "{rate}");
    }

    #[test]
    fn silence_has_no_syllables() {
        let sample = AudioSample::new(vec![0.0_f32; 22_050], 22_050).unwrap();
        assert_eq!(syllable_rate(&sample), 0.0);
    }
}
