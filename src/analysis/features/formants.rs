//! Coarse formant estimation by peak picking on the whole-signal spectrum.

use crate::types::AudioSample;

use super::spectral::SpectrumAnalyzer;

/// Number of formants reported.
pub const FORMANT_COUNT: usize = 3;
/// Peaks at or below this frequency are ignored.
const MIN_FORMANT_HZ: f64 = 200.0;
/// Peaks must reach this fraction of the strongest bin.
const RELATIVE_MAGNITUDE_FLOOR: f64 = 0.1;

/// Lowest spectral peak frequencies in ascending order, zero-padded.
pub type FormantEstimate = [f64; FORMANT_COUNT];

pub fn estimate_formants(sample: &AudioSample) -> FormantEstimate {
    let mut analyzer = SpectrumAnalyzer::new(sample.len(), sample.sample_rate());
    let magnitudes = analyzer.magnitudes(sample.samples());
    pick_formants(&magnitudes, analyzer.frequencies())
}

pub(crate) fn pick_formants(magnitudes: &[f64], frequencies: &[f64]) -> FormantEstimate {
    let mut formants = [0.0; FORMANT_COUNT];
    if magnitudes.len() < 3 {
        return formants;
    }
    let peak = magnitudes.iter().copied().fold(0.0, f64::max);
    let floor = RELATIVE_MAGNITUDE_FLOOR * peak;
    let peaks = (1..magnitudes.len() - 1)
        .filter(|&i| {
            magnitudes[i] > magnitudes[i - 1]
                && magnitudes[i] > magnitudes[i + 1]
                && magnitudes[i] > floor
                && frequencies[i] > MIN_FORMANT_HZ
        })
        .map(|i| frequencies[i]);
    for (slot, frequency) in formants.iter_mut().zip(peaks) {
        *slot = frequency;
    }
    formants
}

/// Similarity in [0, 1] between detected and expected formant lists.
///
/// Each pair contributes its fractional error, capped at 1; pairs whose
/// expected value is not positive contribute no error.
pub fn compare_formants(detected: &[f64], expected: &[f64]) -> f64 {
    let comparisons = detected.len().min(expected.len());
    if comparisons == 0 {
        return 0.0;
    }
    let total_error: f64 = detected
        .iter()
        .zip(expected.iter())
        .filter(|&(_, &target)| target > 0.0)
        .map(|(&found, &target)| ((found - target).abs() / target).min(1.0))
        .sum();
    (1.0 - total_error / comparisons as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identical_formants_match_perfectly() {
        let pattern = [800.0, 1200.0, 2300.0];
        assert_relative_eq!(compare_formants(&pattern, &pattern), 1.0);
    }

    #[test]
    fn comparison_stays_in_unit_interval() {
        let cases = [
            ([0.0, 0.0, 0.0], [800.0, 1200.0, 2300.0]),
            ([9_000.0, 12_000.0, 30_000.0], [800.0, 1200.0, 2300.0]),
            ([800.0, 1200.0, 2300.0], [0.0, 0.0, 0.0]),
            ([850.0, 1100.0, 2500.0], [800.0, 1200.0, 2300.0]),
        ];
        for (detected, expected) in cases {
            let similarity = compare_formants(&detected, &expected);
            assert!((0.0..=1.0).contains(&similarity), "{similarity}");
        }
    }

    #[test]
    fn empty_lists_score_zero() {
        assert_eq!(compare_formants(&[], &[800.0]), 0.0);
    }

    #[test]
    fn picks_peaks_above_floor_and_pads() {
        let frequencies: Vec<f64> = (0..10).map(|i| i as f64 * 100.0).collect();
        let magnitudes = [0.0, 5.0, 0.0, 0.0, 10.0, 0.0, 0.5, 0.0, 0.0, 0.0];
        // 100 Hz is below the floor frequency, 600 Hz is below 10% of peak
        assert_eq!(pick_formants(&magnitudes, &frequencies), [400.0, 0.0, 0.0]);
    }
}
