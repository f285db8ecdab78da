//! Signal-derived metric scorers.
//!
//! Each `measure_*` function either produces a score or says why it could
//! not; the public scorers substitute the documented default for failures.

use tracing::debug;

use crate::analysis::summary::FeatureSummary;
use crate::analysis::{Measured, Reason};

use super::{clamp_score, Score};

pub const CLARITY_DEFAULT: Score = 75;
pub const CONSISTENCY_DEFAULT: Score = 80;
pub const ENERGY_DEFAULT: Score = 70;
pub const SPEECH_RATE_DEFAULT: u32 = 150;
pub const PRONUNCIATION_DEFAULT: Score = 80;
pub const FLUENCY_DEFAULT: Score = 75;
pub const FLUENCY_NO_TRANSITIONS: Score = 80;
pub const INTONATION_DEFAULT: Score = 75;
pub const INTONATION_UNVOICED: Score = 80;
pub const STRESS_DEFAULT: Score = 70;
pub const CONFIDENCE_DEFAULT: Score = 80;

const WORDS_PER_MARKED_RISE: f64 = 0.3;
const MIN_WPM: f64 = 60.0;
const MAX_WPM: f64 = 300.0;

/// (mean above, variance below, score), checked in order.
const ENERGY_TIERS: [(f64, f64, Score); 5] = [
    (0.05, 0.01, 95),
    (0.04, 0.02, 85),
    (0.03, 0.03, 75),
    (0.02, 0.04, 65),
    (0.01, 0.05, 55),
];
const ENERGY_FLOOR: Score = 45;

/// `100 - clamp(round(x))`, the shared "lower is better" mapping.
fn inverse(penalty: f64) -> Score {
    100 - clamp_score(penalty)
}

fn or_default<T: Copy>(metric: &'static str, measured: Measured<T>, default: T) -> T {
    measured.unwrap_or_else(|reason| {
        debug!(metric, %reason, "using default score");
        default
    })
}

pub fn measure_clarity(summary: &FeatureSummary) -> Measured<Score> {
    let spread = summary.spectral_spread?;
    Ok(inverse((spread.centroid_std + spread.rolloff_std) * 1000.0))
}

pub fn clarity(summary: &FeatureSummary) -> Score {
    or_default("clarity", measure_clarity(summary), CLARITY_DEFAULT)
}

/// A zero mean level is a measurement (the worst score), not a failure.
pub fn measure_consistency(summary: &FeatureSummary) -> Measured<Score> {
    let energy = summary.energy?;
    if energy.mean == 0.0 {
        return Ok(0);
    }
    Ok(inverse(energy.std / energy.mean * 200.0))
}

pub fn consistency(summary: &FeatureSummary) -> Score {
    or_default("consistency", measure_consistency(summary), CONSISTENCY_DEFAULT)
}

pub fn measure_energy_distribution(summary: &FeatureSummary) -> Measured<Score> {
    let energy = summary.energy?;
    Ok(ENERGY_TIERS
        .iter()
        .find(|(mean, variance, _)| energy.mean > *mean && energy.variance < *variance)
        .map(|&(_, _, score)| score)
        .unwrap_or(ENERGY_FLOOR))
}

pub fn energy_distribution(summary: &FeatureSummary) -> Score {
    or_default("energy", measure_energy_distribution(summary), ENERGY_DEFAULT)
}

/// Words per minute from marked rises of the spectral centroid, truncated.
pub fn measure_speech_rate(summary: &FeatureSummary) -> Measured<u32> {
    let changes = summary.centroid_changes?;
    if summary.duration <= 0.0 {
        return Err(Reason::Degenerate("speech rate duration"));
    }
    let words = (changes.marked_rises as f64 * WORDS_PER_MARKED_RISE)
        .floor()
        .max(1.0);
    let per_minute = (words / summary.duration * 60.0).trunc();
    Ok(per_minute.clamp(MIN_WPM, MAX_WPM) as u32)
}

pub fn speech_rate(summary: &FeatureSummary) -> u32 {
    or_default("speech_rate", measure_speech_rate(summary), SPEECH_RATE_DEFAULT)
}

pub fn measure_pronunciation(summary: &FeatureSummary) -> Measured<Score> {
    Ok(inverse(summary.mfcc_spread? * 50.0))
}

pub fn pronunciation(summary: &FeatureSummary) -> Score {
    or_default(
        "pronunciation",
        measure_pronunciation(summary),
        PRONUNCIATION_DEFAULT,
    )
}

pub fn measure_fluency(summary: &FeatureSummary) -> Measured<Score> {
    let changes = summary.centroid_changes?;
    if changes.transitions == 0 {
        return Err(Reason::NoTransitions);
    }
    Ok(clamp_score(
        changes.smooth as f64 / changes.transitions as f64 * 100.0,
    ))
}

pub fn fluency(summary: &FeatureSummary) -> Score {
    match measure_fluency(summary) {
        Err(Reason::NoTransitions) => FLUENCY_NO_TRANSITIONS,
        measured => or_default("fluency", measured, FLUENCY_DEFAULT),
    }
}

pub fn measure_intonation(summary: &FeatureSummary) -> Measured<Score> {
    Ok(inverse(summary.voiced_pitch_std? * 0.1))
}

pub fn intonation(summary: &FeatureSummary) -> Score {
    match measure_intonation(summary) {
        Err(Reason::NoVoicedFrames) => INTONATION_UNVOICED,
        measured => or_default("intonation", measured, INTONATION_DEFAULT),
    }
}

pub fn measure_stress_pattern(summary: &FeatureSummary) -> Measured<Score> {
    match summary.energy_peaks? {
        0 => Err(Reason::NoPeaks),
        peaks => Ok(clamp_score(50.0 + 5.0 * peaks as f64)),
    }
}

pub fn stress_pattern(summary: &FeatureSummary) -> Score {
    or_default("stress_pattern", measure_stress_pattern(summary), STRESS_DEFAULT)
}

pub fn word_accuracy(clarity: Score, consistency: Score) -> Score {
    clamp_score(0.6 * clarity as f64 + 0.4 * consistency as f64)
}

pub fn measure_confidence(summary: &FeatureSummary) -> Measured<Score> {
    Ok(clamp_score(summary.snr_db? * 2.0 + 50.0))
}

pub fn confidence(summary: &FeatureSummary) -> Score {
    or_default("confidence", measure_confidence(summary), CONFIDENCE_DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::summary::{CentroidChanges, EnergyStats, SpectralSpread};

    fn with_energy(mean: f64, variance: f64) -> FeatureSummary {
        FeatureSummary {
            energy: Ok(EnergyStats {
                mean,
                std: variance.sqrt(),
                variance,
            }),
            ..FeatureSummary::default()
        }
    }

    #[test]
    fn empty_summary_uses_defaults() {
        let summary = FeatureSummary::default();
        assert_eq!(clarity(&summary), CLARITY_DEFAULT);
        assert_eq!(consistency(&summary), CONSISTENCY_DEFAULT);
        assert_eq!(energy_distribution(&summary), ENERGY_DEFAULT);
        assert_eq!(speech_rate(&summary), SPEECH_RATE_DEFAULT);
        assert_eq!(pronunciation(&summary), PRONUNCIATION_DEFAULT);
        assert_eq!(fluency(&summary), FLUENCY_DEFAULT);
        assert_eq!(intonation(&summary), INTONATION_UNVOICED);
        assert_eq!(stress_pattern(&summary), STRESS_DEFAULT);
        assert_eq!(confidence(&summary), CONFIDENCE_DEFAULT);
    }

    #[test]
    fn energy_tiers_step_down() {
        assert_eq!(energy_distribution(&with_energy(0.06, 0.005)), 95);
        assert_eq!(energy_distribution(&with_energy(0.045, 0.015)), 85);
        assert_eq!(energy_distribution(&with_energy(0.035, 0.025)), 75);
        assert_eq!(energy_distribution(&with_energy(0.025, 0.035)), 65);
        assert_eq!(energy_distribution(&with_energy(0.015, 0.045)), 55);
        assert_eq!(energy_distribution(&with_energy(0.0, 0.0)), 45);
    }

    #[test]
    fn zero_mean_energy_is_worst_consistency() {
        assert_eq!(consistency(&with_energy(0.0, 0.0)), 0);
        assert_eq!(consistency(&with_energy(0.2, 0.0)), 100);
    }

    #[test]
    fn clarity_falls_as_spread_grows() {
        let mut previous = Score::MAX;
        for step in 0..20 {
            let spread = step as f64 * 0.006;
            let summary = FeatureSummary {
                spectral_spread: Ok(SpectralSpread {
                    centroid_std: spread,
                    rolloff_std: spread,
                }),
                ..FeatureSummary::default()
            };
            let score = clarity(&summary);
            assert!(score <= previous);
            previous = score;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn fluency_without_transitions() {
        let summary = FeatureSummary {
            centroid_changes: Err(Reason::NoTransitions),
            ..FeatureSummary::default()
        };
        assert_eq!(fluency(&summary), FLUENCY_NO_TRANSITIONS);
    }

    #[test]
    fn speech_rate_is_clamped() {
        let summary = FeatureSummary {
            duration: 60.0,
            centroid_changes: Ok(CentroidChanges {
                marked_rises: 10_000,
                smooth: 0,
                transitions: 20_000,
            }),
            ..FeatureSummary::default()
        };
        assert_eq!(speech_rate(&summary), 300);
        let slow = FeatureSummary {
            centroid_changes: Ok(CentroidChanges {
                marked_rises: 1,
                smooth: 0,
                transitions: 2,
            }),
            ..summary
        };
        assert_eq!(speech_rate(&slow), 60);
    }

    #[test]
    fn speech_rate_truncates_partial_words_per_minute() {
        // 10 rises -> 3 words over 2.2 s = 81.8 wpm
        let summary = FeatureSummary {
            duration: 2.2,
            centroid_changes: Ok(CentroidChanges {
                marked_rises: 10,
                smooth: 0,
                transitions: 40,
            }),
            ..FeatureSummary::default()
        };
        assert_eq!(speech_rate(&summary), 81);
    }

    #[test]
    fn word_accuracy_blends_inputs() {
        assert_eq!(word_accuracy(75, 80), 77);
        assert_eq!(word_accuracy(100, 100), 100);
    }
}
