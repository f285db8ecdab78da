//! Phoneme reference models and phoneme-mode scoring.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::analysis::features::{compare_formants, FormantEstimate};
use crate::analysis::summary::FeatureSummary;

use super::jitter::Jitter;
use super::{clamp_score, Score};

/// Qualitative difficulty tier of a phoneme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    /// Multiplier applied to the accuracy score.
    pub fn weight(self) -> f64 {
        match self {
            Difficulty::Beginner => 1.1,
            Difficulty::Intermediate => 1.0,
            Difficulty::Advanced => 0.9,
            Difficulty::Expert => 0.8,
        }
    }
}

/// Static acoustic reference for one phoneme.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonemeModel {
    pub frequency_range: (f64, f64),
    pub energy_threshold: f64,
    /// Expected minimum duration in seconds.
    pub duration_min: f64,
    pub formant_pattern: [f64; 3],
    pub difficulty: Difficulty,
    pub common_errors: &'static [&'static str],
    /// Articulation tip shown when accuracy falls below [`TIP_THRESHOLD`].
    #[serde(skip)]
    pub tip: &'static str,
}

/// Accuracy below this adds the phoneme's articulation tip.
pub const TIP_THRESHOLD: f64 = 80.0;

static PHONEME_MODELS: Lazy<BTreeMap<&'static str, PhonemeModel>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "th",
            PhonemeModel {
                frequency_range: (2000.0, 8000.0),
                energy_threshold: 0.3,
                duration_min: 0.1,
                formant_pattern: [800.0, 1200.0, 2300.0],
                difficulty: Difficulty::Advanced,
                common_errors: &["t", "d", "s", "z"],
                tip: "For 'th', place your tongue tip between your teeth and blow gently.",
            },
        ),
        (
            "s",
            PhonemeModel {
                frequency_range: (4000.0, 10000.0),
                energy_threshold: 0.4,
                duration_min: 0.08,
                formant_pattern: [6000.0, 7000.0, 8000.0],
                difficulty: Difficulty::Intermediate,
                common_errors: &["th", "sh", "z"],
                tip: "For 's', keep your tongue behind your teeth and create a narrow channel for air.",
            },
        ),
        (
            "r",
            PhonemeModel {
                frequency_range: (1000.0, 3000.0),
                energy_threshold: 0.25,
                duration_min: 0.12,
                formant_pattern: [1200.0, 1400.0, 1700.0],
                difficulty: Difficulty::Advanced,
                common_errors: &["w", "l", "er"],
                tip: "For 'r', curl your tongue tip up without touching the roof of your mouth.",
            },
        ),
        (
            "l",
            PhonemeModel {
                frequency_range: (500.0, 2500.0),
                energy_threshold: 0.3,
                duration_min: 0.1,
                formant_pattern: [700.0, 1200.0, 2400.0],
                difficulty: Difficulty::Intermediate,
                common_errors: &["r", "w", "y"],
                tip: "For 'l', touch your tongue tip to the roof of your mouth just behind your teeth.",
            },
        ),
    ])
});

/// Every reference model, keyed by lowercase symbol.
pub fn models() -> &'static BTreeMap<&'static str, PhonemeModel> {
    &PHONEME_MODELS
}

/// Case-insensitive model lookup.
pub fn lookup(symbol: &str) -> Option<&'static PhonemeModel> {
    PHONEME_MODELS.get(symbol.trim().to_lowercase().as_str())
}

/// Intermediate terms of the phoneme accuracy score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyBreakdown {
    pub base: f64,
    pub duration_ratio: Option<f64>,
    pub duration_adjustment: f64,
    pub difficulty_weight: f64,
    pub formant_similarity: f64,
    pub accuracy: f64,
}

/// Jittered base plus duration, difficulty and formant terms, clamped last.
pub fn accuracy(
    summary: &FeatureSummary,
    model: Option<&PhonemeModel>,
    jitter: &mut Jitter,
) -> AccuracyBreakdown {
    let base = 75.0 + jitter.offset(-10..=15) as f64;
    let Some(model) = model else {
        return AccuracyBreakdown {
            base,
            duration_ratio: None,
            duration_adjustment: 0.0,
            difficulty_weight: 1.0,
            formant_similarity: 0.0,
            accuracy: base.clamp(0.0, 100.0),
        };
    };

    let ratio = summary.duration / model.duration_min;
    let duration_adjustment = if (0.8..=1.5).contains(&ratio) {
        5.0
    } else if ratio < 0.5 || ratio > 2.0 {
        -10.0
    } else {
        0.0
    };
    let weight = model.difficulty.weight();
    let similarity = formant_similarity(&summary.formants, &model.formant_pattern);
    let score = (base + duration_adjustment) * weight + similarity * 10.0;

    AccuracyBreakdown {
        base,
        duration_ratio: Some(ratio),
        duration_adjustment,
        difficulty_weight: weight,
        formant_similarity: similarity,
        accuracy: score.clamp(0.0, 100.0),
    }
}

fn formant_similarity(detected: &FormantEstimate, expected: &[f64; 3]) -> f64 {
    compare_formants(detected, expected)
}

/// Jittered base adjusted for signal energy and the mean rolloff band.
pub fn clarity(summary: &FeatureSummary, jitter: &mut Jitter) -> f64 {
    let mut score = 70.0 + jitter.offset(-8..=20) as f64;
    if summary.total_energy > 0.1 {
        score += 10.0;
    }
    if let Ok(rolloff) = summary.mean_rolloff {
        if (2000.0..=6000.0).contains(&rolloff) {
            score += 8.0;
        } else if rolloff > 8000.0 {
            score -= 5.0;
        }
    }
    score.clamp(0.0, 100.0)
}

/// Feedback lines for a phoneme attempt, in a fixed order.
pub fn feedback(accuracy: f64, clarity: f64, symbol: &str) -> Vec<String> {
    let mut lines = Vec::new();
    if accuracy >= 85.0 {
        lines.push(format!(
            "Excellent {symbol} pronunciation! Your articulation is very accurate."
        ));
    } else if accuracy >= 70.0 {
        lines.push(format!("Good {symbol} sound! Keep practicing for consistency."));
    } else {
        lines.push(format!(
            "The {symbol} sound needs more practice. Focus on tongue placement."
        ));
    }
    if clarity < 70.0 {
        lines.push("Try to speak more clearly and reduce background noise.".to_string());
    }
    if let Some(model) = lookup(symbol) {
        if accuracy < TIP_THRESHOLD {
            lines.push(model.tip.to_string());
        }
    }
    lines
}

/// Overall phoneme score: 0.6 accuracy + 0.4 clarity, truncated.
pub fn overall(accuracy: f64, clarity: f64) -> Score {
    clamp_score((0.6 * accuracy + 0.4 * clarity).trunc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn summary_with_duration(duration: f64) -> FeatureSummary {
        FeatureSummary {
            duration,
            ..FeatureSummary::default()
        }
    }

    #[test]
    fn lookup_ignores_case() {
        assert!(lookup("TH").is_some());
        assert!(lookup(" s ").is_some());
        assert!(lookup("zh").is_none());
        assert_eq!(models().len(), 4);
    }

    #[test]
    fn matching_duration_earns_bonus() {
        let model = lookup("th");
        let breakdown = accuracy(&summary_with_duration(0.1), model, &mut Jitter::none());
        assert_eq!(breakdown.duration_adjustment, 5.0);
        // (75 + 5) * 0.9 with silent formants sharing nothing with the pattern
        assert_relative_eq!(breakdown.accuracy, 72.0);
    }

    #[test]
    fn far_off_duration_is_penalized() {
        let model = lookup("s");
        let breakdown = accuracy(&summary_with_duration(1.0), model, &mut Jitter::none());
        assert_eq!(breakdown.duration_adjustment, -10.0);
        assert_relative_eq!(breakdown.accuracy, 65.0);
    }

    #[test]
    fn unknown_phoneme_keeps_base() {
        let breakdown = accuracy(&summary_with_duration(0.1), None, &mut Jitter::none());
        assert_relative_eq!(breakdown.accuracy, 75.0);
        assert!(breakdown.duration_ratio.is_none());
    }

    #[test]
    fn tips_fire_below_bar() {
        let lines = feedback(60.0, 65.0, "r");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("The r sound"));
        assert!(lines[2].contains("curl your tongue"));
        assert_eq!(feedback(90.0, 90.0, "r").len(), 1);
    }
}
