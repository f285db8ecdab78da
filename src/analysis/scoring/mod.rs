//! Heuristic scorers and exercise-type dispatch.

pub mod exercise;
pub mod jitter;
pub mod metrics;
pub mod phoneme;

use tracing::debug;

use super::feedback;
use super::report::{
    ConversationDetail, DetectedFeatures, ExerciseDetail, ExerciseScores, FallbackDetail,
    MetricScores, PhonemeDetail, ScoreSet, SentenceDetail, WordDetail,
};
use super::summary::FeatureSummary;

pub use jitter::Jitter;

/// A bounded score in [0, 100].
pub type Score = u8;

/// Round to the nearest integer and clamp into [0, 100]; NaN maps to 0.
pub fn clamp_score(value: f64) -> Score {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as Score
}

/// Truncate toward zero and clamp into [0, 100].
fn truncate_score(value: f64) -> Score {
    clamp_score(value.trunc())
}

pub const FALLBACK_NOTE: &str = "Fallback analysis - audio processing had limited capability";

/// What kind of analysis to run, with its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseMode {
    /// Every signal-derived metric, no exercise target.
    General,
    Phoneme { symbol: String },
    Word { word: String },
    Sentence { text: String },
    Conversation { context: String },
    /// Unrecognized exercise type; scored by the fallback path.
    Unsupported { exercise_type: String },
}

impl ExerciseMode {
    /// Map a raw exercise type (case-insensitive) and its target text to a mode.
    pub fn parse(exercise_type: &str, target: &str) -> Self {
        let target = target.to_string();
        match exercise_type.trim().to_lowercase().as_str() {
            "phoneme" => ExerciseMode::Phoneme { symbol: target },
            "word" => ExerciseMode::Word { word: target },
            "sentence" => ExerciseMode::Sentence { text: target },
            "conversation" => ExerciseMode::Conversation { context: target },
            "general" | "speech" => ExerciseMode::General,
            _ => ExerciseMode::Unsupported {
                exercise_type: exercise_type.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ExerciseMode::General => "general",
            ExerciseMode::Phoneme { .. } => "phoneme",
            ExerciseMode::Word { .. } => "word",
            ExerciseMode::Sentence { .. } => "sentence",
            ExerciseMode::Conversation { .. } => "conversation",
            ExerciseMode::Unsupported { exercise_type } => exercise_type,
        }
    }
}

/// Score a summary under `mode`.
///
/// Only the exercise modes and the fallback draw from `jitter`.
pub fn score(summary: &FeatureSummary, mode: &ExerciseMode, jitter: &mut Jitter) -> ScoreSet {
    debug!(mode = mode.name(), "scoring");
    match mode {
        ExerciseMode::General => score_metrics(summary),
        ExerciseMode::Phoneme { symbol } => exercise_set(score_phoneme(summary, symbol, jitter)),
        ExerciseMode::Word { word } => {
            let raw = exercise::score_word(summary, word, jitter);
            exercise_set(finish(
                raw,
                exercise::word_feedback(&raw, word),
                ExerciseDetail::Word(WordDetail {
                    target_word: word.clone(),
                    speech_rate: summary.syllable_rate,
                }),
            ))
        }
        ExerciseMode::Sentence { text } => {
            let raw = exercise::score_sentence(summary, text, jitter);
            exercise_set(finish(
                raw,
                exercise::sentence_feedback(&raw, summary.syllable_rate),
                ExerciseDetail::Sentence(SentenceDetail {
                    word_count: exercise::word_count(text),
                    pause_count: summary.pause_count,
                    speech_rate: summary.syllable_rate,
                }),
            ))
        }
        ExerciseMode::Conversation { context } => {
            let raw = exercise::score_conversation(summary, jitter);
            exercise_set(finish(
                raw,
                exercise::conversation_feedback(&raw),
                ExerciseDetail::Conversation(ConversationDetail {
                    conversation_context: context.clone(),
                }),
            ))
        }
        ExerciseMode::Unsupported { exercise_type } => fallback(exercise_type, jitter),
    }
}

/// Every signal-derived metric score.
pub fn metric_scores(summary: &FeatureSummary) -> MetricScores {
    let clarity = metrics::clarity(summary);
    let consistency = metrics::consistency(summary);
    MetricScores {
        pronunciation: metrics::pronunciation(summary),
        fluency: metrics::fluency(summary),
        clarity,
        consistency,
        energy: metrics::energy_distribution(summary),
        intonation: metrics::intonation(summary),
        stress_pattern: metrics::stress_pattern(summary),
        word_accuracy: metrics::word_accuracy(clarity, consistency),
        confidence: metrics::confidence(summary),
        speech_rate: metrics::speech_rate(summary),
        speech_segments: summary.speech_segments,
    }
}

/// Every signal-derived metric plus the suggestion and issue tables.
pub fn score_metrics(summary: &FeatureSummary) -> ScoreSet {
    let scores = metric_scores(summary);
    let inputs = feedback::FeedbackInputs::from_metrics(&scores);
    ScoreSet {
        metrics: Some(scores),
        exercise: None,
        suggested_improvements: feedback::suggestions(&inputs),
        detected_issues: feedback::issues(&inputs),
        used_fallback: false,
    }
}

/// Randomized scores that never look at audio, flagged as such.
pub fn fallback(exercise_type: &str, jitter: &mut Jitter) -> ScoreSet {
    let base = 65 + jitter.offset(-10..=25);
    let accuracy = base + jitter.offset(-5..=10);
    let clarity = base + jitter.offset(-8..=12);
    let fluency = base + jitter.offset(-6..=15);
    let scores = ExerciseScores {
        overall: clamp_score(base as f64),
        accuracy: clamp_score(accuracy as f64),
        clarity: clamp_score(clarity as f64),
        fluency: clamp_score(fluency as f64),
        feedback: vec![
            format!("Audio analysis completed for {exercise_type} exercise."),
            "Keep practicing regularly for improvement.".to_string(),
            "Try recording in a quieter environment for better analysis.".to_string(),
        ],
        detail: ExerciseDetail::Fallback(FallbackDetail {
            requested_type: exercise_type.to_string(),
            note: FALLBACK_NOTE.to_string(),
        }),
    };
    ScoreSet {
        used_fallback: true,
        ..exercise_set(scores)
    }
}

fn score_phoneme(summary: &FeatureSummary, symbol: &str, jitter: &mut Jitter) -> ExerciseScores {
    let model = phoneme::lookup(symbol);
    if model.is_none() {
        debug!(symbol, "no reference model for phoneme");
    }
    let breakdown = phoneme::accuracy(summary, model, jitter);
    let clarity = phoneme::clarity(summary, jitter);
    let accuracy = breakdown.accuracy;
    ExerciseScores {
        overall: phoneme::overall(accuracy, clarity),
        accuracy: truncate_score(accuracy),
        clarity: truncate_score(clarity),
        fluency: truncate_score((accuracy + clarity) / 2.0),
        feedback: phoneme::feedback(accuracy, clarity, symbol),
        detail: ExerciseDetail::Phoneme(PhonemeDetail {
            target_phoneme: symbol.to_string(),
            detected_features: DetectedFeatures {
                duration: summary.duration,
                pitch: summary.pitch.mean_pitch,
                formants: summary.formants,
            },
            accuracy_breakdown: breakdown,
        }),
    }
}

fn finish(raw: exercise::RawScores, feedback: Vec<String>, detail: ExerciseDetail) -> ExerciseScores {
    ExerciseScores {
        overall: truncate_score(raw.overall()),
        accuracy: truncate_score(raw.accuracy),
        clarity: truncate_score(raw.clarity),
        fluency: truncate_score(raw.fluency),
        feedback,
        detail,
    }
}

fn exercise_set(scores: ExerciseScores) -> ScoreSet {
    let inputs = feedback::FeedbackInputs::from_exercise(&scores);
    ScoreSet {
        metrics: None,
        suggested_improvements: scores.feedback.clone(),
        detected_issues: feedback::issues(&inputs),
        exercise: Some(scores),
        used_fallback: false,
    }
}
