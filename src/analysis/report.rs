//! Outbound payloads: score sets and the full speech report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::feedback::{self, FeedbackInputs};
use super::scoring::phoneme::AccuracyBreakdown;
use super::scoring::Score;
use super::summary::FeatureSummary;

/// Signal-derived metric scores of a general speech analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricScores {
    #[serde(rename = "pronunciationScore")]
    pub pronunciation: Score,
    #[serde(rename = "fluencyScore")]
    pub fluency: Score,
    #[serde(rename = "clarityScore")]
    pub clarity: Score,
    #[serde(rename = "consistencyScore")]
    pub consistency: Score,
    #[serde(rename = "energyScore")]
    pub energy: Score,
    #[serde(rename = "intonationScore")]
    pub intonation: Score,
    #[serde(rename = "stressPatternScore")]
    pub stress_pattern: Score,
    #[serde(rename = "wordAccuracy")]
    pub word_accuracy: Score,
    #[serde(rename = "confidenceLevel")]
    pub confidence: Score,
    /// Words per minute, within [60, 300].
    #[serde(rename = "speechRate")]
    pub speech_rate: u32,
    #[serde(rename = "speechSegments")]
    pub speech_segments: usize,
}

/// What the phoneme scorer measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFeatures {
    pub duration: f64,
    pub pitch: f64,
    pub formants: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonemeDetail {
    pub target_phoneme: String,
    pub detected_features: DetectedFeatures,
    pub accuracy_breakdown: AccuracyBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDetail {
    pub target_word: String,
    pub speech_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceDetail {
    pub word_count: usize,
    pub pause_count: usize,
    pub speech_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetail {
    pub conversation_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackDetail {
    pub requested_type: String,
    pub note: String,
}

/// Mode-specific part of an exercise result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "exerciseType", rename_all = "lowercase")]
pub enum ExerciseDetail {
    Phoneme(PhonemeDetail),
    Word(WordDetail),
    Sentence(SentenceDetail),
    Conversation(ConversationDetail),
    Fallback(FallbackDetail),
}

/// Scores of one exercise attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseScores {
    #[serde(rename = "overallScore")]
    pub overall: Score,
    #[serde(rename = "accuracyScore")]
    pub accuracy: Score,
    #[serde(rename = "clarityScore")]
    pub clarity: Score,
    #[serde(rename = "fluencyScore")]
    pub fluency: Score,
    pub feedback: Vec<String>,
    #[serde(flatten)]
    pub detail: ExerciseDetail,
}

/// Result of one analysis call.
///
/// General analyses fill `metrics`; exercise analyses fill `exercise`.
/// Either one serializes flat into the same object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSet {
    #[serde(flatten)]
    pub metrics: Option<MetricScores>,
    #[serde(flatten)]
    pub exercise: Option<ExerciseScores>,
    pub suggested_improvements: Vec<String>,
    pub detected_issues: Vec<String>,
    pub used_fallback: bool,
}

impl ScoreSet {
    /// Look a score up by its outbound field name.
    pub fn score(&self, name: &str) -> Option<Score> {
        if let Some(metrics) = &self.metrics {
            let found = match name {
                "pronunciationScore" => Some(metrics.pronunciation),
                "fluencyScore" => Some(metrics.fluency),
                "clarityScore" => Some(metrics.clarity),
                "consistencyScore" => Some(metrics.consistency),
                "energyScore" => Some(metrics.energy),
                "intonationScore" => Some(metrics.intonation),
                "stressPatternScore" => Some(metrics.stress_pattern),
                "wordAccuracy" => Some(metrics.word_accuracy),
                "confidenceLevel" => Some(metrics.confidence),
                _ => None,
            };
            if found.is_some() {
                return found;
            }
        }
        let exercise = self.exercise.as_ref()?;
        match name {
            "overallScore" => Some(exercise.overall),
            "accuracyScore" => Some(exercise.accuracy),
            "clarityScore" => Some(exercise.clarity),
            "fluencyScore" => Some(exercise.fluency),
            _ => None,
        }
    }

    /// Every emitted 0-100 score.
    pub fn all_scores(&self) -> Vec<Score> {
        let mut scores = Vec::new();
        if let Some(m) = &self.metrics {
            scores.extend([
                m.pronunciation,
                m.fluency,
                m.clarity,
                m.consistency,
                m.energy,
                m.intonation,
                m.stress_pattern,
                m.word_accuracy,
                m.confidence,
            ]);
        }
        if let Some(e) = &self.exercise {
            scores.extend([e.overall, e.accuracy, e.clarity, e.fluency]);
        }
        scores
    }
}

/// Signal description carried by a [`SpeechReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisBlock {
    pub duration: f64,
    pub average_volume: f64,
    pub volume_range: f64,
    pub max_volume: f64,
    pub speech_rate: u32,
    pub clarity: Score,
    pub consistency: Score,
    pub energy: Score,
    pub sample_rate: u32,
    pub speech_segments: usize,
}

/// Full payload of a general speech analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechReport {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub analysis: AnalysisBlock,
    #[serde(flatten)]
    pub scores: MetricScores,
    pub suggested_improvements: Vec<String>,
    pub detected_issues: Vec<String>,
}

impl SpeechReport {
    /// Assemble a report from a summary and its metric scores.
    ///
    /// Suggestions and issues are derived from `metrics`.
    pub fn new(summary: &FeatureSummary, metrics: MetricScores) -> Self {
        let inputs = FeedbackInputs::from_metrics(&metrics);
        Self {
            success: true,
            timestamp: Utc::now(),
            analysis: AnalysisBlock {
                duration: summary.duration,
                average_volume: summary.average_volume,
                volume_range: summary.volume_range,
                max_volume: summary.max_volume,
                speech_rate: metrics.speech_rate,
                clarity: metrics.clarity,
                consistency: metrics.consistency,
                energy: metrics.energy,
                sample_rate: summary.sample_rate,
                speech_segments: metrics.speech_segments,
            },
            scores: metrics,
            suggested_improvements: feedback::suggestions(&inputs),
            detected_issues: feedback::issues(&inputs),
        }
    }

    /// Report for a general score set; `None` for exercise results, which
    /// carry no metric scores.
    pub fn from_score_set(summary: &FeatureSummary, scores: &ScoreSet) -> Option<Self> {
        scores.metrics.map(|metrics| Self::new(summary, metrics))
    }
}
