//! Threshold tables that turn scores into suggestions and detected issues.

use serde::Serialize;

use super::report::{ExerciseScores, MetricScores, ScoreSet};
use super::scoring::Score;

pub const PRAISE: &str = "Great job! Keep practicing to maintain your skills";

/// (threshold, suggestion, issue threshold, issue) for one scored dimension.
struct Rule {
    suggest_below: Score,
    suggestion: &'static str,
    flag_below: Score,
    issue: &'static str,
}

const PRONUNCIATION: Rule = Rule {
    suggest_below: 80,
    suggestion: "Practice clear pronunciation of difficult words",
    flag_below: 70,
    issue: "Pronunciation needs improvement",
};
const FLUENCY: Rule = Rule {
    suggest_below: 75,
    suggestion: "Work on smooth transitions between words",
    flag_below: 65,
    issue: "Speech fluency could be enhanced",
};
const CLARITY: Rule = Rule {
    suggest_below: 80,
    suggestion: "Focus on enunciating each syllable clearly",
    flag_below: 70,
    issue: "Speech clarity requires attention",
};
const CONSISTENCY: Rule = Rule {
    suggest_below: 75,
    suggestion: "Maintain steady volume throughout your speech",
    flag_below: 65,
    issue: "Volume consistency needs work",
};

/// The four scores the tables look at.
///
/// Exercise results have no consistency score, so that row is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackInputs {
    pub pronunciation: Score,
    pub fluency: Score,
    pub clarity: Score,
    pub consistency: Option<Score>,
}

impl FeedbackInputs {
    pub fn from_metrics(metrics: &MetricScores) -> Self {
        Self {
            pronunciation: metrics.pronunciation,
            fluency: metrics.fluency,
            clarity: metrics.clarity,
            consistency: Some(metrics.consistency),
        }
    }

    /// Accuracy stands in for pronunciation.
    pub fn from_exercise(scores: &ExerciseScores) -> Self {
        Self {
            pronunciation: scores.accuracy,
            fluency: scores.fluency,
            clarity: scores.clarity,
            consistency: None,
        }
    }

    fn rows(&self) -> impl Iterator<Item = (Score, &'static Rule)> {
        [
            Some((self.pronunciation, &PRONUNCIATION)),
            Some((self.fluency, &FLUENCY)),
            Some((self.clarity, &CLARITY)),
            self.consistency.map(|score| (score, &CONSISTENCY)),
        ]
        .into_iter()
        .flatten()
    }
}

/// Suggestions in table order; the praise line alone when none fire.
pub fn suggestions(inputs: &FeedbackInputs) -> Vec<String> {
    let lines: Vec<String> = inputs
        .rows()
        .filter(|(score, rule)| *score < rule.suggest_below)
        .map(|(_, rule)| rule.suggestion.to_string())
        .collect();
    if lines.is_empty() {
        vec![PRAISE.to_string()]
    } else {
        lines
    }
}

pub fn issues(inputs: &FeedbackInputs) -> Vec<String> {
    inputs
        .rows()
        .filter(|(score, rule)| *score < rule.flag_below)
        .map(|(_, rule)| rule.issue.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub suggestions: Vec<String>,
    pub issues: Vec<String>,
}

/// Recompute the feedback of a score set.
///
/// Exercise results keep their mode-specific lines as suggestions.
pub fn feedback(scores: &ScoreSet) -> Feedback {
    if let Some(metrics) = &scores.metrics {
        let inputs = FeedbackInputs::from_metrics(metrics);
        return Feedback {
            suggestions: suggestions(&inputs),
            issues: issues(&inputs),
        };
    }
    match &scores.exercise {
        Some(exercise) => Feedback {
            suggestions: exercise.feedback.clone(),
            issues: issues(&FeedbackInputs::from_exercise(exercise)),
        },
        None => Feedback {
            suggestions: Vec::new(),
            issues: Vec::new(),
        },
    }
}
