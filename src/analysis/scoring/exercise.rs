//! Word, sentence and conversation scoring.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::analysis::summary::FeatureSummary;

use super::jitter::Jitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordDifficulty {
    Easy,
    Medium,
    Hard,
}

/// Reference syllable structure of a practice word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordPattern {
    pub syllables: usize,
    /// 1 marks the stressed syllable.
    pub stress: &'static [u8],
    pub difficulty: WordDifficulty,
}

static WORD_PATTERNS: Lazy<BTreeMap<&'static str, WordPattern>> = Lazy::new(|| {
    let easy = |syllables: usize, stress: &'static [u8]| WordPattern {
        syllables,
        stress,
        difficulty: WordDifficulty::Easy,
    };
    let hard = |syllables: usize, stress: &'static [u8]| WordPattern {
        syllables,
        stress,
        difficulty: WordDifficulty::Hard,
    };
    BTreeMap::from([
        ("hello", easy(2, &[1, 0])),
        ("water", easy(2, &[1, 0])),
        ("communication", hard(5, &[0, 0, 1, 0, 0])),
        ("pronunciation", hard(5, &[0, 0, 1, 0, 0])),
    ])
});

pub fn word_patterns() -> &'static BTreeMap<&'static str, WordPattern> {
    &WORD_PATTERNS
}

/// Unlisted words count as medium difficulty.
pub fn word_difficulty(word: &str) -> WordDifficulty {
    WORD_PATTERNS
        .get(word.trim().to_lowercase().as_str())
        .map(|pattern| pattern.difficulty)
        .unwrap_or(WordDifficulty::Medium)
}

/// Unclamped accuracy, clarity and fluency of one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScores {
    pub accuracy: f64,
    pub clarity: f64,
    pub fluency: f64,
}

impl RawScores {
    fn draw(jitter: &mut Jitter, bases: [(f64, std::ops::RangeInclusive<i32>); 3]) -> Self {
        let [accuracy, clarity, fluency] =
            bases.map(|(base, range)| base + jitter.offset(range) as f64);
        Self {
            accuracy,
            clarity,
            fluency,
        }
    }

    /// Mean of the unclamped scores, truncated.
    pub fn overall(&self) -> f64 {
        ((self.accuracy + self.clarity + self.fluency) / 3.0).trunc()
    }
}

pub fn score_word(summary: &FeatureSummary, word: &str, jitter: &mut Jitter) -> RawScores {
    let mut scores = RawScores::draw(
        jitter,
        [(75.0, -10..=20), (70.0, -8..=25), (72.0, -12..=23)],
    );
    match word_difficulty(word) {
        WordDifficulty::Easy => scores.accuracy += 5.0,
        WordDifficulty::Hard => scores.accuracy -= 8.0,
        WordDifficulty::Medium => {}
    }
    if summary.syllable_rate > 6.0 {
        scores.fluency -= 10.0;
    } else if summary.syllable_rate < 1.0 {
        scores.fluency -= 5.0;
    }
    scores
}

pub fn word_feedback(scores: &RawScores, word: &str) -> Vec<String> {
    let mut lines = Vec::new();
    if scores.accuracy >= 85.0 {
        lines.push(format!("Excellent pronunciation of '{word}'!"));
    } else if scores.accuracy >= 70.0 {
        lines.push(format!("Good job with '{word}'. Minor improvements needed."));
    } else {
        lines.push(format!("'{word}' needs more practice. Break it into syllables."));
    }
    if scores.fluency < 70.0 {
        lines.push("Try to speak at a more natural pace.".to_string());
    }
    if scores.clarity < 70.0 {
        lines.push("Focus on clearer articulation of each syllable.".to_string());
    }
    lines
}

pub fn word_count(sentence: &str) -> usize {
    sentence.split_whitespace().count()
}

pub fn score_sentence(summary: &FeatureSummary, sentence: &str, jitter: &mut Jitter) -> RawScores {
    let words = word_count(sentence) as f64;
    let mut scores = RawScores::draw(
        jitter,
        [(72.0, -12..=23), (68.0, -10..=27), (70.0, -15..=25)],
    );
    if words > 8.0 {
        scores.accuracy -= 5.0;
        scores.fluency -= 3.0;
    }
    let pauses = summary.pause_count as f64;
    if pauses > words * 0.3 {
        scores.fluency -= 10.0;
    } else if pauses < words * 0.1 {
        scores.fluency += 5.0;
    }
    scores
}

pub fn sentence_feedback(scores: &RawScores, syllable_rate: f64) -> Vec<String> {
    let mut lines = Vec::new();
    if scores.fluency >= 80.0 {
        lines.push("Great sentence fluency and rhythm!".to_string());
    } else if scores.fluency >= 65.0 {
        lines.push("Good sentence flow. Work on natural pausing.".to_string());
    } else {
        lines.push("Practice reading sentences smoothly without too many pauses.".to_string());
    }
    if syllable_rate > 5.0 {
        lines.push("Try speaking a bit slower for better clarity.".to_string());
    } else if syllable_rate < 1.5 {
        lines.push("You can speak a little faster while maintaining clarity.".to_string());
    }
    if scores.accuracy < 75.0 {
        lines.push("Focus on pronouncing each word clearly within the sentence.".to_string());
    }
    lines
}

pub fn score_conversation(summary: &FeatureSummary, jitter: &mut Jitter) -> RawScores {
    let mut scores = RawScores::draw(
        jitter,
        [(70.0, -15..=25), (68.0, -12..=27), (75.0, -10..=20)],
    );
    if (2.0..=4.0).contains(&summary.syllable_rate) {
        scores.fluency += 10.0;
    }
    if summary.pitch.pitch_std > 20.0 {
        scores.fluency += 5.0;
    }
    scores
}

pub fn conversation_feedback(scores: &RawScores) -> Vec<String> {
    let mut lines = Vec::new();
    if scores.fluency >= 80.0 {
        lines.push("Natural conversational flow! Well done.".to_string());
    } else {
        lines.push("Work on making your speech sound more conversational and natural.".to_string());
    }
    if scores.clarity >= 80.0 {
        lines.push("Clear and easy to understand.".to_string());
    } else {
        lines.push("Focus on speaking clearly in conversational settings.".to_string());
    }
    lines.push("Practice expressing emotions and emphasis in your speech.".to_string());
    lines
}
