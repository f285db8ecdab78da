//! Learner progress: points, streaks, achievements and weekly goals.
//!
//! Storage is injected through [`ProgressStore`]; the analysis pipeline never
//! touches it.

mod store;

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::scoring::Score;
use crate::analysis::summary::statistics;

pub use store::{InMemoryProgressStore, JsonFileProgressStore};

pub const DEFAULT_POINTS: u32 = 10;
/// Minutes credited when an exercise does not report its duration.
pub const DEFAULT_MINUTES: f64 = 5.0;
pub const DEFAULT_WEEKLY_GOAL: f64 = 30.0;
/// Number of latest scores the difficulty recommendation looks at.
pub const RECENT_SCORES: usize = 5;
/// Scores averaged at each end of the history when measuring a trend.
const TREND_WINDOW: usize = 3;

/// Persistence of progress records, keyed by user id.
pub trait ProgressStore {
    fn get(&self, user_id: &str) -> Result<Option<ProgressRecord>>;
    fn put(&self, user_id: &str, record: ProgressRecord) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Achievement {
    #[serde(rename = "First Steps")]
    FirstSteps,
    #[serde(rename = "Week Champion")]
    WeekChampion,
    #[serde(rename = "Dedicated Learner")]
    DedicatedLearner,
    #[serde(rename = "Sound Master")]
    SoundMaster,
}

impl Achievement {
    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "First Steps",
            Achievement::WeekChampion => "Week Champion",
            Achievement::DedicatedLearner => "Dedicated Learner",
            Achievement::SoundMaster => "Sound Master",
        }
    }

    fn earned(self, record: &ProgressRecord) -> bool {
        match self {
            Achievement::FirstSteps => record.exercises_completed >= 1,
            Achievement::WeekChampion => record.streak_days >= 7,
            Achievement::DedicatedLearner => record.exercises_completed >= 50,
            Achievement::SoundMaster => record.average_score >= 85.0,
        }
    }
}

const ACHIEVEMENTS: [Achievement; 4] = [
    Achievement::FirstSteps,
    Achievement::WeekChampion,
    Achievement::DedicatedLearner,
    Achievement::SoundMaster,
];

/// One finished exercise as reported by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedExercise {
    #[serde(rename = "type")]
    pub exercise_type: String,
    pub score: f64,
    /// Minutes spent.
    pub duration: f64,
    pub points: u32,
}

impl CompletedExercise {
    pub fn new(exercise_type: impl Into<String>, score: f64) -> Self {
        Self {
            exercise_type: exercise_type.into(),
            score,
            duration: DEFAULT_MINUTES,
            points: DEFAULT_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub exercise: CompletedExercise,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub minutes: f64,
    pub exercises: u32,
    /// Best score of the day.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub total_points: u32,
    pub exercises_completed: u32,
    pub streak_days: u32,
    pub average_score: f64,
    /// Minutes per day counted as 100% of the goal.
    pub weekly_goal: f64,
    pub daily_progress: BTreeMap<NaiveDate, DailyProgress>,
    pub exercise_history: Vec<HistoryEntry>,
    pub achievements: Vec<Achievement>,
    pub last_exercise_date: Option<NaiveDate>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            total_points: 0,
            exercises_completed: 0,
            streak_days: 0,
            average_score: 0.0,
            weekly_goal: DEFAULT_WEEKLY_GOAL,
            daily_progress: BTreeMap::new(),
            exercise_history: Vec::new(),
            achievements: Vec::new(),
            last_exercise_date: None,
        }
    }
}

impl ProgressRecord {
    /// Fold one completed exercise into the record on `today`.
    ///
    /// The average covers the history before this exercise; the very first
    /// exercise sets it to its own score.
    pub fn record(&mut self, exercise: CompletedExercise, today: NaiveDate) -> Vec<Achievement> {
        self.total_points += exercise.points;
        self.exercises_completed += 1;

        self.average_score = if self.exercise_history.is_empty() {
            exercise.score
        } else {
            let total: f64 = self.exercise_history.iter().map(|e| e.exercise.score).sum();
            (total / self.exercise_history.len() as f64 * 10.0).round() / 10.0
        };

        let daily = self.daily_progress.entry(today).or_default();
        daily.minutes += exercise.duration;
        daily.exercises += 1;
        daily.score = daily.score.max(exercise.score);

        self.streak_days = match self.last_exercise_date {
            None => 1,
            Some(last) => match (today - last).num_days() {
                1 => self.streak_days + 1,
                gap if gap > 1 => 1,
                _ => self.streak_days,
            },
        };
        self.last_exercise_date = Some(today);

        self.exercise_history.push(HistoryEntry {
            date: today,
            exercise,
        });
        self.award_achievements()
    }

    /// Exercise scores in the order they were recorded.
    pub fn scores(&self) -> Vec<f64> {
        self.exercise_history.iter().map(|e| e.exercise.score).collect()
    }

    /// Difficulty from the last [`RECENT_SCORES`] exercises.
    pub fn difficulty_recommendation(&self) -> DifficultyLevel {
        let scores = self.scores();
        let start = scores.len().saturating_sub(RECENT_SCORES);
        recommend_difficulty(&scores[start..])
    }

    pub fn improvement_trend(&self) -> ImprovementTrend {
        improvement_trend(&self.scores())
    }

    fn award_achievements(&mut self) -> Vec<Achievement> {
        let new: Vec<Achievement> = ACHIEVEMENTS
            .into_iter()
            .filter(|a| !self.achievements.contains(a) && a.earned(self))
            .collect();
        self.achievements.extend(new.iter().copied());
        new
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyDay {
    pub date: NaiveDate,
    pub minutes: f64,
    pub exercises: u32,
    pub score: f64,
    pub percentage: f64,
}

/// The seven days ending on `today`, most recent first.
pub fn weekly_progress(record: &ProgressRecord, today: NaiveDate) -> Vec<WeeklyDay> {
    (0..7u64)
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| match record.daily_progress.get(&date) {
            Some(daily) => WeeklyDay {
                date,
                minutes: daily.minutes,
                exercises: daily.exercises,
                score: daily.score,
                percentage: goal_percentage(daily.minutes, record.weekly_goal),
            },
            None => WeeklyDay {
                date,
                minutes: 0.0,
                exercises: 0,
                score: 0.0,
                percentage: 0.0,
            },
        })
        .collect()
}

fn goal_percentage(minutes: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 100.0;
    }
    (minutes / goal * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Difficulty for the next exercises from the mean of `recent_scores`.
///
/// Without any scores the learner starts at intermediate.
pub fn recommend_difficulty(recent_scores: &[f64]) -> DifficultyLevel {
    match statistics::mean(recent_scores) {
        Err(_) => DifficultyLevel::Intermediate,
        Ok(avg) if avg >= 85.0 => DifficultyLevel::Advanced,
        Ok(avg) if avg >= 65.0 => DifficultyLevel::Intermediate,
        Ok(_) => DifficultyLevel::Beginner,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementTrend {
    pub trend: TrendDirection,
    /// Mean of the last scores minus mean of the first scores.
    pub improvement_rate: f64,
    /// Truncated mean of the last scores; absent without enough data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Score>,
}

/// Compares the mean of the last three scores with the mean of the first
/// three. The windows overlap when the history is shorter than six.
pub fn improvement_trend(history: &[f64]) -> ImprovementTrend {
    if history.len() < 2 {
        return ImprovementTrend {
            trend: TrendDirection::InsufficientData,
            improvement_rate: 0.0,
            confidence: None,
        };
    }
    let window = TREND_WINDOW.min(history.len());
    let recent = statistics::mean(&history[history.len() - window..]).unwrap_or(0.0);
    let earlier = statistics::mean(&history[..window]).unwrap_or(0.0);
    let improvement = recent - earlier;
    let trend = if improvement > 5.0 {
        TrendDirection::Improving
    } else if improvement > -2.0 {
        TrendDirection::Stable
    } else {
        TrendDirection::Declining
    };
    ImprovementTrend {
        trend,
        improvement_rate: improvement,
        confidence: Some(recent.trunc().clamp(0.0, 100.0) as Score),
    }
}

/// Applies completed exercises to records held in a [`ProgressStore`].
pub struct ProgressTracker<S> {
    store: S,
}

impl<S: ProgressStore> ProgressTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn record_exercise(
        &self,
        user_id: &str,
        exercise: CompletedExercise,
        today: NaiveDate,
    ) -> Result<ProgressRecord> {
        let mut record = self.store.get(user_id)?.unwrap_or_default();
        let awarded = record.record(exercise, today);
        for achievement in &awarded {
            info!(user_id, achievement = achievement.title(), "achievement unlocked");
        }
        self.store.put(user_id, record.clone())?;
        Ok(record)
    }

    pub fn progress(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        self.store.get(user_id)
    }

    /// Difficulty for a user's next exercises; intermediate for an unknown user.
    pub fn difficulty_recommendation(&self, user_id: &str) -> Result<DifficultyLevel> {
        Ok(self
            .store
            .get(user_id)?
            .map_or(DifficultyLevel::Intermediate, |record| {
                record.difficulty_recommendation()
            }))
    }

    pub fn improvement_trend(&self, user_id: &str) -> Result<ImprovementTrend> {
        let scores = self
            .store
            .get(user_id)?
            .map(|record| record.scores())
            .unwrap_or_default();
        Ok(improvement_trend(&scores))
    }
}
