use anyhow::Result;
use chrono::{Days, NaiveDate};
use speechcoach::progress::{
    improvement_trend, recommend_difficulty, weekly_progress, Achievement, CompletedExercise,
    DifficultyLevel, InMemoryProgressStore, ProgressStore, ProgressTracker, TrendDirection,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn fifty_exercises_earn_dedicated_learner_once() -> Result<()> {
    let tracker = ProgressTracker::new(InMemoryProgressStore::new());
    for n in 0..60u64 {
        let day = start() + Days::new(n / 5);
        tracker.record_exercise("lee", CompletedExercise::new("phoneme", 72.0), day)?;
    }
    let record = tracker.progress("lee")?.expect("record stored");
    assert_eq!(record.exercises_completed, 60);
    assert_eq!(record.total_points, 600);
    assert_eq!(record.streak_days, 12);
    let dedicated = record
        .achievements
        .iter()
        .filter(|&&a| a == Achievement::DedicatedLearner)
        .count();
    assert_eq!(dedicated, 1);
    assert!(!record.achievements.contains(&Achievement::SoundMaster));
    Ok(())
}

#[test]
fn daily_bucket_keeps_best_score_and_sums_minutes() -> Result<()> {
    let tracker = ProgressTracker::new(InMemoryProgressStore::new());
    for score in [55.0, 91.0, 64.0] {
        tracker.record_exercise("lee", CompletedExercise::new("word", score), start())?;
    }
    let record = tracker.store().get("lee")?.unwrap();
    let today = &record.daily_progress[&start()];
    assert_eq!(today.exercises, 3);
    assert_eq!(today.minutes, 15.0);
    assert_eq!(today.score, 91.0);

    let week = weekly_progress(&record, start() + Days::new(1));
    assert_eq!(week[0].exercises, 0);
    assert_eq!(week[1].percentage, 50.0);
    Ok(())
}

#[test]
fn history_serializes_with_type_field() -> Result<()> {
    let tracker = ProgressTracker::new(InMemoryProgressStore::new());
    let record = tracker.record_exercise("lee", CompletedExercise::new("sentence", 80.0), start())?;
    let json = serde_json::to_value(&record)?;
    assert_eq!(json["exerciseHistory"][0]["type"], "sentence");
    assert_eq!(json["exerciseHistory"][0]["date"], "2024-01-01");
    assert_eq!(json["achievements"][0], "First Steps");
    Ok(())
}

#[test]
fn difficulty_thresholds_are_inclusive() {
    assert_eq!(recommend_difficulty(&[]), DifficultyLevel::Intermediate);
    assert_eq!(recommend_difficulty(&[85.0]), DifficultyLevel::Advanced);
    assert_eq!(recommend_difficulty(&[80.0, 90.0]), DifficultyLevel::Advanced);
    assert_eq!(recommend_difficulty(&[84.9]), DifficultyLevel::Intermediate);
    assert_eq!(recommend_difficulty(&[65.0]), DifficultyLevel::Intermediate);
    assert_eq!(recommend_difficulty(&[64.9]), DifficultyLevel::Beginner);
}

#[test]
fn trend_needs_two_scores() {
    for history in [&[][..], &[90.0][..]] {
        let trend = improvement_trend(history);
        assert_eq!(trend.trend, TrendDirection::InsufficientData);
        assert_eq!(trend.improvement_rate, 0.0);
        assert_eq!(trend.confidence, None);
    }
    let json = serde_json::to_value(improvement_trend(&[90.0])).unwrap();
    assert_eq!(json["trend"], "insufficient_data");
    assert!(json.get("confidence").is_none());
}

#[test]
fn trend_boundaries_are_exclusive() {
    // first and last three average 60 and 65
    let even = improvement_trend(&[60.0, 60.0, 60.0, 65.0, 65.0, 65.0]);
    assert_eq!(even.improvement_rate, 5.0);
    assert_eq!(even.trend, TrendDirection::Stable);

    let rising = improvement_trend(&[60.0, 60.0, 60.0, 65.0, 65.0, 65.5]);
    assert_eq!(rising.trend, TrendDirection::Improving);

    let dipping = improvement_trend(&[70.0, 70.0, 70.0, 68.0, 68.0, 68.0]);
    assert_eq!(dipping.improvement_rate, -2.0);
    assert_eq!(dipping.trend, TrendDirection::Declining);

    let slight = improvement_trend(&[70.0, 70.0, 70.0, 69.0, 68.0, 68.0]);
    assert_eq!(slight.trend, TrendDirection::Stable);
}

#[test]
fn short_history_windows_overlap() {
    let trend = improvement_trend(&[70.0, 80.0]);
    assert_eq!(trend.improvement_rate, 0.0);
    assert_eq!(trend.trend, TrendDirection::Stable);
    assert_eq!(trend.confidence, Some(75));
}

#[test]
fn trend_confidence_truncates_and_clamps() {
    assert_eq!(improvement_trend(&[50.0, 79.9]).confidence, Some(64));
    assert_eq!(improvement_trend(&[120.0, 130.0]).confidence, Some(100));
    assert_eq!(improvement_trend(&[-10.0, -20.0]).confidence, Some(0));
}

#[test]
fn tracker_reports_difficulty_and_trend() -> Result<()> {
    let tracker = ProgressTracker::new(InMemoryProgressStore::new());
    assert_eq!(tracker.difficulty_recommendation("lee")?, DifficultyLevel::Intermediate);
    assert_eq!(tracker.improvement_trend("lee")?.trend, TrendDirection::InsufficientData);

    for score in [40.0, 45.0, 50.0, 55.0, 60.0, 62.0] {
        tracker.record_exercise("lee", CompletedExercise::new("word", score), start())?;
    }
    assert_eq!(tracker.difficulty_recommendation("lee")?, DifficultyLevel::Beginner);
    let trend = tracker.improvement_trend("lee")?;
    assert_eq!(trend.trend, TrendDirection::Improving);
    assert_eq!(trend.confidence, Some(59));
    Ok(())
}
