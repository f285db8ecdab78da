use speechcoach::analysis::scoring::{self, exercise, phoneme};
use speechcoach::analysis::{ExerciseDetail, ExerciseMode, FeatureSummary, Jitter};

fn summary(duration: f64, syllable_rate: f64) -> FeatureSummary {
    FeatureSummary {
        duration,
        syllable_rate,
        ..FeatureSummary::default()
    }
}

#[test]
fn th_at_minimum_duration_gets_duration_bonus() {
    let set = scoring::score(
        &summary(0.1, 3.0),
        &ExerciseMode::parse("phoneme", "th"),
        &mut Jitter::none(),
    );
    let exercise = set.exercise.expect("phoneme result");
    let ExerciseDetail::Phoneme(detail) = &exercise.detail else {
        panic!("expected phoneme detail, got {:?}", exercise.detail);
    };
    let breakdown = detail.accuracy_breakdown;
    assert_eq!(breakdown.duration_ratio, Some(1.0));
    assert_eq!(breakdown.duration_adjustment, 5.0);
    assert_eq!(detail.target_phoneme, "th");
}

#[test]
fn th_far_too_short_is_penalized() {
    let model = phoneme::lookup("TH").expect("th is in the table");
    let breakdown = phoneme::accuracy(&summary(0.02, 3.0), Some(model), &mut Jitter::none());
    assert_eq!(breakdown.duration_adjustment, -10.0);
}

#[test]
fn fast_hello_loses_fluency() {
    let fast = exercise::score_word(&summary(1.0, 7.0), "hello", &mut Jitter::none());
    let steady = exercise::score_word(&summary(1.0, 3.0), "hello", &mut Jitter::none());
    assert_eq!(steady.fluency - fast.fluency, 10.0);
    // easy word bonus
    assert_eq!(fast.accuracy, 80.0);

    let set = scoring::score(
        &summary(1.0, 7.0),
        &ExerciseMode::parse("word", "hello"),
        &mut Jitter::none(),
    );
    let scores = set.exercise.as_ref().unwrap();
    assert_eq!(scores.fluency, 62);
    assert_eq!(scores.overall, 70);
    assert_eq!(
        set.suggested_improvements,
        vec![
            "Good job with 'hello'. Minor improvements needed.".to_string(),
            "Try to speak at a more natural pace.".to_string(),
        ]
    );
    assert_eq!(set.detected_issues, vec!["Speech fluency could be enhanced"]);
}

#[test]
fn sentence_detail_counts_words_and_pauses() {
    let mut input = summary(4.0, 3.5);
    input.pause_count = 2;
    let set = scoring::score(
        &input,
        &ExerciseMode::parse("sentence", "  The cat sat on the mat "),
        &mut Jitter::none(),
    );
    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json["exerciseType"], "sentence");
    assert_eq!(json["wordCount"], 6);
    assert_eq!(json["pauseCount"], 2);
    assert_eq!(json["usedFallback"], false);
    assert!(json.get("pronunciationScore").is_none());
}

#[test]
fn unknown_exercise_routes_to_flagged_fallback() {
    let set = scoring::score(
        &FeatureSummary::default(),
        &ExerciseMode::parse("karaoke", ""),
        &mut Jitter::seeded(5),
    );
    assert!(set.used_fallback);
    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json["exerciseType"], "fallback");
    assert_eq!(json["requestedType"], "karaoke");
    let overall = json["overallScore"].as_u64().unwrap();
    assert!((55..=90).contains(&overall));
}

#[test]
fn seeded_jitter_reproduces_exercise_scores() {
    let input = summary(0.3, 4.0);
    let mode = ExerciseMode::parse("conversation", "at the doctor");
    let a = scoring::score(&input, &mode, &mut Jitter::seeded(99));
    let b = scoring::score(&input, &mode, &mut Jitter::seeded(99));
    assert_eq!(a, b);
}

#[test]
fn phoneme_tip_follows_accuracy_bar() {
    let low = phoneme::feedback(60.0, 90.0, "r");
    assert!(low.iter().any(|line| line.starts_with("For 'r'")));
    let high = phoneme::feedback(90.0, 90.0, "r");
    assert_eq!(high.len(), 1);
    let unknown = phoneme::feedback(60.0, 60.0, "zh");
    assert_eq!(unknown.len(), 2);
}
