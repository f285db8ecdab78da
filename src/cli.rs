use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::analysis::scoring::{self, exercise, phoneme};
use crate::analysis::{ExerciseMode, Jitter, SpeechAnalyzer};
use crate::audio::encoder;
use crate::audio::{Upload, UploadDecoder};
use crate::config::AppConfig;
use crate::progress::{self, CompletedExercise, JsonFileProgressStore, ProgressTracker};

#[derive(Parser, Debug)]
#[command(
    name = "speechcoach",
    version,
    about = "Heuristic speech scoring and practice tracking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a recording and print the JSON result.
    Analyze(AnalyzeArgs),
    /// Print a fallback analysis without any audio.
    Mock(MockArgs),
    /// List the phoneme reference table and practice words.
    Phonemes,
    /// Write a calibration sine tone as WAV.
    Tone(ToneArgs),
    /// Record or inspect learner progress.
    #[command(subcommand)]
    Progress(ProgressCommand),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Recording to analyze (wav, mp3, m4a or ogg).
    #[arg(value_name = "AUDIO")]
    pub audio: PathBuf,
    /// Exercise type (phoneme, word, sentence, conversation); general analysis when absent.
    #[arg(long = "exercise-type")]
    pub exercise_type: Option<String>,
    /// Target phoneme, word, sentence or conversation context.
    #[arg(long, default_value = "")]
    pub target: String,
    /// Seed for the exercise score jitter.
    #[arg(long)]
    pub seed: Option<u64>,
    #[command(flatten)]
    pub analysis: AnalysisOverrides,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisOverrides {
    /// JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long = "frame-length")]
    pub frame_length: Option<usize>,
    #[arg(long = "hop-length")]
    pub hop_length: Option<usize>,
}

impl AnalysisOverrides {
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = AppConfig::from_override(self.config.clone())?;
        if let Some(frame_length) = self.frame_length {
            config.analysis.frame_length = frame_length;
        }
        if let Some(hop_length) = self.hop_length {
            config.analysis.hop_length = hop_length;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct MockArgs {
    #[arg(long = "exercise-type", default_value = "phoneme")]
    pub exercise_type: String,
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ToneArgs {
    #[arg(value_name = "OUT")]
    pub output: PathBuf,
    #[arg(long, default_value_t = 440.0)]
    pub frequency: f32,
    #[arg(long, default_value_t = 2.0)]
    pub seconds: f32,
    #[arg(long, default_value_t = 0.5)]
    pub amplitude: f32,
    #[arg(long = "sample-rate", default_value_t = crate::types::CANONICAL_SAMPLE_RATE)]
    pub sample_rate: u32,
}

#[derive(Subcommand, Debug)]
pub enum ProgressCommand {
    /// Add one completed exercise to a learner's record.
    Record(RecordArgs),
    /// Show a learner's record, the last seven days, difficulty and trend.
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Progress JSON file.
    #[arg(long)]
    pub store: PathBuf,
    #[arg(long, default_value = "default_user")]
    pub user: String,
    /// Day to record against (YYYY-MM-DD); today when absent.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl StoreArgs {
    fn today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    #[arg(long = "exercise-type", default_value = "speech")]
    pub exercise_type: String,
    #[arg(long)]
    pub score: f64,
    /// Minutes spent.
    #[arg(long, default_value_t = progress::DEFAULT_MINUTES)]
    pub minutes: f64,
    #[arg(long, default_value_t = progress::DEFAULT_POINTS)]
    pub points: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

fn jitter(seed: Option<u64>) -> Jitter {
    match seed {
        Some(seed) => Jitter::seeded(seed),
        None => Jitter::from_entropy(),
    }
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialize output")?;
    writeln!(out).context("failed to write output")
}

impl Cli {
    pub fn run<W: Write>(self, out: &mut W) -> Result<()> {
        match self.command {
            Command::Analyze(args) => analyze(args, out),
            Command::Mock(args) => {
                let scores = scoring::fallback(&args.exercise_type, &mut jitter(args.seed));
                print_json(out, &scores)
            }
            Command::Phonemes => print_json(
                out,
                &serde_json::json!({
                    "phonemes": phoneme::models(),
                    "words": exercise::word_patterns(),
                }),
            ),
            Command::Tone(args) => {
                let tone = encoder::sine_tone(
                    args.frequency,
                    args.seconds,
                    args.amplitude,
                    args.sample_rate,
                )?;
                encoder::write_wav(&tone, &args.output)?;
                info!(path = %args.output.display(), "tone written");
                Ok(())
            }
            Command::Progress(ProgressCommand::Record(args)) => {
                let tracker = ProgressTracker::new(JsonFileProgressStore::new(&args.store.store));
                let exercise = CompletedExercise {
                    exercise_type: args.exercise_type.clone(),
                    score: args.score,
                    duration: args.minutes,
                    points: args.points,
                };
                let record =
                    tracker.record_exercise(&args.store.user, exercise, args.store.today())?;
                print_json(out, &record)
            }
            Command::Progress(ProgressCommand::Show(args)) => {
                let tracker = ProgressTracker::new(JsonFileProgressStore::new(&args.store.store));
                let record = tracker
                    .progress(&args.store.user)?
                    .with_context(|| format!("no progress recorded for {}", args.store.user))?;
                let weekly = progress::weekly_progress(&record, args.store.today());
                print_json(
                    out,
                    &serde_json::json!({
                        "progress": record,
                        "weeklyProgress": weekly,
                        "difficultyRecommendation": record.difficulty_recommendation(),
                        "improvementTrend": record.improvement_trend(),
                    }),
                )
            }
        }
    }
}

fn analyze<W: Write>(args: AnalyzeArgs, out: &mut W) -> Result<()> {
    let config = args.analysis.load()?;
    let bytes = fs::read(&args.audio)
        .with_context(|| format!("failed to read audio file {}", args.audio.display()))?;
    let filename = args.audio.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let sample = UploadDecoder::new(config.upload.clone(), &config.analysis)
        .decode(&Upload::bytes(bytes, filename))?;

    let analyzer = SpeechAnalyzer::try_new(&config.analysis)?;
    match &args.exercise_type {
        None => print_json(out, &analyzer.analyze(&sample)),
        Some(exercise_type) => {
            let mode = ExerciseMode::parse(exercise_type, &args.target);
            let scores = analyzer.analyze_exercise(&sample, &mode, &mut jitter(args.seed));
            print_json(out, &scores)
        }
    }
}
