pub mod feedback;
pub mod features;
pub mod report;
pub mod scoring;
pub mod summary;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::AnalysisSettings;
use crate::types::{AudioSample, FrameConfig};

pub use feedback::{feedback, Feedback};
pub use features::{FrameFeatureExtractor, FrameFeatureSeries};
pub use report::{
    AnalysisBlock, ExerciseDetail, ExerciseScores, MetricScores, ScoreSet, SpeechReport,
};
pub use scoring::{ExerciseMode, Jitter};
pub use summary::{FeatureSummary, Summarizer};

/// Convenient alias for results returned by analysis entry points.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Lightweight error type for the analysis pipeline.
#[derive(Debug, Clone)]
pub struct AnalysisError {
    message: Arc<str>,
}

impl AnalysisError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Arc::from(message.into()),
        }
    }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for AnalysisError {}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

/// Why a single measurement could not be taken.
///
/// Scorers never surface these to callers; each one substitutes its own
/// documented default instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The signal was too short to form a single analysis frame.
    EmptySeries,
    /// Every analysis frame carried zero energy.
    SilentSignal,
    /// No frame passed the voicing gate of the pitch tracker.
    NoVoicedFrames,
    /// Fewer than two frames, so no frame-to-frame change exists.
    NoTransitions,
    /// Peak picking accepted no peak.
    NoPeaks,
    /// A computation produced NaN or infinity.
    NonFinite(&'static str),
    /// The input was shaped in a way the measurement cannot handle.
    Degenerate(&'static str),
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::EmptySeries => write!(f, "signal shorter than one analysis frame"),
            Reason::SilentSignal => write!(f, "signal carries no energy"),
            Reason::NoVoicedFrames => write!(f, "no voiced frames"),
            Reason::NoTransitions => write!(f, "no frame transitions"),
            Reason::NoPeaks => write!(f, "no peaks found"),
            Reason::NonFinite(what) => write!(f, "non-finite value in {what}"),
            Reason::Degenerate(what) => write!(f, "degenerate input for {what}"),
        }
    }
}

impl Error for Reason {}

/// Outcome of one measurement.
pub type Measured<T> = std::result::Result<T, Reason>;

/// Reject NaN/infinite intermediate values.
pub(crate) fn finite(value: f64, what: &'static str) -> Measured<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Reason::NonFinite(what))
    }
}

/// Extract per-frame features (pure, deterministic).
pub fn extract_features(sample: &AudioSample, config: FrameConfig) -> FrameFeatureSeries {
    FrameFeatureExtractor::new(config).extract(sample)
}

/// Reduce a frame series (and the raw sample) to scalar summaries.
pub fn summarize(series: &FrameFeatureSeries, sample: &AudioSample) -> FeatureSummary {
    Summarizer::new().summarize(series, sample)
}

/// Score a summary under an exercise mode.
pub fn score(summary: &FeatureSummary, mode: &ExerciseMode, jitter: &mut Jitter) -> ScoreSet {
    scoring::score(summary, mode, jitter)
}

/// Primary orchestration entry point for speech analysis.
#[derive(Debug, Clone)]
pub struct SpeechAnalyzer {
    extractor: FrameFeatureExtractor,
    summarizer: Summarizer,
}

impl SpeechAnalyzer {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            extractor: FrameFeatureExtractor::new(settings.frame_config()),
            summarizer: Summarizer::new(),
        }
    }

    /// Validate `settings` before building the analyzer.
    pub fn try_new(settings: &AnalysisSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(settings))
    }

    pub fn frame_config(&self) -> FrameConfig {
        self.extractor.config()
    }

    /// One extraction pass shared by every scorer.
    pub fn summarize(&self, sample: &AudioSample) -> FeatureSummary {
        let series = self.extractor.extract(sample);
        debug!(
            frames = series.len(),
            duration_s = sample.duration(),
            "frame features extracted"
        );
        self.summarizer.summarize(&series, sample)
    }

    /// General speech analysis: every metric plus suggestions and issues.
    pub fn analyze(&self, sample: &AudioSample) -> SpeechReport {
        let summary = self.summarize(sample);
        let report = SpeechReport::new(&summary, scoring::metric_scores(&summary));
        info!(
            pronunciation = report.scores.pronunciation,
            fluency = report.scores.fluency,
            clarity = report.scores.clarity,
            issues = report.detected_issues.len(),
            "speech analysis complete"
        );
        report
    }

    /// Analyze raw PCM. Empty buffers and a zero rate are input errors.
    pub fn analyze_pcm(&self, samples: Vec<f32>, sample_rate: u32) -> Result<SpeechReport> {
        let sample = AudioSample::new(samples, sample_rate)?;
        Ok(self.analyze(&sample))
    }

    /// Exercise analysis. Unsupported exercise types never touch the audio.
    pub fn analyze_exercise(
        &self,
        sample: &AudioSample,
        mode: &ExerciseMode,
        jitter: &mut Jitter,
    ) -> ScoreSet {
        if let ExerciseMode::Unsupported { exercise_type } = mode {
            info!(%exercise_type, "unsupported exercise type; using fallback analysis");
            return scoring::fallback(exercise_type, jitter);
        }
        let summary = self.summarize(sample);
        let scores = scoring::score(&summary, mode, jitter);
        info!(
            mode = mode.name(),
            overall = scores.exercise.as_ref().map(|e| e.overall),
            "exercise analysis complete"
        );
        scores
    }
}

impl Default for SpeechAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_framing_is_an_analysis_error() {
        let settings = AnalysisSettings {
            frame_length: 256,
            hop_length: 512,
            ..AnalysisSettings::default()
        };
        let err = SpeechAnalyzer::try_new(&settings).unwrap_err();
        assert!(err.to_string().contains("hop_length"));
    }

    #[test]
    fn empty_pcm_is_rejected_but_short_pcm_scores() {
        let analyzer = SpeechAnalyzer::default();
        assert!(analyzer.analyze_pcm(Vec::new(), 22_050).is_err());
        assert!(analyzer.analyze_pcm(vec![0.2; 10], 0).is_err());
        let report = analyzer.analyze_pcm(vec![0.2; 10], 22_050).unwrap();
        assert!(report.success);
        assert_eq!(report.scores.speech_rate, scoring::metrics::SPEECH_RATE_DEFAULT);
    }
}
