//! Reduction of frame features (and the raw sample) to scalar summaries.

pub mod statistics;

use tracing::trace;

use crate::audio::pause_detector;
use crate::types::AudioSample;

use super::features::{self, mel, rhythm, FormantEstimate, FrameFeatureSeries, PitchEstimate, PitchTrack};
use super::{finite, Measured, Reason};

use statistics::PeakPicking;

/// Pitch frames must reach this normalized autocorrelation to count as voiced.
const VOICING_THRESHOLD: f64 = 0.1;
/// Frames louder than this fraction of mean RMS belong to a speech segment.
const SEGMENT_FRACTION: f64 = 0.5;

/// Spread of the spectral shape across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralSpread {
    pub centroid_std: f64,
    pub rolloff_std: f64,
}

/// Level statistics of the RMS envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyStats {
    pub mean: f64,
    pub std: f64,
    pub variance: f64,
}

/// Frame-to-frame movement of the spectral centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidChanges {
    /// Rises larger than half the spread of all changes.
    pub marked_rises: usize,
    /// Changes whose size stays below 0.3 of the spread of all changes.
    pub smooth: usize,
    pub transitions: usize,
}

/// Scalar aggregates consumed by every scorer.
///
/// Measurements that could not be taken carry the [`Reason`]; scorers turn
/// those into their documented defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSummary {
    pub duration: f64,
    pub sample_rate: u32,
    pub frame_count: usize,
    /// Sum of squared samples.
    pub total_energy: f64,
    /// RMS over the whole signal.
    pub average_volume: f64,
    pub max_volume: f64,
    pub volume_range: f64,
    pub spectral_spread: Measured<SpectralSpread>,
    pub mean_rolloff: Measured<f64>,
    pub energy: Measured<EnergyStats>,
    pub centroid_changes: Measured<CentroidChanges>,
    pub mfcc_spread: Measured<f64>,
    pub voiced_pitch_std: Measured<f64>,
    pub energy_peaks: Measured<usize>,
    pub snr_db: Measured<f64>,
    pub speech_segments: usize,
    pub pitch: PitchEstimate,
    pub formants: FormantEstimate,
    pub syllable_rate: f64,
    pub pause_count: usize,
}

impl Default for FeatureSummary {
    /// Summary of a signal too short to analyze.
    fn default() -> Self {
        Self {
            duration: 0.0,
            sample_rate: 0,
            frame_count: 0,
            total_energy: 0.0,
            average_volume: 0.0,
            max_volume: 0.0,
            volume_range: 0.0,
            spectral_spread: Err(Reason::EmptySeries),
            mean_rolloff: Err(Reason::EmptySeries),
            energy: Err(Reason::EmptySeries),
            centroid_changes: Err(Reason::EmptySeries),
            mfcc_spread: Err(Reason::EmptySeries),
            voiced_pitch_std: Err(Reason::NoVoicedFrames),
            energy_peaks: Err(Reason::EmptySeries),
            snr_db: Err(Reason::EmptySeries),
            speech_segments: 1,
            pitch: PitchEstimate::default(),
            formants: [0.0; 3],
            syllable_rate: 0.0,
            pause_count: 0,
        }
    }
}

/// Builds a [`FeatureSummary`] from one extraction pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Summarizer {
    peaks: PeakPicking,
}

impl Summarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summarize(&self, series: &FrameFeatureSeries, sample: &AudioSample) -> FeatureSummary {
        let rms = series.rms_energy.as_slice().unwrap_or(&[]);
        let centroid = series.spectral_centroid.as_slice().unwrap_or(&[]);
        let rolloff = series.spectral_rolloff.as_slice().unwrap_or(&[]);
        let silent = !series.is_empty() && series.is_silent();

        let pitch_track = PitchTrack::track(sample);
        let (max_volume, min_volume) = amplitude_bounds(sample.samples());
        let total_energy: f64 = sample.samples().iter().map(|&s| (s as f64).powi(2)).sum();

        let summary = FeatureSummary {
            duration: sample.duration(),
            sample_rate: sample.sample_rate(),
            frame_count: series.len(),
            total_energy,
            average_volume: (total_energy / sample.len() as f64).sqrt(),
            max_volume,
            volume_range: max_volume - min_volume,
            spectral_spread: gate(silent).and_then(|_| spectral_spread(centroid, rolloff)),
            mean_rolloff: statistics::mean(rolloff),
            energy: energy_stats(rms),
            centroid_changes: gate(silent).and_then(|_| centroid_changes(centroid)),
            mfcc_spread: gate(silent).and_then(|_| {
                mel::mfcc(sample, series.config).and_then(|m| mel::mean_coefficient_spread(&m))
            }),
            voiced_pitch_std: voiced_pitch_std(&pitch_track),
            energy_peaks: self.energy_peaks(rms),
            snr_db: snr_db(sample.samples()),
            speech_segments: speech_segments(rms),
            pitch: pitch_track.estimate(),
            formants: features::estimate_formants(sample),
            syllable_rate: rhythm::syllable_rate(sample),
            pause_count: pause_detector::count_pauses(sample),
        };
        trace!(
            frames = summary.frame_count,
            silent,
            voiced_frames = pitch_track.frames.len(),
            "feature summary built"
        );
        summary
    }

    fn energy_peaks(&self, rms: &[f64]) -> Measured<usize> {
        if rms.is_empty() {
            return Err(Reason::EmptySeries);
        }
        Ok(self.peaks.pick(rms).len())
    }
}

fn gate(silent: bool) -> Measured<()> {
    if silent {
        Err(Reason::SilentSignal)
    } else {
        Ok(())
    }
}

fn amplitude_bounds(samples: &[f32]) -> (f64, f64) {
    samples.iter().fold((0.0_f64, f64::MAX), |(max, min), &s| {
        let magnitude = (s as f64).abs();
        (max.max(magnitude), min.min(magnitude))
    })
}

fn spectral_spread(centroid: &[f64], rolloff: &[f64]) -> Measured<SpectralSpread> {
    Ok(SpectralSpread {
        centroid_std: finite(statistics::std_dev(centroid)?, "centroid spread")?,
        rolloff_std: finite(statistics::std_dev(rolloff)?, "rolloff spread")?,
    })
}

fn energy_stats(rms: &[f64]) -> Measured<EnergyStats> {
    Ok(EnergyStats {
        mean: statistics::mean(rms)?,
        std: statistics::std_dev(rms)?,
        variance: statistics::variance(rms)?,
    })
}

fn centroid_changes(centroid: &[f64]) -> Measured<CentroidChanges> {
    if centroid.is_empty() {
        return Err(Reason::EmptySeries);
    }
    let deltas = statistics::deltas(centroid);
    if deltas.is_empty() {
        return Err(Reason::NoTransitions);
    }
    let spread = finite(statistics::std_dev(&deltas)?, "centroid deltas")?;
    Ok(CentroidChanges {
        marked_rises: statistics::count_above(&deltas, 0.5 * spread),
        smooth: deltas.iter().filter(|d| d.abs() < 0.3 * spread).count(),
        transitions: deltas.len(),
    })
}

fn voiced_pitch_std(track: &PitchTrack) -> Measured<f64> {
    let voiced = track.confident_pitches(VOICING_THRESHOLD);
    if voiced.is_empty() {
        return Err(Reason::NoVoicedFrames);
    }
    finite(statistics::std_dev(&voiced)?, "pitch spread")
}

/// Power over variance in dB; a zero variance counts as 100 dB.
fn snr_db(samples: &[f32]) -> Measured<f64> {
    let values: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let variance = statistics::variance(&values)?;
    if variance == 0.0 {
        return Ok(100.0);
    }
    let power = values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64;
    finite(10.0 * (power / variance).log10(), "snr")
}

fn speech_segments(rms: &[f64]) -> usize {
    let Ok(mean) = statistics::mean(rms) else {
        return 1;
    };
    statistics::count_above(rms, SEGMENT_FRACTION * mean).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::FrameFeatureExtractor;
    use crate::types::FrameConfig;
    use approx::assert_abs_diff_eq;

    fn summarize(samples: Vec<f32>) -> FeatureSummary {
        let sample = AudioSample::new(samples, 22_050).unwrap();
        let series = FrameFeatureExtractor::new(FrameConfig::default()).extract(&sample);
        Summarizer::new().summarize(&series, &sample)
    }

    #[test]
    fn silent_signal_gates_spectral_measurements() {
        let summary = summarize(vec![0.0; 22_050]);
        assert_eq!(summary.spectral_spread, Err(Reason::SilentSignal));
        assert_eq!(summary.centroid_changes, Err(Reason::SilentSignal));
        assert_eq!(summary.mfcc_spread, Err(Reason::SilentSignal));
        assert_eq!(summary.snr_db, Ok(100.0));
        assert_eq!(summary.energy.map(|e| e.mean), Ok(0.0));
        assert_eq!(summary.speech_segments, 1);
    }

    #[test]
    fn short_signal_has_no_series_measurements() {
        let summary = summarize(vec![0.3; 1_000]);
        assert_eq!(summary.frame_count, 0);
        assert_eq!(summary.energy, Err(Reason::EmptySeries));
        assert_eq!(summary.energy_peaks, Err(Reason::EmptySeries));
        assert!(summary.snr_db.is_ok());
    }

    #[test]
    fn volume_statistics_follow_amplitudes() {
        let summary = summarize(vec![0.5, -0.25, 0.1, -0.5]);
        assert_abs_diff_eq!(summary.max_volume, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.volume_range, 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(summary.total_energy, 0.5725, epsilon = 1e-6);
    }
}
