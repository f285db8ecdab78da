pub mod formants;
pub mod mel;
pub mod pitch;
pub mod rhythm;
pub(crate) mod spectral;

use ndarray::Array1;
use tracing::trace;

use crate::audio::envelope;
use crate::types::{AudioSample, FrameConfig};

use spectral::{SpectrumAnalyzer, ROLLOFF_FRACTION};

pub use formants::{compare_formants, estimate_formants, FormantEstimate};
pub use pitch::{PitchEstimate, PitchFrame, PitchTrack};

/// Feature names accepted by [`FrameFeatureSeries::get`].
pub const RMS_ENERGY: &str = "rms_energy";
pub const SPECTRAL_CENTROID: &str = "spectral_centroid";
pub const SPECTRAL_ROLLOFF: &str = "spectral_rolloff";
pub const ZERO_CROSSING_RATE: &str = "zero_crossing_rate";

/// Per-frame feature sequences of equal length, one entry per analysis frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatureSeries {
    pub config: FrameConfig,
    pub sample_rate: u32,
    pub rms_energy: Array1<f64>,
    pub spectral_centroid: Array1<f64>,
    pub spectral_rolloff: Array1<f64>,
    pub zero_crossing_rate: Array1<f64>,
}

impl FrameFeatureSeries {
    fn empty(config: FrameConfig, sample_rate: u32) -> Self {
        Self {
            config,
            sample_rate,
            rms_energy: Array1::zeros(0),
            spectral_centroid: Array1::zeros(0),
            spectral_rolloff: Array1::zeros(0),
            zero_crossing_rate: Array1::zeros(0),
        }
    }

    /// Number of analysis frames.
    pub fn len(&self) -> usize {
        self.rms_energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rms_energy.is_empty()
    }

    /// True when no frame carries any energy.
    pub fn is_silent(&self) -> bool {
        self.rms_energy.iter().all(|&value| value == 0.0)
    }

    /// Look a sequence up by feature name.
    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        match name {
            RMS_ENERGY => Some(&self.rms_energy),
            SPECTRAL_CENTROID => Some(&self.spectral_centroid),
            SPECTRAL_ROLLOFF => Some(&self.spectral_rolloff),
            ZERO_CROSSING_RATE => Some(&self.zero_crossing_rate),
            _ => None,
        }
    }
}

/// Slices audio into overlapping frames and computes per-frame features.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameFeatureExtractor {
    config: FrameConfig,
}

impl FrameFeatureExtractor {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> FrameConfig {
        self.config
    }

    pub fn extract(&self, sample: &AudioSample) -> FrameFeatureSeries {
        let frame_count = self.config.frame_count(sample.len());
        if frame_count == 0 {
            trace!(
                samples = sample.len(),
                frame_length = self.config.frame_length,
                "signal shorter than one frame; feature series is empty"
            );
            return FrameFeatureSeries::empty(self.config, sample.sample_rate());
        }

        let mut spectrum = SpectrumAnalyzer::new(self.config.frame_length, sample.sample_rate());
        let mut rms_energy = Vec::with_capacity(frame_count);
        let mut centroid = Vec::with_capacity(frame_count);
        let mut rolloff = Vec::with_capacity(frame_count);
        let mut zcr = Vec::with_capacity(frame_count);

        for frame in self.config.frames(sample.samples()) {
            rms_energy.push(envelope::frame_rms(frame));
            zcr.push(spectral::zero_crossing_rate(frame));
            let magnitudes = spectrum.magnitudes(frame);
            centroid.push(spectral::spectral_centroid(
                &magnitudes,
                spectrum.frequencies(),
            ));
            rolloff.push(spectral::spectral_rolloff(
                &magnitudes,
                spectrum.frequencies(),
                ROLLOFF_FRACTION,
            ));
        }

        FrameFeatureSeries {
            config: self.config,
            sample_rate: sample.sample_rate(),
            rms_energy: Array1::from(rms_energy),
            spectral_centroid: Array1::from(centroid),
            spectral_rolloff: Array1::from(rolloff),
            zero_crossing_rate: Array1::from(zcr),
        }
    }
}
