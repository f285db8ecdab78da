use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::{Array2, Axis};

use crate::analysis::{Measured, Reason};
use crate::types::{AudioSample, FrameConfig};

pub(crate) const MFCC_COUNT: usize = 13;
pub(crate) const MEL_BANDS: usize = 128;
const MIN_FREQ: f64 = 0.0;

/// MFCC matrix, one row per frame and `MFCC_COUNT` columns.
pub fn mfcc(sample: &AudioSample, config: FrameConfig) -> Measured<Array2<f64>> {
    if sample.len() < config.frame_length {
        return Err(Reason::EmptySeries);
    }
    let audio: Vec<f64> = sample.samples().iter().map(|&s| s as f64).collect();
    let sample_rate = sample.sample_rate();

    let stft = spectrum::rstft(
        &audio,
        config.frame_length,
        config.hop_length,
        WindowType::Hanning,
    );
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(config.frame_length, sample_rate);
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        sample_rate as f64 / 2.0,
        MEL_BANDS,
        &freqs,
        true,
    );
    let mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    let coefficients = analysis::mel::mfcc_spectrogram(&mel, MFCC_COUNT, None);

    let frames = coefficients.len();
    if frames == 0 {
        return Err(Reason::EmptySeries);
    }
    let flat: Vec<f64> = coefficients
        .iter()
        .flat_map(|row| row.iter().copied().chain(std::iter::repeat(0.0)).take(MFCC_COUNT))
        .collect();
    if flat.iter().any(|value| !value.is_finite()) {
        return Err(Reason::NonFinite("mfcc"));
    }
    Array2::from_shape_vec((frames, MFCC_COUNT), flat).map_err(|_| Reason::Degenerate("mfcc"))
}

/// Mean over coefficients of each coefficient's standard deviation across frames.
pub fn mean_coefficient_spread(mfcc: &Array2<f64>) -> Measured<f64> {
    if mfcc.is_empty() {
        return Err(Reason::EmptySeries);
    }
    let spread = mfcc
        .std_axis(Axis(0), 0.0)
        .mean()
        .ok_or(Reason::EmptySeries)?;
    crate::analysis::finite(spread, "mfcc spread")
}
