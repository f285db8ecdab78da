use super::envelope::{self, ENVELOPE_FRAMES};
use crate::types::AudioSample;

/// Envelope frames below this fraction of the loudest frame are silent.
const SILENCE_FRACTION: f64 = 0.05;
/// Minimum pause length in seconds.
const MIN_PAUSE_SECONDS: f64 = 0.2;

/// Count pauses in the RMS envelope of `audio`.
///
/// A pause is a run of silent frames lasting at least 200 ms that is
/// followed by sound again; trailing silence is not a pause.
pub fn count_pauses(audio: &AudioSample) -> usize {
    let envelope = envelope::rms_envelope(audio);
    let min_frames = min_pause_frames(audio.sample_rate());
    count_silent_runs(&envelope, min_frames)
}

fn min_pause_frames(sample_rate: u32) -> usize {
    (MIN_PAUSE_SECONDS * sample_rate as f64 / ENVELOPE_FRAMES.hop_length as f64) as usize
}

fn count_silent_runs(envelope: &[f64], min_frames: usize) -> usize {
    let loudest = envelope.iter().copied().fold(0.0, f64::max);
    let threshold = SILENCE_FRACTION * loudest;

    let mut pauses = 0;
    let mut run = 0;
    for &energy in envelope {
        if energy < threshold {
            run += 1;
        } else {
            if run > 0 && run >= min_frames {
                pauses += 1;
            }
            run = 0;
        }
    }
    pauses
}
