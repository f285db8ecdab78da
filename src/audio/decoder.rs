use std::fs::File;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::resample;
use crate::types::AudioSample;

/// Decode a wav/mp3/m4a/ogg file to mono f32 at its native sample rate.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<AudioSample> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("failed to probe audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("no decodable audio track in file")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("audio track does not declare a sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("failed to create decoder")?;

    let mut mono = Vec::new();
    let mut buffer: Option<SampleBuffer<f32>> = None;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err).context("failed to read packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!(reason, "skipping undecodable packet");
                continue;
            }
            Err(err) => return Err(err).context("failed to decode audio packet"),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let interleaved = buffer.get_or_insert_with(|| {
            SampleBuffer::new(decoded.capacity() as u64, spec)
        });
        if interleaved.capacity() < decoded.capacity() * channels {
            *interleaved = SampleBuffer::new(decoded.capacity() as u64, spec);
        }
        interleaved.copy_interleaved_ref(decoded);
        mono.extend(downmix(interleaved.samples(), channels));
    }

    debug!(
        path = %path.display(),
        sample_rate,
        samples = mono.len(),
        "decoded audio file"
    );
    AudioSample::new(mono, sample_rate)
        .with_context(|| format!("audio file {} decoded to no samples", path.display()))
}

/// Decode a file and resample it to `target_rate`.
pub fn decode_file_at<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<AudioSample> {
    let native = decode_file(path)?;
    resample_sample(&native, target_rate)
}

pub fn resample_sample(sample: &AudioSample, target_rate: u32) -> Result<AudioSample> {
    ensure!(target_rate > 0, "target sample rate must be positive");
    if sample.sample_rate() == target_rate {
        return Ok(sample.clone());
    }
    let resampled = resample::linear_resample(sample.samples(), sample.sample_rate(), target_rate)
        .with_context(|| {
            format!(
                "failed to resample audio from {} Hz to {} Hz",
                sample.sample_rate(),
                target_rate
            )
        })?;
    AudioSample::new(resampled, target_rate)
}

/// Average interleaved frames down to one channel.
fn downmix(interleaved: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    interleaved
        .chunks_exact(channels)
        .map(move |frame| frame.iter().sum::<f32>() / channels as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encoder;
    use approx::assert_abs_diff_eq;

    #[test]
    fn downmix_averages_channels() {
        let mixed: Vec<f32> = downmix(&[0.5, -0.5, 1.0, 0.0], 2).collect();
        assert_eq!(mixed, vec![0.0, 0.5]);
    }

    #[test]
    fn decodes_written_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let sample = AudioSample::new(vec![0.25_f32; 4_410], 44_100).unwrap();
        encoder::write_wav(&sample, &path).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate(), 44_100);
        assert_eq!(decoded.len(), 4_410);
        assert_abs_diff_eq!(decoded.samples()[100], 0.25, epsilon = 1e-3);

        let canonical = decode_file_at(&path, 22_050).unwrap();
        assert_eq!(canonical.sample_rate(), 22_050);
        assert_eq!(canonical.len(), 2_205);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(decode_file("/definitely/not/here.wav").is_err());
    }
}
