use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::types::AudioSample;

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Write `audio` as a mono 16-bit WAV file.
pub fn write_wav<P: AsRef<Path>>(audio: &AudioSample, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, spec(audio.sample_rate()))
        .with_context(|| format!("failed to create WAV file: {}", path.display()))?;
    for &sample in audio.samples() {
        writer
            .write_sample(to_pcm16(sample))
            .context("failed to write audio sample")?;
    }
    writer.finalize().context("failed to finalize WAV file")
}

/// Encode `audio` as an in-memory mono 16-bit WAV file.
pub fn wav_bytes(audio: &AudioSample) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec(audio.sample_rate()))
            .context("failed to start WAV stream")?;
        for &sample in audio.samples() {
            writer
                .write_sample(to_pcm16(sample))
                .context("failed to write audio sample")?;
        }
        writer.finalize().context("failed to finalize WAV stream")?;
    }
    Ok(cursor.into_inner())
}

/// Sine tone used for calibration recordings and fixtures.
pub fn sine_tone(frequency: f32, seconds: f32, amplitude: f32, sample_rate: u32) -> Result<AudioSample> {
    let total = (seconds * sample_rate as f32).round() as usize;
    let samples: Vec<f32> = (0..total)
        .map(|n| {
            let t = n as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect();
    AudioSample::new(samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_wav_reads_back() {
        let tone = sine_tone(440.0, 0.1, 0.5, 22_050).unwrap();
        let bytes = wav_bytes(&tone).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len() as usize, tone.len());
    }

    #[test]
    fn clipping_saturates() {
        assert_eq!(to_pcm16(2.0), i16::MAX);
        assert_eq!(to_pcm16(-2.0), -i16::MAX);
    }
}
