//! Inbound audio boundary: payload bytes to a canonical-rate [`AudioSample`].

use std::io::Write;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use super::decoder;
use crate::config::{AnalysisSettings, UploadSettings};
use crate::types::AudioSample;

/// Container assumed when a filename carries no recognized extension.
pub const DEFAULT_EXTENSION: &str = "wav";

/// Audio as received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioPayload {
    Base64(String),
    Bytes(Vec<u8>),
}

/// One inbound upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub payload: AudioPayload,
    pub filename: Option<String>,
}

impl Upload {
    pub fn base64(encoded: impl Into<String>) -> Self {
        Self {
            payload: AudioPayload::Base64(encoded.into()),
            filename: None,
        }
    }

    pub fn bytes(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            payload: AudioPayload::Bytes(bytes),
            filename: Some(filename.into()),
        }
    }
}

/// Decodes uploads within the configured limits.
#[derive(Debug, Clone)]
pub struct UploadDecoder {
    limits: UploadSettings,
    sample_rate: u32,
}

impl UploadDecoder {
    pub fn new(limits: UploadSettings, analysis: &AnalysisSettings) -> Self {
        Self {
            limits,
            sample_rate: analysis.sample_rate,
        }
    }

    /// Container extension for `filename`, or [`DEFAULT_EXTENSION`].
    pub fn extension_for(&self, filename: Option<&str>) -> String {
        filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .filter(|ext| self.limits.allowed_extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// Raw container bytes of an upload, size-checked.
    pub fn payload_bytes(&self, payload: &AudioPayload) -> Result<Vec<u8>> {
        let bytes = match payload {
            AudioPayload::Base64(encoded) => STANDARD
                .decode(encoded.trim())
                .context("audio payload is not valid base64")?,
            AudioPayload::Bytes(bytes) => bytes.clone(),
        };
        if bytes.is_empty() {
            bail!("audio payload is empty");
        }
        ensure!(
            bytes.len() <= self.limits.max_upload_bytes,
            "audio payload of {} bytes exceeds the {} byte limit",
            bytes.len(),
            self.limits.max_upload_bytes
        );
        Ok(bytes)
    }

    /// Write the payload to a scoped temp file, decode it, and resample.
    ///
    /// The temp file is removed when this returns, on success or error.
    pub fn decode(&self, upload: &Upload) -> Result<AudioSample> {
        let bytes = self.payload_bytes(&upload.payload)?;
        let extension = self.extension_for(upload.filename.as_deref());
        let suffix = format!(".{extension}");
        let mut scratch = tempfile::Builder::new()
            .prefix("speechcoach-upload-")
            .suffix(&suffix)
            .tempfile()
            .context("failed to create temp file for upload")?;
        scratch
            .write_all(&bytes)
            .context("failed to write upload to temp file")?;
        scratch.flush().context("failed to flush upload temp file")?;
        debug!(
            bytes = bytes.len(),
            extension = %extension,
            "decoding uploaded audio"
        );
        decoder::decode_file_at(scratch.path(), self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encoder;

    fn decoder_with_limit(max_upload_bytes: usize) -> UploadDecoder {
        UploadDecoder::new(
            UploadSettings {
                max_upload_bytes,
                ..UploadSettings::default()
            },
            &AnalysisSettings::default(),
        )
    }

    #[test]
    fn unknown_extensions_fall_back_to_wav() {
        let decoder = decoder_with_limit(1024);
        assert_eq!(decoder.extension_for(Some("take.MP3")), "mp3");
        assert_eq!(decoder.extension_for(Some("take.flac")), "wav");
        assert_eq!(decoder.extension_for(Some("take")), "wav");
        assert_eq!(decoder.extension_for(None), "wav");
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let decoder = decoder_with_limit(4);
        assert!(decoder
            .payload_bytes(&AudioPayload::Bytes(vec![0; 5]))
            .is_err());
        assert!(decoder
            .payload_bytes(&AudioPayload::Base64("!!!".into()))
            .is_err());
    }

    #[test]
    fn base64_wav_decodes_at_canonical_rate() {
        let tone = encoder::sine_tone(440.0, 0.25, 0.5, 44_100).unwrap();
        let encoded = STANDARD.encode(encoder::wav_bytes(&tone).unwrap());
        let sample = decoder_with_limit(1 << 20)
            .decode(&Upload::base64(encoded))
            .unwrap();
        assert_eq!(sample.sample_rate(), 22_050);
        assert!((sample.duration() - 0.25).abs() < 0.01);
    }
}
