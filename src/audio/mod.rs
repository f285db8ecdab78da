pub mod decoder;
pub mod encoder;
pub mod envelope;
pub mod pause_detector;
pub mod resample;
pub mod upload;

pub use decoder::{decode_file, decode_file_at};
pub use upload::{AudioPayload, Upload, UploadDecoder};
