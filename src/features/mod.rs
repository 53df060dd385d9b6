pub mod mfcc;
pub mod vector;

use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audio::{decoder, resample};
use crate::error::{DecodeError, ExtractError};
use crate::types::AudioData;

pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;
pub const DEFAULT_VECTOR_LEN: usize = 25_000;

/// What to do with a clip whose flattened MFCCs are shorter than `vector_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortClipPolicy {
    /// Zero-pad up to the fixed length.
    #[default]
    Pad,
    /// Fail with [`ExtractError::TooShort`].
    Reject,
}

/// Parameters that must be identical between training and inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub sample_rate: u32,
    pub vector_len: usize,
    pub short_clip_policy: ShortClipPolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            vector_len: DEFAULT_VECTOR_LEN,
            short_clip_policy: ShortClipPolicy::Pad,
        }
    }
}

/// Fixed-length, max-abs normalized MFCC vector for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Array1<f32>,
    source_len: usize,
}

impl FeatureVector {
    pub fn new(values: Vec<f32>, source_len: usize) -> Self {
        Self {
            values: Array1::from_vec(values),
            source_len,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of cepstral values before truncation or padding.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn is_padded(&self) -> bool {
        self.source_len < self.values.len()
    }

    pub fn values(&self) -> &Array1<f32> {
        &self.values
    }

    pub fn into_values(self) -> Array1<f32> {
        self.values
    }
}

/// Anything that turns an audio file into a feature vector.
pub trait FeatureSource {
    /// Length of every vector this source produces.
    fn vector_len(&self) -> usize;

    fn extract(&self, path: &Path) -> Result<FeatureVector, ExtractError>;
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Build the feature vector for an already decoded waveform.
    ///
    /// `path` is only used for diagnostics.
    pub fn extract_audio(
        &self,
        path: &Path,
        audio: AudioData,
    ) -> Result<FeatureVector, ExtractError> {
        let source_rate = audio.sample_rate;
        let audio = resample::to_sample_rate(audio, self.config.sample_rate).ok_or_else(|| {
            DecodeError::Resample {
                path: path.to_path_buf(),
                from: source_rate,
                to: self.config.sample_rate,
            }
        })?;
        if audio.is_empty() {
            return Err(DecodeError::Empty {
                path: path.to_path_buf(),
            }
            .into());
        }

        let matrix = mfcc::mfcc_matrix(&audio.samples, audio.sample_rate);
        let flat = vector::normalized_flat(&matrix);
        let source_len = flat.len();

        let expected = self.config.vector_len;
        if source_len < expected {
            match self.config.short_clip_policy {
                ShortClipPolicy::Reject => {
                    return Err(ExtractError::TooShort {
                        path: path.to_path_buf(),
                        expected,
                        actual: source_len,
                    })
                }
                ShortClipPolicy::Pad => warn!(
                    path = %path.display(),
                    source_len,
                    expected,
                    "short clip padded with zeros"
                ),
            }
        }

        let values = vector::fit_to_length(flat, expected);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ExtractError::NonFinite {
                path: path.to_path_buf(),
            });
        }

        debug!(
            path = %path.display(),
            coefficients = matrix.nrows(),
            frames = matrix.ncols(),
            "extracted features"
        );
        Ok(FeatureVector::new(values, source_len))
    }
}

impl FeatureSource for FeatureExtractor {
    fn vector_len(&self) -> usize {
        self.config.vector_len
    }

    fn extract(&self, path: &Path) -> Result<FeatureVector, ExtractError> {
        let audio = decoder::decode_audio(path)?;
        self.extract_audio(path, audio)
    }
}
