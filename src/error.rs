//! Error taxonomy for the classification pipeline.
//!
//! Extraction failures are per file and recoverable by the caller. Dataset
//! shape, split, and model-load failures are structural and abort the run.

use std::path::{Path, PathBuf};

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open audio file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to probe audio format of {}", path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: SymphoniaError,
    },
    #[error("no audio tracks found in {}", path.display())]
    NoTrack { path: PathBuf },
    #[error("sample rate not specified in {}", path.display())]
    MissingSampleRate { path: PathBuf },
    #[error("failed to create decoder for {}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: SymphoniaError,
    },
    #[error("failed to read packet from {}", path.display())]
    Packet {
        path: PathBuf,
        #[source]
        source: SymphoniaError,
    },
    #[error("no audio samples decoded from {}", path.display())]
    Empty { path: PathBuf },
    #[error("cannot resample {} from {from} Hz to {to} Hz", path.display())]
    Resample { path: PathBuf, from: u32, to: u32 },
}

impl DecodeError {
    pub fn path(&self) -> &Path {
        match self {
            DecodeError::Open { path, .. }
            | DecodeError::Probe { path, .. }
            | DecodeError::NoTrack { path }
            | DecodeError::MissingSampleRate { path }
            | DecodeError::Codec { path, .. }
            | DecodeError::Packet { path, .. }
            | DecodeError::Empty { path }
            | DecodeError::Resample { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(
        "{} yields {actual} cepstral values, fewer than the required {expected}",
        path.display()
    )]
    TooShort {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("non-finite feature value computed for {}", path.display())]
    NonFinite { path: PathBuf },
}

impl ExtractError {
    pub fn path(&self) -> &Path {
        match self {
            ExtractError::Decode(err) => err.path(),
            ExtractError::TooShort { path, .. } | ExtractError::NonFinite { path } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to list audio files under {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("genre directory {} does not exist", path.display())]
    MissingGenre { genre: String, path: PathBuf },
    #[error(
        "feature vector for {} has {actual} values, expected {expected}",
        path.display()
    )]
    DimensionMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("no usable audio files found under {}", root.display())]
    Empty { root: PathBuf },
    #[error("feature matrix has {features} rows but label matrix has {labels}")]
    RowMismatch { features: usize, labels: usize },
    #[error("label matrix has {width} columns but {labels} label names")]
    LabelWidth { width: usize, labels: usize },
    #[error("label {0:?} is not part of the label set")]
    UnknownLabel(String),
    #[error("label row {row} is not one-hot")]
    NotOneHot { row: usize },
    #[error("failed to stack feature rows")]
    Shape(#[from] ndarray::ShapeError),
}

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("split fraction must lie strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),
    #[error("cannot split an empty dataset")]
    Empty,
    #[error("split produced {train} training rows and {test} test rows; both must be non-empty")]
    EmptyPartition { train: usize, test: usize },
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("input has {found} columns, network expects {expected}")]
    InputWidth { expected: usize, found: usize },
    #[error("target has {found} columns, network produces {expected}")]
    TargetWidth { expected: usize, found: usize },
    #[error("{inputs} input rows but {targets} target rows")]
    RowMismatch { inputs: usize, targets: usize },
    #[error("no rows to process")]
    EmptyBatch,
    #[error("batch size must be positive")]
    ZeroBatchSize,
    #[error("validation split must lie in [0, 1), got {0}")]
    InvalidValidationSplit(f64),
    #[error("tensor backend failed")]
    Backend(#[from] candle_core::Error),
    #[error("unexpected prediction shape")]
    Shape(#[from] ndarray::ShapeError),
}

/// Why one file in an inference batch has no scores.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("model rejected features of {}", path.display())]
    Network {
        path: PathBuf,
        #[source]
        source: NetworkError,
    },
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact {} does not exist", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read model artifact {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {} is corrupt", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "model artifact {} has format version {found}, expected {expected}",
        path.display()
    )]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error(
        "model artifact {} expects {found}-value feature vectors, extractor produces {expected}",
        path.display()
    )]
    InputMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    #[error(
        "model artifact {} outputs {outputs} scores for {labels} labels",
        path.display()
    )]
    OutputMismatch {
        path: PathBuf,
        outputs: usize,
        labels: usize,
    },
    #[error(
        "model artifact {} was trained with labels {found:?}, expected {expected:?}",
        path.display()
    )]
    LabelMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("weights in {} do not fit the declared topology", path.display())]
    Weights {
        path: PathBuf,
        #[source]
        source: candle_core::Error,
    },
}

#[derive(Debug, Error)]
pub enum ModelSaveError {
    #[error("failed to write model artifact {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize model artifact {}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write model weights {}", path.display())]
    Weights {
        path: PathBuf,
        #[source]
        source: candle_core::Error,
    },
}

/// `err` followed by each of its sources, joined with `": "`.
pub fn display_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
