use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::network::{Network, Topology};
use crate::error::{ModelLoadError, ModelSaveError};
use crate::features::FeatureConfig;
use crate::labels::LabelSet;

pub const FORMAT_VERSION: u32 = 2;

/// Sidecar that sits next to the weights file.
pub fn meta_path(weights: &Path) -> PathBuf {
    weights.with_extension("meta.json")
}

/// Everything besides the weights that inference needs to reproduce
/// training-time behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub format_version: u32,
    pub label_set: LabelSet,
    pub features: FeatureConfig,
    pub topology: Topology,
}

/// A trained network plus its metadata.
///
/// The weights are stored as safetensors at the model path and the
/// metadata as JSON at [`meta_path`].
#[derive(Debug)]
pub struct ModelArtifact {
    pub meta: ModelMeta,
    pub network: Network,
}

impl ModelArtifact {
    pub fn new(network: Network, label_set: LabelSet, features: FeatureConfig) -> Self {
        Self {
            meta: ModelMeta {
                format_version: FORMAT_VERSION,
                label_set,
                features,
                topology: network.topology(),
            },
            network,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelSaveError> {
        self.network
            .save(path)
            .map_err(|source| ModelSaveError::Weights {
                path: path.to_path_buf(),
                source,
            })?;
        write_meta(&self.meta, &meta_path(path))?;
        info!(path = %path.display(), params = self.network.param_count(), "model saved");
        Ok(())
    }

    /// Read the metadata, check it is internally consistent, then load the
    /// weights into the topology it declares.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let sidecar = meta_path(path);
        for required in [path, sidecar.as_path()] {
            if !required.exists() {
                return Err(ModelLoadError::Missing {
                    path: required.to_path_buf(),
                });
            }
        }
        let meta = read_meta(&sidecar)?;

        if meta.format_version != FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedVersion {
                path: sidecar,
                found: meta.format_version,
                expected: FORMAT_VERSION,
            });
        }
        if meta.topology.output_dim != meta.label_set.len() {
            return Err(ModelLoadError::OutputMismatch {
                path: sidecar,
                outputs: meta.topology.output_dim,
                labels: meta.label_set.len(),
            });
        }
        if meta.topology.input_dim != meta.features.vector_len {
            return Err(ModelLoadError::InputMismatch {
                path: sidecar,
                expected: meta.features.vector_len,
                found: meta.topology.input_dim,
            });
        }

        let network =
            Network::load(meta.topology, path).map_err(|source| ModelLoadError::Weights {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            path = %path.display(),
            input_dim = meta.topology.input_dim,
            labels = meta.label_set.len(),
            "model loaded"
        );
        Ok(Self { meta, network })
    }
}

fn write_meta(meta: &ModelMeta, path: &Path) -> Result<(), ModelSaveError> {
    let write_err = |source: std::io::Error| ModelSaveError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, meta).map_err(|source| {
        ModelSaveError::Serialize {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(write_err)
}

fn read_meta(path: &Path) -> Result<ModelMeta, ModelLoadError> {
    let file = File::open(path).map_err(|source| ModelLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ModelLoadError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}
