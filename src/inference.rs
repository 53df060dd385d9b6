//! Inference run: score audio files against a saved model.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use ndarray::Axis;
use tracing::{debug, warn};

use crate::error::{display_chain, ClassifyError, ModelLoadError};
use crate::features::{FeatureConfig, FeatureExtractor, FeatureSource};
use crate::labels::{argmax, LabelSet};
use crate::model::{ModelArtifact, Network};

/// One score per declared genre, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreScores {
    pub scores: Vec<(String, f32)>,
}

impl GenreScores {
    pub fn best(&self) -> Option<(&str, f32)> {
        argmax(self.scores.iter().map(|(_, score)| *score))
            .map(|i| (self.scores[i].0.as_str(), self.scores[i].1))
    }

    pub fn total(&self) -> f32 {
        self.scores.iter().map(|(_, score)| score).sum()
    }
}

impl Display for GenreScores {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (label, score)) in self.scores.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{label}: {score:.2}")?;
        }
        Ok(())
    }
}

/// Result for one input file; a failure here never affects the other files.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<GenreScores, ClassifyError>,
}

impl Display for FileOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(scores) => write!(f, "\n{}:\n{}", self.path.display(), scores),
            Err(err) => write!(
                f,
                "Error in analysing {}: {}",
                self.path.display(),
                display_chain(err)
            ),
        }
    }
}

pub struct Predictor {
    network: Network,
    labels: LabelSet,
    extractor: FeatureExtractor,
}

impl Predictor {
    /// Load `model_path` and check it against the declared genres and the
    /// configured feature length.
    ///
    /// Extraction then uses the feature settings stored with the model.
    pub fn load(model_path: &Path, features: &FeatureConfig) -> Result<Self, ModelLoadError> {
        let ModelArtifact { meta, network } = ModelArtifact::load(model_path)?;

        let declared = LabelSet::declared();
        if meta.label_set.names() != declared.names() {
            return Err(ModelLoadError::LabelMismatch {
                path: model_path.to_path_buf(),
                expected: declared.labels,
                found: meta.label_set.labels,
            });
        }
        if network.input_dim() != features.vector_len {
            return Err(ModelLoadError::InputMismatch {
                path: model_path.to_path_buf(),
                expected: features.vector_len,
                found: network.input_dim(),
            });
        }

        Ok(Self {
            network,
            labels: meta.label_set,
            extractor: FeatureExtractor::new(meta.features),
        })
    }

    pub fn classify_file(&self, path: &Path) -> Result<GenreScores, ClassifyError> {
        let vector = self.extractor.extract(path)?;
        let input = vector.into_values().insert_axis(Axis(0));
        let probabilities = self
            .network
            .predict(&input)
            .map_err(|source| ClassifyError::Network {
                path: path.to_path_buf(),
                source,
            })?;
        let scores = self
            .labels
            .names()
            .iter()
            .cloned()
            .zip(probabilities.row(0).iter().copied())
            .collect();
        Ok(GenreScores { scores })
    }

    /// Classify every path in order, isolating failures per file.
    pub fn classify<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<FileOutcome> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let result = self.classify_file(path);
                match &result {
                    Ok(scores) => {
                        debug!(path = %path.display(), best = ?scores.best(), "classified")
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "classification failed")
                    }
                }
                FileOutcome {
                    path: path.to_path_buf(),
                    result,
                }
            })
            .collect()
    }
}
