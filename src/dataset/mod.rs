pub mod scan;
pub mod split;

use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{DatasetError, ExtractError};
use crate::features::{FeatureSource, FeatureVector};
use crate::labels::LabelSet;

pub const DEFAULT_EXTENSION: &str = "wav";

/// Row-aligned feature and one-hot label matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f32>,
    labels: Array2<f32>,
    label_set: LabelSet,
}

impl Dataset {
    pub fn new(
        features: Array2<f32>,
        labels: Array2<f32>,
        label_set: LabelSet,
    ) -> Result<Self, DatasetError> {
        if features.nrows() != labels.nrows() {
            return Err(DatasetError::RowMismatch {
                features: features.nrows(),
                labels: labels.nrows(),
            });
        }
        if labels.ncols() != label_set.len() {
            return Err(DatasetError::LabelWidth {
                width: labels.ncols(),
                labels: label_set.len(),
            });
        }
        if let Some(row) = labels.rows().into_iter().position(|r| !is_one_hot(r)) {
            return Err(DatasetError::NotOneHot { row });
        }
        Ok(Self {
            features,
            labels,
            label_set,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn feature_len(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }

    pub fn labels(&self) -> &Array2<f32> {
        &self.labels
    }

    pub fn label_set(&self) -> &LabelSet {
        &self.label_set
    }

    /// Rows picked by `indices`, in that order, from both matrices at once.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
            label_set: self.label_set.clone(),
        }
    }
}

fn is_one_hot(row: ArrayView1<f32>) -> bool {
    let ones = row.iter().filter(|&&v| v == 1.0).count();
    let zeros = row.iter().filter(|&&v| v == 0.0).count();
    ones == 1 && ones + zeros == row.len()
}

/// A file left out of the dataset, with the reason.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub genre: String,
    pub error: ExtractError,
}

/// Outcome of a build beyond the dataset itself.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Files per genre that produced a row, in genre order.
    pub processed: Vec<(String, usize)>,
    pub skipped: Vec<SkippedFile>,
}

impl BuildReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn processed_count(&self) -> usize {
        self.processed.iter().map(|(_, count)| count).sum()
    }
}

/// Walks `<root>/<genre>/*.<extension>` and turns every file into a dataset row.
pub struct DatasetBuilder<S> {
    root: PathBuf,
    genres: Vec<String>,
    extension: String,
    source: S,
}

impl<S: FeatureSource + Sync> DatasetBuilder<S> {
    pub fn new(root: impl Into<PathBuf>, genres: Vec<String>, source: S) -> Self {
        Self {
            root: root.into(),
            genres,
            extension: DEFAULT_EXTENSION.to_string(),
            source,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Extract every file, skipping those that fail, and encode the labels.
    ///
    /// Rows are ordered by genre (as given) then by file path. A vector of the
    /// wrong length aborts the build instead of being stacked.
    pub fn build(&self) -> Result<(Dataset, BuildReport), DatasetError> {
        let expected = self.source.vector_len();
        let mut report = BuildReport::default();
        let mut rows: Vec<FeatureVector> = Vec::new();
        let mut row_labels: Vec<String> = Vec::new();

        for genre in &self.genres {
            let dir = self.root.join(genre);
            if !dir.is_dir() {
                return Err(DatasetError::MissingGenre {
                    genre: genre.clone(),
                    path: dir,
                });
            }
            let files = scan::audio_files(&dir, &self.extension)?;
            println!("Processing {} songs in {} genre...", files.len(), genre);
            info!(genre = %genre, files = files.len(), "processing genre");

            // `collect` keeps input order, whatever order extraction finishes in.
            let extracted: Vec<_> = files
                .par_iter()
                .map(|path| (path, self.source.extract(path)))
                .collect();

            let mut processed = 0;
            for (path, result) in extracted {
                match result {
                    Ok(vector) => {
                        if vector.len() != expected {
                            return Err(DatasetError::DimensionMismatch {
                                path: path.clone(),
                                expected,
                                actual: vector.len(),
                            });
                        }
                        rows.push(vector);
                        row_labels.push(genre.clone());
                        processed += 1;
                    }
                    Err(error) => {
                        warn!(path = %path.display(), error = %error, "skipping file");
                        report.skipped.push(SkippedFile {
                            path: path.clone(),
                            genre: genre.clone(),
                            error,
                        });
                    }
                }
            }
            report.processed.push((genre.clone(), processed));
        }

        if rows.is_empty() {
            return Err(DatasetError::Empty {
                root: self.root.clone(),
            });
        }

        let features = stack_rows(&rows, expected)?;
        let label_set = LabelSet::fit(&row_labels);
        let labels = label_set.one_hot(&row_labels)?;

        info!(
            rows = features.nrows(),
            columns = features.ncols(),
            labels = label_set.len(),
            skipped = report.skipped_count(),
            "dataset assembled"
        );
        Ok((Dataset::new(features, labels, label_set)?, report))
    }
}

fn stack_rows(rows: &[FeatureVector], width: usize) -> Result<Array2<f32>, DatasetError> {
    let mut flat = Vec::with_capacity(rows.len() * width);
    for row in rows {
        flat.extend(row.values().iter().copied());
    }
    Ok(Array2::from_shape_vec((rows.len(), width), flat)?)
}
