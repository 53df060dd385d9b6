//! Genre labels and their one-hot encoding.
//!
//! Training derives the label order by sorting the unique labels it saw.
//! Inference never sees those labels, so the derived order travels inside the
//! model artifact as a [`LabelSet`] and is checked against [`GENRES`] on load.

use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// The declared genre ordering, alphabetical so it matches the derived one.
pub const GENRES: [&str; 10] = [
    "blues",
    "classical",
    "country",
    "disco",
    "hiphop",
    "jazz",
    "metal",
    "pop",
    "reggae",
    "rock",
];

pub const LABEL_SET_VERSION: u32 = 1;

pub fn declared_genres() -> Vec<String> {
    GENRES.iter().map(|g| g.to_string()).collect()
}

/// Ordered label names plus the version of the encoding scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    pub version: u32,
    pub labels: Vec<String>,
}

impl LabelSet {
    /// Sorted unique labels, the same order `numpy.unique` would produce.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        Self {
            version: LABEL_SET_VERSION,
            labels: unique.into_iter().collect(),
        }
    }

    /// The fixed label set inference scores against.
    pub fn declared() -> Self {
        Self {
            version: LABEL_SET_VERSION,
            labels: declared_genres(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    /// One-hot rows for `labels`, failing on the first label missing from the set.
    pub fn one_hot<S: AsRef<str>>(&self, labels: &[S]) -> Result<Array2<f32>, DatasetError> {
        let mut encoded = Array2::zeros((labels.len(), self.len()));
        for (row, label) in labels.iter().enumerate() {
            let label = label.as_ref();
            let column = self
                .index_of(label)
                .ok_or_else(|| DatasetError::UnknownLabel(label.to_string()))?;
            encoded[[row, column]] = 1.0;
        }
        Ok(encoded)
    }
}

/// Index of the largest value; the first one wins a tie.
pub fn argmax(values: impl Iterator<Item = f32>) -> Option<usize> {
    values
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, v)| match best {
            Some((_, top)) if v <= top => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
