use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::split::SplitConfig;
use crate::dataset::DEFAULT_EXTENSION;
use crate::features::FeatureConfig;
use crate::labels::declared_genres;
use crate::model::FitOptions;

pub const DEFAULT_DATASET_ROOT: &str = "data/genres_original";
pub const DEFAULT_MODEL_PATH: &str = "model.safetensors";

/// Network shape and fitting schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub hidden_units: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub learning_rate: f32,
    /// Seeds weight initialisation and per-epoch shuffling.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let fit = FitOptions::default();
        Self {
            hidden_units: 100,
            epochs: fit.epochs,
            batch_size: fit.batch_size,
            validation_split: fit.validation_split,
            learning_rate: fit.learning_rate,
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            validation_split: self.validation_split,
            learning_rate: self.learning_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset_root: PathBuf,
    pub model_path: PathBuf,
    pub audio_extension: String,
    pub genres: Vec<String>,
    pub features: FeatureConfig,
    pub split: SplitConfig,
    pub training: TrainingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from(DEFAULT_DATASET_ROOT),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            audio_extension: DEFAULT_EXTENSION.to_string(),
            genres: declared_genres(),
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid with a JSON file when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {:?}", path))?;
                parse_config(&raw).with_context(|| format!("invalid config file {:?}", path))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.genres.is_empty(), "at least one genre must be configured");
        let mut seen = HashSet::new();
        for genre in &self.genres {
            ensure!(seen.insert(genre), "genre {:?} is listed twice", genre);
        }
        ensure!(
            self.features.vector_len > 0,
            "feature vector length must be positive"
        );
        ensure!(
            self.features.sample_rate > 0,
            "feature sample rate must be positive"
        );
        let fraction = self.split.train_fraction;
        ensure!(
            fraction > 0.0 && fraction < 1.0,
            "train fraction must lie strictly between 0 and 1, got {}",
            fraction
        );
        let training = &self.training;
        ensure!(training.hidden_units > 0, "hidden units must be positive");
        ensure!(training.epochs > 0, "epoch count must be positive");
        ensure!(training.batch_size > 0, "batch size must be positive");
        ensure!(
            (0.0..1.0).contains(&training.validation_split),
            "validation split must lie in [0, 1), got {}",
            training.validation_split
        );
        ensure!(
            training.learning_rate > 0.0,
            "learning rate must be positive"
        );
        Ok(())
    }
}

fn parse_config(raw: &str) -> Result<AppConfig> {
    let config: AppConfig = serde_json::from_str(raw).context("failed to parse config JSON")?;
    Ok(config)
}
