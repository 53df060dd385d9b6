use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser};

use crate::config::AppConfig;

/// Options shared by both binaries.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Optional JSON config file; missing fields keep their defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Model weights to write (train) or read (classify); metadata sits beside them.
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,
}

impl CommonArgs {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        Ok(config)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "train",
    about = "Extract MFCC features from a genre-labelled audio tree and train the classifier"
)]
pub struct TrainCli {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Directory holding one sub-directory of audio files per genre.
    #[arg(long = "dataset-root", value_name = "DIR")]
    pub dataset_root: Option<PathBuf>,
    /// Seed for the train/test shuffle and weight initialisation.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainCli {
    pub fn app_config(&self) -> Result<AppConfig> {
        let mut config = self.common.load_config()?;
        if let Some(root) = &self.dataset_root {
            config.dataset_root = root.clone();
        }
        if let Some(seed) = self.seed {
            config.split.seed = Some(seed);
            config.training.seed = Some(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Parser, Debug)]
#[command(name = "classify", about = "Score audio files against a trained genre model")]
pub struct ClassifyCli {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Audio files to classify.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

impl ClassifyCli {
    pub fn app_config(&self) -> Result<AppConfig> {
        let config = self.common.load_config()?;
        config.validate()?;
        Ok(config)
    }
}
