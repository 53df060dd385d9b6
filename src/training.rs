//! Training run: build the dataset, split it, fit the network, save it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::dataset::split::Splitter;
use crate::dataset::{BuildReport, DatasetBuilder};
use crate::error::display_chain;
use crate::features::{FeatureExtractor, FeatureSource};
use crate::labels::LabelSet;
use crate::model::{
    EpochMetrics, History, Metrics, ModelArtifact, ModelSummary, Network, Topology,
};

#[derive(Debug)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub skipped: usize,
    pub history: History,
    pub test: Metrics,
    pub model_path: PathBuf,
    /// Whether the saved labels match the genres `classify` scores against.
    pub inference_ready: bool,
}

pub struct Trainer {
    config: AppConfig,
}

impl Trainer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Train on the configured dataset root with the real feature extractor.
    pub fn run(&self) -> Result<TrainingReport> {
        let extractor = FeatureExtractor::new(self.config.features.clone());
        let builder = DatasetBuilder::new(
            self.config.dataset_root.clone(),
            self.config.genres.clone(),
            extractor,
        )
        .with_extension(self.config.audio_extension.clone());
        self.run_with(&builder)
    }

    pub fn run_with<S: FeatureSource + Sync>(
        &self,
        builder: &DatasetBuilder<S>,
    ) -> Result<TrainingReport> {
        self.config.validate()?;
        if builder.source().vector_len() != self.config.features.vector_len {
            bail!(
                "feature source produces {}-value vectors but the config expects {}",
                builder.source().vector_len(),
                self.config.features.vector_len
            );
        }

        let (dataset, build_report) = builder
            .build()
            .with_context(|| format!("failed to build dataset from {:?}", builder.root()))?;
        print_skipped(&build_report);

        let expected_labels = LabelSet::fit(&self.config.genres);
        if dataset.label_set() != &expected_labels {
            bail!(
                "dataset produced labels {:?} but the configured genres are {:?}; \
                 every genre needs at least one usable file",
                dataset.label_set().names(),
                expected_labels.names()
            );
        }

        let split = Splitter::from_config(&self.config.split)?
            .split(&dataset)
            .context("failed to split dataset")?;
        split.ensure_non_empty()?;
        info!(
            train = split.train.len(),
            test = split.test.len(),
            "dataset split"
        );

        let training = &self.config.training;
        let mut rng = match training.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let topology = Topology {
            input_dim: dataset.feature_len(),
            hidden_units: training.hidden_units,
            output_dim: dataset.label_set().len(),
        };
        let mut network = Network::new(topology, &mut rng).context("failed to build network")?;
        println!("{}", ModelSummary::of(&topology));

        let history = network
            .fit(
                split.train.features(),
                split.train.labels(),
                &training.fit_options(),
                &mut rng,
                |epoch| print_epoch(epoch, training.epochs),
            )
            .context("training failed")?;

        let test = network
            .evaluate(split.test.features(), split.test.labels())
            .context("evaluation on the held-out partition failed")?;
        println!("Done!");
        println!("Loss: {:.4}, Accuracy: {:.4}", test.loss, test.accuracy);

        let artifact = ModelArtifact::new(
            network,
            dataset.label_set().clone(),
            self.config.features.clone(),
        );
        artifact.save(&self.config.model_path)?;
        println!("Model saved as '{}'", self.config.model_path.display());

        let inference_ready = dataset.label_set() == &LabelSet::declared();
        if !inference_ready {
            warn!(
                labels = ?dataset.label_set().names(),
                "model labels differ from the declared genres; classify will refuse it"
            );
            println!(
                "Warning: trained on {:?}, but classify only accepts models over {:?}",
                dataset.label_set().names(),
                LabelSet::declared().names()
            );
        }

        Ok(TrainingReport {
            rows: dataset.len(),
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            skipped: build_report.skipped_count(),
            history,
            test,
            model_path: self.config.model_path.clone(),
            inference_ready,
        })
    }
}

fn print_skipped(report: &BuildReport) {
    if report.skipped.is_empty() {
        return;
    }
    println!("Skipped {} unreadable file(s):", report.skipped_count());
    for skipped in &report.skipped {
        warn!(path = %skipped.path.display(), genre = %skipped.genre, "file skipped");
        println!("  {}", display_chain(&skipped.error));
    }
}

fn print_epoch(metrics: &EpochMetrics, total: usize) {
    let mut line = format!(
        "Epoch {}/{} - loss: {:.4} - accuracy: {:.4}",
        metrics.epoch, total, metrics.train.loss, metrics.train.accuracy
    );
    if let Some(validation) = metrics.validation {
        line.push_str(&format!(
            " - val_loss: {:.4} - val_accuracy: {:.4}",
            validation.loss, validation.accuracy
        ));
    }
    println!("{line}");
}
