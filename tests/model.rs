mod common;

use std::collections::HashMap;
use std::fs;

use candle_core::{DType, Device, Tensor};
use common::{genre_dir, touch_tracks, GenreMarkerSource};
use genre_classifier::config::AppConfig;
use genre_classifier::dataset::DatasetBuilder;
use genre_classifier::error::{ModelLoadError, ModelSaveError};
use genre_classifier::features::FeatureConfig;
use genre_classifier::inference::Predictor;
use genre_classifier::labels::{LabelSet, GENRES};
use genre_classifier::model::{meta_path, ModelArtifact, ModelMeta, Network, Topology};
use genre_classifier::training::Trainer;
use rand::rngs::StdRng;
use rand::SeedableRng;

const VECTOR_LEN: usize = 16;

fn two_genre_config(root: &std::path::Path) -> AppConfig {
    let mut config = AppConfig {
        dataset_root: root.to_path_buf(),
        model_path: root.join("model.safetensors"),
        genres: vec!["blues".into(), "rock".into()],
        features: FeatureConfig {
            vector_len: VECTOR_LEN,
            ..FeatureConfig::default()
        },
        ..AppConfig::default()
    };
    config.split.seed = Some(7);
    config.training.seed = Some(7);
    config.training.hidden_units = 8;
    config.training.epochs = 20;
    config.training.learning_rate = 0.01;
    config
}

fn marker_builder(root: &std::path::Path) -> DatasetBuilder<GenreMarkerSource> {
    for genre in ["blues", "rock"] {
        touch_tracks(&genre_dir(root, genre), 20);
    }
    DatasetBuilder::new(
        root,
        vec!["blues".into(), "rock".into()],
        GenreMarkerSource::new(VECTOR_LEN, &["blues", "rock"]),
    )
}

#[test]
fn training_reduces_loss_and_saves_a_loadable_model() {
    let root = tempfile::tempdir().unwrap();
    let config = two_genre_config(root.path());
    let builder = marker_builder(root.path());

    let report = Trainer::new(config.clone())
        .run_with(&builder)
        .expect("training succeeds");

    assert_eq!(report.rows, 40);
    assert_eq!(report.train_rows, 32);
    assert_eq!(report.test_rows, 8);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.history.epochs.len(), 20);

    let first = report.history.epochs.first().unwrap();
    let last = report.history.last().unwrap();
    assert!(
        last.train.loss < first.train.loss,
        "loss went from {} to {}",
        first.train.loss,
        last.train.loss
    );
    assert!(first.validation.is_some());
    assert!((0.0..=1.0).contains(&report.test.accuracy));

    assert!(!report.inference_ready);

    let artifact = ModelArtifact::load(&config.model_path).expect("artifact loads");
    assert_eq!(artifact.meta.label_set.names(), ["blues", "rock"]);
    assert_eq!(artifact.network.input_dim(), VECTOR_LEN);
    assert_eq!(artifact.network.output_dim(), 2);
    assert_eq!(artifact.meta.features, config.features);
}

#[test]
fn training_on_every_declared_genre_is_inference_ready() {
    let root = tempfile::tempdir().unwrap();
    let mut config = two_genre_config(root.path());
    config.genres = GENRES.iter().map(|g| g.to_string()).collect();
    config.training.epochs = 2;
    for genre in GENRES {
        touch_tracks(&genre_dir(root.path(), genre), 5);
    }
    let builder = DatasetBuilder::new(
        root.path(),
        config.genres.clone(),
        GenreMarkerSource::new(VECTOR_LEN, &GENRES),
    );

    let report = Trainer::new(config.clone()).run_with(&builder).unwrap();
    assert!(report.inference_ready);
    assert!(Predictor::load(&config.model_path, &config.features).is_ok());
}

#[test]
fn predictor_refuses_labels_other_than_the_declared_genres() {
    let root = tempfile::tempdir().unwrap();
    let config = two_genre_config(root.path());
    let builder = marker_builder(root.path());
    Trainer::new(config.clone()).run_with(&builder).unwrap();

    match Predictor::load(&config.model_path, &config.features) {
        Err(ModelLoadError::LabelMismatch { found, .. }) => {
            assert_eq!(found, vec!["blues".to_string(), "rock".to_string()]);
        }
        Err(other) => panic!("expected LabelMismatch, got {other:?}"),
        Ok(_) => panic!("two-label model must not load for inference"),
    }
}

#[test]
fn training_aborts_when_a_genre_yields_no_rows() {
    let root = tempfile::tempdir().unwrap();
    let mut config = two_genre_config(root.path());
    config.genres.push("jazz".into());
    for genre in ["blues", "rock"] {
        touch_tracks(&genre_dir(root.path(), genre), 5);
    }
    genre_dir(root.path(), "jazz");
    let builder = DatasetBuilder::new(
        root.path(),
        config.genres.clone(),
        GenreMarkerSource::new(VECTOR_LEN, &["blues", "rock", "jazz"]),
    );

    let err = Trainer::new(config.clone()).run_with(&builder).unwrap_err();
    assert!(format!("{err:#}").contains("jazz"));
    assert!(!config.model_path.exists());
}

#[test]
fn predictor_checks_configured_vector_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.safetensors");
    let features = FeatureConfig {
        vector_len: 12,
        ..FeatureConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    let network = Network::new(declared_topology(12, 4), &mut rng).unwrap();
    ModelArtifact::new(network, LabelSet::declared(), features.clone())
        .save(&path)
        .unwrap();

    assert!(Predictor::load(&path, &features).is_ok());

    let wider = FeatureConfig {
        vector_len: 13,
        ..features
    };
    match Predictor::load(&path, &wider) {
        Err(ModelLoadError::InputMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, 13);
            assert_eq!(found, 12);
        }
        Err(other) => panic!("expected InputMismatch, got {other:?}"),
        Ok(_) => panic!("mismatched vector length must not load"),
    }
}

fn declared_topology(input_dim: usize, hidden_units: usize) -> Topology {
    Topology {
        input_dim,
        hidden_units,
        output_dim: GENRES.len(),
    }
}

/// Save a small ten-genre model and return its weights path.
fn saved_declared_model(dir: &std::path::Path) -> (std::path::PathBuf, FeatureConfig) {
    let path = dir.join("model.safetensors");
    let features = FeatureConfig {
        vector_len: 6,
        ..FeatureConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(3);
    let network = Network::new(declared_topology(6, 4), &mut rng).unwrap();
    ModelArtifact::new(network, LabelSet::declared(), features.clone())
        .save(&path)
        .unwrap();
    (path, features)
}

#[test]
fn corrupt_and_missing_artifacts_are_distinguished() {
    let dir = tempfile::tempdir().unwrap();
    let (path, _) = saved_declared_model(dir.path());
    fs::write(meta_path(&path), "{ not json").unwrap();

    assert!(matches!(
        ModelArtifact::load(&path),
        Err(ModelLoadError::Corrupt { .. })
    ));
    assert!(matches!(
        ModelArtifact::load(&dir.path().join("absent.safetensors")),
        Err(ModelLoadError::Missing { .. })
    ));
}

#[test]
fn weights_with_the_wrong_shape_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let (path, features) = saved_declared_model(dir.path());

    let mut tensors: HashMap<String, Tensor> =
        candle_core::safetensors::load(&path, &Device::Cpu).unwrap();
    tensors.insert(
        "dense.bias".to_string(),
        Tensor::zeros(5, DType::F32, &Device::Cpu).unwrap(),
    );
    candle_core::safetensors::save(&tensors, &path).unwrap();

    match Predictor::load(&path, &features) {
        Err(ModelLoadError::Weights { path: reported, .. }) => assert_eq!(reported, path),
        Err(other) => panic!("expected Weights, got {other:?}"),
        Ok(_) => panic!("mis-shaped weights must not load"),
    }
}

#[test]
fn sidecar_topology_must_match_the_stored_weights() {
    let dir = tempfile::tempdir().unwrap();
    let (path, features) = saved_declared_model(dir.path());

    let mut meta: ModelMeta =
        serde_json::from_str(&fs::read_to_string(meta_path(&path)).unwrap()).unwrap();
    meta.topology.hidden_units = 7;
    fs::write(meta_path(&path), serde_json::to_string(&meta).unwrap()).unwrap();

    assert!(matches!(
        Predictor::load(&path, &features),
        Err(ModelLoadError::Weights { .. })
    ));
}

#[test]
fn saving_into_a_missing_directory_fails_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_such_dir").join("model.safetensors");
    let mut rng = StdRng::seed_from_u64(2);
    let artifact = ModelArtifact::new(
        Network::new(declared_topology(4, 2), &mut rng).unwrap(),
        LabelSet::declared(),
        FeatureConfig {
            vector_len: 4,
            ..FeatureConfig::default()
        },
    );

    match artifact.save(&path) {
        Err(ModelSaveError::Weights { path: reported, .. }) => assert_eq!(reported, path),
        Err(other) => panic!("expected Weights error, got {other:?}"),
        Ok(()) => panic!("save into a missing directory must fail"),
    }
}
