mod common;

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use common::{write_garbage, write_tone};
use genre_classifier::features::FeatureConfig;
use genre_classifier::labels::{LabelSet, GENRES};
use genre_classifier::model::{ModelArtifact, Network, Topology};
use predicates::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const VECTOR_LEN: usize = 500;

/// Write a small ten-genre model plus a config pointing at it.
fn write_model_and_config(dir: &Path) -> std::path::PathBuf {
    let features = FeatureConfig {
        vector_len: VECTOR_LEN,
        ..FeatureConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(21);
    let topology = Topology {
        input_dim: VECTOR_LEN,
        hidden_units: 6,
        output_dim: GENRES.len(),
    };
    let network = Network::new(topology, &mut rng).unwrap();
    let model_path = dir.join("model.safetensors");
    ModelArtifact::new(network, LabelSet::declared(), features)
        .save(&model_path)
        .unwrap();

    let config_path = dir.join("config.json");
    let config = serde_json::json!({
        "model_path": model_path,
        "features": { "vector_len": VECTOR_LEN },
    });
    fs::write(&config_path, config.to_string()).unwrap();
    config_path
}

fn score_lines(stdout: &str) -> Vec<(String, f32)> {
    stdout
        .lines()
        .filter_map(|line| line.split_once(": "))
        .filter(|(label, _)| GENRES.contains(label))
        .map(|(label, score)| (label.to_string(), score.parse().unwrap()))
        .collect()
}

#[test]
fn classify_prints_one_score_per_genre() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_model_and_config(dir.path());
    let song = dir.path().join("song.wav");
    write_tone(&song, 440.0, 2.0);

    let output = Command::cargo_bin("classify")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg(&song)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(&format!("{}:", song.display())));
    let scores = score_lines(&stdout);
    let labels: Vec<&str> = scores.iter().map(|(label, _)| label.as_str()).collect();
    assert_eq!(labels, GENRES);
    let total: f32 = scores.iter().map(|(_, score)| score).sum();
    // Each printed score is rounded to two decimals.
    assert!((total - 1.0).abs() < 0.06, "scores sum to {total}");
    assert!(scores.iter().all(|(_, score)| (0.0..=1.0).contains(score)));
}

#[test]
fn bad_file_is_reported_without_stopping_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_model_and_config(dir.path());
    let broken = dir.path().join("broken.wav");
    write_garbage(&broken);
    let song = dir.path().join("song.wav");
    write_tone(&song, 220.0, 2.0);

    let output = Command::cargo_bin("classify")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg(&broken)
        .arg(&song)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(&format!("Error in analysing {}", broken.display())));
    assert_eq!(score_lines(&stdout).len(), GENRES.len());
}

#[test]
fn missing_model_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let song = dir.path().join("song.wav");
    write_tone(&song, 220.0, 1.0);

    Command::cargo_bin("classify")
        .unwrap()
        .arg("--model")
        .arg(dir.path().join("absent.json"))
        .arg(&song)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:").and(predicate::str::contains("absent.json")));
}

#[test]
fn classify_without_files_is_a_usage_error() {
    Command::cargo_bin("classify").unwrap().assert().failure();
}
