#![allow(dead_code)]

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use genre_classifier::error::ExtractError;
use genre_classifier::features::{FeatureSource, FeatureVector};
use hound::{SampleFormat, WavSpec, WavWriter};

pub const SAMPLE_RATE: u32 = 22_050;

/// Write a mono 16-bit sine tone.
pub fn write_tone(path: &Path, frequency: f32, seconds: f32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .unwrap_or_else(|err| panic!("failed to create {:?}: {}", path, err));
    let total = (seconds * SAMPLE_RATE as f32) as usize;
    for i in 0..total {
        let t = i as f32 / SAMPLE_RATE as f32;
        let value = 0.5 * (2.0 * PI * frequency * t).sin();
        writer
            .write_sample((value * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// A file with the right extension that no decoder accepts.
pub fn write_garbage(path: &Path) {
    fs::write(path, b"this is plain text, not audio").expect("write garbage file");
}

/// Create `root/<genre>/` and return its path.
pub fn genre_dir(root: &Path, genre: &str) -> PathBuf {
    let dir = root.join(genre);
    fs::create_dir_all(&dir).expect("create genre dir");
    dir
}

/// Touch `count` empty `.wav` files named `track_NN.wav`.
pub fn touch_tracks(dir: &Path, count: usize) {
    for i in 0..count {
        fs::write(dir.join(format!("track_{i:02}.wav")), b"").expect("touch track");
    }
}

/// Feature source that never decodes; each vector encodes its parent
/// directory so genres are trivially separable.
pub struct GenreMarkerSource {
    pub vector_len: usize,
    pub genres: Vec<String>,
}

impl GenreMarkerSource {
    pub fn new(vector_len: usize, genres: &[&str]) -> Self {
        Self {
            vector_len,
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }
}

impl FeatureSource for GenreMarkerSource {
    fn vector_len(&self) -> usize {
        self.vector_len
    }

    fn extract(&self, path: &Path) -> Result<FeatureVector, ExtractError> {
        let genre = path
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let slot = self.genres.iter().position(|g| g == genre).unwrap_or(0);
        let block = self.vector_len / self.genres.len().max(1);
        let values = (0..self.vector_len)
            .map(|i| if i / block.max(1) == slot { 1.0 } else { 0.0 })
            .collect();
        Ok(FeatureVector::new(values, self.vector_len))
    }
}
