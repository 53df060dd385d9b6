//! Music genre classification: MFCC feature vectors, dataset assembly, and a
//! small dense network trained and served from the command line.

pub mod audio;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod inference;
pub mod labels;
pub mod model;
pub mod training;
pub mod types;
