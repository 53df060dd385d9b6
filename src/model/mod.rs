//! Dense feed-forward classifier: topology, training, persistence.

pub mod artifact;
pub mod network;
pub mod summary;

pub use artifact::{meta_path, ModelArtifact, ModelMeta, FORMAT_VERSION};
pub use network::{EpochMetrics, FitOptions, History, Metrics, Network, Topology};
pub use summary::ModelSummary;
