//! Classifier adapter: the externally supplied binary model behind a trait,
//! so the pipeline takes any scorer and tests inject synthetic ones.

mod onnx;

pub use onnx::OnnxClassifier;

use crate::features::FeatureVector;
use thiserror::Error;

/// Startup-time model failures. Fatal for the process.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {0}")]
    NotFound(std::path::PathBuf),
    #[error("failed to load model: {0}")]
    Load(String),
}

/// A single classification call failed; costs only the observations in that
/// batch, never the stream.
#[derive(Debug, Error)]
#[error("classification failed: {0}")]
pub struct ClassifyError(pub String);

/// Externally supplied binary classifier. Accepts a batch of one or more
/// vectors and returns one score per row in the same order, clamped to
/// [0, 1]. Implementations must be safe to call concurrently from multiple
/// source loops.
pub trait Classifier: Send + Sync {
    fn score_batch(&self, batch: &[FeatureVector]) -> Result<Vec<f32>, ClassifyError>;

    fn score(&self, vector: &FeatureVector) -> Result<f32, ClassifyError> {
        Ok(self
            .score_batch(std::slice::from_ref(vector))?
            .first()
            .copied()
            .unwrap_or(0.0))
    }
}
