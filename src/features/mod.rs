//! Fixed-width feature vector normalization for classifier input.

mod encode;

pub use encode::{Normalizer, StatusCodebook};

use serde::{Deserialize, Serialize};

/// Fixed-width numeric vector consumed by the model. `values.len() == dim`
/// always: the only constructor pads or truncates, so a partially built
/// vector is never observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    dim: usize,
    values: Vec<f32>,
    /// Source identity for log correlation
    pub source: String,
    pub ts: i64,
}

impl FeatureVector {
    /// Build from provisional values. Shorter inputs are right-padded with
    /// zeros; longer ones keep the first `dim` values, dropping the trailing
    /// (latest-appended) fields first.
    pub fn fixed(dim: usize, mut values: Vec<f32>, source: impl Into<String>, ts: i64) -> Self {
        values.resize(dim, 0.0);
        Self {
            dim,
            values,
            source: source.into(),
            ts,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}
