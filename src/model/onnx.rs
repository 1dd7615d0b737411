//! ONNX Runtime classifier. Input: [n, feature_dim] f32 batch; output: one
//! score per row. The session is loaded once at startup and shared read-only
//! between source loops; `Session::run` takes `&self` and is reentrant.

use super::{Classifier, ClassifyError, ModelError};
use crate::features::FeatureVector;
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

pub struct OnnxClassifier {
    // ort 2.0.0-rc.10 requires `&mut Session` for `run` even though the
    // underlying call is reentrant; the lock only serializes the FFI call.
    session: Mutex<Session>,
    output_name: String,
    feature_dim: usize,
}

impl OnnxClassifier {
    /// Load the classifier artifact. Failure here is fatal for the whole
    /// process: there are no per-source model instances and nothing
    /// meaningful can be classified without it.
    pub fn load(path: &Path, feature_dim: usize) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Load(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Load(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| ModelError::Load(e.to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::Load("model declares no output".to_string()))?;

        tracing::info!(path = %path.display(), feature_dim, "classifier loaded");
        Ok(Self {
            session: Mutex::new(session),
            output_name,
            feature_dim,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn score_batch(&self, batch: &[FeatureVector]) -> Result<Vec<f32>, ClassifyError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let rows = batch.len();
        let mut data = Vec::with_capacity(rows * self.feature_dim);
        for fv in batch {
            if fv.dim() != self.feature_dim {
                return Err(ClassifyError(format!(
                    "expected {} features, got {}",
                    self.feature_dim,
                    fv.dim()
                )));
            }
            data.extend_from_slice(fv.as_slice());
        }

        let array = Array2::<f32>::from_shape_vec((rows, self.feature_dim), data)
            .map_err(|e| ClassifyError(e.to_string()))?;
        let tensor = Value::from_array(array).map_err(|e| ClassifyError(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ClassifyError(e.to_string()))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifyError(e.to_string()))?;
        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| ClassifyError("model produced no output".to_string()))?;
        let (_shape, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifyError(e.to_string()))?;

        if scores.len() < rows {
            return Err(ClassifyError(format!(
                "model returned {} scores for {} rows",
                scores.len(),
                rows
            )));
        }
        // Models emitting [n, 1] and [n] both land here; stride covers both.
        let stride = scores.len() / rows;
        Ok((0..rows)
            .map(|i| scores[i * stride].clamp(0.0, 1.0))
            .collect())
    }
}
