//! Agent configuration. JSON file, load-or-default, clamped at load time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which observation source the agent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Per-packet capture on each interface
    Packet,
    /// Periodic byte-counter deltas per interface
    Counters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Path to the ONNX classifier artifact
    pub model_path: PathBuf,
    /// Source variant to run
    pub mode: Mode,
    /// Source selection and sampling parameters
    pub sources: SourcesConfig,
    /// Feature vector parameters
    pub features: FeaturesConfig,
    /// Decision threshold
    pub classify: ClassifyConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Interfaces to monitor; empty means enumerate all at startup
    pub interfaces: Vec<String>,
    /// Counter sampling interval (seconds)
    pub interval_secs: u64,
    /// Bounded observation queue depth per source (block-producer when full)
    pub queue_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Number of numerical features expected by the model
    pub feature_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Score strictly above this is the positive class (Malicious / High)
    pub threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.onnx"),
            mode: Mode::Packet,
            sources: SourcesConfig::default(),
            features: FeaturesConfig::default(),
            classify: ClassifyConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            interfaces: Vec::new(),
            interval_secs: 5,
            queue_depth: 256,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self { feature_dim: 14 }
    }
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AgentConfig {
    /// Load from JSON file if present; otherwise return default.
    /// Out-of-range sampling values are clamped here so the runtime never
    /// sees a zero interval or a zero-capacity queue.
    pub fn load(path: &std::path::Path) -> Self {
        let mut config = Self::default();
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AgentConfig>(&data) {
                    config = c;
                }
            }
        }
        config.sources.interval_secs = config.sources.interval_secs.max(1);
        config.sources.queue_depth = config.sources.queue_depth.max(1);
        config.features.feature_dim = config.features.feature_dim.max(1);
        config
    }
}
