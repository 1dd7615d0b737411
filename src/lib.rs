//! netsentry — real-time network traffic classification agent.
//!
//! Modular structure:
//! - [`sources`] — Per-interface packet capture and byte-counter sampling
//! - [`features`] — Fixed-width feature vector normalization
//! - [`model`] — ONNX binary classifier adapter
//! - [`verdict`] — Threshold decision and verdict records
//! - [`report`] — Verdict reporting sinks
//! - [`pipeline`] — Per-source supervision and dispatch
//! - [`logging`] — Structured logging

pub mod config;
pub mod sources;
pub mod features;
pub mod model;
pub mod verdict;
pub mod report;
pub mod pipeline;
pub mod logging;

pub use config::{AgentConfig, Mode};
pub use sources::{CounterObservation, CounterSampler, PacketObservation, PacketSource};
pub use features::{FeatureVector, Normalizer};
pub use model::{Classifier, OnnxClassifier};
pub use verdict::{PacketLabel, TrafficLevel, Verdict, VerdictEngine};
pub use report::{ConsoleSink, ReportSink};
pub use pipeline::Pipeline;
pub use logging::StructuredLogger;
