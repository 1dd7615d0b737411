//! Threshold decision over classifier scores.

mod engine;

pub use engine::{PacketLabel, TrafficLevel, Verdict, VerdictEngine, VerdictLabel};
