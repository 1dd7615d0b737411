//! Applies the configured decision threshold to a classifier score and
//! produces the per-observation verdict record.

use crate::config::ClassifyConfig;
use crate::sources::{CounterObservation, PacketObservation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Packet-variant labels. The threshold comparison is strict: a score
/// exactly at the threshold is the negative class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketLabel {
    Benign,
    Malicious,
}

impl PacketLabel {
    pub fn from_score(score: f32, threshold: f32) -> Self {
        if score > threshold {
            PacketLabel::Malicious
        } else {
            PacketLabel::Benign
        }
    }
}

impl fmt::Display for PacketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketLabel::Benign => write!(f, "Benign"),
            PacketLabel::Malicious => write!(f, "Malicious"),
        }
    }
}

/// Counter-variant labels, same strict comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLevel {
    Low,
    High,
}

impl TrafficLevel {
    pub fn from_score(score: f32, threshold: f32) -> Self {
        if score > threshold {
            TrafficLevel::High
        } else {
            TrafficLevel::Low
        }
    }
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficLevel::Low => write!(f, "Low Traffic"),
            TrafficLevel::High => write!(f, "High Traffic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictLabel {
    Packet(PacketLabel),
    Traffic(TrafficLevel),
}

/// Classifier output after the threshold decision, attached to exactly one
/// observation. Consumed immediately by the report sink; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: VerdictLabel,
    /// Confidence score in [0, 1]
    pub score: f32,
    pub ts: DateTime<Utc>,
    /// Source identity (interface name)
    pub source: String,
    /// Display summary of the originating observation, for logging
    pub summary: String,
}

pub struct VerdictEngine {
    threshold: f32,
}

impl VerdictEngine {
    pub fn new(config: ClassifyConfig) -> Self {
        Self {
            threshold: config.threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn classify_packet(&self, obs: &PacketObservation, score: f32) -> Verdict {
        Verdict {
            label: VerdictLabel::Packet(PacketLabel::from_score(score, self.threshold)),
            score,
            ts: obs.ts,
            source: obs.interface.clone(),
            summary: obs.endpoints(),
        }
    }

    pub fn classify_counters(&self, obs: &CounterObservation, score: f32) -> Verdict {
        Verdict {
            label: VerdictLabel::Traffic(TrafficLevel::from_score(score, self.threshold)),
            score,
            ts: obs.ts,
            source: obs.interface.clone(),
            summary: obs.interface.clone(),
        }
    }
}
