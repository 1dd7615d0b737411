//! Observation sources: per-interface packet streams and byte-counter
//! sampling. Shared raw-observation types; each source owns its own failure
//! domain.

mod packet;
mod counters;

pub use packet::{decode_frame, Capture};
#[cfg(target_os = "linux")]
pub use packet::AfPacketSource;
pub use counters::{CounterSampler, CounterSnapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("capture failed on {interface}: {reason}")]
pub struct SourceError {
    pub interface: String,
    pub reason: String,
}

/// One captured packet, reduced to the fields the normalizer consumes.
/// Immutable; discarded after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketObservation {
    pub id: String,
    pub interface: String,
    pub src_addr: IpAddr,
    /// 0 when the packet carries no transport-layer header
    pub src_port: u16,
    pub dst_addr: IpAddr,
    pub dst_port: u16,
    /// Connection status category (e.g. "active")
    pub status: String,
    pub ts: DateTime<Utc>,
    /// Best-effort text payload; lossy-decoded, never an error
    pub payload: Option<String>,
}

/// One sampling round's counter delta for a single interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterObservation {
    pub interface: String,
    pub bytes_sent_delta: u64,
    pub bytes_recv_delta: u64,
    pub total_delta: u64,
    pub rate_per_second: f64,
    pub ts: DateTime<Utc>,
}

impl PacketObservation {
    pub fn new(
        interface: impl Into<String>,
        src_addr: IpAddr,
        src_port: u16,
        dst_addr: IpAddr,
        dst_port: u16,
        payload: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            interface: interface.into(),
            src_addr,
            src_port,
            dst_addr,
            dst_port,
            status: "active".to_string(),
            ts: Utc::now(),
            payload,
        }
    }

    /// `src:port -> dst:port` endpoint summary used in verdict lines.
    pub fn endpoints(&self) -> String {
        format!(
            "{}:{} -> {}:{}",
            self.src_addr, self.src_port, self.dst_addr, self.dst_port
        )
    }
}

/// Pull interface over a raw frame producer. `Capture::Idle` lets the caller
/// poll its stop flag while the line is quiet; `Capture::End` or an error
/// ends the stream for this source only.
pub trait PacketSource: Send {
    /// Name of the interface this source captures on.
    fn interface(&self) -> &str;

    /// Next capture poll result. Blocks at most for the poll timeout.
    fn next_frame(&mut self) -> Result<Capture, SourceError>;
}

/// Enumerate interface names once at startup.
pub fn enumerate_interfaces() -> Vec<String> {
    let networks = sysinfo::Networks::new_with_refreshed_list();
    let mut names: Vec<String> = networks.iter().map(|(name, _)| name.clone()).collect();
    names.sort();
    names
}
