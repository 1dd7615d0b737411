//! Observation encoders: packet tuples and counter deltas into fixed-width
//! vectors. Total conversions; absent fields encode as the zero sentinel
//! instead of failing the stream.

use super::FeatureVector;
use crate::sources::{CounterObservation, PacketObservation};
use std::net::IpAddr;
use std::sync::Mutex;

/// Categorical status codes assigned in first-seen order, stable for the
/// whole run. Re-deriving codes per observation would collapse every
/// category to 0, since each batch carries a single row.
#[derive(Debug, Default)]
pub struct StatusCodebook {
    codes: Mutex<Vec<String>>,
}

impl StatusCodebook {
    pub fn code_for(&self, status: &str) -> usize {
        let mut codes = self.codes.lock().expect("lock");
        match codes.iter().position(|s| s == status) {
            Some(pos) => pos,
            None => {
                codes.push(status.to_string());
                codes.len() - 1
            }
        }
    }
}

/// Converts one raw observation into a [`FeatureVector`] of the configured
/// width. Stateless across observations except for the status codebook.
pub struct Normalizer {
    dim: usize,
    codebook: StatusCodebook,
}

impl Normalizer {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            codebook: StatusCodebook::default(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Encode a packet observation. Field order: src address, src port,
    /// dst address, dst port, status code; the remainder is zero-filled.
    /// Missing transport fields are already 0 in the observation.
    pub fn encode_packet(&self, obs: &PacketObservation) -> FeatureVector {
        let provisional = vec![
            addr_code(&obs.src_addr),
            f32::from(obs.src_port),
            addr_code(&obs.dst_addr),
            f32::from(obs.dst_port),
            self.codebook.code_for(&obs.status) as f32,
        ];
        FeatureVector::fixed(
            self.dim,
            provisional,
            obs.interface.clone(),
            obs.ts.timestamp_millis(),
        )
    }

    /// Encode a counter observation: sent delta, recv delta, total delta,
    /// bytes-per-second rate; the remainder is zero-filled.
    pub fn encode_counters(&self, obs: &CounterObservation) -> FeatureVector {
        let provisional = vec![
            obs.bytes_sent_delta as f32,
            obs.bytes_recv_delta as f32,
            obs.total_delta as f32,
            obs.rate_per_second as f32,
        ];
        FeatureVector::fixed(
            self.dim,
            provisional,
            obs.interface.clone(),
            obs.ts.timestamp_millis(),
        )
    }
}

/// Numeric encoding of an address: the integer value of its bits. Lossy for
/// anything wider than the f32 mantissa, like every float feature matrix.
fn addr_code(addr: &IpAddr) -> f32 {
    match addr {
        IpAddr::V4(v4) => u32::from(*v4) as f32,
        IpAddr::V6(v6) => u128::from(*v6) as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codebook_assigns_first_seen_order() {
        let codebook = StatusCodebook::default();
        assert_eq!(codebook.code_for("active"), 0);
        assert_eq!(codebook.code_for("closed"), 1);
        assert_eq!(codebook.code_for("active"), 0);
        assert_eq!(codebook.code_for("syn_sent"), 2);
    }

    #[test]
    fn addr_code_ipv4() {
        let addr: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(addr_code(&addr), 167_772_161.0);
    }
}
