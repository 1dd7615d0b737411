//! Integration tests: vector width invariant, truncation order, threshold
//! boundaries, counter arithmetic, per-source isolation, fatal model path.

use netsentry::config::{AgentConfig, ClassifyConfig};
use netsentry::features::{FeatureVector, Normalizer};
use netsentry::model::{Classifier, ClassifyError, OnnxClassifier};
use netsentry::pipeline::Pipeline;
use netsentry::report::ReportSink;
use netsentry::sources::{
    decode_frame, Capture, CounterSampler, CounterSnapshot, PacketObservation, PacketSource,
    SourceError,
};
use netsentry::verdict::{PacketLabel, TrafficLevel, Verdict, VerdictEngine, VerdictLabel};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

/// Classifier returning a constant score for every row.
struct ConstClassifier(f32);

impl Classifier for ConstClassifier {
    fn score_batch(&self, batch: &[FeatureVector]) -> Result<Vec<f32>, ClassifyError> {
        Ok(vec![self.0; batch.len()])
    }
}

/// Classifier whose every call fails.
struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn score_batch(&self, _batch: &[FeatureVector]) -> Result<Vec<f32>, ClassifyError> {
        Err(ClassifyError("backend unavailable".to_string()))
    }
}

#[derive(Default)]
struct CollectingSink {
    verdicts: Mutex<Vec<Verdict>>,
}

impl ReportSink for CollectingSink {
    fn report(&self, verdict: &Verdict) {
        self.verdicts.lock().unwrap().push(verdict.clone());
    }
}

/// Scripted frame source: yields `frames`, then either a clean end or a
/// capture error.
struct ScriptedSource {
    interface: String,
    frames: Vec<Vec<u8>>,
    pos: usize,
    fail_at_end: bool,
}

impl ScriptedSource {
    fn new(interface: &str, frames: Vec<Vec<u8>>, fail_at_end: bool) -> Self {
        Self {
            interface: interface.to_string(),
            frames,
            pos: 0,
            fail_at_end,
        }
    }
}

impl PacketSource for ScriptedSource {
    fn interface(&self) -> &str {
        &self.interface
    }

    fn next_frame(&mut self) -> Result<Capture, SourceError> {
        if self.pos < self.frames.len() {
            let frame = self.frames[self.pos].clone();
            self.pos += 1;
            return Ok(Capture::Frame(frame));
        }
        if self.fail_at_end {
            return Err(SourceError {
                interface: self.interface.clone(),
                reason: "simulated capture failure".to_string(),
            });
        }
        Ok(Capture::End)
    }
}

// TCP SYN over IPv4 over Ethernet, 192.168.1.100:12345 -> 10.0.0.1:80
fn tcp_syn_frame() -> Vec<u8> {
    tcp_frame_with_payload(&[])
}

fn tcp_frame_with_payload(payload: &[u8]) -> Vec<u8> {
    let total_length = (40 + payload.len()) as u16;
    let mut pkt = vec![
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // dst mac
        0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, // src mac
        0x08, 0x00, // ethertype IPv4
    ];
    pkt.extend_from_slice(&[0x45, 0x00]); // version/ihl, dscp
    pkt.extend_from_slice(&total_length.to_be_bytes());
    pkt.extend_from_slice(&[
        0x12, 0x34, 0x40, 0x00, // id, flags (DF)
        0x40, 0x06, 0x00, 0x00, // ttl 64, proto TCP, checksum
        192, 168, 1, 100, // src
        10, 0, 0, 1, // dst
    ]);
    pkt.extend_from_slice(&[
        0x30, 0x39, 0x00, 0x50, // ports 12345 -> 80
        0x00, 0x00, 0x00, 0x01, // seq
        0x00, 0x00, 0x00, 0x00, // ack
        0x50, 0x02, 0xff, 0xff, // offset, SYN, window
        0x00, 0x00, 0x00, 0x00, // checksum, urgent
    ]);
    pkt.extend_from_slice(payload);
    pkt
}

fn sample_observation() -> PacketObservation {
    PacketObservation::new(
        "eth0",
        "192.168.1.100".parse().unwrap(),
        12345,
        "10.0.0.1".parse().unwrap(),
        80,
        None,
    )
}

fn test_pipeline(classifier: Arc<dyn Classifier>, sink: Arc<CollectingSink>) -> Pipeline {
    Pipeline::new(
        Normalizer::new(14),
        classifier,
        VerdictEngine::new(ClassifyConfig { threshold: 0.5 }),
        sink,
        Arc::new(AtomicBool::new(false)),
        8,
    )
}

#[test]
fn vector_width_is_padded() {
    let fv = FeatureVector::fixed(14, vec![1.0, 2.0, 3.0], "t", 0);
    assert_eq!(fv.dim(), 14);
    assert_eq!(fv.as_slice().len(), 14);
    assert_eq!(&fv.as_slice()[..3], &[1.0, 2.0, 3.0]);
    assert!(fv.as_slice()[3..].iter().all(|v| *v == 0.0));
}

#[test]
fn vector_width_truncates_trailing_first() {
    let provisional: Vec<f32> = (0..20).map(|i| i as f32).collect();
    let fv = FeatureVector::fixed(14, provisional, "t", 0);
    let expected: Vec<f32> = (0..14).map(|i| i as f32).collect();
    // Leading values survive; the latest-appended ones are dropped
    assert_eq!(fv.as_slice(), expected.as_slice());
}

#[test]
fn packet_encoding_layout() {
    let normalizer = Normalizer::new(14);
    let fv = normalizer.encode_packet(&sample_observation());
    assert_eq!(fv.dim(), 14);
    let values = fv.as_slice();
    assert_eq!(values[0], 3_232_235_876u32 as f32); // 192.168.1.100
    assert_eq!(values[1], 12_345.0);
    assert_eq!(values[2], 167_772_161u32 as f32); // 10.0.0.1
    assert_eq!(values[3], 80.0);
    assert_eq!(values[4], 0.0); // first-seen status code
    assert!(values[5..].iter().all(|v| *v == 0.0));
}

#[test]
fn encoding_is_idempotent() {
    let normalizer = Normalizer::new(14);
    let obs = sample_observation();
    assert_eq!(normalizer.encode_packet(&obs), normalizer.encode_packet(&obs));
}

#[test]
fn threshold_is_strict_greater_than() {
    assert_eq!(PacketLabel::from_score(0.0, 0.5), PacketLabel::Benign);
    assert_eq!(PacketLabel::from_score(0.5, 0.5), PacketLabel::Benign);
    assert_eq!(PacketLabel::from_score(0.500001, 0.5), PacketLabel::Malicious);
    assert_eq!(PacketLabel::from_score(1.0, 0.5), PacketLabel::Malicious);

    assert_eq!(TrafficLevel::from_score(0.5, 0.5), TrafficLevel::Low);
    assert_eq!(TrafficLevel::from_score(0.500001, 0.5), TrafficLevel::High);
}

#[test]
fn counter_diff_arithmetic() {
    let initial = CounterSnapshot::from_totals(BTreeMap::from([(
        "eth0".to_string(),
        (1000u64, 2000u64),
    )]));
    let last = CounterSnapshot::from_totals(BTreeMap::from([(
        "eth0".to_string(),
        (1500u64, 2500u64),
    )]));

    let observations = CounterSampler::diff(&initial, &last, 5);
    assert_eq!(observations.len(), 1);
    let obs = &observations[0];
    assert_eq!(obs.bytes_sent_delta, 500);
    assert_eq!(obs.bytes_recv_delta, 500);
    assert_eq!(obs.total_delta, 1000);
    assert_eq!(obs.rate_per_second, 200.0);

    let fv = Normalizer::new(14).encode_counters(obs);
    assert_eq!(fv.as_slice()[..4], [500.0, 500.0, 1000.0, 200.0]);
    assert!(fv.as_slice()[4..].iter().all(|v| *v == 0.0));
}

#[test]
fn hotplugged_interface_is_excluded_from_round() {
    let initial = CounterSnapshot::from_totals(BTreeMap::from([
        ("eth0".to_string(), (100u64, 100u64)),
        ("eth1".to_string(), (50u64, 50u64)),
    ]));
    let last = CounterSnapshot::from_totals(BTreeMap::from([(
        "eth0".to_string(),
        (200u64, 200u64),
    )]));

    let observations = CounterSampler::diff(&initial, &last, 1);
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].interface, "eth0");
}

#[test]
fn healthy_source_survives_sibling_failure() {
    let sink = Arc::new(CollectingSink::default());
    let pipeline = test_pipeline(Arc::new(ConstClassifier(0.9)), Arc::clone(&sink));

    let healthy = ScriptedSource::new("healthy0", vec![tcp_syn_frame(); 150], false);
    let failing = ScriptedSource::new("failing0", vec![tcp_syn_frame(); 3], true);
    pipeline.run_packet_sources(vec![Box::new(healthy), Box::new(failing)]);

    let verdicts = sink.verdicts.lock().unwrap();
    let healthy_count = verdicts.iter().filter(|v| v.source == "healthy0").count();
    let failing_count = verdicts.iter().filter(|v| v.source == "failing0").count();
    assert!(healthy_count >= 100, "healthy source delivered {healthy_count}");
    assert_eq!(healthy_count, 150);
    assert_eq!(failing_count, 3);
    assert!(verdicts
        .iter()
        .all(|v| v.label == VerdictLabel::Packet(PacketLabel::Malicious)));
}

#[test]
fn classification_failure_skips_observations_without_panic() {
    let sink = Arc::new(CollectingSink::default());
    let pipeline = test_pipeline(Arc::new(BrokenClassifier), Arc::clone(&sink));

    let source = ScriptedSource::new("eth0", vec![tcp_syn_frame(); 5], false);
    pipeline.run_packet_sources(vec![Box::new(source)]);

    assert!(sink.verdicts.lock().unwrap().is_empty());
}

#[test]
fn frames_without_network_layer_are_skipped() {
    let sink = Arc::new(CollectingSink::default());
    let pipeline = test_pipeline(Arc::new(ConstClassifier(0.2)), Arc::clone(&sink));

    // ARP ethertype: no network layer, no observation
    let mut arp = vec![
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0x08, 0x06,
    ];
    arp.extend_from_slice(&[0u8; 28]);

    let frames = vec![arp, tcp_syn_frame()];
    let source = ScriptedSource::new("eth0", frames, false);
    pipeline.run_packet_sources(vec![Box::new(source)]);

    let verdicts = sink.verdicts.lock().unwrap();
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].label, VerdictLabel::Packet(PacketLabel::Benign));
    assert_eq!(verdicts[0].summary, "192.168.1.100:12345 -> 10.0.0.1:80");
}

#[test]
fn payload_decodes_lossy_never_an_error() {
    // Invalid UTF-8 in the middle of the payload becomes replacement chars
    let frame = tcp_frame_with_payload(b"GET \xff\xfe/");
    let obs = decode_frame("eth0", &frame).unwrap();
    assert_eq!(obs.payload.as_deref(), Some("GET \u{fffd}\u{fffd}/"));

    // An empty payload carries no text at all
    let obs = decode_frame("eth0", &tcp_syn_frame()).unwrap();
    assert_eq!(obs.payload, None);
}

#[test]
fn missing_model_is_a_load_error() {
    assert!(OnnxClassifier::load(Path::new("nonexistent.onnx"), 14).is_err());
}

#[test]
fn missing_model_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AgentConfig::default();
    config.model_path = dir.path().join("nonexistent.onnx");
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_netsentry"))
        .env("NETSENTRY_CONFIG_PATH", &config_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error loading model"), "stderr: {stderr}");
}

#[test]
fn corrupt_model_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.onnx");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"not a model").unwrap();
    assert!(OnnxClassifier::load(&path, 14).is_err());
}

#[test]
fn config_load_clamps_interval() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut defaults = AgentConfig::default();
    defaults.sources.interval_secs = 0;
    defaults.sources.queue_depth = 0;
    std::fs::write(&path, serde_json::to_string(&defaults).unwrap()).unwrap();

    let config = AgentConfig::load(&path);
    assert_eq!(config.sources.interval_secs, 1);
    assert_eq!(config.sources.queue_depth, 1);
    assert_eq!(config.features.feature_dim, 14);
}

#[test]
fn config_load_default_when_missing() {
    let config = AgentConfig::load(Path::new("nonexistent.json"));
    assert_eq!(config.features.feature_dim, 14);
    assert_eq!(config.classify.threshold, 0.5);
    assert_eq!(config.sources.interval_secs, 5);
}
