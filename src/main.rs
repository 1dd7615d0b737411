//! netsentry entrypoint: loads config and the classifier artifact, then runs
//! the per-source classification loops until interrupted.

use netsentry::{
    config::{AgentConfig, Mode},
    features::Normalizer,
    logging::StructuredLogger,
    model::{Classifier, OnnxClassifier},
    pipeline::Pipeline,
    report::ConsoleSink,
    sources::{self, CounterSampler},
    verdict::VerdictEngine,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

fn main() {
    let config_path = std::env::var("NETSENTRY_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = AgentConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    // The one fatal path: sources are not enumerated until the model loads.
    let classifier: Arc<dyn Classifier> =
        match OnnxClassifier::load(&config.model_path, config.features.feature_dim) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                eprintln!("Error loading model: {e}");
                std::process::exit(1);
            }
        };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        let _ = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed));
    }

    let pipeline = Pipeline::new(
        Normalizer::new(config.features.feature_dim),
        classifier,
        VerdictEngine::new(config.classify.clone()),
        Arc::new(ConsoleSink),
        Arc::clone(&stop),
        config.sources.queue_depth,
    );

    let interfaces = if config.sources.interfaces.is_empty() {
        sources::enumerate_interfaces()
    } else {
        config.sources.interfaces.clone()
    };
    info!(?interfaces, mode = ?config.mode, "netsentry starting (Ctrl+C to stop)");

    match config.mode {
        Mode::Packet => run_packet_mode(&pipeline, &interfaces),
        Mode::Counters => {
            let mut sampler = CounterSampler::new(config.sources.interval_secs, interfaces);
            pipeline.run_counter_loop(&mut sampler);
        }
    }

    info!("netsentry stopped");
}

#[cfg(target_os = "linux")]
fn run_packet_mode(pipeline: &Pipeline, interfaces: &[String]) {
    use netsentry::sources::{AfPacketSource, PacketSource};

    let mut opened: Vec<Box<dyn PacketSource>> = Vec::new();
    for name in interfaces {
        match AfPacketSource::open(name) {
            Ok(s) => opened.push(Box::new(s)),
            Err(e) => {
                tracing::warn!(interface = %name, error = %e, "cannot open capture, skipping")
            }
        }
    }
    if opened.is_empty() {
        eprintln!("No capture sources could be opened (capture requires CAP_NET_RAW)");
        std::process::exit(1);
    }
    pipeline.run_packet_sources(opened);
}

#[cfg(not(target_os = "linux"))]
fn run_packet_mode(_pipeline: &Pipeline, _interfaces: &[String]) {
    eprintln!("Packet capture requires a Linux host; use counters mode");
    std::process::exit(1);
}
