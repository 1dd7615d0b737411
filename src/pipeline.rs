//! Per-source supervision. Packet mode runs one capture producer and one
//! classify consumer per monitored source, joined by a bounded queue
//! (block-producer when full, so a slow classifier cannot buffer frames
//! without bound). Counter mode runs a single sampling loop that classifies
//! each round as a batch. A failure on one source never halts its siblings;
//! a failure on one observation never halts its source.

use crate::features::Normalizer;
use crate::model::Classifier;
use crate::report::ReportSink;
use crate::sources::{decode_frame, Capture, CounterSampler, PacketObservation, PacketSource};
use crate::verdict::VerdictEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;

pub struct Pipeline {
    normalizer: Normalizer,
    classifier: Arc<dyn Classifier>,
    verdicts: VerdictEngine,
    sink: Arc<dyn ReportSink>,
    stop: Arc<AtomicBool>,
    queue_depth: usize,
}

impl Pipeline {
    pub fn new(
        normalizer: Normalizer,
        classifier: Arc<dyn Classifier>,
        verdicts: VerdictEngine,
        sink: Arc<dyn ReportSink>,
        stop: Arc<AtomicBool>,
        queue_depth: usize,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            verdicts,
            sink,
            stop,
            queue_depth: queue_depth.max(1),
        }
    }

    /// Run the given packet sources until their streams end, they fail, or
    /// the stop flag is raised. Blocks until every per-source thread pair
    /// has joined, so capture handles are released before return.
    pub fn run_packet_sources(&self, sources: Vec<Box<dyn PacketSource>>) {
        thread::scope(|scope| {
            for mut source in sources {
                let interface = source.interface().to_string();
                let (tx, rx) = sync_channel::<PacketObservation>(self.queue_depth);

                let producer_name = interface.clone();
                scope.spawn(move || self.capture_loop(&producer_name, source.as_mut(), tx));
                let consumer_name = interface;
                scope.spawn(move || self.classify_loop(&consumer_name, rx));
            }
        });
    }

    fn capture_loop(
        &self,
        interface: &str,
        source: &mut dyn PacketSource,
        tx: SyncSender<PacketObservation>,
    ) {
        tracing::info!(interface, "capture started");
        loop {
            if self.stop.load(Ordering::Relaxed) {
                tracing::info!(interface, "capture stopping");
                break;
            }
            match source.next_frame() {
                Ok(Capture::Frame(frame)) => {
                    // Frames without a network layer produce no observation
                    if let Some(obs) = decode_frame(interface, &frame) {
                        if tx.send(obs).is_err() {
                            break;
                        }
                    }
                }
                Ok(Capture::Idle) => continue,
                Ok(Capture::End) => {
                    tracing::info!(interface, "capture stream ended");
                    break;
                }
                Err(e) => {
                    tracing::warn!(interface, error = %e, "source failed; siblings unaffected");
                    break;
                }
            }
        }
    }

    fn classify_loop(&self, interface: &str, rx: Receiver<PacketObservation>) {
        for obs in rx {
            self.process_packet(&obs);
        }
        tracing::debug!(interface, "classify loop drained");
    }

    /// Innermost error boundary: a failed classification call skips this
    /// observation only.
    fn process_packet(&self, obs: &PacketObservation) {
        let vector = self.normalizer.encode_packet(obs);
        match self.classifier.score(&vector) {
            Ok(score) => self.sink.report(&self.verdicts.classify_packet(obs, score)),
            Err(e) => tracing::warn!(
                source = %obs.interface,
                ts = %obs.ts,
                id = %obs.id,
                error = %e,
                "observation skipped"
            ),
        }
    }

    /// Counter mode: sample rounds until the stop flag is raised, scoring
    /// each round's interfaces as one batch.
    pub fn run_counter_loop(&self, sampler: &mut CounterSampler) {
        while !self.stop.load(Ordering::Relaxed) {
            let observations = sampler.sample_round(&self.stop);
            if observations.is_empty() {
                continue;
            }
            let vectors: Vec<_> = observations
                .iter()
                .map(|o| self.normalizer.encode_counters(o))
                .collect();
            match self.classifier.score_batch(&vectors) {
                Ok(scores) => {
                    for (obs, score) in observations.iter().zip(scores) {
                        self.sink.report(&self.verdicts.classify_counters(obs, score));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "counter round skipped");
                }
            }
        }
        tracing::info!("counter sampling stopped");
    }
}
