//! Verdict reporting. The console sink is the sole reporting surface of the
//! core: one line per verdict, format depending on the source variant.

use crate::verdict::{Verdict, VerdictLabel};
use std::io::Write;

/// Where verdicts go. Injected into the pipeline; tests use a collecting
/// sink, production uses [`ConsoleSink`].
pub trait ReportSink: Send + Sync {
    fn report(&self, verdict: &Verdict);
}

/// Prints one line per verdict to stdout:
/// `{ts}, {src}:{sport} -> {dst}:{dport}, Prediction: {label}` for packets,
/// `Interface: {name}, Traffic Prediction: {label}` for counter rounds.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn write_line(&self, verdict: &Verdict, w: &mut impl Write) {
        let line = match verdict.label {
            VerdictLabel::Packet(label) => format!(
                "{}, {}, Prediction: {}",
                verdict.ts.format("%Y-%m-%d %H:%M:%S"),
                verdict.summary,
                label
            ),
            VerdictLabel::Traffic(level) => {
                format!("Interface: {}, Traffic Prediction: {}", verdict.source, level)
            }
        };
        let _ = writeln!(w, "{line}");
    }
}

impl ReportSink for ConsoleSink {
    fn report(&self, verdict: &Verdict) {
        self.write_line(verdict, &mut std::io::stdout().lock());
    }
}
