//! Human-readable and JSON rendering of benchmark results.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;

use crate::schema::{BenchReport, CodecReport, FixtureInfo, Phase};

/// Mean over the samples of one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub samples: usize,
    pub mean_elapsed_ns: f64,
    /// Mean over measurable samples only; `None` if there were none.
    pub mean_throughput_mb_s: Option<f64>,
}

pub fn summarize(codec: &CodecReport) -> Vec<PhaseSummary> {
    Phase::TIMED
        .iter()
        .filter_map(|&phase| {
            let samples: Vec<_> = codec.samples(phase).collect();
            if samples.is_empty() {
                return None;
            }
            let mean_elapsed_ns =
                samples.iter().map(|m| m.elapsed_ns as f64).sum::<f64>() / samples.len() as f64;
            let measurable: Vec<f64> = samples.iter().filter_map(|m| m.throughput_mb_s).collect();
            let mean_throughput_mb_s = (!measurable.is_empty())
                .then(|| measurable.iter().sum::<f64>() / measurable.len() as f64);
            Some(PhaseSummary {
                phase,
                samples: samples.len(),
                mean_elapsed_ns,
                mean_throughput_mb_s,
            })
        })
        .collect()
}

pub fn render_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

fn format_elapsed(ns: f64) -> String {
    let d = Duration::from_nanos(ns.max(0.0) as u64);
    if d >= Duration::from_secs(1) {
        format!("{:.3} s", d.as_secs_f64())
    } else if d >= Duration::from_millis(1) {
        format!("{:.3} ms", d.as_secs_f64() * 1e3)
    } else {
        format!("{:.3} us", d.as_secs_f64() * 1e6)
    }
}

fn format_throughput(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2} MB/s"),
        None => "unmeasurable".to_string(),
    }
}

/// Per codec: every phase with its per-trial samples followed by the mean.
pub fn render_text(report: &BenchReport) -> String {
    let mut out = String::new();
    let cfg = &report.run.config;
    let _ = writeln!(
        out,
        "encoding-bench {} | profile {} | I={} N={} trials={} | record size {} B ({})",
        report.run.bench_version,
        report.run.profile,
        cfg.iterations,
        cfg.bulk_size,
        cfg.trials,
        report.run.record_size_bytes,
        cfg.size_mode.as_str(),
    );

    for codec in &report.codecs {
        let status = if codec.passed { "passed" } else { "FAILED" };
        let _ = writeln!(
            out,
            "\n{} ({} trials, {})",
            codec.codec,
            codec.trials.len(),
            status
        );
        if let Some(failure) = &codec.failure {
            let _ = writeln!(out, "  error: {failure}");
        }

        for summary in summarize(codec) {
            for trial in &codec.trials {
                let Some(m) = trial.phase(summary.phase) else {
                    continue;
                };
                let _ = writeln!(
                    out,
                    "  {:<22} {:>6} {:>14} {:>18}",
                    summary.phase.as_str(),
                    format!("#{}", trial.trial),
                    format_elapsed(m.elapsed_ns as f64),
                    format_throughput(m.throughput_mb_s),
                );
            }
            let _ = writeln!(
                out,
                "  {:<22} {:>6} {:>14} {:>18}",
                summary.phase.as_str(),
                "mean",
                format_elapsed(summary.mean_elapsed_ns),
                format_throughput(summary.mean_throughput_mb_s),
            );
        }
    }
    out
}

pub fn render_fixture_text(info: &FixtureInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "record size (shallow): {} B", info.record_size_shallow);
    let _ = writeln!(out, "record size (deep):    {} B", info.record_size_deep);
    let _ = writeln!(out, "bulk size:             {} records", info.bulk_size);
    let _ = writeln!(out, "\n  {:<16} {:>14} {:>14}", "codec", "single", "bulk");
    for w in &info.wire {
        let _ = writeln!(
            out,
            "  {:<16} {:>12} B {:>12} B",
            w.codec, w.single_bytes, w.bulk_bytes
        );
    }
    out
}
