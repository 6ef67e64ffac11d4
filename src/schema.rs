use std::fmt;

use serde::{Deserialize, Serialize};

use crate::harness::BenchConfig;

/// Timed step of a trial. `Prepare` is never timed; it only labels failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Prepare,
    Encoding,
    Decoding,
    EncodingHighVolume,
    DecodingHighVolume,
    Overall,
}

impl Phase {
    /// Phases in the order they are run and reported.
    pub const TIMED: [Phase; 5] = [
        Phase::Encoding,
        Phase::Decoding,
        Phase::EncodingHighVolume,
        Phase::DecodingHighVolume,
        Phase::Overall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Encoding => "encoding",
            Phase::Decoding => "decoding",
            Phase::EncodingHighVolume => "encoding-high-volume",
            Phase::DecodingHighVolume => "decoding-high-volume",
            Phase::Overall => "overall",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timing sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseMeasurement {
    pub phase: Phase,
    pub elapsed_ns: u128,
    /// Record volume the throughput is normalized by.
    pub records: u64,
    pub bytes_processed: u64,
    /// `None` when the elapsed time was too small to measure.
    pub throughput_mb_s: Option<f64>,
    /// Bytes the codec wrote to the sink (encode phases only).
    pub encoded_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: u32,
    pub phases: Vec<PhaseMeasurement>,
}

impl TrialResult {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseMeasurement> {
        self.phases.iter().find(|m| m.phase == phase)
    }
}

/// Everything measured for one codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecReport {
    pub codec: String,
    /// Only trials that passed the correctness gate.
    pub trials: Vec<TrialResult>,
    pub passed: bool,
    pub failure: Option<String>,
}

impl CodecReport {
    /// Every sample recorded for `phase`, in trial order.
    pub fn samples(&self, phase: Phase) -> impl Iterator<Item = &PhaseMeasurement> + '_ {
        self.trials.iter().filter_map(move |t| t.phase(phase))
    }
}

/// Encoded size of the fixture for one codec. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSizes {
    pub codec: String,
    pub single_bytes: u64,
    pub bulk_bytes: u64,
}

/// Output of the `fixture` subcommand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureInfo {
    pub record_size_shallow: u64,
    pub record_size_deep: u64,
    pub bulk_size: usize,
    pub wire: Vec<WireSizes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub profile: String,
    pub config: BenchConfig,
    pub record_size_bytes: u64,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub run: RunMeta,
    pub codecs: Vec<CodecReport>,
}
