//! Four-phase measurement protocol, run identically against every codec.
//!
//! Per trial: single-record encode loop, single-record decode loop, bulk
//! encode, bulk decode. Phases are strictly sequential. The correctness gate
//! runs after each decode phase and its time is excluded from `overall`.

use std::hint::black_box;
use std::slice;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::codec::{Codec, CodecError, Sink};
use crate::error::{BenchError, ConfigError};
use crate::fixture::Fixture;
use crate::gate;
use crate::harness::{throughput_mb_s, time_with, BenchConfig, Clock, MonotonicClock};
use crate::schema::{CodecReport, Phase, PhaseMeasurement, TrialResult, WireSizes};

pub struct Driver<'f, C = MonotonicClock> {
    fixture: &'f Fixture,
    iterations: u64,
    trials: u32,
    clock: C,
}

impl<'f> Driver<'f, MonotonicClock> {
    pub fn new(fixture: &'f Fixture, config: &BenchConfig) -> Result<Self, ConfigError> {
        Self::with_clock(fixture, config, MonotonicClock::new())
    }
}

impl<'f, C: Clock> Driver<'f, C> {
    pub fn with_clock(
        fixture: &'f Fixture,
        config: &BenchConfig,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            fixture,
            iterations: config.iterations,
            trials: config.trials,
            clock,
        })
    }

    /// Prepare `codec`, then run every trial until one fails.
    pub fn run_codec<K: Codec + ?Sized>(&self, codec: &mut K) -> CodecReport {
        let name = codec.name();
        info!(
            codec = name,
            trials = self.trials,
            iterations = self.iterations,
            "benchmarking"
        );

        let mut sink = Sink::new();
        let mut report = CodecReport {
            codec: name.to_string(),
            trials: Vec::with_capacity(self.trials as usize),
            passed: true,
            failure: None,
        };

        let outcome = self
            .prepare(codec, &mut sink)
            .and_then(|()| self.run_trials(codec, &mut sink, &mut report.trials));

        if let Err(e) = outcome {
            error!(
                codec = name,
                phase = %e.phase(),
                iteration = e.iteration(),
                error = %e,
                "codec abandoned"
            );
            report.passed = false;
            report.failure = Some(e.to_string());
        } else {
            info!(codec = name, trials = report.trials.len(), "done");
        }
        report
    }

    /// Codecs one after another, in the given order.
    pub fn run_all(&self, codecs: &mut [Box<dyn Codec + Send>]) -> Vec<CodecReport> {
        codecs.iter_mut().map(|c| self.run_codec(c.as_mut())).collect()
    }

    /// Codecs concurrently. Each codec keeps its own sink and sequential phases.
    pub fn run_parallel(&self, codecs: &mut [Box<dyn Codec + Send>]) -> Vec<CodecReport>
    where
        C: Sync,
    {
        codecs.par_iter_mut().map(|c| self.run_codec(c.as_mut())).collect()
    }

    fn run_trials<K: Codec + ?Sized>(
        &self,
        codec: &mut K,
        sink: &mut Sink,
        out: &mut Vec<TrialResult>,
    ) -> Result<(), BenchError> {
        for trial in 1..=self.trials {
            let result = self.run_trial(codec, sink, trial)?;
            if let Some(overall) = result.phase(Phase::Overall) {
                debug!(
                    codec = codec.name(),
                    trial,
                    elapsed_ns = overall.elapsed_ns as u64,
                    throughput_mb_s = ?overall.throughput_mb_s,
                    "trial finished"
                );
            }
            out.push(result);
        }
        Ok(())
    }

    /// Untimed setup: the codec's own `prepare`, then one setup round-trip.
    pub fn prepare<K: Codec + ?Sized>(
        &self,
        codec: &mut K,
        sink: &mut Sink,
    ) -> Result<(), BenchError> {
        let template = &self.fixture.template;
        codec
            .prepare(template)
            .map_err(|source| encode_failure(codec.name(), Phase::Prepare, 0, source))?;

        sink.reset();
        codec
            .encode(slice::from_ref(template), sink)
            .map_err(|source| encode_failure(codec.name(), Phase::Prepare, 0, source))?;
        let decoded = codec
            .decode(sink)
            .map_err(|source| decode_failure(codec.name(), Phase::Prepare, 0, source))?;
        gate::check_single(template, &decoded)
            .and_then(|()| check_drained(sink))
            .map_err(|detail| violation(codec.name(), Phase::Prepare, 0, detail))?;
        sink.reset();
        Ok(())
    }

    /// One full four-phase run. Any failure aborts the trial without numbers.
    pub fn run_trial<K: Codec + ?Sized>(
        &self,
        codec: &mut K,
        sink: &mut Sink,
        trial: u32,
    ) -> Result<TrialResult, BenchError> {
        let name = codec.name();
        let template = &self.fixture.template;
        let bulk = self.fixture.bulk.as_slice();
        let iterations = self.iterations;
        let bulk_len = bulk.len() as u64;

        let mut phases = Vec::with_capacity(Phase::TIMED.len());
        let mut gate_time = Duration::ZERO;

        sink.reset();
        let overall_start = self.clock.now();

        // Single-record encode loop. Frames accumulate for the decode loop.
        let (res, elapsed) = time_with(&self.clock, || {
            for i in 0..iterations {
                codec
                    .encode(slice::from_ref(template), sink)
                    .map_err(|source| encode_failure(name, Phase::Encoding, i, source))?;
            }
            Ok::<(), BenchError>(())
        });
        res?;
        phases.push(self.measurement(
            name,
            Phase::Encoding,
            iterations,
            elapsed,
            Some(sink.written()),
        ));

        // Single-record decode loop, reading the frames back in order.
        let (res, elapsed) = time_with(&self.clock, || {
            let mut last = Vec::new();
            for i in 0..iterations {
                last = black_box(
                    codec
                        .decode(sink)
                        .map_err(|source| decode_failure(name, Phase::Decoding, i, source))?,
                );
            }
            Ok::<_, BenchError>(last)
        });
        let last = res?;
        phases.push(self.measurement(name, Phase::Decoding, iterations, elapsed, None));

        let (checked, spent) = time_with(&self.clock, || {
            gate::check_single(template, &last).and_then(|()| check_drained(sink))
        });
        gate_time += spent;
        checked.map_err(|detail| violation(name, Phase::Decoding, iterations - 1, detail))?;

        sink.reset();

        let (res, elapsed) = time_with(&self.clock, || {
            codec
                .encode(bulk, sink)
                .map_err(|source| encode_failure(name, Phase::EncodingHighVolume, 0, source))
        });
        res?;
        phases.push(self.measurement(
            name,
            Phase::EncodingHighVolume,
            bulk_len,
            elapsed,
            Some(sink.written()),
        ));

        let (res, elapsed) = time_with(&self.clock, || {
            codec
                .decode(sink)
                .map_err(|source| decode_failure(name, Phase::DecodingHighVolume, 0, source))
        });
        let decoded = res?;
        phases.push(self.measurement(name, Phase::DecodingHighVolume, bulk_len, elapsed, None));

        let (checked, spent) = time_with(&self.clock, || {
            gate::check_bulk(template, bulk.len(), &decoded).and_then(|()| check_drained(sink))
        });
        gate_time += spent;
        checked.map_err(|detail| violation(name, Phase::DecodingHighVolume, 0, detail))?;

        let overall = self
            .clock
            .now()
            .saturating_sub(overall_start)
            .saturating_sub(gate_time);
        let overall_records = 2 * (iterations + bulk_len);
        phases.push(self.measurement(name, Phase::Overall, overall_records, overall, None));

        sink.reset();
        Ok(TrialResult { trial, phases })
    }

    /// Encoded size of the template and of the bulk collection. Untimed.
    pub fn wire_sizes<K: Codec + ?Sized>(&self, codec: &mut K) -> Result<WireSizes, BenchError> {
        let name = codec.name();
        let mut sink = Sink::new();
        self.prepare(codec, &mut sink)?;

        codec
            .encode(slice::from_ref(&self.fixture.template), &mut sink)
            .map_err(|source| encode_failure(name, Phase::Encoding, 0, source))?;
        let single_bytes = sink.written() as u64;

        sink.reset();
        codec
            .encode(&self.fixture.bulk, &mut sink)
            .map_err(|source| encode_failure(name, Phase::EncodingHighVolume, 0, source))?;

        Ok(WireSizes {
            codec: name.to_string(),
            single_bytes,
            bulk_bytes: sink.written() as u64,
        })
    }

    fn measurement(
        &self,
        codec: &str,
        phase: Phase,
        records: u64,
        elapsed: Duration,
        encoded_bytes: Option<usize>,
    ) -> PhaseMeasurement {
        let bytes_processed = records.saturating_mul(self.fixture.record_size);
        let throughput = throughput_mb_s(bytes_processed, elapsed);
        if throughput.is_none() {
            warn!(codec, phase = %phase, "elapsed below clock resolution, throughput unmeasurable");
        }
        PhaseMeasurement {
            phase,
            elapsed_ns: elapsed.as_nanos(),
            records,
            bytes_processed,
            throughput_mb_s: throughput,
            encoded_bytes: encoded_bytes.map(|b| b as u64),
        }
    }
}

fn check_drained(sink: &Sink) -> Result<(), String> {
    match sink.unread().len() {
        0 => Ok(()),
        n => Err(format!("{n} bytes left unread on the sink")),
    }
}

fn encode_failure(codec: &str, phase: Phase, iteration: u64, source: CodecError) -> BenchError {
    BenchError::EncodeFailure {
        codec: codec.to_string(),
        phase,
        iteration,
        source,
    }
}

fn decode_failure(codec: &str, phase: Phase, iteration: u64, source: CodecError) -> BenchError {
    BenchError::DecodeFailure {
        codec: codec.to_string(),
        phase,
        iteration,
        source,
    }
}

fn violation(codec: &str, phase: Phase, iteration: u64, detail: String) -> BenchError {
    BenchError::CorrectnessViolation {
        codec: codec.to_string(),
        phase,
        iteration,
        detail,
    }
}
