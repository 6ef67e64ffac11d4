use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use encoding_bench::driver::Driver;
use encoding_bench::fixture::{measure_size, Fixture, SizeMode};
use encoding_bench::harness::{BenchConfig, Profile};
use encoding_bench::report::{render_fixture_text, render_json, render_text};
use encoding_bench::schema::{BenchReport, FixtureInfo, RunMeta};
use encoding_bench::{codecs_for, CodecKind};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Quick,
    Full,
}

impl From<ProfileArg> for Profile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Quick => Profile::Quick,
            ProfileArg::Full => Profile::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the four-phase protocol against each selected codec.
    Run {
        /// Codec(s) to benchmark. Can be provided multiple times.
        #[arg(short, long, value_enum, num_args = 1.., action = clap::ArgAction::Append)]
        codec: Vec<CodecKind>,

        /// Single-record loop count. Defaults to the profile's value.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        iterations: Option<u64>,

        /// Records in the bulk collection. Defaults to the profile's value.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        bulk_size: Option<u64>,

        /// Trials per codec. Defaults to the profile's value.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        trials: Option<u32>,

        /// How the per-record size used for throughput is computed.
        #[arg(long, value_enum, default_value_t = SizeMode::Shallow)]
        size_mode: SizeMode,

        /// Benchmark codecs concurrently (phases within a codec stay sequential).
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },

    /// Show record sizes and per-codec encoded sizes for the fixture.
    Fixture {
        #[arg(short, long, value_enum, num_args = 1.., action = clap::ArgAction::Append)]
        codec: Vec<CodecKind>,

        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        bulk_size: Option<u64>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "encoding-bench")]
#[command(about = "Encode/decode throughput comparison across wire formats")]
struct Args {
    #[arg(long, value_enum, default_value_t = ProfileArg::Full, global = true)]
    profile: ProfileArg,

    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Where to write the report. If omitted, prints to stdout.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

fn now_utc_unix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    // Set by CI/build scripts when available.
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn emit(out: Option<&PathBuf>, rendered: String) -> Result<()> {
    match out {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing report to {}", path.display())),
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encoding_bench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let profile: Profile = args.profile.into();
    let mut cfg = BenchConfig::from_profile(profile);

    match args.cmd {
        Command::Run {
            codec,
            iterations,
            bulk_size,
            trials,
            size_mode,
            parallel,
        } => {
            if let Some(i) = iterations {
                cfg.iterations = i;
            }
            if let Some(n) = bulk_size {
                cfg.bulk_size = usize::try_from(n).context("--bulk-size too large")?;
            }
            if let Some(t) = trials {
                cfg.trials = t;
            }
            cfg.size_mode = size_mode;

            let fixture = Fixture::build(cfg.bulk_size, cfg.size_mode);
            tracing::info!(
                record_size = fixture.record_size,
                size_mode = fixture.size_mode.as_str(),
                bulk_size = fixture.bulk_size(),
                "fixture built"
            );

            let driver = Driver::new(&fixture, &cfg)?;
            let mut codecs = codecs_for(&codec);
            let reports = if parallel {
                driver.run_parallel(&mut codecs)
            } else {
                driver.run_all(&mut codecs)
            };

            let report = BenchReport {
                run: RunMeta {
                    schema_version: 1,
                    bench_version: env!("CARGO_PKG_VERSION").to_string(),
                    profile: profile.as_str().to_string(),
                    config: cfg,
                    record_size_bytes: fixture.record_size,
                    timestamp_utc: now_utc_unix(),
                    git_sha: git_sha_short(),
                },
                codecs: reports,
            };

            let rendered = match args.format {
                Format::Text => render_text(&report),
                Format::Json => render_json(&report)?,
            };
            emit(args.out.as_ref(), rendered)?;

            let failed: Vec<&str> = report
                .codecs
                .iter()
                .filter(|c| !c.passed)
                .map(|c| c.codec.as_str())
                .collect();
            if !failed.is_empty() {
                bail!("codec(s) failed: {}", failed.join(", "));
            }
        }
        Command::Fixture { codec, bulk_size } => {
            let bulk_size = match bulk_size {
                Some(n) => usize::try_from(n).context("--bulk-size too large")?,
                None => cfg.bulk_size,
            };
            let fixture = Fixture::build(bulk_size, SizeMode::Shallow);
            cfg.bulk_size = bulk_size;
            let driver = Driver::new(&fixture, &cfg)?;

            let mut wire = Vec::new();
            for mut c in codecs_for(&codec) {
                wire.push(driver.wire_sizes(c.as_mut())?);
            }

            let info = FixtureInfo {
                record_size_shallow: measure_size(&fixture.template, SizeMode::Shallow),
                record_size_deep: measure_size(&fixture.template, SizeMode::Deep),
                bulk_size: fixture.bulk_size(),
                wire,
            };

            let rendered = match args.format {
                Format::Text => render_fixture_text(&info),
                Format::Json => render_json(&info)?,
            };
            emit(args.out.as_ref(), rendered)?;
        }
    }

    Ok(())
}
