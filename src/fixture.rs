//! Benchmark fixture: one canonical deployment record plus its bulk replication.
//!
//! The record models a desired long-running process (routing, ports, and a
//! setup/run/monitor action chain). Codecs treat it as an opaque payload; the
//! harness only cares about its equality and its in-memory size.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::mem::size_of;

/// Desired long-running process: the record every codec is measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredLrp {
    pub process_guid: String,
    pub domain: String,
    pub root_fs: String,
    pub instances: i32,
    pub memory_mb: i32,
    pub disk_mb: i32,
    pub privileged: bool,
    pub log_guid: String,
    pub routes: Vec<Route>,
    pub ports: Vec<u16>,
    pub setup: Option<Action>,
    pub action: Option<Action>,
    pub monitor: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub route_type: String,
    pub hostnames: Vec<String>,
    pub port: u16,
}

/// A step in the process lifecycle. Closed set; every codec encodes the
/// discriminator explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Download(DownloadAction),
    Run(RunAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAction {
    pub from: String,
    pub to: String,
    pub cache_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAction {
    pub path: String,
    pub args: Vec<String>,
    pub env: Vec<EnvironmentVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

/// How the per-record size used as the throughput denominator is computed.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeMode {
    /// Inline footprint of the record type only.
    #[default]
    Shallow,
    /// Inline footprint plus heap bytes owned by strings, vectors and sub-records.
    Deep,
}

impl SizeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeMode::Shallow => "shallow",
            SizeMode::Deep => "deep",
        }
    }
}

/// Heap bytes owned by a value, excluding its own inline size.
///
/// Uses lengths rather than capacities so that clones report the same size as
/// the value they were cloned from.
pub trait HeapSize {
    fn heap_size(&self) -> usize;
}

impl HeapSize for String {
    fn heap_size(&self) -> usize {
        self.len()
    }
}

impl HeapSize for u16 {
    fn heap_size(&self) -> usize {
        0
    }
}

impl<T: HeapSize> HeapSize for Vec<T> {
    fn heap_size(&self) -> usize {
        self.len() * size_of::<T>() + self.iter().map(HeapSize::heap_size).sum::<usize>()
    }
}

impl<T: HeapSize> HeapSize for Option<T> {
    fn heap_size(&self) -> usize {
        self.as_ref().map_or(0, HeapSize::heap_size)
    }
}

impl HeapSize for EnvironmentVariable {
    fn heap_size(&self) -> usize {
        self.name.heap_size() + self.value.heap_size()
    }
}

impl HeapSize for Route {
    fn heap_size(&self) -> usize {
        self.route_type.heap_size() + self.hostnames.heap_size()
    }
}

impl HeapSize for Action {
    fn heap_size(&self) -> usize {
        match self {
            Action::Download(d) => d.from.heap_size() + d.to.heap_size() + d.cache_key.heap_size(),
            Action::Run(r) => r.path.heap_size() + r.args.heap_size() + r.env.heap_size(),
        }
    }
}

impl HeapSize for DesiredLrp {
    fn heap_size(&self) -> usize {
        self.process_guid.heap_size()
            + self.domain.heap_size()
            + self.root_fs.heap_size()
            + self.log_guid.heap_size()
            + self.routes.heap_size()
            + self.ports.heap_size()
            + self.setup.heap_size()
            + self.action.heap_size()
            + self.monitor.heap_size()
    }
}

/// Build the canonical record.
///
/// Covers scalar fields, nested records, repeated fields, optional sub-records
/// and both action variants.
pub fn build_template() -> DesiredLrp {
    DesiredLrp {
        process_guid: "some-guid".to_string(),
        domain: "some-domain".to_string(),
        root_fs: "preloaded:some-rootfs".to_string(),
        instances: 5,
        memory_mb: 256,
        disk_mb: 1024,
        privileged: true,
        log_guid: "some-log-guid".to_string(),
        routes: vec![Route {
            route_type: "cf-router".to_string(),
            hostnames: vec!["some-host".to_string()],
            port: 8080,
        }],
        ports: vec![8080],
        setup: Some(Action::Download(DownloadAction {
            from: "http://some-url/v1/static/lrp.zip".to_string(),
            to: ".".to_string(),
            cache_key: None,
        })),
        action: Some(Action::Run(RunAction {
            path: "bash".to_string(),
            args: vec!["server.sh".to_string()],
            env: vec![EnvironmentVariable {
                name: "PORT".to_string(),
                value: "8080".to_string(),
            }],
        })),
        monitor: Some(Action::Run(RunAction {
            path: "true".to_string(),
            args: Vec::new(),
            env: Vec::new(),
        })),
    }
}

/// `n` independent deep copies of `template`.
pub fn build_bulk(template: &DesiredLrp, n: usize) -> Vec<DesiredLrp> {
    vec![template.clone(); n]
}

/// Per-record size in bytes, used only as the throughput denominator.
pub fn measure_size(template: &DesiredLrp, mode: SizeMode) -> u64 {
    let inline = size_of::<DesiredLrp>();
    let total = match mode {
        SizeMode::Shallow => inline,
        SizeMode::Deep => inline + template.heap_size(),
    };
    total as u64
}

/// The first field (dotted path) where `a` and `b` differ, if any.
pub fn first_difference(a: &DesiredLrp, b: &DesiredLrp) -> Option<String> {
    macro_rules! check {
        ($field:ident) => {
            if a.$field != b.$field {
                return Some(stringify!($field).to_string());
            }
        };
    }

    check!(process_guid);
    check!(domain);
    check!(root_fs);
    check!(instances);
    check!(memory_mb);
    check!(disk_mb);
    check!(privileged);
    check!(log_guid);
    check!(routes);
    check!(ports);

    for (name, x, y) in [
        ("setup", &a.setup, &b.setup),
        ("action", &a.action, &b.action),
        ("monitor", &a.monitor, &b.monitor),
    ] {
        if let Some(path) = action_difference(x, y) {
            return Some(format!("{name}{path}"));
        }
    }
    None
}

fn action_difference(a: &Option<Action>, b: &Option<Action>) -> Option<String> {
    match (a, b) {
        (Some(Action::Download(x)), Some(Action::Download(y))) => {
            let field = if x.from != y.from {
                "from"
            } else if x.to != y.to {
                "to"
            } else if x.cache_key != y.cache_key {
                "cache_key"
            } else {
                return None;
            };
            Some(format!(".download.{field}"))
        }
        (Some(Action::Run(x)), Some(Action::Run(y))) => {
            let field = if x.path != y.path {
                "path"
            } else if x.args != y.args {
                "args"
            } else if x.env != y.env {
                "env"
            } else {
                return None;
            };
            Some(format!(".run.{field}"))
        }
        (None, None) => None,
        _ => Some(String::new()),
    }
}

/// Template, bulk collection and record size, built once per run.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub template: DesiredLrp,
    pub bulk: Vec<DesiredLrp>,
    pub record_size: u64,
    pub size_mode: SizeMode,
}

impl Fixture {
    pub fn build(bulk_size: usize, size_mode: SizeMode) -> Self {
        let template = build_template();
        let bulk = build_bulk(&template, bulk_size);
        let record_size = measure_size(&template, size_mode);
        Self {
            template,
            bulk,
            record_size,
            size_mode,
        }
    }

    pub fn bulk_size(&self) -> usize {
        self.bulk.len()
    }
}
