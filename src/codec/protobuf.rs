use prost::Message;

use crate::fixture::{Action, DesiredLrp, DownloadAction, EnvironmentVariable, RunAction, Route};

use super::{Codec, CodecError, Sink};

/// Schema-compiled messages mirroring [`DesiredLrp`].
mod wire {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DesiredLrpBatch {
        #[prost(message, repeated, tag = "1")]
        pub requests: Vec<DesiredLrp>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DesiredLrp {
        #[prost(string, tag = "1")]
        pub process_guid: String,
        #[prost(string, tag = "2")]
        pub domain: String,
        #[prost(string, tag = "3")]
        pub root_fs: String,
        #[prost(int32, tag = "4")]
        pub instances: i32,
        #[prost(int32, tag = "5")]
        pub memory_mb: i32,
        #[prost(int32, tag = "6")]
        pub disk_mb: i32,
        #[prost(bool, tag = "7")]
        pub privileged: bool,
        #[prost(string, tag = "8")]
        pub log_guid: String,
        #[prost(message, repeated, tag = "9")]
        pub routes: Vec<Route>,
        #[prost(uint32, repeated, tag = "10")]
        pub ports: Vec<u32>,
        #[prost(message, optional, tag = "11")]
        pub setup: Option<Action>,
        #[prost(message, optional, tag = "12")]
        pub action: Option<Action>,
        #[prost(message, optional, tag = "13")]
        pub monitor: Option<Action>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Route {
        #[prost(string, tag = "1")]
        pub route_type: String,
        #[prost(string, repeated, tag = "2")]
        pub hostnames: Vec<String>,
        #[prost(uint32, tag = "3")]
        pub port: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Action {
        #[prost(oneof = "action::Kind", tags = "1, 2")]
        pub kind: Option<action::Kind>,
    }

    pub mod action {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Kind {
            #[prost(message, tag = "1")]
            Download(super::DownloadAction),
            #[prost(message, tag = "2")]
            Run(super::RunAction),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DownloadAction {
        #[prost(string, tag = "1")]
        pub from: String,
        #[prost(string, tag = "2")]
        pub to: String,
        #[prost(string, optional, tag = "3")]
        pub cache_key: Option<String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RunAction {
        #[prost(string, tag = "1")]
        pub path: String,
        #[prost(string, repeated, tag = "2")]
        pub args: Vec<String>,
        #[prost(message, repeated, tag = "3")]
        pub env: Vec<EnvEntry>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct EnvEntry {
        #[prost(string, tag = "1")]
        pub key: String,
        #[prost(string, tag = "2")]
        pub value: String,
    }
}

/// Schema-compiled binary (protobuf), length-delimited on the sink.
///
/// Mapping between the record and its schema messages happens inside
/// `encode`/`decode`, so it is part of what gets timed.
#[derive(Debug, Default)]
pub struct ProtobufCodec {
    record_len_hint: usize,
}

impl ProtobufCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for ProtobufCodec {
    fn name(&self) -> &'static str {
        "protobuf"
    }

    /// Checks the record maps onto the schema and remembers its encoded
    /// length so bulk frames can be reserved up front.
    fn prepare(&mut self, template: &DesiredLrp) -> Result<(), CodecError> {
        let message = to_wire(template);
        let bytes = message.encode_to_vec();
        from_wire(wire::DesiredLrp::decode(bytes.as_slice())?)?;
        self.record_len_hint = bytes.len();
        Ok(())
    }

    fn encode(&mut self, records: &[DesiredLrp], sink: &mut Sink) -> Result<(), CodecError> {
        let batch = wire::DesiredLrpBatch {
            requests: records.iter().map(to_wire).collect(),
        };
        sink.reserve(self.record_len_hint.saturating_add(2) * records.len());
        batch.encode_length_delimited(sink.buffer_mut())?;
        Ok(())
    }

    fn decode(&mut self, sink: &mut Sink) -> Result<Vec<DesiredLrp>, CodecError> {
        if sink.is_drained() {
            return Err(CodecError::Exhausted);
        }
        let (batch, consumed) = {
            let mut unread = sink.unread();
            let before = unread.len();
            let batch = wire::DesiredLrpBatch::decode_length_delimited(&mut unread)?;
            (batch, before - unread.len())
        };
        sink.consume(consumed);
        batch.requests.into_iter().map(from_wire).collect()
    }
}

fn to_wire(lrp: &DesiredLrp) -> wire::DesiredLrp {
    wire::DesiredLrp {
        process_guid: lrp.process_guid.clone(),
        domain: lrp.domain.clone(),
        root_fs: lrp.root_fs.clone(),
        instances: lrp.instances,
        memory_mb: lrp.memory_mb,
        disk_mb: lrp.disk_mb,
        privileged: lrp.privileged,
        log_guid: lrp.log_guid.clone(),
        routes: lrp
            .routes
            .iter()
            .map(|r| wire::Route {
                route_type: r.route_type.clone(),
                hostnames: r.hostnames.clone(),
                port: u32::from(r.port),
            })
            .collect(),
        ports: lrp.ports.iter().copied().map(u32::from).collect(),
        setup: lrp.setup.as_ref().map(action_to_wire),
        action: lrp.action.as_ref().map(action_to_wire),
        monitor: lrp.monitor.as_ref().map(action_to_wire),
    }
}

fn action_to_wire(action: &Action) -> wire::Action {
    let kind = match action {
        Action::Download(d) => wire::action::Kind::Download(wire::DownloadAction {
            from: d.from.clone(),
            to: d.to.clone(),
            cache_key: d.cache_key.clone(),
        }),
        Action::Run(r) => wire::action::Kind::Run(wire::RunAction {
            path: r.path.clone(),
            args: r.args.clone(),
            env: r
                .env
                .iter()
                .map(|e| wire::EnvEntry {
                    key: e.name.clone(),
                    value: e.value.clone(),
                })
                .collect(),
        }),
    };
    wire::Action { kind: Some(kind) }
}

fn port_from_wire(port: u32) -> Result<u16, CodecError> {
    u16::try_from(port).map_err(|_| CodecError::Schema(format!("port {port} out of range")))
}

fn from_wire(msg: wire::DesiredLrp) -> Result<DesiredLrp, CodecError> {
    Ok(DesiredLrp {
        process_guid: msg.process_guid,
        domain: msg.domain,
        root_fs: msg.root_fs,
        instances: msg.instances,
        memory_mb: msg.memory_mb,
        disk_mb: msg.disk_mb,
        privileged: msg.privileged,
        log_guid: msg.log_guid,
        routes: msg
            .routes
            .into_iter()
            .map(|r| {
                Ok(Route {
                    route_type: r.route_type,
                    hostnames: r.hostnames,
                    port: port_from_wire(r.port)?,
                })
            })
            .collect::<Result<_, CodecError>>()?,
        ports: msg
            .ports
            .into_iter()
            .map(port_from_wire)
            .collect::<Result<_, _>>()?,
        setup: msg.setup.map(action_from_wire).transpose()?,
        action: msg.action.map(action_from_wire).transpose()?,
        monitor: msg.monitor.map(action_from_wire).transpose()?,
    })
}

fn action_from_wire(msg: wire::Action) -> Result<Action, CodecError> {
    match msg.kind {
        Some(wire::action::Kind::Download(d)) => Ok(Action::Download(DownloadAction {
            from: d.from,
            to: d.to,
            cache_key: d.cache_key,
        })),
        Some(wire::action::Kind::Run(r)) => Ok(Action::Run(RunAction {
            path: r.path,
            args: r.args,
            env: r
                .env
                .into_iter()
                .map(|e| EnvironmentVariable {
                    name: e.key,
                    value: e.value,
                })
                .collect(),
        })),
        None => Err(CodecError::Schema("action without a kind".to_string())),
    }
}
