use clap::ValueEnum;

pub mod codec;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod gate;
pub mod harness;
pub mod report;
pub mod schema;

use codec::{BincodeCodec, Codec, JsonCodec, MsgPackCodec, ProtobufCodec};

/// Wire format(s) to benchmark.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum CodecKind {
    /// Every format below, in this order.
    #[default]
    All,
    /// Text, self-describing (serde_json).
    Json,
    /// Tagged binary with field names (MessagePack).
    Msgpack,
    /// Tagged binary with positional fields (MessagePack).
    MsgpackCompact,
    /// Compact untagged binary (bincode).
    Bincode,
    /// Schema-compiled binary (protobuf via prost).
    Protobuf,
}

impl CodecKind {
    const CONCRETE: [CodecKind; 5] = [
        CodecKind::Json,
        CodecKind::Msgpack,
        CodecKind::MsgpackCompact,
        CodecKind::Bincode,
        CodecKind::Protobuf,
    ];

    fn build(self) -> Option<Box<dyn Codec + Send>> {
        match self {
            CodecKind::All => None,
            CodecKind::Json => Some(Box::new(JsonCodec::new())),
            CodecKind::Msgpack => Some(Box::new(MsgPackCodec::named())),
            CodecKind::MsgpackCompact => Some(Box::new(MsgPackCodec::compact())),
            CodecKind::Bincode => Some(Box::new(BincodeCodec::new())),
            CodecKind::Protobuf => Some(Box::new(ProtobufCodec::new())),
        }
    }
}

/// Instantiate the selected codecs, deduplicated, in canonical order.
/// An empty selection means all of them.
pub fn codecs_for(selection: &[CodecKind]) -> Vec<Box<dyn Codec + Send>> {
    let all = selection.is_empty() || selection.contains(&CodecKind::All);
    CodecKind::CONCRETE
        .into_iter()
        .filter(|kind| all || selection.contains(kind))
        .filter_map(CodecKind::build)
        .collect()
}
