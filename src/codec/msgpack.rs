use crate::fixture::DesiredLrp;

use super::{Codec, CodecError, Sink};

/// Tagged binary (MessagePack).
///
/// `named` writes structs as field-keyed maps, which keeps the stream
/// self-describing; `compact` writes them as positional arrays.
#[derive(Debug)]
pub struct MsgPackCodec {
    named: bool,
}

impl MsgPackCodec {
    pub fn named() -> Self {
        Self { named: true }
    }

    pub fn compact() -> Self {
        Self { named: false }
    }
}

impl Default for MsgPackCodec {
    fn default() -> Self {
        Self::named()
    }
}

impl Codec for MsgPackCodec {
    fn name(&self) -> &'static str {
        if self.named {
            "msgpack"
        } else {
            "msgpack-compact"
        }
    }

    fn encode(&mut self, records: &[DesiredLrp], sink: &mut Sink) -> Result<(), CodecError> {
        if self.named {
            rmp_serde::encode::write_named(sink, records)?;
        } else {
            rmp_serde::encode::write(sink, records)?;
        }
        Ok(())
    }

    fn decode(&mut self, sink: &mut Sink) -> Result<Vec<DesiredLrp>, CodecError> {
        if sink.is_drained() {
            return Err(CodecError::Exhausted);
        }
        Ok(rmp_serde::decode::from_read(sink)?)
    }
}
