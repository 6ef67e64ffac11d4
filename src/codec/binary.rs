use crate::fixture::DesiredLrp;

use super::{Codec, CodecError, Sink};

/// Compact untagged binary (bincode). Field order is the only schema.
#[derive(Debug, Default)]
pub struct BincodeCodec;

impl BincodeCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&mut self, records: &[DesiredLrp], sink: &mut Sink) -> Result<(), CodecError> {
        bincode::serialize_into(sink, records)?;
        Ok(())
    }

    fn decode(&mut self, sink: &mut Sink) -> Result<Vec<DesiredLrp>, CodecError> {
        if sink.is_drained() {
            return Err(CodecError::Exhausted);
        }
        Ok(bincode::deserialize_from(sink)?)
    }
}
