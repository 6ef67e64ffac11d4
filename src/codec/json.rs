use std::io::Write;

use crate::fixture::DesiredLrp;

use super::{Codec, CodecError, Sink};

/// Text, self-describing. One JSON document per line.
#[derive(Debug, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&mut self, records: &[DesiredLrp], sink: &mut Sink) -> Result<(), CodecError> {
        serde_json::to_writer(&mut *sink, records)?;
        sink.write_all(b"\n")?;
        Ok(())
    }

    fn decode(&mut self, sink: &mut Sink) -> Result<Vec<DesiredLrp>, CodecError> {
        let (records, consumed) = {
            let mut stream =
                serde_json::Deserializer::from_slice(sink.unread()).into_iter::<Vec<DesiredLrp>>();
            let records = stream.next().ok_or(CodecError::Exhausted)??;
            (records, stream.byte_offset())
        };
        sink.consume(consumed);
        if sink.unread().first() == Some(&b'\n') {
            sink.consume(1);
        }
        Ok(records)
    }
}
