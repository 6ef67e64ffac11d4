//! Codec adapters: one wire format each, driven uniformly through [`Codec`].

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::fixture::DesiredLrp;

mod binary;
mod json;
mod msgpack;
mod protobuf;

#[cfg(test)]
pub(crate) mod testing;

pub use binary::BincodeCodec;
pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;
pub use protobuf::ProtobufCodec;

/// Failures raised by a codec while encoding or decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("msgpack encode: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("msgpack decode: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("protobuf encode: {0}")]
    ProtobufEncode(#[from] prost::EncodeError),

    #[error("protobuf decode: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),

    #[error("i/o: {0}")]
    Io(#[from] io::Error),

    /// Decode was called with nothing left to read.
    #[error("sink exhausted")]
    Exhausted,

    /// Payload parsed but does not map onto the record.
    #[error("schema: {0}")]
    Schema(String),
}

/// Append-only byte buffer with a read cursor.
///
/// Encoders append frames; decoders consume them in the order written.
#[derive(Debug, Default)]
pub struct Sink {
    buf: Vec<u8>,
    read_pos: usize,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all written and unread bytes. Keeps the allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.read_pos = 0;
    }

    /// Total bytes written since the last reset.
    pub fn written(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written but not yet consumed.
    pub fn unread(&self) -> &[u8] {
        &self.buf[self.read_pos..]
    }

    pub fn is_drained(&self) -> bool {
        self.read_pos == self.buf.len()
    }

    /// Mark `n` unread bytes as consumed.
    pub fn consume(&mut self, n: usize) {
        self.read_pos = (self.read_pos + n).min(self.buf.len());
    }

    /// Direct access to the write side for encoders that take a `BufMut`.
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    pub fn reserve(&mut self, additional: usize) {
        self.buf.reserve(additional);
    }
}

impl Write for Sink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for Sink {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut unread = self.unread();
        let n = unread.read(out)?;
        self.read_pos += n;
        Ok(n)
    }
}

/// A wire format under test.
///
/// Single-record operations pass a one-element slice; bulk operations pass the
/// whole collection. Each `encode` appends one frame to the sink and each
/// `decode` consumes exactly one.
pub trait Codec {
    fn name(&self) -> &'static str;

    /// One-time setup, called once before any timed phase.
    fn prepare(&mut self, _template: &DesiredLrp) -> Result<(), CodecError> {
        Ok(())
    }

    fn encode(&mut self, records: &[DesiredLrp], sink: &mut Sink) -> Result<(), CodecError>;

    fn decode(&mut self, sink: &mut Sink) -> Result<Vec<DesiredLrp>, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{build_bulk, build_template};

    fn all_codecs() -> Vec<Box<dyn Codec + Send>> {
        vec![
            Box::new(JsonCodec::new()),
            Box::new(MsgPackCodec::named()),
            Box::new(MsgPackCodec::compact()),
            Box::new(BincodeCodec::new()),
            Box::new(ProtobufCodec::new()),
        ]
    }

    #[test]
    fn test_sink_read_write_reset() {
        let mut sink = Sink::new();
        sink.write_all(b"hello world").unwrap();
        assert_eq!(sink.written(), 11);

        let mut head = [0u8; 5];
        sink.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"hello");
        assert_eq!(sink.unread(), b" world");

        sink.consume(100);
        assert!(sink.is_drained());

        sink.reset();
        assert_eq!(sink.written(), 0);
        assert!(sink.is_drained());
    }

    #[test]
    fn test_roundtrip_identity() {
        let template = build_template();
        for mut codec in all_codecs() {
            let mut sink = Sink::new();
            codec.prepare(&template).unwrap();
            codec.encode(std::slice::from_ref(&template), &mut sink).unwrap();
            let decoded = codec.decode(&mut sink).unwrap();

            assert_eq!(decoded, vec![template.clone()], "codec {}", codec.name());
            assert!(sink.is_drained(), "codec {} left bytes behind", codec.name());
        }
    }

    #[test]
    fn test_bulk_roundtrip_preserves_count_and_order() {
        let template = build_template();
        let mut bulk = build_bulk(&template, 64);
        bulk[63].instances = 7;

        for mut codec in all_codecs() {
            let mut sink = Sink::new();
            codec.encode(&bulk, &mut sink).unwrap();
            let decoded = codec.decode(&mut sink).unwrap();

            assert_eq!(decoded.len(), bulk.len(), "codec {}", codec.name());
            assert_eq!(decoded[0], template, "codec {}", codec.name());
            assert_eq!(decoded[63].instances, 7, "codec {}", codec.name());
        }
    }

    #[test]
    fn test_frames_are_read_in_write_order() {
        let template = build_template();
        let mut second = template.clone();
        second.process_guid = "other-guid".to_string();

        for mut codec in all_codecs() {
            let mut sink = Sink::new();
            codec.encode(std::slice::from_ref(&template), &mut sink).unwrap();
            codec.encode(std::slice::from_ref(&second), &mut sink).unwrap();

            assert_eq!(codec.decode(&mut sink).unwrap()[0], template, "codec {}", codec.name());
            assert_eq!(codec.decode(&mut sink).unwrap()[0], second, "codec {}", codec.name());
            assert!(sink.is_drained(), "codec {}", codec.name());
        }
    }

    #[test]
    fn test_decode_on_empty_sink_fails() {
        for mut codec in all_codecs() {
            let mut sink = Sink::new();
            assert!(codec.decode(&mut sink).is_err(), "codec {}", codec.name());
        }
    }

    #[test]
    fn test_decode_truncated_frame_fails() {
        let template = build_template();
        for mut codec in all_codecs() {
            let mut full = Sink::new();
            codec.encode(std::slice::from_ref(&template), &mut full).unwrap();

            let mut truncated = Sink::new();
            let half = full.written() / 2;
            truncated.write_all(&full.unread()[..half]).unwrap();
            assert!(codec.decode(&mut truncated).is_err(), "codec {}", codec.name());
        }
    }
}
