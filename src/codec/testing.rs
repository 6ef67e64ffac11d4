//! Stub codecs and a hand-driven clock for driver tests.

use std::cell::Cell;
use std::io::{Read, Write};
use std::rc::Rc;
use std::time::Duration;

use crate::fixture::DesiredLrp;
use crate::harness::Clock;

use super::{Codec, CodecError, Sink};

/// Clock that only moves when told to.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corruption {
    None,
    /// Alter every decoded record once this many decodes have happened.
    FromDecode(u64),
    /// Alter decoded records only in multi-record frames.
    BulkOnly,
}

/// Writes only the record count; decodes clones of the template.
#[derive(Debug)]
pub struct StubCodec {
    template: DesiredLrp,
    cost: Option<(ManualClock, Duration)>,
    fail_encode_at: Option<u64>,
    fail_decode_at: Option<u64>,
    corruption: Corruption,
    pub prepare_calls: u64,
    pub encode_calls: u64,
    pub decode_calls: u64,
}

impl StubCodec {
    pub fn new(template: &DesiredLrp) -> Self {
        Self {
            template: template.clone(),
            cost: None,
            fail_encode_at: None,
            fail_decode_at: None,
            corruption: Corruption::None,
            prepare_calls: 0,
            encode_calls: 0,
            decode_calls: 0,
        }
    }

    /// Every encode and decode call advances `clock` by `per_call`.
    pub fn with_cost(mut self, clock: &ManualClock, per_call: Duration) -> Self {
        self.cost = Some((clock.clone(), per_call));
        self
    }

    /// Encode call number `call` (0-based, counting every call) fails.
    pub fn failing_encode_at(mut self, call: u64) -> Self {
        self.fail_encode_at = Some(call);
        self
    }

    /// Decode call number `call` (0-based, counting every call) fails.
    pub fn failing_decode_at(mut self, call: u64) -> Self {
        self.fail_decode_at = Some(call);
        self
    }

    pub fn corrupting(mut self, corruption: Corruption) -> Self {
        self.corruption = corruption;
        self
    }

    fn charge(&self) {
        if let Some((clock, per_call)) = &self.cost {
            clock.advance(*per_call);
        }
    }
}

impl Codec for StubCodec {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn prepare(&mut self, _template: &DesiredLrp) -> Result<(), CodecError> {
        self.prepare_calls += 1;
        Ok(())
    }

    fn encode(&mut self, records: &[DesiredLrp], sink: &mut Sink) -> Result<(), CodecError> {
        let call = self.encode_calls;
        self.encode_calls += 1;
        self.charge();
        if self.fail_encode_at == Some(call) {
            return Err(CodecError::Schema("stub refused to encode".to_string()));
        }
        sink.write_all(&(records.len() as u32).to_le_bytes())?;
        Ok(())
    }

    fn decode(&mut self, sink: &mut Sink) -> Result<Vec<DesiredLrp>, CodecError> {
        let call = self.decode_calls;
        self.decode_calls += 1;
        self.charge();
        if self.fail_decode_at == Some(call) {
            return Err(CodecError::Schema("stub refused to decode".to_string()));
        }

        let mut len = [0u8; 4];
        sink.read_exact(&mut len)?;
        let count = u32::from_le_bytes(len) as usize;

        let corrupt = match self.corruption {
            Corruption::None => false,
            Corruption::FromDecode(from) => call >= from,
            Corruption::BulkOnly => count > 1,
        };
        let mut record = self.template.clone();
        if corrupt {
            record.instances += 1;
        }
        Ok(vec![record; count])
    }
}
