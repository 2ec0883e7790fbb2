//! Sender-side segment record (spec §3 "Sender segment").

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Segment {
    pub seq: u32,
    pub payload: Vec<u8>,
    pub last_send_time: Option<Instant>,
    pub in_flight: bool,
}

impl Segment {
    pub fn new(seq: u32, payload: Vec<u8>) -> Self {
        Segment { seq, payload, last_send_time: None, in_flight: false }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Sequence number one past the last byte this segment carries.
    pub fn end_seq(&self) -> u32 {
        self.seq.wrapping_add(self.len() as u32)
    }
}
