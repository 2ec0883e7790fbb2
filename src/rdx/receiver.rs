//! Receive-side reassembly: in-order delivery plus a sorted out-of-order
//! buffer, collapsed into the contiguous stream as gaps are filled (spec §4.4).

/// One buffered out-of-order chunk, kept sorted by `seq`.
struct OooChunk {
    seq: u32,
    data: Vec<u8>,
}

/// Matches the original's `recv_buf_cap`; never throttled by real disk
/// backpressure, so the advertised window stays near this value in practice.
const RECV_CAP: usize = 1024 * 1024;

pub struct Reassembler {
    expected_seq: u32,
    ooo: Vec<OooChunk>,
    recv_bytes: Vec<u8>,
    recv_cap: usize,
}

impl Reassembler {
    pub fn new(initial_seq: u32) -> Self {
        Reassembler {
            expected_seq: initial_seq,
            ooo: Vec::new(),
            recv_bytes: Vec::new(),
            recv_cap: RECV_CAP,
        }
    }

    pub fn expected_seq(&self) -> u32 {
        self.expected_seq
    }

    pub fn recv_cap(&self) -> usize {
        self.recv_cap
    }

    /// Bytes reassembled so far, in stream order.
    pub fn bytes(&self) -> &[u8] {
        &self.recv_bytes
    }

    pub fn take_bytes(self) -> Vec<u8> {
        self.recv_bytes
    }

    /// Accept a data segment. Duplicates and pure retransmits of already-
    /// delivered bytes are dropped silently; segments that land beyond the
    /// window are dropped too (sender will time out and retry).
    ///
    /// Returns `true` if the segment advanced `expected_seq` (i.e. is worth
    /// ACKing as new progress — a duplicate still gets ACKed by the caller,
    /// per spec §4.4, but doesn't need this flag).
    pub fn accept(&mut self, seq: u32, payload: &[u8]) -> bool {
        if payload.is_empty() {
            return false;
        }
        if seq_before(seq, self.expected_seq) {
            // fully or partially duplicate; nothing new
            return false;
        }
        if seq != self.expected_seq {
            self.buffer_ooo(seq, payload);
            return false;
        }
        self.recv_bytes.extend_from_slice(payload);
        self.expected_seq = self.expected_seq.wrapping_add(payload.len() as u32);
        self.drain_ooo();
        true
    }

    fn buffer_ooo(&mut self, seq: u32, payload: &[u8]) {
        if self.ooo.iter().any(|c| c.seq == seq) {
            return;
        }
        let idx = self
            .ooo
            .iter()
            .position(|c| seq_before(seq, c.seq))
            .unwrap_or(self.ooo.len());
        self.ooo.insert(idx, OooChunk { seq, data: payload.to_vec() });
    }

    /// Fold any buffered chunks that have become contiguous into the stream.
    fn drain_ooo(&mut self) {
        loop {
            let Some(pos) = self.ooo.iter().position(|c| c.seq == self.expected_seq) else {
                break;
            };
            let chunk = self.ooo.remove(pos);
            self.expected_seq = self.expected_seq.wrapping_add(chunk.data.len() as u32);
            self.recv_bytes.extend_from_slice(&chunk.data);
        }
    }

    /// Receiver's advertised flow-control window: remaining buffer headroom.
    pub fn advertised_window(&self) -> u16 {
        let occupied: usize = self.ooo.iter().map(|c| c.data.len()).sum();
        self.recv_cap.saturating_sub(occupied).min(u16::MAX as usize) as u16
    }
}

fn seq_before(a: u32, b: u32) -> bool {
    a.wrapping_sub(b) > (1 << 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_segments_append_directly() {
        let mut r = Reassembler::new(1);
        assert!(r.accept(1, b"hello"));
        assert!(r.accept(6, b"world"));
        assert_eq!(r.bytes(), b"helloworld");
        assert_eq!(r.expected_seq(), 11);
    }

    #[test]
    fn out_of_order_segment_buffers_until_gap_fills() {
        let mut r = Reassembler::new(1);
        assert!(!r.accept(6, b"world")); // arrives early, buffered
        assert_eq!(r.bytes(), b"");
        assert!(r.accept(1, b"hello")); // fills the gap, drains buffer too
        assert_eq!(r.bytes(), b"helloworld");
    }

    #[test]
    fn duplicate_segment_is_ignored() {
        let mut r = Reassembler::new(1);
        assert!(r.accept(1, b"hello"));
        assert!(!r.accept(1, b"hello"));
        assert_eq!(r.bytes(), b"hello");
    }

    #[test]
    fn multiple_out_of_order_chunks_drain_in_sequence() {
        let mut r = Reassembler::new(1);
        assert!(!r.accept(11, b"!!!"));
        assert!(!r.accept(6, b"world"));
        assert!(r.accept(1, b"hello"));
        assert_eq!(r.bytes(), b"helloworld!!!");
    }
}
