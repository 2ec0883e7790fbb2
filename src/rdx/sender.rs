//! Sender sliding window: segment table, per-segment retransmit timer,
//! cumulative-ACK processing, flow-control gating (spec §4.3).

use std::time::{Duration, Instant};

use super::header::MAX_PAYLOAD;
use super::segment::Segment;

pub const SENDER_WIN_PKTS: usize = 10;
pub const RTO_MS: u64 = 500;

pub struct SenderWindow {
    segments: Vec<Segment>,
    base_index: usize,
    next_index: usize,
    last_byte_sent: u32,
    last_byte_acked: u32,
    peer_window_bytes: u32,
}

impl SenderWindow {
    /// Slice `bytes` into `MAX_PAYLOAD`-sized segments starting at `first_seq`
    /// (last segment may be short). A zero-length stream produces no segments
    /// — only the FIN carries a zero-length payload, per spec §4.3.
    pub fn from_stream(first_seq: u32, bytes: &[u8]) -> Self {
        let mut segments = Vec::with_capacity(bytes.len() / MAX_PAYLOAD + 1);
        let mut seq = first_seq;
        for chunk in bytes.chunks(MAX_PAYLOAD) {
            segments.push(Segment::new(seq, chunk.to_vec()));
            seq = seq.wrapping_add(chunk.len() as u32);
        }
        SenderWindow {
            segments,
            base_index: 0,
            next_index: 0,
            last_byte_sent: first_seq.wrapping_sub(1),
            last_byte_acked: first_seq.wrapping_sub(1),
            peer_window_bytes: (MAX_PAYLOAD * SENDER_WIN_PKTS) as u32,
        }
    }

    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index]
    }

    /// Select and mark as in-flight every not-yet-sent segment the window and
    /// the peer's advertised flow-control window currently allow. Returns the
    /// indices newly transmitted, in send order.
    pub fn send_new(&mut self, now: Instant) -> Vec<usize> {
        let mut sent = Vec::new();
        while self.next_index < self.segments.len()
            && self.next_index - self.base_index < SENDER_WIN_PKTS
        {
            let seg = &self.segments[self.next_index];
            if seg.is_empty() {
                // Only FIN carries a zero-length payload; never transmitted here.
                self.next_index += 1;
                continue;
            }
            let inflight = self.last_byte_sent.wrapping_sub(self.last_byte_acked);
            if inflight as usize + seg.len() > self.peer_window_bytes as usize {
                break;
            }
            let end = seg.end_seq().wrapping_sub(1);
            let idx = self.next_index;
            let seg = &mut self.segments[idx];
            seg.in_flight = true;
            seg.last_send_time = Some(now);
            self.last_byte_sent = end;
            sent.push(idx);
            self.next_index += 1;
        }
        sent
    }

    /// Segments in `[base_index, next_index)` whose retransmit timer has
    /// fired; re-stamps their send time. No backoff, no fast retransmit.
    pub fn expired(&mut self, now: Instant) -> Vec<usize> {
        let mut retx = Vec::new();
        for i in self.base_index..self.next_index {
            let seg = &self.segments[i];
            if seg.in_flight {
                let elapsed = seg
                    .last_send_time
                    .map(|t| now.duration_since(t))
                    .unwrap_or(Duration::MAX);
                if elapsed >= Duration::from_millis(RTO_MS) {
                    retx.push(i);
                }
            }
        }
        for &i in &retx {
            self.segments[i].last_send_time = Some(now);
        }
        retx
    }

    /// Process a cumulative ACK. Stale/duplicate ACKs (not advancing
    /// `last_byte_acked`) are discarded.
    pub fn on_ack(&mut self, ack_num: u32, peer_win: u16) {
        self.peer_window_bytes = peer_win as u32;
        while self.base_index < self.segments.len() {
            let seg = &self.segments[self.base_index];
            if wrapping_le(seg.end_seq(), ack_num) {
                self.base_index += 1;
            } else {
                break;
            }
        }
        let candidate = ack_num.wrapping_sub(1);
        if wrapping_lt(self.last_byte_acked, candidate) {
            self.last_byte_acked = candidate;
        }
    }

    pub fn is_fully_acked(&self) -> bool {
        self.base_index >= self.segments.len()
    }

    /// Highest byte index transmitted so far (inclusive); distinct from
    /// [`Self::last_byte`], which is the end of the whole stream regardless
    /// of how much has actually gone out.
    pub fn sent_so_far(&self) -> u32 {
        self.last_byte_sent
    }

    pub fn last_byte(&self) -> u32 {
        if self.segments.is_empty() {
            self.last_byte_acked
        } else {
            self.segments.last().unwrap().end_seq().wrapping_sub(1)
        }
    }

    pub fn cum_ack_floor(&self) -> u32 {
        self.last_byte_acked.wrapping_add(1)
    }
}

fn wrapping_lt(lhs: u32, rhs: u32) -> bool {
    lhs.wrapping_sub(rhs) > (1 << 31)
}

fn wrapping_le(lhs: u32, rhs: u32) -> bool {
    lhs == rhs || wrapping_lt(lhs, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_stream_into_max_payload_segments() {
        let bytes = vec![7u8; MAX_PAYLOAD * 2 + 10];
        let win = SenderWindow::from_stream(1, &bytes);
        assert_eq!(win.segments.len(), 3);
        assert_eq!(win.segment(0).len(), MAX_PAYLOAD);
        assert_eq!(win.segment(2).len(), 10);
    }

    #[test]
    fn caps_in_flight_segments_at_window_size() {
        let bytes = vec![1u8; MAX_PAYLOAD * (SENDER_WIN_PKTS + 5)];
        let mut win = SenderWindow::from_stream(1, &bytes);
        win.peer_window_bytes = u32::MAX;
        let sent = win.send_new(Instant::now());
        assert_eq!(sent.len(), SENDER_WIN_PKTS);
        // Nothing more goes out until an ACK frees window slots.
        let sent_again = win.send_new(Instant::now());
        assert!(sent_again.is_empty());
    }

    #[test]
    fn cumulative_ack_releases_segments_and_opens_window() {
        let bytes = vec![1u8; MAX_PAYLOAD * 3];
        let mut win = SenderWindow::from_stream(1, &bytes);
        win.peer_window_bytes = u32::MAX;
        win.send_new(Instant::now());
        let ack_num = win.segment(1).end_seq();
        win.on_ack(ack_num, u16::MAX);
        assert_eq!(win.base_index, 2);
        assert!(!win.is_fully_acked());
        win.on_ack(win.last_byte().wrapping_add(1), u16::MAX);
        assert!(win.is_fully_acked());
    }

    #[test]
    fn stale_ack_does_not_regress_base_index() {
        let bytes = vec![1u8; MAX_PAYLOAD * 2];
        let mut win = SenderWindow::from_stream(1, &bytes);
        win.peer_window_bytes = u32::MAX;
        win.send_new(Instant::now());
        win.on_ack(win.segment(1).end_seq(), u16::MAX);
        let advanced = win.base_index;
        win.on_ack(1, u16::MAX); // stale: acks less than what's already acked
        assert_eq!(win.base_index, advanced);
    }

    #[test]
    fn stale_ack_after_full_ack_does_not_regress_last_byte_acked() {
        let bytes = vec![1u8; MAX_PAYLOAD * 2];
        let mut win = SenderWindow::from_stream(1, &bytes);
        win.peer_window_bytes = u32::MAX;
        win.send_new(Instant::now());
        win.on_ack(win.last_byte().wrapping_add(1), u16::MAX);
        assert!(win.is_fully_acked());
        let floor_before = win.cum_ack_floor();
        win.on_ack(1, u16::MAX); // stale: would regress last_byte_acked to 0
        assert_eq!(win.cum_ack_floor(), floor_before);
        assert!(win.is_fully_acked());
    }

    #[test]
    fn retransmits_only_after_rto_elapses() {
        let bytes = vec![1u8; MAX_PAYLOAD];
        let mut win = SenderWindow::from_stream(1, &bytes);
        win.peer_window_bytes = u32::MAX;
        let start = Instant::now();
        win.send_new(start);
        assert!(win.expired(start).is_empty());
        let later = start + Duration::from_millis(RTO_MS + 1);
        assert_eq!(win.expired(later), vec![0]);
    }

    #[test]
    fn zero_length_segment_is_never_transmitted() {
        let win = SenderWindow::from_stream(1, &[]);
        assert!(win.segments.is_empty());
    }
}
