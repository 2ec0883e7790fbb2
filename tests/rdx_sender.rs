//! Black-box sender/receiver interplay: feeds a `SenderWindow`'s segments
//! into a `Reassembler` out of transmission order and confirms the whole
//! stream still arrives intact, exercising both sides together rather than
//! each module's own unit tests.

use std::time::Instant;

use rdx_shell::rdx::header::MAX_PAYLOAD;
use rdx_shell::rdx::{Reassembler, SenderWindow};

#[test]
fn reordered_delivery_of_every_sender_segment_reassembles_losslessly() {
    let original: Vec<u8> = (0..MAX_PAYLOAD * 4 + 37).map(|i| (i % 256) as u8).collect();
    let mut sender = SenderWindow::from_stream(1, &original);

    // Drain every segment out of the sender regardless of window size by
    // repeatedly acking what's been sent so far.
    let mut segments = Vec::new();
    loop {
        let now = Instant::now();
        let sent = sender.send_new(now);
        if sent.is_empty() && sender.is_fully_acked() {
            break;
        }
        for idx in sent {
            segments.push(sender.segment(idx).clone());
        }
        if !sender.is_fully_acked() {
            sender.on_ack(sender.sent_so_far().wrapping_add(1), u16::MAX);
        }
    }

    // Feed them to the receiver in reverse order: worst case for reassembly.
    let mut receiver = Reassembler::new(1);
    for seg in segments.iter().rev() {
        receiver.accept(seg.seq, &seg.payload);
    }

    assert_eq!(receiver.bytes(), original.as_slice());
}
