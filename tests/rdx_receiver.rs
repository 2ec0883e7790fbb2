use rdx_shell::rdx::Reassembler;

#[test]
fn advertised_window_shrinks_while_out_of_order_chunks_are_buffered_and_recovers_once_drained() {
    let mut r = Reassembler::new(1);
    let baseline = r.advertised_window();

    r.accept(101, &[1u8; 100]); // arrives far ahead of expected_seq=1, buffered
    let shrunk = r.advertised_window();
    assert!(shrunk < baseline, "buffering an out-of-order chunk should shrink the window");

    // Fill the gap between 1 and 101 with one more out-of-order chunk, then
    // the in-order piece that drains everything at once.
    for seq in (1..101).step_by(20) {
        r.accept(seq, &[2u8; 20]);
    }

    assert_eq!(r.advertised_window(), baseline, "window recovers once all chunks drain");
    assert_eq!(r.bytes().len(), 200);
}
