use rdx_shell::rdx::Header;
use rdx_shell::rdx::header::{FLAG_ACK, FLAG_FIN, FLAG_SYN, HEADER_LEN, MAX_PAYLOAD, MTU};

#[test]
fn max_payload_plus_header_fits_under_mtu() {
    assert!(HEADER_LEN + MAX_PAYLOAD <= MTU);
}

#[test]
fn a_full_sized_datagram_round_trips_through_the_wire() {
    let header = Header::new(1000, 2000, FLAG_SYN | FLAG_ACK | FLAG_FIN, 4096);
    let payload = vec![0xABu8; MAX_PAYLOAD];
    let wire = header.encode_with_payload(&payload);
    assert_eq!(wire.len(), HEADER_LEN + MAX_PAYLOAD);

    let decoded = Header::decode(&wire).unwrap();
    assert_eq!(decoded, header);
    assert!(decoded.is_syn());
    assert!(decoded.is_ack());
    assert!(decoded.is_fin());
    assert_eq!(&wire[HEADER_LEN..], payload.as_slice());
}
