//! Fixed 12-byte RDX wire header: SEQ(4) ACK(4) FLAGS(2) WIN(2), all big-endian.

use super::error::Error;

pub const HEADER_LEN: usize = 12;
pub const MAX_PAYLOAD: usize = 1024;
pub const MTU: usize = 1400;

pub const FLAG_SYN: u16 = 0x1;
pub const FLAG_ACK: u16 = 0x2;
pub const FLAG_FIN: u16 = 0x4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub seq: u32,
    pub ack: u32,
    pub flags: u16,
    pub win: u16,
}

impl Header {
    pub fn new(seq: u32, ack: u32, flags: u16, win: u16) -> Self {
        Header { seq, ack, flags, win }
    }

    pub fn is_syn(&self) -> bool {
        self.flags & FLAG_SYN != 0
    }

    pub fn is_ack(&self) -> bool {
        self.flags & FLAG_ACK != 0
    }

    pub fn is_fin(&self) -> bool {
        self.flags & FLAG_FIN != 0
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.seq.to_be_bytes());
        buf[4..8].copy_from_slice(&self.ack.to_be_bytes());
        buf[8..10].copy_from_slice(&self.flags.to_be_bytes());
        buf[10..12].copy_from_slice(&self.win.to_be_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::ShortPacket(bytes.len()));
        }
        Ok(Header {
            seq: u32::from_be_bytes(bytes[0..4].try_into().unwrap()),
            ack: u32::from_be_bytes(bytes[4..8].try_into().unwrap()),
            flags: u16::from_be_bytes(bytes[8..10].try_into().unwrap()),
            win: u16::from_be_bytes(bytes[10..12].try_into().unwrap()),
        })
    }

    /// Encode the header followed by `payload` into one datagram buffer.
    pub fn encode_with_payload(&self, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(&self.encode());
        buf.extend_from_slice(payload);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_all_fields() {
        let h = Header::new(0x1234_5678, 0x9abc_def0, FLAG_SYN | FLAG_ACK, 0xbeef);
        let encoded = h.encode();
        let decoded = Header::decode(&encoded).unwrap();
        assert_eq!(h, decoded);
    }

    #[test]
    fn rejects_short_packets() {
        let buf = [0u8; 11];
        assert!(matches!(Header::decode(&buf), Err(Error::ShortPacket(11))));
    }

    #[test]
    fn ignores_unknown_flag_bits() {
        let h = Header::new(0, 0, FLAG_SYN | 0x80, 0);
        assert!(h.is_syn());
        assert!(!h.is_ack());
        assert!(!h.is_fin());
    }

    #[test]
    fn encode_with_payload_prefixes_header() {
        let h = Header::new(1, 2, 0, 10);
        let buf = h.encode_with_payload(b"hi");
        assert_eq!(buf.len(), HEADER_LEN + 2);
        assert_eq!(&buf[HEADER_LEN..], b"hi");
    }
}
