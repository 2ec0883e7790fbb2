use std::io;

/// Error taxonomy for the RDX transport, per spec §7.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("datagram shorter than header ({0} bytes)")]
    ShortPacket(usize),

    #[error("peer protocol violation: {0}")]
    PeerProtocolViolation(&'static str),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, Error>;
