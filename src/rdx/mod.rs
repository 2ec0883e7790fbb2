//! RDX: a reliable datagram transport over UDP (spec §1-A). Three-way
//! handshake, sliding-window file transfer, chat echo mode, four-way
//! teardown, with configurable packet loss for fault-injection testing.

pub mod connection;
pub mod error;
pub mod header;
pub mod log;
pub mod loss;
pub mod receiver;
pub mod segment;
pub mod sender;

pub use connection::{Endpoint, State};
pub use error::{Error, Result};
pub use header::Header;
pub use loss::LossInjector;
pub use log::EventLog;
pub use receiver::Reassembler;
pub use segment::Segment;
pub use sender::SenderWindow;
