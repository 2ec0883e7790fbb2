//! A reliable datagram transport (RDX) and a POSIX-ish job-control shell,
//! sharing one crate because they were retrieved from the same teaching
//! repository — they do not otherwise depend on each other.

pub mod rdx;
pub mod shell;
