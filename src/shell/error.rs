use std::io;

/// Error taxonomy for the shell, per spec §7.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid Syntax!")]
    UserSyntax,

    #[error("No such directory!")]
    NoSuchDirectory,

    #[error("Command not found!")]
    CommandNotFound,

    #[error("No such process found")]
    NoSuchProcess,

    #[error("No such job")]
    NoSuchJob,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("system call failed: {0}")]
    Nix(#[from] nix::Error),

    #[error("fatal: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
