//! RDX server: file-transfer mode (`server port [loss]`) or chat mode
//! (`server port --chat [loss]`), per spec §6. Single peer per connection
//! lifetime — no multi-peer fan-out.

use std::fs;
use std::net::UdpSocket;
use std::process::ExitCode;

use clap::Parser;
use md5::{Digest, Md5};

use rdx_shell::rdx::{Endpoint, Error, EventLog, LossInjector, Result};

#[derive(Parser)]
#[command(name = "server", about = "RDX file-transfer / chat server")]
struct Cli {
    port: u16,
    #[arg(long)]
    chat: bool,
    loss_rate: Option<f64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("server: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let sock = UdpSocket::bind(("0.0.0.0", cli.port))?;
    let loss = LossInjector::new(cli.loss_rate.unwrap_or(0.0));
    let mut endpoint = Endpoint::new_unbound(sock, loss, EventLog::open("server"));
    let (_local_seq, peer_seq) = endpoint.server_handshake()?;

    if cli.chat {
        return endpoint.run_chat_server(std::io::stdout());
    }

    let stream = endpoint.run_file_transfer_server(peer_seq)?;
    let split = stream.iter().position(|&b| b == b'\n').ok_or(Error::PeerProtocolViolation(
        "first DATA bytes did not contain a filename terminated by '\\n'",
    ))?;
    let filename = String::from_utf8_lossy(&stream[..split]).into_owned();
    let contents = &stream[split + 1..];
    fs::write(&filename, contents)?;

    let mut hasher = Md5::new();
    hasher.update(contents);
    println!("MD5: {:x}", hasher.finalize());
    Ok(())
}
