//! RDX client: file-transfer mode (`client ip port in out [loss]`) or chat
//! mode (`client ip port --chat [loss]`), per spec §6.

use std::fs;
use std::net::UdpSocket;
use std::process::ExitCode;

use clap::Parser;

use rdx_shell::rdx::{Endpoint, Error, EventLog, LossInjector, Result};

#[derive(Parser)]
#[command(name = "client", about = "RDX file-transfer / chat client")]
struct Cli {
    server_ip: String,
    server_port: u16,
    #[arg(long)]
    chat: bool,
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("client: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let peer = format!("{}:{}", cli.server_ip, cli.server_port)
        .parse()
        .map_err(|_| Error::InvalidAddress(cli.server_ip.clone()))?;
    let sock = UdpSocket::bind("0.0.0.0:0")?;

    if cli.chat {
        let loss_rate: f64 = cli.rest.first().and_then(|s| s.parse().ok()).unwrap_or(0.0);
        let mut endpoint =
            Endpoint::new(sock, peer, LossInjector::new(loss_rate), EventLog::open("client"));
        endpoint.client_handshake()?;
        let stdin = std::io::stdin();
        return endpoint.run_chat_client(stdin.lock(), std::io::stdout());
    }

    if cli.rest.len() < 2 {
        eprintln!("usage: client <server_ip> <server_port> <input_file> <output_file_name> [loss_rate]");
        return Err(Error::InvalidAddress("missing arguments".into()));
    }
    let input_file = &cli.rest[0];
    let output_file = &cli.rest[1];
    let loss_rate: f64 = cli.rest.get(2).and_then(|s| s.parse().ok()).unwrap_or(0.0);

    let mut endpoint = Endpoint::new(sock, peer, LossInjector::new(loss_rate), EventLog::open("client"));
    let (first_seq, _peer_seq) = endpoint.client_handshake()?;

    let payload = fs::read(input_file)?;
    let mut framed = output_file.clone().into_bytes();
    framed.push(b'\n');
    framed.extend_from_slice(&payload);

    let last_byte_sent = first_seq.wrapping_add(framed.len() as u32).wrapping_sub(1);
    endpoint.run_file_transfer_client(first_seq, &framed)?;
    endpoint.teardown_initiate(last_byte_sent)
}
