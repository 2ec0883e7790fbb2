//! Connection state machine: three-way handshake, sliding-window file
//! transfer, chat echo mode, four-way teardown (spec §4.5).

use std::io::{self, BufRead, Write};
use std::net::{SocketAddr, UdpSocket};
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use nix::poll::{poll, PollFd, PollFlags};
use rand::Rng;

use super::error::{Error, Result};
use super::header::{Header, FLAG_ACK, FLAG_FIN, FLAG_SYN, MTU};
use super::log::EventLog;
use super::loss::LossInjector;
use super::receiver::Reassembler;
use super::sender::SenderWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Closed,
    SynSent,
    SynRecv,
    Established,
    FinSentA,
    FinRecvA,
    FinSentB,
}

/// One side of an RDX connection: the UDP socket, the peer's address, the
/// fault-injection and logging collaborators, and the current state.
pub struct Endpoint {
    sock: UdpSocket,
    peer: SocketAddr,
    peer_known: bool,
    loss: LossInjector,
    log: Option<EventLog>,
    state: State,
}

const POLL_TIMEOUT_MS: i32 = (super::sender::RTO_MS / 2) as i32;

impl Endpoint {
    pub fn new(sock: UdpSocket, peer: SocketAddr, loss: LossInjector, log: Option<EventLog>) -> Self {
        Endpoint { sock, peer, peer_known: true, loss, log, state: State::Closed }
    }

    /// A server-side endpoint that hasn't yet learned its peer's address —
    /// it will bind to whoever sends the first SYN (spec §1 "single peer
    /// per connection lifetime": no multi-peer server, so this is a one-shot
    /// discovery, not a rebindable listener).
    pub fn new_unbound(sock: UdpSocket, loss: LossInjector, log: Option<EventLog>) -> Self {
        let placeholder: SocketAddr = "0.0.0.0:0".parse().unwrap();
        Endpoint { sock, peer: placeholder, peer_known: false, loss, log, state: State::Closed }
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn event(&mut self, args: std::fmt::Arguments) {
        if let Some(log) = self.log.as_mut() {
            let _ = log.log(args);
        }
    }

    fn send(&mut self, header: Header, payload: &[u8]) -> Result<()> {
        let buf = header.encode_with_payload(payload);
        self.sock.send_to(&buf, self.peer)?;
        Ok(())
    }

    /// Waits up to `POLL_TIMEOUT_MS` for a readable socket, then receives one
    /// datagram. Returns `Ok(None)` on timeout. Applies the loss injector
    /// after a successful decode, matching spec §4.2's "applied after
    /// decoding" rule; a dropped packet is reported as `Ok(None)` too.
    fn recv(&mut self) -> Result<Option<(Header, Vec<u8>)>> {
        let fd = self.sock.as_raw_fd();
        let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
        let n = loop {
            match poll(&mut fds, POLL_TIMEOUT_MS) {
                Ok(n) => break n,
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(Error::Io(io::Error::from_raw_os_error(e as i32))),
            }
        };
        if n == 0 {
            return Ok(None);
        }
        let mut buf = [0u8; MTU];
        let (len, from) = self.sock.recv_from(&mut buf)?;
        if self.peer_known {
            if from != self.peer {
                return Ok(None);
            }
        } else {
            self.peer = from;
            self.peer_known = true;
        }
        let header = Header::decode(&buf[..len])?;
        let payload = buf[super::header::HEADER_LEN.min(len)..len].to_vec();
        if self.loss.should_drop() {
            if header.flags & FLAG_SYN == 0 && !payload.is_empty() {
                self.event(format_args!("DROP DATA SEQ={}", header.seq));
            }
            return Ok(None);
        }
        Ok(Some((header, payload)))
    }

    // -- Handshake -----------------------------------------------------

    /// Client side of the three-way handshake. Returns `(local_isn, peer_isn)`.
    pub fn client_handshake(&mut self) -> Result<(u32, u32)> {
        let isn = rand::thread_rng().gen_range(0..(1u32 << 31));
        self.state = State::SynSent;
        self.event(format_args!("SND SYN"));
        self.send(Header::new(isn, 0, FLAG_SYN, u16::MAX), &[])?;
        loop {
            let Some((header, _)) = self.recv()? else {
                self.send(Header::new(isn, 0, FLAG_SYN, u16::MAX), &[])?;
                continue;
            };
            if header.is_syn() && header.is_ack() && header.ack == isn.wrapping_add(1) {
                self.event(format_args!("RCV SYN-ACK"));
                let peer_isn = header.seq;
                self.send(
                    Header::new(isn.wrapping_add(1), peer_isn.wrapping_add(1), FLAG_ACK, u16::MAX),
                    &[],
                )?;
                self.event(format_args!("SND ACK FOR SYN"));
                self.state = State::Established;
                return Ok((isn.wrapping_add(1), peer_isn.wrapping_add(1)));
            }
        }
    }

    /// Server side: waits for the peer's SYN, answers SYN+ACK, waits for the
    /// final ACK. Returns `(local_isn, peer_isn)` same as the client half.
    pub fn server_handshake(&mut self) -> Result<(u32, u32)> {
        self.state = State::Closed;
        let peer_isn = loop {
            let Some((header, _)) = self.recv()? else { continue };
            if header.is_syn() {
                self.event(format_args!("RCV SYN"));
                break header.seq;
            }
        };
        let isn = rand::thread_rng().gen_range(0..(1u32 << 31));
        self.state = State::SynRecv;
        self.send(
            Header::new(isn, peer_isn.wrapping_add(1), FLAG_SYN | FLAG_ACK, u16::MAX),
            &[],
        )?;
        self.event(format_args!("SND SYN-ACK"));
        loop {
            let Some((header, _)) = self.recv()? else {
                self.send(
                    Header::new(isn, peer_isn.wrapping_add(1), FLAG_SYN | FLAG_ACK, u16::MAX),
                    &[],
                )?;
                continue;
            };
            if header.is_ack() && header.ack == isn.wrapping_add(1) {
                self.event(format_args!("RCV ACK FOR SYN"));
                self.state = State::Established;
                return Ok((isn.wrapping_add(1), peer_isn.wrapping_add(1)));
            }
        }
    }

    // -- File transfer ---------------------------------------------------

    /// Drives the sliding-window send loop until every byte is acknowledged.
    pub fn run_file_transfer_client(&mut self, first_seq: u32, bytes: &[u8]) -> Result<()> {
        let mut win = SenderWindow::from_stream(first_seq, bytes);
        loop {
            let now = Instant::now();
            for idx in win.send_new(now) {
                let seg = win.segment(idx).clone();
                self.event(format_args!("SND DATA SEQ={} LEN={}", seg.seq, seg.len()));
                self.send(Header::new(seg.seq, 0, 0, 0), &seg.payload)?;
            }
            for idx in win.expired(now) {
                let seg = win.segment(idx).clone();
                self.event(format_args!("TIMEOUT SEQ={}", seg.seq));
                self.event(format_args!("RETX DATA SEQ={} LEN={}", seg.seq, seg.len()));
                self.send(Header::new(seg.seq, 0, 0, 0), &seg.payload)?;
            }
            if win.is_fully_acked() {
                return Ok(());
            }
            if let Some((header, _)) = self.recv()? {
                if header.is_ack() {
                    self.event(format_args!("RCV ACK={}", header.ack));
                    win.on_ack(header.ack, header.win);
                    if header.win == 0 {
                        self.event(format_args!("FLOW WIN UPDATE=0"));
                    }
                }
            }
        }
    }

    /// Drives receiver-side reassembly until a FIN arrives; returns the
    /// reassembled byte stream.
    pub fn run_file_transfer_server(&mut self, initial_seq: u32) -> Result<Vec<u8>> {
        let mut reasm = Reassembler::new(initial_seq);
        loop {
            let Some((header, payload)) = self.recv()? else { continue };
            if header.is_fin() {
                self.event(format_args!("RCV FIN SEQ={}", header.seq));
                self.send(
                    Header::new(0, header.seq.wrapping_add(1), FLAG_ACK, reasm.advertised_window()),
                    &[],
                )?;
                self.event(format_args!("SND ACK FOR FIN"));
                return Ok(reasm.take_bytes());
            }
            if !payload.is_empty() {
                self.event(format_args!("RCV DATA SEQ={} LEN={}", header.seq, payload.len()));
                reasm.accept(header.seq, &payload);
                let ack = reasm.expected_seq();
                let win = reasm.advertised_window();
                self.send(Header::new(0, ack, FLAG_ACK, win), &[])?;
                self.event(format_args!("SND ACK={} WIN={}", ack, win));
            }
        }
    }

    // -- Chat mode --------------------------------------------------------

    /// Echo path: lines from `input` are sent as DATA packets (SEQ unused);
    /// received DATA payloads are written to `output`.
    pub fn run_chat_client<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        loop {
            let mut line = String::new();
            let n = input.read_line(&mut line)?;
            if n == 0 {
                return self.teardown_initiate(0);
            }
            self.event(format_args!("SND DATA SEQ=0 LEN={}", line.len()));
            self.send(Header::new(0, 0, 0, u16::MAX), line.as_bytes())?;
            if let Some((header, payload)) = self.recv()? {
                if !payload.is_empty() {
                    self.event(format_args!("RCV DATA SEQ=0 LEN={}", payload.len()));
                    output.write_all(&payload)?;
                    output.flush()?;
                } else if header.is_fin() {
                    return self.teardown_respond(header.seq, 0);
                }
            }
        }
    }

    pub fn run_chat_server<W: Write>(&mut self, mut output: W) -> Result<()> {
        loop {
            let Some((header, payload)) = self.recv()? else { continue };
            if header.is_fin() {
                return self.teardown_respond(header.seq, 0);
            }
            if !payload.is_empty() {
                self.event(format_args!("RCV DATA SEQ=0 LEN={}", payload.len()));
                output.write_all(&payload)?;
                output.flush()?;
                self.event(format_args!("SND DATA SEQ=0 LEN={}", payload.len()));
                self.send(Header::new(0, 0, 0, u16::MAX), &payload)?;
            }
        }
    }

    // -- Teardown ---------------------------------------------------------

    /// This side initiates the four-way FIN teardown. `last_byte_sent` is the
    /// highest stream byte this side has sent (0 for chat, where the SEQ
    /// field carries no meaning and the teardown FIN always reads SEQ=0 per
    /// `original_source/networking/client.c`'s chat path); for a data
    /// transfer it's `client.c:343`'s `last_byte`, so the closing FIN/ACK
    /// keep advancing the same sequence space the transfer used instead of
    /// resetting it.
    pub fn teardown_initiate(&mut self, last_byte_sent: u32) -> Result<()> {
        self.state = State::FinSentA;
        let fin_seq = last_byte_sent.wrapping_add(1);
        self.event(format_args!("SND FIN SEQ={fin_seq}"));
        self.send(Header::new(fin_seq, 0, FLAG_FIN, 0), &[])?;
        loop {
            let Some((header, _)) = self.recv()? else { continue };
            if header.is_ack() {
                self.state = State::FinRecvA;
            }
            if header.is_fin() {
                self.event(format_args!("RCV FIN SEQ={}", header.seq));
                let ack_seq = last_byte_sent.wrapping_add(2);
                self.send(Header::new(ack_seq, header.seq.wrapping_add(1), FLAG_ACK, 0), &[])?;
                self.event(format_args!("SND ACK FOR FIN"));
                self.state = State::Closed;
                return Ok(());
            }
        }
    }

    /// This side responds to a peer-initiated FIN: ACK it, send its own FIN,
    /// and wait best-effort for the final ACK (no TIME_WAIT). `peer_fin_seq`
    /// is the FIN's own SEQ (0 for chat); `last_byte_sent` is this side's
    /// highest sent stream byte, mirroring `server.c:248`'s
    /// `ack.ack_num = ih.seq_num + 1` / own `fin.seq_num = isn_server + 1`
    /// pattern (0 for chat, which never advances a byte sequence).
    pub fn teardown_respond(&mut self, peer_fin_seq: u32, last_byte_sent: u32) -> Result<()> {
        self.state = State::FinRecvA;
        self.send(Header::new(last_byte_sent, peer_fin_seq.wrapping_add(1), FLAG_ACK, 0), &[])?;
        self.event(format_args!("SND ACK FOR FIN"));
        self.state = State::FinSentB;
        let fin_seq = last_byte_sent.wrapping_add(1);
        self.event(format_args!("SND FIN SEQ={fin_seq}"));
        self.send(Header::new(fin_seq, 0, FLAG_FIN, 0), &[])?;
        // Best-effort: wait briefly for the final ACK, then release resources
        // regardless — there is no TIME_WAIT per spec §4.5.
        let deadline = Instant::now() + Duration::from_millis(super::sender::RTO_MS);
        while Instant::now() < deadline {
            if let Ok(Some((header, _))) = self.recv() {
                if header.is_ack() {
                    break;
                }
            }
        }
        self.state = State::Closed;
        Ok(())
    }
}
