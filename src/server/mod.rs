//! Distribution server
//!
//! Serves assembled packets to TCP clients on demand. A single thread
//! multiplexes the nonblocking listener and all connected clients on a
//! short poll tick, so new connections are accepted and ready clients are
//! serviced without a thread per connection, and the shutdown flag is
//! observed within one tick.
//!
//! All clients compete for one shared FIFO packet stream: each `GIVEDATA`
//! consumes the next packet, with no per-client replay or cursors.

pub mod framing;

use crate::error::Result;
use crate::pipeline::queue::PacketQueue;
use self::framing::{handshake, CMD_GIVE_DATA, CMD_SHUTDOWN, COMMAND_LEN};
use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// One accepted peer and its partially received command frame
struct Client {
    stream: TcpStream,
    addr: SocketAddr,
    frame: Vec<u8>,
}

/// TCP server distributing packets from the shared queue
pub struct DistributionServer {
    packets: PacketQueue,
    shutdown: Arc<AtomicBool>,
    packet_size: usize,
    poll_timeout: Duration,
    /// Guards packet sends so two clients' packets never interleave
    send_lock: Mutex<()>,
}

impl DistributionServer {
    pub fn new(
        packets: PacketQueue,
        shutdown: Arc<AtomicBool>,
        packet_size: usize,
        poll_timeout: Duration,
    ) -> Self {
        DistributionServer {
            packets,
            shutdown,
            packet_size,
            poll_timeout,
            send_lock: Mutex::new(()),
        }
    }

    /// Bind the listening socket with address reuse enabled
    pub fn bind(addr: SocketAddr) -> Result<TcpListener> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(128)?;
        Ok(socket.into())
    }

    /// Multiplexing loop: accept, service, tick, until shutdown
    pub fn run(&self, listener: TcpListener) -> Result<()> {
        listener.set_nonblocking(true)?;
        log::info!("Listening on {}", listener.local_addr()?);

        let mut clients: Vec<Client> = Vec::new();

        while !self.shutdown.load(Ordering::Relaxed) {
            self.accept_new(&listener, &mut clients);
            self.service_clients(&mut clients);
            thread::sleep(self.poll_timeout);
        }

        for client in clients.drain(..) {
            let _ = client.stream.shutdown(Shutdown::Both);
            log::info!("Connection {} closed", client.addr);
        }
        drop(listener);
        log::info!("Distribution server stopped");
        Ok(())
    }

    /// Accept any pending connections and send each the handshake
    fn accept_new(&self, listener: &TcpListener, clients: &mut Vec<Client>) {
        loop {
            match listener.accept() {
                Ok((mut stream, addr)) => {
                    // The handshake goes out blocking, before the stream
                    // joins the nonblocking poll set
                    if let Err(e) = stream.set_nonblocking(false) {
                        log::warn!("Failed to set blocking mode for {}: {}", addr, e);
                        continue;
                    }
                    if let Err(e) = stream.write_all(&handshake(self.packet_size)) {
                        log::warn!("Handshake to {} failed: {}", addr, e);
                        continue;
                    }
                    if let Err(e) = stream.set_nonblocking(true) {
                        log::warn!("Failed to set nonblocking for {}: {}", addr, e);
                        continue;
                    }
                    log::info!("Connection from {} accepted", addr);
                    clients.push(Client {
                        stream,
                        addr,
                        frame: Vec::with_capacity(COMMAND_LEN),
                    });
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    break;
                }
            }
        }
    }

    /// Poll every client once, dropping the ones that misbehave or vanish
    fn service_clients(&self, clients: &mut Vec<Client>) {
        let mut i = 0;
        while i < clients.len() {
            if self.poll_client(&mut clients[i]) {
                i += 1;
            } else {
                let client = clients.remove(i);
                let _ = client.stream.shutdown(Shutdown::Both);
                log::info!("Dropping client {}", client.addr);
            }
        }
    }

    /// Advance one client's command frame; returns false if the client
    /// should be dropped
    fn poll_client(&self, client: &mut Client) -> bool {
        let needed = COMMAND_LEN - client.frame.len();
        let mut buf = [0u8; COMMAND_LEN];

        match client.stream.read(&mut buf[..needed]) {
            // Clean disconnect, or peer closed mid-frame
            Ok(0) => return false,
            Ok(n) => client.frame.extend_from_slice(&buf[..n]),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => return true,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => return true,
            Err(e) => {
                log::debug!("Read error from {}: {}", client.addr, e);
                return false;
            }
        }

        if client.frame.len() < COMMAND_LEN {
            // Partial frame carries over to the next poll tick
            return true;
        }

        let frame = std::mem::take(&mut client.frame);
        self.dispatch(client, &frame)
    }

    /// Execute one complete 8-byte command
    fn dispatch(&self, client: &mut Client, frame: &[u8]) -> bool {
        if frame.starts_with(CMD_SHUTDOWN) {
            log::info!("Shutdown requested by {}", client.addr);
            self.shutdown.store(true, Ordering::Relaxed);
            return true;
        }

        if frame.starts_with(CMD_GIVE_DATA) {
            let Some(packet) = self.next_packet() else {
                // Shutdown overtook the wait; the client gets no packet
                return true;
            };
            return self.send_packet(client, &packet);
        }

        log::warn!(
            "Unknown command from {}: {:?}",
            client.addr,
            String::from_utf8_lossy(frame)
        );
        false
    }

    /// Blocking pop in poll-sized slices so shutdown cannot hang the wait
    fn next_packet(&self) -> Option<Vec<u8>> {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(packet) = self.packets.pop_timeout(self.poll_timeout) {
                return Some(packet);
            }
        }
    }

    /// Send one whole packet atomically with respect to other clients
    fn send_packet(&self, client: &mut Client, packet: &[u8]) -> bool {
        let _guard = self.send_lock.lock();

        // The poll set runs nonblocking; flip to blocking for the send so
        // write_all cannot fail spuriously on a full socket buffer
        if client.stream.set_nonblocking(false).is_err() {
            return false;
        }
        let result = client.stream.write_all(packet);
        if client.stream.set_nonblocking(true).is_err() {
            return false;
        }

        match result {
            Ok(()) => true,
            Err(e) => {
                // Peer gone: drop silently, other clients are unaffected
                log::debug!("Send to {} failed: {}", client.addr, e);
                false
            }
        }
    }
}
