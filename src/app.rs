//! Application orchestration for the photond daemon
//!
//! Owns the queues and shutdown flag, wires the three pipeline components
//! together, and manages graceful shutdown. No other global state exists.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::queue::{ChunkQueue, PacketQueue};
use crate::pipeline::{assembler, reader};
use crate::server::DistributionServer;
use crate::transport::{SerialTransport, Transport};
use parking_lot::Mutex;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Main application structure that manages all components
pub struct App {
    config: Config,
    transport: Arc<Mutex<Box<dyn Transport>>>,
    chunks: Arc<ChunkQueue>,
    packets: PacketQueue,
    shutdown: Arc<AtomicBool>,
}

impl App {
    /// Create a new App instance
    ///
    /// Opens the instrument link; a missing or unresponsive device aborts
    /// startup here.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        log::info!(
            "Opening instrument on {} ({} baud, {} byte chunks, {} byte packets)",
            config.serial.device,
            config.serial.baud_rate,
            config.serial.chunk_size,
            config.packet_size(),
        );
        let transport = SerialTransport::open(
            &config.serial.device,
            config.serial.baud_rate,
            config.read_timeout(),
        )?;

        let chunks = Arc::new(ChunkQueue::new(config.queues.chunk_capacity));
        let packets = PacketQueue::new(config.queues.packet_capacity);
        let shutdown = Arc::new(AtomicBool::new(false));

        Ok(Self {
            config,
            transport: Arc::new(Mutex::new(Box::new(transport))),
            chunks,
            packets,
            shutdown,
        })
    }

    /// Start all pipeline threads and run until shutdown
    pub fn run(&mut self) -> Result<()> {
        // Bind before spawning anything so a port conflict aborts startup
        let bind_addr: SocketAddr = format!(
            "{}:{}",
            self.config.network.bind_address, self.config.network.port
        )
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("bad bind address: {}", e)))?;
        let listener = DistributionServer::bind(bind_addr)?;

        self.install_signal_handler()?;

        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        let transport = Arc::clone(&self.transport);
        let chunks = Arc::clone(&self.chunks);
        let shutdown = Arc::clone(&self.shutdown);
        let chunk_size = self.config.serial.chunk_size;
        handles.push(
            thread::Builder::new()
                .name("serial-reader".to_string())
                .spawn(move || reader::run(transport, chunks, shutdown, chunk_size))?,
        );

        let chunks = Arc::clone(&self.chunks);
        let packets = self.packets.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let packet_size = self.config.packet_size();
        let poll = self.config.poll_timeout();
        handles.push(
            thread::Builder::new()
                .name("packet-assembler".to_string())
                .spawn(move || assembler::run(chunks, packets, shutdown, packet_size, poll))?,
        );

        let server = DistributionServer::new(
            self.packets.clone(),
            Arc::clone(&self.shutdown),
            self.config.packet_size(),
            self.config.poll_timeout(),
        );
        handles.push(
            thread::Builder::new()
                .name("distribution-server".to_string())
                .spawn(move || {
                    if let Err(e) = server.run(listener) {
                        log::error!("Distribution server error: {}", e);
                    }
                })?,
        );

        log::info!("All threads started");

        // Main loop: keep alive, report buffer depth periodically
        let mut last_stats = Instant::now();
        while !self.shutdown.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(100));

            if last_stats.elapsed().as_secs() >= 10 {
                log::info!(
                    "In buffer: {} chunks, {} packets",
                    self.chunks.len(),
                    self.packets.len()
                );
                last_stats = Instant::now();
            }
        }

        log::info!("Shutdown signal received, stopping threads...");
        for handle in handles {
            let _ = handle.join();
        }

        log::info!("photond stopped");
        Ok(())
    }

    /// Route SIGINT/SIGTERM into the shutdown flag
    fn install_signal_handler(&self) -> Result<()> {
        let shutdown = Arc::clone(&self.shutdown);
        let mut signals = Signals::new([SIGINT, SIGTERM])?;

        thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    log::info!("Received signal {:?}, initiating shutdown", sig);
                    shutdown.store(true, Ordering::Relaxed);
                }
            })?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Shutdown is one-way; make sure lingering threads see it
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
