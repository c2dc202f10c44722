//! Bounded queues connecting the pipeline stages
//!
//! The two queues are structurally identical but carry deliberately
//! different overflow policies, so they stay two distinct types:
//!
//! - [`ChunkQueue`] (reader -> assembler) drops the oldest chunk when full.
//!   Live data freshness beats completeness for a monitoring instrument.
//! - [`PacketQueue`] (assembler -> server) blocks with a timeout. A packet
//!   must never be silently lost once it has been cut.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use crossbeam_queue::ArrayQueue;
use std::time::Duration;

/// Bounded FIFO of raw chunks with drop-oldest overflow
pub struct ChunkQueue {
    inner: ArrayQueue<Vec<u8>>,
}

impl ChunkQueue {
    /// Create a queue holding at most `capacity` chunks
    pub fn new(capacity: usize) -> Self {
        ChunkQueue {
            inner: ArrayQueue::new(capacity),
        }
    }

    /// Push a chunk, displacing the oldest one if the queue is full.
    ///
    /// Returns the displaced chunk so the caller can report the loss.
    pub fn push(&self, chunk: Vec<u8>) -> Option<Vec<u8>> {
        self.inner.force_push(chunk)
    }

    /// Pop the oldest chunk, if any (non-blocking)
    pub fn pop(&self) -> Option<Vec<u8>> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// Bounded FIFO of assembled packets with blocking push/pop
///
/// Cloning yields another handle onto the same queue.
#[derive(Clone)]
pub struct PacketQueue {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl PacketQueue {
    /// Create a queue holding at most `capacity` packets
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        PacketQueue { tx, rx }
    }

    /// Push a packet, waiting up to `timeout` for space.
    ///
    /// On timeout the packet is handed back so the caller can retry after
    /// re-checking the shutdown flag.
    pub fn push_timeout(
        &self,
        packet: Vec<u8>,
        timeout: Duration,
    ) -> std::result::Result<(), Vec<u8>> {
        match self.tx.send_timeout(packet, timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(p)) => Err(p),
            Err(SendTimeoutError::Disconnected(p)) => Err(p),
        }
    }

    /// Pop the oldest packet, waiting up to `timeout` for one to arrive
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        match self.rx.recv_timeout(timeout) {
            Ok(packet) => Some(packet),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
