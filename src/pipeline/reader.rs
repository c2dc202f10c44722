//! Source reader thread
//!
//! Pulls raw bytes from the instrument in fixed-size chunks and publishes
//! each read onto the chunk queue. A short read or I/O failure is fatal for
//! the acquisition session: the instrument link is assumed to need external
//! intervention, so the reader sets the shutdown flag instead of retrying.

use crate::pipeline::queue::ChunkQueue;
use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reader loop - one full chunk per cycle until shutdown or hardware fault
///
/// The transport mutex is shared with any other code path that might touch
/// the device; in the common case the reader is the sole owner.
pub fn run(
    transport: Arc<Mutex<Box<dyn Transport>>>,
    chunks: Arc<ChunkQueue>,
    shutdown: Arc<AtomicBool>,
    chunk_size: usize,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let mut chunk = vec![0u8; chunk_size];
        let result = {
            let mut port = transport.lock();
            port.read_exact(&mut chunk)
        };

        match result {
            Ok(()) => {
                if chunks.push(chunk).is_some() {
                    // Overflow is transient: report it and keep the stream fresh
                    log::warn!("Chunk queue full, dropping oldest chunk");
                }
            }
            Err(e) => {
                log::error!("Serial read failed: {}", e);
                shutdown.store(true, Ordering::Relaxed);
                break;
            }
        }
    }

    log::info!("Serial reader exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn run_reader(mock: MockTransport, chunks: &Arc<ChunkQueue>) -> Arc<AtomicBool> {
        let transport: Arc<Mutex<Box<dyn Transport>>> = Arc::new(Mutex::new(Box::new(mock)));
        let shutdown = Arc::new(AtomicBool::new(false));
        run(transport, Arc::clone(chunks), Arc::clone(&shutdown), 4);
        shutdown
    }

    #[test]
    fn publishes_chunks_in_order_until_fault() {
        let mock = MockTransport::new();
        mock.push_read(b"aaaa");
        mock.push_read(b"bbbb");
        mock.push_read(b"cccc");

        let chunks = Arc::new(ChunkQueue::new(8));
        // Script exhaustion reads as a timeout, which ends the session
        let shutdown = run_reader(mock, &chunks);

        assert!(shutdown.load(Ordering::Relaxed));
        assert_eq!(chunks.pop(), Some(b"aaaa".to_vec()));
        assert_eq!(chunks.pop(), Some(b"bbbb".to_vec()));
        assert_eq!(chunks.pop(), Some(b"cccc".to_vec()));
        assert_eq!(chunks.pop(), None);
    }

    #[test]
    fn short_read_is_fatal() {
        let mock = MockTransport::new();
        mock.push_read(b"ab"); // shorter than the 4-byte chunk size

        let chunks = Arc::new(ChunkQueue::new(8));
        let shutdown = run_reader(mock, &chunks);

        assert!(shutdown.load(Ordering::Relaxed));
        assert!(chunks.is_empty());
    }

    #[test]
    fn io_error_is_fatal() {
        let mock = MockTransport::new();
        mock.push_read(b"aaaa");
        mock.push_error(std::io::ErrorKind::BrokenPipe);
        mock.push_read(b"bbbb"); // never reached

        let chunks = Arc::new(ChunkQueue::new(8));
        let shutdown = run_reader(mock, &chunks);

        assert!(shutdown.load(Ordering::Relaxed));
        assert_eq!(chunks.pop(), Some(b"aaaa".to_vec()));
        assert_eq!(chunks.pop(), None);
    }

    #[test]
    fn overflow_displaces_oldest_chunk() {
        let mock = MockTransport::new();
        mock.push_read(b"aaaa");
        mock.push_read(b"bbbb");
        mock.push_read(b"cccc");

        let chunks = Arc::new(ChunkQueue::new(2));
        run_reader(mock, &chunks);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.pop(), Some(b"bbbb".to_vec()));
        assert_eq!(chunks.pop(), Some(b"cccc".to_vec()));
    }
}
