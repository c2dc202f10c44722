//! Packet assembler
//!
//! Converts the stream of variable-length raw chunks into fixed-size
//! packets with no byte loss, duplication, or reordering. The only bytes
//! ever missing from the packet stream are whole chunks dropped upstream by
//! the reader's overflow policy.

use crate::pipeline::queue::{ChunkQueue, PacketQueue};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Reframing state machine: accumulates chunk bytes into a pending buffer
/// and cuts a packet every time it reaches the packet size
pub struct PacketAssembler {
    packet_size: usize,
    pending: Vec<u8>,
}

impl PacketAssembler {
    pub fn new(packet_size: usize) -> Self {
        PacketAssembler {
            packet_size,
            pending: Vec::with_capacity(packet_size),
        }
    }

    /// Feed one chunk, returning any packets completed by it.
    ///
    /// With chunks no larger than the packet size this yields at most one
    /// packet per call, but oversized input is handled too.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut completed = Vec::new();
        let mut rest = chunk;

        while !rest.is_empty() {
            let remaining = self.packet_size - self.pending.len();
            let take = remaining.min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.pending.len() == self.packet_size {
                let packet =
                    mem::replace(&mut self.pending, Vec::with_capacity(self.packet_size));
                completed.push(packet);
            }
        }

        completed
    }

    /// Bytes currently held for the not-yet-complete packet
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Assembler loop - pops chunks with a bounded wait and emits packets
///
/// Emitting blocks while the packet queue is full, but in poll-sized slices
/// so the shutdown flag is observed within one tick. An incomplete pending
/// buffer is discarded at shutdown; a partial packet is never emitted.
pub fn run(
    chunks: Arc<ChunkQueue>,
    packets: PacketQueue,
    shutdown: Arc<AtomicBool>,
    packet_size: usize,
    poll: Duration,
) {
    let mut assembler = PacketAssembler::new(packet_size);

    'outer: while !shutdown.load(Ordering::Relaxed) {
        let Some(chunk) = chunks.pop() else {
            // Empty upstream queue: wait one tick, then re-check shutdown
            thread::sleep(poll);
            continue;
        };

        for packet in assembler.feed(&chunk) {
            let mut packet = packet;
            loop {
                if shutdown.load(Ordering::Relaxed) {
                    break 'outer;
                }
                match packets.push_timeout(packet, poll) {
                    Ok(()) => break,
                    Err(p) => packet = p,
                }
            }
        }
    }

    if assembler.pending_len() > 0 {
        log::debug!(
            "Discarding {} byte incomplete packet at shutdown",
            assembler.pending_len()
        );
    }
    log::info!("Packet assembler exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_exact_size_packets() {
        let mut asm = PacketAssembler::new(8);
        assert!(asm.feed(b"1234").is_empty());
        let packets = asm.feed(b"5678");
        assert_eq!(packets, vec![b"12345678".to_vec()]);
        assert_eq!(asm.pending_len(), 0);
    }

    #[test]
    fn carries_chunk_remainder_into_next_packet() {
        let mut asm = PacketAssembler::new(8);
        assert!(asm.feed(b"123456").is_empty());
        // 6 + 5 bytes: packet cut at 8, 3 bytes carried forward
        let packets = asm.feed(b"789ab");
        assert_eq!(packets, vec![b"12345678".to_vec()]);
        assert_eq!(asm.pending_len(), 3);

        let packets = asm.feed(b"cdefg");
        assert_eq!(packets, vec![b"9abcdefg".to_vec()]);
        assert_eq!(asm.pending_len(), 0);
    }

    #[test]
    fn preserves_byte_order_across_uneven_chunks() {
        let mut asm = PacketAssembler::new(10);
        let input: Vec<u8> = (0u8..=249).collect();

        // Feed in chunks of irregular lengths
        let mut packets = Vec::new();
        for chunk in input.chunks(7) {
            packets.extend(asm.feed(chunk));
        }

        for p in &packets {
            assert_eq!(p.len(), 10);
        }
        let reassembled: Vec<u8> = packets.into_iter().flatten().collect();
        assert_eq!(reassembled, input);
        assert_eq!(asm.pending_len(), 0);
    }

    #[test]
    fn oversized_chunk_yields_multiple_packets() {
        let mut asm = PacketAssembler::new(4);
        let packets = asm.feed(b"abcdefghij");
        assert_eq!(packets, vec![b"abcd".to_vec(), b"efgh".to_vec()]);
        assert_eq!(asm.pending_len(), 2);
    }

    #[test]
    fn run_discards_incomplete_pending_at_shutdown() {
        let chunks = Arc::new(ChunkQueue::new(8));
        let packets = PacketQueue::new(8);
        let shutdown = Arc::new(AtomicBool::new(false));

        chunks.push(b"aaaa".to_vec());
        chunks.push(b"bbbb".to_vec());
        chunks.push(b"cc".to_vec()); // incomplete tail

        let handle = {
            let chunks = Arc::clone(&chunks);
            let packets = packets.clone();
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || run(chunks, packets, shutdown, 8, Duration::from_millis(5)))
        };

        // One full packet comes through, the 2-byte tail never does
        let packet = packets.pop_timeout(Duration::from_secs(2));
        assert_eq!(packet, Some(b"aaaabbbb".to_vec()));

        shutdown.store(true, Ordering::Relaxed);
        handle.join().unwrap();
        assert_eq!(packets.pop_timeout(Duration::from_millis(20)), None);
    }
}
