//! Acquisition pipeline: source reader, bounded queues, packet assembler

pub mod assembler;
pub mod queue;
pub mod reader;

pub use assembler::PacketAssembler;
pub use queue::{ChunkQueue, PacketQueue};
