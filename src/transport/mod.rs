//! Transport layer for instrument I/O abstraction

use crate::error::Result;

mod serial;
pub use serial::SerialTransport;

#[cfg(test)]
mod mock;
#[cfg(test)]
pub use mock::MockTransport;

/// Transport trait for instrument communication
pub trait Transport: Send {
    /// Fill `buf` completely within the transport's read timeout.
    ///
    /// A short read is an error: the acquisition contract is one full
    /// chunk per cycle, and anything less means the instrument link is
    /// broken.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Discard any bytes already buffered on the device side
    fn clear_input(&mut self) -> Result<()> {
        Ok(())
    }
}
