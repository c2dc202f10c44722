//! Wire protocol framing
//!
//! The protocol is deliberately minimal: a one-shot ASCII handshake from
//! the server, then fixed-width 8-byte ASCII commands from the client and
//! raw packet bytes back.
//!
//! ```text
//! server -> client, on connect   ASCII digits of BUF, then literal "EOT"
//! client -> server               exactly 8 bytes, prefix "GIVEDATA"
//! server -> client               exactly BUF raw bytes (one packet)
//! client -> server               exactly 8 bytes, prefix "KTHXBYE!"
//! ```

use std::io::{self, Read};

/// Every client request is exactly this many bytes
pub const COMMAND_LEN: usize = 8;

/// Request one packet
pub const CMD_GIVE_DATA: &[u8] = b"GIVEDATA";

/// Request orderly server shutdown
pub const CMD_SHUTDOWN: &[u8] = b"KTHXBYE!";

/// Handshake terminator; the client concatenates received bytes until it
/// sees this sentinel, then parses the prefix as the packet size
pub const HANDSHAKE_SENTINEL: &str = "EOT";

/// Handshake bytes announcing the negotiated packet size
///
/// Digits and sentinel are sent with no delimiter: `65536EOT`.
pub fn handshake(packet_size: usize) -> Vec<u8> {
    format!("{}{}", packet_size, HANDSHAKE_SENTINEL).into_bytes()
}

/// Read exactly `len` bytes from a blocking stream, retrying partial reads.
///
/// Returns `UnexpectedEof` if the peer closes mid-frame. This is the
/// client-side primitive for both the packet body and any fixed-width
/// frame; the server's own command reads accumulate across poll ticks
/// instead, since its sockets are nonblocking.
pub fn recv_exact<R: Read>(stream: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut data = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match stream.read(&mut data[filled..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-frame",
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(data)
}
