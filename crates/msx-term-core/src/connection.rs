//! Transport contract between the session core and its byte-stream link.

use crate::Result;

/// Byte-stream transport to the remote machine.
///
/// Concrete implementations (serial port, telnet socket) live outside this
/// workspace; the session core only needs this narrow surface. `read` may
/// return fewer bytes than requested, including none. No method is expected
/// to block indefinitely: `read` returns what is currently available and
/// `in_waiting` is a non-blocking poll.
pub trait Connection: Send {
    /// Write bytes to the transport.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Flush any buffered outgoing bytes.
    fn flush(&mut self) -> Result<()>;

    /// Read up to `max` bytes. May return fewer, or an empty vector if
    /// nothing is available.
    fn read(&mut self, max: usize) -> Result<Vec<u8>>;

    /// Number of bytes currently buffered at the transport.
    fn in_waiting(&self) -> Result<usize>;

    /// Close the transport. Closing an already-closed transport is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Whether the transport is open.
    fn is_open(&self) -> bool;
}
