//! Incremental decoding of transport bytes into text.

use msx_term_core::{Error, Result};

/// Stateful UTF-8 decoder for byte-at-a-time transports.
///
/// Character-granularity reads can split a multi-byte scalar across two
/// reads, so the decoder carries incomplete trailing sequences between
/// calls and only reports an error for byte sequences that can never
/// become valid.
#[derive(Debug, Default)]
pub struct TextDecoder {
    pending: Vec<u8>,
}

impl TextDecoder {
    /// Create a decoder with no pending bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next received bytes.
    ///
    /// Returns the decoded text, which may be empty if the bytes so far
    /// form only the beginning of a multi-byte sequence. An invalid
    /// sequence yields a decode error and drops the undecodable input,
    /// leaving the decoder clean for the next chunk.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<String> {
        self.pending.extend_from_slice(bytes);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                Ok(text)
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();

                if e.error_len().is_none() {
                    // Incomplete trailing sequence: hand out the valid part
                    // and keep the tail for the next read.
                    let text =
                        String::from_utf8_lossy(&self.pending[..valid_up_to]).into_owned();
                    self.pending.drain(..valid_up_to);
                    Ok(text)
                } else {
                    let offending = self.pending.get(valid_up_to).copied().unwrap_or(0);
                    self.pending.clear();
                    Err(Error::Decode(format!(
                        "invalid UTF-8 byte 0x{offending:02x} in received chunk"
                    )))
                }
            }
        }
    }

    /// Whether an incomplete sequence is being carried.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
