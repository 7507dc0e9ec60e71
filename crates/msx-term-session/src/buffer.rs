//! Accumulation buffer for received text.

use std::time::{Duration, Instant};

/// Text received since the last prompt (or flush), plus when it last grew.
///
/// The idle queries drive the timeout checks: a buffer that has not been
/// appended to for longer than a threshold is considered stale and gets
/// flushed or cleared by the stream processor.
#[derive(Debug)]
pub struct StreamBuffer {
    content: String,
    last_update: Instant,
}

impl StreamBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            content: String::new(),
            last_update: Instant::now(),
        }
    }

    /// Append received text and refresh the update timestamp.
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
        self.last_update = Instant::now();
    }

    /// Replace the whole content (used after echo stripping).
    pub fn replace(&mut self, text: &str) {
        self.content.clear();
        self.content.push_str(text);
        self.last_update = Instant::now();
    }

    /// Current buffered text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the buffer holds nothing.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Buffered length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Time since the buffer last changed.
    pub fn idle_time(&self) -> Duration {
        self.last_update.elapsed()
    }

    /// Whether the buffer has not changed for at least `threshold`.
    pub fn is_idle_for(&self, threshold: Duration) -> bool {
        self.idle_time() >= threshold
    }

    /// Drop all content.
    pub fn clear(&mut self) {
        self.content.clear();
        self.last_update = Instant::now();
    }

    /// Backdate the last update, so tests can reach idle thresholds
    /// without sleeping.
    #[cfg(test)]
    pub(crate) fn age_by(&mut self, by: Duration) {
        self.last_update -= by;
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}
