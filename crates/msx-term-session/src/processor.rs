//! Chunk ingestion: echo stripping, prompt detection, timeout flushes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use msx_term_core::ProcessingMode;
use msx_term_detector::{is_candidate_prefix, is_complete_prompt};

use crate::buffer::StreamBuffer;
use crate::echo::EchoSuppressor;

/// A unit of output for the display collaborator.
///
/// Prompt events in instant mode carry empty text, because the prompt's
/// characters were already displayed as they arrived; the event itself is
/// what tells downstream code a prompt line just completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    /// Text to display (may be empty for instant-mode prompt events)
    pub text: String,
    /// Whether this event marks a completed prompt
    pub is_prompt: bool,
}

impl OutputEvent {
    /// Create an event with explicit prompt tagging.
    pub fn new(text: impl Into<String>, is_prompt: bool) -> Self {
        Self {
            text: text.into(),
            is_prompt,
        }
    }

    /// Create a plain text event.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    /// Create a prompt event.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }
}

/// Turns received chunks into display events and detects prompts.
///
/// Composes the stream buffer and the echo suppressor with the prompt
/// pattern table. In instant mode every character is emitted the moment it
/// arrives (except while it may still be the echo of the last sent
/// command); in buffered mode lines are held back until a prompt closes
/// them off. The two timeout checks run outside the data path, on the
/// receive loop's cadence.
#[derive(Debug)]
pub struct StreamProcessor {
    mode: ProcessingMode,
    buffer: StreamBuffer,
    echo: EchoSuppressor,
    last_prompt: Option<String>,
    /// Swallow `\r`/`\n`/space after a stripped echo whose terminator had
    /// not arrived yet at strip time.
    trim_echo_tail: bool,
}

impl StreamProcessor {
    /// Create a processor for the given mode.
    pub fn new(mode: ProcessingMode) -> Self {
        Self {
            mode,
            buffer: StreamBuffer::new(),
            echo: EchoSuppressor::new(),
            last_prompt: None,
            trim_echo_tail: false,
        }
    }

    /// The processing mode this processor was built with.
    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Record a command the user just sent, arming echo suppression.
    pub fn command_sent(&mut self, command: &str) {
        self.echo.set_last_command(command);
        self.trim_echo_tail = false;
    }

    /// Take the text of the most recently detected prompt.
    ///
    /// Set each time a prompt event is produced; consumed by the session
    /// to run mode detection.
    pub fn take_last_prompt(&mut self) -> Option<String> {
        self.last_prompt.take()
    }

    /// Process one received chunk, returning display events in order.
    ///
    /// Echo stripping always runs before prompt detection: the remainder
    /// after a stripped echo can itself be a complete prompt that the
    /// echoed command text was masking.
    pub fn ingest(&mut self, chunk: &str) -> Vec<OutputEvent> {
        if chunk.is_empty() {
            return Vec::new();
        }

        match self.mode {
            ProcessingMode::Instant => self.ingest_instant(chunk),
            ProcessingMode::Buffered => self.ingest_buffered(chunk),
        }
    }

    fn ingest_instant(&mut self, chunk: &str) -> Vec<OutputEvent> {
        let mut events = Vec::new();

        // The echo's line terminator may trail into chunks that arrive
        // after the strip; swallow it up to the first real character.
        let chunk = if self.trim_echo_tail {
            let trimmed = chunk.trim_start_matches(['\r', '\n', ' ']);
            if trimmed.is_empty() {
                return events;
            }
            self.trim_echo_tail = false;
            trimmed
        } else {
            chunk
        };

        self.buffer.append(chunk);

        if self.echo.is_pending() {
            if let Some(remainder) = self.echo.try_strip(self.buffer.content()) {
                self.trim_echo_tail = remainder.is_empty();
                self.buffer.replace(&remainder);
                if !remainder.is_empty() {
                    events.push(OutputEvent::plain(remainder));
                }
            } else if !self.echo.could_become_echo(self.buffer.content()) {
                // Not an echo after all: display what was withheld.
                self.echo.abandon();
                events.push(OutputEvent::plain(self.buffer.content()));
            }
            // Otherwise the chunk is still inside the expected echo and
            // stays withheld.
        } else {
            events.push(OutputEvent::plain(chunk));
        }

        if is_complete_prompt(self.buffer.content()) {
            self.record_prompt();
            self.buffer.clear();
            events.push(OutputEvent::prompt(""));
        }

        events
    }

    fn ingest_buffered(&mut self, chunk: &str) -> Vec<OutputEvent> {
        let mut events = Vec::new();

        self.buffer.append(chunk);

        if self.echo.is_pending() {
            if let Some(remainder) = self.echo.try_strip(self.buffer.content()) {
                self.buffer.replace(&remainder);
            }
        }

        if is_complete_prompt(self.buffer.content()) {
            let content = self.buffer.content().to_string();
            let lines: Vec<&str> = content.lines().collect();

            if let Some((last, head)) = lines.split_last() {
                for line in head {
                    if !line.trim().is_empty() {
                        events.push(OutputEvent::plain(*line));
                    }
                }

                let is_prompt = is_complete_prompt(last);
                if is_prompt {
                    self.last_prompt = Some(last.trim().to_string());
                }
                events.push(OutputEvent::new(*last, is_prompt));
            }

            self.buffer.clear();
        }

        events
    }

    /// Flush a buffer that has been idle for at least `threshold`.
    ///
    /// In buffered mode the whole buffer goes out as one event, tagged by
    /// whether it is a complete prompt. In instant mode the bytes were
    /// already displayed, so the flush only produces an event when the
    /// content is a prompt - except that content still withheld for echo
    /// matching was never shown and is emitted before being dropped.
    pub fn check_idle_timeout(&mut self, threshold: Duration) -> Option<OutputEvent> {
        if self.buffer.is_empty() || !self.buffer.is_idle_for(threshold) {
            return None;
        }

        match self.mode {
            ProcessingMode::Buffered => {
                let content = self.buffer.content().to_string();
                self.buffer.clear();

                let is_prompt = is_complete_prompt(&content);
                if is_prompt {
                    self.last_prompt = Some(content.trim().to_string());
                }

                debug!(bytes = content.len(), is_prompt, "idle flush");
                Some(OutputEvent::new(content, is_prompt))
            }
            ProcessingMode::Instant => {
                if is_complete_prompt(self.buffer.content()) {
                    self.record_prompt();
                    self.buffer.clear();
                    Some(OutputEvent::prompt(""))
                } else if self.echo.is_pending() {
                    let content = self.buffer.content().to_string();
                    self.echo.abandon();
                    self.buffer.clear();
                    Some(OutputEvent::plain(content))
                } else {
                    debug!(bytes = self.buffer.len(), "idle clear");
                    self.buffer.clear();
                    None
                }
            }
        }
    }

    /// Resolve a short prompt-candidate fragment after a brief idle period.
    ///
    /// Runs on a much shorter threshold than the ordinary idle flush. A
    /// candidate that has stabilized into a complete prompt (`Ok`, `Ready`)
    /// is flushed as one immediately; a strict prefix such as a lone `A` is
    /// left alone, since the rest of the prompt may still be in flight.
    pub fn check_candidate_timeout(&mut self, threshold: Duration) -> Option<OutputEvent> {
        if self.buffer.is_empty() || !self.buffer.is_idle_for(threshold) {
            return None;
        }

        if !is_candidate_prefix(self.buffer.content()) {
            return None;
        }

        if !is_complete_prompt(self.buffer.content()) {
            return None;
        }

        let content = self.buffer.content().to_string();
        self.record_prompt();
        self.buffer.clear();

        match self.mode {
            ProcessingMode::Instant => Some(OutputEvent::prompt("")),
            ProcessingMode::Buffered => Some(OutputEvent::prompt(content)),
        }
    }

    fn record_prompt(&mut self) {
        self.last_prompt = Some(self.buffer.content().trim().to_string());
    }

    /// Backdate the buffer so tests can cross idle thresholds without
    /// sleeping.
    #[cfg(test)]
    pub(crate) fn age_buffer_by(&mut self, by: Duration) {
        self.buffer.age_by(by);
    }
}
