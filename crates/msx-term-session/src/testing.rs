//! Test doubles for driving a session without real hardware.
//!
//! A `ScriptedConnection` plays back a byte script, optionally gating parts
//! of it on the session having written something first (the way a remote
//! machine only echoes after receiving a command). `CollectingSink`,
//! `RecordingObserver`, and `ScriptedInput` capture the other side of the
//! collaborator contracts.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use msx_term_core::{Connection, MsxMode, Result};

use crate::orchestrator::{
    CommandHandler, CommandOutcome, InputSource, ModeObserver, OutputSink,
};
use crate::processor::OutputEvent;

enum ScriptStep {
    /// Make these bytes available to read
    Feed(Vec<u8>),
    /// Hold further steps until the session writes something
    AwaitWrite,
}

struct ScriptState {
    steps: VecDeque<ScriptStep>,
    incoming: VecDeque<u8>,
    open: bool,
}

impl ScriptState {
    /// Move feed steps into the incoming buffer, stopping at a write gate.
    fn advance(&mut self) {
        while let Some(ScriptStep::Feed(_)) = self.steps.front() {
            if let Some(ScriptStep::Feed(bytes)) = self.steps.pop_front() {
                self.incoming.extend(bytes);
            }
        }
    }

    fn exhausted(&self) -> bool {
        self.incoming.is_empty() && self.steps.is_empty()
    }
}

/// In-memory `Connection` that plays back a scripted byte stream.
///
/// The connection reports itself closed once the script is exhausted, which
/// ends a session's receive loop naturally.
pub struct ScriptedConnection {
    state: Mutex<ScriptState>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedConnection {
    /// Create a connection with an empty script.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                steps: VecDeque::new(),
                incoming: VecDeque::new(),
                open: true,
            }),
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append bytes the remote side sends.
    pub fn feed(self, bytes: &[u8]) -> Self {
        self.state
            .lock()
            .unwrap()
            .steps
            .push_back(ScriptStep::Feed(bytes.to_vec()));
        self
    }

    /// Hold the rest of the script until the session writes something.
    pub fn await_write(self) -> Self {
        self.state
            .lock()
            .unwrap()
            .steps
            .push_back(ScriptStep::AwaitWrite);
        self
    }

    /// Shared handle to everything the session has written.
    ///
    /// Keep a clone before moving the connection into the session.
    pub fn written_handle(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }
}

impl Default for ScriptedConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for ScriptedConnection {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.written.lock().unwrap().extend_from_slice(data);

        let mut state = self.state.lock().unwrap();
        if let Some(ScriptStep::AwaitWrite) = state.steps.front() {
            state.steps.pop_front();
        }
        state.advance();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.advance();
        let n = max.min(state.incoming.len());
        Ok(state.incoming.drain(..n).collect())
    }

    fn in_waiting(&self) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.advance();
        Ok(state.incoming.len())
    }

    fn close(&mut self) -> Result<()> {
        self.state.lock().unwrap().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.open && !state.exhausted()
    }
}

/// Output sink that records every emitted event.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<OutputEvent>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events emitted so far, in order.
    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Concatenated text of the non-prompt events: what the user saw.
    pub fn visible_text(&self) -> String {
        self.events()
            .iter()
            .filter(|e| !e.is_prompt)
            .map(|e| e.text.as_str())
            .collect()
    }
}

impl OutputSink for CollectingSink {
    fn emit(&self, text: &str, is_prompt: bool) {
        self.events
            .lock()
            .unwrap()
            .push(OutputEvent::new(text, is_prompt));
    }
}

/// Mode observer that records every notified transition.
#[derive(Default)]
pub struct RecordingObserver {
    modes: Mutex<Vec<MsxMode>>,
}

impl RecordingObserver {
    /// Create an empty observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// All mode transitions notified so far, in order.
    pub fn modes(&self) -> Vec<MsxMode> {
        self.modes.lock().unwrap().clone()
    }
}

impl ModeObserver for RecordingObserver {
    fn on_mode_changed(&self, mode: MsxMode) {
        self.modes.lock().unwrap().push(mode);
    }
}

/// Input source that replays a fixed list of lines, then reports EOF.
pub struct ScriptedInput {
    lines: VecDeque<String>,
    delay: Duration,
}

impl ScriptedInput {
    /// Create an input source over the given lines.
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            delay: Duration::ZERO,
        }
    }

    /// Sleep before each line (and before reporting EOF), giving the
    /// receive loop time to drain what the script has already fed - the
    /// way a human only types after reading the prompt.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self) -> Result<Option<String>> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.lines.pop_front())
    }
}

/// Command handler that forwards every line unchanged.
pub struct NoSpecialCommands;

impl CommandHandler for NoSpecialCommands {
    fn handle(&mut self, _line: &str) -> CommandOutcome {
        CommandOutcome::Forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_connection_feeds_in_order() {
        let mut conn = ScriptedConnection::new().feed(b"AB").feed(b"CD");

        assert!(conn.is_open());
        assert_eq!(conn.in_waiting().unwrap(), 4);
        assert_eq!(conn.read(3).unwrap(), b"ABC");
        assert_eq!(conn.read(3).unwrap(), b"D");
        assert!(!conn.is_open()); // exhausted
    }

    #[test]
    fn test_scripted_connection_write_gate() {
        let mut conn = ScriptedConnection::new().feed(b"A>").await_write().feed(b"echo");

        assert_eq!(conn.in_waiting().unwrap(), 2);
        assert_eq!(conn.read(2).unwrap(), b"A>");

        // The gated feed is invisible until something is written.
        assert_eq!(conn.in_waiting().unwrap(), 0);
        assert!(conn.is_open());

        conn.write(b"DIR\r\n").unwrap();
        assert_eq!(conn.in_waiting().unwrap(), 4);
        assert_eq!(conn.read(4).unwrap(), b"echo");
    }

    #[test]
    fn test_scripted_connection_records_writes() {
        let mut conn = ScriptedConnection::new().feed(b"x");
        let written = conn.written_handle();

        conn.write(b"DIR").unwrap();
        conn.write(b"\r\n").unwrap();
        assert_eq!(written.lock().unwrap().as_slice(), b"DIR\r\n");
    }

    #[test]
    fn test_scripted_input_replays_then_eof() {
        let mut input = ScriptedInput::new(&["DIR", "LIST"]);

        assert_eq!(input.read_line().unwrap().as_deref(), Some("DIR"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some("LIST"));
        assert_eq!(input.read_line().unwrap(), None);
    }

    #[test]
    fn test_collecting_sink_visible_text() {
        let sink = CollectingSink::new();
        sink.emit("A", false);
        sink.emit("", true);
        sink.emit("B", false);

        assert_eq!(sink.visible_text(), "AB");
        assert_eq!(sink.events().len(), 3);
    }
}
