//! Session lifecycle: the receive loop, the input loop, and shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use msx_term_core::{
    ClientConfig, Connection, Error, MsxMode, ProcessingMode, Result, SessionId, SessionSettings,
    SessionStatus, TimingSettings,
};
use msx_term_detector::ModeDetector;

use crate::decode::TextDecoder;
use crate::processor::{OutputEvent, StreamProcessor};

/// Display collaborator: receives output events in emission order.
pub trait OutputSink: Send + Sync {
    /// Handle one output event. Called at most once per event.
    fn emit(&self, text: &str, is_prompt: bool);
}

/// Completion/display collaborator interested in interpreter-mode changes.
pub trait ModeObserver: Send + Sync {
    /// Called at most once per confirmed mode transition.
    fn on_mode_changed(&self, mode: MsxMode);
}

/// Source of user input lines for the foreground loop.
pub trait InputSource {
    /// Block until the user enters a line. `None` means end of input.
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// What the special-command handler did with an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Not a special command: send it to the remote machine
    Forward,
    /// Consumed locally, nothing goes over the link
    Handled,
    /// The user asked to end the session
    Exit,
}

/// Hook offered every input line before it is sent to the remote machine.
pub trait CommandHandler {
    /// Inspect one input line.
    fn handle(&mut self, line: &str) -> CommandOutcome;
}

/// State shared between the two loops, guarded by one coarse lock.
///
/// The processor's operations read and mutate the buffer, echo state, and
/// last-prompt slot together, and the detector's mode must stay consistent
/// with them, so everything lives behind a single mutex.
struct SharedState {
    processor: StreamProcessor,
    detector: ModeDetector,
}

/// A terminal session over one `Connection`.
///
/// Owns a background receive loop (polls the transport, feeds the stream
/// processor, runs the timeout checks) and a foreground input loop (blocks
/// on user input, offers it to the special-command handler, otherwise sends
/// it over the link). A single stop flag is observed at the top of every
/// iteration of both loops, and the transport is closed exactly once.
pub struct Session {
    id: SessionId,
    conn: Arc<Mutex<Box<dyn Connection>>>,
    state: Arc<Mutex<SharedState>>,
    status: Arc<Mutex<SessionStatus>>,
    stop: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    /// When the receive loop last confirmed a prompt; the input loop
    /// grants a short grace period so completion sees the fresh mode.
    prompt_seen: Arc<Mutex<Option<Instant>>>,
    sink: Arc<dyn OutputSink>,
    observer: Option<Arc<dyn ModeObserver>>,
    session_cfg: SessionSettings,
    timing: TimingSettings,
}

impl Session {
    /// Create a session over `conn`, emitting output events to `sink`.
    pub fn new(
        conn: Box<dyn Connection>,
        config: &ClientConfig,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        let id = SessionId::new();
        info!(
            "Creating session: id={}, processing={}",
            id, config.session.processing
        );

        Self {
            id,
            conn: Arc::new(Mutex::new(conn)),
            state: Arc::new(Mutex::new(SharedState {
                processor: StreamProcessor::new(config.session.processing),
                detector: ModeDetector::new(),
            })),
            status: Arc::new(Mutex::new(SessionStatus::Running)),
            stop: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
            prompt_seen: Arc::new(Mutex::new(None)),
            sink,
            observer: None,
            session_cfg: config.session.clone(),
            timing: config.timing.clone(),
        }
    }

    /// Register a collaborator to be notified of mode changes.
    pub fn with_mode_observer(mut self, observer: Arc<dyn ModeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Get the current session status.
    pub fn status(&self) -> SessionStatus {
        *self.status.lock().unwrap()
    }

    /// The interpreter mode currently in effect.
    pub fn mode(&self) -> MsxMode {
        self.state.lock().unwrap().detector.mode()
    }

    /// Raise the stop signal. Both loops exit within one polling cycle.
    pub fn request_stop(&self) {
        if !self.stop.swap(true, Ordering::SeqCst) {
            self.set_status(SessionStatus::Stopping);
        }
    }

    /// Run the session to completion.
    ///
    /// Spawns the receive loop on a background thread and runs the input
    /// loop on the calling thread. Returns once both loops have finished
    /// and the transport is closed; the first error from either loop is
    /// propagated.
    pub fn run(
        &self,
        input: &mut dyn InputSource,
        handler: &mut dyn CommandHandler,
    ) -> Result<()> {
        info!("Session starting: id={}", self.id);

        let receiver = self.spawn_receive_loop()?;
        let input_result = self.input_loop(input, handler);

        self.stop.store(true, Ordering::SeqCst);
        self.set_status(SessionStatus::Stopping);
        let receive_result = match receiver.join() {
            Ok(result) => result,
            Err(_) => Err(Error::Other("receive loop panicked".to_string())),
        };

        self.close_connection();
        self.set_status(SessionStatus::Stopped);
        info!("Session finished: id={}", self.id);

        input_result.and(receive_result)
    }

    fn set_status(&self, status: SessionStatus) {
        let mut current = self.status.lock().unwrap();
        if *current != status {
            debug!("Session status: id={}, {:?} -> {:?}", self.id, *current, status);
            *current = status;
        }
    }

    fn spawn_receive_loop(&self) -> Result<thread::JoinHandle<Result<()>>> {
        let receive = ReceiveLoop {
            conn: Arc::clone(&self.conn),
            state: Arc::clone(&self.state),
            stop: Arc::clone(&self.stop),
            prompt_seen: Arc::clone(&self.prompt_seen),
            sink: Arc::clone(&self.sink),
            observer: self.observer.clone(),
            processing: self.session_cfg.processing,
            read_chunk: self.session_cfg.read_chunk_size.max(1),
            timing: self.timing.clone(),
        };

        let handle = thread::Builder::new()
            .name("msx-term-recv".to_string())
            .spawn(move || receive.run())?;

        Ok(handle)
    }

    fn input_loop(
        &self,
        input: &mut dyn InputSource,
        handler: &mut dyn CommandHandler,
    ) -> Result<()> {
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return Ok(());
            }

            self.wait_prompt_grace();

            let line = match input.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Input source closed: id={}", self.id);
                    return Ok(());
                }
                Err(e) => {
                    error!("Input error: id={}, {}", self.id, e);
                    return Err(e);
                }
            };

            match handler.handle(&line) {
                CommandOutcome::Handled => continue,
                CommandOutcome::Exit => {
                    info!("Exit requested: id={}", self.id);
                    return Ok(());
                }
                CommandOutcome::Forward => {}
            }

            self.send_command(&line)?;
        }
    }

    /// Arm echo suppression, then write the line plus terminator.
    ///
    /// Suppression must be armed before the bytes leave, or the echo could
    /// come back before the processor knows to expect it.
    fn send_command(&self, line: &str) -> Result<()> {
        self.state.lock().unwrap().processor.command_sent(line);

        let payload = format!("{}{}", line, self.session_cfg.line_ending);
        let mut conn = self.conn.lock().unwrap();
        conn.write(payload.as_bytes()).map_err(|e| {
            error!("Write failed: id={}, {}", self.id, e);
            e
        })?;
        conn.flush()?;

        Ok(())
    }

    /// Briefly hold the input loop after a prompt was detected so mode
    /// publication settles before the user is prompted.
    fn wait_prompt_grace(&self) {
        let seen = self.prompt_seen.lock().unwrap().take();
        if let Some(at) = seen {
            let grace = self.timing.prompt_grace();
            let elapsed = at.elapsed();
            if elapsed < grace {
                thread::sleep(grace - elapsed);
            }
        }
    }

    fn close_connection(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut conn = self.conn.lock().unwrap();
        if conn.is_open() {
            if let Err(e) = conn.close() {
                warn!("Error closing connection: id={}, {}", self.id, e);
            }
        }
        debug!("Connection released: id={}", self.id);
    }
}

/// Everything the background thread needs, cloned out of the session.
struct ReceiveLoop {
    conn: Arc<Mutex<Box<dyn Connection>>>,
    state: Arc<Mutex<SharedState>>,
    stop: Arc<AtomicBool>,
    prompt_seen: Arc<Mutex<Option<Instant>>>,
    sink: Arc<dyn OutputSink>,
    observer: Option<Arc<dyn ModeObserver>>,
    processing: ProcessingMode,
    read_chunk: usize,
    timing: TimingSettings,
}

impl ReceiveLoop {
    fn run(self) -> Result<()> {
        let result = self.poll_loop();
        if let Err(e) = &result {
            error!("Receive loop terminated: {}", e);
        }
        // Whatever the reason, the session is over once this loop ends.
        self.stop.store(true, Ordering::SeqCst);
        result
    }

    fn poll_loop(&self) -> Result<()> {
        let mut decoder = TextDecoder::new();
        let mut empty_polls: u32 = 0;
        let mut last_check = Instant::now();

        loop {
            if self.stop.load(Ordering::Relaxed) {
                return Ok(());
            }

            let available = {
                let conn = self.conn.lock().unwrap();
                if !conn.is_open() {
                    debug!("Connection no longer open, receive loop ending");
                    return Ok(());
                }
                conn.in_waiting()?
            };

            if available > 0 {
                empty_polls = 0;

                // Character granularity keeps per-byte display latency at
                // effectively zero in instant mode.
                let want = match self.processing {
                    ProcessingMode::Instant => 1,
                    ProcessingMode::Buffered => available.min(self.read_chunk),
                };

                let bytes = self.conn.lock().unwrap().read(want)?;
                if !bytes.is_empty() {
                    match decoder.decode(&bytes) {
                        Ok(text) if !text.is_empty() => self.process_text(&text),
                        Ok(_) => {}
                        Err(e) => warn!("Dropped undecodable chunk: {}", e),
                    }
                }
            } else {
                // Adaptive backoff: no sleep while bytes flow, a short one
                // right after the stream goes idle, a longer one once the
                // line has stayed quiet.
                empty_polls = empty_polls.saturating_add(1);
                if empty_polls >= self.timing.idle_backoff_after_polls {
                    thread::sleep(self.timing.idle_backoff_long());
                } else {
                    thread::sleep(self.timing.idle_backoff_short());
                }
            }

            // Timeout checks run on their own cadence, independent of
            // data arrival.
            if last_check.elapsed() >= self.timing.check_interval() {
                last_check = Instant::now();
                self.run_timeout_checks();
            }
        }
    }

    fn process_text(&self, text: &str) {
        let (events, mode_change) = {
            let mut state = self.state.lock().unwrap();
            let events = state.processor.ingest(text);
            let mode_change = Self::apply_prompts(&mut state, &events);
            (events, mode_change)
        };

        self.dispatch(&events, mode_change);
    }

    fn run_timeout_checks(&self) {
        let (events, mode_change) = {
            let mut state = self.state.lock().unwrap();
            let mut events = Vec::new();

            if let Some(event) = state.processor.check_idle_timeout(self.timing.idle_timeout()) {
                events.push(event);
            }
            if let Some(event) = state
                .processor
                .check_candidate_timeout(self.timing.candidate_timeout())
            {
                events.push(event);
            }

            let mode_change = Self::apply_prompts(&mut state, &events);
            (events, mode_change)
        };

        self.dispatch(&events, mode_change);
    }

    /// Feed the text of any confirmed prompt to the mode detector.
    /// Returns the new mode if it changed.
    fn apply_prompts(state: &mut SharedState, events: &[OutputEvent]) -> Option<MsxMode> {
        let mut change = None;

        for event in events {
            if !event.is_prompt {
                continue;
            }
            if let Some(prompt_text) = state.processor.take_last_prompt() {
                let (mode, changed) = state.detector.force_update(&prompt_text);
                if changed {
                    info!("Interpreter mode is now {}", mode);
                    change = Some(mode);
                }
            }
        }

        change
    }

    /// Emit events and publish any mode change, outside the state lock.
    fn dispatch(&self, events: &[OutputEvent], mode_change: Option<MsxMode>) {
        for event in events {
            self.sink.emit(&event.text, event.is_prompt);
        }

        if events.iter().any(|e| e.is_prompt) {
            *self.prompt_seen.lock().unwrap() = Some(Instant::now());
        }

        if let Some(mode) = mode_change {
            if let Some(observer) = &self.observer {
                observer.on_mode_changed(mode);
            }
        }
    }
}
