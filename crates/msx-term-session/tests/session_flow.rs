//! End-to-end session tests over a scripted connection.
//!
//! Each test plays a remote MSX: the script feeds prompt and output bytes,
//! gated on the session's own writes the way a half-duplex link would be.

use std::sync::Arc;
use std::time::Duration;

use msx_term_core::{ClientConfig, MsxMode, ProcessingMode, SessionStatus};
use msx_term_session::testing::{
    CollectingSink, NoSpecialCommands, RecordingObserver, ScriptedConnection, ScriptedInput,
};
use msx_term_session::Session;

/// The DIR round trip from a DOS prompt, instant mode: the echo of the
/// sent command is suppressed, the command output and the next prompt are
/// displayed, and the mode settles on DOS.
#[test]
fn instant_session_suppresses_echo_and_detects_dos() {
    let conn = ScriptedConnection::new()
        .feed(b"A>")
        .await_write()
        .feed(b"DIR\r\nHELP <dir>\r\nA>");
    let written = conn.written_handle();

    let sink = Arc::new(CollectingSink::new());
    let observer = Arc::new(RecordingObserver::new());

    let config = ClientConfig::default();
    let session = Session::new(Box::new(conn), &config, Arc::clone(&sink) as _)
        .with_mode_observer(Arc::clone(&observer) as _);

    let mut input = ScriptedInput::new(&["DIR"]).with_delay(Duration::from_millis(100));
    let mut handler = NoSpecialCommands;
    session.run(&mut input, &mut handler).unwrap();

    // The command went over the link with its terminator.
    assert_eq!(written.lock().unwrap().as_slice(), b"DIR\r\n");

    // The echoed "DIR" was stripped; the real output was displayed.
    let visible = sink.visible_text();
    assert!(visible.starts_with("A>"), "visible: {visible:?}");
    assert!(visible.contains("HELP <dir>"), "visible: {visible:?}");
    assert!(!visible.contains("DIR"), "visible: {visible:?}");

    // Both drive prompts were confirmed.
    let prompts = sink.events().iter().filter(|e| e.is_prompt).count();
    assert_eq!(prompts, 2);

    // One mode transition, published once.
    assert_eq!(observer.modes(), vec![MsxMode::Dos]);
    assert_eq!(session.mode(), MsxMode::Dos);
    assert_eq!(session.status(), SessionStatus::Stopped);
}

/// The same round trip in buffered mode: output is held back and emitted
/// as whole lines once the closing prompt arrives.
#[test]
fn buffered_session_emits_lines_on_prompt() {
    let conn = ScriptedConnection::new()
        .await_write()
        .feed(b"DIR\r\nHELP <dir>\r\nA>");

    let sink = Arc::new(CollectingSink::new());

    let mut config = ClientConfig::default();
    config.session.processing = ProcessingMode::Buffered;

    let session = Session::new(Box::new(conn), &config, Arc::clone(&sink) as _);

    let mut input = ScriptedInput::new(&["DIR"]).with_delay(Duration::from_millis(50));
    let mut handler = NoSpecialCommands;
    session.run(&mut input, &mut handler).unwrap();

    let events = sink.events();
    assert_eq!(events.len(), 2, "events: {events:?}");
    assert_eq!(events[0].text, "HELP <dir>");
    assert!(!events[0].is_prompt);
    assert_eq!(events[1].text, "A>");
    assert!(events[1].is_prompt);

    assert_eq!(session.mode(), MsxMode::Dos);
}

/// A BASIC session: the Ok prompt flips the mode to BASIC exactly once,
/// even when several BASIC prompts arrive.
#[test]
fn basic_prompts_publish_one_transition() {
    let conn = ScriptedConnection::new().feed(b"Ok\r\n").feed(b"Ready\r\n");

    let sink = Arc::new(CollectingSink::new());
    let observer = Arc::new(RecordingObserver::new());

    let config = ClientConfig::default();
    let session = Session::new(Box::new(conn), &config, Arc::clone(&sink) as _)
        .with_mode_observer(Arc::clone(&observer) as _);

    let mut input = ScriptedInput::new(&[]).with_delay(Duration::from_millis(50));
    let mut handler = NoSpecialCommands;
    session.run(&mut input, &mut handler).unwrap();

    assert_eq!(observer.modes(), vec![MsxMode::Basic]);
    assert_eq!(session.mode(), MsxMode::Basic);
}

/// Switching interpreters mid-session: BASIC's prompt, then a DOS drive
/// prompt after the user calls the DOS shell.
#[test]
fn mode_follows_interpreter_switches() {
    let conn = ScriptedConnection::new()
        .feed(b"Ok")
        .await_write()
        .feed(b"CALL SYSTEM\r\nA>");

    let observer = Arc::new(RecordingObserver::new());
    let config = ClientConfig::default();
    let session = Session::new(
        Box::new(conn),
        &config,
        Arc::new(CollectingSink::new()) as _,
    )
    .with_mode_observer(Arc::clone(&observer) as _);

    let mut input = ScriptedInput::new(&["CALL SYSTEM"]).with_delay(Duration::from_millis(100));
    let mut handler = NoSpecialCommands;
    session.run(&mut input, &mut handler).unwrap();

    assert_eq!(observer.modes(), vec![MsxMode::Basic, MsxMode::Dos]);
    assert_eq!(session.mode(), MsxMode::Dos);
}
