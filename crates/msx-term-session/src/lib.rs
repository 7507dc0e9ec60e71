//! # msx-term-session
//!
//! Stream processing and session lifecycle for the MSX terminal client.
//!
//! This crate provides:
//! - The stream buffer, echo suppressor, and incremental text decoder
//! - The `StreamProcessor` that turns raw chunks into display events and
//!   detects prompts in instant or buffered mode
//! - The `Session` orchestrator: a background receive loop and a foreground
//!   input loop over a shared `Connection`
//! - Scripted test doubles for driving a session without real hardware
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on msx-term-core and
//! msx-term-detector and owns all timing and concurrency concerns.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod decode;
pub mod echo;
pub mod orchestrator;
pub mod processor;
pub mod testing;

// Re-export commonly used types
pub use buffer::StreamBuffer;
pub use decode::TextDecoder;
pub use echo::EchoSuppressor;
pub use orchestrator::{CommandHandler, CommandOutcome, InputSource, ModeObserver, OutputSink, Session};
pub use processor::{OutputEvent, StreamProcessor};
