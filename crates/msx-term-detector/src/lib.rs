//! # msx-term-detector
//!
//! Prompt pattern matching and interpreter-mode classification for the MSX
//! terminal client.
//!
//! This crate provides:
//! - The canonical prompt pattern table (DOS drive prompts, BASIC `Ok`/`Ready`,
//!   the `?Redo from start` error prompt)
//! - Complete-prompt and candidate-prefix checks over buffered fragments
//! - The `ModeDetector` that tracks which interpreter the remote machine is
//!   presumed to be running
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on msx-term-core
//! and is itself free of I/O and timing concerns; everything here is a pure
//! computation over text fragments.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classifier;
pub mod patterns;

// Re-export commonly used types
pub use classifier::ModeDetector;
pub use patterns::{classify, is_candidate_prefix, is_complete_prompt, PromptFamily};
