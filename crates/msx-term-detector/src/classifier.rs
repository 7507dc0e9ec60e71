//! Interpreter-mode tracking.

use tracing::debug;

use msx_term_core::MsxMode;

use crate::patterns;

/// Tracks which interpreter the remote MSX is presumed to be running.
///
/// The detector is a plain value owned by its session; there is no global
/// state. The current mode only ever changes through [`force_update`], which
/// is fed the text of confirmed prompts.
///
/// [`force_update`]: ModeDetector::force_update
#[derive(Debug, Clone)]
pub struct ModeDetector {
    mode: MsxMode,
}

impl ModeDetector {
    /// Create a detector starting in `Unknown` mode.
    pub fn new() -> Self {
        Self {
            mode: MsxMode::Unknown,
        }
    }

    /// Create a detector starting in a specific mode.
    pub fn with_mode(mode: MsxMode) -> Self {
        Self { mode }
    }

    /// The current mode.
    pub fn mode(&self) -> MsxMode {
        self.mode
    }

    /// Classify a fragment without touching the current mode.
    pub fn classify(&self, text: &str) -> MsxMode {
        patterns::classify(text)
    }

    /// Classify `prompt_text` and update the current mode if the result is
    /// conclusive and different.
    ///
    /// Returns the mode now in effect and whether it changed. An `Unknown`
    /// classification leaves the mode untouched and reports no change.
    pub fn force_update(&mut self, prompt_text: &str) -> (MsxMode, bool) {
        let detected = patterns::classify(prompt_text);

        if detected == MsxMode::Unknown {
            return (self.mode, false);
        }

        if detected != self.mode {
            debug!(from = %self.mode, to = %detected, "interpreter mode changed");
            self.mode = detected;
            return (detected, true);
        }

        (detected, false)
    }
}

impl Default for ModeDetector {
    fn default() -> Self {
        Self::new()
    }
}
