//! Configuration types for the MSX terminal client.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::session::ProcessingMode;

/// Client configuration loaded from YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Session settings
    pub session: SessionSettings,
    /// Timing settings
    pub timing: TimingSettings,
}

impl ClientConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: ClientConfig =
            serde_yaml::from_str(yaml).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        self.timing.validate()?;

        if self.session.line_ending.is_empty() {
            return Err(crate::Error::Config(
                "session.line_ending cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Stream processing strategy (instant or buffered)
    pub processing: ProcessingMode,
    /// Line terminator appended to sent commands
    pub line_ending: String,
    /// Maximum bytes read from the transport per poll in buffered mode
    pub read_chunk_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            processing: ProcessingMode::Instant,
            line_ending: "\r\n".to_string(),
            read_chunk_size: 256,
        }
    }
}

/// Timing settings.
///
/// These values are empirically tuned for real serial links; none of them is
/// a correctness requirement, which is why they live in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Idle time after which a non-empty buffer is flushed, in milliseconds
    pub idle_timeout_ms: u64,
    /// Shorter idle time used to resolve prompt-candidate fragments, in milliseconds
    pub candidate_timeout_ms: u64,
    /// Cadence of the timeout checks in the receive loop, in milliseconds
    pub check_interval_ms: u64,
    /// Grace period before prompting for input after a prompt was detected, in milliseconds
    pub prompt_grace_ms: u64,
    /// Sleep applied right after the stream goes idle, in microseconds
    pub idle_backoff_short_us: u64,
    /// Sleep applied once the stream has stayed idle, in microseconds
    pub idle_backoff_long_us: u64,
    /// Consecutive empty polls before escalating to the long backoff
    pub idle_backoff_after_polls: u32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 100,
            candidate_timeout_ms: 20,
            check_interval_ms: 10,
            prompt_grace_ms: 5,
            idle_backoff_short_us: 200,
            idle_backoff_long_us: 1000,
            idle_backoff_after_polls: 8,
        }
    }
}

impl TimingSettings {
    /// Validate timing values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.idle_timeout_ms == 0 {
            return Err(crate::Error::Config(
                "timing.idle_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.candidate_timeout_ms == 0 {
            return Err(crate::Error::Config(
                "timing.candidate_timeout_ms must be > 0".to_string(),
            ));
        }

        // The candidate check exists to resolve fragments faster than the
        // ordinary idle flush; an equal or longer value makes it dead code.
        if self.candidate_timeout_ms >= self.idle_timeout_ms {
            return Err(crate::Error::Config(
                "timing.candidate_timeout_ms must be < timing.idle_timeout_ms".to_string(),
            ));
        }

        if self.check_interval_ms == 0 {
            return Err(crate::Error::Config(
                "timing.check_interval_ms must be > 0".to_string(),
            ));
        }

        if self.idle_backoff_long_us == 0 {
            return Err(crate::Error::Config(
                "timing.idle_backoff_long_us must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Idle flush threshold as a `Duration`.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Candidate resolution threshold as a `Duration`.
    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_millis(self.candidate_timeout_ms)
    }

    /// Timeout-check cadence as a `Duration`.
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Input-prompt grace period as a `Duration`.
    pub fn prompt_grace(&self) -> Duration {
        Duration::from_millis(self.prompt_grace_ms)
    }

    /// Short idle backoff as a `Duration`.
    pub fn idle_backoff_short(&self) -> Duration {
        Duration::from_micros(self.idle_backoff_short_us)
    }

    /// Long idle backoff as a `Duration`.
    pub fn idle_backoff_long(&self) -> Duration {
        Duration::from_micros(self.idle_backoff_long_us)
    }
}
