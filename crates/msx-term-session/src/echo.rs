//! Suppression of the remote echo of locally-sent commands.

use tracing::trace;

/// Locates and removes the transport's echo of the last sent command.
///
/// The remote side retransmits every character the user types; without
/// stripping, each command would appear twice on screen. One suppression
/// round happens per sent command: [`set_last_command`] arms it, and the
/// first successful [`try_strip`] disarms it until the next send.
///
/// [`set_last_command`]: EchoSuppressor::set_last_command
/// [`try_strip`]: EchoSuppressor::try_strip
#[derive(Debug, Default)]
pub struct EchoSuppressor {
    last_command: Option<String>,
    suppressed: bool,
}

impl EchoSuppressor {
    /// Create a suppressor with no command armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the command that was just sent and arm suppression for it.
    ///
    /// The text is stored trimmed. An empty command (a bare Enter) arms
    /// nothing; there is no echo worth hiding and an empty needle would
    /// match anywhere.
    pub fn set_last_command(&mut self, command: &str) {
        let command = command.trim();
        self.suppressed = false;
        self.last_command = if command.is_empty() {
            None
        } else {
            Some(command.to_string())
        };
    }

    /// The command currently armed, if any.
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    /// Whether an echo is still expected for the last sent command.
    pub fn is_pending(&self) -> bool {
        self.last_command.is_some() && !self.suppressed
    }

    /// Whether the echo for the last command has already been handled.
    pub fn suppressed(&self) -> bool {
        self.suppressed
    }

    /// Try to locate and strip the echo from `buffer`.
    ///
    /// Succeeds when suppression is pending and the buffer contains the
    /// sent command; returns what follows the echo with leading `\r`/`\n`/
    /// space characters removed (possibly empty). Content *before* the
    /// echo is discarded with it - on a half-duplex link that is the line
    /// noise and cursor movement surrounding the retransmission.
    pub fn try_strip(&mut self, buffer: &str) -> Option<String> {
        if !self.is_pending() {
            return None;
        }

        let command = self.last_command.as_deref()?;
        let start = buffer.find(command)?;
        let remainder = buffer[start + command.len()..]
            .trim_start_matches(['\r', '\n', ' '])
            .to_string();

        trace!(command, "echo stripped");
        self.suppressed = true;
        Some(remainder)
    }

    /// Whether `buffer` could still grow into containing the echo.
    ///
    /// True while some suffix of the buffer is a prefix of the armed
    /// command, so the missing characters may simply not have arrived yet.
    /// Once this turns false (and [`try_strip`] keeps failing), the data is
    /// not an echo and should be displayed.
    pub fn could_become_echo(&self, buffer: &str) -> bool {
        if !self.is_pending() {
            return false;
        }

        if buffer.is_empty() {
            return true;
        }

        let command = match self.last_command.as_deref() {
            Some(c) => c,
            None => return false,
        };

        buffer
            .char_indices()
            .map(|(i, _)| &buffer[i..])
            .any(|suffix| command.starts_with(suffix))
    }

    /// Give up on the current echo without stripping anything.
    pub fn abandon(&mut self) {
        if self.is_pending() {
            trace!(command = ?self.last_command, "echo suppression abandoned");
        }
        self.suppressed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_pending_initially() {
        let mut suppressor = EchoSuppressor::new();
        assert!(!suppressor.is_pending());
        assert_eq!(suppressor.try_strip("DIR\r\n"), None);
    }

    #[test]
    fn test_strip_echo_with_trailing_output() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("DIR");

        let remainder = suppressor.try_strip("DIR\r\nHELP <dir>\r\n");
        assert_eq!(remainder.as_deref(), Some("HELP <dir>\r\n"));
        assert!(suppressor.suppressed());
        assert!(!suppressor.is_pending());
    }

    #[test]
    fn test_strip_echo_without_trailing_output() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("DIR");

        let remainder = suppressor.try_strip("DIR");
        assert_eq!(remainder.as_deref(), Some(""));
    }

    #[test]
    fn test_strip_only_once_per_command() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("DIR");

        assert!(suppressor.try_strip("DIR\r\n").is_some());
        // The same text again: suppression already done for this command.
        assert_eq!(suppressor.try_strip("DIR\r\n"), None);

        // A new send re-arms it.
        suppressor.set_last_command("DIR");
        assert!(suppressor.try_strip("DIR\r\n").is_some());
    }

    #[test]
    fn test_no_match_returns_none() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("DIR");

        assert_eq!(suppressor.try_strip("HELP"), None);
        assert!(suppressor.is_pending());
    }

    #[test]
    fn test_command_is_stored_trimmed() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("  DIR  ");

        assert_eq!(suppressor.last_command(), Some("DIR"));
        assert!(suppressor.try_strip("DIR\r\n").is_some());
    }

    #[test]
    fn test_empty_command_arms_nothing() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("   ");

        assert!(!suppressor.is_pending());
        assert_eq!(suppressor.try_strip("anything"), None);
    }

    #[test]
    fn test_echo_preceded_by_noise() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("DIR");

        let remainder = suppressor.try_strip("\r\nDIR\r\nA>");
        assert_eq!(remainder.as_deref(), Some("A>"));
    }

    #[test]
    fn test_could_become_echo() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("DIR");

        assert!(suppressor.could_become_echo(""));
        assert!(suppressor.could_become_echo("D"));
        assert!(suppressor.could_become_echo("DI"));
        // Noise before a partial echo: the suffix still lines up.
        assert!(suppressor.could_become_echo("\r\nDI"));

        assert!(!suppressor.could_become_echo("DX"));
        assert!(!suppressor.could_become_echo("HELLO"));
    }

    #[test]
    fn test_abandon_disarms() {
        let mut suppressor = EchoSuppressor::new();
        suppressor.set_last_command("DIR");

        suppressor.abandon();
        assert!(!suppressor.is_pending());
        assert_eq!(suppressor.try_strip("DIR\r\n"), None);
        assert!(!suppressor.could_become_echo("D"));
    }
}
