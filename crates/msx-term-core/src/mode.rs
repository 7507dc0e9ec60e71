//! The remote interpreter mode.

use serde::{Deserialize, Serialize};

/// Which command interpreter is presumed active on the remote MSX.
///
/// The mode is derived from prompt text: `Ok`/`Ready` mean the BASIC
/// interpreter is waiting for input, a drive prompt such as `A>` means the
/// MSX-DOS shell is. `Unknown` is the initial state and also the result of
/// classifying text that matches no prompt family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MsxMode {
    /// No prompt has been classified yet
    Unknown,
    /// BASIC interpreter prompt seen last
    Basic,
    /// MSX-DOS shell prompt seen last
    Dos,
}

impl Default for MsxMode {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for MsxMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Basic => "basic",
            Self::Dos => "dos",
        };
        write!(f, "{name}")
    }
}
