//! Canonical prompt pattern table.
//!
//! All prompt recognition in the client goes through this module: the
//! complete-prompt check used by the stream processor, the candidate-prefix
//! check used to shorten flush latency, and the per-line classification the
//! `ModeDetector` builds on. Keeping one table avoids the drift that comes
//! from scattering near-duplicate regexes across call sites.

use lazy_static::lazy_static;
use regex::Regex;

use msx_term_core::MsxMode;

/// Family a prompt line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptFamily {
    /// MSX-DOS drive prompt: a single uppercase letter followed by `>`,
    /// optionally with a `:` in between (`A>`, `A:>`)
    Dos,
    /// BASIC ready prompt: `Ok` or `Ready`, any case
    Basic,
    /// BASIC INPUT retry prompt: `?Redo from start`, any case
    Error,
}

lazy_static! {
    // MSX-DOS prompts are always uppercase drive letters; case-sensitive.
    static ref DOS_PROMPT: Regex = Regex::new(r"^[A-Z]:?>$").unwrap();
    static ref BASIC_PROMPT: Regex = Regex::new(r"(?i)^(ok|ready)$").unwrap();
    static ref ERROR_PROMPT: Regex = Regex::new(r"(?i)^\?redo from start$").unwrap();
}

/// Prompt strings whose progressive prefixes count as candidates,
/// compared case-insensitively (the BASIC and error families).
const PREFIX_TARGETS: [&str; 3] = ["ok", "ready", "?redo from start"];

/// Classify a single line (whitespace-trimmed) against the pattern table.
pub fn family_of_line(line: &str) -> Option<PromptFamily> {
    let line = line.trim();

    if DOS_PROMPT.is_match(line) {
        Some(PromptFamily::Dos)
    } else if BASIC_PROMPT.is_match(line) {
        Some(PromptFamily::Basic)
    } else if ERROR_PROMPT.is_match(line) {
        Some(PromptFamily::Error)
    } else {
        None
    }
}

/// Check whether a buffered fragment ends in (or is) a complete prompt.
///
/// DOS prompts can appear mid-stream after a command's own multi-line
/// output, so every line is tested against the DOS family. BASIC's
/// `Ok`/`Ready` and the `?Redo from start` error only terminate output,
/// so they are tested against the final line only.
pub fn is_complete_prompt(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    for line in text.lines() {
        if DOS_PROMPT.is_match(line.trim()) {
            return true;
        }
    }

    let last = text.lines().last().unwrap_or("").trim();
    BASIC_PROMPT.is_match(last) || ERROR_PROMPT.is_match(last)
}

/// Map a fragment to the interpreter mode its freshest prompt implies.
///
/// Lines are scanned newest-first so the most recent prompt wins when a
/// fragment spans several. The error prompt comes from BASIC's INPUT
/// statement, so it classifies as `Basic`.
pub fn classify(text: &str) -> MsxMode {
    let lines: Vec<&str> = text.lines().collect();
    let last_index = lines.len().saturating_sub(1);

    for (i, line) in lines.iter().enumerate().rev() {
        let line = line.trim();

        if DOS_PROMPT.is_match(line) {
            return MsxMode::Dos;
        }

        if i == last_index && (BASIC_PROMPT.is_match(line) || ERROR_PROMPT.is_match(line)) {
            return MsxMode::Basic;
        }
    }

    MsxMode::Unknown
}

/// Check whether a fragment is a progressive prefix of a known prompt.
///
/// The trimmed text must exactly equal one of the prefixes (`A`, `A:`, `O`,
/// `Ok`, `R`, ..., `Ready`, `?`, `?R`, ...). Complete BASIC prompts are
/// their own final prefix and therefore also candidates. Used to decide
/// that a short idle fragment might still be mid-prompt and is worth
/// waiting for.
pub fn is_candidate_prefix(text: &str) -> bool {
    let text = text.trim();

    if text.is_empty() {
        return false;
    }

    // DOS family prefixes: a drive letter, optionally followed by ':'.
    // Case-sensitive like the full prompt.
    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        if first.is_ascii_uppercase() {
            match chars.next() {
                None => return true,
                Some(':') if chars.next().is_none() => return true,
                _ => {}
            }
        }
    }

    let lower = text.to_ascii_lowercase();
    PREFIX_TARGETS
        .iter()
        .any(|target| target.starts_with(lower.as_str()))
}
