//! Fenced code block detection.
//!
//! Fences use backticks or tildes (three or more). The closing fence must use
//! the same character and be at least as long as the opening fence.

use std::ops::Range;

/// An opening code fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fence {
    /// Fence character (backtick or tilde).
    pub ch: char,
    /// Length of the opening run (minimum length for closing).
    pub len: usize,
    /// First word of the info string, empty when no language is declared.
    pub info: String,
}

/// A complete fenced block located within a slice of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FencedBlock {
    pub fence: Fence,
    /// Line indices of the body (between the fence lines).
    pub body: Range<usize>,
    /// Line index of the closing fence.
    pub close: usize,
}

impl Fence {
    /// Parse a line as an opening fence.
    pub(crate) fn open(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let ch = trimmed.chars().next()?;
        if ch != '`' && ch != '~' {
            return None;
        }

        let len = trimmed.chars().take_while(|&c| c == ch).count();
        if len < 3 {
            return None;
        }

        let rest = trimmed[len..].trim();
        // A backtick fence's info string cannot itself contain backticks
        if ch == '`' && rest.contains('`') {
            return None;
        }

        let info = rest.split_whitespace().next().unwrap_or_default().to_owned();
        Some(Self { ch, len, info })
    }

    /// Check whether `line` closes this fence.
    ///
    /// Only fence characters, optionally followed by whitespace, are allowed.
    pub(crate) fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let count = trimmed.chars().take_while(|&c| c == self.ch).count();
        count >= self.len && trimmed[count..].chars().all(char::is_whitespace)
    }
}

/// Locate the fenced block opening at `lines[start]`.
///
/// Returns `None` if the line is not a fence opener or the fence is never
/// closed.
pub(crate) fn fenced_block(lines: &[&str], start: usize) -> Option<FencedBlock> {
    let fence = Fence::open(lines.get(start)?)?;
    let close = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| fence.is_closed_by(line))
        .map(|(idx, _)| idx)?;

    Some(FencedBlock {
        fence,
        body: start + 1..close,
        close,
    })
}
