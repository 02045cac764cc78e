//! Progress reporting for TTY and non-TTY environments.
//!
//! TTY mode: one byte bar over the input feed.
//! Non-TTY mode: hidden bar, logs are the only progress indicator.

use std::io::IsTerminal;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Input bar with known size (green bar, binary bytes)
fn bytes_style() -> Option<ProgressStyle> {
    ProgressStyle::default_bar()
        .template("{prefix:<20.dim} {bar:30.green/dim} {binary_bytes:>7}/{binary_total_bytes:7} {eta:>4} {wide_msg:.dim}")
        .ok()
        .map(|s| s.progress_chars("--"))
}

/// Input of unknown size (stdin)
fn spinner_style() -> Option<ProgressStyle> {
    ProgressStyle::with_template("{spinner:.green} {prefix:<20.dim} {binary_bytes:>7} {wide_msg:.dim}").ok()
}

/// Owns the `MultiProgress` shared between bars and the logger
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Create new context, detecting TTY automatically.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty: std::io::stderr().is_terminal(),
        }
    }

    /// Byte progress bar for the input named `name`.
    ///
    /// Hidden when stderr is not a terminal.
    pub fn input_bar(&self, name: &str, total_bytes: Option<u64>) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let (pb, style) = match total_bytes {
            Some(total) => (ProgressBar::new(total), bytes_style()),
            None => (ProgressBar::no_length(), spinner_style()),
        };
        if let Some(style) = style {
            pb.set_style(style);
        }
        let pb = self.multi.add(pb);
        pb.set_prefix(truncate(name, 20).to_string());
        pb
    }

    /// Whether running in TTY mode.
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Get reference to `MultiProgress` for log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `s` to at most `max` bytes on a char boundary
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Format number with thousand separators.
pub fn fmt_num(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_num_small() {
        assert_eq!(fmt_num(0), "0");
        assert_eq!(fmt_num(12), "12");
        assert_eq!(fmt_num(123), "123");
    }

    #[test]
    fn fmt_num_thousands() {
        assert_eq!(fmt_num(1_000), "1,000");
        assert_eq!(fmt_num(12_345), "12,345");
        assert_eq!(fmt_num(123_456), "123,456");
        assert_eq!(fmt_num(1_234_567_890), "1,234,567,890");
    }

    #[test]
    fn truncate_respects_char_boundary() {
        assert_eq!(truncate("feed.xml", 20), "feed.xml");
        assert_eq!(truncate("abcdef", 3), "abc");
        // 'é' spans bytes 1..3
        assert_eq!(truncate("aé", 2), "a");
    }

    #[test]
    fn hidden_bar_off_tty() {
        let ctx = ProgressContext {
            multi: MultiProgress::new(),
            is_tty: false,
        };
        assert!(ctx.input_bar("feed.xml", Some(10)).is_hidden());
    }
}
