//! Helpers for putting player-supplied softcode into log lines.
//!
//! Input lines and evaluation results can carry newlines, tabs, terminal
//! escape sequences and arbitrarily long text. Everything logged through
//! these helpers stays on one line and within a bounded length.

use std::fmt::Write;

/// Characters kept before a logged value is cut off.
pub const LOG_PREVIEW_CHARS: usize = 200;

/// [`escape_log_limited`] with the default preview length.
pub fn escape_log(s: &str) -> String {
    escape_log_limited(s, LOG_PREVIEW_CHARS)
}

/// Escape control characters and truncate to `limit` characters.
///
/// `\n`, `\r` and `\t` become their two-character escapes, ESC and other
/// control characters become `\xNN`, and a backslash is doubled so the
/// escapes stay unambiguous. A truncated value ends in `…(+N)` where N is
/// the number of characters dropped.
pub fn escape_log_limited(s: &str, limit: usize) -> String {
    let mut out = String::with_capacity(s.len().min(limit) + 8);
    let mut shown = 0usize;
    let mut chars = s.chars();
    for ch in chars.by_ref() {
        if shown == limit {
            let dropped = 1 + chars.count();
            let _ = write!(out, "…(+{})", dropped);
            return out;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
        shown += 1;
    }
    out
}
