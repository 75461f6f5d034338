//! Logging helpers for command lines and player-supplied text.
//!
//! Reasons, nicknames and raw console input are attacker-controlled; everything that
//! reaches the log goes through [escape_log] so one record stays on one line.

/// Security-relevant event (denials, kicks, bans, map changes). The binary mirrors the
/// `security` target into `logging.security_file`.
macro_rules! sec_log {
    ($($arg:tt)*) => { log::warn!(target: "security", $($arg)*); };
}
pub(crate) use sec_log;

/// Longest preview (in chars) of a single logged value.
const MAX_PREVIEW: usize = 160;

/// Escape a string for single-line logging.
///
/// Backslash, `\n`, `\r` and `\t` become their two-character escapes, any other
/// control character becomes `\xNN`. Values longer than [MAX_PREVIEW] chars end in `…`.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Render a token vector for logs, quoting tokens that contain spaces.
pub fn tokens_for_log(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| {
            if t.is_empty() || t.contains(' ') {
                format!("\"{}\"", escape_log(t))
            } else {
                escape_log(t)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
