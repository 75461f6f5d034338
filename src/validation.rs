//! Validation and sanitization for admin-supplied values.
//!
//! Map names end up in a level-change console command and in a filesystem path, so
//! they are held to a strict character set. Reasons are free text shown to players
//! and stored in records; they are trimmed, stripped of control characters and capped.

/// Longest accepted map name.
pub const MAX_MAP_NAME: usize = 64;

/// Longest stored reason (bytes, cut on a char boundary).
pub const MAX_REASON_BYTES: usize = 128;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapNameError {
    #[error("map name is empty")]
    Empty,

    #[error("map name is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("map name contains path separators or parent references")]
    PathTraversal,

    #[error("map name contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },
}

/// Validate a map name before it reaches the engine or the filesystem.
pub fn validate_map_name(name: &str) -> Result<(), MapNameError> {
    if name.is_empty() {
        return Err(MapNameError::Empty);
    }
    if name.len() > MAX_MAP_NAME {
        return Err(MapNameError::TooLong { max: MAX_MAP_NAME });
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(MapNameError::PathTraversal);
    }
    let bad: String = name
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        .collect();
    if !bad.is_empty() {
        return Err(MapNameError::InvalidCharacters { chars: bad });
    }
    Ok(())
}

/// Clean a kick/ban reason: drop control characters, collapse to one line, cap length.
pub fn sanitize_reason(reason: &str) -> String {
    let cleaned: String = reason
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.len() <= MAX_REASON_BYTES {
        return trimmed.to_string();
    }
    let mut end = MAX_REASON_BYTES;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
