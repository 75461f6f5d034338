//! Resolving a typed target to a connected player, and parsing ban lengths.
use std::fmt;

use thiserror::Error;

use crate::host::Viewer;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    #[error("Couldn't find target player")]
    NotFound,

    #[error("Target matches more than one player")]
    Ambiguous,
}

/// Find the player a target spec refers to.
///
/// Precedence: `#<userid>` exact, then exact auth id, then exact name (case-insensitive),
/// then a case-insensitive fragment of name, auth id or address that matches exactly
/// one player.
pub fn find_target<'a>(players: &'a [Viewer], spec: &str) -> Result<&'a Viewer, TargetError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(TargetError::NotFound);
    }

    if let Some(id) = spec.strip_prefix('#') {
        let id: u32 = id.parse().map_err(|_| TargetError::NotFound)?;
        return players
            .iter()
            .find(|p| p.user_id.0 == id)
            .ok_or(TargetError::NotFound);
    }

    if let Some(p) = players.iter().find(|p| p.auth_id.eq_ignore_ascii_case(spec)) {
        return Ok(p);
    }

    let lowered = spec.to_lowercase();
    if let Some(p) = players.iter().find(|p| p.name.to_lowercase() == lowered) {
        return Ok(p);
    }

    let mut matches = players.iter().filter(|p| {
        p.name.to_lowercase().contains(&lowered)
            || p.auth_id.to_lowercase().contains(&lowered)
            || p.address.contains(spec)
    });
    match (matches.next(), matches.next()) {
        (Some(p), None) => Ok(p),
        (Some(_), Some(_)) => Err(TargetError::Ambiguous),
        (None, _) => Err(TargetError::NotFound),
    }
}

/// Length of a ban.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanLength {
    Permanent,
    Minutes(u64),
}

impl BanLength {
    pub fn minutes(self) -> Option<u64> {
        match self {
            BanLength::Permanent => None,
            BanLength::Minutes(m) => Some(m),
        }
    }
}

impl fmt::Display for BanLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BanLength::Permanent => f.write_str("permanent"),
            BanLength::Minutes(m) => write!(f, "{} minutes", m),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Duration was misformed")]
pub struct DurationError;

/// Longest finite ban: ten years.
const MAX_BAN_MINUTES: u64 = 10 * 365 * 24 * 60;

/// Parse `<n>` (minutes), `<n>m`, `<n>h` or `<n>d`. Zero means permanent.
pub fn parse_duration(text: &str) -> Result<BanLength, DurationError> {
    let text = text.trim().to_ascii_lowercase();
    let (digits, unit) = match text.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&text[..i], c),
        Some(_) => (text.as_str(), 'm'),
        None => return Err(DurationError),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DurationError);
    }
    let n: u64 = digits.parse().map_err(|_| DurationError)?;
    let factor = match unit {
        'm' => 1,
        'h' => 60,
        'd' => 24 * 60,
        _ => return Err(DurationError),
    };
    let minutes = n.checked_mul(factor).ok_or(DurationError)?;
    if minutes == 0 {
        return Ok(BanLength::Permanent);
    }
    if minutes > MAX_BAN_MINUTES {
        return Err(DurationError);
    }
    Ok(BanLength::Minutes(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::privileges::PrivilegeSet;
    use crate::host::UserId;

    fn player(id: u32, name: &str, auth: &str, addr: &str) -> Viewer {
        Viewer {
            index: id,
            user_id: UserId(id),
            name: name.into(),
            auth_id: auth.into(),
            address: addr.into(),
            privileges: PrivilegeSet::new(),
        }
    }

    fn lobby() -> Vec<Viewer> {
        vec![
            player(3, "Alice", "STEAM_0:1:100", "10.0.0.3"),
            player(4, "alina", "STEAM_0:0:200", "10.0.0.4"),
            player(7, "Bob", "STEAM_0:1:300", "192.168.1.7"),
        ]
    }

    #[test]
    fn userid_and_exact_forms() {
        let players = lobby();
        assert_eq!(find_target(&players, "#7").map(|p| p.user_id), Ok(UserId(7)));
        assert_eq!(find_target(&players, "#8"), Err(TargetError::NotFound));
        assert_eq!(find_target(&players, "#x"), Err(TargetError::NotFound));
        assert_eq!(
            find_target(&players, "steam_0:0:200").map(|p| p.name.as_str()),
            Ok("alina")
        );
        assert_eq!(find_target(&players, "ALICE").map(|p| p.user_id), Ok(UserId(3)));
    }

    #[test]
    fn fragments_must_be_unique() {
        let players = lobby();
        assert_eq!(find_target(&players, "ali"), Err(TargetError::Ambiguous));
        assert_eq!(find_target(&players, "bo").map(|p| p.user_id), Ok(UserId(7)));
        assert_eq!(find_target(&players, "192.168").map(|p| p.user_id), Ok(UserId(7)));
        assert_eq!(find_target(&players, "carol"), Err(TargetError::NotFound));
        assert_eq!(find_target(&players, "  "), Err(TargetError::NotFound));
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("60"), Ok(BanLength::Minutes(60)));
        assert_eq!(parse_duration("45m"), Ok(BanLength::Minutes(45)));
        assert_eq!(parse_duration("2h"), Ok(BanLength::Minutes(120)));
        assert_eq!(parse_duration("1D"), Ok(BanLength::Minutes(1440)));
        assert_eq!(parse_duration("0"), Ok(BanLength::Permanent));
    }

    #[test]
    fn malformed_durations() {
        for bad in ["", "m", "-5", "1.5h", "10w", "abc", "99999999999999999999"] {
            assert_eq!(parse_duration(bad), Err(DurationError), "input {bad:?}");
        }
        assert_eq!(parse_duration("5000d"), Err(DurationError));
    }
}
