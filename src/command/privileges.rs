//! Privilege names held by a player and the requirement a command places on them.
//!
//! Privileges are plain lowercase names (`kick`, `ban`, `map`, ...). Two names are
//! special: `immunity` protects a player from every admin action, and `nokick` /
//! `noban` protect from one. They count as privileges for [PrivilegeSet::has_any].
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const KICK: &str = "kick";
pub const BAN: &str = "ban";
pub const UNBAN: &str = "unban";
pub const STATUS: &str = "status";
pub const MAP: &str = "map";
pub const IMMUNITY: &str = "immunity";
pub const NO_KICK: &str = "nokick";
pub const NO_BAN: &str = "noban";

/// The set of privileges a player holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PrivilegeSet(BTreeSet<String>);

impl PrivilegeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for n in names {
            set.grant(n.as_ref());
        }
        set
    }

    pub fn grant(&mut self, name: &str) {
        let name = name.trim().to_ascii_lowercase();
        if !name.is_empty() {
            self.0.insert(name);
        }
    }

    pub fn extend(&mut self, other: &PrivilegeSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn revoke(&mut self, name: &str) {
        self.0.remove(&name.to_ascii_lowercase());
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains(&name.to_ascii_lowercase())
    }

    /// True when the player holds at least one privilege of any kind.
    pub fn has_any(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma separated summary for listings; `-` when empty.
    pub fn summary(&self) -> String {
        if self.0.is_empty() {
            "-".to_string()
        } else {
            self.iter().collect::<Vec<_>>().join(",")
        }
    }
}

impl From<Vec<String>> for PrivilegeSet {
    fn from(names: Vec<String>) -> Self {
        Self::with(names)
    }
}

impl From<PrivilegeSet> for Vec<String> {
    fn from(set: PrivilegeSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl fmt::Display for PrivilegeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// What a command demands of its issuer before it may execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone may run it.
    None,
    /// Every listed privilege must be held.
    All(Vec<&'static str>),
    /// At least one privilege, whichever it is.
    AnyPrivilege,
}

impl Requirement {
    pub fn one(name: &'static str) -> Self {
        Requirement::All(vec![name])
    }

    /// `Ok` when satisfied, otherwise the denial line for the issuer.
    pub fn check(&self, held: &PrivilegeSet) -> Result<(), String> {
        match self {
            Requirement::None => Ok(()),
            Requirement::AnyPrivilege => {
                if held.has_any() {
                    Ok(())
                } else {
                    Err("You have to have at least one privilege to use this command".to_string())
                }
            }
            Requirement::All(names) => match names.iter().find(|n| !held.has(n)) {
                None => Ok(()),
                Some(missing) => Err(format!("You have no {} privileges", missing)),
            },
        }
    }
}
