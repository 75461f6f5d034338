//! Admin privilege roster and the in-process session directory used by the binary.
//!
//! The roster file is TOML:
//!
//! ```toml
//! [[admin]]
//! auth_id = "STEAM_0:1:12345"
//! privileges = ["kick", "ban", "unban", "status", "map"]
//! ```
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::command::privileges::{self, PrivilegeSet};
use crate::host::{PlayerDirectory, UserId, Viewer};
use crate::logutil::{escape_log, sec_log};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEntry {
    pub auth_id: String,
    #[serde(default)]
    pub privileges: PrivilegeSet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminFile {
    #[serde(default, rename = "admin")]
    pub admins: Vec<AdminEntry>,
}

/// Auth id → privileges, read from the roster file.
#[derive(Debug, Clone, Default)]
pub struct AdminRoster {
    path: Option<PathBuf>,
    entries: HashMap<String, PrivilegeSet>,
}

impl AdminRoster {
    /// Roster with no backing file.
    pub fn in_memory(admins: Vec<AdminEntry>) -> Self {
        let mut roster = Self::default();
        roster.replace(admins);
        roster
    }

    /// Load `path`. A missing file yields an empty roster.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let admins = read_admins(&path)?;
        let mut roster = Self {
            path: Some(path),
            entries: HashMap::new(),
        };
        roster.replace(admins);
        Ok(roster)
    }

    /// Backing file, if the roster was loaded from one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn replace(&mut self, admins: Vec<AdminEntry>) {
        self.entries = admins
            .into_iter()
            .filter(|a| !a.auth_id.trim().is_empty())
            .map(|a| (a.auth_id.trim().to_ascii_lowercase(), a.privileges))
            .collect();
    }

    pub fn privileges_for(&self, auth_id: &str) -> PrivilegeSet {
        self.entries
            .get(&auth_id.trim().to_ascii_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write an example roster with one full admin.
    pub async fn write_default(path: &Path) -> Result<()> {
        let file = AdminFile {
            admins: vec![AdminEntry {
                auth_id: "STEAM_0:0:1".to_string(),
                privileges: PrivilegeSet::with([
                    privileges::KICK,
                    privileges::BAN,
                    privileges::UNBAN,
                    privileges::STATUS,
                    privileges::MAP,
                    privileges::IMMUNITY,
                ]),
            }],
        };
        let content = toml::to_string_pretty(&file)
            .map_err(|e| anyhow!("Failed to serialize admin roster: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write admin roster {}: {}", path.display(), e))?;
        Ok(())
    }
}

/// Read and parse a roster file. A missing file reads as no admins.
///
/// Blocks on disk; the `reloadadmins` command only calls it from background work.
pub fn read_admins(path: &Path) -> Result<Vec<AdminEntry>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("admin roster {} not found; no admins loaded", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(anyhow!("Failed to read admin roster {}: {}", path.display(), e)),
    };
    let file: AdminFile = toml::from_str(&content)
        .map_err(|e| anyhow!("Failed to parse admin roster {}: {}", path.display(), e))?;
    info!("read {} admin entries from {}", file.admins.len(), path.display());
    Ok(file.admins)
}

struct Session {
    viewer: Viewer,
    grants: PrivilegeSet,
}

/// Session directory for the console server and tests: players join and leave by
/// command, privileges come from the roster plus per-session grants.
pub struct Lobby {
    roster: AdminRoster,
    sessions: BTreeMap<UserId, Session>,
    last_user_id: u32,
}

impl Lobby {
    pub fn new(roster: AdminRoster) -> Self {
        Self {
            roster,
            sessions: BTreeMap::new(),
            last_user_id: 0,
        }
    }

    fn free_index(&self) -> u32 {
        let mut index = 1;
        while self.sessions.values().any(|s| s.viewer.index == index) {
            index += 1;
        }
        index
    }

    fn effective(&self, auth_id: &str, grants: &PrivilegeSet) -> PrivilegeSet {
        let mut set = self.roster.privileges_for(auth_id);
        set.extend(grants);
        set
    }
}

impl PlayerDirectory for Lobby {
    fn players(&self) -> Vec<Viewer> {
        self.sessions.values().map(|s| s.viewer.clone()).collect()
    }

    fn resolve(&self, token: UserId) -> Option<Viewer> {
        self.sessions.get(&token).map(|s| s.viewer.clone())
    }

    fn kick(&mut self, token: UserId, reason: &str) -> bool {
        match self.sessions.remove(&token) {
            Some(s) => {
                sec_log!(
                    "kicked {} ({} {}): {}",
                    escape_log(&s.viewer.name),
                    s.viewer.auth_id,
                    token,
                    escape_log(reason)
                );
                true
            }
            None => false,
        }
    }

    fn roster_file(&self) -> Option<PathBuf> {
        self.roster.path().map(Path::to_path_buf)
    }

    fn apply_roster(&mut self, admins: Vec<AdminEntry>) -> usize {
        self.roster.replace(admins);
        let updated: Vec<(UserId, PrivilegeSet)> = self
            .sessions
            .iter()
            .map(|(id, s)| (*id, self.effective(&s.viewer.auth_id, &s.grants)))
            .collect();
        for (id, set) in updated {
            if let Some(s) = self.sessions.get_mut(&id) {
                s.viewer.privileges = set;
            }
        }
        self.roster.len()
    }

    fn connect(
        &mut self,
        name: &str,
        auth_id: &str,
        address: &str,
        grants: PrivilegeSet,
    ) -> Option<Viewer> {
        self.last_user_id = self.last_user_id.wrapping_add(1).max(1);
        let viewer = Viewer {
            index: self.free_index(),
            user_id: UserId(self.last_user_id),
            name: name.to_string(),
            auth_id: auth_id.to_string(),
            address: address.to_string(),
            privileges: self.effective(auth_id, &grants),
        };
        info!(
            "{} connected as {} ({})",
            escape_log(name),
            viewer.user_id,
            viewer.privileges
        );
        self.sessions.insert(
            viewer.user_id,
            Session {
                viewer: viewer.clone(),
                grants,
            },
        );
        Some(viewer)
    }

    fn disconnect(&mut self, token: UserId) -> Option<Viewer> {
        let session = self.sessions.remove(&token)?;
        info!("{} ({}) disconnected", escape_log(&session.viewer.name), token);
        Some(session.viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"
[[admin]]
auth_id = "STEAM_0:1:100"
privileges = ["kick", "BAN"]

[[admin]]
auth_id = ""
privileges = ["map"]
"#;

    #[test]
    fn parses_roster_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admins.toml");
        std::fs::write(&path, ROSTER).unwrap();
        let roster = AdminRoster::load(&path).unwrap();
        assert_eq!(roster.len(), 1);
        let set = roster.privileges_for("steam_0:1:100");
        assert!(set.has("kick") && set.has("ban"));
        assert!(!roster.privileges_for("STEAM_0:0:2").has_any());
    }

    #[test]
    fn missing_roster_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let roster = AdminRoster::load(dir.path().join("none.toml")).unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn lobby_assigns_ids_and_slots() {
        let mut lobby = Lobby::new(AdminRoster::default());
        let a = lobby.connect("a", "STEAM_0:0:1", "10.0.0.1", PrivilegeSet::new()).unwrap();
        let b = lobby.connect("b", "STEAM_0:0:2", "10.0.0.2", PrivilegeSet::new()).unwrap();
        assert_eq!((a.index, a.user_id), (1, UserId(1)));
        assert_eq!((b.index, b.user_id), (2, UserId(2)));
        lobby.disconnect(a.user_id);
        let c = lobby.connect("c", "STEAM_0:0:3", "10.0.0.3", PrivilegeSet::new()).unwrap();
        assert_eq!((c.index, c.user_id), (1, UserId(3)));
        assert!(lobby.resolve(a.user_id).is_none());
        assert!(lobby.kick(c.user_id, "bye"));
        assert!(!lobby.kick(c.user_id, "bye"));
    }

    #[test]
    fn applying_a_roster_recomputes_privileges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admins.toml");
        std::fs::write(&path, "").unwrap();
        let mut lobby = Lobby::new(AdminRoster::load(&path).unwrap());
        assert_eq!(lobby.roster_file().as_deref(), Some(path.as_path()));
        let v = lobby
            .connect("a", "STEAM_0:1:100", "10.0.0.1", PrivilegeSet::with(["status"]))
            .unwrap();
        assert_eq!(v.privileges.summary(), "status");

        std::fs::write(&path, ROSTER).unwrap();
        let admins = read_admins(&path).unwrap();
        // Nothing changes until the entries are applied.
        assert!(!lobby.resolve(v.user_id).unwrap().privileges.has("kick"));
        assert_eq!(lobby.apply_roster(admins), 1);
        let v = lobby.resolve(v.user_id).unwrap();
        assert_eq!(v.privileges.summary(), "ban,kick,status");
    }

    #[test]
    fn unreadable_roster_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admins.toml");
        std::fs::write(&path, "[[admin]\nauth_id = ").unwrap();
        assert!(read_admins(&path).is_err());
        assert!(read_admins(&dir.path().join("none.toml")).unwrap().is_empty());
        assert!(Lobby::new(AdminRoster::in_memory(Vec::new())).roster_file().is_none());
    }

    #[test]
    fn default_roster_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admins.toml");
        tokio_test::block_on(AdminRoster::write_default(&path)).unwrap();
        let roster = AdminRoster::load(&path).unwrap();
        assert_eq!(roster.len(), 1);
        let set = roster.privileges_for("STEAM_0:0:1");
        assert!(set.has(privileges::IMMUNITY) && set.has(privileges::MAP));
    }
}
