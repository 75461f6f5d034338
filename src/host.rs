//! The owning-thread context and the collaborators it talks to.
//!
//! [`Host`] bundles everything that may only be touched from the thread that drives
//! the game: the command registry, the session directory, the engine, the output
//! transport and the per-viewer menu states. Background work never sees a `Host`;
//! it gets an `Arc` to the record store or the map catalog and a
//! [`PendingTask`](crate::tasks::PendingTask) to join its result back with.
//!
//! ```text
//!  raw line ─► tokenize ─► Host::dispatch ─► Command::execute ─┐
//!                                                              │ TaskScheduler::schedule
//!                         worker pool ◄────────────────────────┘
//!                              │ PendingTask::{succeed, fail, join}
//!                              ▼
//!                        JoinQueue::drain (each tick) ─► on_success / on_failure / handler
//! ```
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::MapCatalog;
use crate::command::registry::CommandRegistry;
use crate::command::privileges::PrivilegeSet;
use crate::menu::{MenuFrame, MenuSettings, MenuStates, PagedMenu, Selection};
use crate::roster::AdminEntry;
use crate::storage::RecordStore;
use crate::tasks::TaskScheduler;

/// Identity token of a connected player: the engine's userid.
///
/// Stable only while the session lives; the only viewer handle allowed across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of a connected player as seen by the admin core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// Engine slot (1-based).
    pub index: u32,
    pub user_id: UserId,
    pub name: String,
    pub auth_id: String,
    pub address: String,
    pub privileges: PrivilegeSet,
}

impl Viewer {
    /// The identity token to carry across a thread hand-off.
    pub fn token(&self) -> UserId {
        self.user_id
    }
}

/// Token of an optional issuer; `None` is the console.
pub fn issuer_token(issuer: Option<&Viewer>) -> Option<UserId> {
    issuer.map(Viewer::token)
}

/// Session directory of the running game.
pub trait PlayerDirectory {
    /// All currently connected players.
    fn players(&self) -> Vec<Viewer>;

    /// Re-resolve an identity token; `None` once the player has left.
    fn resolve(&self, token: UserId) -> Option<Viewer>;

    /// Drop the player from the server with a reason. Returns false if already gone.
    fn kick(&mut self, token: UserId, reason: &str) -> bool;

    /// File the privilege assignments come from, if any. Only ever read in background work.
    fn roster_file(&self) -> Option<PathBuf>;

    /// Swap in freshly read privilege assignments and recompute every session's
    /// privileges. Returns how many admin entries are loaded.
    fn apply_roster(&mut self, admins: Vec<AdminEntry>) -> usize;

    /// Session hooks for local shells. Engines that own their sessions leave these alone.
    ///
    /// `grants` are held for the session on top of whatever the admin roster assigns.
    fn connect(
        &mut self,
        _name: &str,
        _auth_id: &str,
        _address: &str,
        _grants: PrivilegeSet,
    ) -> Option<Viewer> {
        None
    }

    fn disconnect(&mut self, _token: UserId) -> Option<Viewer> {
        None
    }
}

/// Engine calls made synchronously from the owning thread.
pub trait Engine {
    fn is_map_valid(&self, map: &str) -> bool;
    fn change_level(&mut self, map: &str);
    fn current_map(&self) -> String;
}

/// Line and menu output towards clients and the console.
pub trait Transport {
    /// `None` writes to the server console.
    fn write_line(&mut self, to: Option<&Viewer>, text: &str);
    fn show_menu(&mut self, to: &Viewer, frame: &MenuFrame);
}

/// The external pieces a [`Host`] is built from.
pub struct Collaborators {
    pub players: Box<dyn PlayerDirectory>,
    pub engine: Box<dyn Engine>,
    pub transport: Box<dyn Transport>,
    pub store: Arc<dyn RecordStore>,
    pub catalog: Arc<dyn MapCatalog>,
}

/// Owning-thread state. Only ever borrowed from the thread that drives ticks.
pub struct Host {
    pub registry: CommandRegistry,
    pub players: Box<dyn PlayerDirectory>,
    pub engine: Box<dyn Engine>,
    pub transport: Box<dyn Transport>,
    pub store: Arc<dyn RecordStore>,
    pub catalog: Arc<dyn MapCatalog>,
    pub tasks: TaskScheduler,
    pub menus: MenuStates,
    pub menu_settings: MenuSettings,
    /// Issuer of the join being drained when that player has already left.
    pub(crate) departed_issuer: Option<UserId>,
}

impl Host {
    pub fn new(
        registry: CommandRegistry,
        parts: Collaborators,
        tasks: TaskScheduler,
        menu_settings: MenuSettings,
    ) -> Self {
        Self {
            registry,
            players: parts.players,
            engine: parts.engine,
            transport: parts.transport,
            store: parts.store,
            catalog: parts.catalog,
            tasks,
            menus: MenuStates::new(),
            menu_settings,
            departed_issuer: None,
        }
    }

    pub fn write_line(&mut self, to: Option<&Viewer>, text: &str) {
        self.transport.write_line(to, text);
    }

    /// Answer whoever issued the command being run.
    ///
    /// Same as [`write_line`](Self::write_line) except inside a join whose issuer has
    /// disconnected: nobody is left to tell, so the line is only logged.
    pub fn reply(&mut self, viewer: Option<&Viewer>, text: &str) {
        match (viewer, self.departed_issuer) {
            (None, Some(token)) => log::debug!("{} left; not delivered: {}", token, text),
            _ => self.transport.write_line(viewer, text),
        }
    }

    /// Render `menu` for `viewer` and hand the frame to the transport.
    pub fn show_menu(&mut self, viewer: &Viewer, menu: &Arc<PagedMenu>) {
        let frame = self.menus.show(viewer, menu);
        self.transport.show_menu(viewer, &frame);
    }

    /// Handle a menu key (slot index 0..=9) pressed by `viewer`.
    pub fn select_menu(&mut self, viewer: &Viewer, key_index: usize) {
        match self.menus.select(viewer, key_index) {
            Selection::Ignored => {
                log::debug!("menu key {} from {} ignored", key_index, viewer.user_id);
            }
            Selection::Render(frame) => self.transport.show_menu(viewer, &frame),
            Selection::Chosen(item) => {
                if let Some(action) = item.action() {
                    action(self, viewer);
                }
            }
        }
    }

    /// Remove a player and the menu state kept for them.
    pub fn disconnect(&mut self, token: UserId) -> Option<Viewer> {
        self.menus.forget(token);
        self.players.disconnect(token)
    }
}
