//! Shared harness for the integration tests: a host wired to recording doubles.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use gsadmin::admin;
use gsadmin::catalog::MapCatalog;
use gsadmin::command::{CommandRegistry, PrivilegeSet};
use gsadmin::host::{Collaborators, Engine, Host, PlayerDirectory, Transport, UserId, Viewer};
use gsadmin::menu::{MenuFrame, MenuSettings};
use gsadmin::roster::{AdminRoster, Lobby};
use gsadmin::storage::{BanRecord, KickRecord, MapChangeRecord, RecordStore, SledStore, StoreError};
use gsadmin::tasks::{self, JoinQueue};
use tokio::runtime::Handle;

/// Something the transport was asked to deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Line { to: Option<UserId>, text: String },
    Menu { to: UserId, frame: MenuFrame },
}

#[derive(Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<(ThreadId, Output)>>>,
}

impl Recorder {
    pub fn all(&self) -> Vec<Output> {
        self.entries.lock().unwrap().iter().map(|(_, o)| o.clone()).collect()
    }

    pub fn threads(&self) -> Vec<ThreadId> {
        self.entries.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    /// Text of every line sent to `to` (`None` = console).
    pub fn lines_to(&self, to: Option<UserId>) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|o| match o {
                Output::Line { to: t, text } if t == to => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn menus_to(&self, to: UserId) -> Vec<MenuFrame> {
        self.all()
            .into_iter()
            .filter_map(|o| match o {
                Output::Menu { to: t, frame } if t == to => Some(frame),
                _ => None,
            })
            .collect()
    }

    pub fn last_menu(&self, to: UserId) -> Option<MenuFrame> {
        self.menus_to(to).pop()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

struct RecordingTransport(Recorder);

impl Transport for RecordingTransport {
    fn write_line(&mut self, to: Option<&Viewer>, text: &str) {
        self.0.entries.lock().unwrap().push((
            thread::current().id(),
            Output::Line {
                to: to.map(|v| v.user_id),
                text: text.to_string(),
            },
        ));
    }

    fn show_menu(&mut self, to: &Viewer, frame: &MenuFrame) {
        self.0.entries.lock().unwrap().push((
            thread::current().id(),
            Output::Menu {
                to: to.user_id,
                frame: frame.clone(),
            },
        ));
    }
}

/// Engine double: a fixed list of valid maps and the level it is on.
#[derive(Clone)]
pub struct FakeEngine {
    pub maps: Arc<Vec<String>>,
    pub current: Arc<Mutex<String>>,
    pub changes: Arc<Mutex<Vec<String>>>,
}

impl FakeEngine {
    pub fn new(maps: &[&str], current: &str) -> Self {
        Self {
            maps: Arc::new(maps.iter().map(|m| m.to_string()).collect()),
            current: Arc::new(Mutex::new(current.to_string())),
            changes: Arc::default(),
        }
    }

    pub fn current(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    pub fn changes(&self) -> Vec<String> {
        self.changes.lock().unwrap().clone()
    }
}

impl Engine for FakeEngine {
    fn is_map_valid(&self, map: &str) -> bool {
        self.maps.iter().any(|m| m == map)
    }

    fn change_level(&mut self, map: &str) {
        *self.current.lock().unwrap() = map.to_string();
        self.changes.lock().unwrap().push(map.to_string());
    }

    fn current_map(&self) -> String {
        self.current()
    }
}

pub struct FixedCatalog(pub Vec<String>);

impl MapCatalog for FixedCatalog {
    fn list_maps(&self) -> std::io::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Sled-backed store that counts calls, remembers which thread made them and can be
/// switched to fail every call.
pub struct CountingStore {
    inner: SledStore,
    pub calls: AtomicUsize,
    pub failing: std::sync::atomic::AtomicBool,
    pub threads: Mutex<Vec<ThreadId>>,
    _dir: tempfile::TempDir,
}

impl CountingStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let inner = SledStore::open(dir.path().join("records")).expect("open store");
        Self {
            inner,
            calls: AtomicUsize::new(0),
            failing: Default::default(),
            threads: Mutex::new(Vec::new()),
            _dir: dir,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.threads.lock().unwrap().push(thread::current().id());
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk on fire",
            )));
        }
        Ok(())
    }

    /// Direct reads for assertions; not counted.
    pub fn bans(&self) -> Vec<BanRecord> {
        self.inner.list_bans().unwrap()
    }

    pub fn kicks(&self) -> Vec<KickRecord> {
        self.inner.list_kicks().unwrap()
    }

    pub fn map_changes(&self) -> Vec<MapChangeRecord> {
        self.inner.list_map_changes().unwrap()
    }
}

impl RecordStore for CountingStore {
    fn add_ban(&self, ban: BanRecord) -> Result<(), StoreError> {
        self.enter()?;
        self.inner.add_ban(ban)
    }

    fn add_kick(&self, kick: KickRecord) -> Result<(), StoreError> {
        self.enter()?;
        self.inner.add_kick(kick)
    }

    fn add_map_change(&self, change: MapChangeRecord) -> Result<(), StoreError> {
        self.enter()?;
        self.inner.add_map_change(change)
    }

    fn list_bans(&self) -> Result<Vec<BanRecord>, StoreError> {
        self.enter()?;
        self.inner.list_bans()
    }

    fn find_ban(&self, auth_id: &str) -> Result<Option<BanRecord>, StoreError> {
        self.enter()?;
        self.inner.find_ban(auth_id)
    }

    fn remove_ban(&self, auth_id: &str) -> Result<bool, StoreError> {
        self.enter()?;
        self.inner.remove_ban(auth_id)
    }

    fn list_kicks(&self) -> Result<Vec<KickRecord>, StoreError> {
        self.enter()?;
        self.inner.list_kicks()
    }

    fn list_map_changes(&self) -> Result<Vec<MapChangeRecord>, StoreError> {
        self.enter()?;
        self.inner.list_map_changes()
    }
}

/// Collaborators wired to recording doubles, plus handles to inspect them.
pub struct Doubles {
    pub parts: Collaborators,
    pub out: Recorder,
    pub store: Arc<CountingStore>,
    pub engine: FakeEngine,
}

pub fn doubles(maps: Vec<String>, roster: AdminRoster) -> Doubles {
    let out = Recorder::default();
    let store = Arc::new(CountingStore::new());
    let names: Vec<&str> = maps.iter().map(String::as_str).collect();
    let engine = FakeEngine::new(&names, names.first().copied().unwrap_or("none"));
    let parts = Collaborators {
        players: Box::new(Lobby::new(roster)),
        engine: Box::new(engine.clone()),
        transport: Box::new(RecordingTransport(out.clone())),
        store: store.clone(),
        catalog: Arc::new(FixedCatalog(maps)),
    };
    Doubles {
        parts,
        out,
        store,
        engine,
    }
}

pub struct Harness {
    pub host: Host,
    pub joins: JoinQueue,
    pub out: Recorder,
    pub store: Arc<CountingStore>,
    pub engine: FakeEngine,
}

/// Ten maps (`map00`..`map09`) on disk, engine sitting on `map00`.
pub fn default_maps() -> Vec<String> {
    (0..10).map(|i| format!("map{:02}", i)).collect()
}

impl Harness {
    /// Must be called from inside a tokio runtime.
    pub fn new() -> Self {
        Self::with_maps(default_maps())
    }

    pub fn with_maps(maps: Vec<String>) -> Self {
        Self::build(registry(), maps, MenuSettings::default())
    }

    pub fn build(registry: CommandRegistry, maps: Vec<String>, menu: MenuSettings) -> Self {
        let Doubles {
            parts,
            out,
            store,
            engine,
        } = doubles(maps, AdminRoster::in_memory(Vec::new()));
        let (scheduler, joins) = tasks::channel(Handle::current());
        let host = Host::new(registry, parts, scheduler, menu);
        Self {
            host,
            joins,
            out,
            store,
            engine,
        }
    }

    pub fn connect(&mut self, name: &str, auth_id: &str, privileges: &[&str]) -> Viewer {
        let n = self.host.players.players().len();
        self.host
            .players
            .connect(
                name,
                auth_id,
                &format!("10.0.0.{}:27005", n + 1),
                PrivilegeSet::with(privileges.iter().copied()),
            )
            .expect("lobby accepts players")
    }

    pub fn is_connected(&self, token: UserId) -> bool {
        self.host.players.resolve(token).is_some()
    }

    pub fn console(&mut self, line: &str) {
        self.host.dispatch_line(line, None);
    }

    pub fn as_player(&mut self, viewer: &Viewer, line: &str) {
        let current = self.host.players.resolve(viewer.user_id).expect("player connected");
        self.host.dispatch_line(line, Some(&current));
    }

    pub fn press(&mut self, viewer: &Viewer, key: u8) {
        let index = gsadmin::menu::key_index_from_key(key).expect("valid key");
        self.host.select_menu(viewer, index);
    }

    /// Drain joins until every scheduled task has been joined, or fail after 5s.
    pub async fn settle(&mut self) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut ran = 0;
        loop {
            ran += self.joins.drain(&mut self.host);
            if self.joins.outstanding() == 0 {
                return ran;
            }
            assert!(Instant::now() < deadline, "background work never joined");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    admin::register_defaults(&mut registry).expect("register defaults");
    registry
}

/// Item lines of a menu body (numbered or disabled entries).
pub fn item_lines(frame: &MenuFrame) -> Vec<String> {
    frame
        .body
        .lines()
        .filter(|l| {
            let l = l.trim_start_matches("(x) ");
            l.split_once(". ")
                .map(|(n, _)| n.len() == 1 && n.chars().all(|c| c.is_ascii_digit()))
                .unwrap_or(false)
        })
        .filter(|l| !l.ends_with("Back") && !l.ends_with("Next"))
        .map(str::to_string)
        .collect()
}
