//! Ban, kick and map-change records in a sled database.
//!
//! Every call here may block on disk and is only made from background work scheduled
//! through [`TaskScheduler`](crate::tasks::TaskScheduler), never from the owning thread.
//! Records are bincode-encoded and carry a schema version checked on read.
//!
//! Trees:
//! * `bans` keyed by lowercased auth id (one ban per identity; a new ban replaces the old)
//! * `kicks` and `map_changes` keyed by a big-endian sled-generated id, so a scan
//!   returns them oldest first
use std::path::Path;

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use sled::IVec;
use thiserror::Error;

mod records;

pub use records::{BanRecord, KickRecord, MapChangeRecord, PlayerRef, RECORD_SCHEMA_VERSION};

const TREE_BANS: &str = "bans";
const TREE_KICKS: &str = "kicks";
const TREE_MAP_CHANGES: &str = "map_changes";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

/// Persistence used by the admin commands. Implementations must be callable from any
/// worker thread.
pub trait RecordStore: Send + Sync {
    fn add_ban(&self, ban: BanRecord) -> Result<(), StoreError>;
    fn add_kick(&self, kick: KickRecord) -> Result<(), StoreError>;
    fn add_map_change(&self, change: MapChangeRecord) -> Result<(), StoreError>;

    /// Active bans, oldest first. Expired entries are skipped.
    fn list_bans(&self) -> Result<Vec<BanRecord>, StoreError>;

    /// Active ban for an auth id.
    fn find_ban(&self, auth_id: &str) -> Result<Option<BanRecord>, StoreError>;

    /// Delete the ban for an auth id. Returns false if there was none.
    fn remove_ban(&self, auth_id: &str) -> Result<bool, StoreError>;

    fn list_kicks(&self) -> Result<Vec<KickRecord>, StoreError>;
    fn list_map_changes(&self) -> Result<Vec<MapChangeRecord>, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub bans: usize,
    pub kicks: usize,
    pub map_changes: usize,
}

/// Sled-backed [`RecordStore`].
pub struct SledStore {
    db: sled::Db,
    bans: sled::Tree,
    kicks: sled::Tree,
    map_changes: sled::Tree,
}

impl SledStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        let bans = db.open_tree(TREE_BANS)?;
        let kicks = db.open_tree(TREE_KICKS)?;
        let map_changes = db.open_tree(TREE_MAP_CHANGES)?;
        info!("record store opened at {}", path.display());
        Ok(Self {
            db,
            bans,
            kicks,
            map_changes,
        })
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            bans: self.bans.len(),
            kicks: self.kicks.len(),
            map_changes: self.map_changes.len(),
        }
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn ban_key(auth_id: &str) -> Vec<u8> {
        auth_id.trim().to_ascii_lowercase().into_bytes()
    }

    fn log_key(&self) -> Result<[u8; 8], StoreError> {
        Ok(self.db.generate_id()?.to_be_bytes())
    }

    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StoreError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    fn check_version(entity: &'static str, found: u8) -> Result<(), StoreError> {
        if found != RECORD_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                entity,
                expected: RECORD_SCHEMA_VERSION,
                found,
            });
        }
        Ok(())
    }

    fn decode_ban(bytes: IVec) -> Result<BanRecord, StoreError> {
        let record: BanRecord = Self::deserialize(bytes)?;
        Self::check_version("ban", record.schema_version)?;
        Ok(record)
    }
}

impl RecordStore for SledStore {
    fn add_ban(&self, mut ban: BanRecord) -> Result<(), StoreError> {
        ban.schema_version = RECORD_SCHEMA_VERSION;
        let key = Self::ban_key(&ban.target.auth_id);
        self.bans.insert(key, Self::serialize(&ban)?)?;
        self.bans.flush()?;
        debug!("stored ban {} for {}", ban.id, ban.target.auth_id);
        Ok(())
    }

    fn add_kick(&self, mut kick: KickRecord) -> Result<(), StoreError> {
        kick.schema_version = RECORD_SCHEMA_VERSION;
        let key = self.log_key()?;
        self.kicks.insert(key, Self::serialize(&kick)?)?;
        self.kicks.flush()?;
        Ok(())
    }

    fn add_map_change(&self, mut change: MapChangeRecord) -> Result<(), StoreError> {
        change.schema_version = RECORD_SCHEMA_VERSION;
        let key = self.log_key()?;
        self.map_changes.insert(key, Self::serialize(&change)?)?;
        self.map_changes.flush()?;
        Ok(())
    }

    fn list_bans(&self) -> Result<Vec<BanRecord>, StoreError> {
        let now = Utc::now();
        let mut bans = Vec::new();
        for entry in self.bans.iter() {
            let (_, bytes) = entry?;
            let ban = Self::decode_ban(bytes)?;
            if ban.is_active(now) {
                bans.push(ban);
            }
        }
        bans.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(bans)
    }

    fn find_ban(&self, auth_id: &str) -> Result<Option<BanRecord>, StoreError> {
        let Some(bytes) = self.bans.get(Self::ban_key(auth_id))? else {
            return Ok(None);
        };
        let ban = Self::decode_ban(bytes)?;
        Ok(ban.is_active(Utc::now()).then_some(ban))
    }

    fn remove_ban(&self, auth_id: &str) -> Result<bool, StoreError> {
        let removed = self.bans.remove(Self::ban_key(auth_id))?.is_some();
        self.bans.flush()?;
        Ok(removed)
    }

    fn list_kicks(&self) -> Result<Vec<KickRecord>, StoreError> {
        let mut kicks = Vec::new();
        for entry in self.kicks.iter() {
            let (_, bytes) = entry?;
            let record: KickRecord = Self::deserialize(bytes)?;
            Self::check_version("kick", record.schema_version)?;
            kicks.push(record);
        }
        Ok(kicks)
    }

    fn list_map_changes(&self) -> Result<Vec<MapChangeRecord>, StoreError> {
        let mut changes = Vec::new();
        for entry in self.map_changes.iter() {
            let (_, bytes) = entry?;
            let record: MapChangeRecord = Self::deserialize(bytes)?;
            Self::check_version("map change", record.schema_version)?;
            changes.push(record);
        }
        Ok(changes)
    }
}
