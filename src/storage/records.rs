use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::command::target::BanLength;
use crate::host::Viewer;

pub const RECORD_SCHEMA_VERSION: u8 = 1;

/// Who a record is about, captured at the time of the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub name: String,
    pub auth_id: String,
    pub address: String,
}

impl From<&Viewer> for PlayerRef {
    fn from(v: &Viewer) -> Self {
        Self {
            name: v.name.clone(),
            auth_id: v.auth_id.clone(),
            address: v.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanRecord {
    pub schema_version: u8,
    pub id: Uuid,
    pub target: PlayerRef,
    /// `None` when issued from the console.
    pub admin: Option<PlayerRef>,
    pub created_at: DateTime<Utc>,
    /// `None` is permanent.
    pub duration_minutes: Option<u64>,
    pub reason: String,
}

impl BanRecord {
    pub fn new(
        target: PlayerRef,
        admin: Option<PlayerRef>,
        length: BanLength,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            schema_version: RECORD_SCHEMA_VERSION,
            id: Uuid::new_v4(),
            target,
            admin,
            created_at: Utc::now(),
            duration_minutes: length.minutes(),
            reason: reason.into(),
        }
    }

    pub fn length(&self) -> BanLength {
        match self.duration_minutes {
            Some(m) => BanLength::Minutes(m),
            None => BanLength::Permanent,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let minutes = i64::try_from(self.duration_minutes?).ok()?;
        self.created_at
            .checked_add_signed(ChronoDuration::minutes(minutes))
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.duration_minutes {
            None => true,
            Some(_) => self.expires_at().map(|at| now < at).unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickRecord {
    pub schema_version: u8,
    pub id: Uuid,
    pub target: PlayerRef,
    pub admin: Option<PlayerRef>,
    pub created_at: DateTime<Utc>,
    pub reason: String,
}

impl KickRecord {
    pub fn new(target: PlayerRef, admin: Option<PlayerRef>, reason: impl Into<String>) -> Self {
        Self {
            schema_version: RECORD_SCHEMA_VERSION,
            id: Uuid::new_v4(),
            target,
            admin,
            created_at: Utc::now(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapChangeRecord {
    pub schema_version: u8,
    pub id: Uuid,
    pub admin: Option<PlayerRef>,
    pub created_at: DateTime<Utc>,
    pub from_map: String,
    pub to_map: String,
}

impl MapChangeRecord {
    pub fn new(admin: Option<PlayerRef>, from_map: impl Into<String>, to_map: impl Into<String>) -> Self {
        Self {
            schema_version: RECORD_SCHEMA_VERSION,
            id: Uuid::new_v4(),
            admin,
            created_at: Utc::now(),
            from_map: from_map.into(),
            to_map: to_map.into(),
        }
    }
}
