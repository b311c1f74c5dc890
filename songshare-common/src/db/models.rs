//! Database models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A song owned by one user
///
/// `parent_song_id` is the copy lineage: set only on songs created by copying
/// another user's song, pointing back at that original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub artist: Option<String>,
    pub lyrics: Option<String>,
    /// Serialized chord positions, opaque to this crate
    pub chord_data: Option<String>,
    pub parent_song_id: Option<Uuid>,
}

/// Makes a song visible to every approved member of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongShare {
    pub id: Uuid,
    pub song_id: Uuid,
    pub group_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    /// Creator is the implicit admin
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Approved,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Approved => "approved",
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(MembershipStatus::Pending),
            "approved" => Ok(MembershipStatus::Approved),
            other => Err(Error::InvalidInput(format!("Unknown membership status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    Admin,
    Member,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
        }
    }
}

impl FromStr for MembershipRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(MembershipRole::Admin),
            "member" => Ok(MembershipRole::Member),
            other => Err(Error::InvalidInput(format!("Unknown membership role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatus,
    pub role: MembershipRole,
}

impl GroupMembership {
    pub fn is_approved(&self) -> bool {
        self.status == MembershipStatus::Approved
    }
}

/// Songbook type
///
/// Group songbooks follow the group's sharing state directly and are never
/// touched by the access workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongbookKind {
    Private,
    Group,
}

impl SongbookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SongbookKind::Private => "private",
            SongbookKind::Group => "group",
        }
    }
}

impl FromStr for SongbookKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "private" => Ok(SongbookKind::Private),
            "group" => Ok(SongbookKind::Group),
            other => Err(Error::InvalidInput(format!("Unknown songbook type: {}", other))),
        }
    }
}

impl fmt::Display for SongbookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Songbook {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: SongbookKind,
    /// Set for group songbooks only
    pub group_id: Option<Uuid>,
    pub title: String,
}

impl Songbook {
    pub fn is_private(&self) -> bool {
        self.kind == SongbookKind::Private
    }
}

/// One position within a songbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongbookEntry {
    pub id: Uuid,
    pub songbook_id: Uuid,
    pub song_id: Uuid,
    pub order: i64,
}

/// Notification type written when songs are copied into private storage
pub const NOTIFICATION_SONGS_COPIED: &str = "songs_copied";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Notification type, e.g. [`NOTIFICATION_SONGS_COPIED`]
    pub kind: String,
    pub message: String,
    pub songbook_id: Option<Uuid>,
    pub count: Option<i64>,
    pub read: bool,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}
