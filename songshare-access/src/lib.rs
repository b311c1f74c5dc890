//! songshare-access - access-loss consistency engine
//!
//! When a user loses access to shared songs (leaving a group, or an admin
//! removing a song from the group's library) their private songbooks must
//! keep working. This crate copies the lost songs into the user's own
//! storage, repoints private-songbook entries at the copies and notifies the
//! user, all as one ordered [`Plan`] that the caller commits atomically.
//!
//! - [`detector`]: the two entry points
//! - [`scanner`], [`copy_engine`], [`rewriter`], [`notifier`]: per-user stages
//! - [`plan`]: mutation types and the batcher
//! - [`store`], [`service`]: SQLite loading and commit

pub mod copy_engine;
pub mod detector;
pub mod notifier;
pub mod plan;
pub mod rewriter;
pub mod scanner;
pub mod service;
pub mod store;

pub use detector::{
    handle_song_removed_from_group, handle_user_leaving_group, AffectedUser, LeaveGroupRequest,
    SongRemovalRequest,
};
pub use plan::{EntryRepoint, Mutation, NotificationKind, NotificationSpec, Plan};
pub use scanner::{LoadedEntry, LoadedSongbook};
pub use service::{AccessChangeOutcome, AccessService};
