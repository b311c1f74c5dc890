//! SQLite repositories and plan commit
//!
//! The access workflow itself never touches the store; these functions load
//! its inputs and apply its output.

mod commit;
mod groups;
mod notifications;
mod songbooks;
mod songs;

pub use commit::{commit_plan, CommitSummary};
pub use groups::{
    insert_group, insert_membership, insert_share, load_affected_user_ids, load_membership,
    load_share,
};
pub use notifications::{insert_notification, list_notifications, mark_notification_read};
pub use songbooks::{
    entries_referencing_song, insert_entry, insert_songbook, load_entries, load_private_songbooks,
};
pub use songs::{
    insert_song, load_existing_copies, load_group_songs, load_song, load_songs_lost_on_leave,
};
