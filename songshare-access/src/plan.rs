//! Plan types and the transaction batcher
//!
//! A [`Plan`] is the complete, ordered set of writes produced by one
//! access-loss event. Nothing here touches the store; committing is the
//! caller's job (see [`crate::store::commit_plan`]).
//!
//! Ordering inside a plan is fixed:
//! 1. copy creations
//! 2. entry repoints
//! 3. the membership or share deletion
//! 4. notification creations
//!
//! Copy ids are assigned before the plan is built, so repoints can name their
//! target and the whole plan commits as a single transaction.

use serde::Serialize;
use songshare_common::db::{Song, NOTIFICATION_SONGS_COPIED};
use songshare_common::{Error, Result};
use std::collections::HashSet;
use uuid::Uuid;

/// Notification type emitted by the access workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SongsCopied,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SongsCopied => NOTIFICATION_SONGS_COPIED,
        }
    }
}

/// A notification to be created for one (user, songbook) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSpec {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub songbook_id: Option<Uuid>,
    pub count: Option<u32>,
}

/// Repoint one private songbook entry from an original song to its copy
///
/// Only `song_id` changes; `from_song_id` guards against an entry that was
/// edited after the plan was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRepoint {
    pub entry_id: Uuid,
    pub songbook_id: Uuid,
    pub from_song_id: Uuid,
    pub to_song_id: Uuid,
}

/// One pending write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Insert a new song owned by the losing user, `parent_song_id` set
    CreateSongCopy(Song),
    RepointEntry(EntryRepoint),
    DeleteMembership {
        #[serde(rename = "membershipId")]
        membership_id: Uuid,
    },
    DeleteShare {
        #[serde(rename = "shareId")]
        share_id: Uuid,
    },
    CreateNotification(NotificationSpec),
}

impl Mutation {
    /// Position of this mutation's phase within a plan
    fn phase(&self) -> u8 {
        match self {
            Mutation::CreateSongCopy(_) => 0,
            Mutation::RepointEntry(_) => 1,
            Mutation::DeleteMembership { .. } | Mutation::DeleteShare { .. } => 2,
            Mutation::CreateNotification(_) => 3,
        }
    }
}

/// Ordered mutations plus the notifications they create
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub mutations: Vec<Mutation>,
    pub notifications: Vec<NotificationSpec>,
}

impl Plan {
    /// True when there is nothing to write at all
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn copies(&self) -> impl Iterator<Item = &Song> {
        self.mutations.iter().filter_map(|m| match m {
            Mutation::CreateSongCopy(song) => Some(song),
            _ => None,
        })
    }

    pub fn repoints(&self) -> impl Iterator<Item = &EntryRepoint> {
        self.mutations.iter().filter_map(|m| match m {
            Mutation::RepointEntry(repoint) => Some(repoint),
            _ => None,
        })
    }

    pub fn copy_count(&self) -> usize {
        self.copies().count()
    }

    pub fn repoint_count(&self) -> usize {
        self.repoints().count()
    }

    /// Check the plan's structural invariants before committing
    ///
    /// - phases appear in order
    /// - at most one membership/share deletion
    /// - every repoint to a copy created in this plan comes after that copy
    /// - no song id is created twice
    pub fn verify(&self) -> Result<()> {
        let mut last_phase = 0u8;
        let mut terminals = 0usize;
        let mut created: HashSet<Uuid> = HashSet::new();
        let all_created: HashSet<Uuid> = self.copies().map(|song| song.id).collect();

        for (index, mutation) in self.mutations.iter().enumerate() {
            let phase = mutation.phase();
            if phase < last_phase {
                return Err(Error::Internal(format!(
                    "Plan mutation {} is out of order",
                    index
                )));
            }
            last_phase = phase;

            match mutation {
                Mutation::CreateSongCopy(song) => {
                    if !created.insert(song.id) {
                        return Err(Error::Internal(format!(
                            "Plan creates song {} twice",
                            song.id
                        )));
                    }
                }
                Mutation::RepointEntry(repoint) => {
                    if all_created.contains(&repoint.to_song_id)
                        && !created.contains(&repoint.to_song_id)
                    {
                        return Err(Error::Internal(format!(
                            "Entry {} is repointed before copy {} is created",
                            repoint.entry_id, repoint.to_song_id
                        )));
                    }
                }
                Mutation::DeleteMembership { .. } | Mutation::DeleteShare { .. } => {
                    terminals += 1;
                }
                Mutation::CreateNotification(_) => {}
            }
        }

        if terminals > 1 {
            return Err(Error::Internal(format!(
                "Plan contains {} membership/share deletions",
                terminals
            )));
        }

        Ok(())
    }
}

/// Accumulates per-user results and assembles them into one ordered [`Plan`]
#[derive(Debug, Default)]
pub struct PlanBuilder {
    copies: Vec<Song>,
    repoints: Vec<EntryRepoint>,
    notifications: Vec<NotificationSpec>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_copies(&mut self, copies: impl IntoIterator<Item = Song>) {
        self.copies.extend(copies);
    }

    pub fn add_repoints(&mut self, repoints: impl IntoIterator<Item = EntryRepoint>) {
        self.repoints.extend(repoints);
    }

    pub fn add_notifications(&mut self, notifications: impl IntoIterator<Item = NotificationSpec>) {
        self.notifications.extend(notifications);
    }

    /// Concatenate copies, repoints, the terminal deletion and notifications
    pub fn finish(self, terminal: Mutation) -> Plan {
        let mut mutations =
            Vec::with_capacity(self.copies.len() + self.repoints.len() + self.notifications.len() + 1);

        mutations.extend(self.copies.into_iter().map(Mutation::CreateSongCopy));
        mutations.extend(self.repoints.into_iter().map(Mutation::RepointEntry));
        mutations.push(terminal);
        mutations.extend(
            self.notifications
                .iter()
                .cloned()
                .map(Mutation::CreateNotification),
        );

        Plan {
            mutations,
            notifications: self.notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy_of(original: Uuid, owner: Uuid) -> Song {
        Song {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: "Copy".to_string(),
            artist: None,
            lyrics: None,
            chord_data: None,
            parent_song_id: Some(original),
        }
    }

    fn notification(user_id: Uuid) -> NotificationSpec {
        NotificationSpec {
            user_id,
            kind: NotificationKind::SongsCopied,
            message: "saved".to_string(),
            songbook_id: Some(Uuid::new_v4()),
            count: Some(1),
        }
    }

    #[test]
    fn test_finish_orders_phases() {
        let user = Uuid::new_v4();
        let original = Uuid::new_v4();
        let copy = copy_of(original, user);
        let membership_id = Uuid::new_v4();

        let mut builder = PlanBuilder::new();
        builder.add_notifications(vec![notification(user)]);
        builder.add_repoints(vec![EntryRepoint {
            entry_id: Uuid::new_v4(),
            songbook_id: Uuid::new_v4(),
            from_song_id: original,
            to_song_id: copy.id,
        }]);
        builder.add_copies(vec![copy]);

        let plan = builder.finish(Mutation::DeleteMembership { membership_id });

        assert_eq!(plan.mutations.len(), 4);
        assert!(matches!(plan.mutations[0], Mutation::CreateSongCopy(_)));
        assert!(matches!(plan.mutations[1], Mutation::RepointEntry(_)));
        assert_eq!(plan.mutations[2], Mutation::DeleteMembership { membership_id });
        assert!(matches!(plan.mutations[3], Mutation::CreateNotification(_)));
        assert_eq!(plan.notifications.len(), 1);
        plan.verify().unwrap();
    }

    #[test]
    fn test_finish_with_nothing_but_terminal() {
        let share_id = Uuid::new_v4();
        let plan = PlanBuilder::new().finish(Mutation::DeleteShare { share_id });

        assert_eq!(plan.mutations, vec![Mutation::DeleteShare { share_id }]);
        assert!(plan.notifications.is_empty());
    }

    #[test]
    fn test_verify_rejects_repoint_before_copy() {
        let user = Uuid::new_v4();
        let original = Uuid::new_v4();
        let copy = copy_of(original, user);

        let plan = Plan {
            mutations: vec![
                Mutation::RepointEntry(EntryRepoint {
                    entry_id: Uuid::new_v4(),
                    songbook_id: Uuid::new_v4(),
                    from_song_id: original,
                    to_song_id: copy.id,
                }),
                Mutation::CreateSongCopy(copy),
            ],
            notifications: vec![],
        };

        assert!(plan.verify().is_err());
    }

    #[test]
    fn test_verify_rejects_two_terminals() {
        let plan = Plan {
            mutations: vec![
                Mutation::DeleteMembership { membership_id: Uuid::new_v4() },
                Mutation::DeleteShare { share_id: Uuid::new_v4() },
            ],
            notifications: vec![],
        };

        assert!(plan.verify().is_err());
    }

    #[test]
    fn test_verify_accepts_repoint_to_existing_copy() {
        // Reused copies are not created by the plan, so there is nothing to order against
        let plan = Plan {
            mutations: vec![
                Mutation::RepointEntry(EntryRepoint {
                    entry_id: Uuid::new_v4(),
                    songbook_id: Uuid::new_v4(),
                    from_song_id: Uuid::new_v4(),
                    to_song_id: Uuid::new_v4(),
                }),
                Mutation::DeleteMembership { membership_id: Uuid::new_v4() },
            ],
            notifications: vec![],
        };

        plan.verify().unwrap();
    }

    #[test]
    fn test_plan_serializes_with_op_tags() {
        let membership_id = Uuid::new_v4();
        let plan = PlanBuilder::new().finish(Mutation::DeleteMembership { membership_id });

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["mutations"][0]["op"], "delete_membership");
        assert_eq!(json["mutations"][0]["membershipId"], membership_id.to_string());
    }
}
