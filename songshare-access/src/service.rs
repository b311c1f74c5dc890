//! Access service
//!
//! Loads the inputs of an access-loss event from SQLite, runs the planner and
//! optionally commits the result. `plan_*` methods only read; the others
//! commit the plan as one transaction.

use crate::detector::{
    handle_song_removed_from_group, handle_user_leaving_group, AffectedUser, LeaveGroupRequest,
    SongRemovalRequest,
};
use crate::plan::Plan;
use crate::store::{self, CommitSummary};
use serde::Serialize;
use songshare_common::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

/// A committed access change
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessChangeOutcome {
    pub plan: Plan,
    pub summary: CommitSummary,
}

#[derive(Clone)]
pub struct AccessService {
    db: SqlitePool,
}

impl AccessService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Build the leave-group request for a membership
    ///
    /// `None` when the membership does not exist (already deleted).
    pub async fn load_leave_request(&self, membership_id: Uuid) -> Result<Option<LeaveGroupRequest>> {
        let Some(membership) = store::load_membership(&self.db, membership_id).await? else {
            return Ok(None);
        };

        let group_songs = if membership.is_approved() {
            store::load_songs_lost_on_leave(&self.db, membership.group_id, membership.user_id).await?
        } else {
            // A pending member never had access to anything
            Vec::new()
        };

        let private_songbooks = if group_songs.is_empty() {
            Vec::new()
        } else {
            store::load_private_songbooks(&self.db, membership.user_id).await?
        };

        let existing_copies = if private_songbooks.is_empty() {
            Vec::new()
        } else {
            store::load_existing_copies(&self.db, membership.user_id).await?
        };

        Ok(Some(LeaveGroupRequest {
            user_id: Some(membership.user_id),
            group_id: Some(membership.group_id),
            membership_id: Some(membership.id),
            private_songbooks,
            group_songs,
            existing_copies,
        }))
    }

    /// Build the song-removal request for a share
    ///
    /// `None` when the share does not exist (already deleted).
    pub async fn load_removal_request(&self, share_id: Uuid) -> Result<Option<SongRemovalRequest>> {
        let Some(share) = store::load_share(&self.db, share_id).await? else {
            return Ok(None);
        };

        let song = store::load_song(&self.db, share.song_id).await?;

        let mut affected_users = Vec::new();
        if let Some(song) = &song {
            for user_id in store::load_affected_user_ids(&self.db, &share, song).await? {
                let private_songbooks = store::load_private_songbooks(&self.db, user_id).await?;
                let existing_copies = store::load_existing_copies(&self.db, user_id).await?;

                affected_users.push(AffectedUser {
                    user_id: Some(user_id),
                    private_songbooks,
                    existing_copies,
                });
            }
        }

        Ok(Some(SongRemovalRequest {
            share_id: Some(share.id),
            group_id: Some(share.group_id),
            affected_users,
            song,
        }))
    }

    /// Compute, without committing, what leaving a group would change
    pub async fn plan_leave_group(&self, membership_id: Uuid) -> Result<Plan> {
        match self.load_leave_request(membership_id).await? {
            Some(request) => handle_user_leaving_group(&request),
            None => {
                warn!(membership_id = %membership_id, "Membership not found; nothing to plan");
                Ok(Plan::default())
            }
        }
    }

    /// Compute, without committing, what removing a shared song would change
    pub async fn plan_remove_song(&self, share_id: Uuid) -> Result<Plan> {
        match self.load_removal_request(share_id).await? {
            Some(request) => handle_song_removed_from_group(&request),
            None => {
                warn!(share_id = %share_id, "Song share not found; nothing to plan");
                Ok(Plan::default())
            }
        }
    }

    /// Leave a group: copy lost songs, repoint entries, notify, delete membership
    ///
    /// Fails with `Error::Conflict` if another commit handled the same
    /// membership after this plan was computed.
    pub async fn leave_group(&self, membership_id: Uuid) -> Result<AccessChangeOutcome> {
        let plan = self.plan_leave_group(membership_id).await?;
        let summary = store::commit_plan(&self.db, &plan).await?;

        info!(
            membership_id = %membership_id,
            songs_copied = summary.songs_copied,
            "Group departure complete"
        );

        Ok(AccessChangeOutcome { plan, summary })
    }

    /// Remove a song from a group's library on behalf of an admin
    pub async fn remove_song_from_group(&self, share_id: Uuid) -> Result<AccessChangeOutcome> {
        let plan = self.plan_remove_song(share_id).await?;
        let summary = store::commit_plan(&self.db, &plan).await?;

        info!(
            share_id = %share_id,
            songs_copied = summary.songs_copied,
            "Song removal complete"
        );

        Ok(AccessChangeOutcome { plan, summary })
    }
}
