//! Access change detector
//!
//! The two entry points for access-loss events. Each works out which songs
//! become inaccessible for which users, runs scan → copy → rewrite → notify
//! per user, and hands everything to the [`PlanBuilder`].
//!
//! Neither entry point touches the store. Missing identifiers produce an empty
//! plan; "nothing to do" produces a plan holding only the deletion.

use crate::copy_engine::resolve_copies;
use crate::notifier::build_notifications;
use crate::plan::{EntryRepoint, Mutation, NotificationSpec, Plan, PlanBuilder};
use crate::rewriter::build_repoints;
use crate::scanner::{scan_private_references, LoadedSongbook};
use serde::{Deserialize, Serialize};
use songshare_common::db::Song;
use songshare_common::uuid_utils::present;
use songshare_common::Result;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Input for a user leaving (or being removed from) a group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGroupRequest {
    pub user_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub membership_id: Option<Uuid>,
    #[serde(default)]
    pub private_songbooks: Vec<LoadedSongbook>,
    /// Songs currently shared with the group; all become inaccessible
    #[serde(default)]
    pub group_songs: Vec<Song>,
    /// Songs the user owns with `parent_song_id` set
    #[serde(default)]
    pub existing_copies: Vec<Song>,
}

/// One member losing access to a song removed from the group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedUser {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub private_songbooks: Vec<LoadedSongbook>,
    #[serde(default)]
    pub existing_copies: Vec<Song>,
}

/// Input for an admin removing a song from a group's shared library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRemovalRequest {
    pub share_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub affected_users: Vec<AffectedUser>,
    pub song: Option<Song>,
}

/// What one user's scan/copy/rewrite/notify pass produced
#[derive(Debug, Clone, Default)]
pub struct UserOutcome {
    pub copies: Vec<Song>,
    pub repoints: Vec<EntryRepoint>,
    pub notifications: Vec<NotificationSpec>,
    pub reused: usize,
}

impl UserOutcome {
    fn add_to(self, builder: &mut PlanBuilder) {
        builder.add_copies(self.copies);
        builder.add_repoints(self.repoints);
        builder.add_notifications(self.notifications);
    }
}

/// Run the per-user pipeline for a set of songs the user is losing
pub fn plan_for_user(
    user_id: Uuid,
    private_songbooks: &[LoadedSongbook],
    inaccessible: &HashSet<Uuid>,
    existing_copies: &[Song],
) -> Result<UserOutcome> {
    if inaccessible.is_empty() || private_songbooks.is_empty() {
        return Ok(UserOutcome::default());
    }

    let references = scan_private_references(user_id, private_songbooks, inaccessible);
    if references.is_empty() {
        return Ok(UserOutcome::default());
    }

    let resolution = resolve_copies(user_id, &references, existing_copies)?;
    let repoints = build_repoints(&references, &resolution);
    let notifications = build_notifications(user_id, &references, &resolution);
    let reused = resolution.reused_count();

    debug!(
        user_id = %user_id,
        references = references.len(),
        copies_created = resolution.created.len(),
        copies_reused = reused,
        "Planned copies for user"
    );

    Ok(UserOutcome {
        copies: resolution.created,
        repoints,
        notifications,
        reused,
    })
}

/// Plan the consequences of `user_id` leaving a group
///
/// Every song in `group_songs` becomes inaccessible. The membership deletion
/// is always the plan's terminal mutation.
pub fn handle_user_leaving_group(request: &LeaveGroupRequest) -> Result<Plan> {
    let (Some(user_id), Some(group_id), Some(membership_id)) = (
        present(request.user_id),
        present(request.group_id),
        present(request.membership_id),
    ) else {
        warn!("Leave-group request is missing user, group or membership id; nothing planned");
        return Ok(Plan::default());
    };

    let mut builder = PlanBuilder::new();
    let mut reused = 0;

    if request.group_songs.is_empty() {
        debug!(user_id = %user_id, group_id = %group_id, "Group has no shared songs");
    } else {
        let inaccessible: HashSet<Uuid> = request.group_songs.iter().map(|s| s.id).collect();
        let outcome = plan_for_user(
            user_id,
            &request.private_songbooks,
            &inaccessible,
            &request.existing_copies,
        )?;
        reused += outcome.reused;
        outcome.add_to(&mut builder);
    }

    let plan = builder.finish(Mutation::DeleteMembership { membership_id });

    info!(
        user_id = %user_id,
        group_id = %group_id,
        copies = plan.copy_count(),
        copies_reused = reused,
        repoints = plan.repoint_count(),
        notifications = plan.notifications.len(),
        "Planned group departure"
    );

    Ok(plan)
}

/// Plan the consequences of a song being removed from a group
///
/// Each affected user is handled independently; copies, repoints and
/// notifications from all of them land in one plan ending with the share
/// deletion.
pub fn handle_song_removed_from_group(request: &SongRemovalRequest) -> Result<Plan> {
    let (Some(share_id), Some(group_id), Some(song)) = (
        present(request.share_id),
        present(request.group_id),
        request.song.as_ref().filter(|s| !s.id.is_nil()),
    ) else {
        warn!("Song-removal request is missing share, group or song; nothing planned");
        return Ok(Plan::default());
    };

    let inaccessible = HashSet::from([song.id]);
    let mut builder = PlanBuilder::new();
    let mut seen_users: HashSet<Uuid> = HashSet::new();
    let mut reused = 0;

    for affected in &request.affected_users {
        let Some(user_id) = present(affected.user_id) else {
            warn!(share_id = %share_id, "Affected user without id, skipping");
            continue;
        };

        if !seen_users.insert(user_id) {
            warn!(user_id = %user_id, "Affected user listed twice, skipping duplicate");
            continue;
        }

        let outcome = plan_for_user(
            user_id,
            &affected.private_songbooks,
            &inaccessible,
            &affected.existing_copies,
        )?;
        reused += outcome.reused;
        outcome.add_to(&mut builder);
    }

    let plan = builder.finish(Mutation::DeleteShare { share_id });

    info!(
        share_id = %share_id,
        group_id = %group_id,
        song_id = %song.id,
        affected_users = seen_users.len(),
        copies = plan.copy_count(),
        copies_reused = reused,
        repoints = plan.repoint_count(),
        notifications = plan.notifications.len(),
        "Planned song removal"
    );

    Ok(plan)
}
