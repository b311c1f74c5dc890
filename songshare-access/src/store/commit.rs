//! Atomic plan commit

use super::notifications::insert_notification;
use super::songs::insert_song;
use crate::plan::{EntryRepoint, Mutation, Plan};
use chrono::{DateTime, Utc};
use serde::Serialize;
use songshare_common::db::Song;
use songshare_common::{Error, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, error, info, warn};

/// What a committed plan changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub songs_copied: usize,
    pub entries_repointed: usize,
    /// Repoints that matched no row (entry edited or removed since planning)
    pub entries_skipped: usize,
    pub memberships_deleted: usize,
    pub shares_deleted: usize,
    pub notifications_created: usize,
    pub committed_at: Option<DateTime<Utc>>,
}

/// Apply every mutation of `plan`, in order, inside one transaction
///
/// Either the whole plan becomes visible or none of it does. Store errors are
/// returned unchanged and nothing is retried.
///
/// A plan computed from state that has since changed is rejected with
/// [`Error::Conflict`]: a copy the user already owns, or a membership/share
/// that is already gone while the plan still has work to do. Deleting an
/// already-deleted membership or share in an otherwise empty plan is a no-op.
pub async fn commit_plan(pool: &SqlitePool, plan: &Plan) -> Result<CommitSummary> {
    if plan.is_empty() {
        debug!("Empty plan, nothing to commit");
        return Ok(CommitSummary::default());
    }

    plan.verify()?;

    let mut tx = pool.begin().await?;
    let mut summary = CommitSummary::default();

    if let Err(e) = apply_mutations(&mut tx, plan, &mut summary).await {
        if matches!(e, Error::Conflict(_)) {
            warn!(error = %e, "Stale plan, rolling back");
        } else {
            error!(
                mutations = plan.mutations.len(),
                error = %e,
                "Plan commit failed, rolling back"
            );
        }
        return Err(e);
    }

    tx.commit().await?;
    summary.committed_at = Some(Utc::now());

    info!(
        songs_copied = summary.songs_copied,
        entries_repointed = summary.entries_repointed,
        entries_skipped = summary.entries_skipped,
        memberships_deleted = summary.memberships_deleted,
        shares_deleted = summary.shares_deleted,
        notifications_created = summary.notifications_created,
        "Plan committed"
    );

    Ok(summary)
}

async fn apply_mutations(
    tx: &mut Transaction<'_, Sqlite>,
    plan: &Plan,
    summary: &mut CommitSummary,
) -> Result<()> {
    // Anything besides the terminal deletion
    let has_work = plan.mutations.len() > 1;

    for mutation in &plan.mutations {
        match mutation {
            Mutation::CreateSongCopy(song) => {
                ensure_no_existing_copy(tx, song).await?;
                insert_song(&mut **tx, song).await?;
                summary.songs_copied += 1;
            }
            Mutation::RepointEntry(repoint) => {
                if repoint_entry(tx, repoint).await? {
                    summary.entries_repointed += 1;
                } else {
                    warn!(
                        entry_id = %repoint.entry_id,
                        songbook_id = %repoint.songbook_id,
                        "Entry no longer references the original song, left unchanged"
                    );
                    summary.entries_skipped += 1;
                }
            }
            Mutation::DeleteMembership { membership_id } => {
                let result = sqlx::query("DELETE FROM group_memberships WHERE id = ?")
                    .bind(membership_id.to_string())
                    .execute(&mut **tx)
                    .await?;
                if result.rows_affected() == 0 && has_work {
                    return Err(Error::Conflict(format!(
                        "Membership {} no longer exists; the plan is stale",
                        membership_id
                    )));
                }
                summary.memberships_deleted += result.rows_affected() as usize;
            }
            Mutation::DeleteShare { share_id } => {
                let result = sqlx::query("DELETE FROM song_shares WHERE id = ?")
                    .bind(share_id.to_string())
                    .execute(&mut **tx)
                    .await?;
                if result.rows_affected() == 0 && has_work {
                    return Err(Error::Conflict(format!(
                        "Song share {} no longer exists; the plan is stale",
                        share_id
                    )));
                }
                summary.shares_deleted += result.rows_affected() as usize;
            }
            Mutation::CreateNotification(spec) => {
                insert_notification(&mut **tx, spec).await?;
                summary.notifications_created += 1;
            }
        }
    }

    Ok(())
}

/// Fail if the owner already has a copy of the same original
async fn ensure_no_existing_copy(tx: &mut Transaction<'_, Sqlite>, song: &Song) -> Result<()> {
    let Some(parent_id) = song.parent_song_id else {
        return Ok(());
    };

    let existing: Option<String> = sqlx::query_scalar(
        "SELECT id FROM songs WHERE owner_id = ? AND parent_song_id = ? LIMIT 1",
    )
    .bind(song.owner_id.to_string())
    .bind(parent_id.to_string())
    .fetch_optional(&mut **tx)
    .await?;

    match existing {
        Some(existing_id) => Err(Error::Conflict(format!(
            "User {} already owns copy {} of song {}; the plan is stale",
            song.owner_id, existing_id, parent_id
        ))),
        None => Ok(()),
    }
}

/// Repoint one private-songbook entry; false if no row matched
async fn repoint_entry(tx: &mut Transaction<'_, Sqlite>, repoint: &EntryRepoint) -> Result<bool> {
    // Group songbooks are never rewritten
    let result = sqlx::query(
        r#"
        UPDATE songbook_entries
        SET song_id = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
          AND songbook_id = ?
          AND song_id = ?
          AND songbook_id IN (SELECT id FROM songbooks WHERE kind = 'private')
        "#,
    )
    .bind(repoint.to_song_id.to_string())
    .bind(repoint.entry_id.to_string())
    .bind(repoint.songbook_id.to_string())
    .bind(repoint.from_song_id.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}
