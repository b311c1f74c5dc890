//! Group, membership and share repository

use songshare_common::db::{Group, GroupMembership, MembershipRole, MembershipStatus, Song, SongShare};
use songshare_common::uuid_utils::parse_column;
use songshare_common::Result;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

pub async fn insert_group<'e, E>(executor: E, group: &Group) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO user_groups (id, creator_id, name, description) VALUES (?, ?, ?, ?)")
        .bind(group.id.to_string())
        .bind(group.creator_id.to_string())
        .bind(&group.name)
        .bind(&group.description)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn insert_membership<'e, E>(executor: E, membership: &GroupMembership) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO group_memberships (id, group_id, user_id, status, role) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(membership.id.to_string())
    .bind(membership.group_id.to_string())
    .bind(membership.user_id.to_string())
    .bind(membership.status.as_str())
    .bind(membership.role.as_str())
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn insert_share<'e, E>(executor: E, share: &SongShare) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO song_shares (id, song_id, group_id) VALUES (?, ?, ?)")
        .bind(share.id.to_string())
        .bind(share.song_id.to_string())
        .bind(share.group_id.to_string())
        .execute(executor)
        .await?;

    Ok(())
}

/// Load a membership by id
pub async fn load_membership(pool: &SqlitePool, membership_id: Uuid) -> Result<Option<GroupMembership>> {
    let row = sqlx::query(
        "SELECT id, group_id, user_id, status, role FROM group_memberships WHERE id = ?",
    )
    .bind(membership_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let id: String = row.try_get("id")?;
    let group_id: String = row.try_get("group_id")?;
    let user_id: String = row.try_get("user_id")?;
    let status: String = row.try_get("status")?;
    let role: String = row.try_get("role")?;

    Ok(Some(GroupMembership {
        id: parse_column("group_memberships.id", &id)?,
        group_id: parse_column("group_memberships.group_id", &group_id)?,
        user_id: parse_column("group_memberships.user_id", &user_id)?,
        status: status.parse::<MembershipStatus>()?,
        role: role.parse::<MembershipRole>()?,
    }))
}

/// Load a song share by id
pub async fn load_share(pool: &SqlitePool, share_id: Uuid) -> Result<Option<SongShare>> {
    let row = sqlx::query("SELECT id, song_id, group_id FROM song_shares WHERE id = ?")
        .bind(share_id.to_string())
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let id: String = row.try_get("id")?;
    let song_id: String = row.try_get("song_id")?;
    let group_id: String = row.try_get("group_id")?;

    Ok(Some(SongShare {
        id: parse_column("song_shares.id", &id)?,
        song_id: parse_column("song_shares.song_id", &song_id)?,
        group_id: parse_column("song_shares.group_id", &group_id)?,
    }))
}

/// Users who lose access to `song` when `share` is deleted
///
/// Approved members of the share's group, minus the song's owner and minus
/// anyone who still sees the song through another group's share.
pub async fn load_affected_user_ids(pool: &SqlitePool, share: &SongShare, song: &Song) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        r#"
        SELECT m.user_id
        FROM group_memberships m
        WHERE m.group_id = ?1
          AND m.status = 'approved'
          AND m.user_id != ?2
          AND NOT EXISTS (
              SELECT 1
              FROM song_shares other
              JOIN group_memberships om ON om.group_id = other.group_id
              WHERE other.song_id = ?3
                AND other.id != ?4
                AND om.user_id = m.user_id
                AND om.status = 'approved'
          )
        ORDER BY m.user_id
        "#,
    )
    .bind(share.group_id.to_string())
    .bind(song.owner_id.to_string())
    .bind(song.id.to_string())
    .bind(share.id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<Uuid> {
            let user_id: String = row.try_get("user_id")?;
            parse_column("group_memberships.user_id", &user_id)
        })
        .collect()
}
