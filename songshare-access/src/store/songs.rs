//! Song repository

use songshare_common::db::Song;
use songshare_common::uuid_utils::{parse_column, parse_optional_column};
use songshare_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

const SONG_COLUMNS: &str =
    "s.id, s.owner_id, s.title, s.artist, s.lyrics, s.chord_data, s.parent_song_id";

pub(crate) fn song_from_row(row: &SqliteRow) -> Result<Song> {
    let id: String = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let parent_song_id: Option<String> = row.try_get("parent_song_id")?;

    Ok(Song {
        id: parse_column("songs.id", &id)?,
        owner_id: parse_column("songs.owner_id", &owner_id)?,
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        lyrics: row.try_get("lyrics")?,
        chord_data: row.try_get("chord_data")?,
        parent_song_id: parse_optional_column("songs.parent_song_id", parent_song_id.as_deref())?,
    })
}

/// Insert a song
pub async fn insert_song<'e, E>(executor: E, song: &Song) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO songs (
            id, owner_id, title, artist, lyrics, chord_data, parent_song_id,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(song.id.to_string())
    .bind(song.owner_id.to_string())
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.lyrics)
    .bind(&song.chord_data)
    .bind(song.parent_song_id.map(|id| id.to_string()))
    .execute(executor)
    .await?;

    Ok(())
}

/// Load a song by id
pub async fn load_song(pool: &SqlitePool, song_id: Uuid) -> Result<Option<Song>> {
    let row = sqlx::query(&format!("SELECT {} FROM songs s WHERE s.id = ?", SONG_COLUMNS))
        .bind(song_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(song_from_row).transpose()
}

/// Songs currently shared with a group
pub async fn load_group_songs(pool: &SqlitePool, group_id: Uuid) -> Result<Vec<Song>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM songs s
        JOIN song_shares sh ON sh.song_id = s.id
        WHERE sh.group_id = ?
        ORDER BY s.title, s.id
        "#,
        SONG_COLUMNS
    ))
    .bind(group_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(song_from_row).collect()
}

/// Songs shared with `group_id` that `user_id` stops seeing on leaving it
///
/// Excludes songs the user owns and songs also shared with another group
/// where the user holds an approved membership.
pub async fn load_songs_lost_on_leave(
    pool: &SqlitePool,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Song>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM songs s
        JOIN song_shares sh ON sh.song_id = s.id
        WHERE sh.group_id = ?1
          AND s.owner_id != ?2
          AND NOT EXISTS (
              SELECT 1
              FROM song_shares other
              JOIN group_memberships m ON m.group_id = other.group_id
              WHERE other.song_id = s.id
                AND other.group_id != ?1
                AND m.user_id = ?2
                AND m.status = 'approved'
          )
        ORDER BY s.title, s.id
        "#,
        SONG_COLUMNS
    ))
    .bind(group_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(song_from_row).collect()
}

/// Songs owned by `user_id` that are copies of another song
pub async fn load_existing_copies(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Song>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM songs s WHERE s.owner_id = ? AND s.parent_song_id IS NOT NULL ORDER BY s.id",
        SONG_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(song_from_row).collect()
}
