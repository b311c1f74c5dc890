//! Songbook and entry repository

use crate::scanner::{LoadedEntry, LoadedSongbook};
use songshare_common::db::{Song, Songbook, SongbookEntry, SongbookKind};
use songshare_common::uuid_utils::{parse_column, parse_optional_column};
use songshare_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

fn entry_from_row(row: &SqliteRow) -> Result<SongbookEntry> {
    let id: String = row.try_get("id")?;
    let songbook_id: String = row.try_get("songbook_id")?;
    let song_id: String = row.try_get("song_id")?;

    Ok(SongbookEntry {
        id: parse_column("songbook_entries.id", &id)?,
        songbook_id: parse_column("songbook_entries.songbook_id", &songbook_id)?,
        song_id: parse_column("songbook_entries.song_id", &song_id)?,
        order: row.try_get("position")?,
    })
}

/// Insert a songbook
pub async fn insert_songbook<'e, E>(executor: E, songbook: &Songbook) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO songbooks (id, owner_id, kind, group_id, title) VALUES (?, ?, ?, ?, ?)")
        .bind(songbook.id.to_string())
        .bind(songbook.owner_id.to_string())
        .bind(songbook.kind.as_str())
        .bind(songbook.group_id.map(|id| id.to_string()))
        .bind(&songbook.title)
        .execute(executor)
        .await?;

    Ok(())
}

/// Insert an entry at its position
pub async fn insert_entry<'e, E>(executor: E, entry: &SongbookEntry) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO songbook_entries (id, songbook_id, song_id, position, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(entry.songbook_id.to_string())
    .bind(entry.song_id.to_string())
    .bind(entry.order)
    .execute(executor)
    .await?;

    Ok(())
}

/// Entries of one songbook in order
pub async fn load_entries(pool: &SqlitePool, songbook_id: Uuid) -> Result<Vec<SongbookEntry>> {
    let rows = sqlx::query(
        "SELECT id, songbook_id, song_id, position FROM songbook_entries WHERE songbook_id = ? ORDER BY position, id",
    )
    .bind(songbook_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

/// Every entry, in any songbook, that references `song_id`
pub async fn entries_referencing_song(pool: &SqlitePool, song_id: Uuid) -> Result<Vec<SongbookEntry>> {
    let rows = sqlx::query(
        "SELECT id, songbook_id, song_id, position FROM songbook_entries WHERE song_id = ? ORDER BY songbook_id, position",
    )
    .bind(song_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

/// A user's private songbooks with their entries and resolved songs
///
/// Entries whose song row is gone load with `song = None`.
pub async fn load_private_songbooks(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<LoadedSongbook>> {
    let book_rows = sqlx::query(
        "SELECT id, owner_id, kind, group_id, title FROM songbooks WHERE owner_id = ? AND kind = 'private' ORDER BY title, id",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut songbooks = Vec::with_capacity(book_rows.len());
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for row in &book_rows {
        let id: String = row.try_get("id")?;
        let owner_id: String = row.try_get("owner_id")?;
        let kind: String = row.try_get("kind")?;
        let group_id: Option<String> = row.try_get("group_id")?;

        let songbook = Songbook {
            id: parse_column("songbooks.id", &id)?,
            owner_id: parse_column("songbooks.owner_id", &owner_id)?,
            kind: kind.parse::<SongbookKind>()?,
            group_id: parse_optional_column("songbooks.group_id", group_id.as_deref())?,
            title: row.try_get("title")?,
        };

        index.insert(songbook.id, songbooks.len());
        songbooks.push(LoadedSongbook {
            songbook,
            entries: Vec::new(),
        });
    }

    if songbooks.is_empty() {
        return Ok(songbooks);
    }

    let entry_rows = sqlx::query(
        r#"
        SELECT e.id, e.songbook_id, e.song_id, e.position,
               s.id AS s_id, s.owner_id AS s_owner_id, s.title AS s_title,
               s.artist AS s_artist, s.lyrics AS s_lyrics, s.chord_data AS s_chord_data,
               s.parent_song_id AS s_parent_song_id
        FROM songbook_entries e
        JOIN songbooks b ON b.id = e.songbook_id
        LEFT JOIN songs s ON s.id = e.song_id
        WHERE b.owner_id = ? AND b.kind = 'private'
        ORDER BY e.songbook_id, e.position, e.id
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    for row in &entry_rows {
        let entry = entry_from_row(row)?;
        let song = joined_song(row)?;

        if let Some(&slot) = index.get(&entry.songbook_id) {
            songbooks[slot].entries.push(LoadedEntry { entry, song });
        }
    }

    Ok(songbooks)
}

fn joined_song(row: &SqliteRow) -> Result<Option<Song>> {
    let Some(id) = row.try_get::<Option<String>, _>("s_id")? else {
        return Ok(None);
    };
    let owner_id: String = row.try_get("s_owner_id")?;
    let parent_song_id: Option<String> = row.try_get("s_parent_song_id")?;

    Ok(Some(Song {
        id: parse_column("songs.id", &id)?,
        owner_id: parse_column("songs.owner_id", &owner_id)?,
        title: row.try_get("s_title")?,
        artist: row.try_get("s_artist")?,
        lyrics: row.try_get("s_lyrics")?,
        chord_data: row.try_get("s_chord_data")?,
        parent_song_id: parse_optional_column("songs.parent_song_id", parent_song_id.as_deref())?,
    }))
}
