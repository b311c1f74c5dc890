//! Test fixtures shared by the integration tests
#![allow(dead_code)]

use songshare_access::store;
use songshare_access::{LoadedEntry, LoadedSongbook};
use songshare_common::db::{
    Group, GroupMembership, MembershipRole, MembershipStatus, Song, SongShare, Songbook,
    SongbookEntry, SongbookKind,
};
use sqlx::SqlitePool;
use uuid::Uuid;

pub fn song(owner_id: Uuid, title: &str) -> Song {
    Song {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_string(),
        artist: Some("Trad.".to_string()),
        lyrics: Some(format!("Lyrics of {}", title)),
        chord_data: Some(r#"[{"chord":"G","line":0,"pos":4}]"#.to_string()),
        parent_song_id: None,
    }
}

fn loaded(songbook: Songbook, songs: &[&Song]) -> LoadedSongbook {
    let entries = songs
        .iter()
        .enumerate()
        .map(|(order, song)| LoadedEntry {
            entry: SongbookEntry {
                id: Uuid::new_v4(),
                songbook_id: songbook.id,
                song_id: song.id,
                order: order as i64,
            },
            song: Some((*song).clone()),
        })
        .collect();

    LoadedSongbook { songbook, entries }
}

pub fn private_book(owner_id: Uuid, title: &str, songs: &[&Song]) -> LoadedSongbook {
    loaded(
        Songbook {
            id: Uuid::new_v4(),
            owner_id,
            kind: SongbookKind::Private,
            group_id: None,
            title: title.to_string(),
        },
        songs,
    )
}

pub fn group_book(owner_id: Uuid, group_id: Uuid, title: &str, songs: &[&Song]) -> LoadedSongbook {
    loaded(
        Songbook {
            id: Uuid::new_v4(),
            owner_id,
            kind: SongbookKind::Group,
            group_id: Some(group_id),
            title: title.to_string(),
        },
        songs,
    )
}

// ----------------------------------------------------------------------------
// Database seeding
// ----------------------------------------------------------------------------

pub async fn setup_db() -> SqlitePool {
    songshare_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database")
}

pub async fn seed_group(pool: &SqlitePool, creator_id: Uuid, name: &str) -> Group {
    let group = Group {
        id: Uuid::new_v4(),
        creator_id,
        name: name.to_string(),
        description: None,
    };
    store::insert_group(pool, &group).await.unwrap();
    group
}

pub async fn seed_member(
    pool: &SqlitePool,
    group: &Group,
    user_id: Uuid,
    status: MembershipStatus,
) -> GroupMembership {
    let role = if user_id == group.creator_id {
        MembershipRole::Admin
    } else {
        MembershipRole::Member
    };
    let membership = GroupMembership {
        id: Uuid::new_v4(),
        group_id: group.id,
        user_id,
        status,
        role,
    };
    store::insert_membership(pool, &membership).await.unwrap();
    membership
}

pub async fn seed_song(pool: &SqlitePool, owner_id: Uuid, title: &str) -> Song {
    let song = song(owner_id, title);
    store::insert_song(pool, &song).await.unwrap();
    song
}

pub async fn seed_share(pool: &SqlitePool, song: &Song, group: &Group) -> SongShare {
    let share = SongShare {
        id: Uuid::new_v4(),
        song_id: song.id,
        group_id: group.id,
    };
    store::insert_share(pool, &share).await.unwrap();
    share
}

async fn seed_book(pool: &SqlitePool, songbook: Songbook, songs: &[&Song]) -> (Songbook, Vec<SongbookEntry>) {
    store::insert_songbook(pool, &songbook).await.unwrap();

    let mut entries = Vec::new();
    for (order, song) in songs.iter().enumerate() {
        let entry = SongbookEntry {
            id: Uuid::new_v4(),
            songbook_id: songbook.id,
            song_id: song.id,
            order: order as i64,
        };
        store::insert_entry(pool, &entry).await.unwrap();
        entries.push(entry);
    }

    (songbook, entries)
}

pub async fn seed_private_book(
    pool: &SqlitePool,
    owner_id: Uuid,
    title: &str,
    songs: &[&Song],
) -> (Songbook, Vec<SongbookEntry>) {
    let songbook = Songbook {
        id: Uuid::new_v4(),
        owner_id,
        kind: SongbookKind::Private,
        group_id: None,
        title: title.to_string(),
    };
    seed_book(pool, songbook, songs).await
}

pub async fn seed_group_book(
    pool: &SqlitePool,
    group: &Group,
    title: &str,
    songs: &[&Song],
) -> (Songbook, Vec<SongbookEntry>) {
    let songbook = Songbook {
        id: Uuid::new_v4(),
        owner_id: group.creator_id,
        kind: SongbookKind::Group,
        group_id: Some(group.id),
        title: title.to_string(),
    };
    seed_book(pool, songbook, songs).await
}

pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await.unwrap()
}
