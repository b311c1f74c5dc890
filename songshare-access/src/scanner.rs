//! Reference scanner
//!
//! Finds every private-songbook entry of one user that points at a song the
//! user is about to lose access to.

use serde::{Deserialize, Serialize};
use songshare_common::db::{Song, Songbook, SongbookEntry};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// A songbook entry together with the song it references, if resolvable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedEntry {
    pub entry: SongbookEntry,
    /// `None` when the referenced song no longer exists or cannot be read
    pub song: Option<Song>,
}

/// A songbook pre-loaded with its entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedSongbook {
    pub songbook: Songbook,
    pub entries: Vec<LoadedEntry>,
}

/// One occurrence of an inaccessible song in a private songbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongReference {
    pub songbook_id: Uuid,
    pub song_id: Uuid,
    pub songbook_entry_id: Uuid,
    pub original_song: Song,
}

/// Scan `user_id`'s private songbooks for entries pointing into `inaccessible`
///
/// Group songbooks and songbooks owned by someone else are skipped. Entries
/// whose song could not be resolved contribute nothing. A song that occurs in
/// several songbooks (or several times in one) yields one reference per
/// occurrence, in songbook then entry order.
pub fn scan_private_references(
    user_id: Uuid,
    songbooks: &[LoadedSongbook],
    inaccessible: &HashSet<Uuid>,
) -> Vec<SongReference> {
    let mut references = Vec::new();

    if inaccessible.is_empty() {
        return references;
    }

    for loaded in songbooks {
        let songbook = &loaded.songbook;

        if !songbook.is_private() {
            debug!(songbook_id = %songbook.id, "Skipping group songbook");
            continue;
        }

        if songbook.owner_id != user_id {
            warn!(
                songbook_id = %songbook.id,
                owner_id = %songbook.owner_id,
                user_id = %user_id,
                "Skipping private songbook owned by another user"
            );
            continue;
        }

        for LoadedEntry { entry, song } in &loaded.entries {
            if !inaccessible.contains(&entry.song_id) {
                continue;
            }

            // Orphaned entry
            let Some(song) = song else {
                debug!(
                    entry_id = %entry.id,
                    song_id = %entry.song_id,
                    "Entry song unresolved, skipping"
                );
                continue;
            };

            if song.id != entry.song_id {
                warn!(
                    entry_id = %entry.id,
                    entry_song_id = %entry.song_id,
                    resolved_song_id = %song.id,
                    "Entry resolved to a different song, skipping"
                );
                continue;
            }

            references.push(SongReference {
                songbook_id: songbook.id,
                song_id: entry.song_id,
                songbook_entry_id: entry.id,
                original_song: song.clone(),
            });
        }
    }

    debug!(
        user_id = %user_id,
        songbooks = songbooks.len(),
        references = references.len(),
        "Scanned private songbooks"
    );

    references
}
