//! Copy engine
//!
//! Resolves every distinct original song a user references to exactly one
//! song the user owns: an existing copy when there is one, otherwise a new
//! copy with a pre-assigned id.

use crate::scanner::SongReference;
use songshare_common::db::Song;
use songshare_common::{uuid_utils, Error, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Where a resolved copy came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOrigin {
    /// Created by this invocation
    Created,
    /// The user already owned a copy of the original
    Reused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCopy {
    pub copy_id: Uuid,
    pub origin: CopyOrigin,
}

/// Result of copy resolution for one user
#[derive(Debug, Clone, Default)]
pub struct CopyResolution {
    /// original song id -> copy the user owns
    pub resolved: HashMap<Uuid, ResolvedCopy>,
    /// New songs to insert, in first-reference order
    pub created: Vec<Song>,
}

impl CopyResolution {
    pub fn copy_id_for(&self, original_id: &Uuid) -> Option<Uuid> {
        self.resolved.get(original_id).map(|r| r.copy_id)
    }

    pub fn reused_count(&self) -> usize {
        self.resolved
            .values()
            .filter(|r| r.origin == CopyOrigin::Reused)
            .count()
    }
}

/// Build a copy of `original` owned by `owner_id`
///
/// Title, artist, lyrics and chord data are duplicated verbatim.
pub fn duplicate_song(original: &Song, owner_id: Uuid) -> Song {
    Song {
        id: uuid_utils::generate(),
        owner_id,
        title: original.title.clone(),
        artist: original.artist.clone(),
        lyrics: original.lyrics.clone(),
        chord_data: original.chord_data.clone(),
        parent_song_id: Some(original.id),
    }
}

/// Resolve one copy per distinct original referenced by `user_id`
///
/// `existing_copies` should be the user's songs with `parent_song_id` set.
/// Entries owned by someone else are ignored. Two or more existing copies of
/// the same referenced original is rejected as an invariant violation rather
/// than resolved by picking one.
pub fn resolve_copies(
    user_id: Uuid,
    references: &[SongReference],
    existing_copies: &[Song],
) -> Result<CopyResolution> {
    let mut by_parent: HashMap<Uuid, Vec<&Song>> = HashMap::new();
    for copy in existing_copies {
        let Some(parent_id) = copy.parent_song_id else {
            continue;
        };
        if copy.owner_id != user_id {
            warn!(
                song_id = %copy.id,
                owner_id = %copy.owner_id,
                user_id = %user_id,
                "Ignoring existing copy owned by another user"
            );
            continue;
        }
        by_parent.entry(parent_id).or_default().push(copy);
    }

    let mut resolution = CopyResolution::default();
    let mut seen: HashSet<Uuid> = HashSet::new();

    for reference in references {
        let original = &reference.original_song;
        if !seen.insert(original.id) {
            continue;
        }

        match by_parent.get(&original.id).map(Vec::as_slice) {
            Some([existing]) => {
                debug!(
                    original_id = %original.id,
                    copy_id = %existing.id,
                    "Reusing existing copy"
                );
                resolution.resolved.insert(
                    original.id,
                    ResolvedCopy {
                        copy_id: existing.id,
                        origin: CopyOrigin::Reused,
                    },
                );
            }
            Some(copies) if copies.len() > 1 => {
                let ids: Vec<String> = copies.iter().map(|c| c.id.to_string()).collect();
                error!(
                    user_id = %user_id,
                    original_id = %original.id,
                    copies = ?ids,
                    "User owns multiple copies of the same original"
                );
                return Err(Error::InvariantViolation(format!(
                    "user {} owns {} copies of song {}: {}",
                    user_id,
                    copies.len(),
                    original.id,
                    ids.join(", ")
                )));
            }
            _ => {
                let copy = duplicate_song(original, user_id);
                debug!(
                    original_id = %original.id,
                    copy_id = %copy.id,
                    "Creating copy"
                );
                resolution.resolved.insert(
                    original.id,
                    ResolvedCopy {
                        copy_id: copy.id,
                        origin: CopyOrigin::Created,
                    },
                );
                resolution.created.push(copy);
            }
        }
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original(owner: Uuid) -> Song {
        Song {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: "Blue Moon".to_string(),
            artist: Some("Rodgers & Hart".to_string()),
            lyrics: Some("Blue moon, you saw me standing alone".to_string()),
            chord_data: Some(r#"[{"chord":"C","pos":0}]"#.to_string()),
            parent_song_id: None,
        }
    }

    fn reference(song: &Song) -> SongReference {
        SongReference {
            songbook_id: Uuid::new_v4(),
            song_id: song.id,
            songbook_entry_id: Uuid::new_v4(),
            original_song: song.clone(),
        }
    }

    #[test]
    fn test_creates_one_copy_per_distinct_original() {
        let user = Uuid::new_v4();
        let song = original(Uuid::new_v4());
        let refs = vec![reference(&song), reference(&song), reference(&song)];

        let resolution = resolve_copies(user, &refs, &[]).unwrap();

        assert_eq!(resolution.created.len(), 1);
        let copy = &resolution.created[0];
        assert_eq!(copy.owner_id, user);
        assert_eq!(copy.parent_song_id, Some(song.id));
        assert_eq!(copy.title, song.title);
        assert_eq!(copy.artist, song.artist);
        assert_eq!(copy.lyrics, song.lyrics);
        assert_eq!(copy.chord_data, song.chord_data);
        assert_ne!(copy.id, song.id);
        assert_eq!(resolution.copy_id_for(&song.id), Some(copy.id));
    }

    #[test]
    fn test_reuses_existing_copy() {
        let user = Uuid::new_v4();
        let song = original(Uuid::new_v4());
        let existing = duplicate_song(&song, user);

        let resolution = resolve_copies(user, &[reference(&song)], &[existing.clone()]).unwrap();

        assert!(resolution.created.is_empty());
        assert_eq!(
            resolution.resolved.get(&song.id),
            Some(&ResolvedCopy {
                copy_id: existing.id,
                origin: CopyOrigin::Reused,
            })
        );
        assert_eq!(resolution.reused_count(), 1);
    }

    #[test]
    fn test_ignores_copies_owned_by_someone_else() {
        let user = Uuid::new_v4();
        let song = original(Uuid::new_v4());
        let foreign = duplicate_song(&song, Uuid::new_v4());

        let resolution = resolve_copies(user, &[reference(&song)], &[foreign]).unwrap();

        assert_eq!(resolution.created.len(), 1);
        assert_eq!(resolution.created[0].owner_id, user);
    }

    #[test]
    fn test_multiple_existing_copies_is_rejected() {
        let user = Uuid::new_v4();
        let song = original(Uuid::new_v4());
        let copies = vec![duplicate_song(&song, user), duplicate_song(&song, user)];

        let err = resolve_copies(user, &[reference(&song)], &copies).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[test]
    fn test_duplicate_copies_of_unreferenced_original_are_irrelevant() {
        let user = Uuid::new_v4();
        let song = original(Uuid::new_v4());
        let other = original(Uuid::new_v4());
        let copies = vec![duplicate_song(&other, user), duplicate_song(&other, user)];

        let resolution = resolve_copies(user, &[reference(&song)], &copies).unwrap();
        assert_eq!(resolution.created.len(), 1);
    }

    #[test]
    fn test_no_references_no_copies() {
        let resolution = resolve_copies(Uuid::new_v4(), &[], &[]).unwrap();
        assert!(resolution.created.is_empty());
        assert!(resolution.resolved.is_empty());
    }
}
