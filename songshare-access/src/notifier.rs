//! Notification emitter
//!
//! One `songs_copied` notification per private songbook that had entries
//! copied or repointed to an existing copy.

use crate::copy_engine::CopyResolution;
use crate::plan::{NotificationKind, NotificationSpec};
use crate::scanner::SongReference;
use uuid::Uuid;

/// User-facing message, pluralized on `count`
pub fn copied_songs_message(count: u32) -> String {
    if count == 1 {
        "A song from your private songbook has been saved to your songs because it is no longer shared with you.".to_string()
    } else {
        format!(
            "{} songs from your private songbook have been saved to your songs because they are no longer shared with you.",
            count
        )
    }
}

/// Group references by songbook and emit one notification per songbook
///
/// Only references with a resolved copy count. Songbooks are reported in the
/// order they were first seen.
pub fn build_notifications(
    user_id: Uuid,
    references: &[SongReference],
    resolution: &CopyResolution,
) -> Vec<NotificationSpec> {
    let mut counts: Vec<(Uuid, u32)> = Vec::new();

    for reference in references {
        if resolution.copy_id_for(&reference.song_id).is_none() {
            continue;
        }

        match counts.iter_mut().find(|(id, _)| *id == reference.songbook_id) {
            Some((_, count)) => *count += 1,
            None => counts.push((reference.songbook_id, 1)),
        }
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(songbook_id, count)| NotificationSpec {
            user_id,
            kind: NotificationKind::SongsCopied,
            message: copied_songs_message(count),
            songbook_id: Some(songbook_id),
            count: Some(count),
        })
        .collect()
}
