//! Reference rewriter
//!
//! Turns scanned references into entry repoints aimed at the resolved copies.

use crate::copy_engine::CopyResolution;
use crate::plan::EntryRepoint;
use crate::scanner::SongReference;
use tracing::warn;

/// One repoint per reference whose original has a resolved copy
///
/// References without a resolution are skipped, not errored.
pub fn build_repoints(references: &[SongReference], resolution: &CopyResolution) -> Vec<EntryRepoint> {
    references
        .iter()
        .filter_map(|reference| {
            let Some(copy_id) = resolution.copy_id_for(&reference.song_id) else {
                warn!(
                    entry_id = %reference.songbook_entry_id,
                    song_id = %reference.song_id,
                    "No copy resolved for entry, leaving it unchanged"
                );
                return None;
            };

            Some(EntryRepoint {
                entry_id: reference.songbook_entry_id,
                songbook_id: reference.songbook_id,
                from_song_id: reference.song_id,
                to_song_id: copy_id,
            })
        })
        .collect()
}
