use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};
use crate::source::Source;

/// A user track request resolved against a source.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TrackSelection {
    /// 1-based number shown to the user.
    pub number: u32,
    /// Zero-based song index handed to the engine (playlist order already applied).
    pub song_index: u32,
    /// Index into [`Source::entries`] holding this track's metadata.
    pub entry_index: usize,
    /// Display label.
    pub label: String,
    /// Per-track play time; never set in playlist mode.
    pub time_ms: Option<i32>,
    /// Per-track fade time; never set in playlist mode.
    pub fade_ms: Option<i32>,
}

impl TrackSelection {
    /// Reject a track number below 1.
    ///
    /// Callers that know the source is not a playlist entry run this before touching the
    /// file system.
    pub fn validate_requested(requested: i32) -> Nsf2WavResult<()> {
        if requested < 1 {
            return Err(Nsf2WavError::usage("use 1-based track number"));
        }
        Ok(())
    }

    /// Resolve `requested` (1-based) against `source`.
    ///
    /// In playlist mode the entry's embedded song wins and `requested` is ignored.
    pub fn resolve(source: &Source, requested: i32) -> Nsf2WavResult<Self> {
        if let Some(entry) = &source.playlist_entry {
            if requested != 1 {
                tracing::debug!(requested, "playlist entry selects the song; ignoring --track");
            }
            return Ok(Self {
                number: entry.song + 1,
                song_index: entry.song,
                entry_index: entry.song as usize,
                label: source.title_for(entry.song),
                time_ms: None,
                fade_ms: None,
            });
        }

        Self::validate_requested(requested)?;
        let count = source.track_count();
        let position = (requested - 1) as usize;
        if position >= count {
            return Err(Nsf2WavError::usage(format!(
                "track {requested} is out of range (source has {count} tracks)"
            )));
        }

        let entry_index = source.playlist_song(position).unwrap_or(position);
        let entry = source.entries.get(entry_index).ok_or_else(|| {
            Nsf2WavError::input(format!("track {requested} has no metadata entry"))
        })?;
        let label = if entry.label.is_empty() {
            source.title_for(entry_index as u32)
        } else {
            entry.label.clone()
        };

        Ok(Self {
            number: requested as u32,
            song_index: entry_index as u32,
            entry_index,
            label,
            time_ms: entry.time_ms,
            fade_ms: entry.fade_ms,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/track.rs"]
mod tests;
