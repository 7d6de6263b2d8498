//! Source loading: NSF / NSFe / NSF2 images and NEZ M3U playlist entries.
//!
//! A [`Source`] carries the metadata the option resolver needs (per-track times and fades,
//! labels, playlist order, playlist-mode overrides) plus the raw program image handed to
//! the synthesis engine.

use std::path::Path;

use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

/// NSF / NSFe / NSF2 parsing.
pub mod nsf;
/// NEZ Plug M3U playlist entries.
pub mod playlist;
/// Track number resolution.
pub mod track;

pub use playlist::PlaylistEntry;
pub use track::TrackSelection;

/// Container flavour the source was read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Classic 128-byte-header NSF (versions 1 and 2).
    #[default]
    Nsf,
    /// Chunked NSFe.
    Nsfe,
}

/// Per-track metadata embedded in the source.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TrackEntry {
    /// Track label; empty when the source has none.
    pub label: String,
    /// Play time in milliseconds, `None` when unset.
    pub time_ms: Option<i32>,
    /// Fade time in milliseconds, `None` when unset.
    pub fade_ms: Option<i32>,
}

/// One line of an info listing.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TrackListing {
    /// 1-based track number as shown to the user.
    pub number: u32,
    /// Display label.
    pub label: String,
}

/// A loaded chiptune source.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct Source {
    /// Container flavour.
    pub format: SourceFormat,
    /// Game / album title.
    pub title: String,
    /// Composer.
    pub artist: String,
    /// Copyright holder.
    pub copyright: String,
    /// Person who ripped the file; empty for plain NSF.
    pub ripper: String,
    /// Number of songs in the program image.
    pub total_songs: u8,
    /// Zero-based default song.
    pub start_song: u8,
    /// 6502 load address.
    pub load_addr: u16,
    /// 6502 init routine address.
    pub init_addr: u16,
    /// 6502 play routine address.
    pub play_addr: u16,
    /// NTSC/PAL region flags.
    pub region: u8,
    /// Expansion sound chip flags.
    pub expansion: u8,
    /// Initial bankswitch values; all zero when bankswitching is unused.
    pub bankswitch: [u8; 8],
    /// Per-song metadata, `total_songs` entries long.
    pub entries: Vec<TrackEntry>,
    /// Optional play order (song indices).
    pub playlist: Option<Vec<u8>>,
    /// Set when the source was loaded through a playlist entry.
    pub playlist_entry: Option<PlaylistEntry>,
    /// Program image.
    #[serde(skip)]
    pub program: Vec<u8>,
}

impl Source {
    /// Parse an in-memory NSF / NSFe image.
    pub fn parse(data: &[u8]) -> Nsf2WavResult<Self> {
        nsf::parse(data)
    }

    /// Read and parse a source file.
    pub fn open(path: &Path) -> Nsf2WavResult<Self> {
        let data = std::fs::read(path).map_err(|e| {
            Nsf2WavError::input(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::parse(&data).map_err(|e| match e {
            Nsf2WavError::Input(msg) => Nsf2WavError::input(format!("'{}': {msg}", path.display())),
            other => other,
        })
    }

    /// Load a command-line source argument: either a file path or a NEZ M3U entry.
    #[tracing::instrument]
    pub fn load(arg: &str) -> Nsf2WavResult<Self> {
        if !PlaylistEntry::is_entry(arg) {
            return Self::open(Path::new(arg));
        }
        let entry = PlaylistEntry::parse(arg)?;
        let mut source = Self::open(Path::new(&entry.path))?;
        source.apply_playlist_entry(entry)?;
        Ok(source)
    }

    /// Switch this source into playlist mode using `entry`.
    pub fn apply_playlist_entry(&mut self, entry: PlaylistEntry) -> Nsf2WavResult<()> {
        if entry.song >= u32::from(self.total_songs) {
            return Err(Nsf2WavError::input(format!(
                "playlist entry selects track {} but the source has {} songs",
                entry.song + 1,
                self.total_songs
            )));
        }
        self.playlist_entry = Some(entry);
        Ok(())
    }

    /// `true` when song selection comes from an embedded playlist entry.
    pub fn is_playlist_mode(&self) -> bool {
        self.playlist_entry.is_some()
    }

    /// Source-level play time override (playlist entry time), if any.
    pub fn time_override_ms(&self) -> Option<i32> {
        self.playlist_entry.as_ref().and_then(|e| e.time_ms)
    }

    /// Source-level fade override (playlist entry fade), if any.
    pub fn fade_override_ms(&self) -> Option<i32> {
        self.playlist_entry.as_ref().and_then(|e| e.fade_ms)
    }

    /// Number of user-selectable tracks (playlist length when present).
    pub fn track_count(&self) -> usize {
        match &self.playlist {
            Some(plst) if !plst.is_empty() => plst.len(),
            _ => usize::from(self.total_songs),
        }
    }

    /// Fallback display title for zero-based `song`.
    pub fn title_for(&self, song: u32) -> String {
        if let Some(title) = self.playlist_entry.as_ref().and_then(|e| e.title.as_ref()) {
            return title.clone();
        }
        if self.title.is_empty() {
            format!("Song {}", song + 1)
        } else {
            format!("{} #{}", self.title, song + 1)
        }
    }

    /// Tracks as shown by info mode, in playlist order when the source has one.
    pub fn listing(&self) -> Vec<TrackListing> {
        if let Some(entry) = &self.playlist_entry {
            return vec![TrackListing {
                number: entry.song + 1,
                label: self.title_for(entry.song),
            }];
        }
        (0..self.track_count())
            .map(|i| {
                let song = self.playlist_song(i).unwrap_or(i);
                let label = self
                    .entries
                    .get(song)
                    .map(|e| e.label.clone())
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| self.title_for(song as u32));
                TrackListing {
                    number: i as u32 + 1,
                    label,
                }
            })
            .collect()
    }

    /// Song index stored at playlist position `i`, if the source has a playlist.
    pub fn playlist_song(&self, i: usize) -> Option<usize> {
        self.playlist
            .as_ref()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.get(i))
            .map(|&s| usize::from(s))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/mod.rs"]
mod tests;
