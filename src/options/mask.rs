//! Channel mask / mute accumulation.
//!
//! `--mask`, `--mask_reverse` and `--mute` are replayed in command-line order into two
//! independent sets: the engine-level solo/silence `mask`, and a `mute` snapshot that
//! becomes a per-channel volume table.

use crate::foundation::error::{Nsf2WavError, Nsf2WavResult};

/// Channels addressable by masks today (2A03 plus every expansion chip nsf voices use).
///
/// EPSM support needs 48; widening is a matter of changing this constant, as long as it
/// stays within the 64-bit backing store.
pub const CHANNEL_CAPACITY: u32 = 32;

/// Volume-table gain for an audible channel.
pub const FULL_GAIN: u16 = 128;

/// Bounded set of channel indices `0..WIDTH`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ChannelSet<const WIDTH: u32 = CHANNEL_CAPACITY> {
    bits: u64,
}

impl<const WIDTH: u32> ChannelSet<WIDTH> {
    const WIDTH_FITS: () = assert!(WIDTH >= 1 && WIDTH <= 64, "ChannelSet width must be 1..=64");

    const FULL: u64 = if WIDTH == 64 {
        u64::MAX
    } else {
        (1u64 << WIDTH) - 1
    };

    /// The empty set.
    pub const fn empty() -> Self {
        let () = Self::WIDTH_FITS;
        Self { bits: 0 }
    }

    /// Build from raw bits; bits at or above `WIDTH` are dropped.
    pub const fn from_bits(bits: u64) -> Self {
        let () = Self::WIDTH_FITS;
        Self {
            bits: bits & Self::FULL,
        }
    }

    /// Raw bit representation (bit `i` set when channel `i` is a member).
    pub const fn bits(self) -> u64 {
        self.bits
    }

    /// Maximum channel count.
    pub const fn capacity() -> u32 {
        WIDTH
    }

    /// Add `channel`; out-of-range indices are usage errors.
    pub fn insert(&mut self, channel: u32) -> Nsf2WavResult<()> {
        if channel >= WIDTH {
            return Err(Nsf2WavError::usage(format!(
                "channel {channel} is out of range (0..{WIDTH})"
            )));
        }
        self.bits |= 1u64 << channel;
        Ok(())
    }

    /// `true` when `channel` is a member.
    pub fn contains(self, channel: u32) -> bool {
        channel < WIDTH && self.bits & (1u64 << channel) != 0
    }

    /// Flip every channel in `0..WIDTH`.
    pub fn complement(self) -> Self {
        Self {
            bits: !self.bits & Self::FULL,
        }
    }

    /// `true` when no channel is a member.
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of members.
    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Members in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        (0..WIDTH).filter(move |&c| self.contains(c))
    }
}

impl<const WIDTH: u32> FromIterator<u32> for ChannelSet<WIDTH> {
    /// Collect indices, silently dropping those outside `0..WIDTH`.
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = Self::empty();
        for c in iter {
            let _ = set.insert(c);
        }
        set
    }
}

/// One channel-selection directive, in command-line order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelDirective {
    /// `--mask N`: add channel `N` to the working mask.
    Select(u32),
    /// `--mask_reverse`: complement the whole working mask.
    Invert,
    /// `--mute`: freeze the working mask as the mute set and start a fresh mask.
    CommitMute,
}

/// Final output of mask compilation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ChannelMasks {
    /// Engine-level solo/silence mask.
    pub mask: ChannelSet,
    /// Channels whose volume-table gain is zero.
    pub mute: ChannelSet,
}

impl ChannelMasks {
    /// Per-channel gain: zero for muted channels, [`FULL_GAIN`] otherwise.
    pub fn volume_table(&self) -> [u16; CHANNEL_CAPACITY as usize] {
        let mut table = [FULL_GAIN; CHANNEL_CAPACITY as usize];
        for c in self.mute.iter() {
            table[c as usize] = 0;
        }
        table
    }
}

/// Accumulates directives into a working mask and a frozen mute set.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaskCompiler {
    working: ChannelSet,
    mute: ChannelSet,
}

impl MaskCompiler {
    /// Start with empty mask and mute sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `channel` in the working mask.
    pub fn select(&mut self, channel: u32) -> Nsf2WavResult<()> {
        self.working.insert(channel)
    }

    /// Complement the full width of the working mask.
    pub fn invert(&mut self) {
        self.working = self.working.complement();
    }

    /// Copy the working mask into the mute set and clear the working mask.
    pub fn commit_as_mute(&mut self) {
        self.mute = self.working;
        self.working = ChannelSet::empty();
    }

    /// Apply one directive.
    pub fn apply(&mut self, directive: ChannelDirective) -> Nsf2WavResult<()> {
        match directive {
            ChannelDirective::Select(c) => self.select(c)?,
            ChannelDirective::Invert => self.invert(),
            ChannelDirective::CommitMute => self.commit_as_mute(),
        }
        Ok(())
    }

    /// Current mask and mute sets.
    pub fn finish(self) -> ChannelMasks {
        ChannelMasks {
            mask: self.working,
            mute: self.mute,
        }
    }

    /// Compile an ordered directive list.
    pub fn compile(
        directives: impl IntoIterator<Item = ChannelDirective>,
    ) -> Nsf2WavResult<ChannelMasks> {
        let mut compiler = Self::new();
        for d in directives {
            compiler.apply(d)?;
        }
        Ok(compiler.finish())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/options/mask.rs"]
mod tests;
