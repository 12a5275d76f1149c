//! Table of contents as exposed to system modules and the host

use crate::cue::TrackType;

/// Q-channel control bit that marks a data track.
pub const CONTROL_DATA: u8 = 0x04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocTrack {
    pub lba: i32,
    pub control: u8,
}

impl TocTrack {
    #[must_use]
    pub fn audio(lba: i32) -> Self {
        Self { lba, control: 0x00 }
    }

    #[must_use]
    pub fn data(lba: i32) -> Self {
        Self { lba, control: CONTROL_DATA }
    }

    #[must_use]
    pub fn is_data(self) -> bool {
        self.control & CONTROL_DATA != 0
    }

    #[must_use]
    pub fn track_type(self) -> TrackType {
        if self.is_data() { TrackType::Data } else { TrackType::Audio }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toc {
    first_track: u8,
    tracks: Vec<TocTrack>,
    leadout_lba: i32,
}

impl Toc {
    /// Create a TOC whose tracks are numbered consecutively starting at `first_track`.
    ///
    /// # Panics
    ///
    /// Panics if `tracks` is empty or if the track numbers would not fit in 1..=99.
    #[must_use]
    pub fn new(first_track: u8, tracks: Vec<TocTrack>, leadout_lba: i32) -> Self {
        assert!(!tracks.is_empty(), "TOC must contain at least one track");
        assert!(
            first_track >= 1 && usize::from(first_track) + tracks.len() - 1 <= 99,
            "TOC track numbers out of range: first={first_track}, count={}",
            tracks.len()
        );

        Self { first_track, tracks, leadout_lba }
    }

    #[must_use]
    pub fn first_track(&self) -> u8 {
        self.first_track
    }

    #[must_use]
    pub fn last_track(&self) -> u8 {
        self.first_track + (self.tracks.len() - 1) as u8
    }

    #[must_use]
    pub fn leadout_lba(&self) -> i32 {
        self.leadout_lba
    }

    #[must_use]
    pub fn track(&self, number: u8) -> Option<TocTrack> {
        let idx = number.checked_sub(self.first_track)?;
        self.tracks.get(usize::from(idx)).copied()
    }

    /// Iterate over `(track number, track)` pairs from first to last.
    pub fn tracks(&self) -> impl Iterator<Item = (u8, TocTrack)> + '_ {
        (self.first_track..).zip(self.tracks.iter().copied())
    }

    #[must_use]
    pub fn has_audio_tracks(&self) -> bool {
        self.tracks.iter().any(|track| !track.is_data())
    }

    /// Number of sectors between the start of the given track and the start of the next track
    /// (or the leadout).
    #[must_use]
    pub fn track_len(&self, number: u8) -> Option<i32> {
        let start = self.track(number)?.lba;
        let end = self.track(number + 1).map_or(self.leadout_lba, |next| next.lba);
        Some(end - start)
    }
}
