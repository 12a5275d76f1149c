//! Sequential audio track playback and output rate conversion

#[cfg(test)]
mod tests;

use cdrom::{AUDIO_FRAMES_PER_SECTOR, BYTES_PER_SECTOR, Disc, Toc};

pub const CD_DA_FREQUENCY: u64 = 44100;

const BYTES_PER_AUDIO_FRAME: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTrack {
    pub number: u8,
    pub start: i32,
    pub end: i32,
}

impl AudioTrack {
    fn len(self) -> i32 {
        self.end - self.start
    }
}

/// Audio tracks of the disc in TOC order, each extending to the start of the next track.
pub fn audio_tracks(toc: &Toc) -> Vec<AudioTrack> {
    toc.tracks()
        .filter(|(_, track)| !track.is_data())
        .filter_map(|(number, track)| {
            let len = toc.track_len(number)?;
            (len > 0).then_some(AudioTrack { number, start: track.lba, end: track.lba + len })
        })
        .collect()
}

/// Playback position within the audio tracks of one disc.
#[derive(Debug, Clone)]
pub struct Playback {
    tracks: Vec<AudioTrack>,
    track_idx: usize,
    lba: i32,
    sector_buffer: Box<[u8; BYTES_PER_SECTOR as usize]>,
    sector_loaded: bool,
    frame_idx: usize,
}

impl Playback {
    pub fn new(toc: &Toc) -> Self {
        let tracks = audio_tracks(toc);
        let lba = tracks.first().map_or(0, |track| track.start);

        Self {
            tracks,
            track_idx: 0,
            lba,
            sector_buffer: Box::new([0; BYTES_PER_SECTOR as usize]),
            sector_loaded: false,
            frame_idx: 0,
        }
    }

    pub fn restart(&mut self) {
        self.track_idx = 0;
        self.lba = self.tracks.first().map_or(0, |track| track.start);
        self.sector_loaded = false;
        self.frame_idx = 0;
    }

    pub fn tracks(&self) -> &[AudioTrack] {
        &self.tracks
    }

    /// The current track and the fraction of it that has been played.
    pub fn position(&self) -> Option<(usize, f64)> {
        let track = self.tracks.get(self.track_idx)?;
        let played = f64::from(self.lba - track.start)
            + self.frame_idx as f64 / AUDIO_FRAMES_PER_SECTOR as f64;
        Some((self.track_idx, played / f64::from(track.len())))
    }

    fn advance_track(&mut self) {
        self.track_idx += 1;
        self.sector_loaded = false;
        self.frame_idx = 0;
        if let Some(track) = self.tracks.get(self.track_idx) {
            log::debug!("Starting track {}", track.number);
            self.lba = track.start;
        }
    }

    /// Next stereo frame, or `None` once every track has been played. A track that fails to read
    /// is skipped.
    pub fn next_frame(&mut self, disc: &dyn Disc) -> Option<(i16, i16)> {
        while !self.sector_loaded {
            let track = self.tracks.get(self.track_idx)?;
            match disc.read_sector(self.lba, self.sector_buffer.as_mut_slice()) {
                Ok(()) => self.sector_loaded = true,
                Err(err) => {
                    log::warn!("Error reading track {} at LBA {}: {err}", track.number, self.lba);
                    self.advance_track();
                }
            }
        }

        let idx = self.frame_idx * BYTES_PER_AUDIO_FRAME;
        let sample_l = i16::from_le_bytes([self.sector_buffer[idx], self.sector_buffer[idx + 1]]);
        let sample_r =
            i16::from_le_bytes([self.sector_buffer[idx + 2], self.sector_buffer[idx + 3]]);

        self.frame_idx += 1;
        if self.frame_idx == AUDIO_FRAMES_PER_SECTOR {
            self.frame_idx = 0;
            self.lba += 1;
            self.sector_loaded = false;

            if self.tracks.get(self.track_idx).is_some_and(|track| self.lba >= track.end) {
                self.advance_track();
            }
        }

        Some((sample_l, sample_r))
    }
}

/// Converts 44.1 kHz source frames to the output rate by dropping or repeating frames.
#[derive(Debug, Clone, Default)]
pub struct RateConverter {
    output_product: u64,
}

impl RateConverter {
    /// Number of times the next source frame should be emitted at `output_rate`.
    pub fn outputs_for_next(&mut self, output_rate: u64) -> u64 {
        self.output_product += output_rate;
        let count = self.output_product / CD_DA_FREQUENCY;
        self.output_product %= CD_DA_FREQUENCY;
        count
    }

    pub fn reset(&mut self) {
        self.output_product = 0;
    }
}
