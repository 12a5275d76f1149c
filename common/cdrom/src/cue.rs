//! CUE sheet parsing

#[cfg(test)]
mod tests;

use crate::cdtime::CdTime;
use crate::{CdRomError, CdRomResult};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Data,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    Mode1,
    Mode2,
    Audio,
}

impl TrackMode {
    #[must_use]
    pub fn track_type(self) -> TrackType {
        match self {
            Self::Mode1 | Self::Mode2 => TrackType::Data,
            Self::Audio => TrackType::Audio,
        }
    }
}

impl FromStr for TrackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MODE1/2352" => Ok(Self::Mode1),
            "MODE2/2352" => Ok(Self::Mode2),
            "AUDIO" => Ok(Self::Audio),
            _ => Err(format!("unsupported CD track mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueTrack {
    pub number: u8,
    pub mode: TrackMode,
    /// Silence that is not stored in the file (PREGAP command)
    pub pregap_len: Option<CdTime>,
    /// INDEX 00, relative to the start of the file
    pub pause_start: Option<CdTime>,
    /// INDEX 01, relative to the start of the file
    pub track_start: CdTime,
}

impl CueTrack {
    /// Position in the file where this track's stored data begins.
    #[must_use]
    pub fn data_start(&self) -> CdTime {
        self.pause_start.unwrap_or(self.track_start)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueFile {
    pub file_name: String,
    pub tracks: Vec<CueTrack>,
}

enum CueLine<'a> {
    File(&'a str),
    Track { number: u8, mode: TrackMode },
    Index { number: u8, time: CdTime },
    Pregap(CdTime),
    Other,
}

static FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^FILE\s+"(.*)"\s+BINARY\s*$"#).unwrap());
static TRACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TRACK\s+(\d+)\s+(\S+)\s*$").unwrap());
static INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^INDEX\s+(\d+)\s+(\S+)\s*$").unwrap());
static PREGAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^PREGAP\s+(\S+)\s*$").unwrap());

fn classify(line: &str) -> CdRomResult<CueLine<'_>> {
    let trimmed = line.trim();
    let keyword = trimmed.split_whitespace().next().unwrap_or("");

    match keyword {
        "FILE" => {
            let captures = FILE_RE
                .captures(trimmed)
                .ok_or_else(|| CdRomError::CueInvalidFileLine(line.into()))?;
            let file_name = captures.get(1).map_or("", |m| m.as_str());
            Ok(CueLine::File(file_name))
        }
        "TRACK" => {
            let invalid = || CdRomError::CueInvalidTrackLine(line.into());
            let captures = TRACK_RE.captures(trimmed).ok_or_else(invalid)?;
            let number = captures[1].parse::<u8>().map_err(|_| invalid())?;
            let mode = captures[2].parse::<TrackMode>().map_err(|_| invalid())?;
            if !(1..=99).contains(&number) {
                return Err(invalid());
            }
            Ok(CueLine::Track { number, mode })
        }
        "INDEX" => {
            let invalid = || CdRomError::CueInvalidIndexLine(line.into());
            let captures = INDEX_RE.captures(trimmed).ok_or_else(invalid)?;
            let number = captures[1].parse::<u8>().map_err(|_| invalid())?;
            let time = captures[2].parse::<CdTime>().map_err(|_| invalid())?;
            Ok(CueLine::Index { number, time })
        }
        "PREGAP" => {
            let invalid = || CdRomError::CueInvalidPregapLine(line.into());
            let captures = PREGAP_RE.captures(trimmed).ok_or_else(invalid)?;
            let time = captures[1].parse::<CdTime>().map_err(|_| invalid())?;
            Ok(CueLine::Pregap(time))
        }
        // REM, TITLE, PERFORMER, CATALOG, FLAGS, POSTGAP etc. do not affect layout
        _ => Ok(CueLine::Other),
    }
}

#[derive(Debug, Default)]
struct PendingTrack {
    number: u8,
    mode: Option<TrackMode>,
    pregap_len: Option<CdTime>,
    pause_start: Option<CdTime>,
    track_start: Option<CdTime>,
}

#[derive(Debug, Default)]
struct CueBuilder {
    files: Vec<CueFile>,
    current_file: Option<CueFile>,
    current_track: Option<PendingTrack>,
    last_track_number: Option<u8>,
}

impl CueBuilder {
    fn accept(&mut self, line: &str) -> CdRomResult<()> {
        match classify(line)? {
            CueLine::File(file_name) => {
                self.finish_file()?;
                self.current_file =
                    Some(CueFile { file_name: file_name.into(), tracks: Vec::new() });
            }
            CueLine::Track { number, mode } => {
                self.finish_track()?;
                if self.current_file.is_none() {
                    return Err(CdRomError::CueParse(format!(
                        "TRACK {number:02} appears before any FILE line"
                    )));
                }
                self.current_track =
                    Some(PendingTrack { number, mode: Some(mode), ..PendingTrack::default() });
            }
            CueLine::Index { number, time } => {
                let track = self.pending_track_mut(line)?;
                match number {
                    0 => track.pause_start = Some(time),
                    1 => track.track_start = Some(time),
                    // Sub-indexes beyond 01 do not change the track layout
                    _ => {}
                }
            }
            CueLine::Pregap(time) => {
                self.pending_track_mut(line)?.pregap_len = Some(time);
            }
            CueLine::Other => {}
        }

        Ok(())
    }

    fn pending_track_mut(&mut self, line: &str) -> CdRomResult<&mut PendingTrack> {
        self.current_track
            .as_mut()
            .ok_or_else(|| CdRomError::CueParse(format!("Line outside of any TRACK: {line}")))
    }

    fn finish_track(&mut self) -> CdRomResult<()> {
        let Some(pending) = self.current_track.take() else { return Ok(()) };

        let expected = self.last_track_number.map_or(1, |last| last + 1);
        if pending.number != expected {
            return Err(CdRomError::CueParse(format!(
                "Tracks out of order; expected track {expected:02}, got {:02}",
                pending.number
            )));
        }
        self.last_track_number = Some(pending.number);

        let Some(track_start) = pending.track_start else {
            return Err(CdRomError::CueParse(format!(
                "No INDEX 01 found for track {:02}",
                pending.number
            )));
        };

        if pending.pause_start.is_some_and(|pause_start| pause_start > track_start) {
            return Err(CdRomError::CueParse(format!(
                "INDEX 00 is after INDEX 01 in track {:02}",
                pending.number
            )));
        }

        let file = self
            .current_file
            .as_mut()
            .ok_or_else(|| CdRomError::CueParse("Track without FILE".into()))?;
        file.tracks.push(CueTrack {
            number: pending.number,
            mode: pending.mode.unwrap_or(TrackMode::Audio),
            pregap_len: pending.pregap_len,
            pause_start: pending.pause_start,
            track_start,
        });

        Ok(())
    }

    fn finish_file(&mut self) -> CdRomResult<()> {
        self.finish_track()?;

        let Some(file) = self.current_file.take() else { return Ok(()) };
        if file.tracks.is_empty() {
            return Err(CdRomError::CueParse(format!(
                "No tracks listed for file '{}'",
                file.file_name
            )));
        }

        self.files.push(file);
        Ok(())
    }

    fn finish(mut self) -> CdRomResult<Vec<CueFile>> {
        self.finish_file()?;

        if self.files.is_empty() {
            return Err(CdRomError::CueParse("CUE file has no tracks".into()));
        }

        Ok(self.files)
    }
}

/// Parse the contents of a CUE sheet into its FILE/TRACK structure.
///
/// # Errors
///
/// Returns an error if the sheet contains malformed FILE/TRACK/INDEX/PREGAP lines, if tracks are
/// not numbered consecutively starting from 01, or if the sheet contains no tracks.
pub fn parse(contents: &str) -> CdRomResult<Vec<CueFile>> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

    let mut builder = CueBuilder::default();
    for line in contents.lines() {
        builder.accept(line)?;
    }

    builder.finish()
}
