pub mod cdtime;
pub mod cue;
pub mod reader;
pub mod toc;

pub use reader::{CueBinDisc, Disc, open_disc};
pub use toc::{Toc, TocTrack};

use std::io;
use thiserror::Error;

// Data: 16 header bytes + 2048 data bytes + 288 error detection/correction bytes
// Audio: 588 stereo frames of signed 16-bit little-endian PCM
pub const BYTES_PER_SECTOR: u64 = 2352;

pub const AUDIO_FRAMES_PER_SECTOR: usize = 588;

#[derive(Debug, Error)]
pub enum CdRomError {
    #[error("Unable to determine parent directory of CUE file '{0}'")]
    CueParentDir(String),
    #[error("Error parsing CUE file: {0}")]
    CueParse(String),
    #[error("Invalid/unsupported FILE line in CUE file: {0}")]
    CueInvalidFileLine(String),
    #[error("Invalid/unsupported TRACK line in CUE file: {0}")]
    CueInvalidTrackLine(String),
    #[error("Invalid/unsupported INDEX line in CUE file: {0}")]
    CueInvalidIndexLine(String),
    #[error("Invalid/unsupported PREGAP line in CUE file: {0}")]
    CueInvalidPregapLine(String),
    #[error("Unable to get file metadata for file '{path}': {source}")]
    FsMetadata {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error opening CUE file '{path}': {source}")]
    CueOpen {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error opening BIN file '{path}': {source}")]
    BinOpen {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Unsupported disc image format: '{0}'")]
    UnsupportedFormat(String),
    #[error("Physical CD drives are not supported: '{0}'")]
    PhysicalDriveUnsupported(String),
    #[error("LBA {lba} is outside of the disc (leadout at {leadout})")]
    LbaOutOfRange { lba: i32, leadout: i32 },
    #[error("I/O error reading from disc: {0}")]
    DiscReadIo(#[source] io::Error),
    #[error(
        "CD-ROM error detection check failed for track {track_number} LBA {lba}; expected={expected:08X}, actual={actual:08X}"
    )]
    DiscReadInvalidChecksum { track_number: u8, lba: i32, expected: u32, actual: u32 },
}

pub type CdRomResult<T> = Result<T, CdRomError>;
