//! Disc handles
//!
//! A [`Disc`] is an opened CD image that can report its table of contents and read raw 2352-byte
//! sectors by LBA. Implementations must be safe to read from multiple threads.

mod cuebin;

pub use cuebin::CueBinDisc;

use crate::toc::Toc;
use crate::{CdRomError, CdRomResult};
use std::ffi::OsStr;
use std::fmt::Debug;
use std::fs;
use std::path::Path;

pub trait Disc: Debug + Send + Sync {
    fn toc(&self) -> &Toc;

    /// Whether this disc is backed by a physical drive rather than an image file.
    fn is_physical(&self) -> bool {
        false
    }

    /// Read the 2352-byte sector at the given LBA into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the LBA is outside of the disc, if reading from the underlying file
    /// fails, or if a data sector fails its error detection check.
    ///
    /// # Panics
    ///
    /// Implementations may panic if `out` is shorter than 2352 bytes.
    fn read_sector(&self, lba: i32, out: &mut [u8]) -> CdRomResult<()>;
}

/// Open a disc image by path.
///
/// CUE sheets are the only image format supported here; other disc-description files and
/// non-regular files (raw devices) are reported as unsupported.
///
/// # Errors
///
/// Returns an error if the path cannot be inspected, if it names an unsupported image format or a
/// physical drive, or if the CUE sheet or any of its BIN files cannot be opened or parsed.
pub fn open_disc<P: AsRef<Path>>(path: P) -> CdRomResult<Box<dyn Disc>> {
    let path = path.as_ref();

    let metadata = fs::metadata(path)
        .map_err(|source| CdRomError::FsMetadata { path: path.display().to_string(), source })?;
    if !metadata.is_file() {
        return Err(CdRomError::PhysicalDriveUnsupported(path.display().to_string()));
    }

    let extension = path.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("cue") => Ok(Box::new(CueBinDisc::open(path)?)),
        _ => Err(CdRomError::UnsupportedFormat(path.display().to_string())),
    }
}
