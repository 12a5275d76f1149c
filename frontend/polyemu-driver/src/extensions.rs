use std::ffi::OsStr;
use std::path::Path;

pub const PLAYLIST: &str = "m3u";
pub const CUE_SHEET: &str = "cue";
pub const TABLE_OF_CONTENTS: &str = "toc";

/// Extensions that always mean CD media regardless of the registered modules.
pub const DISC_DESCRIPTIONS: &[&str] = &[PLAYLIST, CUE_SHEET, TABLE_OF_CONTENTS];

pub const SUPPORTED_ARCHIVES: &[&str] = &["zip", "7z"];

/// Lowercase extension of a path, without the leading dot.
#[must_use]
pub fn from_path<P: AsRef<Path>>(path: P) -> Option<String> {
    fn inner(path: &Path) -> Option<String> {
        path.extension().map(OsStr::to_ascii_lowercase).and_then(|s| s.to_str().map(String::from))
    }

    inner(path.as_ref())
}

#[must_use]
pub fn is_playlist<P: AsRef<Path>>(path: P) -> bool {
    from_path(path).is_some_and(|extension| extension == PLAYLIST)
}

#[must_use]
pub fn is_disc_description<P: AsRef<Path>>(path: P) -> bool {
    from_path(path).is_some_and(|extension| DISC_DESCRIPTIONS.contains(&extension.as_str()))
}

#[must_use]
pub fn is_archive(extension: &str) -> bool {
    SUPPORTED_ARCHIVES.contains(&extension)
}
