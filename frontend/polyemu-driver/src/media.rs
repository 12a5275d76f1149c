//! Resolving a user-supplied path into openable media

use crate::config::HostConfig;
use crate::console::Console;
use crate::playlist::PlaylistExpander;
use crate::{LoadError, LoadResult, MediaOpenError, archive, extensions, fingerprint, patch};
use cdrom::{CdRomResult, Disc};
use polyemu_common::GameFile;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    File,
    Cd,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "files"),
            Self::Cd => write!(f, "CDs"),
        }
    }
}

impl MediaKind {
    /// CD media is anything with a disc-description extension, or anything that is not a regular
    /// file (e.g. a raw device). Everything else is a regular file.
    #[must_use]
    pub fn detect(path: &Path) -> Self {
        if extensions::is_disc_description(path) {
            return Self::Cd;
        }

        match fs::metadata(path) {
            Ok(metadata) if !metadata.is_file() => Self::Cd,
            _ => Self::File,
        }
    }
}

/// Opens disc images.
pub trait DiscOpener {
    /// # Errors
    ///
    /// Returns an error if the disc cannot be opened.
    fn open(&self, path: &Path) -> CdRomResult<Arc<dyn Disc>>;
}

/// Opens disc images through [`cdrom::open_disc`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDiscOpener;

impl DiscOpener for ImageDiscOpener {
    fn open(&self, path: &Path) -> CdRomResult<Arc<dyn Disc>> {
        cdrom::open_disc(path).map(Arc::from)
    }
}

pub struct MediaResolver<'a> {
    opener: &'a dyn DiscOpener,
    config: &'a HostConfig,
    console: &'a Console,
}

impl<'a> MediaResolver<'a> {
    #[must_use]
    pub fn new(opener: &'a dyn DiscOpener, config: &'a HostConfig, console: &'a Console) -> Self {
        Self { opener, config, console }
    }

    /// Open every disc referenced by `path`, in order. A playlist is expanded into its entries;
    /// any other path is opened as a single disc.
    ///
    /// Discs opened before a failure are released before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::RecursivePlaylist`] for self-referencing or runaway playlists and
    /// [`LoadError::MediaOpen`] if any disc or playlist cannot be opened.
    pub fn open_cd(&self, path: &Path) -> LoadResult<Vec<Arc<dyn Disc>>> {
        let disc_paths = if extensions::is_playlist(path) {
            let expander = PlaylistExpander::new(self.config.untrusted_path_check);
            let disc_paths = expander.expand(path).map_err(|err| {
                if err.is_recursion() {
                    LoadError::RecursivePlaylist(err)
                } else {
                    LoadError::media_open(path, err)
                }
            })?;
            if disc_paths.is_empty() {
                return Err(LoadError::media_open(path, MediaOpenError::EmptyPlaylist));
            }
            disc_paths
        } else {
            vec![path.to_path_buf()]
        };

        let mut discs = Vec::with_capacity(disc_paths.len());
        for disc_path in &disc_paths {
            let disc =
                self.opener.open(disc_path).map_err(|err| LoadError::media_open(disc_path, err))?;
            discs.push(disc);
        }

        Ok(discs)
    }

    /// Read a regular file (or the first supported entry of an archive) restricted to
    /// `allowed_extensions`, then apply a binary patch if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MediaOpen`] if the extension is not allowed or reading fails, and
    /// [`LoadError::PatchCorrupt`] if a patch exists but cannot be applied.
    pub fn open_file(&self, path: &Path, allowed_extensions: &[&str]) -> LoadResult<GameFile> {
        let extension = extensions::from_path(path).unwrap_or_default();

        let (extension, mut data) = if extensions::is_archive(&extension) {
            let archive_file = archive::read_first_supported(path, allowed_extensions)
                .map_err(|err| LoadError::media_open(path, err))?;
            (archive_file.extension, archive_file.data)
        } else {
            if !allowed_extensions.contains(&extension.as_str()) {
                return Err(LoadError::media_open(
                    path,
                    MediaOpenError::UnsupportedExtension(extension),
                ));
            }

            let data = fs::read(path).map_err(|err| LoadError::media_open(path, err))?;
            (extension, data)
        };

        let patch_path = self.config.patch_path(path);
        match patch::apply_if_present(&patch_path, &mut data) {
            Ok(true) => {
                self.console.println(format!("Applied patch '{}'", patch_path.display()));
            }
            Ok(false) => {}
            Err(source) => {
                return Err(LoadError::PatchCorrupt {
                    path: patch_path.display().to_string(),
                    source,
                });
            }
        }

        let fingerprint = fingerprint::file_fingerprint(&data);
        Ok(GameFile { path: path.to_path_buf(), extension, data, fingerprint })
    }
}

/// Print the track layout of each disc in the set.
pub fn print_disc_layout(console: &Console, discs: &[Arc<dyn Disc>]) {
    for (i, disc) in discs.iter().enumerate() {
        let toc = disc.toc();

        console.println(format!("CD {} Layout:", i + 1));

        let _indent = console.indent();
        for (number, track) in toc.tracks() {
            let kind = if track.is_data() { "DATA" } else { "AUDIO" };
            console.println(format!("Track {number:02}, LBA: {:6}  {kind}", track.lba));
        }
        console.println(format!("Leadout: {:6}", toc.leadout_lba()));
    }
}
