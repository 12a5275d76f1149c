//! M3U playlist expansion for multi-disc sets


use crate::extensions;
use std::path::{Component, Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

/// Maximum nesting depth of playlists within playlists.
pub const MAX_PLAYLIST_DEPTH: u32 = 99;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("Error reading playlist '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("M3U at \"{0}\" references self.")]
    SelfReference(String),
    #[error("M3U playlists nested more than {MAX_PLAYLIST_DEPTH} levels deep at \"{0}\"")]
    TooDeep(String),
    #[error("Referenced path \"{entry}\" in playlist \"{path}\" is potentially unsafe")]
    UntrustedPath { path: String, entry: String },
}

impl PlaylistError {
    /// Whether the error comes from self-referencing or runaway nested playlists.
    #[must_use]
    pub fn is_recursion(&self) -> bool {
        matches!(self, Self::SelfReference(_) | Self::TooDeep(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlaylistExpander {
    untrusted_path_check: bool,
}

impl PlaylistExpander {
    #[must_use]
    pub fn new(untrusted_path_check: bool) -> Self {
        Self { untrusted_path_check }
    }

    /// Expand a playlist into the ordered list of disc image paths it references, recursing into
    /// nested playlists.
    ///
    /// # Errors
    ///
    /// Returns an error if any playlist cannot be read, if a playlist references itself, if
    /// playlists are nested too deeply, or if an entry fails the untrusted path check.
    pub fn expand(&self, path: &Path) -> Result<Vec<PathBuf>, PlaylistError> {
        let mut discs = Vec::new();
        self.expand_into(path, 0, &mut discs)?;
        Ok(discs)
    }

    fn expand_into(
        &self,
        path: &Path,
        depth: u32,
        discs: &mut Vec<PathBuf>,
    ) -> Result<(), PlaylistError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| PlaylistError::Read { path: path.display().to_string(), source })?;
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(&contents);

        let playlist_dir = path.parent().unwrap_or(Path::new(""));
        let playlist_identity = identity(path);

        for line in contents.lines() {
            let entry = line.trim_end();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }

            if self.untrusted_path_check && !is_trusted_entry(entry) {
                return Err(PlaylistError::UntrustedPath {
                    path: path.display().to_string(),
                    entry: entry.into(),
                });
            }

            let resolved = normalize(&playlist_dir.join(entry));
            if !extensions::is_playlist(&resolved) {
                discs.push(resolved);
                continue;
            }

            if identity(&resolved) == playlist_identity {
                return Err(PlaylistError::SelfReference(path.display().to_string()));
            }

            if depth >= MAX_PLAYLIST_DEPTH {
                return Err(PlaylistError::TooDeep(resolved.display().to_string()));
            }

            log::debug!("Expanding nested playlist '{}' at depth {}", resolved.display(), depth + 1);
            self.expand_into(&resolved, depth + 1, discs)?;
        }

        Ok(())
    }
}

fn identity(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize(&absolute)
}

// Entries must stay within the playlist's directory
fn is_trusted_entry(entry: &str) -> bool {
    let path = Path::new(entry);
    path.components().all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Lexically remove `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(component);
                }
            }
            _ => normalized.push(component),
        }
    }
    normalized
}
