pub mod archive;
pub mod config;
pub mod console;
pub mod extensions;
pub mod fingerprint;
pub mod media;
pub mod patch;
pub mod pipeline;
pub mod playlist;
pub mod probe;
pub mod registry;
pub mod session;

#[cfg(test)]
mod testutil;

pub use config::HostConfig;
pub use console::Console;
pub use media::{DiscOpener, ImageDiscOpener, MediaKind};
pub use pipeline::{ContractViolation, FrameSyncPipeline, HostFrontend, StepError, StepReport};
pub use registry::ModuleRegistry;
pub use session::{ActiveSession, CommandError, Session, SessionState};

use crate::archive::ArchiveError;
use crate::patch::PatchError;
use crate::playlist::PlaylistError;
use cdrom::CdRomError;
use polyemu_common::ModuleError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaOpenError {
    #[error("{0}")]
    Disc(#[from] CdRomError),
    #[error("{0}")]
    Archive(#[from] ArchiveError),
    #[error("{0}")]
    Playlist(#[from] PlaylistError),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("File extension '{0}' is not supported")]
    UnsupportedExtension(String),
    #[error("Playlist does not reference any discs")]
    EmptyPlaylist,
}

/// Reasons a load can fail. The `Display` output is the message shown to the user.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Error opening '{path}': {source}")]
    MediaOpen {
        path: String,
        #[source]
        source: MediaOpenError,
    },
    #[error("Unrecognized file format.  Sorry.")]
    UnrecognizedFormat,
    #[error("Unrecognized system \"{0}\"!")]
    UnrecognizedSystem(String),
    #[error("Module \"{module}\" doesn't support {kind}")]
    UnsupportedCapability { module: String, kind: MediaKind },
    #[error("Error applying patch '{path}': {source}")]
    PatchCorrupt {
        path: String,
        #[source]
        source: PatchError,
    },
    #[error("{0}")]
    RecursivePlaylist(#[source] PlaylistError),
    #[error("Module \"{module}\" failed to load the content: {source}")]
    LoadRejected {
        module: String,
        #[source]
        source: ModuleError,
    },
}

impl LoadError {
    pub(crate) fn media_open(path: &std::path::Path, source: impl Into<MediaOpenError>) -> Self {
        Self::MediaOpen { path: path.display().to_string(), source: source.into() }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
