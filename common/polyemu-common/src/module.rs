//! The interface between the host and emulated-system modules

use crate::frame::{FrameContext, MidSync};
use cdrom::{CdRomError, Disc};
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    Game,
    /// Sequential media player; state rewinding does not apply
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub file_load: bool,
    pub cd_load: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub short_name: &'static str,
    pub full_name: &'static str,
    /// Higher priorities are probed first
    pub priority: i32,
    pub game_type: GameType,
    pub capabilities: Capabilities,
    pub sound_channels: u8,
    pub nominal_width: u32,
    pub nominal_height: u32,
    /// Lowercase file extensions without the leading dot
    pub file_extensions: &'static [&'static str],
}

/// 128-bit content identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint(pub [u8; 16]);

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// File-based content after archive extraction and patching.
#[derive(Debug, Clone)]
pub struct GameFile {
    pub path: PathBuf,
    /// Lowercase extension of the content itself (the archive entry's extension for archives)
    pub extension: String,
    pub data: Vec<u8>,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleCommand {
    Power,
    Reset,
    InsertCoin,
    ToggleDipSwitch(u8),
    SelectDisk,
    InsertDisk,
    EjectDisk,
}

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Invalid or unsupported content: {0}")]
    InvalidContent(String),
    #[error("Required firmware image '{0}' is missing")]
    MissingFirmware(String),
    #[error("Error reading from disc: {0}")]
    Disc(#[from] CdRomError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("This module does not support loading this kind of media")]
    Unsupported,
    #[error("{0}")]
    Other(String),
}

pub type ModuleResult<T> = Result<T, ModuleError>;

/// One emulated system.
///
/// The magic tests are only called for the media types the descriptor's capabilities declare.
/// Load entry points may assume that the corresponding magic test accepted the media unless the
/// module was selected explicitly by the user.
pub trait SystemModule: Send + Sync {
    fn descriptor(&self) -> &ModuleDescriptor;

    fn test_magic_file(&self, _file: &GameFile) -> bool {
        false
    }

    fn test_magic_cd(&self, _discs: &[Arc<dyn Disc>], _fingerprint: Fingerprint) -> bool {
        false
    }

    /// # Errors
    ///
    /// Returns an error if the module rejects the content.
    fn load_file(&self, _file: &GameFile) -> ModuleResult<Box<dyn Game>> {
        Err(ModuleError::Unsupported)
    }

    /// # Errors
    ///
    /// Returns an error if the module rejects the disc set.
    fn load_cd(
        &self,
        _discs: &[Arc<dyn Disc>],
        _fingerprint: Fingerprint,
    ) -> ModuleResult<Box<dyn Game>> {
        Err(ModuleError::Unsupported)
    }
}

impl Debug for dyn SystemModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SystemModule").field(&self.descriptor().short_name).finish()
    }
}

/// A loaded game instance.
pub trait Game: Send {
    /// Run one step (usually one video frame).
    ///
    /// The game fills `ctx.surface` and sets `ctx.display_rect`, appends audio to `ctx.sound` up
    /// to its capacity, advances `ctx.master_cycles`, and sets `ctx.interlace` when it produced a
    /// single field. It may call `mid_sync` once to flush partial output.
    fn emulate(&mut self, ctx: &mut FrameContext, mid_sync: &mut dyn MidSync);

    /// Release module-side resources. Called exactly once before the game is dropped.
    fn close(&mut self) {}

    fn name(&self) -> Option<&str> {
        None
    }

    /// Content identity computed by the module itself, overriding the host's fingerprint.
    fn fingerprint(&self) -> Option<Fingerprint> {
        None
    }

    fn rotated(&self) -> bool {
        false
    }

    fn simple_command(&mut self, _command: SimpleCommand) {}

    fn set_input(&mut self, _port: usize, _device: &str, _data: &[u8]) {}

    fn set_layer_enable_mask(&mut self, _mask: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_hex() {
        let mut bytes = [0; 16];
        bytes[0] = 0xAB;
        bytes[15] = 0x01;
        assert_eq!(Fingerprint(bytes).to_string(), "ab000000000000000000000000000001");
    }
}
