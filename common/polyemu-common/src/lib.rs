pub mod deinterlace;
pub mod frame;
pub mod module;

pub use deinterlace::Deinterlacer;
pub use frame::{FieldParity, FrameContext, MidSync, PixelFormat, Rect, SoundBuffer, Surface};
pub use module::{
    Capabilities, Fingerprint, Game, GameFile, GameType, ModuleDescriptor, ModuleError,
    ModuleResult, SimpleCommand, SystemModule,
};
