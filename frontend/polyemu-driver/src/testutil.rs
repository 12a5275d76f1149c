//! Fakes shared by the driver's unit tests

use crate::config::HostConfig;
use crate::console::Console;
use crate::media::DiscOpener;
use crate::pipeline::HostFrontend;
use crate::registry::ModuleRegistry;
use crate::session::Session;
use cdrom::{CdRomError, CdRomResult, Disc, Toc, TocTrack};
use polyemu_common::{
    Capabilities, FieldParity, Fingerprint, FrameContext, Game, GameFile, GameType, MidSync,
    ModuleDescriptor, ModuleError, ModuleResult, Rect, SimpleCommand, SystemModule,
};
use std::cell::RefCell;
use std::ops::Range;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn capturing_console() -> (Console, Rc<RefCell<Vec<String>>>) {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink_lines = Rc::clone(&lines);
    let console = Console::with_sink(move |line| sink_lines.borrow_mut().push(line.into()));
    (console, lines)
}

#[derive(Debug)]
pub struct FakeDisc {
    toc: Toc,
    handles: Arc<AtomicUsize>,
}

impl Disc for FakeDisc {
    fn toc(&self) -> &Toc {
        &self.toc
    }

    fn read_sector(&self, lba: i32, out: &mut [u8]) -> CdRomResult<()> {
        if lba < 0 || lba >= self.toc.leadout_lba() {
            return Err(CdRomError::LbaOutOfRange { lba, leadout: self.toc.leadout_lba() });
        }
        out.fill(0);
        Ok(())
    }
}

impl Drop for FakeDisc {
    fn drop(&mut self) {
        self.handles.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Hands out [`FakeDisc`]s without touching the filesystem and counts how many are alive.
///
/// File names containing "broken" fail to open. File names containing "data" get a single data
/// track; everything else gets an audio track at LBA 0 and a data track at LBA 10000.
#[derive(Debug, Clone, Default)]
pub struct CountingDiscOpener {
    opened: Arc<AtomicUsize>,
    handles: Arc<AtomicUsize>,
}

impl CountingDiscOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened_total(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn open_handles(&self) -> usize {
        self.handles.load(Ordering::SeqCst)
    }
}

impl DiscOpener for CountingDiscOpener {
    fn open(&self, path: &Path) -> CdRomResult<Arc<dyn Disc>> {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        if name.contains("broken") {
            return Err(CdRomError::UnsupportedFormat(path.display().to_string()));
        }

        let toc = if name.contains("data") {
            Toc::new(1, vec![TocTrack::data(0)], 5000)
        } else {
            Toc::new(1, vec![TocTrack::audio(0), TocTrack::data(10000)], 20000)
        };

        self.opened.fetch_add(1, Ordering::SeqCst);
        self.handles.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeDisc { toc, handles: Arc::clone(&self.handles) }))
    }
}

/// What a [`FakeGame`] produces on every step. Shared with the module so tests can change it
/// between steps.
#[derive(Debug, Clone)]
pub struct Script {
    pub width: u32,
    pub height: u32,
    pub interlaced: bool,
    pub audio_frames: usize,
    pub mid_sync_at: Option<usize>,
    pub cycles: u64,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            interlaced: false,
            audio_frames: 0,
            mid_sync_at: None,
            cycles: 1000,
        }
    }
}

pub type Events = Arc<Mutex<Vec<String>>>;

pub struct FakeModule {
    descriptor: ModuleDescriptor,
    accepts_magic: bool,
    rejects_load: bool,
    game_name: Option<&'static str>,
    game_fingerprint: Option<Fingerprint>,
    events: Events,
    script: Arc<Mutex<Script>>,
}

impl FakeModule {
    fn new(short_name: &'static str, priority: i32, capabilities: Capabilities) -> Self {
        let full_name: &'static str = Box::leak(format!("Fake {short_name}").into_boxed_str());
        Self {
            descriptor: ModuleDescriptor {
                short_name,
                full_name,
                priority,
                game_type: GameType::Game,
                capabilities,
                sound_channels: 2,
                nominal_width: 320,
                nominal_height: 240,
                file_extensions: &[],
            },
            accepts_magic: true,
            rejects_load: false,
            game_name: None,
            game_fingerprint: None,
            events: Events::default(),
            script: Arc::default(),
        }
    }

    pub fn file(
        short_name: &'static str,
        priority: i32,
        extensions: &'static [&'static str],
    ) -> Self {
        let mut module =
            Self::new(short_name, priority, Capabilities { file_load: true, cd_load: false });
        module.descriptor.file_extensions = extensions;
        module
    }

    pub fn cd(short_name: &'static str, priority: i32) -> Self {
        Self::new(short_name, priority, Capabilities { file_load: false, cd_load: true })
    }

    pub fn rejecting_magic(mut self) -> Self {
        self.accepts_magic = false;
        self
    }

    pub fn rejecting_load(mut self) -> Self {
        self.rejects_load = true;
        self
    }

    pub fn player(mut self) -> Self {
        self.descriptor.game_type = GameType::Player;
        self
    }

    pub fn with_game_name(mut self, name: &'static str) -> Self {
        self.game_name = Some(name);
        self
    }

    pub fn with_game_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.game_fingerprint = Some(fingerprint);
        self
    }

    pub fn events(&self) -> Events {
        Arc::clone(&self.events)
    }

    pub fn script(&self) -> Arc<Mutex<Script>> {
        Arc::clone(&self.script)
    }

    fn log(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn game(&self, discs: Vec<Arc<dyn Disc>>) -> ModuleResult<Box<dyn Game>> {
        if self.rejects_load {
            self.log(format!("{} rejected", self.descriptor.short_name));
            return Err(ModuleError::InvalidContent("fake rejection".into()));
        }

        self.log(format!("{} load", self.descriptor.short_name));
        Ok(Box::new(FakeGame {
            short_name: self.descriptor.short_name,
            name: self.game_name,
            fingerprint: self.game_fingerprint,
            events: Arc::clone(&self.events),
            script: Arc::clone(&self.script),
            _discs: discs,
            steps: 0,
            next_parity: FieldParity::Even,
        }))
    }
}

impl SystemModule for FakeModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn test_magic_file(&self, _file: &GameFile) -> bool {
        self.log(format!("{} magic", self.descriptor.short_name));
        self.accepts_magic
    }

    fn test_magic_cd(&self, _discs: &[Arc<dyn Disc>], _fingerprint: Fingerprint) -> bool {
        self.log(format!("{} magic", self.descriptor.short_name));
        self.accepts_magic
    }

    fn load_file(&self, _file: &GameFile) -> ModuleResult<Box<dyn Game>> {
        self.game(Vec::new())
    }

    fn load_cd(
        &self,
        discs: &[Arc<dyn Disc>],
        _fingerprint: Fingerprint,
    ) -> ModuleResult<Box<dyn Game>> {
        self.game(discs.to_vec())
    }
}

/// Fills row `y` of each step's output with `100 * step + y` and pushes one frame per sample
/// with channel `c` set to `100 * (c + 1)`.
pub struct FakeGame {
    short_name: &'static str,
    name: Option<&'static str>,
    fingerprint: Option<Fingerprint>,
    events: Events,
    script: Arc<Mutex<Script>>,
    _discs: Vec<Arc<dyn Disc>>,
    steps: u32,
    next_parity: FieldParity,
}

impl FakeGame {
    fn log(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Game for FakeGame {
    fn emulate(&mut self, ctx: &mut FrameContext, mid_sync: &mut dyn MidSync) {
        let script = self.script.lock().unwrap().clone();
        self.log(format!("{} emulate", self.short_name));

        let width = script.width.min(ctx.surface.width());
        ctx.display_rect = Rect::new(0, 0, width, script.height);
        for y in 0..script.height.min(ctx.surface.height()) {
            ctx.surface.row_mut(y).fill(100 * self.steps + y);
        }

        if script.interlaced {
            ctx.interlace = Some(self.next_parity);
            self.next_parity = self.next_parity.opposite();
        }

        let frame: Vec<i16> = (0..ctx.sound.channels()).map(|c| 100 * (c as i16 + 1)).collect();
        for i in 0..script.audio_frames {
            if script.mid_sync_at == Some(i) {
                ctx.master_cycles = script.cycles / 2;
                mid_sync.mid_sync(ctx);
            }
            ctx.sound.push_frame(&frame);
        }

        ctx.master_cycles = script.cycles;
        self.steps += 1;
    }

    fn close(&mut self) {
        self.log(format!("{} close", self.short_name));
    }

    fn name(&self) -> Option<&str> {
        self.name
    }

    fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }

    fn simple_command(&mut self, command: SimpleCommand) {
        self.log(format!("{} {command:?}", self.short_name));
    }

    fn set_input(&mut self, port: usize, device: &str, data: &[u8]) {
        self.log(format!("{} input {port} {device} {data:?}", self.short_name));
    }

    fn set_layer_enable_mask(&mut self, mask: u64) {
        self.log(format!("{} mask {mask:x}", self.short_name));
    }
}

#[derive(Debug, Default)]
pub struct RecordingFrontend {
    pub messages: Vec<String>,
    pub resample_buffer_sizes: Vec<usize>,
    pub mid_syncs: Vec<Range<usize>>,
    pub mid_sync_samples: Vec<i16>,
}

impl HostFrontend for RecordingFrontend {
    fn display_message(&mut self, message: &str) {
        self.messages.push(message.into());
    }

    fn resize_resample_buffer(&mut self, frames: usize) {
        self.resample_buffer_sizes.push(frames);
    }

    fn mid_sync(&mut self, ctx: &FrameContext, new_frames: Range<usize>) {
        self.mid_sync_samples.extend_from_slice(ctx.sound.frames(new_frames.clone()));
        self.mid_syncs.push(new_frames);
    }
}

/// A session over `modules` (sorted by priority) that opens discs through `opener`.
pub fn session_with(
    modules: Vec<FakeModule>,
    config: HostConfig,
    opener: &CountingDiscOpener,
) -> (Session, Rc<RefCell<Vec<String>>>) {
    let mut registry = ModuleRegistry::new();
    for module in modules {
        registry.register(Arc::new(module));
    }
    registry.sort_by_priority();

    let (console, lines) = capturing_console();
    (Session::new(registry, config, Box::new(opener.clone()), console), lines)
}

pub fn events(events: &Events) -> Vec<String> {
    events.lock().unwrap().clone()
}
