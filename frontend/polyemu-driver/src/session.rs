//! Game session lifecycle: loading, closing, and forwarding commands to the active game


use crate::config::HostConfig;
use crate::console::Console;
use crate::media::{DiscOpener, MediaKind, MediaResolver};
use crate::pipeline::{FrameSyncPipeline, HostFrontend, StepError, StepReport};
use crate::probe::ModuleProber;
use crate::registry::ModuleRegistry;
use crate::{LoadResult, fingerprint, media};
use cdrom::Disc;
use polyemu_common::{
    Fingerprint, FrameContext, Game, ModuleDescriptor, SimpleCommand, SystemModule,
};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Loading,
    Active,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No game is loaded")]
    NoActiveSession,
}

/// The single live game instance.
pub struct ActiveSession {
    module: Arc<dyn SystemModule>,
    game: Box<dyn Game>,
    name: String,
    fingerprint: Fingerprint,
    sound_rate: Option<f64>,
    rotated: bool,
    force_mono: bool,
    discs: Vec<Arc<dyn Disc>>,
}

impl ActiveSession {
    #[must_use]
    pub fn descriptor(&self) -> &ModuleDescriptor {
        self.module.descriptor()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Output sample rate requested by the most recent step, if any.
    #[must_use]
    pub fn sound_rate(&self) -> Option<f64> {
        self.sound_rate
    }

    pub(crate) fn set_sound_rate(&mut self, sound_rate: Option<f64>) {
        self.sound_rate = sound_rate;
    }

    #[must_use]
    pub fn rotated(&self) -> bool {
        self.rotated
    }

    #[must_use]
    pub fn force_mono(&self) -> bool {
        self.force_mono
    }

    /// Discs owned by this session, empty for file-based content.
    #[must_use]
    pub fn discs(&self) -> &[Arc<dyn Disc>] {
        &self.discs
    }

    pub(crate) fn game_mut(&mut self) -> &mut dyn Game {
        self.game.as_mut()
    }
}

impl Debug for ActiveSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("module", &self.descriptor().short_name)
            .field("name", &self.name)
            .field("fingerprint", &self.fingerprint)
            .field("sound_rate", &self.sound_rate)
            .field("discs", &self.discs.len())
            .finish_non_exhaustive()
    }
}

/// Default display name: the file name with its extension stripped and underscores replaced by
/// spaces.
fn default_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace('_', " "))
        .unwrap_or_default()
}

/// Owns the module registry, host settings, and at most one active game.
pub struct Session {
    registry: ModuleRegistry,
    config: HostConfig,
    opener: Box<dyn DiscOpener>,
    console: Console,
    state: SessionState,
    active: Option<ActiveSession>,
    pipeline: FrameSyncPipeline,
}

impl Session {
    #[must_use]
    pub fn new(
        registry: ModuleRegistry,
        config: HostConfig,
        opener: Box<dyn DiscOpener>,
        console: Console,
    ) -> Self {
        Self {
            registry,
            config,
            opener,
            console,
            state: SessionState::Closed,
            active: None,
            pipeline: FrameSyncPipeline::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn pipeline(&self) -> &FrameSyncPipeline {
        &self.pipeline
    }

    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    #[must_use]
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Load content from `path`, treating it as CD media or a regular file as appropriate.
    ///
    /// # Errors
    ///
    /// See [`Session::load_cd`] and [`Session::load_file`].
    pub fn load(&mut self, path: &Path, forced_module: Option<&str>) -> LoadResult<()> {
        match MediaKind::detect(path) {
            MediaKind::Cd => self.load_cd(path, forced_module),
            MediaKind::File => self.load_file(path, forced_module),
        }
    }

    /// Load a disc image, physical drive, or playlist of discs.
    ///
    /// Any active game is closed first. On failure no game is active and every disc opened
    /// during the attempt has been released.
    ///
    /// # Errors
    ///
    /// Returns an error if the forced module is unknown or cannot load CDs, if any disc cannot be
    /// opened, if no module recognizes the discs, or if the selected module fails to load them.
    pub fn load_cd(&mut self, path: &Path, forced_module: Option<&str>) -> LoadResult<()> {
        self.close();
        self.state = SessionState::Loading;

        let result = self.load_cd_inner(path, forced_module);
        self.finish_load(result)
    }

    /// Load a regular file or archive.
    ///
    /// Any active game is closed first. On failure no game is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the forced module is unknown or cannot load files, if the file cannot
    /// be opened or has an unsupported extension, if a patch file is corrupt, if no module
    /// recognizes the file, or if the selected module fails to load it.
    pub fn load_file(&mut self, path: &Path, forced_module: Option<&str>) -> LoadResult<()> {
        self.close();
        self.state = SessionState::Loading;

        let result = self.load_file_inner(path, forced_module);
        self.finish_load(result)
    }

    fn load_cd_inner(&self, path: &Path, forced_module: Option<&str>) -> LoadResult<ActiveSession> {
        let console = &self.console;
        console.println(format!("Loading {}...", path.display()));
        let _indent = console.indent();

        let prober = ModuleProber::new(&self.registry, &self.config, console);
        let forced = forced_module.map(|name| prober.forced(name, MediaKind::Cd)).transpose()?;

        let resolver = MediaResolver::new(self.opener.as_ref(), &self.config, console);
        let discs = resolver.open_cd(path)?;

        media::print_disc_layout(console, &discs);
        let fingerprint = fingerprint::disc_set_fingerprint(&discs);
        log::info!("Disc set fingerprint: {fingerprint}");

        let (module, game) = prober.select_and_load_cd(&discs, fingerprint, forced)?;

        let fallback_name = if discs.first().is_some_and(|disc| disc.is_physical()) {
            "cdrom".into()
        } else {
            default_name(path)
        };

        Ok(self.activate(module, game, fallback_name, fingerprint, discs))
    }

    fn load_file_inner(
        &self,
        path: &Path,
        forced_module: Option<&str>,
    ) -> LoadResult<ActiveSession> {
        let console = &self.console;
        console.println(format!("Loading {}...", path.display()));
        let _indent = console.indent();

        let prober = ModuleProber::new(&self.registry, &self.config, console);
        let forced = forced_module.map(|name| prober.forced(name, MediaKind::File)).transpose()?;

        let allowed_extensions = match &forced {
            Some(module) => module.descriptor().file_extensions.to_vec(),
            None => self.registry.file_extensions(),
        };

        let resolver = MediaResolver::new(self.opener.as_ref(), &self.config, console);
        let file = resolver.open_file(path, &allowed_extensions)?;

        let (module, game) = prober.select_and_load_file(&file, forced)?;

        Ok(self.activate(module, game, default_name(path), file.fingerprint, Vec::new()))
    }

    fn activate(
        &self,
        module: Arc<dyn SystemModule>,
        mut game: Box<dyn Game>,
        fallback_name: String,
        fingerprint: Fingerprint,
        discs: Vec<Arc<dyn Disc>>,
    ) -> ActiveSession {
        let descriptor = module.descriptor();
        let name = game.name().map_or(fallback_name, String::from);
        let fingerprint = game.fingerprint().unwrap_or(fingerprint);
        let force_mono = descriptor.sound_channels == 2
            && self.config.force_mono(descriptor.short_name);

        game.set_layer_enable_mask(!0);

        ActiveSession {
            rotated: game.rotated(),
            module,
            game,
            name,
            fingerprint,
            sound_rate: None,
            force_mono,
            discs,
        }
    }

    fn finish_load(&mut self, result: LoadResult<ActiveSession>) -> LoadResult<()> {
        match result {
            Ok(active) => {
                log::info!(
                    "Loaded '{}' with module '{}'",
                    active.name,
                    active.descriptor().short_name
                );
                self.pipeline.reset();
                self.active = Some(active);
                self.state = SessionState::Active;
                Ok(())
            }
            Err(err) => {
                log::error!("Load failed: {err}");
                self.state = SessionState::Closed;
                Err(err)
            }
        }
    }

    /// Close the active game, if any, releasing its discs.
    pub fn close(&mut self) {
        if let Some(mut active) = self.active.take() {
            log::info!("Closing '{}'", active.name);
            active.game.close();
        }
        self.pipeline.reset();
        self.state = SessionState::Closed;
    }

    /// Drive one emulation step of the active game.
    ///
    /// # Errors
    ///
    /// Returns an error if no game is active or if the context's sound settings are inconsistent.
    pub fn step(
        &mut self,
        ctx: &mut FrameContext,
        frontend: &mut dyn HostFrontend,
    ) -> Result<StepReport, StepError> {
        let active = self.active.as_mut().ok_or(StepError::NoActiveSession)?;
        self.pipeline.step(active, ctx, frontend)
    }

    fn active_game(&mut self) -> Result<&mut dyn Game, CommandError> {
        self.active.as_mut().map(ActiveSession::game_mut).ok_or(CommandError::NoActiveSession)
    }

    /// # Errors
    ///
    /// Returns an error if no game is active.
    pub fn simple_command(&mut self, command: SimpleCommand) -> Result<(), CommandError> {
        log::debug!("Simple command: {command:?}");
        self.active_game()?.simple_command(command);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if no game is active.
    pub fn set_input(&mut self, port: usize, device: &str, data: &[u8]) -> Result<(), CommandError> {
        self.active_game()?.set_input(port, device, data);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if no game is active.
    pub fn set_layer_enable_mask(&mut self, mask: u64) -> Result<(), CommandError> {
        self.active_game()?.set_layer_enable_mask(mask);
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("active", &self.active)
            .field("modules", &self.registry.len())
            .finish_non_exhaustive()
    }
}
