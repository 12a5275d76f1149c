//! Selecting the module that owns a piece of media

use crate::config::HostConfig;
use crate::console::Console;
use crate::media::MediaKind;
use crate::registry::ModuleRegistry;
use crate::{LoadError, LoadResult};
use cdrom::Disc;
use polyemu_common::{Fingerprint, Game, GameFile, ModuleResult, SystemModule};
use std::sync::Arc;

pub struct ModuleProber<'a> {
    registry: &'a ModuleRegistry,
    config: &'a HostConfig,
    console: &'a Console,
}

fn supports(module: &dyn SystemModule, kind: MediaKind) -> bool {
    let capabilities = module.descriptor().capabilities;
    match kind {
        MediaKind::File => capabilities.file_load,
        MediaKind::Cd => capabilities.cd_load,
    }
}

impl<'a> ModuleProber<'a> {
    #[must_use]
    pub fn new(registry: &'a ModuleRegistry, config: &'a HostConfig, console: &'a Console) -> Self {
        Self { registry, config, console }
    }

    /// Look up a module that the user selected explicitly. The module's enable setting is not
    /// consulted.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnrecognizedSystem`] if no module has the given short name, and
    /// [`LoadError::UnsupportedCapability`] if the module cannot load this kind of media.
    pub fn forced(&self, short_name: &str, kind: MediaKind) -> LoadResult<Arc<dyn SystemModule>> {
        let module = self
            .registry
            .find(short_name)
            .ok_or_else(|| LoadError::UnrecognizedSystem(short_name.into()))?;

        if !supports(module.as_ref(), kind) {
            return Err(LoadError::UnsupportedCapability { module: short_name.into(), kind });
        }

        Ok(Arc::clone(module))
    }

    /// Modules eligible for probing `kind` media, in priority order.
    fn candidates(&self, kind: MediaKind) -> impl Iterator<Item = &'a Arc<dyn SystemModule>> {
        let config = self.config;
        self.registry.by_priority().filter(move |module| {
            let short_name = module.descriptor().short_name;
            if !config.module_enabled(short_name) {
                log::debug!("Skipping disabled module '{short_name}'");
                return false;
            }
            supports(module.as_ref(), kind)
        })
    }

    /// Select a module for a disc set, either the forced module or the first enabled module whose
    /// magic test accepts the discs, and load the discs with it.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnrecognizedFormat`] if no module accepts the discs, and
    /// [`LoadError::LoadRejected`] if the selected module fails to load them.
    pub fn select_and_load_cd(
        &self,
        discs: &[Arc<dyn Disc>],
        fingerprint: Fingerprint,
        forced: Option<Arc<dyn SystemModule>>,
    ) -> LoadResult<(Arc<dyn SystemModule>, Box<dyn Game>)> {
        let module = match forced {
            Some(module) => module,
            None => self
                .candidates(MediaKind::Cd)
                .find(|module| module.test_magic_cd(discs, fingerprint))
                .cloned()
                .ok_or(LoadError::UnrecognizedFormat)?,
        };

        self.load_with(module, |module| module.load_cd(discs, fingerprint))
    }

    /// Select a module for a file, either the forced module or the first enabled module whose
    /// magic test accepts the file, and load the file with it.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnrecognizedFormat`] if no module accepts the file, and
    /// [`LoadError::LoadRejected`] if the selected module fails to load it.
    pub fn select_and_load_file(
        &self,
        file: &GameFile,
        forced: Option<Arc<dyn SystemModule>>,
    ) -> LoadResult<(Arc<dyn SystemModule>, Box<dyn Game>)> {
        let module = match forced {
            Some(module) => module,
            None => self
                .candidates(MediaKind::File)
                .find(|module| module.test_magic_file(file))
                .cloned()
                .ok_or(LoadError::UnrecognizedFormat)?,
        };

        self.load_with(module, |module| module.load_file(file))
    }

    fn load_with(
        &self,
        module: Arc<dyn SystemModule>,
        load_fn: impl FnOnce(&dyn SystemModule) -> ModuleResult<Box<dyn Game>>,
    ) -> LoadResult<(Arc<dyn SystemModule>, Box<dyn Game>)> {
        let descriptor = module.descriptor();
        self.console
            .println(format!("Using module: {}({})", descriptor.short_name, descriptor.full_name));

        let game = load_fn(module.as_ref()).map_err(|source| LoadError::LoadRejected {
            module: descriptor.short_name.into(),
            source,
        })?;

        Ok((module, game))
    }
}
