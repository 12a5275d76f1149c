//! The set of available system modules

use crate::console::Console;
use polyemu_common::SystemModule;
use std::cmp::Reverse;
use std::io;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn SystemModule>>,
    // Indices into `modules` in probing order
    priority_order: Vec<usize>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry containing every module built into this crate, sorted by priority.
    #[must_use]
    pub fn with_builtin_modules() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(cdplay_core::CdPlayModule));
        registry.sort_by_priority();
        registry
    }

    /// Add a module. Modules with a short name that is already registered are ignored.
    pub fn register(&mut self, module: Arc<dyn SystemModule>) {
        let short_name = module.descriptor().short_name;
        if self.find(short_name).is_some() {
            log::warn!("Module '{short_name}' is already registered; ignoring duplicate");
            return;
        }

        self.priority_order.push(self.modules.len());
        self.modules.push(module);
    }

    /// Order modules for probing by descending priority. Modules with equal priority keep their
    /// registration order.
    pub fn sort_by_priority(&mut self) {
        let modules = &self.modules;
        self.priority_order.sort_by_key(|&i| Reverse(modules[i].descriptor().priority));
    }

    #[must_use]
    pub fn find(&self, short_name: &str) -> Option<&Arc<dyn SystemModule>> {
        self.modules.iter().find(|module| module.descriptor().short_name == short_name)
    }

    /// Modules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SystemModule>> {
        self.modules.iter()
    }

    /// Modules in probing order.
    pub fn by_priority(&self) -> impl Iterator<Item = &Arc<dyn SystemModule>> {
        self.priority_order.iter().map(|&i| &self.modules[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Union of the file extensions of every module that can load files, without duplicates.
    #[must_use]
    pub fn file_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = Vec::new();
        for module in self.by_priority() {
            let descriptor = module.descriptor();
            if !descriptor.capabilities.file_load {
                continue;
            }

            for &extension in descriptor.file_extensions {
                if !extensions.contains(&extension) {
                    extensions.push(extension);
                }
            }
        }
        extensions
    }

    pub fn announce(&self, console: &Console) {
        let names: Vec<_> = self.modules.iter().map(|module| module.descriptor().short_name).collect();
        console.println(format!("Internal emulation modules: {}", names.join(" ")));
    }

    /// Write each module's short name, full name, nominal width and nominal height on separate
    /// lines, in registration order.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from the writer.
    pub fn write_modules_def<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for module in &self.modules {
            let descriptor = module.descriptor();
            writeln!(writer, "{}", descriptor.short_name)?;
            writeln!(writer, "{}", descriptor.full_name)?;
            writeln!(writer, "{}", descriptor.nominal_width)?;
            writeln!(writer, "{}", descriptor.nominal_height)?;
        }

        writer.flush()
    }
}
