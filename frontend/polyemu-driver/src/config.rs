//! Host settings read from a TOML file

use cfg_if::cfg_if;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "polyemu-config.toml";

pub const DEFAULT_PATCH_NAME_FORMAT: &str = "%d/%f.%x.ips";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSettings {
    #[serde(default = "true_fn")]
    pub enable: bool,
    #[serde(default)]
    pub force_mono: bool,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self { enable: true, force_mono: false }
    }
}

fn true_fn() -> bool {
    true
}

fn default_patch_name_format() -> String {
    DEFAULT_PATCH_NAME_FORMAT.into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Per-module settings keyed by module short name
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSettings>,
    /// Naming rule for locating a binary patch next to file-based content
    #[serde(default = "default_patch_name_format")]
    pub patch_name_format: String,
    /// Refuse playlist entries that are absolute or that climb out of the playlist's directory
    #[serde(default = "true_fn")]
    pub untrusted_path_check: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            modules: BTreeMap::new(),
            patch_name_format: default_patch_name_format(),
            untrusted_path_check: true,
        }
    }
}

impl HostConfig {
    /// Read config from a TOML file. A missing or unparseable file yields the default config.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        let config_str = fs::read_to_string(path).unwrap_or_default();
        toml::from_str(&config_str).unwrap_or_else(|err| {
            log::error!("Error deserializing host config: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn module(&self, short_name: &str) -> ModuleSettings {
        self.modules.get(short_name).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn module_enabled(&self, short_name: &str) -> bool {
        self.module(short_name).enable
    }

    #[must_use]
    pub fn force_mono(&self, short_name: &str) -> bool {
        self.module(short_name).force_mono
    }

    /// Look up a boolean setting by its dotted name, e.g. `cdplay.enable` or `cdplay.forcemono`.
    ///
    /// Returns `None` for names that are not boolean settings.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        if name == "untrusted_path_check" {
            return Some(self.untrusted_path_check);
        }

        let (module, setting) = name.rsplit_once('.')?;
        match setting {
            "enable" => Some(self.module_enabled(module)),
            "forcemono" => Some(self.force_mono(module)),
            _ => None,
        }
    }

    /// Apply `patch_name_format` to a content path.
    ///
    /// `%d` is the content's directory, `%f` its file stem, `%x` its extension, `%F` its full file
    /// name, and `%%` a literal percent sign. Unknown tokens are kept as-is.
    #[must_use]
    pub fn patch_path(&self, content_path: &Path) -> PathBuf {
        let dir = content_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let lossy = |s: Option<&std::ffi::OsStr>| {
            s.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
        };

        let mut out = String::with_capacity(self.patch_name_format.len() + 32);
        let mut chars = self.patch_name_format.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }

            match chars.next() {
                Some('d') => out.push_str(&dir.to_string_lossy()),
                Some('f') => out.push_str(&lossy(content_path.file_stem())),
                Some('x') => out.push_str(&lossy(content_path.extension())),
                Some('F') => out.push_str(&lossy(content_path.file_name())),
                Some('%') => out.push('%'),
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            }
        }

        PathBuf::from(out)
    }
}

#[must_use]
pub fn default_config_path() -> PathBuf {
    cfg_if! {
        if #[cfg(target_os = "linux")] {
            default_linux_config_path()
        } else {
            CONFIG_FILENAME.into()
        }
    }
}

#[cfg(target_os = "linux")]
fn default_linux_config_path() -> PathBuf {
    let Some(base_dirs) = directories::BaseDirs::new() else {
        log::error!("Unable to determine config dir; using '{CONFIG_FILENAME}'");
        return CONFIG_FILENAME.into();
    };

    base_dirs.config_dir().join("polyemu").join(CONFIG_FILENAME)
}
