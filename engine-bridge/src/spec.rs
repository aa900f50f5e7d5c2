//! Naming and selecting an engine module to connect.

use engine_types::{DebugFlags, SdkVersion};
use std::path::PathBuf;

/// How a host names the engine module it wants to connect.
///
/// A bare engine name resolves to the platform shared-library filename
/// (`lib<name>.so`, `<name>.dll` or `lib<name>.dylib`), looked up through
/// the platform's usual library search path. An explicit path overrides
/// the resolution.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    /// Engine name, used for filename resolution and logging.
    pub name: String,
    /// Explicit library path, overriding name resolution.
    pub path: Option<PathBuf>,
    /// SDK version the host announces to the engine.
    pub sdk_version: SdkVersion,
    /// Plugin debug output selection.
    pub debug_flags: DebugFlags,
    /// Oldest engine version the host accepts.
    pub min_engine_version: SdkVersion,
}

impl ModuleSpec {
    /// Spec for an engine by name, with current SDK version, no debug
    /// output and no minimum engine version.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            sdk_version: SdkVersion::CURRENT,
            debug_flags: DebugFlags::NONE,
            min_engine_version: SdkVersion::from_raw(0),
        }
    }

    /// Use an explicit library path instead of name resolution.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Select plugin debug output.
    pub fn with_debug_flags(mut self, flags: DebugFlags) -> Self {
        self.debug_flags = flags;
        self
    }

    /// Reject engines older than the given version.
    pub fn with_min_engine_version(mut self, version: SdkVersion) -> Self {
        self.min_engine_version = version;
        self
    }

    /// The library path this spec resolves to.
    pub fn library_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => PathBuf::from(platform_library_name(&self.name)),
        }
    }
}

/// Platform shared-library filename for an engine name.
pub fn platform_library_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.dll", name)
    } else if cfg!(target_os = "macos") {
        format!("lib{}.dylib", name)
    } else {
        format!("lib{}.so", name)
    }
}
