//! Configuration loading for engine-cli.
//!
//! Configuration is loaded from a TOML file (default: `engine.toml`).
//! Everything has a default, so a missing file just means "the engine
//! named `sysynclib` on the library search path, no debug output".

use anyhow::{Context, Result};
use engine_bridge::ModuleSpec;
use engine_types::{DebugFlags, SdkVersion};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration for engine-cli.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Engine module selection.
    #[serde(default)]
    pub module: ModuleConfig,
    /// Engine configuration handling.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Engine module selection.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// Engine name, resolved to the platform library filename.
    #[serde(default = "default_module_name")]
    pub name: String,
    /// Explicit library path, overriding name resolution.
    pub path: Option<PathBuf>,
    /// Debug output selection: any of "internal", "db", "exotic", "all".
    #[serde(default)]
    pub debug: Vec<String>,
    /// Oldest engine version to accept, e.g. "1.4.0".
    pub min_version: Option<String>,
}

/// Engine configuration handling.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    /// XML config file fed to the engine after connecting.
    pub config_xml: Option<PathBuf>,
}

fn default_module_name() -> String {
    "sysynclib".to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: default_module_name(),
            path: None,
            debug: Vec::new(),
            min_version: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file; a missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Build the module spec this configuration describes.
    pub fn module_spec(&self) -> Result<ModuleSpec> {
        let mut spec =
            ModuleSpec::new(&self.module.name).with_debug_flags(parse_debug(&self.module.debug)?);
        if let Some(path) = &self.module.path {
            spec = spec.with_path(path);
        }
        if let Some(version) = &self.module.min_version {
            spec = spec.with_min_engine_version(parse_version(version)?);
        }
        Ok(spec)
    }
}

/// Parse debug flag names into [`DebugFlags`].
fn parse_debug(names: &[String]) -> Result<DebugFlags> {
    let mut flags = DebugFlags::NONE;
    for name in names {
        flags = flags
            | match name.as_str() {
                "internal" => DebugFlags::INTERNAL,
                "db" => DebugFlags::DB,
                "exotic" => DebugFlags::EXOTIC,
                "all" => DebugFlags::ALL,
                other => anyhow::bail!("unknown debug flag {:?}", other),
            };
    }
    Ok(flags)
}

/// Parse a dotted version string into an [`SdkVersion`].
fn parse_version(version: &str) -> Result<SdkVersion> {
    let mut parts = version.split('.').map(|p| {
        p.parse::<u8>()
            .with_context(|| format!("invalid version {:?}", version))
    });
    let major = parts.next().transpose()?.unwrap_or(0);
    let minor = parts.next().transpose()?.unwrap_or(0);
    let patch = parts.next().transpose()?.unwrap_or(0);
    let build = parts.next().transpose()?.unwrap_or(0);
    if parts.next().is_some() {
        anyhow::bail!("invalid version {:?}: too many components", version);
    }
    Ok(SdkVersion::new(major, minor, patch, build))
}
