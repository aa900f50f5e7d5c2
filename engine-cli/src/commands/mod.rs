//! CLI command implementations.

use engine_api::Engine;
use engine_types::SdkVersion;
use std::path::PathBuf;

pub mod get;
pub mod info;
pub mod set;
pub mod sync;

/// A connected engine plus the facts worth showing about it.
pub struct Connected {
    /// Safe engine wrapper (mock or bridge).
    pub engine: Engine,
    /// Module name from config, or "mock".
    pub module_name: String,
    /// Library path the module was loaded from, `None` for the mock.
    pub library: Option<PathBuf>,
    /// Version the engine reported, `None` for the mock.
    pub engine_version: Option<SdkVersion>,
}
