//! # engine-bridge
//!
//! Dynamic-library bridge for the SyncML engine SDK.
//!
//! A synchronization engine ships as a separately built native module.
//! This crate loads such a module, resolves its two exported entry points,
//! and forwards the whole [`EngineModule`](engine_api::EngineModule)
//! contract through the engine's call-in table. No synchronization logic
//! lives here; the crate's value is the stability of the call surface.
//!
//! ## Example
//!
//! ```no_run
//! use syncml_engine_bridge::{EngineBridge, ModuleSpec};
//! use engine_types::DebugFlags;
//!
//! let spec = ModuleSpec::new("sysynclib").with_debug_flags(DebugFlags::DB);
//! let bridge = EngineBridge::connect(&spec)?;
//! println!("engine {}", bridge.engine_version());
//! bridge.disconnect()?;
//! # Ok::<(), syncml_engine_bridge::BridgeError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bridge;
mod error;
pub mod ffi;
mod spec;

pub use bridge::EngineBridge;
pub use error::BridgeError;
pub use spec::{platform_library_name, ModuleSpec};
