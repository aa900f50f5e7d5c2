//! # engine-api
//!
//! Engine module contract and safe host-side wrappers for the SyncML
//! engine SDK.
//!
//! The central piece is the [`EngineModule`] trait: the complete
//! operational surface of a synchronization engine, whether it runs
//! in-process or behind a dynamic-link boundary. On top of it:
//!
//! - [`Engine`], [`Session`], [`SettingsKey`] - RAII wrappers that make
//!   handle lifetimes safe for hosts
//! - [`Tunnel`] - scoped access to the tunnel item-transfer interface
//! - [`MockEngine`] - full in-memory implementation for testing hosts
//!   without a native engine module
//!
//! ## Example
//!
//! ```
//! use syncml_engine_api::{Engine, MockEngine};
//! use engine_types::OpenMode;
//! use std::sync::Arc;
//!
//! let engine = Engine::new(Arc::new(MockEngine::new()));
//! let key = engine.open_key_by_path("/profiles/default", OpenMode::ReadWrite)?;
//! key.set_str("server", "https://sync.example.org")?;
//! assert_eq!(key.get_str("server")?, "https://sync.example.org");
//! # Ok::<(), engine_types::EngineError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod engine;
mod mock;
mod module;

pub use engine::{Engine, Session, SettingsKey, SubkeyIter, Tunnel};
pub use mock::MockEngine;
pub use module::EngineModule;
