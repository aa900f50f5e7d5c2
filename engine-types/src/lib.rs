//! # engine-types
//!
//! Shared interface types for the SyncML engine module SDK.
//!
//! This crate provides the vocabulary used across all SDK crates:
//! - [`Status`], [`EngineError`], [`EngineResult`] - Status codes and the typed error surface
//! - [`SessionHandle`], [`KeyHandle`], [`TunnelContext`] - Opaque engine-assigned handles
//! - [`StringMode`], [`OpenMode`], [`ValueType`] - Text, key and value access modes
//! - [`StepCommand`], [`StepDirective`], [`ProgressInfo`] - Session step vocabulary
//! - [`ItemId`], [`TunnelItem`] - Tunnel item identification and transfer
//! - [`SdkVersion`], [`DebugFlags`] - Connection handshake parameters

#![warn(missing_docs)]
#![warn(clippy::all)]

mod handles;
mod item;
mod modes;
mod session;
mod settings;
mod status;
mod version;

pub use handles::{KeyHandle, SessionHandle, TunnelContext};
pub use item::{ItemChange, ItemId, TunnelItem};
pub use modes::{Charset, DebugFlags, LineEndMode, StringMode, TimeMode};
pub use session::{BufferRead, ProgressEvent, ProgressInfo, SessionStep, StepCommand, StepDirective};
pub use settings::{OpenMode, SubkeySelector, ValueId, ValueType};
pub use status::{EngineError, EngineResult, Status};
pub use version::SdkVersion;
