//! Error types for engine-bridge.

use engine_types::{EngineError, SdkVersion};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from connecting or disconnecting an engine module.
///
/// Once connected, the forwarded operations report plain
/// [`EngineError`]s like any other engine module implementation.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The shared library could not be loaded.
    #[error("failed to load engine module {path}: {source}")]
    LoadFailed {
        /// Library path that was tried.
        path: PathBuf,
        /// Loader error.
        #[source]
        source: libloading::Error,
    },

    /// The library does not export a required entry point.
    #[error("engine module is missing symbol {symbol}: {source}")]
    SymbolMissing {
        /// The entry point name.
        symbol: &'static str,
        /// Loader error.
        #[source]
        source: libloading::Error,
    },

    /// The engine accepted the connect call but provided no call-in table.
    #[error("engine did not provide a call-in table")]
    NoCallIn,

    /// The engine's call-in table is smaller than the one this bridge was
    /// built against.
    #[error("call-in table is {size} bytes, need at least {needed}")]
    CallInTooSmall {
        /// Size reported by the engine.
        size: usize,
        /// Size this bridge requires.
        needed: usize,
    },

    /// The engine is older than the host requires.
    #[error("engine version {engine} is older than required {required}")]
    VersionTooOld {
        /// Version the engine reported.
        engine: SdkVersion,
        /// Minimum version the host accepts.
        required: SdkVersion,
    },

    /// The engine rejected the connect call.
    #[error("engine rejected connect: {0}")]
    Connect(#[source] EngineError),

    /// The engine rejected the disconnect call.
    #[error("engine rejected disconnect: {0}")]
    Disconnect(#[source] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        let err = BridgeError::VersionTooOld {
            engine: SdkVersion::new(1, 2, 0, 0),
            required: SdkVersion::new(1, 4, 0, 0),
        };
        assert_eq!(
            err.to_string(),
            "engine version 1.2.0 is older than required 1.4.0"
        );

        let err = BridgeError::CallInTooSmall {
            size: 8,
            needed: 320,
        };
        assert!(err.to_string().contains("8 bytes"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BridgeError>();
    }
}
