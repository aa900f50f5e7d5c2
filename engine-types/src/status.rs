//! Engine status codes and the typed error surface built on them.
//!
//! The engine module reports every outcome as a 16-bit status code. `0` is
//! success, the SyncML status range (101..=599) is passed through from the
//! protocol layer verbatim, and codes from 20000 up are local to the host
//! side and never appear on the wire. The safe API surfaces non-OK codes as
//! [`EngineError`], which gives the codes the interface semantics depend on
//! a typed variant each.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A raw engine status code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status(u16);

impl Status {
    /// Operation succeeded.
    pub const OK: Status = Status(0);
    /// End of subkey or item iteration (SyncML 204).
    pub const NO_CONTENT: Status = Status(204);
    /// Access denied (SyncML 403).
    pub const FORBIDDEN: Status = Status(403);
    /// Key, value or item does not exist (SyncML 404).
    pub const NOT_FOUND: Status = Status(404);

    /// Engine configuration could not be parsed.
    pub const NO_CONFIG_PARSE: Status = Status(20001);
    /// Engine has no configuration.
    pub const NO_CONFIG: Status = Status(20002);
    /// License or session expired.
    pub const EXPIRED: Status = Status(20003);
    /// Call not allowed in the current state.
    pub const WRONG_USAGE: Status = Status(20004);
    /// Handle is invalid or already closed.
    pub const BAD_HANDLE: Status = Status(20005);
    /// Engine ran out of memory.
    pub const OUT_OF_MEMORY: Status = Status(20008);
    /// Operation not implemented by this engine.
    pub const NOT_IMPLEMENTED: Status = Status(20013);
    /// Aborted on behalf of the user.
    pub const USER_ABORT: Status = Status(20018);
    /// Operation timed out.
    pub const TIMEOUT: Status = Status(20021);
    /// Operation ended without completing.
    pub const INCOMPLETE: Status = Status(20024);
    /// Array index past the end of an array value.
    pub const OUT_OF_RANGE: Status = Status(20026);
    /// Value was stored or returned truncated.
    pub const TRUNCATED: Status = Status(20044);
    /// Supplied buffer is too small for the value.
    pub const BUFFER_TOO_SMALL: Status = Status(20045);

    /// Create a status from a raw code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the raw code.
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Whether this status means success.
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Whether this is a local code (never sent to the peer).
    pub const fn is_local(self) -> bool {
        self.0 >= 20000
    }

    /// Convert into an empty result, mapping non-OK codes to [`EngineError`].
    pub fn into_result(self) -> EngineResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(EngineError::from_status(self))
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status({})", self.0)
    }
}

/// Errors reported by an engine module.
///
/// Every variant corresponds to a [`Status`] code; the mapping is
/// bidirectional so the bridge can translate in both directions without
/// losing information. Codes without a dedicated variant surface as
/// [`EngineError::Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// End of subkey or item iteration.
    #[error("no content")]
    NoContent,
    /// Access denied.
    #[error("forbidden")]
    Forbidden,
    /// Key, value or item does not exist.
    #[error("not found")]
    NotFound,
    /// Engine configuration could not be parsed.
    #[error("config parse failed")]
    ConfigParse,
    /// Engine has no configuration.
    #[error("no config")]
    NoConfig,
    /// License or session expired.
    #[error("expired")]
    Expired,
    /// Call not allowed in the current state.
    #[error("wrong usage")]
    WrongUsage,
    /// Handle is invalid or already closed.
    #[error("bad handle")]
    BadHandle,
    /// Engine ran out of memory.
    #[error("out of memory")]
    OutOfMemory,
    /// Operation not implemented by this engine.
    #[error("not implemented")]
    NotImplemented,
    /// Aborted on behalf of the user.
    #[error("aborted by user")]
    Aborted,
    /// Operation timed out.
    #[error("operation timed out")]
    Timeout,
    /// Operation ended without completing.
    #[error("incomplete")]
    Incomplete,
    /// Array index past the end of an array value.
    #[error("index out of range")]
    OutOfRange,
    /// Value was stored or returned truncated.
    #[error("value truncated")]
    Truncated,
    /// Supplied buffer is too small for the value.
    #[error("buffer too small")]
    BufferTooSmall,
    /// Any other engine status (SyncML or local).
    #[error("engine status {0}")]
    Status(Status),
}

impl EngineError {
    /// Map a non-OK status to its typed variant.
    pub fn from_status(status: Status) -> Self {
        match status {
            Status::NO_CONTENT => Self::NoContent,
            Status::FORBIDDEN => Self::Forbidden,
            Status::NOT_FOUND => Self::NotFound,
            Status::NO_CONFIG_PARSE => Self::ConfigParse,
            Status::NO_CONFIG => Self::NoConfig,
            Status::EXPIRED => Self::Expired,
            Status::WRONG_USAGE => Self::WrongUsage,
            Status::BAD_HANDLE => Self::BadHandle,
            Status::OUT_OF_MEMORY => Self::OutOfMemory,
            Status::NOT_IMPLEMENTED => Self::NotImplemented,
            Status::USER_ABORT => Self::Aborted,
            Status::TIMEOUT => Self::Timeout,
            Status::INCOMPLETE => Self::Incomplete,
            Status::OUT_OF_RANGE => Self::OutOfRange,
            Status::TRUNCATED => Self::Truncated,
            Status::BUFFER_TOO_SMALL => Self::BufferTooSmall,
            other => Self::Status(other),
        }
    }

    /// The status code this error maps back to.
    pub fn status(&self) -> Status {
        match self {
            Self::NoContent => Status::NO_CONTENT,
            Self::Forbidden => Status::FORBIDDEN,
            Self::NotFound => Status::NOT_FOUND,
            Self::ConfigParse => Status::NO_CONFIG_PARSE,
            Self::NoConfig => Status::NO_CONFIG,
            Self::Expired => Status::EXPIRED,
            Self::WrongUsage => Status::WRONG_USAGE,
            Self::BadHandle => Status::BAD_HANDLE,
            Self::OutOfMemory => Status::OUT_OF_MEMORY,
            Self::NotImplemented => Status::NOT_IMPLEMENTED,
            Self::Aborted => Status::USER_ABORT,
            Self::Timeout => Status::TIMEOUT,
            Self::Incomplete => Status::INCOMPLETE,
            Self::OutOfRange => Status::OUT_OF_RANGE,
            Self::Truncated => Status::TRUNCATED,
            Self::BufferTooSmall => Status::BUFFER_TOO_SMALL,
            Self::Status(status) => *status,
        }
    }
}

/// Result alias used across the SDK.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_status_into_result_is_ok() {
        assert!(Status::OK.into_result().is_ok());
    }

    #[test]
    fn non_ok_status_into_result_is_err() {
        let err = Status::BAD_HANDLE.into_result().unwrap_err();
        assert_eq!(err, EngineError::BadHandle);
    }

    #[test]
    fn named_statuses_roundtrip_through_error() {
        let named = [
            Status::NO_CONTENT,
            Status::FORBIDDEN,
            Status::NOT_FOUND,
            Status::NO_CONFIG_PARSE,
            Status::NO_CONFIG,
            Status::EXPIRED,
            Status::WRONG_USAGE,
            Status::BAD_HANDLE,
            Status::OUT_OF_MEMORY,
            Status::NOT_IMPLEMENTED,
            Status::USER_ABORT,
            Status::TIMEOUT,
            Status::INCOMPLETE,
            Status::OUT_OF_RANGE,
            Status::TRUNCATED,
            Status::BUFFER_TOO_SMALL,
        ];
        for status in named {
            assert_eq!(EngineError::from_status(status).status(), status);
        }
    }

    #[test]
    fn unnamed_status_maps_to_catch_all() {
        let status = Status::new(511);
        let err = EngineError::from_status(status);
        assert_eq!(err, EngineError::Status(status));
        assert_eq!(err.status(), status);
    }

    #[test]
    fn syncml_statuses_are_not_local() {
        assert!(!Status::NO_CONTENT.is_local());
        assert!(Status::BAD_HANDLE.is_local());
    }

    #[test]
    fn error_display_is_human_readable() {
        assert_eq!(EngineError::NoContent.to_string(), "no content");
        assert_eq!(
            EngineError::Status(Status::new(417)).to_string(),
            "engine status 417"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }
}
