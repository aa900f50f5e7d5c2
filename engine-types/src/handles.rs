//! Opaque handles assigned by the engine module.
//!
//! Handles identify sessions, open settings keys and tunnel datastore
//! contexts across the module boundary. The host never interprets a
//! handle's value; it only passes it back to the engine. Handles are
//! process-local and must not be persisted.

use std::fmt;

macro_rules! opaque_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(usize);

        impl $name {
            /// Wrap a raw engine-assigned value.
            pub const fn from_raw(raw: usize) -> Self {
                Self(raw)
            }

            /// Get the raw value for crossing the module boundary.
            pub const fn raw(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0)
            }
        }
    };
}

opaque_handle! {
    /// Handle for a sync session opened with `open_session`.
    SessionHandle
}

opaque_handle! {
    /// Handle for an open settings key.
    KeyHandle
}

opaque_handle! {
    /// Handle for a tunnel datastore context.
    TunnelContext
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_roundtrips_raw_value() {
        let h = SessionHandle::from_raw(0xDEAD);
        assert_eq!(h.raw(), 0xDEAD);
        assert_eq!(h, SessionHandle::from_raw(0xDEAD));
    }

    #[test]
    fn handle_debug_shows_hex() {
        let h = KeyHandle::from_raw(255);
        assert_eq!(format!("{:?}", h), "KeyHandle(0xff)");
        assert_eq!(h.to_string(), "0xff");
    }

    #[test]
    fn different_handle_types_are_distinct() {
        // Compile-time property: SessionHandle and KeyHandle cannot be mixed.
        let s = SessionHandle::from_raw(1);
        let k = KeyHandle::from_raw(1);
        assert_eq!(s.raw(), k.raw());
    }
}
