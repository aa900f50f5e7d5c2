//! SDK version handshake type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Packed SDK version exchanged when connecting an engine module.
///
/// The host announces the SDK version it was built against; the engine
/// reports its own. Packing is `major.minor.patch.build`, one byte each,
/// so versions compare correctly as plain integers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SdkVersion(u32);

impl SdkVersion {
    /// The version of this SDK.
    pub const CURRENT: SdkVersion = SdkVersion::new(1, 0, 0, 0);

    /// Pack a version from its parts.
    pub const fn new(major: u8, minor: u8, patch: u8, build: u8) -> Self {
        Self(
            ((major as u32) << 24) | ((minor as u32) << 16) | ((patch as u32) << 8) | build as u32,
        )
    }

    /// Construct from the packed representation.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Packed representation for the module boundary.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Major version.
    pub const fn major(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Minor version.
    pub const fn minor(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Patch version.
    pub const fn patch(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Build number.
    pub const fn build(self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())?;
        if self.build() != 0 {
            write!(f, ".{}", self.build())?;
        }
        Ok(())
    }
}

impl fmt::Debug for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SdkVersion({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_packs_parts() {
        let v = SdkVersion::new(1, 9, 2, 7);
        assert_eq!(v.major(), 1);
        assert_eq!(v.minor(), 9);
        assert_eq!(v.patch(), 2);
        assert_eq!(v.build(), 7);
        assert_eq!(SdkVersion::from_raw(v.raw()), v);
    }

    #[test]
    fn versions_order_as_integers() {
        assert!(SdkVersion::new(1, 9, 0, 0) < SdkVersion::new(2, 0, 0, 0));
        assert!(SdkVersion::new(1, 2, 3, 0) < SdkVersion::new(1, 2, 4, 0));
        assert!(SdkVersion::new(1, 2, 3, 1) > SdkVersion::new(1, 2, 3, 0));
    }

    #[test]
    fn display_omits_zero_build() {
        assert_eq!(SdkVersion::new(1, 9, 2, 0).to_string(), "1.9.2");
        assert_eq!(SdkVersion::new(1, 9, 2, 7).to_string(), "1.9.2.7");
    }
}
