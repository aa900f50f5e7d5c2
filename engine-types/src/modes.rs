//! Text, time and debug parameter modes.
//!
//! The engine converts all text it returns according to a string mode:
//! globally set once per engine (`set_string_mode`), overridable per open
//! settings key (`set_text_mode`). When never set, the defaults are UTF-8
//! with C-style line ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Character set for text crossing the module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum Charset {
    /// 7-bit ASCII.
    Ascii = 1,
    /// Windows ANSI code page.
    Ansi = 2,
    /// ISO 8859-1 (Latin-1).
    Iso8859_1 = 3,
    /// UTF-8.
    Utf8 = 4,
    /// UTF-16, endianness per [`StringMode::big_endian`].
    Utf16 = 5,
}

impl Charset {
    /// Raw code for the module boundary.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a raw code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Ascii),
            2 => Some(Self::Ansi),
            3 => Some(Self::Iso8859_1),
            4 => Some(Self::Utf8),
            5 => Some(Self::Utf16),
            _ => None,
        }
    }
}

/// Line end convention for multi-line text values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum LineEndMode {
    /// Leave line ends untouched.
    None = 0,
    /// LF.
    Unix = 1,
    /// CR.
    Mac = 2,
    /// CRLF.
    Dos = 3,
    /// C-style line ends of the platform (almost always LF).
    CStr = 4,
}

impl LineEndMode {
    /// Raw code for the module boundary.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a raw code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Unix),
            2 => Some(Self::Mac),
            3 => Some(Self::Dos),
            4 => Some(Self::CStr),
            _ => None,
        }
    }
}

/// Combined text format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMode {
    /// Character set.
    pub charset: Charset,
    /// Line end convention.
    pub line_ends: LineEndMode,
    /// Endianness of UTF-16 text (defaults to little endian).
    pub big_endian: bool,
}

impl Default for StringMode {
    fn default() -> Self {
        Self {
            charset: Charset::Utf8,
            line_ends: LineEndMode::CStr,
            big_endian: false,
        }
    }
}

/// Rendering of timestamp values read through the settings interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum TimeMode {
    /// Platform local time.
    System = 0,
    /// UTC.
    Utc = 1,
    /// Linear time scalar (seconds since epoch).
    LinearTime = 2,
    /// Linear date scalar (days since epoch).
    LinearDate = 3,
}

impl TimeMode {
    /// Raw code for the module boundary.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a raw code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::System),
            1 => Some(Self::Utc),
            2 => Some(Self::LinearTime),
            3 => Some(Self::LinearDate),
            _ => None,
        }
    }
}

/// Debug output selection announced when connecting an engine module.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DebugFlags(u16);

impl DebugFlags {
    /// No plugin debug output.
    pub const NONE: DebugFlags = DebugFlags(0);
    /// Internal engine operation tracing.
    pub const INTERNAL: DebugFlags = DebugFlags(0x0001);
    /// Database adapter call tracing.
    pub const DB: DebugFlags = DebugFlags(0x0002);
    /// Exotic detail normally not worth the volume.
    pub const EXOTIC: DebugFlags = DebugFlags(0x0004);
    /// Everything.
    pub const ALL: DebugFlags = DebugFlags(0xFFFF);

    /// Raw bits for the module boundary.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Construct from raw bits.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Whether all bits of `other` are set.
    pub const fn contains(self, other: DebugFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DebugFlags {
    type Output = DebugFlags;

    fn bitor(self, rhs: DebugFlags) -> DebugFlags {
        DebugFlags(self.0 | rhs.0)
    }
}

impl fmt::Debug for DebugFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DebugFlags({:#06x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_string_mode_is_utf8_cstr() {
        let mode = StringMode::default();
        assert_eq!(mode.charset, Charset::Utf8);
        assert_eq!(mode.line_ends, LineEndMode::CStr);
        assert!(!mode.big_endian);
    }

    #[test]
    fn charset_roundtrips_raw_code() {
        for cs in [
            Charset::Ascii,
            Charset::Ansi,
            Charset::Iso8859_1,
            Charset::Utf8,
            Charset::Utf16,
        ] {
            assert_eq!(Charset::from_u16(cs.as_u16()), Some(cs));
        }
        assert_eq!(Charset::from_u16(99), None);
    }

    #[test]
    fn line_end_mode_roundtrips_raw_code() {
        for lem in [
            LineEndMode::None,
            LineEndMode::Unix,
            LineEndMode::Mac,
            LineEndMode::Dos,
            LineEndMode::CStr,
        ] {
            assert_eq!(LineEndMode::from_u16(lem.as_u16()), Some(lem));
        }
    }

    #[test]
    fn time_mode_roundtrips_raw_code() {
        for tm in [
            TimeMode::System,
            TimeMode::Utc,
            TimeMode::LinearTime,
            TimeMode::LinearDate,
        ] {
            assert_eq!(TimeMode::from_u16(tm.as_u16()), Some(tm));
        }
    }

    #[test]
    fn debug_flags_combine() {
        let flags = DebugFlags::INTERNAL | DebugFlags::DB;
        assert!(flags.contains(DebugFlags::INTERNAL));
        assert!(flags.contains(DebugFlags::DB));
        assert!(!flags.contains(DebugFlags::EXOTIC));
        assert!(DebugFlags::ALL.contains(flags));
    }

    #[test]
    fn debug_flags_default_is_none() {
        assert_eq!(DebugFlags::default(), DebugFlags::NONE);
        assert_eq!(DebugFlags::default().bits(), 0);
    }
}
