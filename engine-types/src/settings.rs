//! Settings key access vocabulary.
//!
//! Settings keys form a registry-like hierarchy: keys contain typed named
//! values and subkeys. Subkeys carry an ID that is locally unique within
//! their parent and can be used to re-open them or to iterate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Open mode for a settings key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u16)]
pub enum OpenMode {
    /// Values can be read but not written.
    ReadOnly = 0,
    /// Values can be read and written.
    #[default]
    ReadWrite = 1,
}

impl OpenMode {
    /// Raw code for the module boundary.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a raw code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::ReadOnly),
            1 => Some(Self::ReadWrite),
            _ => None,
        }
    }
}

/// Conversion type requested from or supplied to the engine for a value.
///
/// The engine converts between its internal representation and the
/// requested type where a conversion exists. Integers cross the module
/// boundary little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ValueType {
    /// Whatever the value's native type is.
    Unknown = 0,
    /// 8-bit integer.
    Int8 = 1,
    /// 16-bit integer.
    Int16 = 2,
    /// 32-bit integer.
    Int32 = 3,
    /// 64-bit integer.
    Int64 = 4,
    /// Text in the key's string mode.
    Text = 10,
    /// Timestamp in the key's time mode.
    Time = 20,
    /// Raw bytes.
    Buffer = 30,
}

impl ValueType {
    /// Raw code for the module boundary.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a raw code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Int8),
            2 => Some(Self::Int16),
            3 => Some(Self::Int32),
            4 => Some(Self::Int64),
            10 => Some(Self::Text),
            20 => Some(Self::Time),
            30 => Some(Self::Buffer),
            _ => None,
        }
    }

    /// Fixed byte size of the type, `None` for variable-size types.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Int8 => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 => Some(4),
            Self::Int64 | Self::Time => Some(8),
            Self::Unknown | Self::Text | Self::Buffer => None,
        }
    }
}

/// Selects which subkey to open within a parent key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubkeySelector {
    /// Re-open the subkey with the given ID.
    ById(i32),
    /// Start iterating: open the first existing subkey.
    First,
    /// Continue iterating: open the next existing subkey.
    Next,
    /// Create a new subkey and open it.
    New,
}

/// Identifier of a value within an open key, for repeated access without
/// name lookups.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueId(i32);

impl ValueId {
    /// Wrap a raw value ID.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw value ID for the module boundary.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Combine with a flag ID obtained from a `.FLAG.` lookup, selecting
    /// an alternate rendering of the value (such as its name).
    pub const fn with_flag(self, flag: ValueId) -> ValueId {
        ValueId(self.0 + flag.0)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_mode_defaults_to_read_write() {
        assert_eq!(OpenMode::default(), OpenMode::ReadWrite);
    }

    #[test]
    fn value_type_roundtrips_raw_code() {
        for vt in [
            ValueType::Unknown,
            ValueType::Int8,
            ValueType::Int16,
            ValueType::Int32,
            ValueType::Int64,
            ValueType::Text,
            ValueType::Time,
            ValueType::Buffer,
        ] {
            assert_eq!(ValueType::from_u16(vt.as_u16()), Some(vt));
        }
        assert_eq!(ValueType::from_u16(7), None);
    }

    #[test]
    fn fixed_sizes() {
        assert_eq!(ValueType::Int8.fixed_size(), Some(1));
        assert_eq!(ValueType::Int32.fixed_size(), Some(4));
        assert_eq!(ValueType::Time.fixed_size(), Some(8));
        assert_eq!(ValueType::Text.fixed_size(), None);
        assert_eq!(ValueType::Buffer.fixed_size(), None);
    }

    #[test]
    fn value_id_flag_combination() {
        let id = ValueId::from_raw(3);
        let flag = ValueId::from_raw(0x1000);
        assert_eq!(id.with_flag(flag).raw(), 0x1003);
    }
}
