//! Tunnel item identification and transfer types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-part item identifier used by the tunnel interface.
///
/// The parent part is only meaningful for hierarchical datastores (folders,
/// nested calendars); flat datastores leave it empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId {
    /// Item identifier, unique within the datastore.
    pub item: String,
    /// Identifier of the containing item, if the datastore is hierarchical.
    pub parent: Option<String>,
}

impl ItemId {
    /// An item without a parent.
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            parent: None,
        }
    }

    /// An item within a parent.
    pub fn with_parent(item: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            parent: Some(parent.into()),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{}/{}", parent, self.item),
            None => write!(f, "{}", self.item),
        }
    }
}

/// Classification reported for each item during tunnel read iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ItemChange {
    /// Item changed since the last sync token.
    Changed = 1,
    /// Item exists but is unchanged.
    Unchanged = 2,
    /// Item was partially transferred in a suspended session and transfer
    /// is being resumed.
    Resumed = 3,
}

impl ItemChange {
    /// Raw code for the module boundary. `0` is reserved for end of
    /// iteration, which the safe API expresses as `None`.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a raw code.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Changed),
            2 => Some(Self::Unchanged),
            3 => Some(Self::Resumed),
            _ => None,
        }
    }
}

/// An item streamed out of the engine during tunnel read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelItem {
    /// Item identification.
    pub id: ItemId,
    /// Serialized item content.
    pub data: String,
    /// Change classification relative to the last sync token.
    pub change: ItemChange,
}
