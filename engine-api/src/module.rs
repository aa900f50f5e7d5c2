//! The engine module contract.
//!
//! [`EngineModule`] is the complete operational surface of a SyncML engine:
//! engine configuration, sync session execution, settings key access and
//! the tunnel interface for streaming datastore items. Implementations are
//! either in-process ([`MockEngine`](crate::MockEngine)) or forward every
//! call across a dynamic-link boundary (the bridge crate).
//!
//! The trait is object-safe; hosts normally hold an `Arc<dyn EngineModule>`
//! and work through the [`Engine`](crate::Engine) wrapper.

use engine_types::{
    BufferRead, EngineError, EngineResult, ItemChange, ItemId, KeyHandle, OpenMode, SessionHandle,
    SessionStep, StepCommand, StringMode, SubkeySelector, TimeMode, TunnelContext, TunnelItem,
    ValueId, ValueType,
};
use std::io::Read;
use std::path::Path;

/// The contract between a host application and a synchronization engine.
///
/// Every operation reports failure as a typed [`EngineError`]; the raw
/// status code is always recoverable via [`EngineError::status`].
///
/// Lifecycle is owned by the implementation: constructing it connects the
/// engine, dropping it disconnects. The operations below are the running
/// engine's surface.
pub trait EngineModule: Send + Sync {
    // --- Engine configuration ---

    /// Set the global mode for string parameters.
    ///
    /// When never called, the defaults are UTF-8 with C-style line ends.
    fn set_string_mode(&self, mode: StringMode) -> EngineResult<()>;

    /// Configure the engine from XML config text in memory.
    fn init_engine_xml(&self, config: &str) -> EngineResult<()>;

    /// Configure the engine from an XML config file.
    fn init_engine_file(&self, path: &Path) -> EngineResult<()>;

    /// Configure the engine from a streaming reader delivering XML config
    /// data chunk by chunk.
    fn init_engine_reader(&self, reader: &mut dyn Read) -> EngineResult<()>;

    // --- Running a sync session ---

    /// Open a session.
    ///
    /// `selector` depends on the session type; for multi-profile clients it
    /// is the profile ID to use. `name` identifies the session where the
    /// session type makes use of it.
    fn open_session(&self, selector: u32, name: Option<&str>) -> EngineResult<SessionHandle>;

    /// Open the session-specific runtime settings key.
    ///
    /// Keys obtained this way must be closed before the session is closed.
    /// `None` is the implicit-context form used from datastore adapter
    /// callbacks, where the engine knows the current session.
    fn open_session_key(
        &self,
        session: Option<SessionHandle>,
        mode: OpenMode,
    ) -> EngineResult<KeyHandle>;

    /// Execute one step of the session.
    ///
    /// The returned [`SessionStep`] tells the host what to do next and
    /// carries progress information when the engine produced any.
    fn session_step(&self, session: SessionHandle, cmd: StepCommand) -> EngineResult<SessionStep>;

    /// Drain the assembled outgoing SyncML message into `buf`.
    ///
    /// A buffer shorter than the message yields a partial read; the
    /// returned [`BufferRead::message_size`] always reports the full size
    /// and the caller repeats the call for the next chunk.
    fn read_syncml_buffer(&self, session: SessionHandle, buf: &mut [u8])
        -> EngineResult<BufferRead>;

    /// Feed a received SyncML message to the engine.
    fn write_syncml_buffer(&self, session: SessionHandle, data: &[u8]) -> EngineResult<()>;

    /// Close a session.
    ///
    /// Whether the session is destroyed or persists for re-opening depends
    /// on the session type.
    fn close_session(&self, session: SessionHandle) -> EngineResult<()>;

    // --- Settings access ---

    /// Open a settings key by path.
    ///
    /// The path is absolute from the root when `parent` is `None`,
    /// relative to the given open key otherwise.
    fn open_key_by_path(
        &self,
        parent: Option<KeyHandle>,
        path: &str,
        mode: OpenMode,
    ) -> EngineResult<KeyHandle>;

    /// Open a subkey by ID, create one, or iterate over existing subkeys.
    ///
    /// Returns `Ok(None)` when a [`SubkeySelector::First`]/
    /// [`SubkeySelector::Next`] iteration is exhausted.
    fn open_subkey(
        &self,
        parent: KeyHandle,
        selector: SubkeySelector,
        mode: OpenMode,
    ) -> EngineResult<Option<KeyHandle>>;

    /// Delete a subkey by ID.
    fn delete_subkey(&self, parent: KeyHandle, id: i32) -> EngineResult<()>;

    /// Get the ID of an open key, locally unique within its parent and
    /// usable with [`SubkeySelector::ById`].
    fn key_id(&self, key: KeyHandle) -> EngineResult<i32>;

    /// Override text format parameters for this key.
    ///
    /// When never called, the global string mode applies.
    fn set_text_mode(&self, key: KeyHandle, mode: StringMode) -> EngineResult<()>;

    /// Set time format parameters for this key.
    fn set_time_mode(&self, key: KeyHandle, mode: TimeMode) -> EngineResult<()>;

    /// Close an open key. The handle is invalid afterwards.
    fn close_key(&self, key: KeyHandle) -> EngineResult<()>;

    /// Read a named value converted to the requested type.
    ///
    /// Some keys offer special `.XXX` name suffixes returning alternate
    /// renderings (such as a timestamp's time zone name via `.TZNAME`).
    fn get_value(&self, key: KeyHandle, name: &str, as_type: ValueType) -> EngineResult<Vec<u8>>;

    /// Get a value's ID for repeated access without name lookups.
    ///
    /// `.FLAG.XXX` pseudo-names return flag IDs which can be combined with
    /// a regular ID via [`ValueId::with_flag`] to select alternate
    /// renderings (such as the value's name when iterating).
    fn value_id(&self, key: KeyHandle, name: &str) -> EngineResult<ValueId>;

    /// Read a value by ID.
    ///
    /// `arr_index` is the 0-based element index for array values and is
    /// ignored for plain values; an index past the end fails with
    /// [`EngineError::OutOfRange`].
    fn get_value_by_id(
        &self,
        key: KeyHandle,
        id: ValueId,
        arr_index: i32,
        as_type: ValueType,
    ) -> EngineResult<Vec<u8>>;

    /// Write a named value in the given format.
    ///
    /// Payloads too small for fixed-size types fail with
    /// [`EngineError::BufferTooSmall`] and store nothing; over-long text is
    /// stored truncated and reported as [`EngineError::Truncated`].
    fn set_value(
        &self,
        key: KeyHandle,
        name: &str,
        as_type: ValueType,
        data: &[u8],
    ) -> EngineResult<()>;

    /// Write a value by ID. Same conversion rules as [`set_value`](Self::set_value).
    fn set_value_by_id(
        &self,
        key: KeyHandle,
        id: ValueId,
        arr_index: i32,
        as_type: ValueType,
        data: &[u8],
    ) -> EngineResult<()>;

    // --- Tunnel interface ---

    /// Begin reading items from the tunnel datastore context.
    ///
    /// `last_token` is the sync token returned by the previous successful
    /// write phase; `resume_token` resumes a suspended transfer. Both are
    /// empty on a first sync.
    fn start_data_read(
        &self,
        ctx: TunnelContext,
        last_token: &str,
        resume_token: &str,
    ) -> EngineResult<()>;

    /// Read the next item of the iteration, `None` when exhausted.
    ///
    /// `first` restarts the iteration from the beginning.
    fn read_next_item(&self, ctx: TunnelContext, first: bool)
        -> EngineResult<Option<TunnelItem>>;

    /// Read a specific item by ID.
    fn read_item(&self, ctx: TunnelContext, id: &ItemId) -> EngineResult<String>;

    /// End the read phase.
    fn end_data_read(&self, ctx: TunnelContext) -> EngineResult<()>;

    /// Begin writing items into the tunnel datastore context.
    fn start_data_write(&self, ctx: TunnelContext) -> EngineResult<()>;

    /// Insert a new item; returns the ID assigned to it.
    fn insert_item(&self, ctx: TunnelContext, data: &str) -> EngineResult<ItemId>;

    /// Update an existing item; returns its possibly reassigned ID.
    fn update_item(&self, ctx: TunnelContext, data: &str, id: &ItemId) -> EngineResult<ItemId>;

    /// Move an item to a new parent.
    fn move_item(&self, ctx: TunnelContext, id: &ItemId, new_parent: &str) -> EngineResult<()>;

    /// Delete an item.
    fn delete_item(&self, ctx: TunnelContext, id: &ItemId) -> EngineResult<()>;

    /// End the write phase.
    ///
    /// On success, returns the new sync token to be passed as `last_token`
    /// next time.
    fn end_data_write(&self, ctx: TunnelContext, success: bool) -> EngineResult<String>;

    // --- Tunnel interface, as-key variants ---
    //
    // Same operations with item contents exchanged field-by-field through
    // an open settings key instead of serialized text.

    /// As-key variant of [`read_next_item`](Self::read_next_item).
    fn read_next_item_as_key(
        &self,
        ctx: TunnelContext,
        item_key: KeyHandle,
        first: bool,
    ) -> EngineResult<Option<(ItemId, ItemChange)>>;

    /// As-key variant of [`read_item`](Self::read_item).
    fn read_item_as_key(
        &self,
        ctx: TunnelContext,
        id: &ItemId,
        item_key: KeyHandle,
    ) -> EngineResult<()>;

    /// As-key variant of [`insert_item`](Self::insert_item).
    fn insert_item_as_key(&self, ctx: TunnelContext, item_key: KeyHandle) -> EngineResult<ItemId>;

    /// As-key variant of [`update_item`](Self::update_item).
    fn update_item_as_key(
        &self,
        ctx: TunnelContext,
        item_key: KeyHandle,
        id: &ItemId,
    ) -> EngineResult<ItemId>;

    // --- Typed value access ---
    //
    // Convenience accessors on top of get_value/set_value. Text is
    // expected in the key's string mode (UTF-8 unless overridden); invalid
    // sequences are replaced rather than failing the read.

    /// Read a text value.
    fn get_str_value(&self, key: KeyHandle, name: &str) -> EngineResult<String> {
        let bytes = self.get_value(key, name, ValueType::Text)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write a text value.
    fn set_str_value(&self, key: KeyHandle, name: &str, value: &str) -> EngineResult<()> {
        self.set_value(key, name, ValueType::Text, value.as_bytes())
    }

    /// Read an 8-bit signed value.
    fn get_i8_value(&self, key: KeyHandle, name: &str) -> EngineResult<i8> {
        let bytes = self.get_value(key, name, ValueType::Int8)?;
        Ok(i8::from_le_bytes(int_bytes(&bytes)?))
    }

    /// Read an 8-bit unsigned value.
    fn get_u8_value(&self, key: KeyHandle, name: &str) -> EngineResult<u8> {
        let bytes = self.get_value(key, name, ValueType::Int8)?;
        Ok(u8::from_le_bytes(int_bytes(&bytes)?))
    }

    /// Write an 8-bit value.
    fn set_u8_value(&self, key: KeyHandle, name: &str, value: u8) -> EngineResult<()> {
        self.set_value(key, name, ValueType::Int8, &value.to_le_bytes())
    }

    /// Read a 16-bit signed value.
    fn get_i16_value(&self, key: KeyHandle, name: &str) -> EngineResult<i16> {
        let bytes = self.get_value(key, name, ValueType::Int16)?;
        Ok(i16::from_le_bytes(int_bytes(&bytes)?))
    }

    /// Read a 16-bit unsigned value.
    fn get_u16_value(&self, key: KeyHandle, name: &str) -> EngineResult<u16> {
        let bytes = self.get_value(key, name, ValueType::Int16)?;
        Ok(u16::from_le_bytes(int_bytes(&bytes)?))
    }

    /// Write a 16-bit value.
    fn set_u16_value(&self, key: KeyHandle, name: &str, value: u16) -> EngineResult<()> {
        self.set_value(key, name, ValueType::Int16, &value.to_le_bytes())
    }

    /// Read a 32-bit signed value.
    fn get_i32_value(&self, key: KeyHandle, name: &str) -> EngineResult<i32> {
        let bytes = self.get_value(key, name, ValueType::Int32)?;
        Ok(i32::from_le_bytes(int_bytes(&bytes)?))
    }

    /// Read a 32-bit unsigned value.
    fn get_u32_value(&self, key: KeyHandle, name: &str) -> EngineResult<u32> {
        let bytes = self.get_value(key, name, ValueType::Int32)?;
        Ok(u32::from_le_bytes(int_bytes(&bytes)?))
    }

    /// Write a 32-bit value.
    fn set_u32_value(&self, key: KeyHandle, name: &str, value: u32) -> EngineResult<()> {
        self.set_value(key, name, ValueType::Int32, &value.to_le_bytes())
    }
}

/// Check an integer value's byte size as returned by the engine.
fn int_bytes<const N: usize>(bytes: &[u8]) -> EngineResult<[u8; N]> {
    match bytes.len() {
        n if n < N => Err(EngineError::Truncated),
        n if n > N => Err(EngineError::BufferTooSmall),
        _ => {
            let mut arr = [0u8; N];
            arr.copy_from_slice(bytes);
            Ok(arr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_bytes_exact_size() {
        let arr: [u8; 4] = int_bytes(&[1, 2, 3, 4]).unwrap();
        assert_eq!(arr, [1, 2, 3, 4]);
    }

    #[test]
    fn int_bytes_short_is_truncated() {
        let err = int_bytes::<4>(&[1, 2]).unwrap_err();
        assert_eq!(err, EngineError::Truncated);
    }

    #[test]
    fn int_bytes_long_is_buffer_too_small() {
        let err = int_bytes::<2>(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, EngineError::BufferTooSmall);
    }
}
