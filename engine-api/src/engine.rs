//! Safe host-side wrappers around an engine module.
//!
//! [`Engine`] shares an `Arc<dyn EngineModule>` and hands out RAII guards:
//! [`Session`] and [`SettingsKey`] close their handle on drop, so a host
//! cannot leak or re-use a closed handle. Explicit `close(self)` is
//! available where the close status matters.

use crate::module::EngineModule;
use engine_types::{
    BufferRead, EngineError, EngineResult, ItemId, KeyHandle, OpenMode, SessionHandle, SessionStep,
    StepCommand, StringMode, SubkeySelector, TimeMode, TunnelContext, ValueId, ValueType,
};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Chunk size used when draining a SyncML message.
const READ_CHUNK: usize = 16 * 1024;

/// A connected engine module with safe session and settings access.
#[derive(Clone)]
pub struct Engine {
    module: Arc<dyn EngineModule>,
}

impl Engine {
    /// Wrap an engine module.
    pub fn new(module: Arc<dyn EngineModule>) -> Self {
        Self { module }
    }

    /// Access the underlying module.
    pub fn module(&self) -> &Arc<dyn EngineModule> {
        &self.module
    }

    /// Set the global mode for string parameters.
    pub fn set_string_mode(&self, mode: StringMode) -> EngineResult<()> {
        self.module.set_string_mode(mode)
    }

    /// Configure the engine from XML config text in memory.
    pub fn init_engine_xml(&self, config: &str) -> EngineResult<()> {
        self.module.init_engine_xml(config)
    }

    /// Configure the engine from an XML config file.
    pub fn init_engine_file(&self, path: &Path) -> EngineResult<()> {
        self.module.init_engine_file(path)
    }

    /// Configure the engine from a streaming reader.
    pub fn init_engine_reader(&self, reader: &mut dyn Read) -> EngineResult<()> {
        self.module.init_engine_reader(reader)
    }

    /// Open a sync session.
    pub fn open_session(&self, selector: u32, name: Option<&str>) -> EngineResult<Session> {
        let handle = self.module.open_session(selector, name)?;
        tracing::debug!(session = %handle, "session opened");
        Ok(Session {
            module: Arc::clone(&self.module),
            handle,
            closed: false,
        })
    }

    /// Open a settings key by absolute path.
    pub fn open_key_by_path(&self, path: &str, mode: OpenMode) -> EngineResult<SettingsKey> {
        let handle = self.module.open_key_by_path(None, path, mode)?;
        Ok(SettingsKey {
            module: Arc::clone(&self.module),
            handle,
            closed: false,
        })
    }
}

/// An open sync session, closed on drop.
pub struct Session {
    module: Arc<dyn EngineModule>,
    handle: SessionHandle,
    closed: bool,
}

impl Session {
    /// The raw session handle, for passing to module-level calls.
    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    /// Execute one session step.
    pub fn step(&self, cmd: StepCommand) -> EngineResult<SessionStep> {
        self.module.session_step(self.handle, cmd)
    }

    /// Drain one chunk of the outgoing SyncML message into `buf`.
    pub fn read_buffer(&self, buf: &mut [u8]) -> EngineResult<BufferRead> {
        self.module.read_syncml_buffer(self.handle, buf)
    }

    /// Read the whole outgoing SyncML message, reassembling chunks.
    pub fn read_message(&self) -> EngineResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let info = self.module.read_syncml_buffer(self.handle, &mut chunk)?;
            out.extend_from_slice(&chunk[..info.read]);
            if out.len() >= info.message_size {
                return Ok(out);
            }
            if info.read == 0 {
                // Engine reported more data but delivered none.
                return Err(EngineError::Incomplete);
            }
        }
    }

    /// Feed a received SyncML message to the engine.
    pub fn write_message(&self, data: &[u8]) -> EngineResult<()> {
        self.module.write_syncml_buffer(self.handle, data)
    }

    /// Open the session-specific runtime settings key.
    ///
    /// The key must be dropped or closed before the session is closed.
    pub fn open_key(&self, mode: OpenMode) -> EngineResult<SettingsKey> {
        let handle = self.module.open_session_key(Some(self.handle), mode)?;
        Ok(SettingsKey {
            module: Arc::clone(&self.module),
            handle,
            closed: false,
        })
    }

    /// Close the session, reporting the close status.
    pub fn close(mut self) -> EngineResult<()> {
        self.closed = true;
        self.module.close_session(self.handle)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.module.close_session(self.handle) {
                tracing::warn!(session = %self.handle, %err, "closing session failed");
            }
        }
    }
}

/// An open settings key, closed on drop.
pub struct SettingsKey {
    module: Arc<dyn EngineModule>,
    handle: KeyHandle,
    closed: bool,
}

impl SettingsKey {
    /// The raw key handle, for passing to module-level calls (such as the
    /// tunnel as-key operations).
    pub fn handle(&self) -> KeyHandle {
        self.handle
    }

    /// Open a key by path relative to this one.
    pub fn open_path(&self, path: &str, mode: OpenMode) -> EngineResult<SettingsKey> {
        let handle = self.module.open_key_by_path(Some(self.handle), path, mode)?;
        Ok(SettingsKey {
            module: Arc::clone(&self.module),
            handle,
            closed: false,
        })
    }

    /// Open a subkey by ID, create one, or step an iteration.
    ///
    /// Returns `Ok(None)` when a `First`/`Next` iteration is exhausted;
    /// most callers want [`subkeys`](Self::subkeys) instead.
    pub fn open_subkey(
        &self,
        selector: SubkeySelector,
        mode: OpenMode,
    ) -> EngineResult<Option<SettingsKey>> {
        let handle = self.module.open_subkey(self.handle, selector, mode)?;
        Ok(handle.map(|handle| SettingsKey {
            module: Arc::clone(&self.module),
            handle,
            closed: false,
        }))
    }

    /// Iterate over all existing subkeys.
    pub fn subkeys(&self, mode: OpenMode) -> SubkeyIter<'_> {
        SubkeyIter {
            key: self,
            mode,
            first: true,
            done: false,
        }
    }

    /// Delete a subkey by ID.
    pub fn delete_subkey(&self, id: i32) -> EngineResult<()> {
        self.module.delete_subkey(self.handle, id)
    }

    /// This key's ID within its parent.
    pub fn id(&self) -> EngineResult<i32> {
        self.module.key_id(self.handle)
    }

    /// Override text format parameters for this key.
    pub fn set_text_mode(&self, mode: StringMode) -> EngineResult<()> {
        self.module.set_text_mode(self.handle, mode)
    }

    /// Set time format parameters for this key.
    pub fn set_time_mode(&self, mode: TimeMode) -> EngineResult<()> {
        self.module.set_time_mode(self.handle, mode)
    }

    /// Read a value converted to the requested type.
    pub fn get_value(&self, name: &str, as_type: ValueType) -> EngineResult<Vec<u8>> {
        self.module.get_value(self.handle, name, as_type)
    }

    /// Write a value in the given format.
    pub fn set_value(&self, name: &str, as_type: ValueType, data: &[u8]) -> EngineResult<()> {
        self.module.set_value(self.handle, name, as_type, data)
    }

    /// Get a value's ID for repeated access.
    pub fn value_id(&self, name: &str) -> EngineResult<ValueId> {
        self.module.value_id(self.handle, name)
    }

    /// Read a value by ID.
    pub fn get_value_by_id(
        &self,
        id: ValueId,
        arr_index: i32,
        as_type: ValueType,
    ) -> EngineResult<Vec<u8>> {
        self.module.get_value_by_id(self.handle, id, arr_index, as_type)
    }

    /// Write a value by ID.
    pub fn set_value_by_id(
        &self,
        id: ValueId,
        arr_index: i32,
        as_type: ValueType,
        data: &[u8],
    ) -> EngineResult<()> {
        self.module
            .set_value_by_id(self.handle, id, arr_index, as_type, data)
    }

    /// Read a text value.
    pub fn get_str(&self, name: &str) -> EngineResult<String> {
        self.module.get_str_value(self.handle, name)
    }

    /// Write a text value.
    pub fn set_str(&self, name: &str, value: &str) -> EngineResult<()> {
        self.module.set_str_value(self.handle, name, value)
    }

    /// Read a 32-bit signed value.
    pub fn get_i32(&self, name: &str) -> EngineResult<i32> {
        self.module.get_i32_value(self.handle, name)
    }

    /// Read a 32-bit unsigned value.
    pub fn get_u32(&self, name: &str) -> EngineResult<u32> {
        self.module.get_u32_value(self.handle, name)
    }

    /// Write a 32-bit value.
    pub fn set_u32(&self, name: &str, value: u32) -> EngineResult<()> {
        self.module.set_u32_value(self.handle, name, value)
    }

    /// Read a 16-bit unsigned value.
    pub fn get_u16(&self, name: &str) -> EngineResult<u16> {
        self.module.get_u16_value(self.handle, name)
    }

    /// Write a 16-bit value.
    pub fn set_u16(&self, name: &str, value: u16) -> EngineResult<()> {
        self.module.set_u16_value(self.handle, name, value)
    }

    /// Close the key, reporting the close status.
    pub fn close(mut self) -> EngineResult<()> {
        self.closed = true;
        self.module.close_key(self.handle)
    }
}

impl Drop for SettingsKey {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.module.close_key(self.handle) {
                tracing::warn!(key = %self.handle, %err, "closing key failed");
            }
        }
    }
}

/// Iterator over a key's subkeys, driving `First`/`Next` selection.
pub struct SubkeyIter<'a> {
    key: &'a SettingsKey,
    mode: OpenMode,
    first: bool,
    done: bool,
}

impl Iterator for SubkeyIter<'_> {
    type Item = EngineResult<SettingsKey>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let selector = if self.first {
            SubkeySelector::First
        } else {
            SubkeySelector::Next
        };
        self.first = false;
        match self.key.open_subkey(selector, self.mode) {
            Ok(Some(subkey)) => Some(Ok(subkey)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Convenience passthroughs for the tunnel interface on a shared module.
///
/// Tunnel contexts are handed to the host by the engine (through datastore
/// adapter callbacks), so unlike sessions and keys they are not opened or
/// closed here; this wrapper only scopes the calls.
pub struct Tunnel<'a> {
    module: &'a Arc<dyn EngineModule>,
    ctx: TunnelContext,
}

impl<'a> Tunnel<'a> {
    /// Scope tunnel calls to a context on the given engine.
    pub fn new(engine: &'a Engine, ctx: TunnelContext) -> Self {
        Self {
            module: &engine.module,
            ctx,
        }
    }

    /// The underlying tunnel context.
    pub fn context(&self) -> TunnelContext {
        self.ctx
    }

    /// Begin reading items. See [`EngineModule::start_data_read`].
    pub fn start_read(&self, last_token: &str, resume_token: &str) -> EngineResult<()> {
        self.module.start_data_read(self.ctx, last_token, resume_token)
    }

    /// Read the next item, `None` when the iteration is exhausted.
    pub fn read_next(&self, first: bool) -> EngineResult<Option<engine_types::TunnelItem>> {
        self.module.read_next_item(self.ctx, first)
    }

    /// Read a specific item by ID.
    pub fn read(&self, id: &ItemId) -> EngineResult<String> {
        self.module.read_item(self.ctx, id)
    }

    /// End the read phase.
    pub fn end_read(&self) -> EngineResult<()> {
        self.module.end_data_read(self.ctx)
    }

    /// Begin writing items.
    pub fn start_write(&self) -> EngineResult<()> {
        self.module.start_data_write(self.ctx)
    }

    /// Insert a new item; returns its assigned ID.
    pub fn insert(&self, data: &str) -> EngineResult<ItemId> {
        self.module.insert_item(self.ctx, data)
    }

    /// Update an existing item; returns its possibly reassigned ID.
    pub fn update(&self, data: &str, id: &ItemId) -> EngineResult<ItemId> {
        self.module.update_item(self.ctx, data, id)
    }

    /// Move an item to a new parent.
    pub fn move_to(&self, id: &ItemId, new_parent: &str) -> EngineResult<()> {
        self.module.move_item(self.ctx, id, new_parent)
    }

    /// Delete an item.
    pub fn delete(&self, id: &ItemId) -> EngineResult<()> {
        self.module.delete_item(self.ctx, id)
    }

    /// End the write phase; returns the new sync token on success.
    pub fn end_write(&self, success: bool) -> EngineResult<String> {
        self.module.end_data_write(self.ctx, success)
    }
}
