//! C ABI shared with engine modules.
//!
//! An engine module is a shared library exporting two entry points:
//! [`CONNECT_ENGINE_SYMBOL`] and [`DISCONNECT_ENGINE_SYMBOL`]. Connecting
//! hands the host a [`EngineCallIn`] table of function pointers covering
//! every engine operation; all further calls go through that table.
//!
//! Conventions across the table:
//! - statuses are 16-bit codes as defined by `engine_types::Status`;
//! - strings are NUL-terminated, in the configured string mode (UTF-8
//!   unless changed);
//! - strings and item IDs produced by the engine are engine-allocated and
//!   must be returned through `dispose_obj` after use;
//! - booleans are `u8` (0/1);
//! - integers cross the boundary little-endian inside value payloads.

use std::os::raw::{c_char, c_void};

/// Raw 16-bit status code (`engine_types::Status`).
pub type RawStatus = u16;

/// Raw session handle.
pub type RawSessionH = *mut c_void;

/// Raw settings key handle.
pub type RawKeyH = *mut c_void;

/// Raw tunnel datastore context.
pub type RawTunnelCtx = usize;

/// Exported entry point establishing the connection.
///
/// The engine stores its call-in table pointer in `call_in` and its packed
/// version in `engine_version`. `prg_version` is the SDK version the host
/// was built against; `debug_flags` selects plugin debug output.
pub const CONNECT_ENGINE_SYMBOL: &[u8] = b"SySync_ConnectEngine\0";

/// Exported entry point tearing the connection down.
pub const DISCONNECT_ENGINE_SYMBOL: &[u8] = b"SySync_DisconnectEngine\0";

/// Type of the connect entry point.
pub type ConnectEngineFn = unsafe extern "C" fn(
    call_in: *mut *const EngineCallIn,
    engine_version: *mut u32,
    prg_version: u32,
    debug_flags: u16,
) -> RawStatus;

/// Type of the disconnect entry point.
pub type DisconnectEngineFn = unsafe extern "C" fn(call_in: *const EngineCallIn) -> RawStatus;

/// Config reader callback for streamed engine configuration.
///
/// The engine calls it repeatedly; the callback fills `buf` with up to
/// `buf_size` bytes and stores the delivered count in `delivered` (0 at
/// end of data). A non-OK status aborts configuration. The engine must not
/// retain the callback past the initiating call.
pub type ConfigReadFn = unsafe extern "C" fn(
    context: *mut c_void,
    buf: *mut u8,
    buf_size: usize,
    delivered: *mut usize,
) -> RawStatus;

/// Value ID returned by `get_value_id` when no ID exists for the name.
pub const VALUE_ID_UNKNOWN: i32 = -1;

/// Subkey ID sentinel: open the first existing subkey.
pub const SUBKEY_ID_FIRST: i32 = -2;

/// Subkey ID sentinel: open the next existing subkey.
pub const SUBKEY_ID_NEXT: i32 = -3;

/// Subkey ID sentinel: create a new subkey and open it.
pub const SUBKEY_ID_NEW: i32 = -4;

/// Two-part item identifier.
///
/// When produced by the engine, both strings are engine-allocated (the
/// parent may be NULL) and go back through `dispose_obj`.
#[repr(C)]
pub struct CItemId {
    /// Item identifier, unique within the datastore.
    pub item: *mut c_char,
    /// Identifier of the containing item, NULL for flat datastores.
    pub parent: *mut c_char,
}

impl CItemId {
    /// An ID with both parts NULL, for the engine to fill.
    pub const fn null() -> Self {
        Self {
            item: std::ptr::null_mut(),
            parent: std::ptr::null_mut(),
        }
    }
}

/// Progress block filled by `session_step`.
///
/// An all-zero block means the step produced no progress information.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CProgressInfo {
    /// Progress event code (`engine_types::ProgressEvent`).
    pub event: u16,
    /// Datastore/target the event refers to, 0 for session-global events.
    pub target_id: i32,
    /// Event-specific detail.
    pub extra1: i32,
    /// Event-specific detail.
    pub extra2: i32,
    /// Event-specific detail.
    pub extra3: i32,
}

impl CProgressInfo {
    /// An all-zero block.
    pub const fn zeroed() -> Self {
        Self {
            event: 0,
            target_id: 0,
            extra1: 0,
            extra2: 0,
            extra3: 0,
        }
    }

    /// Whether the block carries no information.
    pub fn is_empty(&self) -> bool {
        *self == Self::zeroed()
    }
}

/// The call-in table: every engine operation as a C function pointer.
///
/// `size` is the table's byte size as built by the engine; the bridge
/// rejects tables smaller than the one it was compiled against, so an
/// older engine binary cannot be called past the end of its table.
#[repr(C)]
pub struct EngineCallIn {
    /// Byte size of the table, ABI guard.
    pub size: usize,

    // --- Engine configuration ---
    /// Set the global string mode.
    pub set_string_mode:
        unsafe extern "C" fn(charset: u16, line_end_mode: u16, big_endian: u8) -> RawStatus,
    /// Configure from XML text in memory.
    pub init_engine_xml: unsafe extern "C" fn(config: *const c_char) -> RawStatus,
    /// Configure from an XML file path.
    pub init_engine_file: unsafe extern "C" fn(path: *const c_char) -> RawStatus,
    /// Configure from a reader callback.
    pub init_engine_cb:
        unsafe extern "C" fn(reader: ConfigReadFn, context: *mut c_void) -> RawStatus,

    // --- Running a sync session ---
    /// Open a session.
    pub open_session: unsafe extern "C" fn(
        session: *mut RawSessionH,
        selector: u32,
        name: *const c_char,
    ) -> RawStatus,
    /// Open the session-specific settings key. A NULL session is the
    /// implicit-context form.
    pub open_session_key:
        unsafe extern "C" fn(session: RawSessionH, key: *mut RawKeyH, mode: u16) -> RawStatus,
    /// Execute one step; `step_cmd` carries the command in and the
    /// directive out.
    pub session_step: unsafe extern "C" fn(
        session: RawSessionH,
        step_cmd: *mut u16,
        progress: *mut CProgressInfo,
    ) -> RawStatus,
    /// Zero-copy access to the SyncML message buffer (full for send,
    /// empty for receive).
    pub get_syncml_buffer: unsafe extern "C" fn(
        session: RawSessionH,
        for_send: u8,
        buf: *mut *mut u8,
        buf_size: *mut usize,
    ) -> RawStatus,
    /// Return a buffer obtained with `get_syncml_buffer`, reporting how
    /// many bytes were consumed or produced.
    pub ret_syncml_buffer:
        unsafe extern "C" fn(session: RawSessionH, for_send: u8, processed: usize) -> RawStatus,
    /// Copy the next chunk of the outgoing message into `buf`. `read` is
    /// the chunk size, `msg_size` the whole message size. Returns
    /// truncated status while more chunks follow.
    ///
    /// Received messages travel the other way through the zero-copy pair:
    /// acquire the empty receive buffer with `get_syncml_buffer`, fill it,
    /// return it with `ret_syncml_buffer`.
    pub read_syncml_buffer: unsafe extern "C" fn(
        session: RawSessionH,
        buf: *mut u8,
        buf_size: usize,
        read: *mut usize,
        msg_size: *mut usize,
    ) -> RawStatus,
    /// Close a session.
    pub close_session: unsafe extern "C" fn(session: RawSessionH) -> RawStatus,

    // --- Settings access ---
    /// Open a key by path, absolute from root when `parent` is NULL.
    pub open_key_by_path: unsafe extern "C" fn(
        key: *mut RawKeyH,
        parent: RawKeyH,
        path: *const c_char,
        mode: u16,
    ) -> RawStatus,
    /// Open a subkey by ID or one of the `SUBKEY_ID_*` sentinels.
    pub open_subkey: unsafe extern "C" fn(
        key: *mut RawKeyH,
        parent: RawKeyH,
        id: i32,
        mode: u16,
    ) -> RawStatus,
    /// Delete a subkey by ID.
    pub delete_subkey: unsafe extern "C" fn(parent: RawKeyH, id: i32) -> RawStatus,
    /// Get the ID of an open key.
    pub get_key_id: unsafe extern "C" fn(key: RawKeyH, id: *mut i32) -> RawStatus,
    /// Override text format parameters for a key.
    pub set_text_mode: unsafe extern "C" fn(
        key: RawKeyH,
        charset: u16,
        line_end_mode: u16,
        big_endian: u8,
    ) -> RawStatus,
    /// Set time format parameters for a key.
    pub set_time_mode: unsafe extern "C" fn(key: RawKeyH, time_mode: u16) -> RawStatus,
    /// Close a key.
    pub close_key: unsafe extern "C" fn(key: RawKeyH) -> RawStatus,
    /// Read a named value. With `buf_size` 0 only `val_size` is reported.
    pub get_value: unsafe extern "C" fn(
        key: RawKeyH,
        name: *const c_char,
        val_type: u16,
        buf: *mut u8,
        buf_size: usize,
        val_size: *mut usize,
    ) -> RawStatus,
    /// Read a value by ID and array index.
    pub get_value_by_id: unsafe extern "C" fn(
        key: RawKeyH,
        id: i32,
        arr_index: i32,
        val_type: u16,
        buf: *mut u8,
        buf_size: usize,
        val_size: *mut usize,
    ) -> RawStatus,
    /// Get a value's ID, [`VALUE_ID_UNKNOWN`] when the name has none.
    pub get_value_id: unsafe extern "C" fn(key: RawKeyH, name: *const c_char) -> i32,
    /// Write a named value.
    pub set_value: unsafe extern "C" fn(
        key: RawKeyH,
        name: *const c_char,
        val_type: u16,
        buf: *const u8,
        val_size: usize,
    ) -> RawStatus,
    /// Write a value by ID and array index.
    pub set_value_by_id: unsafe extern "C" fn(
        key: RawKeyH,
        id: i32,
        arr_index: i32,
        val_type: u16,
        buf: *const u8,
        val_size: usize,
    ) -> RawStatus,

    // --- Tunnel interface ---
    /// Begin the read phase.
    pub start_data_read: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        last_token: *const c_char,
        resume_token: *const c_char,
    ) -> RawStatus,
    /// Read the next item. `change` 0 signals end of iteration.
    pub read_next_item: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        id: *mut CItemId,
        data: *mut *mut c_char,
        change: *mut u16,
        first: u8,
    ) -> RawStatus,
    /// Read a specific item.
    pub read_item: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        id: *const CItemId,
        data: *mut *mut c_char,
    ) -> RawStatus,
    /// End the read phase.
    pub end_data_read: unsafe extern "C" fn(ctx: RawTunnelCtx) -> RawStatus,
    /// Begin the write phase.
    pub start_data_write: unsafe extern "C" fn(ctx: RawTunnelCtx) -> RawStatus,
    /// Insert an item; the engine fills `id`.
    pub insert_item: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        data: *const c_char,
        id: *mut CItemId,
    ) -> RawStatus,
    /// Update an item; the engine fills `upd_id` with the possibly
    /// reassigned ID.
    pub update_item: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        data: *const c_char,
        id: *const CItemId,
        upd_id: *mut CItemId,
    ) -> RawStatus,
    /// Move an item to a new parent.
    pub move_item: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        id: *const CItemId,
        new_parent: *const c_char,
    ) -> RawStatus,
    /// Delete an item.
    pub delete_item:
        unsafe extern "C" fn(ctx: RawTunnelCtx, id: *const CItemId) -> RawStatus,
    /// End the write phase; on success the engine fills `new_token`.
    pub end_data_write: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        success: u8,
        new_token: *mut *mut c_char,
    ) -> RawStatus,
    /// Return engine-allocated memory.
    pub dispose_obj: unsafe extern "C" fn(ctx: RawTunnelCtx, memory: *mut c_void),

    // --- Tunnel interface, as-key variants ---
    /// As-key variant of `read_next_item`.
    pub read_next_item_as_key: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        id: *mut CItemId,
        item_key: RawKeyH,
        change: *mut u16,
        first: u8,
    ) -> RawStatus,
    /// As-key variant of `read_item`.
    pub read_item_as_key: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        id: *const CItemId,
        item_key: RawKeyH,
    ) -> RawStatus,
    /// As-key variant of `insert_item`.
    pub insert_item_as_key: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        item_key: RawKeyH,
        id: *mut CItemId,
    ) -> RawStatus,
    /// As-key variant of `update_item`.
    pub update_item_as_key: unsafe extern "C" fn(
        ctx: RawTunnelCtx,
        item_key: RawKeyH,
        id: *const CItemId,
        upd_id: *mut CItemId,
    ) -> RawStatus,
}
