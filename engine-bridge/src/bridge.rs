//! The dynamic-link bridge.
//!
//! [`EngineBridge`] loads an engine module, resolves its entry points,
//! performs the version handshake and then implements [`EngineModule`] by
//! forwarding every operation through the engine's call-in table. The
//! bridge computes nothing itself; its value is the stability of the call
//! surface.

use crate::error::BridgeError;
use crate::ffi::{
    self, CItemId, CProgressInfo, ConnectEngineFn, DisconnectEngineFn, EngineCallIn, RawKeyH,
    RawSessionH, RawTunnelCtx,
};
use crate::spec::ModuleSpec;
use engine_api::EngineModule;
use engine_types::{
    BufferRead, EngineError, EngineResult, ItemChange, ItemId, KeyHandle, OpenMode, ProgressEvent,
    ProgressInfo, SdkVersion, SessionHandle, SessionStep, Status, StepCommand, StepDirective,
    StringMode, SubkeySelector, TimeMode, TunnelContext, TunnelItem, ValueId, ValueType,
};
use libloading::Library;
use std::ffi::{CStr, CString};
use std::io::Read;
use std::mem;
use std::os::raw::{c_char, c_void};
use std::path::Path;
use std::ptr;

/// Retries for the size-probe/fetch cycle in `get_value`, in case the
/// value grows between the two calls.
const GET_VALUE_ATTEMPTS: usize = 4;

/// A connected engine module behind a dynamic-link boundary.
///
/// Constructed with [`connect`](Self::connect); dropping it disconnects.
/// All [`EngineModule`] operations forward through the engine's call-in
/// table, marshaling parameters and results across the C ABI.
pub struct EngineBridge {
    call_in: *const EngineCallIn,
    disconnect: Option<DisconnectEngineFn>,
    engine_version: SdkVersion,
    engine_name: String,
    // Keeps the module mapped for as long as the table is in use.
    _lib: Option<Library>,
}

// SAFETY: the call-in table is an immutable function-pointer table and the
// engine module contract requires implementations to synchronize
// internally; the bridge holds no mutable state of its own.
unsafe impl Send for EngineBridge {}
unsafe impl Sync for EngineBridge {}

impl EngineBridge {
    /// Load the engine module named by `spec` and connect it.
    ///
    /// Resolves the two exported entry points, announces the host's SDK
    /// version and debug flags, and validates the engine's call-in table
    /// and version before any forwarding happens.
    pub fn connect(spec: &ModuleSpec) -> Result<Self, BridgeError> {
        let path = spec.library_path();
        tracing::debug!(engine = %spec.name, path = %path.display(), "loading engine module");
        let lib = unsafe { Library::new(&path) }.map_err(|source| BridgeError::LoadFailed {
            path: path.clone(),
            source,
        })?;

        let connect: ConnectEngineFn = unsafe {
            *lib.get::<ConnectEngineFn>(ffi::CONNECT_ENGINE_SYMBOL)
                .map_err(|source| BridgeError::SymbolMissing {
                    symbol: "SySync_ConnectEngine",
                    source,
                })?
        };
        let disconnect: DisconnectEngineFn = unsafe {
            *lib.get::<DisconnectEngineFn>(ffi::DISCONNECT_ENGINE_SYMBOL)
                .map_err(|source| BridgeError::SymbolMissing {
                    symbol: "SySync_DisconnectEngine",
                    source,
                })?
        };

        let mut call_in: *const EngineCallIn = ptr::null();
        let mut version: u32 = 0;
        let status = unsafe {
            connect(
                &mut call_in,
                &mut version,
                spec.sdk_version.raw(),
                spec.debug_flags.bits(),
            )
        };
        Status::new(status)
            .into_result()
            .map_err(BridgeError::Connect)?;
        if call_in.is_null() {
            return Err(BridgeError::NoCallIn);
        }
        let size = unsafe { (*call_in).size };
        let needed = mem::size_of::<EngineCallIn>();
        if size < needed {
            return Err(BridgeError::CallInTooSmall { size, needed });
        }
        let engine_version = SdkVersion::from_raw(version);
        check_engine_version(engine_version, spec.min_engine_version)?;
        tracing::debug!(engine = %spec.name, version = %engine_version, "engine module connected");

        Ok(Self {
            call_in,
            disconnect: Some(disconnect),
            engine_version,
            engine_name: spec.name.clone(),
            _lib: Some(lib),
        })
    }

    /// Wrap an already-connected call-in table.
    ///
    /// This is how statically linked engines are used: the host links the
    /// engine into the binary and passes its table directly, skipping the
    /// loader and the disconnect entry point.
    pub fn from_call_in(call_in: &'static EngineCallIn, engine_version: SdkVersion) -> Self {
        Self {
            call_in,
            disconnect: None,
            engine_version,
            engine_name: "static".to_string(),
            _lib: None,
        }
    }

    /// The version the engine reported at connect time.
    pub fn engine_version(&self) -> SdkVersion {
        self.engine_version
    }

    /// The engine name this bridge was connected with.
    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    /// Disconnect the engine, reporting the disconnect status.
    pub fn disconnect(mut self) -> Result<(), BridgeError> {
        self.do_disconnect()
    }

    fn do_disconnect(&mut self) -> Result<(), BridgeError> {
        if let Some(disconnect) = self.disconnect.take() {
            let status = unsafe { disconnect(self.call_in) };
            Status::new(status)
                .into_result()
                .map_err(BridgeError::Disconnect)?;
            tracing::debug!(engine = %self.engine_name, "engine module disconnected");
        }
        Ok(())
    }

    fn table(&self) -> &EngineCallIn {
        // SAFETY: the table outlives the bridge; either the library that
        // owns it is held in `_lib`, or it was provided as `'static`.
        unsafe { &*self.call_in }
    }

    /// Copy an engine-allocated string and return the memory.
    ///
    /// # Safety
    /// `ptr` must be NULL or an engine allocation belonging to `ctx`.
    unsafe fn take_engine_string(&self, ctx: RawTunnelCtx, ptr: *mut c_char) -> String {
        if ptr.is_null() {
            return String::new();
        }
        let s = CStr::from_ptr(ptr).to_string_lossy().into_owned();
        (self.table().dispose_obj)(ctx, ptr as *mut c_void);
        s
    }

    /// Copy an engine-filled item ID and return its memory.
    ///
    /// # Safety
    /// `cid` must have been filled by the engine for `ctx`.
    unsafe fn take_item_id(&self, ctx: RawTunnelCtx, cid: CItemId) -> ItemId {
        let item = self.take_engine_string(ctx, cid.item);
        let parent = if cid.parent.is_null() {
            None
        } else {
            Some(self.take_engine_string(ctx, cid.parent))
        };
        ItemId { item, parent }
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        if let Err(err) = self.do_disconnect() {
            tracing::warn!(engine = %self.engine_name, %err, "disconnect on drop failed");
        }
    }
}

/// NUL-check a string parameter for the C boundary.
fn cstring(s: &str) -> EngineResult<CString> {
    CString::new(s).map_err(|_| EngineError::WrongUsage)
}

/// Borrowed C representation of an [`ItemId`] parameter.
struct ItemIdIn {
    item: CString,
    parent: Option<CString>,
}

impl ItemIdIn {
    fn new(id: &ItemId) -> EngineResult<Self> {
        Ok(Self {
            item: cstring(&id.item)?,
            parent: id.parent.as_deref().map(cstring).transpose()?,
        })
    }

    fn raw(&self) -> CItemId {
        CItemId {
            item: self.item.as_ptr() as *mut c_char,
            parent: self
                .parent
                .as_ref()
                .map_or(ptr::null_mut(), |p| p.as_ptr() as *mut c_char),
        }
    }
}

fn check_engine_version(engine: SdkVersion, required: SdkVersion) -> Result<(), BridgeError> {
    if engine < required {
        return Err(BridgeError::VersionTooOld { engine, required });
    }
    Ok(())
}

/// Trampoline adapting a Rust reader to the config reader callback.
///
/// # Safety
/// `context` must point at a `&mut dyn Read` that outlives the
/// configuration call.
unsafe extern "C" fn config_read_trampoline(
    context: *mut c_void,
    buf: *mut u8,
    buf_size: usize,
    delivered: *mut usize,
) -> ffi::RawStatus {
    let reader = &mut *(context as *mut &mut dyn Read);
    let slice = std::slice::from_raw_parts_mut(buf, buf_size);
    match reader.read(slice) {
        Ok(n) => {
            *delivered = n;
            Status::OK.code()
        }
        Err(_) => Status::NO_CONFIG.code(),
    }
}

impl EngineModule for EngineBridge {
    fn set_string_mode(&self, mode: StringMode) -> EngineResult<()> {
        let status = unsafe {
            (self.table().set_string_mode)(
                mode.charset.as_u16(),
                mode.line_ends.as_u16(),
                mode.big_endian as u8,
            )
        };
        Status::new(status).into_result()
    }

    fn init_engine_xml(&self, config: &str) -> EngineResult<()> {
        let config = cstring(config)?;
        let status = unsafe { (self.table().init_engine_xml)(config.as_ptr()) };
        Status::new(status).into_result()
    }

    fn init_engine_file(&self, path: &Path) -> EngineResult<()> {
        let path = cstring(path.to_str().ok_or(EngineError::WrongUsage)?)?;
        let status = unsafe { (self.table().init_engine_file)(path.as_ptr()) };
        Status::new(status).into_result()
    }

    fn init_engine_reader(&self, reader: &mut dyn Read) -> EngineResult<()> {
        let mut reader_ref: &mut dyn Read = reader;
        let context = &mut reader_ref as *mut &mut dyn Read as *mut c_void;
        let status = unsafe { (self.table().init_engine_cb)(config_read_trampoline, context) };
        Status::new(status).into_result()
    }

    fn open_session(&self, selector: u32, name: Option<&str>) -> EngineResult<SessionHandle> {
        let name_c = name.map(cstring).transpose()?;
        let name_ptr = name_c.as_ref().map_or(ptr::null(), |c| c.as_ptr());
        let mut session: RawSessionH = ptr::null_mut();
        let status = unsafe { (self.table().open_session)(&mut session, selector, name_ptr) };
        Status::new(status).into_result()?;
        Ok(SessionHandle::from_raw(session as usize))
    }

    fn open_session_key(
        &self,
        session: Option<SessionHandle>,
        mode: OpenMode,
    ) -> EngineResult<KeyHandle> {
        let session = session.map_or(ptr::null_mut(), |s| s.raw() as RawSessionH);
        let mut key: RawKeyH = ptr::null_mut();
        let status = unsafe { (self.table().open_session_key)(session, &mut key, mode.as_u16()) };
        Status::new(status).into_result()?;
        Ok(KeyHandle::from_raw(key as usize))
    }

    fn session_step(&self, session: SessionHandle, cmd: StepCommand) -> EngineResult<SessionStep> {
        let mut cmd_raw = cmd.as_u16();
        let mut progress = CProgressInfo::zeroed();
        let status = unsafe {
            (self.table().session_step)(session.raw() as RawSessionH, &mut cmd_raw, &mut progress)
        };
        Status::new(status).into_result()?;
        // An unknown directive code means the engine and host disagree on
        // the step vocabulary.
        let directive = StepDirective::from_u16(cmd_raw).ok_or(EngineError::WrongUsage)?;
        let progress = if progress.is_empty() {
            None
        } else {
            Some(ProgressInfo {
                event: ProgressEvent::from_raw(progress.event),
                target_id: progress.target_id,
                extra1: progress.extra1,
                extra2: progress.extra2,
                extra3: progress.extra3,
            })
        };
        Ok(SessionStep {
            directive,
            progress,
        })
    }

    fn read_syncml_buffer(
        &self,
        session: SessionHandle,
        buf: &mut [u8],
    ) -> EngineResult<BufferRead> {
        let mut read = 0usize;
        let mut message_size = 0usize;
        let status = unsafe {
            (self.table().read_syncml_buffer)(
                session.raw() as RawSessionH,
                buf.as_mut_ptr(),
                buf.len(),
                &mut read,
                &mut message_size,
            )
        };
        let status = Status::new(status);
        // Truncated just means more chunks follow.
        if !status.is_ok() && status != Status::TRUNCATED {
            return Err(EngineError::from_status(status));
        }
        Ok(BufferRead { read, message_size })
    }

    fn write_syncml_buffer(&self, session: SessionHandle, data: &[u8]) -> EngineResult<()> {
        // Received data travels through the engine's own receive buffer:
        // acquire it empty, fill it, return it.
        let table = self.table();
        let session = session.raw() as RawSessionH;
        let mut dst: *mut u8 = ptr::null_mut();
        let mut capacity = 0usize;
        unsafe {
            Status::new((table.get_syncml_buffer)(session, 0, &mut dst, &mut capacity))
                .into_result()?;
            if capacity < data.len() || dst.is_null() {
                let _ = (table.ret_syncml_buffer)(session, 0, 0);
                return Err(EngineError::BufferTooSmall);
            }
            ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
            Status::new((table.ret_syncml_buffer)(session, 0, data.len())).into_result()
        }
    }

    fn close_session(&self, session: SessionHandle) -> EngineResult<()> {
        let status = unsafe { (self.table().close_session)(session.raw() as RawSessionH) };
        Status::new(status).into_result()
    }

    fn open_key_by_path(
        &self,
        parent: Option<KeyHandle>,
        path: &str,
        mode: OpenMode,
    ) -> EngineResult<KeyHandle> {
        let path = cstring(path)?;
        let parent = parent.map_or(ptr::null_mut(), |k| k.raw() as RawKeyH);
        let mut key: RawKeyH = ptr::null_mut();
        let status = unsafe {
            (self.table().open_key_by_path)(&mut key, parent, path.as_ptr(), mode.as_u16())
        };
        Status::new(status).into_result()?;
        Ok(KeyHandle::from_raw(key as usize))
    }

    fn open_subkey(
        &self,
        parent: KeyHandle,
        selector: SubkeySelector,
        mode: OpenMode,
    ) -> EngineResult<Option<KeyHandle>> {
        let id = match selector {
            // Negative IDs are reserved for the sentinels below.
            SubkeySelector::ById(id) if id < 0 => return Err(EngineError::WrongUsage),
            SubkeySelector::ById(id) => id,
            SubkeySelector::First => ffi::SUBKEY_ID_FIRST,
            SubkeySelector::Next => ffi::SUBKEY_ID_NEXT,
            SubkeySelector::New => ffi::SUBKEY_ID_NEW,
        };
        let mut key: RawKeyH = ptr::null_mut();
        let status = unsafe {
            (self.table().open_subkey)(&mut key, parent.raw() as RawKeyH, id, mode.as_u16())
        };
        let status = Status::new(status);
        if status == Status::NO_CONTENT
            && matches!(selector, SubkeySelector::First | SubkeySelector::Next)
        {
            return Ok(None);
        }
        status.into_result()?;
        Ok(Some(KeyHandle::from_raw(key as usize)))
    }

    fn delete_subkey(&self, parent: KeyHandle, id: i32) -> EngineResult<()> {
        let status = unsafe { (self.table().delete_subkey)(parent.raw() as RawKeyH, id) };
        Status::new(status).into_result()
    }

    fn key_id(&self, key: KeyHandle) -> EngineResult<i32> {
        let mut id = 0i32;
        let status = unsafe { (self.table().get_key_id)(key.raw() as RawKeyH, &mut id) };
        Status::new(status).into_result()?;
        Ok(id)
    }

    fn set_text_mode(&self, key: KeyHandle, mode: StringMode) -> EngineResult<()> {
        let status = unsafe {
            (self.table().set_text_mode)(
                key.raw() as RawKeyH,
                mode.charset.as_u16(),
                mode.line_ends.as_u16(),
                mode.big_endian as u8,
            )
        };
        Status::new(status).into_result()
    }

    fn set_time_mode(&self, key: KeyHandle, mode: TimeMode) -> EngineResult<()> {
        let status = unsafe { (self.table().set_time_mode)(key.raw() as RawKeyH, mode.as_u16()) };
        Status::new(status).into_result()
    }

    fn close_key(&self, key: KeyHandle) -> EngineResult<()> {
        let status = unsafe { (self.table().close_key)(key.raw() as RawKeyH) };
        Status::new(status).into_result()
    }

    fn get_value(&self, key: KeyHandle, name: &str, as_type: ValueType) -> EngineResult<Vec<u8>> {
        let name = cstring(name)?;
        let table = self.table();
        let key = key.raw() as RawKeyH;

        // Probe the size first, then fetch; retry if the value grew in
        // between.
        let mut needed = 0usize;
        let status = unsafe {
            (table.get_value)(
                key,
                name.as_ptr(),
                as_type.as_u16(),
                ptr::null_mut(),
                0,
                &mut needed,
            )
        };
        let status = Status::new(status);
        if !status.is_ok() && status != Status::BUFFER_TOO_SMALL && status != Status::TRUNCATED {
            return Err(EngineError::from_status(status));
        }

        for _ in 0..GET_VALUE_ATTEMPTS {
            if needed == 0 {
                return Ok(Vec::new());
            }
            let mut buf = vec![0u8; needed];
            let mut val_size = 0usize;
            let status = unsafe {
                (table.get_value)(
                    key,
                    name.as_ptr(),
                    as_type.as_u16(),
                    buf.as_mut_ptr(),
                    buf.len(),
                    &mut val_size,
                )
            };
            match Status::new(status) {
                Status::OK => {
                    buf.truncate(val_size.min(needed));
                    return Ok(buf);
                }
                Status::BUFFER_TOO_SMALL => needed = val_size,
                status => return Err(EngineError::from_status(status)),
            }
        }
        Err(EngineError::BufferTooSmall)
    }

    fn value_id(&self, key: KeyHandle, name: &str) -> EngineResult<ValueId> {
        let name = cstring(name)?;
        let id = unsafe { (self.table().get_value_id)(key.raw() as RawKeyH, name.as_ptr()) };
        if id == ffi::VALUE_ID_UNKNOWN {
            return Err(EngineError::NotFound);
        }
        Ok(ValueId::from_raw(id))
    }

    fn get_value_by_id(
        &self,
        key: KeyHandle,
        id: ValueId,
        arr_index: i32,
        as_type: ValueType,
    ) -> EngineResult<Vec<u8>> {
        let table = self.table();
        let key = key.raw() as RawKeyH;

        let mut needed = 0usize;
        let status = unsafe {
            (table.get_value_by_id)(
                key,
                id.raw(),
                arr_index,
                as_type.as_u16(),
                ptr::null_mut(),
                0,
                &mut needed,
            )
        };
        let status = Status::new(status);
        if !status.is_ok() && status != Status::BUFFER_TOO_SMALL && status != Status::TRUNCATED {
            return Err(EngineError::from_status(status));
        }
        if needed == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; needed];
        let mut val_size = 0usize;
        let status = unsafe {
            (table.get_value_by_id)(
                key,
                id.raw(),
                arr_index,
                as_type.as_u16(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut val_size,
            )
        };
        Status::new(status).into_result()?;
        buf.truncate(val_size.min(needed));
        Ok(buf)
    }

    fn set_value(
        &self,
        key: KeyHandle,
        name: &str,
        as_type: ValueType,
        data: &[u8],
    ) -> EngineResult<()> {
        let name = cstring(name)?;
        let status = unsafe {
            (self.table().set_value)(
                key.raw() as RawKeyH,
                name.as_ptr(),
                as_type.as_u16(),
                data.as_ptr(),
                data.len(),
            )
        };
        Status::new(status).into_result()
    }

    fn set_value_by_id(
        &self,
        key: KeyHandle,
        id: ValueId,
        arr_index: i32,
        as_type: ValueType,
        data: &[u8],
    ) -> EngineResult<()> {
        let status = unsafe {
            (self.table().set_value_by_id)(
                key.raw() as RawKeyH,
                id.raw(),
                arr_index,
                as_type.as_u16(),
                data.as_ptr(),
                data.len(),
            )
        };
        Status::new(status).into_result()
    }

    fn start_data_read(
        &self,
        ctx: TunnelContext,
        last_token: &str,
        resume_token: &str,
    ) -> EngineResult<()> {
        let last = cstring(last_token)?;
        let resume = cstring(resume_token)?;
        let status = unsafe {
            (self.table().start_data_read)(ctx.raw(), last.as_ptr(), resume.as_ptr())
        };
        Status::new(status).into_result()
    }

    fn read_next_item(
        &self,
        ctx: TunnelContext,
        first: bool,
    ) -> EngineResult<Option<TunnelItem>> {
        let mut cid = CItemId::null();
        let mut data: *mut c_char = ptr::null_mut();
        let mut change_raw: u16 = 0;
        let status = unsafe {
            (self.table().read_next_item)(ctx.raw(), &mut cid, &mut data, &mut change_raw, first as u8)
        };
        Status::new(status).into_result()?;
        if change_raw == 0 {
            // End of iteration; the engine fills nothing in this case.
            return Ok(None);
        }
        // Reclaim engine allocations before validating, so a bad change
        // code cannot leak them.
        let id = unsafe { self.take_item_id(ctx.raw(), cid) };
        let data = unsafe { self.take_engine_string(ctx.raw(), data) };
        let change = ItemChange::from_u16(change_raw).ok_or(EngineError::WrongUsage)?;
        Ok(Some(TunnelItem { id, data, change }))
    }

    fn read_item(&self, ctx: TunnelContext, id: &ItemId) -> EngineResult<String> {
        let id_in = ItemIdIn::new(id)?;
        let raw_id = id_in.raw();
        let mut data: *mut c_char = ptr::null_mut();
        let status = unsafe { (self.table().read_item)(ctx.raw(), &raw_id, &mut data) };
        Status::new(status).into_result()?;
        Ok(unsafe { self.take_engine_string(ctx.raw(), data) })
    }

    fn end_data_read(&self, ctx: TunnelContext) -> EngineResult<()> {
        let status = unsafe { (self.table().end_data_read)(ctx.raw()) };
        Status::new(status).into_result()
    }

    fn start_data_write(&self, ctx: TunnelContext) -> EngineResult<()> {
        let status = unsafe { (self.table().start_data_write)(ctx.raw()) };
        Status::new(status).into_result()
    }

    fn insert_item(&self, ctx: TunnelContext, data: &str) -> EngineResult<ItemId> {
        let data = cstring(data)?;
        let mut cid = CItemId::null();
        let status = unsafe { (self.table().insert_item)(ctx.raw(), data.as_ptr(), &mut cid) };
        Status::new(status).into_result()?;
        Ok(unsafe { self.take_item_id(ctx.raw(), cid) })
    }

    fn update_item(&self, ctx: TunnelContext, data: &str, id: &ItemId) -> EngineResult<ItemId> {
        let data = cstring(data)?;
        let id_in = ItemIdIn::new(id)?;
        let raw_id = id_in.raw();
        let mut upd = CItemId::null();
        let status = unsafe {
            (self.table().update_item)(ctx.raw(), data.as_ptr(), &raw_id, &mut upd)
        };
        Status::new(status).into_result()?;
        Ok(unsafe { self.take_item_id(ctx.raw(), upd) })
    }

    fn move_item(&self, ctx: TunnelContext, id: &ItemId, new_parent: &str) -> EngineResult<()> {
        let id_in = ItemIdIn::new(id)?;
        let raw_id = id_in.raw();
        let new_parent = cstring(new_parent)?;
        let status = unsafe {
            (self.table().move_item)(ctx.raw(), &raw_id, new_parent.as_ptr())
        };
        Status::new(status).into_result()
    }

    fn delete_item(&self, ctx: TunnelContext, id: &ItemId) -> EngineResult<()> {
        let id_in = ItemIdIn::new(id)?;
        let raw_id = id_in.raw();
        let status = unsafe { (self.table().delete_item)(ctx.raw(), &raw_id) };
        Status::new(status).into_result()
    }

    fn end_data_write(&self, ctx: TunnelContext, success: bool) -> EngineResult<String> {
        let mut token: *mut c_char = ptr::null_mut();
        let status =
            unsafe { (self.table().end_data_write)(ctx.raw(), success as u8, &mut token) };
        Status::new(status).into_result()?;
        Ok(unsafe { self.take_engine_string(ctx.raw(), token) })
    }

    fn read_next_item_as_key(
        &self,
        ctx: TunnelContext,
        item_key: KeyHandle,
        first: bool,
    ) -> EngineResult<Option<(ItemId, ItemChange)>> {
        let mut cid = CItemId::null();
        let mut change_raw: u16 = 0;
        let status = unsafe {
            (self.table().read_next_item_as_key)(
                ctx.raw(),
                &mut cid,
                item_key.raw() as RawKeyH,
                &mut change_raw,
                first as u8,
            )
        };
        Status::new(status).into_result()?;
        if change_raw == 0 {
            return Ok(None);
        }
        let id = unsafe { self.take_item_id(ctx.raw(), cid) };
        let change = ItemChange::from_u16(change_raw).ok_or(EngineError::WrongUsage)?;
        Ok(Some((id, change)))
    }

    fn read_item_as_key(
        &self,
        ctx: TunnelContext,
        id: &ItemId,
        item_key: KeyHandle,
    ) -> EngineResult<()> {
        let id_in = ItemIdIn::new(id)?;
        let raw_id = id_in.raw();
        let status = unsafe {
            (self.table().read_item_as_key)(ctx.raw(), &raw_id, item_key.raw() as RawKeyH)
        };
        Status::new(status).into_result()
    }

    fn insert_item_as_key(&self, ctx: TunnelContext, item_key: KeyHandle) -> EngineResult<ItemId> {
        let mut cid = CItemId::null();
        let status = unsafe {
            (self.table().insert_item_as_key)(ctx.raw(), item_key.raw() as RawKeyH, &mut cid)
        };
        Status::new(status).into_result()?;
        Ok(unsafe { self.take_item_id(ctx.raw(), cid) })
    }

    fn update_item_as_key(
        &self,
        ctx: TunnelContext,
        item_key: KeyHandle,
        id: &ItemId,
    ) -> EngineResult<ItemId> {
        let id_in = ItemIdIn::new(id)?;
        let raw_id = id_in.raw();
        let mut upd = CItemId::null();
        let status = unsafe {
            (self.table().update_item_as_key)(
                ctx.raw(),
                item_key.raw() as RawKeyH,
                &raw_id,
                &mut upd,
            )
        };
        Status::new(status).into_result()?;
        Ok(unsafe { self.take_item_id(ctx.raw(), upd) })
    }
}
