//! In-memory engine module for host-side testing.
//!
//! Implements the full [`EngineModule`] contract without a native module:
//! a hierarchical settings tree, scripted session steps with loopback
//! SyncML buffers, and tunnel datastores with token bookkeeping. Allows
//! failure injection and introspection so host code can be tested against
//! engine behavior it cannot easily provoke from a real module.
//!
//! Mock-specific behavior, kept deliberately simple:
//! - `open_key_by_path` creates missing path components when opened
//!   read-write, so tests build the tree through the public API;
//! - integer conversions narrow by truncation;
//! - item content for the as-key tunnel variants is exchanged through the
//!   `DATA` value of the supplied item key.

use crate::module::EngineModule;
use engine_types::{
    BufferRead, EngineError, EngineResult, ItemChange, ItemId, KeyHandle, OpenMode, SessionHandle,
    SessionStep, StepCommand, StepDirective, StringMode, SubkeySelector, TimeMode, TunnelContext,
    TunnelItem, ValueId, ValueType,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

/// Text values longer than this are stored truncated.
const MAX_TEXT: usize = 4096;

/// Flag ID returned for the `.FLAG.VALNAME` pseudo-name.
const FLAG_VALNAME: i32 = 0x10000;

/// In-memory engine module.
#[derive(Default)]
pub struct MockEngine {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    string_mode: StringMode,
    config_xml: Option<String>,
    next_handle: usize,
    root: KeyNode,
    open_keys: HashMap<usize, OpenKey>,
    sessions: HashMap<usize, MockSession>,
    session_order: Vec<usize>,
    session_script: Vec<SessionStep>,
    outgoing_queue: VecDeque<Vec<u8>>,
    tunnels: HashMap<usize, TunnelStore>,
    fail_next_open: Option<EngineError>,
}

#[derive(Default)]
struct KeyNode {
    values: BTreeMap<String, MockValue>,
    value_ids: BTreeMap<i32, String>,
    next_value_id: i32,
    subkeys: BTreeMap<i32, Subkey>,
    next_subkey_id: i32,
}

struct Subkey {
    name: String,
    node: KeyNode,
}

#[derive(Debug, Clone, PartialEq)]
enum MockValue {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Time(i64),
}

struct OpenKey {
    loc: KeyLoc,
    mode: OpenMode,
    iter_last: Option<i32>,
}

#[derive(Clone)]
enum KeyLoc {
    /// Subkey-ID path from the settings root.
    Global(Vec<i32>),
    /// Subkey-ID path within a session's runtime settings.
    Session { session: usize, path: Vec<i32> },
}

struct MockSession {
    steps: VecDeque<SessionStep>,
    outgoing: Option<OutMsg>,
    written: Vec<Vec<u8>>,
    settings: KeyNode,
    open_keys: Vec<usize>,
}

struct OutMsg {
    data: Vec<u8>,
    pos: usize,
}

#[derive(Default)]
struct TunnelStore {
    items: BTreeMap<String, StoreItem>,
    next_id: u32,
    token: u32,
    phase: Phase,
}

struct StoreItem {
    data: String,
    parent: Option<String>,
}

#[derive(Default, PartialEq)]
enum Phase {
    #[default]
    Idle,
    Reading {
        classify: ItemChange,
        cursor: Option<String>,
    },
    Writing,
}

impl MockEngine {
    /// Create an empty mock engine.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Test scripting ---

    /// Script the step outcomes every subsequently opened session replays.
    pub fn script_steps(&self, steps: impl IntoIterator<Item = SessionStep>) {
        let mut inner = self.inner.lock().unwrap();
        inner.session_script = steps.into_iter().collect();
    }

    /// Queue an outgoing SyncML message, consumed by the next scripted
    /// `SendData` step.
    pub fn queue_outgoing(&self, msg: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.outgoing_queue.push_back(msg);
    }

    /// Cause the next `open_session`, `open_session_key`,
    /// `open_key_by_path` or `open_subkey` to fail with the given error.
    pub fn fail_next_open(&self, err: EngineError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_open = Some(err);
    }

    // --- Introspection ---

    /// Number of currently open settings keys (including session keys).
    pub fn open_key_count(&self) -> usize {
        self.inner.lock().unwrap().open_keys.len()
    }

    /// Number of currently open sessions.
    pub fn open_session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    /// Messages fed to a session via `write_syncml_buffer`.
    pub fn written_messages(&self, session: SessionHandle) -> Vec<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner
            .sessions
            .get(&session.raw())
            .map(|s| s.written.clone())
            .unwrap_or_default()
    }

    /// The config XML recorded by the last engine init call, if any.
    pub fn config_xml(&self) -> Option<String> {
        self.inner.lock().unwrap().config_xml.clone()
    }

    /// The current global string mode.
    pub fn string_mode(&self) -> StringMode {
        self.inner.lock().unwrap().string_mode
    }

    /// Number of items in a tunnel datastore context.
    pub fn tunnel_item_count(&self, ctx: TunnelContext) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .tunnels
            .get(&ctx.raw())
            .map(|t| t.items.len())
            .unwrap_or(0)
    }
}

impl Inner {
    fn alloc_handle(&mut self) -> usize {
        self.next_handle += 1;
        0x1000 + self.next_handle
    }

    fn take_injected_failure(&mut self) -> EngineResult<()> {
        match self.fail_next_open.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn open_key(&self, key: KeyHandle) -> EngineResult<&OpenKey> {
        self.open_keys.get(&key.raw()).ok_or(EngineError::BadHandle)
    }

    fn node_of(&mut self, loc: &KeyLoc) -> EngineResult<&mut KeyNode> {
        let (root, path) = match loc {
            KeyLoc::Global(path) => (&mut self.root, path),
            KeyLoc::Session { session, path } => {
                let session = self
                    .sessions
                    .get_mut(session)
                    .ok_or(EngineError::BadHandle)?;
                (&mut session.settings, path)
            }
        };
        let mut node = root;
        for id in path {
            node = &mut node
                .subkeys
                .get_mut(id)
                .ok_or(EngineError::BadHandle)?
                .node;
        }
        Ok(node)
    }

    fn writable_node(&mut self, key: KeyHandle) -> EngineResult<&mut KeyNode> {
        let open = self.open_key(key)?;
        if open.mode == OpenMode::ReadOnly {
            return Err(EngineError::Forbidden);
        }
        let loc = open.loc.clone();
        self.node_of(&loc)
    }

    fn readable_node(&mut self, key: KeyHandle) -> EngineResult<&mut KeyNode> {
        let loc = self.open_key(key)?.loc.clone();
        self.node_of(&loc)
    }

    fn tunnel(&mut self, ctx: TunnelContext) -> &mut TunnelStore {
        self.tunnels.entry(ctx.raw()).or_default()
    }

    fn current_session(&self) -> EngineResult<usize> {
        self.session_order
            .last()
            .copied()
            .ok_or(EngineError::WrongUsage)
    }
}

impl KeyNode {
    /// Find a direct subkey by name.
    fn subkey_by_name(&self, name: &str) -> Option<i32> {
        self.subkeys
            .iter()
            .find(|(_, sub)| sub.name == name)
            .map(|(id, _)| *id)
    }

    fn create_subkey(&mut self, name: String) -> i32 {
        self.next_subkey_id += 1;
        let id = self.next_subkey_id;
        self.subkeys.insert(
            id,
            Subkey {
                name,
                node: KeyNode::default(),
            },
        );
        id
    }

    fn value_id_of(&mut self, name: &str) -> EngineResult<i32> {
        if !self.values.contains_key(name) {
            return Err(EngineError::NotFound);
        }
        if let Some((id, _)) = self.value_ids.iter().find(|(_, n)| n.as_str() == name) {
            return Ok(*id);
        }
        self.next_value_id += 1;
        let id = self.next_value_id;
        self.value_ids.insert(id, name.to_string());
        Ok(id)
    }
}

impl MockValue {
    fn as_int(&self) -> EngineResult<i64> {
        match self {
            Self::Int(v) | Self::Time(v) => Ok(*v),
            Self::Text(s) => s.trim().parse().map_err(|_| EngineError::WrongUsage),
            Self::Bytes(_) => Err(EngineError::WrongUsage),
        }
    }

    fn encode(&self, as_type: ValueType) -> EngineResult<Vec<u8>> {
        match as_type {
            ValueType::Unknown | ValueType::Buffer => Ok(match self {
                Self::Int(v) | Self::Time(v) => v.to_le_bytes().to_vec(),
                Self::Text(s) => s.clone().into_bytes(),
                Self::Bytes(b) => b.clone(),
            }),
            ValueType::Int8 => Ok((self.as_int()? as i8).to_le_bytes().to_vec()),
            ValueType::Int16 => Ok((self.as_int()? as i16).to_le_bytes().to_vec()),
            ValueType::Int32 => Ok((self.as_int()? as i32).to_le_bytes().to_vec()),
            ValueType::Int64 | ValueType::Time => Ok(self.as_int()?.to_le_bytes().to_vec()),
            ValueType::Text => Ok(match self {
                Self::Int(v) | Self::Time(v) => v.to_string().into_bytes(),
                Self::Text(s) => s.clone().into_bytes(),
                Self::Bytes(b) => String::from_utf8_lossy(b).into_owned().into_bytes(),
            }),
        }
    }

    /// Decode an incoming payload. Returns the value and whether text was
    /// stored truncated.
    fn decode(as_type: ValueType, data: &[u8]) -> EngineResult<(Self, bool)> {
        fn int_from<const N: usize>(data: &[u8]) -> EngineResult<[u8; N]> {
            if data.len() < N {
                return Err(EngineError::BufferTooSmall);
            }
            let mut arr = [0u8; N];
            arr.copy_from_slice(&data[..N]);
            Ok(arr)
        }
        match as_type {
            ValueType::Int8 => Ok((Self::Int(i8::from_le_bytes(int_from(data)?) as i64), false)),
            ValueType::Int16 => Ok((Self::Int(i16::from_le_bytes(int_from(data)?) as i64), false)),
            ValueType::Int32 => Ok((Self::Int(i32::from_le_bytes(int_from(data)?) as i64), false)),
            ValueType::Int64 => Ok((Self::Int(i64::from_le_bytes(int_from(data)?)), false)),
            ValueType::Time => Ok((Self::Time(i64::from_le_bytes(int_from(data)?)), false)),
            ValueType::Text => {
                let text = String::from_utf8_lossy(data).into_owned();
                if text.len() > MAX_TEXT {
                    let mut truncated = text;
                    truncated.truncate(MAX_TEXT);
                    Ok((Self::Text(truncated), true))
                } else {
                    Ok((Self::Text(text), false))
                }
            }
            ValueType::Unknown | ValueType::Buffer => Ok((Self::Bytes(data.to_vec()), false)),
        }
    }
}

impl TunnelStore {
    fn token_string(&self) -> String {
        if self.token == 0 {
            String::new()
        } else {
            format!("tok-{}", self.token)
        }
    }
}

impl EngineModule for MockEngine {
    fn set_string_mode(&self, mode: StringMode) -> EngineResult<()> {
        self.inner.lock().unwrap().string_mode = mode;
        Ok(())
    }

    fn init_engine_xml(&self, config: &str) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.config_xml = if config.is_empty() {
            None
        } else {
            Some(config.to_string())
        };
        Ok(())
    }

    fn init_engine_file(&self, path: &Path) -> EngineResult<()> {
        let config = std::fs::read_to_string(path).map_err(|_| EngineError::NoConfig)?;
        self.init_engine_xml(&config)
    }

    fn init_engine_reader(&self, reader: &mut dyn Read) -> EngineResult<()> {
        let mut config = String::new();
        reader
            .read_to_string(&mut config)
            .map_err(|_| EngineError::NoConfig)?;
        self.init_engine_xml(&config)
    }

    fn open_session(&self, _selector: u32, _name: Option<&str>) -> EngineResult<SessionHandle> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_injected_failure()?;
        let handle = inner.alloc_handle();
        let steps = inner.session_script.clone().into();
        inner.sessions.insert(
            handle,
            MockSession {
                steps,
                outgoing: None,
                written: Vec::new(),
                settings: KeyNode::default(),
                open_keys: Vec::new(),
            },
        );
        inner.session_order.push(handle);
        Ok(SessionHandle::from_raw(handle))
    }

    fn open_session_key(
        &self,
        session: Option<SessionHandle>,
        mode: OpenMode,
    ) -> EngineResult<KeyHandle> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_injected_failure()?;
        let session = match session {
            Some(handle) => handle.raw(),
            None => inner.current_session()?,
        };
        if !inner.sessions.contains_key(&session) {
            return Err(EngineError::BadHandle);
        }
        let handle = inner.alloc_handle();
        inner.open_keys.insert(
            handle,
            OpenKey {
                loc: KeyLoc::Session {
                    session,
                    path: Vec::new(),
                },
                mode,
                iter_last: None,
            },
        );
        inner
            .sessions
            .get_mut(&session)
            .expect("session checked above")
            .open_keys
            .push(handle);
        Ok(KeyHandle::from_raw(handle))
    }

    fn session_step(&self, session: SessionHandle, cmd: StepCommand) -> EngineResult<SessionStep> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let state = inner
            .sessions
            .get_mut(&session.raw())
            .ok_or(EngineError::BadHandle)?;
        if cmd == StepCommand::Abort {
            state.steps.clear();
            return Ok(SessionStep::directive(StepDirective::Done));
        }
        let step = match state.steps.pop_front() {
            Some(step) => step,
            None => SessionStep::directive(StepDirective::Done),
        };
        if step.directive == StepDirective::SendData {
            let data = inner.outgoing_queue.pop_front().unwrap_or_default();
            state.outgoing = Some(OutMsg { data, pos: 0 });
        }
        Ok(step)
    }

    fn read_syncml_buffer(
        &self,
        session: SessionHandle,
        buf: &mut [u8],
    ) -> EngineResult<BufferRead> {
        let mut inner = self.inner.lock().unwrap();
        let state = inner
            .sessions
            .get_mut(&session.raw())
            .ok_or(EngineError::BadHandle)?;
        let out = state.outgoing.as_mut().ok_or(EngineError::WrongUsage)?;
        let n = buf.len().min(out.data.len() - out.pos);
        buf[..n].copy_from_slice(&out.data[out.pos..out.pos + n]);
        out.pos += n;
        let read = BufferRead {
            read: n,
            message_size: out.data.len(),
        };
        if out.pos == out.data.len() {
            state.outgoing = None;
        }
        Ok(read)
    }

    fn write_syncml_buffer(&self, session: SessionHandle, data: &[u8]) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let state = inner
            .sessions
            .get_mut(&session.raw())
            .ok_or(EngineError::BadHandle)?;
        state.written.push(data.to_vec());
        Ok(())
    }

    fn close_session(&self, session: SessionHandle) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let state = inner
            .sessions
            .get(&session.raw())
            .ok_or(EngineError::BadHandle)?;
        // Session keys must be closed before the session.
        if !state.open_keys.is_empty() {
            return Err(EngineError::WrongUsage);
        }
        inner.sessions.remove(&session.raw());
        inner.session_order.retain(|&h| h != session.raw());
        Ok(())
    }

    fn open_key_by_path(
        &self,
        parent: Option<KeyHandle>,
        path: &str,
        mode: OpenMode,
    ) -> EngineResult<KeyHandle> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_injected_failure()?;
        let loc = match parent {
            Some(parent) => inner.open_key(parent)?.loc.clone(),
            None => KeyLoc::Global(Vec::new()),
        };
        let mut ids = match &loc {
            KeyLoc::Global(ids) => ids.clone(),
            KeyLoc::Session { path, .. } => path.clone(),
        };
        {
            let mut node = inner.node_of(&loc)?;
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                let id = match node.subkey_by_name(segment) {
                    Some(id) => id,
                    None if mode == OpenMode::ReadWrite => node.create_subkey(segment.to_string()),
                    None => return Err(EngineError::NotFound),
                };
                ids.push(id);
                node = &mut node
                    .subkeys
                    .get_mut(&id)
                    .expect("subkey just found or created")
                    .node;
            }
        }
        let new_loc = match loc {
            KeyLoc::Global(_) => KeyLoc::Global(ids),
            KeyLoc::Session { session, .. } => KeyLoc::Session { session, path: ids },
        };
        let handle = inner.alloc_handle();
        inner.open_keys.insert(
            handle,
            OpenKey {
                loc: new_loc,
                mode,
                iter_last: None,
            },
        );
        Ok(KeyHandle::from_raw(handle))
    }

    fn open_subkey(
        &self,
        parent: KeyHandle,
        selector: SubkeySelector,
        mode: OpenMode,
    ) -> EngineResult<Option<KeyHandle>> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_injected_failure()?;
        let parent_open = inner.open_key(parent)?;
        let loc = parent_open.loc.clone();
        let iter_last = parent_open.iter_last;
        let node = inner.node_of(&loc)?;
        let id = match selector {
            SubkeySelector::ById(id) => {
                if !node.subkeys.contains_key(&id) {
                    return Err(EngineError::NotFound);
                }
                id
            }
            SubkeySelector::First => match node.subkeys.keys().next() {
                Some(&id) => id,
                None => return Ok(None),
            },
            SubkeySelector::Next => {
                // Next without a preceding First starts from the beginning.
                let from = iter_last.map(|id| id + 1).unwrap_or(i32::MIN);
                match node.subkeys.range(from..).map(|(&id, _)| id).next() {
                    Some(id) => id,
                    None => return Ok(None),
                }
            }
            SubkeySelector::New => {
                let id = node.next_subkey_id + 1;
                node.create_subkey(id.to_string())
            }
        };
        if matches!(selector, SubkeySelector::First | SubkeySelector::Next) {
            inner
                .open_keys
                .get_mut(&parent.raw())
                .expect("parent checked above")
                .iter_last = Some(id);
        }
        let mut ids = match &loc {
            KeyLoc::Global(ids) => ids.clone(),
            KeyLoc::Session { path, .. } => path.clone(),
        };
        ids.push(id);
        let new_loc = match loc {
            KeyLoc::Global(_) => KeyLoc::Global(ids),
            KeyLoc::Session { session, .. } => KeyLoc::Session { session, path: ids },
        };
        let handle = inner.alloc_handle();
        inner.open_keys.insert(
            handle,
            OpenKey {
                loc: new_loc,
                mode,
                iter_last: None,
            },
        );
        Ok(Some(KeyHandle::from_raw(handle)))
    }

    fn delete_subkey(&self, parent: KeyHandle, id: i32) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let node = inner.writable_node(parent)?;
        node.subkeys
            .remove(&id)
            .map(|_| ())
            .ok_or(EngineError::NotFound)
    }

    fn key_id(&self, key: KeyHandle) -> EngineResult<i32> {
        let inner = self.inner.lock().unwrap();
        let open = inner.open_key(key)?;
        let path = match &open.loc {
            KeyLoc::Global(path) => path,
            KeyLoc::Session { path, .. } => path,
        };
        Ok(path.last().copied().unwrap_or(0))
    }

    fn set_text_mode(&self, key: KeyHandle, _mode: StringMode) -> EngineResult<()> {
        // The mock converts text as UTF-8 only; the call just validates the handle.
        let inner = self.inner.lock().unwrap();
        inner.open_key(key).map(|_| ())
    }

    fn set_time_mode(&self, key: KeyHandle, _mode: TimeMode) -> EngineResult<()> {
        let inner = self.inner.lock().unwrap();
        inner.open_key(key).map(|_| ())
    }

    fn close_key(&self, key: KeyHandle) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let open = inner
            .open_keys
            .remove(&key.raw())
            .ok_or(EngineError::BadHandle)?;
        if let KeyLoc::Session { session, .. } = open.loc {
            if let Some(state) = inner.sessions.get_mut(&session) {
                state.open_keys.retain(|&h| h != key.raw());
            }
        }
        Ok(())
    }

    fn get_value(&self, key: KeyHandle, name: &str, as_type: ValueType) -> EngineResult<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        let node = inner.readable_node(key)?;
        let value = node.values.get(name).ok_or(EngineError::NotFound)?;
        value.encode(as_type)
    }

    fn value_id(&self, key: KeyHandle, name: &str) -> EngineResult<ValueId> {
        if name == ".FLAG.VALNAME" {
            return Ok(ValueId::from_raw(FLAG_VALNAME));
        }
        let mut inner = self.inner.lock().unwrap();
        let node = inner.readable_node(key)?;
        node.value_id_of(name).map(ValueId::from_raw)
    }

    fn get_value_by_id(
        &self,
        key: KeyHandle,
        id: ValueId,
        arr_index: i32,
        as_type: ValueType,
    ) -> EngineResult<Vec<u8>> {
        // Plain values behave as one-element arrays.
        if arr_index > 0 {
            return Err(EngineError::OutOfRange);
        }
        let mut inner = self.inner.lock().unwrap();
        let node = inner.readable_node(key)?;
        let base = id.raw() & !FLAG_VALNAME;
        let name = node
            .value_ids
            .get(&base)
            .cloned()
            .ok_or(EngineError::NotFound)?;
        if id.raw() & FLAG_VALNAME != 0 {
            return Ok(name.into_bytes());
        }
        let value = node.values.get(&name).ok_or(EngineError::NotFound)?;
        value.encode(as_type)
    }

    fn set_value(
        &self,
        key: KeyHandle,
        name: &str,
        as_type: ValueType,
        data: &[u8],
    ) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let node = inner.writable_node(key)?;
        let (value, truncated) = MockValue::decode(as_type, data)?;
        node.values.insert(name.to_string(), value);
        if truncated {
            Err(EngineError::Truncated)
        } else {
            Ok(())
        }
    }

    fn set_value_by_id(
        &self,
        key: KeyHandle,
        id: ValueId,
        arr_index: i32,
        as_type: ValueType,
        data: &[u8],
    ) -> EngineResult<()> {
        if arr_index > 0 {
            return Err(EngineError::OutOfRange);
        }
        let name = {
            let mut inner = self.inner.lock().unwrap();
            let node = inner.readable_node(key)?;
            node.value_ids
                .get(&id.raw())
                .cloned()
                .ok_or(EngineError::NotFound)?
        };
        self.set_value(key, &name, as_type, data)
    }

    fn start_data_read(
        &self,
        ctx: TunnelContext,
        last_token: &str,
        resume_token: &str,
    ) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        if store.phase != Phase::Idle {
            return Err(EngineError::WrongUsage);
        }
        let classify = if !resume_token.is_empty() {
            ItemChange::Resumed
        } else if !last_token.is_empty() && last_token == store.token_string() {
            ItemChange::Unchanged
        } else {
            ItemChange::Changed
        };
        store.phase = Phase::Reading {
            classify,
            cursor: None,
        };
        Ok(())
    }

    fn read_next_item(
        &self,
        ctx: TunnelContext,
        first: bool,
    ) -> EngineResult<Option<TunnelItem>> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        let (classify, cursor) = match &mut store.phase {
            Phase::Reading { classify, cursor } => (*classify, cursor),
            _ => return Err(EngineError::WrongUsage),
        };
        if first {
            *cursor = None;
        }
        let next = match cursor.as_deref() {
            Some(last) => store
                .items
                .range::<str, _>((
                    std::ops::Bound::Excluded(last),
                    std::ops::Bound::Unbounded,
                ))
                .next(),
            None => store.items.iter().next(),
        };
        let Some((item_id, item)) = next else {
            return Ok(None);
        };
        let result = TunnelItem {
            id: match &item.parent {
                Some(parent) => ItemId::with_parent(item_id.clone(), parent.clone()),
                None => ItemId::new(item_id.clone()),
            },
            data: item.data.clone(),
            change: classify,
        };
        let advanced = item_id.clone();
        match &mut store.phase {
            Phase::Reading { cursor, .. } => *cursor = Some(advanced),
            _ => unreachable!(),
        }
        Ok(Some(result))
    }

    fn read_item(&self, ctx: TunnelContext, id: &ItemId) -> EngineResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        store
            .items
            .get(&id.item)
            .map(|item| item.data.clone())
            .ok_or(EngineError::NotFound)
    }

    fn end_data_read(&self, ctx: TunnelContext) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        match store.phase {
            Phase::Reading { .. } => {
                store.phase = Phase::Idle;
                Ok(())
            }
            _ => Err(EngineError::WrongUsage),
        }
    }

    fn start_data_write(&self, ctx: TunnelContext) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        if store.phase != Phase::Idle {
            return Err(EngineError::WrongUsage);
        }
        store.phase = Phase::Writing;
        Ok(())
    }

    fn insert_item(&self, ctx: TunnelContext, data: &str) -> EngineResult<ItemId> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        if store.phase != Phase::Writing {
            return Err(EngineError::WrongUsage);
        }
        store.next_id += 1;
        let id = format!("item-{}", store.next_id);
        store.items.insert(
            id.clone(),
            StoreItem {
                data: data.to_string(),
                parent: None,
            },
        );
        Ok(ItemId::new(id))
    }

    fn update_item(&self, ctx: TunnelContext, data: &str, id: &ItemId) -> EngineResult<ItemId> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        if store.phase != Phase::Writing {
            return Err(EngineError::WrongUsage);
        }
        let item = store.items.get_mut(&id.item).ok_or(EngineError::NotFound)?;
        item.data = data.to_string();
        Ok(id.clone())
    }

    fn move_item(&self, ctx: TunnelContext, id: &ItemId, new_parent: &str) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        if store.phase != Phase::Writing {
            return Err(EngineError::WrongUsage);
        }
        let item = store.items.get_mut(&id.item).ok_or(EngineError::NotFound)?;
        item.parent = if new_parent.is_empty() {
            None
        } else {
            Some(new_parent.to_string())
        };
        Ok(())
    }

    fn delete_item(&self, ctx: TunnelContext, id: &ItemId) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        if store.phase != Phase::Writing {
            return Err(EngineError::WrongUsage);
        }
        store
            .items
            .remove(&id.item)
            .map(|_| ())
            .ok_or(EngineError::NotFound)
    }

    fn end_data_write(&self, ctx: TunnelContext, success: bool) -> EngineResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let store = inner.tunnel(ctx);
        if store.phase != Phase::Writing {
            return Err(EngineError::WrongUsage);
        }
        store.phase = Phase::Idle;
        if success {
            store.token += 1;
        }
        Ok(store.token_string())
    }

    fn read_next_item_as_key(
        &self,
        ctx: TunnelContext,
        item_key: KeyHandle,
        first: bool,
    ) -> EngineResult<Option<(ItemId, ItemChange)>> {
        let Some(item) = self.read_next_item(ctx, first)? else {
            return Ok(None);
        };
        self.set_value(item_key, "DATA", ValueType::Text, item.data.as_bytes())?;
        Ok(Some((item.id, item.change)))
    }

    fn read_item_as_key(
        &self,
        ctx: TunnelContext,
        id: &ItemId,
        item_key: KeyHandle,
    ) -> EngineResult<()> {
        let data = self.read_item(ctx, id)?;
        self.set_value(item_key, "DATA", ValueType::Text, data.as_bytes())
    }

    fn insert_item_as_key(&self, ctx: TunnelContext, item_key: KeyHandle) -> EngineResult<ItemId> {
        let data = self.get_str_value(item_key, "DATA")?;
        self.insert_item(ctx, &data)
    }

    fn update_item_as_key(
        &self,
        ctx: TunnelContext,
        item_key: KeyHandle,
        id: &ItemId,
    ) -> EngineResult<ItemId> {
        let data = self.get_str_value(item_key, "DATA")?;
        self.update_item(ctx, &data, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn open_root(engine: &MockEngine) -> KeyHandle {
        engine
            .open_key_by_path(None, "/", OpenMode::ReadWrite)
            .unwrap()
    }

    // --- Engine configuration ---

    #[test]
    fn init_engine_xml_records_config() {
        let engine = MockEngine::new();
        engine.init_engine_xml("<sysync/>").unwrap();
        assert_eq!(engine.config_xml().as_deref(), Some("<sysync/>"));
    }

    #[test]
    fn init_engine_xml_empty_means_no_config() {
        let engine = MockEngine::new();
        engine.init_engine_xml("").unwrap();
        assert!(engine.config_xml().is_none());
    }

    #[test]
    fn init_engine_file_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.xml");
        std::fs::write(&path, "<sysync><client/></sysync>").unwrap();

        let engine = MockEngine::new();
        engine.init_engine_file(&path).unwrap();
        assert_eq!(
            engine.config_xml().as_deref(),
            Some("<sysync><client/></sysync>")
        );
    }

    #[test]
    fn init_engine_file_missing_is_no_config() {
        let engine = MockEngine::new();
        let err = engine
            .init_engine_file(Path::new("/nonexistent/engine.xml"))
            .unwrap_err();
        assert_eq!(err, EngineError::NoConfig);
    }

    #[test]
    fn init_engine_reader_streams_config() {
        let engine = MockEngine::new();
        let mut reader = Cursor::new(b"<sysync/>".to_vec());
        engine.init_engine_reader(&mut reader).unwrap();
        assert_eq!(engine.config_xml().as_deref(), Some("<sysync/>"));
    }

    #[test]
    fn set_string_mode_is_recorded() {
        let engine = MockEngine::new();
        let mode = StringMode {
            charset: engine_types::Charset::Utf16,
            line_ends: engine_types::LineEndMode::Dos,
            big_endian: true,
        };
        engine.set_string_mode(mode).unwrap();
        assert_eq!(engine.string_mode(), mode);
    }

    // --- Settings keys ---

    #[test]
    fn open_key_by_path_creates_components_read_write() {
        let engine = MockEngine::new();
        let key = engine
            .open_key_by_path(None, "/profiles/default", OpenMode::ReadWrite)
            .unwrap();
        engine.set_str_value(key, "server", "https://sync.example.org").unwrap();
        assert_eq!(
            engine.get_str_value(key, "server").unwrap(),
            "https://sync.example.org"
        );
    }

    #[test]
    fn open_key_by_path_read_only_missing_fails() {
        let engine = MockEngine::new();
        let err = engine
            .open_key_by_path(None, "/profiles/default", OpenMode::ReadOnly)
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound);
    }

    #[test]
    fn relative_open_from_parent_key() {
        let engine = MockEngine::new();
        let profiles = engine
            .open_key_by_path(None, "/profiles", OpenMode::ReadWrite)
            .unwrap();
        let default = engine
            .open_key_by_path(Some(profiles), "default", OpenMode::ReadWrite)
            .unwrap();
        engine.set_u32_value(default, "interval", 900).unwrap();

        let absolute = engine
            .open_key_by_path(None, "/profiles/default", OpenMode::ReadOnly)
            .unwrap();
        assert_eq!(engine.get_u32_value(absolute, "interval").unwrap(), 900);
    }

    #[test]
    fn typed_accessors_roundtrip() {
        let engine = MockEngine::new();
        let key = open_root(&engine);
        engine.set_u8_value(key, "small", 7).unwrap();
        engine.set_u16_value(key, "medium", 512).unwrap();
        engine.set_u32_value(key, "large", 100_000).unwrap();
        engine.set_str_value(key, "name", "sync-host").unwrap();

        assert_eq!(engine.get_u8_value(key, "small").unwrap(), 7);
        assert_eq!(engine.get_i8_value(key, "small").unwrap(), 7);
        assert_eq!(engine.get_u16_value(key, "medium").unwrap(), 512);
        assert_eq!(engine.get_u32_value(key, "large").unwrap(), 100_000);
        assert_eq!(engine.get_i32_value(key, "large").unwrap(), 100_000);
        assert_eq!(engine.get_str_value(key, "name").unwrap(), "sync-host");
    }

    #[test]
    fn int_read_as_text_converts() {
        let engine = MockEngine::new();
        let key = open_root(&engine);
        engine.set_u32_value(key, "count", 42).unwrap();
        assert_eq!(engine.get_str_value(key, "count").unwrap(), "42");
    }

    #[test]
    fn missing_value_is_not_found() {
        let engine = MockEngine::new();
        let key = open_root(&engine);
        let err = engine.get_str_value(key, "absent").unwrap_err();
        assert_eq!(err, EngineError::NotFound);
    }

    #[test]
    fn write_to_read_only_key_is_forbidden() {
        let engine = MockEngine::new();
        let rw = engine
            .open_key_by_path(None, "/settings", OpenMode::ReadWrite)
            .unwrap();
        engine.set_u32_value(rw, "n", 1).unwrap();
        let ro = engine
            .open_key_by_path(None, "/settings", OpenMode::ReadOnly)
            .unwrap();
        let err = engine.set_u32_value(ro, "n", 2).unwrap_err();
        assert_eq!(err, EngineError::Forbidden);
        // The read side still works.
        assert_eq!(engine.get_u32_value(ro, "n").unwrap(), 1);
    }

    #[test]
    fn set_value_too_small_for_fixed_type() {
        let engine = MockEngine::new();
        let key = open_root(&engine);
        let err = engine
            .set_value(key, "n", ValueType::Int32, &[1, 2])
            .unwrap_err();
        assert_eq!(err, EngineError::BufferTooSmall);
        assert_eq!(engine.get_value(key, "n", ValueType::Int32).unwrap_err(), EngineError::NotFound);
    }

    #[test]
    fn overlong_text_is_stored_truncated() {
        let engine = MockEngine::new();
        let key = open_root(&engine);
        let long = "x".repeat(MAX_TEXT + 100);
        let err = engine.set_str_value(key, "note", &long).unwrap_err();
        assert_eq!(err, EngineError::Truncated);
        assert_eq!(engine.get_str_value(key, "note").unwrap().len(), MAX_TEXT);
    }

    #[test]
    fn value_id_access_and_valname_flag() {
        let engine = MockEngine::new();
        let key = open_root(&engine);
        engine.set_str_value(key, "server", "example.org").unwrap();

        let id = engine.value_id(key, "server").unwrap();
        let same = engine.value_id(key, "server").unwrap();
        assert_eq!(id, same);

        let by_id = engine.get_value_by_id(key, id, 0, ValueType::Text).unwrap();
        assert_eq!(by_id, b"example.org");

        let flag = engine.value_id(key, ".FLAG.VALNAME").unwrap();
        let name = engine
            .get_value_by_id(key, id.with_flag(flag), 0, ValueType::Text)
            .unwrap();
        assert_eq!(name, b"server");

        engine
            .set_value_by_id(key, id, 0, ValueType::Text, b"other.org")
            .unwrap();
        assert_eq!(engine.get_str_value(key, "server").unwrap(), "other.org");
    }

    #[test]
    fn array_index_out_of_range() {
        let engine = MockEngine::new();
        let key = open_root(&engine);
        engine.set_str_value(key, "v", "x").unwrap();
        let id = engine.value_id(key, "v").unwrap();
        let err = engine
            .get_value_by_id(key, id, 1, ValueType::Text)
            .unwrap_err();
        assert_eq!(err, EngineError::OutOfRange);
    }

    #[test]
    fn subkey_iteration_and_ids() {
        let engine = MockEngine::new();
        let parent = engine
            .open_key_by_path(None, "/profiles", OpenMode::ReadWrite)
            .unwrap();
        for name in ["a", "b", "c"] {
            let sub = engine
                .open_key_by_path(Some(parent), name, OpenMode::ReadWrite)
                .unwrap();
            engine.close_key(sub).unwrap();
        }

        let mut seen = Vec::new();
        let mut selector = SubkeySelector::First;
        while let Some(sub) = engine.open_subkey(parent, selector, OpenMode::ReadOnly).unwrap() {
            seen.push(engine.key_id(sub).unwrap());
            engine.close_key(sub).unwrap();
            selector = SubkeySelector::Next;
        }
        assert_eq!(seen.len(), 3);

        // IDs re-open the same subkey.
        let reopened = engine
            .open_subkey(parent, SubkeySelector::ById(seen[1]), OpenMode::ReadOnly)
            .unwrap()
            .unwrap();
        assert_eq!(engine.key_id(reopened).unwrap(), seen[1]);
    }

    #[test]
    fn new_subkey_and_delete() {
        let engine = MockEngine::new();
        let parent = open_root(&engine);
        let sub = engine
            .open_subkey(parent, SubkeySelector::New, OpenMode::ReadWrite)
            .unwrap()
            .unwrap();
        let id = engine.key_id(sub).unwrap();
        engine.close_key(sub).unwrap();

        engine.delete_subkey(parent, id).unwrap();
        let err = engine
            .open_subkey(parent, SubkeySelector::ById(id), OpenMode::ReadOnly)
            .unwrap_err();
        assert_eq!(err, EngineError::NotFound);
    }

    #[test]
    fn closed_key_handle_is_stale() {
        let engine = MockEngine::new();
        let key = open_root(&engine);
        engine.close_key(key).unwrap();
        assert_eq!(engine.close_key(key).unwrap_err(), EngineError::BadHandle);
        assert_eq!(
            engine.get_str_value(key, "x").unwrap_err(),
            EngineError::BadHandle
        );
    }

    // --- Sessions ---

    #[test]
    fn scripted_session_steps_replay() {
        let engine = MockEngine::new();
        engine.script_steps([
            SessionStep::directive(StepDirective::SendData),
            SessionStep::directive(StepDirective::NeedData),
            SessionStep::directive(StepDirective::Done),
        ]);
        let session = engine.open_session(0, Some("test")).unwrap();

        let s1 = engine.session_step(session, StepCommand::ClientStart).unwrap();
        assert_eq!(s1.directive, StepDirective::SendData);
        let s2 = engine.session_step(session, StepCommand::SentData).unwrap();
        assert_eq!(s2.directive, StepDirective::NeedData);
        let s3 = engine.session_step(session, StepCommand::GotData).unwrap();
        assert_eq!(s3.directive, StepDirective::Done);
        // Exhausted script keeps reporting Done.
        let s4 = engine.session_step(session, StepCommand::Step).unwrap();
        assert_eq!(s4.directive, StepDirective::Done);
    }

    #[test]
    fn abort_ends_session_immediately() {
        let engine = MockEngine::new();
        engine.script_steps([SessionStep::directive(StepDirective::SendData)]);
        let session = engine.open_session(0, None).unwrap();
        let step = engine.session_step(session, StepCommand::Abort).unwrap();
        assert_eq!(step.directive, StepDirective::Done);
    }

    #[test]
    fn send_data_fills_read_buffer_chunked() {
        let engine = MockEngine::new();
        engine.script_steps([SessionStep::directive(StepDirective::SendData)]);
        engine.queue_outgoing(b"<SyncML>abcdef</SyncML>".to_vec());
        let session = engine.open_session(0, None).unwrap();
        engine.session_step(session, StepCommand::ClientStart).unwrap();

        let mut buf = [0u8; 10];
        let first = engine.read_syncml_buffer(session, &mut buf).unwrap();
        assert_eq!(first.read, 10);
        assert_eq!(first.message_size, 23);
        let mut rest = [0u8; 32];
        let second = engine.read_syncml_buffer(session, &mut rest).unwrap();
        assert_eq!(second.read, 13);
        assert_eq!(second.message_size, 23);
    }

    #[test]
    fn read_buffer_without_assembled_message_is_wrong_usage() {
        let engine = MockEngine::new();
        let session = engine.open_session(0, None).unwrap();
        let mut buf = [0u8; 8];
        let err = engine.read_syncml_buffer(session, &mut buf).unwrap_err();
        assert_eq!(err, EngineError::WrongUsage);
    }

    #[test]
    fn written_messages_are_recorded() {
        let engine = MockEngine::new();
        let session = engine.open_session(0, None).unwrap();
        engine.write_syncml_buffer(session, b"msg-1").unwrap();
        engine.write_syncml_buffer(session, b"msg-2").unwrap();
        assert_eq!(
            engine.written_messages(session),
            vec![b"msg-1".to_vec(), b"msg-2".to_vec()]
        );
    }

    #[test]
    fn session_key_must_close_before_session() {
        let engine = MockEngine::new();
        let session = engine.open_session(0, None).unwrap();
        let key = engine
            .open_session_key(Some(session), OpenMode::ReadWrite)
            .unwrap();

        let err = engine.close_session(session).unwrap_err();
        assert_eq!(err, EngineError::WrongUsage);

        engine.close_key(key).unwrap();
        engine.close_session(session).unwrap();
        assert_eq!(engine.open_session_count(), 0);
    }

    #[test]
    fn session_key_values_are_per_session() {
        let engine = MockEngine::new();
        let s1 = engine.open_session(0, None).unwrap();
        let s2 = engine.open_session(0, None).unwrap();
        let k1 = engine.open_session_key(Some(s1), OpenMode::ReadWrite).unwrap();
        let k2 = engine.open_session_key(Some(s2), OpenMode::ReadWrite).unwrap();

        engine.set_str_value(k1, "user", "alice").unwrap();
        assert_eq!(
            engine.get_str_value(k2, "user").unwrap_err(),
            EngineError::NotFound
        );
    }

    #[test]
    fn implicit_session_context_uses_latest_session() {
        let engine = MockEngine::new();
        let _s1 = engine.open_session(0, None).unwrap();
        let s2 = engine.open_session(0, None).unwrap();
        let key = engine.open_session_key(None, OpenMode::ReadWrite).unwrap();
        engine.set_str_value(key, "who", "second").unwrap();

        let direct = engine.open_session_key(Some(s2), OpenMode::ReadOnly).unwrap();
        assert_eq!(engine.get_str_value(direct, "who").unwrap(), "second");
    }

    #[test]
    fn open_session_key_without_sessions_is_wrong_usage() {
        let engine = MockEngine::new();
        let err = engine
            .open_session_key(None, OpenMode::ReadWrite)
            .unwrap_err();
        assert_eq!(err, EngineError::WrongUsage);
    }

    #[test]
    fn injected_failure_hits_next_open() {
        let engine = MockEngine::new();
        engine.fail_next_open(EngineError::Expired);
        let err = engine.open_session(0, None).unwrap_err();
        assert_eq!(err, EngineError::Expired);
        // One-shot: the next open succeeds.
        engine.open_session(0, None).unwrap();
    }

    // --- Tunnel interface ---

    fn ctx() -> TunnelContext {
        TunnelContext::from_raw(0x77)
    }

    fn populate(engine: &MockEngine, items: &[&str]) -> Vec<ItemId> {
        engine.start_data_write(ctx()).unwrap();
        let ids = items
            .iter()
            .map(|data| engine.insert_item(ctx(), data).unwrap())
            .collect();
        engine.end_data_write(ctx(), true).unwrap();
        ids
    }

    #[test]
    fn tunnel_write_then_read_cycle() {
        let engine = MockEngine::new();
        let ids = populate(&engine, &["BEGIN:VCARD a", "BEGIN:VCARD b"]);
        assert_eq!(engine.tunnel_item_count(ctx()), 2);

        engine.start_data_read(ctx(), "", "").unwrap();
        let first = engine.read_next_item(ctx(), true).unwrap().unwrap();
        assert_eq!(first.id, ids[0]);
        assert_eq!(first.change, ItemChange::Changed);
        let second = engine.read_next_item(ctx(), false).unwrap().unwrap();
        assert_eq!(second.id, ids[1]);
        assert!(engine.read_next_item(ctx(), false).unwrap().is_none());
        engine.end_data_read(ctx()).unwrap();
    }

    #[test]
    fn unchanged_classification_with_current_token() {
        let engine = MockEngine::new();
        populate(&engine, &["x"]);

        engine.start_data_write(ctx()).unwrap();
        let token = engine.end_data_write(ctx(), true).unwrap();

        engine.start_data_read(ctx(), &token, "").unwrap();
        let item = engine.read_next_item(ctx(), true).unwrap().unwrap();
        assert_eq!(item.change, ItemChange::Unchanged);
        engine.end_data_read(ctx()).unwrap();
    }

    #[test]
    fn stale_token_classifies_changed() {
        let engine = MockEngine::new();
        let _ = populate(&engine, &["x"]);
        let stale = engine.start_data_write(ctx()).and_then(|_| {
            engine.end_data_write(ctx(), true)
        }).unwrap();
        // Another successful write phase advances the token.
        populate(&engine, &["y"]);

        engine.start_data_read(ctx(), &stale, "").unwrap();
        let item = engine.read_next_item(ctx(), true).unwrap().unwrap();
        assert_eq!(item.change, ItemChange::Changed);
        engine.end_data_read(ctx()).unwrap();
    }

    #[test]
    fn resume_token_classifies_resumed() {
        let engine = MockEngine::new();
        populate(&engine, &["x"]);
        engine.start_data_read(ctx(), "", "suspend-3").unwrap();
        let item = engine.read_next_item(ctx(), true).unwrap().unwrap();
        assert_eq!(item.change, ItemChange::Resumed);
        engine.end_data_read(ctx()).unwrap();
    }

    #[test]
    fn failed_write_phase_keeps_token() {
        let engine = MockEngine::new();
        engine.start_data_write(ctx()).unwrap();
        engine.insert_item(ctx(), "a").unwrap();
        let t1 = engine.end_data_write(ctx(), true).unwrap();

        engine.start_data_write(ctx()).unwrap();
        engine.insert_item(ctx(), "b").unwrap();
        let t2 = engine.end_data_write(ctx(), false).unwrap();
        assert_eq!(t1, t2);
    }

    #[test]
    fn update_move_delete_items() {
        let engine = MockEngine::new();
        let ids = populate(&engine, &["original"]);

        engine.start_data_write(ctx()).unwrap();
        let updated = engine.update_item(ctx(), "updated", &ids[0]).unwrap();
        assert_eq!(updated, ids[0]);
        engine.move_item(ctx(), &ids[0], "folder-9").unwrap();
        engine.end_data_write(ctx(), true).unwrap();

        assert_eq!(engine.read_item(ctx(), &ids[0]).unwrap(), "updated");
        engine.start_data_read(ctx(), "", "").unwrap();
        let item = engine.read_next_item(ctx(), true).unwrap().unwrap();
        assert_eq!(item.id.parent.as_deref(), Some("folder-9"));
        engine.end_data_read(ctx()).unwrap();

        engine.start_data_write(ctx()).unwrap();
        engine.delete_item(ctx(), &ids[0]).unwrap();
        assert_eq!(
            engine.delete_item(ctx(), &ids[0]).unwrap_err(),
            EngineError::NotFound
        );
        engine.end_data_write(ctx(), true).unwrap();
        assert_eq!(engine.tunnel_item_count(ctx()), 0);
    }

    #[test]
    fn phase_violations_are_wrong_usage() {
        let engine = MockEngine::new();
        assert_eq!(
            engine.read_next_item(ctx(), true).unwrap_err(),
            EngineError::WrongUsage
        );
        assert_eq!(
            engine.insert_item(ctx(), "x").unwrap_err(),
            EngineError::WrongUsage
        );
        engine.start_data_read(ctx(), "", "").unwrap();
        assert_eq!(
            engine.start_data_write(ctx()).unwrap_err(),
            EngineError::WrongUsage
        );
        assert_eq!(
            engine.end_data_write(ctx(), true).unwrap_err(),
            EngineError::WrongUsage
        );
        engine.end_data_read(ctx()).unwrap();
    }

    #[test]
    fn as_key_variants_exchange_data_through_key() {
        let engine = MockEngine::new();
        let item_key = open_root(&engine);

        // Insert through the key.
        engine
            .set_str_value(item_key, "DATA", "BEGIN:VCALENDAR")
            .unwrap();
        engine.start_data_write(ctx()).unwrap();
        let id = engine.insert_item_as_key(ctx(), item_key).unwrap();
        engine.end_data_write(ctx(), true).unwrap();

        // Read back through the key.
        engine.start_data_read(ctx(), "", "").unwrap();
        let (read_id, change) = engine
            .read_next_item_as_key(ctx(), item_key, true)
            .unwrap()
            .unwrap();
        assert_eq!(read_id, id);
        assert_eq!(change, ItemChange::Changed);
        assert_eq!(
            engine.get_str_value(item_key, "DATA").unwrap(),
            "BEGIN:VCALENDAR"
        );
        engine.end_data_read(ctx()).unwrap();

        // Update through the key.
        engine.set_str_value(item_key, "DATA", "updated").unwrap();
        engine.start_data_write(ctx()).unwrap();
        engine.update_item_as_key(ctx(), item_key, &id).unwrap();
        engine.end_data_write(ctx(), true).unwrap();
        assert_eq!(engine.read_item(ctx(), &id).unwrap(), "updated");

        // read_item_as_key fills the key.
        engine.set_str_value(item_key, "DATA", "cleared").unwrap();
        engine.read_item_as_key(ctx(), &id, item_key).unwrap();
        assert_eq!(engine.get_str_value(item_key, "DATA").unwrap(), "updated");
    }
}
