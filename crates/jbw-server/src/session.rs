//! Server-side client sessions.

use std::sync::Mutex;

use jbw_agent::AgentState;
use jbw_core::{AgentId, ClientId, Permissions, Tick};
use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, Notify};

/// `Handshaking -> Ready -> {Closing, Lost}`. `Lost` keeps the
/// session record around — owned agents and permissions survive — until
/// an explicit removal or a RECONNECT with the same `client_id` moves it
/// back to `Ready`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SessionStatus {
    Handshaking,
    Ready,
    Closing,
    Lost,
}

/// One frame queued for a session's writer half. The broadcaster and the
/// request dispatcher both push onto the same outbound queue so STEP
/// frames and request responses interleave in submission order on the
/// wire, never racing each other for the socket.
pub type OutboundTx = mpsc::UnboundedSender<Vec<u8>>;

/// A live client session: the persistent part ([`jbw_core::SessionRecord`]'s
/// fields, here each independently locked) plus the runtime-only
/// connection state that doesn't survive a snapshot.
pub struct Session {
    pub client_id: ClientId,
    pub owned_agent_ids: Mutex<Vec<AgentId>>,
    pub permissions: Mutex<Permissions>,
    pub status: Mutex<SessionStatus>,
    /// Set by the step observer, drained by the broadcaster.
    pending_step: Mutex<Option<(Tick, Vec<(AgentId, AgentState)>)>>,
    /// `None` once the socket is gone (`Lost`) — the writer half was
    /// dropped along with the connection task.
    outbound: Mutex<Option<OutboundTx>>,
}

impl Session {
    pub fn new(client_id: ClientId, outbound: OutboundTx) -> Self {
        Session {
            client_id,
            owned_agent_ids: Mutex::new(Vec::new()),
            permissions: Mutex::new(Permissions::default()),
            status: Mutex::new(SessionStatus::Handshaking),
            pending_step: Mutex::new(None),
            outbound: Mutex::new(Some(outbound)),
        }
    }

    /// Rebuild a session restored from a snapshot: it starts
    /// `Lost` since there is no live socket until its owner sends a
    /// matching RECONNECT.
    pub fn new_lost(client_id: ClientId, owned_agent_ids: Vec<AgentId>, permissions: Permissions) -> Self {
        Session {
            client_id,
            owned_agent_ids: Mutex::new(owned_agent_ids),
            permissions: Mutex::new(permissions),
            status: Mutex::new(SessionStatus::Lost),
            pending_step: Mutex::new(None),
            outbound: Mutex::new(None),
        }
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.lock().unwrap()
    }

    pub fn set_status(&self, status: SessionStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn owns(&self, agent: AgentId) -> bool {
        self.owned_agent_ids.lock().unwrap().contains(&agent)
    }

    pub fn add_owned_agent(&self, agent: AgentId) {
        let mut ids = self.owned_agent_ids.lock().unwrap();
        if !ids.contains(&agent) {
            ids.push(agent);
        }
    }

    pub fn remove_owned_agent(&self, agent: AgentId) {
        self.owned_agent_ids.lock().unwrap().retain(|&a| a != agent);
    }

    pub fn permissions(&self) -> Permissions {
        *self.permissions.lock().unwrap()
    }

    /// Re-bind a fresh socket's writer half on RECONNECT, moving the
    /// session back to `Ready` and resuming broadcasts to the new socket.
    pub fn rebind(&self, outbound: OutboundTx) {
        *self.outbound.lock().unwrap() = Some(outbound);
        self.set_status(SessionStatus::Ready);
    }

    /// Drop the writer half without forgetting the session (`Lost`) —
    /// owned agents and permissions are kept for a future RECONNECT.
    pub fn mark_lost(&self) {
        *self.outbound.lock().unwrap() = None;
        self.set_status(SessionStatus::Lost);
    }

    /// Best-effort send; a socket that's gone or whose receiver was
    /// dropped is silently skipped — the session is already `Lost` or
    /// about to be marked so by the connection task's own error path.
    pub fn send(&self, frame: Vec<u8>) {
        if let Some(tx) = self.outbound.lock().unwrap().as_ref() {
            let _ = tx.send(frame);
        }
    }

    pub fn set_pending_step(&self, tick: Tick, agents: Vec<(AgentId, AgentState)>) {
        *self.pending_step.lock().unwrap() = Some((tick, agents));
    }

    pub fn take_pending_step(&self) -> Option<(Tick, Vec<(AgentId, AgentState)>)> {
        self.pending_step.lock().unwrap().take()
    }
}

/// All sessions the server has ever accepted a CONNECT for, live or
/// `Lost`. Client ids are never reused, so lookups by id are stable
/// across the table's lifetime.
#[derive(Default)]
pub struct SessionTable {
    sessions: Mutex<FxHashMap<ClientId, std::sync::Arc<Session>>>,
    next_client_id: Mutex<u64>,
    /// Woken once per tick by the step observer so the broadcaster
    /// doesn't need to poll.
    pub step_notify: Notify,
}

impl SessionTable {
    pub fn new() -> Self {
        SessionTable { sessions: Mutex::new(FxHashMap::default()), next_client_id: Mutex::new(0), step_notify: Notify::new() }
    }

    /// Rebuild the table from a snapshot's session records.
    /// Every restored session starts `Lost` — there is no live socket to
    /// resume until its owner reconnects — and `next_client_id` is
    /// advanced past the highest restored id so a freshly `CONNECT`ing
    /// client never collides with one.
    pub fn from_records(records: Vec<jbw_core::SessionRecord>) -> Self {
        let mut next = 0u64;
        let mut sessions = FxHashMap::default();
        for rec in records {
            next = next.max(rec.client_id.get() + 1);
            let session = std::sync::Arc::new(Session::new_lost(rec.client_id, rec.owned_agent_ids, rec.permissions));
            sessions.insert(rec.client_id, session);
        }
        SessionTable { sessions: Mutex::new(sessions), next_client_id: Mutex::new(next), step_notify: Notify::new() }
    }

    pub fn create(&self, outbound: OutboundTx) -> std::sync::Arc<Session> {
        let mut next = self.next_client_id.lock().unwrap();
        let client_id = ClientId(*next);
        *next += 1;
        drop(next);
        let session = std::sync::Arc::new(Session::new(client_id, outbound));
        self.sessions.lock().unwrap().insert(client_id, session.clone());
        session
    }

    pub fn get(&self, client_id: ClientId) -> Option<std::sync::Arc<Session>> {
        self.sessions.lock().unwrap().get(&client_id).cloned()
    }

    pub fn remove(&self, client_id: ClientId) {
        self.sessions.lock().unwrap().remove(&client_id);
    }

    pub fn all(&self) -> Vec<std::sync::Arc<Session>> {
        self.sessions.lock().unwrap().values().cloned().collect()
    }

    /// Snapshot every session's persistent fields for `jbw-snapshot`'s
    /// session-table.
    pub fn to_records(&self) -> Vec<jbw_core::SessionRecord> {
        let mut out: Vec<_> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .map(|s| jbw_core::SessionRecord {
                client_id: s.client_id,
                owned_agent_ids: s.owned_agent_ids.lock().unwrap().clone(),
                permissions: s.permissions(),
            })
            .collect();
        out.sort_by_key(|r| r.client_id.get());
        out
    }
}
