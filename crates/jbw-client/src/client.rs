//! Single-socket client: one background reader task demultiplexes
//! frames by sequence number onto pending call futures; the public API
//! reads as synchronous calls over that async transport. STEP frames
//! (`seq == 0`) never consume a pending-call slot — they go to a
//! separate `on_step` callback instead.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use jbw_agent::AgentState;
use jbw_core::{AgentId, ClientId, Direction, Position, Status, Tick, TurnDirection, WorldConfig};
use jbw_proto::frame::{encode_frame, read_frame};
use jbw_proto::response::PatchState;
use jbw_proto::{Request, Response};
use rustc_hash::FxHashMap;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{ClientError, ClientResult};

/// Called from the reader task for every STEP broadcast, carrying
/// the new tick and the states of every agent this client owns. Runs on
/// the reader task — keep it quick, it blocks further frame dispatch.
pub type StepCallback = Box<dyn Fn(Tick, Vec<(AgentId, AgentState)>) + Send + Sync>;

type PendingMap = Arc<Mutex<FxHashMap<u64, oneshot::Sender<ClientResult<Response>>>>>;

/// What CONNECT or RECONNECT hands back once the handshake completes.
pub struct HandshakeInfo {
    pub client_id: ClientId,
    pub current_time: u64,
    /// `None` on RECONNECT — the wire protocol's RECONNECT response
    /// doesn't carry the config, only CONNECT's does.
    pub config: Option<Box<WorldConfig>>,
    /// Owned agents' states as of `current_time` (empty on a fresh
    /// CONNECT, populated on a resumed RECONNECT).
    pub agents: Vec<(AgentId, AgentState)>,
}

pub struct JbwClient {
    client_id: ClientId,
    out_tx: mpsc::UnboundedSender<Vec<u8>>,
    pending: PendingMap,
    next_seq: AtomicU64,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl JbwClient {
    /// Open a fresh session: connect, send CONNECT, wait for its
    /// response.
    pub async fn connect(addr: impl Into<SocketAddr>, on_step: StepCallback) -> ClientResult<(Self, HandshakeInfo)> {
        let stream = TcpStream::connect(addr.into()).await?;
        Self::handshake(stream, Request::Connect, on_step).await
    }

    /// Resume a session the server still holds as `Lost`,
    /// recovering its owned agents' states without losing them.
    pub async fn reconnect(
        addr: impl Into<SocketAddr>,
        client_id: ClientId,
        on_step: StepCallback,
    ) -> ClientResult<(Self, HandshakeInfo)> {
        let stream = TcpStream::connect(addr.into()).await?;
        Self::handshake(stream, Request::Reconnect { client_id }, on_step).await
    }

    async fn handshake(stream: TcpStream, first: Request, on_step: StepCallback) -> ClientResult<(Self, HandshakeInfo)> {
        stream.set_nodelay(true).ok();
        let (reader_half, writer_half) = tokio::io::split(stream);
        let pending: PendingMap = Arc::new(Mutex::new(FxHashMap::default()));
        let (out_tx, out_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let writer = tokio::spawn(writer_loop(writer_half, out_rx));
        let reader = tokio::spawn(reader_loop(reader_half, pending.clone(), Arc::new(on_step)));

        // The handshake frame is seq 1; every later call keeps counting
        // up from there so no two in-flight calls on this client ever
        // collide on the same key in `pending`.
        let next_seq = AtomicU64::new(2);
        let (tx, rx) = oneshot::channel();
        pending.lock().unwrap().insert(1, tx);
        let frame = encode_frame(1, first.tag(), &first.encode_body())?;
        out_tx.send(frame).map_err(|_| ClientError::LostConnection)?;
        let resp = rx.await.map_err(|_| ClientError::LostConnection)??;

        let info = match resp {
            Response::Connect { client_id, config, current_time } => {
                HandshakeInfo { client_id, current_time, config: Some(config), agents: Vec::new() }
            }
            Response::Reconnect { current_time, agents } => {
                let Request::Reconnect { client_id } = first else { unreachable!() };
                HandshakeInfo { client_id, current_time, config: None, agents }
            }
            _ => return Err(ClientError::UnexpectedResponse),
        };

        let client = JbwClient { client_id: info.client_id, out_tx, pending, next_seq, reader, writer };
        Ok((client, info))
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Abort the reader and writer tasks and fail every call still
    /// pending with `LostConnection`, the way a real connection loss
    /// would (grounded on the gateway's own shutdown sequence: abort the
    /// background tasks, then await them to surface any panic).
    pub async fn close(self) {
        self.reader.abort();
        self.writer.abort();
        for (_, tx) in self.pending.lock().unwrap().drain() {
            let _ = tx.send(Err(ClientError::LostConnection));
        }
        let _ = self.reader.await;
        let _ = self.writer.await;
    }

    fn call(&self, req: Request) -> Pin<Box<dyn Future<Output = ClientResult<Response>> + Send + '_>> {
        Box::pin(async move {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().insert(seq, tx);
            let frame = match encode_frame(seq, req.tag(), &req.encode_body()) {
                Ok(f) => f,
                Err(e) => {
                    self.pending.lock().unwrap().remove(&seq);
                    return Err(e.into());
                }
            };
            if self.out_tx.send(frame).is_err() {
                self.pending.lock().unwrap().remove(&seq);
                return Err(ClientError::LostConnection);
            }
            rx.await.map_err(|_| ClientError::LostConnection)?
        })
    }

    pub async fn add_agent(&self) -> ClientResult<(AgentId, AgentState)> {
        match self.call(Request::AddAgent).await? {
            Response::AddAgent { status, agent_id, agent_state } => {
                status_ok(status)?;
                Ok((agent_id, agent_state))
            }
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn remove_agent(&self, agent_id: AgentId) -> ClientResult<()> {
        match self.call(Request::RemoveAgent { agent_id }).await? {
            Response::RemoveAgent { status } => status_ok(status),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn move_agent(&self, agent_id: AgentId, dir: Direction, steps: u32) -> ClientResult<()> {
        match self.call(Request::Move { agent_id, dir, steps }).await? {
            Response::Move { status } => status_ok(status),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn turn(&self, agent_id: AgentId, turn: TurnDirection) -> ClientResult<()> {
        match self.call(Request::Turn { agent_id, turn }).await? {
            Response::Turn { status } => status_ok(status),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn no_op(&self, agent_id: AgentId) -> ClientResult<()> {
        match self.call(Request::NoOp { agent_id }).await? {
            Response::NoOp { status } => status_ok(status),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_map(&self, bl: Position, tr: Position, include_scent: bool) -> ClientResult<Vec<PatchState>> {
        match self.call(Request::GetMap { bl, tr, include_scent }).await? {
            Response::GetMap { status, patches } => {
                status_ok(status)?;
                Ok(patches)
            }
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_agent_ids(&self) -> ClientResult<Vec<AgentId>> {
        match self.call(Request::GetAgentIds).await? {
            Response::GetAgentIds { status, agent_ids } => {
                status_ok(status)?;
                Ok(agent_ids)
            }
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_agent_states(&self, agent_ids: Vec<AgentId>) -> ClientResult<Vec<AgentState>> {
        match self.call(Request::GetAgentStates { agent_ids }).await? {
            Response::GetAgentStates { status, agent_states } => {
                status_ok(status)?;
                Ok(agent_states)
            }
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn set_active(&self, agent_id: AgentId, active: bool) -> ClientResult<()> {
        match self.call(Request::SetActive { agent_id, active }).await? {
            Response::SetActive { status } => status_ok(status),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn is_active(&self, agent_id: AgentId) -> ClientResult<bool> {
        match self.call(Request::IsActive { agent_id }).await? {
            Response::IsActive { status, active } => {
                status_ok(status)?;
                Ok(active)
            }
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

fn status_ok(status: Status) -> ClientResult<()> {
    if status == Status::Ok { Ok(()) } else { Err(ClientError::Remote(status)) }
}

async fn writer_loop(mut writer: impl AsyncWrite + Unpin, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(frame) = rx.recv().await {
        if writer.write_all(&frame).await.is_err() {
            break;
        }
    }
}

async fn reader_loop(mut reader: impl AsyncRead + Unpin, pending: PendingMap, on_step: Arc<StepCallback>) {
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(frame)) if frame.seq == 0 => match Response::decode(frame.tag, &frame.body) {
                Ok(Response::Step { new_time, agents }) => on_step(Tick(new_time), agents),
                Ok(other) => tracing::warn!(?other, "unexpected seq=0 response"),
                Err(e) => tracing::warn!(error = %e, "malformed STEP frame"),
            },
            Ok(Some(frame)) => {
                let resolved = Response::decode(frame.tag, &frame.body).map_err(ClientError::from);
                if let Some(tx) = pending.lock().unwrap().remove(&frame.seq) {
                    let _ = tx.send(resolved);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "client connection read error");
                break;
            }
        }
    }
    for (_, tx) in pending.lock().unwrap().drain() {
        let _ = tx.send(Err(ClientError::LostConnection));
    }
}
