//! TCP front door: accepts connections, runs the CONNECT/RECONNECT
//! handshake, then hands each connection off to a read loop that feeds
//! [`crate::dispatch::handle`] and a write loop that drains its
//! session's outbound queue.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use jbw_core::{AgentId, JbwResult, Permissions, WorldConfig};
use jbw_proto::frame::{encode_frame, read_frame};
use jbw_proto::{Request, Response};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};

use crate::dispatch::{self, SimCore};
use crate::error::{ServerError, ServerResult};
use crate::session::{Session, SessionStatus, SessionTable};

/// Everything a freshly accepted connection needs to run the handshake
/// and then dispatch requests: the shared world/coordinator and the
/// session table every connection registers into.
pub struct JbwServer {
    pub core: Mutex<SimCore>,
    pub sessions: Arc<SessionTable>,
    default_permissions: Permissions,
}

impl JbwServer {
    pub fn new(config: WorldConfig, seed: u64, default_permissions: Permissions) -> JbwResult<Self> {
        let world = jbw_world::World::new(config)?;
        Ok(JbwServer { core: Mutex::new(SimCore::new(world, seed)), sessions: Arc::new(SessionTable::new()), default_permissions })
    }

    /// Write the world and live session table to `out`. Intended
    /// for a host binary to call before a planned `stop_server`, the way
    /// the original spec's snapshot format is meant to be used.
    pub fn save_snapshot<W: std::io::Write>(&self, out: &mut W) -> jbw_snapshot::SnapshotResult<()> {
        let core = self.core.lock().unwrap();
        let records = self.sessions.to_records();
        jbw_snapshot::write_with_sessions(&core.world, &records, out)
    }

    /// Rebuild a server from a prior `save_snapshot`. Every
    /// restored session starts `Lost`; its owner resumes it with
    /// RECONNECT against its original `client_id`.
    pub fn load_snapshot<R: std::io::Read>(
        input: &mut R,
        seed: u64,
        default_permissions: Permissions,
    ) -> jbw_snapshot::SnapshotResult<Self> {
        let (world, session_records) = jbw_snapshot::read(input)?;
        Ok(JbwServer {
            core: Mutex::new(SimCore::new(world, seed)),
            sessions: Arc::new(SessionTable::from_records(session_records)),
            default_permissions,
        })
    }

    /// Accept connections on `listener` until `shutdown_rx` observes a
    /// `true`. Also runs the per-tick STEP
    /// broadcaster for the lifetime of the server.
    pub async fn run(self: Arc<Self>, listener: TcpListener, mut shutdown_rx: watch::Receiver<bool>) -> ServerResult<()> {
        let broadcaster = tokio::spawn(broadcast_loop(self.sessions.clone(), shutdown_rx.clone()));

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, peer) = accepted?;
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(server, socket, peer).await {
                            tracing::warn!(%peer, error = %e, "connection ended with an error");
                        }
                    });
                }
                _ = shutdown_rx.changed() => {
                    tracing::info!("server shutting down: no longer accepting connections");
                    break;
                }
            }
        }

        let _ = broadcaster.await;
        Ok(())
    }
}

/// Signal every `JbwServer::run` watching `tx` to stop accepting
/// connections and let its broadcaster drain.
pub fn stop_server(tx: &watch::Sender<bool>) {
    let _ = tx.send(true);
}

async fn broadcast_loop(sessions: Arc<SessionTable>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = sessions.step_notify.notified() => {
                for session in sessions.all() {
                    let Some((tick, states)) = session.take_pending_step() else { continue };
                    let resp = Response::Step { new_time: tick.0, agents: states };
                    match encode_frame(0, resp.tag(), &resp.encode_body()) {
                        Ok(frame) => session.send(frame),
                        Err(e) => tracing::error!(error = %e, "failed to encode STEP frame"),
                    }
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }
}

async fn handle_connection(server: Arc<JbwServer>, socket: TcpStream, peer: SocketAddr) -> ServerResult<()> {
    let _ = socket.set_nodelay(true);
    let (mut reader, mut writer) = tokio::io::split(socket);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let Some(first) = read_frame(&mut reader).await? else { return Ok(()) };
    let session = match handshake(&server, first.seq, first.tag, &first.body, out_tx, peer)? {
        Some(session) => session,
        None => return Ok(()),
    };

    let writer_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if writer.write_all(&frame).await.is_err() {
                break;
            }
        }
    });

    let result = read_loop(&server, &session, &mut reader).await;
    session.mark_lost();

    let _ = writer_task.await;
    result
}

/// Consume the connection's first frame. `Ok(None)` means the socket was
/// closed or sent garbage and the caller should simply drop it — there is
/// no session yet to report a `Status` to.
fn handshake(
    server: &Arc<JbwServer>,
    seq: u64,
    tag: u8,
    body: &[u8],
    out_tx: mpsc::UnboundedSender<Vec<u8>>,
    peer: SocketAddr,
) -> ServerResult<Option<Arc<Session>>> {
    let req = match Request::decode(tag, body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(%peer, error = %e, "malformed handshake frame");
            return Ok(None);
        }
    };

    match req {
        Request::Connect => {
            let session = server.sessions.create(out_tx);
            *session.permissions.lock().unwrap() = server.default_permissions;
            session.set_status(SessionStatus::Ready);
            let (config, current_time) = {
                let core = server.core.lock().unwrap();
                (core.world.config.clone(), core.world.clock.0)
            };
            let resp = Response::Connect { client_id: session.client_id, config: Box::new(config), current_time };
            session.send(encode_frame(seq, resp.tag(), &resp.encode_body())?);
            Ok(Some(session))
        }
        Request::Reconnect { client_id } => {
            // An unknown client_id has no session to answer on and the
            // wire protocol's RECONNECT response carries no status field
            // — the binding decision here is to simply close the
            // socket rather than invent an out-of-band error frame.
            let Some(session) = server.sessions.get(client_id) else {
                tracing::warn!(%peer, client_id = client_id.get(), "reconnect to unknown client_id");
                return Ok(None);
            };
            session.rebind(out_tx);
            let agents = owned_agent_states(server, &session);
            let current_time = server.core.lock().unwrap().world.clock.0;
            let resp = Response::Reconnect { current_time, agents };
            session.send(encode_frame(seq, resp.tag(), &resp.encode_body())?);
            Ok(Some(session))
        }
        _ => {
            tracing::warn!(%peer, "first frame on a connection must be CONNECT or RECONNECT");
            Ok(None)
        }
    }
}

fn owned_agent_states(server: &Arc<JbwServer>, session: &Session) -> Vec<(AgentId, jbw_agent::AgentState)> {
    let owned = session.owned_agent_ids.lock().unwrap().clone();
    let core = server.core.lock().unwrap();
    owned.into_iter().filter_map(|id| core.world.agent_state(id).ok().map(|s| (id, s))).collect()
}

async fn read_loop(
    server: &Arc<JbwServer>,
    session: &Arc<Session>,
    reader: &mut (impl tokio::io::AsyncRead + Unpin),
) -> ServerResult<()> {
    loop {
        let Some(frame) = read_frame(reader).await? else { return Ok(()) };
        let req = match Request::decode(frame.tag, &frame.body) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(client_id = session.client_id.get(), error = %e, "malformed request, dropping frame");
                continue;
            }
        };
        if matches!(req, Request::Connect | Request::Reconnect { .. }) {
            tracing::warn!(client_id = session.client_id.get(), "unexpected handshake request mid-session");
            continue;
        }
        let resp = dispatch::handle(&server.core, &server.sessions, session, req);
        let bytes = encode_frame(frame.seq, resp.tag(), &resp.encode_body())
            .map_err(ServerError::from)?;
        session.send(bytes);
    }
}
