use std::time::Duration;

use jbw_core::{
    ClientId, DirectionPolicies, IntensityFn, ItemType, MovementConflictPolicy, Permissions, TurnPolicies, WorldConfig,
};
use jbw_proto::frame::{encode_frame, read_frame};
use jbw_proto::{tags, Request, Response};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::server::{stop_server, JbwServer};

fn sample_config() -> WorldConfig {
    WorldConfig {
        patch_size: 8,
        vision_radius: 1,
        scent_dims: 1,
        color_dims: 1,
        items: vec![ItemType {
            name: "jelly".into(),
            scent_vec: vec![1.0],
            color_vec: vec![0.5],
            required_counts: vec![0],
            required_costs: vec![0],
            blocks_movement: false,
            intensity_fn: IntensityFn::constant(0.0),
            interaction_fn: std::collections::HashMap::new(),
        }],
        mcmc_iterations: 2,
        scent_decay: 0.5,
        scent_diffusion: 0.1,
        deleted_item_lifetime: 5,
        movement_conflict_policy: MovementConflictPolicy::NoCollisions,
        direction_policies: DirectionPolicies::default(),
        turn_policies: TurnPolicies::default(),
        seed: 11,
    }
}

/// Start a server on an ephemeral port, returning its address and the
/// shutdown sender for `stop_server`.
async fn spawn_server(permissions: Permissions) -> (std::net::SocketAddr, watch::Sender<bool>) {
    let server = std::sync::Arc::new(JbwServer::new(sample_config(), 1, permissions).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = watch::channel(false);
    tokio::spawn(server.run(listener, rx));
    (addr, tx)
}

async fn send_request(stream: &mut TcpStream, seq: u64, req: &Request) {
    let frame = encode_frame(seq, req.tag(), &req.encode_body()).unwrap();
    stream.write_all(&frame).await.unwrap();
}

async fn recv_response(stream: &mut TcpStream) -> (u64, Response) {
    let frame = read_frame(stream).await.unwrap().expect("connection open");
    let resp = Response::decode(frame.tag, &frame.body).unwrap();
    (frame.seq, resp)
}

#[tokio::test]
async fn connect_assigns_client_id_and_echoes_config() {
    let (addr, shutdown) = spawn_server(Permissions::all()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    send_request(&mut stream, 1, &Request::Connect).await;
    let (seq, resp) = recv_response(&mut stream).await;
    assert_eq!(seq, 1);
    match resp {
        Response::Connect { client_id, config, current_time } => {
            assert_eq!(client_id, ClientId(0));
            assert_eq!(config.patch_size, 8);
            assert_eq!(current_time, 0);
        }
        other => panic!("expected Connect, got {other:?}"),
    }
    stop_server(&shutdown);
}

#[tokio::test]
async fn add_agent_then_no_op_resolves_tick_and_broadcasts_step() {
    let (addr, shutdown) = spawn_server(Permissions::all()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    send_request(&mut stream, 1, &Request::Connect).await;
    let (_, _connect_resp) = recv_response(&mut stream).await;

    send_request(&mut stream, 2, &Request::AddAgent).await;
    let (_, add_resp) = recv_response(&mut stream).await;
    let agent_id = match add_resp {
        Response::AddAgent { status, agent_id, .. } => {
            assert_eq!(status, jbw_core::Status::Ok);
            agent_id
        }
        other => panic!("expected AddAgent, got {other:?}"),
    };

    send_request(&mut stream, 3, &Request::NoOp { agent_id }).await;

    // One frame is the NoOp ack, the other is the unsolicited STEP
    // broadcast; they may arrive in either order.
    let mut saw_no_op = false;
    let mut saw_step = false;
    for _ in 0..2 {
        let (_, resp) = recv_response(&mut stream).await;
        match resp {
            Response::NoOp { status } => {
                assert_eq!(status, jbw_core::Status::Ok);
                saw_no_op = true;
            }
            Response::Step { agents, .. } => {
                assert!(agents.iter().any(|(id, _)| *id == agent_id));
                saw_step = true;
            }
            other => panic!("unexpected response {other:?}"),
        }
    }
    assert!(saw_no_op && saw_step);
    stop_server(&shutdown);
}

#[tokio::test]
async fn permission_error_when_bit_is_unset() {
    let (addr, shutdown) = spawn_server(Permissions::none()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    send_request(&mut stream, 1, &Request::Connect).await;
    let _ = recv_response(&mut stream).await;

    send_request(&mut stream, 2, &Request::AddAgent).await;
    let (_, resp) = recv_response(&mut stream).await;
    match resp {
        Response::AddAgent { status, .. } => assert_eq!(status, jbw_core::Status::PermissionError),
        other => panic!("expected AddAgent, got {other:?}"),
    }
    stop_server(&shutdown);
}

#[tokio::test]
async fn reconnect_with_unknown_client_id_closes_the_socket() {
    let (addr, shutdown) = spawn_server(Permissions::all()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    send_request(&mut stream, 1, &Request::Reconnect { client_id: ClientId(999) }).await;

    let result = tokio::time::timeout(Duration::from_secs(1), read_frame(&mut stream)).await;
    match result {
        Ok(Ok(None)) => {}
        Ok(Ok(Some(f))) => panic!("expected EOF, got a frame with tag {}", f.tag),
        Ok(Err(e)) => panic!("unexpected read error: {e}"),
        Err(_) => panic!("timed out waiting for connection close"),
    }
    stop_server(&shutdown);
}

#[tokio::test]
async fn reconnect_resumes_session_and_returns_owned_agent_states() {
    let (addr, shutdown) = spawn_server(Permissions::all()).await;

    let mut first = TcpStream::connect(addr).await.unwrap();
    send_request(&mut first, 1, &Request::Connect).await;
    let (_, connect_resp) = recv_response(&mut first).await;
    let client_id = match connect_resp {
        Response::Connect { client_id, .. } => client_id,
        other => panic!("expected Connect, got {other:?}"),
    };
    send_request(&mut first, 2, &Request::AddAgent).await;
    let (_, add_resp) = recv_response(&mut first).await;
    let agent_id = match add_resp {
        Response::AddAgent { agent_id, .. } => agent_id,
        other => panic!("expected AddAgent, got {other:?}"),
    };
    drop(first);

    let mut second = TcpStream::connect(addr).await.unwrap();
    send_request(&mut second, 1, &Request::Reconnect { client_id }).await;
    let (_, resp) = recv_response(&mut second).await;
    match resp {
        Response::Reconnect { agents, .. } => {
            assert_eq!(agents.len(), 1);
            assert_eq!(agents[0].0, agent_id);
        }
        other => panic!("expected Reconnect, got {other:?}"),
    }

    send_request(&mut second, 3, &Request::GetAgentIds).await;
    let (_, resp) = recv_response(&mut second).await;
    match resp {
        Response::GetAgentIds { agent_ids, .. } => assert_eq!(agent_ids, vec![agent_id]),
        other => panic!("expected GetAgentIds, got {other:?}"),
    }
    stop_server(&shutdown);
}

#[tokio::test]
async fn unknown_tag_at_handshake_drops_connection_silently() {
    let (addr, shutdown) = spawn_server(Permissions::all()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let frame = encode_frame(1, tags::STEP, &[]).unwrap();
    stream.write_all(&frame).await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(1), read_frame(&mut stream)).await;
    assert!(matches!(result, Ok(Ok(None))));
    stop_server(&shutdown);
}
