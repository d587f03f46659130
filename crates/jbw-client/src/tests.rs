use std::sync::{Arc, Mutex};
use std::time::Duration;

use jbw_core::{
    DirectionPolicies, IntensityFn, ItemType, MovementConflictPolicy, Permissions, Status, Tick, TurnPolicies, WorldConfig,
};
use jbw_server::JbwServer;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::client::{HandshakeInfo, JbwClient};
use crate::error::ClientError;

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
        seed: 7,
    }
}

async fn spawn_server(permissions: Permissions) -> (std::net::SocketAddr, watch::Sender<bool>) {
    let server = Arc::new(JbwServer::new(sample_config(), 1, permissions).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = watch::channel(false);
    tokio::spawn(server.run(listener, rx));
    (addr, tx)
}

#[tokio::test]
async fn connect_returns_client_id_and_config() {
    let (addr, shutdown) = spawn_server(Permissions::all()).await;
    let (client, HandshakeInfo { client_id, current_time, config, agents }) =
        JbwClient::connect(addr, Box::new(|_, _| {})).await.unwrap();
    assert_eq!(client.client_id(), client_id);
    assert_eq!(current_time, 0);
    assert_eq!(config.unwrap().patch_size, 8);
    assert!(agents.is_empty());
    client.close().await;
    let _ = shutdown.send(true);
}

#[tokio::test]
async fn add_agent_then_no_op_delivers_step_broadcast() {
    let (addr, shutdown) = spawn_server(Permissions::all()).await;
    let steps: Arc<Mutex<Vec<(Tick, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let steps_cb = steps.clone();
    let (client, _) = JbwClient::connect(
        addr,
        Box::new(move |tick, agents| {
            steps_cb.lock().unwrap().push((tick, agents.len()));
        }),
    )
    .await
    .unwrap();

    let (agent_id, _) = client.add_agent().await.unwrap();
    client.no_op(agent_id).await.unwrap();

    // The STEP broadcast and the NO_OP's own response race on the wire
    //; give the reader task a little time to have dispatched it.
    for _ in 0..50 {
        if !steps.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(steps.lock().unwrap().len(), 1);

    client.close().await;
    let _ = shutdown.send(true);
}

#[tokio::test]
async fn permission_denied_surfaces_as_remote_error() {
    let (addr, shutdown) = spawn_server(Permissions::none()).await;
    let (client, _) = JbwClient::connect(addr, Box::new(|_, _| {})).await.unwrap();

    let err = client.add_agent().await.unwrap_err();
    assert!(matches!(err, ClientError::Remote(Status::PermissionError)));

    client.close().await;
    let _ = shutdown.send(true);
}

#[tokio::test]
async fn reconnect_recovers_owned_agents() {
    let (addr, shutdown) = spawn_server(Permissions::all()).await;

    let (client, HandshakeInfo { client_id, .. }) = JbwClient::connect(addr, Box::new(|_, _| {})).await.unwrap();
    let (agent_id, _) = client.add_agent().await.unwrap();
    client.close().await;

    let (second, HandshakeInfo { agents, .. }) =
        JbwClient::reconnect(addr, client_id, Box::new(|_, _| {})).await.unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].0, agent_id);

    let ids = second.get_agent_ids().await.unwrap();
    assert_eq!(ids, vec![agent_id]);

    second.close().await;
    let _ = shutdown.send(true);
}

#[tokio::test]
async fn connect_to_closed_socket_yields_lost_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let result = JbwClient::connect(addr, Box::new(|_, _| {})).await;
    assert!(matches!(result, Err(ClientError::LostConnection)));
}
