//! Permission-gated request dispatch: turns one [`Request`] plus
//! the session that sent it into a [`Response`], mutating the world
//! under its single writer lock and driving the step coordinator.

use std::sync::Arc;

use jbw_agent::Action;
use jbw_core::Status;
use jbw_coordinator::StepCoordinator;
use jbw_proto::response::PatchState;
use jbw_proto::{Request, Response};
use jbw_world::World;

use crate::observer::BroadcastObserver;
use crate::session::{Session, SessionTable};

/// The world plus the per-tick coordinator, behind one lock.
pub struct SimCore {
    pub world: World,
    pub coordinator: StepCoordinator,
}

impl SimCore {
    pub fn new(world: World, seed: u64) -> Self {
        SimCore { world, coordinator: StepCoordinator::new(seed) }
    }
}

/// Checks the request's required [`jbw_core::Permissions`] bit, if any,
/// before `handle` is allowed to touch the world. `None` means
/// CONNECT/RECONNECT, which gate on nothing — there is no session yet.
fn required_permission(req: &Request) -> Option<fn(&jbw_core::Permissions) -> bool> {
    match req {
        Request::Connect | Request::Reconnect { .. } => None,
        Request::AddAgent => Some(|p| p.add_agent),
        Request::RemoveAgent { .. } => Some(|p| p.remove_agent),
        // MOVE/TURN/NO_OP carry no dedicated permission bit — ownership of the target agent is
        // the gate instead, checked separately in `handle`.
        Request::Move { .. } | Request::Turn { .. } | Request::NoOp { .. } => None,
        Request::GetMap { .. } => Some(|p| p.get_map),
        Request::GetAgentIds => Some(|p| p.get_agent_ids),
        Request::GetAgentStates { .. } => Some(|p| p.get_agent_states),
        Request::SetActive { .. } => Some(|p| p.set_active),
        // No dedicated bit either; reads the same class of information
        // as GET_AGENT_STATES, so it's gated on the same one.
        Request::IsActive { .. } => Some(|p| p.get_agent_states),
    }
}

/// Agent id a request targets, for the ownership check MOVE/TURN/NO_OP/
/// SET_ACTIVE/IS_ACTIVE/REMOVE_AGENT apply in addition to (or instead
/// of) a `Permissions` bit.
fn target_agent(req: &Request) -> Option<jbw_core::AgentId> {
    match req {
        Request::RemoveAgent { agent_id }
        | Request::Move { agent_id, .. }
        | Request::Turn { agent_id, .. }
        | Request::NoOp { agent_id }
        | Request::SetActive { agent_id, .. }
        | Request::IsActive { agent_id } => Some(*agent_id),
        _ => None,
    }
}

fn status_response(req: &Request, status: Status) -> Response {
    match req {
        Request::RemoveAgent { .. } => Response::RemoveAgent { status },
        Request::Move { .. } => Response::Move { status },
        Request::Turn { .. } => Response::Turn { status },
        Request::NoOp { .. } => Response::NoOp { status },
        Request::SetActive { .. } => Response::SetActive { status },
        Request::GetMap { .. } => Response::GetMap { status, patches: Vec::new() },
        Request::GetAgentIds => Response::GetAgentIds { status, agent_ids: Vec::new() },
        Request::GetAgentStates { .. } => Response::GetAgentStates { status, agent_states: Vec::new() },
        Request::IsActive { .. } => Response::IsActive { status, active: false },
        Request::AddAgent => {
            Response::AddAgent { status, agent_id: jbw_core::AgentId(0), agent_state: default_agent_state() }
        }
        Request::Connect | Request::Reconnect { .. } => unreachable!("handled before permission gating"),
    }
}

fn default_agent_state() -> jbw_agent::AgentState {
    jbw_agent::AgentState {
        position: jbw_core::Position::new(0, 0),
        facing: jbw_core::Direction::Up,
        scent: Vec::new(),
        vision: Vec::new(),
        inventory: Vec::new(),
    }
}

/// Handle everything except CONNECT/RECONNECT, which need the session
/// table (not just the world) and are handled in `server.rs`'s handshake
/// path before a session reaches `Ready`.
pub fn handle(
    core: &std::sync::Mutex<SimCore>,
    sessions: &Arc<SessionTable>,
    session: &Arc<Session>,
    req: Request,
) -> Response {
    debug_assert!(!matches!(req, Request::Connect | Request::Reconnect { .. }));

    if let Some(check) = required_permission(&req) {
        if !check(&session.permissions()) {
            tracing::warn!(client_id = session.client_id.get(), ?req, "permission denied");
            return status_response(&req, Status::PermissionError);
        }
    }
    if let Some(agent) = target_agent(&req) {
        if !matches!(req, Request::SetActive { .. } | Request::IsActive { .. }) && !session.owns(agent) {
            return status_response(&req, Status::PermissionError);
        }
    }

    let mut guard = core.lock().unwrap();
    let SimCore { world, coordinator } = &mut *guard;

    let response = match req {
        Request::AddAgent => {
            let agent_id = world.add_agent();
            session.add_owned_agent(agent_id);
            match world.agent_state(agent_id) {
                Ok(agent_state) => Response::AddAgent { status: Status::Ok, agent_id, agent_state },
                Err(e) => Response::AddAgent { status: Status::from(&e), agent_id, agent_state: default_agent_state() },
            }
        }
        Request::RemoveAgent { agent_id } => match world.remove_agent(agent_id) {
            Ok(()) => {
                for s in sessions.all() {
                    s.remove_owned_agent(agent_id);
                }
                Response::RemoveAgent { status: Status::Ok }
            }
            Err(e) => Response::RemoveAgent { status: Status::from(&e) },
        },
        Request::Move { agent_id, dir, steps } => {
            submit_and_maybe_resolve(world, coordinator, sessions, agent_id, Action::Move { dir, steps }, Response::Move)
        }
        Request::Turn { agent_id, turn } => {
            submit_and_maybe_resolve(world, coordinator, sessions, agent_id, Action::Turn { turn }, Response::Turn)
        }
        Request::NoOp { agent_id } => {
            submit_and_maybe_resolve(world, coordinator, sessions, agent_id, Action::NoOp, Response::NoOp)
        }
        Request::GetMap { bl, tr, include_scent } => {
            let views = world.get_map(bl, tr, include_scent);
            let patches = views
                .iter()
                .map(|v| PatchState {
                    px: v.patch.coord.px,
                    py: v.patch.coord.py,
                    fixed: v.patch.fixed,
                    items: v.patch.items.iter().map(|it| (it.item_type.0, it.local.0, it.local.1)).collect(),
                    scent: v.scent.map(|s| s.to_vec()),
                })
                .collect();
            Response::GetMap { status: Status::Ok, patches }
        }
        Request::GetAgentIds => {
            Response::GetAgentIds { status: Status::Ok, agent_ids: session.owned_agent_ids.lock().unwrap().clone() }
        }
        Request::GetAgentStates { agent_ids } => {
            let mut states = Vec::with_capacity(agent_ids.len());
            let mut status = Status::Ok;
            for id in &agent_ids {
                match world.agent_state(*id) {
                    Ok(s) => states.push(s),
                    Err(e) => {
                        status = Status::from(&e);
                        break;
                    }
                }
            }
            Response::GetAgentStates { status, agent_states: states }
        }
        Request::SetActive { agent_id, active } => match world.agents.set_active(agent_id, active) {
            Ok(()) => Response::SetActive { status: Status::Ok },
            Err(e) => Response::SetActive { status: Status::from(&e) },
        },
        Request::IsActive { agent_id } => match world.agents.is_active(agent_id) {
            Ok(active) => Response::IsActive { status: Status::Ok, active },
            Err(e) => Response::IsActive { status: Status::from(&e), active: false },
        },
        Request::Connect | Request::Reconnect { .. } => unreachable!(),
    };
    drop(guard);
    response
}

fn submit_and_maybe_resolve(
    world: &mut World,
    coordinator: &mut StepCoordinator,
    sessions: &Arc<SessionTable>,
    agent_id: jbw_core::AgentId,
    action: Action,
    wrap: impl Fn(Status) -> Response,
) -> Response {
    let status = match coordinator.submit_action(world, agent_id, action) {
        Ok(()) => Status::Ok,
        Err(jbw_coordinator::CoordinatorError::World(e)) => Status::from(&e),
        Err(_) => Status::OutOfMemory,
    };
    if status == Status::Ok {
        let mut observer = BroadcastObserver { sessions: sessions.as_ref() };
        if let Err(e) = coordinator.try_resolve(world, &mut observer) {
            tracing::error!(error = %e, "tick resolve aborted");
        }
    }
    wrap(status)
}
