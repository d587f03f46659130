//! Response payloads.

use jbw_agent::AgentState;
use jbw_core::{AgentId, ClientId, Status, WorldConfig};

use crate::config_wire::{read_world_config, write_world_config};
use crate::error::{ProtoError, ProtoResult};
use crate::tags;
use crate::wire::{read_agent_state, write_agent_state, ByteReader, ByteWriter};

fn write_status(w: &mut ByteWriter, status: Status) {
    w.u16(status.to_wire());
}

fn read_status(r: &mut ByteReader) -> ProtoResult<Status> {
    let tag = r.u16()?;
    Status::from_wire(tag).ok_or(ProtoError::InvalidStatus(tag))
}

/// One patch as returned by `GET_MAP`. `scent` is `None` when the
/// request's `include_scent` was `false`.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchState {
    pub px: i64,
    pub py: i64,
    pub fixed: bool,
    pub items: Vec<(u16, u32, u32)>,
    pub scent: Option<Vec<f32>>,
}

fn write_patch_state(w: &mut ByteWriter, p: &PatchState) {
    w.i64(p.px).i64(p.py);
    w.u8(p.fixed as u8);
    w.u32(p.items.len() as u32);
    for &(item_type, lx, ly) in &p.items {
        w.u16(item_type);
        w.u32(lx);
        w.u32(ly);
    }
    match &p.scent {
        Some(scent) => {
            w.u8(1);
            w.f32_vec(scent);
        }
        None => {
            w.u8(0);
        }
    }
}

fn read_patch_state(r: &mut ByteReader) -> ProtoResult<PatchState> {
    let px = r.i64()?;
    let py = r.i64()?;
    let fixed = r.u8()? != 0;
    let item_count = r.u32()? as usize;
    let mut items = Vec::with_capacity(item_count);
    for _ in 0..item_count {
        let item_type = r.u16()?;
        let lx = r.u32()?;
        let ly = r.u32()?;
        items.push((item_type, lx, ly));
    }
    let has_scent = r.u8()? != 0;
    let scent = if has_scent { Some(r.f32_vec()?) } else { None };
    Ok(PatchState { px, py, fixed, items, scent })
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Connect { client_id: ClientId, config: Box<WorldConfig>, current_time: u64 },
    Reconnect { current_time: u64, agents: Vec<(AgentId, AgentState)> },
    AddAgent { status: Status, agent_id: AgentId, agent_state: AgentState },
    RemoveAgent { status: Status },
    Move { status: Status },
    Turn { status: Status },
    NoOp { status: Status },
    GetMap { status: Status, patches: Vec<PatchState> },
    GetAgentIds { status: Status, agent_ids: Vec<AgentId> },
    GetAgentStates { status: Status, agent_states: Vec<AgentState> },
    SetActive { status: Status },
    IsActive { status: Status, active: bool },
    /// Unsolicited, server -> client.
    Step { new_time: u64, agents: Vec<(AgentId, AgentState)> },
}

impl Response {
    pub fn tag(&self) -> u8 {
        match self {
            Response::Connect { .. } => tags::CONNECT,
            Response::Reconnect { .. } => tags::RECONNECT,
            Response::AddAgent { .. } => tags::ADD_AGENT,
            Response::RemoveAgent { .. } => tags::REMOVE_AGENT,
            Response::Move { .. } => tags::MOVE,
            Response::Turn { .. } => tags::TURN,
            Response::NoOp { .. } => tags::NO_OP,
            Response::GetMap { .. } => tags::GET_MAP,
            Response::GetAgentIds { .. } => tags::GET_AGENT_IDS,
            Response::GetAgentStates { .. } => tags::GET_AGENT_STATES,
            Response::SetActive { .. } => tags::SET_ACTIVE,
            Response::IsActive { .. } => tags::IS_ACTIVE,
            Response::Step { .. } => tags::STEP,
        }
    }

    pub fn encode_body(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        match self {
            Response::Connect { client_id, config, current_time } => {
                w.u64(client_id.get());
                write_world_config(&mut w, config);
                w.u64(*current_time);
            }
            Response::Reconnect { current_time, agents } => {
                w.u64(*current_time);
                w.u32(agents.len() as u32);
                for (id, state) in agents {
                    w.u64(id.get());
                    write_agent_state(&mut w, state);
                }
            }
            Response::AddAgent { status, agent_id, agent_state } => {
                write_status(&mut w, *status);
                w.u64(agent_id.get());
                write_agent_state(&mut w, agent_state);
            }
            Response::RemoveAgent { status }
            | Response::Move { status }
            | Response::Turn { status }
            | Response::NoOp { status }
            | Response::SetActive { status } => {
                write_status(&mut w, *status);
            }
            Response::GetMap { status, patches } => {
                write_status(&mut w, *status);
                w.u32(patches.len() as u32);
                for p in patches {
                    write_patch_state(&mut w, p);
                }
            }
            Response::GetAgentIds { status, agent_ids } => {
                write_status(&mut w, *status);
                w.u32(agent_ids.len() as u32);
                for id in agent_ids {
                    w.u64(id.get());
                }
            }
            Response::GetAgentStates { status, agent_states } => {
                write_status(&mut w, *status);
                w.u32(agent_states.len() as u32);
                for s in agent_states {
                    write_agent_state(&mut w, s);
                }
            }
            Response::IsActive { status, active } => {
                write_status(&mut w, *status);
                w.u8(*active as u8);
            }
            Response::Step { new_time, agents } => {
                w.u64(*new_time);
                w.u32(agents.len() as u32);
                for (id, state) in agents {
                    w.u64(id.get());
                    write_agent_state(&mut w, state);
                }
            }
        }
        w.into_bytes()
    }

    pub fn decode(tag: u8, body: &[u8]) -> ProtoResult<Response> {
        let mut r = ByteReader::new(body);
        let resp = match tag {
            tags::CONNECT => {
                let client_id = ClientId(r.u64()?);
                let config = Box::new(read_world_config(&mut r)?);
                let current_time = r.u64()?;
                Response::Connect { client_id, config, current_time }
            }
            tags::RECONNECT => {
                let current_time = r.u64()?;
                let count = r.u32()? as usize;
                let mut agents = Vec::with_capacity(count);
                for _ in 0..count {
                    let id = AgentId(r.u64()?);
                    let state = read_agent_state(&mut r)?;
                    agents.push((id, state));
                }
                Response::Reconnect { current_time, agents }
            }
            tags::ADD_AGENT => {
                let status = read_status(&mut r)?;
                let agent_id = AgentId(r.u64()?);
                let agent_state = read_agent_state(&mut r)?;
                Response::AddAgent { status, agent_id, agent_state }
            }
            tags::REMOVE_AGENT => Response::RemoveAgent { status: read_status(&mut r)? },
            tags::MOVE => Response::Move { status: read_status(&mut r)? },
            tags::TURN => Response::Turn { status: read_status(&mut r)? },
            tags::NO_OP => Response::NoOp { status: read_status(&mut r)? },
            tags::GET_MAP => {
                let status = read_status(&mut r)?;
                let count = r.u32()? as usize;
                let mut patches = Vec::with_capacity(count);
                for _ in 0..count {
                    patches.push(read_patch_state(&mut r)?);
                }
                Response::GetMap { status, patches }
            }
            tags::GET_AGENT_IDS => {
                let status = read_status(&mut r)?;
                let count = r.u32()? as usize;
                let mut agent_ids = Vec::with_capacity(count);
                for _ in 0..count {
                    agent_ids.push(AgentId(r.u64()?));
                }
                Response::GetAgentIds { status, agent_ids }
            }
            tags::GET_AGENT_STATES => {
                let status = read_status(&mut r)?;
                let count = r.u32()? as usize;
                let mut agent_states = Vec::with_capacity(count);
                for _ in 0..count {
                    agent_states.push(read_agent_state(&mut r)?);
                }
                Response::GetAgentStates { status, agent_states }
            }
            tags::SET_ACTIVE => Response::SetActive { status: read_status(&mut r)? },
            tags::IS_ACTIVE => {
                let status = read_status(&mut r)?;
                let active = r.u8()? != 0;
                Response::IsActive { status, active }
            }
            tags::STEP => {
                let new_time = r.u64()?;
                let count = r.u32()? as usize;
                let mut agents = Vec::with_capacity(count);
                for _ in 0..count {
                    let id = AgentId(r.u64()?);
                    let state = read_agent_state(&mut r)?;
                    agents.push((id, state));
                }
                Response::Step { new_time, agents }
            }
            other => return Err(ProtoError::UnknownResponseTag(other)),
        };
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jbw_core::{Direction, Position};

    fn sample_state() -> AgentState {
        AgentState {
            position: Position::new(1, -2),
            facing: Direction::Left,
            scent: vec![0.1, 0.2],
            vision: vec![1.0; 9],
            inventory: vec![3, 0],
        }
    }

    fn round_trip(resp: Response) {
        let tag = resp.tag();
        let body = resp.encode_body();
        let decoded = Response::decode(tag, &body).unwrap();
        assert_eq!(resp, decoded);
    }

    #[test]
    fn status_bearing_variants_round_trip() {
        round_trip(Response::RemoveAgent { status: Status::Ok });
        round_trip(Response::Move { status: Status::AgentAlreadyActed });
        round_trip(Response::Turn { status: Status::PermissionError });
        round_trip(Response::NoOp { status: Status::InvalidAgentId });
        round_trip(Response::SetActive { status: Status::Ok });
        round_trip(Response::IsActive { status: Status::Ok, active: true });
    }

    #[test]
    fn add_agent_round_trips() {
        round_trip(Response::AddAgent { status: Status::Ok, agent_id: AgentId(7), agent_state: sample_state() });
    }

    #[test]
    fn get_map_round_trips_with_and_without_scent() {
        let patches = vec![
            PatchState { px: 0, py: 0, fixed: true, items: vec![(2, 1, 3)], scent: Some(vec![0.5, 0.25]) },
            PatchState { px: 1, py: 0, fixed: false, items: vec![], scent: None },
        ];
        round_trip(Response::GetMap { status: Status::Ok, patches });
    }

    #[test]
    fn get_agent_ids_and_states_round_trip() {
        round_trip(Response::GetAgentIds { status: Status::Ok, agent_ids: vec![AgentId(1), AgentId(2)] });
        round_trip(Response::GetAgentStates { status: Status::Ok, agent_states: vec![sample_state(), sample_state()] });
    }

    #[test]
    fn step_round_trips() {
        round_trip(Response::Step { new_time: 42, agents: vec![(AgentId(1), sample_state())] });
    }

    #[test]
    fn reconnect_round_trips() {
        round_trip(Response::Reconnect { current_time: 9, agents: vec![(AgentId(7), sample_state()), (AgentId(9), sample_state())] });
    }

    #[test]
    fn connect_round_trips_config_fields() {
        use jbw_core::{DirectionPolicies, MovementConflictPolicy, TurnPolicies};
        let config = WorldConfig {
            patch_size: 16,
            vision_radius: 2,
            scent_dims: 3,
            color_dims: 3,
            items: vec![],
            mcmc_iterations: 10,
            scent_decay: 0.5,
            scent_diffusion: 0.1,
            deleted_item_lifetime: 20,
            movement_conflict_policy: MovementConflictPolicy::FirstComeFirstServed,
            direction_policies: DirectionPolicies::default(),
            turn_policies: TurnPolicies::default(),
            seed: 1234,
        };
        let resp = Response::Connect { client_id: ClientId(3), config: Box::new(config), current_time: 0 };
        let tag = resp.tag();
        let body = resp.encode_body();
        let decoded = Response::decode(tag, &body).unwrap();
        match decoded {
            Response::Connect { client_id, config, current_time } => {
                assert_eq!(client_id, ClientId(3));
                assert_eq!(current_time, 0);
                assert_eq!(config.patch_size, 16);
                assert_eq!(config.seed, 1234);
                assert_eq!(config.movement_conflict_policy, MovementConflictPolicy::FirstComeFirstServed);
            }
            _ => panic!("wrong variant"),
        }
    }
}
