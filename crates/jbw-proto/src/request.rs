//! Request payloads.

use jbw_core::{AgentId, ClientId, Direction, Position, TurnDirection};

use crate::error::{ProtoError, ProtoResult};
use crate::tags;
use crate::wire::{read_direction, read_position, read_turn, write_direction, write_position, write_turn, ByteReader, ByteWriter};

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Connect,
    Reconnect { client_id: ClientId },
    AddAgent,
    RemoveAgent { agent_id: AgentId },
    Move { agent_id: AgentId, dir: Direction, steps: u32 },
    Turn { agent_id: AgentId, turn: TurnDirection },
    NoOp { agent_id: AgentId },
    GetMap { bl: Position, tr: Position, include_scent: bool },
    GetAgentIds,
    GetAgentStates { agent_ids: Vec<AgentId> },
    SetActive { agent_id: AgentId, active: bool },
    IsActive { agent_id: AgentId },
}

impl Request {
    pub fn tag(&self) -> u8 {
        match self {
            Request::Connect => tags::CONNECT,
            Request::Reconnect { .. } => tags::RECONNECT,
            Request::AddAgent => tags::ADD_AGENT,
            Request::RemoveAgent { .. } => tags::REMOVE_AGENT,
            Request::Move { .. } => tags::MOVE,
            Request::Turn { .. } => tags::TURN,
            Request::NoOp { .. } => tags::NO_OP,
            Request::GetMap { .. } => tags::GET_MAP,
            Request::GetAgentIds => tags::GET_AGENT_IDS,
            Request::GetAgentStates { .. } => tags::GET_AGENT_STATES,
            Request::SetActive { .. } => tags::SET_ACTIVE,
            Request::IsActive { .. } => tags::IS_ACTIVE,
        }
    }

    pub fn encode_body(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        match self {
            Request::Connect | Request::AddAgent | Request::GetAgentIds => {}
            Request::Reconnect { client_id } => {
                w.u64(client_id.get());
            }
            Request::RemoveAgent { agent_id } => {
                w.u64(agent_id.get());
            }
            Request::Move { agent_id, dir, steps } => {
                w.u64(agent_id.get());
                write_direction(&mut w, *dir);
                w.u32(*steps);
            }
            Request::Turn { agent_id, turn } => {
                w.u64(agent_id.get());
                write_turn(&mut w, *turn);
            }
            Request::NoOp { agent_id } => {
                w.u64(agent_id.get());
            }
            Request::GetMap { bl, tr, include_scent } => {
                write_position(&mut w, *bl);
                write_position(&mut w, *tr);
                w.u8(*include_scent as u8);
            }
            Request::GetAgentStates { agent_ids } => {
                w.u32(agent_ids.len() as u32);
                for id in agent_ids {
                    w.u64(id.get());
                }
            }
            Request::SetActive { agent_id, active } => {
                w.u64(agent_id.get());
                w.u8(*active as u8);
            }
            Request::IsActive { agent_id } => {
                w.u64(agent_id.get());
            }
        }
        w.into_bytes()
    }

    pub fn decode(tag: u8, body: &[u8]) -> ProtoResult<Request> {
        let mut r = ByteReader::new(body);
        let req = match tag {
            tags::CONNECT => Request::Connect,
            tags::RECONNECT => Request::Reconnect { client_id: ClientId(r.u64()?) },
            tags::ADD_AGENT => Request::AddAgent,
            tags::REMOVE_AGENT => Request::RemoveAgent { agent_id: AgentId(r.u64()?) },
            tags::MOVE => {
                let agent_id = AgentId(r.u64()?);
                let dir = read_direction(&mut r)?;
                let steps = r.u32()?;
                Request::Move { agent_id, dir, steps }
            }
            tags::TURN => {
                let agent_id = AgentId(r.u64()?);
                let turn = read_turn(&mut r)?;
                Request::Turn { agent_id, turn }
            }
            tags::NO_OP => Request::NoOp { agent_id: AgentId(r.u64()?) },
            tags::GET_MAP => {
                let bl = read_position(&mut r)?;
                let tr = read_position(&mut r)?;
                let include_scent = r.u8()? != 0;
                Request::GetMap { bl, tr, include_scent }
            }
            tags::GET_AGENT_IDS => Request::GetAgentIds,
            tags::GET_AGENT_STATES => {
                let count = r.u32()? as usize;
                let mut agent_ids = Vec::with_capacity(count);
                for _ in 0..count {
                    agent_ids.push(AgentId(r.u64()?));
                }
                Request::GetAgentStates { agent_ids }
            }
            tags::SET_ACTIVE => {
                let agent_id = AgentId(r.u64()?);
                let active = r.u8()? != 0;
                Request::SetActive { agent_id, active }
            }
            tags::IS_ACTIVE => Request::IsActive { agent_id: AgentId(r.u64()?) },
            other => return Err(ProtoError::UnknownRequestTag(other)),
        };
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(req: Request) {
        let tag = req.tag();
        let body = req.encode_body();
        let decoded = Request::decode(tag, &body).unwrap();
        assert_eq!(req, decoded);
    }

    #[test]
    fn every_variant_round_trips() {
        round_trip(Request::Connect);
        round_trip(Request::Reconnect { client_id: ClientId(9) });
        round_trip(Request::AddAgent);
        round_trip(Request::RemoveAgent { agent_id: AgentId(3) });
        round_trip(Request::Move { agent_id: AgentId(3), dir: Direction::Up, steps: 2 });
        round_trip(Request::Turn { agent_id: AgentId(3), turn: TurnDirection::Reverse });
        round_trip(Request::NoOp { agent_id: AgentId(3) });
        round_trip(Request::GetMap { bl: Position::new(-4, -4), tr: Position::new(4, 4), include_scent: true });
        round_trip(Request::GetAgentIds);
        round_trip(Request::GetAgentStates { agent_ids: vec![AgentId(1), AgentId(2)] });
        round_trip(Request::SetActive { agent_id: AgentId(5), active: false });
        round_trip(Request::IsActive { agent_id: AgentId(5) });
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(matches!(Request::decode(0xFE, &[]), Err(ProtoError::UnknownRequestTag(0xFE))));
    }
}
