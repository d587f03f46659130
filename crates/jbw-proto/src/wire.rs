//! Little-endian, fixed-width primitive codec, plus the shared
//! higher-level encodings (`agent_state`, `WorldConfig`, patch views) used
//! by both the request/response frames and, via [`crate::config_wire`] and
//! [`crate::agent_wire`], the snapshot codec in `jbw-snapshot`.
//!
//! Every variable-length field (strings, vectors) is written as a `u32`
//! element count followed by the elements — "fixed-width" describes each
//! scalar's encoding, not the absence of length prefixes: the wire
//! `agent_state` layout (`scent: f32*S`) already requires a reader to
//! know `S` for unless it's carried alongside.

use crate::error::{ProtoError, ProtoResult};

/// An append-only little-endian byte buffer.
#[derive(Default)]
pub struct ByteWriter(Vec<u8>);

impl ByteWriter {
    pub fn new() -> Self {
        ByteWriter(Vec::new())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, b: &[u8]) -> &mut Self {
        self.0.extend_from_slice(b);
        self
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        self.u32(s.len() as u32);
        self.bytes(s.as_bytes());
        self
    }

    pub fn f32_vec(&mut self, v: &[f32]) -> &mut Self {
        self.u32(v.len() as u32);
        for &x in v {
            self.f32(x);
        }
        self
    }

    pub fn u32_vec(&mut self, v: &[u32]) -> &mut Self {
        self.u32(v.len() as u32);
        for &x in v {
            self.u32(x);
        }
        self
    }
}

/// A cursor over a borrowed byte slice, yielding `Truncated` rather than
/// panicking on a short read.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> ProtoResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(ProtoError::Truncated { wanted: n, had: self.remaining() });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> ProtoResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> ProtoResult<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn u32(&mut self) -> ProtoResult<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn u64(&mut self) -> ProtoResult<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn i64(&mut self) -> ProtoResult<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn f32(&mut self) -> ProtoResult<f32> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn string(&mut self) -> ProtoResult<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?.to_vec();
        Ok(String::from_utf8(bytes)?)
    }

    pub fn f32_vec(&mut self) -> ProtoResult<Vec<f32>> {
        let len = self.u32()? as usize;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.f32()?);
        }
        Ok(out)
    }

    pub fn u32_vec(&mut self) -> ProtoResult<Vec<u32>> {
        let len = self.u32()? as usize;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.u32()?);
        }
        Ok(out)
    }
}

// ── Shared domain encodings ───────────────────────────────────────────────

pub fn write_position(w: &mut ByteWriter, pos: jbw_core::Position) {
    w.i64(pos.x).i64(pos.y);
}

pub fn read_position(r: &mut ByteReader) -> ProtoResult<jbw_core::Position> {
    let x = r.i64()?;
    let y = r.i64()?;
    Ok(jbw_core::Position::new(x, y))
}

pub fn write_direction(w: &mut ByteWriter, dir: jbw_core::Direction) {
    w.u8(dir.to_wire());
}

pub fn read_direction(r: &mut ByteReader) -> ProtoResult<jbw_core::Direction> {
    let tag = r.u8()?;
    jbw_core::Direction::from_wire(tag).ok_or(ProtoError::InvalidDirection(tag))
}

pub fn write_turn(w: &mut ByteWriter, turn: jbw_core::TurnDirection) {
    w.u8(turn.to_wire());
}

pub fn read_turn(r: &mut ByteReader) -> ProtoResult<jbw_core::TurnDirection> {
    let tag = r.u8()?;
    jbw_core::TurnDirection::from_wire(tag).ok_or(ProtoError::InvalidTurn(tag))
}

/// `agent_state`: `{position, facing, scent, vision, inventory}`.
pub fn write_agent_state(w: &mut ByteWriter, state: &jbw_agent::AgentState) {
    write_position(w, state.position);
    write_direction(w, state.facing);
    w.f32_vec(&state.scent);
    w.f32_vec(&state.vision);
    w.u32_vec(&state.inventory);
}

pub fn read_agent_state(r: &mut ByteReader) -> ProtoResult<jbw_agent::AgentState> {
    let position = read_position(r)?;
    let facing = read_direction(r)?;
    let scent = r.f32_vec()?;
    let vision = r.f32_vec()?;
    let inventory = r.u32_vec()?;
    Ok(jbw_agent::AgentState { position, facing, scent, vision, inventory })
}
