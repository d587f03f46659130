//! `write(world, stream)` / `read(stream) -> world`.
//!
//! The whole snapshot is assembled in one in-memory [`jbw_proto::wire::ByteWriter`]
//! buffer and written in a single call, and read back by slurping the
//! stream into a buffer before parsing — the world is already held under
//! its single writer lock for the duration of snapshot I/O, so there
//! is no concurrency benefit to a truly incremental writer, only extra
//! bookkeeping.

use std::io::{Read, Write};

use rustc_hash::FxHashMap;

use jbw_agent::{AgentRecord, AgentState};
use jbw_core::{AgentId, ClientId, Permissions, Position, SessionRecord, Tick};
use jbw_proto::config_wire::{read_world_config, write_world_config};
use jbw_proto::wire::{read_direction, read_position, write_direction, write_position, ByteReader, ByteWriter};
use jbw_world::store::PatchStore;
use jbw_world::{Patch, World};

use crate::error::{SnapshotError, SnapshotResult};

const MAGIC: [u8; 4] = *b"JBW1";
const VERSION: u32 = 1;

fn write_permissions(w: &mut ByteWriter, p: &Permissions) {
    let mut bits: u8 = 0;
    bits |= (p.add_agent as u8) << 0;
    bits |= (p.remove_agent as u8) << 1;
    bits |= (p.remove_client as u8) << 2;
    bits |= (p.set_active as u8) << 3;
    bits |= (p.get_map as u8) << 4;
    bits |= (p.get_agent_ids as u8) << 5;
    bits |= (p.get_agent_states as u8) << 6;
    w.u8(bits);
}

fn read_permissions(r: &mut ByteReader) -> SnapshotResult<Permissions> {
    let bits = r.u8()?;
    Ok(Permissions {
        add_agent: bits & (1 << 0) != 0,
        remove_agent: bits & (1 << 1) != 0,
        remove_client: bits & (1 << 2) != 0,
        set_active: bits & (1 << 3) != 0,
        get_map: bits & (1 << 4) != 0,
        get_agent_ids: bits & (1 << 5) != 0,
        get_agent_states: bits & (1 << 6) != 0,
    })
}

fn write_session(w: &mut ByteWriter, s: &SessionRecord) {
    w.u64(s.client_id.get());
    w.u32(s.owned_agent_ids.len() as u32);
    for id in &s.owned_agent_ids {
        w.u64(id.get());
    }
    write_permissions(w, &s.permissions);
}

fn read_session(r: &mut ByteReader) -> SnapshotResult<SessionRecord> {
    let client_id = ClientId(r.u64()?);
    let count = r.u32()? as usize;
    let mut owned_agent_ids = Vec::with_capacity(count);
    for _ in 0..count {
        owned_agent_ids.push(AgentId(r.u64()?));
    }
    let permissions = read_permissions(r)?;
    Ok(SessionRecord { client_id, owned_agent_ids, permissions })
}

fn write_patch(w: &mut ByteWriter, patch: &Patch) {
    w.i64(patch.coord.px).i64(patch.coord.py);
    w.u32(patch.patch_size);
    w.u32(patch.scent_dims);
    w.u32(patch.color_dims);
    w.u32(patch.items.len() as u32);
    for item in &patch.items {
        w.u16(item.item_type.0);
        w.u32(item.local.0);
        w.u32(item.local.1);
    }
    w.f32_vec(&patch.scent);
    w.u32(patch.removed_items.len() as u32);
    for r in &patch.removed_items {
        w.u16(r.item_type.0);
        w.u32(r.local.0);
        w.u32(r.local.1);
        w.u64(r.deletion_tick.0);
    }
    w.u64(patch.last_advanced_tick.0);
}

fn read_patch(r: &mut ByteReader) -> SnapshotResult<Patch> {
    use jbw_core::ItemTypeId;
    use jbw_world::{PatchItem, RemovedItem};

    let px = r.i64()?;
    let py = r.i64()?;
    let patch_size = r.u32()?;
    let scent_dims = r.u32()?;
    let color_dims = r.u32()?;
    let item_count = r.u32()? as usize;
    let mut items = Vec::with_capacity(item_count);
    for _ in 0..item_count {
        let item_type = ItemTypeId(r.u16()?);
        let lx = r.u32()?;
        let ly = r.u32()?;
        items.push(PatchItem { item_type, local: (lx, ly) });
    }
    let scent = r.f32_vec()?;
    let removed_count = r.u32()? as usize;
    let mut removed_items = Vec::with_capacity(removed_count);
    for _ in 0..removed_count {
        let item_type = ItemTypeId(r.u16()?);
        let lx = r.u32()?;
        let ly = r.u32()?;
        let deletion_tick = Tick(r.u64()?);
        removed_items.push(RemovedItem { local: (lx, ly), item_type, deletion_tick });
    }
    let last_advanced_tick = Tick(r.u64()?);

    let mut patch = Patch::new_empty(jbw_core::PatchCoord::new(px, py), patch_size, scent_dims, color_dims, true);
    patch.items = items;
    patch.scent = scent;
    patch.removed_items = removed_items;
    patch.last_advanced_tick = last_advanced_tick;
    Ok(patch)
}

fn write_agent(w: &mut ByteWriter, id: AgentId, record: &AgentRecord) {
    w.u64(id.get());
    write_position(w, record.position);
    write_direction(w, record.facing);
    w.u8(record.active as u8);
    w.u32_vec(&record.inventory);
}

/// Write `world`'s entire persistent state to `out`. Does not
/// include any client session — call [`write_with_sessions`] from a host
/// that tracks them (`jbw-server`); a bare `jbw-world::World` has none.
pub fn write<W: Write>(world: &World, out: &mut W) -> SnapshotResult<()> {
    write_with_sessions(world, &[], out)
}

/// As [`write`], additionally persisting the server's session table.
pub fn write_with_sessions<W: Write>(world: &World, sessions: &[SessionRecord], out: &mut W) -> SnapshotResult<()> {
    let mut w = ByteWriter::new();
    w.bytes(&MAGIC);
    w.u32(VERSION);
    write_world_config(&mut w, &world.config);
    // rng-state: the sampler carries no mutable stream state of its own —
    // every draw is a pure function of `(seed, ...)` — so this block is
    // the seed again, kept as a distinct block from the config rather
    // than collapsed into it.
    w.u64(world.config.seed);

    let mut coords: Vec<_> = world.store.iter().map(|(c, _)| *c).collect();
    coords.sort_by_key(|c| (c.px, c.py));
    w.u64(coords.len() as u64);
    for coord in &coords {
        let patch = world.store.get_if_fixed(*coord).expect("coord came from store.iter()");
        write_patch(&mut w, patch);
    }

    let agents = world.agents.snapshot_records();
    w.u64(agents.len() as u64);
    for (id, record) in &agents {
        write_agent(&mut w, *id, record);
    }

    w.u64(world.clock.0);
    w.u64(world.agents.next_agent_id());

    w.u32(sessions.len() as u32);
    for s in sessions {
        write_session(&mut w, s);
    }

    out.write_all(&w.into_bytes())?;
    out.flush()?;
    Ok(())
}

/// Read a world and its session table back from `input`. Round-trips
/// `read(write(W)) == W` on fixed patches, agents, clock, next-agent-id,
/// and the session table.
pub fn read<R: Read>(input: &mut R) -> SnapshotResult<(World, Vec<SessionRecord>)> {
    let mut buf = Vec::new();
    input.read_to_end(&mut buf)?;
    let mut r = ByteReader::new(&buf);

    let mut magic = [0u8; 4];
    for slot in magic.iter_mut() {
        *slot = r.u8()?;
    }
    if magic != MAGIC {
        return Err(SnapshotError::BadMagic(magic));
    }
    let version = r.u32()?;
    if version != VERSION {
        return Err(SnapshotError::UnsupportedVersion { found: version, supported: VERSION });
    }

    let mut config = read_world_config(&mut r)?;
    let seed = r.u64()?;
    config.seed = seed;

    let patch_count = r.u64()? as usize;
    let mut store = PatchStore::new();
    for _ in 0..patch_count {
        let mut patch = read_patch(&mut r)?;
        patch.rebuild_vision(&config.items);
        store.insert_snapshot_patch(patch);
    }

    let agent_count = r.u64()? as usize;
    let item_count = config.items.len();
    let mut agent_map: FxHashMap<AgentId, AgentRecord> = FxHashMap::default();
    agent_map.reserve(agent_count);
    for _ in 0..agent_count {
        let id = AgentId(r.u64()?);
        let position = read_position(&mut r)?;
        let facing = read_direction(&mut r)?;
        let active = r.u8()? != 0;
        let inventory = r.u32_vec()?;
        let mut record = AgentRecord::new(position, facing, item_count);
        record.active = active;
        record.inventory = inventory;
        agent_map.insert(id, record);
    }

    let clock = Tick(r.u64()?);
    let next_agent_id = r.u64()?;

    let session_count = r.u32()? as usize;
    let mut sessions = Vec::with_capacity(session_count);
    for _ in 0..session_count {
        sessions.push(read_session(&mut r)?);
    }

    let agents = jbw_agent::AgentRegistry::from_parts(item_count, next_agent_id, agent_map);
    let world = World {
        config,
        store,
        agents,
        registry: jbw_core::Registry::new(),
        clock,
    };

    Ok((world, sessions))
}

/// Re-derive the `AgentState` caches (scent/vision) that the snapshot
/// intentionally omits, for every
/// agent restored by [`read`]. Convenience for a host that wants a fully
/// warmed-up world immediately after loading, rather than waiting for
/// the first tick's `refresh_caches` pass.
pub fn refresh_all_caches(world: &mut World) -> Vec<(AgentId, AgentState)> {
    let ids = world.agents.agent_ids();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let _ = world.refresh_caches(id);
        if let Ok(state) = world.agent_state(id) {
            out.push((id, state));
        }
    }
    out
}
