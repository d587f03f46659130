//! Movement-conflict resolution.
//!
//! A destination cell is contested when more than one agent targets it, or
//! when an agent targets a cell some other agent will still occupy at
//! end-of-tick. The second case is the tricky one: whether "some other
//! agent" still occupies that cell can itself depend on how *its* own
//! conflict resolves, so this runs to a fixed point rather than a single
//! pass — an agent that ends up losing its own contest stays at its
//! current cell, which may in turn contest a different agent's move.

use std::collections::{HashMap, HashSet};

use jbw_core::{AgentId, MovementConflictPolicy, Position, TickRng};

#[derive(Clone, Copy)]
struct Mover {
    agent: AgentId,
    current: Position,
    destination: Position,
}

/// Resolve every mover's final position for this tick.
///
/// `stationary` is the set of positions held by agents with no pending
/// move (no action, a turn/no-op, or a move blocked by terrain) — these
/// never change and always win any contest. `submission_order` ranks
/// agents by how early they submitted this tick's action, for
/// `FirstComeFirstServed`. Returns every mover's agent id mapped to its
/// final position (the destination if it won, its original position if
/// it lost).
pub fn resolve_moves(
    movers: &[(AgentId, Position, Position)],
    stationary: &HashSet<Position>,
    submission_order: &[AgentId],
    policy: MovementConflictPolicy,
    tick_rng: &mut TickRng,
) -> HashMap<AgentId, Position> {
    let rank: HashMap<AgentId, usize> =
        submission_order.iter().enumerate().map(|(i, &a)| (a, i)).collect();

    let mut movers: Vec<Mover> =
        movers.iter().map(|&(agent, current, destination)| Mover { agent, current, destination }).collect();
    let mut winners: HashMap<AgentId, Position> = HashMap::new();

    // Fixed-point pass: repeatedly finalize any mover whose destination is
    // uncontested *and* not currently claimed by anyone (stationary,
    // already-finalized, or still-undecided) else.
    loop {
        let occupied: HashSet<Position> = stationary
            .iter()
            .copied()
            .chain(winners.values().copied())
            .chain(movers.iter().map(|m| m.current))
            .collect();

        let mut groups: HashMap<Position, Vec<usize>> = HashMap::new();
        for (i, m) in movers.iter().enumerate() {
            groups.entry(m.destination).or_default().push(i);
        }

        let mut progressed = false;
        let mut still_pending = Vec::new();
        for (dest, idxs) in &groups {
            let claimed_by_other = occupied.contains(dest) && !idxs.iter().any(|&i| movers[i].current == *dest);
            if idxs.len() == 1 && !claimed_by_other {
                winners.insert(movers[idxs[0]].agent, *dest);
                progressed = true;
            } else {
                still_pending.extend(idxs.iter().copied());
            }
        }

        if !progressed {
            // No more destinations can be resolved just by waiting: every
            // remaining contest is either genuinely multi-claimant or
            // blocked by an agent that is itself part of a cycle (a chain
            // of movers each wanting the next one's cell). Resolve them
            // all now via the configured policy; anyone not chosen stays
            // at their current position.
            let occupied: HashSet<Position> = stationary.iter().copied().chain(winners.values().copied()).collect();
            for (dest, idxs) in &groups {
                if !idxs.iter().any(|i| still_pending.contains(i)) {
                    continue;
                }
                if occupied.contains(dest) {
                    continue; // every claimant loses, stays put
                }
                let winner_idx = match policy {
                    MovementConflictPolicy::NoCollisions => None,
                    MovementConflictPolicy::FirstComeFirstServed => {
                        idxs.iter().copied().min_by_key(|&i| rank.get(&movers[i].agent).copied().unwrap_or(usize::MAX))
                    }
                    MovementConflictPolicy::Random => tick_rng.choose(idxs).copied(),
                };
                if let Some(i) = winner_idx {
                    winners.insert(movers[i].agent, *dest);
                }
            }
            break;
        }

        movers.retain(|m| !winners.contains_key(&m.agent));
        if movers.is_empty() {
            break;
        }
    }

    movers = still_pending_movers(movers, &winners);
    let mut final_positions: HashMap<AgentId, Position> = HashMap::new();
    for m in &movers {
        final_positions.entry(m.agent).or_insert(m.current);
    }
    for (&agent, &pos) in &winners {
        final_positions.insert(agent, pos);
    }
    final_positions
}

fn still_pending_movers(movers: Vec<Mover>, winners: &HashMap<AgentId, Position>) -> Vec<Mover> {
    movers.into_iter().filter(|m| !winners.contains_key(&m.agent)).collect()
}
