//! Per-direction/turn action gating and movement-conflict resolution.

/// Whether a given direction or turn is permitted for an agent.
///
/// `Ignored` lets a request through but makes it a no-op; `Disallowed`
/// rejects it at submission instead of silently dropping it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionPolicy {
    Allowed,
    Disallowed,
    Ignored,
}

impl ActionPolicy {
    pub fn is_allowed(self) -> bool {
        matches!(self, ActionPolicy::Allowed)
    }

    pub fn is_disallowed(self) -> bool {
        matches!(self, ActionPolicy::Disallowed)
    }

    pub fn is_ignored(self) -> bool {
        matches!(self, ActionPolicy::Ignored)
    }
}

/// How to resolve two or more agents targeting the same destination cell
/// in the same tick.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovementConflictPolicy {
    /// Every claimant of a contested cell stays put.
    NoCollisions,
    /// The agent that submitted its action first wins; the rest stay put.
    FirstComeFirstServed,
    /// A winner is drawn uniformly at random among claimants.
    Random,
}
