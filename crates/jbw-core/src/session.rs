//! Per-client permission flags and the serializable portion of a
//! server-side client session.
//!
//! The live session also owns a socket and a pending-broadcast flag;
//! those are runtime-only and live in `jbw-server`, which wraps
//! a [`SessionRecord`] with that connection state. This crate only
//! carries the part that needs to survive a snapshot.

use crate::ids::{AgentId, ClientId};

/// Boolean gates checked before a request is allowed to touch the world.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions {
    pub add_agent: bool,
    pub remove_agent: bool,
    pub remove_client: bool,
    pub set_active: bool,
    pub get_map: bool,
    pub get_agent_ids: bool,
    pub get_agent_states: bool,
}

impl Permissions {
    /// Every bit set. Assigned to a session created by CONNECT
    /// absent some host-side override; a host that wants a read-only
    /// client starts from `Permissions::none()` and opts bits back in.
    pub const fn all() -> Self {
        Permissions {
            add_agent: true,
            remove_agent: true,
            remove_client: true,
            set_active: true,
            get_map: true,
            get_agent_ids: true,
            get_agent_states: true,
        }
    }

    pub const fn none() -> Self {
        Permissions {
            add_agent: false,
            remove_agent: false,
            remove_client: false,
            set_active: false,
            get_map: false,
            get_agent_ids: false,
            get_agent_states: false,
        }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::all()
    }
}

/// The part of a client session that a snapshot needs to restore:
/// identity, owned agents, and permissions. Socket state and the
/// pending-broadcast flag are not meaningful across a save/restore
/// boundary and are rebuilt fresh by `jbw-server` on reconnect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionRecord {
    pub client_id: ClientId,
    pub owned_agent_ids: Vec<AgentId>,
    pub permissions: Permissions,
}
