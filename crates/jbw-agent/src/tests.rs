use jbw_core::{Direction, Position};

use crate::registry::AgentRegistry;

#[test]
fn agent_ids_are_monotonic_and_never_reused() {
    let mut reg = AgentRegistry::new(2);
    let a = reg.add_agent(Position::new(0, 0), Direction::Up);
    let b = reg.add_agent(Position::new(1, 0), Direction::Up);
    assert!(b.get() > a.get());

    reg.remove_agent(a).unwrap();
    let c = reg.add_agent(Position::new(2, 0), Direction::Up);
    assert!(c.get() > b.get());
    assert!(!reg.contains(a));
}

#[test]
fn set_active_is_idempotent() {
    let mut reg = AgentRegistry::new(1);
    let a = reg.add_agent(Position::new(0, 0), Direction::Up);

    reg.set_active(a, false).unwrap();
    reg.set_active(a, false).unwrap();
    assert!(!reg.is_active(a).unwrap());

    reg.set_active(a, true).unwrap();
    reg.set_active(a, true).unwrap();
    assert!(reg.is_active(a).unwrap());
}

#[test]
fn remove_unknown_agent_is_invalid_agent_id() {
    let mut reg = AgentRegistry::new(1);
    let bogus = reg.add_agent(Position::new(0, 0), Direction::Up);
    reg.remove_agent(bogus).unwrap();
    assert!(reg.remove_agent(bogus).is_err());
}

#[test]
fn active_agent_ids_reflects_set_active() {
    let mut reg = AgentRegistry::new(1);
    let a = reg.add_agent(Position::new(0, 0), Direction::Up);
    let b = reg.add_agent(Position::new(1, 0), Direction::Up);
    reg.set_active(b, false).unwrap();

    let active = reg.active_agent_ids();
    assert_eq!(active, vec![a]);
}
