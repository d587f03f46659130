use jbw_core::{
    ClientId, DirectionPolicies, IntensityFn, ItemType, MovementConflictPolicy, Permissions, PatchCoord, SessionRecord,
    TurnPolicies, WorldConfig,
};
use jbw_world::World;

fn sample_config() -> WorldConfig {
    WorldConfig {
        patch_size: 4,
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
            intensity_fn: IntensityFn::constant(5.0),
            interaction_fn: std::collections::HashMap::new(),
        }],
        mcmc_iterations: 4,
        scent_decay: 0.5,
        scent_diffusion: 0.1,
        deleted_item_lifetime: 5,
        movement_conflict_policy: MovementConflictPolicy::NoCollisions,
        direction_policies: DirectionPolicies::default(),
        turn_policies: TurnPolicies::default(),
        seed: 7,
    }
}

#[test]
fn round_trip_preserves_patches_agents_clock_and_next_id() {
    let mut world = World::new(sample_config()).unwrap();
    let a1 = world.add_agent();
    let _a2 = world.add_agent();
    world.get_fixed_patch(PatchCoord::new(0, 0));
    world.get_fixed_patch(PatchCoord::new(1, 0));
    world.agents.set_active(a1, false).unwrap();

    let sessions = vec![SessionRecord {
        client_id: ClientId(1),
        owned_agent_ids: vec![a1],
        permissions: Permissions::all(),
    }];

    let mut buf = Vec::new();
    crate::write_with_sessions(&world, &sessions, &mut buf).unwrap();

    let (world2, sessions2) = crate::read(&mut std::io::Cursor::new(buf)).unwrap();

    assert_eq!(world2.clock, world.clock);
    assert_eq!(world2.agents.next_agent_id(), world.agents.next_agent_id());
    assert_eq!(world2.config.patch_size, world.config.patch_size);
    assert_eq!(world2.config.seed, world.config.seed);
    assert_eq!(world2.config.items.len(), world.config.items.len());

    let before = world.agents.snapshot_records();
    let after = world2.agents.snapshot_records();
    assert_eq!(before.len(), after.len());
    for ((id1, rec1), (id2, rec2)) in before.iter().zip(after.iter()) {
        assert_eq!(id1, id2);
        assert_eq!(rec1.position, rec2.position);
        assert_eq!(rec1.facing, rec2.facing);
        assert_eq!(rec1.active, rec2.active);
        assert_eq!(rec1.inventory, rec2.inventory);
    }

    for coord in [PatchCoord::new(0, 0), PatchCoord::new(1, 0)] {
        let p1 = world.store.get_if_fixed(coord).unwrap();
        let p2 = world2.store.get_if_fixed(coord).unwrap();
        assert_eq!(p1.items.len(), p2.items.len());
        let mut items1 = p1.items.clone();
        let mut items2 = p2.items.clone();
        items1.sort_by_key(|it| (it.local.0, it.local.1));
        items2.sort_by_key(|it| (it.local.0, it.local.1));
        assert_eq!(items1, items2);
        assert_eq!(p1.scent, p2.scent);
    }

    assert_eq!(sessions2.len(), 1);
    assert_eq!(sessions2[0].client_id, ClientId(1));
    assert_eq!(sessions2[0].owned_agent_ids, vec![a1]);
    assert_eq!(sessions2[0].permissions, Permissions::all());
}

#[test]
fn bad_magic_is_rejected() {
    let buf = vec![0u8; 16];
    let err = crate::read(&mut std::io::Cursor::new(buf)).unwrap_err();
    assert!(matches!(err, crate::SnapshotError::BadMagic(_)));
}
