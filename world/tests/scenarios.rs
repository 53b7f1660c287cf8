use landgrab_core::{Action, ActionKind, AgentId, Rejection, Rules, TileCoord};
use landgrab_world::{actions, query, Grid, World};

fn act(agent: u8, kind: ActionKind, x: u32, y: u32) -> Action {
    Action {
        agent: AgentId::new(agent),
        kind,
        target: TileCoord::new(x, y),
    }
}

fn run(world: &mut World, rules: &Rules, action: &Action) -> f32 {
    actions::validate(world, action, rules).expect("action must be legal");
    let mut events = Vec::new();
    actions::execute(world, action, rules, &mut events)
}

/// Every claimed-set entry must match the grid owner field and no tile may
/// appear in two agents' claimed sets.
fn assert_ownership_consistent(world: &World) {
    for agent in world.agents() {
        for pos in agent.claimed() {
            assert_eq!(
                world.grid().tile(*pos).expect("claimed tile in bounds").owner(),
                Some(agent.id()),
                "claimed set and grid owner disagree at {pos:?}"
            );
        }
    }
    for (pos, tile) in world.grid().iter() {
        if let Some(owner) = tile.owner() {
            assert!(
                world.agent(owner).expect("owner exists").claimed().contains(&pos),
                "owned tile {pos:?} missing from its agent's claimed set"
            );
        }
    }
}

#[test]
fn expansion_loop_earns_boosted_farm_income() {
    let rules = Rules::default();
    let mut world = World::new(Grid::all_land(10, 10), 1, &rules);
    let agent = AgentId::new(0);
    world.seed_agent_start(agent, TileCoord::new(5, 5), rules.visibility_range);

    let _ = run(&mut world, &rules, &act(0, ActionKind::Claim, 5, 6));
    let _ = run(&mut world, &rules, &act(0, ActionKind::BuildFarm, 5, 6));
    let _ = run(&mut world, &rules, &act(0, ActionKind::BuildRoad, 5, 5));

    // Claimed land is worth 1 + 1, the road costs its upkeep of 1, and the
    // farm next to the road earns 20 x 3 - 5 = 55.
    let before = world.agent(agent).expect("agent").money();
    world.collect_income();
    let after = world.agent(agent).expect("agent").money();
    assert!((after - before - 56.0).abs() < 1e-3);
}

#[test]
fn city_clearance_holds_across_agents() {
    let rules = Rules::default();
    let mut world = World::new(Grid::all_land(12, 12), 2, &rules);
    world.seed_agent_start(AgentId::new(0), TileCoord::new(5, 5), rules.visibility_range);
    world.seed_agent_start(AgentId::new(1), TileCoord::new(8, 5), rules.visibility_range);

    let _ = run(&mut world, &rules, &act(0, ActionKind::BuildCity, 5, 5));

    // (7, 5) sits at Chebyshev distance 2 from the standing city.
    assert_eq!(
        actions::validate(&world, &act(1, ActionKind::BuildCity, 7, 5), &rules),
        Err(Rejection::CityTooClose)
    );
    // (8, 5) is outside the clearance radius.
    actions::validate(&world, &act(1, ActionKind::BuildCity, 8, 5), &rules)
        .expect("a city outside the clearance radius is legal");
}

#[test]
fn visibility_only_ever_grows_within_an_episode() {
    let rules = Rules::default();
    let mut world = World::new(Grid::all_land(10, 10), 1, &rules);
    world.seed_agent_start(AgentId::new(0), TileCoord::new(2, 2), rules.visibility_range);

    let before = query::visibility_plane(&world);
    let _ = run(&mut world, &rules, &act(0, ActionKind::Claim, 3, 3));
    let _ = run(&mut world, &rules, &act(0, ActionKind::BuildRoad, 4, 3));
    let after = query::visibility_plane(&world);

    for (old, new) in before.iter().zip(&after) {
        assert_eq!(new & old, *old, "a set visibility bit was cleared");
    }
    assert!(
        after.iter().sum::<u64>() > before.iter().sum::<u64>(),
        "acting near the frontier must reveal new tiles"
    );
}

#[test]
fn ownership_stays_consistent_through_conquest() {
    let rules = Rules::default();
    let mut world = World::new(Grid::all_land(10, 10), 2, &rules);
    world.seed_agent_start(AgentId::new(0), TileCoord::new(4, 5), rules.visibility_range);
    world.seed_agent_start(AgentId::new(1), TileCoord::new(6, 5), rules.visibility_range);

    let _ = run(&mut world, &rules, &act(0, ActionKind::Claim, 4, 4));
    let _ = run(&mut world, &rules, &act(1, ActionKind::Claim, 6, 4));
    let _ = run(&mut world, &rules, &act(0, ActionKind::PlaceUnit, 5, 4));
    let _ = run(&mut world, &rules, &act(0, ActionKind::PlaceUnit, 5, 5));
    // Two friendly units now flank the enemy foothold at (6, 5).
    let _ = run(&mut world, &rules, &act(0, ActionKind::PlaceUnit, 6, 5));

    assert_eq!(
        world.grid().tile(TileCoord::new(6, 5)).expect("tile").owner(),
        Some(AgentId::new(0))
    );
    assert_ownership_consistent(&world);
}

#[test]
fn income_collection_is_stable_between_building_changes() {
    let rules = Rules::default();
    let mut world = World::new(Grid::all_land(10, 10), 1, &rules);
    let agent = AgentId::new(0);
    world.seed_agent_start(agent, TileCoord::new(5, 5), rules.visibility_range);
    let _ = run(&mut world, &rules, &act(0, ActionKind::BuildFarm, 5, 5));

    let start = world.agent(agent).expect("agent").money();
    world.collect_income();
    let first = world.agent(agent).expect("agent").money() - start;
    world.collect_income();
    let second = world.agent(agent).expect("agent").money() - start - first;
    assert!(
        (first - second).abs() < f32::EPSILON,
        "identical rounds must credit identical income"
    );
}
