use landgrab_core::{ActionDescriptor, ActionKind, Rules, Terrain};
use landgrab_env::{codec, Session, SessionConfig, SessionError};
use landgrab_world::query;
use landgrab_world::Grid;

fn wait_batches(agents: usize) -> Vec<Vec<ActionDescriptor>> {
    vec![vec![ActionDescriptor::new(ActionKind::Wait.id(), 0, 0)]; agents]
}

#[test]
fn identical_seeds_produce_identical_episodes() {
    let mut first = Session::new(SessionConfig::new(12, 12, 3), 99).expect("session");
    let mut second = Session::new(SessionConfig::new(12, 12, 3), 99).expect("session");

    assert_eq!(first.reset().data(), second.reset().data());

    for _ in 0..5 {
        let a = first.step(&wait_batches(3)).expect("step");
        let b = second.step(&wait_batches(3)).expect("step");
        assert_eq!(a.rewards, b.rewards);
        assert_eq!(a.observation.data(), b.observation.data());
    }
}

#[test]
fn reset_restores_the_initial_observation() {
    let mut session = Session::new(SessionConfig::new(10, 10, 2), 7).expect("session");
    let initial = session.reset();
    let _ = session.step(&wait_batches(2)).expect("step");
    assert_eq!(session.round(), 1);

    let restored = session.reset();
    assert_eq!(initial.data(), restored.data());
    assert_eq!(session.round(), 0);
}

#[test]
fn episodes_never_terminate_from_inside() {
    let mut session = Session::new(SessionConfig::new(8, 8, 2), 1).expect("session");
    let outcome = session.step(&wait_batches(2)).expect("step");
    assert_eq!(outcome.dones, vec![false, false]);
}

#[test]
fn waiting_agents_still_collect_territory_income() {
    let mut session = Session::new(SessionConfig::new(8, 8, 2), 1).expect("session");
    let before = query::balances(session.world());
    let _ = session.step(&wait_batches(2)).expect("step");
    let after = query::balances(session.world());

    // Each agent starts with one claimed land tile worth its base value.
    for (before, after) in before.iter().zip(&after) {
        assert!((after - before - Terrain::Land.base_value()).abs() < f32::EPSILON);
    }
}

#[test]
fn observation_shape_matches_the_configured_grid() {
    let mut session = Session::new(SessionConfig::new(6, 9, 2), 5).expect("session");
    let observation = session.reset();
    assert_eq!(observation.width(), 6);
    assert_eq!(observation.height(), 9);
    assert_eq!(observation.data().len(), 6 * 9 * observation.channels());
}

#[test]
fn saved_maps_reload_into_equivalent_sessions() {
    let mut terrain = vec![Terrain::Land; 8 * 8];
    terrain[10] = Terrain::Mountain;
    terrain[20] = Terrain::River;
    terrain[30] = Terrain::Desert;
    let session = Session::with_grid(
        Grid::from_terrain(8, 8, &terrain),
        2,
        Rules::default(),
        3,
    )
    .expect("session");

    let saved = session.save_map();
    let snapshot = codec::decode(&saved).expect("saved maps decode");
    let reloaded =
        Session::with_snapshot(&snapshot, 2, Rules::default(), 3).expect("session");
    assert_eq!(reloaded.save_map(), saved);
}

#[test]
fn swapping_the_map_starts_a_fresh_episode() {
    let mut session = Session::new(SessionConfig::new(8, 8, 2), 4).expect("session");
    let _ = session.step(&wait_batches(2)).expect("step");

    let mut terrain = vec![Terrain::Land; 5 * 5];
    terrain[12] = Terrain::Mountain;
    let observation = session
        .reset_with_grid(Grid::from_terrain(5, 5, &terrain))
        .expect("map swap");

    assert_eq!(observation.width(), 5);
    assert_eq!(session.round(), 0);
    assert_eq!(
        observation.feature(2, 2, query::Feature::TerrainCode),
        Some(f32::from(Terrain::Mountain.code()))
    );
}

#[test]
fn malformed_descriptors_abort_the_step() {
    let mut session = Session::new(SessionConfig::new(8, 8, 2), 1).expect("session");
    let batches = vec![vec![ActionDescriptor::new(200, 0, 0)], Vec::new()];
    assert!(session.step(&batches).is_err());
}

#[test]
fn construction_rejects_degenerate_configurations() {
    assert!(matches!(
        Session::new(SessionConfig::new(0, 5, 2), 1),
        Err(SessionError::EmptyMap)
    ));
    assert!(matches!(
        Session::new(SessionConfig::new(5, 5, 0), 1),
        Err(SessionError::UnsupportedAgentCount { requested: 0 })
    ));

    let ocean = Grid::from_terrain(3, 3, &[Terrain::Ocean; 9]);
    assert!(matches!(
        Session::with_grid(ocean, 2, Rules::default(), 1),
        Err(SessionError::NotEnoughLand { candidates: 0, agents: 2 })
    ));
}
