use landgrab_core::{AgentId, BuildingKind, Event, Rules, TileCoord};
use landgrab_system_combat::resolve_combat;
use landgrab_world::{Grid, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn world() -> World {
    World::new(Grid::all_land(10, 10), 2, &Rules::default())
}

fn strength_at(world: &World, pos: TileCoord) -> Option<i32> {
    world
        .grid()
        .tile(pos)
        .and_then(|tile| tile.unit())
        .map(|unit| unit.strength)
}

#[test]
fn stronger_unit_kills_weaker_neighbor() {
    let rules = Rules::default();
    let mut world = world();
    let strong = TileCoord::new(5, 5);
    let weak = TileCoord::new(5, 6);
    assert_eq!(world.place_unit(AgentId::new(0), strong, 90, 100), Some(90));
    assert_eq!(world.place_unit(AgentId::new(1), weak, 30, 100), Some(30));

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut events = Vec::new();
    resolve_combat(&mut world, &rules, &mut rng, &mut events);

    // advantage 60: defender takes round(0.7 * 60) = 42 and dies, the
    // attacker takes round(0.3 * 60) = 18.
    assert_eq!(strength_at(&world, weak), None);
    assert_eq!(strength_at(&world, strong), Some(72));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::UnitKilled { agent, .. } if *agent == AgentId::new(1)
    )));
    let attacks = events
        .iter()
        .filter(|event| matches!(event, Event::UnitAttacked { .. }))
        .count();
    assert_eq!(attacks, 1, "the dead defender must not take a turn");
}

#[test]
fn equal_units_grind_at_the_damage_floor() {
    let rules = Rules::default();
    let mut world = world();
    let a = TileCoord::new(4, 4);
    let b = TileCoord::new(5, 4);
    assert_eq!(world.place_unit(AgentId::new(0), a, 50, 100), Some(50));
    assert_eq!(world.place_unit(AgentId::new(1), b, 50, 100), Some(50));

    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut events = Vec::new();
    resolve_combat(&mut world, &rules, &mut rng, &mut events);

    // Two duels, each costing both sides the floor damage.
    assert_eq!(strength_at(&world, a), Some(50 - 2 * rules.min_damage));
    assert_eq!(strength_at(&world, b), Some(50 - 2 * rules.min_damage));
}

#[test]
fn friendly_units_never_fight() {
    let rules = Rules::default();
    let mut world = world();
    let a = TileCoord::new(4, 4);
    let b = TileCoord::new(5, 4);
    assert_eq!(world.place_unit(AgentId::new(0), a, 50, 100), Some(50));
    assert_eq!(world.place_unit(AgentId::new(0), b, 50, 100), Some(50));

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut events = Vec::new();
    resolve_combat(&mut world, &rules, &mut rng, &mut events);

    assert_eq!(strength_at(&world, a), Some(50));
    assert_eq!(strength_at(&world, b), Some(50));
    assert!(events.is_empty());
}

#[test]
fn isolated_unit_stands_idle() {
    let rules = Rules::default();
    let mut world = world();
    let pos = TileCoord::new(2, 2);
    assert_eq!(world.place_unit(AgentId::new(0), pos, 50, 100), Some(50));

    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut events = Vec::new();
    resolve_combat(&mut world, &rules, &mut rng, &mut events);

    assert_eq!(strength_at(&world, pos), Some(50));
    assert!(events.is_empty());
}

#[test]
fn units_raze_adjacent_enemy_buildings() {
    let rules = Rules::default();
    let mut world = world();
    let farm = TileCoord::new(5, 5);
    let raider = TileCoord::new(5, 6);
    world.place_building(AgentId::new(1), BuildingKind::Farm, farm);
    assert_eq!(world.place_unit(AgentId::new(0), raider, 50, 100), Some(50));

    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut events = Vec::new();
    // Farm health 100 against 25 damage per phase.
    for _ in 0..3 {
        resolve_combat(&mut world, &rules, &mut rng, &mut events);
    }
    assert!(world
        .grid()
        .tile(farm)
        .expect("tile")
        .has_building(BuildingKind::Farm));

    resolve_combat(&mut world, &rules, &mut rng, &mut events);
    assert!(!world
        .grid()
        .tile(farm)
        .expect("tile")
        .has_building(BuildingKind::Farm));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::BuildingDestroyed { kind: BuildingKind::Farm, .. }
    )));
    assert_eq!(strength_at(&world, raider), Some(50), "buildings do not hit back");
}

#[test]
fn indestructible_roads_are_never_targeted() {
    let rules = Rules::default();
    let mut world = world();
    let road = TileCoord::new(5, 5);
    let unit = TileCoord::new(5, 6);
    world.place_building(AgentId::new(1), BuildingKind::Road, road);
    assert_eq!(world.place_unit(AgentId::new(0), unit, 50, 100), Some(50));

    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut events = Vec::new();
    resolve_combat(&mut world, &rules, &mut rng, &mut events);

    assert!(world
        .grid()
        .tile(road)
        .expect("tile")
        .has_building(BuildingKind::Road));
    assert!(events.is_empty());
}
