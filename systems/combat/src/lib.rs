#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Automatic unit combat, resolved once per round after arbitration.
//!
//! Units fight on their own: every unit alive at the start of the phase
//! takes one turn in grid scan order. A unit picks a uniformly random
//! hostile target from the surrounding box: an enemy unit, or a destroyable
//! enemy building. Unit duels damage both sides at once; the stronger side
//! lands the heavier blow but neither roll drops below the configured
//! damage floor.

use landgrab_core::{BuildingKind, Event, Rules, TileCoord};
use landgrab_world::{query, Tile, World};
use rand::Rng;

#[derive(Clone, Copy)]
enum Target {
    Unit(TileCoord),
    Building(TileCoord, BuildingKind),
}

/// Runs the combat phase for the round.
///
/// The turn roster is fixed up front; a unit killed before its turn simply
/// never acts. Units with no hostile neighbor stand idle.
pub fn resolve_combat<R: Rng>(
    world: &mut World,
    rules: &Rules,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) {
    let roster = query::unit_positions(world);
    for pos in roster {
        let Some(attacker) = world.grid().tile(pos).and_then(Tile::unit) else {
            continue;
        };

        let mut targets = Vec::new();
        for neighbor in world.grid().surrounding(pos, 1, true) {
            let Some(tile) = world.grid().tile(neighbor) else {
                continue;
            };
            if tile
                .unit()
                .is_some_and(|unit| unit.owner != attacker.owner)
            {
                targets.push(Target::Unit(neighbor));
            }
            for building in tile.buildings() {
                if building.owner != attacker.owner && building.health.is_some() {
                    targets.push(Target::Building(neighbor, building.kind));
                }
            }
        }
        if targets.is_empty() {
            continue;
        }

        match targets[rng.gen_range(0..targets.len())] {
            Target::Unit(defender_pos) => {
                fight(world, rules, pos, defender_pos, out_events);
            }
            Target::Building(building_pos, kind) => {
                let _ = world.damage_building(
                    building_pos,
                    kind,
                    rules.building_damage,
                    out_events,
                );
            }
        }
    }
}

/// Resolves one unit duel: both sides take damage simultaneously.
fn fight(
    world: &mut World,
    rules: &Rules,
    attacker_pos: TileCoord,
    defender_pos: TileCoord,
    out_events: &mut Vec<Event>,
) {
    let Some(attacker) = world.grid().tile(attacker_pos).and_then(Tile::unit) else {
        return;
    };
    let Some(defender) = world.grid().tile(defender_pos).and_then(Tile::unit) else {
        return;
    };

    let advantage = attacker.strength - defender.strength;
    let damage_to_attacker =
        ((0.3 * advantage as f32).round() as i32).max(rules.min_damage);
    let damage_to_defender =
        ((0.7 * advantage as f32).round() as i32).max(rules.min_damage);

    out_events.push(Event::UnitAttacked {
        attacker: attacker_pos,
        defender: defender_pos,
        damage_to_attacker,
        damage_to_defender,
    });
    let _ = world.damage_unit(defender_pos, damage_to_defender, out_events);
    let _ = world.damage_unit(attacker_pos, damage_to_attacker, out_events);
}
