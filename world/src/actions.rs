//! Action validation and execution against the authoritative world.
//!
//! [`validate`] is pure: it inspects the pre-round world and reports the
//! first failed precondition. [`execute`] is only called for actions that
//! passed validation and won conflict arbitration; it applies the action's
//! effects and returns the earned reward. The arbiter enforces that all
//! validations for a round complete before any execution begins.

use landgrab_core::{
    Action, ActionKind, AgentId, BuildingKind, Event, Rejection, Rules, Terrain, TileCoord,
};

use crate::{Tile, World};

/// Checks every precondition of the action against the current world.
///
/// Checked in order: agent identity, position bounds, affordability, then
/// the kind-specific rules. Never mutates state.
pub fn validate(world: &World, action: &Action, rules: &Rules) -> Result<(), Rejection> {
    let Some(agent) = world.agent(action.agent) else {
        return Err(Rejection::UnknownAgent);
    };
    let Some(tile) = world.grid().tile(action.target) else {
        return Err(Rejection::OutOfBounds);
    };
    if agent.money() < rules.cost(action.kind, tile.terrain()) {
        return Err(Rejection::InsufficientFunds);
    }

    let id = action.agent;
    let pos = action.target;
    match action.kind {
        ActionKind::Wait => Ok(()),
        ActionKind::Claim => validate_claim(world, tile, id, pos),
        ActionKind::BuildCity => validate_city(world, tile, id, pos, rules),
        ActionKind::BuildFarm => {
            validate_owned_build(tile, id, &[Terrain::Land, Terrain::Marsh])
        }
        ActionKind::BuildMine => validate_owned_build(tile, id, &[Terrain::Mountain]),
        ActionKind::BuildRoad => validate_connective(
            world,
            tile,
            id,
            pos,
            BuildingKind::Road,
            &[Terrain::Land, Terrain::Desert, Terrain::Marsh, Terrain::Mountain],
        ),
        ActionKind::BuildBridge => validate_connective(
            world,
            tile,
            id,
            pos,
            BuildingKind::Bridge,
            &[Terrain::River, Terrain::Ocean],
        ),
        ActionKind::PlaceUnit => validate_place_unit(world, tile, id, pos, rules),
        ActionKind::WithdrawUnit => match tile.unit() {
            Some(unit) if unit.owner == id => Ok(()),
            _ => Err(Rejection::NoOwnUnit),
        },
        ActionKind::Destroy => validate_destroy(world, tile, id, pos),
    }
}

fn validate_claim(
    world: &World,
    tile: &Tile,
    id: AgentId,
    pos: TileCoord,
) -> Result<(), Rejection> {
    if tile.owner().is_some() {
        return Err(Rejection::AlreadyOwned);
    }
    if !world.grid().is_visible(pos, id) {
        return Err(Rejection::NotVisible);
    }
    if tile.unit().is_some_and(|unit| unit.owner != id) {
        return Err(Rejection::EnemyUnitPresent);
    }
    if world.grid().adjacent_owned(pos, id, 1, true).is_none() {
        return Err(Rejection::NoAdjacentTerritory);
    }
    Ok(())
}

fn validate_city(
    world: &World,
    tile: &Tile,
    id: AgentId,
    pos: TileCoord,
    rules: &Rules,
) -> Result<(), Rejection> {
    if !matches!(
        tile.terrain(),
        Terrain::Land | Terrain::Desert | Terrain::Marsh
    ) {
        return Err(Rejection::WrongTerrain);
    }
    if !world.grid().is_visible(pos, id) {
        return Err(Rejection::NotVisible);
    }
    if tile.building_mask() != 0 {
        return Err(Rejection::BuildingPresent);
    }
    if tile.owner().is_some_and(|owner| owner != id) {
        return Err(Rejection::ForeignTile);
    }
    if world
        .grid()
        .adjacent_building(pos, BuildingKind::City, rules.city_clearance_radius, true)
        .is_some()
    {
        return Err(Rejection::CityTooClose);
    }
    Ok(())
}

fn validate_owned_build(
    tile: &Tile,
    id: AgentId,
    terrains: &[Terrain],
) -> Result<(), Rejection> {
    if !terrains.contains(&tile.terrain()) {
        return Err(Rejection::WrongTerrain);
    }
    if tile.owner() != Some(id) {
        return Err(Rejection::NotOwned);
    }
    if tile.building_mask() != 0 {
        return Err(Rejection::BuildingPresent);
    }
    Ok(())
}

fn validate_connective(
    world: &World,
    tile: &Tile,
    id: AgentId,
    pos: TileCoord,
    kind: BuildingKind,
    terrains: &[Terrain],
) -> Result<(), Rejection> {
    if !terrains.contains(&tile.terrain()) {
        return Err(Rejection::WrongTerrain);
    }
    if tile.has_building(kind) {
        return Err(Rejection::BuildingPresent);
    }
    let grid = world.grid();
    let connected = tile.owner() == Some(id)
        || grid.adjacent_owned(pos, id, 1, true).is_some()
        || grid
            .adjacent_building(pos, BuildingKind::Road, 1, true)
            .is_some()
        || grid
            .adjacent_building(pos, BuildingKind::Bridge, 1, true)
            .is_some();
    if connected {
        Ok(())
    } else {
        Err(Rejection::NoAdjacentTerritory)
    }
}

fn validate_place_unit(
    world: &World,
    tile: &Tile,
    id: AgentId,
    pos: TileCoord,
    rules: &Rules,
) -> Result<(), Rejection> {
    if !world.grid().is_visible(pos, id) {
        return Err(Rejection::NotVisible);
    }
    if !matches!(
        tile.terrain(),
        Terrain::Land | Terrain::Marsh | Terrain::Desert
    ) {
        return Err(Rejection::WrongTerrain);
    }
    if tile.unit().is_some_and(|unit| unit.owner != id) {
        return Err(Rejection::EnemyUnitPresent);
    }
    if tile.owner().is_some_and(|owner| owner != id) {
        let friendly = world
            .grid()
            .surrounding(pos, 1, true)
            .into_iter()
            .filter(|neighbor| {
                world
                    .grid()
                    .tile(*neighbor)
                    .and_then(Tile::unit)
                    .is_some_and(|unit| unit.owner == id)
            })
            .count();
        if (friendly as u32) < rules.conquer_threshold {
            return Err(Rejection::ConquestThresholdUnmet);
        }
    }
    Ok(())
}

fn validate_destroy(
    world: &World,
    tile: &Tile,
    id: AgentId,
    pos: TileCoord,
) -> Result<(), Rejection> {
    if tile.buildings().is_empty() {
        return Err(Rejection::NoBuilding);
    }
    if !world.grid().is_visible(pos, id) {
        return Err(Rejection::NotVisible);
    }
    if destroy_target(tile, id).is_none() {
        return Err(Rejection::ForeignTile);
    }
    Ok(())
}

/// Building the agent is entitled to demolish on the tile: the newest of
/// its own buildings, or the newest of any building once the tile has no
/// owner. Foreign buildings on an owned tile stay out of reach even when
/// they were placed later.
fn destroy_target(tile: &Tile, id: AgentId) -> Option<BuildingKind> {
    tile.buildings()
        .iter()
        .rev()
        .find(|building| building.owner == id || tile.owner().is_none())
        .map(|building| building.kind)
}

/// Applies the action's effects and returns the earned reward.
///
/// Must only be called for actions that passed [`validate`] this round and
/// won conflict arbitration.
pub fn execute(
    world: &mut World,
    action: &Action,
    rules: &Rules,
    out_events: &mut Vec<Event>,
) -> f32 {
    let id = action.agent;
    let pos = action.target;
    let terrain = world
        .grid()
        .tile(pos)
        .map_or(Terrain::Land, Tile::terrain);
    let cost = rules.cost(action.kind, terrain);

    match action.kind {
        ActionKind::Wait => 0.0,
        ActionKind::Claim => {
            world.adjust_money(id, -cost);
            world.claim_tile(id, pos);
            out_events.push(Event::TileClaimed { agent: id, tile: pos });
            rules.claim_reward + reveal(world, id, pos, rules, out_events)
        }
        ActionKind::BuildCity
        | ActionKind::BuildRoad
        | ActionKind::BuildBridge
        | ActionKind::BuildFarm
        | ActionKind::BuildMine => {
            let Some(kind) = action.kind.building() else {
                return 0.0;
            };
            world.adjust_money(id, -cost);
            // Building on unowned ground claims it; a road laid across a
            // foreign tile leaves its ownership alone.
            if world.grid().tile(pos).and_then(Tile::owner).is_none() {
                world.claim_tile(id, pos);
                out_events.push(Event::TileClaimed { agent: id, tile: pos });
            }
            world.place_building(id, kind, pos);
            out_events.push(Event::BuildingPlaced {
                agent: id,
                kind,
                tile: pos,
            });
            rules.build_reward + reveal(world, id, pos, rules, out_events)
        }
        ActionKind::PlaceUnit => {
            world.adjust_money(id, -cost);
            if world
                .grid()
                .tile(pos)
                .and_then(Tile::owner)
                .is_some_and(|owner| owner != id)
            {
                // Auto-conquest: the surrounding friendly presence validated
                // this round transfers the tile to the acting agent.
                world.claim_tile(id, pos);
                out_events.push(Event::TileClaimed { agent: id, tile: pos });
            }
            let strength = world
                .place_unit(id, pos, rules.unit_strength, rules.max_unit_strength)
                .unwrap_or(0);
            out_events.push(Event::UnitPlaced {
                agent: id,
                tile: pos,
                strength,
            });
            rules.place_unit_reward + reveal(world, id, pos, rules, out_events)
        }
        ActionKind::WithdrawUnit => {
            let Some(unit) = world.remove_unit(pos) else {
                return 0.0;
            };
            let refund = unit.strength as f32 * rules.withdraw_refund_ratio;
            world.adjust_money(id, refund);
            out_events.push(Event::UnitWithdrawn {
                agent: id,
                tile: pos,
                refund,
            });
            refund
        }
        ActionKind::Destroy => {
            let Some(kind) = world
                .grid()
                .tile(pos)
                .and_then(|tile| destroy_target(tile, id))
            else {
                return 0.0;
            };
            let Some(removed) = world.remove_building(kind, pos) else {
                return 0.0;
            };
            out_events.push(Event::BuildingRemoved { kind, tile: pos });
            removed.income_per_turn * rules.destroy_recuperation
        }
    }
}

fn reveal(
    world: &mut World,
    id: AgentId,
    pos: TileCoord,
    rules: &Rules,
    out_events: &mut Vec<Event>,
) -> f32 {
    let revealed = world
        .grid_mut()
        .reveal_area(id, pos, rules.visibility_range);
    if revealed > 0 {
        out_events.push(Event::TilesRevealed {
            agent: id,
            count: revealed,
        });
    }
    revealed as f32 * rules.discovery_bonus
}
