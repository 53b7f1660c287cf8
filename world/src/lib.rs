#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Landgrab engine.
//!
//! The [`World`] owns the tile grid, the per-agent visibility plane, and all
//! per-agent economy state. Mutations flow through the action layer in
//! [`actions`] and the small set of operations defined here; systems and
//! adapters read state exclusively through [`query`] views.

pub mod actions;
mod grid;
mod income;
pub mod snapshot;

use std::collections::BTreeSet;

use landgrab_core::{AgentId, BuildingKind, Event, Rules, TileCoord};

pub use grid::{Building, Grid, Tile, Unit};

/// Per-agent economy state mutated exclusively by action effects.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    money: f32,
    claimed: BTreeSet<TileCoord>,
    buildings: Vec<(TileCoord, BuildingKind)>,
    units: Vec<TileCoord>,
}

impl Agent {
    fn new(id: AgentId, money: f32) -> Self {
        Self {
            id,
            money,
            claimed: BTreeSet::new(),
            buildings: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Current money balance.
    #[must_use]
    pub const fn money(&self) -> f32 {
        self.money
    }

    /// Tiles currently claimed by the agent, in deterministic order.
    #[must_use]
    pub const fn claimed(&self) -> &BTreeSet<TileCoord> {
        &self.claimed
    }

    /// Positions and kinds of buildings the agent owns.
    #[must_use]
    pub fn buildings(&self) -> &[(TileCoord, BuildingKind)] {
        &self.buildings
    }

    /// Positions of units the agent owns.
    #[must_use]
    pub fn units(&self) -> &[TileCoord] {
        &self.units
    }
}

/// Authoritative simulation state: grid plus agents, exclusively owned by
/// one session.
#[derive(Clone, Debug)]
pub struct World {
    grid: Grid,
    agents: Vec<Agent>,
}

impl World {
    /// Creates a world from a finished terrain grid with the given number
    /// of participating agents.
    #[must_use]
    pub fn new(grid: Grid, agent_count: u8, rules: &Rules) -> Self {
        let agents = (0..agent_count)
            .map(|id| Agent::new(AgentId::new(id), rules.starting_money))
            .collect();
        Self { grid, agents }
    }

    /// Read-only access to the tile grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable access to the grid for visibility operations.
    ///
    /// Ownership, building, and unit writes must go through the world so
    /// that agent rosters stay consistent.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Number of participating agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Read-only access to an agent's state.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.get() as usize)
    }

    /// Iterates over all agents in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.get() as usize)
    }

    /// Credits or debits an agent's balance.
    pub(crate) fn adjust_money(&mut self, id: AgentId, delta: f32) {
        if let Some(agent) = self.agent_mut(id) {
            agent.money += delta;
        }
    }

    /// Records tile ownership for the agent, maintaining exclusivity: any
    /// previous owner's claimed-set entry is removed first.
    ///
    /// Legality is the action layer's job; this operation only records the
    /// outcome.
    pub fn claim_tile(&mut self, id: AgentId, pos: TileCoord) {
        if let Some(previous) = self.grid.tile(pos).and_then(Tile::owner) {
            if previous != id {
                if let Some(agent) = self.agent_mut(previous) {
                    let _ = agent.claimed.remove(&pos);
                }
            }
        }
        self.grid.set_owner(pos, Some(id));
        if let Some(agent) = self.agent_mut(id) {
            let _ = agent.claimed.insert(pos);
        }
    }

    /// Places a building for the agent and recomputes affected incomes.
    ///
    /// Legality is the action layer's job; this operation only records the
    /// outcome.
    pub fn place_building(&mut self, id: AgentId, kind: BuildingKind, pos: TileCoord) {
        if self.grid.add_building(Building::new(kind, id), pos) {
            if let Some(agent) = self.agent_mut(id) {
                agent.buildings.push((pos, kind));
            }
            income::recompute_around(&mut self.grid, pos);
        }
    }

    /// Removes the building of the given kind from the tile, cleans the
    /// owner's roster, and recomputes affected incomes.
    pub(crate) fn remove_building(
        &mut self,
        kind: BuildingKind,
        pos: TileCoord,
    ) -> Option<Building> {
        let removed = self.grid.remove_building(kind, pos)?;
        if let Some(agent) = self.agent_mut(removed.owner) {
            agent
                .buildings
                .retain(|entry| *entry != (pos, kind));
        }
        income::recompute_around(&mut self.grid, pos);
        Some(removed)
    }

    /// Places a fresh unit or stacks strength into an existing friendly
    /// unit, clamping at the configured maximum. Returns the resulting
    /// strength, or `None` when an enemy unit blocks the slot.
    ///
    /// Legality is the action layer's job; this operation only records the
    /// outcome.
    pub fn place_unit(
        &mut self,
        id: AgentId,
        pos: TileCoord,
        strength: i32,
        max_strength: i32,
    ) -> Option<i32> {
        let existing = self.grid.tile(pos).and_then(Tile::unit);
        match existing {
            Some(unit) if unit.owner != id => None,
            Some(unit) => {
                let merged = (unit.strength + strength).min(max_strength);
                self.grid.set_unit(
                    pos,
                    Some(Unit {
                        owner: id,
                        strength: merged,
                    }),
                );
                Some(merged)
            }
            None => {
                let strength = strength.min(max_strength);
                self.grid.set_unit(
                    pos,
                    Some(Unit {
                        owner: id,
                        strength,
                    }),
                );
                if let Some(agent) = self.agent_mut(id) {
                    agent.units.push(pos);
                }
                Some(strength)
            }
        }
    }

    /// Removes the unit at the position from the tile and from its owner's
    /// roster.
    pub(crate) fn remove_unit(&mut self, pos: TileCoord) -> Option<Unit> {
        let unit = self.grid.tile(pos).and_then(Tile::unit)?;
        self.grid.set_unit(pos, None);
        if let Some(agent) = self.agent_mut(unit.owner) {
            agent.units.retain(|entry| *entry != pos);
        }
        Some(unit)
    }

    /// Overwrites the strength of the unit at the position.
    pub(crate) fn set_unit_strength(&mut self, pos: TileCoord, strength: i32) {
        if let Some(unit) = self.grid.tile(pos).and_then(Tile::unit) {
            self.grid.set_unit(
                pos,
                Some(Unit {
                    owner: unit.owner,
                    strength,
                }),
            );
        }
    }

    /// Applies combat damage to the unit at the position; removes it and
    /// records the kill when strength is exhausted. Returns true when the
    /// unit died.
    pub fn damage_unit(
        &mut self,
        pos: TileCoord,
        damage: i32,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(unit) = self.grid.tile(pos).and_then(Tile::unit) else {
            return false;
        };
        let remaining = unit.strength - damage;
        if remaining > 0 {
            self.set_unit_strength(pos, remaining);
            return false;
        }
        let _ = self.remove_unit(pos);
        out_events.push(Event::UnitKilled {
            agent: unit.owner,
            tile: pos,
        });
        true
    }

    /// Applies combat damage to the building of the given kind; removes it
    /// and recomputes neighbors when health is exhausted. Returns true when
    /// the building was destroyed.
    pub fn damage_building(
        &mut self,
        pos: TileCoord,
        kind: BuildingKind,
        damage: i32,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(building) = self.grid.building_mut(pos, kind) else {
            return false;
        };
        let Some(health) = building.health else {
            return false;
        };
        let remaining = health - damage;
        if remaining > 0 {
            building.health = Some(remaining);
            return false;
        }
        let _ = self.remove_building(kind, pos);
        out_events.push(Event::BuildingDestroyed { kind, tile: pos });
        true
    }

    /// Grants an agent a starting foothold: claims the tile and reveals the
    /// surrounding area.
    pub fn seed_agent_start(&mut self, id: AgentId, pos: TileCoord, visibility_range: u32) {
        self.claim_tile(id, pos);
        let _ = self.grid.reveal_area(id, pos, visibility_range);
    }

    /// Credits every agent the summed round value of its claimed tiles.
    pub fn collect_income(&mut self) {
        let mut totals: Vec<f32> = vec![0.0; self.agents.len()];
        for agent in &self.agents {
            let total: f32 = agent
                .claimed
                .iter()
                .filter_map(|pos| self.grid.tile(*pos))
                .map(Tile::round_value)
                .sum();
            totals[agent.id.get() as usize] = total;
        }
        for (agent, total) in self.agents.iter_mut().zip(totals) {
            agent.money += total;
        }
    }

    /// Clears ownership, buildings, units, and visibility while preserving
    /// terrain, and restores every agent to its starting state.
    pub fn reset(&mut self, rules: &Rules) {
        self.grid.clear_dynamic_state();
        for agent in &mut self.agents {
            agent.money = rules.starting_money;
            agent.claimed.clear();
            agent.buildings.clear();
            agent.units.clear();
        }
    }
}

/// Read-only views over the world for systems and adapters.
pub mod query {
    use super::{Tile, World};
    use landgrab_core::TileCoord;

    /// Feature channels exported by the observation tensor, in channel
    /// order.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Feature {
        /// Stable terrain code of the tile.
        TerrainCode,
        /// Owner id plus one; zero encodes "unowned".
        Owner,
        /// Building-kind presence bitmask.
        BuildingMask,
        /// Unit owner id plus one; zero encodes "no unit".
        UnitOwner,
        /// Strength of the occupying unit, zero when empty.
        UnitStrength,
    }

    impl Feature {
        /// All channels in tensor order.
        pub const ALL: [Feature; 5] = [
            Feature::TerrainCode,
            Feature::Owner,
            Feature::BuildingMask,
            Feature::UnitOwner,
            Feature::UnitStrength,
        ];

        fn extract(self, tile: &Tile) -> f32 {
            match self {
                Feature::TerrainCode => f32::from(tile.terrain().code()),
                Feature::Owner => tile
                    .owner()
                    .map_or(0.0, |owner| f32::from(owner.get()) + 1.0),
                Feature::BuildingMask => f32::from(tile.building_mask()),
                Feature::UnitOwner => tile
                    .unit()
                    .map_or(0.0, |unit| f32::from(unit.owner.get()) + 1.0),
                Feature::UnitStrength => {
                    tile.unit().map_or(0.0, |unit| unit.strength as f32)
                }
            }
        }
    }

    /// Read-only tile-feature tensor of shape `(width, height, F)`.
    #[derive(Clone, Debug, PartialEq)]
    pub struct Observation {
        width: u32,
        height: u32,
        data: Vec<f32>,
    }

    impl Observation {
        /// Number of tile columns covered by the tensor.
        #[must_use]
        pub const fn width(&self) -> u32 {
            self.width
        }

        /// Number of tile rows covered by the tensor.
        #[must_use]
        pub const fn height(&self) -> u32 {
            self.height
        }

        /// Number of feature channels per tile.
        #[must_use]
        pub fn channels(&self) -> usize {
            Feature::ALL.len()
        }

        /// Feature value at `(x, y)` for the given channel, or `None` out
        /// of bounds.
        #[must_use]
        pub fn feature(&self, x: u32, y: u32, feature: Feature) -> Option<f32> {
            if x >= self.width || y >= self.height {
                return None;
            }
            let channel = Feature::ALL.iter().position(|f| *f == feature)?;
            let tile_index = y as usize * self.width as usize + x as usize;
            self.data.get(tile_index * Feature::ALL.len() + channel).copied()
        }

        /// Raw tensor data, tile-major then channel.
        #[must_use]
        pub fn data(&self) -> &[f32] {
            &self.data
        }
    }

    /// Captures the current tile-feature tensor.
    #[must_use]
    pub fn observation(world: &World) -> Observation {
        let grid = world.grid();
        let mut data =
            Vec::with_capacity(grid.width() as usize * grid.height() as usize * Feature::ALL.len());
        for (_, tile) in grid.iter() {
            for feature in Feature::ALL {
                data.push(feature.extract(tile));
            }
        }
        Observation {
            width: grid.width(),
            height: grid.height(),
            data,
        }
    }

    /// Captures the raw visibility plane: one word per tile, row-major.
    #[must_use]
    pub fn visibility_plane(world: &World) -> Vec<u64> {
        world.grid().iter().map(|(_, tile)| tile.visibility()).collect()
    }

    /// Current money balances in agent-id order.
    #[must_use]
    pub fn balances(world: &World) -> Vec<f32> {
        world.agents().map(super::Agent::money).collect()
    }

    /// Positions of every unit on the map in deterministic scan order.
    #[must_use]
    pub fn unit_positions(world: &World) -> Vec<TileCoord> {
        world
            .grid()
            .iter()
            .filter(|(_, tile)| tile.unit().is_some())
            .map(|(pos, _)| pos)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{query, Grid, World};
    use landgrab_core::{AgentId, Rules, Terrain, TileCoord};

    fn world() -> World {
        World::new(Grid::all_land(10, 10), 2, &Rules::default())
    }

    #[test]
    fn claiming_for_b_removes_from_a() {
        let mut world = world();
        let pos = TileCoord::new(4, 4);
        let a = AgentId::new(0);
        let b = AgentId::new(1);

        world.claim_tile(a, pos);
        assert!(world.agent(a).expect("agent").claimed().contains(&pos));

        world.claim_tile(b, pos);
        assert_eq!(world.grid().tile(pos).expect("tile").owner(), Some(b));
        assert!(
            !world.agent(a).expect("agent").claimed().contains(&pos),
            "previous owner must not retain the claimed tile"
        );
        assert!(world.agent(b).expect("agent").claimed().contains(&pos));
    }

    #[test]
    fn stacking_units_clamps_at_maximum() {
        let mut world = world();
        let pos = TileCoord::new(2, 2);
        let agent = AgentId::new(0);

        assert_eq!(world.place_unit(agent, pos, 60, 100), Some(60));
        assert_eq!(world.place_unit(agent, pos, 60, 100), Some(100));
        assert_eq!(world.agent(agent).expect("agent").units().len(), 1);
    }

    #[test]
    fn enemy_unit_blocks_placement() {
        let mut world = world();
        let pos = TileCoord::new(2, 2);
        assert_eq!(world.place_unit(AgentId::new(0), pos, 50, 100), Some(50));
        assert_eq!(world.place_unit(AgentId::new(1), pos, 50, 100), None);
    }

    #[test]
    fn collect_income_credits_claimed_land() {
        let mut world = world();
        let agent = AgentId::new(0);
        world.claim_tile(agent, TileCoord::new(0, 0));
        world.claim_tile(agent, TileCoord::new(1, 0));
        let before = world.agent(agent).expect("agent").money();
        world.collect_income();
        let after = world.agent(agent).expect("agent").money();
        assert!((after - before - 2.0 * Terrain::Land.base_value()).abs() < f32::EPSILON);
    }

    #[test]
    fn reset_restores_starting_state() {
        let rules = Rules::default();
        let mut world = world();
        let agent = AgentId::new(0);
        world.claim_tile(agent, TileCoord::new(3, 3));
        let _ = world.place_unit(agent, TileCoord::new(3, 3), 40, 100);
        world.adjust_money(agent, -500.0);

        world.reset(&rules);

        let restored = world.agent(agent).expect("agent");
        assert!((restored.money() - rules.starting_money).abs() < f32::EPSILON);
        assert!(restored.claimed().is_empty());
        assert!(restored.units().is_empty());
        assert!(world.grid().tile(TileCoord::new(3, 3)).expect("tile").unit().is_none());
    }

    #[test]
    fn observation_encodes_owner_with_offset() {
        let mut world = world();
        world.claim_tile(AgentId::new(1), TileCoord::new(5, 5));
        let observation = query::observation(&world);
        assert_eq!(observation.feature(5, 5, query::Feature::Owner), Some(2.0));
        assert_eq!(observation.feature(5, 6, query::Feature::Owner), Some(0.0));
        assert_eq!(observation.feature(10, 5, query::Feature::Owner), None);
    }

    #[test]
    fn observation_shape_matches_grid() {
        let world = world();
        let observation = query::observation(&world);
        assert_eq!(observation.width(), 10);
        assert_eq!(observation.height(), 10);
        assert_eq!(observation.data().len(), 10 * 10 * observation.channels());
    }
}
