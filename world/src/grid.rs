//! Tile grid, spatial queries, and the per-agent visibility plane.

use landgrab_core::{AgentId, BuildingKind, Terrain, TileCoord};

/// Structure placed on a tile, owned exclusively by that tile.
#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    /// Kind of structure.
    pub kind: BuildingKind,
    /// Agent that constructed the building.
    pub owner: AgentId,
    /// Remaining health for destroyable kinds; `None` marks the building
    /// indestructible.
    pub health: Option<i32>,
    /// Derived per-round income, maintained by adjacency recomputation.
    pub income_per_turn: f32,
}

impl Building {
    /// Creates a building of the given kind for the given owner with
    /// adjacency-free income.
    #[must_use]
    pub fn new(kind: BuildingKind, owner: AgentId) -> Self {
        Self {
            kind,
            owner,
            health: kind.initial_health(),
            income_per_turn: kind.base_income() - kind.maintenance(),
        }
    }
}

/// Military token occupying a tile's single unit slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unit {
    /// Agent that owns the unit.
    pub owner: AgentId,
    /// Current strength; the unit dies when this drops to zero or below.
    pub strength: i32,
}

/// Atomic grid cell: terrain, ownership, buildings, occupant, visibility.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    terrain: Terrain,
    owner: Option<AgentId>,
    buildings: Vec<Building>,
    building_mask: u8,
    unit: Option<Unit>,
    visibility: u64,
}

impl Tile {
    fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            owner: None,
            buildings: Vec::new(),
            building_mask: 0,
            unit: None,
            visibility: 0,
        }
    }

    /// Terrain type of the tile.
    #[must_use]
    pub const fn terrain(&self) -> Terrain {
        self.terrain
    }

    /// Agent currently owning the tile, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<AgentId> {
        self.owner
    }

    /// Buildings present on the tile, at most one per kind.
    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Bitmask mirroring building-kind membership for O(1) presence checks.
    #[must_use]
    pub const fn building_mask(&self) -> u8 {
        self.building_mask
    }

    /// Reports whether a building of the given kind is present.
    #[must_use]
    pub const fn has_building(&self, kind: BuildingKind) -> bool {
        self.building_mask & kind.mask() != 0
    }

    /// Returns the building of the given kind, if present.
    #[must_use]
    pub fn building(&self, kind: BuildingKind) -> Option<&Building> {
        self.buildings.iter().find(|building| building.kind == kind)
    }

    /// Unit occupying the tile, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<Unit> {
        self.unit
    }

    /// Raw visibility word; bit `a` is set iff agent `a` observes the tile.
    #[must_use]
    pub const fn visibility(&self) -> u64 {
        self.visibility
    }

    /// Per-round value of the tile: terrain base value plus the income of
    /// every building present.
    #[must_use]
    pub fn round_value(&self) -> f32 {
        self.terrain.base_value()
            + self
                .buildings
                .iter()
                .map(|building| building.income_per_turn)
                .sum::<f32>()
    }

    pub(crate) fn clear_dynamic_state(&mut self) {
        self.owner = None;
        self.buildings.clear();
        self.building_mask = 0;
        self.unit = None;
        self.visibility = 0;
    }
}

/// Dense tile grid addressed by `(x, y)` with row-major storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid from a finished terrain array laid out row-major.
    ///
    /// The terrain slice length must equal `width * height`; extra entries
    /// are ignored and missing entries default to land so that malformed
    /// input never panics.
    #[must_use]
    pub fn from_terrain(width: u32, height: u32, terrain: &[Terrain]) -> Self {
        let capacity = width as usize * height as usize;
        let tiles = (0..capacity)
            .map(|index| Tile::new(terrain.get(index).copied().unwrap_or(Terrain::Land)))
            .collect();
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Creates an all-land grid of the given dimensions.
    #[must_use]
    pub fn all_land(width: u32, height: u32) -> Self {
        Self::from_terrain(width, height, &[])
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the position lies within `[0,width) × [0,height)`.
    #[must_use]
    pub const fn contains(&self, pos: TileCoord) -> bool {
        pos.x() < self.width && pos.y() < self.height
    }

    fn index(&self, pos: TileCoord) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y() as usize * self.width as usize + pos.x() as usize)
        } else {
            None
        }
    }

    /// Returns the tile at the position, or `None` when out of bounds.
    #[must_use]
    pub fn tile(&self, pos: TileCoord) -> Option<&Tile> {
        self.index(pos).map(|index| &self.tiles[index])
    }

    pub(crate) fn tile_mut(&mut self, pos: TileCoord) -> Option<&mut Tile> {
        self.index(pos).map(move |index| &mut self.tiles[index])
    }

    /// Iterates over every tile together with its coordinate.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &Tile)> {
        let width = self.width;
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let x = (index as u32) % width;
            let y = (index as u32) / width;
            (TileCoord::new(x, y), tile)
        })
    }

    /// Enumerates positions surrounding `pos` within `radius`, clipped to
    /// the map and excluding the center.
    ///
    /// With `diagonal` set, the result is the full `[-radius, +radius]²`
    /// box. Without it, the result is the orthogonal cross: both axis
    /// directions scanned independently along the full radius,
    /// `{(±i, 0)} ∪ {(0, ±j)}` for `i, j ∈ [1, radius]`.
    #[must_use]
    pub fn surrounding(&self, pos: TileCoord, radius: u32, diagonal: bool) -> Vec<TileCoord> {
        let radius = radius as i32;
        let mut result = Vec::new();
        if diagonal {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if let Some(neighbor) = pos.offset(dx, dy) {
                        if self.contains(neighbor) {
                            result.push(neighbor);
                        }
                    }
                }
            }
        } else {
            for step in 1..=radius {
                for (dx, dy) in [(-step, 0), (step, 0), (0, -step), (0, step)] {
                    if let Some(neighbor) = pos.offset(dx, dy) {
                        if self.contains(neighbor) {
                            result.push(neighbor);
                        }
                    }
                }
            }
        }
        result
    }

    /// Finds a surrounding tile owned by the agent, if any.
    #[must_use]
    pub fn adjacent_owned(
        &self,
        pos: TileCoord,
        agent: AgentId,
        radius: u32,
        diagonal: bool,
    ) -> Option<TileCoord> {
        self.surrounding(pos, radius, diagonal)
            .into_iter()
            .find(|neighbor| {
                self.tile(*neighbor)
                    .is_some_and(|tile| tile.owner() == Some(agent))
            })
    }

    /// Finds a surrounding tile carrying a building of the given kind.
    #[must_use]
    pub fn adjacent_building(
        &self,
        pos: TileCoord,
        kind: BuildingKind,
        radius: u32,
        diagonal: bool,
    ) -> Option<TileCoord> {
        self.surrounding(pos, radius, diagonal)
            .into_iter()
            .find(|neighbor| {
                self.tile(*neighbor)
                    .is_some_and(|tile| tile.has_building(kind))
            })
    }

    /// Sets the agent's visibility bit on the tile. No-op for out-of-range
    /// agent ids or out-of-bounds positions.
    pub fn set_visible(&mut self, pos: TileCoord, agent: AgentId) {
        if !agent.is_representable() {
            return;
        }
        if let Some(tile) = self.tile_mut(pos) {
            tile.visibility |= 1 << agent.get();
        }
    }

    /// Clears the agent's visibility bit on the tile. No-op for out-of-range
    /// agent ids or out-of-bounds positions.
    pub fn clear_visible(&mut self, pos: TileCoord, agent: AgentId) {
        if !agent.is_representable() {
            return;
        }
        if let Some(tile) = self.tile_mut(pos) {
            tile.visibility &= !(1 << agent.get());
        }
    }

    /// Reports whether the agent currently observes the tile.
    #[must_use]
    pub fn is_visible(&self, pos: TileCoord, agent: AgentId) -> bool {
        if !agent.is_representable() {
            return false;
        }
        self.tile(pos)
            .is_some_and(|tile| tile.visibility & (1 << agent.get()) != 0)
    }

    /// Reveals the `[-range, +range]²` box around `pos` to the agent and
    /// returns the number of tiles whose bit transitioned from unset to set.
    ///
    /// Visibility is purely additive; only a full reset contracts it.
    pub fn reveal_area(&mut self, agent: AgentId, pos: TileCoord, range: u32) -> u32 {
        if !agent.is_representable() {
            return 0;
        }
        let bit = 1u64 << agent.get();
        let range = range as i32;
        let mut revealed = 0;
        for dy in -range..=range {
            for dx in -range..=range {
                let Some(neighbor) = pos.offset(dx, dy) else {
                    continue;
                };
                let Some(index) = self.index(neighbor) else {
                    continue;
                };
                let tile = &mut self.tiles[index];
                if tile.visibility & bit == 0 {
                    tile.visibility |= bit;
                    revealed += 1;
                }
            }
        }
        revealed
    }

    /// Writes the owner field of the tile. Legality checks belong to the
    /// actions layer; the grid only records the result.
    pub(crate) fn set_owner(&mut self, pos: TileCoord, owner: Option<AgentId>) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.owner = owner;
        }
    }

    /// Inserts the building on the tile, keeping the mask in sync. Returns
    /// false when the position is invalid or the kind is already present.
    pub(crate) fn add_building(&mut self, building: Building, pos: TileCoord) -> bool {
        let Some(tile) = self.tile_mut(pos) else {
            return false;
        };
        if tile.building_mask & building.kind.mask() != 0 {
            return false;
        }
        tile.building_mask |= building.kind.mask();
        tile.buildings.push(building);
        true
    }

    /// Removes the building of the given kind, keeping the mask in sync.
    pub(crate) fn remove_building(&mut self, kind: BuildingKind, pos: TileCoord) -> Option<Building> {
        let tile = self.tile_mut(pos)?;
        let index = tile
            .buildings
            .iter()
            .position(|building| building.kind == kind)?;
        tile.building_mask &= !kind.mask();
        Some(tile.buildings.remove(index))
    }

    pub(crate) fn set_unit(&mut self, pos: TileCoord, unit: Option<Unit>) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.unit = unit;
        }
    }

    pub(crate) fn building_mut(
        &mut self,
        pos: TileCoord,
        kind: BuildingKind,
    ) -> Option<&mut Building> {
        self.tile_mut(pos)?
            .buildings
            .iter_mut()
            .find(|building| building.kind == kind)
    }

    /// Clears ownership, buildings, units, and visibility on every tile
    /// while preserving terrain.
    pub(crate) fn clear_dynamic_state(&mut self) {
        for tile in &mut self.tiles {
            tile.clear_dynamic_state();
        }
    }
}
