//! Adjacency-driven building income recomputation.
//!
//! A building's income is `base × multiplier − maintenance` where the
//! multiplier starts at 1.0 and accumulates each adjacency rule's bonus once
//! when the rule's neighbor kind is present within the rule radius along the
//! orthogonal cross. Recomputation is triggered by building placement and
//! removal only; ownership changes never touch income.

use landgrab_core::{BuildingKind, TileCoord, MAX_ADJACENCY_RADIUS};

use crate::grid::Grid;

/// Recomputes income for the tile at `center` and every tile whose
/// adjacency search could have observed a building change there.
///
/// Adjacency rules search the orthogonal cross, so the affected set is the
/// cross of the maximum rule radius around the changed tile plus the tile
/// itself.
pub(crate) fn recompute_around(grid: &mut Grid, center: TileCoord) {
    recompute_tile(grid, center);
    for pos in grid.surrounding(center, MAX_ADJACENCY_RADIUS, false) {
        recompute_tile(grid, pos);
    }
}

/// Recomputes `income_per_turn` for every building on one tile.
pub(crate) fn recompute_tile(grid: &mut Grid, pos: TileCoord) {
    let Some(tile) = grid.tile(pos) else {
        return;
    };
    let kinds: Vec<BuildingKind> = tile
        .buildings()
        .iter()
        .map(|building| building.kind)
        .collect();

    for kind in kinds {
        let income = kind.base_income() * multiplier(grid, pos, kind) - kind.maintenance();
        if let Some(building) = grid.building_mut(pos, kind) {
            building.income_per_turn = income;
        }
    }
}

/// Current adjacency multiplier for a building of `kind` standing at `pos`.
///
/// Presence is boolean per rule: a rule's bonus is added once no matter how
/// many qualifying neighbors sit within its radius.
pub(crate) fn multiplier(grid: &Grid, pos: TileCoord, kind: BuildingKind) -> f32 {
    let mut multiplier = 1.0;
    for rule in kind.adjacency_rules() {
        if grid
            .adjacent_building(pos, rule.neighbor, rule.radius, false)
            .is_some()
        {
            multiplier += rule.bonus;
        }
    }
    multiplier
}

#[cfg(test)]
mod tests {
    use super::{multiplier, recompute_around};
    use crate::grid::{Building, Grid};
    use landgrab_core::{AgentId, BuildingKind, TileCoord};

    fn place(grid: &mut Grid, kind: BuildingKind, pos: TileCoord) {
        assert!(grid.add_building(Building::new(kind, AgentId::new(0)), pos));
        recompute_around(grid, pos);
    }

    fn income(grid: &Grid, kind: BuildingKind, pos: TileCoord) -> f32 {
        grid.tile(pos)
            .and_then(|tile| tile.building(kind))
            .map(|building| building.income_per_turn)
            .expect("building present")
    }

    #[test]
    fn farm_next_to_road_earns_triple_base() {
        let mut grid = Grid::all_land(10, 10);
        let farm = TileCoord::new(5, 5);
        place(&mut grid, BuildingKind::Farm, farm);
        place(&mut grid, BuildingKind::Road, TileCoord::new(6, 5));

        // base 20 × (1.0 + 2.0) − maintenance 5 = 55
        assert!((income(&grid, BuildingKind::Farm, farm) - 55.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rule_bonus_is_boolean_not_counted_per_neighbor() {
        let mut grid = Grid::all_land(10, 10);
        let farm = TileCoord::new(5, 5);
        place(&mut grid, BuildingKind::Farm, farm);
        place(&mut grid, BuildingKind::Road, TileCoord::new(6, 5));
        place(&mut grid, BuildingKind::Road, TileCoord::new(4, 5));

        assert!((multiplier(&grid, farm, BuildingKind::Farm) - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn diagonal_neighbors_do_not_qualify() {
        let mut grid = Grid::all_land(10, 10);
        let farm = TileCoord::new(5, 5);
        place(&mut grid, BuildingKind::Farm, farm);
        place(&mut grid, BuildingKind::Road, TileCoord::new(6, 6));

        assert!((multiplier(&grid, farm, BuildingKind::Farm) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn removal_reverts_neighbor_income() {
        let mut grid = Grid::all_land(10, 10);
        let farm = TileCoord::new(5, 5);
        let road = TileCoord::new(6, 5);
        place(&mut grid, BuildingKind::Farm, farm);
        place(&mut grid, BuildingKind::Road, road);
        assert!((income(&grid, BuildingKind::Farm, farm) - 55.0).abs() < f32::EPSILON);

        let _ = grid.remove_building(BuildingKind::Road, road).expect("road");
        recompute_around(&mut grid, road);
        assert!((income(&grid, BuildingKind::Farm, farm) - 15.0).abs() < f32::EPSILON);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let mut grid = Grid::all_land(10, 10);
        let farm = TileCoord::new(5, 5);
        place(&mut grid, BuildingKind::Farm, farm);
        place(&mut grid, BuildingKind::Road, TileCoord::new(5, 4));

        let first = income(&grid, BuildingKind::Farm, farm);
        recompute_around(&mut grid, farm);
        recompute_around(&mut grid, farm);
        let second = income(&grid, BuildingKind::Farm, farm);
        assert!((first - second).abs() < f32::EPSILON);
    }

    #[test]
    fn city_stacks_bonuses_from_distinct_kinds() {
        let mut grid = Grid::all_land(10, 10);
        let city = TileCoord::new(5, 5);
        place(&mut grid, BuildingKind::City, city);
        place(&mut grid, BuildingKind::Road, TileCoord::new(5, 6));
        place(&mut grid, BuildingKind::Farm, TileCoord::new(5, 3));

        // Road within radius 2 and farm within radius 2: 1.0 + 2.0 + 2.0
        assert!((multiplier(&grid, city, BuildingKind::City) - 5.0).abs() < f32::EPSILON);
    }
}
