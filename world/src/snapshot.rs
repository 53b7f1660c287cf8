//! Persisted map topology.
//!
//! A snapshot captures terrain only: dimensions plus one record per tile.
//! Ownership, buildings, units, visibility, and balances are deliberately
//! excluded so a saved map always restores to a fresh episode. The string
//! codec wrapping these records lives in the environment adapter.

use landgrab_core::Terrain;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::World;

/// One tile's persisted topology record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    /// Linear row-major index of the tile.
    pub id: u32,
    /// Zero-based column of the tile.
    pub x: u32,
    /// Zero-based row of the tile.
    pub y: u32,
    /// Stable terrain code, per [`Terrain::code`].
    pub terrain_code: u8,
    /// Resource tags carried by the tile.
    pub resources: Vec<String>,
}

/// Serializable map topology: dimensions plus per-tile terrain records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Number of tile columns.
    pub width: u32,
    /// Number of tile rows.
    pub height: u32,
    /// Per-tile records in row-major order.
    pub tiles: Vec<TileRecord>,
}

/// Errors raised while rebuilding a grid from snapshot records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotError {
    /// A record carried a terrain code outside the closed set.
    UnknownTerrainCode(u8),
    /// A record addressed a tile outside the snapshot dimensions.
    RecordOutOfBounds {
        /// Column carried by the offending record.
        x: u32,
        /// Row carried by the offending record.
        y: u32,
    },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::UnknownTerrainCode(code) => {
                write!(formatter, "unknown terrain code {code}")
            }
            SnapshotError::RecordOutOfBounds { x, y } => {
                write!(formatter, "tile record ({x}, {y}) lies outside the map")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl MapSnapshot {
    /// Captures the topology of the world's grid.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let grid = world.grid();
        let tiles = grid
            .iter()
            .enumerate()
            .map(|(id, (pos, tile))| TileRecord {
                id: id as u32,
                x: pos.x(),
                y: pos.y(),
                terrain_code: tile.terrain().code(),
                resources: tile
                    .terrain()
                    .resources()
                    .iter()
                    .map(|resource| (*resource).to_owned())
                    .collect(),
            })
            .collect();
        Self {
            width: grid.width(),
            height: grid.height(),
            tiles,
        }
    }

    /// Rebuilds a terrain grid from the records.
    ///
    /// Tiles without a record default to [`Terrain::Land`]. All dynamic
    /// state starts empty.
    pub fn grid(&self) -> Result<Grid, SnapshotError> {
        let mut terrain =
            vec![Terrain::Land; self.width as usize * self.height as usize];
        for record in &self.tiles {
            if record.x >= self.width || record.y >= self.height {
                return Err(SnapshotError::RecordOutOfBounds {
                    x: record.x,
                    y: record.y,
                });
            }
            let kind = Terrain::from_code(record.terrain_code)
                .ok_or(SnapshotError::UnknownTerrainCode(record.terrain_code))?;
            terrain[record.y as usize * self.width as usize + record.x as usize] = kind;
        }
        Ok(Grid::from_terrain(self.width, self.height, &terrain))
    }
}
