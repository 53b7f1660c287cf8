#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Landgrab engine.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the per-round arbiter, the combat system, and the episode adapters.
//! External callers submit [`ActionDescriptor`] batches, the arbiter lifts
//! them into validated [`Action`] values, the world executes winners and
//! broadcasts [`Event`] values describing every mutation it performed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of agent identities representable by the visibility plane.
///
/// Visibility words are 64 bits wide with the top bit reserved, so agent
/// identifiers are valid in `[0, MAX_AGENTS)`. Out-of-range identifiers are
/// silently ignored by all visibility operations.
pub const MAX_AGENTS: u8 = 63;

/// Unique identifier assigned to an agent participating in the simulation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AgentId(u8);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Reports whether the identifier addresses a representable agent.
    #[must_use]
    pub const fn is_representable(&self) -> bool {
        self.0 < MAX_AGENTS
    }
}

/// Location of a single tile expressed as `(x, y)` grid coordinates.
///
/// Tiles are stored row-major: the linear index of `(x, y)` within a grid of
/// width `w` is `y * w + x`. Every spatial query in the engine uses this one
/// convention.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    x: u32,
    y: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Returns the coordinate offset by `(dx, dy)`, or `None` when the
    /// result would leave the non-negative coordinate space.
    #[must_use]
    pub fn offset(&self, dx: i32, dy: i32) -> Option<TileCoord> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(TileCoord::new(x, y))
    }

    /// Computes the Chebyshev distance between two tile coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Closed set of terrain types a tile may carry.
///
/// Terrain is fixed once a map is generated; the engine consumes finished
/// terrain grids and never regenerates topology.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Terrain {
    /// Open land suitable for most construction.
    Land,
    /// Deep water; only bridges may span it.
    Ocean,
    /// Flowing water; only bridges may span it.
    River,
    /// Wetland; buildable but low value.
    Marsh,
    /// High ground; mines only, roads at double cost.
    Mountain,
    /// Arid land; cities and roads only.
    Desert,
}

impl Terrain {
    /// Every terrain variant in persisted-code order.
    pub const ALL: [Terrain; 6] = [
        Terrain::Land,
        Terrain::Ocean,
        Terrain::River,
        Terrain::Marsh,
        Terrain::Mountain,
        Terrain::Desert,
    ];

    /// Stable numeric code used by observations and map snapshots.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Terrain::Land => 0,
            Terrain::Ocean => 1,
            Terrain::River => 2,
            Terrain::Marsh => 3,
            Terrain::Mountain => 4,
            Terrain::Desert => 5,
        }
    }

    /// Restores a terrain variant from its persisted code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Terrain> {
        match code {
            0 => Some(Terrain::Land),
            1 => Some(Terrain::Ocean),
            2 => Some(Terrain::River),
            3 => Some(Terrain::Marsh),
            4 => Some(Terrain::Mountain),
            5 => Some(Terrain::Desert),
            _ => None,
        }
    }

    /// Reports whether the terrain is a water type.
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self, Terrain::Ocean | Terrain::River)
    }

    /// Base per-round value a claimed tile of this terrain contributes
    /// before building income is added.
    #[must_use]
    pub const fn base_value(self) -> f32 {
        match self {
            Terrain::Land => 1.0,
            Terrain::Ocean => 0.0,
            Terrain::River => 0.5,
            Terrain::Marsh => 0.5,
            Terrain::Mountain => 1.0,
            Terrain::Desert => 0.5,
        }
    }

    /// Default resources carried by tiles of this terrain.
    ///
    /// Resource lists are part of the persisted map topology.
    #[must_use]
    pub const fn resources(self) -> &'static [&'static str] {
        match self {
            Terrain::Land => &["grain", "timber"],
            Terrain::Ocean => &["fish"],
            Terrain::River => &["fish", "freshwater"],
            Terrain::Marsh => &["peat"],
            Terrain::Mountain => &["iron", "stone"],
            Terrain::Desert => &["salt"],
        }
    }
}

/// Closed set of building types that may occupy a tile.
///
/// At most one building of each kind may coexist on a single tile; presence
/// is tracked by the tile's building mask using the [`BuildingKind::bit`]
/// mapping as the single source of truth.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BuildingKind {
    /// Income anchor; enforces a clearance radius against other cities.
    City,
    /// Connective structure that boosts neighboring producers.
    Road,
    /// Road equivalent spanning water tiles.
    Bridge,
    /// Food producer restricted to fertile terrain.
    Farm,
    /// Ore producer restricted to mountains.
    Mine,
}

/// Adjacency rule granting an income bonus when a neighbor kind is present.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdjacencyRule {
    /// Building kind whose presence activates the bonus.
    pub neighbor: BuildingKind,
    /// Orthogonal search radius scanned for the neighbor kind.
    pub radius: u32,
    /// Multiplier bonus added once when the neighbor kind is found.
    pub bonus: f32,
}

impl AdjacencyRule {
    const fn new(neighbor: BuildingKind, radius: u32, bonus: f32) -> Self {
        Self {
            neighbor,
            radius,
            bonus,
        }
    }
}

/// Largest radius used by any adjacency rule. Building placement or removal
/// within this distance of a tile schedules that tile for income
/// recomputation.
pub const MAX_ADJACENCY_RADIUS: u32 = 2;

impl BuildingKind {
    /// Every building kind in bit order.
    pub const ALL: [BuildingKind; 5] = [
        BuildingKind::City,
        BuildingKind::Road,
        BuildingKind::Bridge,
        BuildingKind::Farm,
        BuildingKind::Mine,
    ];

    /// Bit index of this kind within a tile's building mask.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            BuildingKind::City => 0,
            BuildingKind::Road => 1,
            BuildingKind::Bridge => 2,
            BuildingKind::Farm => 3,
            BuildingKind::Mine => 4,
        }
    }

    /// Mask with only this kind's presence bit set.
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << self.bit()
    }

    /// Base income produced each round before adjacency scaling.
    #[must_use]
    pub const fn base_income(self) -> f32 {
        match self {
            BuildingKind::City => 50.0,
            BuildingKind::Road => 0.0,
            BuildingKind::Bridge => 0.0,
            BuildingKind::Farm => 20.0,
            BuildingKind::Mine => 30.0,
        }
    }

    /// Upkeep subtracted from income each round.
    #[must_use]
    pub const fn maintenance(self) -> f32 {
        match self {
            BuildingKind::City => 10.0,
            BuildingKind::Road => 1.0,
            BuildingKind::Bridge => 2.0,
            BuildingKind::Farm => 5.0,
            BuildingKind::Mine => 5.0,
        }
    }

    /// Starting health for destroyable kinds; `None` marks the kind
    /// indestructible.
    #[must_use]
    pub const fn initial_health(self) -> Option<i32> {
        match self {
            BuildingKind::City => Some(200),
            BuildingKind::Road => None,
            BuildingKind::Bridge => None,
            BuildingKind::Farm => Some(100),
            BuildingKind::Mine => Some(100),
        }
    }

    /// Adjacency rules contributing to this kind's income multiplier.
    ///
    /// Each rule adds its bonus at most once, when at least one building of
    /// the neighbor kind sits within the rule radius along the orthogonal
    /// cross.
    #[must_use]
    pub const fn adjacency_rules(self) -> &'static [AdjacencyRule] {
        const CITY_RULES: &[AdjacencyRule] = &[
            AdjacencyRule::new(BuildingKind::Road, 2, 2.0),
            AdjacencyRule::new(BuildingKind::Farm, 2, 2.0),
            AdjacencyRule::new(BuildingKind::Mine, 2, 2.0),
        ];
        const FARM_MINE_RULES: &[AdjacencyRule] = &[
            AdjacencyRule::new(BuildingKind::Road, 1, 2.0),
            AdjacencyRule::new(BuildingKind::City, 2, 2.0),
        ];
        match self {
            BuildingKind::City => CITY_RULES,
            BuildingKind::Road | BuildingKind::Bridge => &[],
            BuildingKind::Farm | BuildingKind::Mine => FARM_MINE_RULES,
        }
    }
}

/// Kinds of actions an agent may propose for a round.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ActionKind {
    /// Do nothing this round.
    Wait,
    /// Claim an unowned visible tile adjacent to owned territory.
    Claim,
    /// Construct a city.
    BuildCity,
    /// Construct a road.
    BuildRoad,
    /// Construct a bridge.
    BuildBridge,
    /// Construct a farm.
    BuildFarm,
    /// Construct a mine.
    BuildMine,
    /// Place or reinforce a military unit.
    PlaceUnit,
    /// Withdraw an owned unit, refunding part of its strength.
    WithdrawUnit,
    /// Demolish an own or abandoned building.
    Destroy,
}

impl ActionKind {
    /// Every action kind in wire-id order.
    pub const ALL: [ActionKind; 10] = [
        ActionKind::Wait,
        ActionKind::Claim,
        ActionKind::BuildCity,
        ActionKind::BuildRoad,
        ActionKind::BuildBridge,
        ActionKind::BuildFarm,
        ActionKind::BuildMine,
        ActionKind::PlaceUnit,
        ActionKind::WithdrawUnit,
        ActionKind::Destroy,
    ];

    /// Numeric identifier used by action descriptors.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            ActionKind::Wait => 0,
            ActionKind::Claim => 1,
            ActionKind::BuildCity => 2,
            ActionKind::BuildRoad => 3,
            ActionKind::BuildBridge => 4,
            ActionKind::BuildFarm => 5,
            ActionKind::BuildMine => 6,
            ActionKind::PlaceUnit => 7,
            ActionKind::WithdrawUnit => 8,
            ActionKind::Destroy => 9,
        }
    }

    /// Restores an action kind from its wire identifier.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<ActionKind> {
        match id {
            0 => Some(ActionKind::Wait),
            1 => Some(ActionKind::Claim),
            2 => Some(ActionKind::BuildCity),
            3 => Some(ActionKind::BuildRoad),
            4 => Some(ActionKind::BuildBridge),
            5 => Some(ActionKind::BuildFarm),
            6 => Some(ActionKind::BuildMine),
            7 => Some(ActionKind::PlaceUnit),
            8 => Some(ActionKind::WithdrawUnit),
            9 => Some(ActionKind::Destroy),
            _ => None,
        }
    }

    /// Building kind constructed by this action, if it is a build action.
    #[must_use]
    pub const fn building(self) -> Option<BuildingKind> {
        match self {
            ActionKind::BuildCity => Some(BuildingKind::City),
            ActionKind::BuildRoad => Some(BuildingKind::Road),
            ActionKind::BuildBridge => Some(BuildingKind::Bridge),
            ActionKind::BuildFarm => Some(BuildingKind::Farm),
            ActionKind::BuildMine => Some(BuildingKind::Mine),
            _ => None,
        }
    }
}

/// Raw per-agent action proposal submitted by an external harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Wire identifier of the proposed action kind.
    pub kind_id: u8,
    /// Target column.
    pub x: u32,
    /// Target row.
    pub y: u32,
}

impl ActionDescriptor {
    /// Creates a new descriptor from raw wire values.
    #[must_use]
    pub const fn new(kind_id: u8, x: u32, y: u32) -> Self {
        Self { kind_id, x, y }
    }
}

/// Validated action binding an agent to a kind and target position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Action {
    /// Agent that proposed the action.
    pub agent: AgentId,
    /// Kind of mutation requested.
    pub kind: ActionKind,
    /// Tile the action targets; also the conflict-resolution key.
    pub target: TileCoord,
}

impl Action {
    /// Lifts a raw descriptor into an action for the given agent.
    ///
    /// An unknown kind identifier is a caller-contract violation and is
    /// reported as a hard error rather than a game-state rejection.
    pub fn from_descriptor(
        agent: AgentId,
        descriptor: ActionDescriptor,
    ) -> Result<Self, DescriptorError> {
        let kind = ActionKind::from_id(descriptor.kind_id)
            .ok_or(DescriptorError::UnknownKind(descriptor.kind_id))?;
        Ok(Self {
            agent,
            kind,
            target: TileCoord::new(descriptor.x, descriptor.y),
        })
    }
}

/// Hard errors raised while decoding submitted action descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The descriptor carried an action kind id outside the closed set.
    #[error("unknown action kind id {0}")]
    UnknownKind(u8),
}

/// Reasons the world may reject a proposed action during validation.
///
/// Rejections are never fatal; the arbiter records the configured penalty
/// and surfaces the reason through [`Event::ActionRejected`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// The agent cannot afford the action's cost.
    InsufficientFunds,
    /// The target position lies outside the grid.
    OutOfBounds,
    /// The target tile is not visible to the acting agent.
    NotVisible,
    /// The target tile already has an owner.
    AlreadyOwned,
    /// The target tile is not owned by the acting agent.
    NotOwned,
    /// The target tile belongs to another agent.
    ForeignTile,
    /// The target terrain does not admit the requested structure.
    WrongTerrain,
    /// A building already occupies the target tile.
    BuildingPresent,
    /// No building occupies the target tile.
    NoBuilding,
    /// The acting agent owns no tile adjacent to the target.
    NoAdjacentTerritory,
    /// Another city stands within the clearance radius.
    CityTooClose,
    /// An enemy unit occupies the target tile.
    EnemyUnitPresent,
    /// Not enough friendly units surround the enemy tile to conquer it.
    ConquestThresholdUnmet,
    /// No unit owned by the acting agent occupies the target tile.
    NoOwnUnit,
    /// The submitting agent id does not address a representable agent.
    UnknownAgent,
}

/// Events broadcast by the world after executing actions or combat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// A tile changed ownership to the given agent.
    TileClaimed {
        /// Agent that now owns the tile.
        agent: AgentId,
        /// Tile that changed hands.
        tile: TileCoord,
    },
    /// A building was constructed.
    BuildingPlaced {
        /// Agent that owns the new building.
        agent: AgentId,
        /// Kind of building constructed.
        kind: BuildingKind,
        /// Tile hosting the building.
        tile: TileCoord,
    },
    /// A building was demolished by its owner or scavenged while abandoned.
    BuildingRemoved {
        /// Kind of building removed.
        kind: BuildingKind,
        /// Tile that hosted the building.
        tile: TileCoord,
    },
    /// A building was destroyed by combat damage.
    BuildingDestroyed {
        /// Kind of building destroyed.
        kind: BuildingKind,
        /// Tile that hosted the building.
        tile: TileCoord,
    },
    /// A unit was created or reinforced.
    UnitPlaced {
        /// Agent that owns the unit.
        agent: AgentId,
        /// Tile the unit occupies.
        tile: TileCoord,
        /// Strength of the unit after placement or stacking.
        strength: i32,
    },
    /// A unit was withdrawn by its owner.
    UnitWithdrawn {
        /// Agent that owned the unit.
        agent: AgentId,
        /// Tile the unit vacated.
        tile: TileCoord,
        /// Money refunded for the withdrawn strength.
        refund: f32,
    },
    /// One unit struck another during the combat phase.
    UnitAttacked {
        /// Tile of the attacking unit.
        attacker: TileCoord,
        /// Tile of the defending unit.
        defender: TileCoord,
        /// Damage applied to the attacker.
        damage_to_attacker: i32,
        /// Damage applied to the defender.
        damage_to_defender: i32,
    },
    /// A unit's strength reached zero and it was removed.
    UnitKilled {
        /// Agent that owned the unit.
        agent: AgentId,
        /// Tile the unit occupied.
        tile: TileCoord,
    },
    /// Previously unseen tiles became visible to an agent.
    TilesRevealed {
        /// Agent whose view expanded.
        agent: AgentId,
        /// Number of tiles newly revealed.
        count: u32,
    },
    /// A proposed action failed validation.
    ActionRejected {
        /// Agent whose action was rejected.
        agent: AgentId,
        /// Kind of the rejected action.
        kind: ActionKind,
        /// Tile the action targeted.
        tile: TileCoord,
        /// Specific reason the validation failed.
        reason: Rejection,
    },
    /// A legal action lost same-tile conflict arbitration.
    ActionPreempted {
        /// Agent whose action lost the arbitration.
        agent: AgentId,
        /// Kind of the preempted action.
        kind: ActionKind,
        /// Contested tile.
        tile: TileCoord,
    },
}

/// Tuning surface controlling costs, rewards, and combat constants.
///
/// Defaults describe the baseline balance; harnesses may override any knob
/// before constructing a session.
#[derive(Clone, Debug)]
pub struct Rules {
    /// Money required to claim an unowned tile.
    pub claim_cost: f32,
    /// Money required to construct a city.
    pub city_cost: f32,
    /// Money required to construct a road on non-mountain terrain.
    pub road_cost: f32,
    /// Money required to construct a bridge.
    pub bridge_cost: f32,
    /// Money required to construct a farm.
    pub farm_cost: f32,
    /// Money required to construct a mine.
    pub mine_cost: f32,
    /// Money required to place one unit at `unit_strength`.
    pub unit_cost: f32,
    /// Strength assigned to a freshly placed unit.
    pub unit_strength: i32,
    /// Upper clamp applied to unit strength when stacking.
    pub max_unit_strength: i32,
    /// Reward granted for a successful claim.
    pub claim_reward: f32,
    /// Reward granted for a successful build action.
    pub build_reward: f32,
    /// Reward granted for placing a unit.
    pub place_unit_reward: f32,
    /// Reward penalty recorded for an action that fails validation.
    pub invalid_penalty: f32,
    /// Reward granted per previously unseen tile revealed by an action.
    pub discovery_bonus: f32,
    /// Box radius revealed around a tile an agent acts upon.
    pub visibility_range: u32,
    /// Minimum Chebyshev distance between two cities.
    pub city_clearance_radius: u32,
    /// Friendly units required adjacent to an enemy tile before a unit may
    /// be placed on it.
    pub conquer_threshold: u32,
    /// Floor applied to both combat damage rolls.
    pub min_damage: i32,
    /// Fixed damage a unit deals to a building per attack.
    pub building_damage: i32,
    /// Fraction of a withdrawn unit's strength refunded as money.
    pub withdraw_refund_ratio: f32,
    /// Fraction of a demolished building's income recuperated as reward.
    pub destroy_recuperation: f32,
    /// Money each agent starts an episode with.
    pub starting_money: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            claim_cost: 10.0,
            city_cost: 500.0,
            road_cost: 50.0,
            bridge_cost: 200.0,
            farm_cost: 100.0,
            mine_cost: 150.0,
            unit_cost: 100.0,
            unit_strength: 50,
            max_unit_strength: 100,
            claim_reward: 1.0,
            build_reward: 2.0,
            place_unit_reward: 1.0,
            invalid_penalty: -1.0,
            discovery_bonus: 0.1,
            visibility_range: 2,
            city_clearance_radius: 2,
            conquer_threshold: 2,
            min_damage: 5,
            building_damage: 25,
            withdraw_refund_ratio: 0.5,
            destroy_recuperation: 0.5,
            starting_money: 1000.0,
        }
    }
}

impl Rules {
    /// Money required to submit the given action kind at the given terrain.
    ///
    /// Roads cost double on mountains; waiting and withdrawing are free.
    #[must_use]
    pub fn cost(&self, kind: ActionKind, terrain: Terrain) -> f32 {
        match kind {
            ActionKind::Wait | ActionKind::WithdrawUnit | ActionKind::Destroy => 0.0,
            ActionKind::Claim => self.claim_cost,
            ActionKind::BuildCity => self.city_cost,
            ActionKind::BuildRoad => {
                if matches!(terrain, Terrain::Mountain) {
                    self.road_cost * 2.0
                } else {
                    self.road_cost
                }
            }
            ActionKind::BuildBridge => self.bridge_cost,
            ActionKind::BuildFarm => self.farm_cost,
            ActionKind::BuildMine => self.mine_cost,
            ActionKind::PlaceUnit => self.unit_cost,
        }
    }
}
