#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Episode environment adapter.
//!
//! A [`Session`] wraps one world together with its rules and the single
//! seeded random stream the engine draws from. External harnesses drive it
//! through a reset/step loop: [`Session::reset`] seeds a fresh episode and
//! [`Session::step`] resolves one round of submitted action batches through
//! arbitration, combat, and income collection. The engine never ends an
//! episode on its own; horizons belong to the harness.

pub mod codec;

use landgrab_core::{ActionDescriptor, AgentId, DescriptorError, Event, Rules, TileCoord, MAX_AGENTS};
use landgrab_system_arbiter::resolve_round;
use landgrab_system_combat::resolve_combat;
use landgrab_world::query::{self, Observation};
use landgrab_world::snapshot::{MapSnapshot, SnapshotError};
use landgrab_world::{Grid, World};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Static episode parameters fixed at session construction.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Number of tile columns.
    pub width: u32,
    /// Number of tile rows.
    pub height: u32,
    /// Number of participating agents.
    pub agent_count: u8,
    /// Tuning knobs applied for the whole session.
    pub rules: Rules,
}

impl SessionConfig {
    /// Creates a configuration with default rules.
    #[must_use]
    pub fn new(width: u32, height: u32, agent_count: u8) -> Self {
        Self {
            width,
            height,
            agent_count,
            rules: Rules::default(),
        }
    }
}

/// Errors raised while constructing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The requested grid has no tiles.
    #[error("the map must have at least one tile")]
    EmptyMap,
    /// The requested agent count falls outside `[1, MAX_AGENTS]`.
    #[error("agent count {requested} is outside [1, {MAX_AGENTS}]")]
    UnsupportedAgentCount {
        /// Agent count the caller asked for.
        requested: u8,
    },
    /// The map has fewer start-capable tiles than agents.
    #[error("only {candidates} land tiles for {agents} agents")]
    NotEnoughLand {
        /// Number of non-water tiles on the map.
        candidates: usize,
        /// Number of agents needing a starting tile.
        agents: u8,
    },
    /// The provided map snapshot could not be rebuilt into a grid.
    #[error("invalid map snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Result of one resolved round.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Tile-feature tensor captured after the round.
    pub observation: Observation,
    /// Per-agent reward totals for the round.
    pub rewards: Vec<f32>,
    /// Per-agent termination flags; always false, horizons are external.
    pub dones: Vec<bool>,
    /// Every event the round produced, in emission order.
    pub events: Vec<Event>,
}

/// One playable episode environment: world, rules, and the seeded stream
/// behind conflict arbitration, combat, and start placement.
#[derive(Clone, Debug)]
pub struct Session {
    world: World,
    rules: Rules,
    rng: ChaCha8Rng,
    seed: u64,
    round: u32,
}

impl Session {
    /// Creates a session over an all-land map of the configured size.
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, SessionError> {
        Self::with_grid(
            Grid::all_land(config.width, config.height),
            config.agent_count,
            config.rules,
            seed,
        )
    }

    /// Creates a session over a previously saved map.
    pub fn with_snapshot(
        snapshot: &MapSnapshot,
        agent_count: u8,
        rules: Rules,
        seed: u64,
    ) -> Result<Self, SessionError> {
        Self::with_grid(snapshot.grid()?, agent_count, rules, seed)
    }

    /// Creates a session over a finished terrain grid.
    pub fn with_grid(
        grid: Grid,
        agent_count: u8,
        rules: Rules,
        seed: u64,
    ) -> Result<Self, SessionError> {
        if grid.width() == 0 || grid.height() == 0 {
            return Err(SessionError::EmptyMap);
        }
        if agent_count == 0 || agent_count > MAX_AGENTS {
            return Err(SessionError::UnsupportedAgentCount {
                requested: agent_count,
            });
        }
        let candidates = grid
            .iter()
            .filter(|(_, tile)| !tile.terrain().is_water())
            .count();
        if candidates < agent_count as usize {
            return Err(SessionError::NotEnoughLand {
                candidates,
                agents: agent_count,
            });
        }

        let world = World::new(grid, agent_count, &rules);
        let mut session = Self {
            world,
            rules,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            round: 0,
        };
        let _ = session.reset();
        Ok(session)
    }

    /// Starts a fresh episode: clears all dynamic state, reseeds the random
    /// stream, grants every agent a starting foothold, and returns the
    /// initial observation.
    ///
    /// Resetting with the same seed reproduces the same starting positions.
    pub fn reset(&mut self) -> Observation {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.round = 0;
        self.world.reset(&self.rules);

        let candidates: Vec<TileCoord> = self
            .world
            .grid()
            .iter()
            .filter(|(_, tile)| !tile.terrain().is_water())
            .map(|(pos, _)| pos)
            .collect();
        let starts: Vec<TileCoord> = candidates
            .choose_multiple(&mut self.rng, self.world.agent_count())
            .copied()
            .collect();
        for (index, pos) in starts.into_iter().enumerate() {
            self.world.seed_agent_start(
                AgentId::new(index as u8),
                pos,
                self.rules.visibility_range,
            );
        }
        query::observation(&self.world)
    }

    /// Replaces the map topology and starts a fresh episode on it.
    ///
    /// The agent roster and rules carry over; all dynamic state starts
    /// empty, exactly as after [`Session::reset`].
    pub fn reset_with_grid(&mut self, grid: Grid) -> Result<Observation, SessionError> {
        if grid.width() == 0 || grid.height() == 0 {
            return Err(SessionError::EmptyMap);
        }
        let agents = self.world.agent_count() as u8;
        let candidates = grid
            .iter()
            .filter(|(_, tile)| !tile.terrain().is_water())
            .count();
        if candidates < agents as usize {
            return Err(SessionError::NotEnoughLand {
                candidates,
                agents,
            });
        }
        self.world = World::new(grid, agents, &self.rules);
        Ok(self.reset())
    }

    /// Resolves one round: arbitration, then combat, then income.
    ///
    /// `batches[i]` holds the descriptors proposed by agent `i`. A
    /// descriptor with an unknown kind id aborts the round with a hard
    /// error before any state changes.
    pub fn step(
        &mut self,
        batches: &[Vec<ActionDescriptor>],
    ) -> Result<StepOutcome, DescriptorError> {
        let mut events = Vec::new();
        let rewards = resolve_round(
            &mut self.world,
            batches,
            &self.rules,
            &mut self.rng,
            &mut events,
        )?;
        resolve_combat(&mut self.world, &self.rules, &mut self.rng, &mut events);
        self.world.collect_income();
        self.round += 1;

        Ok(StepOutcome {
            observation: query::observation(&self.world),
            rewards,
            dones: vec![false; self.world.agent_count()],
            events,
        })
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Rules the session was constructed with.
    #[must_use]
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Number of rounds resolved since the last reset.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Seed the session's random stream derives from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Encodes the current map topology as a transfer string.
    #[must_use]
    pub fn save_map(&self) -> String {
        codec::encode(&MapSnapshot::capture(&self.world))
    }
}
