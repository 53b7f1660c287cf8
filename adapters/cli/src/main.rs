#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line rollout driver for the Landgrab engine.
//!
//! Runs a seeded episode in which every agent submits one uniformly random
//! action per round, then prints a per-agent summary. Useful for smoke
//! testing maps and for generating transfer strings with `--save-map`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use landgrab_core::{ActionDescriptor, ActionKind, AgentId, Rules};
use landgrab_env::{codec, Session, SessionConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded random-policy rollouts over a Landgrab map.
#[derive(Debug, Parser)]
#[command(name = "landgrab", version, about)]
struct Args {
    /// Number of tile columns when generating a fresh map.
    #[arg(long, default_value_t = 16)]
    width: u32,

    /// Number of tile rows when generating a fresh map.
    #[arg(long, default_value_t = 16)]
    height: u32,

    /// Number of participating agents.
    #[arg(long, default_value_t = 2)]
    agents: u8,

    /// Seed shared by start placement, arbitration, and combat.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of rounds to roll out.
    #[arg(long, default_value_t = 32)]
    rounds: u32,

    /// Load the map topology from a transfer-string file instead of
    /// generating one.
    #[arg(long, value_name = "FILE")]
    load_map: Option<PathBuf>,

    /// Write the session's map topology to a transfer-string file.
    #[arg(long, value_name = "FILE")]
    save_map: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut session = match &args.load_map {
        Some(path) => {
            let encoded = fs::read_to_string(path)
                .with_context(|| format!("reading map from {}", path.display()))?;
            let snapshot = codec::decode(&encoded)
                .with_context(|| format!("decoding map from {}", path.display()))?;
            Session::with_snapshot(&snapshot, args.agents, Rules::default(), args.seed)
                .context("constructing session from saved map")?
        }
        None => Session::new(
            SessionConfig::new(args.width, args.height, args.agents),
            args.seed,
        )
        .context("constructing session")?,
    };

    if let Some(path) = &args.save_map {
        fs::write(path, session.save_map())
            .with_context(|| format!("writing map to {}", path.display()))?;
        println!("saved map to {}", path.display());
    }

    let width = session.world().grid().width();
    let height = session.world().grid().height();
    let mut policy = ChaCha8Rng::seed_from_u64(args.seed.wrapping_add(1));
    let mut totals = vec![0.0_f32; args.agents as usize];
    let mut event_count = 0usize;

    for _ in 0..args.rounds {
        let batches: Vec<Vec<ActionDescriptor>> = (0..args.agents)
            .map(|_| vec![random_descriptor(&mut policy, width, height)])
            .collect();
        let outcome = session.step(&batches).context("resolving round")?;
        for (total, reward) in totals.iter_mut().zip(&outcome.rewards) {
            *total += reward;
        }
        event_count += outcome.events.len();
    }

    println!(
        "episode: {}x{} map, {} agents, {} rounds, seed {}, {} events",
        width, height, args.agents, args.rounds, args.seed, event_count
    );
    for index in 0..args.agents {
        let agent = session
            .world()
            .agent(AgentId::new(index))
            .context("agent missing from world")?;
        println!(
            "agent {index}: reward {:+.1}, money {:.1}, {} tiles, {} buildings, {} units",
            totals[index as usize],
            agent.money(),
            agent.claimed().len(),
            agent.buildings().len(),
            agent.units().len()
        );
    }

    Ok(())
}

/// Draws one uniformly random action proposal within the map bounds.
fn random_descriptor<R: Rng>(rng: &mut R, width: u32, height: u32) -> ActionDescriptor {
    let kind = ActionKind::ALL[rng.gen_range(0..ActionKind::ALL.len())];
    ActionDescriptor::new(kind.id(), rng.gen_range(0..width), rng.gen_range(0..height))
}
