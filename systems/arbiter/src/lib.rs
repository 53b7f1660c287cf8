#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-round action arbitration.
//!
//! Every round each agent submits a batch of raw descriptors. The arbiter
//! decodes them all, validates every proposal against the pre-round world,
//! then resolves same-tile conflicts: when several validated actions target
//! one tile, a uniformly random winner executes and the rest are preempted
//! without cost. Arbitration carries no memory between rounds.

use std::collections::BTreeMap;

use landgrab_core::{
    Action, ActionDescriptor, AgentId, DescriptorError, Event, Rules, TileCoord,
};
use landgrab_world::{actions, World};
use rand::Rng;

/// Resolves one round of submitted action batches against the world.
///
/// `batches[i]` holds the descriptors proposed by agent `i`. Returns the
/// per-agent reward totals for the round. A descriptor with an unknown kind
/// id aborts the whole round before any state changes.
pub fn resolve_round<R: Rng>(
    world: &mut World,
    batches: &[Vec<ActionDescriptor>],
    rules: &Rules,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) -> Result<Vec<f32>, DescriptorError> {
    let mut rewards = vec![0.0_f32; batches.len()];

    // Decode everything up front so a malformed batch cannot leave the
    // round half-applied.
    let mut proposals: Vec<(usize, Action)> = Vec::new();
    for (index, batch) in batches.iter().enumerate() {
        let agent = AgentId::new(u8::try_from(index).unwrap_or(u8::MAX));
        for descriptor in batch {
            proposals.push((index, Action::from_descriptor(agent, *descriptor)?));
        }
    }

    // All validation runs against the pre-round world before any winner
    // executes. Every validated action contests its target tile, Waits
    // included; a winning Wait simply executes as a no-op.
    let mut contenders: BTreeMap<TileCoord, Vec<(usize, Action)>> = BTreeMap::new();
    for (index, action) in proposals {
        match actions::validate(world, &action, rules) {
            Ok(()) => contenders
                .entry(action.target)
                .or_default()
                .push((index, action)),
            Err(reason) => {
                rewards[index] += rules.invalid_penalty;
                out_events.push(Event::ActionRejected {
                    agent: action.agent,
                    kind: action.kind,
                    tile: action.target,
                    reason,
                });
            }
        }
    }

    for (_, mut group) in contenders {
        let winner = if group.len() == 1 {
            0
        } else {
            rng.gen_range(0..group.len())
        };
        for (slot, (_, action)) in group.iter().enumerate() {
            if slot != winner {
                out_events.push(Event::ActionPreempted {
                    agent: action.agent,
                    kind: action.kind,
                    tile: action.target,
                });
            }
        }
        let (index, action) = group.swap_remove(winner);
        rewards[index] += actions::execute(world, &action, rules, out_events);
    }

    Ok(rewards)
}
