//! Seeded, fixed-point random draws.
//!
//! Every stochastic input to a resolution (luck, per-envoy drop rolls) comes
//! from a [`StdRng`] seeded from the world seed and the command id, so
//! replaying the same command over the same data reproduces the battle
//! exactly. Draws are quantized to four decimal places and done entirely in
//! [`Decimal`], keeping floats out of combat math.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use uuid::Uuid;

use warhold_types::CommandId;

/// Resolution of one draw: `1 / DRAW_STEPS` of the requested interval.
const DRAW_STEPS: u32 = 10_000;

/// Derive the deterministic RNG seed for one command.
///
/// Folds the command's UUID into the world seed; distinct commands on the
/// same world get independent streams, and the same command always gets the
/// same stream.
pub fn command_seed(world_seed: u64, command_id: CommandId) -> u64 {
    let bits = Uuid::from(command_id).as_u128();
    let lo = u64::try_from(bits & u128::from(u64::MAX)).unwrap_or(0);
    let hi = u64::try_from(bits >> 64).unwrap_or(0);
    world_seed ^ lo ^ hi.rotate_left(32)
}

/// Build the RNG for one command's resolution.
pub fn command_rng(world_seed: u64, command_id: CommandId) -> StdRng {
    StdRng::seed_from_u64(command_seed(world_seed, command_id))
}

/// Uniform draw in `[min, max]`, quantized to [`DRAW_STEPS`] steps.
///
/// A degenerate interval (`max <= min`) always yields `min`.
pub fn uniform_between(rng: &mut StdRng, min: Decimal, max: Decimal) -> Decimal {
    if max <= min {
        return min;
    }
    let step = rng.random_range(0..=DRAW_STEPS);
    let fraction = Decimal::new(i64::from(step), 4);
    max.checked_sub(min)
        .and_then(|span| span.checked_mul(fraction))
        .and_then(|offset| min.checked_add(offset))
        .unwrap_or(min)
}
