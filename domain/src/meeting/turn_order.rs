//! Speaking order within a round.

use super::config::TurnOrder;
use super::participant::Participant;
use rand::Rng;

/// Unbiased in-place Fisher–Yates shuffle (backward pass).
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Compute the speaking order for one round.
///
/// Sequential keeps registration order; random draws a fresh shuffle on
/// every call, so callers recompute it per round.
pub fn round_order<'a, R: Rng + ?Sized>(
    participants: &'a [Participant],
    policy: TurnOrder,
    rng: &mut R,
) -> Vec<&'a Participant> {
    let mut order: Vec<&Participant> = participants.iter().collect();
    if policy == TurnOrder::Random {
        shuffle(&mut order, rng);
    }
    order
}
