//! The continuous loss-ratio curve.
//!
//! Losses scale continuously with the effective power ratio on both sides
//! rather than being all-or-nothing. The curve's shape is a single exponent
//! `k` (`combat.loss_curve_exponent`):
//!
//! - the weaker side's loss fraction is `min(1, (stronger/weaker)^k)` -- at
//!   any disadvantage it is wiped out;
//! - the stronger side's loss fraction is `(weaker/stronger)^k`.
//!
//! Boundary behavior: ratio = 1 gives even, total losses on both sides;
//! ratio -> infinity drives the attacker's losses to zero.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;

use warhold_types::UnitCount;

use crate::error::BattleError;

/// Loss fractions `(attacker, defender)` for the given effective powers.
///
/// Both fractions are in `[0, 1]`. Zero-power edge cases: with no defense
/// the defender loses everything and the attacker nothing; with no attack
/// power the reverse; with neither, nobody fights.
///
/// # Errors
///
/// Returns [`BattleError::Arithmetic`] if the exponentiation fails.
pub fn loss_fractions(
    attack: Decimal,
    defense: Decimal,
    exponent: Decimal,
) -> Result<(Decimal, Decimal), BattleError> {
    if attack <= Decimal::ZERO && defense <= Decimal::ZERO {
        return Ok((Decimal::ZERO, Decimal::ZERO));
    }
    if defense <= Decimal::ZERO {
        return Ok((Decimal::ZERO, Decimal::ONE));
    }
    if attack <= Decimal::ZERO {
        return Ok((Decimal::ONE, Decimal::ZERO));
    }

    let attacker_base = defense
        .checked_div(attack)
        .ok_or_else(|| arithmetic("attacker loss base"))?;
    let defender_base = attack
        .checked_div(defense)
        .ok_or_else(|| arithmetic("defender loss base"))?;

    Ok((
        curve(attacker_base, exponent)?,
        curve(defender_base, exponent)?,
    ))
}

/// `min(1, base^k)` for `base > 0`, computed only below 1 so the
/// exponentiation cannot overflow.
fn curve(base: Decimal, exponent: Decimal) -> Result<Decimal, BattleError> {
    if base >= Decimal::ONE {
        return Ok(Decimal::ONE);
    }
    if base <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    base.checked_powd(exponent)
        .map(|f| f.clamp(Decimal::ZERO, Decimal::ONE))
        .ok_or_else(|| arithmetic("loss curve exponentiation"))
}

/// Apply a loss fraction to a unit composition.
///
/// Per-kind losses round half away from zero and are capped at the sent
/// count, so `surviving = sent - lost` holds exactly and no count goes
/// negative.
pub fn apply_losses(sent: &UnitCount, fraction: Decimal) -> (UnitCount, UnitCount) {
    let mut lost = UnitCount::new();
    let mut surviving = UnitCount::new();
    for (&kind, &count) in sent {
        let lost_count = Decimal::from(count)
            .checked_mul(fraction)
            .map(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|d| d.to_u32())
            .unwrap_or(count)
            .min(count);
        lost.insert(kind, lost_count);
        surviving.insert(kind, count.saturating_sub(lost_count));
    }
    (lost, surviving)
}

fn arithmetic(context: &str) -> BattleError {
    BattleError::Arithmetic {
        context: context.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use warhold_types::UnitKind;

    use super::*;

    fn k() -> Decimal {
        Decimal::new(15, 1)
    }

    #[test]
    fn even_powers_mean_even_total_losses() {
        let (atk, def) = loss_fractions(Decimal::from(500), Decimal::from(500), k()).unwrap();
        assert_eq!(atk, Decimal::ONE);
        assert_eq!(def, Decimal::ONE);
    }

    #[test]
    fn overwhelming_attack_approaches_zero_attacker_losses() {
        let (atk, def) =
            loss_fractions(Decimal::from(1_000_000), Decimal::from(100), k()).unwrap();
        assert!(atk < Decimal::new(1, 3), "attacker losses should vanish: {atk}");
        assert_eq!(def, Decimal::ONE);
    }

    #[test]
    fn loss_fraction_monotone_in_ratio() {
        let weaker = loss_fractions(Decimal::from(1_000), Decimal::from(800), k())
            .unwrap()
            .0;
        let stronger = loss_fractions(Decimal::from(1_000), Decimal::from(400), k())
            .unwrap()
            .0;
        assert!(stronger < weaker);
    }

    #[test]
    fn zero_defense_is_a_free_win() {
        let (atk, def) = loss_fractions(Decimal::from(100), Decimal::ZERO, k()).unwrap();
        assert_eq!(atk, Decimal::ZERO);
        assert_eq!(def, Decimal::ONE);
    }

    #[test]
    fn zero_attack_is_a_free_defense() {
        let (atk, def) = loss_fractions(Decimal::ZERO, Decimal::from(100), k()).unwrap();
        assert_eq!(atk, Decimal::ONE);
        assert_eq!(def, Decimal::ZERO);
    }

    #[test]
    fn conservation_per_unit_kind() {
        let mut sent = UnitCount::new();
        sent.insert(UnitKind::AxeFighter, 137);
        sent.insert(UnitKind::LightCavalry, 41);
        sent.insert(UnitKind::Ram, 3);

        let (lost, surviving) = apply_losses(&sent, Decimal::new(37, 2));
        for (kind, &sent_count) in &sent {
            let l = lost.get(kind).copied().unwrap_or(0);
            let s = surviving.get(kind).copied().unwrap_or(0);
            assert_eq!(l.saturating_add(s), sent_count);
        }
    }

    #[test]
    fn full_fraction_wipes_everything() {
        let mut sent = UnitCount::new();
        sent.insert(UnitKind::Swordsman, 250);
        let (lost, surviving) = apply_losses(&sent, Decimal::ONE);
        assert_eq!(lost.get(&UnitKind::Swordsman).copied(), Some(250));
        assert_eq!(surviving.get(&UnitKind::Swordsman).copied(), Some(0));
    }

    #[test]
    fn zero_fraction_loses_nothing() {
        let mut sent = UnitCount::new();
        sent.insert(UnitKind::Envoy, 4);
        let (lost, surviving) = apply_losses(&sent, Decimal::ZERO);
        assert_eq!(lost.get(&UnitKind::Envoy).copied(), Some(0));
        assert_eq!(surviving.get(&UnitKind::Envoy).copied(), Some(4));
    }
}
