//! Combat power computation and environmental modifiers.
//!
//! Attack power is the sum of per-unit attack values; defense power weights
//! each defender's per-category defense by the attacker's power share in
//! that category, so a cavalry-heavy attack runs into anti-cavalry defense.
//! The wall raises defense multiplicatively. Morale, night window, and
//! overstack are attack-side multipliers.
//!
//! All fractional math uses [`Decimal`]; overflow surfaces as
//! [`BattleError::Arithmetic`] rather than wrapping.

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;

use warhold_types::{UnitCategory, UnitCount, UnitKind};

use crate::config::CombatConfig;
use crate::error::BattleError;
use crate::units;

/// Attack power contributed per category, skipping scouts (they fight only
/// in scout-vs-scout resolution).
pub fn attack_power_by_category(units: &UnitCount) -> BTreeMap<UnitCategory, u64> {
    let mut by_category: BTreeMap<UnitCategory, u64> = BTreeMap::new();
    for (&kind, &count) in units {
        if kind == UnitKind::Scout {
            continue;
        }
        let contribution = u64::from(units::stats(kind).attack).saturating_mul(u64::from(count));
        let entry = by_category.entry(kind.category()).or_insert(0);
        *entry = entry.saturating_add(contribution);
    }
    by_category
}

/// Total raw attack power before modifiers.
pub fn raw_attack_power(units: &UnitCount) -> u64 {
    attack_power_by_category(units)
        .values()
        .fold(0_u64, |acc, p| acc.saturating_add(*p))
}

/// Effective defense of a garrison against a given attack composition,
/// before the wall multiplier.
///
/// Each defender contributes its defense value against every incoming
/// category, weighted by that category's share of the total attack power.
/// With zero attack power the shares default to an even split.
///
/// # Errors
///
/// Returns [`BattleError::Arithmetic`] if the weighted sum overflows.
pub fn raw_defense_power(
    garrison: &UnitCount,
    attack_by_category: &BTreeMap<UnitCategory, u64>,
) -> Result<Decimal, BattleError> {
    let total_attack: u64 = attack_by_category
        .values()
        .fold(0_u64, |acc, p| acc.saturating_add(*p));

    let even_share = Decimal::ONE
        .checked_div(Decimal::from(UnitCategory::ALL.len()))
        .unwrap_or(Decimal::ZERO);

    let mut defense = Decimal::ZERO;
    for (&kind, &count) in garrison {
        if kind == UnitKind::Scout {
            continue;
        }
        let stats = units::stats(kind);
        for category in UnitCategory::ALL {
            let share = if total_attack == 0 {
                even_share
            } else {
                let category_power = attack_by_category.get(&category).copied().unwrap_or(0);
                Decimal::from(category_power)
                    .checked_div(Decimal::from(total_attack))
                    .unwrap_or(Decimal::ZERO)
            };
            let contribution = Decimal::from(stats.defense_vs(category))
                .checked_mul(Decimal::from(count))
                .and_then(|d| d.checked_mul(share))
                .ok_or_else(|| BattleError::Arithmetic {
                    context: String::from("defense contribution overflow"),
                })?;
            defense = defense
                .checked_add(contribution)
                .ok_or_else(|| BattleError::Arithmetic {
                    context: String::from("defense sum overflow"),
                })?;
        }
    }
    Ok(defense)
}

/// Wall defense multiplier: `1 + wall_defense_per_level * level`.
pub fn wall_multiplier(wall_level: u32, per_level: Decimal) -> Decimal {
    per_level
        .checked_mul(Decimal::from(wall_level))
        .and_then(|bonus| Decimal::ONE.checked_add(bonus))
        .unwrap_or(Decimal::ONE)
}

/// Attacker morale from the points ratio.
///
/// A big player hitting a small one fights at reduced morale:
/// `clamp(defender_points / attacker_points, morale_min, 1)`. Disabled or
/// degenerate inputs yield 1.
pub fn morale(attacker_points: u32, defender_points: u32, cfg: &CombatConfig) -> Decimal {
    if !cfg.morale_enabled || attacker_points == 0 {
        return Decimal::ONE;
    }
    let ratio = Decimal::from(defender_points)
        .checked_div(Decimal::from(attacker_points))
        .unwrap_or(Decimal::ONE);
    ratio.clamp(cfg.morale_min, Decimal::ONE)
}

/// Night-window attack multiplier at the command's arrival instant.
///
/// The window is `[night_start_hour, night_end_hour)` in UTC and may wrap
/// midnight.
pub fn night_bonus(arrival_at: DateTime<Utc>, cfg: &CombatConfig) -> Decimal {
    if !cfg.night_bonus_enabled {
        return Decimal::ONE;
    }
    let hour = arrival_at.hour();
    let in_window = if cfg.night_start_hour <= cfg.night_end_hour {
        hour >= cfg.night_start_hour && hour < cfg.night_end_hour
    } else {
        hour >= cfg.night_start_hour || hour < cfg.night_end_hour
    };
    if in_window {
        cfg.night_attack_multiplier
    } else {
        Decimal::ONE
    }
}

/// Overstack penalty for an army beyond the world's density threshold.
///
/// The multiplier is `threshold / total_units`, floored at the configured
/// minimum; armies at or under the threshold fight at full power.
pub fn overstack_penalty(total_units: u32, cfg: &CombatConfig) -> Decimal {
    if total_units <= cfg.overstack_threshold || cfg.overstack_threshold == 0 {
        return Decimal::ONE;
    }
    Decimal::from(cfg.overstack_threshold)
        .checked_div(Decimal::from(total_units))
        .unwrap_or(Decimal::ONE)
        .clamp(cfg.overstack_min_multiplier, Decimal::ONE)
}

/// Total plunder carry capacity of a unit set.
pub fn carry_capacity(units: &UnitCount) -> u64 {
    units.iter().fold(0_u64, |acc, (&kind, &count)| {
        acc.saturating_add(u64::from(units::stats(kind).carry).saturating_mul(u64::from(count)))
    })
}
