//! Pure battle resolution.
//!
//! [`resolve`] turns one due command plus the target village's state into a
//! [`BattleResolution`]: loss accounting for both sides, siege damage,
//! plunder, the conquest outcome, and the post-battle village. It performs
//! no I/O and draws all randomness from a seed derived from the world seed
//! and the command id, so resolving the same command over the same data
//! always produces the same result.
//!
//! Order of operations within one resolution: modifiers, line combat, ram
//! and catapult damage, conquest attempt (against the post-siege wall),
//! plunder.

use rand::rngs::StdRng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use warhold_types::{
    BattleId, BattleModifiers, BattleOutcome, BuildingKind, Command, CommandType, IntelLevel,
    ResourceAmount, ResourceKind, SideBreakdown, UnitCount, UnitKind, VillageState,
};

use crate::config::WorldConfig;
use crate::conquest::{AttemptInput, CaptureOutcome, ConquestEngine};
use crate::draw;
use crate::error::BattleError;
use crate::losses::{apply_losses, loss_fractions};
use crate::power;
use crate::units::{SCOUT_ATTACK, SCOUT_DEFENSE};

/// Everything one resolved command produced.
///
/// The caller persists `updated_village` under the optimistic version check,
/// credits `returning_units` and `plunder` to the source village, and builds
/// the report, metrics, and audit rows from the rest.
#[derive(Debug, Clone)]
pub struct BattleResolution {
    /// Identifier shared by both report perspectives.
    pub battle_id: BattleId,
    /// Overall outcome.
    pub outcome: BattleOutcome,
    /// Modifiers in force, persisted for offline replay.
    pub modifiers: BattleModifiers,
    /// Effective attack power after all modifiers.
    pub attack_power: Decimal,
    /// Effective defense power after all modifiers.
    pub defense_power: Decimal,
    /// Attacker unit accounting.
    pub attacker: SideBreakdown,
    /// Defender unit accounting.
    pub defender: SideBreakdown,
    /// Wall level before ram damage.
    pub wall_before: u32,
    /// Wall level after ram damage.
    pub wall_after: u32,
    /// Catapult target, if the command named one.
    pub building_target: Option<BuildingKind>,
    /// Target building level before catapult damage.
    pub building_before: Option<u32>,
    /// Target building level after catapult damage.
    pub building_after: Option<u32>,
    /// Resources plundered by the survivors.
    pub plunder: ResourceAmount,
    /// Resources the vault shielded from plunder.
    pub vault_protected: ResourceAmount,
    /// Conquest outcome; present iff the command carried envoys.
    pub conquest: Option<CaptureOutcome>,
    /// Defender detail the attacker's report is allowed to show.
    pub defender_intel: IntelLevel,
    /// Survivors marching home; empty when they garrison a captured village.
    pub returning_units: UnitCount,
    /// The village as this resolution left it.
    pub updated_village: VillageState,
}

/// Resolve one attack or scout command against the target village.
///
/// `attacker_points` is the issuing player's current point total, consulted
/// by morale. The input village is not mutated; the post-battle state is
/// returned in the resolution.
///
/// # Errors
///
/// Returns [`BattleError::MalformedComposition`] for an empty or invalid
/// unit composition, or [`BattleError::Arithmetic`] if combat math fails.
pub fn resolve(
    command: &Command,
    attacker_points: u32,
    village: &VillageState,
    cfg: &WorldConfig,
    engine: &dyn ConquestEngine,
    world_seed: u64,
) -> Result<BattleResolution, BattleError> {
    if command.total_units() == 0 {
        return Err(BattleError::MalformedComposition {
            context: String::from("command carries no units"),
        });
    }
    let mut rng = draw::command_rng(world_seed, command.id);
    match command.command_type {
        CommandType::Scout => resolve_scout(command, village, cfg),
        CommandType::Attack => {
            resolve_attack(command, attacker_points, village, cfg, engine, &mut rng)
        }
        CommandType::Support => Err(BattleError::MalformedComposition {
            context: String::from("support commands do not resolve as battles"),
        }),
    }
}

/// Merge arriving support troops into the target garrison.
pub fn apply_support(village: &mut VillageState, units: &UnitCount) {
    for (&kind, &count) in units {
        let entry = village.garrison.entry(kind).or_insert(0);
        *entry = entry.saturating_add(count);
    }
}

fn resolve_attack(
    command: &Command,
    attacker_points: u32,
    village: &VillageState,
    cfg: &WorldConfig,
    engine: &dyn ConquestEngine,
    rng: &mut StdRng,
) -> Result<BattleResolution, BattleError> {
    let mut updated = village.clone();
    let now = command.arrival_at;

    let luck = if cfg.combat.luck_enabled {
        draw::uniform_between(rng, cfg.combat.luck_min, cfg.combat.luck_max)
    } else {
        Decimal::ZERO
    };
    let modifiers = BattleModifiers {
        morale: power::morale(attacker_points, village.points, &cfg.combat),
        luck,
        night_bonus: power::night_bonus(now, &cfg.combat),
        overstack_penalty: power::overstack_penalty(command.total_units(), &cfg.combat),
        wall_multiplier: power::wall_multiplier(
            village.wall_level,
            cfg.combat.wall_defense_per_level,
        ),
    };

    let attack_by_category = power::attack_power_by_category(&command.units);
    let luck_factor = Decimal::ONE
        .checked_add(luck)
        .ok_or_else(|| arithmetic("luck factor"))?;
    let attack_power = Decimal::from(power::raw_attack_power(&command.units))
        .checked_mul(modifiers.morale)
        .and_then(|p| p.checked_mul(luck_factor))
        .and_then(|p| p.checked_mul(modifiers.night_bonus))
        .and_then(|p| p.checked_mul(modifiers.overstack_penalty))
        .ok_or_else(|| arithmetic("effective attack power"))?;

    let mut defense_power = power::raw_defense_power(&village.garrison, &attack_by_category)?
        .checked_mul(modifiers.wall_multiplier)
        .ok_or_else(|| arithmetic("effective defense power"))?;
    if cfg.combat.luck_applies_to_defender {
        let inverse = Decimal::ONE
            .checked_sub(luck)
            .ok_or_else(|| arithmetic("defender luck factor"))?;
        defense_power = defense_power
            .checked_mul(inverse)
            .ok_or_else(|| arithmetic("defender luck factor"))?;
    }

    let (attacker_frac, defender_frac) =
        loss_fractions(attack_power, defense_power, cfg.combat.loss_curve_exponent)?;
    let (attacker_lost, attacker_surviving) = apply_losses(&command.units, attacker_frac);
    let (defender_lost, defender_surviving) = apply_losses(&village.garrison, defender_frac);

    let outcome = match attack_power.cmp(&defense_power) {
        std::cmp::Ordering::Greater => BattleOutcome::AttackerWin,
        std::cmp::Ordering::Less => BattleOutcome::DefenderWin,
        std::cmp::Ordering::Equal => BattleOutcome::Draw,
    };

    updated.garrison = defender_surviving.clone();

    // Rams hit the wall, catapults the named building; both scale with the
    // survivors only, so a repelled attack does no siege damage.
    let wall_before = village.wall_level;
    let ram_damage = unit_count(&attacker_surviving, UnitKind::Ram)
        .saturating_mul(cfg.siege.ram_damage);
    let wall_after = demolish(wall_before, ram_damage, cfg.siege.wall_hitpoints_base);
    updated.wall_level = wall_after;

    let building_target = command.target_building;
    let (building_before, building_after) = match building_target {
        Some(building) => {
            let before = updated.building_levels.get(&building).copied().unwrap_or(0);
            let catapult_damage = unit_count(&attacker_surviving, UnitKind::Catapult)
                .saturating_mul(cfg.siege.catapult_damage);
            let after = demolish(before, catapult_damage, cfg.siege.building_hitpoints_base);
            updated.building_levels.insert(building, after);
            (Some(before), Some(after))
        }
        None => (None, None),
    };

    // Envoys act against the post-ram wall.
    let conquest = if command.envoy_count() > 0 {
        let surviving_envoys = envoy_count(&attacker_surviving);
        let input = AttemptInput {
            attacker_id: command.attacker_id,
            surviving_envoys,
            now,
        };
        Some(engine.apply_attempt(&mut updated, &input, rng)?)
    } else {
        None
    };
    let captured = conquest.as_ref().is_some_and(|c| c.captured);

    let (plunder, vault_protected) = if outcome == BattleOutcome::AttackerWin {
        let capacity = power::carry_capacity(&attacker_surviving);
        take_plunder(&mut updated.resources, capacity, cfg.economy.vault_protect_pct)
    } else {
        (ResourceAmount::new(), ResourceAmount::new())
    };

    // A conquering force garrisons its prize instead of marching home.
    let returning_units = if captured {
        updated.garrison = attacker_surviving.clone();
        UnitCount::new()
    } else {
        attacker_surviving.clone()
    };

    let defender_intel = if outcome == BattleOutcome::AttackerWin {
        IntelLevel::Full
    } else {
        cfg.combat.losing_intel
    };

    Ok(BattleResolution {
        battle_id: BattleId::new(),
        outcome,
        modifiers,
        attack_power,
        defense_power,
        attacker: SideBreakdown {
            sent: command.units.clone(),
            lost: attacker_lost,
            surviving: attacker_surviving,
        },
        defender: SideBreakdown {
            sent: village.garrison.clone(),
            lost: defender_lost,
            surviving: defender_surviving,
        },
        wall_before,
        wall_after,
        building_target,
        building_before,
        building_after,
        plunder,
        vault_protected,
        conquest,
        defender_intel,
        returning_units,
        updated_village: updated,
    })
}

/// Scout-vs-scout resolution: only scouts fight, and only the defender's
/// scouts can die. A successful scout returns full intel on the garrison.
fn resolve_scout(
    command: &Command,
    village: &VillageState,
    cfg: &WorldConfig,
) -> Result<BattleResolution, BattleError> {
    let sent_scouts = unit_count(&command.units, UnitKind::Scout);
    if sent_scouts == 0 {
        return Err(BattleError::MalformedComposition {
            context: String::from("scout command carries no scouts"),
        });
    }

    let attack_power = Decimal::from(
        u64::from(sent_scouts).saturating_mul(u64::from(SCOUT_ATTACK)),
    );
    let defending_scouts = unit_count(&village.garrison, UnitKind::Scout);
    let defense_power = Decimal::from(
        u64::from(defending_scouts).saturating_mul(u64::from(SCOUT_DEFENSE)),
    );

    let (attacker_frac, defender_frac) =
        loss_fractions(attack_power, defense_power, cfg.combat.loss_curve_exponent)?;
    let scouts_sent: UnitCount = [(UnitKind::Scout, sent_scouts)].into_iter().collect();
    let (attacker_lost, attacker_surviving) = apply_losses(&scouts_sent, attacker_frac);
    let scouts_defending: UnitCount = [(UnitKind::Scout, defending_scouts)].into_iter().collect();
    let (defender_lost, defender_surviving) = apply_losses(&scouts_defending, defender_frac);

    let outcome = if attack_power > defense_power {
        BattleOutcome::AttackerWin
    } else {
        BattleOutcome::DefenderWin
    };
    let defender_intel = if outcome == BattleOutcome::AttackerWin {
        IntelLevel::Full
    } else {
        IntelLevel::Hidden
    };

    let mut updated = village.clone();
    let surviving_defender_scouts = unit_count(&defender_surviving, UnitKind::Scout);
    if defending_scouts > 0 {
        updated
            .garrison
            .insert(UnitKind::Scout, surviving_defender_scouts);
    }

    Ok(BattleResolution {
        battle_id: BattleId::new(),
        outcome,
        modifiers: BattleModifiers::neutral(),
        attack_power,
        defense_power,
        attacker: SideBreakdown {
            sent: scouts_sent,
            lost: attacker_lost,
            surviving: attacker_surviving.clone(),
        },
        defender: SideBreakdown {
            sent: scouts_defending,
            lost: defender_lost,
            surviving: defender_surviving,
        },
        wall_before: village.wall_level,
        wall_after: village.wall_level,
        building_target: None,
        building_before: None,
        building_after: None,
        plunder: ResourceAmount::new(),
        vault_protected: ResourceAmount::new(),
        conquest: None,
        defender_intel,
        returning_units: attacker_surviving,
        updated_village: updated,
    })
}

/// Knock levels off a wall or building: demolishing level `n` costs
/// `n * hitpoints_base` damage points.
fn demolish(level: u32, damage: u32, hitpoints_base: u32) -> u32 {
    let mut level = level;
    let mut damage = damage;
    while level > 0 {
        let cost = hitpoints_base.saturating_mul(level);
        if cost == 0 || damage < cost {
            break;
        }
        damage = damage.saturating_sub(cost);
        level = level.saturating_sub(1);
    }
    level
}

/// Remove up to `capacity` resources from the village, leaving the vault
/// share untouched. Capacity spreads evenly across the kinds that still have
/// lootable stock, with remainder passes until capacity or loot runs out.
fn take_plunder(
    resources: &mut ResourceAmount,
    capacity: u64,
    vault_protect_pct: Decimal,
) -> (ResourceAmount, ResourceAmount) {
    let mut vault_protected = ResourceAmount::new();
    let mut lootable: ResourceAmount = ResourceAmount::new();
    for kind in ResourceKind::ALL {
        let amount = resources.get(&kind).copied().unwrap_or(0);
        let protected = Decimal::from(amount)
            .checked_mul(vault_protect_pct)
            .map(|d| d.ceil())
            .and_then(|d| d.to_u32())
            .unwrap_or(amount)
            .min(amount);
        vault_protected.insert(kind, protected);
        lootable.insert(kind, amount.saturating_sub(protected));
    }

    let mut taken = ResourceAmount::new();
    let mut remaining = capacity;
    loop {
        let open: Vec<ResourceKind> = ResourceKind::ALL
            .into_iter()
            .filter(|k| lootable.get(k).copied().unwrap_or(0) > 0)
            .collect();
        if remaining == 0 || open.is_empty() {
            break;
        }
        let share = remaining
            .checked_div(u64::try_from(open.len()).unwrap_or(1))
            .unwrap_or(remaining)
            .max(1);
        let mut progressed = false;
        for kind in open {
            if remaining == 0 {
                break;
            }
            let available = u64::from(lootable.get(&kind).copied().unwrap_or(0));
            let take = share.min(available).min(remaining);
            if take == 0 {
                continue;
            }
            let take_u32 = u32::try_from(take).unwrap_or(u32::MAX);
            let entry = taken.entry(kind).or_insert(0);
            *entry = entry.saturating_add(take_u32);
            lootable.insert(
                kind,
                lootable
                    .get(&kind)
                    .copied()
                    .unwrap_or(0)
                    .saturating_sub(take_u32),
            );
            remaining = remaining.saturating_sub(take);
            progressed = true;
        }
        if !progressed {
            break;
        }
    }

    for (kind, &plundered) in &taken {
        let entry = resources.entry(*kind).or_insert(0);
        *entry = entry.saturating_sub(plundered);
    }
    (taken, vault_protected)
}

fn unit_count(units: &UnitCount, kind: UnitKind) -> u32 {
    units.get(&kind).copied().unwrap_or(0)
}

fn envoy_count(units: &UnitCount) -> u32 {
    units
        .iter()
        .filter(|(k, _)| k.is_envoy())
        .fold(0_u32, |acc, (_, n)| acc.saturating_add(*n))
}

fn arithmetic(context: &str) -> BattleError {
    BattleError::Arithmetic {
        context: context.to_owned(),
    }
}
