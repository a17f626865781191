//! Assembly of the persisted battle artifacts.
//!
//! One resolution produces two report rows (attacker and defender
//! perspective, sharing a `battle_id`), one metrics row, and, when the
//! command carried envoys, one conquest audit row. The attacker's view of
//! the defender is redacted according to the intel level the battle earned.

use chrono::{DateTime, Utc};

use warhold_types::{
    BattleMetrics, BattleReport, Command, ConquestAttempt, IntelLevel, Perspective, ReportId,
    SideBreakdown, UnitCount, REPORT_VERSION,
};

use crate::battle::BattleResolution;

/// Build both perspectives of the battle report.
///
/// The defender always sees the full attacking force; the attacker sees the
/// garrison only to the depth of `defender_intel`.
pub fn build_reports(
    command: &Command,
    resolution: &BattleResolution,
    now: DateTime<Utc>,
) -> [BattleReport; 2] {
    let attacker_view = BattleReport {
        id: ReportId::new(),
        battle_id: resolution.battle_id,
        command_id: command.id,
        perspective: Perspective::Attacker,
        recipient_id: command.attacker_id,
        outcome: resolution.outcome,
        attacker: resolution.attacker.clone(),
        defender: redact_defender(&resolution.defender, resolution.defender_intel),
        modifiers: resolution.modifiers.clone(),
        wall_before: resolution.wall_before,
        wall_after: resolution.wall_after,
        building_target: resolution.building_target,
        building_before: resolution.building_before,
        building_after: resolution.building_after,
        plunder: resolution.plunder.clone(),
        vault_protected: resolution.vault_protected.clone(),
        meter_before: resolution.conquest.as_ref().map(|c| c.meter_before),
        meter_after: resolution.conquest.as_ref().map(|c| c.meter_after),
        village_captured: resolution.conquest.as_ref().is_some_and(|c| c.captured),
        is_fake: command.is_fake,
        defender_intel: resolution.defender_intel,
        report_version: REPORT_VERSION,
        created_at: now,
    };

    let defender_view = BattleReport {
        id: ReportId::new(),
        perspective: Perspective::Defender,
        recipient_id: command.defender_id,
        defender: Some(resolution.defender.clone()),
        defender_intel: IntelLevel::Full,
        ..attacker_view.clone()
    };

    [attacker_view, defender_view]
}

/// Apply the earned intel level to the defender breakdown.
fn redact_defender(defender: &SideBreakdown, intel: IntelLevel) -> Option<SideBreakdown> {
    match intel {
        IntelLevel::Full => Some(defender.clone()),
        IntelLevel::LossesOnly => Some(SideBreakdown {
            sent: UnitCount::new(),
            lost: defender.lost.clone(),
            surviving: UnitCount::new(),
        }),
        IntelLevel::Hidden => None,
    }
}

/// Build the aggregate metrics row for one resolution.
pub fn build_metrics(
    command: &Command,
    resolution: &BattleResolution,
    now: DateTime<Utc>,
) -> BattleMetrics {
    let plunder_total = resolution
        .plunder
        .values()
        .fold(0_u32, |acc, n| acc.saturating_add(*n));
    BattleMetrics {
        battle_id: resolution.battle_id,
        command_id: command.id,
        world_id: command.world_id,
        attack_power: resolution.attack_power,
        defense_power: resolution.defense_power,
        attacker_sent: command.total_units(),
        attacker_lost: resolution.attacker.total_lost(),
        defender_sent: resolution
            .defender
            .sent
            .values()
            .fold(0_u32, |acc, n| acc.saturating_add(*n)),
        defender_lost: resolution.defender.total_lost(),
        plunder_total,
        created_at: now,
    }
}

/// Build the conquest audit row, when the command carried envoys.
pub fn build_attempt(command: &Command, resolution: &BattleResolution) -> Option<ConquestAttempt> {
    let conquest = resolution.conquest.as_ref()?;
    Some(ConquestAttempt {
        command_id: command.id,
        world_id: command.world_id,
        attacker_id: command.attacker_id,
        defender_id: command.defender_id,
        village_id: command.target_village_id,
        surviving_envoys: resolution
            .attacker
            .surviving
            .iter()
            .filter(|(k, _)| k.is_envoy())
            .fold(0_u32, |acc, (_, n)| acc.saturating_add(*n)),
        meter_before: conquest.meter_before,
        meter_after: conquest.meter_after,
        drop_amount: conquest.drop_amount,
        captured: conquest.captured,
        reason_code: conquest.reason,
        wall_level: resolution.wall_after,
        modifiers: resolution.modifiers.clone(),
        resolution_order: command.sequence,
        occurred_at: command.arrival_at,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use warhold_types::{
        CommandId, CommandStatus, CommandType, PlayerId, UnitKind, VillageId, WorldId,
    };

    use super::*;
    use crate::battle::resolve;
    use crate::config::{CombatConfig, WorldConfig};
    use crate::conquest::engine_for;
    use warhold_types::VillageState;

    fn fixture() -> (Command, BattleResolution) {
        let cfg = WorldConfig {
            combat: CombatConfig {
                luck_enabled: false,
                ..CombatConfig::default()
            },
            ..WorldConfig::default()
        };
        let arrival = Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap();
        let command = Command {
            id: CommandId::new(),
            world_id: WorldId::new(),
            attacker_id: PlayerId::new(),
            defender_id: PlayerId::new(),
            source_village_id: VillageId::new(),
            target_village_id: VillageId::new(),
            command_type: CommandType::Attack,
            units: [(UnitKind::AxeFighter, 2_000), (UnitKind::Envoy, 2)]
                .into_iter()
                .collect(),
            sent_at: arrival,
            arrival_at: arrival,
            sequence: 17,
            target_building: None,
            status: CommandStatus::InProgress,
            is_fake: false,
            correlation_id: None,
        };
        let village = VillageState {
            id: command.target_village_id,
            world_id: command.world_id,
            owner_id: command.defender_id,
            points: 1_000,
            garrison: [(UnitKind::Spearman, 40)].into_iter().collect(),
            wall_level: 2,
            building_levels: BTreeMap::new(),
            resources: BTreeMap::new(),
            meter: Decimal::ONE_HUNDRED,
            meter_updated_at: arrival,
            uptime_started_at: None,
            capture_cooldown_until: None,
            anti_snipe_until: None,
            allegiance_floor: Decimal::new(25, 0),
            is_capital: false,
            conquered_at: None,
            version: 0,
        };
        let engine = engine_for(&cfg.conquest);
        let resolution = resolve(&command, 1_000, &village, &cfg, engine.as_ref(), 3).unwrap();
        (command, resolution)
    }

    #[test]
    fn both_perspectives_share_the_battle_id() {
        let (command, resolution) = fixture();
        let [attacker, defender] = build_reports(&command, &resolution, Utc::now());
        assert_eq!(attacker.battle_id, defender.battle_id);
        assert_ne!(attacker.id, defender.id);
        assert_eq!(attacker.perspective, Perspective::Attacker);
        assert_eq!(defender.perspective, Perspective::Defender);
        assert_eq!(attacker.recipient_id, command.attacker_id);
        assert_eq!(defender.recipient_id, command.defender_id);
    }

    #[test]
    fn winning_attacker_sees_the_full_garrison() {
        let (command, resolution) = fixture();
        let [attacker, defender] = build_reports(&command, &resolution, Utc::now());
        // The fixture attack wins decisively.
        assert_eq!(attacker.defender_intel, IntelLevel::Full);
        assert_eq!(attacker.defender, Some(resolution.defender.clone()));
        assert_eq!(defender.defender, Some(resolution.defender));
    }

    #[test]
    fn losses_only_redaction_strips_the_composition() {
        let (_, resolution) = fixture();
        let redacted = redact_defender(&resolution.defender, IntelLevel::LossesOnly).unwrap();
        assert!(redacted.sent.is_empty());
        assert!(redacted.surviving.is_empty());
        assert_eq!(redacted.lost, resolution.defender.lost);
        assert!(redact_defender(&resolution.defender, IntelLevel::Hidden).is_none());
    }

    #[test]
    fn feint_flag_reaches_both_perspectives() {
        let (mut command, resolution) = fixture();
        command.is_fake = true;
        let [attacker, defender] = build_reports(&command, &resolution, Utc::now());
        assert!(attacker.is_fake);
        assert!(defender.is_fake);
    }

    #[test]
    fn metrics_totals_match_the_breakdowns() {
        let (command, resolution) = fixture();
        let metrics = build_metrics(&command, &resolution, Utc::now());
        assert_eq!(metrics.command_id, command.id);
        assert_eq!(metrics.attacker_sent, 2_002);
        assert_eq!(metrics.defender_sent, 40);
        assert_eq!(metrics.attacker_lost, resolution.attacker.total_lost());
        assert_eq!(metrics.defender_lost, resolution.defender.total_lost());
    }

    #[test]
    fn attempt_row_carries_the_resolution_order() {
        let (command, resolution) = fixture();
        let attempt = build_attempt(&command, &resolution).unwrap();
        assert_eq!(attempt.resolution_order, 17);
        assert_eq!(attempt.village_id, command.target_village_id);
        assert_eq!(attempt.occurred_at, command.arrival_at);
        let conquest = resolution.conquest.unwrap();
        assert_eq!(attempt.meter_before, conquest.meter_before);
        assert_eq!(attempt.captured, conquest.captured);
    }

    #[test]
    fn no_envoys_means_no_attempt_row() {
        let (mut command, mut resolution) = fixture();
        command.units.remove(&UnitKind::Envoy);
        resolution.conquest = None;
        assert!(build_attempt(&command, &resolution).is_none());
    }
}
