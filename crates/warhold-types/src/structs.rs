//! Core entity structs for the Warhold engine.
//!
//! Covers the command record, the conquest-relevant village state, the
//! battle modifier set, and the three audit artifacts a resolution produces
//! (report, metrics, conquest attempt). All of these serialize with `serde`;
//! the data layer stores composition maps and modifiers as JSONB but Rust
//! code only ever sees the typed forms.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{
    BattleOutcome, BuildingKind, CommandStatus, CommandType, IntelLevel, Perspective, ReasonCode,
    ResourceKind, UnitKind,
};
use crate::ids::{BattleId, CommandId, PlayerId, ReportId, VillageId, WorldId};

/// A unit composition: unit kind to count.
pub type UnitCount = BTreeMap<UnitKind, u32>;

/// A per-resource amount map.
pub type ResourceAmount = BTreeMap<ResourceKind, u32>;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A dispatched military or scouting operation.
///
/// Created atomically with the rate-limit check at submission time. The only
/// field ever mutated afterwards is `status`; resolved and canceled commands
/// are kept for audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Unique command identifier.
    pub id: CommandId,
    /// The world this command belongs to.
    pub world_id: WorldId,
    /// The issuing player.
    pub attacker_id: PlayerId,
    /// The owner of the target village at dispatch time.
    pub defender_id: PlayerId,
    /// Village the troops marched from.
    pub source_village_id: VillageId,
    /// Village the troops march to.
    pub target_village_id: VillageId,
    /// Attack, support, or scout.
    pub command_type: CommandType,
    /// Units marching with this command.
    pub units: UnitCount,
    /// Dispatch timestamp.
    pub sent_at: DateTime<Utc>,
    /// Arrival timestamp; always after `sent_at`.
    pub arrival_at: DateTime<Utc>,
    /// Per-world monotonic tie-breaker for identical arrival timestamps.
    ///
    /// Together with `arrival_at` this forms the authoritative resolution
    /// order, reproduced identically on every run over the same data.
    pub sequence: u64,
    /// Building targeted by catapults, if any.
    pub target_building: Option<BuildingKind>,
    /// Current lifecycle state.
    pub status: CommandStatus,
    /// Marks a feint sent to mask real attacks.
    pub is_fake: bool,
    /// Correlates a wave of related commands for tracing.
    pub correlation_id: Option<Uuid>,
}

impl Command {
    /// The authoritative resolution order key: arrival time, then the
    /// per-world sequence number.
    pub const fn resolution_key(&self) -> (DateTime<Utc>, u64) {
        (self.arrival_at, self.sequence)
    }

    /// Total number of units marching with this command.
    pub fn total_units(&self) -> u32 {
        self.units
            .values()
            .fold(0_u32, |acc, n| acc.saturating_add(*n))
    }

    /// Number of conquest-capable units marching with this command.
    pub fn envoy_count(&self) -> u32 {
        self.units
            .iter()
            .filter(|(k, _)| k.is_envoy())
            .fold(0_u32, |acc, (_, n)| acc.saturating_add(*n))
    }
}

// ---------------------------------------------------------------------------
// Village
// ---------------------------------------------------------------------------

/// The conquest-relevant subset of a village.
///
/// `meter` holds the allegiance percentage in allegiance mode and the
/// attacker control value in control mode; the interpretation is fixed per
/// world, never per village. The `version` counter increments on every
/// mutation and backs the optimistic write-back check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillageState {
    /// Village identifier.
    pub id: VillageId,
    /// World the village belongs to.
    pub world_id: WorldId,
    /// Current owner.
    pub owner_id: PlayerId,
    /// Defender points, consulted by morale and the conquest threshold.
    pub points: u32,
    /// Stationed troops (own plus support).
    pub garrison: UnitCount,
    /// Wall level; raises defense multiplicatively and blunts envoy drops.
    pub wall_level: u32,
    /// Levels of targetable buildings.
    pub building_levels: BTreeMap<BuildingKind, u32>,
    /// Stored resources available for plunder.
    pub resources: ResourceAmount,
    /// Conquest meter, always within `[0, 100]`.
    pub meter: Decimal,
    /// Last time the meter was regenerated or decayed.
    pub meter_updated_at: DateTime<Utc>,
    /// Control mode only: when continuous above-threshold uptime began.
    pub uptime_started_at: Option<DateTime<Utc>>,
    /// No capture may succeed before this instant.
    pub capture_cooldown_until: Option<DateTime<Utc>>,
    /// While active, the meter cannot be pushed past `allegiance_floor`.
    pub anti_snipe_until: Option<DateTime<Utc>>,
    /// The floor protecting a freshly captured village.
    pub allegiance_floor: Decimal,
    /// Capitals cannot be captured.
    pub is_capital: bool,
    /// When the village last changed hands, if ever.
    pub conquered_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter, incremented on every mutation.
    pub version: i64,
}

impl VillageState {
    /// Whether a capture cooldown is active at `now`.
    pub fn cooldown_active(&self, now: DateTime<Utc>) -> bool {
        self.capture_cooldown_until.is_some_and(|until| now < until)
    }

    /// Whether the anti-snipe grace window is active at `now`.
    pub fn anti_snipe_active(&self, now: DateTime<Utc>) -> bool {
        self.anti_snipe_until.is_some_and(|until| now < until)
    }

    /// Total stationed units.
    pub fn garrison_size(&self) -> u32 {
        self.garrison
            .values()
            .fold(0_u32, |acc, n| acc.saturating_add(*n))
    }
}

// ---------------------------------------------------------------------------
// Battle artifacts
// ---------------------------------------------------------------------------

/// The environmental modifiers applied during one battle resolution.
///
/// All are multiplicative factors around 1; they are persisted verbatim on
/// both report perspectives and the audit row so any battle can be replayed
/// and verified offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleModifiers {
    /// Attacker morale from the points ratio, in `[morale_min, 1]`.
    pub morale: Decimal,
    /// Seeded luck draw applied to attack power, e.g. `-0.25..=0.25`.
    pub luck: Decimal,
    /// Attack multiplier while the world's night window is active.
    pub night_bonus: Decimal,
    /// Attack penalty once the marching army exceeds the density threshold.
    pub overstack_penalty: Decimal,
    /// Defense multiplier contributed by the wall.
    pub wall_multiplier: Decimal,
}

impl BattleModifiers {
    /// Neutral modifiers: every factor is exactly 1.
    pub fn neutral() -> Self {
        Self {
            morale: Decimal::ONE,
            luck: Decimal::ZERO,
            night_bonus: Decimal::ONE,
            overstack_penalty: Decimal::ONE,
            wall_multiplier: Decimal::ONE,
        }
    }
}

/// One side's unit accounting in a battle report.
///
/// Invariant: `surviving = sent - lost` per unit kind, and every count is
/// non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SideBreakdown {
    /// Units present at resolution.
    pub sent: UnitCount,
    /// Units lost.
    pub lost: UnitCount,
    /// Units surviving.
    pub surviving: UnitCount,
}

impl SideBreakdown {
    /// Total units lost across all kinds.
    pub fn total_lost(&self) -> u32 {
        self.lost
            .values()
            .fold(0_u32, |acc, n| acc.saturating_add(*n))
    }

    /// Total units surviving across all kinds.
    pub fn total_surviving(&self) -> u32 {
        self.surviving
            .values()
            .fold(0_u32, |acc, n| acc.saturating_add(*n))
    }
}

/// Immutable record of one resolved command, from one perspective.
///
/// Two rows share a `battle_id`; the attacker row redacts the defender
/// breakdown according to `defender_intel`. Write-once: corrections are new
/// rows referencing the same `battle_id` with a bumped `report_version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Unique report row identifier.
    pub id: ReportId,
    /// Shared identifier of the underlying battle.
    pub battle_id: BattleId,
    /// The command that was resolved.
    pub command_id: CommandId,
    /// Whose view this row is.
    pub perspective: Perspective,
    /// The player this report is delivered to.
    pub recipient_id: PlayerId,
    /// Overall outcome.
    pub outcome: BattleOutcome,
    /// Attacker unit accounting.
    pub attacker: SideBreakdown,
    /// Defender unit accounting; redacted on the attacker perspective when
    /// intel is below [`IntelLevel::Full`].
    pub defender: Option<SideBreakdown>,
    /// Modifiers in force during resolution.
    pub modifiers: BattleModifiers,
    /// Wall level before the battle.
    pub wall_before: u32,
    /// Wall level after ram damage.
    pub wall_after: u32,
    /// Catapult target, if any.
    pub building_target: Option<BuildingKind>,
    /// Target building level before the battle.
    pub building_before: Option<u32>,
    /// Target building level after catapult damage.
    pub building_after: Option<u32>,
    /// Resources plundered, per kind.
    pub plunder: ResourceAmount,
    /// Resources shielded by vault protection, per kind.
    pub vault_protected: ResourceAmount,
    /// Conquest meter before the attempt, when envoys were present.
    pub meter_before: Option<Decimal>,
    /// Conquest meter after the attempt, when envoys were present.
    pub meter_after: Option<Decimal>,
    /// Whether this battle transferred ownership.
    pub village_captured: bool,
    /// Whether the resolved command was flagged as a feint.
    pub is_fake: bool,
    /// How much defender detail the attacker perspective carries.
    pub defender_intel: IntelLevel,
    /// Schema evolution marker.
    pub report_version: i16,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Current battle report schema version.
pub const REPORT_VERSION: i16 = 1;

/// Aggregate metrics for one resolved battle, one row per command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleMetrics {
    /// Shared battle identifier.
    pub battle_id: BattleId,
    /// The command that was resolved.
    pub command_id: CommandId,
    /// The world the battle happened in.
    pub world_id: WorldId,
    /// Effective attack power after all modifiers.
    pub attack_power: Decimal,
    /// Effective defense power after all modifiers.
    pub defense_power: Decimal,
    /// Total attacker units sent.
    pub attacker_sent: u32,
    /// Total attacker units lost.
    pub attacker_lost: u32,
    /// Total defender units present.
    pub defender_sent: u32,
    /// Total defender units lost.
    pub defender_lost: u32,
    /// Total resources plundered.
    pub plunder_total: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One audit row per resolved command that carried conquest-capable units,
/// whether or not capture occurred.
///
/// `resolution_order` equals the command's scheduler sequence so the log can
/// be replayed deterministically against the command history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConquestAttempt {
    /// The command that triggered the attempt.
    pub command_id: CommandId,
    /// The world the attempt happened in.
    pub world_id: WorldId,
    /// The attacking player.
    pub attacker_id: PlayerId,
    /// The defending player at resolution time.
    pub defender_id: PlayerId,
    /// The contested village.
    pub village_id: VillageId,
    /// Envoys that survived the battle.
    pub surviving_envoys: u32,
    /// Meter value before the attempt.
    pub meter_before: Decimal,
    /// Meter value after the attempt.
    pub meter_after: Decimal,
    /// Magnitude of the applied drop (or gain, in control mode).
    pub drop_amount: Decimal,
    /// Whether ownership transferred.
    pub captured: bool,
    /// Why capture did or did not happen.
    pub reason_code: ReasonCode,
    /// Defender wall level at resolution.
    pub wall_level: u32,
    /// Modifiers in force during the resolution.
    pub modifiers: BattleModifiers,
    /// The command's scheduler sequence; the deterministic replay key.
    pub resolution_order: u64,
    /// When the attempt resolved.
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn make_command(units: UnitCount) -> Command {
        Command {
            id: CommandId::new(),
            world_id: WorldId::new(),
            attacker_id: PlayerId::new(),
            defender_id: PlayerId::new(),
            source_village_id: VillageId::new(),
            target_village_id: VillageId::new(),
            command_type: CommandType::Attack,
            units,
            sent_at: Utc::now(),
            arrival_at: Utc::now(),
            sequence: 1,
            target_building: None,
            status: CommandStatus::Pending,
            is_fake: false,
            correlation_id: None,
        }
    }

    #[test]
    fn envoy_count_only_counts_envoys() {
        let mut units = UnitCount::new();
        units.insert(UnitKind::LightCavalry, 100);
        units.insert(UnitKind::Envoy, 3);
        let command = make_command(units);
        assert_eq!(command.envoy_count(), 3);
        assert_eq!(command.total_units(), 103);
    }

    #[test]
    fn cooldown_and_anti_snipe_windows() {
        let now = Utc::now();
        let mut village = VillageState {
            id: VillageId::new(),
            world_id: WorldId::new(),
            owner_id: PlayerId::new(),
            points: 1000,
            garrison: UnitCount::new(),
            wall_level: 0,
            building_levels: BTreeMap::new(),
            resources: ResourceAmount::new(),
            meter: Decimal::new(100, 0),
            meter_updated_at: now,
            uptime_started_at: None,
            capture_cooldown_until: Some(now + chrono::Duration::seconds(60)),
            anti_snipe_until: None,
            allegiance_floor: Decimal::new(25, 0),
            is_capital: false,
            conquered_at: None,
            version: 0,
        };
        assert!(village.cooldown_active(now));
        assert!(!village.anti_snipe_active(now));

        village.capture_cooldown_until = Some(now - chrono::Duration::seconds(1));
        assert!(!village.cooldown_active(now));
    }

    #[test]
    fn neutral_modifiers_are_identity() {
        let m = BattleModifiers::neutral();
        assert_eq!(m.morale, Decimal::ONE);
        assert_eq!(m.luck, Decimal::ZERO);
        assert_eq!(m.wall_multiplier, Decimal::ONE);
    }

    #[test]
    fn report_roundtrip_serde() {
        let report = BattleReport {
            id: ReportId::new(),
            battle_id: BattleId::new(),
            command_id: CommandId::new(),
            perspective: Perspective::Attacker,
            recipient_id: PlayerId::new(),
            outcome: BattleOutcome::AttackerWin,
            attacker: SideBreakdown::default(),
            defender: None,
            modifiers: BattleModifiers::neutral(),
            wall_before: 5,
            wall_after: 3,
            building_target: Some(BuildingKind::Warehouse),
            building_before: Some(10),
            building_after: Some(8),
            plunder: ResourceAmount::new(),
            vault_protected: ResourceAmount::new(),
            meter_before: Some(Decimal::new(100, 0)),
            meter_after: Some(Decimal::new(72, 0)),
            village_captured: false,
            is_fake: true,
            defender_intel: IntelLevel::Hidden,
            report_version: REPORT_VERSION,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: BattleReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
