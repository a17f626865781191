//! Enumeration types for the Warhold engine.
//!
//! Every closed vocabulary used across the workspace lives here: unit kinds,
//! command lifecycle states, battle outcomes, conquest modes, and the reason
//! codes recorded in the conquest audit log. Keeping these as enums (rather
//! than the loosely-typed strings and JSON blobs of a typical game backend)
//! gives compile-time guarantees on every match site.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// A recruitable unit kind.
///
/// The set is closed: unit compositions are maps from `UnitKind` to counts,
/// never free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Cheap defensive infantry, strong against cavalry.
    Spearman,
    /// Balanced defensive infantry.
    Swordsman,
    /// Offensive infantry.
    AxeFighter,
    /// Ranged defender, strong against infantry.
    Archer,
    /// Reconnaissance unit; fights only other scouts.
    Scout,
    /// Fast raiding cavalry with high carry capacity.
    LightCavalry,
    /// Heavy shock cavalry.
    HeavyCavalry,
    /// Siege unit that damages walls.
    Ram,
    /// Siege unit that damages a targeted building.
    Catapult,
    /// Conquest-capable unit; surviving envoys drive allegiance drops.
    Envoy,
}

impl UnitKind {
    /// All unit kinds, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Spearman,
        Self::Swordsman,
        Self::AxeFighter,
        Self::Archer,
        Self::Scout,
        Self::LightCavalry,
        Self::HeavyCavalry,
        Self::Ram,
        Self::Catapult,
        Self::Envoy,
    ];

    /// The attack category this unit contributes to, used to weight the
    /// defender's per-category defense values.
    pub const fn category(self) -> UnitCategory {
        match self {
            Self::Spearman | Self::Swordsman | Self::AxeFighter | Self::Ram | Self::Catapult => {
                UnitCategory::Infantry
            }
            Self::Archer | Self::Scout => UnitCategory::Archer,
            Self::LightCavalry | Self::HeavyCavalry | Self::Envoy => UnitCategory::Cavalry,
        }
    }

    /// Whether this unit can trigger a conquest attempt.
    pub const fn is_envoy(self) -> bool {
        matches!(self, Self::Envoy)
    }

    /// Whether this unit deals siege damage.
    pub const fn is_siege(self) -> bool {
        matches!(self, Self::Ram | Self::Catapult)
    }
}

/// The broad attack category of a unit, used for defense weighting.
///
/// Defenders have distinct defense values against each incoming category;
/// the effective defense of a garrison is the weighted mix of those values
/// by the attacker's power share per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    /// Foot soldiers and siege crews.
    Infantry,
    /// Mounted units.
    Cavalry,
    /// Ranged units.
    Archer,
}

impl UnitCategory {
    /// All categories, in declaration order.
    pub const ALL: [Self; 3] = [Self::Infantry, Self::Cavalry, Self::Archer];
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// The kind of military operation a command represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CommandType {
    /// Offensive strike against the target village.
    Attack,
    /// Reinforcement that joins the target garrison on arrival.
    Support,
    /// Reconnaissance; resolves scout-vs-scout only.
    Scout,
}

/// Lifecycle state of a command.
///
/// Transitions: `Pending -> InProgress -> Resolved | Failed`, or
/// `Pending -> Canceled` before arrival. Commands are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CommandStatus {
    /// Awaiting arrival; eligible for cancellation.
    Pending,
    /// Claimed by a resolver worker; cancel requests are rejected.
    InProgress,
    /// Resolution committed; terminal.
    Resolved,
    /// Canceled by the issuer before arrival; terminal.
    Canceled,
    /// Terminal resolution error; flagged for operator review, never retried.
    Failed,
}

// ---------------------------------------------------------------------------
// Battle
// ---------------------------------------------------------------------------

/// The overall outcome of a resolved battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// Effective attack power exceeded effective defense.
    AttackerWin,
    /// Effective defense power exceeded effective attack.
    DefenderWin,
    /// Powers were exactly equal.
    Draw,
}

/// Which participant a battle report row is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Perspective {
    /// The report delivered to the command issuer.
    Attacker,
    /// The report delivered to the village owner.
    Defender,
}

/// How much of the defender's composition the attacker's report reveals.
///
/// The defender's own report always carries full detail; this level redacts
/// only the attacker-perspective row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntelLevel {
    /// Defender composition fully hidden.
    Hidden,
    /// Only defender losses are shown.
    LossesOnly,
    /// Full defender composition shown.
    Full,
}

// ---------------------------------------------------------------------------
// Conquest
// ---------------------------------------------------------------------------

/// Which conquest-state strategy a world runs.
///
/// Selected once per world by configuration; the battle resolver only ever
/// talks to the shared engine interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum ConquestMode {
    /// Percentage meter dropped by surviving envoys; capture at zero.
    #[default]
    Allegiance,
    /// Uptime meter raised by envoy presence; capture after a sustained
    /// period above a threshold.
    Control,
}

/// Why a conquest attempt did or did not capture the village.
///
/// Recorded on every audit row, successful or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    /// The attempt captured the village.
    Captured,
    /// No conquest-capable units survived the battle.
    NoSurvivingEnvoys,
    /// The village is inside its capture cooldown window.
    CooldownActive,
    /// The computed drop left the meter above the capture point.
    InsufficientDrop,
    /// The anti-snipe floor stopped the meter above the capture point.
    AntiSnipeFloor,
    /// The defender is below the minimum points threshold for conquest.
    DefenderPointsBelowThreshold,
    /// The village is a capital and cannot be captured.
    CapitalImmune,
    /// Control mode: the meter is above threshold but the uptime window has
    /// not yet elapsed.
    UptimeIncomplete,
}

// ---------------------------------------------------------------------------
// Economy / buildings
// ---------------------------------------------------------------------------

/// A plunderable resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Timber.
    Wood,
    /// Clay.
    Clay,
    /// Iron.
    Iron,
}

impl ResourceKind {
    /// All resource kinds, in declaration order.
    pub const ALL: [Self; 3] = [Self::Wood, Self::Clay, Self::Iron];
}

/// A building that can be targeted by catapults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Village headquarters.
    Headquarters,
    /// Troop production.
    Barracks,
    /// Resource storage; its level feeds vault protection.
    Warehouse,
    /// Population cap.
    Farm,
    /// Defensive wall; tracked separately as `wall_level` but targetable.
    Wall,
}
