//! Conversions between Rust enums and their `PostgreSQL` representations.
//!
//! Lifecycle vocabularies are stored as `PostgreSQL` enums (snake_case
//! strings on the wire); compositions and modifier sets are stored as JSONB
//! in their serde form. Decoding is strict: an unknown string is a
//! [`DbError::Decode`], never a silent default.

use warhold_types::{
    BattleOutcome, BuildingKind, CommandStatus, CommandType, IntelLevel, Perspective, ReasonCode,
};

use crate::error::DbError;

/// [`CommandType`] to its `command_type` enum string.
pub const fn command_type_to_db(t: CommandType) -> &'static str {
    match t {
        CommandType::Attack => "attack",
        CommandType::Support => "support",
        CommandType::Scout => "scout",
    }
}

/// `command_type` enum string to [`CommandType`].
///
/// # Errors
///
/// Returns [`DbError::Decode`] for an unknown string.
pub fn command_type_from_db(s: &str) -> Result<CommandType, DbError> {
    match s {
        "attack" => Ok(CommandType::Attack),
        "support" => Ok(CommandType::Support),
        "scout" => Ok(CommandType::Scout),
        other => Err(DbError::Decode(format!("unknown command_type: {other}"))),
    }
}

/// [`CommandStatus`] to its `command_status` enum string.
pub const fn command_status_to_db(s: CommandStatus) -> &'static str {
    match s {
        CommandStatus::Pending => "pending",
        CommandStatus::InProgress => "in_progress",
        CommandStatus::Resolved => "resolved",
        CommandStatus::Canceled => "canceled",
        CommandStatus::Failed => "failed",
    }
}

/// `command_status` enum string to [`CommandStatus`].
///
/// # Errors
///
/// Returns [`DbError::Decode`] for an unknown string.
pub fn command_status_from_db(s: &str) -> Result<CommandStatus, DbError> {
    match s {
        "pending" => Ok(CommandStatus::Pending),
        "in_progress" => Ok(CommandStatus::InProgress),
        "resolved" => Ok(CommandStatus::Resolved),
        "canceled" => Ok(CommandStatus::Canceled),
        "failed" => Ok(CommandStatus::Failed),
        other => Err(DbError::Decode(format!("unknown command_status: {other}"))),
    }
}

/// [`Perspective`] to its `battle_perspective` enum string.
pub const fn perspective_to_db(p: Perspective) -> &'static str {
    match p {
        Perspective::Attacker => "attacker",
        Perspective::Defender => "defender",
    }
}

/// `battle_perspective` enum string to [`Perspective`].
///
/// # Errors
///
/// Returns [`DbError::Decode`] for an unknown string.
pub fn perspective_from_db(s: &str) -> Result<Perspective, DbError> {
    match s {
        "attacker" => Ok(Perspective::Attacker),
        "defender" => Ok(Perspective::Defender),
        other => Err(DbError::Decode(format!(
            "unknown battle_perspective: {other}"
        ))),
    }
}

/// [`BattleOutcome`] to its `battle_outcome` enum string.
pub const fn outcome_to_db(o: BattleOutcome) -> &'static str {
    match o {
        BattleOutcome::AttackerWin => "attacker_win",
        BattleOutcome::DefenderWin => "defender_win",
        BattleOutcome::Draw => "draw",
    }
}

/// `battle_outcome` enum string to [`BattleOutcome`].
///
/// # Errors
///
/// Returns [`DbError::Decode`] for an unknown string.
pub fn outcome_from_db(s: &str) -> Result<BattleOutcome, DbError> {
    match s {
        "attacker_win" => Ok(BattleOutcome::AttackerWin),
        "defender_win" => Ok(BattleOutcome::DefenderWin),
        "draw" => Ok(BattleOutcome::Draw),
        other => Err(DbError::Decode(format!("unknown battle_outcome: {other}"))),
    }
}

/// [`IntelLevel`] to its stored string.
pub const fn intel_to_db(i: IntelLevel) -> &'static str {
    match i {
        IntelLevel::Hidden => "hidden",
        IntelLevel::LossesOnly => "losses_only",
        IntelLevel::Full => "full",
    }
}

/// Stored intel string to [`IntelLevel`].
///
/// # Errors
///
/// Returns [`DbError::Decode`] for an unknown string.
pub fn intel_from_db(s: &str) -> Result<IntelLevel, DbError> {
    match s {
        "hidden" => Ok(IntelLevel::Hidden),
        "losses_only" => Ok(IntelLevel::LossesOnly),
        "full" => Ok(IntelLevel::Full),
        other => Err(DbError::Decode(format!("unknown intel level: {other}"))),
    }
}

/// [`ReasonCode`] to its stored string.
pub const fn reason_to_db(r: ReasonCode) -> &'static str {
    match r {
        ReasonCode::Captured => "captured",
        ReasonCode::NoSurvivingEnvoys => "no_surviving_envoys",
        ReasonCode::CooldownActive => "cooldown_active",
        ReasonCode::InsufficientDrop => "insufficient_drop",
        ReasonCode::AntiSnipeFloor => "anti_snipe_floor",
        ReasonCode::DefenderPointsBelowThreshold => "defender_points_below_threshold",
        ReasonCode::CapitalImmune => "capital_immune",
        ReasonCode::UptimeIncomplete => "uptime_incomplete",
    }
}

/// Stored reason string to [`ReasonCode`].
///
/// # Errors
///
/// Returns [`DbError::Decode`] for an unknown string.
pub fn reason_from_db(s: &str) -> Result<ReasonCode, DbError> {
    match s {
        "captured" => Ok(ReasonCode::Captured),
        "no_surviving_envoys" => Ok(ReasonCode::NoSurvivingEnvoys),
        "cooldown_active" => Ok(ReasonCode::CooldownActive),
        "insufficient_drop" => Ok(ReasonCode::InsufficientDrop),
        "anti_snipe_floor" => Ok(ReasonCode::AntiSnipeFloor),
        "defender_points_below_threshold" => Ok(ReasonCode::DefenderPointsBelowThreshold),
        "capital_immune" => Ok(ReasonCode::CapitalImmune),
        "uptime_incomplete" => Ok(ReasonCode::UptimeIncomplete),
        other => Err(DbError::Decode(format!("unknown reason_code: {other}"))),
    }
}

/// [`BuildingKind`] to its stored string.
pub const fn building_to_db(b: BuildingKind) -> &'static str {
    match b {
        BuildingKind::Headquarters => "headquarters",
        BuildingKind::Barracks => "barracks",
        BuildingKind::Warehouse => "warehouse",
        BuildingKind::Farm => "farm",
        BuildingKind::Wall => "wall",
    }
}

/// Stored building string to [`BuildingKind`].
///
/// # Errors
///
/// Returns [`DbError::Decode`] for an unknown string.
pub fn building_from_db(s: &str) -> Result<BuildingKind, DbError> {
    match s {
        "headquarters" => Ok(BuildingKind::Headquarters),
        "barracks" => Ok(BuildingKind::Barracks),
        "warehouse" => Ok(BuildingKind::Warehouse),
        "farm" => Ok(BuildingKind::Farm),
        "wall" => Ok(BuildingKind::Wall),
        other => Err(DbError::Decode(format!("unknown building: {other}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn command_status_roundtrips() {
        for status in [
            CommandStatus::Pending,
            CommandStatus::InProgress,
            CommandStatus::Resolved,
            CommandStatus::Canceled,
            CommandStatus::Failed,
        ] {
            let s = command_status_to_db(status);
            assert_eq!(command_status_from_db(s).unwrap(), status);
        }
    }

    #[test]
    fn reason_codes_roundtrip() {
        for reason in [
            ReasonCode::Captured,
            ReasonCode::NoSurvivingEnvoys,
            ReasonCode::CooldownActive,
            ReasonCode::InsufficientDrop,
            ReasonCode::AntiSnipeFloor,
            ReasonCode::DefenderPointsBelowThreshold,
            ReasonCode::CapitalImmune,
            ReasonCode::UptimeIncomplete,
        ] {
            let s = reason_to_db(reason);
            assert_eq!(reason_from_db(s).unwrap(), reason);
        }
    }

    #[test]
    fn unknown_strings_are_decode_errors() {
        assert!(matches!(
            command_type_from_db("march"),
            Err(DbError::Decode(_))
        ));
        assert!(matches!(intel_from_db("partial"), Err(DbError::Decode(_))));
    }
}
