//! Pure rate-limit verdicts.
//!
//! The storage layer counts a player's commands inside the sliding windows;
//! this module turns those counts into a verdict against the world's caps.
//! Each command type has its own per-player cap, and a tighter cap applies
//! per (player, target village) pair to stop single-target spam.

use warhold_types::CommandType;

use crate::config::RateLimitConfig;

/// Why a submission was allowed or refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Under every cap; record and proceed.
    Allowed,
    /// The per-player cap for this command type is exhausted.
    PlayerCapExceeded {
        /// The cap that was hit.
        cap: u32,
    },
    /// The per-target cap for this (player, village) pair is exhausted.
    TargetCapExceeded {
        /// The cap that was hit.
        cap: u32,
    },
}

impl RateLimitDecision {
    /// Whether the submission may proceed.
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// The per-player cap for one command type.
pub const fn player_cap(command_type: CommandType, cfg: &RateLimitConfig) -> u32 {
    match command_type {
        CommandType::Attack => cfg.attack_cap,
        CommandType::Support => cfg.support_cap,
        CommandType::Scout => cfg.scout_cap,
    }
}

/// Judge one submission given the current window counts.
///
/// `player_count` is the player's commands of this type inside the player
/// window; `target_count` is their commands of any type against this target
/// inside the per-target window. Counts are taken before the new command.
pub const fn evaluate(
    command_type: CommandType,
    player_count: u32,
    target_count: u32,
    cfg: &RateLimitConfig,
) -> RateLimitDecision {
    let cap = player_cap(command_type, cfg);
    if player_count >= cap {
        return RateLimitDecision::PlayerCapExceeded { cap };
    }
    if target_count >= cfg.per_target_cap {
        return RateLimitDecision::TargetCapExceeded {
            cap: cfg.per_target_cap,
        };
    }
    RateLimitDecision::Allowed
}
