//! Resolution ordering and command lifecycle rules.
//!
//! Commands resolve in `(arrival_at, sequence)` order; the sequence is a
//! per-world monotonic counter assigned at submission, so two commands
//! landing on the same timestamp still resolve in a fixed, reproducible
//! order on every run.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use warhold_types::{Command, CommandStatus};

/// Total order in which due commands must resolve.
///
/// Arrival time first, then the per-world sequence; the command id breaks
/// the (never expected) tie of two commands sharing a sequence number.
pub fn resolution_order(a: &Command, b: &Command) -> Ordering {
    a.resolution_key()
        .cmp(&b.resolution_key())
        .then_with(|| a.id.cmp(&b.id))
}

/// Whether a command may still be canceled at `now`.
///
/// Only pending commands can be canceled, and only strictly before arrival;
/// once a command is due it belongs to the resolver.
pub fn can_cancel(command: &Command, now: DateTime<Utc>) -> bool {
    command.status == CommandStatus::Pending && now < command.arrival_at
}

/// Whether a status admits no further transitions.
pub const fn is_terminal(status: CommandStatus) -> bool {
    matches!(
        status,
        CommandStatus::Resolved | CommandStatus::Canceled | CommandStatus::Failed
    )
}

/// The command lifecycle state machine.
///
/// `InProgress -> Pending` is the reclaim path for commands whose worker
/// died mid-resolution.
pub const fn valid_transition(from: CommandStatus, to: CommandStatus) -> bool {
    matches!(
        (from, to),
        (CommandStatus::Pending, CommandStatus::InProgress)
            | (CommandStatus::Pending, CommandStatus::Canceled)
            | (CommandStatus::InProgress, CommandStatus::Resolved)
            | (CommandStatus::InProgress, CommandStatus::Failed)
            | (CommandStatus::InProgress, CommandStatus::Pending)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::Duration;

    use warhold_types::{CommandId, CommandType, PlayerId, UnitCount, VillageId, WorldId};

    use super::*;

    fn command(arrival_at: DateTime<Utc>, sequence: u64) -> Command {
        Command {
            id: CommandId::new(),
            world_id: WorldId::new(),
            attacker_id: PlayerId::new(),
            defender_id: PlayerId::new(),
            source_village_id: VillageId::new(),
            target_village_id: VillageId::new(),
            command_type: CommandType::Attack,
            units: UnitCount::new(),
            sent_at: arrival_at - Duration::hours(1),
            arrival_at,
            sequence,
            target_building: None,
            status: CommandStatus::Pending,
            is_fake: false,
            correlation_id: None,
        }
    }

    #[test]
    fn earlier_arrival_resolves_first() {
        let now = Utc::now();
        let early = command(now, 5);
        let late = command(now + Duration::seconds(1), 1);
        assert_eq!(resolution_order(&early, &late), Ordering::Less);
    }

    #[test]
    fn sequence_breaks_arrival_ties() {
        let now = Utc::now();
        let first = command(now, 10);
        let second = command(now, 11);
        assert_eq!(resolution_order(&first, &second), Ordering::Less);
        assert_eq!(resolution_order(&second, &first), Ordering::Greater);
    }

    #[test]
    fn sorting_a_batch_is_deterministic() {
        let now = Utc::now();
        let mut batch = vec![
            command(now + Duration::seconds(2), 7),
            command(now, 9),
            command(now, 8),
            command(now + Duration::seconds(1), 1),
        ];
        batch.sort_by(resolution_order);
        let keys: Vec<u64> = batch.iter().map(|c| c.sequence).collect();
        assert_eq!(keys, vec![8, 9, 1, 7]);
    }

    #[test]
    fn cancel_window_closes_at_arrival() {
        let now = Utc::now();
        let cmd = command(now + Duration::minutes(10), 1);
        assert!(can_cancel(&cmd, now));
        assert!(!can_cancel(&cmd, cmd.arrival_at));
        assert!(!can_cancel(&cmd, cmd.arrival_at + Duration::seconds(1)));
    }

    #[test]
    fn only_pending_commands_cancel() {
        let now = Utc::now();
        let mut cmd = command(now + Duration::minutes(10), 1);
        cmd.status = CommandStatus::InProgress;
        assert!(!can_cancel(&cmd, now));
    }

    #[test]
    fn lifecycle_transitions() {
        use CommandStatus::{Canceled, Failed, InProgress, Pending, Resolved};
        assert!(valid_transition(Pending, InProgress));
        assert!(valid_transition(Pending, Canceled));
        assert!(valid_transition(InProgress, Resolved));
        assert!(valid_transition(InProgress, Failed));
        // Reclaim path.
        assert!(valid_transition(InProgress, Pending));
        // Terminal states stay terminal.
        assert!(!valid_transition(Resolved, Pending));
        assert!(!valid_transition(Canceled, InProgress));
        assert!(!valid_transition(Failed, Pending));
        assert!(is_terminal(Resolved));
        assert!(is_terminal(Canceled));
        assert!(is_terminal(Failed));
        assert!(!is_terminal(Pending));
        assert!(!is_terminal(InProgress));
    }
}
