//! Static unit stat tables.
//!
//! Stats are world-independent constants; worlds tune battles through
//! modifiers, not by editing unit stats. Scouts carry no line-combat value:
//! they fight only in scout-vs-scout resolution, with the dedicated
//! constants below.

use warhold_types::{UnitCategory, UnitKind};

/// Combat statistics for one unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Offensive power per unit.
    pub attack: u32,
    /// Defense against incoming infantry.
    pub defense_infantry: u32,
    /// Defense against incoming cavalry.
    pub defense_cavalry: u32,
    /// Defense against incoming archers.
    pub defense_archer: u32,
    /// Plunder carry capacity per unit.
    pub carry: u32,
}

impl UnitStats {
    /// Defense value against one incoming attack category.
    pub const fn defense_vs(&self, category: UnitCategory) -> u32 {
        match category {
            UnitCategory::Infantry => self.defense_infantry,
            UnitCategory::Cavalry => self.defense_cavalry,
            UnitCategory::Archer => self.defense_archer,
        }
    }
}

/// Attack power of one scout in scout-vs-scout resolution.
pub const SCOUT_ATTACK: u32 = 20;

/// Defense power of one scout in scout-vs-scout resolution.
pub const SCOUT_DEFENSE: u32 = 15;

/// Stat table lookup.
pub const fn stats(kind: UnitKind) -> UnitStats {
    match kind {
        UnitKind::Spearman => UnitStats {
            attack: 10,
            defense_infantry: 15,
            defense_cavalry: 45,
            defense_archer: 20,
            carry: 25,
        },
        UnitKind::Swordsman => UnitStats {
            attack: 25,
            defense_infantry: 50,
            defense_cavalry: 15,
            defense_archer: 40,
            carry: 15,
        },
        UnitKind::AxeFighter => UnitStats {
            attack: 40,
            defense_infantry: 10,
            defense_cavalry: 5,
            defense_archer: 10,
            carry: 10,
        },
        UnitKind::Archer => UnitStats {
            attack: 15,
            defense_infantry: 50,
            defense_cavalry: 40,
            defense_archer: 5,
            carry: 10,
        },
        // Scouts do not participate in line combat.
        UnitKind::Scout => UnitStats {
            attack: 0,
            defense_infantry: 2,
            defense_cavalry: 1,
            defense_archer: 2,
            carry: 0,
        },
        UnitKind::LightCavalry => UnitStats {
            attack: 130,
            defense_infantry: 30,
            defense_cavalry: 40,
            defense_archer: 30,
            carry: 80,
        },
        UnitKind::HeavyCavalry => UnitStats {
            attack: 150,
            defense_infantry: 200,
            defense_cavalry: 80,
            defense_archer: 180,
            carry: 50,
        },
        UnitKind::Ram => UnitStats {
            attack: 2,
            defense_infantry: 20,
            defense_cavalry: 50,
            defense_archer: 20,
            carry: 0,
        },
        UnitKind::Catapult => UnitStats {
            attack: 100,
            defense_infantry: 100,
            defense_cavalry: 50,
            defense_archer: 100,
            carry: 0,
        },
        UnitKind::Envoy => UnitStats {
            attack: 30,
            defense_infantry: 100,
            defense_cavalry: 50,
            defense_archer: 100,
            carry: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_stats() {
        for kind in UnitKind::ALL {
            let s = stats(kind);
            // Siege and envoys never carry plunder.
            if kind.is_siege() || kind.is_envoy() {
                assert_eq!(s.carry, 0, "{kind:?} should not carry plunder");
            }
        }
    }

    #[test]
    fn scouts_have_no_line_attack() {
        assert_eq!(stats(UnitKind::Scout).attack, 0);
        assert!(SCOUT_ATTACK > 0);
        assert!(SCOUT_DEFENSE > 0);
    }

    #[test]
    fn spearmen_counter_cavalry() {
        let s = stats(UnitKind::Spearman);
        assert!(s.defense_vs(UnitCategory::Cavalry) > s.defense_vs(UnitCategory::Infantry));
    }
}
