//! Weapon data: kinds, per-slot swing/combo counters, loadout.

use bevy::prelude::*;

use crate::config::{WeaponSpec, WeaponTable};

/// Equippable weapon kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum WeaponKind {
    Sword,
    GreatSword,
    Fists,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [WeaponKind::Sword, WeaponKind::GreatSword, WeaponKind::Fists];

    /// Clip name prefix used by presentation commands.
    pub fn clip_prefix(self) -> &'static str {
        match self {
            WeaponKind::Sword => "sword",
            WeaponKind::GreatSword => "great_sword",
            WeaponKind::Fists => "fists",
        }
    }
}

/// One carried weapon: static spec plus runtime swing/combo bookkeeping.
///
/// Counters obey: `hits_left <= spec.max_hits` (floor 0); `combo_count`
/// resets whenever the struck target changes.
#[derive(Debug, Clone, Reflect)]
pub struct WeaponSlot {
    pub spec: WeaponSpec,
    /// Damage applications remaining in the current swing
    pub hits_left: u32,
    /// Consecutive strikes on `last_target` across swings
    pub combo_count: u32,
    /// Identity of the last-struck actor
    pub last_target: Option<Entity>,
    /// Time since last swing, capped at `spec.swing_cooldown`
    pub cooldown_elapsed: f32,
}

impl WeaponSlot {
    pub fn new(spec: WeaponSpec) -> Self {
        let cooldown = spec.swing_cooldown;
        Self {
            hits_left: spec.max_hits,
            combo_count: 0,
            last_target: None,
            // Ready to swing immediately after equip
            cooldown_elapsed: cooldown,
            spec,
        }
    }

    pub fn cooldown_ready(&self) -> bool {
        self.cooldown_elapsed >= self.spec.swing_cooldown
    }

    pub fn tick_cooldown(&mut self, delta: f32) {
        if self.cooldown_elapsed < self.spec.swing_cooldown {
            self.cooldown_elapsed = (self.cooldown_elapsed + delta).min(self.spec.swing_cooldown);
        }
    }

    /// Refill the swing hit budget (swing start, reflect recovery).
    pub fn reset_swing_budget(&mut self) {
        self.hits_left = self.spec.max_hits;
    }

    /// Spend one hit from the swing budget. Returns false when exhausted.
    pub fn consume_hit(&mut self) -> bool {
        if self.hits_left == 0 {
            return false;
        }
        self.hits_left -= 1;
        true
    }

    /// Record a strike on `target` and report whether the same-target combo
    /// reached the forced-ragdoll threshold (which also resets the counter).
    pub fn register_strike(&mut self, target: Entity) -> bool {
        if self.last_target == Some(target) {
            self.combo_count += 1;
        } else {
            self.last_target = Some(target);
            self.combo_count = 1;
        }
        if self.combo_count >= self.spec.combo_threshold {
            self.combo_count = 0;
            true
        } else {
            false
        }
    }
}

/// The actor's carried weapons, active selection, and light-attack stage.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Loadout {
    active: WeaponKind,
    /// Current light-attack combo stage (0 = not in a combo)
    stage: u32,
    sword: WeaponSlot,
    great_sword: WeaponSlot,
    fists: WeaponSlot,
}

impl Default for Loadout {
    fn default() -> Self {
        Self::from_table(&WeaponTable::default())
    }
}

impl Loadout {
    pub fn from_table(table: &WeaponTable) -> Self {
        Self {
            active: WeaponKind::Fists,
            stage: 0,
            sword: WeaponSlot::new(table.sword.clone()),
            great_sword: WeaponSlot::new(table.great_sword.clone()),
            fists: WeaponSlot::new(table.fists.clone()),
        }
    }

    pub fn active_kind(&self) -> WeaponKind {
        self.active
    }

    pub fn slot(&self, kind: WeaponKind) -> &WeaponSlot {
        match kind {
            WeaponKind::Sword => &self.sword,
            WeaponKind::GreatSword => &self.great_sword,
            WeaponKind::Fists => &self.fists,
        }
    }

    pub fn slot_mut(&mut self, kind: WeaponKind) -> &mut WeaponSlot {
        match kind {
            WeaponKind::Sword => &mut self.sword,
            WeaponKind::GreatSword => &mut self.great_sword,
            WeaponKind::Fists => &mut self.fists,
        }
    }

    pub fn active_slot(&self) -> &WeaponSlot {
        self.slot(self.active)
    }

    pub fn active_slot_mut(&mut self) -> &mut WeaponSlot {
        self.slot_mut(self.active)
    }

    pub fn set_active(&mut self, kind: WeaponKind) {
        self.active = kind;
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn max_stages(&self) -> u32 {
        self.active_slot().spec.max_stages()
    }

    pub fn advance_stage(&mut self) -> u32 {
        self.stage += 1;
        self.stage
    }

    /// Force the combo stage back to 0 (attack resolution, reflect recovery).
    pub fn reset_stage(&mut self) {
        self.stage = 0;
    }

    /// Starting any swing zeroes every weapon's cooldown accumulator.
    pub fn zero_all_cooldowns(&mut self) {
        for kind in WeaponKind::ALL {
            self.slot_mut(kind).cooldown_elapsed = 0.0;
        }
    }

    pub fn tick_cooldowns(&mut self, delta: f32) {
        for kind in WeaponKind::ALL {
            self.slot_mut(kind).tick_cooldown(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeaponSpec;

    #[test]
    fn test_swing_budget_floor() {
        let mut slot = WeaponSlot::new(WeaponSpec::sword());
        assert_eq!(slot.hits_left, 2);
        assert!(slot.consume_hit());
        assert!(slot.consume_hit());
        assert!(!slot.consume_hit());
        assert_eq!(slot.hits_left, 0);

        slot.reset_swing_budget();
        assert_eq!(slot.hits_left, 2);
    }

    #[test]
    fn test_combo_resets_on_target_change() {
        let mut slot = WeaponSlot::new(WeaponSpec::sword()); // threshold 3
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);

        assert!(!slot.register_strike(a));
        assert_eq!(slot.combo_count, 1);
        assert!(!slot.register_strike(a));
        assert_eq!(slot.combo_count, 2);

        // Switching targets resets to 1 regardless of prior count
        assert!(!slot.register_strike(b));
        assert_eq!(slot.combo_count, 1);
        assert_eq!(slot.last_target, Some(b));
    }

    #[test]
    fn test_combo_threshold_forces_ragdoll_and_resets() {
        let mut slot = WeaponSlot::new(WeaponSpec::sword()); // threshold 3
        let a = Entity::from_raw(1);

        assert!(!slot.register_strike(a));
        assert!(!slot.register_strike(a));
        assert!(slot.register_strike(a)); // 3rd hit forces ragdoll
        assert_eq!(slot.combo_count, 0);

        // Counter restarts from 1 on the next strike
        assert!(!slot.register_strike(a));
        assert_eq!(slot.combo_count, 1);
    }

    #[test]
    fn test_cooldown_cap_and_zeroing() {
        let mut loadout = Loadout::default();
        loadout.set_active(WeaponKind::Sword);
        assert!(loadout.active_slot().cooldown_ready());

        loadout.zero_all_cooldowns();
        for kind in WeaponKind::ALL {
            assert!(!loadout.slot(kind).cooldown_ready());
        }

        loadout.tick_cooldowns(10.0);
        for kind in WeaponKind::ALL {
            let slot = loadout.slot(kind);
            assert_eq!(slot.cooldown_elapsed, slot.spec.swing_cooldown);
        }
    }
}
