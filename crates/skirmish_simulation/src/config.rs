//! Simulation tuning tables.
//!
//! Every timed wait in the core (pre-ragdoll delay, bone blend, stand-up,
//! landing, taunt trigger) and every per-weapon number lives here, so hosts
//! can deserialize the whole table from a data file and tweak without
//! recompiling. Defaults match the reference tuning.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::weapon::WeaponKind;

/// Per-weapon-kind tuning.
///
/// One spec per [`WeaponKind`]; runtime counters (hits left, combo count,
/// cooldown accumulator) live in `WeaponSlot`, not here.
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WeaponSpec {
    /// Damage per strike
    pub damage: f32,
    /// Stun applied to struck actors (seconds)
    pub stun_time: f32,
    /// Knockback force magnitude
    pub knockback: f32,
    /// Damage applications allowed within one swing
    pub max_hits: u32,
    /// Consecutive same-target strikes before forced ragdoll
    pub combo_threshold: u32,
    /// Lockout after striking a non-breakable object (seconds)
    pub reflect_time: f32,
    /// Inter-swing cooldown (seconds)
    pub swing_cooldown: f32,
    /// Active duration of each light-attack stage (seconds); length = max stage count
    pub stage_times: Vec<f32>,
    /// Idle taunt duration while this weapon is equipped (seconds)
    pub taunt_time: f32,
}

impl WeaponSpec {
    pub fn sword() -> Self {
        Self {
            damage: 10.0,
            stun_time: 1.5,
            knockback: 12.0,
            max_hits: 2,
            combo_threshold: 3,
            reflect_time: 1.0,
            swing_cooldown: 0.35,
            stage_times: vec![0.4, 0.6],
            taunt_time: 2.0,
        }
    }

    pub fn great_sword() -> Self {
        Self {
            damage: 18.0,
            stun_time: 2.0,
            knockback: 20.0,
            max_hits: 1,
            combo_threshold: 2,
            reflect_time: 1.4,
            swing_cooldown: 0.8,
            stage_times: vec![0.7, 0.9],
            taunt_time: 2.6,
        }
    }

    pub fn fists() -> Self {
        Self {
            damage: 4.0,
            stun_time: 0.8,
            knockback: 6.0,
            max_hits: 1,
            combo_threshold: 4,
            reflect_time: 0.6,
            swing_cooldown: 0.25,
            stage_times: vec![0.25, 0.3],
            taunt_time: 1.8,
        }
    }

    /// Light-attack combo depth for this weapon.
    pub fn max_stages(&self) -> u32 {
        self.stage_times.len() as u32
    }

    /// Active duration for a 1-based stage. Stages past the table clamp to
    /// the last entry.
    pub fn stage_time(&self, stage: u32) -> f32 {
        let index = (stage.max(1) as usize - 1).min(self.stage_times.len().saturating_sub(1));
        self.stage_times.get(index).copied().unwrap_or(1.0)
    }
}

/// The three weapon specs, indexable by kind.
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
pub struct WeaponTable {
    pub sword: WeaponSpec,
    pub great_sword: WeaponSpec,
    pub fists: WeaponSpec,
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self {
            sword: WeaponSpec::sword(),
            great_sword: WeaponSpec::great_sword(),
            fists: WeaponSpec::fists(),
        }
    }
}

impl WeaponTable {
    pub fn get(&self, kind: WeaponKind) -> &WeaponSpec {
        match kind {
            WeaponKind::Sword => &self.sword,
            WeaponKind::GreatSword => &self.great_sword,
            WeaponKind::Fists => &self.fists,
        }
    }
}

/// Global simulation tuning resource.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Delay between entering Stunned and handing bones to physics (seconds)
    pub pre_ragdoll_delay: f32,
    /// Physics-pose → stand-up-pose blend duration (seconds)
    pub bone_blend_time: f32,
    /// Stand-up recovery animation duration (seconds)
    pub stand_up_time: f32,
    /// Landing lockout after touching ground (seconds)
    pub land_time: f32,
    /// Idle time before a taunt fires (seconds)
    pub idle_taunt_threshold: f32,
    /// Number of taunt clip variants the host ships (`taunt_0..taunt_n`)
    pub taunt_variants: u32,
    pub weapons: WeaponTable,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pre_ragdoll_delay: 0.3,
            bone_blend_time: 0.25,
            stand_up_time: 1.2,
            land_time: 0.25,
            idle_taunt_threshold: 8.0,
            taunt_variants: 3,
            weapons: WeaponTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_time_lookup() {
        let spec = WeaponSpec::sword();
        assert_eq!(spec.max_stages(), 2);
        assert_eq!(spec.stage_time(1), 0.4);
        assert_eq!(spec.stage_time(2), 0.6);
        // Out-of-table stages clamp instead of panicking
        assert_eq!(spec.stage_time(0), 0.4);
        assert_eq!(spec.stage_time(9), 0.6);
    }

    #[test]
    fn test_weapon_table_lookup() {
        let table = WeaponTable::default();
        assert_eq!(table.get(WeaponKind::Sword).max_hits, 2);
        assert_eq!(table.get(WeaponKind::GreatSword).damage, 18.0);
        assert_eq!(table.get(WeaponKind::Fists).combo_threshold, 4);
    }
}
