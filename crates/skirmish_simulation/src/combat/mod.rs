//! Combat: weapon data, the attack controller, hit resolution, and health.
//!
//! Core responsibilities:
//! - Game state: Loadout (weapon slots, combo stage), Health
//! - Combat rules: swing hit budget, same-target combo escalation, reflect
//! - Events: TakeDamage, ReflectTriggered, ObjectBroken
//!
//! Host responsibilities:
//! - Animation-timed damage-volume collider toggle
//! - Overlap detection (delivered as WeaponOverlap events)
//! - Knockback force integration

use bevy::prelude::*;

pub mod attack;
pub mod health;
pub mod hits;
pub mod weapon;

pub use attack::{
    start_light_attacks, switch_weapons, tick_attack_cooldowns, update_attack_sequences,
    AttackSequence, LightAttackIntent, WeaponSwitchIntent,
};
pub use health::{apply_damage, update_hurt_sequences, Health, HurtSequence, TakeDamage};
pub use hits::{
    resolve_weapon_hits, start_reflects, update_reflect_sequences, Breakable, Interactable,
    ReflectSequence, ReflectTriggered, Surface,
};
pub use weapon::{Loadout, WeaponKind, WeaponSlot};

/// Registers combat events. Systems are ordered by the root
/// `SimulationPlugin` so the whole tick runs as one chain.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<WeaponSwitchIntent>()
            .add_event::<LightAttackIntent>()
            .add_event::<ReflectTriggered>()
            .add_event::<TakeDamage>();
    }
}
