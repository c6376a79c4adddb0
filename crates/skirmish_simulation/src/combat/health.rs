//! Actor health and the hurt/death branch of damage application.

use bevy::prelude::*;

use crate::actor::{change_able, change_action, AbleChanged, ActionChanged, ActorState, AbleState, CurrentAction};
use crate::combat::attack::AttackSequence;
use crate::combat::hits::ReflectSequence;
use crate::idle::TauntSequence;
use crate::movement::LandingSequence;
use crate::interop::{ActorDied, AudioCue, CueKind};
use crate::ragdoll::RagdollRequest;

/// Actor health.
///
/// Invariant: 0 <= current <= max.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }
}

/// Damage handed to a target's health machinery. The target decides the
/// resulting state: death, forced ragdoll, or a basic stun.
#[derive(Event, Debug, Clone, Copy)]
pub struct TakeDamage {
    pub target: Entity,
    pub attacker: Option<Entity>,
    pub amount: f32,
    pub stun_time: f32,
    pub force_ragdoll: bool,
}

/// Basic hurt: stunned without ragdoll for the hit's stun time. A fresh hit
/// restarts it.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct HurtSequence {
    pub remaining: f32,
}

/// System: apply damage and pick the follow-up.
///
/// - health exhausted → Dead (terminal), death ragdoll, in-flight sequences
///   dropped
/// - forced ragdoll → hand off to the ragdoll sequencer with the stun time
/// - otherwise → basic hurt sequence
pub fn apply_damage(
    mut events: EventReader<TakeDamage>,
    mut targets: Query<(&mut Health, &mut ActorState)>,
    mut commands: Commands,
    mut ragdolls: EventWriter<RagdollRequest>,
    mut deaths: EventWriter<ActorDied>,
    mut action_changed: EventWriter<ActionChanged>,
    mut able_changed: EventWriter<AbleChanged>,
    mut cues: EventWriter<AudioCue>,
) {
    for hit in events.read() {
        let Ok((mut health, mut state)) = targets.get_mut(hit.target) else {
            crate::logger::log_warning(&format!("damage for entity {:?} without health", hit.target));
            continue;
        };
        if state.able() == AbleState::Dead {
            continue;
        }

        health.take_damage(hit.amount);
        cues.write(AudioCue {
            entity: hit.target,
            cue: CueKind::Hurt,
        });

        if !health.is_alive() {
            change_able(hit.target, &mut state, AbleState::Dead, &mut able_changed);
            // Drop every timed sequence: the death ragdoll is the only thing
            // allowed to drive a corpse's action from here on
            commands
                .entity(hit.target)
                .remove::<(
                    AttackSequence,
                    TauntSequence,
                    HurtSequence,
                    ReflectSequence,
                    LandingSequence,
                )>();
            deaths.write(ActorDied {
                entity: hit.target,
                killer: hit.attacker,
            });
            ragdolls.write(RagdollRequest {
                entity: hit.target,
                stun_time: hit.stun_time,
            });
            crate::logger::log_info(&format!("{:?} killed by {:?}", hit.target, hit.attacker));
        } else if hit.force_ragdoll {
            commands.entity(hit.target).remove::<HurtSequence>();
            ragdolls.write(RagdollRequest {
                entity: hit.target,
                stun_time: hit.stun_time,
            });
        } else {
            change_able(hit.target, &mut state, AbleState::Incapacitated, &mut able_changed);
            change_action(hit.target, &mut state, CurrentAction::Stunned, &mut action_changed);
            // Insert restarts the stun if one is already running
            commands.entity(hit.target).insert(HurtSequence {
                remaining: hit.stun_time,
            });
        }
    }
}

/// System: recover from a basic hurt.
pub fn update_hurt_sequences(
    mut hurts: Query<(Entity, &mut HurtSequence, &mut ActorState)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut able_changed: EventWriter<AbleChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut hurt, mut state) in hurts.iter_mut() {
        hurt.remaining -= delta;
        if hurt.remaining > 0.0 {
            continue;
        }

        change_able(entity, &mut state, AbleState::Normal, &mut able_changed);
        change_action(entity, &mut state, CurrentAction::Idle, &mut action_changed);
        commands.entity(entity).remove::<HurtSequence>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_floors_at_zero() {
        let mut health = Health::new(30.0);
        health.take_damage(10.0);
        assert_eq!(health.current, 20.0);
        assert!(health.is_alive());

        health.take_damage(50.0);
        assert_eq!(health.current, 0.0);
        assert!(!health.is_alive());
    }
}
