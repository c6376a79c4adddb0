//! Attack controller: weapon selection and the light-attack combo sequence.
//!
//! Starting a new swing replaces any in-flight [`AttackSequence`] component;
//! replacement is silent cancellation (the superseded swing's completion
//! effects never run), which is how every sequence kind in the core handles
//! restarts.

use bevy::prelude::*;

use crate::actor::{change_action, ActionChanged, ActorState, AbleState, CurrentAction};
use crate::combat::weapon::{Loadout, WeaponKind};
use crate::idle::IdleReset;
use crate::interop::{AudioCue, CueKind, PresentationCommand};

/// Intent: equip a different weapon kind.
#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponSwitchIntent {
    pub entity: Entity,
    pub kind: WeaponKind,
}

/// Intent: start (or chain) a light attack.
#[derive(Event, Debug, Clone, Copy)]
pub struct LightAttackIntent {
    pub entity: Entity,
}

/// In-flight light attack. Lives for the stage's active duration, then
/// resolves to Idle (grounded) or Falling (airborne).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AttackSequence {
    pub stage: u32,
    pub remaining: f32,
}

/// System: advance every weapon's cooldown accumulator, capped at its
/// cooldown threshold.
pub fn tick_attack_cooldowns(mut loadouts: Query<&mut Loadout>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut loadout in loadouts.iter_mut() {
        loadout.tick_cooldowns(delta);
    }
}

/// System: process weapon switch intents.
///
/// Rejected unless able state is Normal/Rooted and the current action is one
/// of Idle/Walking/Running/Jumping/Falling. Acceptance re-flags the animator,
/// plays the unsheathe cue, and counts as activity for the idle timer.
pub fn switch_weapons(
    mut intents: EventReader<WeaponSwitchIntent>,
    mut actors: Query<(&ActorState, &mut Loadout)>,
    mut presentation: EventWriter<PresentationCommand>,
    mut cues: EventWriter<AudioCue>,
    mut idle_resets: EventWriter<IdleReset>,
) {
    for intent in intents.read() {
        let Ok((state, mut loadout)) = actors.get_mut(intent.entity) else {
            crate::logger::log_warning(&format!(
                "weapon switch for unknown entity {:?}",
                intent.entity
            ));
            continue;
        };

        if loadout.active_kind() == intent.kind {
            continue;
        }
        if !matches!(state.able(), AbleState::Normal | AbleState::Rooted) {
            continue;
        }
        if !matches!(
            state.action(),
            CurrentAction::Idle
                | CurrentAction::Walking
                | CurrentAction::Running
                | CurrentAction::Jumping
                | CurrentAction::Falling
        ) {
            continue;
        }

        loadout.set_active(intent.kind);
        // The stage counter is meaningless against the new kind's depth
        loadout.reset_stage();
        presentation.write(PresentationCommand::SetWeaponFlag {
            entity: intent.entity,
            kind: intent.kind,
        });
        cues.write(AudioCue {
            entity: intent.entity,
            cue: CueKind::Unsheathe,
        });
        idle_resets.write(IdleReset {
            entity: intent.entity,
        });

        crate::logger::log(&format!("{:?} equips {:?}", intent.entity, intent.kind));
    }
}

/// System: process light attack intents.
///
/// No-op unless the combo stage is below the equipped weapon's depth and the
/// per-weapon cooldown has elapsed. Acceptance restarts the attack sequence,
/// refills the swing hit budget, zeroes every weapon's cooldown accumulator,
/// and puts the actor into Attacking.
pub fn start_light_attacks(
    mut intents: EventReader<LightAttackIntent>,
    mut actors: Query<(&mut ActorState, &mut Loadout)>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut cues: EventWriter<AudioCue>,
) {
    for intent in intents.read() {
        let Ok((mut state, mut loadout)) = actors.get_mut(intent.entity) else {
            continue;
        };

        if !state.capabilities().can_attack {
            continue;
        }
        if loadout.stage() >= loadout.max_stages() {
            continue;
        }
        if !loadout.active_slot().cooldown_ready() {
            continue;
        }

        loadout.active_slot_mut().reset_swing_budget();
        cues.write(AudioCue {
            entity: intent.entity,
            cue: CueKind::Whoosh,
        });
        loadout.zero_all_cooldowns();
        let stage = loadout.advance_stage();
        change_action(
            intent.entity,
            &mut state,
            CurrentAction::Attacking,
            &mut action_changed,
        );

        let remaining = loadout.active_slot().spec.stage_time(stage);
        // Insert replaces any in-flight swing: silent cancellation
        commands.entity(intent.entity).insert(AttackSequence {
            stage,
            remaining,
        });

        crate::logger::log(&format!(
            "{:?} light attack stage {} ({:?}, {:.2}s)",
            intent.entity,
            stage,
            loadout.active_kind(),
            remaining
        ));
    }
}

/// System: advance in-flight attacks and resolve completed ones.
///
/// Resolution only runs if the actor is still Attacking: a stun or ragdoll
/// that landed mid-swing owns the action by then, and the swing just cleans
/// up its counters.
pub fn update_attack_sequences(
    mut attacks: Query<(Entity, &mut AttackSequence, &mut ActorState, &mut Loadout)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut attack, mut state, mut loadout) in attacks.iter_mut() {
        attack.remaining -= delta;
        if attack.remaining > 0.0 {
            continue;
        }

        if state.action() == CurrentAction::Attacking {
            let next = if state.grounded() {
                CurrentAction::Idle
            } else {
                CurrentAction::Falling
            };
            change_action(entity, &mut state, next, &mut action_changed);
        }

        loadout.active_slot_mut().reset_swing_budget();
        loadout.reset_stage();
        commands.entity(entity).remove::<AttackSequence>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_sequence_countdown() {
        let mut seq = AttackSequence {
            stage: 1,
            remaining: 0.4,
        };
        let tick = 1.0 / 60.0;
        let mut ticks = 0;
        while seq.remaining > 0.0 {
            seq.remaining -= tick;
            ticks += 1;
        }
        // 0.4s at 60Hz = 24 ticks
        assert_eq!(ticks, 24);
    }
}
