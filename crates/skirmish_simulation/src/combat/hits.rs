//! Weapon hit resolution.
//!
//! Driven by [`WeaponOverlap`] events from the host's damage-volume
//! collider. Strikes on actors feed the same-target combo counter and hand
//! damage to the target's health machinery; strikes on scenery apply
//! knockback and either break the object or reflect the attacker.

use bevy::prelude::*;

use crate::actor::{change_able, change_action, AbleChanged, ActionChanged, ActorState, AbleState, CurrentAction, Facing};
use crate::combat::attack::AttackSequence;
use crate::combat::health::TakeDamage;
use crate::combat::weapon::Loadout;
use crate::interop::{AudioCue, CueKind, ObjectBroken, PhysicsCommand, PresentationCommand, WeaponOverlap};

/// Marker: strikeable scenery (crates, fences, statues).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Interactable;

/// Marker: this object shatters when struck instead of reflecting the blow.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Breakable;

/// Surface material, used only to pick the hit cue.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub enum Surface {
    Wood,
    Stone,
}

/// The attacker struck an indestructible object; the swing bounces back.
#[derive(Event, Debug, Clone, Copy)]
pub struct ReflectTriggered {
    pub attacker: Entity,
}

/// Reflect penalty in flight: attacker is locked out until it expires.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ReflectSequence {
    pub remaining: f32,
}

/// System: classify and resolve weapon overlaps.
///
/// Proceeds only while the attacker is Attacking with swing budget left.
/// Actor targets already ragdolled or dead are ignored.
pub fn resolve_weapon_hits(
    mut overlaps: EventReader<WeaponOverlap>,
    mut attackers: Query<(&ActorState, &mut Loadout, &Facing)>,
    target_states: Query<&ActorState>,
    props: Query<(Option<&Breakable>, Option<&Surface>), With<Interactable>>,
    mut damage: EventWriter<TakeDamage>,
    mut reflects: EventWriter<ReflectTriggered>,
    mut physics: EventWriter<PhysicsCommand>,
    mut cues: EventWriter<AudioCue>,
    mut broken: EventWriter<ObjectBroken>,
) {
    for overlap in overlaps.read() {
        if overlap.attacker == overlap.target {
            continue;
        }
        let Ok((state, mut loadout, facing)) = attackers.get_mut(overlap.attacker) else {
            continue;
        };
        if state.action() != CurrentAction::Attacking {
            continue;
        }
        if loadout.active_slot().hits_left == 0 {
            continue;
        }

        if let Ok((breakable, surface)) = props.get(overlap.target) {
            let slot = loadout.active_slot_mut();
            slot.consume_hit();
            physics.write(PhysicsCommand::ApplyForce {
                entity: overlap.target,
                direction: facing.0,
                magnitude: slot.spec.knockback * 2.0,
            });
            match surface {
                Some(Surface::Wood) => {
                    cues.write(AudioCue {
                        entity: overlap.attacker,
                        cue: CueKind::HitWood,
                    });
                }
                Some(Surface::Stone) => {
                    cues.write(AudioCue {
                        entity: overlap.attacker,
                        cue: CueKind::HitStone,
                    });
                }
                None => {}
            }

            if breakable.is_some() {
                broken.write(ObjectBroken {
                    object: overlap.target,
                    breaker: overlap.attacker,
                });
                crate::logger::log(&format!(
                    "{:?} breaks {:?}",
                    overlap.attacker, overlap.target
                ));
            } else {
                // No breakable marker anywhere on the object: the swing
                // is reflected back at the attacker
                reflects.write(ReflectTriggered {
                    attacker: overlap.attacker,
                });
            }
        } else if let Ok(target_state) = target_states.get(overlap.target) {
            if target_state.action() == CurrentAction::Ragdoll
                || target_state.able() == AbleState::Dead
            {
                continue;
            }

            let slot = loadout.active_slot_mut();
            slot.consume_hit();
            cues.write(AudioCue {
                entity: overlap.attacker,
                cue: CueKind::HitFlesh,
            });
            physics.write(PhysicsCommand::ApplyForce {
                entity: overlap.target,
                direction: facing.0,
                magnitude: slot.spec.knockback,
            });

            let force_ragdoll = slot.register_strike(overlap.target);
            damage.write(TakeDamage {
                target: overlap.target,
                attacker: Some(overlap.attacker),
                amount: slot.spec.damage,
                stun_time: slot.spec.stun_time,
                force_ragdoll,
            });

            crate::logger::log(&format!(
                "{:?} strikes {:?} (combo {}, force_ragdoll: {})",
                overlap.attacker, overlap.target, slot.combo_count, force_ragdoll
            ));
        }
        // Overlaps with anything else (no Interactable, no ActorState) are
        // ignored
    }
}

/// System: apply the reflect penalty.
///
/// Cancels the in-flight attack without resolving it, incapacitates the
/// attacker in the Reflected action, and arms the timed lockout.
pub fn start_reflects(
    mut events: EventReader<ReflectTriggered>,
    mut actors: Query<(&mut ActorState, &Loadout)>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut able_changed: EventWriter<AbleChanged>,
    mut presentation: EventWriter<PresentationCommand>,
    mut cues: EventWriter<AudioCue>,
) {
    for event in events.read() {
        let Ok((mut state, loadout)) = actors.get_mut(event.attacker) else {
            continue;
        };

        commands.entity(event.attacker).remove::<AttackSequence>();
        change_able(event.attacker, &mut state, AbleState::Incapacitated, &mut able_changed);
        change_action(event.attacker, &mut state, CurrentAction::Reflected, &mut action_changed);
        presentation.write(PresentationCommand::PlayClip {
            entity: event.attacker,
            clip: format!("{}_reflected", loadout.active_kind().clip_prefix()),
        });
        cues.write(AudioCue {
            entity: event.attacker,
            cue: CueKind::Reflect,
        });
        commands.entity(event.attacker).insert(ReflectSequence {
            remaining: loadout.active_slot().spec.reflect_time,
        });

        crate::logger::log(&format!("{:?} reflected", event.attacker));
    }
}

/// System: recover from reflect. Restores Normal/Idle and resets the swing
/// hit budget and combo stage.
pub fn update_reflect_sequences(
    mut reflects: Query<(Entity, &mut ReflectSequence, &mut ActorState, &mut Loadout)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut able_changed: EventWriter<AbleChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut reflect, mut state, mut loadout) in reflects.iter_mut() {
        reflect.remaining -= delta;
        if reflect.remaining > 0.0 {
            continue;
        }

        change_able(entity, &mut state, AbleState::Normal, &mut able_changed);
        change_action(entity, &mut state, CurrentAction::Idle, &mut action_changed);
        loadout.active_slot_mut().reset_swing_budget();
        loadout.reset_stage();
        commands.entity(entity).remove::<ReflectSequence>();
    }
}
