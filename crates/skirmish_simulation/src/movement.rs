//! Movement intent consumption and ground contact.
//!
//! Input polling and pathfinding live host-side; this module only consumes
//! the resulting intents, gated by the capability vector, and turns ground
//! contact facts into Falling/Landing transitions.

use bevy::prelude::*;

use crate::actor::{change_able, change_action, AbleChanged, ActionChanged, ActorState, AbleState, CurrentAction};
use crate::config::SimulationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    Walk,
    Run,
    Jump,
    Stop,
}

/// Movement intent from input or AI navigation.
#[derive(Event, Debug, Clone, Copy)]
pub struct MovementIntent {
    pub entity: Entity,
    pub kind: MovementKind,
}

/// Landing lockout after touching ground.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct LandingSequence {
    pub remaining: f32,
}

/// System: map movement intents to actions, gated by capabilities.
pub fn process_movement_intents(
    mut intents: EventReader<MovementIntent>,
    mut actors: Query<&mut ActorState>,
    mut action_changed: EventWriter<ActionChanged>,
) {
    for intent in intents.read() {
        let Ok(mut state) = actors.get_mut(intent.entity) else {
            continue;
        };
        let caps = state.capabilities();

        let action = match intent.kind {
            MovementKind::Walk if caps.can_walk => CurrentAction::Walking,
            MovementKind::Run if caps.can_run => CurrentAction::Running,
            MovementKind::Jump if caps.can_jump && state.grounded() => CurrentAction::Jumping,
            MovementKind::Stop if caps.can_walk => CurrentAction::Idle,
            _ => continue,
        };
        change_action(intent.entity, &mut state, action, &mut action_changed);
    }
}

/// System: apply ground contact facts.
///
/// Losing ground mid-anything-but-attack means Falling. Touching ground
/// while airborne starts the landing lockout; a repeat contact restarts it.
/// Ragdolling and dead actors only get their grounded flag updated.
pub fn apply_ground_contacts(
    mut contacts: EventReader<crate::interop::GroundContact>,
    mut actors: Query<&mut ActorState>,
    config: Res<SimulationConfig>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut able_changed: EventWriter<AbleChanged>,
) {
    for contact in contacts.read() {
        let Ok(mut state) = actors.get_mut(contact.entity) else {
            continue;
        };

        if !contact.grounded {
            state.set_grounded(false);
            if state.action() != CurrentAction::Attacking {
                change_action(contact.entity, &mut state, CurrentAction::Falling, &mut action_changed);
            }
            continue;
        }

        let was_airborne = !state.grounded();
        state.set_grounded(true);

        if !was_airborne {
            continue;
        }
        if state.able() != AbleState::Normal || state.action() == CurrentAction::Ragdoll {
            continue;
        }

        change_able(contact.entity, &mut state, AbleState::Incapacitated, &mut able_changed);
        change_action(contact.entity, &mut state, CurrentAction::Landing, &mut action_changed);
        commands.entity(contact.entity).insert(LandingSequence {
            remaining: config.land_time,
        });
    }
}

/// System: finish landings.
pub fn update_landing_sequences(
    mut landings: Query<(Entity, &mut LandingSequence, &mut ActorState)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut able_changed: EventWriter<AbleChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut landing, mut state) in landings.iter_mut() {
        landing.remaining -= delta;
        if landing.remaining > 0.0 {
            continue;
        }
        change_able(entity, &mut state, AbleState::Normal, &mut able_changed);
        change_action(entity, &mut state, CurrentAction::Idle, &mut action_changed);
        commands.entity(entity).remove::<LandingSequence>();
    }
}

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MovementIntent>();
    }
}
