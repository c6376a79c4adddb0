//! Idle taunt timer.
//!
//! Watches how long an actor has gone without a movement-relevant state
//! change and injects a transient Taunt action once the threshold passes.
//! Every accepted action/ability change counts as activity and zeroes the
//! accumulator; actions other than Idle/Taunt also cancel an in-flight
//! taunt.

use bevy::prelude::*;
use rand::Rng;

use crate::actor::{change_action, AbleChanged, ActionChanged, ActorState, AbleState, CurrentAction};
use crate::combat::weapon::Loadout;
use crate::config::SimulationConfig;
use crate::interop::PresentationCommand;
use crate::DeterministicRng;

/// Time since the last movement-relevant state change.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct IdleTimer {
    pub since_last_movement: f32,
}

/// In-flight taunt; expires back to Idle.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct TauntSequence {
    pub remaining: f32,
}

/// Explicit activity signal: zeroes the accumulator and cancels any
/// in-flight taunt, snapping a mid-taunt actor straight back to Idle.
#[derive(Event, Debug, Clone, Copy)]
pub struct IdleReset {
    pub entity: Entity,
}

/// System: advance idle accumulators and fire taunts.
///
/// Dead actors never taunt. The taunt duration depends on the equipped
/// weapon; the clip variant is picked with the seeded RNG.
pub fn tick_idle_timers(
    mut actors: Query<(Entity, &mut IdleTimer, &mut ActorState, &Loadout), Without<TauntSequence>>,
    time: Res<Time<Fixed>>,
    config: Res<SimulationConfig>,
    mut rng: ResMut<DeterministicRng>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut presentation: EventWriter<PresentationCommand>,
) {
    let delta = time.delta_secs();

    for (entity, mut timer, mut state, loadout) in actors.iter_mut() {
        if state.able() == AbleState::Dead {
            continue;
        }

        timer.since_last_movement += delta;
        if timer.since_last_movement <= config.idle_taunt_threshold {
            continue;
        }

        // Rejected transitions (e.g. airborne) retry next tick
        if !change_action(entity, &mut state, CurrentAction::Taunt, &mut action_changed) {
            continue;
        }

        let variant = rng.rng.gen_range(0..config.taunt_variants.max(1));
        presentation.write(PresentationCommand::PlayClip {
            entity,
            clip: format!("taunt_{}", variant),
        });
        commands.entity(entity).insert(TauntSequence {
            remaining: loadout.active_slot().spec.taunt_time,
        });
    }
}

/// System: finish taunts.
pub fn update_taunt_sequences(
    mut taunts: Query<(Entity, &mut TauntSequence, &mut ActorState)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut taunt, mut state) in taunts.iter_mut() {
        taunt.remaining -= delta;
        if taunt.remaining > 0.0 {
            continue;
        }
        change_action(entity, &mut state, CurrentAction::Idle, &mut action_changed);
        commands.entity(entity).remove::<TauntSequence>();
    }
}

/// System: fan accepted state changes out to the idle timer.
///
/// Any change zeroes the accumulator; actions outside Idle/Taunt also
/// cancel an in-flight taunt (the actor is doing something else now).
pub fn reset_idle_on_state_change(
    mut action_events: EventReader<ActionChanged>,
    mut able_events: EventReader<AbleChanged>,
    mut timers: Query<&mut IdleTimer>,
    mut commands: Commands,
) {
    for event in action_events.read() {
        if let Ok(mut timer) = timers.get_mut(event.entity) {
            timer.since_last_movement = 0.0;
        }
        if !matches!(event.action, CurrentAction::Idle | CurrentAction::Taunt) {
            commands.entity(event.entity).remove::<TauntSequence>();
        }
    }
    for event in able_events.read() {
        if let Ok(mut timer) = timers.get_mut(event.entity) {
            timer.since_last_movement = 0.0;
        }
    }
}

/// System: apply explicit idle resets.
pub fn apply_idle_resets(
    mut resets: EventReader<IdleReset>,
    mut actors: Query<(&mut IdleTimer, &mut ActorState)>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
) {
    for reset in resets.read() {
        let Ok((mut timer, mut state)) = actors.get_mut(reset.entity) else {
            continue;
        };
        timer.since_last_movement = 0.0;
        commands.entity(reset.entity).remove::<TauntSequence>();
        if state.action() == CurrentAction::Taunt {
            change_action(reset.entity, &mut state, CurrentAction::Idle, &mut action_changed);
        }
    }
}

pub struct IdlePlugin;

impl Plugin for IdlePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<IdleReset>();
    }
}
