//! Actor ability/action state machine.
//!
//! [`ActorState`] is the single authority over what an actor *can* do
//! (ability dimension) and what it is *currently* doing (action dimension).
//! Every other subsystem (attacks, hit resolution, ragdoll, idle taunts)
//! mutates these two dimensions only through this component's operations,
//! and every accepted change fans out as [`ActionChanged`]/[`AbleChanged`]
//! events (presentation flag sync, idle timer reset, taunt cancellation).

use bevy::prelude::*;

use crate::combat::health::Health;
use crate::combat::weapon::Loadout;
use crate::idle::IdleTimer;
use crate::interop::PresentationCommand;
use crate::ragdoll::Skeleton;

/// Coarse capability mode of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AbleState {
    Normal,
    Incapacitated,
    Rooted,
    Dead,
}

/// Fine-grained activity state. Each value maps to exactly one exclusive
/// presentation flag (see [`CurrentAction::flag`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum CurrentAction {
    Idle,
    StandingUp,
    Walking,
    Running,
    Jumping,
    Falling,
    Landing,
    Attacking,
    Stunned,
    Reflected,
    Ragdoll,
    Taunt,
}

impl CurrentAction {
    /// The exclusive animator flag for this action.
    pub fn flag(self) -> ActionFlag {
        match self {
            CurrentAction::Idle => ActionFlag::IsIdle,
            CurrentAction::StandingUp => ActionFlag::IsStanding,
            CurrentAction::Walking => ActionFlag::IsWalking,
            CurrentAction::Running => ActionFlag::IsRunning,
            CurrentAction::Jumping => ActionFlag::IsJumping,
            CurrentAction::Falling => ActionFlag::IsFalling,
            CurrentAction::Landing => ActionFlag::IsLanding,
            CurrentAction::Attacking => ActionFlag::IsAttacking,
            CurrentAction::Stunned => ActionFlag::IsStunned,
            CurrentAction::Reflected => ActionFlag::IsReflected,
            CurrentAction::Ragdoll => ActionFlag::IsRagdoll,
            CurrentAction::Taunt => ActionFlag::IsTaunting,
        }
    }

    /// Actions permitted while airborne. Anything else is rejected until
    /// the actor touches ground again.
    pub fn allowed_airborne(self) -> bool {
        matches!(
            self,
            CurrentAction::Falling
                | CurrentAction::Stunned
                | CurrentAction::Ragdoll
                | CurrentAction::Attacking
        )
    }
}

/// Exclusive animator flags, one per [`CurrentAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ActionFlag {
    IsIdle,
    IsStanding,
    IsWalking,
    IsRunning,
    IsJumping,
    IsFalling,
    IsLanding,
    IsAttacking,
    IsStunned,
    IsReflected,
    IsRagdoll,
    IsTaunting,
}

/// Capability vector, fully determined by [`AbleState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct Capabilities {
    pub can_walk: bool,
    pub can_run: bool,
    pub can_jump: bool,
    pub can_attack: bool,
}

impl Capabilities {
    pub fn of(able: AbleState) -> Self {
        match able {
            AbleState::Normal => Self {
                can_walk: true,
                can_run: true,
                can_jump: true,
                can_attack: true,
            },
            AbleState::Incapacitated | AbleState::Dead => Self {
                can_walk: false,
                can_run: false,
                can_jump: false,
                can_attack: false,
            },
            AbleState::Rooted => Self {
                can_walk: false,
                can_run: false,
                can_jump: false,
                can_attack: true,
            },
        }
    }
}

/// Facing direction (unit vector), kept in sync by the host. Used for
/// knockback direction on strikes.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Facing(pub Vec3);

impl Default for Facing {
    fn default() -> Self {
        Self(Vec3::Z)
    }
}

/// Per-actor ability/action state.
///
/// Spawning this component pulls in the rest of an actor's kit through
/// Required Components; hosts overwrite the defaults as needed.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Health, Loadout, IdleTimer, Facing, Skeleton)]
pub struct ActorState {
    able: AbleState,
    action: CurrentAction,
    grounded: bool,
}

impl Default for ActorState {
    fn default() -> Self {
        Self {
            able: AbleState::Normal,
            action: CurrentAction::Idle,
            grounded: true,
        }
    }
}

impl ActorState {
    pub fn able(&self) -> AbleState {
        self.able
    }

    pub fn action(&self) -> CurrentAction {
        self.action
    }

    pub fn grounded(&self) -> bool {
        self.grounded
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::of(self.able)
    }

    /// Pure write; callers decide any follow-up action transitions.
    pub fn set_grounded(&mut self, grounded: bool) {
        self.grounded = grounded;
    }

    /// Overwrite the ability state. Returns false (no change) only when the
    /// actor is Dead: death is terminal, a dead actor never regains any
    /// ability state.
    pub fn set_able_state(&mut self, new: AbleState) -> bool {
        if self.able == AbleState::Dead && new != AbleState::Dead {
            return false;
        }
        self.able = new;
        true
    }

    /// Request an action transition.
    ///
    /// Returns false without touching state when:
    /// - `new` equals the current action, or
    /// - the actor is airborne and `new` is not airborne-permitted.
    pub fn try_set_action(&mut self, new: CurrentAction) -> bool {
        if new == self.action {
            return false;
        }
        if !self.grounded && !new.allowed_airborne() {
            return false;
        }
        self.action = new;
        true
    }
}

/// Event: an actor's action changed (accepted transition).
#[derive(Event, Debug, Clone, Copy)]
pub struct ActionChanged {
    pub entity: Entity,
    pub action: CurrentAction,
}

/// Event: an actor's ability state changed.
#[derive(Event, Debug, Clone, Copy)]
pub struct AbleChanged {
    pub entity: Entity,
    pub able: AbleState,
}

/// Route an action transition through the authority and fan out the change
/// event on acceptance. All mutating systems use this instead of poking
/// [`ActorState`] directly.
pub fn change_action(
    entity: Entity,
    state: &mut ActorState,
    new: CurrentAction,
    changed: &mut EventWriter<ActionChanged>,
) -> bool {
    if state.try_set_action(new) {
        crate::logger::log(&format!("{:?} action -> {:?}", entity, new));
        changed.write(ActionChanged {
            entity,
            action: new,
        });
        true
    } else {
        false
    }
}

/// Ability-state counterpart of [`change_action`].
pub fn change_able(
    entity: Entity,
    state: &mut ActorState,
    new: AbleState,
    changed: &mut EventWriter<AbleChanged>,
) -> bool {
    if state.set_able_state(new) {
        crate::logger::log(&format!("{:?} able state -> {:?}", entity, new));
        changed.write(AbleChanged { entity, able: new });
        true
    } else {
        false
    }
}

/// System: derive exclusive presentation flags from accepted action changes.
///
/// `SetExclusiveFlag` clears every other action flag host-side, so the
/// animator only ever sees one flag per actor.
pub fn sync_action_flags(
    mut changes: EventReader<ActionChanged>,
    mut presentation: EventWriter<PresentationCommand>,
) {
    for change in changes.read() {
        presentation.write(PresentationCommand::SetExclusiveFlag {
            entity: change.entity,
            flag: change.action.flag(),
        });
    }
}

pub struct ActorPlugin;

impl Plugin for ActorPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ActionChanged>().add_event::<AbleChanged>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table() {
        let all = Capabilities::of(AbleState::Normal);
        assert!(all.can_walk && all.can_run && all.can_jump && all.can_attack);

        let none = Capabilities::of(AbleState::Incapacitated);
        assert!(!none.can_walk && !none.can_run && !none.can_jump && !none.can_attack);

        let dead = Capabilities::of(AbleState::Dead);
        assert_eq!(dead, none);

        let rooted = Capabilities::of(AbleState::Rooted);
        assert!(!rooted.can_walk && !rooted.can_run && !rooted.can_jump);
        assert!(rooted.can_attack);
    }

    #[test]
    fn test_same_action_is_noop() {
        let mut state = ActorState::default();
        assert_eq!(state.action(), CurrentAction::Idle);
        assert!(!state.try_set_action(CurrentAction::Idle));
        assert!(state.try_set_action(CurrentAction::Walking));
        assert_eq!(state.action(), CurrentAction::Walking);
    }

    #[test]
    fn test_grounded_gate_rejects_ground_actions() {
        let mut state = ActorState::default();
        state.set_grounded(false);

        for action in [
            CurrentAction::Idle,
            CurrentAction::StandingUp,
            CurrentAction::Walking,
            CurrentAction::Running,
            CurrentAction::Jumping,
            CurrentAction::Landing,
            CurrentAction::Reflected,
            CurrentAction::Taunt,
        ] {
            assert!(!state.try_set_action(action), "{:?} accepted while airborne", action);
            assert_eq!(state.action(), CurrentAction::Idle);
        }

        for action in [
            CurrentAction::Falling,
            CurrentAction::Stunned,
            CurrentAction::Ragdoll,
            CurrentAction::Attacking,
        ] {
            let mut airborne = ActorState::default();
            airborne.set_grounded(false);
            assert!(airborne.try_set_action(action), "{:?} rejected while airborne", action);
        }
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut state = ActorState::default();
        assert!(state.set_able_state(AbleState::Dead));
        assert!(!state.set_able_state(AbleState::Normal));
        assert!(!state.set_able_state(AbleState::Incapacitated));
        assert_eq!(state.able(), AbleState::Dead);
        // Setting Dead again is harmless
        assert!(state.set_able_state(AbleState::Dead));
    }

    #[test]
    fn test_action_flag_mapping_is_total_and_distinct() {
        let actions = [
            CurrentAction::Idle,
            CurrentAction::StandingUp,
            CurrentAction::Walking,
            CurrentAction::Running,
            CurrentAction::Jumping,
            CurrentAction::Falling,
            CurrentAction::Landing,
            CurrentAction::Attacking,
            CurrentAction::Stunned,
            CurrentAction::Reflected,
            CurrentAction::Ragdoll,
            CurrentAction::Taunt,
        ];
        let flags: Vec<ActionFlag> = actions.iter().map(|a| a.flag()).collect();
        for (i, a) in flags.iter().enumerate() {
            for (j, b) in flags.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }
}
