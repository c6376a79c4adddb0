//! Engine boundary events.
//!
//! The core is headless: the host engine owns rendering, animation playback,
//! audio, input, and physics integration. Everything crossing that line is a
//! Bevy event: outbound commands the host drains each frame, and inbound
//! facts/intents the host writes before the simulation tick. Fire and
//! forget; no ordering guarantees beyond tick boundaries.

use bevy::prelude::*;

use crate::actor::ActionFlag;
use crate::combat::weapon::WeaponKind;

// ============================================================================
// Outbound: core → host
// ============================================================================

/// Animation/presentation commands.
#[derive(Event, Debug, Clone)]
pub enum PresentationCommand {
    /// Clear every exclusive action flag, then set this one.
    SetExclusiveFlag { entity: Entity, flag: ActionFlag },
    /// Clear every weapon flag, then set the flag for this kind.
    SetWeaponFlag { entity: Entity, kind: WeaponKind },
    /// Play a one-shot clip by name.
    PlayClip { entity: Entity, clip: String },
}

/// Skeleton control commands (ragdoll blending).
#[derive(Event, Debug, Clone)]
pub enum SkeletonCommand {
    /// Hand bones to physics (true: animation off, per-bone simulation on).
    SetSimulated { entity: Entity, simulated: bool },
    /// Drive one bone's local pose during the blend phase.
    SetBonePose {
        entity: Entity,
        bone: usize,
        position: Vec3,
        rotation: Quat,
    },
}

/// Physics commands.
#[derive(Event, Debug, Clone)]
pub enum PhysicsCommand {
    ApplyForce {
        entity: Entity,
        direction: Vec3,
        magnitude: f32,
    },
}

/// Audio/VFX cue kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    Unsheathe,
    Whoosh,
    HitWood,
    HitStone,
    HitFlesh,
    Hurt,
    Reflect,
}

/// Fire-and-forget audio/VFX cue.
#[derive(Event, Debug, Clone, Copy)]
pub struct AudioCue {
    pub entity: Entity,
    pub cue: CueKind,
}

/// A breakable object was struck; host swaps in the broken prefab and
/// despawns the entity.
#[derive(Event, Debug, Clone, Copy)]
pub struct ObjectBroken {
    pub object: Entity,
    pub breaker: Entity,
}

/// An actor's health reached zero.
#[derive(Event, Debug, Clone, Copy)]
pub struct ActorDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

// ============================================================================
// Inbound: host → core
// ============================================================================

/// A weapon damage volume overlapped something strikeable. Delivered only
/// while the host's animation-timed collider toggle has the volume active;
/// the resolver still re-checks the Attacking guard.
#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponOverlap {
    pub attacker: Entity,
    pub target: Entity,
}

/// Ground contact gained or lost.
#[derive(Event, Debug, Clone, Copy)]
pub struct GroundContact {
    pub entity: Entity,
    pub grounded: bool,
}

/// Physics pose of one bone, mirrored in while the skeleton is simulated.
#[derive(Event, Debug, Clone, Copy)]
pub struct BonePoseUpdate {
    pub entity: Entity,
    pub bone: usize,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Registers every boundary event.
pub struct InteropPlugin;

impl Plugin for InteropPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PresentationCommand>()
            .add_event::<SkeletonCommand>()
            .add_event::<PhysicsCommand>()
            .add_event::<AudioCue>()
            .add_event::<ObjectBroken>()
            .add_event::<ActorDied>()
            .add_event::<WeaponOverlap>()
            .add_event::<GroundContact>()
            .add_event::<BonePoseUpdate>();
    }
}
