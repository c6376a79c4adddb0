//! SKIRMISH Simulation Core
//!
//! Headless combat/body-state simulation for an action game, on Bevy ECS.
//! The core decides what an actor is able to do, what it is currently
//! doing, how weapon strikes resolve into damage/knockback/combo effects,
//! and how an actor moves through stun, ragdoll, and recovery.
//!
//! Hybrid architecture:
//! - ECS = game state and combat rules (this crate, engine-agnostic)
//! - Host engine = physics integration, animation playback, audio, input,
//!   talking to the core through the event boundary in [`interop`]

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod actor;
pub mod combat;
pub mod config;
pub mod idle;
pub mod interop;
pub mod logger;
pub mod movement;
pub mod ragdoll;

pub use actor::{
    AbleChanged, AbleState, ActionChanged, ActionFlag, ActorState, Capabilities, CurrentAction,
    Facing,
};
pub use combat::{
    AttackSequence, Breakable, Health, HurtSequence, Interactable, LightAttackIntent, Loadout,
    ReflectSequence, Surface, TakeDamage, WeaponKind, WeaponSlot, WeaponSwitchIntent,
};
pub use config::{SimulationConfig, WeaponSpec, WeaponTable};
pub use idle::{IdleReset, IdleTimer, TauntSequence};
pub use interop::{
    ActorDied, AudioCue, BonePoseUpdate, CueKind, GroundContact, ObjectBroken, PhysicsCommand,
    PresentationCommand, SkeletonCommand, WeaponOverlap,
};
pub use movement::{LandingSequence, MovementIntent, MovementKind};
pub use ragdoll::{Bone, BoneSnapshot, RagdollPhase, RagdollRequest, RagdollSequence, Skeleton};

use actor::ActorPlugin;
use combat::CombatPlugin;
use idle::IdlePlugin;
use interop::InteropPlugin;
use movement::MovementPlugin;
use ragdoll::RagdollPlugin;

/// Root simulation plugin.
///
/// Registers every subsystem and runs the whole tick as one ordered chain
/// in FixedUpdate (60 Hz):
///
/// 1. Timers: weapon cooldowns, idle accumulator
/// 2. Intent resolution: movement, ground contact, weapon switch, attacks
/// 3. Cross-actor hit resolution + reflect entry
/// 4. Damage application
/// 5. Ragdoll requests + bone pose mirror
/// 6. Sequence advancement: attack, reflect, hurt, landing, ragdoll, taunt
/// 7. State-change fan-out: idle reset/taunt cancel, presentation flags
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<DeterministicRng>()
            .init_resource::<SimulationConfig>()
            .add_plugins((
                InteropPlugin,
                ActorPlugin,
                CombatPlugin,
                RagdollPlugin,
                IdlePlugin,
                MovementPlugin,
            ));

        app.add_systems(
            FixedUpdate,
            (
                // Phase 1: timers
                (combat::tick_attack_cooldowns, idle::tick_idle_timers).chain(),
                // Phase 2: intent resolution
                (
                    movement::process_movement_intents,
                    movement::apply_ground_contacts,
                    combat::switch_weapons,
                    combat::start_light_attacks,
                )
                    .chain(),
                // Phase 3: hit resolution
                (combat::resolve_weapon_hits, combat::start_reflects).chain(),
                // Phase 4: damage
                combat::apply_damage,
                // Phase 5: ragdoll entry + bone mirror
                (ragdoll::handle_ragdoll_requests, ragdoll::apply_bone_pose_updates).chain(),
                // Phase 6: sequence advancement
                (
                    combat::update_attack_sequences,
                    combat::update_reflect_sequences,
                    combat::update_hurt_sequences,
                    movement::update_landing_sequences,
                    ragdoll::update_ragdoll_sequences,
                    idle::update_taunt_sequences,
                )
                    .chain(),
                // Phase 7: fan-out
                (
                    idle::reset_idle_on_state_change,
                    idle::apply_idle_resets,
                    actor::sync_action_flags,
                )
                    .chain(),
            )
                .chain(),
        );
    }
}

/// Deterministic RNG resource (seeded).
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Creates a minimal Bevy App for headless simulation.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0));

    app
}

/// Advances the simulation by exactly `ticks` fixed steps, independent of
/// wall-clock time. Headless tests drive the app through this instead of
/// `App::update` so tick counts are deterministic.
pub fn step_simulation(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        let timestep = app.world().resource::<Time<Fixed>>().timestep();
        app.world_mut()
            .resource_mut::<Time<Fixed>>()
            .advance_by(timestep);
        app.world_mut().run_schedule(FixedUpdate);
    }
}

/// Snapshot of one component type across the world, in a deterministic
/// order, for determinism comparisons between runs.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
