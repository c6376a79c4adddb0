//! Ragdoll sequencer integration tests.
//!
//! Full timeline through stun → simulated → bone blend → stand-up, restart
//! semantics, and death terminality, driven tick by tick.

use bevy::prelude::*;
use skirmish_simulation::*;

fn create_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.finish();
    app.cleanup();
    app
}

fn two_bone_skeleton() -> Skeleton {
    Skeleton::new(
        vec![
            Bone {
                name: "hips".into(),
                position: Vec3::new(0.3, 0.2, 0.0),
                rotation: Quat::from_rotation_z(0.8),
            },
            Bone {
                name: "spine".into(),
                position: Vec3::new(0.3, 0.4, 0.2),
                rotation: Quat::from_rotation_x(-0.5),
            },
        ],
        vec![
            BoneSnapshot {
                position: Vec3::new(0.0, 1.0, 0.0),
                rotation: Quat::IDENTITY,
            },
            BoneSnapshot {
                position: Vec3::new(0.0, 1.4, 0.0),
                rotation: Quat::IDENTITY,
            },
        ],
    )
}

fn spawn_actor(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((ActorState::default(), two_bone_skeleton()))
        .id()
}

fn action_of(app: &App, entity: Entity) -> CurrentAction {
    app.world().get::<ActorState>(entity).unwrap().action()
}

fn able_of(app: &App, entity: Entity) -> AbleState {
    app.world().get::<ActorState>(entity).unwrap().able()
}

fn request_ragdoll(app: &mut App, entity: Entity, stun_time: f32) {
    app.world_mut().send_event(RagdollRequest { entity, stun_time });
}

/// Full sequence with default config: 0.3s pre-ragdoll stun, 2.0s simulated,
/// 0.25s blend, 1.2s stand-up, back to Normal/Idle.
#[test]
fn test_full_sequence_timeline() {
    let mut app = create_app(42);
    let actor = spawn_actor(&mut app);

    request_ragdoll(&mut app, actor, 2.0);
    step_simulation(&mut app, 2);
    assert_eq!(able_of(&app, actor), AbleState::Incapacitated);
    assert_eq!(action_of(&app, actor), CurrentAction::Stunned);

    // Past the 0.3s delay (18-19 ticks): bones handed to physics
    step_simulation(&mut app, 25);
    assert_eq!(action_of(&app, actor), CurrentAction::Ragdoll);

    // Deep in the simulated window (ends ~tick 140 after the request)
    step_simulation(&mut app, 100);
    assert_eq!(action_of(&app, actor), CurrentAction::Ragdoll);

    // Simulated over, 0.25s blend done (~tick 156): recovery clip playing
    step_simulation(&mut app, 35);
    assert_eq!(action_of(&app, actor), CurrentAction::StandingUp);
    assert_eq!(able_of(&app, actor), AbleState::Incapacitated);

    // 1.2s stand-up (ends ~tick 229): fully recovered, sequence gone
    step_simulation(&mut app, 80);
    assert_eq!(able_of(&app, actor), AbleState::Normal);
    assert_eq!(action_of(&app, actor), CurrentAction::Idle);
    assert!(app.world().get::<RagdollSequence>(actor).is_none());
}

/// The blend leaves every bone on the stand-up pose, and the skeleton is
/// handed to physics exactly once and back exactly once.
#[test]
fn test_blend_lands_on_stand_up_pose() {
    let mut app = create_app(42);
    let actor = spawn_actor(&mut app);

    request_ragdoll(&mut app, actor, 1.0);
    step_simulation(&mut app, 300);
    assert_eq!(action_of(&app, actor), CurrentAction::Idle);

    let skeleton = app.world().get::<Skeleton>(actor).unwrap();
    for (bone, target) in skeleton.bones.iter().zip(skeleton.stand_up_pose.iter()) {
        assert!((bone.position - target.position).length() < 1e-4, "bone {}", bone.name);
        assert!(bone.rotation.angle_between(target.rotation).abs() < 1e-3, "bone {}", bone.name);
    }

    let events = app.world().resource::<Events<SkeletonCommand>>();
    let mut cursor = events.get_cursor();
    let (mut handed_off, mut handed_back) = (0, 0);
    for command in cursor.read(events) {
        if let SkeletonCommand::SetSimulated { simulated, .. } = command {
            if *simulated {
                handed_off += 1;
            } else {
                handed_back += 1;
            }
        }
    }
    assert_eq!(handed_off, 1);
    assert_eq!(handed_back, 1);
}

/// Host pose updates during the simulated window become the blend's start
/// pose: the first blend tick starts near them, not near the spawn pose.
#[test]
fn test_host_poses_feed_the_blend() {
    let mut app = create_app(42);
    let actor = spawn_actor(&mut app);

    request_ragdoll(&mut app, actor, 1.0);
    step_simulation(&mut app, 40); // into the simulated window

    let fallen = Vec3::new(2.0, 0.1, -1.0);
    app.world_mut().send_event(BonePoseUpdate {
        entity: actor,
        bone: 0,
        position: fallen,
        rotation: Quat::from_rotation_y(1.2),
    });
    step_simulation(&mut app, 1);
    assert_eq!(app.world().get::<Skeleton>(actor).unwrap().bones[0].position, fallen);

    // Run just past the simulated window into the first blend ticks
    step_simulation(&mut app, 42);
    let sequence = app.world().get::<RagdollSequence>(actor).unwrap();
    match &sequence.phase {
        RagdollPhase::Blending { end_pose, .. } => {
            assert_eq!(end_pose[0].position, fallen);
        }
        other => panic!("expected Blending, got {:?}", other),
    }
}

/// A second request mid-sequence supersedes the first: back to Stunned with
/// the new stun time.
#[test]
fn test_restart_supersedes_running_sequence() {
    let mut app = create_app(42);
    let actor = spawn_actor(&mut app);

    request_ragdoll(&mut app, actor, 2.0);
    step_simulation(&mut app, 40); // simulated by now
    assert_eq!(action_of(&app, actor), CurrentAction::Ragdoll);

    request_ragdoll(&mut app, actor, 0.5);
    step_simulation(&mut app, 1);
    assert_eq!(action_of(&app, actor), CurrentAction::Stunned);
    let sequence = app.world().get::<RagdollSequence>(actor).unwrap();
    assert!(matches!(sequence.phase, RagdollPhase::Stunned { .. }));
    assert_eq!(sequence.stun_time, 0.5);

    // Shortened timeline: 0.3 + 0.5 + 0.25 + 1.2s = 135 ticks, plus margin
    step_simulation(&mut app, 200);
    assert_eq!(action_of(&app, actor), CurrentAction::Idle);
}

/// A ragdoll request supersedes a basic hurt stun.
#[test]
fn test_ragdoll_supersedes_hurt() {
    let mut app = create_app(42);
    let actor = spawn_actor(&mut app);

    app.world_mut().send_event(TakeDamage {
        target: actor,
        attacker: None,
        amount: 5.0,
        stun_time: 3.0,
        force_ragdoll: false,
    });
    step_simulation(&mut app, 1);
    assert!(app.world().get::<HurtSequence>(actor).is_some());

    request_ragdoll(&mut app, actor, 1.0);
    step_simulation(&mut app, 1);
    assert!(app.world().get::<HurtSequence>(actor).is_none());
    assert!(app.world().get::<RagdollSequence>(actor).is_some());
}

/// Death leaves the actor simulated forever: no blend, no stand-up, and the
/// Dead able state never changes.
#[test]
fn test_dead_actor_never_stands_up() {
    let mut app = create_app(42);
    let actor = app
        .world_mut()
        .spawn((ActorState::default(), two_bone_skeleton(), Health::new(5.0)))
        .id();

    app.world_mut().send_event(TakeDamage {
        target: actor,
        attacker: None,
        amount: 10.0,
        stun_time: 1.0,
        force_ragdoll: false,
    });
    step_simulation(&mut app, 25);
    assert_eq!(able_of(&app, actor), AbleState::Dead);
    assert_eq!(action_of(&app, actor), CurrentAction::Ragdoll);

    step_simulation(&mut app, 1000);
    assert_eq!(able_of(&app, actor), AbleState::Dead);
    assert_eq!(action_of(&app, actor), CurrentAction::Ragdoll);
    let sequence = app.world().get::<RagdollSequence>(actor).unwrap();
    assert!(matches!(sequence.phase, RagdollPhase::Simulated { .. }));

    let events = app.world().resource::<Events<ActorDied>>();
    let mut cursor = events.get_cursor();
    assert_eq!(cursor.read(events).count(), 1);
}

/// Death while a reflect lockout is in flight drops the lockout with the
/// rest of the timed sequences: when the reflect would have expired, the
/// corpse is still in the terminal Ragdoll action, not flipped to Idle.
#[test]
fn test_death_mid_reflect_stays_ragdolled() {
    let mut app = create_app(42);
    let actor = spawn_actor(&mut app);
    let statue = app.world_mut().spawn((Interactable, Surface::Stone)).id();

    app.world_mut().send_event(WeaponSwitchIntent {
        entity: actor,
        kind: WeaponKind::Sword,
    });
    step_simulation(&mut app, 1);
    app.world_mut().send_event(LightAttackIntent { entity: actor });
    app.world_mut().send_event(WeaponOverlap {
        attacker: actor,
        target: statue,
    });
    step_simulation(&mut app, 2);
    assert_eq!(action_of(&app, actor), CurrentAction::Reflected);

    // Killed mid-lockout: the reflect sequence dies with the actor
    app.world_mut().send_event(TakeDamage {
        target: actor,
        attacker: None,
        amount: 200.0,
        stun_time: 1.0,
        force_ragdoll: false,
    });
    step_simulation(&mut app, 1);
    assert_eq!(able_of(&app, actor), AbleState::Dead);
    assert!(app.world().get::<ReflectSequence>(actor).is_none());

    // Sword reflect time is 1.0s; run well past it
    step_simulation(&mut app, 130);
    assert_eq!(able_of(&app, actor), AbleState::Dead);
    assert_eq!(action_of(&app, actor), CurrentAction::Ragdoll);
    // Reflect recovery never ran: the swing budget was not refilled
    assert_eq!(
        app.world()
            .get::<Loadout>(actor)
            .unwrap()
            .active_slot()
            .hits_left,
        1
    );
}

/// Further damage after death is ignored.
#[test]
fn test_dead_actor_ignores_damage() {
    let mut app = create_app(42);
    let actor = app
        .world_mut()
        .spawn((ActorState::default(), two_bone_skeleton(), Health::new(5.0)))
        .id();

    app.world_mut().send_event(TakeDamage {
        target: actor,
        attacker: None,
        amount: 10.0,
        stun_time: 1.0,
        force_ragdoll: false,
    });
    step_simulation(&mut app, 1);
    assert_eq!(able_of(&app, actor), AbleState::Dead);

    app.world_mut().send_event(TakeDamage {
        target: actor,
        attacker: None,
        amount: 10.0,
        stun_time: 1.0,
        force_ragdoll: false,
    });
    step_simulation(&mut app, 1);

    let events = app.world().resource::<Events<ActorDied>>();
    let mut cursor = events.get_cursor();
    assert_eq!(cursor.read(events).count(), 1);
}
