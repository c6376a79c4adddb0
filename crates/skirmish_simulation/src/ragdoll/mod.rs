//! Ragdoll sequencer: stun → physics ragdoll → bone blend → stand up.
//!
//! While bones are simulated the host mirrors their physics pose into
//! [`Skeleton`] via `BonePoseUpdate`. When the ragdoll ends, the sequencer
//! captures that pose and blends every bone toward the stand-up animation's
//! first frame, then hands the skeleton back to animation control.

use bevy::prelude::*;

use crate::actor::{change_able, change_action, AbleChanged, ActionChanged, ActorState, AbleState, CurrentAction};
use crate::combat::health::HurtSequence;
use crate::config::SimulationConfig;
use crate::interop::{BonePoseUpdate, PresentationCommand, SkeletonCommand};

/// Captured local pose of one bone.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct BoneSnapshot {
    pub position: Vec3,
    pub rotation: Quat,
}

/// One skeletal bone with its current local pose.
#[derive(Debug, Clone, Reflect)]
pub struct Bone {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Actor skeleton mirror.
///
/// `stand_up_pose` is the recovery animation's first frame, sampled once by
/// the host at actor spawn; it is the blend target whenever a ragdoll ends.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
    pub stand_up_pose: Vec<BoneSnapshot>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>, stand_up_pose: Vec<BoneSnapshot>) -> Self {
        debug_assert_eq!(bones.len(), stand_up_pose.len());
        Self {
            bones,
            stand_up_pose,
        }
    }

    /// Snapshot the current pose of every bone.
    pub fn capture(&self) -> Vec<BoneSnapshot> {
        self.bones
            .iter()
            .map(|bone| BoneSnapshot {
                position: bone.position,
                rotation: bone.rotation,
            })
            .collect()
    }
}

/// Request a stun/ragdoll. Later requests supersede earlier ones: the
/// sequence restarts from Stunned with the new stun time.
#[derive(Event, Debug, Clone, Copy)]
pub struct RagdollRequest {
    pub entity: Entity,
    pub stun_time: f32,
}

/// Ragdoll sequence phases.
///
/// Dead actors stop at `Simulated` forever; everyone else blends back to
/// animation and stands up.
#[derive(Debug, Clone, Reflect)]
pub enum RagdollPhase {
    /// Stunned, waiting out the pre-ragdoll delay
    Stunned { remaining: f32 },
    /// Bones handed to physics for the stun time
    Simulated { remaining: f32 },
    /// Per-tick blend from the captured ragdoll end pose to the stand-up pose
    Blending {
        elapsed: f32,
        end_pose: Vec<BoneSnapshot>,
    },
    /// Recovery animation playing
    StandingUp { remaining: f32 },
}

/// In-flight ragdoll sequence.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct RagdollSequence {
    pub phase: RagdollPhase,
    pub stun_time: f32,
}

/// System: start (or restart) ragdoll sequences.
pub fn handle_ragdoll_requests(
    mut requests: EventReader<RagdollRequest>,
    mut actors: Query<&mut ActorState>,
    config: Res<SimulationConfig>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut able_changed: EventWriter<AbleChanged>,
) {
    for request in requests.read() {
        let Ok(mut state) = actors.get_mut(request.entity) else {
            continue;
        };

        // Dead actors keep their able state (terminal); the guard inside
        // change_able makes this a no-op for them
        change_able(request.entity, &mut state, AbleState::Incapacitated, &mut able_changed);
        change_action(request.entity, &mut state, CurrentAction::Stunned, &mut action_changed);

        // A ragdoll supersedes a basic hurt, and inserting over an existing
        // sequence restarts it from Stunned with the new stun time
        commands.entity(request.entity).remove::<HurtSequence>();
        commands.entity(request.entity).insert(RagdollSequence {
            phase: RagdollPhase::Stunned {
                remaining: config.pre_ragdoll_delay,
            },
            stun_time: request.stun_time,
        });

        crate::logger::log(&format!(
            "{:?} ragdoll requested (stun {:.2}s)",
            request.entity, request.stun_time
        ));
    }
}

/// System: mirror host physics poses into the skeleton while simulated.
pub fn apply_bone_pose_updates(
    mut updates: EventReader<BonePoseUpdate>,
    mut skeletons: Query<&mut Skeleton>,
) {
    for update in updates.read() {
        let Ok(mut skeleton) = skeletons.get_mut(update.entity) else {
            continue;
        };
        let Some(bone) = skeleton.bones.get_mut(update.bone) else {
            continue;
        };
        bone.position = update.position;
        bone.rotation = update.rotation;
    }
}

/// System: advance ragdoll sequences.
pub fn update_ragdoll_sequences(
    mut sequences: Query<(Entity, &mut RagdollSequence, &mut ActorState, &mut Skeleton)>,
    time: Res<Time<Fixed>>,
    config: Res<SimulationConfig>,
    mut commands: Commands,
    mut action_changed: EventWriter<ActionChanged>,
    mut able_changed: EventWriter<AbleChanged>,
    mut skeleton_commands: EventWriter<SkeletonCommand>,
    mut presentation: EventWriter<PresentationCommand>,
) {
    let delta = time.delta_secs();

    for (entity, mut sequence, mut state, mut skeleton) in sequences.iter_mut() {
        let stun_time = sequence.stun_time;

        match &mut sequence.phase {
            RagdollPhase::Stunned { remaining } => {
                *remaining -= delta;
                if *remaining > 0.0 {
                    continue;
                }
                change_action(entity, &mut state, CurrentAction::Ragdoll, &mut action_changed);
                skeleton_commands.write(SkeletonCommand::SetSimulated {
                    entity,
                    simulated: true,
                });
                sequence.phase = RagdollPhase::Simulated {
                    remaining: stun_time,
                };
            }

            RagdollPhase::Simulated { remaining } => {
                // Terminal for the dead: simulated forever, no recovery
                if state.able() == AbleState::Dead {
                    continue;
                }
                *remaining -= delta;
                if *remaining > 0.0 {
                    continue;
                }
                let end_pose = skeleton.capture();
                sequence.phase = RagdollPhase::Blending {
                    elapsed: 0.0,
                    end_pose,
                };
            }

            RagdollPhase::Blending { elapsed, end_pose } => {
                *elapsed += delta;
                let progress = (*elapsed / config.bone_blend_time).min(1.0);

                let skeleton = skeleton.as_mut();
                let stand_up_pose = &skeleton.stand_up_pose;
                for (index, (bone, snapshot)) in skeleton
                    .bones
                    .iter_mut()
                    .zip(end_pose.iter())
                    .enumerate()
                {
                    let target = &stand_up_pose[index];
                    bone.position = snapshot.position.lerp(target.position, progress);
                    bone.rotation = snapshot.rotation.slerp(target.rotation, progress);
                    skeleton_commands.write(SkeletonCommand::SetBonePose {
                        entity,
                        bone: index,
                        position: bone.position,
                        rotation: bone.rotation,
                    });
                }

                if progress >= 1.0 {
                    skeleton_commands.write(SkeletonCommand::SetSimulated {
                        entity,
                        simulated: false,
                    });
                    change_action(entity, &mut state, CurrentAction::StandingUp, &mut action_changed);
                    presentation.write(PresentationCommand::PlayClip {
                        entity,
                        clip: "stand_up".to_string(),
                    });
                    sequence.phase = RagdollPhase::StandingUp {
                        remaining: config.stand_up_time,
                    };
                }
            }

            RagdollPhase::StandingUp { remaining } => {
                *remaining -= delta;
                if *remaining > 0.0 {
                    continue;
                }
                change_able(entity, &mut state, AbleState::Normal, &mut able_changed);
                change_action(entity, &mut state, CurrentAction::Idle, &mut action_changed);
                commands.entity(entity).remove::<RagdollSequence>();
            }
        }
    }
}

pub struct RagdollPlugin;

impl Plugin for RagdollPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RagdollRequest>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bone_skeleton() -> Skeleton {
        Skeleton::new(
            vec![
                Bone {
                    name: "hips".into(),
                    position: Vec3::new(0.0, 0.2, 0.0),
                    rotation: Quat::from_rotation_x(1.0),
                },
                Bone {
                    name: "spine".into(),
                    position: Vec3::new(0.0, 0.5, 0.1),
                    rotation: Quat::IDENTITY,
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

    #[test]
    fn test_capture_matches_current_pose() {
        let skeleton = two_bone_skeleton();
        let captured = skeleton.capture();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].position, skeleton.bones[0].position);
        assert_eq!(captured[1].rotation, skeleton.bones[1].rotation);
    }

    #[test]
    fn test_blend_midpoint_and_endpoint() {
        let mut skeleton = two_bone_skeleton();
        let end_pose = skeleton.capture();

        // Halfway: positions are the midpoint
        let progress = 0.5;
        for (index, snapshot) in end_pose.iter().enumerate() {
            let target = skeleton.stand_up_pose[index];
            skeleton.bones[index].position = snapshot.position.lerp(target.position, progress);
        }
        assert!((skeleton.bones[0].position.y - 0.6).abs() < 1e-6);

        // Endpoint: exactly the stand-up pose
        for (index, snapshot) in end_pose.iter().enumerate() {
            let target = skeleton.stand_up_pose[index];
            skeleton.bones[index].position = snapshot.position.lerp(target.position, 1.0);
            skeleton.bones[index].rotation = snapshot.rotation.slerp(target.rotation, 1.0);
        }
        assert_eq!(skeleton.bones[0].position, skeleton.stand_up_pose[0].position);
        assert!(skeleton.bones[0]
            .rotation
            .angle_between(skeleton.stand_up_pose[0].rotation)
            .abs()
            < 1e-4);
    }
}
