/*!
Virtual characters: kinematic capsules moved by a character controller.

Gameplay drives a character through [`PhysicsInput`] commands. Commands only record
intent; the movement itself is resolved against the world during `step()`, where the
controller slides the capsule along whatever it touches and reports ground contact.

All state here is kernel space.
*/

use rapier3d::control::KinematicCharacterController;
use rapier3d::prelude::{ColliderHandle, InteractionGroups, RigidBodyHandle};
use shared::constants::{DEFAULT_JUMP_SPEED_MPS, TERMINAL_FALL_SPEED_MPS};
use shared::{
    CallerQuat, CallerVec3, KernelQuat, KernelVec3, to_kernel_coordinates, to_kernel_rotation,
};

use crate::key::WorldKey;

/// One command for one character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsInput {
    pub target: WorldKey,
    pub action: CharacterAction,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CharacterAction {
    /// Desired velocity (caller space). Replaces the previous locomotion command.
    Locomotion(CallerVec3),
    /// Velocity change applied on the next step (caller space). Accumulates.
    AddForce(CallerVec3),
    /// Facing. Characters do not rotate their collision capsule.
    Rotation(CallerQuat),
    Jump,
}

/// Per-character simulation state.
#[derive(Clone, Debug)]
pub struct CharacterState {
    pub(crate) body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub(crate) controller: KinematicCharacterController,
    pub(crate) groups: InteractionGroups,
    world_id: u32,
    height_standing: f32,
    radius_standing: f32,
    initial_position: KernelVec3,
    max_speed: f32,
    locomotion: KernelVec3,
    pending_forces: KernelVec3,
    vertical_speed: f32,
    rotation: KernelQuat,
    grounded: bool,
}

impl CharacterState {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        world_id: u32,
        body: RigidBodyHandle,
        collider: ColliderHandle,
        groups: InteractionGroups,
        half_height: f32,
        radius: f32,
        initial_position: KernelVec3,
        max_speed: f32,
    ) -> Self {
        Self {
            body,
            collider,
            controller: KinematicCharacterController::default(),
            groups,
            world_id,
            height_standing: 2.0 * half_height,
            radius_standing: radius,
            initial_position,
            max_speed,
            locomotion: KernelVec3::zeros(),
            pending_forces: KernelVec3::zeros(),
            vertical_speed: 0.0,
            rotation: KernelQuat::identity(),
            grounded: false,
        }
    }

    pub fn world_id(&self) -> u32 {
        self.world_id
    }

    /// Length of the cylindrical section.
    pub fn height_standing(&self) -> f32 {
        self.height_standing
    }

    pub fn radius_standing(&self) -> f32 {
        self.radius_standing
    }

    pub fn initial_position(&self) -> KernelVec3 {
        self.initial_position
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn rotation(&self) -> KernelQuat {
        self.rotation
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn vertical_speed(&self) -> f32 {
        self.vertical_speed
    }

    pub fn ingest(&mut self, action: CharacterAction) {
        match action {
            CharacterAction::Locomotion(v) => self.locomotion = to_kernel_coordinates(v),
            CharacterAction::AddForce(v) => {
                self.pending_forces.0 += to_kernel_coordinates(v).0;
            }
            CharacterAction::Rotation(q) => self.rotation = to_kernel_rotation(q),
            CharacterAction::Jump => {
                if self.grounded {
                    self.vertical_speed = self.vertical_speed.max(DEFAULT_JUMP_SPEED_MPS);
                    self.grounded = false;
                }
            }
        }
    }

    /// Translation the character wants this sub-step, before collision.
    ///
    /// Horizontal locomotion is capped at `max_speed`; accumulated forces bypass the cap
    /// and are consumed here.
    pub(crate) fn desired_translation(&mut self, dt: f32, gravity_y: f32) -> KernelVec3 {
        let mut planar = KernelVec3::new(self.locomotion.0.x, 0.0, self.locomotion.0.z).0;
        let speed = planar.norm();
        if speed > self.max_speed && speed > 0.0 {
            planar *= self.max_speed / speed;
        }

        let forces = std::mem::replace(&mut self.pending_forces, KernelVec3::zeros()).0;
        planar.x += forces.x;
        planar.z += forces.z;
        self.vertical_speed += forces.y;

        if !(self.grounded && self.vertical_speed <= 0.0) {
            self.vertical_speed =
                (self.vertical_speed + gravity_y * dt).max(TERMINAL_FALL_SPEED_MPS);
        }

        // Grounded characters still press down a little so the controller keeps them snapped.
        let vertical = if self.grounded && self.vertical_speed <= 0.0 {
            gravity_y * dt * dt
        } else {
            self.vertical_speed * dt
        };
        KernelVec3::new(planar.x * dt, vertical, planar.z * dt)
    }

    pub(crate) fn finish_move(&mut self, grounded: bool) {
        self.grounded = grounded;
        if grounded && self.vertical_speed < 0.0 {
            self.vertical_speed = 0.0;
        }
    }
}
