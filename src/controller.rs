//! First-person locomotion: pointer look, WASD movement and per-axis sliding
//! collision against the static wall colliders.
//!
//! Collision tests the candidate position only. There is no sub-stepping, so
//! a large enough `dt * move_speed` can carry the player sphere across a wall
//! thinner than the step.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::EPSILON;
use crate::collision::ColliderSet;
use crate::geometry::layout_colliders;
use crate::input::InputState;
use crate::world::{Layout, WorldBounds};

/// Tunables for look and movement. Distances in meters, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Meters per second.
    pub move_speed: f32,
    /// Radians per pointer unit.
    pub mouse_sensitivity: f32,
    pub eye_height: f32,
    pub player_radius: f32,
    pub pitch_limit: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.5,
            mouse_sensitivity: 0.0022,
            eye_height: 1.6,
            player_radius: 0.35,
            pitch_limit: FRAC_PI_2 - 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Pointer captured and controller enabled: look and move.
    Locked,
    /// Input ignored.
    Unlocked,
}

/// Camera pose produced every frame. Yaw 0 looks down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl PlayerPose {
    pub fn look_dir(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(-sy * cp, sp, -cy * cp)
    }

    /// Forward and right unit vectors on the ground plane.
    pub fn ground_basis(&self) -> (Vec3, Vec3) {
        let look = self.look_dir();
        let forward = Vec3::new(look.x, 0.0, look.z)
            .try_normalize()
            .unwrap_or_else(|| Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos()));
        let right = forward.cross(Vec3::Y).normalize();
        (forward, right)
    }
}

pub struct LocomotionController {
    config: ControllerConfig,
    colliders: ColliderSet,
    bounds: WorldBounds,
    pose: PlayerPose,
    input: InputState,
    enabled: bool,
    pointer_captured: bool,
}

impl LocomotionController {
    /// `spawn` is an XZ position that must be clear of every collider; it is
    /// not checked here. The controller starts enabled.
    pub fn new(
        config: ControllerConfig,
        colliders: ColliderSet,
        bounds: WorldBounds,
        spawn: Vec2,
        spawn_yaw: f32,
    ) -> Self {
        Self {
            config,
            colliders,
            bounds,
            pose: PlayerPose {
                position: Vec3::new(spawn.x, config.eye_height, spawn.y),
                yaw: spawn_yaw,
                pitch: 0.0,
            },
            input: InputState::default(),
            enabled: true,
            pointer_captured: false,
        }
    }

    pub fn from_layout(config: ControllerConfig, layout: &Layout) -> Self {
        let bounds = layout.world_bounds().unwrap_or_else(WorldBounds::unbounded);
        let (x, z) = layout.spawn;
        Self::new(
            config,
            layout_colliders(layout),
            bounds,
            Vec2::new(x, z),
            layout.spawn_yaw,
        )
    }

    /// Initial value of the enabled flag, e.g. `false` behind an intro screen.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn mode(&self) -> Mode {
        if self.enabled && self.pointer_captured {
            Mode::Locked
        } else {
            Mode::Unlocked
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggled by the host, e.g. while an overlay covers the scene.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!(enabled, "controller enabled changed");
        }
        self.enabled = enabled;
    }

    /// Reported by the host whenever the pointer grab is gained or lost.
    pub fn set_pointer_captured(&mut self, captured: bool) {
        if self.pointer_captured != captured {
            debug!(captured, "pointer capture changed");
        }
        self.pointer_captured = captured;
    }

    /// Whether a click should ask the host for pointer capture.
    pub fn wants_capture(&self) -> bool {
        self.enabled && !self.pointer_captured
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn pose(&self) -> &PlayerPose {
        &self.pose
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    /// Advance one frame. A no-op while unlocked, except that pointer motion
    /// gathered in the meantime is dropped.
    pub fn step(&mut self, dt: f32) -> &PlayerPose {
        let look = self.input.take_pointer_delta();
        if self.mode() == Mode::Unlocked {
            return &self.pose;
        }

        self.apply_look(look);

        let (fwd, strafe) = self.input.move_axes();
        let (forward, right) = self.pose.ground_basis();
        let wish = (forward * fwd + right * strafe).normalize_or_zero();
        let displacement = wish * (self.config.move_speed * dt.max(0.0));

        self.slide(displacement.x, displacement.z);
        &self.pose
    }

    fn apply_look(&mut self, delta: Vec2) {
        let s = self.config.mouse_sensitivity;
        let limit = self.config.pitch_limit;
        self.pose.yaw -= delta.x * s;
        self.pose.pitch = (self.pose.pitch - delta.y * s).clamp(-limit, limit);
    }

    /// Apply X then Z independently, each only if the player sphere stays
    /// clear, then clamp into the inset world bounds.
    fn slide(&mut self, dx: f32, dz: f32) {
        let eye = self.config.eye_height;
        let radius = self.config.player_radius;
        let mut pos = Vec3::new(self.pose.position.x, eye, self.pose.position.z);

        if dx != 0.0 {
            let candidate = Vec3::new(pos.x + dx, eye, pos.z);
            if !self.colliders.blocks_sphere(candidate, radius) {
                pos.x = candidate.x;
            }
        }
        if dz != 0.0 {
            let candidate = Vec3::new(pos.x, eye, pos.z + dz);
            if !self.colliders.blocks_sphere(candidate, radius) {
                pos.z = candidate.z;
            }
        }

        let (x, z) = self.bounds.clamp_inset(pos.x, pos.z, radius + EPSILON);
        self.pose.position = Vec3::new(x, eye, z);
    }
}
