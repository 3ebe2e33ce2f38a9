//! First-person gallery walker: room/door geometry planning, sphere-vs-AABB
//! collision, pointer-look locomotion and a small column software renderer.

pub mod camera;
pub mod collision;
pub mod config;
pub mod controller;
pub mod geometry;
pub mod input;
pub mod present;
pub mod renderer;
pub mod world;

/// Smallest length or height a wall piece may have before it is dropped.
pub const EPSILON: f32 = 1e-3;
