use glam::Vec2;

use crate::controller::PlayerPose;

pub struct Camera {
    pub pos: Vec2,   // (x, z) position in world space
    pub yaw: f32,    // radians, 0 looks down -Z
    pub pitch: f32,  // radians, positive looks up
    pub eye_y: f32,  // camera height above the floor
    pub fx: f32,     // horizontal focal factor
    pub fy: f32,     // vertical focal factor
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            eye_y: 0.0,
            fx: 1.0,
            fy: 1.0,
        }
    }
}

impl Camera {
    pub fn sync_pose(&mut self, pose: &PlayerPose) {
        self.pos = Vec2::new(pose.position.x, pose.position.z);
        self.eye_y = pose.position.y;
        self.yaw = pose.yaw;
        self.pitch = pose.pitch;
    }

    /// World XZ point to (lateral, depth) camera space. Positive lateral is to
    /// the right, positive depth is in front.
    #[inline]
    pub fn world_to_camera(&self, p: Vec2) -> [f32; 2] {
        let d = p - self.pos;
        let (s, c) = self.yaw.sin_cos();
        // right = (cos, -sin), forward = (-sin, -cos)
        let cx = d.x * c - d.y * s;
        let cy = -d.x * s - d.y * c;
        [cx, cy]
    }

    #[inline]
    pub fn project_x(&self, cx: f32, cy: f32, screen_width: f32) -> f32 {
        let cx0 = 0.5 * screen_width;
        self.fx * (cx / cy) + cx0
    }

    pub fn set_fov_from_horizontal(&mut self, width: f32, height: f32, fov_x_deg: f32) {
        let fov_x = fov_x_deg.to_radians();
        self.fx = 0.5 * width / (0.5 * fov_x).tan();
        let aspect = width / height;
        self.fy = self.fx / aspect;
    }

    /// Screen row of the horizon, sheared by pitch.
    #[inline]
    pub fn screen_center_y(&self, screen_h: f32) -> f32 {
        0.5 * screen_h + self.fy * self.pitch.tan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn default_yaw_looks_down_negative_z() {
        let cam = Camera::default();
        let [cx, cy] = cam.world_to_camera(Vec2::new(1.0, -5.0));
        assert_abs_diff_eq!(cx, 1.0);
        assert_abs_diff_eq!(cy, 5.0);
    }

    #[test]
    fn follows_the_controller_pose() {
        let mut cam = Camera::default();
        cam.sync_pose(&PlayerPose {
            position: Vec3::new(2.0, 1.6, 3.0),
            yaw: -FRAC_PI_2,
            pitch: 0.0,
        });
        // facing +X now; a point further along +X is straight ahead
        let [cx, cy] = cam.world_to_camera(Vec2::new(7.0, 3.0));
        assert_abs_diff_eq!(cx, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(cy, 5.0, epsilon = 1e-5);
        assert_eq!(cam.eye_y, 1.6);
    }

    #[test]
    fn looking_up_lowers_the_horizon() {
        let mut cam = Camera::default();
        cam.set_fov_from_horizontal(640.0, 480.0, 90.0);
        let level = cam.screen_center_y(480.0);
        cam.pitch = 0.3;
        assert!(cam.screen_center_y(480.0) > level);
    }
}
