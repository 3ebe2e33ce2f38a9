use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::EPSILON;
use crate::controller::ControllerConfig;
use crate::geometry::layout_colliders;
use crate::world::{Layout, LayoutError};

/// Whole-program configuration, stored as RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    pub layout: Layout,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("controller setting `{name}` must be positive, got {value}")]
    Controller { name: &'static str, value: f32 },
    #[error("pitch limit {0} must lie strictly between 0 and pi/2")]
    PitchLimit(f32),
    #[error("spawn point ({x}, {z}) overlaps wall geometry")]
    SpawnBlocked { x: f32, z: f32 },
    #[error("spawn point ({x}, {z}) is closer than {margin} to the world bounds")]
    SpawnNearBounds { x: f32, z: f32, margin: f32 },
}

impl GalleryConfig {
    pub fn with_layout(layout: Layout) -> Self {
        Self {
            controller: ControllerConfig::default(),
            layout,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&text)?;
        info!(
            path = %path.display(),
            rooms = config.layout.rooms.len(),
            doors = config.layout.doors.len(),
            "loaded gallery config"
        );
        Ok(config)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new().depth_limit(4);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Checks run once at load time. The per-frame path trusts the result.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;

        let c = &self.controller;
        for (name, value) in [
            ("move_speed", c.move_speed),
            ("mouse_sensitivity", c.mouse_sensitivity),
            ("eye_height", c.eye_height),
            ("player_radius", c.player_radius),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Controller { name, value });
            }
        }
        if !(c.pitch_limit > 0.0 && c.pitch_limit < FRAC_PI_2) {
            return Err(ConfigError::PitchLimit(c.pitch_limit));
        }

        let (x, z) = self.layout.spawn;
        let eye = Vec3::new(x, c.eye_height, z);
        if layout_colliders(&self.layout).blocks_sphere(eye, c.player_radius) {
            return Err(ConfigError::SpawnBlocked { x, z });
        }
        // every step clamps into the inset bounds, so the spawn must already be there
        let margin = c.player_radius + EPSILON;
        if let Some(b) = self.layout.world_bounds() {
            if b.clamp_inset(x, z, margin) != (x, z) {
                return Err(ConfigError::SpawnNearBounds { x, z, margin });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::LocomotionController;
    use crate::world::{WallSide, WorldBounds};

    const SMALL: &str = r#"
        (
            layout: (
                wall_thickness: 0.2,
                rooms: [
                    (x_min: -3.0, x_max: 3.0, z_min: -3.0, z_max: 3.0, y_max: 3.0),
                ],
                doors: [
                    (room: 0, side: North, center: 0.0, width: 1.5, height: 2.2),
                ],
                spawn: (0.0, 0.0),
            ),
        )
    "#;

    #[test]
    fn parses_minimal_file_with_defaults() {
        let config = GalleryConfig::from_ron_str(SMALL).unwrap();
        assert_eq!(config.controller, ControllerConfig::default());
        assert_eq!(config.layout.doors[0].side, WallSide::North);
        assert_eq!(config.layout.spawn_yaw, 0.0);
        assert!(config.layout.bounds.is_none());
    }

    #[test]
    fn partial_controller_section_keeps_other_defaults() {
        let text = SMALL.replacen("layout:", "controller: (move_speed: 6.0), layout:", 1);
        let config = GalleryConfig::from_ron_str(&text).unwrap();
        assert_eq!(config.controller.move_speed, 6.0);
        assert_eq!(config.controller.eye_height, 1.6);
    }

    #[test]
    fn presets_spawn_clear_of_walls() {
        for layout in [Layout::single_hall(), Layout::three_rooms()] {
            GalleryConfig::with_layout(layout).validate().unwrap();
        }
    }

    #[test]
    fn written_config_reads_back() {
        let config = GalleryConfig::with_layout(Layout::three_rooms());
        let text = config.to_ron_string().unwrap();
        assert_eq!(GalleryConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_bad_controller_values() {
        let mut config = GalleryConfig::with_layout(Layout::single_hall());
        config.controller.player_radius = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Controller {
                name: "player_radius",
                ..
            })
        ));

        let mut config = GalleryConfig::with_layout(Layout::single_hall());
        config.controller.pitch_limit = 2.0;
        assert!(matches!(config.validate(), Err(ConfigError::PitchLimit(_))));
    }

    #[test]
    fn rejects_spawn_inside_a_wall() {
        let mut config = GalleryConfig::with_layout(Layout::single_hall());
        // right against the east wall at x = 5
        config.layout.spawn = (4.9, 0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnBlocked { .. })
        ));
    }

    #[test]
    fn rejects_spawn_inside_the_bounds_margin() {
        let mut layout = Layout::single_hall();
        layout.bounds = Some(WorldBounds {
            x_min: -1.0,
            x_max: 1.0,
            z_min: -14.0,
            z_max: 4.0,
        });
        layout.spawn = (0.95, 0.0);
        let config = GalleryConfig::with_layout(layout.clone());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnNearBounds { x, .. }) if x == 0.95
        ));

        // an accepted spawn stays put on idle frames
        layout.spawn = (0.5, 0.0);
        let config = GalleryConfig::with_layout(layout);
        config.validate().unwrap();
        let mut c = LocomotionController::from_layout(config.controller, &config.layout);
        c.set_pointer_captured(true);
        let before = *c.pose();
        for _ in 0..10 {
            c.step(1.0 / 60.0);
        }
        assert_eq!(*c.pose(), before);
    }

    #[test]
    fn syntax_errors_surface_as_parse_errors() {
        assert!(matches!(
            GalleryConfig::from_ron_str("(layout: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn layout_errors_are_wrapped() {
        let text = SMALL.replace("room: 0", "room: 7");
        assert!(matches!(
            GalleryConfig::from_ron_str(&text),
            Err(ConfigError::Layout(LayoutError::UnknownRoom { .. }))
        ));
    }
}
