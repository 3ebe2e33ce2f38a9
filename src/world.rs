use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Horizontal room footprint plus ceiling height. The floor sits at y = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomRect {
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_max: f32,
    pub y_max: f32,
}

impl RoomRect {
    pub fn is_valid(&self) -> bool {
        self.x_min < self.x_max && self.z_min < self.z_max && self.y_max > 0.0
    }

    /// Extent of `side` along its running axis.
    pub fn wall_span(&self, side: WallSide) -> (f32, f32) {
        if side.runs_along_x() {
            (self.x_min, self.x_max)
        } else {
            (self.z_min, self.z_max)
        }
    }

    /// Coordinate of the inner face of `side` on the axis it is perpendicular to.
    pub fn wall_plane(&self, side: WallSide) -> f32 {
        match side {
            WallSide::North => self.z_min,
            WallSide::South => self.z_max,
            WallSide::West => self.x_min,
            WallSide::East => self.x_max,
        }
    }
}

/// Which wall of a room. North faces the player at yaw 0 (looking down -Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallSide {
    /// z = z_min, runs along X
    North,
    /// z = z_max, runs along X
    South,
    /// x = x_min, runs along Z
    West,
    /// x = x_max, runs along Z
    East,
}

impl WallSide {
    pub const ALL: [WallSide; 4] = [
        WallSide::North,
        WallSide::South,
        WallSide::West,
        WallSide::East,
    ];

    #[inline]
    pub fn runs_along_x(self) -> bool {
        matches!(self, WallSide::North | WallSide::South)
    }

    pub fn opposite(self) -> WallSide {
        match self {
            WallSide::North => WallSide::South,
            WallSide::South => WallSide::North,
            WallSide::West => WallSide::East,
            WallSide::East => WallSide::West,
        }
    }

    /// +1 when the outside of the room lies towards increasing coordinates.
    #[inline]
    pub fn outward_sign(self) -> f32 {
        match self {
            WallSide::North | WallSide::West => -1.0,
            WallSide::South | WallSide::East => 1.0,
        }
    }
}

/// Opening cut into one wall of one room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorSpec {
    pub room: usize,
    pub side: WallSide,
    /// Absolute world coordinate along the wall's running axis.
    pub center: f32,
    pub width: f32,
    pub height: f32,
}

impl DoorSpec {
    #[inline]
    pub fn span(&self) -> (f32, f32) {
        let half = 0.5 * self.width;
        (self.center - half, self.center + half)
    }
}

/// Outer XZ limits the player can never leave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl WorldBounds {
    /// Union of all room footprints, `None` for an empty room list.
    pub fn from_rooms(rooms: &[RoomRect]) -> Option<Self> {
        let first = rooms.first()?;
        let mut b = WorldBounds {
            x_min: first.x_min,
            x_max: first.x_max,
            z_min: first.z_min,
            z_max: first.z_max,
        };
        for r in &rooms[1..] {
            b.x_min = b.x_min.min(r.x_min);
            b.x_max = b.x_max.max(r.x_max);
            b.z_min = b.z_min.min(r.z_min);
            b.z_max = b.z_max.max(r.z_max);
        }
        Some(b)
    }

    pub fn unbounded() -> Self {
        WorldBounds {
            x_min: f32::NEG_INFINITY,
            x_max: f32::INFINITY,
            z_min: f32::NEG_INFINITY,
            z_max: f32::INFINITY,
        }
    }

    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.x_min && x <= self.x_max && z >= self.z_min && z <= self.z_max
    }

    /// Clamp `(x, z)` into the bounds shrunk by `margin` on every side.
    pub fn clamp_inset(&self, x: f32, z: f32, margin: f32) -> (f32, f32) {
        (
            clamp_axis(x, self.x_min + margin, self.x_max - margin),
            clamp_axis(z, self.z_min + margin, self.z_max - margin),
        )
    }
}

// Bounds narrower than twice the margin collapse onto their midpoint.
#[inline]
fn clamp_axis(v: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi { 0.5 * (lo + hi) } else { v.clamp(lo, hi) }
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("layout has no rooms")]
    NoRooms,
    #[error("room {index} is degenerate (needs x_min < x_max, z_min < z_max, y_max > 0)")]
    InvalidRoom { index: usize },
    #[error("wall thickness must be positive, got {0}")]
    WallThickness(f32),
    #[error("door {door} references room {room}, which does not exist")]
    UnknownRoom { door: usize, room: usize },
    #[error("door {door} has a negative or non-finite width/height")]
    DoorExtent { door: usize },
    #[error("spawn point ({x}, {z}) lies outside the world bounds")]
    SpawnOutsideBounds { x: f32, z: f32 },
}

/// Everything needed to build a gallery: rooms, the doors cut into them,
/// where the player starts and how far they may roam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub wall_thickness: f32,
    pub rooms: Vec<RoomRect>,
    #[serde(default)]
    pub doors: Vec<DoorSpec>,
    /// Spawn position on the XZ plane.
    pub spawn: (f32, f32),
    #[serde(default)]
    pub spawn_yaw: f32,
    /// Overrides the union of the room footprints.
    #[serde(default)]
    pub bounds: Option<WorldBounds>,
}

impl Layout {
    /// One long hall, no doors.
    pub fn single_hall() -> Self {
        Layout {
            wall_thickness: 0.25,
            rooms: vec![RoomRect {
                x_min: -5.0,
                x_max: 5.0,
                z_min: -14.0,
                z_max: 4.0,
                y_max: 4.5,
            }],
            doors: Vec::new(),
            spawn: (0.0, 2.0),
            spawn_yaw: 0.0,
            bounds: None,
        }
    }

    /// Central hall with a side gallery through a doorway on each flank.
    pub fn three_rooms() -> Self {
        let t = 0.25;
        let hall = RoomRect {
            x_min: -6.0,
            x_max: 6.0,
            z_min: -10.0,
            z_max: 4.0,
            y_max: 4.0,
        };
        // side rooms sit one double wall away so their slabs abut the hall's
        let west = RoomRect {
            x_min: -16.0 - 2.0 * t,
            x_max: -6.0 - 2.0 * t,
            z_min: -8.0,
            z_max: 2.0,
            y_max: 3.5,
        };
        let east = RoomRect {
            x_min: 6.0 + 2.0 * t,
            x_max: 16.0 + 2.0 * t,
            z_min: -8.0,
            z_max: 2.0,
            y_max: 3.5,
        };

        let mut layout = Layout {
            wall_thickness: t,
            rooms: vec![hall, west, east],
            doors: Vec::new(),
            spawn: (0.0, 2.0),
            spawn_yaw: 0.0,
            bounds: None,
        };
        layout.connect(0, WallSide::West, 1, -3.0, 2.0, 2.6);
        layout.connect(0, WallSide::East, 2, -3.0, 2.0, 2.6);
        layout
    }

    /// Cut a shared doorway: the door goes into `side` of room `a` and the
    /// facing wall of room `b`.
    pub fn connect(
        &mut self,
        a: usize,
        side: WallSide,
        b: usize,
        center: f32,
        width: f32,
        height: f32,
    ) -> &mut Self {
        self.doors.push(DoorSpec {
            room: a,
            side,
            center,
            width,
            height,
        });
        self.doors.push(DoorSpec {
            room: b,
            side: side.opposite(),
            center,
            width,
            height,
        });
        self
    }

    pub fn world_bounds(&self) -> Option<WorldBounds> {
        self.bounds.or_else(|| WorldBounds::from_rooms(&self.rooms))
    }

    /// Structural checks. Degenerate doors (too wide, too tall) are fine:
    /// the planner drops the pieces they eat.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.rooms.is_empty() {
            return Err(LayoutError::NoRooms);
        }
        if !(self.wall_thickness > 0.0) {
            return Err(LayoutError::WallThickness(self.wall_thickness));
        }
        if let Some(index) = self.rooms.iter().position(|r| !r.is_valid()) {
            return Err(LayoutError::InvalidRoom { index });
        }
        for (i, door) in self.doors.iter().enumerate() {
            if door.room >= self.rooms.len() {
                return Err(LayoutError::UnknownRoom {
                    door: i,
                    room: door.room,
                });
            }
            let ok = door.width.is_finite()
                && door.height.is_finite()
                && door.center.is_finite()
                && door.width >= 0.0
                && door.height >= 0.0;
            if !ok {
                return Err(LayoutError::DoorExtent { door: i });
            }
        }
        let (x, z) = self.spawn;
        match self.world_bounds() {
            Some(b) if b.contains(x, z) => Ok(()),
            _ => Err(LayoutError::SpawnOutsideBounds { x, z }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(Layout::single_hall().validate(), Ok(()));
        assert_eq!(Layout::three_rooms().validate(), Ok(()));
    }

    #[test]
    fn connect_cuts_both_rooms() {
        let layout = Layout::three_rooms();
        assert_eq!(layout.doors.len(), 4);
        assert_eq!(layout.doors[0].side, WallSide::West);
        assert_eq!(layout.doors[1].side, WallSide::East);
        assert_eq!(layout.doors[1].room, 1);
    }

    #[test]
    fn bounds_cover_all_rooms() {
        let b = Layout::three_rooms().world_bounds().unwrap();
        assert_eq!(b.x_min, -16.5);
        assert_eq!(b.x_max, 16.5);
        assert_eq!(b.z_min, -10.0);
        assert_eq!(b.z_max, 4.0);
    }

    #[test]
    fn clamp_inset_collapses_narrow_bounds() {
        let b = WorldBounds {
            x_min: 0.0,
            x_max: 0.5,
            z_min: -10.0,
            z_max: 10.0,
        };
        let (x, z) = b.clamp_inset(3.0, 20.0, 1.0);
        assert_eq!(x, 0.25);
        assert_eq!(z, 9.0);
    }

    #[test]
    fn validate_rejects_bad_input() {
        let mut layout = Layout::single_hall();
        layout.wall_thickness = 0.0;
        assert_eq!(layout.validate(), Err(LayoutError::WallThickness(0.0)));

        let mut layout = Layout::single_hall();
        layout.rooms[0].y_max = -1.0;
        assert_eq!(layout.validate(), Err(LayoutError::InvalidRoom { index: 0 }));

        let mut layout = Layout::single_hall();
        layout.doors.push(DoorSpec {
            room: 3,
            side: WallSide::North,
            center: 0.0,
            width: 1.0,
            height: 2.0,
        });
        assert_eq!(
            layout.validate(),
            Err(LayoutError::UnknownRoom { door: 0, room: 3 })
        );

        let mut layout = Layout::single_hall();
        layout.spawn = (50.0, 0.0);
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::SpawnOutsideBounds { .. })
        ));
    }
}
