//! Wall decomposition: every room wall becomes solid pieces around its door
//! gaps, and every piece becomes one collider and one render panel.

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::EPSILON;
use crate::collision::{Aabb, ColliderSet};
use crate::world::{DoorSpec, Layout, RoomRect, WallSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    /// Whole wall, no door.
    Full,
    /// Full-height segment beside a door.
    Jamb,
    /// Segment above a door, up to the ceiling.
    Lintel,
}

/// Solid part of one room wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallPiece {
    pub room: usize,
    pub side: WallSide,
    pub kind: PieceKind,
    /// Extent along the wall's running axis.
    pub along: (f32, f32),
    /// Vertical extent.
    pub y: (f32, f32),
}

/// Renderable wall piece on the room's inner face, in XZ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallPanel {
    pub start: Vec2,
    pub end: Vec2,
    pub bottom: f32,
    pub top: f32,
    pub side: WallSide,
}

/// Split every wall of every room into solid pieces, leaving door gaps open.
pub fn plan_walls(rooms: &[RoomRect], doors: &[DoorSpec]) -> Vec<WallPiece> {
    let mut pieces = Vec::with_capacity(rooms.len() * 4 + doors.len() * 2);

    for (ri, room) in rooms.iter().enumerate() {
        for side in WallSide::ALL {
            let (start, end) = room.wall_span(side);
            let piece = |kind, along, y| WallPiece {
                room: ri,
                side,
                kind,
                along,
                y,
            };

            let mut gaps: Vec<(f32, f32, f32)> = doors
                .iter()
                .filter(|d| d.room == ri && d.side == side)
                .map(|d| {
                    let (lo, hi) = d.span();
                    (lo, hi, d.height)
                })
                .collect();

            if gaps.is_empty() {
                pieces.push(piece(PieceKind::Full, (start, end), (0.0, room.y_max)));
                continue;
            }
            gaps.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut cursor = start;
            for (gap_lo, gap_hi, height) in gaps {
                let jamb_end = gap_lo.min(end);
                if jamb_end - cursor > EPSILON {
                    pieces.push(piece(PieceKind::Jamb, (cursor, jamb_end), (0.0, room.y_max)));
                }

                let lo = gap_lo.max(start);
                let hi = gap_hi.min(end);
                let bottom = height.max(0.0);
                if hi - lo > EPSILON && room.y_max - bottom > EPSILON {
                    pieces.push(piece(PieceKind::Lintel, (lo, hi), (bottom, room.y_max)));
                }

                cursor = cursor.max(gap_hi);
            }
            if end - cursor > EPSILON {
                pieces.push(piece(PieceKind::Jamb, (cursor, end), (0.0, room.y_max)));
            }
        }
    }

    pieces
}

/// Slab of thickness `wall_thickness` just outside the room behind `piece`.
pub fn piece_collider(piece: &WallPiece, room: &RoomRect, wall_thickness: f32) -> Aabb {
    let plane = room.wall_plane(piece.side);
    let (p0, p1) = if piece.side.outward_sign() < 0.0 {
        (plane - wall_thickness, plane)
    } else {
        (plane, plane + wall_thickness)
    };
    let (a0, a1) = piece.along;
    let (y0, y1) = piece.y;

    if piece.side.runs_along_x() {
        Aabb::new(Vec3::new(a0, y0, p0), Vec3::new(a1, y1, p1))
    } else {
        Aabb::new(Vec3::new(p0, y0, a0), Vec3::new(p1, y1, a1))
    }
}

pub fn piece_panel(piece: &WallPiece, room: &RoomRect) -> WallPanel {
    let plane = room.wall_plane(piece.side);
    let (a0, a1) = piece.along;
    let (start, end) = if piece.side.runs_along_x() {
        (Vec2::new(a0, plane), Vec2::new(a1, plane))
    } else {
        (Vec2::new(plane, a0), Vec2::new(plane, a1))
    };
    WallPanel {
        start,
        end,
        bottom: piece.y.0,
        top: piece.y.1,
        side: piece.side,
    }
}

/// Colliders for every solid wall piece. Order carries no meaning.
pub fn build_colliders(rooms: &[RoomRect], doors: &[DoorSpec], wall_thickness: f32) -> Vec<Aabb> {
    let colliders: Vec<Aabb> = plan_walls(rooms, doors)
        .iter()
        .map(|p| piece_collider(p, &rooms[p.room], wall_thickness))
        .filter(Aabb::is_solid)
        .collect();
    debug!(
        rooms = rooms.len(),
        doors = doors.len(),
        colliders = colliders.len(),
        "built wall colliders"
    );
    colliders
}

pub fn build_panels(rooms: &[RoomRect], doors: &[DoorSpec]) -> Vec<WallPanel> {
    plan_walls(rooms, doors)
        .iter()
        .map(|p| piece_panel(p, &rooms[p.room]))
        .collect()
}

pub fn layout_colliders(layout: &Layout) -> ColliderSet {
    ColliderSet::new(build_colliders(
        &layout.rooms,
        &layout.doors,
        layout.wall_thickness,
    ))
}

pub fn layout_panels(layout: &Layout) -> Vec<WallPanel> {
    build_panels(&layout.rooms, &layout.doors)
}
