use glam::Vec3;

/// Axis-aligned box collider in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// `true` when every axis has strictly positive extent.
    pub fn is_solid(&self) -> bool {
        self.min.cmplt(self.max).all()
    }

    #[inline]
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    /// Sphere overlap, inclusive: touching at exactly `radius` counts.
    #[inline]
    pub fn overlaps_sphere(&self, center: Vec3, radius: f32) -> bool {
        let d = center - self.closest_point(center);
        d.length_squared() <= radius * radius
    }
}

/// Immutable set of static colliders, tested linearly.
#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    boxes: Vec<Aabb>,
}

impl ColliderSet {
    pub fn new(boxes: Vec<Aabb>) -> Self {
        Self { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// `true` if a sphere at `center` touches any collider.
    pub fn blocks_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.boxes.iter().any(|b| b.overlaps_sphere(center, radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn center_inside_overlaps() {
        assert!(unit_box().overlaps_sphere(Vec3::splat(0.5), 0.01));
    }

    #[test]
    fn far_sphere_misses() {
        let b = unit_box();
        assert!(!b.overlaps_sphere(Vec3::new(3.0, 0.5, 0.5), 1.0));
        // corner region: nearest point is the corner, distance sqrt(2)
        assert!(!b.overlaps_sphere(Vec3::new(2.0, 0.5, 2.0), 1.4));
    }

    #[test]
    fn touching_is_inclusive() {
        let b = unit_box();
        assert!(b.overlaps_sphere(Vec3::new(1.5, 0.5, 0.5), 0.5));
        assert!(b.overlaps_sphere(Vec3::new(0.5, 0.5, -0.25), 0.25));
    }

    #[test]
    fn empty_set_never_blocks() {
        let set = ColliderSet::default();
        assert!(set.is_empty());
        assert!(!set.blocks_sphere(Vec3::ZERO, 100.0));
    }

    #[test]
    fn set_blocks_when_any_box_hits() {
        let set = ColliderSet::new(vec![
            Aabb::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(11.0, 1.0, 1.0)),
            unit_box(),
        ]);
        assert!(set.blocks_sphere(Vec3::new(0.5, 0.5, 1.2), 0.3));
        assert!(!set.blocks_sphere(Vec3::new(5.0, 0.5, 0.5), 0.3));
    }

    #[test]
    fn solid_needs_positive_extent() {
        assert!(unit_box().is_solid());
        assert!(!Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)).is_solid());
    }
}
