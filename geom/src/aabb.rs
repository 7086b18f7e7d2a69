use glam::Vec3;

/// An axis-aligned bounding box, shared by [`crate`]'s callers: brushes,
/// tree nodes/leaves, and portals all need the same tight-bound-of-a-
/// union-of-windings primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        mins: Vec3::splat(f32::INFINITY),
        maxs: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.encapsulate(p);
        }
        aabb
    }

    pub fn encapsulate(&mut self, p: Vec3) {
        self.mins = self.mins.min(p);
        self.maxs = self.maxs.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            mins: self.mins.min(other.mins),
            maxs: self.maxs.max(other.maxs),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mins.x > self.maxs.x || self.mins.y > self.maxs.y || self.mins.z > self.maxs.z
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        !(self.maxs.x < other.mins.x
            || self.mins.x > other.maxs.x
            || self.maxs.y < other.mins.y
            || self.mins.y > other.maxs.y
            || self.maxs.z < other.mins.z
            || self.mins.z > other.maxs.z)
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.mins.x
            && p.x <= self.maxs.x
            && p.y >= self.mins.y
            && p.y <= self.maxs.y
            && p.z >= self.mins.z
            && p.z <= self.maxs.z
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.maxs - self.mins) * 0.5
    }

    /// Sum of squared half-extents, used by the splitter-choice
    /// "spatial distribution" scoring metric.
    pub fn squared_half_extent_sum(&self) -> f32 {
        let h = self.half_extents();
        h.x * h.x + h.y * h.y + h.z * h.z
    }

    pub fn longest_axis_extent(&self) -> f32 {
        let size = self.maxs - self.mins;
        size.x.max(size.y).max(size.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_boxes_do_not_intersect() {
        let a = Aabb::from_points([Vec3::ZERO, Vec3::splat(1.0)]);
        let b = Aabb::from_points([Vec3::splat(10.0), Vec3::splat(11.0)]);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::from_points([Vec3::ZERO, Vec3::splat(1.0)]);
        let b = Aabb::from_points([Vec3::splat(1.0), Vec3::splat(2.0)]);
        assert!(a.intersects(&b));
    }
}
