use glam::Vec3;

use crate::epsilon::ON_EPSILON;
use crate::plane::{Plane, Side};

/// An ordered, convex, coplanar polygon. Empty windings (produced by a
/// clip that fully discards the input) are represented as `points:
/// vec![]` rather than `Option<Winding>`, since downstream code (CSG,
/// FaceBuilder) routinely treats "clipped away" as a first-class, cheap
/// case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Winding {
    pub points: Vec<Vec3>,
}

impl Winding {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Builds a large square winding lying on `plane`, centered at
    /// `extent * plane.normal` projected back onto the plane, per
    /// spec.md §4.1's `BaseWindingForPlane`.
    pub fn base_for_plane(plane: &Plane, extent: f32) -> Self {
        // Pick the axis furthest from the normal as a temporary "up" to
        // avoid a degenerate cross product, then orthonormalize.
        let normal = plane.normal;

        // Start from the axis least aligned with the normal, then
        // orthonormalize against it.
        let ax = normal.x.abs();
        let ay = normal.y.abs();
        let az = normal.z.abs();
        let up = if ax <= ay && ax <= az {
            Vec3::X
        } else if ay <= ax && ay <= az {
            Vec3::Y
        } else {
            Vec3::Z
        };

        let up = (up - normal * up.dot(normal)).normalize();
        let right = normal.cross(up);

        let org = normal * plane.dist;
        let side = extent * 2.0f32.sqrt() * 8.0; // generous overshoot, doubled on demand

        let p0 = org - right * side + up * side;
        let p1 = org + right * side + up * side;
        let p2 = org + right * side - up * side;
        let p3 = org - right * side - up * side;

        Self::new(vec![p0, p1, p2, p3])
    }

    /// Splits `self` against `plane`, returning `(front, back)`. Points
    /// within `ON_EPSILON` are emitted into both sub-windings (they are
    /// not split). Coordinates snapped onto an axial plane are rounded
    /// exactly to `plane.dist` to avoid accumulating drift across many
    /// clips, per spec.md §4.1's "round-off policy".
    pub fn clip(&self, plane: &Plane, epsilon: f32) -> (Winding, Winding) {
        if self.is_empty() {
            return (Winding::default(), Winding::default());
        }

        let n = self.points.len();
        let dists: Vec<f32> = self.points.iter().map(|p| plane.distance_to(*p)).collect();
        let sides: Vec<Side> = dists
            .iter()
            .map(|&d| {
                if d > epsilon {
                    Side::Front
                } else if d < -epsilon {
                    Side::Back
                } else {
                    Side::On
                }
            })
            .collect();

        let mut front = Vec::with_capacity(n + 4);
        let mut back = Vec::with_capacity(n + 4);

        for i in 0..n {
            let cur = self.points[i];
            match sides[i] {
                Side::On => {
                    front.push(cur);
                    back.push(cur);
                    continue;
                }
                Side::Front => front.push(cur),
                Side::Back => back.push(cur),
            }

            let next_side = sides[(i + 1) % n];
            if next_side == Side::On || next_side == sides[i] {
                continue;
            }

            // Edge crosses the plane: generate the split vertex.
            let next = self.points[(i + 1) % n];
            let t = dists[i] / (dists[i] - dists[(i + 1) % n]);
            let mut mid = cur + (next - cur) * t;

            snap_onto_axial_plane(&mut mid, plane);

            front.push(mid);
            back.push(mid);
        }

        (Winding::new(front), Winding::new(back))
    }

    /// Clips `self` so only the fragment in front of `plane` survives.
    pub fn clip_front(&self, plane: &Plane, epsilon: f32) -> Winding {
        self.clip(plane, epsilon).0
    }

    /// Clips `self` so only the fragment behind `plane` survives.
    pub fn clip_back(&self, plane: &Plane, epsilon: f32) -> Winding {
        self.clip(plane, epsilon).1
    }

    pub fn flip(&self) -> Winding {
        let mut points = self.points.clone();
        points.reverse();
        Winding::new(points)
    }

    pub fn area(&self) -> f32 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut total = Vec3::ZERO;
        for i in 1..self.points.len() - 1 {
            let a = self.points[i] - self.points[0];
            let b = self.points[i + 1] - self.points[0];
            total += a.cross(b);
        }
        total.length() * 0.5
    }

    pub fn centroid(&self) -> Vec3 {
        if self.points.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = self.points.iter().copied().sum();
        sum / self.points.len() as f32
    }

    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut mins = Vec3::splat(f32::INFINITY);
        let mut maxs = Vec3::splat(f32::NEG_INFINITY);
        for &p in &self.points {
            mins = mins.min(p);
            maxs = maxs.max(p);
        }
        (mins, maxs)
    }

    /// Radius of the winding's bounding sphere around its centroid,
    /// used by PVS's quick-reject tests (spec.md §4.7).
    pub fn radius(&self) -> f32 {
        let centroid = self.centroid();
        self.points
            .iter()
            .map(|p| (*p - centroid).length())
            .fold(0.0, f32::max)
    }
}

fn snap_onto_axial_plane(point: &mut Vec3, plane: &Plane) {
    use crate::plane::PlaneType;
    match plane.kind {
        PlaneType::AxialX => point.x = plane.dist * plane.normal.x.signum(),
        PlaneType::AxialY => point.y = plane.dist * plane.normal.y.signum(),
        PlaneType::AxialZ => point.z = plane.dist * plane.normal.z.signum(),
        _ => {}
    }
}

pub fn default_on_epsilon() -> f32 {
    ON_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f32) -> Winding {
        Winding::new(vec![
            Vec3::new(-half, -half, 0.0),
            Vec3::new(half, -half, 0.0),
            Vec3::new(half, half, 0.0),
            Vec3::new(-half, half, 0.0),
        ])
    }

    #[test]
    fn clip_splits_square_in_half() {
        let w = square(10.0);
        let plane = Plane::new(Vec3::X, 0.0);
        let (front, back) = w.clip(&plane, ON_EPSILON);
        assert!(!front.is_empty());
        assert!(!back.is_empty());
        assert!((front.area() - back.area()).abs() < 1e-3);
        assert!((front.area() + back.area() - w.area()).abs() < 1e-2);
    }

    #[test]
    fn clip_wholly_front_keeps_all_points() {
        let w = square(10.0);
        let plane = Plane::new(Vec3::X, -100.0);
        let (front, back) = w.clip(&plane, ON_EPSILON);
        assert_eq!(front.len(), w.len());
        assert!(back.is_empty());
    }

    #[test]
    fn area_of_unit_square_is_one() {
        let w = square(0.5);
        assert!((w.area() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn base_for_plane_lies_on_plane() {
        let plane = Plane::new(Vec3::new(0.0, 0.0, 1.0), 32.0);
        let w = Winding::base_for_plane(&plane, 1024.0);
        for p in &w.points {
            assert!(plane.distance_to(*p).abs() < 1e-3);
        }
    }
}
