use glam::Vec3;

use crate::epsilon::EQUAL_EPSILON;

/// Classification of a plane's dominant axis, mirroring the
/// `AXIAL_X..NONAXIAL_Z` family from spec.md's data model. Axial planes
/// (one that is exactly a coordinate-axis normal) get cheaper splitter
/// and clip paths throughout the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaneType {
    AxialX = 0,
    AxialY = 1,
    AxialZ = 2,
    NonAxialX = 3,
    NonAxialY = 4,
    NonAxialZ = 5,
}

impl PlaneType {
    /// Classifies a (not necessarily normalized) normal the way the
    /// original qbsp does: axial if exactly one component is +-1.
    pub fn classify(normal: Vec3) -> Self {
        const AXIAL_EPSILON: f32 = 1e-6;
        if (normal.x.abs() - 1.0).abs() < AXIAL_EPSILON {
            PlaneType::AxialX
        } else if (normal.y.abs() - 1.0).abs() < AXIAL_EPSILON {
            PlaneType::AxialY
        } else if (normal.z.abs() - 1.0).abs() < AXIAL_EPSILON {
            PlaneType::AxialZ
        } else {
            let ax = normal.x.abs();
            let ay = normal.y.abs();
            let az = normal.z.abs();
            if ax >= ay && ax >= az {
                PlaneType::NonAxialX
            } else if ay >= ax && ay >= az {
                PlaneType::NonAxialY
            } else {
                PlaneType::NonAxialZ
            }
        }
    }

    pub fn is_axial(self) -> bool {
        matches!(self, PlaneType::AxialX | PlaneType::AxialY | PlaneType::AxialZ)
    }
}

/// Which side of a plane a point (or a whole winding) falls on, with
/// `ON_EPSILON` tolerance baked into the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    On,
}

/// A hyperplane in "normal . p = dist" form. `normal` is a unit vector;
/// callers that build planes from raw points must call [`Plane::new`],
/// which normalizes and classifies in one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
    pub kind: PlaneType,
}

impl Plane {
    pub fn new(normal: Vec3, dist: f32) -> Self {
        let len = normal.length();
        debug_assert!(len > 1e-9, "degenerate plane normal");
        let normal = normal / len;
        let dist = dist / len;
        Self {
            kind: PlaneType::classify(normal),
            normal,
            dist,
        }
    }

    /// Builds a plane from three CCW-wound points (viewed from outside
    /// the solid, per spec.md §6's "Plane points" contract). Returns
    /// `None` if the points are collinear/degenerate.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let normal = (a - b).cross(c - b);
        if normal.length_squared() < 1e-12 {
            return None;
        }
        let normal = normal.normalize();
        let dist = normal.dot(a);
        Some(Self {
            kind: PlaneType::classify(normal),
            normal,
            dist,
        })
    }

    /// Negates the plane (the "other side"). `intern(-p).id` is defined
    /// to equal `intern(p).id ^ 1` by [`PlaneTable`].
    pub fn negate(&self) -> Self {
        Self {
            normal: -self.normal,
            dist: -self.dist,
            kind: self.kind,
        }
    }

    /// Canonicalizes sign so the first significantly-nonzero component
    /// of `normal` is positive. Returns the canonical plane and whether
    /// it had to be flipped.
    pub fn canonicalize(self) -> (Self, bool) {
        let n = self.normal;
        let should_flip = if n.x.abs() > EQUAL_EPSILON {
            n.x < 0.0
        } else if n.y.abs() > EQUAL_EPSILON {
            n.y < 0.0
        } else {
            n.z < 0.0
        };
        if should_flip {
            (self.negate(), true)
        } else {
            (self, false)
        }
    }

    pub fn distance_to(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.dist
    }

    pub fn side_of(&self, p: Vec3, epsilon: f32) -> Side {
        let d = self.distance_to(p);
        if d > epsilon {
            Side::Front
        } else if d < -epsilon {
            Side::Back
        } else {
            Side::On
        }
    }

    /// Value equality within `EQUAL_EPSILON`, used by [`PlaneTable`]'s
    /// interning lookup.
    pub fn approx_eq(&self, other: &Plane) -> bool {
        (self.dist - other.dist).abs() < EQUAL_EPSILON
            && (self.normal.x - other.normal.x).abs() < EQUAL_EPSILON
            && (self.normal.y - other.normal.y).abs() < EQUAL_EPSILON
            && (self.normal.z - other.normal.z).abs() < EQUAL_EPSILON
    }
}

/// Stable integer id for an interned plane. Negation flips bit 0
/// (`PlaneId(n).opposite() == PlaneId(n ^ 1)`), matching spec.md §3's
/// "plane number XOR 1" invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaneId(pub u32);

impl PlaneId {
    pub fn opposite(self) -> PlaneId {
        PlaneId(self.0 ^ 1)
    }

    pub fn is_flipped(self) -> bool {
        self.0 & 1 == 1
    }
}

/// Global, append-only plane-interning table (spec.md §9: "centralize
/// in a CompileContext passed explicitly; no process singletons").
/// Every plane is stored alongside its negation so `id` and `id ^ 1`
/// are always a valid pair.
#[derive(Debug, Default)]
pub struct PlaneTable {
    planes: Vec<Plane>,
}

impl PlaneTable {
    pub fn new() -> Self {
        Self { planes: Vec::new() }
    }

    /// Interns `plane`, canonicalizing it first. Returns the id of the
    /// (possibly already-canonical) plane as given; callers that need
    /// the opposite side use [`PlaneId::opposite`].
    pub fn intern(&mut self, plane: Plane) -> PlaneId {
        let (canonical, flipped) = plane.canonicalize();

        if let Some(pos) = self
            .planes
            .iter()
            .step_by(2)
            .position(|p| p.approx_eq(&canonical))
        {
            let base = PlaneId((pos * 2) as u32);
            return if flipped { base.opposite() } else { base };
        }

        let base = PlaneId(self.planes.len() as u32);
        self.planes.push(canonical);
        self.planes.push(canonical.negate());

        if flipped {
            base.opposite()
        } else {
            base
        }
    }

    pub fn get(&self, id: PlaneId) -> &Plane {
        &self.planes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_is_idempotent() {
        let p = Plane::new(Vec3::new(-1.0, 0.3, 0.0), 4.0);
        let (c1, _) = p.canonicalize();
        let (c2, _) = c1.canonicalize();
        assert_eq!(c1, c2);
    }

    #[test]
    fn intern_roundtrip_and_negation() {
        let mut table = PlaneTable::new();
        let p = Plane::new(Vec3::new(1.0, 0.0, 0.0), 64.0);
        let id1 = table.intern(p);
        let id2 = table.intern(p);
        assert_eq!(id1, id2);

        let neg_id = table.intern(p.negate());
        assert_eq!(neg_id, id1.opposite());
    }

    #[test]
    fn from_points_ccw_normal() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(1.0, 1.0, 0.0);
        let plane = Plane::from_points(a, b, c).unwrap();
        assert!(plane.normal.z.abs() > 0.9);
    }
}
