//! PortalExtractor: builds the dual portal graph over a partitioned
//! [`bsptree::Tree`], then uses it to flood-fill player space from
//! entity origins, detect leaks, and void-fill everything else
//! (spec.md §4.5).

pub mod error;
pub mod extractor;
pub mod outside_fill;
pub mod prt;
pub mod types;

pub use error::PortalError;
pub use extractor::extract_portals;
pub use outside_fill::run as fill_outside;
pub use prt::{number_leafs, write_prt1, write_pts};
pub use types::{is_outside, Portal, PortalId, PortalSet, OUTSIDE};

#[cfg(test)]
mod tests {
    use bsptree::{build_tree, TreeConfig};
    use brush::{Brush, ContentFlags, Side, TexInfoId};
    use csg::csg;
    use geom::{Aabb, Plane, PlaneTable, Winding};
    use glam::Vec3;

    use super::*;

    fn axial_box(planes: &mut PlaneTable, mins: Vec3, maxs: Vec3, content: ContentFlags) -> Brush {
        let faces = [
            (Vec3::X, maxs.x),
            (-Vec3::X, -mins.x),
            (Vec3::Y, maxs.y),
            (-Vec3::Y, -mins.y),
            (Vec3::Z, maxs.z),
            (-Vec3::Z, -mins.z),
        ];
        let mut sides = Vec::new();
        for (normal, dist) in faces {
            let plane_id = planes.intern(Plane::new(normal, dist));
            let mut w = Winding::base_for_plane(planes.get(plane_id), 4096.0);
            for (n2, d2) in faces {
                if n2 == normal {
                    continue;
                }
                w = w.clip_back(&Plane::new(-n2, -d2), geom::ON_EPSILON);
            }
            sides.push(Side::new(plane_id, w, TexInfoId(0), 0, content));
        }
        Brush { sides, content_flags: content, aabb: Aabb::from_points([mins, maxs]) }
    }

    const WALL: f32 = 16.0;
    const HALF: f32 = 256.0;

    /// Six thin wall brushes bounding a hollow cube, one per axis face.
    /// `skip` names a face index (matching the order below) to leave out,
    /// punching a hole straight to the padded exterior.
    fn room_walls(planes: &mut PlaneTable, skip: Option<usize>) -> Vec<Brush> {
        let h = HALF;
        let w = WALL;
        let specs = [
            (Vec3::new(h - w, -h, -h), Vec3::new(h, h, h)),   // +X
            (Vec3::new(-h, -h, -h), Vec3::new(-h + w, h, h)), // -X
            (Vec3::new(-h, h - w, -h), Vec3::new(h, h, h)),   // +Y
            (Vec3::new(-h, -h, -h), Vec3::new(h, -h + w, h)), // -Y
            (Vec3::new(-h, -h, h - w), Vec3::new(h, h, h)),   // +Z (ceiling)
            (Vec3::new(-h, -h, -h), Vec3::new(h, h, -h + w)), // -Z (floor)
        ];
        specs
            .into_iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(_, (mins, maxs))| axial_box(planes, mins, maxs, ContentFlags::SOLID))
            .collect()
    }

    /// A sealed room with one entity inside: the flood reaches the
    /// interior leaf through its own portals only, never touching a
    /// portal onto [`OUTSIDE`], so no leak is reported.
    #[test]
    fn sealed_room_has_no_leak() {
        let mut planes = PlaneTable::new();
        let walls = room_walls(&mut planes, None);

        let result = csg(&walls, &planes);
        let bounds = Aabb::from_points([Vec3::splat(-HALF), Vec3::splat(HALF)]);
        let mut tree = build_tree(result.brushes, bounds, &planes, &TreeConfig::default());

        let portals = extract_portals(&mut tree, bounds, &mut planes, geom::ON_EPSILON);
        let outcome = fill_outside(&mut tree, &portals, &[Vec3::ZERO], &planes);

        assert!(outcome.is_ok(), "sealed room must not report a leak");
    }

    /// The floor wall is missing: the interior leaf's flood reaches a
    /// portal onto [`OUTSIDE`] through the hole, so fill_outside must
    /// report a leak.
    #[test]
    fn open_box_leaks() {
        let mut planes = PlaneTable::new();
        let walls = room_walls(&mut planes, Some(5));

        let result = csg(&walls, &planes);
        let bounds = Aabb::from_points([Vec3::splat(-HALF), Vec3::splat(HALF)]);
        let mut tree = build_tree(result.brushes, bounds, &planes, &TreeConfig::default());

        let portals = extract_portals(&mut tree, bounds, &mut planes, geom::ON_EPSILON);
        let outcome = fill_outside(&mut tree, &portals, &[Vec3::ZERO], &planes);

        match outcome {
            Err(PortalError::Leak { trail }) => assert!(!trail.is_empty()),
            Ok(_) => panic!("open box should have leaked"),
        }
    }
}
