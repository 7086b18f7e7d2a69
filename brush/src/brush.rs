use geom::{Aabb, Plane, PlaneTable, Winding, ON_EPSILON};
use glam::{Vec3, Vec4};

use crate::contents::ContentFlags;
use crate::error::BrushError;
use crate::side::Side;
use crate::texinfo::{TexInfo, TexInfoTable};

/// A convex volume, the intersection of its sides' back half-spaces.
/// Brushes never mutate in place; CSG produces a new set of brushes
/// rather than editing an existing one.
#[derive(Debug, Clone)]
pub struct Brush {
    pub sides: Vec<Side>,
    pub content_flags: ContentFlags,
    pub aabb: Aabb,
}

/// A convex solid needs at least a tetrahedron's worth of sides to
/// enclose volume.
pub const MIN_BRUSH_SIDES: usize = 4;

impl Brush {
    /// Derives every side's boundary winding by clipping a huge base
    /// winding against the planes of every other side, then interns
    /// planes/texinfos into the shared tables.
    ///
    /// `world_extent` should be comfortably larger than the map's
    /// bounding box (doubled internally on demand by [`Winding`]'s base
    /// winding helper).
    pub fn build(
        raw: &map::Brush,
        content_flags: ContentFlags,
        world_extent: f32,
        planes: &mut PlaneTable,
        texinfos: &mut TexInfoTable,
        mut miptex_id_of: impl FnMut(&str) -> u32,
        mut surface_flags_of: impl FnMut(&str) -> u32,
    ) -> Result<Brush, BrushError> {
        let mut raw_planes = Vec::with_capacity(raw.planes.len());
        for (index, bp) in raw.planes.iter().enumerate() {
            let p1 = Vec3::new(bp.p1.x as f32, bp.p1.y as f32, bp.p1.z as f32);
            let p2 = Vec3::new(bp.p2.x as f32, bp.p2.y as f32, bp.p2.z as f32);
            let p3 = Vec3::new(bp.p3.x as f32, bp.p3.y as f32, bp.p3.z as f32);
            let plane = Plane::from_points(p1, p2, p3)
                .ok_or(BrushError::DegeneratePlane { index })?;
            raw_planes.push(plane);
        }

        let mut sides = Vec::with_capacity(raw_planes.len());
        let mut aabb = Aabb::EMPTY;

        for (i, plane) in raw_planes.iter().enumerate() {
            let mut winding = Winding::base_for_plane(plane, world_extent);

            for (j, other) in raw_planes.iter().enumerate() {
                if i == j {
                    continue;
                }
                winding = winding.clip_back(other, ON_EPSILON);
                if winding.is_empty() {
                    break;
                }
            }

            if winding.is_empty() {
                continue;
            }

            for p in &winding.points {
                aabb.encapsulate(*p);
            }

            let bp = &raw.planes[i];
            let u = Vec4::new(bp.u.x as f32, bp.u.y as f32, bp.u.z as f32, bp.u.w as f32);
            let v = Vec4::new(bp.v.x as f32, bp.v.y as f32, bp.v.z as f32, bp.v.w as f32);
            let miptex_id = miptex_id_of(&bp.texture_name);
            let surface_flags = surface_flags_of(&bp.texture_name);

            let texinfo = TexInfo::new(u, v, surface_flags, miptex_id, 0);
            let texinfo_id = texinfos.intern(texinfo);
            let plane_id = planes.intern(*plane);

            sides.push(Side::new(plane_id, winding, texinfo_id, surface_flags, content_flags));
        }

        if sides.len() < MIN_BRUSH_SIDES {
            return Err(BrushError::TooFewSides { found: sides.len() });
        }

        Ok(Brush { sides, content_flags, aabb })
    }

    pub fn contains_point(&self, planes: &PlaneTable, p: Vec3) -> bool {
        self.sides
            .iter()
            .all(|s| planes.get(s.plane_id).distance_to(p) <= ON_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map::{Brush as RawBrush, BrushPlane, Projection};
    use glam::{DVec3, DVec4};

    fn cube_raw(half: f64) -> RawBrush {
        // Six axis-aligned planes forming a cube, CCW as seen from
        // outside, Valve-220 texture projection.
        let faces: [(DVec3, DVec3, DVec3); 6] = [
            (DVec3::new(half, -half, -half), DVec3::new(half, half, -half), DVec3::new(half, half, half)), // +X
            (DVec3::new(-half, half, -half), DVec3::new(-half, -half, -half), DVec3::new(-half, -half, half)), // -X
            (DVec3::new(-half, half, -half), DVec3::new(half, half, -half), DVec3::new(half, half, half)), // +Y
            (DVec3::new(half, -half, -half), DVec3::new(-half, -half, -half), DVec3::new(-half, -half, half)), // -Y
            (DVec3::new(-half, -half, half), DVec3::new(half, -half, half), DVec3::new(half, half, half)), // +Z
            (DVec3::new(half, -half, -half), DVec3::new(-half, -half, -half), DVec3::new(-half, half, -half)), // -Z
        ];

        let planes = faces
            .into_iter()
            .map(|(p1, p2, p3)| BrushPlane {
                p1,
                p2,
                p3,
                texture_name: "NULL".to_string(),
                u: DVec4::new(1.0, 0.0, 0.0, 0.0),
                v: DVec4::new(0.0, 1.0, 0.0, 0.0),
                rotation: 0.0,
                u_scale: 1.0,
                v_scale: 1.0,
                projection: Projection::Valve220,
            })
            .collect();

        RawBrush { planes }
    }

    #[test]
    fn cube_builds_six_sides_each_on_its_plane() {
        let raw = cube_raw(64.0);
        let mut planes = PlaneTable::new();
        let mut texinfos = TexInfoTable::new();
        let brush = Brush::build(
            &raw,
            ContentFlags::SOLID,
            1_000.0,
            &mut planes,
            &mut texinfos,
            |_| 0,
            |_| 0,
        )
        .unwrap();

        assert_eq!(brush.sides.len(), 6);
        for side in &brush.sides {
            let plane = planes.get(side.plane_id);
            for p in &side.winding.points {
                assert!(plane.distance_to(*p).abs() < 0.5);
            }
        }
    }

    #[test]
    fn too_few_sides_rejected() {
        let mut raw = cube_raw(64.0);
        raw.planes.truncate(2);

        let mut planes = PlaneTable::new();
        let mut texinfos = TexInfoTable::new();
        let err = Brush::build(
            &raw,
            ContentFlags::SOLID,
            1_000.0,
            &mut planes,
            &mut texinfos,
            |_| 0,
            |_| 0,
        )
        .unwrap_err();

        assert!(matches!(err, BrushError::TooFewSides { .. }));
    }
}
