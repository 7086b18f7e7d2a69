//! Per-face lightmap-space UV parameterization (spec.md §4.8): turns a
//! face's `texinfo` projection plus the chosen `lmscale` into a luxel
//! rectangle and a world-space inverse mapping for every luxel center.

use format::generic::{Bsp, Face, TexInfo};
use glam::{Mat3, Vec3};

use crate::util::face_points;

/// A face's resolved lightmap placement: how big its luxel grid is and
/// how to map a luxel index back to a world-space point on the face
/// plane (spec.md §4.8's "the luxel midpoint for (i,j) is inverse-
/// mapped into world space and projected onto the face plane").
#[derive(Debug, Clone)]
pub struct TexOrg {
    pub width: usize,
    pub height: usize,
    pub texmins: [i32; 2],
    pub lmscale: f32,
    /// `true` if the face's natural extents were clamped to fit
    /// `max_dimension`; not fatal (spec.md §7 lists no dedicated error
    /// kind for this), just recorded.
    pub clamped: bool,
    pub(crate) tex_to_world: Mat3,
    pub(crate) plane_dist: f32,
    pub(crate) u_offset: f32,
    pub(crate) v_offset: f32,
}

impl TexOrg {
    /// Builds the parameterization for `face`, given its plane and
    /// texinfo. Returns `None` for degenerate faces (fewer than 3
    /// vertices, or a texinfo whose axes + plane normal don't form a
    /// basis — a zero-area or axis-degenerate projection).
    pub fn build(bsp: &Bsp, face: &Face, texinfo: &TexInfo, lmscale: f32, max_dimension: usize) -> Option<Self> {
        let points = face_points(bsp, face);
        if points.len() < 3 {
            return None;
        }
        let plane = bsp.planes[face.plane as usize];
        let normal = if face.side == 1 { -plane.normal } else { plane.normal };
        let plane_dist = if face.side == 1 { -plane.dist } else { plane.dist };

        let (mut min_u, mut min_v) = (f32::INFINITY, f32::INFINITY);
        let (mut max_u, mut max_v) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for &p in &points {
            let u = texinfo.u.truncate().dot(p) + texinfo.u.w;
            let v = texinfo.v.truncate().dot(p) + texinfo.v.w;
            min_u = min_u.min(u / lmscale);
            min_v = min_v.min(v / lmscale);
            max_u = max_u.max(u / lmscale);
            max_v = max_v.max(v / lmscale);
        }

        let texmin_u = min_u.floor() as i32;
        let texmin_v = min_v.floor() as i32;
        let raw_w = (max_u.ceil() as i32 - texmin_u + 1).max(1) as usize;
        let raw_h = (max_v.ceil() as i32 - texmin_v + 1).max(1) as usize;
        let width = raw_w.min(max_dimension);
        let height = raw_h.min(max_dimension);

        let m = Mat3::from_cols(texinfo.u.truncate(), texinfo.v.truncate(), normal).transpose();
        if m.determinant().abs() < 1e-9 {
            return None;
        }

        Some(Self {
            width,
            height,
            texmins: [texmin_u, texmin_v],
            lmscale,
            clamped: raw_w != width || raw_h != height,
            tex_to_world: m.inverse(),
            plane_dist,
            u_offset: texinfo.u.w,
            v_offset: texinfo.v.w,
        })
    }

    pub fn num_luxels(&self) -> usize {
        self.width * self.height
    }

    /// World-space position of luxel `(i, j)`'s center, on the face
    /// plane (spec.md §4.8).
    pub fn luxel_world(&self, i: usize, j: usize) -> Vec3 {
        let world_u = (self.texmins[0] as f32 + i as f32 + 0.5) * self.lmscale;
        let world_v = (self.texmins[1] as f32 + j as f32 + 0.5) * self.lmscale;
        let target = Vec3::new(world_u - self.u_offset, world_v - self.v_offset, self.plane_dist);
        self.tex_to_world * target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format::generic::{Leaf, Model};
    use glam::Vec4;

    fn square_bsp() -> Bsp {
        let mut bsp = Bsp::default();
        bsp.planes.push(format::generic::Plane { normal: Vec3::Z, dist: 0.0 });
        bsp.vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(64.0, 0.0, 0.0),
            Vec3::new(64.0, 64.0, 0.0),
            Vec3::new(0.0, 64.0, 0.0),
        ];
        bsp.edges = vec![[0, 1], [1, 2], [2, 3], [3, 0]];
        bsp.surf_edges = vec![1, 2, 3, 4];
        bsp.texinfo.push(TexInfo { u: Vec4::new(1.0, 0.0, 0.0, 0.0), v: Vec4::new(0.0, 1.0, 0.0, 0.0), texture_index: 0, flags: 0 });
        bsp.faces.push(Face { plane: 0, side: 0, first_edge: 0, edge_count: 4, texinfo: 0, styles: [255; 4], lightmap_offset: -1 });
        bsp.leaves.push(Leaf {
            contents: brush::ContentFlags::empty(),
            vis_offset: -1,
            mins: [0.0; 3],
            maxs: [0.0; 3],
            first_mark_surface: 0,
            mark_surface_count: 0,
            ambient_levels: [0; 4],
        });
        bsp.models.push(Model { head_nodes: [-1; 4], ..Model::default() });
        bsp
    }

    #[test]
    fn sixty_four_unit_face_at_scale_16_is_four_luxels_wide() {
        let bsp = square_bsp();
        let org = TexOrg::build(&bsp, &bsp.faces[0], &bsp.texinfo[0], 16.0, 256).unwrap();
        assert_eq!(org.width, 4);
        assert_eq!(org.height, 4);
    }

    #[test]
    fn luxel_center_roundtrips_onto_the_face_plane() {
        let bsp = square_bsp();
        let org = TexOrg::build(&bsp, &bsp.faces[0], &bsp.texinfo[0], 16.0, 256).unwrap();
        let p = org.luxel_world(0, 0);
        assert!(p.z.abs() < 1e-4);
    }
}
