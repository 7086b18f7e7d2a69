//! Phong vertex-normal smoothing (spec.md §4.8): blends face normals
//! across shared edges within `phong_angle` so curved surfaces built
//! from flat brush faces don't show faceted lighting seams.
//!
//! The source toolchain keys phong grouping off a per-brush-side
//! `_phong`/`phong_angle` key carried all the way into the compiled
//! face record; this workspace's `face`/`format` crates don't yet
//! reserve a bit for it (spec.md §4.9's sidecar-flag extension point is
//! the natural home once one exists), so this applies the worldspawn
//! `phong_angle` threshold uniformly across the map rather than
//! per-face — an Open Question decision recorded in DESIGN.md.

use std::collections::HashMap;

use format::generic::{Bsp, Face};
use geom::POINT_EQUAL_EPSILON;
use glam::Vec3;

use crate::util::{build_edge_adjacency, face_points};

fn face_normal(bsp: &Bsp, face: &Face) -> Vec3 {
    let p = bsp.planes[face.plane as usize];
    if face.side == 1 {
        -p.normal
    } else {
        p.normal
    }
}

fn vertex_angle_weight(points: &[Vec3], vi: usize) -> f32 {
    let n = points.len();
    let prev = points[(vi + n - 1) % n];
    let cur = points[vi];
    let next = points[(vi + 1) % n];
    let a = (prev - cur).normalize_or_zero();
    let b = (next - cur).normalize_or_zero();
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Returns, for every face with at least one smoothed neighbor, the
/// per-vertex smoothed normal in the same order as
/// [`crate::util::face_points`]. Faces absent from the map use their
/// flat plane normal.
pub fn smooth_normals(bsp: &Bsp, phong_angle_deg: f32) -> HashMap<u32, Vec<Vec3>> {
    let mut result = HashMap::new();
    if phong_angle_deg <= 0.0 {
        return result;
    }
    let adjacency = build_edge_adjacency(bsp);
    let cos_threshold = phong_angle_deg.to_radians().cos();

    let face_points_cache: Vec<Vec<Vec3>> = bsp.faces.iter().map(|f| face_points(bsp, f)).collect();
    let flat_normals: Vec<Vec3> = bsp.faces.iter().map(|f| face_normal(bsp, f)).collect();

    for (face_id, face) in bsp.faces.iter().enumerate() {
        let points = &face_points_cache[face_id];
        if points.len() < 3 {
            continue;
        }
        let flat_normal = flat_normals[face_id];

        let mut neighbours: Vec<u32> = Vec::new();
        for i in 0..face.edge_count {
            let se = bsp.surf_edges[(face.first_edge as u32 + i) as usize];
            let edge = bsp.edges[(se.unsigned_abs() - 1) as usize];
            let key = if edge[0] < edge[1] { (edge[0], edge[1]) } else { (edge[1], edge[0]) };
            if let Some(list) = adjacency.get(&key) {
                neighbours.extend(list.iter().copied().filter(|&o| o != face_id as u32));
            }
        }
        if neighbours.is_empty() {
            continue;
        }

        let mut vertex_normals = Vec::with_capacity(points.len());
        for (vi, &p) in points.iter().enumerate() {
            let mut acc = flat_normal * vertex_angle_weight(points, vi);
            for &nb in &neighbours {
                let nnormal = flat_normals[nb as usize];
                if nnormal.dot(flat_normal) < cos_threshold {
                    continue;
                }
                let npoints = &face_points_cache[nb as usize];
                if let Some(nvi) = npoints.iter().position(|&q| q.distance(p) < POINT_EQUAL_EPSILON) {
                    acc += nnormal * vertex_angle_weight(npoints, nvi);
                }
            }
            vertex_normals.push(if acc.length_squared() > 1e-8 { acc.normalize() } else { flat_normal });
        }
        result.insert(face_id as u32, vertex_normals);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use format::generic::{Leaf, Model, Plane, TexInfo};
    use glam::Vec4;

    /// Two unit squares hinged along a shared edge at a shallow angle,
    /// close enough to be smoothed together.
    fn hinged_faces(angle_deg: f32) -> Bsp {
        let mut bsp = Bsp::default();
        bsp.planes.push(Plane { normal: Vec3::Z, dist: 0.0 });
        let tilt = angle_deg.to_radians();
        let tilted_normal = Vec3::new(0.0, -tilt.sin(), tilt.cos());
        bsp.planes.push(Plane { normal: tilted_normal, dist: 0.0 });

        bsp.vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 2.0, 1.0 * tilt.tan()),
            Vec3::new(0.0, 2.0, 1.0 * tilt.tan()),
        ];
        // face 0: 0,1,2,3 on plane 0
        bsp.edges = vec![[0, 1], [1, 2], [2, 3], [3, 0], [2, 4], [4, 5], [5, 3]];
        bsp.surf_edges = vec![1, 2, 3, 4, -3, 5, 6, 7];
        bsp.texinfo.push(TexInfo { u: Vec4::X, v: Vec4::Y, texture_index: 0, flags: 0 });
        bsp.faces.push(Face { plane: 0, side: 0, first_edge: 0, edge_count: 4, texinfo: 0, styles: [255; 4], lightmap_offset: -1 });
        bsp.faces.push(Face { plane: 1, side: 0, first_edge: 4, edge_count: 4, texinfo: 0, styles: [255; 4], lightmap_offset: -1 });
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
    fn shallow_hinge_gets_smoothed_across_shared_edge() {
        let bsp = hinged_faces(5.0);
        let smoothed = smooth_normals(&bsp, 89.0);
        assert!(smoothed.contains_key(&0));
        assert!(smoothed.contains_key(&1));
    }

    #[test]
    fn zero_phong_angle_disables_smoothing() {
        let bsp = hinged_faces(5.0);
        let smoothed = smooth_normals(&bsp, 0.0);
        assert!(smoothed.is_empty());
    }
}
