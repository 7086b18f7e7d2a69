//! Small geometry helpers shared by every baking stage, grounded on
//! the same vertex/edge/surfedge pool convention `face::pool` defines
//! (spec.md §3, §4.6) but read back out of the already-assembled
//! `format::generic::Bsp` instead of `face::FaceSet`, since by the
//! time `light` runs the geometry is already serialized into lumps.

use format::generic::{Bsp, Face};
use glam::Vec3;

/// Rounds and byte-clamps a 0..255-scale color, shared by every stage
/// that packs a final luxel/grid-sample value.
pub fn clamp_rgb(v: Vec3) -> [u8; 3] {
    [v.x.round().clamp(0.0, 255.0) as u8, v.y.round().clamp(0.0, 255.0) as u8, v.z.round().clamp(0.0, 255.0) as u8]
}

/// Reconstructs a face's world-space vertex loop.
pub fn face_points(bsp: &Bsp, face: &Face) -> Vec<Vec3> {
    (0..face.edge_count)
        .map(|i| {
            let se = bsp.surf_edges[(face.first_edge as u32 + i) as usize];
            let edge = bsp.edges[(se.unsigned_abs() - 1) as usize];
            let v = if se >= 0 { edge[0] } else { edge[1] };
            bsp.vertices[v as usize]
        })
        .collect()
}

/// Point-in-convex-polygon test via consistent cross-product sign,
/// projecting out the polygon's dominant axis first.
pub fn point_in_polygon(points: &[Vec3], p: Vec3) -> bool {
    if points.len() < 3 {
        return false;
    }
    let normal = (points[1] - points[0]).cross(points[2] - points[0]);
    if normal.length_squared() < 1e-8 {
        return false;
    }
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    let proj = |v: Vec3| -> (f32, f32) {
        if az >= ax && az >= ay {
            (v.x, v.y)
        } else if ay >= ax && ay >= az {
            (v.x, v.z)
        } else {
            (v.y, v.z)
        }
    };
    let pp = proj(p);
    let n = points.len();
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = proj(points[i]);
        let b = proj(points[(i + 1) % n]);
        let cross = (b.0 - a.0) * (pp.1 - a.1) - (b.1 - a.1) * (pp.0 - a.0);
        if cross.abs() < 1e-6 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Shared-edge adjacency: maps an undirected edge (unordered vertex
/// pair) to every face touching it. Used by both T-junction-adjacent
/// consumers here: [`crate::phong`]'s neighbor walk.
pub fn build_edge_adjacency(bsp: &Bsp) -> std::collections::HashMap<(u32, u32), Vec<u32>> {
    let mut map: std::collections::HashMap<(u32, u32), Vec<u32>> = std::collections::HashMap::new();
    for (face_id, face) in bsp.faces.iter().enumerate() {
        for i in 0..face.edge_count {
            let se = bsp.surf_edges[(face.first_edge as u32 + i) as usize];
            let edge = bsp.edges[(se.unsigned_abs() - 1) as usize];
            let key = if edge[0] < edge[1] { (edge[0], edge[1]) } else { (edge[1], edge[0]) };
            map.entry(key).or_default().push(face_id as u32);
        }
    }
    map
}
