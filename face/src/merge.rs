use brush::{ContentFlags, TexInfoId};
use bsptree::NodeId;
use geom::{PlaneId, Winding, POINT_EQUAL_EPSILON};
use glam::Vec3;

use crate::fragments::RawFragment;

/// A polygon still in "loose windings" form, not yet pooled into the
/// shared vertex/edge storage. One [`MergedPolygon`] becomes exactly
/// one output [`crate::builder::Face`] (possibly further split by
/// T-junction repair's edge-count fallback).
#[derive(Debug, Clone)]
pub struct MergedPolygon {
    pub node: NodeId,
    pub plane_id: PlaneId,
    pub side: u8,
    pub texinfo_id: TexInfoId,
    pub content_flags: ContentFlags,
    pub points: Vec<Vec3>,
}

fn points_close(a: Vec3, b: Vec3) -> bool {
    a.distance(b) < POINT_EQUAL_EPSILON
}

/// Finds a shared edge between `a` and `b` wound in opposite directions
/// (as two polygons sharing a boundary are, when both are CCW as seen
/// from their own front side). Returns `(ia, ib)`: the index in `a` and
/// in `b` of the edge's first vertex (walking forward in `a`, backward
/// in `b`).
fn shared_edge(a: &[Vec3], b: &[Vec3]) -> Option<(usize, usize)> {
    for ia in 0..a.len() {
        let a0 = a[ia];
        let a1 = a[(ia + 1) % a.len()];
        for ib in 0..b.len() {
            let b0 = b[ib];
            let b1 = b[(ib + 1) % b.len()];
            if points_close(a0, b1) && points_close(a1, b0) {
                return Some((ia, ib));
            }
        }
    }
    None
}

/// Splices `a` and `b` at the shared edge found by [`shared_edge`],
/// producing the union polygon's vertex list (still possibly
/// non-convex; caller checks with [`is_convex`]).
fn splice(a: &[Vec3], b: &[Vec3], ia: usize, ib: usize) -> Vec<Vec3> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    // Walk `a` starting just after the shared edge, all the way around.
    for k in 0..a.len() {
        out.push(a[(ia + 1 + k) % a.len()]);
    }
    // Then splice in `b`'s vertices that aren't part of the shared edge.
    for k in 1..b.len() - 1 {
        out.push(b[(ib + 1 + k) % b.len()]);
    }
    dedup_consecutive(out)
}

fn dedup_consecutive(points: Vec<Vec3>) -> Vec<Vec3> {
    let mut out: Vec<Vec3> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().map(|&last| points_close(last, p)).unwrap_or(false) {
            continue;
        }
        out.push(p);
    }
    if out.len() > 1 && points_close(out[0], *out.last().unwrap()) {
        out.pop();
    }
    out
}

/// A polygon is convex iff every turn at a vertex has the same sign of
/// cross product (relative to `normal`), per spec.md §4.6's merge
/// rule: "mergeable iff the shared edge's two outer edges of the
/// result remain convex".
fn is_convex(points: &[Vec3], normal: Vec3) -> bool {
    if points.len() < 3 {
        return false;
    }
    let n = points.len();
    let mut sign = 0.0f32;
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        let e1 = cur - prev;
        let e2 = next - cur;
        let cross = e1.cross(e2).dot(normal);
        if cross.abs() < 1e-5 {
            continue; // collinear, neither violates nor confirms convexity
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Greedily merges coplanar, same-texinfo, same-content fragments that
/// share a full edge into larger convex polygons (spec.md §4.6).
/// Fragments that can't be merged with anything stay as their own
/// single-fragment polygon.
pub fn merge_fragments(fragments: Vec<RawFragment>, normal_of: impl Fn(PlaneId) -> Vec3) -> Vec<MergedPolygon> {
    // Group by (node, plane, side, texinfo, content) — exactly the keys
    // spec.md §4.6 names as required to match before two fragments are
    // even merge-candidates.
    use std::collections::HashMap;
    let mut groups: HashMap<(NodeId, u32, u8, u32, u32), Vec<Vec<Vec3>>> = HashMap::new();
    let mut meta: HashMap<(NodeId, u32, u8, u32, u32), (PlaneId, TexInfoId, ContentFlags)> = HashMap::new();

    for frag in fragments {
        if frag.winding.is_empty() {
            continue;
        }
        let key = (frag.node, frag.plane_id.0, frag.side, frag.texinfo_id.0, frag.content_flags.bits());
        meta.entry(key).or_insert((frag.plane_id, frag.texinfo_id, frag.content_flags));
        groups.entry(key).or_default().push(frag.winding.points);
    }

    let mut out = Vec::new();
    for (key, mut polys) in groups {
        let (plane_id, texinfo_id, content_flags) = meta[&key];
        let normal = normal_of(plane_id);

        let mut changed = true;
        while changed {
            changed = false;
            'outer: for i in 0..polys.len() {
                for j in (i + 1)..polys.len() {
                    if let Some((ia, ib)) = shared_edge(&polys[i], &polys[j]) {
                        let candidate = splice(&polys[i], &polys[j], ia, ib);
                        if is_convex(&candidate, normal) {
                            let pj = polys.remove(j);
                            let _ = pj;
                            polys[i] = candidate;
                            changed = true;
                            break 'outer;
                        }
                    }
                }
            }
        }

        for points in polys {
            if points.len() < 3 {
                continue;
            }
            out.push(MergedPolygon {
                node: key.0,
                plane_id,
                side: key.2,
                texinfo_id,
                content_flags,
                points,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use brush::TexInfoId;
    use geom::PlaneId;

    fn frag(node: NodeId, points: Vec<Vec3>) -> RawFragment {
        RawFragment {
            node,
            plane_id: PlaneId(0),
            side: 0,
            texinfo_id: TexInfoId(0),
            content_flags: ContentFlags::SOLID,
            winding: Winding::new(points),
        }
    }

    #[test]
    fn two_squares_merge_into_one_rectangle() {
        let left = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let right = vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        let fragments = vec![frag(NodeId(0), left), frag(NodeId(0), right)];
        let merged = merge_fragments(fragments, |_| Vec3::Z);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].points.len(), 4);
    }
}
