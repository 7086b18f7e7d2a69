use geom::{ON_EPSILON, ZERO_AREA_EPSILON};
use glam::Vec3;

use crate::merge::MergedPolygon;

/// Inserts any other polygon's vertex that lies strictly inside an
/// edge (within `ON_EPSILON`, strictly between the endpoints) into that
/// edge, for every polygon in `polys` (spec.md §4.6). Operates on the
/// flat point lists directly; the caller pools vertices afterwards.
pub fn repair_t_junctions(polys: &mut [MergedPolygon]) {
    // Collect every distinct output vertex across every polygon once;
    // candidates for insertion on any edge are drawn from this set minus
    // the edge's own two endpoints.
    let mut all_points: Vec<Vec3> = Vec::new();
    for p in polys.iter() {
        for &v in &p.points {
            if !all_points.iter().any(|&o| o.distance(v) < 1e-4) {
                all_points.push(v);
            }
        }
    }

    for poly in polys.iter_mut() {
        let mut points = std::mem::take(&mut poly.points);
        let mut i = 0;
        while i < points.len() {
            let p0 = points[i];
            let p1 = points[(i + 1) % points.len()];
            let seg = p1 - p0;
            let len2 = seg.length_squared();
            if len2 < 1e-8 {
                i += 1;
                continue;
            }

            // Candidates strictly between p0 and p1, sorted by position
            // along the segment, so multiple insertions land in order.
            let mut inserts: Vec<(f32, Vec3)> = Vec::new();
            for &cand in &all_points {
                if cand.distance(p0) < POINT_SKIP_EPSILON || cand.distance(p1) < POINT_SKIP_EPSILON {
                    continue;
                }
                let t = (cand - p0).dot(seg) / len2;
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let closest = p0 + seg * t;
                if closest.distance(cand) < ON_EPSILON {
                    inserts.push((t, cand));
                }
            }
            inserts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            inserts.dedup_by(|a, b| a.1.distance(b.1) < 1e-4);

            if inserts.is_empty() {
                i += 1;
                continue;
            }

            let insert_at = i + 1;
            for (offset, (_, v)) in inserts.into_iter().enumerate() {
                points.insert(insert_at + offset, v);
            }
            i += 1; // re-examine what is now the next edge, past p0-p1's first new segment
        }

        points = drop_collinear_duplicates(points);
        poly.points = points;
    }
}

const POINT_SKIP_EPSILON: f32 = 1e-4;

/// Removes consecutive vertices that form a zero-area "triangle" with
/// their neighbours, which T-junction insertion can introduce when a
/// candidate lands exactly on an existing vertex (spec.md §4.6:
/// "verify no zero-area triangle is formed by consecutive collinear
/// vertices").
fn drop_collinear_duplicates(points: Vec<Vec3>) -> Vec<Vec3> {
    if points.len() < 3 {
        return points;
    }
    let mut out = points;
    loop {
        let n = out.len();
        if n < 3 {
            break;
        }
        let mut removed = None;
        for i in 0..n {
            let prev = out[(i + n - 1) % n];
            let cur = out[i];
            let next = out[(i + 1) % n];
            let area = (cur - prev).cross(next - prev).length() * 0.5;
            if area < ZERO_AREA_EPSILON && (cur - prev).length() > 1e-5 && (next - cur).length() > 1e-5 {
                // `cur` sits on the straight line between its
                // neighbours: keep it only if it's genuinely needed to
                // match a neighbouring polygon's edge (T-junction
                // vertices are exactly this), so only drop exact
                // duplicates here, not every collinear point.
                if (cur - prev).normalize_or_zero().dot((next - cur).normalize_or_zero()) > 0.999999 {
                    continue;
                }
            }
            if (cur - prev).length() < 1e-5 {
                removed = Some(i);
                break;
            }
        }
        match removed {
            Some(i) => {
                out.remove(i);
            }
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use brush::{ContentFlags, TexInfoId};
    use bsptree::NodeId;
    use geom::PlaneId;

    fn poly(points: Vec<Vec3>) -> MergedPolygon {
        MergedPolygon {
            node: NodeId(0),
            plane_id: PlaneId(0),
            side: 0,
            texinfo_id: TexInfoId(0),
            content_flags: ContentFlags::SOLID,
            points,
        }
    }

    #[test]
    fn t_vertex_is_inserted_into_long_edge() {
        let long_wall = poly(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]);
        let window_sill = poly(vec![
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(6.0, -1.0, 0.0),
            Vec3::new(4.0, -1.0, 0.0),
        ]);

        let mut polys = vec![long_wall, window_sill];
        repair_t_junctions(&mut polys);

        let wall = &polys[0];
        assert!(wall.points.iter().any(|p| p.distance(Vec3::new(4.0, 0.0, 0.0)) < 1e-3));
        assert!(wall.points.iter().any(|p| p.distance(Vec3::new(6.0, 0.0, 0.0)) < 1e-3));
    }
}
