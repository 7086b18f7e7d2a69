//! CSG: pairwise brush overlap removal for brushes of equal content
//! class (spec.md §4.3). Each input brush's sides are chopped against
//! every other same-class brush's planes; the surviving fragments are
//! emitted as a new, possibly non-closed, side list carrying the
//! original brush's identity. CSG never mutates input brushes in
//! place — it produces brand new fragment sets.

use brush::{Brush, ContentFlags, Side};
use geom::{Aabb, Plane, PlaneTable, Winding, EQUAL_EPSILON, ON_EPSILON};

/// The surviving sides of one input brush after CSG, still tagged with
/// the index of the brush it came from (spec.md §3: "non-closed side
/// fragments carrying original brush identity"). The fragments are not
/// expected to be closed, so `aabb` is only the bound of what survived,
/// not of the original brush volume.
#[derive(Debug, Clone)]
pub struct CsgBrush {
    pub source_brush: usize,
    pub content_flags: ContentFlags,
    pub sides: Vec<Side>,
    pub aabb: Aabb,
}

#[derive(Debug, Default)]
pub struct CsgResult {
    pub brushes: Vec<CsgBrush>,
    /// Count of input brushes that ended up with zero surviving sides
    /// (spec.md §4.3: "dropped and counted").
    pub dropped: usize,
}

/// Runs CSG over `brushes` in map order. `planes` is only read, never
/// mutated — every plane referenced by a surviving fragment was already
/// interned while brushes were built.
pub fn csg(brushes: &[Brush], planes: &PlaneTable) -> CsgResult {
    let mut result = CsgResult::default();

    for (i, brush) in brushes.iter().enumerate() {
        let mut outside: Vec<Side> = brush.sides.clone();

        for (j, other) in brushes.iter().enumerate() {
            if i == j {
                continue;
            }
            if !brush.content_flags.types_equal(other.content_flags) {
                continue;
            }
            if !brush.aabb.intersects(&other.aabb) {
                continue;
            }

            let mut next_outside = Vec::with_capacity(outside.len());
            for side in outside {
                let side_plane = *planes.get(side.plane_id);
                let (fragments, remaining) =
                    clip_winding_by_brush(side.winding.clone(), other, planes);

                for fragment in fragments {
                    next_outside.push(clone_with_winding(&side, fragment));
                }

                if !remaining.is_empty() && keep_interior_fragment(&side_plane, other, planes, i, j)
                {
                    next_outside.push(clone_with_winding(&side, remaining));
                }
            }
            outside = next_outside;
        }

        outside.retain(|s| !s.is_empty());

        if outside.is_empty() {
            result.dropped += 1;
            continue;
        }

        let mut aabb = Aabb::EMPTY;
        for side in &outside {
            for p in &side.winding.points {
                aabb.encapsulate(*p);
            }
        }

        result.brushes.push(CsgBrush {
            source_brush: i,
            content_flags: brush.content_flags,
            sides: outside,
            aabb,
        });
    }

    result
}

fn clone_with_winding(side: &Side, winding: Winding) -> Side {
    let mut clone = side.clone();
    clone.visible = !winding.is_empty();
    clone.winding = winding;
    clone
}

/// Chops `w` against every plane of `other`, in side order. Each plane
/// peels off the part of the winding that is in front of it (i.e.
/// outside `other` from that face on); whatever survives every plane
/// is strictly inside `other`'s volume.
fn clip_winding_by_brush(
    w: Winding,
    other: &Brush,
    planes: &PlaneTable,
) -> (Vec<Winding>, Winding) {
    let mut outside = Vec::new();
    let mut remaining = w;

    for side in &other.sides {
        if remaining.is_empty() {
            break;
        }
        let plane = planes.get(side.plane_id);
        let (front, back) = remaining.clip(plane, ON_EPSILON);
        if !front.is_empty() {
            outside.push(front);
        }
        remaining = back;
    }

    (outside, remaining)
}

/// Decides whether a fragment that ended up entirely inside `other`
/// should survive, per spec.md §4.3's precedence rule: later brushes
/// override earlier ones at a coincident, same-facing plane; a
/// coincident opposite-facing pair (two brushes touching face to face)
/// is always clipped off; anything else embedded with no coincident
/// boundary is redundant interior geometry and is discarded.
fn keep_interior_fragment(
    side_plane: &Plane,
    other: &Brush,
    planes: &PlaneTable,
    mine_idx: usize,
    other_idx: usize,
) -> bool {
    const COPLANAR_DOT_EPSILON: f32 = 1e-3;
    const COPLANAR_DIST_EPSILON: f32 = EQUAL_EPSILON * 100.0;

    for other_side in &other.sides {
        let op = planes.get(other_side.plane_id);
        let dot = side_plane.normal.dot(op.normal);

        if (dot - 1.0).abs() < COPLANAR_DOT_EPSILON
            && (side_plane.dist - op.dist).abs() < COPLANAR_DIST_EPSILON
        {
            return mine_idx > other_idx;
        }

        if (dot + 1.0).abs() < COPLANAR_DOT_EPSILON
            && (side_plane.dist + op.dist).abs() < COPLANAR_DIST_EPSILON
        {
            return false;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use brush::TexInfoId;
    use geom::Aabb;
    use glam::Vec3;

    fn axial_box(planes: &mut PlaneTable, mins: Vec3, maxs: Vec3, contents: ContentFlags) -> Brush {
        let faces = [
            (Vec3::new(-1.0, 0.0, 0.0), -mins.x),
            (Vec3::new(1.0, 0.0, 0.0), maxs.x),
            (Vec3::new(0.0, -1.0, 0.0), -mins.y),
            (Vec3::new(0.0, 1.0, 0.0), maxs.y),
            (Vec3::new(0.0, 0.0, -1.0), -mins.z),
            (Vec3::new(0.0, 0.0, 1.0), maxs.z),
        ];

        let mut sides = Vec::new();
        for (normal, dist) in faces {
            let plane = Plane::new(normal, dist);
            let plane_id = planes.intern(plane);
            // Winding is a square on the plane, clipped to the box extents.
            let winding = Winding::base_for_plane(&plane, 1024.0);
            let mut w = winding;
            for (n2, d2) in faces {
                if n2 == normal {
                    continue;
                }
                let clip_plane = Plane::new(-n2, -d2);
                w = w.clip_back(&clip_plane, ON_EPSILON);
            }
            sides.push(Side::new(plane_id, w, TexInfoId(0), 0, contents));
        }

        Brush {
            sides,
            content_flags: contents,
            aabb: Aabb::from_points([mins, maxs]),
        }
    }

    #[test]
    fn disjoint_solids_both_survive_whole() {
        let mut planes = PlaneTable::new();
        let a = axial_box(&mut planes, Vec3::splat(-64.0), Vec3::splat(0.0), ContentFlags::SOLID);
        let b = axial_box(
            &mut planes,
            Vec3::new(100.0, -64.0, -64.0),
            Vec3::new(164.0, 0.0, 0.0),
            ContentFlags::SOLID,
        );

        let result = csg(&[a, b], &planes);
        assert_eq!(result.brushes.len(), 2);
        assert_eq!(result.dropped, 0);
        for csg_brush in &result.brushes {
            assert_eq!(csg_brush.sides.len(), 6);
        }
    }

    #[test]
    fn fully_engulfed_brush_is_dropped() {
        let mut planes = PlaneTable::new();
        let outer = axial_box(&mut planes, Vec3::splat(-128.0), Vec3::splat(128.0), ContentFlags::SOLID);
        let inner = axial_box(&mut planes, Vec3::splat(-16.0), Vec3::splat(16.0), ContentFlags::SOLID);

        // Inner brush created later (index 1) so it would win ties, but it
        // has no plane coincident with the outer brush, so every fragment
        // that ends up strictly inside the outer brush is discarded —
        // it is the outer brush's sides that get eaten by the inner one
        // instead, since the outer's faces lie outside the inner brush.
        let result = csg(&[outer, inner], &planes);
        assert!(!result.brushes.is_empty());
        let outer_result = result.brushes.iter().find(|b| b.source_brush == 0).unwrap();
        assert_eq!(outer_result.sides.len(), 6);
    }

    #[test]
    fn different_content_classes_do_not_clip_each_other() {
        let mut planes = PlaneTable::new();
        let solid = axial_box(&mut planes, Vec3::splat(-64.0), Vec3::splat(64.0), ContentFlags::SOLID);
        let water = axial_box(&mut planes, Vec3::splat(-32.0), Vec3::splat(32.0), ContentFlags::WATER);

        let result = csg(&[solid, water], &planes);
        assert_eq!(result.brushes.len(), 2);
        for csg_brush in &result.brushes {
            assert_eq!(csg_brush.sides.len(), 6);
        }
    }
}
