use brush::{ContentFlags, Side};
use csg::CsgBrush;
use geom::{Aabb, Plane, PlaneTable, Side as PlaneSide};

use crate::config::TreeConfig;
use crate::splitter::choose_splitter;
use crate::tree::{Interior, Leaf, Node, NodeContent, NodeId, Tree};

/// Recursively partitions `brushes` into a BSP tree (spec.md §4.4's
/// `Partition`). `total_map_sides` is the side count of the whole map,
/// computed once up front, so every recursive call can evaluate the
/// midsplit-fraction trigger against the same denominator.
pub fn build_tree(brushes: Vec<CsgBrush>, bounds: Aabb, planes: &PlaneTable, config: &TreeConfig) -> Tree {
    let total_map_sides: usize = brushes.iter().map(|b| b.sides.len()).sum();
    let mut tree = Tree { nodes: Vec::new(), root: NodeId(0) };
    let root = partition(&mut tree, brushes, bounds, planes, config, total_map_sides);
    tree.root = root;
    tree
}

fn partition(
    tree: &mut Tree,
    brushes: Vec<CsgBrush>,
    bounds: Aabb,
    planes: &PlaneTable,
    config: &TreeConfig,
    total_map_sides: usize,
) -> NodeId {
    if brushes.is_empty() {
        return tree.push(Node {
            aabb: bounds,
            content: NodeContent::Leaf(Leaf::empty(ContentFlags::empty())),
        });
    }

    let splitter = choose_splitter(&brushes, &bounds, planes, config, total_map_sides);

    let Some(plane_id) = splitter else {
        return tree.push(Node {
            aabb: bounds,
            content: NodeContent::Leaf(merge_leaf_contents(&brushes)),
        });
    };

    let plane = *planes.get(plane_id);

    let (mut front, mut back) = (Vec::new(), Vec::new());
    for mut brush in brushes {
        for side in &mut brush.sides {
            if side.plane_id == plane_id || side.plane_id == plane_id.opposite() {
                side.onnode = true;
            }
        }

        match classify_brush(&brush, &plane, config.on_epsilon) {
            PlaneSide::Front => front.push(brush),
            PlaneSide::Back => back.push(brush),
            PlaneSide::On => {
                let (front_brush, back_brush) = split_brush(&brush, &plane, config.on_epsilon);
                if let Some(fb) = front_brush {
                    front.push(fb);
                }
                if let Some(bb) = back_brush {
                    back.push(bb);
                }
            }
        }
    }

    let front_bounds = clip_bounds(&bounds, &plane, true);
    let back_bounds = clip_bounds(&bounds, &plane, false);

    let front_id = partition(tree, front, front_bounds, planes, config, total_map_sides);
    let back_id = partition(tree, back, back_bounds, planes, config, total_map_sides);

    tree.push(Node {
        aabb: bounds,
        content: NodeContent::Interior(Interior {
            plane_id,
            children: [front_id, back_id],
            faces: Vec::new(),
        }),
    })
}

/// `content_flags = OR of descendants`, SOLID cleared unless every
/// descendant brush touching this leaf was solid, per spec.md §4.2 and
/// §4.4's "merge every brush's content touching bounds".
fn merge_leaf_contents(brushes: &[CsgBrush]) -> Leaf {
    let mut merged = ContentFlags::empty();
    let mut all_solid = true;
    let mut markfaces = Vec::with_capacity(brushes.len());

    for brush in brushes {
        merged = brush.content_flags.merge_into_cluster(merged);
        all_solid &= brush.content_flags.contains(ContentFlags::SOLID);
        markfaces.push(brush.source_brush);
    }

    let content_flags = ContentFlags::finish_cluster_merge(merged, all_solid);
    let mut leaf = Leaf::empty(content_flags);
    leaf.markfaces = markfaces;
    leaf
}

/// Classifies a whole brush against `plane`: fully in front, fully
/// behind, or straddling (spec.md §4.4 step 3). AABB is checked first
/// as a fast reject before falling back to per-vertex classification.
fn classify_brush(brush: &CsgBrush, plane: &Plane, epsilon: f32) -> PlaneSide {
    match classify_aabb(plane, &brush.aabb, epsilon) {
        PlaneSide::Front => return PlaneSide::Front,
        PlaneSide::Back => return PlaneSide::Back,
        PlaneSide::On => {}
    }

    let mut any_front = false;
    let mut any_back = false;
    for side in &brush.sides {
        for p in &side.winding.points {
            let d = plane.distance_to(*p);
            if d > epsilon {
                any_front = true;
            } else if d < -epsilon {
                any_back = true;
            }
        }
    }

    match (any_front, any_back) {
        (true, true) => PlaneSide::On,
        (false, true) => PlaneSide::Back,
        _ => PlaneSide::Front,
    }
}

fn classify_aabb(plane: &Plane, aabb: &Aabb, epsilon: f32) -> PlaneSide {
    let mut front = false;
    let mut back = false;
    for x in [aabb.mins.x, aabb.maxs.x] {
        for y in [aabb.mins.y, aabb.maxs.y] {
            for z in [aabb.mins.z, aabb.maxs.z] {
                let d = plane.distance_to(glam::Vec3::new(x, y, z));
                if d > epsilon {
                    front = true;
                } else if d < -epsilon {
                    back = true;
                }
            }
        }
    }
    match (front, back) {
        (true, false) => PlaneSide::Front,
        (false, true) => PlaneSide::Back,
        _ => PlaneSide::On,
    }
}

/// Splits a straddling brush's sides by `plane`, keeping the invariant
/// that every brush lives entirely within its subtree. CSG fragments
/// are already non-closed (spec.md §4.3), so no capping side is added
/// at the cut — the fragments only ever serve as splitter candidates
/// and markfaces, never as rendered geometry.
fn split_brush(brush: &CsgBrush, plane: &Plane, epsilon: f32) -> (Option<CsgBrush>, Option<CsgBrush>) {
    let mut front_sides = Vec::new();
    let mut back_sides = Vec::new();

    for side in &brush.sides {
        let (front_w, back_w) = side.winding.clip(plane, epsilon);
        if !front_w.is_empty() {
            front_sides.push(clone_side(side, front_w));
        }
        if !back_w.is_empty() {
            back_sides.push(clone_side(side, back_w));
        }
    }

    let front = (!front_sides.is_empty()).then(|| make_brush(brush, front_sides));
    let back = (!back_sides.is_empty()).then(|| make_brush(brush, back_sides));
    (front, back)
}

fn clone_side(side: &Side, winding: geom::Winding) -> Side {
    let mut clone = side.clone();
    clone.visible = !winding.is_empty();
    clone.winding = winding;
    clone
}

fn make_brush(original: &CsgBrush, sides: Vec<Side>) -> CsgBrush {
    let mut aabb = Aabb::EMPTY;
    for side in &sides {
        for p in &side.winding.points {
            aabb.encapsulate(*p);
        }
    }
    CsgBrush {
        source_brush: original.source_brush,
        content_flags: original.content_flags,
        sides,
        aabb,
    }
}

/// For axial planes this tightens the relevant bounds axis to the
/// splitter's position; non-axial planes leave the AABB unchanged
/// (its volume shrinks but its bounding box does not).
fn clip_bounds(bounds: &Aabb, plane: &Plane, front: bool) -> Aabb {
    use geom::PlaneType;
    let mut b = *bounds;
    match plane.kind {
        PlaneType::AxialX => {
            if (plane.normal.x > 0.0) == front {
                b.mins.x = b.mins.x.max(plane.dist);
            } else {
                b.maxs.x = b.maxs.x.min(plane.dist);
            }
        }
        PlaneType::AxialY => {
            if (plane.normal.y > 0.0) == front {
                b.mins.y = b.mins.y.max(plane.dist);
            } else {
                b.maxs.y = b.maxs.y.min(plane.dist);
            }
        }
        PlaneType::AxialZ => {
            if (plane.normal.z > 0.0) == front {
                b.mins.z = b.mins.z.max(plane.dist);
            } else {
                b.maxs.z = b.maxs.z.min(plane.dist);
            }
        }
        _ => {}
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use brush::TexInfoId;
    use geom::Winding;
    use glam::Vec3;

    fn axial_csg_box(planes: &mut PlaneTable, index: usize, mins: Vec3, maxs: Vec3, contents: ContentFlags) -> CsgBrush {
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
            let mut w = Winding::base_for_plane(&plane, 1024.0);
            for (n2, d2) in faces {
                if n2 == normal {
                    continue;
                }
                let clip_plane = Plane::new(-n2, -d2);
                w = w.clip_back(&clip_plane, geom::ON_EPSILON);
            }
            sides.push(Side::new(plane_id, w, TexInfoId(0), 0, contents));
        }

        CsgBrush {
            source_brush: index,
            content_flags: contents,
            sides,
            aabb: Aabb::from_points([mins, maxs]),
        }
    }

    #[test]
    fn two_disjoint_solids_produce_at_least_two_leaves() {
        let mut planes = PlaneTable::new();
        let a = axial_csg_box(&mut planes, 0, Vec3::splat(-64.0), Vec3::splat(0.0), ContentFlags::SOLID);
        let b = axial_csg_box(
            &mut planes,
            1,
            Vec3::new(100.0, -64.0, -64.0),
            Vec3::new(164.0, 0.0, 0.0),
            ContentFlags::SOLID,
        );

        let bounds = Aabb::from_points([Vec3::splat(-512.0), Vec3::splat(512.0)]);
        let tree = build_tree(vec![a, b], bounds, &planes, &TreeConfig::default());

        assert!(tree.leaf_count() >= 2);
        let solid_leaves = tree
            .nodes
            .iter()
            .filter_map(|n| n.as_leaf())
            .filter(|l| l.content_flags.contains(ContentFlags::SOLID))
            .count();
        assert!(solid_leaves >= 1);
    }

    #[test]
    fn empty_map_is_a_single_void_leaf() {
        let planes = PlaneTable::new();
        let bounds = Aabb::from_points([Vec3::splat(-512.0), Vec3::splat(512.0)]);
        let tree = build_tree(Vec::new(), bounds, &planes, &TreeConfig::default());
        assert_eq!(tree.leaf_count(), 1);
        assert!(tree.get(tree.root).is_leaf());
    }

    #[test]
    fn leaf_at_finds_point_inside_solid() {
        let mut planes = PlaneTable::new();
        let a = axial_csg_box(&mut planes, 0, Vec3::splat(-64.0), Vec3::splat(64.0), ContentFlags::SOLID);
        let bounds = Aabb::from_points([Vec3::splat(-512.0), Vec3::splat(512.0)]);
        let tree = build_tree(vec![a], bounds, &planes, &TreeConfig::default());

        let inside = tree.leaf_at(&planes, Vec3::ZERO);
        let leaf = tree.get(inside).as_leaf().unwrap();
        assert!(leaf.content_flags.contains(ContentFlags::SOLID));

        let outside = tree.leaf_at(&planes, Vec3::splat(400.0));
        let leaf = tree.get(outside).as_leaf().unwrap();
        assert!(!leaf.content_flags.contains(ContentFlags::SOLID));
    }
}
