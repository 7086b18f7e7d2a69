use brush::{ContentFlags, TexInfoId};
use bsptree::{NodeContent, NodeId, Tree};
use csg::CsgBrush;
use geom::{PlaneId, PlaneTable, Winding, ON_EPSILON};

/// One brush-side fragment restricted to the exact region of the node
/// whose splitter plane it lies on (spec.md §4.6: "the set of brush-side
/// fragments that lie on N's plane from the brushes in both subtrees").
#[derive(Debug, Clone)]
pub struct RawFragment {
    pub node: NodeId,
    pub plane_id: PlaneId,
    /// 0 if the fragment's own plane equals the node's splitter plane,
    /// 1 if it is the opposite orientation (the node's plane is
    /// `plane_id.opposite()`), matching spec.md §3's `Face.side`.
    pub side: u8,
    pub texinfo_id: TexInfoId,
    pub content_flags: ContentFlags,
    pub winding: Winding,
}

/// One ancestor constraint threaded down the recursion: at this plane,
/// stay on the `front` (or back) half-space.
#[derive(Debug, Clone, Copy)]
struct Constraint {
    plane_id: PlaneId,
    front: bool,
}

/// Walks `tree` from the root, and at every interior node collects the
/// fragments of every brush side (across the whole map, not just this
/// node's subtree — the same plane's geometry can come from brushes
/// that were later split apart by earlier ancestors) whose plane
/// coincides with the node's splitter plane, clipped down to the
/// node's exact region by every ancestor half-space.
pub fn collect_fragments(tree: &Tree, brushes: &[CsgBrush], planes: &PlaneTable, epsilon: f32) -> Vec<RawFragment> {
    let mut out = Vec::new();
    walk(tree, tree.root, &[], brushes, planes, epsilon, &mut out);
    out
}

fn walk(
    tree: &Tree,
    node_id: NodeId,
    ancestors: &[Constraint],
    brushes: &[CsgBrush],
    planes: &PlaneTable,
    epsilon: f32,
    out: &mut Vec<RawFragment>,
) {
    let NodeContent::Interior(interior) = &tree.get(node_id).content else {
        return;
    };
    let plane_id = interior.plane_id;

    for brush in brushes {
        for side in &brush.sides {
            let side = side;
            let (matches, orientation) = if side.plane_id == plane_id {
                (true, 0u8)
            } else if side.plane_id == plane_id.opposite() {
                (true, 1u8)
            } else {
                (false, 0)
            };
            if !matches || side.winding.is_empty() {
                continue;
            }

            let mut w = side.winding.clone();
            for c in ancestors {
                if w.is_empty() {
                    break;
                }
                let cplane = planes.get(c.plane_id);
                w = if c.front { w.clip_front(cplane, epsilon) } else { w.clip_back(cplane, epsilon) };
            }
            if w.is_empty() {
                continue;
            }

            out.push(RawFragment {
                node: node_id,
                plane_id,
                side: orientation,
                texinfo_id: side.texinfo_id,
                content_flags: brush.content_flags,
                winding: w,
            });
        }
    }

    let mut front_ancestors = ancestors.to_vec();
    front_ancestors.push(Constraint { plane_id, front: true });
    walk(tree, interior.children[0], &front_ancestors, brushes, planes, epsilon, out);

    let mut back_ancestors = ancestors.to_vec();
    back_ancestors.push(Constraint { plane_id, front: false });
    walk(tree, interior.children[1], &back_ancestors, brushes, planes, epsilon, out);
}

pub fn default_on_epsilon() -> f32 {
    ON_EPSILON
}
