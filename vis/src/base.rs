use rayon::prelude::*;

use crate::bitset::BitSet;
use crate::types::VisGraph;

/// Quick mutual-reject test between two directed portals (qbsp/vis's
/// `BasePortalVis` trivial-reject pair): each portal's winding must have
/// at least one point strictly on the correct side of the other's
/// plane, after a radius-based sphere short-circuit.
fn portals_might_see(graph: &VisGraph, i: usize, j: usize, on_epsilon: f32) -> bool {
    let p = &graph.directed[i];
    let tp = &graph.directed[j];

    let tw = &tp.winding;
    let origin = tw.centroid();
    let d = p.plane.distance_to(origin);
    if d < -tw.radius() {
        return false;
    }
    if !tw.points.iter().any(|&pt| p.plane.distance_to(pt) > on_epsilon) {
        return false;
    }

    let w = &p.winding;
    let origin2 = w.centroid();
    let d2 = tp.plane.distance_to(origin2);
    if d2 > w.radius() {
        return false;
    }
    if !w.points.iter().any(|&pt| tp.plane.distance_to(pt) < -on_epsilon) {
        return false;
    }

    true
}

/// Recursively marks every leaf reachable from `leaf` by stepping only
/// through portals flagged visible in `portal_see` (qbsp/vis's
/// `SimpleFlood`), building portal `i`'s coarse `might_see` leaf bitset.
fn simple_flood(graph: &VisGraph, portal_see: &[bool], might_see: &mut BitSet, leaf: u32) {
    if might_see.get(leaf as usize) {
        return;
    }
    might_see.set(leaf as usize);

    for &qi in graph.portals_from(leaf) {
        if !portal_see[qi] {
            continue;
        }
        simple_flood(graph, portal_see, might_see, graph.directed[qi].target);
    }
}

/// Runs BasePortalVis + SimpleFlood over every directed portal in
/// `graph` (spec.md §4.7 Phase A), filling each portal's `might_see`.
/// Each portal's result depends only on `graph`'s immutable topology,
/// so the whole pass runs over `rayon`'s work-stealing pool (spec.md
/// §5's "PVS phase A (per portal)") before any result is written back.
pub fn base_portal_vis(graph: &mut VisGraph, on_epsilon: f32) {
    let n = graph.directed.len();
    let results: Vec<BitSet> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut portal_see = vec![false; n];
            for j in 0..n {
                if i == j {
                    continue;
                }
                if portals_might_see(graph, i, j, on_epsilon) {
                    portal_see[j] = true;
                }
            }

            // The flood starts at the portal's *target* leaf: a portal's
            // might_see answers "what can I see by looking through this
            // portal", not "what can my own leaf see".
            let mut might_see = BitSet::new(graph.num_leaves as usize);
            simple_flood(graph, &portal_see, &mut might_see, graph.directed[i].target);
            might_see
        })
        .collect();

    for (directed, might_see) in graph.directed.iter_mut().zip(results) {
        directed.might_see = might_see;
    }
}

#[cfg(test)]
mod tests {
    use bsptree::{Interior, Leaf, Node, NodeContent, NodeId, Tree};
    use brush::ContentFlags;
    use geom::{Aabb, Plane, PlaneTable, Winding};
    use glam::Vec3;
    use portal::{Portal, PortalSet};

    use super::*;
    use crate::types::build_graph;

    /// Two leaves sharing one portal: each should see itself and the
    /// other.
    fn two_leaf_graph() -> VisGraph {
        let mut planes = PlaneTable::new();
        let plane_id = planes.intern(Plane::new(Vec3::X, 0.0));

        let mut front = Leaf::empty(ContentFlags::empty());
        front.visleafnum = Some(0);
        front.viscluster = Some(0);
        let mut back = Leaf::empty(ContentFlags::empty());
        back.visleafnum = Some(1);
        back.viscluster = Some(1);

        let w = Winding::new(vec![
            Vec3::new(0.0, -10.0, -10.0),
            Vec3::new(0.0, 10.0, -10.0),
            Vec3::new(0.0, 10.0, 10.0),
            Vec3::new(0.0, -10.0, 10.0),
        ]);

        let front_node = Node { aabb: Aabb::EMPTY, content: NodeContent::Leaf(front) };
        let back_node = Node { aabb: Aabb::EMPTY, content: NodeContent::Leaf(back) };
        let root_node = Node {
            aabb: Aabb::EMPTY,
            content: NodeContent::Interior(Interior { plane_id, children: [NodeId(0), NodeId(1)], faces: Vec::new() }),
        };
        let mut tree = Tree { nodes: vec![front_node, back_node, root_node], root: NodeId(2) };

        let mut portals = PortalSet::default();
        let pid = portals.push(Portal { plane_id, winding: w, nodes: [NodeId(0), NodeId(1)] });
        tree.get_mut(NodeId(0)).as_leaf_mut().unwrap().portals = vec![pid];
        tree.get_mut(NodeId(1)).as_leaf_mut().unwrap().portals = vec![pid];

        build_graph(&tree, &portals, &planes)
    }

    #[test]
    fn portal_might_see_includes_its_own_target() {
        let mut graph = two_leaf_graph();
        base_portal_vis(&mut graph, geom::ON_EPSILON);

        for directed in &graph.directed {
            assert!(directed.might_see.get(directed.target as usize));
        }
    }
}
