use geom::{Plane, Winding};

use crate::bitset::BitSet;
use crate::config::VisConfig;
use crate::error::VisError;
use crate::types::{LeafIndex, VisGraph};

/// One level of the portal-to-portal flood (qbsp/vis's `pstack_t`).
/// `pass` is `None` only at the root frame, matching the original's
/// "the second leaf can only be blocked if coplanar" fast path: the
/// very first hop skips separator refinement entirely.
struct Frame {
    source: Winding,
    pass: Option<Winding>,
    portal_plane: Plane,
    might_see: BitSet,
    /// Separator planes found for test levels 0 and 1, cached so
    /// sibling portals reuse them instead of re-deriving (spec.md
    /// §4.7's "cache generated separators for tests 0,1 per stack
    /// frame").
    separators: [Vec<Plane>; 2],
}

fn normals_coplanar(a: glam::Vec3, b: glam::Vec3) -> bool {
    (a - b).length_squared() < 1e-8
}

/// Generates separating-plane candidates from pairs of `source` points
/// and one `pass` point, keeping only those planes with every other
/// `pass` point strictly in front; clips `target` by the first one
/// found per `source` edge (qbsp/vis's `ClipToSeperators`, spec.md
/// §4.7's `ClipToSeparators`).
#[allow(clippy::too_many_arguments)]
fn clip_to_separators(
    source: &Winding,
    src_plane: &Plane,
    pass: &Winding,
    mut target: Winding,
    test: usize,
    collected: &mut Vec<Plane>,
    config: &VisConfig,
) -> Result<Option<Winding>, VisError> {
    let eps = config.on_epsilon;
    let n = source.points.len();

    'edges: for i in 0..n {
        let l = (i + 1) % n;
        let v1 = source.points[l] - source.points[i];

        for (j, &pass_j) in pass.points.iter().enumerate() {
            let d = src_plane.distance_to(pass_j);
            let fliptest = if d < -eps {
                true
            } else if d > eps {
                false
            } else {
                continue;
            };

            let v2 = pass_j - source.points[i];
            let mut normal = v1.cross(v2);
            let len_sq = normal.length_squared();
            if len_sq < eps {
                continue;
            }
            normal /= len_sq.sqrt();
            let mut dist = pass_j.dot(normal);
            if fliptest {
                normal = -normal;
                dist = -dist;
            }

            let mut separating = true;
            let mut any_strictly_positive = false;
            for (k, &pk) in pass.points.iter().enumerate() {
                if k == j {
                    continue;
                }
                let dk = pk.dot(normal) - dist;
                if dk < -eps {
                    separating = false;
                    break;
                } else if dk > eps {
                    any_strictly_positive = true;
                }
            }
            if !separating || !any_strictly_positive {
                continue;
            }

            if test & 1 == 1 {
                normal = -normal;
                dist = -dist;
            }
            let sep = Plane::new(normal, dist);

            if test < 2 {
                if collected.len() >= config.max_separators {
                    return Err(VisError::TooManySeparators { max: config.max_separators });
                }
                collected.push(sep);
            }

            target = target.clip_front(&sep, eps);
            if target.is_empty() {
                return Ok(None);
            }
            continue 'edges;
        }
    }
    Ok(Some(target))
}

fn clip_by_cached(mut target: Winding, separators: &[Plane], eps: f32) -> Option<Winding> {
    for sep in separators {
        target = target.clip_front(sep, eps);
        if target.is_empty() {
            return None;
        }
    }
    Some(target)
}

/// Recursive frustum flood through the portal graph for one source
/// portal (qbsp/vis's `RecursiveLeafFlow`). `root_plane` is the
/// originating portal's own plane, fixed for the whole recursion.
fn recursive_leaf_flow(
    graph: &VisGraph,
    leaf: LeafIndex,
    prev: &Frame,
    root_plane: &Plane,
    vis_see: &mut BitSet,
    config: &VisConfig,
) -> Result<(), VisError> {
    vis_see.set(leaf as usize);

    'portals: for &qi in graph.portals_from(leaf) {
        let q = &graph.directed[qi];

        if !prev.might_see.get(q.target as usize) {
            continue;
        }

        let mut might_see = prev.might_see.clone();
        might_see.intersect_with(&q.might_see);
        if !might_see.has_bits_not_in(vis_see) {
            continue;
        }

        let backplane = q.plane.negate();
        if normals_coplanar(prev.portal_plane.normal, backplane.normal) {
            continue;
        }

        let mut pass = q.winding.clip_front(root_plane, config.on_epsilon);
        if pass.is_empty() {
            continue;
        }

        let (source, separators) = match &prev.pass {
            None => (prev.source.clone(), [Vec::new(), Vec::new()]),
            Some(prev_pass) => {
                pass = pass.clip_front(&prev.portal_plane, config.on_epsilon);
                if pass.is_empty() {
                    continue;
                }

                let mut source = prev.source.clip_front(&backplane, config.on_epsilon);
                if source.is_empty() {
                    continue;
                }

                let mut sep0 = Vec::new();
                let mut sep1 = Vec::new();

                if config.test_level > 0 {
                    let clipped = if !prev.separators[0].is_empty() {
                        clip_by_cached(pass, &prev.separators[0], config.on_epsilon)
                    } else {
                        clip_to_separators(&prev.source, root_plane, prev_pass, pass, 0, &mut sep0, config)?
                    };
                    let Some(clipped) = clipped else { continue 'portals };
                    pass = clipped;
                }

                if config.test_level > 1 {
                    let clipped = if !prev.separators[1].is_empty() {
                        clip_by_cached(pass, &prev.separators[1], config.on_epsilon)
                    } else {
                        clip_to_separators(prev_pass, &prev.portal_plane, &prev.source, pass, 1, &mut sep1, config)?
                    };
                    let Some(clipped) = clipped else { continue 'portals };
                    pass = clipped;
                }

                if config.test_level > 2 {
                    let clipped = clip_to_separators(&pass, &q.plane, prev_pass, source, 2, &mut Vec::new(), config)?;
                    let Some(clipped) = clipped else { continue 'portals };
                    source = clipped;
                }

                if config.test_level > 3 {
                    let clipped = clip_to_separators(prev_pass, &prev.portal_plane, &pass, source, 3, &mut Vec::new(), config)?;
                    let Some(clipped) = clipped else { continue 'portals };
                    source = clipped;
                }

                (source, [sep0, sep1])
            }
        };

        let new_frame = Frame { source, pass: Some(pass), portal_plane: q.plane, might_see, separators };
        recursive_leaf_flow(graph, q.target, &new_frame, root_plane, vis_see, config)?;
    }

    Ok(())
}

/// Runs PortalFlow for one directed portal (spec.md §4.7 Phase B),
/// returning the fully-refined set of leaves it can see. Independent
/// per portal: safe to dispatch with `rayon`'s `parallel_for`.
pub fn portal_flow(graph: &VisGraph, portal_idx: usize, config: &VisConfig) -> Result<BitSet, VisError> {
    let portal = &graph.directed[portal_idx];
    let mut vis_see = BitSet::new(graph.num_leaves as usize);

    let root = Frame {
        source: portal.winding.clone(),
        pass: None,
        portal_plane: portal.plane,
        might_see: portal.might_see.clone(),
        separators: [Vec::new(), Vec::new()],
    };

    recursive_leaf_flow(graph, portal.target, &root, &portal.plane, &mut vis_see, config)?;
    Ok(vis_see)
}

#[cfg(test)]
mod tests {
    use bsptree::{Interior, Leaf, Node, NodeContent, NodeId, Tree};
    use brush::ContentFlags;
    use geom::{Aabb, PlaneTable};
    use glam::Vec3;
    use portal::{Portal, PortalSet};

    use super::*;
    use crate::base::base_portal_vis;
    use crate::types::build_graph;

    /// Three leaves in a row (A|B|C), each pair joined by one portal.
    /// A should end up seeing C through B once both phases run.
    fn chain_graph() -> VisGraph {
        let mut planes = PlaneTable::new();
        let plane_ab = planes.intern(Plane::new(Vec3::X, 0.0));
        let plane_bc = planes.intern(Plane::new(Vec3::X, 20.0));

        let mut la = Leaf::empty(ContentFlags::empty());
        la.visleafnum = Some(0);
        let mut lb = Leaf::empty(ContentFlags::empty());
        lb.visleafnum = Some(1);
        let mut lc = Leaf::empty(ContentFlags::empty());
        lc.visleafnum = Some(2);

        let w = |x: f32| {
            Winding::new(vec![
                Vec3::new(x, -10.0, -10.0),
                Vec3::new(x, 10.0, -10.0),
                Vec3::new(x, 10.0, 10.0),
                Vec3::new(x, -10.0, 10.0),
            ])
        };

        let node_a = Node { aabb: Aabb::EMPTY, content: NodeContent::Leaf(la) };
        let node_b = Node { aabb: Aabb::EMPTY, content: NodeContent::Leaf(lb) };
        let node_c = Node { aabb: Aabb::EMPTY, content: NodeContent::Leaf(lc) };
        // Dummy interior nodes just to give the tree a valid shape; vis
        // only reads leaves, so their split planes are unused.
        let inner = Node {
            aabb: Aabb::EMPTY,
            content: NodeContent::Interior(Interior { plane_id: plane_ab, children: [NodeId(1), NodeId(2)], faces: Vec::new() }),
        };
        let root = Node {
            aabb: Aabb::EMPTY,
            content: NodeContent::Interior(Interior { plane_id: plane_ab, children: [NodeId(0), NodeId(3)], faces: Vec::new() }),
        };
        let mut tree = Tree { nodes: vec![node_a, node_b, node_c, inner, root], root: NodeId(4) };

        let mut portals = PortalSet::default();
        let p_ab = portals.push(Portal { plane_id: plane_ab, winding: w(0.0), nodes: [NodeId(0), NodeId(1)] });
        let p_bc = portals.push(Portal { plane_id: plane_bc, winding: w(20.0), nodes: [NodeId(1), NodeId(2)] });
        tree.get_mut(NodeId(0)).as_leaf_mut().unwrap().portals = vec![p_ab];
        tree.get_mut(NodeId(1)).as_leaf_mut().unwrap().portals = vec![p_ab, p_bc];
        tree.get_mut(NodeId(2)).as_leaf_mut().unwrap().portals = vec![p_bc];

        build_graph(&tree, &portals, &planes)
    }

    #[test]
    fn leaf_a_sees_leaf_c_through_leaf_b() {
        let mut graph = chain_graph();
        base_portal_vis(&mut graph, geom::ON_EPSILON);

        let config = VisConfig::default();
        let a_to_b = graph.directed.iter().position(|d| d.leaf == 0 && d.target == 1).unwrap();
        let vis = portal_flow(&graph, a_to_b, &config).unwrap();

        assert!(vis.get(1), "A must see B directly");
        assert!(vis.get(2), "A must see C through B's second portal");
    }
}
