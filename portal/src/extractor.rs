use bsptree::{NodeContent, NodeId, Tree};
use geom::{Aabb, Plane, PlaneId, PlaneTable, Winding};
use glam::Vec3;

use crate::types::{is_outside, Portal, PortalId, PortalSet, OUTSIDE};

type BuilderId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Endpoint {
    Unresolved(NodeId),
    Resolved(NodeId),
}

/// An in-progress portal: a fragment of some splitter plane's cross
/// section whose two sides are still being traced down to leaves.
/// `front`/`back` name the plane's positive/negative half-spaces, same
/// convention as [`geom::Plane::distance_to`].
#[derive(Debug, Clone)]
struct BuilderCell {
    plane_id: PlaneId,
    winding: Winding,
    front: Endpoint,
    back: Endpoint,
}

/// Builds the tree's dual portal graph (spec.md §4.5). Six padded
/// outside portals seed the descent; every interior node's own
/// splitter contributes one new cross-section portal shared by its two
/// children, and every existing portal touching that node is clipped
/// in two by the same plane. Finished portals are written onto
/// `tree`'s leaves (`Leaf::portals`) and returned as a flat set.
pub fn extract_portals(tree: &mut Tree, world_bounds: Aabb, planes: &mut PlaneTable, on_epsilon: f32) -> PortalSet {
    let node_count = tree.nodes.len();
    let mut builders: Vec<BuilderCell> = Vec::new();
    let mut pending: Vec<Vec<BuilderId>> = vec![Vec::new(); node_count];
    let mut leaf_portals: Vec<Vec<PortalId>> = vec![Vec::new(); node_count];

    let big_extent = world_bounds.longest_axis_extent().max(64.0) * 4.0 + 1024.0;
    let pad = 32.0;

    seed_outside_portals(tree.root, world_bounds, pad, big_extent, planes, &mut builders, &mut pending);

    let mut portal_set = PortalSet::default();
    visit(
        tree,
        tree.root,
        &mut builders,
        &mut pending,
        planes,
        on_epsilon,
        big_extent,
        &mut portal_set,
        &mut leaf_portals,
    );

    for (i, ids) in leaf_portals.into_iter().enumerate() {
        if ids.is_empty() {
            continue;
        }
        if let Some(leaf) = tree.get_mut(NodeId(i as u32)).as_leaf_mut() {
            leaf.portals = ids;
        }
    }

    portal_set
}

fn seed_outside_portals(
    root: NodeId,
    bounds: Aabb,
    pad: f32,
    big_extent: f32,
    planes: &mut PlaneTable,
    builders: &mut Vec<BuilderCell>,
    pending: &mut [Vec<BuilderId>],
) {
    let mins = bounds.mins - Vec3::splat(pad);
    let maxs = bounds.maxs + Vec3::splat(pad);
    let faces = [
        (Vec3::X, maxs.x),
        (-Vec3::X, -mins.x),
        (Vec3::Y, maxs.y),
        (-Vec3::Y, -mins.y),
        (Vec3::Z, maxs.z),
        (-Vec3::Z, -mins.z),
    ];

    for (normal, dist) in faces {
        let raw = Plane::new(normal, dist);
        let plane_id = planes.intern(raw);
        let canonical = *planes.get(plane_id);

        let mut w = Winding::base_for_plane(&canonical, big_extent);
        for (n2, d2) in faces {
            if n2 == normal {
                continue;
            }
            let clip_plane = Plane::new(-n2, -d2);
            w = w.clip_back(&clip_plane, geom::ON_EPSILON);
        }
        if w.is_empty() {
            continue;
        }

        let exterior_is_front = canonical.normal.dot(normal) > 0.0;
        let id = builders.len() as BuilderId;
        builders.push(BuilderCell {
            plane_id,
            winding: w,
            front: if exterior_is_front { Endpoint::Resolved(OUTSIDE) } else { Endpoint::Unresolved(root) },
            back: if exterior_is_front { Endpoint::Unresolved(root) } else { Endpoint::Resolved(OUTSIDE) },
        });
        pending[root.0 as usize].push(id);
    }
}

#[allow(clippy::too_many_arguments)]
fn visit(
    tree: &Tree,
    node_id: NodeId,
    builders: &mut Vec<BuilderCell>,
    pending: &mut Vec<Vec<BuilderId>>,
    planes: &PlaneTable,
    eps: f32,
    big_extent: f32,
    portal_set: &mut PortalSet,
    leaf_portals: &mut Vec<Vec<PortalId>>,
) {
    let incoming = std::mem::take(&mut pending[node_id.0 as usize]);

    match &tree.get(node_id).content {
        NodeContent::Leaf(_) => {
            for bid in incoming {
                resolve(bid, node_id, builders, portal_set, leaf_portals);
            }
        }
        NodeContent::Interior(interior) => {
            let plane_id = interior.plane_id;
            let plane = *planes.get(plane_id);
            let (front_child, back_child) = (interior.children[0], interior.children[1]);

            let mut cross_section = Winding::base_for_plane(&plane, big_extent);
            for &bid in &incoming {
                if cross_section.is_empty() {
                    break;
                }
                let cell = &builders[bid as usize];
                let inside_is_front = matches!(cell.front, Endpoint::Unresolved(n) if n == node_id);
                let bound_plane = planes.get(cell.plane_id);
                cross_section =
                    if inside_is_front { cross_section.clip_front(bound_plane, eps) } else { cross_section.clip_back(bound_plane, eps) };
            }

            for bid in incoming {
                let cell = builders[bid as usize].clone();
                let (front_w, back_w) = cell.winding.clip(&plane, eps);
                let inside_is_front = matches!(cell.front, Endpoint::Unresolved(n) if n == node_id);

                let mut reused = false;
                if !front_w.is_empty() {
                    let mut fragment = cell.clone();
                    fragment.winding = front_w;
                    if inside_is_front {
                        fragment.front = Endpoint::Unresolved(front_child);
                    } else {
                        fragment.back = Endpoint::Unresolved(front_child);
                    }
                    builders[bid as usize] = fragment;
                    pending[front_child.0 as usize].push(bid);
                    reused = true;
                }

                if !back_w.is_empty() {
                    let mut fragment = cell.clone();
                    fragment.winding = back_w;
                    if inside_is_front {
                        fragment.front = Endpoint::Unresolved(back_child);
                    } else {
                        fragment.back = Endpoint::Unresolved(back_child);
                    }

                    let new_id = if reused {
                        let id = builders.len() as BuilderId;
                        builders.push(fragment);
                        id
                    } else {
                        builders[bid as usize] = fragment;
                        bid
                    };
                    pending[back_child.0 as usize].push(new_id);

                    if new_id != bid {
                        // A brand new id was minted: the side that did NOT
                        // just advance still points at whatever this
                        // builder pointed at before the split, and needs
                        // its own registration there too.
                        let other = if inside_is_front { cell.back } else { cell.front };
                        if let Endpoint::Unresolved(far) = other {
                            pending[far.0 as usize].push(new_id);
                        }
                    }
                }
            }

            if !cross_section.is_empty() {
                let new_id = builders.len() as BuilderId;
                builders.push(BuilderCell {
                    plane_id,
                    winding: cross_section,
                    front: Endpoint::Unresolved(front_child),
                    back: Endpoint::Unresolved(back_child),
                });
                pending[front_child.0 as usize].push(new_id);
                pending[back_child.0 as usize].push(new_id);
            }

            visit(tree, front_child, builders, pending, planes, eps, big_extent, portal_set, leaf_portals);
            visit(tree, back_child, builders, pending, planes, eps, big_extent, portal_set, leaf_portals);
        }
    }
}

fn resolve(bid: BuilderId, leaf: NodeId, builders: &mut [BuilderCell], portal_set: &mut PortalSet, leaf_portals: &mut [Vec<PortalId>]) {
    let cell = &mut builders[bid as usize];
    if let Endpoint::Unresolved(n) = cell.front {
        if n == leaf {
            cell.front = Endpoint::Resolved(leaf);
        }
    }
    if let Endpoint::Unresolved(n) = cell.back {
        if n == leaf {
            cell.back = Endpoint::Resolved(leaf);
        }
    }

    if let (Endpoint::Resolved(a), Endpoint::Resolved(b)) = (cell.front, cell.back) {
        if cell.winding.is_empty() {
            return;
        }
        let portal = Portal { plane_id: cell.plane_id, winding: cell.winding.clone(), nodes: [a, b] };
        let id = portal_set.push(portal);
        if !is_outside(a) {
            leaf_portals[a.0 as usize].push(id);
        }
        if !is_outside(b) {
            leaf_portals[b.0 as usize].push(id);
        }
    }
}
