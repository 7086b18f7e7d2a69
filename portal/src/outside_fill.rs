use std::collections::VecDeque;

use bsptree::{NodeId, Tree};
use brush::ContentFlags;
use geom::PlaneTable;
use glam::Vec3;

use crate::error::PortalError;
use crate::types::{is_outside, PortalSet};

/// Finds the leaf containing each entity's origin and marks it occupied,
/// first-found-wins per leaf (qbsp's `FindOccupiedLeafs`). Origins that
/// land in a leak-structural leaf (opaque, or `DETAIL_SOLID`) are ignored
/// — a misplaced entity can't seed the flood.
fn find_occupied_leafs(tree: &mut Tree, entity_origins: &[Vec3], planes: &PlaneTable) -> Vec<NodeId> {
    let mut occupied = Vec::new();
    for (idx, &origin) in entity_origins.iter().enumerate() {
        let leaf_id = tree.leaf_at(planes, origin);
        let leaf = tree.get_mut(leaf_id).as_leaf_mut().expect("leaf_at always returns a leaf");
        if leaf.content_flags.blocks_leak_flood() {
            continue;
        }
        if leaf.occupant.is_some() {
            continue;
        }
        leaf.occupant = Some(idx);
        occupied.push(leaf_id);
    }
    occupied
}

/// True if player space can pass between the portal's two leaves: both
/// sides must be real (non-exterior) leaves and neither opaque. Mirrors
/// `Portal_Passable`.
fn passable(tree: &Tree, nodes: [NodeId; 2]) -> bool {
    nodes.iter().all(|&n| {
        if is_outside(n) {
            return false;
        }
        !tree.get(n).as_leaf().expect("portal endpoint is always a leaf").content_flags.blocks_leak_flood()
    })
}

/// Labels every leaf reachable from `seeds` with its BFS distance
/// (`occupied_distance`, 1 at the seeds themselves), walking only
/// passable portals. Never steps onto [`crate::types::OUTSIDE`] — distance
/// labelling stays confined to real leaves so a leak surfaces as "a
/// reachable leaf whose portal touches the exterior", not as a step of
/// the walk itself (qbsp's `BFSFloodFillFromOccupiedLeafs`).
fn bfs_fill(tree: &mut Tree, portals: &PortalSet, seeds: &[NodeId]) {
    let mut queue: VecDeque<(NodeId, i32)> = VecDeque::new();
    for &seed in seeds {
        let leaf = tree.get_mut(seed).as_leaf_mut().unwrap();
        if leaf.occupied_distance == i32::MAX {
            leaf.occupied_distance = 1;
            queue.push_back((seed, 1));
        }
    }

    while let Some((node, dist)) = queue.pop_front() {
        let portal_ids = tree.get(node).as_leaf().unwrap().portals.clone();
        for pid in portal_ids {
            let portal = portals.get(pid);
            if !passable(tree, portal.nodes) {
                continue;
            }
            let neighbour = portal.other(node);
            let neighbour_leaf = tree.get_mut(neighbour).as_leaf_mut().unwrap();
            if neighbour_leaf.occupied_distance != i32::MAX {
                continue;
            }
            neighbour_leaf.occupied_distance = dist + 1;
            queue.push_back((neighbour, dist + 1));
        }
    }
}

/// A leaf is leaking if the flood reached it and it still borders the
/// true exterior — a non-opaque path exists from player space straight
/// out of the map. Scans in node-id order so the report is deterministic.
fn find_leak_leaf(tree: &Tree, portals: &PortalSet) -> Option<NodeId> {
    for (i, node) in tree.nodes.iter().enumerate() {
        let Some(leaf) = node.as_leaf() else { continue };
        if leaf.occupied_distance == i32::MAX {
            continue;
        }
        for &pid in &leaf.portals {
            if is_outside(portals.get(pid).other(NodeId(i as u32))) {
                return Some(NodeId(i as u32));
            }
        }
    }
    None
}

/// Walks strictly-decreasing `occupied_distance` from the leaking leaf
/// back to the occupied leaf that started the flood, recording the
/// portal crossed at each step (qbsp's `MakeLeakLine`). Returns the
/// crossed portal ids in leak-to-entity order plus the entity index
/// found at the walk's end.
fn trace_leak_chain(tree: &Tree, portals: &PortalSet, leak_leaf: NodeId) -> (Vec<u32>, usize) {
    let mut chain = Vec::new();
    let mut node = leak_leaf;
    loop {
        let leaf = tree.get(node).as_leaf().unwrap();
        if let Some(entity_idx) = leaf.occupant {
            if leaf.occupied_distance == 1 {
                return (chain, entity_idx);
            }
        }

        let mut best: Option<(NodeId, u32, i32)> = None;
        for &pid in &leaf.portals {
            let portal = portals.get(pid);
            let neighbour = portal.other(node);
            if is_outside(neighbour) {
                continue;
            }
            let neighbour_leaf = tree.get(neighbour).as_leaf().unwrap();
            if neighbour_leaf.occupied_distance == i32::MAX {
                continue;
            }
            let better = match best {
                Some((_, _, d)) => neighbour_leaf.occupied_distance < d,
                None => true,
            };
            if neighbour_leaf.occupied_distance < leaf.occupied_distance && better {
                best = Some((neighbour, pid, neighbour_leaf.occupied_distance));
            }
        }

        let (next_node, pid, _) = best.expect("a reachable non-seed leaf always has a shorter-distance neighbour");
        chain.push(pid);
        node = next_node;
    }
}

fn leak_trail(tree: &Tree, portals: &PortalSet, entity_origins: &[Vec3], leak_leaf: NodeId) -> Vec<Vec3> {
    let (chain, entity_idx) = trace_leak_chain(tree, portals, leak_leaf);
    let mut trail = Vec::with_capacity(chain.len() + 1);
    trail.push(entity_origins[entity_idx]);
    for &pid in chain.iter().rev() {
        trail.push(portals.get(pid).winding.centroid());
    }
    trail
}

/// Void leaves the flood never reached (and that aren't sky) are filled
/// to solid — they're dead space behind sealed walls and would otherwise
/// cost faces and vis work for nothing (qbsp's `OutLeafsToSolid`).
fn fill_unreached(tree: &mut Tree) -> usize {
    let mut filled = 0;
    for node in tree.nodes.iter_mut() {
        let Some(leaf) = node.as_leaf_mut() else { continue };
        if leaf.occupied_distance != i32::MAX {
            continue;
        }
        if leaf.content_flags.blocks_leak_flood() || leaf.content_flags.contains(ContentFlags::SKY) {
            continue;
        }
        leaf.content_flags = ContentFlags::SOLID;
        filled += 1;
    }
    filled
}

/// Runs outside-fill end to end: seed from entity origins, flood, check
/// for a leak, and otherwise solidify everything the flood didn't reach.
/// Returns the number of leaves converted to solid.
pub fn run(tree: &mut Tree, portals: &PortalSet, entity_origins: &[Vec3], planes: &PlaneTable) -> Result<usize, PortalError> {
    let occupied = find_occupied_leafs(tree, entity_origins, planes);
    bfs_fill(tree, portals, &occupied);

    if let Some(leak_leaf) = find_leak_leaf(tree, portals) {
        let trail = leak_trail(tree, portals, entity_origins, leak_leaf);
        return Err(PortalError::Leak { trail });
    }

    Ok(fill_unreached(tree))
}
