//! Reconstructs the rich in-process types (`PlaneTable`, `bsptree::Tree`)
//! from an already-decoded [`format::generic::Bsp`], so `compile-vis`
//! and `compile-light` can run against a `.bsp` written by an earlier
//! `compile-geometry` invocation without that process having to persist
//! its own intermediate portal/tree state to disk.
//!
//! `portal::extract_portals` is a pure function of (tree, bounds,
//! planes), so re-deriving the tree here and re-running extraction
//! gives back the identical `PortalSet` the geometry phase saw, rather
//! than needing a `.prt` file parser to hand one across the process
//! boundary.

use bsptree::{Interior, Leaf, Node, NodeContent, NodeId, Tree};
use geom::{Aabb, Plane, PlaneId, PlaneTable};
use glam::Vec3;

use format::generic::Bsp;

/// Re-interns every on-disk plane in order. `PlaneTable::intern`
/// canonicalizes and dedups by value, and since `bsp.planes` was
/// originally produced by iterating a `PlaneTable` `0..len`, re-interning
/// in the same order reproduces the same ids (spec.md §3's "plane
/// number XOR 1" pairing survives the round trip).
pub fn planes_from_bsp(bsp: &Bsp) -> PlaneTable {
    let mut table = PlaneTable::new();
    for p in &bsp.planes {
        table.intern(Plane::new(p.normal, p.dist));
    }
    table
}

/// Rebuilds the arena `Tree` from `bsp`'s node/leaf lumps, plus the
/// arena ids of `bsp.leaves` in on-disk order (needed to translate
/// `vis::compute_pvs`'s leaf-index rows back into on-disk leaves).
pub fn tree_from_bsp(bsp: &Bsp) -> (Tree, Vec<NodeId>) {
    let mut tree = Tree { nodes: Vec::new(), root: NodeId(0) };
    let mut leaf_order = Vec::with_capacity(bsp.leaves.len());

    fn walk(bsp: &Bsp, encoded: i32, tree: &mut Tree, leaf_order: &mut Vec<NodeId>) -> NodeId {
        if encoded < 0 {
            let leaf = &bsp.leaves[(-encoded - 1) as usize];
            let markfaces = bsp.mark_surfaces[leaf.first_mark_surface as usize..(leaf.first_mark_surface + leaf.mark_surface_count) as usize]
                .iter()
                .map(|&f| f as usize)
                .collect();
            let mut leaf_node = Leaf::empty(leaf.contents);
            leaf_node.markfaces = markfaces;
            let id = tree.push(Node {
                aabb: Aabb { mins: Vec3::from_array(leaf.mins), maxs: Vec3::from_array(leaf.maxs) },
                content: NodeContent::Leaf(leaf_node),
            });
            leaf_order.push(id);
            id
        } else {
            let n = &bsp.nodes[encoded as usize];
            let c0 = walk(bsp, n.children[0], tree, leaf_order);
            let c1 = walk(bsp, n.children[1], tree, leaf_order);
            tree.push(Node {
                aabb: Aabb { mins: Vec3::from_array(n.mins), maxs: Vec3::from_array(n.maxs) },
                content: NodeContent::Interior(Interior { plane_id: PlaneId(n.plane), children: [c0, c1], faces: Vec::new() }),
            })
        }
    }

    let head = bsp.models.first().map(|m| m.head_nodes[0]).unwrap_or(-1);
    let root = walk(bsp, head, &mut tree, &mut leaf_order);
    tree.root = root;
    (tree, leaf_order)
}
