use bsptree::{NodeId, Tree};
use geom::{Plane, PlaneTable, Winding};
use portal::{is_outside, PortalSet};

use crate::bitset::BitSet;

/// Dense index into the PVS's leaf space, i.e. `Leaf::visleafnum`
/// (spec.md §4.7 talks about "leaf" bits, not tree node ids — portals
/// and their bitsets are indexed this way throughout `vis`).
pub type LeafIndex = u32;

/// One direction of travel through a physical [`portal::Portal`]
/// (classic `vis.c` doubles every portal into two directed copies so
/// `plane` always faces away from `leaf`, into `target`). `portal_id`
/// names the backing [`portal::Portal`] so results can be written back
/// onto it once both directions are solved.
#[derive(Debug, Clone)]
pub struct DirectedPortal {
    pub portal_id: u32,
    pub leaf: LeafIndex,
    pub target: LeafIndex,
    pub plane: Plane,
    pub winding: Winding,
    /// Coarse reachable set from phase A (spec.md §4.7 "SimpleFlood").
    pub might_see: BitSet,
    /// Refined PVS contribution from phase B, one bit per leaf.
    pub vis_see: BitSet,
}

/// The directed-portal graph phases A and B both operate over, plus
/// the node-id <-> leaf-index mapping needed to translate back to
/// `bsptree` when we're done.
pub struct VisGraph {
    pub num_leaves: u32,
    pub directed: Vec<DirectedPortal>,
    /// Directed-portal indices leaving each leaf.
    pub leaf_portals: Vec<Vec<usize>>,
    pub node_of_leaf: Vec<NodeId>,
}

impl VisGraph {
    pub fn portals_from(&self, leaf: LeafIndex) -> &[usize] {
        &self.leaf_portals[leaf as usize]
    }
}

/// Builds the directed portal graph (spec.md §4.7). Portals touching
/// [`portal::OUTSIDE`] or an opaque (solid, no `visleafnum`) leaf never
/// carried real player space and are dropped, matching `write_prt1`'s
/// filtering.
pub fn build_graph(tree: &Tree, portals: &PortalSet, _planes: &PlaneTable) -> VisGraph {
    let mut node_of_leaf = Vec::new();
    for (i, node) in tree.nodes.iter().enumerate() {
        if let Some(leaf) = node.as_leaf() {
            if let Some(num) = leaf.visleafnum {
                if num as usize >= node_of_leaf.len() {
                    node_of_leaf.resize(num as usize + 1, NodeId(0));
                }
                node_of_leaf[num as usize] = NodeId(i as u32);
            }
        }
    }
    let num_leaves = node_of_leaf.len() as u32;

    let mut directed = Vec::new();
    let mut leaf_portals = vec![Vec::new(); num_leaves as usize];

    let leafnum_of = |node: NodeId| -> Option<u32> { tree.get(node).as_leaf().and_then(|l| l.visleafnum) };

    for (pid, portal) in portals.portals.iter().enumerate() {
        let [a, b] = portal.nodes;
        if is_outside(a) || is_outside(b) {
            continue;
        }
        let (Some(la), Some(lb)) = (leafnum_of(a), leafnum_of(b)) else {
            continue;
        };

        let plane = *_planes.get(portal.plane_id);

        // nodes[0] (a) sits on the plane's positive side, so a portal
        // leaving `a` faces the negative direction.
        push_directed(&mut directed, &mut leaf_portals, pid as u32, la, lb, plane.negate(), portal.winding.clone(), num_leaves);
        push_directed(&mut directed, &mut leaf_portals, pid as u32, lb, la, plane, portal.winding.clone(), num_leaves);
    }

    VisGraph { num_leaves, directed, leaf_portals, node_of_leaf }
}

#[allow(clippy::too_many_arguments)]
fn push_directed(
    directed: &mut Vec<DirectedPortal>,
    leaf_portals: &mut [Vec<usize>],
    portal_id: u32,
    leaf: LeafIndex,
    target: LeafIndex,
    plane: Plane,
    winding: Winding,
    num_leaves: u32,
) {
    let idx = directed.len();
    directed.push(DirectedPortal {
        portal_id,
        leaf,
        target,
        plane,
        winding,
        might_see: BitSet::new(num_leaves as usize),
        vis_see: BitSet::new(num_leaves as usize),
    });
    leaf_portals[leaf as usize].push(idx);
}
