use bsptree::NodeId;
use geom::{PlaneId, Winding};

/// Sentinel standing in for "the unbounded exterior of the padded world
/// box" — qbsp's `outside_node`. Never indexes into a real [`bsptree::Tree`];
/// only ever appears as one side of a boundary [`Portal`].
pub const OUTSIDE: NodeId = NodeId(u32::MAX);

pub fn is_outside(node: NodeId) -> bool {
    node == OUTSIDE
}

pub type PortalId = u32;

/// One shared boundary between two leaves (or a leaf and [`OUTSIDE`]),
/// lying on `plane_id` (spec.md §3's `Portal`). `nodes[0]` is the leaf on
/// the plane's front side, `nodes[1]` the leaf on its back side.
#[derive(Debug, Clone)]
pub struct Portal {
    pub plane_id: PlaneId,
    pub winding: Winding,
    pub nodes: [NodeId; 2],
}

impl Portal {
    /// The node on the opposite side of `from`.
    pub fn other(&self, from: NodeId) -> NodeId {
        if self.nodes[0] == from {
            self.nodes[1]
        } else {
            self.nodes[0]
        }
    }
}

#[derive(Debug, Default)]
pub struct PortalSet {
    pub portals: Vec<Portal>,
}

impl PortalSet {
    pub fn get(&self, id: PortalId) -> &Portal {
        &self.portals[id as usize]
    }

    pub fn push(&mut self, portal: Portal) -> PortalId {
        let id = self.portals.len() as PortalId;
        self.portals.push(portal);
        id
    }
}
