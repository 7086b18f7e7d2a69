use brush::ContentFlags;
use geom::{Aabb, PlaneId};

/// Arena index into [`Tree::nodes`], used instead of owned child
/// pointers so portals (built afterwards by the `portal` crate) can
/// reference leaves without back-owning them (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug)]
pub struct Interior {
    pub plane_id: PlaneId,
    pub children: [NodeId; 2],
    /// Populated by the `face` crate after portal extraction; empty
    /// coming out of `TreeBuilder`.
    pub faces: Vec<u32>,
}

#[derive(Debug)]
pub struct Leaf {
    pub content_flags: ContentFlags,
    /// Indices into the CSG brush-fragment list that touch this leaf's
    /// volume, used both to derive `content_flags` and later as
    /// candidate geometry for `FaceBuilder`'s markfaces.
    pub markfaces: Vec<usize>,
    /// Portal ids, filled in by `portal::PortalExtractor`; empty until
    /// then.
    pub portals: Vec<u32>,
    pub viscluster: Option<u32>,
    pub visleafnum: Option<u32>,
    /// Index of a non-world entity whose `origin` falls in this leaf,
    /// set by outside-fill's entity-origin scan.
    pub occupant: Option<usize>,
    /// BFS distance from the nearest occupied leaf; used to replay the
    /// leak trail back to the surface (spec.md §4.5).
    pub occupied_distance: i32,
}

impl Leaf {
    pub fn empty(content_flags: ContentFlags) -> Self {
        Self {
            content_flags,
            markfaces: Vec::new(),
            portals: Vec::new(),
            viscluster: None,
            visleafnum: None,
            occupant: None,
            occupied_distance: i32::MAX,
        }
    }
}

#[derive(Debug)]
pub enum NodeContent {
    Interior(Interior),
    Leaf(Leaf),
}

#[derive(Debug)]
pub struct Node {
    pub aabb: Aabb,
    pub content: NodeContent,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.content, NodeContent::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.content {
            NodeContent::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut Leaf> {
        match &mut self.content {
            NodeContent::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_interior(&self) -> Option<&Interior> {
        match &self.content {
            NodeContent::Interior(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_interior_mut(&mut self) -> Option<&mut Interior> {
        match &mut self.content {
            NodeContent::Interior(i) => Some(i),
            _ => None,
        }
    }
}

/// The whole partitioned tree: a single arena of [`Node`]s, owned
/// uniquely (spec.md §3's "the Tree uniquely owns its nodes").
#[derive(Debug)]
pub struct Tree {
    pub nodes: Vec<Node>,
    pub root: NodeId,
}

impl Tree {
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Descends the tree from the root to the leaf containing `p`,
    /// per spec.md §8 property 5.
    pub fn leaf_at(&self, planes: &geom::PlaneTable, p: glam::Vec3) -> NodeId {
        let mut current = self.root;
        loop {
            match &self.get(current).content {
                NodeContent::Leaf(_) => return current,
                NodeContent::Interior(interior) => {
                    let plane = planes.get(interior.plane_id);
                    current = if plane.distance_to(p) >= 0.0 {
                        interior.children[0]
                    } else {
                        interior.children[1]
                    };
                }
            }
        }
    }
}
