use std::collections::HashMap;

use brush::{ContentFlags, TexInfoId};
use bsptree::{NodeId, Tree};
use csg::CsgBrush;
use geom::{PlaneId, PlaneTable, ZERO_AREA_EPSILON};
use glam::Vec3;

use crate::config::FaceConfig;
use crate::error::FaceError;
use crate::fragments::collect_fragments;
use crate::merge::{merge_fragments, MergedPolygon};
use crate::pool::{EdgePool, VertexPool};
use crate::tjunction::repair_t_junctions;

/// One output polygon (spec.md §3's `Face`). Vertices are reached
/// indirectly through [`FaceSet::surfedges`] → [`FaceSet::edges`] →
/// [`FaceSet::vertices`], exactly mirroring the on-disk layout so
/// `format` can serialize it with no further transformation.
#[derive(Debug, Clone)]
pub struct Face {
    pub plane_id: PlaneId,
    pub side: u8,
    pub texinfo_id: TexInfoId,
    pub content_flags: ContentFlags,
    pub first_edge: u32,
    pub num_edges: u32,
    pub style_indices: [u8; 4],
    pub lightmap_offset: i32,
}

#[derive(Debug, Default)]
pub struct FaceSet {
    pub vertices: VertexPool,
    pub edges: EdgePool,
    pub surfedges: Vec<i32>,
    pub faces: Vec<Face>,
    pub facecollapse: usize,
}

impl FaceSet {
    pub fn face_points(&self, face: &Face) -> Vec<Vec3> {
        (0..face.num_edges)
            .map(|i| {
                let signed = self.surfedges[(face.first_edge + i) as usize];
                let [a, _b] = self.edges.endpoints(signed);
                self.vertices.get(a)
            })
            .collect()
    }
}

/// Runs FaceBuilder end to end (spec.md §4.6): fragment collection,
/// convex merge, global T-junction repair, edge-count fragmentation,
/// and pooling into the shared vertex/edge/surfedge arrays. Returns the
/// face set plus, for each interior node, the ids of the faces that
/// belong to it (for `Interior::faces`).
pub fn build_faces(
    tree: &Tree,
    brushes: &[CsgBrush],
    planes: &PlaneTable,
    config: &FaceConfig,
) -> Result<(FaceSet, HashMap<NodeId, Vec<u32>>), FaceError> {
    let fragments = collect_fragments(tree, brushes, planes, config.on_epsilon);
    let mut polys = merge_fragments(fragments, |id| planes.get(id).normal);
    repair_t_junctions(&mut polys);

    let mut set = FaceSet { vertices: VertexPool::new(), edges: EdgePool::new(), ..Default::default() };
    let mut by_node: HashMap<NodeId, Vec<u32>> = HashMap::new();

    for poly in polys {
        let fragments = if config.max_edges > 0 && poly.points.len() > config.max_edges {
            fan_split(&poly.points, config.max_edges).ok_or(FaceError::GeometryOverflow { plane_id: poly.plane_id.0 })?
        } else {
            vec![poly.points.clone()]
        };

        for points in fragments {
            if points.len() < 3 || polygon_area(&points) < ZERO_AREA_EPSILON {
                set.facecollapse += 1;
                continue;
            }

            let first_edge = set.surfedges.len() as u32;
            for i in 0..points.len() {
                let a = set.vertices.intern(points[i]);
                let b = set.vertices.intern(points[(i + 1) % points.len()]);
                set.surfedges.push(set.edges.intern(a, b));
            }

            let face_id = set.faces.len() as u32;
            set.faces.push(Face {
                plane_id: poly.plane_id,
                side: poly.side,
                texinfo_id: poly.texinfo_id,
                content_flags: poly.content_flags,
                first_edge,
                num_edges: points.len() as u32,
                style_indices: [255, 255, 255, 255],
                lightmap_offset: -1,
            });
            by_node.entry(poly.node).or_default().push(face_id);
        }
    }

    Ok((set, by_node))
}

fn polygon_area(points: &[Vec3]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut total = Vec3::ZERO;
    for i in 1..points.len() - 1 {
        let a = points[i] - points[0];
        let b = points[i + 1] - points[0];
        total += a.cross(b);
    }
    total.length() * 0.5
}

/// Splits an over-large polygon into a fan of sub-polygons sharing one
/// seed vertex, each within `max_edges` (spec.md §4.6). Tries every
/// vertex as the seed until one produces no degenerate fragment;
/// returns `None` (caller surfaces [`FaceError::GeometryOverflow`]) if
/// none does.
fn fan_split(points: &[Vec3], max_edges: usize) -> Option<Vec<Vec<Vec3>>> {
    let n = points.len();
    if max_edges < 3 {
        return None;
    }

    'seed: for seed in 0..n {
        let rotated: Vec<Vec3> = (0..n).map(|k| points[(seed + k) % n]).collect();
        let mut fragments = Vec::new();
        let mut i = 1;
        while i < n - 1 {
            let end = (i + max_edges - 2).min(n - 1);
            if end <= i {
                continue 'seed;
            }
            let mut frag = Vec::with_capacity(end - i + 2);
            frag.push(rotated[0]);
            frag.extend_from_slice(&rotated[i..=end]);
            if polygon_area(&frag) < ZERO_AREA_EPSILON {
                continue 'seed;
            }
            fragments.push(frag);
            if end == n - 1 {
                break;
            }
            i = end;
        }
        if !fragments.is_empty() {
            return Some(fragments);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use brush::{ContentFlags, Side, TexInfoId};
    use bsptree::{Interior, Leaf, Node, NodeContent};
    use geom::{Aabb, Plane, Winding};

    fn flat_tree(plane_id: PlaneId) -> Tree {
        let front = Node { aabb: Aabb::EMPTY, content: NodeContent::Leaf(Leaf::empty(ContentFlags::empty())) };
        let back = Node { aabb: Aabb::EMPTY, content: NodeContent::Leaf(Leaf::empty(ContentFlags::SOLID)) };
        let root = Node {
            aabb: Aabb::EMPTY,
            content: NodeContent::Interior(Interior { plane_id, children: [NodeId(0), NodeId(1)], faces: Vec::new() }),
        };
        Tree { nodes: vec![front, back, root], root: NodeId(2) }
    }

    #[test]
    fn single_square_fragment_becomes_one_face() {
        let mut planes = PlaneTable::new();
        let plane_id = planes.intern(Plane::new(Vec3::Z, 0.0));

        let square = Winding::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 4.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
        ]);
        let side = Side::new(plane_id, square, TexInfoId(0), 0, ContentFlags::SOLID);
        let brush = CsgBrush { source_brush: 0, content_flags: ContentFlags::SOLID, sides: vec![side], aabb: Aabb::EMPTY };

        let tree = flat_tree(plane_id);
        let (set, by_node) = build_faces(&tree, &[brush], &planes, &FaceConfig::default()).unwrap();

        assert_eq!(set.faces.len(), 1);
        assert_eq!(by_node[&NodeId(2)].len(), 1);
        assert_eq!(set.faces[0].num_edges, 4);
    }

    #[test]
    fn fan_split_keeps_all_vertices_and_drops_no_fragment() {
        let n = 10;
        let points: Vec<Vec3> = (0..n)
            .map(|i| {
                let t = i as f32 / n as f32 * std::f32::consts::TAU;
                Vec3::new(t.cos() * 10.0, t.sin() * 10.0, 0.0)
            })
            .collect();
        let fragments = fan_split(&points, 5).unwrap();
        assert!(fragments.iter().all(|f| f.len() <= 5));
        assert!(!fragments.is_empty());
    }
}
