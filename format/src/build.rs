//! Assembles a [`generic::Bsp`] from the upstream phases' output
//! (spec.md §2's control flow: FaceBuilder → `FormatShim.write(tree)`
//! → PVSSolver → `.patch(pvs)` → LightmapCore → `.patch(lightdata)`).
//!
//! Faces come out of `face::build_faces` in arbitrary (merge) order;
//! this module re-linearizes them in the same node-visitation order
//! the on-disk format requires (`Node::first_face`/`face_count`
//! contiguous per node), the way the teacher's own BSP30 writer
//! expects its input already laid out.

use brush::TexInfoTable;
use bsptree::{NodeContent, NodeId, Tree};
use face::FaceSet;
use geom::PlaneTable;

use crate::generic;

/// Per-node-index result of [`from_tree`], carried alongside the
/// assembled [`generic::Bsp`] so later patch passes (`vis`, `light`)
/// can translate their own face/leaf ids into on-disk indices.
pub struct BuildOutput {
    pub bsp: generic::Bsp,
    /// On-disk leaf index -> the `vis` crate's leaf index, `None` for
    /// opaque leaves that never got one (spec.md §4.5).
    pub leaf_visleafnums: Vec<Option<u32>>,
    /// `face::FaceSet` face index -> on-disk face index.
    pub face_remap: Vec<u32>,
}

struct Builder<'a> {
    tree: &'a Tree,
    face_set: &'a FaceSet,
    out_faces: Vec<generic::Face>,
    out_nodes: Vec<generic::Node>,
    out_leaves: Vec<generic::Leaf>,
    out_marksurfaces: Vec<u32>,
    leaf_visleafnums: Vec<Option<u32>>,
    face_remap: Vec<u32>,
}

impl Builder<'_> {
    fn push_face(&mut self, old_id: u32) -> u32 {
        let f = &self.face_set.faces[old_id as usize];
        let new_id = self.out_faces.len() as u32;
        self.out_faces.push(generic::Face {
            plane: f.plane_id.0,
            side: f.side,
            first_edge: f.first_edge as i32,
            edge_count: f.num_edges,
            texinfo: f.texinfo_id.0,
            styles: f.style_indices,
            lightmap_offset: f.lightmap_offset,
        });
        if self.face_remap.len() <= old_id as usize {
            self.face_remap.resize(old_id as usize + 1, 0);
        }
        self.face_remap[old_id as usize] = new_id;
        new_id
    }

    /// Returns the on-disk node index (>= 0) or leaf encoding (< 0,
    /// `-(leaf_index) - 1`) for `node_id`, after emitting every node
    /// and leaf below it.
    fn walk(&mut self, node_id: NodeId, ancestor_faces: &[u32]) -> i32 {
        let node = self.tree.get(node_id);
        let aabb = node.aabb;
        match &node.content {
            NodeContent::Leaf(leaf) => {
                let first = self.out_marksurfaces.len() as u32;
                self.out_marksurfaces.extend_from_slice(ancestor_faces);

                let idx = self.out_leaves.len();
                self.out_leaves.push(generic::Leaf {
                    contents: leaf.content_flags,
                    vis_offset: -1,
                    mins: aabb.mins.to_array(),
                    maxs: aabb.maxs.to_array(),
                    first_mark_surface: first,
                    mark_surface_count: ancestor_faces.len() as u32,
                    ambient_levels: [0; 4],
                });
                self.leaf_visleafnums.push(leaf.visleafnum);
                -(idx as i32) - 1
            }
            NodeContent::Interior(interior) => {
                let plane_id = interior.plane_id;
                let first_face = self.out_faces.len() as u32;

                let mut front_extra = Vec::new();
                let mut back_extra = Vec::new();
                for &fid in &interior.faces {
                    let side = self.face_set.faces[fid as usize].side;
                    let new_id = self.push_face(fid);
                    if side == 0 {
                        front_extra.push(new_id);
                    } else {
                        back_extra.push(new_id);
                    }
                }
                let face_count = self.out_faces.len() as u32 - first_face;

                let mut front_anc = ancestor_faces.to_vec();
                front_anc.extend_from_slice(&front_extra);
                let c0 = self.walk(interior.children[0], &front_anc);

                let mut back_anc = ancestor_faces.to_vec();
                back_anc.extend_from_slice(&back_extra);
                let c1 = self.walk(interior.children[1], &back_anc);

                let idx = self.out_nodes.len();
                self.out_nodes.push(generic::Node {
                    plane: plane_id.0,
                    children: [c0, c1],
                    mins: aabb.mins.to_array(),
                    maxs: aabb.maxs.to_array(),
                    first_face,
                    face_count,
                });
                idx as i32
            }
        }
    }
}

/// Builds the initial `generic::Bsp` (no vis, no light yet) from a
/// partitioned, portalized, face-built tree. `vertices`/`edges`/
/// `surf_edges` are copied straight out of `face_set`'s pools; planes
/// and texinfo are copied 1:1 out of their interning tables so plane
/// ids and texinfo ids can be used directly as on-disk indices.
pub fn from_tree(tree: &Tree, face_set: &FaceSet, planes: &PlaneTable, texinfos: &TexInfoTable, entities: Vec<generic::Entity>) -> BuildOutput {
    let mut builder = Builder {
        tree,
        face_set,
        out_faces: Vec::new(),
        out_nodes: Vec::new(),
        out_leaves: Vec::new(),
        out_marksurfaces: Vec::new(),
        leaf_visleafnums: Vec::new(),
        face_remap: Vec::new(),
    };
    let root_encoded = builder.walk(tree.root, &[]);

    let gen_planes = (0..planes.len() as u32)
        .map(|i| {
            let p = planes.get(geom::PlaneId(i));
            generic::Plane { normal: p.normal, dist: p.dist }
        })
        .collect();
    let gen_texinfo = texinfos.iter().map(|(_, t)| generic::TexInfo::from_brush(t)).collect();

    let vertices: Vec<_> = face_set.vertices.iter().map(|(_, p)| p).collect();
    let edges: Vec<[u32; 2]> = (1..=face_set.edges.len() as i32).map(|i| face_set.edges.endpoints(i).map(|v| v.0)).collect();

    let mut model = generic::Model { head_nodes: [-1; 4], ..generic::Model::default() };
    model.head_nodes[0] = root_encoded;
    model.vis_leaves_count = builder.out_leaves.len().max(1) as i32 - 1;
    model.first_face = 0;
    model.face_count = builder.out_faces.len() as i32;
    let whole_aabb = tree.get(tree.root).aabb;
    model.mins = whole_aabb.mins;
    model.maxs = whole_aabb.maxs;

    let bsp = generic::Bsp {
        entities,
        planes: gen_planes,
        textures: Vec::new(),
        vertices,
        visibility: Vec::new(),
        nodes: builder.out_nodes,
        texinfo: gen_texinfo,
        faces: builder.out_faces,
        lightmap: Vec::new(),
        clipnodes: Vec::new(),
        leaves: builder.out_leaves,
        mark_surfaces: builder.out_marksurfaces,
        edges,
        surf_edges: face_set.surfedges.clone(),
        models: vec![model],
        light_grid: None,
    };

    BuildOutput { bsp, leaf_visleafnums: builder.leaf_visleafnums, face_remap: builder.face_remap }
}

/// Patches the visdata lump and every leaf's `vis_offset` from a
/// freshly computed [`vis::VisData`] (spec.md §2's `.patch(pvs)`
/// step). Leaves with no vis-leaf number (opaque leaves) get `-1`,
/// meaning "everything visible" per the on-disk convention.
pub fn patch_visibility(bsp: &mut generic::Bsp, leaf_visleafnums: &[Option<u32>], vis: &vis::VisData) {
    let mut offsets = Vec::with_capacity(vis.compressed_rows.len());
    bsp.visibility.clear();
    for row in &vis.compressed_rows {
        offsets.push(bsp.visibility.len() as i32);
        bsp.visibility.extend_from_slice(row);
    }
    for (leaf, visleafnum) in bsp.leaves.iter_mut().zip(leaf_visleafnums) {
        leaf.vis_offset = match visleafnum {
            Some(v) => offsets[*v as usize],
            None => -1,
        };
    }
}

/// One face's resolved lightmap placement, handed back by `light`
/// after baking (spec.md §2's `.patch(lightdata + light grid)` step).
pub struct FaceLightResult {
    pub face_id: u32,
    pub offset: i32,
    pub styles: [u8; 4],
}

/// Patches the lightdata lump and every affected face's
/// `lightmap_offset`/`styles`. `face_id` in each result is a
/// `face::FaceSet` index, translated through `face_remap` (from
/// [`from_tree`]) into the on-disk face index.
pub fn patch_lighting(bsp: &mut generic::Bsp, face_remap: &[u32], results: &[FaceLightResult], lightmap: Vec<[u8; 3]>) {
    bsp.lightmap = lightmap;
    for r in results {
        let disk_id = face_remap[r.face_id as usize] as usize;
        bsp.faces[disk_id].lightmap_offset = r.offset;
        bsp.faces[disk_id].styles = r.styles;
    }
}

/// Attaches the optional light-grid octree baked by `light::grid`
/// (spec.md §3, §4.8). A map with no grid simply never calls this; the
/// field stays `None` and dialects that have no lump for it drop it on
/// encode.
pub fn patch_lightgrid(bsp: &mut generic::Bsp, grid: generic::LightGridOctree) {
    bsp.light_grid = Some(grid);
}
