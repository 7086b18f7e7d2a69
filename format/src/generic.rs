//! The "generic" in-memory model (spec.md §4.9): a neutral structure
//! every dialect encodes to and decodes from. 32-bit index widths,
//! [`brush::ContentFlags`] as the unified leaf-content representation
//! instead of a single legacy enum value — dialects narrow both back
//! down on encode, erroring with [`FormatError::DialectOverflow`] when
//! a value doesn't fit.
//!
//! Field names and lump order mirror the teacher `bsp` crate's
//! `types::Bsp` one-for-one; this is its generalized, dialect-neutral
//! superset.

use std::collections::HashMap;

use brush::ContentFlags;
use glam::{Vec3, Vec4};
use wad::types::MipTex;

use crate::constants::MAX_MAP_HULLS;

pub type Entity = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub plane: u32,
    /// Child index `>= 0` is another [`Node`]; `< 0` encodes leaf
    /// `-(index) - 1`, the classic qbsp convention carried from the
    /// teacher's `i16` version, widened to 32 bits here.
    pub children: [i32; 2],
    pub mins: [f32; 3],
    pub maxs: [f32; 3],
    pub first_face: u32,
    pub face_count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TexInfo {
    pub u: Vec4,
    pub v: Vec4,
    pub texture_index: u32,
    pub flags: u32,
}

impl TexInfo {
    pub fn from_brush(t: &brush::TexInfo) -> Self {
        Self { u: t.vecs[0], v: t.vecs[1], texture_index: t.miptex_id, flags: t.flags }
    }
}

#[derive(Debug, Clone)]
pub struct Face {
    pub plane: u32,
    pub side: u8,
    pub first_edge: i32,
    pub edge_count: u32,
    pub texinfo: u32,
    pub styles: [u8; 4],
    pub lightmap_offset: i32,
}

#[derive(Debug, Clone)]
pub struct ClipNode {
    pub plane: u32,
    pub children: [i32; 2],
}

#[derive(Debug, Clone)]
pub struct Leaf {
    pub contents: ContentFlags,
    pub vis_offset: i32,
    pub mins: [f32; 3],
    pub maxs: [f32; 3],
    pub first_mark_surface: u32,
    pub mark_surface_count: u32,
    pub ambient_levels: [u8; 4],
}

#[derive(Debug, Clone)]
pub struct Model {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub origin: Vec3,
    pub head_nodes: [i32; MAX_MAP_HULLS],
    pub vis_leaves_count: i32,
    pub first_face: i32,
    pub face_count: i32,
}

/// The neutral in-memory BSP, equal in shape to every dialect's
/// on-disk record set (spec.md §4.9). `format::dialect::Dialect`
/// impls are the only code that knows how to narrow/widen this to a
/// specific on-disk byte layout.
/// One light-grid sample (spec.md §3's `LightGridSample`): a styled
/// RGB value at a voxel center, used by the engine to light dynamic
/// models that don't rest on a lightmapped surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightGridSample {
    pub styles: [u8; 4],
    pub colors: [[u8; 3]; 4],
}

impl Default for LightGridSample {
    fn default() -> Self {
        Self { styles: [255; 4], colors: [[0; 3]; 4] }
    }
}

/// A node of the sparse light-grid octree (spec.md §3, §4.8): interior
/// nodes split `aabb` in half along its longest axis, leaves carry one
/// [`LightGridSample`]. `fully_occluded` marks a leaf whose whole
/// volume sits inside solid geometry, so the engine skips sampling it
/// instead of falling through to whatever default the parent would
/// otherwise return.
#[derive(Debug, Clone)]
pub enum LightGridNode {
    Interior { split_axis: u8, children: [Box<LightGridNode>; 2] },
    Leaf { mins: [f32; 3], maxs: [f32; 3], sample: LightGridSample, fully_occluded: bool },
}

/// Whole-map light grid (spec.md §3). Optional: a map with no
/// `light_grid` worldspawn key compiles without one, and the lump is
/// simply absent from the encoded file.
#[derive(Debug, Clone)]
pub struct LightGridOctree {
    pub root: LightGridNode,
    pub world_mins: [f32; 3],
    pub world_maxs: [f32; 3],
}

#[derive(Debug, Clone, Default)]
pub struct Bsp {
    pub entities: Vec<Entity>,
    pub planes: Vec<Plane>,
    pub textures: Vec<MipTex>,
    pub vertices: Vec<Vec3>,
    pub visibility: Vec<u8>,
    pub nodes: Vec<Node>,
    pub texinfo: Vec<TexInfo>,
    pub faces: Vec<Face>,
    /// One RGB triple per lightmap luxel, styles packed sequentially
    /// per face (spec.md §4.8's multi-style packing).
    pub lightmap: Vec<[u8; 3]>,
    pub clipnodes: Vec<ClipNode>,
    pub leaves: Vec<Leaf>,
    pub mark_surfaces: Vec<u32>,
    pub edges: Vec<[u32; 2]>,
    pub surf_edges: Vec<i32>,
    pub models: Vec<Model>,
    /// Present only when `light` built one (spec.md §3); not every
    /// dialect has a lump for it, so encoders that lack one simply
    /// drop it rather than erroring (it's additive engine data, not
    /// required for the map to load).
    pub light_grid: Option<LightGridOctree>,
}

impl Bsp {
    /// Per-lump element counts and byte sizes, for `bspinfo`/`bsputil`
    /// style diagnostics (SPEC_FULL.md §2's "`format::generic` exposing
    /// per-lump counts/sizes").
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("entities", self.entities.len()),
            ("planes", self.planes.len()),
            ("textures", self.textures.len()),
            ("vertices", self.vertices.len()),
            ("visibility_bytes", self.visibility.len()),
            ("nodes", self.nodes.len()),
            ("texinfo", self.texinfo.len()),
            ("faces", self.faces.len()),
            ("lightmap_luxels", self.lightmap.len()),
            ("clipnodes", self.clipnodes.len()),
            ("leaves", self.leaves.len()),
            ("mark_surfaces", self.mark_surfaces.len()),
            ("edges", self.edges.len()),
            ("surf_edges", self.surf_edges.len()),
            ("models", self.models.len()),
        ]
    }
}

impl Default for Model {
    fn default() -> Self {
        Self {
            mins: Vec3::ZERO,
            maxs: Vec3::ZERO,
            origin: Vec3::ZERO,
            head_nodes: [0; MAX_MAP_HULLS],
            vis_leaves_count: 0,
            first_face: 0,
            face_count: 0,
        }
    }
}
