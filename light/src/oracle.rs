//! The "occlusion oracle" contract (spec.md §4.6): a ray-tracing
//! accelerator is an external collaborator, consumed through this
//! trait. [`BspOracle`] is this workspace's own default implementation
//! (a segment clip through the already-built BSP, the same technique
//! `qbsp`/`vis`'s `TestLine` family uses) rather than a port of an
//! external embree binding, which spec.md §1 explicitly excludes.

use format::generic::Bsp;
use glam::Vec3;

use crate::util::{face_points, point_in_polygon};

/// Result of tracing a shadow/visibility segment: how much of the
/// light's contribution survives (0 = fully blocked, 1 = clear) and a
/// multiplicative tint accumulated by any glass hit along the way
/// (spec.md §4.8's "glass" rule).
#[derive(Debug, Clone, Copy)]
pub struct Transmittance {
    pub visible_fraction: f32,
    pub tint: Vec3,
}

impl Transmittance {
    pub const CLEAR: Transmittance = Transmittance { visible_fraction: 1.0, tint: Vec3::ONE };
    pub const BLOCKED: Transmittance = Transmittance { visible_fraction: 0.0, tint: Vec3::ZERO };
}

pub trait OcclusionOracle: Sync {
    /// Traces the segment `from..to` against every opaque occluder
    /// (spec.md §4.6).
    fn trace(&self, from: Vec3, to: Vec3) -> Transmittance;

    /// Point-in-solid test used by sample-point occlusion repair
    /// (spec.md §4.8) and the light grid (spec.md §3).
    fn point_in_solid(&self, p: Vec3) -> bool;
}

/// Default oracle: recursively clips the segment through the BSP tree
/// exactly the way the compiled tree itself is descended elsewhere in
/// this workspace (`bsptree::Tree::leaf_at`), generalized to a segment
/// instead of a single point.
pub struct BspOracle<'a> {
    pub bsp: &'a Bsp,
}

impl<'a> BspOracle<'a> {
    pub fn new(bsp: &'a Bsp) -> Self {
        Self { bsp }
    }

    fn head_node(&self) -> i32 {
        self.bsp.models.first().map(|m| m.head_nodes[0]).unwrap_or(-1)
    }

    /// Returns `Some((fraction_along_segment, leaf_index))` for the
    /// first opaque leaf the segment enters, or `None` if the whole
    /// segment stays in non-opaque space.
    fn first_solid(&self, node_enc: i32, p1: Vec3, p2: Vec3) -> Option<(f32, usize)> {
        if node_enc < 0 {
            let idx = (-node_enc - 1) as usize;
            let leaf = self.bsp.leaves.get(idx)?;
            return if leaf.contents.is_opaque() { Some((0.0, idx)) } else { None };
        }

        let node = &self.bsp.nodes[node_enc as usize];
        let plane = &self.bsp.planes[node.plane as usize];
        let t1 = plane.normal.dot(p1) - plane.dist;
        let t2 = plane.normal.dot(p2) - plane.dist;

        if t1 >= -geom::ON_EPSILON && t2 >= -geom::ON_EPSILON {
            return self.first_solid(node.children[0], p1, p2);
        }
        if t1 < geom::ON_EPSILON && t2 < geom::ON_EPSILON {
            return self.first_solid(node.children[1], p1, p2);
        }

        let frac = (t1 / (t1 - t2)).clamp(0.0, 1.0);
        let mid = p1 + (p2 - p1) * frac;
        let (near, far) = if t1 < 0.0 { (1, 0) } else { (0, 1) };

        if let Some((hit_frac, leaf)) = self.first_solid(node.children[near], p1, mid) {
            return Some((hit_frac * frac, leaf));
        }
        self.first_solid(node.children[far], mid, p2).map(|(hit_frac, leaf)| (frac + hit_frac * (1.0 - frac), leaf))
    }

    /// Best-effort fence ('{'-prefixed texture) alpha test at the
    /// first solid hit point (spec.md §4.8). A full per-segment fence
    /// chain needs a ray-triangle accelerator, which spec.md §1 treats
    /// as external; this single-hit approximation covers the common
    /// case of a lone fence face between the light and the sample.
    fn fence_alpha_at(&self, leaf_idx: usize, point: Vec3) -> Option<f32> {
        let leaf = self.bsp.leaves.get(leaf_idx)?;
        let start = leaf.first_mark_surface as usize;
        let end = start + leaf.mark_surface_count as usize;
        for &face_id in self.bsp.mark_surfaces.get(start..end)? {
            let face = self.bsp.faces.get(face_id as usize)?;
            let texinfo = self.bsp.texinfo.get(face.texinfo as usize)?;
            let texture = self.bsp.textures.get(texinfo.texture_index as usize)?;
            if !texture.texture_name.get_string().starts_with('{') {
                continue;
            }
            let points = face_points(self.bsp, face);
            if !point_in_polygon(&points, point) {
                continue;
            }
            let u = texinfo.u.truncate().dot(point) + texinfo.u.w;
            let v = texinfo.v.truncate().dot(point) + texinfo.v.w;
            return Some(sample_mip_alpha(texture, u, v));
        }
        None
    }
}

impl OcclusionOracle for BspOracle<'_> {
    fn trace(&self, from: Vec3, to: Vec3) -> Transmittance {
        match self.first_solid(self.head_node(), from, to) {
            None => Transmittance::CLEAR,
            Some((frac, leaf)) => {
                let hit_point = from + (to - from) * frac;
                match self.fence_alpha_at(leaf, hit_point) {
                    Some(alpha) if alpha < 0.5 => Transmittance::CLEAR,
                    _ => Transmittance { visible_fraction: frac, tint: Vec3::ZERO },
                }
            }
        }
    }

    fn point_in_solid(&self, p: Vec3) -> bool {
        self.first_solid(self.head_node(), p, p).is_some()
    }
}

/// Samples a MipTex's base mip at texel `(u, v)` (wrapped), returning
/// `0.0` for the reserved transparent palette index (spec.md §4.8's
/// "sample texture at hit point using the face's UV axes and
/// palette-keyed transparency"; index 255 is the GoldSrc convention
/// for fence-texture alpha, matching `wad::types::MipTex`'s palette
/// layout).
fn sample_mip_alpha(texture: &wad::types::MipTex, u: f32, v: f32) -> f32 {
    if texture.width == 0 || texture.height == 0 || texture.mip_images.is_empty() {
        return 1.0;
    }
    let (w, h) = (texture.width as i32, texture.height as i32);
    let x = (u.floor() as i32).rem_euclid(w);
    let y = (v.floor() as i32).rem_euclid(h);
    match texture.mip_images[0].data.get_bytes().get((y * w + x) as usize) {
        Some(255) => 0.0,
        Some(_) => 1.0,
        None => 1.0,
    }
}
