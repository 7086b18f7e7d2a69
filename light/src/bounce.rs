//! Single-bounce radiosity (spec.md §4.8): every shadow-casting face
//! becomes one emitting patch, colored by its average texture color and
//! the direct light already gathered on it, then folded back in as an
//! extra point light during the main gather pass.

use std::collections::HashMap;

use format::generic::{Bsp, Face};
use glam::Vec3;

use crate::config::BounceConfig;
use crate::util::face_points;

/// One emitting patch: a face's centroid, plane normal, average
/// texture tint, and the direct light it received, combined into the
/// color it re-emits (spec.md §4.8's "bounce").
#[derive(Debug, Clone, Copy)]
pub struct BouncePatch {
    pub origin: Vec3,
    pub normal: Vec3,
    pub area: f32,
    pub emitted: Vec3,
    pub style: u8,
}

fn polygon_area(points: &[Vec3], normal: Vec3) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = Vec3::ZERO;
    for i in 1..points.len() - 1 {
        sum += (points[i] - points[0]).cross(points[i + 1] - points[0]);
    }
    (sum.dot(normal)).abs() * 0.5
}

/// Averages a texture's base mip, skipping the reserved alpha index
/// (spec.md §4.8), and returns a unit-scale tint (`1,1,1` for an
/// unrecognized/fully-transparent texture).
fn average_texture_color(texture: &wad::types::MipTex) -> Vec3 {
    let Some(mip0) = texture.mip_images.first() else { return Vec3::ONE };
    let bytes = mip0.data.get_bytes();
    let mut sum = Vec3::ZERO;
    let mut count = 0u32;
    for &idx in bytes {
        if idx == 255 {
            continue;
        }
        if let Some(&[r, g, b]) = texture.palette.get_bytes().get(idx as usize) {
            sum += Vec3::new(r as f32, g as f32, b as f32);
            count += 1;
        }
    }
    if count == 0 {
        Vec3::ONE
    } else {
        sum / (count as f32 * 255.0)
    }
}

fn should_bounce(bsp: &Bsp, face: &Face) -> bool {
    let Some(texinfo) = bsp.texinfo.get(face.texinfo as usize) else { return false };
    let Some(texture) = bsp.textures.get(texinfo.texture_index as usize) else { return false };
    let name = texture.texture_name.get_string();
    !name.starts_with("sky") && !name.starts_with('{') && name != "skip"
}

/// Builds one patch per shadow-casting face, given the direct light
/// (in 0..255 scale) already accumulated on that face by an earlier
/// gather pass.
pub fn build_patches(bsp: &Bsp, face_direct_light: &HashMap<u32, Vec3>, config: &BounceConfig) -> Vec<BouncePatch> {
    let mut patches = Vec::new();
    if !config.enabled {
        return patches;
    }
    for (face_id, face) in bsp.faces.iter().enumerate() {
        if !should_bounce(bsp, face) {
            continue;
        }
        let Some(&direct) = face_direct_light.get(&(face_id as u32)) else { continue };
        if direct.length_squared() < 1e-6 {
            continue;
        }
        let points = face_points(bsp, face);
        if points.len() < 3 {
            continue;
        }
        let plane = bsp.planes[face.plane as usize];
        let normal = if face.side == 1 { -plane.normal } else { plane.normal };
        let area = polygon_area(&points, normal);
        if area < 1.0 {
            continue;
        }
        let texinfo = &bsp.texinfo[face.texinfo as usize];
        let tint = bsp.textures.get(texinfo.texture_index as usize).map(average_texture_color).unwrap_or(Vec3::ONE);

        let centroid = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        let color_blend = Vec3::ONE.lerp(tint.normalize_or_zero().max(Vec3::splat(1e-3)), 1.0 - config.color_scale);
        let emitted = direct * tint * color_blend * config.scale;

        patches.push(BouncePatch { origin: centroid + normal * 1.0, normal, area, emitted, style: 0 });
    }
    patches
}

/// Contribution of one bounce patch at a receiving point, treated as a
/// small-area Lambertian emitter (inverse-square falloff scaled by the
/// patch's area and the emitter/receiver cosine terms).
pub fn patch_contribution(patch: &BouncePatch, point: Vec3, normal: Vec3) -> Vec3 {
    let to_point = point - patch.origin;
    let dist = to_point.length();
    if dist < 1.0 {
        return Vec3::ZERO;
    }
    let dir = to_point / dist;
    let cos_receiver = normal.dot(-dir);
    let cos_emitter = patch.normal.dot(dir);
    if cos_receiver <= 0.0 || cos_emitter <= 0.0 {
        return Vec3::ZERO;
    }
    let form_factor = (cos_receiver * cos_emitter * patch.area) / (std::f32::consts::PI * dist * dist);
    patch.emitted * form_factor.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use format::generic::{Leaf, Model, Plane, TexInfo};
    use glam::Vec4;
    use wad::types::{MipMap, MipTex, Palette, TextureName};

    fn flat_texture(value: u8) -> wad::types::MipTex {
        MipTex {
            texture_name: TextureName::from_string("wall"),
            width: 2,
            height: 2,
            mip_offsets: vec![0; 4],
            mip_images: vec![MipMap::new(vec![value; 4])],
            colors_used: 256,
            palette: Palette::new((0..256).map(|i| [i as u8, i as u8, i as u8]).collect::<Vec<_>>()),
        }
    }

    fn quad_bsp() -> Bsp {
        let mut bsp = Bsp::default();
        bsp.planes.push(Plane { normal: Vec3::Z, dist: 0.0 });
        bsp.vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(64.0, 0.0, 0.0),
            Vec3::new(64.0, 64.0, 0.0),
            Vec3::new(0.0, 64.0, 0.0),
        ];
        bsp.edges = vec![[0, 1], [1, 2], [2, 3], [3, 0]];
        bsp.surf_edges = vec![1, 2, 3, 4];
        bsp.texinfo.push(TexInfo { u: Vec4::X, v: Vec4::Y, texture_index: 0, flags: 0 });
        bsp.textures.push(flat_texture(128));
        bsp.faces.push(Face { plane: 0, side: 0, first_edge: 0, edge_count: 4, texinfo: 0, styles: [255; 4], lightmap_offset: -1 });
        bsp.leaves.push(Leaf {
            contents: brush::ContentFlags::empty(),
            vis_offset: -1,
            mins: [0.0; 3],
            maxs: [0.0; 3],
            first_mark_surface: 0,
            mark_surface_count: 0,
            ambient_levels: [0; 4],
        });
        bsp.models.push(Model { head_nodes: [-1; 4], ..Model::default() });
        bsp
    }

    #[test]
    fn dark_face_produces_no_patch() {
        let bsp = quad_bsp();
        let direct = HashMap::new();
        let patches = build_patches(&bsp, &direct, &BounceConfig { enabled: true, ..BounceConfig::default() });
        assert!(patches.is_empty());
    }

    #[test]
    fn lit_face_produces_one_patch_with_positive_area() {
        let bsp = quad_bsp();
        let mut direct = HashMap::new();
        direct.insert(0u32, Vec3::splat(100.0));
        let patches = build_patches(&bsp, &direct, &BounceConfig { enabled: true, ..BounceConfig::default() });
        assert_eq!(patches.len(), 1);
        assert!(patches[0].area > 4000.0 && patches[0].area < 4100.0);
    }
}
